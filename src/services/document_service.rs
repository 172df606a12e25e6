// src/services/document_service.rs

use quick_xml::{events::{BytesStart, Event}, Reader};
use serde_json::{Map, Value};

use crate::{
    common::error::AppError,
    models::documents::{DocumentSummary, ParsedDocument, TipoDocumento},
};

// Convenção da árvore: atributos com prefixo, texto misto em "#text"
const ATTR_PREFIX: &str = "@_";
const TEXT_KEY: &str = "#text";

#[derive(Clone, Default)]
pub struct DocumentService;

impl DocumentService {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, xml: &str) -> Result<ParsedDocument, AppError> {
        let data = xml_to_value(xml)?;
        let parsed = extract_summary(&data);
        Ok(ParsedDocument { data, parsed })
    }
}

// Elemento aberto durante a leitura
struct OpenElement {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl OpenElement {
    fn start(tag: &BytesStart) -> Result<Self, AppError> {
        let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
        let mut children = Map::new();
        for attr in tag.attributes() {
            let attr = attr.map_err(|e| AppError::ParseError(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| AppError::ParseError(e.to_string()))?;
            children.insert(format!("{}{}", ATTR_PREFIX, key), Value::String(value.into_owned()));
        }
        Ok(Self { name, children, text: String::new() })
    }

    fn finish(self) -> (String, Value) {
        let value = match (self.children.is_empty(), self.text.is_empty()) {
            (true, _) => Value::String(self.text),
            (false, true) => Value::Object(self.children),
            (false, false) => {
                let mut children = self.children;
                children.insert(TEXT_KEY.to_string(), Value::String(self.text));
                Value::Object(children)
            }
        };
        (self.name, value)
    }
}

// Filhos repetidos viram array
fn insert_child(parent: &mut Map<String, Value>, name: String, value: Value) {
    match parent.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.insert(name, value);
        }
    }
}

/// Converte o XML numa árvore JSON genérica.
pub fn xml_to_value(xml: &str) -> Result<Value, AppError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root = Map::new();
    let mut stack: Vec<OpenElement> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| AppError::ParseError(format!("{} (posição {})", e, reader.buffer_position())))?;

        match event {
            Event::Start(tag) => stack.push(OpenElement::start(&tag)?),
            Event::Empty(tag) => {
                let (name, value) = OpenElement::start(&tag)?.finish();
                let parent = stack.last_mut().map(|el| &mut el.children).unwrap_or(&mut root);
                insert_child(parent, name, value);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| AppError::ParseError("Tag de fechamento sem abertura".into()))?;
                let (name, value) = element.finish();
                let parent = stack.last_mut().map(|el| &mut el.children).unwrap_or(&mut root);
                insert_child(parent, name, value);
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| AppError::ParseError(e.to_string()))?;
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            // Declaração, comentários, PI e DOCTYPE não entram na árvore
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(AppError::ParseError(format!("Tag <{}> não foi fechada", open.name)));
    }

    Ok(Value::Object(root))
}

// =============================================================================
//  EXTRAÇÃO (NF-e / CT-e)
// =============================================================================

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get(TEXT_KEY).and_then(text_of),
        _ => None,
    }
}

fn field(node: &Value, path: &[&str]) -> Option<String> {
    lookup(node, path).and_then(text_of).filter(|s| !s.is_empty())
}

// infNFe/infCte aparecem dentro do envelope de processamento ou na raiz.
// Elemento vazio (vira "") não identifica o formato.
fn find_shape<'a>(doc: &'a Value, wrapped: [&str; 3]) -> Option<&'a Value> {
    lookup(doc, &wrapped)
        .filter(|node| node.is_object())
        .or_else(|| lookup(doc, &wrapped[1..]).filter(|node| node.is_object()))
}

fn access_key(node: &Value, prefix: &str) -> String {
    field(node, &["@_Id"])
        .map(|id| id.replacen(prefix, "", 1))
        .unwrap_or_default()
}

fn amount(node: &Value, path: &[&str]) -> f64 {
    field(node, path)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Monta o resumo normalizado; formatos desconhecidos ficam como `outros`.
pub fn extract_summary(doc: &Value) -> DocumentSummary {
    if let Some(nfe) = find_shape(doc, ["nfeProc", "NFe", "infNFe"]) {
        return DocumentSummary {
            tipo: TipoDocumento::Nfe,
            chave: access_key(nfe, "NFe"),
            numero: field(nfe, &["ide", "nNF"]).unwrap_or_default(),
            serie: field(nfe, &["ide", "serie"]).unwrap_or_default(),
            emitente: field(nfe, &["emit", "xNome"]).unwrap_or_default(),
            destinatario: field(nfe, &["dest", "xNome"]).unwrap_or_default(),
            valor: amount(nfe, &["total", "ICMSTot", "vNF"]),
            data_emissao: field(nfe, &["ide", "dhEmi"]).or_else(|| field(nfe, &["ide", "dEmi"])),
        };
    }

    if let Some(cte) = find_shape(doc, ["cteProc", "CTe", "infCte"]) {
        return DocumentSummary {
            tipo: TipoDocumento::Cte,
            chave: access_key(cte, "CTe"),
            numero: field(cte, &["ide", "nCT"]).unwrap_or_default(),
            serie: field(cte, &["ide", "serie"]).unwrap_or_default(),
            emitente: field(cte, &["emit", "xNome"]).unwrap_or_default(),
            destinatario: field(cte, &["rem", "xNome"])
                .or_else(|| field(cte, &["dest", "xNome"]))
                .unwrap_or_default(),
            valor: amount(cte, &["vPrest", "vTPrest"]),
            data_emissao: field(cte, &["ide", "dhEmi"]).or_else(|| field(cte, &["ide", "dEmi"])),
        };
    }

    DocumentSummary::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NFE_PROC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc versao="4.00" xmlns="http://www.portalfiscal.inf.br/nfe">
  <NFe>
    <infNFe Id="NFe35240112345678000199550010000012341000012345" versao="4.00">
      <ide><serie>1</serie><nNF>1234</nNF><dhEmi>2024-01-15T10:30:00-03:00</dhEmi></ide>
      <emit><xNome>Transportes Alfa Ltda</xNome></emit>
      <dest><xNome>Comercio Beta &amp; Cia</xNome></dest>
      <det nItem="1"><prod><cProd>A</cProd></prod></det>
      <det nItem="2"><prod><cProd>B</cProd></prod></det>
      <total><ICMSTot><vNF>1500.75</vNF></ICMSTot></total>
    </infNFe>
  </NFe>
</nfeProc>"#;

    const CTE_BARE: &str = r#"<CTe>
  <infCte Id="CTe35240198765432000111570010000000451000000456">
    <ide><serie>2</serie><nCT>45</nCT><dhEmi>2024-03-01T08:00:00-03:00</dhEmi></ide>
    <emit><xNome>Logistica Gama</xNome></emit>
    <dest><xNome>Destino Final</xNome></dest>
    <vPrest><vTPrest>320.00</vTPrest></vPrest>
  </infCte>
</CTe>"#;

    #[test]
    fn nfe_proc_is_summarized() {
        let parsed = DocumentService::new().parse(NFE_PROC).unwrap().parsed;

        assert_eq!(parsed.tipo, TipoDocumento::Nfe);
        assert_eq!(parsed.chave, "35240112345678000199550010000012341000012345");
        assert_eq!(parsed.numero, "1234");
        assert_eq!(parsed.serie, "1");
        assert_eq!(parsed.emitente, "Transportes Alfa Ltda");
        assert_eq!(parsed.destinatario, "Comercio Beta & Cia");
        assert_eq!(parsed.valor, 1500.75);
        assert_eq!(parsed.data_emissao.as_deref(), Some("2024-01-15T10:30:00-03:00"));
    }

    #[test]
    fn nfe_without_timestamp_falls_back_to_date() {
        let xml = r#"<NFe><infNFe Id="NFe1"><ide><nNF>7</nNF><dEmi>2009-05-04</dEmi></ide></infNFe></NFe>"#;
        let parsed = extract_summary(&xml_to_value(xml).unwrap());

        assert_eq!(parsed.tipo, TipoDocumento::Nfe);
        assert_eq!(parsed.chave, "1");
        assert_eq!(parsed.data_emissao.as_deref(), Some("2009-05-04"));
        assert_eq!(parsed.valor, 0.0);
    }

    #[test]
    fn cte_without_sender_uses_recipient() {
        let parsed = extract_summary(&xml_to_value(CTE_BARE).unwrap());

        assert_eq!(parsed.tipo, TipoDocumento::Cte);
        assert_eq!(parsed.chave, "35240198765432000111570010000000451000000456");
        assert_eq!(parsed.numero, "45");
        assert_eq!(parsed.destinatario, "Destino Final");
        assert_eq!(parsed.valor, 320.0);
    }

    #[test]
    fn unknown_shape_is_outros_with_defaults() {
        let parsed = extract_summary(&xml_to_value("<pedido><id>9</id></pedido>").unwrap());
        assert_eq!(parsed, DocumentSummary::default());
        assert_eq!(parsed.valor, 0.0);
        assert!(parsed.chave.is_empty() && parsed.emitente.is_empty());
    }

    #[test]
    fn tree_keeps_attributes_text_and_repeated_children() {
        let tree = xml_to_value(NFE_PROC).unwrap();
        let proc_ = &tree["nfeProc"];

        assert_eq!(proc_["@_versao"], json!("4.00"));
        assert_eq!(proc_["NFe"]["infNFe"]["det"].as_array().map(Vec::len), Some(2));
        assert_eq!(proc_["NFe"]["infNFe"]["det"][1]["@_nItem"], json!("2"));
        // valores ficam como texto
        assert_eq!(proc_["NFe"]["infNFe"]["ide"]["nNF"], json!("1234"));
    }

    #[test]
    fn mixed_content_goes_to_text_key() {
        let tree = xml_to_value(r#"<obs tipo="x">livre</obs>"#).unwrap();
        assert_eq!(tree, json!({ "obs": { "@_tipo": "x", "#text": "livre" } }));
    }

    #[test]
    fn empty_element_becomes_empty_string() {
        let tree = xml_to_value("<a><b/><c></c></a>").unwrap();
        assert_eq!(tree, json!({ "a": { "b": "", "c": "" } }));
    }

    #[test]
    fn empty_inf_element_is_not_recognized() {
        let parsed = extract_summary(&xml_to_value("<NFe><infNFe/></NFe>").unwrap());
        assert_eq!(parsed, DocumentSummary::default());

        let parsed = extract_summary(&xml_to_value("<cteProc><CTe><infCte></infCte></CTe></cteProc>").unwrap());
        assert_eq!(parsed.tipo, TipoDocumento::Outros);
    }

    #[test]
    fn mismatched_tags_are_parse_errors() {
        let err = xml_to_value("<a><b></a>").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn unclosed_tag_is_parse_error() {
        let err = xml_to_value("<a><b>texto</b>").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }
}
