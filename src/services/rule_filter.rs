// src/services/rule_filter.rs

use serde_json::Value;

/// Predicado avaliado contra o payload de um evento da fila.
///
/// Hoje as regras só geram `Equals` combinados por `All`; `Any` fica
/// disponível para filtros com OU sem mudar quem chama `matches`.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Always,
    Equals { key: String, value: Value },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Converte `trigger_filters` (mapa plano chave -> valor) em predicado.
    /// Filtro ausente, nulo, vazio ou que não seja objeto casa sempre.
    pub fn from_filters(filters: Option<&Value>) -> Self {
        match filters {
            Some(Value::Object(map)) if !map.is_empty() => Predicate::All(
                map.iter()
                    .map(|(key, value)| Predicate::Equals {
                        key: key.clone(),
                        value: value.clone(),
                    })
                    .collect(),
            ),
            _ => Predicate::Always,
        }
    }

    pub fn matches(&self, payload: &Value) -> bool {
        match self {
            Predicate::Always => true,
            // Chave ausente no payload nunca casa
            Predicate::Equals { key, value } => payload
                .get(key)
                .is_some_and(|actual| loose_eq(actual, value)),
            Predicate::All(preds) => preds.iter().all(|p| p.matches(payload)),
            Predicate::Any(preds) => preds.iter().any(|p| p.matches(payload)),
        }
    }
}

/// Igualdade com coerção de tipos: 1 == "1", true == 1, "" == 0, "0x1A" == 26.
/// Arrays e objetos comparam estruturalmente entre si.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,

        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,

        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match (n.as_f64(), string_to_number(s)) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }

        // Booleano vira 0/1 e a comparação recomeça
        (Value::Bool(flag), other) | (other, Value::Bool(flag)) => {
            loose_eq(&Value::from(u8::from(*flag)), other)
        }

        (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => a == b,

        // Composto contra primitivo: compara pela forma textual
        (composite @ (Value::Array(_) | Value::Object(_)), primitive)
        | (primitive, composite @ (Value::Array(_) | Value::Object(_))) => {
            loose_eq(&Value::String(to_primitive_string(composite)), primitive)
        }
    }
}

fn string_to_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    // Literais 0x / 0o / 0b, sem sinal
    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if let Some(digits) = strip_prefix_ignore_case(trimmed, prefix) {
            if digits.starts_with('+') {
                return None;
            }
            return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
        }
    }
    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    // Rust aceita "inf"/"nan", que não são números aqui
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn to_primitive_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(to_primitive_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
