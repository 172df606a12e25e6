//src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use docflow_functions::{
    background,
    config::{connect_database, AppConfig, AppState},
    router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = AppConfig::from_env()?;
    let db_pool = connect_database(&config).await?;

    sqlx::migrate!()
        .run(&db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config, db_pool);

    let cancel = CancellationToken::new();
    let tickers = background::spawn_tickers(&app_state, cancel.clone());

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, router::app(app_state))
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await
        .context("Erro no servidor Axum")?;

    for ticker in tickers {
        if let Err(e) = ticker.await {
            tracing::error!(error = %e, "Job periódico terminou com falha");
        }
    }

    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Falha ao escutar Ctrl-C");
    }
    tracing::info!("Encerrando...");
    cancel.cancel();
}
