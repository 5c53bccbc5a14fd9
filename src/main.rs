use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use mail_drafter::config::AppConfig;
use mail_drafter::llm::{LlmCapabilities, create_provider};
use mail_drafter::mailbox::{GraphClient, MailboxGateway, SubscriptionManager};
use mail_drafter::pipeline::DraftWorkflow;
use mail_drafter::sanitize::HtmlSanitizer;
use mail_drafter::server;

/// Log to stdout and to a daily-rolling `app.log` under `log_dir`.
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, "app.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let _log_guard = init_tracing(&config.server.log_dir);

    eprintln!("📬 Mail Drafter v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} ({})", config.llm.model, config.llm.backend.name());
    eprintln!("   Mailbox: {}/{}", config.graph.base_url, config.graph.user_id);
    eprintln!("   Max redrafts: {}", config.workflow.max_redraft_tries);
    eprintln!("   Logs: {}", config.server.log_dir.join("app.log").display());

    // ── Collaborators ───────────────────────────────────────────────────
    let provider = create_provider(&config.llm).context("Failed to create LLM provider")?;
    let llm = Arc::new(LlmCapabilities::new(provider));

    let graph = Arc::new(GraphClient::from_config(&config.graph).context("Failed to create mailbox client")?);
    let mailbox: Arc<dyn MailboxGateway> = graph.clone();
    let subscriptions: Arc<dyn SubscriptionManager> = graph;

    let workflow = Arc::new(DraftWorkflow::new(
        mailbox,
        llm,
        Arc::new(HtmlSanitizer),
        &config.workflow,
    ));

    // ── HTTP server ─────────────────────────────────────────────────────
    let app = server::routes(workflow, subscriptions);
    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    eprintln!("   Notifications: http://{addr}/api/graph-notifications\n");
    tracing::info!(port = config.server.port, "Mail Drafter listening");

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
