use skychat::config::AppConfig;
use skychat::repl::{Command, Repl, Step};
use skychat_ai::OllamaBackend;
use skychat_conversation::{ConversationOrchestrator, OrchestratorConfig, SessionStore};
use skychat_scheduler::CleanupScheduler;
use skychat_tools::{KeywordIntentDetector, ToolExecutor, ToolRegistry, WeatherClient, WeatherTool};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load().expect("failed to load configuration");
    config
        .cleanup
        .validate()
        .expect("invalid cleanup configuration");
    tracing::info!(
        ollama = %config.ollama.base_url,
        model = %config.ollama.default_model,
        "Loaded configuration"
    );

    let store = Arc::new(SessionStore::new(config.ollama.default_model.clone()));

    let weather = WeatherClient::new(&config.weather).expect("failed to build weather client");
    let registry = ToolRegistry::new().with(Arc::new(WeatherTool::new(weather)));
    let executor = ToolExecutor::new(registry, config.weather.timeout());

    let backend = OllamaBackend::new(&config.ollama).expect("failed to build Ollama client");

    let orchestrator = Arc::new(ConversationOrchestrator::new(
        store.clone(),
        Arc::new(KeywordIntentDetector::new()),
        executor,
        Arc::new(backend),
        OrchestratorConfig {
            default_model: config.ollama.default_model.clone(),
            request_timeout: config.ollama.timeout(),
        },
    ));

    let shutdown = CancellationToken::new();
    let cleanup = CleanupScheduler::new(store, &config.cleanup).spawn(shutdown.clone());

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            ctrl_c.cancel();
        }
    });

    let mut repl = Repl::new(orchestrator);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("skychat - type /help for commands");
    loop {
        if stdout.write_all(b"> ").await.is_err() || stdout.flush().await.is_err() {
            break;
        }

        let line = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read input");
                break;
            }
        };

        match repl.handle(Command::parse(&line), &shutdown).await {
            Step::Print(text) => {
                let text = format!("{text}\n");
                if stdout.write_all(text.as_bytes()).await.is_err() {
                    break;
                }
            }
            Step::Nothing => {}
            Step::Quit => break,
        }
    }

    shutdown.cancel();
    if let Err(e) = cleanup.await {
        tracing::warn!(error = %e, "Cleanup task ended abnormally");
    }
}
