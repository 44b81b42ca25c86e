use anyhow::Context;
use council::{
    AppState, ConfigManager, OpenAIClientFactory,
    api::routes::create_router,
    cli::{
        Cli, Commands, LogFormat, config,
        init::{self, InitConfig, InitResult},
        output::Output,
    },
    tools::search::search_from_config,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keys referenced by council.toml usually live in .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Some(Commands::Init { path, force }) => {
            match init::run(InitConfig { path, force }, &output) {
                InitResult::Error(e) => anyhow::bail!(e),
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
            }
        }
        Some(Commands::Config { validate }) => {
            if !config::run(&cli.config, validate, &output) {
                std::process::exit(1);
            }
            Ok(())
        }
        None => serve(cli.config, cli.verbose, cli.log_format, &output).await,
    }
}

async fn serve(
    config_path: PathBuf,
    verbose: bool,
    log_format: LogFormat,
    output: &Output,
) -> anyhow::Result<()> {
    let config_manager = ConfigManager::new(&config_path).with_context(|| {
        format!(
            "Failed to load {} (run 'council-server init' to create one)",
            config_path.display()
        )
    })?;
    let config = config_manager.config();

    init_tracing(&config.server.log_level, verbose, log_format);
    if log_format == LogFormat::Text {
        output.banner();
    }

    if let Err(e) = config_manager.start_watching() {
        warn!("Configuration hot reload disabled: {}", e);
    }

    let search = search_from_config(&config.search).context("Failed to build search backend")?;
    info!(
        providers = config.providers.len(),
        solver = config.solver.as_ref().map(|s| s.model.as_str()).unwrap_or("none"),
        search = search.name(),
        "Configuration loaded"
    );

    let state = AppState {
        config_manager: Arc::new(config_manager),
        llm_factory: Arc::new(OpenAIClientFactory::from_config(&config.pipeline)),
        search,
    };
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(log_level: &str, verbose: bool, format: LogFormat) {
    let level = if verbose { "debug" } else { log_level };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},hyper=warn,h2=warn,rustls=warn", level)));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
