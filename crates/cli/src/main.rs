mod config_commands;
mod seed_commands;

use std::path::PathBuf;

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
    wardline_config::WardlineConfig,
};

#[derive(Parser)]
#[command(
    name = "wardline",
    version,
    about = "wardline: FHIR message-bundle gateway"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (skips discovery of ./wardline.* and ~/.config/wardline/).
    #[arg(long, global = true, env = "WARDLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// FHIR store base URL (overrides config value).
    #[arg(long, global = true)]
    store_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server (default when no subcommand is provided).
    Gateway,
    /// Populate the store with sample practitioners and a bootstrap chat.
    Seed(seed_commands::SeedArgs),
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// File (explicit or discovered), then `WARDLINE_*` env, then CLI flags.
fn resolve_config(cli: &Cli) -> anyhow::Result<WardlineConfig> {
    let mut config = match cli.config {
        Some(ref path) => {
            let mut config = wardline_config::load_config(path)
                .with_context(|| format!("loading {}", path.display()))?;
            wardline_config::apply_env_overrides(&mut config);
            config
        },
        None => wardline_config::discover_and_load(),
    };
    apply_cli_overrides(cli, &mut config);
    Ok(config)
}

fn apply_cli_overrides(cli: &Cli, config: &mut WardlineConfig) {
    if let Some(ref bind) = cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref url) = cli.store_url {
        config.store.base_url = url.clone();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "wardline starting");

    match cli.command {
        None | Some(Commands::Gateway) => {
            let config = resolve_config(&cli)?;
            wardline_gateway::start_gateway(&config).await
        },
        Some(Commands::Seed(ref args)) => {
            let config = resolve_config(&cli)?;
            seed_commands::handle_seed(args, &config).await
        },
        Some(Commands::Config { ref action }) => {
            config_commands::handle_config(action, cli.config.as_deref(), || resolve_config(&cli))
        },
    }
}
