//! `genie` binary entry point.

use genie_console::cli::interrupt::Interrupts;
use genie_console::cli::{commands, console, Cli, Commands};
use genie_console::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            console::print_error(&e);
            std::process::exit(1);
        }
    };

    let interrupts = Interrupts::new();
    interrupts.listen();

    let result = match &cli.command {
        None => commands::run_menu(&config, &interrupts).await,
        Some(Commands::Ask { prompt }) => commands::handle_ask(&config, &interrupts, prompt).await,
        Some(Commands::Agent) => commands::handle_agent(&config, &interrupts).await,
    };

    if let Err(e) = result {
        console::print_error(&e);
        std::process::exit(1);
    }
}
