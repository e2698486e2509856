use anyhow::Context;
use bookapi_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Operator entrypoint for the book service.
#[derive(Debug, Parser)]
#[command(name = "bookapi-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the effective configuration as JSON
    Config,
}

fn print_config(settings: &Settings) -> anyhow::Result<()> {
    let mut redacted = settings.clone();
    redacted.database.url = settings.database.redacted_url();
    let rendered = serde_json::to_string_pretty(&redacted)
        .with_context(|| "failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookapi settings")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Config => print_config(&settings),
        Command::Migrate => {
            bookapi_telemetry::init_tracing(&settings.telemetry)?;
            let applied = bookapi_app::bootstrap::run_migrations(&settings).await?;
            tracing::info!(applied, "migrate finished");
            Ok(())
        }
        Command::Serve => {
            bookapi_telemetry::init_tracing(&settings.telemetry)?;
            bookapi_app::bootstrap::serve(&settings).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["bookapi-cli"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["bookapi-cli", "migrate"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Migrate)));
    }
}
