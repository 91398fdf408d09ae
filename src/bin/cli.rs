//! Statement resolver CLI
//!
//! Local execution entry point. For AWS Lambda, use `statement-lambda`.

use std::path::PathBuf;
#[cfg(feature = "serve")]
use std::sync::Arc;

use clap::{Parser, Subcommand};
use statement_resolver::{
    config::{config_path, load_config},
    error::Result,
    models::LanguageCode,
    pipeline::Resolver,
    services::language_order,
};

/// Resolve judge problem statements into embeddable HTML
#[derive(Parser, Debug)]
#[command(name = "statement", version, about = "Judge problem statement resolver")]
struct Cli {
    /// Path to the TOML configuration (default: $STATEMENT_CONFIG or data/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve one problem and print the result envelope as JSON
    Resolve {
        /// Problem identifier, e.g. P37500
        id: String,

        /// Preferred statement language
        #[arg(short, long)]
        lang: Option<String>,

        /// Print the error placeholder envelope instead of fetching
        #[arg(long)]
        placeholder: bool,
    },

    /// Run the local development server
    #[cfg(feature = "serve")]
    Serve {
        /// Address to bind (default: server.bind from config)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Validate configuration
    Validate,

    /// Show the language trial order
    Languages {
        /// Requested language
        #[arg(short, long)]
        lang: Option<String>,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    log::debug!(
        "Loaded configuration from {}",
        config_path(cli.config.as_deref()).display()
    );

    match cli.command {
        Command::Resolve {
            id,
            lang,
            placeholder,
        } => {
            let resolver = Resolver::from_config(&config)?;
            let result = if placeholder {
                resolver.placeholder(&id)?
            } else {
                resolver.resolve(&id, lang.as_deref()).await?
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        #[cfg(feature = "serve")]
        Command::Serve { bind } => {
            let resolver = Arc::new(Resolver::from_config(&config)?);
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            statement_resolver::server::serve(resolver, &bind).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            // load_config already validated; report what was loaded
            log::info!("✓ Config OK");
            log::info!(
                "Credentials: {}",
                if config.auth.email.is_some() && config.auth.password.is_some() {
                    "configured"
                } else {
                    "missing (API tier disabled)"
                }
            );
            log::info!("Token policy: {:?}", config.auth.token_policy);
        }

        Command::Languages { lang } => {
            let requested = lang.as_deref().and_then(LanguageCode::parse);
            let order = language_order(requested.as_ref(), &config.languages.default_order);
            let codes: Vec<&str> = order.iter().map(|l| l.as_str()).collect();
            println!("{}", codes.join(" "));
        }
    }

    Ok(())
}
