// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::{Cli, Commands};

mod cli;
mod commands;
mod logging;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();

    match args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::Whoami => return commands::whoami(&args.identity),
        _ => {}
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let client = reqwest::Client::new();

    runtime.block_on(async {
        match &args.command {
            Commands::Version | Commands::Whoami => Ok(()),
            Commands::Token { force } => commands::token(&client, &args.identity, *force).await,
            Commands::AdminSession { api_url } => {
                commands::admin_session(&client, &args.identity, api_url).await
            }
        }
    })
}
