use anyhow::Result;
use clap::Parser;
use commands::handle_commands;
use slaunch::config::load_config;

mod cli;
mod commands;
mod help;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Slaunch::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.verbose)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(args.config.as_ref())?;

    if let Some(commands) = args.commands {
        handle_commands(&config, commands).await
    } else {
        commands::submit::handle_submit(&config, args.submit_args).await
    }
}
