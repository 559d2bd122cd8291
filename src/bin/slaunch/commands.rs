use crate::cli::Commands;
use slaunch::config::Config;

mod completions;
pub mod submit;

pub async fn handle_commands(config: &Config, commands: Commands) -> anyhow::Result<()> {
    match commands {
        Commands::Submit(submit_args) => submit::handle_submit(config, submit_args).await,
        Commands::Show(mut submit_args) => {
            submit_args.dry_run = true;
            submit::handle_submit(config, submit_args).await
        }
        Commands::Completions(completions_args) => {
            completions::handle_completions(completions_args)
        }
    }
}
