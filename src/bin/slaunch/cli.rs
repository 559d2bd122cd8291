use crate::help::COMPLETIONS_HELP;
use clap::{Parser, ValueEnum};
use clap_complete::Shell as CompleteShell;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "slaunch",
    author,
    version,
    about = "Submits containerized GPU jobs to SLURM from up to nine command strings."
)]
#[command(styles = slaunch::utils::STYLES)]
pub struct Slaunch {
    /// Sub Commands
    #[command(subcommand)]
    pub commands: Option<Commands>,

    #[command(flatten)]
    pub submit_args: SubmitArgs,

    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,

    #[arg(long, global = true, help = "Path to the config file")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub enum Commands {
    /// Render and submit a batch job (the default when no subcommand is given)
    Submit(SubmitArgs),
    /// Render the batch script to stdout without submitting
    Show(SubmitArgs),
    /// Generate tab-completion scripts for your shell
    #[command(
        after_help = COMPLETIONS_HELP,
        arg_required_else_help = true
    )]
    Completions(CompletionsArgs),
}

#[derive(Debug, Parser, Clone, Default)]
pub struct SubmitArgs {
    /// Command strings to run in order inside the container (at most nine)
    #[arg(value_name = "COMMAND")]
    pub commands: Vec<String>,

    /// The job name
    #[arg(short = 'J', long)]
    pub job_name: Option<String>,

    /// The partition to submit to
    #[arg(short, long)]
    pub partition: Option<String>,

    /// The GPU count to request
    #[arg(short, long, value_name = "NUMS")]
    pub gpus: Option<u32>,

    /// The GPU model to request (e.g. rtx8000)
    #[arg(long)]
    pub gpu_type: Option<String>,

    /// Memory limit (e.g. 64G, 1024M)
    #[arg(long)]
    pub mem: Option<String>,

    /// CPU cores per task
    #[arg(short, long)]
    pub cpus: Option<u32>,

    /// Wall-clock limit (HH:MM:SS, MM:SS, or MM)
    #[arg(short, long)]
    pub time: Option<String>,

    /// Directory for the per-job log file
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Read-only overlay image
    #[arg(long)]
    pub overlay: Option<PathBuf>,

    /// Base container image
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Conda environment to activate inside the container
    #[arg(short, long)]
    pub env_name: Option<String>,

    /// Working directory inside the container
    #[arg(short = 'd', long)]
    pub workdir: Option<PathBuf>,

    /// Truncate the log file instead of appending
    #[arg(long)]
    pub truncate: bool,

    /// Run the last command a second time after the others
    #[arg(long)]
    pub repeat_last: bool,

    /// Job id this job depends on; supports '@' (last submission)
    /// and '@~N' (N submissions back)
    #[arg(long)]
    pub depends_on: Option<String>,

    /// Print the rendered script instead of submitting it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
    Elvish,
}

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// The shell to generate the completions for
    pub shell: Shell,
}

impl From<Shell> for CompleteShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => CompleteShell::Bash,
            Shell::Elvish => CompleteShell::Elvish,
            Shell::Fish => CompleteShell::Fish,
            Shell::Powershell => CompleteShell::PowerShell,
            Shell::Zsh => CompleteShell::Zsh,
        }
    }
}
