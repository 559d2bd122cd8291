use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use strum::Display;

/// Hard cap on positional command strings per job.
pub const MAX_COMMANDS: usize = 9;

/// GPU generic-resource request, rendered as `--gres=gpu[:kind]:count`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct GpuRequest {
    pub kind: Option<String>,
    pub count: u32,
}

impl GpuRequest {
    pub fn gres(&self) -> String {
        match &self.kind {
            Some(kind) => format!("gpu:{}:{}", kind, self.count),
            None => format!("gpu:{}", self.count),
        }
    }
}

/// How the scheduler opens the job's output file.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Display)]
pub enum OpenMode {
    #[strum(to_string = "append")]
    Append,
    #[strum(to_string = "truncate")]
    Truncate,
}

/// Which caller environment variables the scheduler propagates into the job.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Display)]
pub enum ExportPolicy {
    #[strum(to_string = "ALL")]
    All,
    #[strum(to_string = "NONE")]
    None,
}

/// One batch job: a fixed resource profile plus an ordered list of opaque
/// command strings. Constructed once at submission time, immutable after.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JobSpec {
    pub partition: String,
    pub gpus: GpuRequest,
    pub job_name: String,
    pub mem_mb: u64,
    pub cpus: u32,
    pub time_limit: Duration,
    /// Log file lands at `<output_dir>/%j.out`, `%j` being the job id.
    pub output_dir: PathBuf,
    pub open_mode: OpenMode,
    pub export: ExportPolicy,
    /// In-container working directory, entered before any command runs.
    pub workdir: PathBuf,
    pub commands: Vec<String>,
    /// Run the final command a second time after the others finish.
    pub repeat_last: bool,
    /// Only start once the named job has finished successfully.
    pub depends_on: Option<u32>,
}

impl JobSpec {
    pub fn builder() -> JobSpecBuilder {
        JobSpecBuilder::new()
    }

    /// Output path handed to the scheduler, job-id token included.
    pub fn output_pattern(&self) -> PathBuf {
        self.output_dir.join("%j.out")
    }
}

#[derive(Default)]
pub struct JobSpecBuilder {
    partition: String,
    gpus: Option<GpuRequest>,
    job_name: String,
    mem_mb: u64,
    cpus: u32,
    time_limit: Option<Duration>,
    output_dir: PathBuf,
    open_mode: Option<OpenMode>,
    export: Option<ExportPolicy>,
    workdir: PathBuf,
    commands: Vec<String>,
    repeat_last: bool,
    depends_on: Option<u32>,
}

impl JobSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    pub fn gpus(mut self, kind: Option<String>, count: u32) -> Self {
        self.gpus = Some(GpuRequest { kind, count });
        self
    }

    pub fn job_name(mut self, job_name: impl Into<String>) -> Self {
        self.job_name = job_name.into();
        self
    }

    pub fn mem_mb(mut self, mem_mb: u64) -> Self {
        self.mem_mb = mem_mb;
        self
    }

    pub fn cpus(mut self, cpus: u32) -> Self {
        self.cpus = cpus;
        self
    }

    pub fn time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    pub fn output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn open_mode(mut self, open_mode: OpenMode) -> Self {
        self.open_mode = Some(open_mode);
        self
    }

    pub fn export(mut self, export: ExportPolicy) -> Self {
        self.export = Some(export);
        self
    }

    pub fn workdir(mut self, workdir: PathBuf) -> Self {
        self.workdir = workdir;
        self
    }

    pub fn commands(mut self, commands: Vec<String>) -> Self {
        self.commands = commands;
        self
    }

    pub fn repeat_last(mut self, repeat_last: bool) -> Self {
        self.repeat_last = repeat_last;
        self
    }

    pub fn depends_on(mut self, depends_on: Option<u32>) -> Self {
        self.depends_on = depends_on;
        self
    }

    pub fn build(self) -> Result<JobSpec> {
        if self.commands.len() > MAX_COMMANDS {
            return Err(anyhow!(
                "At most {MAX_COMMANDS} command strings are accepted (got {})",
                self.commands.len()
            ));
        }
        if self.repeat_last && self.commands.is_empty() {
            return Err(anyhow!("--repeat-last requires at least one command"));
        }
        Ok(JobSpec {
            partition: self.partition,
            gpus: self.gpus.unwrap_or(GpuRequest {
                kind: None,
                count: 1,
            }),
            job_name: self.job_name,
            mem_mb: self.mem_mb,
            cpus: self.cpus,
            time_limit: self.time_limit.unwrap_or(Duration::from_secs(48 * 3600)),
            output_dir: self.output_dir,
            open_mode: self.open_mode.unwrap_or(OpenMode::Append),
            export: self.export.unwrap_or(ExportPolicy::All),
            workdir: self.workdir,
            commands: self.commands,
            repeat_last: self.repeat_last,
            depends_on: self.depends_on,
        })
    }
}
