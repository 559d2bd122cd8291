use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Seam between the launcher and the batch system. The only thing the rest
/// of the crate needs back from a submission is the scheduler's job id.
pub trait Scheduler {
    async fn submit(&self, script: String) -> Result<u32>;
}

/// Hands scripts to `sbatch` and reports the assigned job id. No retry and
/// no backoff: a rejected submission surfaces as an error with sbatch's
/// stderr attached, and everything after acceptance is the scheduler's
/// problem, observable only through the job's log file.
pub struct SbatchScheduler;

impl Scheduler for SbatchScheduler {
    async fn submit(&self, script: String) -> Result<u32> {
        let mut file = tempfile::Builder::new()
            .prefix("slaunch-")
            .suffix(".sbatch")
            .tempfile()
            .context("Failed to create batch script file")?;
        file.write_all(script.as_bytes())
            .context("Failed to write batch script")?;
        let path = file.path().to_path_buf();
        debug!("Submitting batch script at {}", path.display());

        let output = Command::new("sbatch")
            .arg(&path)
            .output()
            .await
            .context("Failed to run sbatch. Is it on PATH?")?;

        if !output.status.success() {
            return Err(anyhow!(
                "sbatch exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        parse_job_id(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Extract the job id from sbatch's acceptance line,
/// `Submitted batch job <id>`.
pub fn parse_job_id(stdout: &str) -> Result<u32> {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix("Submitted batch job "))
        .and_then(|id| id.trim().parse::<u32>().ok())
        .ok_or_else(|| anyhow!("Unrecognized sbatch output: {stdout:?}"))
}

/// The scheduler opens `<output_dir>/<job id>.out` itself but refuses to
/// create the directory, so the job would die at launch without this.
pub fn ensure_output_dir(output_dir: &Path) -> Result<()> {
    if !output_dir.exists() {
        std::fs::create_dir_all(output_dir).with_context(|| {
            format!("Failed to create output directory {}", output_dir.display())
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_acceptance_line() {
        assert_eq!(parse_job_id("Submitted batch job 123456\n").unwrap(), 123456);
    }

    #[test]
    fn parses_past_cluster_banners() {
        let stdout = "sbatch: queue wait times are elevated\nSubmitted batch job 77\n";
        assert_eq!(parse_job_id(stdout).unwrap(), 77);
    }

    #[test]
    fn rejects_garbage_output() {
        let err = parse_job_id("error: invalid partition\n").unwrap_err();
        assert!(err.to_string().contains("Unrecognized sbatch output"));
    }

    #[test]
    fn rejects_non_numeric_job_id() {
        assert!(parse_job_id("Submitted batch job abc\n").is_err());
    }

    #[test]
    fn creates_missing_output_dir() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        let nested = temp_dir.path().join("logs").join("gpu");
        assert!(!nested.exists());
        ensure_output_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // Second call is a no-op on an existing directory.
        ensure_output_dir(&nested).unwrap();
    }
}
