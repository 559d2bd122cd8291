use crate::cli;
use anyhow::{anyhow, Context, Result};
use slaunch::config::{Config, ContainerConfig};
use slaunch::history::SubmissionHistory;
use slaunch::job::{JobSpec, OpenMode};
use slaunch::script;
use slaunch::submit::{ensure_output_dir, SbatchScheduler, Scheduler};
use slaunch::utils::{parse_memory_limit, parse_time_limit};

pub(crate) async fn handle_submit(config: &Config, args: cli::SubmitArgs) -> Result<()> {
    let dry_run = args.dry_run;
    let mut history = SubmissionHistory::load().context("Failed to load submission history")?;

    let (spec, container) = build_spec(config, args, &history)?;
    let script = script::render(&spec, &container);

    if dry_run {
        print!("{script}");
        return Ok(());
    }

    ensure_output_dir(&spec.output_dir)?;
    let job_id = submit_script(&SbatchScheduler, &mut history, script).await?;
    println!("Submitted batch job {job_id}");
    Ok(())
}

async fn submit_script(
    scheduler: &impl Scheduler,
    history: &mut SubmissionHistory,
    script: String,
) -> Result<u32> {
    let job_id = scheduler
        .submit(script)
        .await
        .context("Failed to submit batch job")?;
    history
        .record(job_id)
        .context("Failed to persist submission history")?;
    Ok(job_id)
}

fn build_spec(
    config: &Config,
    args: cli::SubmitArgs,
    history: &SubmissionHistory,
) -> Result<(JobSpec, ContainerConfig)> {
    let resources = &config.resources;

    let workdir = match args.workdir.or_else(|| config.container.workdir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let mem_mb = parse_memory_limit(args.mem.as_deref().unwrap_or(&resources.mem))?;
    let time_limit = parse_time_limit(args.time.as_deref().unwrap_or(&resources.time))?;
    let depends_on = resolve_dependency(args.depends_on, history)?;

    let mut builder = JobSpec::builder()
        .partition(args.partition.unwrap_or_else(|| resources.partition.clone()))
        .gpus(
            args.gpu_type.or_else(|| resources.gpu_type.clone()),
            args.gpus.unwrap_or(resources.gpus),
        )
        .job_name(args.job_name.unwrap_or_else(|| "slaunch".to_string()))
        .mem_mb(mem_mb)
        .cpus(args.cpus.unwrap_or(resources.cpus))
        .time_limit(time_limit)
        .output_dir(args.output_dir.unwrap_or_else(|| config.output_dir.clone()))
        .workdir(workdir)
        .commands(args.commands)
        .repeat_last(args.repeat_last)
        .depends_on(depends_on);
    if args.truncate {
        builder = builder.open_mode(OpenMode::Truncate);
    }
    let spec = builder.build()?;

    let container = ContainerConfig {
        overlay: args.overlay.unwrap_or_else(|| config.container.overlay.clone()),
        image: args.image.unwrap_or_else(|| config.container.image.clone()),
        env_script: config.container.env_script.clone(),
        env_name: args.env_name.or_else(|| config.container.env_name.clone()),
        workdir: None,
    };

    Ok((spec, container))
}

fn resolve_dependency(
    depends_on: Option<String>,
    history: &SubmissionHistory,
) -> Result<Option<u32>> {
    match depends_on {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(anyhow!("Dependency value cannot be empty"));
            }
            if trimmed == "@" {
                return history
                    .recent(1)
                    .ok_or_else(|| anyhow!("No previous submissions found for '@' dependency"))
                    .map(Some);
            }

            if let Some(offset_str) = trimmed.strip_prefix("@~") {
                if offset_str.is_empty() {
                    return Err(anyhow!(
                        "Invalid dependency shorthand '@~' without an offset value"
                    ));
                }
                let offset = offset_str
                    .parse::<usize>()
                    .map_err(|_| anyhow!("Invalid offset value in dependency: {trimmed}"))?;
                if offset == 0 {
                    return Err(anyhow!("Dependency offset must be at least 1 (got 0)"));
                }
                return history
                    .recent(offset)
                    .ok_or_else(|| {
                        anyhow!(
                            "Only {} previous submission(s) recorded; cannot resolve '{}'",
                            history.len(),
                            trimmed
                        )
                    })
                    .map(Some);
            }

            let parsed = trimmed
                .parse::<u32>()
                .map_err(|_| anyhow!("Invalid dependency value: {trimmed}"))?;
            Ok(Some(parsed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    mockall::mock! {
        Sched {}
        impl Scheduler for Sched {
            async fn submit(&self, script: String) -> Result<u32>;
        }
    }

    fn history_with(ids: &[u32]) -> (SubmissionHistory, tempfile::TempDir) {
        let temp_dir = tempdir().expect("tempdir");
        let mut history =
            SubmissionHistory::load_from_dir(temp_dir.path().to_path_buf()).expect("history");
        for &id in ids {
            history.record(id).expect("record");
        }
        (history, temp_dir)
    }

    #[test]
    fn resolves_numeric_dependency() -> Result<()> {
        let (history, _guard) = history_with(&[]);
        let resolved = resolve_dependency(Some("42".to_string()), &history)?;
        assert_eq!(resolved, Some(42));
        Ok(())
    }

    #[test]
    fn resolves_at_dependency_using_last_submission() -> Result<()> {
        let (history, _guard) = history_with(&[10, 11, 12]);
        let resolved = resolve_dependency(Some("@".to_string()), &history)?;
        assert_eq!(resolved, Some(12));
        Ok(())
    }

    #[test]
    fn resolves_at_offset_dependency() -> Result<()> {
        let (history, _guard) = history_with(&[101, 102, 103, 104]);
        let resolved = resolve_dependency(Some("@~3".to_string()), &history)?;
        assert_eq!(resolved, Some(102));
        Ok(())
    }

    #[test]
    fn errors_when_history_is_too_short() {
        let (history, _guard) = history_with(&[5]);
        let err = resolve_dependency(Some("@~2".to_string()), &history).unwrap_err();
        assert!(err
            .to_string()
            .contains("Only 1 previous submission(s) recorded"));
    }

    #[test]
    fn errors_on_invalid_shorthand() {
        let (history, _guard) = history_with(&[7]);
        let err = resolve_dependency(Some("@foo".to_string()), &history).unwrap_err();
        assert!(err.to_string().contains("Invalid dependency value: @foo"));
    }

    #[test]
    fn cli_flags_override_config() -> Result<()> {
        let (history, _guard) = history_with(&[]);
        let config = Config::default();
        let args = cli::SubmitArgs {
            commands: vec!["echo hello".to_string()],
            partition: Some("a100".to_string()),
            mem: Some("128G".to_string()),
            gpus: Some(4),
            gpu_type: Some("a100".to_string()),
            ..Default::default()
        };
        let (spec, _container) = build_spec(&config, args, &history)?;
        assert_eq!(spec.partition, "a100");
        assert_eq!(spec.mem_mb, 128 * 1024);
        assert_eq!(spec.gpus.gres(), "gpu:a100:4");
        // Fields without a flag fall back to the config profile.
        assert_eq!(spec.cpus, config.resources.cpus);
        Ok(())
    }

    #[test]
    fn config_profile_is_the_default() -> Result<()> {
        let (history, _guard) = history_with(&[]);
        let config = Config::default();
        let args = cli::SubmitArgs {
            commands: vec!["echo hello".to_string()],
            ..Default::default()
        };
        let (spec, container) = build_spec(&config, args, &history)?;
        assert_eq!(spec.partition, "gpu");
        assert_eq!(spec.mem_mb, 64 * 1024);
        assert_eq!(spec.job_name, "slaunch");
        assert_eq!(container.env_script.to_str().unwrap(), "/ext3/env.sh");
        Ok(())
    }

    #[tokio::test]
    async fn submission_is_recorded_in_history() -> Result<()> {
        let (mut history, _guard) = history_with(&[]);
        let mut scheduler = MockSched::new();
        scheduler
            .expect_submit()
            .withf(|script: &String| script.contains("echo hello"))
            .once()
            .returning(|_| Ok(31337));

        let script = "#!/bin/bash\necho hello\n".to_string();
        let job_id = submit_script(&scheduler, &mut history, script).await?;
        assert_eq!(job_id, 31337);
        assert_eq!(history.recent(1), Some(31337));
        Ok(())
    }
}
