//! Renders a job specification into a submittable sbatch script.

use crate::config::ContainerConfig;
use crate::job::JobSpec;
use crate::utils::{format_memory, format_slurm_time};
use std::borrow::Cow;

/// Render the full batch script: `#SBATCH` directive header followed by a
/// single container exec line. Commands run sequentially under default
/// shell semantics, so a non-zero exit does not halt the remaining ones.
pub fn render(spec: &JobSpec, container: &ContainerConfig) -> String {
    let mut script = String::from("#!/bin/bash\n");

    let mut directive = |body: String| {
        script.push_str("#SBATCH --");
        script.push_str(&body);
        script.push('\n');
    };

    directive(format!("partition={}", spec.partition));
    directive(format!("gres={}", spec.gpus.gres()));
    directive(format!("job-name={}", spec.job_name));
    directive(format!("mem={}", format_memory(spec.mem_mb)));
    directive(format!("cpus-per-task={}", spec.cpus));
    directive(format!("time={}", format_slurm_time(spec.time_limit)));
    directive(format!("output={}", spec.output_pattern().display()));
    directive(format!("open-mode={}", spec.open_mode));
    directive(format!("export={}", spec.export));
    if let Some(job_id) = spec.depends_on {
        directive(format!("dependency=afterok:{job_id}"));
    }

    script.push('\n');
    script.push_str(&exec_line(spec, container));
    script.push('\n');
    script
}

/// The container invocation: read-only overlay over the base image, with
/// activation, `cd`, and the user commands chained inside one `bash -c`.
fn exec_line(spec: &JobSpec, container: &ContainerConfig) -> String {
    let inner = inner_script(spec, container);
    format!(
        "singularity exec --nv --overlay {}:ro {} /bin/bash -c {}",
        container.overlay.display(),
        container.image.display(),
        shell_escape::escape(Cow::Owned(inner)),
    )
}

fn inner_script(spec: &JobSpec, container: &ContainerConfig) -> String {
    let mut parts = vec![format!("source {}", container.env_script.display())];
    if let Some(env_name) = &container.env_name {
        parts.push(format!("conda activate {env_name}"));
    }
    if spec.workdir.as_os_str().is_empty() {
        // No workdir means the job inherits whatever the runtime picks.
    } else {
        parts.push(format!("cd {}", spec.workdir.display()));
    }

    // Unused slots arrive as empty strings; they are no-ops and dropped.
    let commands: Vec<&str> = spec
        .commands
        .iter()
        .map(String::as_str)
        .filter(|c| !c.trim().is_empty())
        .collect();
    parts.extend(commands.iter().map(|c| c.to_string()));
    if spec.repeat_last {
        if let Some(last) = commands.last() {
            parts.push(last.to_string());
        }
    }

    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{ExportPolicy, OpenMode};
    use std::path::PathBuf;
    use std::time::Duration;

    fn sample_container() -> ContainerConfig {
        ContainerConfig {
            overlay: PathBuf::from("overlay.ext3"),
            image: PathBuf::from("/images/cuda.sif"),
            env_script: PathBuf::from("/ext3/env.sh"),
            env_name: Some("rl".to_string()),
            workdir: None,
        }
    }

    fn sample_spec(commands: Vec<&str>) -> JobSpec {
        JobSpec::builder()
            .partition("gpu")
            .gpus(Some("rtx8000".to_string()), 1)
            .job_name("train")
            .mem_mb(65536)
            .cpus(8)
            .time_limit(Duration::from_secs(48 * 3600))
            .output_dir(PathBuf::from("slurm_logs"))
            .workdir(PathBuf::from("/home/user/project"))
            .commands(commands.into_iter().map(String::from).collect())
            .build()
            .unwrap()
    }

    #[test]
    fn header_carries_every_directive() {
        let script = render(&sample_spec(vec!["echo hello"]), &sample_container());
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("#SBATCH --partition=gpu\n"));
        assert!(script.contains("#SBATCH --gres=gpu:rtx8000:1\n"));
        assert!(script.contains("#SBATCH --job-name=train\n"));
        assert!(script.contains("#SBATCH --mem=64G\n"));
        assert!(script.contains("#SBATCH --cpus-per-task=8\n"));
        assert!(script.contains("#SBATCH --time=48:00:00\n"));
        assert!(script.contains("#SBATCH --output=slurm_logs/%j.out\n"));
        assert!(script.contains("#SBATCH --open-mode=append\n"));
        assert!(script.contains("#SBATCH --export=ALL\n"));
        // Command failures must not halt the remaining commands.
        assert!(!script.contains("set -e"));
    }

    #[test]
    fn body_runs_commands_in_order_inside_the_container() {
        let script = render(
            &sample_spec(vec!["python train.py", "python eval.py"]),
            &sample_container(),
        );
        let body = script.lines().last().unwrap();
        assert!(body.starts_with("singularity exec --nv --overlay overlay.ext3:ro /images/cuda.sif /bin/bash -c "));
        let activate = body.find("conda activate rl").unwrap();
        let cd = body.find("cd /home/user/project").unwrap();
        let train = body.find("python train.py").unwrap();
        let eval_pos = body.find("python eval.py").unwrap();
        assert!(body.find("source /ext3/env.sh").unwrap() < activate);
        assert!(activate < cd);
        assert!(cd < train);
        assert!(train < eval_pos);
    }

    #[test]
    fn inner_script_is_single_quoted() {
        let script = render(&sample_spec(vec!["echo hello"]), &sample_container());
        let body = script.lines().last().unwrap();
        assert!(body.ends_with("'"));
        assert!(body.contains("/bin/bash -c 'source /ext3/env.sh;"));
    }

    #[test]
    fn empty_slots_are_dropped() {
        let spec = sample_spec(vec!["echo one", "", "  ", "echo two"]);
        let inner = inner_script(&spec, &sample_container());
        assert_eq!(inner.matches("echo").count(), 2);
        assert!(inner.ends_with("echo one; echo two"));
    }

    #[test]
    fn repeat_last_appends_one_extra_copy() {
        let mut spec = sample_spec(vec!["echo a", "echo b"]);
        spec.repeat_last = true;
        let inner = inner_script(&spec, &sample_container());
        assert!(inner.ends_with("echo a; echo b; echo b"));
        assert_eq!(inner.matches("echo b").count(), 2);
    }

    #[test]
    fn dependency_renders_afterok() {
        let mut spec = sample_spec(vec!["echo a"]);
        spec.depends_on = Some(4242);
        let script = render(&spec, &sample_container());
        assert!(script.contains("#SBATCH --dependency=afterok:4242\n"));
    }

    #[test]
    fn truncate_and_export_none_render() {
        let mut spec = sample_spec(vec!["echo a"]);
        spec.open_mode = OpenMode::Truncate;
        spec.export = ExportPolicy::None;
        let script = render(&spec, &sample_container());
        assert!(script.contains("#SBATCH --open-mode=truncate\n"));
        assert!(script.contains("#SBATCH --export=NONE\n"));
    }

    #[test]
    fn no_env_name_skips_activation() {
        let mut container = sample_container();
        container.env_name = None;
        let inner = inner_script(&sample_spec(vec!["echo a"]), &container);
        assert!(!inner.contains("conda activate"));
        assert!(inner.starts_with("source /ext3/env.sh; cd "));
    }
}
