use crate::get_config_dir;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default)]
    pub resources: ResourcesConfig,
    #[serde(default)]
    pub container: ContainerConfig,
    /// Directory the scheduler writes `<job id>.out` logs into.
    /// Must exist at submission time; created if missing.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// Fixed resource profile stamped into every submission unless a CLI flag
/// overrides a field.
#[derive(Deserialize, Debug, Clone)]
pub struct ResourcesConfig {
    #[serde(default = "default_partition")]
    pub partition: String,
    /// GPU model name for the gres request (e.g. "rtx8000"). None requests
    /// any GPU.
    #[serde(default)]
    pub gpu_type: Option<String>,
    #[serde(default = "default_gpu_count")]
    pub gpus: u32,
    /// Memory limit, scheduler grammar ("64G", "1024M", plain MB).
    #[serde(default = "default_mem")]
    pub mem: String,
    #[serde(default = "default_cpus")]
    pub cpus: u32,
    /// Wall-clock limit, "HH:MM:SS" / "MM:SS" / "MM".
    #[serde(default = "default_time")]
    pub time: String,
}

/// Container invocation the job body execs into.
#[derive(Deserialize, Debug, Clone)]
pub struct ContainerConfig {
    /// Read-only overlay image supplying the prebuilt software environment.
    #[serde(default = "default_overlay")]
    pub overlay: PathBuf,
    /// Base .sif image.
    #[serde(default = "default_image")]
    pub image: PathBuf,
    /// Activation script sourced inside the container before anything else.
    #[serde(default = "default_env_script")]
    pub env_script: PathBuf,
    /// Conda environment activated after sourcing, if any.
    #[serde(default)]
    pub env_name: Option<String>,
    /// In-container working directory. Defaults to the caller's cwd at
    /// submission time when unset.
    #[serde(default)]
    pub workdir: Option<PathBuf>,
}

fn default_partition() -> String {
    "gpu".to_string()
}

fn default_gpu_count() -> u32 {
    1
}

fn default_mem() -> String {
    "64G".to_string()
}

fn default_cpus() -> u32 {
    8
}

fn default_time() -> String {
    "48:00:00".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("slurm_logs")
}

fn default_overlay() -> PathBuf {
    PathBuf::from("overlay.ext3")
}

fn default_image() -> PathBuf {
    PathBuf::from("/scratch/work/public/singularity/cuda11.0-cudnn8-devel-ubuntu18.04.sif")
}

fn default_env_script() -> PathBuf {
    PathBuf::from("/ext3/env.sh")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resources: ResourcesConfig::default(),
            container: ContainerConfig::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            partition: default_partition(),
            gpu_type: None,
            gpus: default_gpu_count(),
            mem: default_mem(),
            cpus: default_cpus(),
            time: default_time(),
        }
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            overlay: default_overlay(),
            image: default_image(),
            env_script: default_env_script(),
            env_name: None,
            workdir: None,
        }
    }
}

pub fn load_config(config_path: Option<&PathBuf>) -> Result<Config, config::ConfigError> {
    let mut config_vec = vec![];

    // User-provided config file
    if let Some(config_path) = config_path {
        if config_path.exists() {
            config_vec.push(config_path.clone());
        } else {
            eprintln!("Warning: Config file {config_path:?} not found.");
        }
    }

    // Default config file
    if let Ok(default_config_path) = get_config_dir().map(|d| d.join("slaunch.toml")) {
        if default_config_path.exists() {
            config_vec.push(default_config_path);
        }
    }

    let settings = config::Config::builder();
    let settings = config_vec.iter().fold(settings, |s, path| {
        s.add_source(config::File::from(path.as_path()))
    });

    settings
        .add_source(
            config::Environment::with_prefix("SLAUNCH")
                .separator("_")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
