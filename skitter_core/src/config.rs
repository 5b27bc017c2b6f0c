use serde::Deserialize;
use std::path::PathBuf;

/// How the external target is invoked: `command[0]` is the executable,
/// the rest are fixed flags. The runner appends the input path as the
/// final argument.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct TargetSettings {
    pub command: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct CampaignSettings {
    /// Number of concurrent worker threads.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Per-worker iteration bound. Unset means fuzz until killed.
    #[serde(default)]
    pub max_iterations: Option<u64>,
    /// Minimum gap between progress lines from the reporting worker.
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,
    /// Base seed for the per-worker RNG streams. Unset draws from the OS.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

pub fn default_workers() -> usize {
    10
}

fn default_report_interval_ms() -> u64 {
    1000
}

impl Default for CampaignSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_iterations: None,
            report_interval_ms: default_report_interval_ms(),
            rng_seed: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct PathSettings {
    /// Directory of seed files, read once at startup.
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: PathBuf,
    /// Directory crashing inputs are archived into.
    #[serde(default = "default_crashes_dir")]
    pub crashes_dir: PathBuf,
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("corpus")
}

fn default_crashes_dir() -> PathBuf {
    PathBuf::from("crashes")
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            corpus_dir: default_corpus_dir(),
            crashes_dir: default_crashes_dir(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct SkitterConfig {
    #[serde(default)]
    pub target: TargetSettings,
    #[serde(default)]
    pub campaign: CampaignSettings,
    #[serde(default)]
    pub paths: PathSettings,
}

impl SkitterConfig {
    pub fn load_from_file(path: &PathBuf) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {:?}: {}", path, e))?;

        let config: SkitterConfig = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from config file {:?}: {}", path, e)
        })?;

        Ok(config)
    }
}
