use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the engine's static files live and which build to launch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DssatConfig {
    /// Directory holding Genotype/, Soil/, Pest/, StandardData/ and bin/.
    pub home: PathBuf,
    /// Engine executable. Defaults to `<home>/bin/dscsm<version>`.
    #[serde(default)]
    pub binary: Option<PathBuf>,
    #[serde(default = "default_version")]
    pub version: String,
    /// Symlink `home` into a short path under the temp dir before running.
    /// The engine truncates long directory names in its control file.
    #[serde(default)]
    pub stage_short_home: bool,
}

fn default_version() -> String {
    "048".into()
}

impl DssatConfig {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home:             home.into(),
            binary:           None,
            version:          default_version(),
            stage_short_home: false,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Executable name, e.g. `dscsm048`.
    pub fn binary_name(&self) -> String {
        format!("dscsm{}", self.version)
    }

    pub fn binary_path(&self) -> PathBuf {
        self.binary
            .clone()
            .unwrap_or_else(|| self.home.join("bin").join(self.binary_name()))
    }

    /// Control file name, e.g. `DSSATPRO.L48`.
    pub fn control_file_name(&self) -> String {
        format!("DSSATPRO.L{}", self.version.get(1..).unwrap_or(&self.version))
    }

    /// Batch file name, e.g. `DSSBatch.v48`.
    pub fn batch_file_name(&self) -> String {
        format!("DSSBatch.v{}", self.version.get(1..).unwrap_or(&self.version))
    }
}

/// Run-wide settings. Shared by every treatment of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Engine invocations allowed in flight at once. 1 runs sequentially.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Parent directory for per-treatment work areas. Defaults to the system temp dir.
    #[serde(default)]
    pub work_root: Option<PathBuf>,
    /// Leave work areas on disk after the run, for debugging engine input.
    #[serde(default)]
    pub keep_work_areas: bool,
    /// Season length used to pick weather years when no latest date is given.
    #[serde(default = "default_season_days")]
    pub season_days: u32,
    /// Per-treatment wall-clock limit. None waits forever.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub dssat: Option<DssatConfig>,
}

fn default_workers() -> usize {
    1
}

fn default_season_days() -> u32 {
    150
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers:         default_workers(),
            work_root:       None,
            keep_work_areas: false,
            season_days:     default_season_days(),
            timeout_secs:    None,
            dssat:           None,
        }
    }
}

impl RunConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: RunConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        if self.season_days == 0 {
            anyhow::bail!("season_days must be at least 1");
        }
        if self.timeout_secs == Some(0) {
            anyhow::bail!("timeout_secs must be positive when set");
        }
        Ok(())
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs().max(1));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn work_root(&self) -> PathBuf {
        self.work_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}
