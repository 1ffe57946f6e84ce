use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional project configuration loaded from `cascade.config.json` in the
/// working directory. Command-line flags override anything set here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory scanned for `.scss` sources when compiling a project.
    pub src_dir: Option<String>,
    /// Directory compiled CSS is written to.
    pub out_dir: Option<String>,
    /// Default output style (nested, expanded, compact, compressed).
    pub style: Option<String>,
    /// Extra include paths for `@import`.
    #[serde(default)]
    pub include_paths: Vec<String>,
}

impl Config {
    pub fn load(cwd: &str) -> Result<Self> {
        let path = Path::new(cwd).join("cascade.config.json");
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn src_dir(&self, cwd: &str) -> PathBuf {
        match &self.src_dir {
            Some(dir) => Path::new(cwd).join(dir),
            None => PathBuf::from(cwd),
        }
    }

    pub fn out_dir(&self, cwd: &str) -> PathBuf {
        match &self.out_dir {
            Some(dir) => Path::new(cwd).join(dir),
            None => Path::new(cwd).join("dist"),
        }
    }
}
