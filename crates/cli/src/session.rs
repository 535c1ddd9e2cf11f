//! Local session storage (~/.config/purchase-tester/)
//!
//! Holds the two records the harness hands to the core: the integration
//! configuration (`config.toml`) and the user identity (`user.json`).

use anyhow::{anyhow, Context, Result};
use purchase_tester_core::{Config, Session, UserIdentity};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "purchase-tester";
const CONFIG_FILENAME: &str = "config.toml";
const USER_FILENAME: &str = "user.json";

/// File-backed configuration and identity records.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Store rooted at `dir` (created on first write).
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.config/purchase-tester/`, or `home` when given.
    pub fn locate(home: Option<&Path>) -> Result<Self> {
        if let Some(dir) = home {
            return Ok(Self::at(dir));
        }
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?
            .join(APP_DIR);
        Ok(Self::at(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context("Failed to create session directory")?;
        Ok(())
    }

    /// Reads the stored configuration, if any.
    pub fn load_config(&self) -> Result<Option<Config>> {
        let path = self.dir.join(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(None);
        }
        let config = Config::from_file(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        self.ensure_dir()?;
        config.save(&self.dir.join(CONFIG_FILENAME))
    }

    /// Reads the stored identity, if any.
    pub fn load_identity(&self) -> Result<Option<UserIdentity>> {
        let path = self.dir.join(USER_FILENAME);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let identity = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(identity))
    }

    pub fn save_identity(&self, identity: &UserIdentity) -> Result<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(identity)?;
        std::fs::write(self.dir.join(USER_FILENAME), json)?;
        Ok(())
    }

    /// Removes the stored identity (logout).
    pub fn clear_identity(&self) -> Result<()> {
        remove_if_exists(&self.dir.join(USER_FILENAME))
    }

    /// Removes both records (reset).
    pub fn clear_all(&self) -> Result<()> {
        remove_if_exists(&self.dir.join(CONFIG_FILENAME))?;
        remove_if_exists(&self.dir.join(USER_FILENAME))
    }

    /// Builds a validated session from both records.
    pub fn session(&self) -> Result<Session> {
        let config = self
            .load_config()?
            .ok_or_else(|| anyhow!("Not configured. Run 'purchase-tester setup' first."))?;
        let identity = self
            .load_identity()?
            .ok_or_else(|| anyhow!("No user selected. Run 'purchase-tester user' first."))?;
        Ok(Session::new(config, identity)?)
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}
