use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::extract::{DEFAULT_OVERFLOW_LIMIT, ExtractOptions};
use crate::mount::{MountMode, MountOptions};

/// Serializable workspace settings. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Hashtable files, highest precedence first.
    pub hashtables: Vec<PathBuf>,
    pub mount_mode: MountMode,
    pub guess_on_miss: bool,
    pub overflow_limit: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            hashtables: Vec::new(),
            mount_mode: MountMode::Merge,
            guess_on_miss: true,
            overflow_limit: DEFAULT_OVERFLOW_LIMIT,
        }
    }
}

impl WorkspaceConfig {
    pub fn mount_options(&self) -> MountOptions {
        MountOptions {
            mode: self.mount_mode,
            guess_on_miss: self.guess_on_miss,
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            overflow_limit: self.overflow_limit,
            ..Default::default()
        }
    }
}
