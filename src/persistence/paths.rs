use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const LEADERBOARD_FILE: &str = "leaderboard.dat";
pub const ACHIEVEMENTS_FILE: &str = "achievements.dat";
pub const SNIPPETS_FILE: &str = "snippets.dat";
pub const PROGRESS_FILE: &str = "progress.dat";
pub const SETTINGS_FILE: &str = "settings.json";

/// Per-user data directory holding every persisted file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDirs {
    root: PathBuf,
}

impl DataDirs {
    /// Platform data directory, falling back to `$HOME/.sysdiag`
    pub fn resolve() -> Self {
        let root = if let Some(pd) = ProjectDirs::from("", "", "sysdiag") {
            pd.data_dir().to_path_buf()
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".sysdiag")
        } else {
            PathBuf::from(".sysdiag")
        };
        Self { root }
    }

    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn leaderboard(&self) -> PathBuf {
        self.root.join(LEADERBOARD_FILE)
    }

    pub fn achievements(&self) -> PathBuf {
        self.root.join(ACHIEVEMENTS_FILE)
    }

    pub fn snippets(&self) -> PathBuf {
        self.root.join(SNIPPETS_FILE)
    }

    pub fn progress(&self) -> PathBuf {
        self.root.join(PROGRESS_FILE)
    }

    pub fn settings(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }
}
