use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::PathBuf;

pub const APP_NAME: &str = "orbit";
pub const APP_DISPLAY_NAME: &str = "Orbit";
pub const EXECUTABLE_PATHS: [&str; 2] = ["orbit", "bin/orbit"];
pub const SANDBOX_HELPER: &str = "chrome-sandbox";

const SYSTEM_INSTALL_DIR: &str = "/opt/orbit";
const SYSTEM_BIN_DIR: &str = "/usr/local/bin";
const SYSTEM_DESKTOP_DIR: &str = "/usr/share/applications";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallScope {
    System,
    User,
}

impl InstallScope {
    pub fn label(self) -> &'static str {
        match self {
            InstallScope::System => "system-wide",
            InstallScope::User => "per-user",
        }
    }

    pub fn other(self) -> InstallScope {
        match self {
            InstallScope::System => InstallScope::User,
            InstallScope::User => InstallScope::System,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstallTarget {
    pub scope: InstallScope,
    pub install_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub desktop_dir: PathBuf,
    pub icon_path: PathBuf,
}

impl InstallTarget {
    pub fn resolve(scope: InstallScope) -> Result<Self> {
        let target = match scope {
            InstallScope::System => {
                let install_dir = PathBuf::from(SYSTEM_INSTALL_DIR);
                InstallTarget {
                    scope,
                    icon_path: install_dir.join("icon.png"),
                    install_dir,
                    bin_dir: PathBuf::from(SYSTEM_BIN_DIR),
                    desktop_dir: PathBuf::from(SYSTEM_DESKTOP_DIR),
                }
            }
            InstallScope::User => {
                let base = BaseDirs::new().context("resolve home dir")?;
                let install_dir = base.data_local_dir().join(APP_NAME);
                InstallTarget {
                    scope,
                    icon_path: install_dir.join("icon.png"),
                    install_dir,
                    bin_dir: base.home_dir().join(".local").join("bin"),
                    desktop_dir: base.data_local_dir().join("applications"),
                }
            }
        };
        Ok(target)
    }

    pub fn requires_elevation(&self) -> bool {
        self.scope == InstallScope::System
    }
}

// User-data locations the installer backs up before an update and, with
// --clean, removes on uninstall. Resolved once per run so the transition
// code stays free of home-dir lookups.
#[derive(Debug, Clone)]
pub struct UserDataDirs {
    pub backup_root: PathBuf,
    pub backup_candidates: Vec<PathBuf>,
    pub clean_dirs: Vec<PathBuf>,
}

impl UserDataDirs {
    pub fn resolve() -> Result<Self> {
        let base = BaseDirs::new().context("resolve home dir")?;
        let config = base.config_dir().to_path_buf();
        let home = base.home_dir().to_path_buf();
        let backup_candidates = vec![
            config.join(APP_DISPLAY_NAME),
            config.join(APP_NAME),
            home.join(".local").join("state").join(APP_NAME),
        ];
        let mut clean_dirs = backup_candidates.clone();
        clean_dirs.push(base.cache_dir().join(APP_NAME));
        clean_dirs.push(base.cache_dir().join(APP_DISPLAY_NAME));
        Ok(UserDataDirs {
            backup_root: base.data_local_dir().join("orbit-install").join("backups"),
            backup_candidates,
            clean_dirs,
        })
    }
}
