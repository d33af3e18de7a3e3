use crate::errors::InstallerError;
use anyhow::Result;
use std::{env, path::Path};

pub trait DependencyChecker {
    fn ensure(&self, names: &[&str]) -> Result<()>;
}

// PATH-based lookup; the installer shells out to the tools it asks for
// (sudo for elevated copies), so presence on PATH is the contract.
pub struct PathChecker;

impl DependencyChecker for PathChecker {
    fn ensure(&self, names: &[&str]) -> Result<()> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| !on_path(name))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(InstallerError::DependencyMissing(missing.join(", ")).into())
        }
    }
}

fn on_path(name: &str) -> bool {
    let Some(path) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&path).any(|dir| is_executable(&dir.join(name)))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && std::fs::metadata(path)
            .map(|meta| meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
