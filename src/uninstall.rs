use crate::{
    desktop::DesktopIntegrator,
    errors::InstallerError,
    target::{InstallScope, InstallTarget, UserDataDirs, APP_NAME},
};
use anyhow::{Context, Result};
use std::{fs, path::Path, process::Command};

#[derive(Debug)]
pub enum UninstallOutcome {
    Removed { cleaned: bool },
    NotInstalled { other_scope: Option<InstallScope> },
}

pub fn uninstall(
    target: &InstallTarget,
    other: Option<&InstallTarget>,
    user_dirs: &UserDataDirs,
    clean: bool,
    integrator: &dyn DesktopIntegrator,
) -> Result<UninstallOutcome> {
    if !target.install_dir.exists() {
        let other_scope = other
            .filter(|alternate| alternate.install_dir.exists())
            .map(|alternate| alternate.scope);
        return Ok(UninstallOutcome::NotInstalled { other_scope });
    }

    let elevate = target.requires_elevation() && !tree_removable(&target.install_dir);
    remove_install_dir(&target.install_dir, elevate)?;
    remove_launcher_link(target, elevate);

    if let Err(err) = integrator.unregister_app(&target.desktop_dir, elevate) {
        eprintln!("warning: could not remove desktop entries: {err:#}");
    }

    if clean {
        for dir in &user_dirs.clean_dirs {
            if dir.exists() {
                if let Err(err) = fs::remove_dir_all(dir) {
                    eprintln!("warning: could not remove {}: {err}", dir.display());
                }
            }
        }
    }

    Ok(UninstallOutcome::Removed { cleaned: clean })
}

fn tree_removable(install_dir: &Path) -> bool {
    install_dir
        .parent()
        .map(crate::install::dir_writable)
        .unwrap_or(false)
}

fn remove_install_dir(install_dir: &Path, elevate: bool) -> Result<()> {
    if elevate {
        let status = Command::new("sudo")
            .arg("rm")
            .arg("-rf")
            .arg(install_dir)
            .status()
            .context("run sudo rm")?;
        if !status.success() {
            return Err(InstallerError::InstallStepFailed(format!(
                "remove {}",
                install_dir.display()
            ))
            .into());
        }
        return Ok(());
    }
    fs::remove_dir_all(install_dir).map_err(|err| {
        InstallerError::InstallStepFailed(format!(
            "remove {}: {err}",
            install_dir.display()
        ))
    })?;
    Ok(())
}

// Only ever removes an actual symlink; a regular file or directory that
// happens to occupy the launcher path is left alone with a warning.
fn remove_launcher_link(target: &InstallTarget, elevate: bool) {
    let link = target.bin_dir.join(APP_NAME);
    let Ok(meta) = fs::symlink_metadata(&link) else {
        return;
    };
    if !meta.file_type().is_symlink() {
        eprintln!(
            "warning: {} is not a symlink, leaving it in place",
            link.display()
        );
        return;
    }
    let removed = if elevate {
        Command::new("sudo")
            .arg("rm")
            .arg("-f")
            .arg(&link)
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    } else {
        fs::remove_file(&link).is_ok()
    };
    if !removed {
        eprintln!("warning: could not remove {}", link.display());
    }
}
