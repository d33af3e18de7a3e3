use crate::{
    backup,
    desktop::DesktopIntegrator,
    errors::InstallerError,
    target::{InstallTarget, UserDataDirs, APP_NAME, EXECUTABLE_PATHS, SANDBOX_HELPER},
};
use anyhow::{Context, Result};
use std::{
    fs,
    io::{self, BufRead, IsTerminal, Write},
    path::{Path, PathBuf},
    process::Command,
};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct InstallReport {
    pub fresh: bool,
    pub backup_dir: Option<PathBuf>,
}

pub fn install(
    payload: &Path,
    target: &InstallTarget,
    user_dirs: &UserDataDirs,
    integrator: &dyn DesktopIntegrator,
) -> Result<InstallReport> {
    let fresh = !target.install_dir.exists();
    // Backup failures only warn; the original data stays in place either way.
    let backup_dir = if fresh {
        None
    } else {
        backup::backup_user_data(&user_dirs.backup_candidates, &user_dirs.backup_root)
    };

    let elevate = target.requires_elevation() && !parent_writable(&target.install_dir);
    if elevate && io::stdin().is_terminal() && !confirm_elevation(&target.install_dir)? {
        return Err(InstallerError::PermissionDenied("elevation declined".to_string()).into());
    }

    copy_payload(payload, &target.install_dir, elevate)?;
    set_executable_bits(&target.install_dir, elevate)?;
    link_launcher(target, elevate)?;
    integrator.register_app(&target.install_dir, &target.icon_path, elevate)?;

    Ok(InstallReport { fresh, backup_dir })
}

// Writability of the closest existing ancestor decides whether the copy
// needs sudo; per-user targets never reach this path.
fn parent_writable(install_dir: &Path) -> bool {
    let mut probe = install_dir.parent();
    while let Some(dir) = probe {
        if dir.exists() {
            return dir_writable(dir);
        }
        probe = dir.parent();
    }
    false
}

pub(crate) fn dir_writable(dir: &Path) -> bool {
    let test_path = dir.join(".orbit-install-write-test");
    match fs::File::create(&test_path) {
        Ok(_) => {
            let _ = fs::remove_file(&test_path);
            true
        }
        Err(_) => false,
    }
}

fn confirm_elevation(install_dir: &Path) -> Result<bool> {
    print!(
        "Installing to {} requires administrator privileges. Continue? [y/N] ",
        install_dir.display()
    );
    io::stdout().flush().context("flush prompt")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("read confirmation")?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn copy_payload(payload: &Path, install_dir: &Path, elevate: bool) -> Result<()> {
    if elevate {
        run_install_step(&["mkdir", "-p"], &[install_dir])?;
        let source = format!("{}/.", payload.display());
        let status = Command::new("sudo")
            .arg("cp")
            .arg("-r")
            .arg(&source)
            .arg(install_dir)
            .status()
            .context("run sudo cp")?;
        if !status.success() {
            return Err(InstallerError::InstallStepFailed(format!(
                "copy payload into {}",
                install_dir.display()
            ))
            .into());
        }
        return Ok(());
    }

    fs::create_dir_all(install_dir).map_err(|err| {
        InstallerError::InstallStepFailed(format!(
            "create {}: {err}",
            install_dir.display()
        ))
    })?;
    for entry in WalkDir::new(payload).follow_links(false) {
        let entry = entry
            .map_err(|err| InstallerError::InstallStepFailed(format!("walk payload: {err}")))?;
        let rel = entry
            .path()
            .strip_prefix(payload)
            .context("payload rel path")?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let dest = install_dir.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(|err| {
                InstallerError::InstallStepFailed(format!("create {}: {err}", dest.display()))
            })?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &dest).map_err(|err| {
                InstallerError::InstallStepFailed(format!("copy {}: {err}", dest.display()))
            })?;
        } else if entry.file_type().is_symlink() {
            // Electron-style payloads link versioned shared objects; the
            // links must survive the copy the same way `cp -r` keeps them.
            let link_target = fs::read_link(entry.path()).map_err(|err| {
                InstallerError::InstallStepFailed(format!("read link {}: {err}", dest.display()))
            })?;
            if fs::symlink_metadata(&dest).is_ok() {
                fs::remove_file(&dest).map_err(|err| {
                    InstallerError::InstallStepFailed(format!(
                        "replace {}: {err}",
                        dest.display()
                    ))
                })?;
            }
            create_symlink(&link_target, &dest).map_err(|err| {
                InstallerError::InstallStepFailed(format!("symlink {}: {err}", dest.display()))
            })?;
        }
    }
    Ok(())
}

// Launchers get the executable bit; the sandbox helper additionally needs
// setuid so the app's process isolation works without running elevated.
fn set_executable_bits(install_dir: &Path, elevate: bool) -> Result<()> {
    for relative in EXECUTABLE_PATHS {
        let path = install_dir.join(relative);
        if path.is_file() {
            set_mode(&path, 0o755, elevate)?;
        }
    }
    for parent in ["", "bin"] {
        let helper = install_dir.join(parent).join(SANDBOX_HELPER);
        if helper.is_file() {
            set_mode(&helper, 0o4755, elevate)?;
        }
    }
    Ok(())
}

fn set_mode(path: &Path, mode: u32, elevate: bool) -> Result<()> {
    if elevate {
        return run_install_step(&["chmod", &format!("{mode:o}")], &[path]);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)
            .map_err(|err| {
                InstallerError::InstallStepFailed(format!("stat {}: {err}", path.display()))
            })?
            .permissions();
        perms.set_mode(mode);
        fs::set_permissions(path, perms).map_err(|err| {
            InstallerError::InstallStepFailed(format!("chmod {}: {err}", path.display()))
        })?;
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
    Ok(())
}

fn link_launcher(target: &InstallTarget, elevate: bool) -> Result<()> {
    let executable = EXECUTABLE_PATHS
        .iter()
        .map(|relative| target.install_dir.join(relative))
        .find(|path| path.is_file())
        .ok_or_else(|| {
            InstallerError::InstallStepFailed("installed executable missing".to_string())
        })?;
    let link = target.bin_dir.join(APP_NAME);

    if elevate {
        run_install_step(&["mkdir", "-p"], &[target.bin_dir.as_path()])?;
        let status = Command::new("sudo")
            .arg("ln")
            .arg("-sfn")
            .arg(&executable)
            .arg(&link)
            .status()
            .context("run sudo ln")?;
        if !status.success() {
            return Err(InstallerError::InstallStepFailed(format!(
                "symlink {}",
                link.display()
            ))
            .into());
        }
        return Ok(());
    }

    fs::create_dir_all(&target.bin_dir).map_err(|err| {
        InstallerError::InstallStepFailed(format!(
            "create {}: {err}",
            target.bin_dir.display()
        ))
    })?;
    if fs::symlink_metadata(&link).is_ok() {
        fs::remove_file(&link).map_err(|err| {
            InstallerError::InstallStepFailed(format!(
                "replace stale link {}: {err}",
                link.display()
            ))
        })?;
    }
    create_symlink(&executable, &link).map_err(|err| {
        InstallerError::InstallStepFailed(format!("symlink {}: {err}", link.display()))
    })?;
    Ok(())
}

fn run_install_step(command: &[&str], paths: &[&Path]) -> Result<()> {
    let status = Command::new("sudo")
        .args(command)
        .args(paths)
        .status()
        .context("run sudo")?;
    if !status.success() {
        return Err(InstallerError::InstallStepFailed(format!(
            "sudo {}",
            command.join(" ")
        ))
        .into());
    }
    Ok(())
}

#[cfg(unix)]
fn create_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, dest)
}

#[cfg(not(unix))]
fn create_symlink(_source: &Path, _dest: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Other,
        "symlink unavailable on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop::NullIntegrator;
    use crate::target::InstallScope;
    use tempfile::TempDir;

    fn test_target(root: &Path) -> InstallTarget {
        let install_dir = root.join("install");
        InstallTarget {
            scope: InstallScope::User,
            icon_path: install_dir.join("icon.png"),
            install_dir,
            bin_dir: root.join("bin"),
            desktop_dir: root.join("applications"),
        }
    }

    fn test_user_dirs(root: &Path) -> UserDataDirs {
        UserDataDirs {
            backup_root: root.join("backups"),
            backup_candidates: vec![root.join("config/Orbit")],
            clean_dirs: vec![root.join("config/Orbit"), root.join("cache/orbit")],
        }
    }

    fn make_payload(root: &Path) -> PathBuf {
        let payload = root.join("payload");
        fs::create_dir_all(payload.join("bin")).unwrap();
        fs::write(payload.join("bin/orbit"), b"#!/bin/sh\n").unwrap();
        fs::write(payload.join("bin/chrome-sandbox"), b"helper").unwrap();
        fs::write(payload.join("icon.png"), b"png").unwrap();
        payload
    }

    #[cfg(unix)]
    #[test]
    fn fresh_install_copies_links_and_sets_modes() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let payload = make_payload(root.path());
        let target = test_target(root.path());
        let user_dirs = test_user_dirs(root.path());

        let report = install(&payload, &target, &user_dirs, &NullIntegrator).unwrap();
        assert!(report.fresh);
        assert!(report.backup_dir.is_none());

        let exe = target.install_dir.join("bin/orbit");
        assert!(exe.is_file());
        let mode = fs::metadata(&exe).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);

        let helper = target.install_dir.join("bin/chrome-sandbox");
        let helper_mode = fs::metadata(&helper).unwrap().permissions().mode();
        assert_eq!(helper_mode & 0o7777, 0o4755);

        let link = target.bin_dir.join("orbit");
        let meta = fs::symlink_metadata(&link).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), exe);
    }

    #[cfg(unix)]
    #[test]
    fn payload_symlinks_survive_the_unelevated_copy() {
        let root = TempDir::new().unwrap();
        let payload = make_payload(root.path());
        fs::create_dir_all(payload.join("lib")).unwrap();
        fs::write(payload.join("lib/liborbit.so.1"), b"so").unwrap();
        std::os::unix::fs::symlink("liborbit.so.1", payload.join("lib/liborbit.so")).unwrap();
        let target = test_target(root.path());
        let user_dirs = test_user_dirs(root.path());

        install(&payload, &target, &user_dirs, &NullIntegrator).unwrap();

        let installed = target.install_dir.join("lib/liborbit.so");
        let meta = fs::symlink_metadata(&installed).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(
            fs::read_link(&installed).unwrap(),
            PathBuf::from("liborbit.so.1")
        );
        assert!(target.install_dir.join("lib/liborbit.so.1").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn update_backs_up_user_data_and_replaces_stale_link() {
        let root = TempDir::new().unwrap();
        let payload = make_payload(root.path());
        let target = test_target(root.path());
        let user_dirs = test_user_dirs(root.path());

        // Existing installation plus user data plus a stale launcher link.
        fs::create_dir_all(&target.install_dir).unwrap();
        fs::write(target.install_dir.join("old-file"), b"old").unwrap();
        fs::create_dir_all(root.path().join("config/Orbit")).unwrap();
        fs::write(root.path().join("config/Orbit/settings.json"), "{}").unwrap();
        fs::create_dir_all(&target.bin_dir).unwrap();
        std::os::unix::fs::symlink("/nonexistent/orbit", target.bin_dir.join("orbit")).unwrap();

        let report = install(&payload, &target, &user_dirs, &NullIntegrator).unwrap();
        assert!(!report.fresh);
        let backup_dir = report.backup_dir.unwrap();
        assert!(backup_dir.join("Orbit/settings.json").is_file());

        let link = target.bin_dir.join("orbit");
        assert_eq!(
            fs::read_link(&link).unwrap(),
            target.install_dir.join("bin/orbit")
        );
    }
}
