use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use time::OffsetDateTime;
use walkdir::WalkDir;

// Copies every existing user-data candidate into a timestamp-suffixed
// backup directory before an update overwrites the installation. Nothing
// here is fatal: a failed backup leaves the original data in place, so
// callers only get warnings. Backups are never restored automatically.
pub fn backup_user_data(candidates: &[PathBuf], backup_root: &Path) -> Option<PathBuf> {
    let mut backup_dir: Option<PathBuf> = None;

    for candidate in candidates {
        if !candidate.is_dir() {
            continue;
        }
        let dir = match &backup_dir {
            Some(dir) => dir.clone(),
            None => match create_backup_dir(backup_root) {
                Ok(dir) => {
                    backup_dir = Some(dir.clone());
                    dir
                }
                Err(err) => {
                    eprintln!("warning: could not create backup dir: {err:#}");
                    return None;
                }
            },
        };

        let name = match candidate.file_name() {
            Some(name) => name,
            None => continue,
        };
        if let Err(err) = copy_tree(candidate, &dir.join(name)) {
            eprintln!(
                "warning: could not back up {}: {err:#}",
                candidate.display()
            );
        }
    }

    backup_dir
}

fn create_backup_dir(backup_root: &Path) -> Result<PathBuf> {
    fs::create_dir_all(backup_root).context("create backups dir")?;
    let dir = backup_root.join(format!("backup-{}", timestamp()));
    fs::create_dir_all(&dir).context("create backup dir")?;
    Ok(dir)
}

fn timestamp() -> String {
    let format =
        time::macros::format_description!("[year][month][day]-[hour][minute][second]");
    OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_else(|_| "unknown".to_string())
}

fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.context("walk backup source")?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .context("backup rel path")?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).context("create backup subdir")?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).context("create backup subdir")?;
            }
            fs::copy(entry.path(), &target).context("copy backup file")?;
        } else if entry.file_type().is_symlink() {
            let link_target = fs::read_link(entry.path()).context("read backup link")?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).context("create backup subdir")?;
            }
            create_symlink(&link_target, &target).context("copy backup link")?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn create_symlink(source: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, dest)
}

#[cfg(not(unix))]
fn create_symlink(_source: &Path, _dest: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Other,
        "symlink unavailable on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_candidates_produce_no_backup() {
        let root = TempDir::new().unwrap();
        let candidates = vec![root.path().join("config"), root.path().join("state")];
        let backup = backup_user_data(&candidates, &root.path().join("backups"));
        assert!(backup.is_none());
        assert!(!root.path().join("backups").exists());
    }

    #[test]
    fn existing_candidates_are_copied_and_left_in_place() {
        let root = TempDir::new().unwrap();
        let config = root.path().join("Orbit");
        fs::create_dir_all(config.join("profiles")).unwrap();
        fs::write(config.join("settings.json"), "{}").unwrap();
        fs::write(config.join("profiles/default.json"), "{}").unwrap();

        let candidates = vec![config.clone(), root.path().join("absent")];
        let backup = backup_user_data(&candidates, &root.path().join("backups")).unwrap();

        assert!(backup.join("Orbit/settings.json").is_file());
        assert!(backup.join("Orbit/profiles/default.json").is_file());
        assert!(config.join("settings.json").is_file());
        let name = backup.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("backup-"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_inside_user_data_are_kept_as_links() {
        let root = TempDir::new().unwrap();
        let config = root.path().join("Orbit");
        fs::create_dir_all(&config).unwrap();
        fs::write(config.join("settings.json"), "{}").unwrap();
        std::os::unix::fs::symlink("settings.json", config.join("current.json")).unwrap();

        let candidates = vec![config];
        let backup = backup_user_data(&candidates, &root.path().join("backups")).unwrap();

        let copied = backup.join("Orbit/current.json");
        let meta = fs::symlink_metadata(&copied).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(
            fs::read_link(&copied).unwrap(),
            std::path::PathBuf::from("settings.json")
        );
    }
}
