use crate::target::{APP_DISPLAY_NAME, APP_NAME, EXECUTABLE_PATHS};
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

pub const DESKTOP_ENTRY: &str = "orbit.desktop";
pub const URL_HANDLER_ENTRY: &str = "orbit-url-handler.desktop";

pub trait DesktopIntegrator {
    fn register_app(&self, install_dir: &Path, icon_path: &Path, elevated: bool) -> Result<()>;
    fn unregister_app(&self, desktop_dir: &Path, elevated: bool) -> Result<()>;
}

pub struct FreedesktopIntegrator {
    pub desktop_dir: PathBuf,
}

impl DesktopIntegrator for FreedesktopIntegrator {
    fn register_app(&self, install_dir: &Path, icon_path: &Path, elevated: bool) -> Result<()> {
        let executable = EXECUTABLE_PATHS
            .iter()
            .map(|relative| install_dir.join(relative))
            .find(|path| path.is_file())
            .context("installed executable missing")?;

        let main_entry = format!(
            "[Desktop Entry]\nName={APP_DISPLAY_NAME}\nComment={APP_DISPLAY_NAME} desktop app\n\
             Exec={} %U\nIcon={}\nTerminal=false\nType=Application\nCategories=Utility;\n",
            executable.display(),
            icon_path.display()
        );
        let handler_entry = format!(
            "[Desktop Entry]\nName={APP_DISPLAY_NAME} URL Handler\nExec={} %U\nIcon={}\n\
             Terminal=false\nType=Application\nNoDisplay=true\n\
             MimeType=x-scheme-handler/{APP_NAME};\n",
            executable.display(),
            icon_path.display()
        );

        write_entry(&self.desktop_dir.join(DESKTOP_ENTRY), &main_entry, elevated)?;
        write_entry(
            &self.desktop_dir.join(URL_HANDLER_ENTRY),
            &handler_entry,
            elevated,
        )?;
        refresh_desktop_database(&self.desktop_dir);
        Ok(())
    }

    fn unregister_app(&self, desktop_dir: &Path, elevated: bool) -> Result<()> {
        for name in [DESKTOP_ENTRY, URL_HANDLER_ENTRY] {
            let path = desktop_dir.join(name);
            if !path.exists() {
                continue;
            }
            if elevated {
                run_elevated(&["rm", "-f"], &path)?;
            } else {
                fs::remove_file(&path)
                    .with_context(|| format!("remove desktop entry {}", path.display()))?;
            }
        }
        refresh_desktop_database(desktop_dir);
        Ok(())
    }
}

fn write_entry(path: &Path, contents: &str, elevated: bool) -> Result<()> {
    if elevated {
        let staging = tempfile::NamedTempFile::new().context("create desktop entry staging")?;
        fs::write(staging.path(), contents).context("write desktop entry staging")?;
        let status = Command::new("sudo")
            .arg("cp")
            .arg(staging.path())
            .arg(path)
            .status()
            .context("run sudo cp")?;
        if !status.success() {
            anyhow::bail!("install desktop entry {}", path.display());
        }
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create applications dir")?;
    }
    fs::write(path, contents).with_context(|| format!("write desktop entry {}", path.display()))
}

fn run_elevated(command: &[&str], path: &Path) -> Result<()> {
    let status = Command::new("sudo")
        .args(command)
        .arg(path)
        .status()
        .context("run sudo")?;
    if !status.success() {
        anyhow::bail!("sudo {} {}", command.join(" "), path.display());
    }
    Ok(())
}

// Cache refresh is a courtesy; missing tool or failure is ignored.
fn refresh_desktop_database(desktop_dir: &Path) {
    let _ = Command::new("update-desktop-database")
        .arg(desktop_dir)
        .status();
}

#[cfg(test)]
pub struct NullIntegrator;

#[cfg(test)]
impl DesktopIntegrator for NullIntegrator {
    fn register_app(&self, _install_dir: &Path, _icon_path: &Path, _elevated: bool) -> Result<()> {
        Ok(())
    }

    fn unregister_app(&self, _desktop_dir: &Path, _elevated: bool) -> Result<()> {
        Ok(())
    }
}
