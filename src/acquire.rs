use crate::{errors::InstallerError, target};
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    time::Duration,
};

const USER_AGENT: &str = "orbit-install";
const ARCHIVE_NAME: &str = "orbit.tar.gz";

// Downloads and unpacks the release tarball into the caller's workdir,
// returning the validated payload directory.
pub fn acquire(package_url: &str, workdir: &Path) -> Result<PathBuf> {
    let archive_path = workdir.join(ARCHIVE_NAME);
    download(package_url, &archive_path)?;

    let extract_root = workdir.join("extract");
    fs::create_dir_all(&extract_root).context("create extraction root")?;
    extract_tarball(&archive_path, &extract_root)?;

    let payload = normalize_layout(&extract_root)?;
    validate_payload(&payload)?;
    Ok(payload)
}

fn download(package_url: &str, archive_path: &Path) -> Result<()> {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(5))
        .timeout_read(Duration::from_secs(120))
        .timeout_write(Duration::from_secs(120))
        .build();
    let response = agent
        .get(package_url)
        .set("User-Agent", USER_AGENT)
        .call()
        .map_err(|err| InstallerError::PackageDownloadFailed(err.to_string()))?;
    let mut reader = response.into_reader();
    let mut file = File::create(archive_path).context("create archive file")?;
    io::copy(&mut reader, &mut file)
        .map_err(|err| InstallerError::PackageDownloadFailed(err.to_string()))?;

    let size = fs::metadata(archive_path).context("stat archive")?.len();
    if size == 0 {
        return Err(InstallerError::PackageDownloadFailed("empty download".to_string()).into());
    }
    Ok(())
}

fn extract_tarball(archive_path: &Path, extract_root: &Path) -> Result<()> {
    let file = File::open(archive_path).context("open archive")?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive
        .unpack(extract_root)
        .map_err(|err| InstallerError::PackageExtractFailed(err.to_string()))?;
    Ok(())
}

// Some archives wrap the payload in an extra version-stamped directory
// (orbit-1.2.0/orbit/...). Hoist the canonical payload folder one level
// so installation always sees the same shape. Archives that are already
// flat pass through untouched.
fn normalize_layout(extract_root: &Path) -> Result<PathBuf> {
    let mut top_dirs = Vec::new();
    for entry in fs::read_dir(extract_root).context("read extraction root")? {
        let entry = entry.context("read extraction entry")?;
        if entry.file_type().context("stat extraction entry")?.is_dir() {
            top_dirs.push(entry.path());
        }
    }

    if top_dirs.len() != 1 {
        return Ok(extract_root.to_path_buf());
    }

    let top = top_dirs.remove(0);
    let nested = top.join(target::APP_NAME);
    if !nested.is_dir() {
        return Ok(top);
    }

    let hoisted = extract_root.join(target::APP_NAME);
    if top == hoisted {
        // Wrapper and payload share the canonical name; stage the payload
        // under a sibling name so the wrapper can be dropped first.
        let staging = extract_root.join(".orbit-hoist");
        fs::rename(&nested, &staging).context("hoist payload dir")?;
        let _ = fs::remove_dir_all(&top);
        fs::rename(&staging, &hoisted).context("hoist payload dir")?;
        return Ok(hoisted);
    }

    fs::rename(&nested, &hoisted).context("hoist payload dir")?;
    let _ = fs::remove_dir_all(&top);
    Ok(hoisted)
}

fn validate_payload(payload: &Path) -> Result<()> {
    let found = target::EXECUTABLE_PATHS
        .iter()
        .any(|relative| payload.join(relative).is_file());
    if !found {
        return Err(InstallerError::PackageLayoutInvalid(format!(
            "no {} executable found under {}",
            target::APP_NAME,
            payload.display()
        ))
        .into());
    }
    Ok(())
}
