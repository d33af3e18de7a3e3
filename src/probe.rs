use crate::{target::EXECUTABLE_PATHS, version};
use serde_json::Value;
use std::{fs, path::Path, process::Command};

const SHORT_VERSION_FLAG: &str = "-v";
const LONG_VERSION_FLAG: &str = "--version";

const JSON_METADATA_FILES: [&str; 2] = ["resources/app/package.json", "package.json"];
const TEXT_METADATA_FILES: [&str; 2] = ["VERSION", "version"];

// Ordered fallback chain; empty string means unknown. Executable probes
// with the short flag require the whole first line to be x.y.z, the long
// flag accepts the first x.y.z substring, and file-based probes accept a
// value that merely starts with a triple. The asymmetry is intentional.
pub fn installed_version(install_dir: &Path) -> String {
    if !install_dir.is_dir() {
        return String::new();
    }

    for relative in EXECUTABLE_PATHS {
        if let Some(found) = probe_executable_strict(&install_dir.join(relative)) {
            return found;
        }
    }

    for relative in EXECUTABLE_PATHS {
        if let Some(found) = probe_executable_loose(&install_dir.join(relative)) {
            return found;
        }
    }

    probe_metadata_files(install_dir).unwrap_or_default()
}

fn probe_executable_strict(executable: &Path) -> Option<String> {
    let output = run_version_command(executable, SHORT_VERSION_FLAG)?;
    let line = output.lines().next()?.trim();
    if version::is_triple(line) {
        Some(line.to_string())
    } else {
        None
    }
}

fn probe_executable_loose(executable: &Path) -> Option<String> {
    let output = run_version_command(executable, LONG_VERSION_FLAG)?;
    version::find_triple(&output)
}

fn run_version_command(executable: &Path, flag: &str) -> Option<String> {
    if !executable.is_file() {
        return None;
    }
    let output = Command::new(executable).arg(flag).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).to_string())
}

fn probe_metadata_files(install_dir: &Path) -> Option<String> {
    for relative in JSON_METADATA_FILES {
        let candidate = read_json_version(&install_dir.join(relative));
        if let Some(found) = candidate.as_deref().and_then(version::triple_prefix) {
            return Some(found);
        }
    }
    for relative in TEXT_METADATA_FILES {
        let candidate = read_text_version(&install_dir.join(relative));
        if let Some(found) = candidate.as_deref().and_then(version::triple_prefix) {
            return Some(found);
        }
    }
    None
}

fn read_json_version(path: &Path) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    let value: Value = serde_json::from_str(&raw).ok()?;
    value
        .get("version")
        .and_then(Value::as_str)
        .map(|version| version.trim().to_string())
}

fn read_text_version(path: &Path) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    raw.lines().next().map(|line| line.trim().to_string())
}
