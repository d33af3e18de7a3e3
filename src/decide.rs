use crate::{
    probe,
    remote::{self, ReleaseMetadata},
    version,
};
use anyhow::Result;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed(ProceedReason),
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProceedReason {
    Forced,
    FreshInstall,
    Newer,
}

#[derive(Debug, Clone)]
pub struct UpdateCheck {
    pub decision: Decision,
    pub metadata: ReleaseMetadata,
    pub installed_version: String,
}

// Pure decision core; the fetch/probe orchestration lives in
// check_for_update so this stays trivially unit-testable.
pub fn decide(installed: &str, remote: &str, force: bool) -> Decision {
    if force {
        return Decision::Proceed(ProceedReason::Forced);
    }
    if installed.is_empty() {
        return Decision::Proceed(ProceedReason::FreshInstall);
    }
    if version::is_update_needed(installed, remote) {
        Decision::Proceed(ProceedReason::Newer)
    } else {
        Decision::Skip
    }
}

// Metadata is fetched even on forced runs: the package URL for the
// acquisition step comes from the same document.
pub fn check_for_update(install_dir: &Path, force: bool) -> Result<UpdateCheck> {
    let metadata = remote::fetch_metadata()?;
    let installed_version = probe::installed_version(install_dir);
    let decision = decide(&installed_version, &metadata.current_version, force);
    Ok(UpdateCheck {
        decision,
        metadata,
        installed_version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_always_proceeds() {
        assert_eq!(
            decide("1.2.0", "1.2.0", true),
            Decision::Proceed(ProceedReason::Forced)
        );
        assert_eq!(
            decide("2.0.0", "1.0.0", true),
            Decision::Proceed(ProceedReason::Forced)
        );
    }

    #[test]
    fn empty_installed_is_a_fresh_install() {
        assert_eq!(
            decide("", "1.2.0", false),
            Decision::Proceed(ProceedReason::FreshInstall)
        );
    }

    #[test]
    fn equal_versions_skip() {
        assert_eq!(decide("1.2.0", "1.2.0", false), Decision::Skip);
    }

    #[test]
    fn locally_ahead_build_skips() {
        assert_eq!(decide("1.3.0", "1.2.0", false), Decision::Skip);
    }

    #[test]
    fn older_install_proceeds() {
        assert_eq!(
            decide("1.2.0", "1.2.10", false),
            Decision::Proceed(ProceedReason::Newer)
        );
    }

    #[test]
    fn unknown_remote_skips() {
        assert_eq!(decide("1.2.0", "", false), Decision::Skip);
    }
}
