use crate::{errors::InstallerError, version};
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

const RELEASES_URL: &str = "https://releases.orbitapp.dev/linux/releases.json";
const USER_AGENT: &str = "orbit-install";
const PACKAGE_SUFFIX: &str = ".tar.gz";

#[derive(Debug, Clone)]
pub struct ReleaseMetadata {
    pub current_version: String,
    pub package_url: String,
}

#[derive(Debug, Deserialize)]
struct ReleasesDoc {
    #[serde(rename = "currentRelease")]
    current_release: Option<String>,
    #[serde(default)]
    releases: Vec<ReleaseEntry>,
}

#[derive(Debug, Deserialize)]
struct ReleaseEntry {
    #[serde(rename = "updateTo")]
    update_to: Option<UpdateDescriptor>,
}

#[derive(Debug, Deserialize)]
struct UpdateDescriptor {
    url: Option<String>,
}

pub fn fetch_metadata() -> Result<ReleaseMetadata> {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(5))
        .timeout_read(Duration::from_secs(10))
        .timeout_write(Duration::from_secs(10))
        .build();
    let response = agent
        .get(RELEASES_URL)
        .set("User-Agent", USER_AGENT)
        .call()
        .map_err(|err| InstallerError::MetadataFetchFailed(err.to_string()))?;
    let doc: ReleasesDoc = response
        .into_json()
        .map_err(|err| InstallerError::MetadataMalformed(err.to_string()))?;
    resolve_metadata(doc)
}

fn resolve_metadata(doc: ReleasesDoc) -> Result<ReleaseMetadata> {
    let current_version = doc
        .current_release
        .filter(|value| version::is_triple(value))
        .ok_or_else(|| {
            InstallerError::MetadataMalformed("missing or invalid currentRelease field".to_string())
        })?;

    let package_url = doc
        .releases
        .iter()
        .filter_map(|entry| entry.update_to.as_ref())
        .filter_map(|update| update.url.as_deref())
        .find(|url| url.ends_with(PACKAGE_SUFFIX))
        .ok_or_else(|| {
            InstallerError::MetadataMalformed(format!(
                "no release with a {PACKAGE_SUFFIX} package URL"
            ))
        })?
        .to_string();

    Ok(ReleaseMetadata {
        current_version,
        package_url,
    })
}
