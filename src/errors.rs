use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("missing required tools: {0}")]
    DependencyMissing(String),
    #[error("failed to fetch release metadata: {0}")]
    MetadataFetchFailed(String),
    #[error("release metadata is malformed: {0}")]
    MetadataMalformed(String),
    #[error("package download failed: {0}")]
    PackageDownloadFailed(String),
    #[error("package extraction failed: {0}")]
    PackageExtractFailed(String),
    #[error("package layout invalid: {0}")]
    PackageLayoutInvalid(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("install step failed: {0}")]
    InstallStepFailed(String),
}
