//! Error types for rslatens.

use thiserror::Error;

/// Main error type for rslatens operations.
///
/// Codec and classification problems never leave the pipeline as an `Error`;
/// they resolve to an [`AcquisitionOutcome`](crate::message::AcquisitionOutcome)
/// or a [`PlaybackError`](crate::loader::PlaybackError). This type covers the
/// fallible edges: configuration loading and the envelope helpers.
#[derive(Debug, Error)]
pub enum Error {
    /// The license server answered with JSON that does not carry a usable
    /// `license` field.
    #[error("Malformed license payload: {0}")]
    MalformedLicensePayload(String),

    /// The PlayReady SOAP envelope could not be written.
    #[error("Envelope construction failed: {0}")]
    Envelope(String),

    /// An unknown robustness level literal.
    #[error("Invalid robustness level: {0}")]
    InvalidRobustness(String),

    /// An unknown DRM vendor name.
    #[error("Invalid DRM vendor: {0}")]
    InvalidVendor(String),

    /// The configuration file is missing required data.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML configuration error.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for rslatens operations.
pub type Result<T> = std::result::Result<T, Error>;
