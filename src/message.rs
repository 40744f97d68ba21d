//! Request/response objects exchanged with the host networking engine.
use std::collections::BTreeMap;

use thiserror::Error;

/// Request categories the host networking engine tags its traffic with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    Manifest,
    Segment,
    License,
    App,
    Timing,
}

/// An outgoing license request.
///
/// Moved into the codec for one transform and handed back mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseRequest {
    /// Request body; the raw CDM challenge before transformation.
    pub body: Vec<u8>,
    /// Header name to value.
    pub headers: BTreeMap<String, String>,
    /// Whether cookies/credentials may be sent cross-site.
    pub allow_cross_site_credentials: bool,
}

impl LicenseRequest {
    /// Wrap a raw challenge with no headers.
    pub fn new(challenge: impl Into<Vec<u8>>) -> Self {
        Self {
            body: challenge.into(),
            headers: BTreeMap::new(),
            allow_cross_site_credentials: true,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

impl Default for LicenseRequest {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// An incoming license response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseResponse {
    pub body: Vec<u8>,
}

impl LicenseResponse {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self { body: body.into() }
    }
}

/// Codec-level acquisition failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    /// JSON parsed but the `license` field is missing or not valid base64.
    #[error("malformed license payload: {0}")]
    MalformedLicensePayload(String),
}

/// Result of running a response through a codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionOutcome {
    /// Decoded license bytes for the CDM.
    Success(Vec<u8>),
    /// Not a license payload; hand the response back untouched.
    PassThrough(LicenseResponse),
    Failure(AcquisitionError),
}
