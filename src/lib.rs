//! rslatens - DRM license protocol adapter for Latens license servers.
//!
//! This crate provides:
//! - Widevine and PlayReady license envelope codecs.
//! - Classification of license-acquisition failures.
//! - A one-shot robustness downgrade policy.
//! - A license pipeline for the host player's request/response filters and a
//!   load driver that re-issues loads on downgrade.
//!
//! Feature flags:
//! - `tracing`: route crate logging to `tracing` (default).
//! - `cli`: enable the CLI binary.

#[macro_use]
mod macros;

/// Failure code classification.
pub mod classify;
/// Vendor envelope codecs.
pub mod codec;
/// DRM configuration and media sources.
pub mod config;
/// Common error types and Result alias.
pub mod error;
/// Player events and observers.
pub mod events;
/// Load driver with robustness downgrade.
pub mod loader;
/// License request/response objects.
pub mod message;
/// Host filter pipeline.
pub mod pipeline;
/// Host player configuration document.
pub mod player_config;
/// Robustness retry policy.
pub mod retry;

pub use classify::{classify, FailureKind};
pub use codec::{for_vendor, EnvelopeCodec, PlayReadyCodec, WidevineCodec};
pub use config::{AdapterConfig, DrmConfig, DrmSource, MediaSource, Robustness, Vendor};
pub use error::{Error, Result};
pub use events::{EventHub, EventObserver, LoggingObserver, PlayerEvent};
pub use loader::{ErrorCode, LoadFailure, LoadOutcome, Loader, PlaybackError, Player};
pub use message::{
    AcquisitionError, AcquisitionOutcome, LicenseRequest, LicenseResponse, RequestType,
};
pub use pipeline::{LicensePipeline, RequestFilter, ResponseFilter};
pub use player_config::PlayerConfiguration;
pub use retry::{RetryDecision, RetryPolicy, RetryState};
