//! Load driver: runs a media load against the host player and applies the
//! robustness downgrade by re-issuing the whole load.
//!
//! Starting a load supersedes any load still in flight on the same
//! [`Loader`]. The superseded call resolves to [`LoadOutcome::Superseded`]
//! and surfaces nothing, whatever the host reports for it.
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::classify::{classify, FailureKind};
use crate::config::{DrmConfig, MediaSource, Robustness, Vendor};
use crate::events::{EventHub, PlayerEvent};
use crate::message::AcquisitionError;
use crate::pipeline::LicensePipeline;
use crate::player_config::PlayerConfiguration;
use crate::retry::{RetryDecision, RetryPolicy};

/// Stable code for surfaced DRM failures.
pub const DRM_ERROR_CODE: &str = "TDM_PLAYER_DRM011";

const ERROR_TITLE: &str = "Native player error";

/// Failure reported by the host player for a load.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("load failed with code {code}")]
pub struct LoadFailure {
    pub code: u32,
    /// Host diagnostic payload.
    pub data: Value,
}

impl LoadFailure {
    pub fn new(code: u32) -> Self {
        Self {
            code,
            data: Value::Null,
        }
    }

    pub fn with_data(code: u32, data: Value) -> Self {
        Self { code, data }
    }
}

/// The host player, as seen by the load driver.
pub trait Player: Send + Sync {
    /// Apply a configuration document. Returns whether the player accepted it.
    fn configure(&self, config: &PlayerConfiguration) -> bool;

    /// Load `uri`; resolves once playback can start or the load failed.
    fn load(&self, uri: &str) -> impl Future<Output = Result<(), LoadFailure>> + Send;
}

/// Error code attached to a surfaced failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorCode {
    /// DRM specific failure.
    Drm(&'static str),
    /// Host player code, passed through verbatim.
    Player(u32),
}

/// A failure surfaced to the application.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{title} ({code:?}): {message}")]
pub struct PlaybackError {
    pub title: String,
    /// Stringified diagnostic payload.
    pub message: String,
    pub code: ErrorCode,
}

impl PlaybackError {
    fn from_failure(kind: FailureKind, failure: &LoadFailure) -> Self {
        let code = match kind {
            FailureKind::Unclassified(code) => ErrorCode::Player(code),
            _ => ErrorCode::Drm(DRM_ERROR_CODE),
        };
        Self {
            title: ERROR_TITLE.to_string(),
            message: serde_json::to_string(failure).unwrap_or_else(|_| failure.to_string()),
            code,
        }
    }

    pub(crate) fn from_codec(error: &AcquisitionError) -> Self {
        Self {
            title: ERROR_TITLE.to_string(),
            message: error.to_string(),
            code: ErrorCode::Drm(DRM_ERROR_CODE),
        }
    }
}

/// Result of one [`Loader::load`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded {
        robustness: Robustness,
        attempts: u32,
    },
    Failed(PlaybackError),
    /// Aborted by the host; nothing to report.
    Suppressed,
    /// A newer load took over.
    Superseded,
    /// Empty source URI.
    Ignored,
}

/// Drives loads for one media element.
pub struct Loader<P> {
    player: P,
    pipeline: Arc<LicensePipeline>,
    events: Arc<EventHub>,
    generation: AtomicU64,
}

impl<P: Player> Loader<P> {
    pub fn new(player: P) -> Self {
        let events = Arc::new(EventHub::new());
        Self {
            player,
            pipeline: Arc::new(LicensePipeline::with_events(Arc::clone(&events))),
            events,
            generation: AtomicU64::new(0),
        }
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// Pipeline to register with the host networking engine as both the
    /// request and the response filter.
    pub fn pipeline(&self) -> Arc<LicensePipeline> {
        Arc::clone(&self.pipeline)
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Load `source` starting at the default robustness.
    pub async fn load_source(&self, source: &MediaSource, vendor: Vendor) -> LoadOutcome {
        let drm = source.drm_config(vendor, Robustness::default());
        self.load(&source.uri, drm).await
    }

    /// Load `uri` with `drm`, downgrading robustness once if the key system
    /// cannot satisfy it.
    pub async fn load(&self, uri: &str, drm: DrmConfig) -> LoadOutcome {
        if uri.is_empty() {
            return LoadOutcome::Ignored;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut policy = RetryPolicy::new();
        let mut config = drm;
        let mut attempts = 0;

        loop {
            attempts += 1;
            self.pipeline.install(config.clone());
            let accepted = self.player.configure(&PlayerConfiguration::for_drm(&config));
            debug!("config success: {}", accepted);
            info!("Loading {} (attempt {}, {})", uri, attempts, config.robustness);

            let result = self.player.load(uri).await;
            if self.is_superseded(generation) {
                debug!("Load of {} superseded", uri);
                return LoadOutcome::Superseded;
            }

            // A license the codec rejected is fatal even if the host
            // reported the load as started.
            let codec_failure = self.pipeline.settle();
            let failure = match (result, codec_failure) {
                (_, Some(codec_failure)) => {
                    return self.surface(PlaybackError::from_codec(&codec_failure));
                }
                (Ok(()), None) => {
                    return LoadOutcome::Loaded {
                        robustness: config.robustness,
                        attempts,
                    }
                }
                (Err(failure), None) => failure,
            };
            debug!("Load error: {}", failure);

            let kind = classify(failure.code);
            match policy.on_failure(kind, &config) {
                RetryDecision::Retry(next) => {
                    warn!(
                        "Key system rejected {}, retrying with {}",
                        config.robustness, next.robustness
                    );
                    config = next;
                }
                RetryDecision::Suppress => {
                    debug!("Suppressed {} for {}", kind, uri);
                    return LoadOutcome::Suppressed;
                }
                RetryDecision::Surface(kind) => {
                    return self.surface(PlaybackError::from_failure(kind, &failure));
                }
            }
        }
    }

    /// Supersede any in-flight load and detach the license pipeline.
    pub fn unload(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.pipeline.clear();
        debug!("shutdown");
    }

    fn is_superseded(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    fn surface(&self, error: PlaybackError) -> LoadOutcome {
        error!("{}", error);
        self.events.emit(&PlayerEvent::error(&error));
        LoadOutcome::Failed(error)
    }
}

impl<P> std::fmt::Debug for Loader<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
