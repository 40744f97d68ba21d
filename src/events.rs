//! Player events and the observer they are delivered to.
//!
//! The host forwards its player events through an [`EventHub`]. One observer
//! receives every event; it is attached and detached as a single unit.
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::loader::PlaybackError;

/// Events raised by the host player.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    AbrStatusChanged { enabled: bool },
    Adaptation,
    Buffering { buffering: bool },
    DrmSessionUpdate,
    Emsg { detail: Value },
    Error { detail: Value },
    ExpirationUpdated,
    LargeGap { current_time: f64, gap_size: f64 },
    Loading,
    ManifestParsed,
    StateChange { state: String },
    StateIdle { state: String },
    Streaming,
    Unloading,
    VariantChanged,
}

impl PlayerEvent {
    /// `error` event carrying a surfaced failure.
    pub fn error(error: &PlaybackError) -> Self {
        PlayerEvent::Error {
            detail: serde_json::to_value(error).unwrap_or(Value::Null),
        }
    }

    /// Host event name.
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::AbrStatusChanged { .. } => "abrstatuschanged",
            PlayerEvent::Adaptation => "adaptation",
            PlayerEvent::Buffering { .. } => "buffering",
            PlayerEvent::DrmSessionUpdate => "drmsessionupdate",
            PlayerEvent::Emsg { .. } => "emsg",
            PlayerEvent::Error { .. } => "error",
            PlayerEvent::ExpirationUpdated => "expirationupdated",
            PlayerEvent::LargeGap { .. } => "largegap",
            PlayerEvent::Loading => "loading",
            PlayerEvent::ManifestParsed => "manifestparsed",
            PlayerEvent::StateChange { .. } => "onstatechange",
            PlayerEvent::StateIdle { .. } => "onstateidle",
            PlayerEvent::Streaming => "streaming",
            PlayerEvent::Unloading => "unloading",
            PlayerEvent::VariantChanged => "variantchanged",
        }
    }

    /// Human readable summary for logs.
    pub fn describe(&self) -> String {
        match self {
            PlayerEvent::AbrStatusChanged { enabled } => format!("enabled: {}", enabled),
            PlayerEvent::Adaptation => {
                "an automatic adaptation causes the active tracks to change".to_string()
            }
            PlayerEvent::Buffering { buffering } => buffering.to_string(),
            PlayerEvent::DrmSessionUpdate => "the CDM has accepted the license response".to_string(),
            PlayerEvent::Emsg { detail } | PlayerEvent::Error { detail } => detail.to_string(),
            PlayerEvent::ExpirationUpdated => {
                "there is a change in the expiration times of an EME session".to_string()
            }
            PlayerEvent::LargeGap {
                current_time,
                gap_size,
            } => format!(
                "the playhead enters a large gap: currentTime={}; gapSize={}",
                current_time, gap_size
            ),
            PlayerEvent::Loading => "the player begins loading".to_string(),
            PlayerEvent::ManifestParsed => "the manifest has been parsed".to_string(),
            PlayerEvent::StateChange { state } => state.clone(),
            PlayerEvent::StateIdle { state } => format!("state: {}", state),
            PlayerEvent::Streaming => {
                "the manifest has been parsed and track information is available".to_string()
            }
            PlayerEvent::Unloading => "the player unloads or fails to load".to_string(),
            PlayerEvent::VariantChanged => {
                "a call from the application caused a variant change".to_string()
            }
        }
    }
}

/// Receives every player event.
pub trait EventObserver: Send + Sync {
    fn on_event(&self, event: &PlayerEvent);
}

/// Observer that writes events to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl EventObserver for LoggingObserver {
    fn on_event(&self, event: &PlayerEvent) {
        match event {
            PlayerEvent::Error { .. } => warn!("{}: {}", event.name(), event.describe()),
            _ => info!("{}: {}", event.name(), event.describe()),
        }
    }
}

/// Slot for the single attached observer.
#[derive(Default)]
pub struct EventHub {
    observer: RwLock<Option<Arc<dyn EventObserver>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `observer`, replacing any previous one.
    pub fn attach(&self, observer: Arc<dyn EventObserver>) {
        *self.observer.write() = Some(observer);
    }

    /// Detach the current observer, returning it.
    pub fn detach(&self) -> Option<Arc<dyn EventObserver>> {
        self.observer.write().take()
    }

    pub fn is_attached(&self) -> bool {
        self.observer.read().is_some()
    }

    /// Deliver `event` to the attached observer, if any.
    pub fn emit(&self, event: &PlayerEvent) {
        // Clone out of the lock so observers may attach/detach re-entrantly.
        let observer = self.observer.read().clone();
        if let Some(observer) = observer {
            observer.on_event(event);
        }
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("attached", &self.is_attached())
            .finish()
    }
}
