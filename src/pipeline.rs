//! License request/response pipeline.
//!
//! The host networking engine calls the registered filters synchronously for
//! every request and response it handles. Only [`RequestType::License`]
//! traffic is touched; the rest is handed back unchanged.
use std::sync::Arc;

use parking_lot::Mutex;

use crate::codec::{self, EnvelopeCodec};
use crate::config::DrmConfig;
use crate::events::{EventHub, PlayerEvent};
use crate::loader::PlaybackError;
use crate::message::{
    AcquisitionError, AcquisitionOutcome, LicenseRequest, LicenseResponse, RequestType,
};

/// Host hook run before a request goes to the transport.
pub trait RequestFilter: Send + Sync {
    fn filter_request(&self, request_type: RequestType, request: LicenseRequest) -> LicenseRequest;
}

/// Host hook run after the transport returns a response.
pub trait ResponseFilter: Send + Sync {
    fn filter_response(
        &self,
        request_type: RequestType,
        response: LicenseResponse,
    ) -> LicenseResponse;
}

#[derive(Debug)]
struct ActiveAcquisition {
    config: DrmConfig,
    codec: Box<dyn EnvelopeCodec>,
    failure: Option<AcquisitionError>,
    /// The load owning this acquisition has resolved; later failures are
    /// reported straight to the event hub.
    settled: bool,
}

/// Envelope pipeline for the acquisition currently in flight.
#[derive(Debug, Default)]
pub struct LicensePipeline {
    active: Mutex<Option<ActiveAcquisition>>,
    events: Option<Arc<EventHub>>,
}

impl LicensePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline that reports failures outside a pending load to `events`.
    pub fn with_events(events: Arc<EventHub>) -> Self {
        Self {
            active: Mutex::new(None),
            events: Some(events),
        }
    }

    /// Pipeline with `config` already installed.
    pub fn with_config(config: DrmConfig) -> Self {
        let pipeline = Self::new();
        pipeline.install(config);
        pipeline
    }

    /// Make `config` the active acquisition config and select its codec.
    ///
    /// Any codec failure recorded for the previous attempt is discarded.
    pub fn install(&self, config: DrmConfig) {
        debug!(
            "Installing {} license pipeline ({})",
            config.vendor, config.robustness
        );
        let codec = codec::for_vendor(config.vendor);
        *self.active.lock() = Some(ActiveAcquisition {
            config,
            codec,
            failure: None,
            settled: false,
        });
    }

    /// Drop the active acquisition; filters become no-ops.
    pub fn clear(&self) {
        *self.active.lock() = None;
    }

    /// Config of the active acquisition.
    pub fn config(&self) -> Option<DrmConfig> {
        self.active.lock().as_ref().map(|a| a.config.clone())
    }

    /// Mark the pending load as resolved and take the codec failure recorded
    /// since the last [`install`](Self::install).
    ///
    /// Failures after this point, such as a rejected renewal, have no load
    /// to surface through and are emitted as error events instead.
    pub fn settle(&self) -> Option<AcquisitionError> {
        let mut guard = self.active.lock();
        let active = guard.as_mut()?;
        active.settled = true;
        active.failure.take()
    }

    /// Wrap a license request for the active vendor.
    pub fn build_request(&self, request: LicenseRequest) -> LicenseRequest {
        let guard = self.active.lock();
        match guard.as_ref() {
            Some(active) => active.codec.build_request(&active.config, request),
            None => {
                warn!("License request with no active DRM config, sending unchanged");
                request
            }
        }
    }

    /// Unwrap a license response for the active vendor.
    ///
    /// A [`AcquisitionOutcome::Failure`] is also recorded for the load driver,
    /// or emitted as an error event once the load has settled.
    pub fn parse_response(&self, response: LicenseResponse) -> AcquisitionOutcome {
        let mut guard = self.active.lock();
        let Some(active) = guard.as_mut() else {
            return AcquisitionOutcome::PassThrough(response);
        };

        let outcome = active.codec.parse_response(&active.config, response);
        let AcquisitionOutcome::Failure(failure) = &outcome else {
            return outcome;
        };
        if !active.settled {
            active.failure = Some(failure.clone());
            return outcome;
        }
        drop(guard);

        let error = PlaybackError::from_codec(failure);
        error!("{}", error);
        if let Some(events) = &self.events {
            events.emit(&PlayerEvent::error(&error));
        }
        outcome
    }
}

impl RequestFilter for LicensePipeline {
    fn filter_request(&self, request_type: RequestType, request: LicenseRequest) -> LicenseRequest {
        if request_type != RequestType::License {
            return request;
        }
        let request = self.build_request(request);
        trace!("LicenseRequest: {}", String::from_utf8_lossy(&request.body));
        request
    }
}

impl ResponseFilter for LicensePipeline {
    fn filter_response(
        &self,
        request_type: RequestType,
        response: LicenseResponse,
    ) -> LicenseResponse {
        if request_type != RequestType::License {
            return response;
        }
        trace!("LicenseResponse: {} bytes", response.body.len());

        // Keep a copy: a failed unwrap hands the original body back.
        let original = response.clone();
        match self.parse_response(response) {
            AcquisitionOutcome::Success(license) => LicenseResponse::new(license),
            AcquisitionOutcome::PassThrough(response) => response,
            AcquisitionOutcome::Failure(e) => {
                error!("LicenseResponseError: {}", e);
                original
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use base64::Engine;
    use parking_lot::Mutex;

    use super::{LicensePipeline, RequestFilter, ResponseFilter};
    use crate::codec::WrappedChallenge;
    use crate::config::{DrmConfig, Vendor};
    use crate::events::{EventHub, EventObserver, PlayerEvent};
    use crate::message::{AcquisitionError, LicenseRequest, LicenseResponse, RequestType};

    #[derive(Default)]
    struct Errors {
        details: Mutex<Vec<serde_json::Value>>,
    }

    impl EventObserver for Errors {
        fn on_event(&self, event: &PlayerEvent) {
            if let PlayerEvent::Error { detail } = event {
                self.details.lock().push(detail.clone());
            }
        }
    }

    fn widevine() -> DrmConfig {
        DrmConfig::new(Vendor::Widevine, "acme", "dev-1", "https://lic")
    }

    #[test]
    fn non_license_traffic_is_untouched() {
        let pipeline = LicensePipeline::with_config(widevine());
        let request = LicenseRequest::new(b"manifest".to_vec());
        let response = LicenseResponse::new(r#"{"license":"AAEC"}"#);

        for request_type in [RequestType::Manifest, RequestType::Segment, RequestType::App] {
            assert_eq!(pipeline.filter_request(request_type, request.clone()), request);
            assert_eq!(pipeline.filter_response(request_type, response.clone()), response);
        }
    }

    #[test]
    fn license_round_trip_through_filters() {
        let pipeline = LicensePipeline::with_config(widevine());

        let request = pipeline.filter_request(RequestType::License, LicenseRequest::new(b"ch".to_vec()));
        let wrapped = WrappedChallenge::from_body(&request.body).expect("wrapped body");
        assert_eq!(wrapped.challenge().expect("payload"), b"ch");

        let license = base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]);
        let response = LicenseResponse::new(format!(r#"{{"license":"{}"}}"#, license));
        let response = pipeline.filter_response(RequestType::License, response);
        assert_eq!(response.body, vec![1, 2, 3]);
        assert!(pipeline.settle().is_none());
    }

    #[test]
    fn malformed_payload_is_recorded_not_raised() {
        let pipeline = LicensePipeline::with_config(widevine());
        let response = LicenseResponse::new(r#"{"error":"denied"}"#);

        let filtered = pipeline.filter_response(RequestType::License, response.clone());
        assert_eq!(filtered, response);
        assert!(matches!(
            pipeline.settle(),
            Some(AcquisitionError::MalformedLicensePayload(_))
        ));
        assert!(pipeline.settle().is_none());
    }

    #[test]
    fn install_clears_previous_failure_and_switches_codec() {
        let pipeline = LicensePipeline::with_config(widevine());
        pipeline.filter_response(RequestType::License, LicenseResponse::new("{}"));

        pipeline.install(DrmConfig::new(Vendor::PlayReady, "acme", "dev-1", "https://lic"));
        assert!(pipeline.settle().is_none());

        let request = pipeline.filter_request(RequestType::License, LicenseRequest::new(b"ch".to_vec()));
        assert!(request.header("soapaction").is_some());
    }

    #[test]
    fn cleared_pipeline_passes_everything_through() {
        let pipeline = LicensePipeline::with_config(widevine());
        pipeline.clear();
        assert!(pipeline.config().is_none());

        let request = LicenseRequest::new(b"ch".to_vec());
        assert_eq!(pipeline.filter_request(RequestType::License, request.clone()), request);
        let response = LicenseResponse::new("{}");
        assert_eq!(pipeline.filter_response(RequestType::License, response.clone()), response);
    }

    #[test]
    fn failure_after_settle_is_emitted_not_recorded() {
        let hub = Arc::new(EventHub::new());
        let errors = Arc::new(Errors::default());
        hub.attach(errors.clone());
        let pipeline = LicensePipeline::with_events(hub);
        pipeline.install(widevine());

        pipeline.filter_response(RequestType::License, LicenseResponse::new("{}"));
        assert!(errors.details.lock().is_empty());
        assert!(matches!(
            pipeline.settle(),
            Some(AcquisitionError::MalformedLicensePayload(_))
        ));

        let renewal = LicenseResponse::new(r#"{"status":"denied"}"#);
        assert_eq!(pipeline.filter_response(RequestType::License, renewal.clone()), renewal);
        assert!(pipeline.settle().is_none());

        let details = errors.details.lock();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0]["code"], "TDM_PLAYER_DRM011");
    }

    #[test]
    fn install_starts_unsettled() {
        let pipeline = LicensePipeline::with_config(widevine());
        assert!(pipeline.settle().is_none());

        pipeline.install(widevine());
        pipeline.filter_response(RequestType::License, LicenseResponse::new("{}"));
        assert!(pipeline.settle().is_some());
    }
}
