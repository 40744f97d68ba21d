//! Widevine envelope.
//!
//! Request body: `base64(json{ LatensRegistration, Payload: base64(challenge) })`.
//! Response body: `json{ license: base64(raw license), .. }`.
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::registration::DeviceRegistration;
use crate::codec::EnvelopeCodec;
use crate::config::{DrmConfig, Vendor};
use crate::error::{Error, Result};
use crate::message::{AcquisitionError, AcquisitionOutcome, LicenseRequest, LicenseResponse};

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Challenge wrapper sent to the Widevine license proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedChallenge {
    #[serde(rename = "LatensRegistration")]
    pub registration: DeviceRegistration,
    /// Base64 of the original challenge bytes.
    #[serde(rename = "Payload")]
    pub payload: String,
}

impl WrappedChallenge {
    pub fn new(config: &DrmConfig, challenge: &[u8]) -> Self {
        Self {
            registration: DeviceRegistration::for_config(config),
            payload: BASE64.encode(challenge),
        }
    }

    /// Encode as a request body.
    pub fn to_body(&self) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        Ok(BASE64.encode(json).into_bytes())
    }

    /// Decode a request body produced by [`WrappedChallenge::to_body`].
    pub fn from_body(body: &[u8]) -> Result<Self> {
        let json = BASE64.decode(body)?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// The original challenge bytes.
    pub fn challenge(&self) -> Result<Vec<u8>> {
        Ok(BASE64.decode(&self.payload)?)
    }
}

/// Codec for the Widevine license proxy.
#[derive(Debug, Clone, Copy, Default)]
pub struct WidevineCodec;

impl EnvelopeCodec for WidevineCodec {
    fn vendor(&self) -> Vendor {
        Vendor::Widevine
    }

    fn build_request(&self, config: &DrmConfig, mut request: LicenseRequest) -> LicenseRequest {
        request.allow_cross_site_credentials = false;

        match WrappedChallenge::new(config, &request.body).to_body() {
            Ok(body) => request.body = body,
            Err(e) => {
                error!("Failed to wrap Widevine challenge: {}", e);
                request.body = Vec::new();
            }
        }
        debug!("Wrapped Widevine license request ({} bytes)", request.body.len());
        request
    }

    fn parse_response(&self, _config: &DrmConfig, response: LicenseResponse) -> AcquisitionOutcome {
        // Intermediate round trips (e.g. service certificate) are not JSON.
        let json = match std::str::from_utf8(&response.body)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<Value>(text).map_err(|e| e.to_string()))
        {
            Ok(json) => json,
            Err(e) => {
                trace!("License response is not JSON, passing through: {}", e);
                return AcquisitionOutcome::PassThrough(response);
            }
        };

        match decode_license(&json) {
            Ok(license) => AcquisitionOutcome::Success(license),
            Err(e) => {
                warn!("Widevine license response rejected: {}", e);
                AcquisitionOutcome::Failure(AcquisitionError::MalformedLicensePayload(e.to_string()))
            }
        }
    }
}

fn decode_license(json: &Value) -> Result<Vec<u8>> {
    let license = json
        .get("license")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedLicensePayload("missing license field".to_string()))?;
    Ok(BASE64.decode(license)?)
}

#[cfg(test)]
mod tests {
    use base64::Engine;

    use super::{WidevineCodec, WrappedChallenge, BASE64};
    use crate::codec::EnvelopeCodec;
    use crate::config::{DrmConfig, Vendor};
    use crate::message::{AcquisitionError, AcquisitionOutcome, LicenseRequest, LicenseResponse};

    fn config() -> DrmConfig {
        DrmConfig::new(Vendor::Widevine, "acme", "dev-1", "https://lic")
    }

    #[test]
    fn payload_decodes_back_to_challenge() {
        for challenge in [Vec::new(), b"\x08\x04".to_vec(), (0u8..=255).collect::<Vec<u8>>()] {
            let request = WidevineCodec.build_request(&config(), LicenseRequest::new(challenge.clone()));
            let wrapped = WrappedChallenge::from_body(&request.body).expect("unwrap body");

            assert_eq!(wrapped.challenge().expect("decode payload"), challenge);
        }
    }

    #[test]
    fn request_disables_credentials_and_keeps_headers() {
        let mut request = LicenseRequest::new(b"challenge".to_vec());
        request.headers.insert("X-Session".to_string(), "42".to_string());

        let request = WidevineCodec.build_request(&config(), request);

        assert!(!request.allow_cross_site_credentials);
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("X-Session"), Some("42"));
    }

    #[test]
    fn request_body_is_base64_json() {
        let request = WidevineCodec.build_request(&config(), LicenseRequest::new(b"abc".to_vec()));
        let json = BASE64.decode(&request.body).expect("base64 body");
        let value: serde_json::Value = serde_json::from_slice(&json).expect("json body");

        assert_eq!(value["Payload"], "YWJj");
        assert_eq!(value["LatensRegistration"]["CustomerName"], "acme");
        assert_eq!(value["LatensRegistration"]["DeviceInfo"]["DRMType"], "Widevine");
    }

    #[test]
    fn non_json_response_passes_through() {
        let response = LicenseResponse::new(b"\x08\x05\x12\x00raw".to_vec());
        let outcome = WidevineCodec.parse_response(&config(), response.clone());
        assert_eq!(outcome, AcquisitionOutcome::PassThrough(response));

        let empty = LicenseResponse::default();
        assert_eq!(
            WidevineCodec.parse_response(&config(), empty.clone()),
            AcquisitionOutcome::PassThrough(empty)
        );
    }

    #[test]
    fn json_license_is_decoded() {
        let license = vec![0u8, 1, 2, 254, 255];
        let body = serde_json::json!({
            "license": BASE64.encode(&license),
            "status": "OK",
        });
        let response = LicenseResponse::new(body.to_string());

        assert_eq!(
            WidevineCodec.parse_response(&config(), response),
            AcquisitionOutcome::Success(license)
        );
    }

    #[test]
    fn json_without_license_is_malformed() {
        for body in [r#"{"status":"OK"}"#, r#"{"license":42}"#, r#"{"license":"***"}"#, "17"] {
            let outcome = WidevineCodec.parse_response(&config(), LicenseResponse::new(body));
            assert!(
                matches!(outcome, AcquisitionOutcome::Failure(AcquisitionError::MalformedLicensePayload(_))),
                "body {body} gave {outcome:?}"
            );
        }
    }
}
