//! Vendor envelope codecs.
//!
//! A codec is a pure transform between the player's generic challenge/license
//! buffers and a license server's wire envelope. Codecs hold no state and
//! never see retry state; everything they need arrives in [`DrmConfig`].
use std::fmt;

use crate::config::{DrmConfig, Vendor};
use crate::message::{AcquisitionOutcome, LicenseRequest, LicenseResponse};

pub mod playready;
pub mod registration;
pub mod widevine;

pub use playready::PlayReadyCodec;
pub use registration::{DeviceInfo, DeviceRegistration};
pub use widevine::{WidevineCodec, WrappedChallenge};

/// Bidirectional envelope transform for one vendor.
pub trait EnvelopeCodec: fmt::Debug + Send + Sync {
    /// Vendor this codec speaks for.
    fn vendor(&self) -> Vendor;

    /// Rewrite an outgoing request into the vendor envelope.
    fn build_request(&self, config: &DrmConfig, request: LicenseRequest) -> LicenseRequest;

    /// Extract the license from a vendor response.
    fn parse_response(&self, config: &DrmConfig, response: LicenseResponse) -> AcquisitionOutcome;
}

/// Pick the codec for `vendor`. Done once per configuration.
pub fn for_vendor(vendor: Vendor) -> Box<dyn EnvelopeCodec> {
    match vendor {
        Vendor::Widevine => Box::new(WidevineCodec),
        Vendor::PlayReady => Box::new(PlayReadyCodec),
    }
}

#[cfg(test)]
mod tests {
    use super::for_vendor;
    use crate::config::Vendor;

    #[test]
    fn for_vendor_selects_matching_codec() {
        assert_eq!(for_vendor(Vendor::Widevine).vendor(), Vendor::Widevine);
        assert_eq!(for_vendor(Vendor::PlayReady).vendor(), Vendor::PlayReady);
    }
}
