//! Latens device registration block carried by both vendor envelopes.
use serde::{Deserialize, Serialize};

use crate::config::{DrmConfig, Vendor};

const ACCOUNT_NAME: &str = "PlayReadyAccount";
const FRIENDLY_NAME: &str = "ShakaPlayer";
const FORMAT_VERSION: &str = "1";
const DEVICE_TYPE: &str = "Web";
const OS_TYPE: &str = "Tizen";
const OS_VERSION: &str = "0.0.0";
const DEVICE_VENDOR: &str = "Samsung";
const DEVICE_MODEL: &str = "Tizen";

/// Registration record identifying the customer and device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRegistration {
    #[serde(rename = "CustomerName")]
    pub customer_name: String,
    #[serde(rename = "AccountName")]
    pub account_name: String,
    #[serde(rename = "PortalId")]
    pub portal_id: String,
    #[serde(rename = "FriendlyName")]
    pub friendly_name: String,
    #[serde(rename = "DeviceInfo")]
    pub device_info: DeviceInfo,
}

/// Device description; only the DRM triple depends on the vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(rename = "FormatVersion")]
    pub format_version: String,
    #[serde(rename = "DeviceType")]
    pub device_type: String,
    #[serde(rename = "OSType")]
    pub os_type: String,
    #[serde(rename = "OSVersion")]
    pub os_version: String,
    #[serde(rename = "DRMProvider")]
    pub drm_provider: String,
    #[serde(rename = "DRMVersion")]
    pub drm_version: String,
    #[serde(rename = "DRMType")]
    pub drm_type: String,
    #[serde(rename = "DeviceVendor")]
    pub device_vendor: String,
    #[serde(rename = "DeviceModel")]
    pub device_model: String,
}

impl DeviceRegistration {
    /// Registration for the customer/device named in `config`.
    pub fn for_config(config: &DrmConfig) -> Self {
        let (provider, version, drm_type) = match config.vendor {
            Vendor::Widevine => ("Google", "1.4.8.86", "Widevine"),
            Vendor::PlayReady => ("Microsoft", "3", "Playready"),
        };

        Self {
            customer_name: config.customer_id.clone(),
            account_name: ACCOUNT_NAME.to_string(),
            portal_id: config.device_id.clone(),
            friendly_name: FRIENDLY_NAME.to_string(),
            device_info: DeviceInfo {
                format_version: FORMAT_VERSION.to_string(),
                device_type: DEVICE_TYPE.to_string(),
                os_type: OS_TYPE.to_string(),
                os_version: OS_VERSION.to_string(),
                drm_provider: provider.to_string(),
                drm_version: version.to_string(),
                drm_type: drm_type.to_string(),
                device_vendor: DEVICE_VENDOR.to_string(),
                device_model: DEVICE_MODEL.to_string(),
            },
        }
    }
}
