//! DRM configuration supplied by the host application.
//!
//! A [`DrmConfig`] is immutable for one acquisition attempt. The only field a
//! retry may change is [`DrmConfig::robustness`], and it does so by building a
//! new value with [`DrmConfig::with_robustness`].
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// License server vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Widevine,
    PlayReady,
}

impl Vendor {
    /// EME key system name used by the host player.
    pub fn key_system(self) -> &'static str {
        match self {
            Vendor::Widevine => "com.widevine.alpha",
            Vendor::PlayReady => "com.microsoft.playready",
        }
    }
}

impl FromStr for Vendor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "widevine" | "com.widevine.alpha" => Ok(Vendor::Widevine),
            "playready" | "com.microsoft.playready" => Ok(Vendor::PlayReady),
            _ => Err(Error::InvalidVendor(s.to_string())),
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vendor::Widevine => f.write_str("widevine"),
            Vendor::PlayReady => f.write_str("playready"),
        }
    }
}

/// Security robustness requested from the device key system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Robustness {
    /// Hardware-backed decryption and decoding.
    #[default]
    #[serde(rename = "HW_SECURE_ALL")]
    Hardware,
    /// Software-only crypto; the downgrade target.
    #[serde(rename = "SW_SECURE_CRYPTO")]
    SoftwareCrypto,
}

impl Robustness {
    pub fn as_str(self) -> &'static str {
        match self {
            Robustness::Hardware => "HW_SECURE_ALL",
            Robustness::SoftwareCrypto => "SW_SECURE_CRYPTO",
        }
    }

    /// The lowest level the adapter will ever request.
    pub fn is_lowest(self) -> bool {
        self == Robustness::SoftwareCrypto
    }
}

impl FromStr for Robustness {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "HW_SECURE_ALL" => Ok(Robustness::Hardware),
            "SW_SECURE_CRYPTO" => Ok(Robustness::SoftwareCrypto),
            _ => Err(Error::InvalidRobustness(s.to_string())),
        }
    }
}

impl fmt::Display for Robustness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_persistent_state() -> bool {
    true
}

/// Per-acquisition DRM configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrmConfig {
    pub vendor: Vendor,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub license_server_url: String,
    #[serde(default)]
    pub robustness: Robustness,
    #[serde(default = "default_persistent_state")]
    pub persistent_state_required: bool,
}

impl DrmConfig {
    /// Create a config at the default robustness with persistent state on.
    pub fn new(
        vendor: Vendor,
        customer_id: impl Into<String>,
        device_id: impl Into<String>,
        license_server_url: impl Into<String>,
    ) -> Self {
        Self {
            vendor,
            customer_id: customer_id.into(),
            device_id: device_id.into(),
            license_server_url: license_server_url.into(),
            robustness: Robustness::default(),
            persistent_state_required: true,
        }
    }

    /// Copy of this config differing only in robustness.
    #[must_use]
    pub fn with_robustness(&self, robustness: Robustness) -> Self {
        Self {
            robustness,
            ..self.clone()
        }
    }
}

/// DRM block of a media source, as handed over by the host application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrmSource {
    pub license_url: String,
    pub device_id: String,
    pub customer_id: String,
    pub cast_token: Option<String>,
}

/// A media source to load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSource {
    pub uri: String,
    pub drm: Option<DrmSource>,
}

impl MediaSource {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            drm: None,
        }
    }

    /// Build the acquisition config for this source.
    ///
    /// A source without a DRM block yields empty identifiers; the license
    /// server decides what to make of them.
    pub fn drm_config(&self, vendor: Vendor, robustness: Robustness) -> DrmConfig {
        let drm = self.drm.clone().unwrap_or_default();
        DrmConfig::new(vendor, drm.customer_id, drm.device_id, drm.license_url)
            .with_robustness(robustness)
    }
}

/// Adapter configuration file.
///
/// ```yaml
/// drm:
///   vendor: widevine
///   customer_id: acme
///   device_id: device-1
///   license_server_url: https://license.example.com/wv
///   robustness: HW_SECURE_ALL
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
    pub drm: DrmConfig,
}

impl AdapterConfig {
    /// Load configuration from a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let config: AdapterConfig = serde_yaml::from_str(data)?;
        if config.drm.license_server_url.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "license_server_url must not be empty".to_string(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robustness_literals() {
        assert_eq!(Robustness::default(), Robustness::Hardware);
        assert_eq!(Robustness::Hardware.to_string(), "HW_SECURE_ALL");
        assert_eq!(
            "SW_SECURE_CRYPTO".parse::<Robustness>().expect("parse"),
            Robustness::SoftwareCrypto
        );
        assert!("SW_SECURE_DECODE".parse::<Robustness>().is_err());
    }

    #[test]
    fn vendor_accepts_key_system_names() {
        assert_eq!("com.widevine.alpha".parse::<Vendor>().expect("parse"), Vendor::Widevine);
        assert_eq!("PlayReady".parse::<Vendor>().expect("parse"), Vendor::PlayReady);
        assert!("fairplay".parse::<Vendor>().is_err());
    }

    #[test]
    fn with_robustness_changes_only_robustness() {
        let config = DrmConfig::new(Vendor::Widevine, "acme", "dev-1", "https://lic");
        let lowered = config.with_robustness(Robustness::SoftwareCrypto);

        assert_eq!(lowered.robustness, Robustness::SoftwareCrypto);
        assert_eq!(lowered.with_robustness(Robustness::Hardware), config);
    }

    #[test]
    fn yaml_config_defaults() {
        let yaml = "drm:\n  vendor: playready\n  customer_id: acme\n  license_server_url: https://lic\n";
        let config = AdapterConfig::from_yaml(yaml).expect("parse config");

        assert_eq!(config.drm.vendor, Vendor::PlayReady);
        assert_eq!(config.drm.robustness, Robustness::Hardware);
        assert!(config.drm.persistent_state_required);
        assert!(config.drm.device_id.is_empty());
    }

    #[test]
    fn yaml_config_requires_license_server() {
        let yaml = "drm:\n  vendor: widevine\n  robustness: SW_SECURE_CRYPTO\n";
        let err = AdapterConfig::from_yaml(yaml).expect_err("missing url should fail");
        assert!(err.to_string().contains("license_server_url"));
    }

    #[test]
    fn media_source_without_drm_block() {
        let source = MediaSource::new("https://cdn/manifest.mpd");
        let config = source.drm_config(Vendor::Widevine, Robustness::SoftwareCrypto);

        assert!(config.customer_id.is_empty());
        assert!(config.license_server_url.is_empty());
        assert_eq!(config.robustness, Robustness::SoftwareCrypto);
    }
}
