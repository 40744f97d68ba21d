//! Configuration document handed to the host player's `configure()`.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{DrmConfig, Robustness};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConfiguration {
    pub abr: AbrConfiguration,
    pub streaming: StreamingConfiguration,
    pub drm: DrmConfiguration,
    pub manifest: ManifestConfiguration,
}

/// Adaptive bitrate tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbrConfiguration {
    /// Largest fraction of the estimated bandwidth to use before downgrading.
    pub bandwidth_downgrade_target: f64,
    /// Fraction of the estimated bandwidth to aim for when upgrading.
    pub bandwidth_upgrade_target: f64,
    /// Bandwidth estimate in bit/s until enough samples exist.
    pub default_bandwidth_estimate: u64,
    pub enabled: bool,
    /// Minimum seconds between variant switches.
    pub switch_interval: u32,
}

impl Default for AbrConfiguration {
    fn default() -> Self {
        Self {
            bandwidth_downgrade_target: 0.95,
            bandwidth_upgrade_target: 0.85,
            default_bandwidth_estimate: 1_200_000,
            enabled: true,
            switch_interval: 10,
        }
    }
}

/// Buffering goals in seconds. `buffering_goal >= rebuffering_goal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingConfiguration {
    pub rebuffering_goal: u32,
    pub buffering_goal: u32,
}

impl Default for StreamingConfiguration {
    fn default() -> Self {
        Self {
            rebuffering_goal: 5,
            buffering_goal: 6,
        }
    }
}

/// License servers and key system options, keyed by key system name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrmConfiguration {
    pub servers: BTreeMap<String, String>,
    pub advanced: BTreeMap<String, AdvancedDrmConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedDrmConfiguration {
    pub persistent_state_required: bool,
    pub video_robustness: Robustness,
    pub audio_robustness: Robustness,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestConfiguration {
    pub dash: DashConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashConfiguration {
    pub ignore_min_buffer_time: bool,
}

impl Default for DashConfiguration {
    fn default() -> Self {
        Self {
            ignore_min_buffer_time: true,
        }
    }
}

impl PlayerConfiguration {
    /// Player configuration for one acquisition attempt.
    pub fn for_drm(config: &DrmConfig) -> Self {
        let key_system = config.vendor.key_system().to_string();

        let mut drm = DrmConfiguration::default();
        drm.servers
            .insert(key_system.clone(), config.license_server_url.clone());
        drm.advanced.insert(
            key_system,
            AdvancedDrmConfiguration {
                persistent_state_required: config.persistent_state_required,
                video_robustness: config.robustness,
                audio_robustness: config.robustness,
            },
        );

        Self {
            abr: AbrConfiguration::default(),
            streaming: StreamingConfiguration::default(),
            drm,
            manifest: ManifestConfiguration::default(),
        }
    }

    /// Robustness requested for `key_system`, if configured.
    pub fn robustness(&self, key_system: &str) -> Option<Robustness> {
        self.drm.advanced.get(key_system).map(|a| a.video_robustness)
    }
}
