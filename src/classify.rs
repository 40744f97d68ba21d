//! Classification of license-acquisition failures.
//!
//! The host player and its CDM report failures as numeric codes. Only a few
//! of them matter to the adapter; everything else is passed on verbatim.
use std::fmt;

/// REQUESTED_KEY_SYSTEM_CONFIG_UNAVAILABLE
pub const KEY_SYSTEM_CONFIG_UNAVAILABLE: u32 = 6001;
/// LICENSE_REQUEST_FAILED
pub const LICENSE_REQUEST_FAILED: u32 = 6007;
/// LICENSE_RESPONSE_REJECTED
pub const LICENSE_RESPONSE_REJECTED: u32 = 6008;
/// LOAD_INTERRUPTED
pub const LOAD_INTERRUPTED: u32 = 7000;
/// OPERATION_ABORTED
pub const OPERATION_ABORTED: u32 = 7001;

/// Abstract failure kinds the retry policy reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The key system cannot satisfy the requested robustness.
    KeySystemConfigUnavailable,
    /// Superseded by a newer load.
    LoadInterrupted,
    /// Superseded by a newer load.
    OperationAborted,
    /// The license server rejected or failed the request.
    LicenseRequestFailed,
    /// Any other code, kept for the caller.
    Unclassified(u32),
}

impl FailureKind {
    /// Aborted loads end silently.
    pub fn is_suppressed(self) -> bool {
        matches!(self, FailureKind::LoadInterrupted | FailureKind::OperationAborted)
    }

    /// Whether a robustness downgrade may help.
    pub fn is_downgradable(self) -> bool {
        self == FailureKind::KeySystemConfigUnavailable
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::KeySystemConfigUnavailable => f.write_str("key system config unavailable"),
            FailureKind::LoadInterrupted => f.write_str("load interrupted"),
            FailureKind::OperationAborted => f.write_str("operation aborted"),
            FailureKind::LicenseRequestFailed => f.write_str("license request failed"),
            FailureKind::Unclassified(code) => write!(f, "unclassified failure {}", code),
        }
    }
}

/// Map a raw failure code to its kind.
pub fn classify(code: u32) -> FailureKind {
    match code {
        KEY_SYSTEM_CONFIG_UNAVAILABLE => FailureKind::KeySystemConfigUnavailable,
        LOAD_INTERRUPTED => FailureKind::LoadInterrupted,
        OPERATION_ABORTED => FailureKind::OperationAborted,
        LICENSE_REQUEST_FAILED | LICENSE_RESPONSE_REJECTED => FailureKind::LicenseRequestFailed,
        other => FailureKind::Unclassified(other),
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, FailureKind};

    #[test]
    fn known_codes() {
        assert_eq!(classify(6001), FailureKind::KeySystemConfigUnavailable);
        assert_eq!(classify(7000), FailureKind::LoadInterrupted);
        assert_eq!(classify(7001), FailureKind::OperationAborted);
        assert_eq!(classify(6007), FailureKind::LicenseRequestFailed);
        assert_eq!(classify(6008), FailureKind::LicenseRequestFailed);
    }

    #[test]
    fn unknown_codes_are_kept() {
        assert_eq!(classify(1001), FailureKind::Unclassified(1001));
        assert_eq!(classify(0), FailureKind::Unclassified(0));
    }

    #[test]
    fn suppression() {
        assert!(classify(7000).is_suppressed());
        assert!(classify(7001).is_suppressed());
        assert!(!classify(6001).is_suppressed());
        assert!(!classify(6007).is_suppressed());
    }
}
