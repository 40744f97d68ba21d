//! Robustness downgrade policy.
//!
//! One [`RetryPolicy`] lives for exactly one load. The only retry it ever
//! grants is a single step from hardware to software-crypto robustness when
//! the key system reports that the requested configuration is unavailable.
use crate::classify::FailureKind;
use crate::config::{DrmConfig, Robustness};

/// Policy state for the current load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryState {
    #[default]
    Initial,
    /// The one downgrade has been granted.
    Downgraded,
    /// No further retries for this load.
    Exhausted,
}

/// What the pipeline should do about a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-issue the whole load with this config.
    Retry(DrmConfig),
    /// Report the failure to the caller.
    Surface(FailureKind),
    /// End the load without reporting anything.
    Suppress,
}

#[derive(Debug, Default)]
pub struct RetryPolicy {
    state: RetryState,
    attempted_downgrade: bool,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    /// Set once the downgrade is granted; stays set for the rest of the load.
    pub fn attempted_downgrade(&self) -> bool {
        self.attempted_downgrade
    }

    /// Back to [`RetryState::Initial`] for a new load.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Decide on `kind`, which occurred while running with `config`.
    pub fn on_failure(&mut self, kind: FailureKind, config: &DrmConfig) -> RetryDecision {
        if kind.is_suppressed() {
            return RetryDecision::Suppress;
        }

        if self.state == RetryState::Initial
            && kind.is_downgradable()
            && !config.robustness.is_lowest()
        {
            self.state = RetryState::Downgraded;
            self.attempted_downgrade = true;
            return RetryDecision::Retry(config.with_robustness(Robustness::SoftwareCrypto));
        }

        self.state = RetryState::Exhausted;
        RetryDecision::Surface(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::{RetryDecision, RetryPolicy, RetryState};
    use crate::classify::FailureKind;
    use crate::config::{DrmConfig, Robustness, Vendor};

    fn config() -> DrmConfig {
        DrmConfig::new(Vendor::Widevine, "acme", "dev-1", "https://lic")
    }

    #[test]
    fn downgrades_exactly_once() {
        let mut policy = RetryPolicy::new();
        let hardware = config();

        let decision = policy.on_failure(FailureKind::KeySystemConfigUnavailable, &hardware);
        let lowered = match decision {
            RetryDecision::Retry(next) => next,
            other => panic!("expected retry, got {:?}", other),
        };
        assert_eq!(lowered, hardware.with_robustness(Robustness::SoftwareCrypto));
        assert_eq!(policy.state(), RetryState::Downgraded);
        assert!(policy.attempted_downgrade());

        let decision = policy.on_failure(FailureKind::KeySystemConfigUnavailable, &lowered);
        assert_eq!(decision, RetryDecision::Surface(FailureKind::KeySystemConfigUnavailable));
        assert_eq!(policy.state(), RetryState::Exhausted);
        assert!(policy.attempted_downgrade());
    }

    #[test]
    fn software_start_has_nothing_to_downgrade() {
        let mut policy = RetryPolicy::new();
        let software = config().with_robustness(Robustness::SoftwareCrypto);

        let decision = policy.on_failure(FailureKind::KeySystemConfigUnavailable, &software);
        assert_eq!(decision, RetryDecision::Surface(FailureKind::KeySystemConfigUnavailable));
        assert_eq!(policy.state(), RetryState::Exhausted);
        assert!(!policy.attempted_downgrade());
    }

    #[test]
    fn other_failures_exhaust_without_retry() {
        for kind in [FailureKind::LicenseRequestFailed, FailureKind::Unclassified(3016)] {
            let mut policy = RetryPolicy::new();
            assert_eq!(policy.on_failure(kind, &config()), RetryDecision::Surface(kind));
            assert_eq!(policy.state(), RetryState::Exhausted);
        }
    }

    #[test]
    fn exhausted_is_terminal() {
        let mut policy = RetryPolicy::new();
        policy.on_failure(FailureKind::LicenseRequestFailed, &config());

        let decision = policy.on_failure(FailureKind::KeySystemConfigUnavailable, &config());
        assert_eq!(decision, RetryDecision::Surface(FailureKind::KeySystemConfigUnavailable));
        assert_eq!(policy.state(), RetryState::Exhausted);
    }

    #[test]
    fn aborts_are_suppressed_and_leave_state() {
        let mut policy = RetryPolicy::new();
        assert_eq!(policy.on_failure(FailureKind::LoadInterrupted, &config()), RetryDecision::Suppress);
        assert_eq!(policy.on_failure(FailureKind::OperationAborted, &config()), RetryDecision::Suppress);
        assert_eq!(policy.state(), RetryState::Initial);
    }

    #[test]
    fn reset_returns_to_initial() {
        let mut policy = RetryPolicy::new();
        policy.on_failure(FailureKind::KeySystemConfigUnavailable, &config());
        policy.on_failure(FailureKind::KeySystemConfigUnavailable, &config());
        assert_eq!(policy.state(), RetryState::Exhausted);

        policy.reset();
        assert_eq!(policy.state(), RetryState::Initial);
        assert!(!policy.attempted_downgrade());
        assert!(matches!(
            policy.on_failure(FailureKind::KeySystemConfigUnavailable, &config()),
            RetryDecision::Retry(_)
        ));
    }
}
