//! Self-resolution policies.
//!
//! Enrichment asks a policy whether a closed alert resolved on its own. The
//! random policy is the stand-in used with mock data, which carries no
//! resolution timestamps; the window policy compares `resolved_date` against
//! `created_date` once real timestamps exist.

use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{AlertsConfig, SelfResolutionKind};
use crate::error::RetroError;
use crate::models::AlertItem;

/// Default probability that a closed alert is treated as self-resolved.
pub const DEFAULT_SELF_RESOLVED_PROBABILITY: f64 = 0.25;

/// Decides whether a closed alert counts as self-resolved.
///
/// Only called for alerts whose status is `closed`.
pub trait SelfResolutionPolicy {
    fn qualifies(&mut self, alert: &AlertItem) -> bool;

    /// Policy name for logging.
    fn name(&self) -> &str;
}

/// Flags closed alerts with a fixed probability, drawn from the supplied RNG.
pub struct RandomSelfResolution<R: Rng> {
    rng: R,
    probability: f64,
}

impl<R: Rng> RandomSelfResolution<R> {
    pub fn new(rng: R, probability: f64) -> Result<Self, RetroError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(RetroError::invalid(format!(
                "self-resolution probability must be within [0, 1], got {}",
                probability
            )));
        }
        Ok(Self { rng, probability })
    }
}

impl RandomSelfResolution<StdRng> {
    pub fn seeded(seed: u64, probability: f64) -> Result<Self, RetroError> {
        Self::new(StdRng::seed_from_u64(seed), probability)
    }

    pub fn from_entropy(probability: f64) -> Result<Self, RetroError> {
        Self::new(StdRng::from_entropy(), probability)
    }
}

impl<R: Rng> SelfResolutionPolicy for RandomSelfResolution<R> {
    fn qualifies(&mut self, _alert: &AlertItem) -> bool {
        self.rng.gen::<f64>() < self.probability
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Flags closed alerts resolved no later than `window` after creation.
/// Alerts without a `resolved_date` never qualify.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionWindow {
    window: Duration,
}

impl ResolutionWindow {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn minutes(minutes: u64) -> Self {
        Self::new(Duration::minutes(minutes as i64))
    }
}

impl SelfResolutionPolicy for ResolutionWindow {
    fn qualifies(&mut self, alert: &AlertItem) -> bool {
        match alert.resolved_date {
            Some(resolved) => {
                let elapsed = resolved - alert.created_date;
                elapsed >= Duration::zero() && elapsed <= self.window
            }
            None => false,
        }
    }

    fn name(&self) -> &str {
        "window"
    }
}

/// Build the configured policy. `seed` makes the random policy reproducible.
pub fn policy_from_config(
    config: &AlertsConfig,
    seed: Option<u64>,
) -> Result<Box<dyn SelfResolutionPolicy + Send>, RetroError> {
    match config.self_resolution {
        SelfResolutionKind::Random => {
            let policy = match seed {
                Some(s) => RandomSelfResolution::seeded(s, config.self_resolved_probability)?,
                None => RandomSelfResolution::from_entropy(config.self_resolved_probability)?,
            };
            Ok(Box::new(policy))
        }
        SelfResolutionKind::Window => Ok(Box::new(ResolutionWindow::minutes(
            config.self_resolved_minutes,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn closed_alert() -> AlertItem {
        AlertItem::new("a", "Disk Space Low", "closed", Utc::now())
    }

    #[test]
    fn test_random_policy_extremes() {
        let alert = closed_alert();
        let mut never = RandomSelfResolution::seeded(7, 0.0).unwrap();
        let mut always = RandomSelfResolution::seeded(7, 1.0).unwrap();
        for _ in 0..100 {
            assert!(!never.qualifies(&alert));
            assert!(always.qualifies(&alert));
        }
    }

    #[test]
    fn test_random_policy_is_reproducible_with_seed() {
        let alert = closed_alert();
        let mut a = RandomSelfResolution::seeded(42, 0.25).unwrap();
        let mut b = RandomSelfResolution::seeded(42, 0.25).unwrap();
        let left: Vec<bool> = (0..64).map(|_| a.qualifies(&alert)).collect();
        let right: Vec<bool> = (0..64).map(|_| b.qualifies(&alert)).collect();
        assert_eq!(left, right);
        assert!(left.iter().any(|q| *q), "some draws should qualify at p=0.25");
        assert!(left.iter().any(|q| !*q));
    }

    #[test]
    fn test_random_policy_rejects_bad_probability() {
        assert!(RandomSelfResolution::seeded(1, -0.1).is_err());
        assert!(RandomSelfResolution::seeded(1, 1.01).is_err());
    }

    #[test]
    fn test_window_policy() {
        let created = Utc::now();
        let mut policy = ResolutionWindow::minutes(10);

        let quick = closed_alert();
        let quick = AlertItem { created_date: created, ..quick }
            .with_resolved_date(created + Duration::minutes(4));
        assert!(policy.qualifies(&quick));

        let edge = AlertItem { created_date: created, ..closed_alert() }
            .with_resolved_date(created + Duration::minutes(10));
        assert!(policy.qualifies(&edge));

        let slow = AlertItem { created_date: created, ..closed_alert() }
            .with_resolved_date(created + Duration::minutes(45));
        assert!(!policy.qualifies(&slow));

        let unresolved = closed_alert();
        assert!(!policy.qualifies(&unresolved));

        let backwards = AlertItem { created_date: created, ..closed_alert() }
            .with_resolved_date(created - Duration::minutes(1));
        assert!(!policy.qualifies(&backwards));
    }

    #[test]
    fn test_policy_from_config_selects_kind() {
        let mut config = AlertsConfig::default();
        assert_eq!(policy_from_config(&config, Some(3)).unwrap().name(), "random");
        config.self_resolution = SelfResolutionKind::Window;
        assert_eq!(policy_from_config(&config, None).unwrap().name(), "window");
    }
}
