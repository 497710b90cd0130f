//! Guardrail checks and the action they recommend
//!
//! Guardrails are metrics that must not degrade while the primary metric is
//! optimized (latency, error rate, unsubscribes). Each treatment's mean is
//! compared against a fixed threshold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::frequentist::compute_results;
use super::monitoring::{AlertType, MonitoringAlert, Severity};
use crate::experiment::{Metric, MetricValue, Variant};
use crate::{Error, Result};

/// Which side of the threshold is a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdDirection {
    /// Violated when the mean exceeds the threshold
    Upper,
    /// Violated when the mean falls below the threshold
    Lower,
}

/// How serious a violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailSeverity {
    /// Worth watching
    Warning,
    /// Stop the experiment
    Critical,
}

impl GuardrailSeverity {
    /// Upper-case label used in alert messages
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

impl From<GuardrailSeverity> for Severity {
    fn from(severity: GuardrailSeverity) -> Self {
        match severity {
            GuardrailSeverity::Warning => Self::Warning,
            GuardrailSeverity::Critical => Self::Critical,
        }
    }
}

/// Threshold configured for one guardrail metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailConfig {
    /// Metric ID
    pub metric_id: String,
    /// Violation side
    pub direction: ThresholdDirection,
    /// Threshold on the variant mean
    pub threshold: f64,
    /// Violation severity
    pub severity: GuardrailSeverity,
}

impl GuardrailConfig {
    /// Violated when the mean exceeds `threshold`.
    #[must_use]
    pub fn upper(metric_id: impl Into<String>, threshold: f64, severity: GuardrailSeverity) -> Self {
        Self {
            metric_id: metric_id.into(),
            direction: ThresholdDirection::Upper,
            threshold,
            severity,
        }
    }

    /// Violated when the mean falls below `threshold`.
    #[must_use]
    pub fn lower(metric_id: impl Into<String>, threshold: f64, severity: GuardrailSeverity) -> Self {
        Self {
            metric_id: metric_id.into(),
            direction: ThresholdDirection::Lower,
            threshold,
            severity,
        }
    }

    /// Whether `value` crosses the threshold.
    #[must_use]
    pub fn is_violated_by(&self, value: f64) -> bool {
        match self.direction {
            ThresholdDirection::Upper => value > self.threshold,
            ThresholdDirection::Lower => value < self.threshold,
        }
    }
}

/// One treatment's standing against one guardrail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailCheck {
    /// Metric ID
    pub metric_id: String,
    /// Metric display name
    pub metric_name: String,
    /// Variant ID
    pub variant_id: String,
    /// Variant display name
    pub variant_name: String,
    /// Observed mean
    pub current_value: f64,
    /// Configured threshold
    pub threshold: f64,
    /// Violation side
    pub direction: ThresholdDirection,
    /// Whether the threshold was crossed
    pub is_violated: bool,
    /// Configured severity
    pub severity: GuardrailSeverity,
}

impl GuardrailCheck {
    /// Message like `CRITICAL: Treatment has exceeded the Latency threshold (320.00 vs 300.00)`.
    #[must_use]
    pub fn alert_message(&self) -> String {
        let verb = match self.direction {
            ThresholdDirection::Upper => "exceeded",
            ThresholdDirection::Lower => "fallen below",
        };
        format!(
            "{}: {} has {verb} the {} threshold ({:.2} vs {:.2})",
            self.severity.label(),
            self.variant_name,
            self.metric_name,
            self.current_value,
            self.threshold
        )
    }

    /// Monitoring alert for a violated check.
    #[must_use]
    pub fn to_alert(&self, experiment_id: &str, now: DateTime<Utc>) -> Option<MonitoringAlert> {
        self.is_violated.then(|| MonitoringAlert {
            experiment_id: experiment_id.to_string(),
            alert_type: AlertType::GuardrailViolation,
            severity: self.severity.into(),
            message: self.alert_message(),
            metric_id: Some(self.metric_id.clone()),
            raised_at: now,
        })
    }
}

/// Check each configured guardrail against every treatment.
///
/// Metrics without a config are skipped.
///
/// # Errors
///
/// Returns `Error::InvalidConfiguration` if a config names a primary metric,
/// or if the variants carry several controls.
pub fn check_guardrails(
    experiment_id: &str,
    metrics: &[Metric],
    values: &[MetricValue],
    variants: &[Variant],
    configs: &[GuardrailConfig],
    alpha: f64,
) -> Result<Vec<GuardrailCheck>> {
    if let Some(primary) = metrics
        .iter()
        .find(|m| m.is_primary() && configs.iter().any(|c| c.metric_id == m.metric_id()))
    {
        return Err(Error::InvalidConfiguration(format!(
            "guardrail configured on primary metric {}",
            primary.metric_id()
        )));
    }

    let mut checks = Vec::new();
    for metric in metrics {
        let Some(config) = configs.iter().find(|c| c.metric_id == metric.metric_id()) else {
            continue;
        };
        for result in compute_results(experiment_id, metric, variants, values, alpha)?
            .into_iter()
            .filter(|r| !r.is_control)
        {
            let is_violated = config.is_violated_by(result.mean);
            let check = GuardrailCheck {
                metric_id: result.metric_id,
                metric_name: result.metric_name,
                variant_id: result.variant_id,
                variant_name: result.variant_name,
                current_value: result.mean,
                threshold: config.threshold,
                direction: config.direction,
                is_violated,
                severity: config.severity,
            };
            if is_violated {
                warn!(experiment_id, "{}", check.alert_message());
            }
            checks.push(check);
        }
    }
    Ok(checks)
}

/// Recommended response to guardrail checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Keep running
    Continue,
    /// Pause and investigate
    Pause,
    /// Stop now
    Stop,
}

/// Action plus the reason behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecommendation {
    /// What to do
    pub action: Action,
    /// Why
    pub reason: String,
}

/// Turn guardrail checks into an action.
///
/// Any critical violation stops; two or more warnings pause; a single
/// warning continues under closer monitoring.
#[must_use]
pub fn recommend_action(checks: &[GuardrailCheck]) -> ActionRecommendation {
    let violated = checks.iter().filter(|c| c.is_violated);
    let (critical, warnings) = violated.fold((0usize, 0usize), |(c, w), check| match check.severity {
        GuardrailSeverity::Critical => (c + 1, w),
        GuardrailSeverity::Warning => (c, w + 1),
    });

    let (action, reason) = if critical > 0 {
        (Action::Stop, format!("{critical} critical guardrail violation(s) detected"))
    } else if warnings >= 2 {
        (Action::Pause, format!("{warnings} guardrail warnings detected"))
    } else if warnings == 1 {
        (
            Action::Continue,
            "1 guardrail warning detected, monitor closely".to_string(),
        )
    } else {
        (Action::Continue, "All guardrails within thresholds".to_string())
    };
    ActionRecommendation { action, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::MetricType;

    fn variants() -> Vec<Variant> {
        vec![
            Variant::control("a", "exp-1", "Control", 50.0),
            Variant::new("b", "exp-1", "Treatment", 50.0),
        ]
    }

    fn latency_values(control: f64, treatment: f64) -> Vec<MetricValue> {
        let mut values = Vec::new();
        for i in 0..10 {
            values.push(MetricValue::new("exp-1", "a", "latency", format!("a{i}"), control));
            values.push(MetricValue::new("exp-1", "b", "latency", format!("b{i}"), treatment));
        }
        values
    }

    fn latency() -> Metric {
        Metric::new("latency", "exp-1", "Latency", MetricType::Guardrail)
    }

    fn check(severity: GuardrailSeverity, is_violated: bool) -> GuardrailCheck {
        GuardrailCheck {
            metric_id: "m".to_string(),
            metric_name: "Latency".to_string(),
            variant_id: "b".to_string(),
            variant_name: "Treatment".to_string(),
            current_value: 320.0,
            threshold: 300.0,
            direction: ThresholdDirection::Upper,
            is_violated,
            severity,
        }
    }

    #[test]
    fn test_upper_violation_excludes_control() {
        let configs = [GuardrailConfig::upper("latency", 300.0, GuardrailSeverity::Critical)];
        let checks = check_guardrails(
            "exp-1",
            &[latency()],
            &latency_values(350.0, 320.0),
            &variants(),
            &configs,
            0.05,
        )
        .unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].variant_id, "b");
        assert!(checks[0].is_violated);
    }

    #[test]
    fn test_lower_threshold() {
        let configs = [GuardrailConfig::lower("latency", 300.0, GuardrailSeverity::Warning)];
        let checks = check_guardrails(
            "exp-1",
            &[latency()],
            &latency_values(350.0, 320.0),
            &variants(),
            &configs,
            0.05,
        )
        .unwrap();
        assert!(!checks[0].is_violated);
    }

    #[test]
    fn test_unconfigured_metric_skipped() {
        let checks = check_guardrails(
            "exp-1",
            &[latency()],
            &latency_values(350.0, 320.0),
            &variants(),
            &[],
            0.05,
        )
        .unwrap();
        assert!(checks.is_empty());
    }

    #[test]
    fn test_guardrail_on_primary_rejected() {
        let primary = Metric::builder("conv", "exp-1", "Conversion", MetricType::Conversion)
            .primary()
            .build();
        let configs = [GuardrailConfig::upper("conv", 0.5, GuardrailSeverity::Warning)];
        let err = check_guardrails("exp-1", &[primary], &[], &variants(), &configs, 0.05).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_alert_message() {
        let c = check(GuardrailSeverity::Critical, true);
        assert_eq!(
            c.alert_message(),
            "CRITICAL: Treatment has exceeded the Latency threshold (320.00 vs 300.00)"
        );
        let lower = GuardrailCheck {
            direction: ThresholdDirection::Lower,
            severity: GuardrailSeverity::Warning,
            ..c
        };
        assert!(lower.alert_message().starts_with("WARNING: Treatment has fallen below"));
    }

    #[test]
    fn test_to_alert_only_when_violated() {
        let now = Utc::now();
        assert!(check(GuardrailSeverity::Warning, false).to_alert("exp-1", now).is_none());
        let alert = check(GuardrailSeverity::Critical, true).to_alert("exp-1", now).unwrap();
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.alert_type, AlertType::GuardrailViolation);
    }

    #[test]
    fn test_recommend_action() {
        use GuardrailSeverity::{Critical, Warning};
        assert_eq!(recommend_action(&[]).action, Action::Continue);
        assert_eq!(recommend_action(&[check(Critical, true)]).action, Action::Stop);
        assert_eq!(
            recommend_action(&[check(Warning, true), check(Warning, true)]).action,
            Action::Pause
        );
        let single = recommend_action(&[check(Warning, true), check(Critical, false)]);
        assert_eq!(single.action, Action::Continue);
        assert!(single.reason.contains("monitor closely"));
    }
}
