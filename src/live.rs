use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::CalculationConfig;
use crate::models::{AthleteSnapshot, FlattenedStep, IntensityTarget, Reading, Step, TargetMetric};
use crate::targets::{describe, ResolvedTarget, TargetResolver, TargetStatus};

/// Per-target guidance for the step the athlete is executing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetGuidance {
    /// Metric this guidance refers to
    pub metric: TargetMetric,

    /// Where the current reading sits relative to the target
    pub status: TargetStatus,

    /// Display string: absolute when resolvable, relative otherwise
    pub display: String,

    /// Absolute target, when the athlete's thresholds allow resolving it
    pub resolved: Option<ResolvedTarget>,

    /// Reading value the status was judged against
    pub current: Option<Decimal>,
}

/// Evaluates live sensor readings against a step's targets
///
/// Built for the in-workout screen: it never fails and never blocks a
/// workout. A target that cannot be resolved, or a sensor that is not
/// reporting, evaluates as on-target with a relative display string so
/// the athlete still sees what the step asks for.
pub struct LiveEvaluator {
    resolver: TargetResolver,
}

impl LiveEvaluator {
    /// Create an evaluator with default tolerance settings
    pub fn new() -> Self {
        LiveEvaluator {
            resolver: TargetResolver::new(),
        }
    }

    /// Create an evaluator with custom tolerance settings
    pub fn with_config(config: CalculationConfig) -> Self {
        LiveEvaluator {
            resolver: TargetResolver::with_config(config),
        }
    }

    /// Evaluate every target of a step, in prescription order
    pub fn evaluate(
        &self,
        step: &Step,
        reading: &Reading,
        athlete: &AthleteSnapshot,
    ) -> Vec<TargetGuidance> {
        step.targets
            .iter()
            .map(|target| self.evaluate_target(target, reading, athlete))
            .collect()
    }

    /// Evaluate the step at a position in the flattened sequence
    pub fn evaluate_flattened(
        &self,
        step: &FlattenedStep,
        reading: &Reading,
        athlete: &AthleteSnapshot,
    ) -> Vec<TargetGuidance> {
        self.evaluate(&step.step, reading, athlete)
    }

    fn evaluate_target(
        &self,
        target: &IntensityTarget,
        reading: &Reading,
        athlete: &AthleteSnapshot,
    ) -> TargetGuidance {
        let resolved = self.resolver.resolve(target, athlete);
        let current = current_reading(target.metric, reading);
        let status = self.resolver.classify_opt(current, resolved.as_ref());
        let display = resolved
            .as_ref()
            .map(|r| r.label.clone())
            .unwrap_or_else(|| describe(target));

        TargetGuidance {
            metric: target.metric,
            status,
            display,
            resolved,
            current,
        }
    }
}

impl Default for LiveEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// The sensor value a metric is judged against
fn current_reading(metric: TargetMetric, reading: &Reading) -> Option<Decimal> {
    match metric {
        TargetMetric::PercentFtp | TargetMetric::Watts => reading.power.map(Decimal::from),
        TargetMetric::PercentMaxHr | TargetMetric::PercentThresholdHr | TargetMetric::Bpm => {
            reading.heart_rate.map(Decimal::from)
        }
        TargetMetric::Cadence => reading.cadence.map(Decimal::from),
        TargetMetric::Grade => None,
    }
}
