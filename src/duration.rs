use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::CalculationConfig;
use crate::models::{DistanceUnit, StepDuration, TimeUnit};

/// Converts step durations into planning-time second estimates
///
/// Distance and repetition durations have no exact length before the
/// workout happens, so they resolve through flat pace heuristics. The
/// resolver never fails: durations it cannot estimate resolve to zero
/// and negative inputs clamp to zero.
pub struct DurationResolver {
    config: CalculationConfig,
}

impl DurationResolver {
    /// Create a resolver with default heuristics
    pub fn new() -> Self {
        DurationResolver {
            config: CalculationConfig::default(),
        }
    }

    /// Create a resolver with custom heuristics
    pub fn with_config(config: CalculationConfig) -> Self {
        DurationResolver { config }
    }

    /// Estimated seconds for aggregation purposes
    ///
    /// Open-ended steps resolve to zero here so they never inflate
    /// totals or stress estimates.
    pub fn resolve(&self, duration: &StepDuration) -> Decimal {
        let seconds = match duration {
            StepDuration::Time { value, unit } => match unit {
                TimeUnit::Seconds => *value,
                TimeUnit::Minutes => *value * dec!(60),
            },
            StepDuration::Distance { value, unit } => {
                let km = match unit {
                    DistanceUnit::Kilometers => *value,
                    DistanceUnit::Meters => *value / dec!(1000),
                };
                km * self.config.seconds_per_km
            }
            StepDuration::Repetitions { count } => {
                Decimal::from(*count) * self.config.seconds_per_repetition
            }
            StepDuration::UntilFinished => Decimal::ZERO,
        };

        seconds.max(Decimal::ZERO)
    }

    /// Estimated seconds for display purposes
    ///
    /// Identical to [`resolve`](Self::resolve) except that open-ended
    /// steps get a nominal placeholder length so timelines can draw
    /// them with nonzero width.
    pub fn resolve_for_display(&self, duration: &StepDuration) -> Decimal {
        match duration {
            StepDuration::UntilFinished => self.config.open_ended_step_secs,
            other => self.resolve(other),
        }
    }
}

impl Default for DurationResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_time_durations_convert_to_seconds() {
        let resolver = DurationResolver::new();

        let seconds = StepDuration::Time {
            value: dec!(90),
            unit: TimeUnit::Seconds,
        };
        assert_eq!(resolver.resolve(&seconds), dec!(90));

        let minutes = StepDuration::Time {
            value: dec!(10),
            unit: TimeUnit::Minutes,
        };
        assert_eq!(resolver.resolve(&minutes), dec!(600));

        let fractional = StepDuration::Time {
            value: dec!(2.5),
            unit: TimeUnit::Minutes,
        };
        assert_eq!(resolver.resolve(&fractional), dec!(150));
    }

    #[test]
    fn test_distance_uses_flat_pace_heuristic() {
        let resolver = DurationResolver::new();

        let km = StepDuration::Distance {
            value: dec!(5),
            unit: DistanceUnit::Kilometers,
        };
        assert_eq!(resolver.resolve(&km), dec!(300));

        let meters = StepDuration::Distance {
            value: dec!(400),
            unit: DistanceUnit::Meters,
        };
        assert_eq!(resolver.resolve(&meters), dec!(24));
    }

    #[test]
    fn test_repetitions_use_per_rep_heuristic() {
        let resolver = DurationResolver::new();

        let reps = StepDuration::Repetitions { count: 12 };
        assert_eq!(resolver.resolve(&reps), dec!(360));
    }

    #[test]
    fn test_open_ended_resolves_to_zero() {
        let resolver = DurationResolver::new();
        assert_eq!(resolver.resolve(&StepDuration::UntilFinished), dec!(0));
    }

    #[test]
    fn test_open_ended_display_placeholder() {
        let resolver = DurationResolver::new();
        assert_eq!(
            resolver.resolve_for_display(&StepDuration::UntilFinished),
            dec!(300)
        );

        // Every other duration kind displays its aggregate estimate
        let minutes = StepDuration::Time {
            value: dec!(4),
            unit: TimeUnit::Minutes,
        };
        assert_eq!(resolver.resolve_for_display(&minutes), dec!(240));
    }

    #[test]
    fn test_negative_values_clamp_to_zero() {
        let resolver = DurationResolver::new();

        let negative = StepDuration::Time {
            value: dec!(-30),
            unit: TimeUnit::Seconds,
        };
        assert_eq!(resolver.resolve(&negative), dec!(0));
    }

    #[test]
    fn test_custom_heuristics_flow_through() {
        let mut config = CalculationConfig::default();
        config.seconds_per_km = dec!(240);
        config.open_ended_step_secs = dec!(60);
        let resolver = DurationResolver::with_config(config);

        let km = StepDuration::Distance {
            value: dec!(2),
            unit: DistanceUnit::Kilometers,
        };
        assert_eq!(resolver.resolve(&km), dec!(480));
        assert_eq!(
            resolver.resolve_for_display(&StepDuration::UntilFinished),
            dec!(60)
        );
    }
}
