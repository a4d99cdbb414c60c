// Live target guidance for the active step
//
// This example evaluates a sensor snapshot against the targets of one
// step, the call a head unit would make about once a second.

use rust_decimal_macros::dec;
use traincore::models::{
    AthleteSnapshot, IntensityTarget, Reading, Step, StepDuration, TargetMetric, TimeUnit, Units,
};
use traincore::{LiveEvaluator, TargetStatus};

fn main() {
    let step = Step {
        name: "Threshold".to_string(),
        description: Some("Hold a steady effort".to_string()),
        duration: StepDuration::Time {
            value: dec!(20),
            unit: TimeUnit::Minutes,
        },
        targets: vec![
            IntensityTarget::value(TargetMetric::PercentFtp, dec!(95)),
            IntensityTarget::range(TargetMetric::PercentThresholdHr, dec!(95), dec!(102)),
        ],
    };

    let athlete = AthleteSnapshot {
        ftp: Some(250),
        threshold_hr: Some(165),
        max_hr: None,
        preferred_units: Units::Metric,
    };

    // One snapshot from the sensors
    let reading = Reading {
        power: Some(251),
        heart_rate: Some(158),
        cadence: Some(92),
        speed: None,
    };

    let evaluator = LiveEvaluator::new();
    for guidance in evaluator.evaluate(&step, &reading, &athlete) {
        let verdict = match guidance.status {
            TargetStatus::Within => "on target",
            TargetStatus::Below => "pick it up",
            TargetStatus::Above => "ease off",
        };
        println!("{}: {} ({})", guidance.metric, guidance.display, verdict);
    }
}
