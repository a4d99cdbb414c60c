// Analyzing a structured workout plan
//
// This example builds a short interval session in code, flattens it and
// prints the aggregate statistics a plan screen would show.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use traincore::models::{
    AthleteSnapshot, IntensityTarget, PlanNode, Step, StepDuration, TargetMetric, TimeUnit, Units,
};
use traincore::{flatten, StatsCalculator};

fn timed_step(name: &str, minutes: u32, pct_ftp: Decimal) -> PlanNode {
    PlanNode::Step(Step {
        name: name.to_string(),
        description: None,
        duration: StepDuration::Time {
            value: Decimal::from(minutes),
            unit: TimeUnit::Minutes,
        },
        targets: vec![IntensityTarget::value(TargetMetric::PercentFtp, pct_ftp)],
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A warmup, four surge/recover couplets and a cooldown
    let plan = vec![
        timed_step("Warmup", 10, dec!(60)),
        PlanNode::Repetition {
            repeat: 4,
            nodes: vec![
                timed_step("Surge", 3, dec!(112)),
                timed_step("Recover", 3, dec!(50)),
            ],
        },
        timed_step("Cooldown", 10, dec!(55)),
    ];

    // Structural validation is advisory and separate from computation
    plan.iter().try_for_each(PlanNode::validate)?;

    // Flatten the repetition into the linear step sequence
    let steps = flatten(&plan);
    for step in &steps {
        match step.iteration() {
            Some(i) => println!("{:>2}. {} (rep {})", step.index, step.step.name, i + 1),
            None => println!("{:>2}. {}", step.index, step.step.name),
        }
    }

    // Aggregate statistics against the athlete's thresholds
    let athlete = AthleteSnapshot {
        ftp: Some(250),
        threshold_hr: Some(165),
        max_hr: Some(190),
        preferred_units: Units::Metric,
    };
    let stats = StatsCalculator::new().aggregate(&plan, &athlete);

    println!();
    println!("Total duration:    {}s", stats.total_duration_secs);
    println!(
        "Average intensity: {}% FTP",
        stats.avg_intensity_pct.round_dp(1)
    );
    println!("Intensity factor:  {}", stats.intensity_factor().round_dp(2));
    println!("Intervals:         {}", stats.interval_count);
    println!("Estimated TSS:     {}", stats.estimated_tss.round_dp(1));
    println!("Time in zone 5:    {}s", stats.zones.z5);

    Ok(())
}
