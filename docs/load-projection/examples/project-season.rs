// Projecting fitness across a season plan
//
// This example walks a contiguous block schedule through validation,
// weekly CTL projection and the progression summary.

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use traincore::{
    validate_blocks, FitnessProgression, LoadProjector, TrainingBlock, TrainingPhase, TssRange,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let schedule = vec![
        TrainingBlock {
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 28),
            phase: TrainingPhase::Base,
            weekly_tss: TssRange {
                min: dec!(300),
                max: dec!(400),
            },
        },
        TrainingBlock {
            start_date: date(2024, 1, 29),
            end_date: date(2024, 2, 25),
            phase: TrainingPhase::Build,
            weekly_tss: TssRange {
                min: dec!(400),
                max: dec!(520),
            },
        },
        TrainingBlock {
            start_date: date(2024, 2, 26),
            end_date: date(2024, 3, 3),
            phase: TrainingPhase::Taper,
            weekly_tss: TssRange {
                min: dec!(250),
                max: dec!(350),
            },
        },
    ];

    // Gaps and overlaps are reported here rather than inside project()
    validate_blocks(&schedule)?;

    let projector = LoadProjector::new();

    // Weekly CTL curve, integer-rounded the way the trends screen plots it
    for point in projector.project(dec!(45), &schedule) {
        println!("{}  CTL {}", point.date, point.ctl);
    }

    // Full fitness/fatigue/form triple at the end of the plan
    let series = projector.project_load(dec!(45), &schedule);
    if let Some(last) = series.last() {
        println!(
            "final  CTL {}  ATL {}  TSB {}",
            last.ctl.round_dp(1),
            last.atl.round_dp(1),
            last.tsb.round_dp(1)
        );
    }

    let summary = projector.summarize(
        &FitnessProgression {
            starting_ctl: dec!(45),
            target_ctl_at_peak: dec!(55),
        },
        &schedule,
    );
    if summary.target_met {
        println!(
            "peak CTL {} reaches the target",
            summary.peak_ctl.round_dp(1)
        );
    } else {
        println!("peak CTL {} falls short", summary.peak_ctl.round_dp(1));
    }

    Ok(())
}
