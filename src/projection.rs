use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Projection errors
#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),
    #[error("Overlapping blocks: {0}")]
    OverlappingBlocks(String),
    #[error("Non-contiguous blocks: {0}")]
    NonContiguousBlocks(String),
    #[error("Invalid TSS range: {0}")]
    InvalidTssRange(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Training phases in periodized sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingPhase {
    Base,
    Build,
    Peak,
    Taper,
}

impl TrainingPhase {
    /// Get phase description
    pub fn description(&self) -> &'static str {
        match self {
            TrainingPhase::Base => "Aerobic foundation building",
            TrainingPhase::Build => "Progressive overload and intensity",
            TrainingPhase::Peak => "Race-specific sharpening",
            TrainingPhase::Taper => "Load reduction before the event",
        }
    }
}

/// Weekly TSS band prescribed for a training block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TssRange {
    pub min: Decimal,
    pub max: Decimal,
}

/// A contiguous span of weeks trained at one weekly TSS band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingBlock {
    /// First training day of the block
    pub start_date: NaiveDate,

    /// Last training day of the block (inclusive)
    pub end_date: NaiveDate,

    /// Periodization phase the block belongs to
    pub phase: TrainingPhase,

    /// Weekly TSS band; projections train at the top of the band
    pub weekly_tss: TssRange,
}

impl TrainingBlock {
    /// True when the date falls inside the block
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Calendar length of the block in days
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Start and goal fitness for a plan-level projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessProgression {
    /// CTL the athlete carries into the first block
    pub starting_ctl: Decimal,

    /// CTL the plan aims to reach at its peak
    pub target_ctl_at_peak: Decimal,
}

/// One weekly CTL sample, rounded for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtlPoint {
    pub date: NaiveDate,
    pub ctl: Decimal,
}

/// One weekly sample with full-precision load metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedLoad {
    pub date: NaiveDate,

    /// Chronic Training Load (42-day exponentially weighted average)
    pub ctl: Decimal,

    /// Acute Training Load (7-day exponentially weighted average)
    pub atl: Decimal,

    /// Training Stress Balance (CTL - ATL)
    pub tsb: Decimal,
}

/// Plan-level outcome of a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    /// CTL entering the plan
    pub starting_ctl: Decimal,

    /// CTL at the end of the final block
    pub final_ctl: Decimal,

    /// Highest weekly CTL sample reached anywhere in the plan
    pub peak_ctl: Decimal,

    /// CTL the plan aimed for
    pub target_ctl_at_peak: Decimal,

    /// True when the projected peak reaches the target
    pub target_met: bool,

    /// Number of weekly strides projected
    pub weeks: u32,
}

/// Projection configuration with customizable time constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// CTL time constant in days (default: 42)
    pub ctl_time_constant: u16,

    /// ATL time constant in days (default: 7)
    pub atl_time_constant: u16,

    /// Fraction of the weekly band trained during taper blocks
    pub taper_factor: Decimal,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        ProjectionConfig {
            ctl_time_constant: 42,
            atl_time_constant: 7,
            taper_factor: dec!(0.6),
        }
    }
}

impl ProjectionConfig {
    /// Check the configuration for values the walk cannot run with
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.ctl_time_constant == 0 || self.atl_time_constant == 0 {
            return Err(ProjectionError::ConfigurationError(
                "Time constants must be positive".to_string(),
            ));
        }
        if self.taper_factor <= Decimal::ZERO || self.taper_factor > Decimal::ONE {
            return Err(ProjectionError::ConfigurationError(
                "Taper factor must be a fraction in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Forward-projects chronic training load over a block schedule
///
/// The walk applies the standard impulse-response recurrence once per
/// calendar day, treating every day inside a block as carrying an
/// equal share of the block's weekly TSS target, and samples the state
/// at weekly strides. Days not covered by any block count as rest and
/// decay the load. Taper blocks train at a reduced share of their
/// band.
pub struct LoadProjector {
    config: ProjectionConfig,
}

impl LoadProjector {
    /// Create a projector with default time constants
    pub fn new() -> Self {
        LoadProjector {
            config: ProjectionConfig::default(),
        }
    }

    /// Create a projector with custom time constants
    pub fn with_config(config: ProjectionConfig) -> Self {
        LoadProjector { config }
    }

    /// Weekly CTL curve for charting, rounded to whole CTL points
    ///
    /// The first point carries the starting CTL through unchanged;
    /// later points round half away from zero. An empty schedule
    /// projects an empty curve.
    pub fn project(&self, starting_ctl: Decimal, blocks: &[TrainingBlock]) -> Vec<CtlPoint> {
        self.weekly_series(starting_ctl, blocks)
            .into_iter()
            .enumerate()
            .map(|(i, sample)| CtlPoint {
                date: sample.date,
                ctl: if i == 0 {
                    sample.ctl
                } else {
                    sample
                        .ctl
                        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                },
            })
            .collect()
    }

    /// Weekly CTL/ATL/TSB curve at full precision
    ///
    /// ATL starts level with CTL, so the plan opens from a neutral
    /// training stress balance.
    pub fn project_load(
        &self,
        starting_ctl: Decimal,
        blocks: &[TrainingBlock],
    ) -> Vec<ProjectedLoad> {
        self.weekly_series(starting_ctl, blocks)
    }

    /// Project a whole plan and compare the outcome to its goal
    pub fn summarize(
        &self,
        progression: &FitnessProgression,
        blocks: &[TrainingBlock],
    ) -> ProjectionSummary {
        let series = self.weekly_series(progression.starting_ctl, blocks);

        let final_ctl = series.last().map(|p| p.ctl).unwrap_or(Decimal::ZERO);
        let peak_ctl = series
            .iter()
            .map(|p| p.ctl)
            .fold(Decimal::ZERO, |a, b| a.max(b));
        let target_met = !series.is_empty() && peak_ctl >= progression.target_ctl_at_peak;

        ProjectionSummary {
            starting_ctl: progression.starting_ctl,
            final_ctl,
            peak_ctl,
            target_ctl_at_peak: progression.target_ctl_at_peak,
            target_met,
            weeks: series.len().saturating_sub(1) as u32,
        }
    }

    fn weekly_series(&self, starting_ctl: Decimal, blocks: &[TrainingBlock]) -> Vec<ProjectedLoad> {
        let (start, end) = match (blocks.first(), blocks.last()) {
            (Some(first), Some(last)) => (first.start_date, last.end_date),
            _ => return Vec::new(),
        };

        let ctl_alpha = exponential_alpha(self.config.ctl_time_constant);
        let atl_alpha = exponential_alpha(self.config.atl_time_constant);

        let mut ctl = starting_ctl;
        let mut atl = starting_ctl;
        let mut series = vec![ProjectedLoad {
            date: start,
            ctl,
            atl,
            tsb: ctl - atl,
        }];

        let mut date = start;
        while date < end {
            // Final stride may be shorter than a week
            let next = (date + Duration::days(7)).min(end);
            let days = (next - date).num_days();

            for offset in 1..=days {
                let day = date + Duration::days(offset);
                let daily_tss = self.daily_target_tss(blocks, day);

                // CTL_today = CTL_yesterday + (TSS_today - CTL_yesterday) × (1 - e^(-1/tc))
                ctl += (daily_tss - ctl) * ctl_alpha;
                atl += (daily_tss - atl) * atl_alpha;
            }

            series.push(ProjectedLoad {
                date: next,
                ctl,
                atl,
                tsb: ctl - atl,
            });
            date = next;
        }

        series
    }

    /// Daily TSS prescribed for a calendar day, zero outside all blocks
    fn daily_target_tss(&self, blocks: &[TrainingBlock], day: NaiveDate) -> Decimal {
        blocks
            .iter()
            .find(|block| block.contains(day))
            .map(|block| {
                let weekly = match block.phase {
                    TrainingPhase::Taper => block.weekly_tss.max * self.config.taper_factor,
                    _ => block.weekly_tss.max,
                };
                weekly / dec!(7)
            })
            .unwrap_or(Decimal::ZERO)
    }
}

impl Default for LoadProjector {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural checks on a block schedule
///
/// Projection itself is lenient; this is the advisory pass a planner
/// runs before committing a schedule. Blocks must be individually
/// well-formed, strictly ordered, and back-to-back on the calendar.
pub fn validate_blocks(blocks: &[TrainingBlock]) -> Result<(), ProjectionError> {
    for block in blocks {
        if block.end_date < block.start_date {
            return Err(ProjectionError::InvalidDateRange(format!(
                "Block starting {} ends before it begins",
                block.start_date
            )));
        }
        if block.weekly_tss.min > block.weekly_tss.max {
            return Err(ProjectionError::InvalidTssRange(format!(
                "Block starting {} has an inverted weekly TSS band",
                block.start_date
            )));
        }
        if block.weekly_tss.min < Decimal::ZERO {
            return Err(ProjectionError::InvalidTssRange(format!(
                "Block starting {} prescribes negative TSS",
                block.start_date
            )));
        }
    }

    for pair in blocks.windows(2) {
        if pair[1].start_date <= pair[0].end_date {
            return Err(ProjectionError::OverlappingBlocks(format!(
                "Block starting {} begins before the previous block ends",
                pair[1].start_date
            )));
        }
        if pair[1].start_date != pair[0].end_date + Duration::days(1) {
            return Err(ProjectionError::NonContiguousBlocks(format!(
                "Gap between {} and {}",
                pair[0].end_date, pair[1].start_date
            )));
        }
    }

    Ok(())
}

/// Daily smoothing factor 1 - e^(-1/tc)
///
/// The transcendental runs through f64; the error is far below the
/// weekly sampling resolution.
fn exponential_alpha(time_constant: u16) -> Decimal {
    let alpha = 1.0 - (-1.0 / f64::from(time_constant.max(1))).exp();
    Decimal::from_f64(alpha).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn block(
        start: NaiveDate,
        end: NaiveDate,
        phase: TrainingPhase,
        min: Decimal,
        max: Decimal,
    ) -> TrainingBlock {
        TrainingBlock {
            start_date: start,
            end_date: end,
            phase,
            weekly_tss: TssRange { min, max },
        }
    }

    fn base_month() -> Vec<TrainingBlock> {
        vec![block(
            date(2024, 1, 1),
            date(2024, 1, 28),
            TrainingPhase::Base,
            dec!(300),
            dec!(400),
        )]
    }

    #[test]
    fn test_month_of_base_raises_ctl_weekly() {
        let projector = LoadProjector::new();
        let points = projector.project(dec!(50), &base_month());

        let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 1),
                date(2024, 1, 8),
                date(2024, 1, 15),
                date(2024, 1, 22),
                date(2024, 1, 28),
            ]
        );

        let ctls: Vec<Decimal> = points.iter().map(|p| p.ctl).collect();
        assert_eq!(ctls, vec![dec!(50), dec!(51), dec!(52), dec!(53), dec!(53)]);
    }

    #[test]
    fn test_ctl_converges_toward_daily_target() {
        let projector = LoadProjector::new();
        let series = projector.project_load(dec!(50), &base_month());

        // Training at 400/week = 57.14/day pulls CTL up but never past it
        let daily_target = dec!(400) / dec!(7);
        for pair in series.windows(2) {
            assert!(pair[1].ctl > pair[0].ctl);
        }
        assert!(series.last().unwrap().ctl < daily_target);
    }

    #[test]
    fn test_rest_schedule_decays_ctl() {
        let projector = LoadProjector::new();
        let rest = vec![block(
            date(2024, 3, 4),
            date(2024, 3, 31),
            TrainingPhase::Base,
            dec!(0),
            dec!(0),
        )];
        let series = projector.project_load(dec!(60), &rest);

        for pair in series.windows(2) {
            assert!(pair[1].ctl < pair[0].ctl);
        }
        assert!(series.last().unwrap().ctl > Decimal::ZERO);
    }

    #[test]
    fn test_taper_trains_at_reduced_band() {
        let projector = LoadProjector::new();
        let start = date(2024, 5, 6);
        let end = date(2024, 5, 19);

        let full = vec![block(start, end, TrainingPhase::Peak, dec!(400), dec!(400))];
        let taper = vec![block(start, end, TrainingPhase::Taper, dec!(400), dec!(400))];

        let full_final = projector.project_load(dec!(40), &full).last().unwrap().ctl;
        let taper_final = projector.project_load(dec!(40), &taper).last().unwrap().ctl;
        assert!(taper_final < full_final);
    }

    #[test]
    fn test_partial_final_week_samples_end_date() {
        let projector = LoadProjector::new();
        let short = vec![block(
            date(2024, 2, 5),
            date(2024, 2, 14),
            TrainingPhase::Build,
            dec!(350),
            dec!(420),
        )];
        let points = projector.project(dec!(45), &short);

        let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 2, 5), date(2024, 2, 12), date(2024, 2, 14)]
        );
    }

    #[test]
    fn test_empty_schedule_projects_nothing() {
        let projector = LoadProjector::new();
        assert!(projector.project(dec!(50), &[]).is_empty());
        assert!(projector.project_load(dec!(50), &[]).is_empty());
    }

    #[test]
    fn test_atl_responds_faster_than_ctl() {
        let projector = LoadProjector::new();
        let series = projector.project_load(dec!(30), &base_month());

        assert_eq!(series[0].tsb, dec!(0));
        // Ramping up: acute load leads chronic load, balance goes negative
        assert!(series[1].atl > series[1].ctl);
        assert!(series[1].tsb < Decimal::ZERO);
    }

    #[test]
    fn test_summarize_reports_peak_against_target() {
        let projector = LoadProjector::new();
        let progression = FitnessProgression {
            starting_ctl: dec!(50),
            target_ctl_at_peak: dec!(52),
        };

        let summary = projector.summarize(&progression, &base_month());
        assert_eq!(summary.weeks, 4);
        assert!(summary.target_met);
        assert!(summary.peak_ctl > dec!(53));
        assert_eq!(summary.final_ctl, summary.peak_ctl);

        let ambitious = FitnessProgression {
            starting_ctl: dec!(50),
            target_ctl_at_peak: dec!(80),
        };
        assert!(!projector.summarize(&ambitious, &base_month()).target_met);
    }

    #[test]
    fn test_summarize_empty_schedule() {
        let projector = LoadProjector::new();
        let progression = FitnessProgression {
            starting_ctl: dec!(50),
            target_ctl_at_peak: dec!(0),
        };

        let summary = projector.summarize(&progression, &[]);
        assert_eq!(summary.weeks, 0);
        assert!(!summary.target_met);
    }

    #[test]
    fn test_validate_accepts_contiguous_schedule() {
        let blocks = vec![
            block(
                date(2024, 1, 1),
                date(2024, 1, 28),
                TrainingPhase::Base,
                dec!(300),
                dec!(400),
            ),
            block(
                date(2024, 1, 29),
                date(2024, 2, 25),
                TrainingPhase::Build,
                dec!(400),
                dec!(500),
            ),
        ];
        assert!(validate_blocks(&blocks).is_ok());
    }

    #[test]
    fn test_validate_rejects_gap() {
        let blocks = vec![
            block(
                date(2024, 1, 1),
                date(2024, 1, 28),
                TrainingPhase::Base,
                dec!(300),
                dec!(400),
            ),
            block(
                date(2024, 2, 1),
                date(2024, 2, 25),
                TrainingPhase::Build,
                dec!(400),
                dec!(500),
            ),
        ];
        assert!(matches!(
            validate_blocks(&blocks),
            Err(ProjectionError::NonContiguousBlocks(_))
        ));
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let blocks = vec![
            block(
                date(2024, 1, 1),
                date(2024, 1, 28),
                TrainingPhase::Base,
                dec!(300),
                dec!(400),
            ),
            block(
                date(2024, 1, 20),
                date(2024, 2, 10),
                TrainingPhase::Build,
                dec!(400),
                dec!(500),
            ),
        ];
        assert!(matches!(
            validate_blocks(&blocks),
            Err(ProjectionError::OverlappingBlocks(_))
        ));
    }

    #[test]
    fn test_validate_rejects_malformed_block() {
        let inverted_dates = vec![block(
            date(2024, 1, 28),
            date(2024, 1, 1),
            TrainingPhase::Base,
            dec!(300),
            dec!(400),
        )];
        assert!(matches!(
            validate_blocks(&inverted_dates),
            Err(ProjectionError::InvalidDateRange(_))
        ));

        let inverted_band = vec![block(
            date(2024, 1, 1),
            date(2024, 1, 28),
            TrainingPhase::Base,
            dec!(400),
            dec!(300),
        )];
        assert!(matches!(
            validate_blocks(&inverted_band),
            Err(ProjectionError::InvalidTssRange(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(ProjectionConfig::default().validate().is_ok());

        let mut config = ProjectionConfig::default();
        config.ctl_time_constant = 0;
        assert!(config.validate().is_err());

        let mut config = ProjectionConfig::default();
        config.taper_factor = dec!(1.2);
        assert!(config.validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_loading_above_start_never_decreases_ctl(
            start in 0u32..50,
            weekly in 400u32..900,
            weeks in 1u32..12,
        ) {
            let projector = LoadProjector::new();
            let schedule = vec![block(
                date(2024, 1, 1),
                date(2024, 1, 1) + Duration::days(i64::from(weeks) * 7 - 1),
                TrainingPhase::Build,
                Decimal::from(weekly),
                Decimal::from(weekly),
            )];

            let series = projector.project_load(Decimal::from(start), &schedule);
            let daily = Decimal::from(weekly) / dec!(7);
            for pair in series.windows(2) {
                prop_assert!(pair[1].ctl >= pair[0].ctl);
                prop_assert!(pair[1].ctl < daily);
            }
        }
    }
}
