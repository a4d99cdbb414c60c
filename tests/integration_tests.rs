use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use traincore::{flatten, leaf_count};

/// Integration tests that exercise the complete calculator workflows

#[cfg(test)]
mod integration_tests {
    use super::*;
    use traincore::models::{
        AthleteSnapshot, IntensityTarget, PlanNode, Reading, Step, StepDuration, TargetMetric,
        TimeUnit, Units,
    };
    use traincore::{
        validate_blocks, CalculationConfig, FitnessProgression, LiveEvaluator, LoadProjector,
        StatsCalculator, TargetStatus, TrainingBlock, TrainingPhase, TssRange,
    };

    fn create_test_athlete() -> AthleteSnapshot {
        AthleteSnapshot {
            ftp: Some(200),
            threshold_hr: Some(165),
            max_hr: Some(190),
            preferred_units: Units::Metric,
        }
    }

    fn timed_step(name: &str, minutes: i64, pct_ftp: Decimal) -> PlanNode {
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

    /// Warmup, three surge/recover couplets, cooldown. 50 minutes total.
    fn create_interval_plan() -> Vec<PlanNode> {
        vec![
            timed_step("Warmup", 10, dec!(65)),
            PlanNode::Repetition {
                repeat: 3,
                nodes: vec![
                    timed_step("Surge", 5, dec!(110)),
                    timed_step("Recover", 5, dec!(50)),
                ],
            },
            timed_step("Cooldown", 10, dec!(55)),
        ]
    }

    /// Test the full flatten-then-aggregate workflow on an interval session
    #[test]
    fn test_complete_plan_analysis_workflow() {
        let plan = create_interval_plan();
        let athlete = create_test_athlete();

        plan.iter()
            .try_for_each(PlanNode::validate)
            .expect("plan should be structurally valid");

        let steps = flatten(&plan);
        assert_eq!(steps.len(), 8);
        assert_eq!(leaf_count(&plan), 8);

        let names: Vec<&str> = steps.iter().map(|s| s.step.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Warmup", "Surge", "Recover", "Surge", "Recover", "Surge", "Recover", "Cooldown"
            ]
        );

        let calculator = StatsCalculator::new();
        let stats = calculator.aggregate(&plan, &athlete);

        assert_eq!(stats.step_count, 8);
        assert_eq!(stats.total_duration_secs, dec!(3000));
        assert_eq!(stats.avg_intensity_pct, dec!(72));
        assert_eq!(stats.max_intensity_pct, dec!(110));
        assert_eq!(stats.interval_count, 3);
        assert_eq!(stats.estimated_tss.round_dp(2), dec!(43.20));
        assert_eq!(stats.estimated_calories.round_dp(1), dec!(172.8));

        // Zone time accounts for every second of the workout
        assert_eq!(stats.zones.z1, dec!(1500));
        assert_eq!(stats.zones.z2, dec!(600));
        assert_eq!(stats.zones.z5, dec!(900));
        assert_eq!(stats.zones.total(), stats.total_duration_secs);
    }

    /// Test that live guidance agrees with the resolved prescriptions
    #[test]
    fn test_live_guidance_matches_resolved_targets() {
        let plan = create_interval_plan();
        let athlete = create_test_athlete();
        let steps = flatten(&plan);

        // First surge: 110% of 200 W FTP is 220 W
        let surge = &steps[1];
        assert_eq!(surge.step.name, "Surge");
        assert_eq!(surge.iteration(), Some(0));

        let evaluator = LiveEvaluator::new();
        let on_target = evaluator.evaluate_flattened(
            surge,
            &Reading {
                power: Some(220),
                ..Reading::default()
            },
            &athlete,
        );
        assert_eq!(on_target.len(), 1);
        assert_eq!(on_target[0].display, "220 W");
        assert_eq!(on_target[0].status, TargetStatus::Within);

        let too_easy = evaluator.evaluate_flattened(
            surge,
            &Reading {
                power: Some(180),
                ..Reading::default()
            },
            &athlete,
        );
        assert_eq!(too_easy[0].status, TargetStatus::Below);

        let too_hard = evaluator.evaluate_flattened(
            surge,
            &Reading {
                power: Some(235),
                ..Reading::default()
            },
            &athlete,
        );
        assert_eq!(too_hard[0].status, TargetStatus::Above);
    }

    /// Test parsing a plan from its JSON wire format end to end
    #[test]
    fn test_plan_json_wire_format() {
        let json = r#"[
            {
                "type": "step",
                "name": "Warmup",
                "duration": {"type": "time", "value": 10, "unit": "minutes"},
                "targets": [{"metric": "percent_ftp", "value": 65}]
            },
            {
                "type": "repetition",
                "repeat": 2,
                "nodes": [
                    {
                        "type": "step",
                        "name": "Hill",
                        "duration": {"type": "distance", "value": 1, "unit": "km"},
                        "targets": [{"metric": "percent_ftp", "range": {"min": 90, "max": 100}}]
                    },
                    {
                        "type": "step",
                        "name": "Jog down",
                        "duration": {"type": "time", "value": 120, "unit": "seconds"}
                    }
                ]
            },
            {
                "type": "step",
                "name": "Stretch",
                "duration": {"type": "until_finished"}
            }
        ]"#;

        let plan: Vec<PlanNode> = serde_json::from_str(json).expect("wire format should parse");
        plan.iter()
            .try_for_each(PlanNode::validate)
            .expect("parsed plan should validate");

        let steps = flatten(&plan);
        assert_eq!(steps.len(), 6);
        assert_eq!(steps[3].step.name, "Hill");
        assert_eq!(steps[3].iteration(), Some(1));
        assert_eq!(steps[5].step.name, "Stretch");
        assert_eq!(steps[5].iteration(), None);
        assert!(steps[5].step.targets.is_empty());

        let stats = StatsCalculator::new().aggregate(&plan, &create_test_athlete());

        // 600 s warmup + 2 x (60 s hill + 120 s jog); open-ended stretch adds nothing
        assert_eq!(stats.total_duration_secs, dec!(960));
        // Ranged hill resolves to its 95% midpoint; jogs carry no target
        assert_eq!(stats.avg_intensity_pct, dec!(70));
        assert_eq!(stats.interval_count, 2);
        assert_eq!(stats.zones.z2, dec!(600));
        assert_eq!(stats.zones.z4, dec!(120));
        assert_eq!(stats.zones.z1, dec!(240));
        assert_eq!(stats.zones.total(), stats.total_duration_secs);
    }

    /// Test feeding workout TSS into a season-level load projection
    #[test]
    fn test_workout_stats_drive_season_projection() {
        let plan = create_interval_plan();
        let athlete = create_test_athlete();

        let stats = StatsCalculator::new().aggregate(&plan, &athlete);
        // Five sessions a week of this workout
        let weekly_tss = stats.estimated_tss.round_dp(1) * dec!(5);
        assert_eq!(weekly_tss, dec!(216.0));

        let blocks = vec![TrainingBlock {
            start_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 4, 28).unwrap(),
            phase: TrainingPhase::Base,
            weekly_tss: TssRange {
                min: dec!(180),
                max: weekly_tss,
            },
        }];
        validate_blocks(&blocks).expect("single block schedule should validate");

        let projector = LoadProjector::new();
        let points = projector.project(dec!(20), &blocks);

        assert_eq!(points.len(), 5);
        assert_eq!(points[0].ctl, dec!(20));
        for pair in points.windows(2) {
            assert!(pair[1].ctl > pair[0].ctl, "loading above CTL must build");
        }
        assert_eq!(points.last().unwrap().ctl, dec!(25));

        let reachable = projector.summarize(
            &FitnessProgression {
                starting_ctl: dec!(20),
                target_ctl_at_peak: dec!(25),
            },
            &blocks,
        );
        assert!(reachable.target_met);
        assert_eq!(reachable.weeks, 4);

        let ambitious = projector.summarize(
            &FitnessProgression {
                starting_ctl: dec!(20),
                target_ctl_at_peak: dec!(30),
            },
            &blocks,
        );
        assert!(!ambitious.target_met);
        assert_eq!(ambitious.peak_ctl, ambitious.final_ctl);
    }

    /// Test that calculator constants steer the aggregate verdicts
    #[test]
    fn test_custom_constants_change_the_verdict() {
        let config = CalculationConfig {
            interval_threshold_pct: dec!(110),
            seconds_per_km: dec!(90),
            ..CalculationConfig::default()
        };
        let athlete = create_test_athlete();

        // 110% no longer clears a strict 110% bar
        let stats = StatsCalculator::with_config(config.clone())
            .aggregate(&create_interval_plan(), &athlete);
        assert_eq!(stats.interval_count, 0);

        let distance_plan = vec![PlanNode::Step(Step {
            name: "Tempo run".to_string(),
            description: None,
            duration: StepDuration::Distance {
                value: dec!(2),
                unit: traincore::models::DistanceUnit::Kilometers,
            },
            targets: vec![IntensityTarget::value(TargetMetric::PercentFtp, dec!(80))],
        })];
        let stats = StatsCalculator::with_config(config).aggregate(&distance_plan, &athlete);
        assert_eq!(stats.total_duration_secs, dec!(180));
    }

    /// Test that malformed steps are reported but never halt analysis
    #[test]
    fn test_invalid_plan_is_reported_but_still_analyzable() {
        let plan = vec![timed_step("Backwards", -5, dec!(60))];

        assert!(plan.iter().try_for_each(PlanNode::validate).is_err());

        // Flattening is total and aggregation clamps the nonsense away
        let steps = flatten(&plan);
        assert_eq!(steps.len(), 1);

        let stats = StatsCalculator::new().aggregate(&plan, &create_test_athlete());
        assert_eq!(stats.total_duration_secs, dec!(0));
        assert_eq!(stats.zones.total(), dec!(0));
        assert_eq!(stats.estimated_tss, dec!(0));
    }
}
