use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{debug, info};

use traincore::targets::describe;
use traincore::{
    estimated_max_hr_from_age, flatten, init_logging, validate_blocks, AppConfig, AthleteSnapshot,
    CoreError, DurationResolver, ErrorSeverity, FitnessProgression, LiveEvaluator, LoadProjector,
    LogFormat, LogLevel, PlanNode, Reading, StatsCalculator, TargetStatus, TrainingBlock,
    WorkoutStats,
};

#[derive(Parser)]
#[command(name = "traincore")]
#[command(version = "0.1.0")]
#[command(about = "Structured workout analysis and training load projection", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Override the configured log format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a structured plan into its flat step sequence
    Flatten {
        /// Path to the plan JSON file
        #[arg(short, long, value_name = "FILE")]
        plan: PathBuf,

        /// Emit the flattened steps as JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate duration, intensity, TSS and zone time for a plan
    Stats {
        /// Path to the plan JSON file
        #[arg(short, long, value_name = "FILE")]
        plan: PathBuf,

        #[command(flatten)]
        athlete: AthleteArgs,

        /// Emit the statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Project chronic training load across a block schedule
    Project {
        /// Path to the training block JSON file
        #[arg(short, long, value_name = "FILE")]
        blocks: PathBuf,

        /// Chronic training load on the day the schedule starts
        #[arg(short, long, default_value = "0")]
        starting_ctl: Decimal,

        /// CTL the schedule should reach at its peak
        #[arg(short, long)]
        target_ctl: Option<Decimal>,

        /// Show CTL, ATL and TSB per week instead of the CTL curve
        #[arg(long)]
        full: bool,

        /// Emit the projection as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate sensor readings against one step of a plan
    Live {
        /// Path to the plan JSON file
        #[arg(short, long, value_name = "FILE")]
        plan: PathBuf,

        /// Index into the flattened step sequence, as shown by flatten
        #[arg(short = 'i', long, default_value = "0")]
        step: usize,

        /// Current power reading in watts
        #[arg(long)]
        power: Option<u16>,

        /// Current heart rate reading in bpm
        #[arg(long)]
        heart_rate: Option<u16>,

        /// Current cadence reading in rpm
        #[arg(long)]
        cadence: Option<u16>,

        #[command(flatten)]
        athlete: AthleteArgs,
    },

    /// Inspect or initialize the configuration file
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,

        /// Print the config file path and exit
        #[arg(long)]
        path: bool,
    },
}

/// Athlete threshold overrides applied on top of the config file
#[derive(Args)]
struct AthleteArgs {
    /// Functional threshold power in watts
    #[arg(long, value_name = "WATTS")]
    ftp: Option<u16>,

    /// Threshold heart rate in bpm
    #[arg(long, value_name = "BPM")]
    threshold_hr: Option<u16>,

    /// Maximum heart rate in bpm
    #[arg(long, value_name = "BPM")]
    max_hr: Option<u16>,

    /// Age in years, used to estimate max HR when none is known
    #[arg(long)]
    age: Option<u8>,
}

impl AthleteArgs {
    fn apply(&self, mut athlete: AthleteSnapshot) -> AthleteSnapshot {
        if self.ftp.is_some() {
            athlete.ftp = self.ftp;
        }
        if self.threshold_hr.is_some() {
            athlete.threshold_hr = self.threshold_hr;
        }
        if self.max_hr.is_some() {
            athlete.max_hr = self.max_hr;
        }
        if athlete.max_hr.is_none() {
            if let Some(age) = self.age {
                athlete.max_hr = estimated_max_hr_from_age(age);
            }
        }
        athlete
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        report_error(&err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_override = cli.config.clone();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };
    config.validate().map_err(CoreError::from)?;

    // -v flags win over the configured level
    if cli.verbose > 0 {
        config.log.level = match cli.verbose {
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        };
    }
    if let Some(format) = cli.log_format {
        config.log.format = format;
    }
    init_logging(&config.log)?;
    debug!(config_file = ?config_override, "configuration loaded");

    match cli.command {
        Commands::Flatten { plan, json } => cmd_flatten(&config, &plan, json),
        Commands::Stats {
            plan,
            athlete,
            json,
        } => cmd_stats(&config, &plan, &athlete, json),
        Commands::Project {
            blocks,
            starting_ctl,
            target_ctl,
            full,
            json,
        } => cmd_project(&config, &blocks, starting_ctl, target_ctl, full, json),
        Commands::Live {
            plan,
            step,
            power,
            heart_rate,
            cadence,
            athlete,
        } => cmd_live(&config, &plan, step, power, heart_rate, cadence, &athlete),
        Commands::Config { init, path } => cmd_config(&config, config_override, init, path),
    }
}

fn report_error(err: &anyhow::Error) {
    match err.chain().find_map(|cause| cause.downcast_ref::<CoreError>()) {
        Some(core) => {
            let header = match core.severity() {
                ErrorSeverity::Warning => "Warning:".yellow().bold(),
                ErrorSeverity::Critical => "Fatal:".red().bold(),
                _ => "Error:".red().bold(),
            };
            eprintln!("{} {}", header, core.user_message());
        }
        None => eprintln!("{} {:#}", "Error:".red().bold(), err),
    }
}

/// Plans are a JSON array of nodes, each either a step or a repetition
fn read_plan(path: &Path) -> Result<Vec<PlanNode>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan file: {}", path.display()))?;
    let nodes: Vec<PlanNode> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse plan file: {}", path.display()))?;
    Ok(nodes)
}

fn read_blocks(path: &Path) -> Result<Vec<TrainingBlock>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read block schedule: {}", path.display()))?;
    let blocks: Vec<TrainingBlock> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse block schedule: {}", path.display()))?;
    Ok(blocks)
}

/// Structural problems are advisory: report them and keep going
fn warn_on_invalid(nodes: &[PlanNode]) {
    if let Err(err) = nodes.iter().try_for_each(PlanNode::validate) {
        let warning = CoreError::from(err);
        eprintln!("{}", format!("Warning: {}", warning.user_message()).yellow());
    }
}

fn format_duration(seconds: Decimal) -> String {
    let total = seconds.round().to_u64().unwrap_or(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    index: u32,
    #[tabled(rename = "Step")]
    name: String,
    #[tabled(rename = "Rep")]
    iteration: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Est. time")]
    estimated: String,
    #[tabled(rename = "Targets")]
    targets: String,
}

fn cmd_flatten(config: &AppConfig, plan: &Path, json: bool) -> Result<()> {
    let nodes = read_plan(plan)?;
    warn_on_invalid(&nodes);

    let steps = flatten(&nodes);
    info!(steps = steps.len(), "plan flattened");

    if json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }

    println!("{}", "Flattened workout plan".green().bold());
    let durations = DurationResolver::with_config(config.calculation.clone());
    let rows: Vec<StepRow> = steps
        .iter()
        .map(|step| StepRow {
            index: step.index,
            name: step.step.name.clone(),
            iteration: step
                .iteration()
                .map(|i| (i + 1).to_string())
                .unwrap_or_else(|| "-".to_string()),
            duration: step.step.duration.to_string(),
            estimated: format_duration(durations.resolve_for_display(&step.step.duration)),
            targets: step
                .step
                .targets
                .iter()
                .map(describe)
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    println!("{}", table);
    println!("{}", format!("✓ {} steps", steps.len()).green());
    Ok(())
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Zone")]
    zone: &'static str,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Share")]
    share: String,
}

fn zone_rows(stats: &WorkoutStats) -> Vec<ZoneRow> {
    let total = stats.zones.total();
    let share = |secs: Decimal| -> String {
        if total.is_zero() {
            "-".to_string()
        } else {
            format!("{}%", (secs / total * Decimal::ONE_HUNDRED).round_dp(1))
        }
    };
    vec![
        ZoneRow {
            zone: "Z1 Recovery",
            time: format_duration(stats.zones.z1),
            share: share(stats.zones.z1),
        },
        ZoneRow {
            zone: "Z2 Endurance",
            time: format_duration(stats.zones.z2),
            share: share(stats.zones.z2),
        },
        ZoneRow {
            zone: "Z3 Tempo",
            time: format_duration(stats.zones.z3),
            share: share(stats.zones.z3),
        },
        ZoneRow {
            zone: "Z4 Threshold",
            time: format_duration(stats.zones.z4),
            share: share(stats.zones.z4),
        },
        ZoneRow {
            zone: "Z5 VO2max",
            time: format_duration(stats.zones.z5),
            share: share(stats.zones.z5),
        },
    ]
}

fn cmd_stats(config: &AppConfig, plan: &Path, athlete_args: &AthleteArgs, json: bool) -> Result<()> {
    let nodes = read_plan(plan)?;
    warn_on_invalid(&nodes);

    let athlete = athlete_args.apply(config.athlete.clone());
    let calculator = StatsCalculator::with_config(config.calculation.clone());
    let stats = calculator.aggregate(&nodes, &athlete);
    info!(
        steps = stats.step_count,
        tss = %stats.estimated_tss,
        "workout statistics estimated"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "Workout statistics".blue().bold());
    println!("  Steps:            {}", stats.step_count);
    println!(
        "  Duration:         {}",
        format_duration(stats.total_duration_secs)
    );
    println!(
        "  Avg intensity:    {}% FTP",
        stats.avg_intensity_pct.round_dp(1)
    );
    println!(
        "  Max intensity:    {}% FTP",
        stats.max_intensity_pct.round_dp(1)
    );
    println!(
        "  Intensity factor: {}",
        stats.intensity_factor().round_dp(2)
    );
    println!("  Intervals:        {}", stats.interval_count);
    println!("  Estimated TSS:    {}", stats.estimated_tss.round_dp(1));
    println!(
        "  Est. calories:    {}",
        stats.estimated_calories.round_dp(0)
    );
    println!();

    let mut table = Table::new(zone_rows(&stats));
    table.with(Style::rounded());
    println!("{}", table);

    if !athlete.has_power_threshold() {
        println!(
            "{}",
            "No FTP on file; watt targets scale by the configured reference FTP".dimmed()
        );
    }
    println!("{}", "✓ Estimation complete".blue());
    Ok(())
}

#[derive(Tabled)]
struct CtlRow {
    #[tabled(rename = "Week")]
    week: usize,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "CTL")]
    ctl: String,
}

#[derive(Tabled)]
struct LoadRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "CTL")]
    ctl: String,
    #[tabled(rename = "ATL")]
    atl: String,
    #[tabled(rename = "TSB")]
    tsb: String,
}

fn cmd_project(
    config: &AppConfig,
    blocks_path: &Path,
    starting_ctl: Decimal,
    target_ctl: Option<Decimal>,
    full: bool,
    json: bool,
) -> Result<()> {
    let blocks = read_blocks(blocks_path)?;
    if let Err(err) = validate_blocks(&blocks) {
        let warning = CoreError::from(err);
        eprintln!("{}", format!("Warning: {}", warning.user_message()).yellow());
    }

    let projector = LoadProjector::with_config(config.projection.clone());
    info!(blocks = blocks.len(), %starting_ctl, "projection started");

    let summary = target_ctl.map(|target| {
        projector.summarize(
            &FitnessProgression {
                starting_ctl,
                target_ctl_at_peak: target,
            },
            &blocks,
        )
    });

    if json {
        let series = if full {
            serde_json::to_value(projector.project_load(starting_ctl, &blocks))?
        } else {
            serde_json::to_value(projector.project(starting_ctl, &blocks))?
        };
        let output = match &summary {
            Some(summary) => serde_json::json!({ "series": series, "summary": summary }),
            None => series,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if full {
        let series = projector.project_load(starting_ctl, &blocks);
        println!("{}", "Projected training load".cyan().bold());
        let rows: Vec<LoadRow> = series
            .iter()
            .map(|sample| LoadRow {
                date: sample.date.to_string(),
                ctl: sample.ctl.round_dp(1).to_string(),
                atl: sample.atl.round_dp(1).to_string(),
                tsb: sample.tsb.round_dp(1).to_string(),
            })
            .collect();
        let mut table = Table::new(&rows);
        table.with(Style::rounded());
        println!("{}", table);
    } else {
        let points = projector.project(starting_ctl, &blocks);
        println!("{}", "Projected CTL curve".cyan().bold());
        let rows: Vec<CtlRow> = points
            .iter()
            .enumerate()
            .map(|(week, point)| CtlRow {
                week,
                date: point.date.to_string(),
                ctl: point.ctl.to_string(),
            })
            .collect();
        let mut table = Table::new(&rows);
        table.with(Style::rounded());
        println!("{}", table);
    }

    match summary {
        Some(summary) => {
            println!();
            println!("  Starting CTL: {}", summary.starting_ctl.round_dp(1));
            println!("  Peak CTL:     {}", summary.peak_ctl.round_dp(1));
            println!("  Final CTL:    {}", summary.final_ctl.round_dp(1));
            println!("  Weeks:        {}", summary.weeks);
            if summary.target_met {
                println!(
                    "{}",
                    format!("✓ Target CTL {} reached at peak", summary.target_ctl_at_peak).green()
                );
            } else {
                let shortfall = (summary.target_ctl_at_peak - summary.peak_ctl).round_dp(1);
                println!(
                    "{}",
                    format!(
                        "✗ Target CTL {} missed by {}",
                        summary.target_ctl_at_peak, shortfall
                    )
                    .red()
                );
            }
        }
        None => println!("{}", "✓ Projection complete".cyan()),
    }
    Ok(())
}

fn cmd_live(
    config: &AppConfig,
    plan: &Path,
    step_index: usize,
    power: Option<u16>,
    heart_rate: Option<u16>,
    cadence: Option<u16>,
    athlete_args: &AthleteArgs,
) -> Result<()> {
    let nodes = read_plan(plan)?;
    warn_on_invalid(&nodes);

    let steps = flatten(&nodes);
    let Some(step) = steps.get(step_index) else {
        bail!(
            "Step index {} is out of range; the plan flattens to {} steps",
            step_index,
            steps.len()
        );
    };

    let athlete = athlete_args.apply(config.athlete.clone());
    let reading = Reading {
        power,
        heart_rate,
        cadence,
        speed: None,
    };

    let evaluator = LiveEvaluator::with_config(config.calculation.clone());
    let guidance = evaluator.evaluate_flattened(step, &reading, &athlete);
    debug!(targets = guidance.len(), "live evaluation complete");

    let repetition = step
        .iteration()
        .map(|i| format!(" (rep {})", i + 1))
        .unwrap_or_default();
    println!(
        "{}",
        format!("Step [{}] {}{}", step.index, step.step.name, repetition)
            .magenta()
            .bold()
    );
    if let Some(description) = &step.step.description {
        println!("  {}", description.dimmed());
    }

    if guidance.is_empty() {
        println!("  No targets prescribed for this step");
        return Ok(());
    }

    for item in &guidance {
        let status = match item.status {
            TargetStatus::Within => "within".green(),
            TargetStatus::Below => "below".yellow(),
            TargetStatus::Above => "above".red(),
        };
        let current = item
            .current
            .map(|value| value.normalize().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<14} target {:<16} current {:<8} [{}]",
            item.metric.to_string(),
            item.display,
            current,
            status
        );
    }
    if guidance.iter().any(|item| item.resolved.is_none()) {
        println!(
            "  {}",
            "Targets without a matching athlete threshold are shown relative".dimmed()
        );
    }
    Ok(())
}

fn cmd_config(
    config: &AppConfig,
    config_override: Option<PathBuf>,
    init: bool,
    path: bool,
) -> Result<()> {
    let config_path = config_override.unwrap_or_else(AppConfig::default_config_path);

    if path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            bail!("Config file already exists: {}", config_path.display());
        }
        AppConfig::default().save_to_file(&config_path)?;
        println!(
            "{}",
            format!("✓ Wrote default config to {}", config_path.display()).green()
        );
        return Ok(());
    }

    println!("{}", "Active configuration".white().bold());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
