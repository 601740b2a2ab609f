use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pump_therapy_tutor::cases::{find_case, CASES};
use pump_therapy_tutor::config::TutorConfig;
use pump_therapy_tutor::evaluator::evaluate_with;
use pump_therapy_tutor::explorer;
use pump_therapy_tutor::generator::generate_seeded;
use pump_therapy_tutor::invariants;
use pump_therapy_tutor::metrics::{summarize, time_below_band, time_in_range_band};
use pump_therapy_tutor::types::{Meal, MetricsSummary, TherapySettings, WeekIndex};

#[derive(Parser, Debug)]
#[command(author, version, about = "Insulin pump therapy tutor", long_about = None)]
struct Cli {
    /// JSON config file (trace_days, seed_base, log_filter)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the built-in patient cases
    Cases,
    /// Generate and summarize a week's trace under the case baseline
    Trace {
        #[arg(long)]
        case: String,
        #[arg(long, default_value_t = 0)]
        week: u8,
        /// Overrides trace_days from the config
        #[arg(long)]
        days: Option<usize>,
        /// Print the full trace as JSON
        #[arg(long)]
        json: bool,
    },
    /// Evaluate a settings change against the case baseline
    Evaluate {
        #[arg(long)]
        case: String,
        #[arg(long, default_value_t = 0)]
        week: u8,
        /// Multiply every basal rate (result rounded to 0.1 U/hr)
        #[arg(long)]
        basal_scale: Option<f64>,
        /// Set one hourly rate, e.g. --basal 5=1.4
        #[arg(long, value_name = "HOUR=RATE")]
        basal: Vec<String>,
        /// Set one I:C ratio, e.g. --ic breakfast=10
        #[arg(long, value_name = "MEAL=RATIO")]
        ic: Vec<String>,
        #[arg(long)]
        cf: Option<f64>,
        #[arg(long)]
        target: Option<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Random learner walks, checking invariants after every step
    Explore {
        #[arg(long, default_value_t = 20)]
        max_steps: usize,
        #[arg(long, default_value_t = 100)]
        max_samples: usize,
        /// Defaults to the current time
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = TutorConfig::load(cli.config.as_deref()).context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Cases => {
            for case in CASES {
                println!(
                    "{:<9} {:<17} {:<25} {}",
                    case.id,
                    case.name,
                    case.scenario.as_str(),
                    case.description
                );
            }
        }
        Command::Trace {
            case,
            week,
            days,
            json,
        } => {
            let case = find_case(&case)?;
            let week = WeekIndex::new(week)?;
            let days = days.unwrap_or(config.trace_days);
            let trace =
                generate_seeded(days, &case.baseline(), case.scenario, week, config.seed_base)?;
            invariants::check_trace(&trace)
                .map_err(|name| anyhow!("trace invariant '{}' violated", name))?;
            let metrics = summarize(&trace)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&trace)?);
            } else {
                println!(
                    "{} ({}) week {}",
                    case.name,
                    case.scenario.as_str(),
                    week.get() + 1
                );
                print_metrics(&metrics);
            }
        }
        Command::Evaluate {
            case,
            week,
            basal_scale,
            basal,
            ic,
            cf,
            target,
            json,
        } => {
            let case = find_case(&case)?;
            let week = WeekIndex::new(week)?;
            let original = case.baseline();
            let proposed = build_proposal(&original, basal_scale, &basal, &ic, cf, target)?;
            let result = evaluate_with(
                &original,
                &proposed,
                case.scenario,
                week,
                config.trace_days,
                config.seed_base,
            )?;
            info!(case = case.id, outcome = %result.verdict.outcome, "evaluation finished");
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Before (week {}):", week.get() + 1);
                print_metrics(&result.before_metrics);
                println!("After (week {}, predicted):", week.next().get() + 1);
                print_metrics(&result.after_metrics);
                println!("{}", result.verdict.feedback());
            }
        }
        Command::Explore {
            max_steps,
            max_samples,
            seed,
            verbose,
        } => {
            let seed = match seed {
                Some(s) => s,
                None => std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .context("system clock before epoch")?
                    .as_nanos() as u64,
            };
            println!(
                "Running {} walks of {} steps each (seed: {})",
                max_samples, max_steps, seed
            );
            println!("Checking invariants:");
            for (name, _) in invariants::ALL_INVARIANTS {
                println!("  - {}", name);
            }
            for (name, _) in invariants::TRACE_INVARIANTS {
                println!("  - {}", name);
            }
            let result = explorer::run_exploration(max_steps, max_samples, seed, &config, verbose);
            println!("{}", result);
            if result.violation.is_some() {
                bail!("invariant violation found");
            }
        }
    }
    Ok(())
}

fn print_metrics(metrics: &MetricsSummary) {
    println!("{}", metrics);
    println!(
        "  bands:           in range {:?}, below 70 {:?}",
        time_in_range_band(metrics.time_in_range),
        time_below_band(metrics.time_below_70)
    );
}

fn parse_pair<'a>(raw: &'a str, what: &str) -> Result<(&'a str, f64)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected {}=VALUE, got '{}'", what, raw))?;
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a number", value))?;
    Ok((key.trim(), value))
}

fn build_proposal(
    original: &TherapySettings,
    basal_scale: Option<f64>,
    basal: &[String],
    ic: &[String],
    cf: Option<f64>,
    target: Option<f64>,
) -> Result<TherapySettings> {
    let mut proposed = original.clone();
    if let Some(scale) = basal_scale {
        for rate in proposed.basal_profile.iter_mut() {
            *rate = (*rate * scale * 10.0).round() / 10.0;
        }
    }
    for raw in basal {
        let (hour, rate) = parse_pair(raw, "HOUR")?;
        let hour: usize = hour.parse().with_context(|| format!("'{}' is not an hour", hour))?;
        let slot = proposed
            .basal_profile
            .get_mut(hour)
            .ok_or_else(|| anyhow!("hour {} is outside 0-23", hour))?;
        *slot = rate;
    }
    for raw in ic {
        let (meal, ratio) = parse_pair(raw, "MEAL")?;
        let meal: Meal = meal.parse()?;
        proposed.ic_ratios.insert(meal, ratio);
    }
    if let Some(cf) = cf {
        proposed.correction_factor = cf;
    }
    if let Some(target) = target {
        proposed.target_glucose = target;
    }
    Ok(proposed)
}
