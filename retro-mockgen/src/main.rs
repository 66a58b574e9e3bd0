use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use retro_core::{
    alert_pipeline, summary_stats, RandomSelfResolution, ResolutionWindow, SelfResolutionPolicy,
};
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use retro_mockgen::{
    generate_alerts, generate_daily_summary, generate_tag_retrospective, AlertOptions,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate mock alerts and daily summaries", long_about = None)]
struct Args {
    /// Seed for reproducible output
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate alerts, enrich and group them into summaries
    Summaries {
        #[arg(short = 'n', long, default_value_t = 50)]
        count: usize,
        #[arg(long, default_value_t = 3)]
        noisy_threshold: usize,
        #[arg(long, default_value_t = 10)]
        max_per_summary: usize,
        /// Use a resolution window (minutes) instead of the random policy
        #[arg(long)]
        window_minutes: Option<u64>,
        /// Print only the raw alerts
        #[arg(long)]
        raw: bool,
    },
    /// Generate mock daily-summary days ending at `date`
    Daily {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        days: u32,
        #[arg(long, default_value_t = 5)]
        items: usize,
        /// Also build a retrospective over these comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let output = match args.command {
        Commands::Summaries {
            count,
            noisy_threshold,
            max_per_summary,
            window_minutes,
            raw,
        } => {
            let options = AlertOptions {
                with_resolution: window_minutes.is_some(),
            };
            let alerts = generate_alerts(&mut rng, count, Utc::now(), options);
            if raw {
                serde_json::to_value(&alerts)?
            } else {
                let mut policy: Box<dyn SelfResolutionPolicy> = match window_minutes {
                    Some(m) => Box::new(ResolutionWindow::minutes(m)),
                    None => Box::new(RandomSelfResolution::seeded(
                        args.seed.unwrap_or_else(rand::random),
                        retro_core::resolution::DEFAULT_SELF_RESOLVED_PROBABILITY,
                    )?),
                };
                tracing::info!(count, policy = policy.name(), "Grouping generated alerts");
                let summaries =
                    alert_pipeline(alerts, noisy_threshold, max_per_summary, policy.as_mut())
                        .context("Failed to group generated alerts")?;
                let stats = summary_stats(&summaries);
                json!({ "summaries": summaries, "stats": stats })
            }
        }
        Commands::Daily {
            date,
            days,
            items,
            tags,
        } => {
            let end = date.unwrap_or_else(|| Utc::now().date_naive());
            let start = end - Duration::days(i64::from(days.saturating_sub(1)));
            let generated: Vec<_> = start
                .iter_days()
                .take_while(|d| *d <= end)
                .map(|d| generate_daily_summary(&mut rng, d, items))
                .collect();
            if tags.is_empty() {
                serde_json::to_value(&generated)?
            } else {
                let retro = generate_tag_retrospective(&mut rng, &generated, &tags, start, end);
                json!({ "days": generated, "retrospective": retro })
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
