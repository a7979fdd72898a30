use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pricecast_core::config::{Settings, Variant};
use pricecast_core::domain::report::Report;
use pricecast_core::orchestrator::Orchestrator;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    Simple,
    Enhanced,
}

impl From<VariantArg> for Variant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::Simple => Variant::Simple,
            VariantArg::Enhanced => Variant::Enhanced,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "pricecast_cli")]
struct Args {
    /// Ticker symbol, case-insensitive.
    symbol: String,

    /// Overrides PREDICTOR from the environment.
    #[arg(long, value_enum)]
    variant: Option<VariantArg>,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Write the chart SVG to this path.
    #[arg(long)]
    chart_out: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if let Some(v) = args.variant {
        settings = settings.with_variant(v.into());
    }

    let orchestrator = Orchestrator::from_settings(&settings)?;
    let report = match orchestrator.run(&args.symbol).await {
        Ok(report) => report,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(symbol = %args.symbol, error = %format!("{err:#}"), "lookup failed");
            return Err(err);
        }
    };

    if let Some(path) = &args.chart_out {
        match &report.chart_svg {
            Some(svg) => {
                std::fs::write(path, svg)
                    .with_context(|| format!("failed to write chart to {}", path.display()))?;
                tracing::info!(path = %path.display(), "wrote chart");
            }
            None => tracing::warn!(symbol = %report.symbol, "no chart produced; nothing written"),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }

    Ok(())
}

fn print_text(report: &Report) {
    println!("{}", report.symbol);
    if let Some(prediction) = &report.prediction {
        for line in prediction.lines() {
            println!("  {line}");
        }
    }
    if let Some(day) = report.next_trading_day {
        println!("  estimate for {day}");
    }
    if !report.headlines.is_empty() {
        println!();
        for h in &report.headlines {
            println!("  - {} <{}>", h.title, h.url);
        }
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
