use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::{fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wagedash::{
    config::{Config, DEFAULT_CONFIG_PATH},
    source::TableSource,
    Dashboard, FilterSelection, Tab,
};

/// Render the wage dashboard's chart specs (Vega-Lite JSON).
#[derive(Debug, Parser)]
#[command(name = "wagedash", version)]
struct Args {
    /// YAML config file [default: wagedash.yaml, optional]
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Sectors to show, comma separated [default: first three]
    #[arg(long, value_delimiter = ',')]
    sectors: Option<Vec<String>>,

    /// First year of the range [default: first year in the data]
    #[arg(long)]
    from: Option<i32>,

    /// Last year of the range [default: last year in the data]
    #[arg(long)]
    to: Option<i32>,

    /// Render a single tab instead of all three
    #[arg(long, value_enum)]
    tab: Option<Tab>,

    /// Print specs to stdout instead of writing `<output_dir>/<tab>.json`
    #[arg(long)]
    stdout: bool,

    /// Print the available sectors and years, then exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    // ─── 2) configuration ───────────────────────────────────────────
    let config = match &args.config {
        Some(path) => Config::load(path, true),
        None => Config::load(DEFAULT_CONFIG_PATH.as_ref(), false),
    }
    .context("loading configuration")?
    .with_env();

    // ─── 3) load every table; a failure here means no dashboard ─────
    let source = config.open_source().context("opening data source")?;
    info!(source = %source.describe(), "startup");
    let dashboard = Dashboard::load(&source, config.sector_order)
        .await
        .context("loading dashboard tables")?
        .with_caption(config.caption.clone());

    if args.list {
        let listing = serde_json::json!({
            "generated_at": Utc::now().to_rfc3339(),
            "source": source.describe(),
            "years": dashboard.index().years,
            "sectors": dashboard.index().sectors,
        });
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    // ─── 4) selection: defaults, then overrides, clamped to the data ─
    let mut selection = FilterSelection::defaults(dashboard.index());
    if let Some(sectors) = args.sectors {
        selection.sectors = sectors.into_iter().map(|s| s.trim().to_string()).collect();
    }
    if let Some(from) = args.from {
        selection.from = from;
    }
    if let Some(to) = args.to {
        selection.to = to;
    }
    let selection = selection.clamp_to(dashboard.index());
    info!(
        sectors = selection.sectors.len(),
        from = selection.from,
        to = selection.to,
        "selection"
    );

    // ─── 5) render ──────────────────────────────────────────────────
    let tabs = match args.tab {
        Some(tab) => vec![tab],
        None => Tab::ALL.to_vec(),
    };
    if !args.stdout {
        fs::create_dir_all(&config.output_dir)
            .with_context(|| format!("creating {}", config.output_dir.display()))?;
    }

    for tab in tabs {
        let spec = dashboard.render(tab, &selection);
        let json = serde_json::to_string_pretty(&spec)?;
        if args.stdout {
            println!("{}", json);
        } else {
            let path = config.output_dir.join(format!("{}.json", tab.as_str()));
            fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(
                tab = tab.as_str(),
                rows = spec.row_count(),
                path = %path.display(),
                "wrote chart"
            );
        }
    }

    info!("all done");
    Ok(())
}
