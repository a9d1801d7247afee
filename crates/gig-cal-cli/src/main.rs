//! gigcal: expand a calendar feed into a JSON list of occurrences.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use gig_cal::{expand_with_report, EventCollection, ExpandOptions};
use tracing_subscriber::EnvFilter;

/// Expand recurring events and overrides in a calendar feed
#[derive(Parser, Debug)]
#[command(name = "gigcal")]
#[command(version, about, long_about = None)]
struct Args {
    /// Calendar feed JSON (an object with an `items` array); `-` or omitted reads stdin
    input: Option<PathBuf>,

    /// Options JSON file (camelCase keys); flags below override it
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Window start (RFC 3339); defaults to now
    #[arg(long)]
    min_time: Option<DateTime<Utc>>,

    /// Window end (RFC 3339); defaults to window start + 30 days
    #[arg(long)]
    max_time: Option<DateTime<Utc>>,

    /// Maximum number of occurrences to print
    #[arg(long)]
    max_items: Option<usize>,

    /// Do not extract URLs from descriptions
    #[arg(long)]
    no_urls: bool,

    /// Do not extract image links from descriptions
    #[arg(long)]
    no_images: bool,

    /// IANA zone used as the viewer's local zone
    #[arg(long, value_name = "ZONE")]
    viewer_zone: Option<String>,

    /// Render display strings in the viewer zone instead of each event's zone
    #[arg(long)]
    viewer_display: bool,

    /// Sort latest first
    #[arg(long)]
    latest_first: bool,

    /// Abort on the first malformed event instead of skipping it
    #[arg(long)]
    fail_fast: bool,

    /// Reference "now" (RFC 3339), for reproducible output
    #[arg(long, hide = true)]
    now: Option<DateTime<Utc>>,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let feed = read_feed(args.input.as_deref())?;
    let options = build_options(&args)?;
    let now = args.now.unwrap_or_else(Utc::now);

    let expansion = expand_with_report(&feed, &options, now).context("expansion failed")?;
    if !expansion.rejected.is_empty() {
        tracing::warn!(count = expansion.rejected.len(), "Some events were skipped");
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&expansion.occurrences)?
    } else {
        serde_json::to_string(&expansion.occurrences)?
    };
    println!("{json}");
    Ok(())
}

fn read_feed(input: Option<&Path>) -> Result<EventCollection> {
    let text = match input {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("input is not a calendar feed")
}

fn build_options(args: &Args) -> Result<ExpandOptions> {
    let mut options: ExpandOptions = match &args.options {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid options in {}", path.display()))?
        }
        None => ExpandOptions::default(),
    };

    if let Some(min) = args.min_time {
        options = options.with_min_time(min);
    }
    if let Some(max) = args.max_time {
        options = options.with_max_time(max);
    }
    if let Some(zone) = &args.viewer_zone {
        options = options.with_viewer_time_zone(zone.clone());
    }
    if args.max_items.is_some() {
        options.max_items = args.max_items;
    }
    if args.no_urls {
        options.extract_urls = Some(false);
    }
    if args.no_images {
        options.extract_images = Some(false);
    }
    if args.viewer_display {
        options.time_zone_by_event = Some(false);
    }
    if args.latest_first {
        options.sort_earliest = Some(false);
    }
    if args.fail_fast {
        options.fail_fast = Some(true);
    }
    Ok(options)
}
