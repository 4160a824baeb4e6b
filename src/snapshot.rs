use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use url::Url;

use crate::cli::{ReplayArgs, SnapshotArgs};
use crate::config::{DEFAULT_HOMEPAGE_URL, RunSettings};
use crate::driver::PageDriver;
use crate::extract::{ExtractionPlan, Timeouts};
use crate::formats::Reading;
use crate::reading::{RunMetadata, alert, build_reading};
use crate::snapshot_driver::SnapshotFetcher;

pub async fn run(args: SnapshotArgs) -> anyhow::Result<Reading> {
    let started_at = Utc::now();
    let settings = RunSettings::from_args(&args.event).context("resolve configuration")?;

    let homepage = if args.no_homepage {
        None
    } else {
        Some(Url::parse(&args.homepage_url).context("parse --homepage-url")?)
    };
    let timeouts = Timeouts {
        navigation: Duration::from_millis(args.navigation_timeout_ms),
        settle: Duration::from_millis(args.settle_timeout_ms),
        click: Duration::from_millis(args.click_timeout_ms),
        ..Timeouts::default()
    };
    let plan = ExtractionPlan::new(homepage, settings.target.event_url.clone())
        .with_capacity(settings.capacity)
        .with_timeouts(timeouts);

    let driver = crate::http_driver::http_driver(timeouts.navigation)?;
    record(driver, &plan, &settings, started_at).await
}

pub async fn replay(args: ReplayArgs) -> anyhow::Result<Reading> {
    let started_at = Utc::now();
    let settings = RunSettings::from_args(&args.event).context("resolve configuration")?;

    let mut fetcher = SnapshotFetcher::new().with_file(
        &settings.target.event_url,
        Path::new(&args.event_html),
    )?;
    let homepage = match args.homepage_html.as_deref() {
        Some(path) => {
            let url = Url::parse(DEFAULT_HOMEPAGE_URL).context("parse homepage url")?;
            fetcher = fetcher.with_file(&url, Path::new(path))?;
            Some(url)
        }
        None => None,
    };
    let plan = ExtractionPlan::new(homepage, settings.target.event_url.clone())
        .with_capacity(settings.capacity);

    record(fetcher.into_driver(), &plan, &settings, started_at).await
}

/// Runs one extraction, tears the driver down, then persists and reports the
/// reading.
pub async fn record<D: PageDriver>(
    mut driver: D,
    plan: &ExtractionPlan,
    settings: &RunSettings,
    started_at: DateTime<Utc>,
) -> anyhow::Result<Reading> {
    tracing::info!(
        event_id = ?settings.target.event_id,
        event_url = %settings.target.event_url,
        homepage = ?plan.homepage.as_ref().map(Url::as_str),
        "snapshot: extract"
    );
    let outcome = crate::extract::extract(&mut driver, plan).await;
    if let Err(err) = driver.close().await {
        tracing::warn!(?err, "driver teardown failed");
    }

    let meta = RunMetadata {
        started_at,
        event_id: settings.target.event_id,
        event_url: settings.target.event_url.clone(),
    };
    let reading = build_reading(&meta, &outcome)?;

    crate::snapshot_log::append(&settings.output, &reading).context("append snapshot log")?;
    tracing::info!(
        success = reading.success,
        sold_tickets = ?reading.sold_tickets,
        total_available = ?reading.total_available,
        output = %settings.output.display(),
        "snapshot: recorded"
    );

    let summary = serde_json::to_string(&reading).context("serialize reading summary")?;
    println!("{summary}");

    if let Some(triggered) = alert(settings.alert_threshold, reading.total_available) {
        tracing::warn!(
            threshold = triggered.threshold,
            observed = triggered.observed,
            "availability at or below threshold"
        );
        println!("{triggered}");
    }

    Ok(reading)
}
