use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Visit the live ticketing site and record one reading.
    Snapshot(SnapshotArgs),
    /// Record one reading from saved HTML pages.
    Replay(ReplayArgs),
}

#[derive(Debug, Args)]
pub struct EventArgs {
    /// Event identifier on the ticketing site (0 means unset).
    #[arg(long, env = "EVENT_ID")]
    pub event_id: Option<u64>,

    /// Event page URL (default: derived from --event-id).
    #[arg(long, env = "EVENT_URL")]
    pub event_url: Option<String>,

    /// CSV log the reading is appended to.
    #[arg(long, env = "OUTPUT_CSV", default_value = "ticket_snapshots.csv")]
    pub output: String,

    /// Alert when total available is at or below this value (0 disables).
    #[arg(long, env = "ALERT_THRESHOLD", default_value_t = 0)]
    pub alert_threshold: u64,

    /// Venue capacity, used to derive availability from the sold count.
    #[arg(long, env = "VENUE_CAPACITY")]
    pub capacity: Option<u64>,
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub event: EventArgs,

    /// Venue landing page searched first for the sold count.
    #[arg(long, env = "HOMEPAGE_URL", default_value = crate::config::DEFAULT_HOMEPAGE_URL)]
    pub homepage_url: String,

    /// Skip the landing page and go straight to the event page.
    #[arg(long)]
    pub no_homepage: bool,

    #[arg(long, default_value_t = 5000)]
    pub navigation_timeout_ms: u64,

    #[arg(long, default_value_t = 3000)]
    pub settle_timeout_ms: u64,

    /// Per-label bound when dismissing a consent prompt.
    #[arg(long, default_value_t = 1500)]
    pub click_timeout_ms: u64,
}

#[derive(Debug, Args)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub event: EventArgs,

    /// Saved event page HTML.
    #[arg(long)]
    pub event_html: String,

    /// Saved landing page HTML (searched first for the sold count).
    #[arg(long)]
    pub homepage_html: Option<String>,
}
