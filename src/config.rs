use std::path::PathBuf;

use anyhow::Context as _;
use url::Url;

use crate::cli::EventArgs;

pub const DEFAULT_HOMEPAGE_URL: &str = "https://bilety.wislakrakow.com/";
pub const EVENT_PAGE_BASE: &str = "https://bilety.wislakrakow.com/Stadium/Index";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTarget {
    pub event_id: Option<u64>,
    pub event_url: Url,
}

/// Settings shared by every way of running one reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub target: EventTarget,
    pub output: PathBuf,
    pub alert_threshold: u64,
    pub capacity: Option<u64>,
}

impl RunSettings {
    pub fn from_args(args: &EventArgs) -> anyhow::Result<Self> {
        let target = resolve_event(args.event_id, args.event_url.as_deref())?;
        Ok(Self {
            target,
            output: PathBuf::from(&args.output),
            alert_threshold: args.alert_threshold,
            capacity: args.capacity.filter(|capacity| *capacity > 0),
        })
    }
}

/// An explicit URL wins over one derived from the id. Id `0` and empty
/// strings count as unset.
pub fn resolve_event(event_id: Option<u64>, event_url: Option<&str>) -> anyhow::Result<EventTarget> {
    let event_id = event_id.filter(|id| *id > 0);
    let event_url = event_url.map(str::trim).filter(|url| !url.is_empty());

    let event_url = match (event_id, event_url) {
        (_, Some(raw)) => {
            let url = Url::parse(raw).with_context(|| format!("parse event url: {raw}"))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                anyhow::bail!("event url must be http/https: {url}");
            }
            url
        }
        (Some(id), None) => event_url_for(id)?,
        (None, None) => anyhow::bail!(
            "no event configured: pass --event-id or --event-url (or set EVENT_ID / EVENT_URL)"
        ),
    };

    Ok(EventTarget {
        event_id,
        event_url,
    })
}

pub fn event_url_for(event_id: u64) -> anyhow::Result<Url> {
    Url::parse_with_params(EVENT_PAGE_BASE, &[("eventId", event_id.to_string())])
        .context("build event url")
}
