use std::future::Future;
use std::time::Duration;

use url::Url;

use crate::driver::{ElementId, PageDriver};
use crate::formats::SectorReading;
use crate::patterns;
use crate::sectors::{self, ElementDescriptor, SECTOR_SELECTOR};

pub const CONSENT_LABELS: [&str; 4] = ["Tylko niezbędne dane", "Zgadzam się", "Akceptuj", "Accept"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub navigation: Duration,
    pub settle: Duration,
    pub click: Duration,
    /// Bound for locate and per-element reads.
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(5),
            settle: Duration::from_secs(3),
            click: Duration::from_millis(1500),
            read: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    Homepage,
    EventPage,
}

impl PageSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Homepage => "homepage",
            Self::EventPage => "event page",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionPlan {
    /// Venue landing page searched first for the sold count.
    pub homepage: Option<Url>,
    pub event_page: Url,
    pub capacity: Option<u64>,
    pub consent_labels: Vec<String>,
    pub timeouts: Timeouts,
}

impl ExtractionPlan {
    pub fn new(homepage: Option<Url>, event_page: Url) -> Self {
        Self {
            homepage,
            event_page,
            capacity: None,
            consent_labels: CONSENT_LABELS.iter().map(|s| (*s).to_owned()).collect(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_capacity(mut self, capacity: Option<u64>) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    fn sources(&self) -> impl Iterator<Item = (PageSource, &Url)> {
        let homepage = self.homepage.as_ref().map(|url| (PageSource::Homepage, url));
        homepage
            .into_iter()
            .chain(std::iter::once((PageSource::EventPage, &self.event_page)))
    }
}

/// Run-local diagnostic log, in the order things happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notes(Vec<String>);

impl Notes {
    pub fn push(&mut self, note: impl Into<String>) {
        let note = note.into();
        tracing::debug!(note = %note, "extraction note");
        self.0.push(note);
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub sold_tickets: Option<u64>,
    pub total_available: Option<u64>,
    pub sectors: Vec<SectorReading>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    pub result: ExtractionResult,
    /// False only when no page source could be acquired.
    pub success: bool,
}

/// Ways of arriving at `total_available`, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityStrategy {
    SectorSum,
    CapacityDerived,
    GlobalFallback,
}

pub const AVAILABILITY_CHAIN: [AvailabilityStrategy; 3] = [
    AvailabilityStrategy::SectorSum,
    AvailabilityStrategy::CapacityDerived,
    AvailabilityStrategy::GlobalFallback,
];

/// Everything the availability strategies may look at.
#[derive(Debug, Clone, Copy)]
pub struct Evidence<'a> {
    pub sectors: &'a [SectorReading],
    pub sold_tickets: Option<u64>,
    pub capacity: Option<u64>,
    pub page_text: Option<&'a str>,
}

impl AvailabilityStrategy {
    pub fn evaluate(self, evidence: &Evidence<'_>) -> Option<u64> {
        match self {
            Self::SectorSum => sectors::sector_sum(evidence.sectors),
            Self::CapacityDerived => {
                let capacity = evidence.capacity?;
                let sold = evidence.sold_tickets?;
                Some(capacity.saturating_sub(sold))
            }
            Self::GlobalFallback => evidence
                .page_text
                .and_then(patterns::find_global_available)
                .map(|m| m.count),
        }
    }

    fn note(self, evidence: &Evidence<'_>) -> String {
        match self {
            Self::SectorSum => format!("available from {} sectors", evidence.sectors.len()),
            Self::CapacityDerived => format!(
                "available derived from capacity {} minus sold {}",
                evidence.capacity.unwrap_or_default(),
                evidence.sold_tickets.unwrap_or_default()
            ),
            Self::GlobalFallback => "Used global fallback".to_owned(),
        }
    }
}

/// First strategy in [`AVAILABILITY_CHAIN`] that yields a value.
pub fn resolve_available(evidence: &Evidence<'_>) -> Option<(AvailabilityStrategy, u64)> {
    AVAILABILITY_CHAIN
        .iter()
        .find_map(|strategy| strategy.evaluate(evidence).map(|value| (*strategy, value)))
}

/// Searches the sources in order for the sold count. Sectors and the global
/// fallback are then read from the event page, which is acquired even when
/// the homepage already gave the sold count.
pub async fn extract(driver: &mut dyn PageDriver, plan: &ExtractionPlan) -> ExtractionOutcome {
    let mut notes = Notes::default();
    let mut page_text: Option<String> = None;
    let mut sold_tickets = None;
    let mut event_page_attempted = false;

    for (source, url) in plan.sources() {
        event_page_attempted |= source == PageSource::EventPage;
        let Some(text) = acquire_source(driver, source, url, plan, &mut notes).await else {
            continue;
        };

        let found = patterns::find_sold(&text);
        page_text = Some(text);
        match found {
            Some(m) => {
                tracing::debug!(source = source.label(), pattern = m.label, count = m.count, "sold count found");
                notes.push(format!("sold from {}", source.label()));
                sold_tickets = Some(m.count);
                break;
            }
            None => notes.push(format!("sold count not found on {}", source.label())),
        }
    }

    if !event_page_attempted {
        let source = PageSource::EventPage;
        if let Some(text) = acquire_source(driver, source, &plan.event_page, plan, &mut notes).await {
            page_text = Some(text);
        }
    }

    let Some(page_text) = page_text else {
        notes.push("no page could be acquired");
        return ExtractionOutcome {
            result: ExtractionResult {
                sold_tickets: None,
                total_available: None,
                sectors: Vec::new(),
                notes: notes.into_vec(),
            },
            success: false,
        };
    };

    let sectors = scan_sectors(driver, plan, &mut notes).await;

    let evidence = Evidence {
        sectors: &sectors,
        sold_tickets,
        capacity: plan.capacity,
        page_text: Some(&page_text),
    };
    let total_available = match resolve_available(&evidence) {
        Some((strategy, value)) => {
            tracing::debug!(?strategy, value, "availability resolved");
            notes.push(strategy.note(&evidence));
            Some(value)
        }
        None => {
            notes.push("available count not found");
            None
        }
    };

    ExtractionOutcome {
        result: ExtractionResult {
            sold_tickets,
            total_available,
            sectors,
            notes: notes.into_vec(),
        },
        success: true,
    }
}

async fn bounded<T>(
    limit: Duration,
    step: &str,
    future: impl Future<Output = anyhow::Result<T>>,
) -> anyhow::Result<T> {
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => anyhow::bail!("{step} timed out after {}ms", limit.as_millis()),
    }
}

/// [`acquire`] with the failure logged and noted.
async fn acquire_source(
    driver: &mut dyn PageDriver,
    source: PageSource,
    url: &Url,
    plan: &ExtractionPlan,
    notes: &mut Notes,
) -> Option<String> {
    match acquire(driver, url, plan, notes).await {
        Ok(text) => Some(text),
        Err(err) => {
            tracing::warn!(source = source.label(), url = %url, ?err, "page acquisition failed");
            notes.push(format!("{} acquisition failed: {err:#}", source.label()));
            None
        }
    }
}

/// Navigates, waits for the page to settle, clears any consent prompt, and
/// returns the page's body text.
async fn acquire(
    driver: &mut dyn PageDriver,
    url: &Url,
    plan: &ExtractionPlan,
    notes: &mut Notes,
) -> anyhow::Result<String> {
    let timeouts = &plan.timeouts;
    bounded(timeouts.navigation, "navigate", driver.navigate(url)).await?;
    bounded(timeouts.settle, "wait for page to settle", driver.wait_settled()).await?;

    dismiss_consent(driver, plan, notes).await;

    let body = bounded(timeouts.read, "locate body", driver.locate("body")).await?;
    let Some(body) = body.first().copied() else {
        anyhow::bail!("page has no body element");
    };
    bounded(timeouts.read, "read body text", driver.inner_text(body)).await
}

async fn dismiss_consent(driver: &mut dyn PageDriver, plan: &ExtractionPlan, notes: &mut Notes) {
    for label in &plan.consent_labels {
        match bounded(plan.timeouts.click, "click", driver.click_text(label)).await {
            Ok(()) => {
                notes.push(format!("Clicked cookie: {label}"));
                return;
            }
            Err(err) => tracing::debug!(label = %label, ?err, "consent label not clickable"),
        }
    }
}

async fn scan_sectors(
    driver: &mut dyn PageDriver,
    plan: &ExtractionPlan,
    notes: &mut Notes,
) -> Vec<SectorReading> {
    let read = plan.timeouts.read;
    let elements = match bounded(read, "locate sectors", driver.locate(SECTOR_SELECTOR)).await {
        Ok(elements) => elements,
        Err(err) => {
            notes.push(format!("sector lookup failed: {err:#}"));
            return Vec::new();
        }
    };

    let mut descriptors = Vec::with_capacity(elements.len());
    for element in elements {
        descriptors.push(describe(driver, element, read).await);
    }

    let sectors = sectors::aggregate(&descriptors);
    if sectors.is_empty() {
        notes.push(format!(
            "no sector readings among {} candidate elements",
            descriptors.len()
        ));
    }
    sectors
}

/// Reads the three candidate text sources; a failed read leaves that source
/// absent without affecting the others.
async fn describe(
    driver: &mut dyn PageDriver,
    element: ElementId,
    limit: Duration,
) -> ElementDescriptor {
    let aria_label = bounded(limit, "read aria-label", driver.attribute(element, "aria-label"))
        .await
        .unwrap_or_else(|err| {
            tracing::debug!(element = element.0, ?err, "aria-label unreadable");
            None
        });
    let title = bounded(limit, "read title", driver.attribute(element, "title"))
        .await
        .unwrap_or_else(|err| {
            tracing::debug!(element = element.0, ?err, "title unreadable");
            None
        });
    let inner_text = match bounded(limit, "read inner text", driver.inner_text(element)).await {
        Ok(text) => Some(text),
        Err(err) => {
            tracing::debug!(element = element.0, ?err, "inner text unreadable");
            None
        }
    };

    ElementDescriptor {
        aria_label,
        title,
        inner_text,
    }
}
