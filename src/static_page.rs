use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::driver::{ElementId, PageDriver};

/// Subtrees that never contribute to rendered text.
const SKIPPED_TAGS: [&str; 5] = ["head", "script", "style", "noscript", "template"];

const CLICKABLE_SELECTOR: &str =
    "button, a, [role=button], input[type=button], input[type=submit]";

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub html: String,
}

/// Source of complete HTML documents for [`StaticDriver`].
#[async_trait]
pub trait Fetch: Send {
    async fn fetch(&mut self, url: &Url) -> anyhow::Result<FetchedPage>;

    async fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// One element of a parsed document, with everything the driver answers
/// about it captured at load time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct IndexedElement {
    attributes: Vec<(String, String)>,
    text: String,
    clickable: bool,
}

/// Element table of a parsed document, indexed by [`ElementId`] in document
/// order.
#[derive(Debug, Clone, Default)]
pub struct PageIndex {
    elements: Vec<IndexedElement>,
}

impl PageIndex {
    pub fn build(html: &str) -> anyhow::Result<Self> {
        let clickable = parse_selector(CLICKABLE_SELECTOR)?;
        let document = Html::parse_document(html);
        let elements = elements(&document)
            .map(|element| IndexedElement {
                attributes: element
                    .value()
                    .attrs()
                    .map(|(name, value)| (name.to_owned(), value.to_owned()))
                    .collect(),
                text: rendered_text(element),
                clickable: clickable.matches(&element),
            })
            .collect();
        Ok(Self { elements })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn get(&self, element: ElementId) -> anyhow::Result<&IndexedElement> {
        self.elements
            .get(element.0)
            .ok_or_else(|| anyhow::anyhow!("stale element handle: {}", element.0))
    }

    pub fn text(&self, element: ElementId) -> anyhow::Result<&str> {
        Ok(&self.get(element)?.text)
    }

    pub fn attribute(&self, element: ElementId, name: &str) -> anyhow::Result<Option<&str>> {
        Ok(self
            .get(element)?
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str()))
    }

    /// First clickable element whose text or `value` contains `label`,
    /// ignoring case.
    pub fn find_clickable(&self, label: &str) -> anyhow::Result<ElementId> {
        let needle = label.to_lowercase();
        self.elements
            .iter()
            .position(|element| {
                if !element.clickable {
                    return false;
                }
                let value = element
                    .attributes
                    .iter()
                    .find(|(key, _)| key == "value")
                    .map(|(_, value)| value.as_str())
                    .unwrap_or_default();
                element.text.to_lowercase().contains(&needle)
                    || value.to_lowercase().contains(&needle)
            })
            .map(ElementId)
            .ok_or_else(|| anyhow::anyhow!("no clickable element with text {label:?}"))
    }
}

#[derive(Debug)]
struct LoadedPage {
    page: FetchedPage,
    index: PageIndex,
}

/// A [`PageDriver`] over fully rendered HTML documents.
///
/// A document is parsed once when it is loaded; reads are lookups into its
/// [`PageIndex`]. A document is settled as soon as it has been fetched, and
/// clicks have no client-side effect: a click that finds its target is
/// acknowledged and the page is left as it is. Failed navigation keeps the
/// previous page loaded.
#[derive(Debug)]
pub struct StaticDriver<F> {
    fetcher: F,
    loaded: Option<LoadedPage>,
    closed: bool,
}

impl<F: Fetch> StaticDriver<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            loaded: None,
            closed: false,
        }
    }

    pub fn current_url(&self) -> Option<&Url> {
        self.loaded.as_ref().map(|loaded| &loaded.page.url)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn loaded(&self) -> anyhow::Result<&LoadedPage> {
        if self.closed {
            anyhow::bail!("driver session is closed");
        }
        self.loaded
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no page loaded"))
    }
}

#[async_trait]
impl<F: Fetch> PageDriver for StaticDriver<F> {
    async fn navigate(&mut self, url: &Url) -> anyhow::Result<()> {
        if self.closed {
            anyhow::bail!("driver session is closed");
        }
        let page = self.fetcher.fetch(url).await?;
        let index = PageIndex::build(&page.html)?;
        tracing::debug!(
            url = %url,
            final_url = %page.url,
            bytes = page.html.len(),
            elements = index.len(),
            "page loaded"
        );
        self.loaded = Some(LoadedPage { page, index });
        Ok(())
    }

    async fn wait_settled(&mut self) -> anyhow::Result<()> {
        self.loaded().map(|_| ())
    }

    async fn locate(&mut self, selector: &str) -> anyhow::Result<Vec<ElementId>> {
        locate(&self.loaded()?.page.html, selector)
    }

    async fn inner_text(&mut self, element: ElementId) -> anyhow::Result<String> {
        self.loaded()?.index.text(element).map(str::to_owned)
    }

    async fn attribute(
        &mut self,
        element: ElementId,
        name: &str,
    ) -> anyhow::Result<Option<String>> {
        Ok(self
            .loaded()?
            .index
            .attribute(element, name)?
            .map(str::to_owned))
    }

    async fn click_text(&mut self, label: &str) -> anyhow::Result<()> {
        let target = self.loaded()?.index.find_clickable(label)?;
        tracing::debug!(label, element = target.0, "click acknowledged on static page");
        Ok(())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.loaded = None;
        self.fetcher.close().await
    }
}

fn parse_selector(selector: &str) -> anyhow::Result<Selector> {
    Selector::parse(selector).map_err(|err| anyhow::anyhow!("parse selector {selector:?}: {err}"))
}

fn elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
}

/// Matches `selector` in one pass over the document. Ids line up with
/// [`PageIndex::build`] for the same HTML.
pub fn locate(html: &str, selector: &str) -> anyhow::Result<Vec<ElementId>> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(elements(&document)
        .enumerate()
        .filter(|(_, element)| selector.matches(element))
        .map(|(index, _)| ElementId(index))
        .collect())
}

/// Text of `element` with one line per text node, whitespace collapsed and
/// script/style content dropped. Non-breaking spaces are kept.
pub fn rendered_text(element: ElementRef<'_>) -> String {
    let mut lines = Vec::new();
    collect_text(element, &mut lines);
    lines.join("\n")
}

fn collect_text(element: ElementRef<'_>, lines: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let line = text.split_ascii_whitespace().collect::<Vec<_>>().join(" ");
                if !line.is_empty() {
                    lines.push(line);
                }
            }
            Node::Element(el) if SKIPPED_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, lines);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html>
  <head><title>Bilety</title><style>.sector { fill: red; }</style></head>
  <body>
    <div id="cookies"><button>Zgadzam się</button></div>
    <h1>Wisła Kraków</h1>
    <p>Sprzedane   bilety: <strong>12&nbsp;345</strong></p>
    <svg>
      <path class="sector-shape" aria-label="Sektor A1, 10 dostępnych"></path>
      <path class="sector-shape" title="Sektor B2"></path>
    </svg>
    <script>var sold = 1;</script>
  </body>
</html>
"#;

    #[test]
    fn rendered_text_skips_scripts_and_keeps_nbsp() -> anyhow::Result<()> {
        let index = PageIndex::build(PAGE)?;
        let body = locate(PAGE, "body")?;
        let text = index.text(body[0])?;
        assert!(text.contains("Sprzedane bilety:\n12\u{00A0}345"), "text={text:?}");
        assert!(!text.contains("var sold"));
        assert!(!text.contains("fill: red"));
        Ok(())
    }

    #[test]
    fn locate_ids_address_the_page_index() -> anyhow::Result<()> {
        let index = PageIndex::build(PAGE)?;
        let found = locate(PAGE, "[class*=sector]")?;
        assert_eq!(found.len(), 2);
        assert!(found[0].0 < found[1].0);

        let labels = found
            .iter()
            .map(|id| index.attribute(*id, "aria-label"))
            .collect::<anyhow::Result<Vec<_>>>()?;
        assert_eq!(labels, vec![Some("Sektor A1, 10 dostępnych"), None]);
        assert_eq!(index.attribute(found[1], "title")?, Some("Sektor B2"));
        Ok(())
    }

    #[test]
    fn locate_rejects_invalid_selector() {
        assert!(locate(PAGE, "[[").is_err());
    }

    #[test]
    fn find_clickable_matches_visible_text_case_insensitively() -> anyhow::Result<()> {
        let index = PageIndex::build(PAGE)?;
        index.find_clickable("zgadzam")?;
        assert!(index.find_clickable("Accept").is_err());
        assert!(index.find_clickable("Wisła").is_err());
        Ok(())
    }

    #[test]
    fn find_clickable_reads_input_values() -> anyhow::Result<()> {
        let index = PageIndex::build(r#"<html><body><input type="submit" value="Akceptuj"></body></html>"#)?;
        index.find_clickable("akceptuj")?;
        Ok(())
    }

    #[test]
    fn stale_handle_is_an_error() -> anyhow::Result<()> {
        let index = PageIndex::build(PAGE)?;
        assert!(index.text(ElementId(10_000)).is_err());
        assert!(index.attribute(ElementId(index.len()), "title").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn reads_come_from_the_page_loaded_by_navigate() -> anyhow::Result<()> {
        let first = Url::parse("https://tickets.example/a")?;
        let second = Url::parse("https://tickets.example/b")?;
        let mut driver = crate::snapshot_driver::SnapshotFetcher::new()
            .with_page(&first, r#"<html><body><p title="one">A</p></body></html>"#)
            .with_page(&second, r#"<html><body><p title="two">B</p></body></html>"#)
            .into_driver();

        driver.navigate(&first).await?;
        let p = driver.locate("p").await?;
        assert_eq!(driver.attribute(p[0], "title").await?.as_deref(), Some("one"));

        driver.navigate(&second).await?;
        let p = driver.locate("p").await?;
        assert_eq!(driver.attribute(p[0], "title").await?.as_deref(), Some("two"));
        assert_eq!(driver.inner_text(p[0]).await?, "B");
        Ok(())
    }
}
