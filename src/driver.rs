use async_trait::async_trait;
use url::Url;

/// Handle to an element of the currently loaded page.
///
/// Handles are only meaningful until the next `navigate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub usize);

/// Page-automation capabilities consumed by the extraction pipeline.
///
/// Implementations do not need to enforce their own deadlines; callers wrap
/// each call in a timeout.
#[async_trait]
pub trait PageDriver: Send {
    async fn navigate(&mut self, url: &Url) -> anyhow::Result<()>;

    /// Resolves once the current page is considered settled.
    async fn wait_settled(&mut self) -> anyhow::Result<()>;

    /// Elements matching a CSS selector, in document order.
    async fn locate(&mut self, selector: &str) -> anyhow::Result<Vec<ElementId>>;

    async fn inner_text(&mut self, element: ElementId) -> anyhow::Result<String>;

    async fn attribute(&mut self, element: ElementId, name: &str)
    -> anyhow::Result<Option<String>>;

    /// Clicks the first clickable element whose visible text contains `label`.
    async fn click_text(&mut self, label: &str) -> anyhow::Result<()>;

    /// Releases every resource held by the session.
    async fn close(&mut self) -> anyhow::Result<()>;
}
