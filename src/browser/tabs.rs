use async_trait::async_trait;
use glob::Pattern;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Invalid URL pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to open browser for URL {url}: {source}")]
    Open {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: u32,
    pub window_id: u32,
    pub url: String,
}

/// Query the host for windows and tabs
#[async_trait]
pub trait TabQuery: Send + Sync {
    async fn current_window(&self) -> Result<Window, BrowserError>;
    async fn active_tab(&self, window_id: u32) -> Result<Option<Tab>, BrowserError>;
}

/// One window holding one active tab
#[derive(Debug, Clone)]
pub struct FixedTabs {
    tab: Option<Tab>,
}

impl FixedTabs {
    pub fn new(url: Option<String>) -> Self {
        Self {
            tab: url.map(|url| Tab {
                id: 1,
                window_id: 1,
                url,
            }),
        }
    }
}

#[async_trait]
impl TabQuery for FixedTabs {
    async fn current_window(&self) -> Result<Window, BrowserError> {
        Ok(Window { id: 1 })
    }

    async fn active_tab(&self, window_id: u32) -> Result<Option<Tab>, BrowserError> {
        Ok(self.tab.clone().filter(|tab| tab.window_id == window_id))
    }
}

/// Allow-list of glob patterns a URL must match to count as a real page
#[derive(Debug, Clone)]
pub struct UrlFilter {
    patterns: Vec<Pattern>,
}

impl UrlFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, BrowserError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref()).map_err(|source| BrowserError::Pattern {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_valid(&self, url: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(url))
    }
}

/// Get the active tab's URL in the current window, if it passes the filter
pub async fn current_tab_url(
    tabs: &dyn TabQuery,
    filter: &UrlFilter,
) -> Result<Option<String>, BrowserError> {
    let window = tabs.current_window().await?;
    let Some(tab) = tabs.active_tab(window.id).await? else {
        debug!(window = window.id, "no active tab");
        return Ok(None);
    };

    if filter.is_valid(&tab.url) {
        Ok(Some(tab.url))
    } else {
        debug!(url = %tab.url, "active tab url rejected by filter");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web_filter() -> UrlFilter {
        UrlFilter::new(&["http://*", "https://*"]).unwrap()
    }

    #[test]
    fn test_filter_accepts_web_urls() {
        let filter = web_filter();
        assert!(filter.is_valid("https://example.com/a/b?c=d"));
        assert!(filter.is_valid("http://localhost:8080/"));
    }

    #[test]
    fn test_filter_rejects_internal_pages() {
        let filter = web_filter();
        assert!(!filter.is_valid("chrome://extensions"));
        assert!(!filter.is_valid("about:blank"));
        assert!(!filter.is_valid("file:///etc/hosts"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = UrlFilter::new(&["https://[*"]).unwrap_err();
        assert!(err.to_string().contains("https://[*"));
    }

    #[tokio::test]
    async fn test_current_tab_url_valid() {
        let tabs = FixedTabs::new(Some("https://example.com".to_string()));
        let url = current_tab_url(&tabs, &web_filter()).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn test_current_tab_url_filtered_out() {
        let tabs = FixedTabs::new(Some("chrome://newtab".to_string()));
        assert_eq!(current_tab_url(&tabs, &web_filter()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_current_tab_url_no_tab() {
        let tabs = FixedTabs::new(None);
        assert_eq!(current_tab_url(&tabs, &web_filter()).await.unwrap(), None);
    }
}
