pub mod tabs;

pub use tabs::{current_tab_url, BrowserError, FixedTabs, Tab, TabQuery, UrlFilter, Window};

/// Open a URL in the user's default browser
///
/// # Arguments
/// * `url` - The URL to open (e.g., a snoozed page that is due)
///
/// # Errors
/// Returns error if browser cannot be opened (e.g., no browser available)
pub fn open_url(url: &str) -> Result<(), BrowserError> {
    webbrowser::open(url).map_err(|source| BrowserError::Open {
        url: url.to_string(),
        source,
    })
}
