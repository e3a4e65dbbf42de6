use async_trait::async_trait;
use owo_colors::OwoColorize;
use std::sync::Mutex;

/// The visible badge overlaid on the extension icon
#[async_trait]
pub trait BadgeSurface: Send + Sync {
    async fn set_text(&self, text: &str);
    async fn set_background_color(&self, color: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeState {
    pub text: String,
    pub color: String,
}

/// Badge rendered to stdout whenever its text changes
#[derive(Debug, Default)]
pub struct TerminalBadge {
    state: Mutex<BadgeState>,
    print: bool,
    use_colors: bool,
}

impl TerminalBadge {
    pub fn new(use_colors: bool) -> Self {
        Self {
            state: Mutex::new(BadgeState::default()),
            print: true,
            use_colors,
        }
    }

    /// Tracks state without printing
    pub fn quiet() -> Self {
        Self::default()
    }

    /// Last text and color applied
    pub fn state(&self) -> BadgeState {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BadgeSurface for TerminalBadge {
    async fn set_text(&self, text: &str) {
        let color = match self.state.lock() {
            Ok(mut state) => {
                state.text = text.to_string();
                state.color.clone()
            }
            Err(_) => return,
        };
        if self.print {
            println!("{}", format_badge(text, &color, self.use_colors));
        }
    }

    async fn set_background_color(&self, color: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.color = color.to_string();
        }
    }
}

/// Parse "#RRGGBB" into its components
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Format the badge as a single line, e.g. "Badge: [ 3 ]"
pub fn format_badge(text: &str, color: &str, use_colors: bool) -> String {
    if text.is_empty() {
        return "Badge: (empty)".to_string();
    }
    let label = format!(" {} ", text);
    match parse_hex_color(color) {
        Some((r, g, b)) if use_colors => {
            format!("Badge: {}", label.white().bold().on_truecolor(r, g, b))
        }
        _ => format!("Badge: [{}]", label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#3C5A99"), Some((0x3c, 0x5a, 0x99)));
        assert_eq!(parse_hex_color("3C5A99"), None);
        assert_eq!(parse_hex_color("#3C5A9"), None);
        assert_eq!(parse_hex_color("#GG0000"), None);
    }

    #[test]
    fn test_format_badge_plain() {
        assert_eq!(format_badge("3", "#3C5A99", false), "Badge: [ 3 ]");
        assert_eq!(format_badge("", "#3C5A99", false), "Badge: (empty)");
    }

    #[tokio::test]
    async fn test_state_tracks_last_calls() {
        let badge = TerminalBadge::quiet();
        badge.set_background_color("#000000").await;
        badge.set_text("7").await;

        assert_eq!(
            badge.state(),
            BadgeState {
                text: "7".to_string(),
                color: "#000000".to_string()
            }
        );
    }
}
