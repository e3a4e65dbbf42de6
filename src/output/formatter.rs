use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::notify::NotificationOptions;
use crate::snooze::SnoozeRecord;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format a snooze list as a table: index, time left, badge marker, id, URL
/// No headers. Index column is 3 chars, right-aligned.
pub fn format_snooze_table(
    records: &[SnoozeRecord],
    now: DateTime<Utc>,
    use_colors: bool,
) -> String {
    if records.is_empty() {
        return "Nothing snoozed.".to_string();
    }

    let term_width = get_terminal_width();
    let id_width = records.iter().map(|r| r.id.chars().count()).max().unwrap_or(0);
    let left_width = 9; // fits "<1m left" and "99w left"
    let separator = "  ";

    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let index_str = format!("{:>2}.", idx + 1);
            let left = format!(
                "{:>width$}",
                record.format_remaining(now),
                width = left_width
            );
            let marker = if record.badge_count { "*" } else { " " };
            let id = format!("{:<width$}", record.id, width = id_width);

            let fixed_width = 3 + 1 + left_width + 1 + id_width + separator.len() * 2;
            let url = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate(&record.url, width - fixed_width)
                }
                Some(_) => truncate(&record.url, 20),
                None => record.url.clone(),
            };

            if use_colors {
                let left = if record.is_due(now.timestamp_millis()) {
                    left.yellow().bold().to_string()
                } else {
                    left.bold().to_string()
                };
                format!(
                    "{} {}{}{}{}{}",
                    index_str.dimmed(),
                    left,
                    marker.cyan(),
                    id.dimmed(),
                    separator,
                    url.underline()
                )
            } else {
                format!("{} {}{}{}{}{}", index_str, left, marker, id, separator, url)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a single snooze with detailed multi-line output
pub fn format_snooze_detail(
    record: &SnoozeRecord,
    now: DateTime<Utc>,
    use_colors: bool,
) -> String {
    let wakes = record
        .notify_at_utc()
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| record.notify_at.to_string());
    let counted = if record.badge_count { "yes" } else { "no" };

    if use_colors {
        format!(
            "{}\n  Id: {}\n  Wakes: {} ({})\n  Badge: {}",
            record.url.bold(),
            record.id.cyan(),
            wakes,
            record.format_remaining(now),
            counted
        )
    } else {
        format!(
            "{}\n  Id: {}\n  Wakes: {} ({})\n  Badge: {}",
            record.url,
            record.id,
            wakes,
            record.format_remaining(now),
            counted
        )
    }
}

/// Format a notification as a small block of text
pub fn format_notification(options: &NotificationOptions, use_colors: bool) -> String {
    let actions = options
        .actions
        .iter()
        .map(|a| format!("[{}]", a.title))
        .collect::<Vec<_>>()
        .join(" ");

    if use_colors {
        format!(
            "{} {}\n  {}\n  {}",
            "🔔".yellow(),
            options.title.bold(),
            options.message.underline(),
            actions.dimmed()
        )
    } else {
        format!("* {}\n  {}\n  {}", options.title, options.message, actions)
    }
}
