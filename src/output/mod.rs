pub mod formatter;

pub use formatter::{
    format_notification, format_snooze_detail, format_snooze_table, should_use_colors,
};
