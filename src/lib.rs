pub mod badge;
pub mod browser;
pub mod config;
pub mod logging;
pub mod messaging;
pub mod notify;
pub mod output;
pub mod snooze;
pub mod store;
