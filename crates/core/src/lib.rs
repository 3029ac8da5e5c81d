pub mod config;
pub mod duration;
pub mod error;

pub use config::{MonitorConfig, Options};
pub use duration::{format_duration, parse_compact, parse_interval, DurationParseError};
pub use error::*;
