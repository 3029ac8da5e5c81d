//! Alert delivery for the cron monitor.
//!
//! This crate provides:
//! - `Publisher` trait for pluggable delivery transports
//! - SNS publisher implementation
//! - `TopicMap` routing alert categories to destination topics
//! - `AlertDispatcher` that prefixes and fans out alerts per category

pub mod dispatcher;
pub mod sns;
pub mod traits;

pub use dispatcher::{AlertDispatcher, TopicMap};
pub use sns::SnsPublisher;
pub use traits::{Alert, AlertCategory, DispatchResult, NotifyError, Publisher};
