//! Instance monitor module.
//!
//! Periodically lists every instance and pushes a report, or an alert on
//! failure, to the configured notification chat.

mod notifier;
mod runner;

pub use notifier::{NotifyError, Notifier};
pub use runner::{CheckOutcome, InstanceMonitor, MonitorMessage};
