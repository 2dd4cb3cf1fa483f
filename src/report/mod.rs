//! Human-readable rendering of instance data.
//!
//! All output is Telegram HTML: identifiers in code spans, headers in bold,
//! and every value coming from the API escaped.

mod instance;
mod summary;

pub use instance::{format_cost, format_instance, format_uptime};
pub use summary::{
    MESSAGE_LIMIT, StatusSummary, check_failed_alert, instance_list_report, periodic_report,
    running_report, split_message,
};
