//! Multi-instance reports.

use chrono::NaiveDateTime;
use teloxide::utils::html;

use super::instance::{format_cost, format_instance};
use crate::provider::Instance;

/// Telegram rejects messages longer than 4096 characters.
pub const MESSAGE_LIMIT: usize = 4000;

/// Aggregate figures over a set of instances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSummary {
    pub total: usize,
    pub running: usize,
    /// Summed hourly cost of running instances only.
    pub running_cost: f64,
}

impl StatusSummary {
    /// Computes the summary for `instances`.
    #[must_use]
    pub fn from_instances(instances: &[Instance]) -> Self {
        let (running, running_cost) = instances
            .iter()
            .filter(|i| i.is_running())
            .fold((0, 0.0), |(count, cost), i| (count + 1, cost + i.hourly_cost()));

        Self {
            total: instances.len(),
            running,
            running_cost,
        }
    }
}

fn join_blocks<'a>(instances: impl Iterator<Item = &'a Instance>) -> String {
    instances
        .map(format_instance)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Report of running instances, for `/status`.
#[must_use]
pub fn running_report(instances: &[Instance]) -> String {
    let running: Vec<&Instance> = instances.iter().filter(|i| i.is_running()).collect();

    if running.is_empty() {
        return "No instances are currently running.".to_owned();
    }

    format!(
        "Running instances: {}\n\n{}",
        running.len(),
        join_blocks(running.into_iter())
    )
}

/// Report of every instance, for `/pods`.
#[must_use]
pub fn instance_list_report(instances: &[Instance]) -> String {
    if instances.is_empty() {
        return "No instances found.".to_owned();
    }

    format!(
        "All instances: {}\n\n{}",
        instances.len(),
        join_blocks(instances.iter())
    )
}

/// Periodic report pushed by the instance monitor.
#[must_use]
pub fn periodic_report(instances: &[Instance], generated_at: NaiveDateTime) -> String {
    let summary = StatusSummary::from_instances(instances);

    let mut message = format!(
        "{} {}\n\n\
         Instances: {}\n\
         (running: {})\n\n\
         {}\n\n",
        html::bold("[RunPod monitor]"),
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        summary.total,
        summary.running,
        join_blocks(instances.iter()),
    );

    if summary.running > 0 {
        message.push_str(&format!(
            "Hourly cost of running instances: {}\n\n",
            format_cost(summary.running_cost)
        ));
    }
    message.push_str("Use /terminate or /stop to manage them.");

    message
}

/// Alert pushed when the instance check itself fails.
#[must_use]
pub fn check_failed_alert(detail: &str) -> String {
    format!(
        "{} Instance check failed: {}",
        html::bold("[Error]"),
        html::escape(detail)
    )
}

/// Splits `text` into chunks of at most `limit` characters.
///
/// Splits happen on line boundaries so inline markup is never cut; a
/// single line longer than `limit` is split by characters.
#[must_use]
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_owned()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let separator = usize::from(!current.is_empty());

        if current_len + separator + line_len <= limit {
            if separator == 1 {
                current.push('\n');
            }
            current.push_str(line);
            current_len += separator + line_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
        } else {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
