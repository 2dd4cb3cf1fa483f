//! Per-instance formatting.

use teloxide::utils::html;

use crate::provider::Instance;

/// Formats an uptime in seconds as `{h}h {m}m {s}s`.
///
/// Returns `N/A` when the uptime is unknown or zero.
#[must_use]
pub fn format_uptime(seconds: Option<u64>) -> String {
    match seconds {
        None | Some(0) => "N/A".to_owned(),
        Some(secs) => {
            let hours = secs / 3600;
            let minutes = (secs % 3600) / 60;
            let secs = secs % 60;
            format!("{hours}h {minutes}m {secs}s")
        }
    }
}

/// Formats a dollar amount with four decimals.
#[must_use]
pub fn format_cost(cost: f64) -> String {
    format!("${cost:.4}")
}

/// Renders one instance as an HTML block.
#[must_use]
pub fn format_instance(instance: &Instance) -> String {
    let name = instance.name.as_deref().unwrap_or("N/A");
    let gpu = instance.gpu_label().unwrap_or("N/A");
    let status = instance
        .desired_status
        .as_ref()
        .map_or("N/A", |s| s.as_str());

    format!(
        "  - ID: {}\n\
         \x20 - Name: {}\n\
         \x20 - GPU: {}\n\
         \x20 - Status: {}\n\
         \x20 - Uptime: {}\n\
         \x20 - Hourly cost: {}",
        html::code_inline(&instance.id),
        html::escape(name),
        html::escape(gpu),
        html::escape(status),
        format_uptime(instance.uptime_secs()),
        format_cost(instance.hourly_cost()),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::provider::InstanceStatus;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(None), "N/A");
        assert_eq!(format_uptime(Some(0)), "N/A");
        assert_eq!(format_uptime(Some(59)), "0h 0m 59s");
        assert_eq!(format_uptime(Some(3725)), "1h 2m 5s");
        assert_eq!(format_uptime(Some(90_000)), "25h 0m 0s");
    }

    #[test]
    fn test_format_instance_complete() {
        let instance: Instance = serde_json::from_value(json!({
            "id": "pod123",
            "name": "trainer",
            "desiredStatus": "RUNNING",
            "costPerHr": 0.44,
            "gpuTypeId": "NVIDIA RTX A4500",
            "runtime": { "uptimeInSeconds": 3725 }
        }))
        .unwrap();

        let block = format_instance(&instance);
        assert!(block.contains("  - ID: <code>pod123</code>"));
        assert!(block.contains("  - Name: trainer"));
        assert!(block.contains("  - GPU: NVIDIA RTX A4500"));
        assert!(block.contains("  - Status: RUNNING"));
        assert!(block.contains("  - Uptime: 1h 2m 5s"));
        assert!(block.contains("  - Hourly cost: $0.4400"));
    }

    #[test]
    fn test_format_instance_missing_fields() {
        let instance: Instance = serde_json::from_value(json!({ "id": "bare" })).unwrap();
        let block = format_instance(&instance);
        assert!(block.contains("Name: N/A"));
        assert!(block.contains("GPU: N/A"));
        assert!(block.contains("Status: N/A"));
        assert!(block.contains("Uptime: N/A"));
        assert!(block.contains("Hourly cost: $0.0000"));
    }

    #[test]
    fn test_format_instance_escapes_html() {
        let instance = Instance::new("p1", "<b>evil</b> & co", InstanceStatus::Exited, 12.5);
        let block = format_instance(&instance);
        assert!(block.contains("&lt;b&gt;evil&lt;/b&gt; &amp; co"));
        assert!(block.contains("$12.5000"));
    }
}
