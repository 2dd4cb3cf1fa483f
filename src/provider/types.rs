//! RunPod resource types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Desired status of an instance as reported by RunPod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceStatus {
    Running,
    Exited,
    Stopped,
    Terminated,
    Created,
    Restarting,
    Paused,
    Dead,
    /// Any status this bot does not know about, kept verbatim.
    Other(String),
}

impl InstanceStatus {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "RUNNING",
            Self::Exited => "EXITED",
            Self::Stopped => "STOPPED",
            Self::Terminated => "TERMINATED",
            Self::Created => "CREATED",
            Self::Restarting => "RESTARTING",
            Self::Paused => "PAUSED",
            Self::Dead => "DEAD",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for InstanceStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "RUNNING" => Self::Running,
            "EXITED" => Self::Exited,
            "STOPPED" => Self::Stopped,
            "TERMINATED" => Self::Terminated,
            "CREATED" => Self::Created,
            "RESTARTING" => Self::Restarting,
            "PAUSED" => Self::Paused,
            "DEAD" => Self::Dead,
            _ => Self::Other(raw),
        }
    }
}

impl From<InstanceStatus> for String {
    fn from(status: InstanceStatus) -> Self {
        match status {
            InstanceStatus::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GPU block of the REST pod representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Machine block of the GraphQL pod representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineInfo {
    #[serde(default)]
    pub gpu_type_id: Option<String>,
}

/// Runtime information, present only while the container is up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeInfo {
    #[serde(default)]
    pub uptime_in_seconds: Option<u64>,
}

/// A rented compute instance ("pod").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub gpu_type_id: Option<String>,

    #[serde(default)]
    pub gpu: Option<GpuInfo>,

    #[serde(default)]
    pub machine: Option<MachineInfo>,

    #[serde(default)]
    pub desired_status: Option<InstanceStatus>,

    #[serde(default)]
    pub cost_per_hr: Option<f64>,

    #[serde(default)]
    pub runtime: Option<RuntimeInfo>,
}

impl Instance {
    /// Creates an instance record with only the fields the bot reasons about.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        status: InstanceStatus,
        cost_per_hr: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            gpu_type_id: None,
            gpu: None,
            machine: None,
            desired_status: Some(status),
            cost_per_hr: Some(cost_per_hr),
            runtime: None,
        }
    }

    /// Returns true when the desired status is `RUNNING`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.desired_status == Some(InstanceStatus::Running)
    }

    /// Hourly cost, zero when unknown.
    #[must_use]
    pub fn hourly_cost(&self) -> f64 {
        self.cost_per_hr.unwrap_or(0.0)
    }

    /// Uptime in seconds, if the container is running.
    #[must_use]
    pub fn uptime_secs(&self) -> Option<u64> {
        self.runtime.as_ref().and_then(|r| r.uptime_in_seconds)
    }

    /// GPU label from whichever representation the API returned.
    #[must_use]
    pub fn gpu_label(&self) -> Option<&str> {
        self.gpu_type_id
            .as_deref()
            .or_else(|| {
                self.gpu
                    .as_ref()
                    .and_then(|g| g.id.as_deref().or(g.display_name.as_deref()))
            })
            .or_else(|| self.machine.as_ref().and_then(|m| m.gpu_type_id.as_deref()))
    }

    /// Name for buttons: the display name or a short id prefix.
    #[must_use]
    pub fn short_label(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| short_id(&self.id, 8))
    }
}

/// A field the API sends either as one string or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    Text(String),
    List(Vec<String>),
}

impl StringOrList {
    /// Port bindings as a list: a string is split on commas, a list is kept.
    #[must_use]
    pub fn to_port_list(&self) -> Vec<String> {
        match self {
            Self::Text(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned)
                .collect(),
            Self::List(items) => items.clone(),
        }
    }

    /// Startup arguments as a list: a string is split on whitespace, a list is kept.
    #[must_use]
    pub fn to_arg_list(&self) -> Vec<String> {
        match self {
            Self::Text(raw) => raw.split_whitespace().map(str::to_owned).collect(),
            Self::List(items) => items.clone(),
        }
    }

    /// Returns true for an empty string or empty list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(raw) => raw.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

impl fmt::Display for StringOrList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(raw) => f.write_str(raw),
            Self::List(items) => f.write_str(&items.join(",")),
        }
    }
}

/// Container disk size used when a template does not specify one.
pub const DEFAULT_CONTAINER_DISK_GB: u32 = 50;

/// Port bindings used when a template does not specify any.
pub const DEFAULT_PORTS: &str = "8888/http,22/tcp";

/// A saved pod template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub image_name: Option<String>,

    #[serde(default)]
    pub docker_args: Option<StringOrList>,

    #[serde(default)]
    pub docker_start_cmd: Option<StringOrList>,

    #[serde(default)]
    pub container_disk_in_gb: Option<u32>,

    #[serde(default)]
    pub ports: Option<StringOrList>,
}

impl Template {
    /// Display name, falling back to a short id prefix.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| short_id(&self.id, 8))
    }

    /// Startup arguments, if the template defines any.
    #[must_use]
    pub fn startup_args(&self) -> Option<StringOrList> {
        self.docker_args
            .iter()
            .chain(self.docker_start_cmd.iter())
            .find(|args| !args.is_empty())
            .cloned()
    }

    /// Container disk size in GB.
    #[must_use]
    pub fn container_disk_gb(&self) -> u32 {
        self.container_disk_in_gb.unwrap_or(DEFAULT_CONTAINER_DISK_GB)
    }

    /// Port bindings as defined by the template.
    #[must_use]
    pub fn port_spec(&self) -> StringOrList {
        self.ports
            .clone()
            .unwrap_or_else(|| StringOrList::Text(DEFAULT_PORTS.to_owned()))
    }
}

/// A network storage volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub size: Option<u64>,

    #[serde(default)]
    pub data_center_id: Option<String>,
}

impl Volume {
    /// Display name, falling back to a short id prefix.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| short_id(&self.id, 8))
    }

    /// Button label: name, size and data center.
    #[must_use]
    pub fn menu_label(&self) -> String {
        format!(
            "{} ({}GB, {})",
            self.display_name(),
            self.size.unwrap_or(0),
            self.data_center_id.as_deref().unwrap_or("?")
        )
    }
}

/// Body of `POST /pods`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstanceRequest {
    pub name: String,
    pub image_name: String,
    pub gpu_type_ids: Vec<String>,
    pub gpu_count: u32,
    pub container_disk_in_gb: u32,
    pub ports: Vec<String>,
    pub template_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_start_cmd: Option<Vec<String>>,

    pub volume_in_gb: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_volume_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_center_ids: Option<Vec<String>>,
}

/// Result of a successful creation call.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedInstance {
    /// Identifier of the new instance, `N/A` if the response had none.
    pub id: String,

    /// Raw response body.
    pub raw: serde_json::Value,
}

impl CreatedInstance {
    /// Builds the result from a raw response body.
    #[must_use]
    pub fn from_response(raw: serde_json::Value) -> Self {
        let id = raw
            .get("id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("N/A")
            .to_owned();
        Self { id, raw }
    }
}

/// First `max_chars` characters of an id.
#[must_use]
pub fn short_id(id: &str, max_chars: usize) -> String {
    id.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_instance_from_graphql_shape() {
        let instance: Instance = serde_json::from_value(json!({
            "id": "abc123",
            "name": "trainer",
            "desiredStatus": "RUNNING",
            "costPerHr": 0.44,
            "machine": { "gpuTypeId": "NVIDIA RTX A4500" },
            "runtime": { "uptimeInSeconds": 3725 }
        }))
        .unwrap();

        assert!(instance.is_running());
        assert_eq!(instance.gpu_label(), Some("NVIDIA RTX A4500"));
        assert_eq!(instance.uptime_secs(), Some(3725));
        assert!((instance.hourly_cost() - 0.44).abs() < f64::EPSILON);
    }

    #[test]
    fn test_instance_from_rest_shape_with_nulls() {
        let instance: Instance = serde_json::from_value(json!({
            "id": "xyz",
            "desiredStatus": "EXITED",
            "costPerHr": null,
            "gpu": { "id": "NVIDIA A40", "count": 1 },
            "runtime": null
        }))
        .unwrap();

        assert!(!instance.is_running());
        assert_eq!(instance.gpu_label(), Some("NVIDIA A40"));
        assert_eq!(instance.uptime_secs(), None);
        assert!(instance.hourly_cost().abs() < f64::EPSILON);
        assert_eq!(instance.short_label(), "xyz");
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let status: InstanceStatus = serde_json::from_value(json!("MIGRATING")).unwrap();
        assert_eq!(status, InstanceStatus::Other("MIGRATING".to_owned()));
        assert_eq!(status.to_string(), "MIGRATING");
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("MIGRATING"));
        assert_eq!(serde_json::to_value(InstanceStatus::Running).unwrap(), json!("RUNNING"));
    }

    #[test]
    fn test_ports_normalization() {
        let text = StringOrList::Text(" 8888/http, 22/tcp ,,".to_owned());
        assert_eq!(text.to_port_list(), vec!["8888/http", "22/tcp"]);

        let list = StringOrList::List(vec!["8080/http".to_owned()]);
        assert_eq!(list.to_port_list(), vec!["8080/http"]);
    }

    #[test]
    fn test_startup_args_normalization() {
        let text = StringOrList::Text("bash -c  'sleep infinity'".to_owned());
        assert_eq!(text.to_arg_list(), vec!["bash", "-c", "'sleep", "infinity'"]);

        let list = StringOrList::List(vec!["python".to_owned(), "serve.py".to_owned()]);
        assert_eq!(list.to_arg_list(), vec!["python", "serve.py"]);
    }

    #[test]
    fn test_template_defaults() {
        let template: Template = serde_json::from_value(json!({
            "id": "tpl-0123456789",
            "imageName": "runpod/pytorch:latest"
        }))
        .unwrap();

        assert_eq!(template.display_name(), "tpl-0123");
        assert_eq!(template.container_disk_gb(), DEFAULT_CONTAINER_DISK_GB);
        assert_eq!(template.port_spec().to_string(), DEFAULT_PORTS);
        assert!(template.startup_args().is_none());
    }

    #[test]
    fn test_template_startup_args_sources() {
        let template: Template = serde_json::from_value(json!({
            "id": "t1",
            "dockerArgs": "",
            "dockerStartCmd": ["jupyter", "lab"],
            "ports": ["8888/http"]
        }))
        .unwrap();

        assert_eq!(
            template.startup_args(),
            Some(StringOrList::List(vec!["jupyter".to_owned(), "lab".to_owned()]))
        );
        assert_eq!(template.port_spec().to_string(), "8888/http");
    }

    #[test]
    fn test_volume_menu_label() {
        let volume: Volume = serde_json::from_value(json!({
            "id": "vol1",
            "name": "datasets",
            "size": 100,
            "dataCenterId": "EU-RO-1"
        }))
        .unwrap();
        assert_eq!(volume.menu_label(), "datasets (100GB, EU-RO-1)");

        let bare: Volume = serde_json::from_value(json!({ "id": "vol-abcdefghij" })).unwrap();
        assert_eq!(bare.menu_label(), "vol-abcd (0GB, ?)");
    }

    #[test]
    fn test_create_request_omits_absent_fields() {
        let request = CreateInstanceRequest {
            name: "pod".to_owned(),
            image_name: "img".to_owned(),
            gpu_type_ids: vec!["NVIDIA L4".to_owned()],
            gpu_count: 1,
            container_disk_in_gb: 50,
            ports: vec!["22/tcp".to_owned()],
            template_id: "t1".to_owned(),
            docker_start_cmd: None,
            volume_in_gb: 20,
            network_volume_id: None,
            data_center_ids: None,
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["gpuTypeIds"], json!(["NVIDIA L4"]));
        assert_eq!(body["volumeInGb"], json!(20));
        assert!(body.get("networkVolumeId").is_none());
        assert!(body.get("dockerStartCmd").is_none());
        assert!(body.get("dataCenterIds").is_none());
    }

    #[test]
    fn test_created_instance_id_fallback() {
        assert_eq!(CreatedInstance::from_response(json!({ "id": "new1" })).id, "new1");
        assert_eq!(CreatedInstance::from_response(json!({})).id, "N/A");
    }
}
