//! Wizard stages and the data each one carries.

use chrono::NaiveDateTime;
use teloxide::utils::html;

use crate::provider::{CreateInstanceRequest, StringOrList, Template, Volume};

/// Longest template-name prefix used in generated instance names.
const NAME_PREFIX_CHARS: usize = 20;

/// Container volume allocated when no network volume is attached.
pub const DEFAULT_VOLUME_GB: u32 = 20;

/// Template fields copied into the session at step 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateChoice {
    pub template_id: String,
    pub template_name: String,
    pub image_name: String,
    pub startup_args: Option<StringOrList>,
    pub container_disk_gb: u32,
    pub ports: StringOrList,
}

impl From<&Template> for TemplateChoice {
    fn from(template: &Template) -> Self {
        Self {
            template_id: template.id.clone(),
            template_name: template.display_name(),
            image_name: template.image_name.clone().unwrap_or_default(),
            startup_args: template.startup_args(),
            container_disk_gb: template.container_disk_gb(),
            ports: template.port_spec(),
        }
    }
}

/// Network volume chosen at step 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeChoice {
    pub id: String,
    pub name: String,
    pub data_center_id: Option<String>,
}

impl From<&Volume> for VolumeChoice {
    fn from(volume: &Volume) -> Self {
        Self {
            id: volume.id.clone(),
            name: volume.display_name(),
            data_center_id: volume.data_center_id.clone().filter(|dc| !dc.is_empty()),
        }
    }
}

/// Everything needed to submit the creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInstance {
    pub template: TemplateChoice,
    pub volume: Option<VolumeChoice>,
    pub gpu_type: String,
    pub name: String,
}

impl PendingInstance {
    /// Builds the `POST /pods` body.
    #[must_use]
    pub fn to_request(&self) -> CreateInstanceRequest {
        let docker_start_cmd = self
            .template
            .startup_args
            .as_ref()
            .map(StringOrList::to_arg_list)
            .filter(|args| !args.is_empty());

        let (volume_in_gb, network_volume_id, data_center_ids) = match &self.volume {
            Some(volume) => (
                0,
                Some(volume.id.clone()),
                volume.data_center_id.clone().map(|dc| vec![dc]),
            ),
            None => (DEFAULT_VOLUME_GB, None, None),
        };

        CreateInstanceRequest {
            name: self.name.clone(),
            image_name: self.template.image_name.clone(),
            gpu_type_ids: vec![self.gpu_type.clone()],
            gpu_count: 1,
            container_disk_in_gb: self.template.container_disk_gb,
            ports: self.template.ports.to_port_list(),
            template_id: self.template.template_id.clone(),
            docker_start_cmd,
            volume_in_gb,
            network_volume_id,
            data_center_ids,
        }
    }

    /// Confirmation text shown before submitting.
    #[must_use]
    pub fn summary(&self) -> String {
        let volume = self.volume.as_ref().map_or("none", |v| v.name.as_str());

        format!(
            "{}\n\n\
             Name: {}\n\
             Template: {}\n\
             GPU: {}\n\
             Network volume: {}\n\
             Container disk: {}GB\n\
             Ports: {}\n\n\
             Create this pod?",
            html::bold("Confirm pod creation"),
            html::code_inline(&self.name),
            html::escape(&self.template.template_name),
            html::escape(&self.gpu_type),
            html::escape(volume),
            self.template.container_disk_gb,
            html::escape(&self.template.ports.to_string()),
        )
    }
}

/// Where a creation wizard currently stands.
///
/// Each stage carries only the data collected so far, so later steps can
/// never read a field an earlier step did not set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardStage {
    /// Templates were offered; the records are cached in menu order.
    AwaitingTemplate { templates: Vec<Template> },

    /// Volumes were offered; the records are cached in menu order.
    AwaitingVolume {
        template: TemplateChoice,
        volumes: Vec<Volume>,
    },

    /// The GPU list was offered.
    AwaitingGpu {
        template: TemplateChoice,
        volume: Option<VolumeChoice>,
    },

    /// The summary was shown; waiting for confirm or cancel.
    AwaitingConfirm(PendingInstance),
}

impl WizardStage {
    /// Short stage name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AwaitingTemplate { .. } => "awaiting_template",
            Self::AwaitingVolume { .. } => "awaiting_volume",
            Self::AwaitingGpu { .. } => "awaiting_gpu",
            Self::AwaitingConfirm(_) => "awaiting_confirm",
        }
    }
}

/// Derives an instance name from the template name and a timestamp.
///
/// The template name is cut to 20 characters, whitespace becomes `-`,
/// and `-MMDD-HHMM` is appended.
#[must_use]
pub fn generate_instance_name(template_name: &str, now: NaiveDateTime) -> String {
    let prefix: String = template_name
        .chars()
        .take(NAME_PREFIX_CHARS)
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();

    format!("{prefix}-{}", now.format("%m%d-%H%M"))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn template_choice() -> TemplateChoice {
        TemplateChoice {
            template_id: "tpl1".to_owned(),
            template_name: "PyTorch".to_owned(),
            image_name: "runpod/pytorch:2.1".to_owned(),
            startup_args: Some(StringOrList::Text("bash start.sh".to_owned())),
            container_disk_gb: 40,
            ports: StringOrList::Text("8888/http, 22/tcp".to_owned()),
        }
    }

    #[test]
    fn test_generate_instance_name_basic() {
        assert_eq!(generate_instance_name("PyTorch", at(1, 15, 10, 30)), "PyTorch-0115-1030");
    }

    #[test]
    fn test_generate_instance_name_replaces_whitespace() {
        let name = generate_instance_name("My\tGPU Template", at(12, 1, 0, 5));
        assert_eq!(name, "My-GPU-Template-1201-0005");
        assert!(!name.chars().any(char::is_whitespace));
    }

    #[test]
    fn test_generate_instance_name_truncates() {
        let name = generate_instance_name("A very long template name indeed", at(3, 7, 9, 5));
        assert_eq!(name, "A-very-long-template-0307-0905");
    }

    #[test]
    fn test_generate_instance_name_unicode_and_empty() {
        assert_eq!(generate_instance_name("", at(3, 7, 9, 5)), "-0307-0905");
        let name = generate_instance_name(&"가".repeat(30), at(3, 7, 9, 5));
        assert_eq!(name.chars().count(), 20 + "-0307-0905".len());
    }

    #[test]
    fn test_request_without_volume() {
        let pending = PendingInstance {
            template: template_choice(),
            volume: None,
            gpu_type: "NVIDIA RTX A4500".to_owned(),
            name: "PyTorch-0115-1030".to_owned(),
        };

        let request = pending.to_request();
        assert_eq!(request.gpu_count, 1);
        assert_eq!(request.gpu_type_ids, vec!["NVIDIA RTX A4500"]);
        assert_eq!(request.ports, vec!["8888/http", "22/tcp"]);
        assert_eq!(request.docker_start_cmd, Some(vec!["bash".to_owned(), "start.sh".to_owned()]));
        assert_eq!(request.volume_in_gb, DEFAULT_VOLUME_GB);
        assert_eq!(request.network_volume_id, None);
        assert_eq!(request.data_center_ids, None);
        assert_eq!(request.container_disk_in_gb, 40);
        assert_eq!(request.template_id, "tpl1");
    }

    #[test]
    fn test_request_with_volume() {
        let pending = PendingInstance {
            template: TemplateChoice {
                startup_args: None,
                ports: StringOrList::List(vec!["8080/http".to_owned()]),
                ..template_choice()
            },
            volume: Some(VolumeChoice {
                id: "vol1".to_owned(),
                name: "datasets".to_owned(),
                data_center_id: Some("EU-RO-1".to_owned()),
            }),
            gpu_type: "NVIDIA A100 80GB PCIe".to_owned(),
            name: "x".to_owned(),
        };

        let request = pending.to_request();
        assert_eq!(request.volume_in_gb, 0);
        assert_eq!(request.network_volume_id.as_deref(), Some("vol1"));
        assert_eq!(request.data_center_ids, Some(vec!["EU-RO-1".to_owned()]));
        assert_eq!(request.ports, vec!["8080/http"]);
        assert_eq!(request.docker_start_cmd, None);
    }

    #[test]
    fn test_request_with_volume_without_location() {
        let pending = PendingInstance {
            template: template_choice(),
            volume: Some(VolumeChoice {
                id: "vol2".to_owned(),
                name: "vol2".to_owned(),
                data_center_id: None,
            }),
            gpu_type: "NVIDIA L4".to_owned(),
            name: "x".to_owned(),
        };

        let request = pending.to_request();
        assert_eq!(request.volume_in_gb, 0);
        assert_eq!(request.network_volume_id.as_deref(), Some("vol2"));
        assert_eq!(request.data_center_ids, None);
    }

    #[test]
    fn test_summary_lists_choices() {
        let pending = PendingInstance {
            template: template_choice(),
            volume: None,
            gpu_type: "NVIDIA RTX A4500".to_owned(),
            name: "PyTorch-0115-1030".to_owned(),
        };

        let summary = pending.summary();
        assert!(summary.contains("Name: <code>PyTorch-0115-1030</code>"));
        assert!(summary.contains("Template: PyTorch"));
        assert!(summary.contains("GPU: NVIDIA RTX A4500"));
        assert!(summary.contains("Network volume: none"));
        assert!(summary.contains("Container disk: 40GB"));
        assert!(summary.contains("Ports: 8888/http, 22/tcp"));
    }
}
