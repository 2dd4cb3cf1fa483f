//! The create-instance conversation.
//!
//! Every step reads the session, checks that it is at the stage the button
//! belongs to, and writes the next stage back. A press that does not match
//! the stored stage (duplicate, out of order, or after a restart) is
//! answered with the session-expired message and leaves the session alone.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use teloxide::utils::html;
use tracing::{debug, info, warn};

use super::state::{
    PendingInstance, TemplateChoice, VolumeChoice, WizardStage, generate_instance_name,
};
use super::store::{SessionKey, SessionStore};
use crate::commands::{CallbackAction, CommandResult, Keyboard};
use crate::provider::{InstanceProvider, Volume};

/// Reply to a press with no matching session.
pub const SESSION_EXPIRED: &str = "Session expired. Please start again with /create.";

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Drives the four-step creation wizard.
pub struct CreateWizard {
    provider: Arc<dyn InstanceProvider>,
    store: Arc<dyn SessionStore>,
    gpus: Vec<String>,
    clock: fn() -> NaiveDateTime,
}

impl CreateWizard {
    #[must_use]
    pub fn new(
        provider: Arc<dyn InstanceProvider>,
        store: Arc<dyn SessionStore>,
        gpus: Vec<String>,
    ) -> Self {
        Self {
            provider,
            store,
            gpus,
            clock: local_now,
        }
    }

    /// Replaces the clock used for generated instance names.
    #[must_use]
    pub const fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Step 1: offers the saved templates.
    ///
    /// Any wizard already open for `key` is discarded first.
    pub async fn start(&self, key: SessionKey) -> CommandResult {
        self.store.clear(key).await;

        let templates = match self.provider.list_templates().await {
            Ok(templates) => templates,
            Err(e) => {
                warn!("Failed to list templates: {}", e);
                return CommandResult::error("Failed to load templates. Please try again later.");
            }
        };

        if templates.is_empty() {
            return CommandResult::error(
                "No templates found. Create a template in the RunPod console first.",
            );
        }

        let keyboard = templates
            .iter()
            .fold(Keyboard::new(), |kb, t| {
                kb.button(t.display_name(), CallbackAction::SelectTemplate(t.id.clone()))
            })
            .with_cancel();

        debug!("Offering {} templates to {:?}", templates.len(), key);
        self.store
            .set(key, WizardStage::AwaitingTemplate { templates })
            .await;

        CommandResult::success(format!(
            "{} (1/4)\n\nChoose a template:",
            html::bold("Create pod")
        ))
        .with_keyboard(keyboard)
    }

    /// Step 2: records the template and offers network volumes.
    pub async fn select_template(&self, key: SessionKey, template_id: &str) -> CommandResult {
        let Some(WizardStage::AwaitingTemplate { templates }) = self.store.get(key).await else {
            return CommandResult::error(SESSION_EXPIRED);
        };

        let Some(template) = templates.iter().find(|t| t.id == template_id) else {
            self.store.clear(key).await;
            return CommandResult::error(
                "Selected template not found. Please start again with /create.",
            );
        };
        let template = TemplateChoice::from(template);

        let volumes = match self.provider.list_volumes().await {
            Ok(volumes) => volumes,
            Err(e) => {
                warn!("Failed to list network volumes: {}", e);
                self.store.clear(key).await;
                return CommandResult::error(
                    "Failed to load network volumes. Please start again with /create.",
                );
            }
        };

        let header = format!("Template: {}", html::escape(&template.template_name));

        if volumes.is_empty() {
            self.store
                .set(key, WizardStage::AwaitingGpu { template, volume: None })
                .await;
            return self.gpu_menu(&format!("{header}\nNo network volumes found."));
        }

        let keyboard = volume_keyboard(&volumes);
        self.store
            .set(key, WizardStage::AwaitingVolume { template, volumes })
            .await;

        CommandResult::success(format!(
            "{header}\n\n{} (2/4)\n\nChoose a network volume:",
            html::bold("Create pod")
        ))
        .with_keyboard(keyboard)
    }

    /// Step 3: records the volume, or none, and offers the GPU list.
    pub async fn select_volume(&self, key: SessionKey, volume_id: Option<&str>) -> CommandResult {
        let Some(WizardStage::AwaitingVolume { template, volumes }) = self.store.get(key).await
        else {
            return CommandResult::error(SESSION_EXPIRED);
        };

        let volume = match volume_id {
            None => None,
            Some(id) => match volumes.iter().find(|v| v.id == id) {
                Some(v) => Some(VolumeChoice::from(v)),
                None => {
                    return CommandResult::error("Selected volume not found. Choose another one:")
                        .with_keyboard(volume_keyboard(&volumes));
                }
            },
        };

        let header = format!(
            "Template: {}\nNetwork volume: {}",
            html::escape(&template.template_name),
            html::escape(volume.as_ref().map_or("none", |v| v.name.as_str()))
        );

        self.store
            .set(key, WizardStage::AwaitingGpu { template, volume })
            .await;

        self.gpu_menu(&header)
    }

    /// Step 4: records the GPU and shows the summary.
    pub async fn select_gpu(&self, key: SessionKey, index: usize) -> CommandResult {
        let Some(WizardStage::AwaitingGpu { template, volume }) = self.store.get(key).await else {
            return CommandResult::error(SESSION_EXPIRED);
        };

        let Some(gpu_type) = self.gpus.get(index) else {
            return CommandResult::error("Invalid GPU selection. Choose one of:")
                .with_keyboard(self.gpu_keyboard());
        };

        let name = generate_instance_name(&template.template_name, (self.clock)());
        let pending = PendingInstance {
            template,
            volume,
            gpu_type: gpu_type.clone(),
            name,
        };

        let summary = pending.summary();
        self.store
            .set(key, WizardStage::AwaitingConfirm(pending))
            .await;

        CommandResult::success(summary).with_keyboard(
            Keyboard::new()
                .button("Create", CallbackAction::ConfirmCreate)
                .with_cancel(),
        )
    }

    /// Submits the creation request.
    ///
    /// The session is consumed before the provider is called, so a second
    /// confirm press finds nothing to submit.
    pub async fn confirm(&self, key: SessionKey) -> CommandResult {
        let pending = match self.store.take(key).await {
            Some(WizardStage::AwaitingConfirm(pending)) => pending,
            Some(other) => {
                self.store.set(key, other).await;
                return CommandResult::error(SESSION_EXPIRED);
            }
            None => return CommandResult::error(SESSION_EXPIRED),
        };

        info!(
            "Creating pod {} (template {}, GPU {})",
            pending.name, pending.template.template_id, pending.gpu_type
        );

        match self.provider.create_instance(&pending.to_request()).await {
            Ok(created) => {
                info!("Pod created: {}", created.id);
                CommandResult::success(format!(
                    "{}\n\nID: {}\nName: {}\n\n\
                     It may take a few minutes to start. Check with /status.",
                    html::bold("Pod created"),
                    html::code_inline(&created.id),
                    html::code_inline(&pending.name),
                ))
            }
            Err(e) => {
                warn!("Failed to create pod {}: {}", pending.name, e);
                CommandResult::error(format!(
                    "Failed to create the pod.\n\nError: {}",
                    html::escape(&e.user_detail())
                ))
            }
        }
    }

    /// Discards the session, whatever its stage.
    pub async fn cancel(&self, key: SessionKey) -> CommandResult {
        self.store.clear(key).await;
        CommandResult::success("Cancelled.")
    }

    fn gpu_keyboard(&self) -> Keyboard {
        self.gpus
            .iter()
            .enumerate()
            .fold(Keyboard::new(), |kb, (i, gpu)| {
                kb.button(gpu.clone(), CallbackAction::SelectGpu(i))
            })
            .with_cancel()
    }

    fn gpu_menu(&self, header: &str) -> CommandResult {
        CommandResult::success(format!(
            "{header}\n\n{} (3/4)\n\nChoose a GPU:",
            html::bold("Create pod")
        ))
        .with_keyboard(self.gpu_keyboard())
    }
}

fn volume_keyboard(volumes: &[Volume]) -> Keyboard {
    volumes
        .iter()
        .fold(Keyboard::new(), |kb, v| {
            kb.button(v.menu_label(), CallbackAction::SelectVolume(Some(v.id.clone())))
        })
        .button("No volume", CallbackAction::SelectVolume(None))
        .with_cancel()
}
