//! Command handler implementation.

use std::sync::Arc;

use teloxide::utils::html;
use tracing::{debug, info, warn};

use super::types::{BotCommand, CallbackAction, CommandResult, Keyboard, is_valid_instance_id};
use crate::config::AccessPolicy;
use crate::provider::{Instance, InstanceProvider};
use crate::report::{instance_list_report, running_report};
use crate::wizard::{CreateWizard, SessionKey};

/// Reply to anyone outside the allow-lists.
pub const ACCESS_DENIED: &str = "You are not authorized to use this bot.";

/// Reply to a malformed or tampered button payload.
pub const INVALID_REQUEST: &str = "Invalid request.";

const FETCH_FAILED: &str = "Failed to fetch pods. Please try again later.";

/// Who sent an update, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub chat_id: i64,
}

impl Caller {
    #[must_use]
    pub const fn new(user_id: i64, chat_id: i64) -> Self {
        Self { user_id, chat_id }
    }

    const fn session_key(self) -> SessionKey {
        SessionKey::new(self.chat_id, self.user_id)
    }
}

/// Routes commands and button presses to their handlers.
pub struct CommandHandler {
    /// Chat and user allow-lists checked before any command or button.
    access: AccessPolicy,

    /// Backend for listing, stopping and terminating pods.
    provider: Arc<dyn InstanceProvider>,

    /// Multi-step `/create` flow.
    wizard: CreateWizard,

    /// Polling interval quoted in the `/start` greeting.
    check_interval_minutes: u64,
}

impl CommandHandler {
    /// Creates a new command handler.
    #[must_use]
    pub fn new(
        access: AccessPolicy,
        provider: Arc<dyn InstanceProvider>,
        wizard: CreateWizard,
        check_interval_minutes: u64,
    ) -> Self {
        Self {
            access,
            provider,
            wizard,
            check_interval_minutes,
        }
    }

    fn authorize(&self, caller: Caller) -> bool {
        let allowed = self.access.authorize(caller.user_id, caller.chat_id);
        if !allowed {
            warn!(
                "Unauthorized access attempt: user={} chat={}",
                caller.user_id, caller.chat_id
            );
        }
        allowed
    }

    /// Tries to parse and execute a command from a message.
    ///
    /// Returns `None` if the message is not a command.
    pub async fn try_handle(&self, caller: Caller, message_text: &str) -> Option<CommandResult> {
        let command = BotCommand::parse(message_text)?;

        if !self.authorize(caller) {
            return Some(CommandResult::error(ACCESS_DENIED));
        }

        debug!("Handling command {} from user {}", command, caller.user_id);
        let result = self.execute(caller, command).await;
        info!("Command {} result: success={}", command, result.success);

        Some(result)
    }

    /// Executes a parsed command.
    async fn execute(&self, caller: Caller, command: BotCommand) -> CommandResult {
        match command {
            BotCommand::Start => self.handle_start(),
            BotCommand::Help => handle_help(),
            BotCommand::Status => self.handle_status().await,
            BotCommand::Pods => self.handle_pods().await,
            BotCommand::Create => self.wizard.start(caller.session_key()).await,
            BotCommand::Terminate => self.handle_terminate_menu().await,
            BotCommand::Stop => self.handle_stop_menu().await,
        }
    }

    fn handle_start(&self) -> CommandResult {
        CommandResult::success(format!(
            "{}\n\n\
             Pods are checked every {} minutes and reported here while any exist.\n\n\
             {}",
            html::bold("RunPod monitor bot"),
            self.check_interval_minutes,
            command_list()
        ))
    }

    async fn fetch_instances(&self) -> Result<Vec<Instance>, CommandResult> {
        self.provider.list_instances().await.map_err(|e| {
            warn!("Failed to list pods: {}", e);
            CommandResult::error(FETCH_FAILED)
        })
    }

    async fn handle_status(&self) -> CommandResult {
        match self.fetch_instances().await {
            Ok(instances) => CommandResult::success(running_report(&instances)),
            Err(result) => result,
        }
    }

    async fn handle_pods(&self) -> CommandResult {
        match self.fetch_instances().await {
            Ok(instances) => CommandResult::success(instance_list_report(&instances)),
            Err(result) => result,
        }
    }

    async fn handle_terminate_menu(&self) -> CommandResult {
        let instances = match self.fetch_instances().await {
            Ok(instances) => instances,
            Err(result) => return result,
        };

        if instances.is_empty() {
            return CommandResult::success("No pods to terminate.");
        }

        let keyboard = instances
            .iter()
            .fold(Keyboard::new(), |kb, i| {
                let status = i.desired_status.as_ref().map_or("?", |s| s.as_str());
                kb.button(
                    format!("[{status}] {}", i.short_label()),
                    CallbackAction::Terminate(i.id.clone()),
                )
            })
            .with_cancel();

        CommandResult::success(format!(
            "Choose a pod to terminate.\n{}",
            html::bold("Terminated pods are deleted and cannot be recovered.")
        ))
        .with_keyboard(keyboard)
    }

    async fn handle_stop_menu(&self) -> CommandResult {
        let instances = match self.fetch_instances().await {
            Ok(instances) => instances,
            Err(result) => return result,
        };

        let running: Vec<&Instance> = instances.iter().filter(|i| i.is_running()).collect();
        if running.is_empty() {
            return CommandResult::success("No running pods.");
        }

        let keyboard = running
            .iter()
            .fold(Keyboard::new(), |kb, i| {
                kb.button(
                    format!("Stop: {}", i.short_label()),
                    CallbackAction::Stop(i.id.clone()),
                )
            })
            .with_cancel();

        CommandResult::success("Choose a pod to stop. Its storage is kept.")
            .with_keyboard(keyboard)
    }

    /// Authorizes and decodes a button press.
    ///
    /// Terminate and stop targets are validated here, so an `Ok` action is
    /// safe to execute. `Err` carries the reply to show instead.
    pub fn prepare_callback(
        &self,
        caller: Caller,
        data: &str,
    ) -> Result<CallbackAction, CommandResult> {
        if !self.authorize(caller) {
            return Err(CommandResult::error(ACCESS_DENIED));
        }

        let Some(action) = CallbackAction::decode(data) else {
            warn!("Unknown callback payload from user {}: {:?}", caller.user_id, data);
            return Err(CommandResult::error(INVALID_REQUEST));
        };

        if let CallbackAction::Terminate(id) | CallbackAction::Stop(id) = &action {
            if !is_valid_instance_id(id) {
                warn!("Rejected pod id from user {}: {:?}", caller.user_id, id);
                return Err(CommandResult::error(INVALID_REQUEST));
            }
        }

        Ok(action)
    }

    /// Executes a prepared button action.
    pub async fn execute_callback(&self, caller: Caller, action: CallbackAction) -> CommandResult {
        let key = caller.session_key();
        debug!("Handling callback {:?} from user {}", action, caller.user_id);

        match action {
            CallbackAction::Cancel => self.wizard.cancel(key).await,
            CallbackAction::SelectTemplate(id) => self.wizard.select_template(key, &id).await,
            CallbackAction::SelectVolume(id) => self.wizard.select_volume(key, id.as_deref()).await,
            CallbackAction::SelectGpu(index) => self.wizard.select_gpu(key, index).await,
            CallbackAction::ConfirmCreate => self.wizard.confirm(key).await,
            CallbackAction::Terminate(id) => self.terminate(&id).await,
            CallbackAction::Stop(id) => self.stop(&id).await,
        }
    }

    /// Prepares and executes a button press in one step.
    pub async fn handle_callback(&self, caller: Caller, data: &str) -> CommandResult {
        match self.prepare_callback(caller, data) {
            Ok(action) => self.execute_callback(caller, action).await,
            Err(result) => result,
        }
    }

    async fn terminate(&self, id: &str) -> CommandResult {
        match self.provider.terminate_instance(id).await {
            Ok(()) => {
                info!("Pod {} terminated", id);
                CommandResult::success(format!(
                    "Pod {} terminated. Billing has stopped.",
                    html::code_inline(id)
                ))
            }
            Err(e) => {
                warn!("Failed to terminate pod {}: {}", id, e);
                CommandResult::error(format!(
                    "Failed to terminate pod {}. Please try again later.",
                    html::code_inline(id)
                ))
            }
        }
    }

    async fn stop(&self, id: &str) -> CommandResult {
        match self.provider.stop_instance(id).await {
            Ok(()) => {
                info!("Pod {} stopped", id);
                CommandResult::success(format!(
                    "Pod {} stopped. Storage charges still apply.",
                    html::code_inline(id)
                ))
            }
            Err(e) => {
                warn!("Failed to stop pod {}: {}", id, e);
                CommandResult::error(format!(
                    "Failed to stop pod {}. Please try again later.",
                    html::code_inline(id)
                ))
            }
        }
    }
}

fn command_list() -> String {
    BotCommand::all_commands()
        .iter()
        .map(|c| format!("{c} - {}", c.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn handle_help() -> CommandResult {
    CommandResult::success(format!("{}\n\n{}", html::bold("Commands"), command_list()))
}
