//! Command, button and reply types.

use std::fmt;

use teloxide::utils::html;

/// Available bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// Show the welcome message.
    Start,

    /// Show help information.
    Help,

    /// Show running instances.
    Status,

    /// Show every instance.
    Pods,

    /// Start the instance creation wizard.
    Create,

    /// Offer instances to terminate.
    Terminate,

    /// Offer running instances to stop.
    Stop,
}

impl BotCommand {
    /// Parses a command from a message text.
    ///
    /// Accepts `/name` and `/name@botname`, ignoring case and trailing
    /// arguments. Returns `None` if the message is not a known command.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let command = text.trim().strip_prefix('/')?;
        let command = command.split_whitespace().next()?;
        let command = command.split_once('@').map_or(command, |(name, _bot)| name);

        match command.to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "status" => Some(Self::Status),
            "pods" => Some(Self::Pods),
            "create" => Some(Self::Create),
            "terminate" => Some(Self::Terminate),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Status => "status",
            Self::Pods => "pods",
            Self::Create => "create",
            Self::Terminate => "terminate",
            Self::Stop => "stop",
        }
    }

    /// Returns the command description for help.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Start => "Show the welcome message",
            Self::Help => "Show this help message",
            Self::Status => "Show running pods",
            Self::Pods => "List all pods",
            Self::Create => "Create a new pod (template, volume, GPU)",
            Self::Terminate => "Terminate a pod (deletes it, stops billing)",
            Self::Stop => "Stop a pod (keeps its storage)",
        }
    }

    /// Returns all available commands in menu order.
    #[must_use]
    pub const fn all_commands() -> [Self; 7] {
        [
            Self::Status,
            Self::Pods,
            Self::Create,
            Self::Terminate,
            Self::Stop,
            Self::Help,
            Self::Start,
        ]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

/// Action carried by an inline button, encoded as `<prefix>_<id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Abort the current menu or wizard.
    Cancel,

    /// Wizard step 1: a template was chosen.
    SelectTemplate(String),

    /// Wizard step 2: a volume was chosen, or `None` for no volume.
    SelectVolume(Option<String>),

    /// Wizard step 3: index into the preferred GPU list.
    SelectGpu(usize),

    /// Wizard step 4: create the instance.
    ConfirmCreate,

    /// Terminate the instance with this id.
    Terminate(String),

    /// Stop the instance with this id.
    Stop(String),
}

const CANCEL: &str = "cancel";
const CONFIRM_CREATE: &str = "crconfirm";
const TEMPLATE_PREFIX: &str = "crtpl_";
const VOLUME_PREFIX: &str = "crvol_";
const NO_VOLUME: &str = "none";
const GPU_PREFIX: &str = "crgpu_";
const TERMINATE_PREFIX: &str = "terminate_";
const STOP_PREFIX: &str = "stop_";

impl CallbackAction {
    /// Encodes the action as callback data.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Cancel => CANCEL.to_owned(),
            Self::SelectTemplate(id) => format!("{TEMPLATE_PREFIX}{id}"),
            Self::SelectVolume(Some(id)) => format!("{VOLUME_PREFIX}{id}"),
            Self::SelectVolume(None) => format!("{VOLUME_PREFIX}{NO_VOLUME}"),
            Self::SelectGpu(index) => format!("{GPU_PREFIX}{index}"),
            Self::ConfirmCreate => CONFIRM_CREATE.to_owned(),
            Self::Terminate(id) => format!("{TERMINATE_PREFIX}{id}"),
            Self::Stop(id) => format!("{STOP_PREFIX}{id}"),
        }
    }

    /// Decodes callback data. Returns `None` for unknown or malformed payloads.
    ///
    /// Ids are returned verbatim; validating them is up to the caller.
    #[must_use]
    pub fn decode(data: &str) -> Option<Self> {
        match data {
            CANCEL => return Some(Self::Cancel),
            CONFIRM_CREATE => return Some(Self::ConfirmCreate),
            _ => {}
        }

        if let Some(id) = data.strip_prefix(TEMPLATE_PREFIX) {
            return Some(Self::SelectTemplate(id.to_owned()));
        }
        if let Some(id) = data.strip_prefix(VOLUME_PREFIX) {
            let volume = (id != NO_VOLUME).then(|| id.to_owned());
            return Some(Self::SelectVolume(volume));
        }
        if let Some(index) = data.strip_prefix(GPU_PREFIX) {
            return index.parse().ok().map(Self::SelectGpu);
        }
        if let Some(id) = data.strip_prefix(TERMINATE_PREFIX) {
            return Some(Self::Terminate(id.to_owned()));
        }
        if let Some(id) = data.strip_prefix(STOP_PREFIX) {
            return Some(Self::Stop(id.to_owned()));
        }

        None
    }

    /// Interim text shown while a slow action runs.
    ///
    /// Returns `None` for actions that answer immediately.
    #[must_use]
    pub fn progress_text(&self) -> Option<String> {
        match self {
            Self::ConfirmCreate => Some("Creating pod...".to_owned()),
            Self::Terminate(id) => Some(format!("Terminating pod {}...", html::code_inline(id))),
            Self::Stop(id) => Some(format!("Stopping pod {}...", html::code_inline(id))),
            _ => None,
        }
    }
}

/// Returns true if `id` is safe to pass to the provider as an instance id.
#[must_use]
pub fn is_valid_instance_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// A single inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: CallbackAction,
}

/// Inline keyboard, one button per row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Creates an empty keyboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row holding one button.
    #[must_use]
    pub fn button(mut self, label: impl Into<String>, action: CallbackAction) -> Self {
        self.rows.push(vec![Button {
            label: label.into(),
            action,
        }]);
        self
    }

    /// Appends the cancel button.
    #[must_use]
    pub fn with_cancel(self) -> Self {
        self.button("Cancel", CallbackAction::Cancel)
    }

    /// Returns the button rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Button>] {
        &self.rows
    }

    /// Iterates over every button's action.
    pub fn actions(&self) -> impl Iterator<Item = &CallbackAction> {
        self.rows.iter().flatten().map(|b| &b.action)
    }
}

/// Result of handling a command or button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message to show the user (Telegram HTML).
    pub message: String,

    /// Buttons to attach to the response.
    pub keyboard: Option<Keyboard>,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            keyboard: None,
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            keyboard: None,
        }
    }

    /// Attaches an inline keyboard.
    #[must_use]
    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}
