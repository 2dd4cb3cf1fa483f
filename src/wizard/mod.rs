//! Create-instance wizard.
//!
//! Template, network volume, GPU, then confirm. Each stage is a variant of
//! [`WizardStage`] held in a [`SessionStore`] keyed by chat and user.

mod flow;
mod state;
mod store;

pub use flow::{CreateWizard, SESSION_EXPIRED};
pub use state::{
    DEFAULT_VOLUME_GB, PendingInstance, TemplateChoice, VolumeChoice, WizardStage,
    generate_instance_name,
};
pub use store::{InMemorySessionStore, SessionKey, SessionStore};
