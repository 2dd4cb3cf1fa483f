//! In-memory provider used by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use super::client::{InstanceProvider, ProviderError};
use super::types::{CreateInstanceRequest, CreatedInstance, Instance, Template, Volume};

/// A provider call, as recorded by [`FakeProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListTemplates,
    ListVolumes,
    ListInstances,
    Create(String),
    Stop(String),
    Terminate(String),
}

/// Scriptable [`InstanceProvider`] that records every call.
#[derive(Debug, Default)]
pub struct FakeProvider {
    pub templates: Vec<Template>,
    pub volumes: Vec<Volume>,
    pub instances: Vec<Instance>,
    /// When set, every call fails with this HTTP status and message.
    pub failure: Option<(u16, String)>,
    calls: Mutex<Vec<Call>>,
    created: Mutex<Vec<CreateInstanceRequest>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_templates(mut self, templates: Vec<Template>) -> Self {
        self.templates = templates;
        self
    }

    #[must_use]
    pub fn with_volumes(mut self, volumes: Vec<Volume>) -> Self {
        self.volumes = volumes;
        self
    }

    #[must_use]
    pub fn with_instances(mut self, instances: Vec<Instance>) -> Self {
        self.instances = instances;
        self
    }

    pub fn failing(status: u16, message: &str) -> Self {
        Self {
            failure: Some((status, message.to_owned())),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created_requests(&self) -> Vec<CreateInstanceRequest> {
        self.created.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some((status, message)) => Err(ProviderError::Status {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl InstanceProvider for FakeProvider {
    async fn list_templates(&self) -> Result<Vec<Template>, ProviderError> {
        self.record(Call::ListTemplates)?;
        Ok(self.templates.clone())
    }

    async fn list_volumes(&self) -> Result<Vec<Volume>, ProviderError> {
        self.record(Call::ListVolumes)?;
        Ok(self.volumes.clone())
    }

    async fn list_instances(&self) -> Result<Vec<Instance>, ProviderError> {
        self.record(Call::ListInstances)?;
        Ok(self.instances.clone())
    }

    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
    ) -> Result<CreatedInstance, ProviderError> {
        self.record(Call::Create(request.name.clone()))?;
        self.created.lock().unwrap().push(request.clone());
        Ok(CreatedInstance::from_response(json!({ "id": "new-pod-1" })))
    }

    async fn stop_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.record(Call::Stop(instance_id.to_owned()))
    }

    async fn terminate_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.record(Call::Terminate(instance_id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::InstanceStatus;

    #[tokio::test]
    async fn test_builders_seed_listings() {
        let provider = FakeProvider::new()
            .with_instances(vec![Instance::new("p1", "a", InstanceStatus::Running, 1.0)])
            .with_volumes(Vec::new());

        assert_eq!(provider.list_instances().await.unwrap().len(), 1);
        assert!(provider.list_volumes().await.unwrap().is_empty());
        assert!(provider.list_templates().await.unwrap().is_empty());
        assert_eq!(
            provider.calls(),
            vec![Call::ListInstances, Call::ListVolumes, Call::ListTemplates]
        );
    }
}
