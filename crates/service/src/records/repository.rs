use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ServiceError;

use super::model::Record;

/// Trait abstraction the HTTP layer talks to.
/// Bodies arrive as parsed JSON and are validated by the implementation.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn list_names(&self) -> Vec<String>;
    async fn all_records(&self) -> Vec<Record>;
    async fn add(&self, body: Value) -> Result<(), ServiceError>;
    async fn get(&self, name: &str) -> Result<Record, ServiceError>;
    async fn update(&self, name: &str, body: Value) -> Result<(), ServiceError>;
    async fn delete(&self, name: &str) -> Result<(), ServiceError>;
}
