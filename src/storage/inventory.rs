//! JSON File Inventory
//!
//! Serves campaign and account snapshots from a JSON file. The file holds
//! either a plain array of entities (shared by every user) or an object
//! mapping user ids to arrays.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ads_copilot_core::{CoreError, CoreResult, InventoryAccessor, InventoryEntity};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InventoryFile {
    Shared(Vec<InventoryEntity>),
    PerUser(HashMap<String, Vec<InventoryEntity>>),
}

/// Inventory accessor backed by a JSON file, re-read on every call.
#[derive(Debug, Clone)]
pub struct JsonFileInventory {
    path: PathBuf,
}

impl JsonFileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl InventoryAccessor for JsonFileInventory {
    async fn list_entities(&self, user_id: &str) -> CoreResult<Vec<InventoryEntity>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CoreError::service(format!("cannot read inventory {}: {e}", self.path.display()))
        })?;
        let file: InventoryFile = serde_json::from_str(&raw)?;

        let entities = match file {
            InventoryFile::Shared(entities) => entities,
            InventoryFile::PerUser(mut by_user) => by_user.remove(user_id).unwrap_or_default(),
        };
        debug!(user_id, count = entities.len(), "inventory: loaded snapshot");
        Ok(entities)
    }
}
