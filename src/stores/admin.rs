//! Admin back-office state.
//!
//! Records are raw JSON per resource. Writes are serialized through the
//! request queue by `AdminService`, so a burst of edits resolves one at a
//! time; `pending()` exposes the backlog for progress display.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{ActionResult, Feedback, Resource, load, report, succeed};
use crate::notify::Notifier;
use crate::services::admin::{AdminResource, AdminService};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdminState {
    pub records: HashMap<String, Resource<Vec<Value>>>,
}

impl AdminState {
    #[must_use]
    pub fn records(&self, resource: AdminResource) -> &[Value] {
        self.records
            .get(resource.as_str())
            .map_or(&[], |r| r.data.as_slice())
    }
}

#[derive(Clone)]
pub struct AdminStore {
    service: AdminService,
    notifier: Notifier,
    state: Arc<RwLock<AdminState>>,
}

impl AdminStore {
    #[must_use]
    pub fn new(service: AdminService, notifier: Notifier) -> Self {
        Self { service, notifier, state: Arc::default() }
    }

    pub async fn snapshot(&self) -> AdminState {
        self.state.read().await.clone()
    }

    /// Writes waiting in (or running on) the request queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.service.queue().pending()
    }

    pub async fn load_records(&self, resource: AdminResource) -> ActionResult {
        load(
            &self.state,
            &self.notifier,
            Feedback::Toast,
            |s| s.records.entry(resource.as_str().to_owned()).or_default(),
            self.service.list(resource),
        )
        .await
    }

    pub async fn create(&self, resource: AdminResource, record: Value) -> ActionResult {
        match self.service.create(resource, record).await {
            Ok(created) => {
                self.slot(resource, |records| records.push(created)).await;
                succeed(&self.notifier, format!("Created {} record.", resource.singular()))
            }
            Err(e) => report(&self.notifier, &e),
        }
    }

    pub async fn update(&self, resource: AdminResource, id: &str, record: Value) -> ActionResult {
        match self.service.update(resource, id, record).await {
            Ok(updated) => {
                self.slot(resource, |records| {
                    if let Some(existing) = records.iter_mut().find(|r| record_id(r) == Some(id)) {
                        *existing = updated;
                    }
                })
                .await;
                succeed(&self.notifier, format!("Updated {} record.", resource.singular()))
            }
            Err(e) => report(&self.notifier, &e),
        }
    }

    pub async fn delete(&self, resource: AdminResource, id: &str) -> ActionResult {
        match self.service.delete(resource, id).await {
            Ok(()) => {
                self.slot(resource, |records| records.retain(|r| record_id(r) != Some(id)))
                    .await;
                succeed(&self.notifier, format!("Deleted {} record.", resource.singular()))
            }
            Err(e) => report(&self.notifier, &e),
        }
    }

    async fn slot(&self, resource: AdminResource, edit: impl FnOnce(&mut Vec<Value>)) {
        let mut state = self.state.write().await;
        let entry = state
            .records
            .entry(resource.as_str().to_owned())
            .or_default();
        edit(&mut entry.data);
    }
}

/// `_id` or `id` of a raw record.
fn record_id(record: &Value) -> Option<&str> {
    record
        .get("_id")
        .or_else(|| record.get("id"))
        .and_then(Value::as_str)
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
