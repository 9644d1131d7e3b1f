//! Carbon footprint state: entries, dashboard, roadmap, goals and factors.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use super::{ActionResult, Feedback, Resource, load, report, succeed};
use crate::emissions::{self, Estimate, LocalSummary};
use crate::notify::Notifier;
use crate::services::carbon::CarbonService;
use crate::types::{CarbonEntry, CarbonEntryInput, Dashboard, EmissionFactor, Goal, GoalInput, Roadmap};
use crate::validation;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CarbonState {
    pub entries: Resource<Vec<CarbonEntry>>,
    pub dashboard: Resource<Option<Dashboard>>,
    pub roadmap: Resource<Option<Roadmap>>,
    pub goals: Resource<Vec<Goal>>,
    pub factors: Resource<Vec<EmissionFactor>>,
}

#[derive(Clone)]
pub struct CarbonStore {
    service: CarbonService,
    notifier: Notifier,
    state: Arc<RwLock<CarbonState>>,
}

impl CarbonStore {
    #[must_use]
    pub fn new(service: CarbonService, notifier: Notifier) -> Self {
        Self { service, notifier, state: Arc::default() }
    }

    pub async fn snapshot(&self) -> CarbonState {
        self.state.read().await.clone()
    }

    // =========================================================================
    // LOADS
    // =========================================================================

    pub async fn load_entries(&self) -> ActionResult {
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.entries, self.service.list_entries()).await
    }

    pub async fn load_dashboard(&self) -> ActionResult {
        let fetch = async { self.service.dashboard().await.map(Some) };
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.dashboard, fetch).await
    }

    pub async fn load_roadmap(&self) -> ActionResult {
        let fetch = async { self.service.roadmap().await.map(Some) };
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.roadmap, fetch).await
    }

    pub async fn load_goals(&self) -> ActionResult {
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.goals, self.service.goals()).await
    }

    pub async fn load_factors(&self) -> ActionResult {
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.factors, self.service.emission_factors()).await
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Record a new entry. The quantity is checked locally first; the
    /// dashboard is stale afterwards and should be reloaded by the caller.
    pub async fn add_entry(&self, input: &CarbonEntryInput) -> ActionResult {
        if let Err(e) = validation::validate_carbon_quantity(input.quantity) {
            return report(&self.notifier, &e);
        }
        match self.service.create_entry(input).await {
            Ok(entry) => {
                let kg = if entry.emissions > 0.0 {
                    entry.emissions
                } else {
                    emissions::estimate(&input.entry_type, input.quantity).emissions_kg
                };
                self.state.write().await.entries.data.insert(0, entry);
                succeed(&self.notifier, format!("Entry added ({kg:.2} kg CO2e)."))
            }
            Err(e) => report(&self.notifier, &e),
        }
    }

    pub async fn update_entry(&self, id: &str, input: &CarbonEntryInput) -> ActionResult {
        if let Err(e) = validation::validate_carbon_quantity(input.quantity) {
            return report(&self.notifier, &e);
        }
        match self.service.update_entry(id, input).await {
            Ok(updated) => {
                let mut state = self.state.write().await;
                if let Some(slot) = state.entries.data.iter_mut().find(|e| e.id == id) {
                    *slot = updated;
                }
                drop(state);
                succeed(&self.notifier, "Entry updated.")
            }
            Err(e) => report(&self.notifier, &e),
        }
    }

    pub async fn delete_entry(&self, id: &str) -> ActionResult {
        match self.service.delete_entry(id).await {
            Ok(()) => {
                self.state.write().await.entries.data.retain(|e| e.id != id);
                succeed(&self.notifier, "Entry deleted.")
            }
            Err(e) => report(&self.notifier, &e),
        }
    }

    pub async fn add_goal(&self, input: &GoalInput) -> ActionResult {
        match self.service.create_goal(input).await {
            Ok(goal) => {
                self.state.write().await.goals.data.push(goal);
                succeed(&self.notifier, "Goal created.")
            }
            Err(e) => report(&self.notifier, &e),
        }
    }

    // =========================================================================
    // LOCAL
    // =========================================================================

    /// Form preview using the built-in factors; no request is made.
    #[must_use]
    pub fn preview(entry_type: &str, quantity: f64) -> Estimate {
        emissions::estimate(entry_type, quantity)
    }

    /// Totals over the loaded entries, for use before the dashboard arrives.
    pub async fn local_summary(&self) -> LocalSummary {
        emissions::summarize(&self.state.read().await.entries.data)
    }
}

#[cfg(test)]
#[path = "carbon_test.rs"]
mod tests;
