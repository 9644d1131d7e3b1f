//! Organization directory and connections between organizations.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use super::{ActionResult, Feedback, Resource, load, report, succeed};
use crate::notify::Notifier;
use crate::services::organizations::OrganizationService;
use crate::types::{Conversation, Organization, SustainabilityLevel, User};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrganizationState {
    pub organizations: Resource<Vec<Organization>>,
    pub selected: Resource<Option<Organization>>,
    pub members: Resource<Vec<User>>,
    /// Conversation opened by the last successful `connect`.
    pub connection: Option<Conversation>,
}

impl OrganizationState {
    /// Case-insensitive name/industry/location filter, optionally by level.
    #[must_use]
    pub fn filter(&self, text: &str, level: Option<SustainabilityLevel>) -> Vec<&Organization> {
        let needle = text.trim().to_lowercase();
        self.organizations
            .data
            .iter()
            .filter(|o| level.is_none_or(|l| o.sustainability_level == l))
            .filter(|o| {
                needle.is_empty()
                    || [Some(&o.name), o.industry.as_ref(), o.location.as_ref()]
                        .into_iter()
                        .flatten()
                        .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct OrganizationStore {
    service: OrganizationService,
    notifier: Notifier,
    state: Arc<RwLock<OrganizationState>>,
}

impl OrganizationStore {
    #[must_use]
    pub fn new(service: OrganizationService, notifier: Notifier) -> Self {
        Self { service, notifier, state: Arc::default() }
    }

    pub async fn snapshot(&self) -> OrganizationState {
        self.state.read().await.clone()
    }

    pub async fn load_organizations(&self) -> ActionResult {
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.organizations, self.service.list()).await
    }

    pub async fn open(&self, id: &str) -> ActionResult {
        let fetch = async { self.service.get(id).await.map(Some) };
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.selected, fetch).await
    }

    pub async fn load_members(&self, id: &str) -> ActionResult {
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.members, self.service.users(id)).await
    }

    /// Open a conversation with the organization's members.
    pub async fn connect(&self, id: &str) -> ActionResult {
        match self.service.connect(id).await {
            Ok(conversation) => {
                let mut state = self.state.write().await;
                let name = state
                    .organizations
                    .data
                    .iter()
                    .chain(state.selected.data.iter())
                    .find(|o| o.id == id)
                    .map_or_else(|| "the organization".to_owned(), |o| o.name.clone());
                state.connection = Some(conversation);
                drop(state);
                succeed(&self.notifier, format!("Connected with {name}."))
            }
            Err(e) => report(&self.notifier, &e),
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::*;
    use crate::test_helpers::{StubTransport, client_with};

    fn store(stub: &Arc<StubTransport>) -> OrganizationStore {
        OrganizationStore::new(OrganizationService::new(client_with(stub.clone())), Notifier::new())
    }

    #[tokio::test]
    async fn connect_records_conversation_and_names_the_organization() {
        let stub = StubTransport::new();
        stub.respond(Method::GET, "/organizations", 200, json!([{ "_id": "o1", "name": "GreenCo" }]));
        stub.respond(Method::POST, "/organizations/o1/connect", 201, json!({ "_id": "c5" }));
        let orgs = store(&stub);

        orgs.load_organizations().await;
        let result = orgs.connect("o1").await;
        assert_eq!(result.message.as_deref(), Some("Connected with GreenCo."));
        assert_eq!(orgs.snapshot().await.connection.map(|c| c.id), Some("c5".to_owned()));
    }

    #[tokio::test]
    async fn filter_matches_text_and_level() {
        let stub = StubTransport::new();
        stub.respond(
            Method::GET,
            "/organizations",
            200,
            json!([
                { "_id": "o1", "name": "GreenCo", "industry": "Retail", "sustainabilityLevel": 2 },
                { "_id": "o2", "name": "Blue Ltd", "location": "Greenwich", "sustainabilityLevel": 1 },
                { "_id": "o3", "name": "Acme", "industry": "Steel" }
            ]),
        );
        let orgs = store(&stub);
        orgs.load_organizations().await;
        let state = orgs.snapshot().await;

        let ids = |found: Vec<&Organization>| found.into_iter().map(|o| o.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(state.filter("green", None)), vec!["o1", "o2"]);
        assert_eq!(ids(state.filter("green", Some(SustainabilityLevel::Foundation))), vec!["o2"]);
        assert_eq!(ids(state.filter("", None)).len(), 3);
    }

    #[tokio::test]
    async fn members_come_from_nested_path() {
        let stub = StubTransport::new();
        stub.respond(Method::GET, "/organizations/o1/users", 200, json!({ "data": [{ "_id": "u1", "name": "Ada" }] }));
        let orgs = store(&stub);

        assert!(orgs.load_members("o1").await.success);
        assert_eq!(orgs.snapshot().await.members.data[0].name, "Ada");
    }
}
