//! Wire DTOs mirroring the backend's JSON.
//!
//! DESIGN
//! ======
//! The backend owns every entity's lifecycle and validation; these types only
//! mirror what it sends. Every struct defaults missing fields so a partial
//! payload still decodes, ids accept Mongo-style `_id`, and numeric fields
//! tolerate numbers encoded as strings.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// SUSTAINABILITY LEVEL
// =============================================================================

/// Three-tier progression for organizations and courses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SustainabilityLevel {
    #[default]
    Foundation,
    Efficiency,
    Transformation,
}

impl SustainabilityLevel {
    /// Map a tier number; anything outside `1..=3` is `Foundation`.
    #[must_use]
    pub fn from_tier(tier: i64) -> Self {
        match tier {
            2 => Self::Efficiency,
            3 => Self::Transformation,
            _ => Self::Foundation,
        }
    }

    #[must_use]
    pub fn tier(self) -> u8 {
        match self {
            Self::Foundation => 1,
            Self::Efficiency => 2,
            Self::Transformation => 3,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Foundation => "Foundation",
            Self::Efficiency => "Efficiency",
            Self::Transformation => "Transformation",
        }
    }
}

impl std::fmt::Display for SustainabilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Level {} ({})", self.tier(), self.label())
    }
}

impl Serialize for SustainabilityLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.tier())
    }
}

impl<'de> Deserialize<'de> for SustainabilityLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let level = match value {
            serde_json::Value::Number(n) => Self::from_tier(n.as_i64().unwrap_or(1)),
            serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "2" | "efficiency" => Self::Efficiency,
                "3" | "transformation" => Self::Transformation,
                _ => Self::Foundation,
            },
            _ => Self::Foundation,
        };
        Ok(level)
    }
}

// =============================================================================
// USERS & ORGANIZATIONS
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub organization_id: Option<String>,
    pub avatar_url: Option<String>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Organization {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub sustainability_level: SustainabilityLevel,
    #[serde(deserialize_with = "deserialize_u32_lenient")]
    pub member_count: u32,
}

// =============================================================================
// CARBON
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarbonEntry {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "type", alias = "category")]
    pub entry_type: String,
    #[serde(deserialize_with = "deserialize_f64_lenient")]
    pub quantity: f64,
    pub unit: String,
    /// kg CO2e as computed by the backend.
    #[serde(deserialize_with = "deserialize_f64_lenient")]
    pub emissions: f64,
    pub date: String,
    pub description: Option<String>,
    pub scope: Option<u8>,
}

/// Body for creating or updating a carbon entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarbonEntryInput {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub quantity: f64,
    pub unit: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmissionFactor {
    #[serde(alias = "_id")]
    pub id: String,
    pub category: String,
    pub unit: String,
    #[serde(deserialize_with = "deserialize_f64_lenient")]
    pub factor: f64,
    pub source: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonthlyEmission {
    pub month: String,
    #[serde(deserialize_with = "deserialize_f64_lenient")]
    pub emissions: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dashboard {
    #[serde(deserialize_with = "deserialize_f64_lenient")]
    pub total_emissions: f64,
    pub by_scope: BTreeMap<String, f64>,
    pub by_type: BTreeMap<String, f64>,
    pub monthly: Vec<MonthlyEmission>,
    #[serde(deserialize_with = "deserialize_u32_lenient")]
    pub entry_count: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoadmapStep {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Roadmap {
    pub level: SustainabilityLevel,
    pub steps: Vec<RoadmapStep>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Goal {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(deserialize_with = "deserialize_f64_lenient")]
    pub target_reduction_percent: f64,
    #[serde(deserialize_with = "deserialize_u32_lenient")]
    pub baseline_year: u32,
    #[serde(deserialize_with = "deserialize_u32_lenient")]
    pub target_year: u32,
    #[serde(deserialize_with = "deserialize_f64_lenient")]
    pub progress: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalInput {
    pub title: String,
    pub target_reduction_percent: f64,
    pub baseline_year: u32,
    pub target_year: u32,
}

// =============================================================================
// LEARNING
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseModule {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(deserialize_with = "deserialize_u32_lenient")]
    pub duration_minutes: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Course {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub level: SustainabilityLevel,
    #[serde(deserialize_with = "deserialize_u32_lenient")]
    pub duration_minutes: u32,
    pub modules: Vec<CourseModule>,
    pub published: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearningProgress {
    pub course_id: String,
    pub completed_modules: Vec<String>,
    #[serde(deserialize_with = "deserialize_f64_lenient")]
    pub percent_complete: f64,
    pub completed: bool,
    #[serde(deserialize_with = "deserialize_u32_lenient")]
    pub points: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_u32_lenient")]
    pub points: u32,
    #[serde(deserialize_with = "deserialize_u32_lenient")]
    pub rank: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryResource {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub resource_type: String,
    pub url: String,
    pub level: SustainabilityLevel,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KnowledgeArticle {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsArticle {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub source: Option<String>,
    pub url: Option<String>,
    pub published_at: String,
}

// =============================================================================
// CHAT
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Participant {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub organization_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    #[serde(alias = "_id")]
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub content: String,
    pub created_at: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Conversation {
    #[serde(alias = "_id")]
    pub id: String,
    pub participants: Vec<Participant>,
    pub is_group: bool,
    pub name: Option<String>,
    pub last_message: Option<Message>,
    #[serde(deserialize_with = "deserialize_u32_lenient")]
    pub unread_count: u32,
    pub updated_at: String,
}

impl Conversation {
    /// Group name, or the other participants' names joined.
    #[must_use]
    pub fn display_name(&self, me: Option<&str>) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_owned();
        }
        let names: Vec<&str> = self
            .participants
            .iter()
            .filter(|p| Some(p.id.as_str()) != me)
            .map(|p| p.name.as_str())
            .collect();
        if names.is_empty() { "Conversation".to_owned() } else { names.join(", ") }
    }
}

// =============================================================================
// AUTH PAYLOADS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthResponse {
    #[serde(alias = "token")]
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: Option<User>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshResponse {
    #[serde(alias = "token")]
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Generic `{ message }` acknowledgement.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MessageResponse {
    pub message: Option<String>,
}

// =============================================================================
// ENVELOPES
// =============================================================================

/// A list endpoint answers either with a bare array or `{ "data": [...] }`.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// A single-item endpoint answers either with the item or `{ "data": item }`.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemResponse<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> ItemResponse<T> {
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

// =============================================================================
// LENIENT NUMBERS
// =============================================================================

fn deserialize_f64_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| D::Error::custom("expected finite number")),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("expected numeric string, got {s:?}"))),
        serde_json::Value::Null => Ok(0.0),
        _ => Err(D::Error::custom("expected number")),
    }
}

fn deserialize_u32_lenient<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialize_f64_lenient(deserializer)?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) {
        return Ok(value.round() as u32);
    }
    Err(D::Error::custom(format!("value {value} out of range for u32")))
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
