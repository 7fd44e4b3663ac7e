use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a search criterion is mandatory or a weighted preference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkillStatus {
    Required,
    Optional,
}

/// A single skill extracted from a free-text query.
///
/// Optional skills always carry a weight in `1..=5`; required skills never do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Skill {
    pub name: String,
    pub status: SkillStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u8>,
}

impl Skill {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: SkillStatus::Required,
            weight: None,
        }
    }

    pub fn optional(name: impl Into<String>, weight: u8) -> Self {
        Self {
            name: name.into(),
            status: SkillStatus::Optional,
            weight: Some(weight),
        }
    }

    pub fn is_required(&self) -> bool {
        self.status == SkillStatus::Required
    }
}

/// Course as the provider reported it: a plain number or free text
/// ("магистратура", "third").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Course {
    Number(i64),
    Text(String),
}

/// Requirement level for a scalar field of the parsed query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Required,
    Optional,
    Absent,
}

/// Structured breakdown of a natural-language search query.
///
/// Built fresh per request from provider output. `Default` is the canonical
/// empty query returned whenever interpretation fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedQuery {
    pub skills: Vec<Skill>,
    pub course: Option<Course>,
    /// Free-text purpose label, mapped to a `UserType` by the filter builder.
    pub user_type: Option<String>,
    pub faculty: Option<String>,
    pub faculty_code: Option<String>,
    pub group: Option<String>,
    pub requirements: BTreeMap<String, Requirement>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn required_skills(&self) -> impl Iterator<Item = &Skill> {
        self.skills.iter().filter(|s| s.is_required())
    }

    pub fn optional_skills(&self) -> impl Iterator<Item = &Skill> {
        self.skills.iter().filter(|s| !s.is_required())
    }
}

/// Internal user-type code stored on each user row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    ProjectCreator,
    ProjectParticipant,
    Networker,
    Explorer,
}

impl UserType {
    pub const ALL: [UserType; 4] = [
        UserType::ProjectCreator,
        UserType::ProjectParticipant,
        UserType::Networker,
        UserType::Explorer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::ProjectCreator => "project_creator",
            UserType::ProjectParticipant => "project_participant",
            UserType::Networker => "networker",
            UserType::Explorer => "explorer",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == code)
    }

    /// User type implied by a registration purpose. Unknown purposes land on `Explorer`.
    pub fn from_purpose(purpose: &str) -> Self {
        match purpose {
            "find_people" => UserType::ProjectCreator,
            "join_project" => UserType::ProjectParticipant,
            "expand_network" => UserType::Networker,
            _ => UserType::Explorer,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            UserType::ProjectCreator => "Создатель проектов - ищет участников для своих проектов",
            UserType::ProjectParticipant => {
                "Участник проектов - хочет присоединиться к существующим проектам"
            }
            UserType::Networker => "Нетворкер - расширяет профессиональные контакты",
            UserType::Explorer => "Исследователь - изучает возможности платформы",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact-match predicates derived from a `ParsedQuery`.
///
/// Each key is present only when the corresponding parsed field is present
/// and mappable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }

    /// `(column, value)` pairs in a stable column order.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(course) = &self.course {
            pairs.push(("course", course.as_str()));
        }
        if let Some(user_type) = &self.user_type {
            pairs.push(("user_type", user_type.as_str()));
        }
        if let Some(faculty) = &self.faculty {
            pairs.push(("faculty", faculty.as_str()));
        }
        if let Some(group) = &self.group_name {
            pairs.push(("group_name", group.as_str()));
        }
        pairs
    }
}

/// A row of the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id: Uuid,
    pub full_name: String,
    #[serde(default)]
    pub faculty: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub portfolio: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Values for a new `users` row. The id is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewUser {
    pub full_name: String,
    pub faculty: String,
    pub course: String,
    pub group_name: String,
    pub telegram: String,
    pub github: Option<String>,
    pub portfolio: Option<String>,
    pub photo_url: Option<String>,
    pub purpose: String,
    pub user_type: UserType,
    pub about: Option<String>,
}

/// Purpose-specific registration details, one table per purpose.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "purpose", rename_all = "snake_case")]
pub enum PurposeDetails {
    FindPeople {
        #[serde(default)]
        project_description: Option<String>,
        #[serde(default)]
        looking_for: Option<String>,
        #[serde(default)]
        required_skills: Option<String>,
    },
    JoinProject {
        #[serde(default)]
        what_to_do: Option<String>,
        #[serde(default)]
        interests: Option<String>,
        #[serde(default)]
        my_skills: Option<String>,
        #[serde(default)]
        time_commitment: Vec<String>,
    },
    ExpandNetwork {
        #[serde(default)]
        meet_with: Vec<String>,
        #[serde(default)]
        communication_format: Vec<String>,
        #[serde(default)]
        discuss_topics: Option<String>,
    },
}

impl PurposeDetails {
    pub fn purpose(&self) -> &'static str {
        match self {
            PurposeDetails::FindPeople { .. } => "find_people",
            PurposeDetails::JoinProject { .. } => "join_project",
            PurposeDetails::ExpandNetwork { .. } => "expand_network",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            PurposeDetails::FindPeople { .. } => "find_people_data",
            PurposeDetails::JoinProject { .. } => "join_project_data",
            PurposeDetails::ExpandNetwork { .. } => "expand_network_data",
        }
    }
}

/// One skill entered during registration, with the form field it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillInput {
    pub skill_name: String,
    pub input_context: String,
}

/// Free-text description tables kept for analytics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionKind {
    Project,
    About,
}

impl DescriptionKind {
    pub fn table(&self) -> &'static str {
        match self {
            DescriptionKind::Project => "project_descriptions_input",
            DescriptionKind::About => "about_descriptions_input",
        }
    }

    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "project" => Some(DescriptionKind::Project),
            "about" => Some(DescriptionKind::About),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DescriptionInput {
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Search request
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    /// Extra values merged into the parsed query, keyed by field name
    #[serde(default)]
    pub tags: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub required_fields: Vec<String>,
}

/// Smart user search request: free text in, matching users out
#[derive(Debug, Clone, Deserialize)]
pub struct SmartSearchRequest {
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmartSearchResponse {
    pub query: String,
    pub parsed: ParsedQuery,
    pub filters: FilterSet,
    pub users: Vec<UserRecord>,
    pub count: usize,
}

/// LLM config update request
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfigUpdate {
    pub provider: Option<String>,
    // base_url intentionally omitted: immutable at runtime
    pub chat_model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}
