//! One-shot user registration.
//!
//! The browser wizard collects profile, purpose, purpose details and an
//! "about" text across several pages; this module takes all of it in one
//! payload, validates it and performs the insert sequence.

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{RegistrationError, StoreError};
use crate::models::{DescriptionKind, NewUser, PurposeDetails, SkillInput, UserType};
use crate::store::stats::split_list;
use crate::store::UserStore;

pub const MIN_ABOUT_CHARS: usize = 50;

const PURPOSES: &[&str] = &["find_people", "join_project", "expand_network", "explore"];

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub full_name: String,
    pub faculty: String,
    pub course: String,
    pub group: String,
    pub telegram: String,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub portfolio: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub profile: Profile,
    pub purpose: String,
    /// Absent for "explore", which skips the details step
    #[serde(default)]
    pub details: Option<PurposeDetails>,
    pub about: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error(transparent)]
    Invalid(#[from] RegistrationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RegistrationRequest {
    pub fn validate(&self) -> Result<(), RegistrationError> {
        let required = [
            ("full_name", &self.profile.full_name),
            ("faculty", &self.profile.faculty),
            ("course", &self.profile.course),
            ("group", &self.profile.group),
            ("telegram", &self.profile.telegram),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(RegistrationError::MissingField(*field));
        }

        if !PURPOSES.contains(&self.purpose.as_str()) {
            return Err(RegistrationError::UnknownPurpose(self.purpose.clone()));
        }

        if let Some(details) = &self.details {
            if details.purpose() != self.purpose {
                return Err(RegistrationError::PurposeMismatch {
                    purpose: self.purpose.clone(),
                    details: details.purpose(),
                });
            }
        }

        if self.about.trim().chars().count() < MIN_ABOUT_CHARS {
            return Err(RegistrationError::AboutTooShort {
                min: MIN_ABOUT_CHARS,
            });
        }

        Ok(())
    }

    fn new_user(&self) -> NewUser {
        let p = &self.profile;
        NewUser {
            full_name: p.full_name.trim().to_string(),
            faculty: p.faculty.trim().to_string(),
            course: p.course.trim().to_string(),
            group_name: p.group.trim().to_string(),
            telegram: p.telegram.trim().to_string(),
            github: non_empty(&p.github),
            portfolio: non_empty(&p.portfolio),
            photo_url: non_empty(&p.photo_url),
            purpose: self.purpose.clone(),
            user_type: UserType::from_purpose(&self.purpose),
            about: Some(self.about.trim().to_string()),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate and store a registration, returning the new user's id.
///
/// The user row and the purpose details must be written; analytics rows are
/// best effort and only logged on failure.
pub async fn register(
    store: &dyn UserStore,
    request: &RegistrationRequest,
) -> Result<Uuid, RegisterError> {
    request.validate()?;

    let user_id = store.insert_user(&request.new_user()).await?;
    tracing::info!("Registered user {user_id} ({})", request.purpose);

    record_description(store, user_id, DescriptionKind::About, &request.about).await;

    if let Some(details) = &request.details {
        store.insert_purpose_details(user_id, details).await?;
        record_analytics(store, user_id, details).await;
    }

    Ok(user_id)
}

async fn record_analytics(store: &dyn UserStore, user_id: Uuid, details: &PurposeDetails) {
    match details {
        PurposeDetails::FindPeople {
            project_description,
            looking_for,
            required_skills,
        } => {
            if let Some(description) = project_description {
                record_description(store, user_id, DescriptionKind::Project, description).await;
            }
            record_skills(store, user_id, looking_for, "looking_for").await;
            record_skills(store, user_id, required_skills, "required_skills").await;
        }
        PurposeDetails::JoinProject {
            what_to_do,
            interests,
            my_skills,
            ..
        } => {
            record_skills(store, user_id, what_to_do, "what_to_do").await;
            record_skills(store, user_id, interests, "interests").await;
            record_skills(store, user_id, my_skills, "my_skills").await;
        }
        PurposeDetails::ExpandNetwork { discuss_topics, .. } => {
            for topic in discuss_topics.as_deref().map(split_list).unwrap_or_default() {
                if let Err(e) = store.insert_topic_input(user_id, &topic).await {
                    tracing::warn!("Failed to record topic '{topic}' for {user_id}: {e}");
                }
            }
        }
    }
}

async fn record_skills(
    store: &dyn UserStore,
    user_id: Uuid,
    field: &Option<String>,
    context: &str,
) {
    for skill in field.as_deref().map(split_list).unwrap_or_default() {
        let input = SkillInput {
            skill_name: skill,
            input_context: context.to_string(),
        };
        if let Err(e) = store.insert_skill_input(user_id, &input).await {
            tracing::warn!(
                "Failed to record skill '{}' ({context}) for {user_id}: {e}",
                input.skill_name
            );
        }
    }
}

async fn record_description(
    store: &dyn UserStore,
    user_id: Uuid,
    kind: DescriptionKind,
    description: &str,
) {
    let description = description.trim();
    if description.is_empty() {
        return;
    }
    if let Err(e) = store.insert_description(user_id, kind, description).await {
        tracing::warn!("Failed to record {kind:?} description for {user_id}: {e}");
    }
}
