//! User directory storage.
//!
//! The directory lives in a hosted table store; [`postgrest::PostgrestStore`]
//! talks to it over REST. [`memory::MemoryStore`] keeps the same tables in
//! process for local runs and tests.

pub mod memory;
pub mod postgrest;
pub mod stats;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    DescriptionInput, DescriptionKind, FilterSet, NewUser, PurposeDetails, SkillInput, UserRecord,
    UserType,
};

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;

/// Filters for the plain user listing. Every set field must match.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    /// Case-insensitive substring of `full_name`
    pub name: Option<String>,
    pub faculty: Option<String>,
    pub purpose: Option<String>,
    pub user_type: Option<String>,
    pub limit: usize,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    async fn search_users(&self, query: &UserQuery) -> Result<Vec<UserRecord>, StoreError>;

    /// Users matching every predicate in `filters`, optionally narrowed by name.
    async fn advanced_search(
        &self,
        name: Option<&str>,
        filters: &FilterSet,
        limit: usize,
    ) -> Result<Vec<UserRecord>, StoreError>;

    async fn users_by_type(
        &self,
        user_type: UserType,
        limit: usize,
    ) -> Result<Vec<UserRecord>, StoreError> {
        self.search_users(&UserQuery {
            user_type: Some(user_type.as_str().to_string()),
            limit,
            ..Default::default()
        })
        .await
    }

    /// The `user_type` column of every user.
    async fn user_types(&self) -> Result<Vec<Option<String>>, StoreError>;

    async fn purpose_details(
        &self,
        user_id: Uuid,
        purpose: &str,
    ) -> Result<Option<PurposeDetails>, StoreError>;

    async fn skill_inputs(&self, context: Option<&str>) -> Result<Vec<SkillInput>, StoreError>;

    async fn topic_inputs(&self) -> Result<Vec<String>, StoreError>;

    /// Most recent descriptions first.
    async fn descriptions(
        &self,
        kind: DescriptionKind,
        limit: usize,
    ) -> Result<Vec<DescriptionInput>, StoreError>;

    async fn count_descriptions(&self, kind: DescriptionKind) -> Result<usize, StoreError>;

    /// Insert a user row and return its new id.
    async fn insert_user(&self, user: &NewUser) -> Result<Uuid, StoreError>;

    async fn insert_purpose_details(
        &self,
        user_id: Uuid,
        details: &PurposeDetails,
    ) -> Result<(), StoreError>;

    async fn insert_skill_input(&self, user_id: Uuid, input: &SkillInput)
        -> Result<(), StoreError>;

    async fn insert_topic_input(&self, user_id: Uuid, topic: &str) -> Result<(), StoreError>;

    async fn insert_description(
        &self,
        user_id: Uuid,
        kind: DescriptionKind,
        description: &str,
    ) -> Result<(), StoreError>;
}
