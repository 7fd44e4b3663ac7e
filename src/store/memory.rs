//! In-process user store.
//!
//! Mirrors the hosted tables closely enough for local runs and tests:
//! equality predicates on columns, case-insensitive substring match on names,
//! and newest-first description listings.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    DescriptionInput, DescriptionKind, FilterSet, NewUser, PurposeDetails, SkillInput, UserRecord,
};
use crate::store::{UserQuery, UserStore};

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    details: HashMap<Uuid, PurposeDetails>,
    skill_inputs: Vec<(Uuid, SkillInput)>,
    topic_inputs: Vec<(Uuid, String)>,
    descriptions: Vec<(Uuid, DescriptionKind, DescriptionInput)>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with user rows.
    pub fn with_users(users: Vec<UserRecord>) -> Self {
        let store = Self::new();
        store.tables.write().users = users;
        store
    }

    pub fn user_count(&self) -> usize {
        self.tables.read().users.len()
    }
}

fn column<'a>(user: &'a UserRecord, name: &str) -> Option<&'a str> {
    match name {
        "faculty" => user.faculty.as_deref(),
        "course" => user.course.as_deref(),
        "group_name" => user.group_name.as_deref(),
        "purpose" => user.purpose.as_deref(),
        "user_type" => user.user_type.as_deref(),
        _ => None,
    }
}

fn name_matches(user: &UserRecord, name: Option<&str>) -> bool {
    match name {
        Some(name) => user
            .full_name
            .to_lowercase()
            .contains(&name.to_lowercase()),
        None => true,
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.tables.read().users.iter().find(|u| u.id == id).cloned())
    }

    async fn search_users(&self, query: &UserQuery) -> Result<Vec<UserRecord>, StoreError> {
        let predicates = [
            ("faculty", query.faculty.as_deref()),
            ("purpose", query.purpose.as_deref()),
            ("user_type", query.user_type.as_deref()),
        ];
        let tables = self.tables.read();
        Ok(tables
            .users
            .iter()
            .filter(|user| {
                predicates
                    .iter()
                    .all(|(col, want)| want.is_none() || column(user, col) == *want)
            })
            .filter(|user| name_matches(user, query.name.as_deref()))
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn advanced_search(
        &self,
        name: Option<&str>,
        filters: &FilterSet,
        limit: usize,
    ) -> Result<Vec<UserRecord>, StoreError> {
        let predicates = filters.pairs();
        let tables = self.tables.read();
        Ok(tables
            .users
            .iter()
            .filter(|user| {
                predicates
                    .iter()
                    .all(|(col, want)| column(user, col) == Some(*want))
            })
            .filter(|user| name_matches(user, name))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn user_types(&self) -> Result<Vec<Option<String>>, StoreError> {
        Ok(self
            .tables
            .read()
            .users
            .iter()
            .map(|u| u.user_type.clone())
            .collect())
    }

    async fn purpose_details(
        &self,
        user_id: Uuid,
        purpose: &str,
    ) -> Result<Option<PurposeDetails>, StoreError> {
        Ok(self
            .tables
            .read()
            .details
            .get(&user_id)
            .filter(|d| d.purpose() == purpose)
            .cloned())
    }

    async fn skill_inputs(&self, context: Option<&str>) -> Result<Vec<SkillInput>, StoreError> {
        Ok(self
            .tables
            .read()
            .skill_inputs
            .iter()
            .map(|(_, input)| input)
            .filter(|input| context.map_or(true, |c| input.input_context == c))
            .cloned()
            .collect())
    }

    async fn topic_inputs(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .tables
            .read()
            .topic_inputs
            .iter()
            .map(|(_, topic)| topic.clone())
            .collect())
    }

    async fn descriptions(
        &self,
        kind: DescriptionKind,
        limit: usize,
    ) -> Result<Vec<DescriptionInput>, StoreError> {
        let tables = self.tables.read();
        let mut rows: Vec<DescriptionInput> = tables
            .descriptions
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, d)| d.clone())
            .collect();
        // Rows are appended oldest first; equal timestamps stay newest first
        rows.reverse();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn count_descriptions(&self, kind: DescriptionKind) -> Result<usize, StoreError> {
        Ok(self
            .tables
            .read()
            .descriptions
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count())
    }

    async fn insert_user(&self, user: &NewUser) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        self.tables.write().users.push(UserRecord {
            id,
            full_name: user.full_name.clone(),
            faculty: Some(user.faculty.clone()),
            course: Some(user.course.clone()),
            group_name: Some(user.group_name.clone()),
            telegram: Some(user.telegram.clone()),
            github: user.github.clone(),
            portfolio: user.portfolio.clone(),
            photo_url: user.photo_url.clone(),
            purpose: Some(user.purpose.clone()),
            user_type: Some(user.user_type.as_str().to_string()),
            about: user.about.clone(),
            created_at: Some(Utc::now()),
        });
        Ok(id)
    }

    async fn insert_purpose_details(
        &self,
        user_id: Uuid,
        details: &PurposeDetails,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if !tables.users.iter().any(|u| u.id == user_id) {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }
        tables.details.insert(user_id, details.clone());
        Ok(())
    }

    async fn insert_skill_input(
        &self,
        user_id: Uuid,
        input: &SkillInput,
    ) -> Result<(), StoreError> {
        self.tables
            .write()
            .skill_inputs
            .push((user_id, input.clone()));
        Ok(())
    }

    async fn insert_topic_input(&self, user_id: Uuid, topic: &str) -> Result<(), StoreError> {
        self.tables
            .write()
            .topic_inputs
            .push((user_id, topic.to_string()));
        Ok(())
    }

    async fn insert_description(
        &self,
        user_id: Uuid,
        kind: DescriptionKind,
        description: &str,
    ) -> Result<(), StoreError> {
        self.tables.write().descriptions.push((
            user_id,
            kind,
            DescriptionInput {
                description: description.to_string(),
                created_at: Some(Utc::now()),
            },
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserType;

    fn user(name: &str, faculty: &str, course: &str, user_type: &str) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            faculty: Some(faculty.to_string()),
            course: Some(course.to_string()),
            group_name: None,
            telegram: None,
            github: None,
            portfolio: None,
            photo_url: None,
            purpose: None,
            user_type: Some(user_type.to_string()),
            about: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_search_users_by_name_and_faculty() {
        let store = MemoryStore::with_users(vec![
            user("Иван Петров", "ИУ", "3 курс", "networker"),
            user("Пётр Иванов", "ИБМ", "2 курс", "networker"),
            user("Анна Смирнова", "ИУ", "1 курс", "project_creator"),
        ]);

        let found = store
            .search_users(&UserQuery {
                name: Some("иван".into()),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let found = store
            .search_users(&UserQuery {
                name: Some("иван".into()),
                faculty: Some("ИУ".into()),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].full_name, "Иван Петров");
    }

    #[tokio::test]
    async fn test_advanced_search_applies_every_filter() {
        let store = MemoryStore::with_users(vec![
            user("A", "ИУ", "3 курс", "project_creator"),
            user("B", "ИУ", "3 курс", "networker"),
            user("C", "ИУ", "2 курс", "project_creator"),
        ]);
        let filters = FilterSet {
            course: Some("3 курс".into()),
            user_type: Some(UserType::ProjectCreator),
            faculty: Some("ИУ".into()),
            group_name: None,
        };
        let found = store.advanced_search(None, &filters, 20).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].full_name, "A");

        let all = store
            .advanced_search(None, &FilterSet::default(), 2)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_users_by_type_uses_default_method() {
        let store = MemoryStore::with_users(vec![
            user("A", "ИУ", "3 курс", "explorer"),
            user("B", "ИУ", "3 курс", "networker"),
        ]);
        let found = store.users_by_type(UserType::Explorer, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].full_name, "A");
    }

    #[tokio::test]
    async fn test_details_require_existing_user_and_matching_purpose() {
        let store = MemoryStore::new();
        let details = PurposeDetails::ExpandNetwork {
            meet_with: vec!["менторы".into()],
            communication_format: vec![],
            discuss_topics: None,
        };
        let err = store
            .insert_purpose_details(Uuid::new_v4(), &details)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let id = store
            .insert_user(&NewUser {
                full_name: "A".into(),
                faculty: "Л".into(),
                course: "1 курс".into(),
                group_name: "Л1-11".into(),
                telegram: "@a".into(),
                github: None,
                portfolio: None,
                photo_url: None,
                purpose: "expand_network".into(),
                user_type: UserType::Networker,
                about: None,
            })
            .await
            .unwrap();
        store.insert_purpose_details(id, &details).await.unwrap();
        assert!(store
            .purpose_details(id, "expand_network")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .purpose_details(id, "join_project")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_descriptions_newest_first() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        for text in ["first", "second", "third"] {
            store
                .insert_description(id, DescriptionKind::About, text)
                .await
                .unwrap();
        }
        store
            .insert_description(id, DescriptionKind::Project, "project")
            .await
            .unwrap();

        let recent = store.descriptions(DescriptionKind::About, 2).await.unwrap();
        let texts: Vec<_> = recent.iter().map(|d| d.description.as_str()).collect();
        assert_eq!(texts, vec!["third", "second"]);
        assert_eq!(store.count_descriptions(DescriptionKind::About).await.unwrap(), 3);
        assert_eq!(store.count_descriptions(DescriptionKind::Project).await.unwrap(), 1);
    }
}
