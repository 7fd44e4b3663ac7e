use std::collections::{BTreeMap, HashMap};

use futures_util::future::join_all;
use serde::Serialize;

use crate::error::StoreError;
use crate::models::{DescriptionKind, PurposeDetails, UserRecord, UserType};
use crate::store::UserStore;

/// Count users per known type. Every type is present, unknown codes are ignored.
pub fn user_type_statistics<'a>(
    types: impl IntoIterator<Item = Option<&'a str>>,
) -> BTreeMap<UserType, usize> {
    let mut stats: BTreeMap<UserType, usize> = UserType::ALL.into_iter().map(|t| (t, 0)).collect();
    for user_type in types.into_iter().flatten().filter_map(UserType::parse) {
        *stats.entry(user_type).or_default() += 1;
    }
    stats
}

/// Most frequent terms, lowercased and trimmed, highest count first.
/// Ties are broken alphabetically.
pub fn popular_terms<I, S>(values: I, limit: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values {
        let term = value.as_ref().trim().to_lowercase();
        if !term.is_empty() {
            *counts.entry(term).or_default() += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// Split a comma-separated form field into trimmed, non-empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lowercased skill terms a user entered for their purpose.
pub fn skill_terms(details: &PurposeDetails) -> Vec<String> {
    let fields: Vec<&Option<String>> = match details {
        PurposeDetails::FindPeople {
            looking_for,
            required_skills,
            ..
        } => vec![looking_for, required_skills],
        PurposeDetails::JoinProject {
            what_to_do,
            interests,
            my_skills,
            ..
        } => vec![what_to_do, interests, my_skills],
        PurposeDetails::ExpandNetwork { .. } => Vec::new(),
    };

    fields
        .into_iter()
        .flatten()
        .flat_map(|field| split_list(field))
        .map(|term| term.to_lowercase())
        .collect()
}

/// Keep users whose entered skills contain at least one of `skills`.
///
/// Looks up every user's purpose details concurrently. An empty `skills`
/// list keeps everyone.
pub async fn filter_by_skills(
    store: &dyn UserStore,
    users: Vec<UserRecord>,
    skills: &[String],
) -> Result<Vec<UserRecord>, StoreError> {
    if skills.is_empty() || users.is_empty() {
        return Ok(users);
    }
    let wanted: Vec<String> = skills.iter().map(|s| s.trim().to_lowercase()).collect();

    let lookups = users.iter().map(|user| async move {
        match user.purpose.as_deref() {
            Some(purpose) => store.purpose_details(user.id, purpose).await,
            None => Ok(None),
        }
    });
    let details = join_all(lookups).await;

    let mut kept = Vec::new();
    for (user, details) in users.into_iter().zip(details) {
        let terms = details?.as_ref().map(skill_terms).unwrap_or_default();
        if wanted.iter().any(|skill| terms.contains(skill)) {
            kept.push(user);
        }
    }
    Ok(kept)
}

/// Volume of analytics input collected at registration.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct InputStatistics {
    pub skills_by_context: BTreeMap<String, usize>,
    pub total_skills: usize,
    pub total_topics: usize,
    pub total_project_descriptions: usize,
    pub total_about_descriptions: usize,
}

pub async fn input_statistics(store: &dyn UserStore) -> Result<InputStatistics, StoreError> {
    let skills = store.skill_inputs(None).await?;
    let topics = store.topic_inputs().await?;

    let mut skills_by_context = BTreeMap::new();
    for input in &skills {
        *skills_by_context
            .entry(input.input_context.clone())
            .or_default() += 1;
    }

    Ok(InputStatistics {
        skills_by_context,
        total_skills: skills.len(),
        total_topics: topics.len(),
        total_project_descriptions: store.count_descriptions(DescriptionKind::Project).await?,
        total_about_descriptions: store.count_descriptions(DescriptionKind::About).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_type_statistics_zero_filled() {
        let stats = user_type_statistics([
            Some("networker"),
            Some("networker"),
            Some("project_creator"),
            Some("admin"),
            None,
        ]);
        assert_eq!(stats.len(), 4);
        assert_eq!(stats[&UserType::Networker], 2);
        assert_eq!(stats[&UserType::ProjectCreator], 1);
        assert_eq!(stats[&UserType::ProjectParticipant], 0);
        assert_eq!(stats[&UserType::Explorer], 0);
    }

    #[test]
    fn test_popular_terms_counts_and_orders() {
        let ranked = popular_terms(
            ["Python", " python ", "Go", "", "rust", "go", "Python"],
            10,
        );
        assert_eq!(
            ranked,
            vec![
                ("python".to_string(), 3),
                ("go".to_string(), 2),
                ("rust".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_popular_terms_limit() {
        let ranked = popular_terms(["a", "b", "c", "a"], 2);
        assert_eq!(ranked, vec![("a".to_string(), 2), ("b".to_string(), 1)]);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("Python, SQL ,, Docker "), vec!["Python", "SQL", "Docker"]);
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn test_skill_terms_by_purpose() {
        let details = PurposeDetails::JoinProject {
            what_to_do: Some("Backend".into()),
            interests: Some("ML, Data".into()),
            my_skills: None,
            time_commitment: vec![],
        };
        assert_eq!(skill_terms(&details), vec!["backend", "ml", "data"]);

        let details = PurposeDetails::ExpandNetwork {
            meet_with: vec![],
            communication_format: vec![],
            discuss_topics: Some("стартапы".into()),
        };
        assert!(skill_terms(&details).is_empty());
    }
}
