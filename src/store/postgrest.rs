use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::{
    DescriptionInput, DescriptionKind, FilterSet, NewUser, PurposeDetails, SkillInput, UserRecord,
};
use crate::store::{UserQuery, UserStore};

/// User store backed by a hosted PostgREST endpoint (`<url>/rest/v1/<table>`).
pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct UserTypeRow {
    user_type: Option<String>,
}

#[derive(Deserialize)]
struct TopicRow {
    topic_name: String,
}

#[derive(Deserialize)]
struct IdRow {
    id: Uuid,
}

#[derive(Serialize)]
struct SkillInputRow<'a> {
    user_id: Uuid,
    skill_name: &'a str,
    input_context: &'a str,
}

#[derive(Serialize)]
struct TopicInputRow<'a> {
    user_id: Uuid,
    topic_name: &'a str,
}

#[derive(Serialize)]
struct DescriptionRow<'a> {
    user_id: Uuid,
    description: &'a str,
}

impl PostgrestStore {
    pub fn new(client: reqwest::Client, url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }

    /// Build from config; `None` when no backend URL is configured.
    pub fn from_config(client: reqwest::Client, config: &StoreConfig) -> Option<Self> {
        let url = config.url.as_deref()?;
        Some(Self::new(
            client,
            url,
            config.api_key.as_deref().unwrap_or_default(),
        ))
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/{table}", self.base_url))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(String, String)],
    ) -> Result<Vec<T>, StoreError> {
        let resp = self
            .request(reqwest::Method::GET, table)
            .query(params)
            .send()
            .await?;
        let body = check_status(resp).await?;
        serde_json::from_str(&body).map_err(|e| StoreError::Decode(format!("{table}: {e}")))
    }

    async fn insert<T: Serialize>(
        &self,
        table: &'static str,
        row: &T,
    ) -> Result<Vec<Value>, StoreError> {
        let resp = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        let body = check_status(resp).await?;
        let rows: Vec<Value> =
            serde_json::from_str(&body).map_err(|e| StoreError::Decode(format!("{table}: {e}")))?;
        if rows.is_empty() {
            return Err(StoreError::EmptyInsert(table));
        }
        Ok(rows)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<String, StoreError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(StoreError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

fn param(key: &str, value: impl Into<String>) -> (String, String) {
    (key.to_string(), value.into())
}

fn eq(column: &str, value: &str) -> (String, String) {
    param(column, format!("eq.{value}"))
}

fn name_like(name: &str) -> (String, String) {
    param("full_name", format!("ilike.*{name}*"))
}

/// Query parameters for a user listing.
fn user_query_params(query: &UserQuery) -> Vec<(String, String)> {
    let mut params = vec![param("select", "*")];
    if let Some(faculty) = &query.faculty {
        params.push(eq("faculty", faculty));
    }
    if let Some(purpose) = &query.purpose {
        params.push(eq("purpose", purpose));
    }
    if let Some(user_type) = &query.user_type {
        params.push(eq("user_type", user_type));
    }
    if let Some(name) = &query.name {
        params.push(name_like(name));
    }
    params.push(param("limit", query.limit.to_string()));
    params
}

fn filter_params(name: Option<&str>, filters: &FilterSet, limit: usize) -> Vec<(String, String)> {
    let mut params = vec![param("select", "*")];
    params.extend(filters.pairs().into_iter().map(|(col, val)| eq(col, val)));
    if let Some(name) = name {
        params.push(name_like(name));
    }
    params.push(param("limit", limit.to_string()));
    params
}

/// Total row count from a `Content-Range` header such as `0-0/42` or `*/0`.
fn parse_content_range_total(header: &str) -> Option<usize> {
    header.rsplit('/').next()?.trim().parse().ok()
}

/// Re-attach the purpose tag the details tables do not store.
fn details_from_row(mut row: Value, purpose: &str) -> Result<PurposeDetails, StoreError> {
    if let Value::Object(map) = &mut row {
        map.insert("purpose".to_string(), Value::String(purpose.to_string()));
    }
    serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string()))
}

fn details_to_row(user_id: Uuid, details: &PurposeDetails) -> Result<Value, StoreError> {
    let mut row = serde_json::to_value(details).map_err(|e| StoreError::Decode(e.to_string()))?;
    if let Value::Object(map) = &mut row {
        map.remove("purpose");
        map.insert("user_id".to_string(), Value::String(user_id.to_string()));
    }
    Ok(row)
}

fn details_table(purpose: &str) -> Option<&'static str> {
    match purpose {
        "find_people" => Some("find_people_data"),
        "join_project" => Some("join_project_data"),
        "expand_network" => Some("expand_network_data"),
        _ => None,
    }
}

#[async_trait]
impl UserStore for PostgrestStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let rows: Vec<UserRecord> = self
            .select(
                "users",
                &[param("select", "*"), eq("id", &id.to_string()), param("limit", "1")],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn search_users(&self, query: &UserQuery) -> Result<Vec<UserRecord>, StoreError> {
        self.select("users", &user_query_params(query)).await
    }

    async fn advanced_search(
        &self,
        name: Option<&str>,
        filters: &FilterSet,
        limit: usize,
    ) -> Result<Vec<UserRecord>, StoreError> {
        self.select("users", &filter_params(name, filters, limit))
            .await
    }

    async fn user_types(&self) -> Result<Vec<Option<String>>, StoreError> {
        let rows: Vec<UserTypeRow> = self
            .select("users", &[param("select", "user_type")])
            .await?;
        Ok(rows.into_iter().map(|r| r.user_type).collect())
    }

    async fn purpose_details(
        &self,
        user_id: Uuid,
        purpose: &str,
    ) -> Result<Option<PurposeDetails>, StoreError> {
        let Some(table) = details_table(purpose) else {
            return Ok(None);
        };
        let rows: Vec<Value> = self
            .select(
                table,
                &[
                    param("select", "*"),
                    eq("user_id", &user_id.to_string()),
                    param("limit", "1"),
                ],
            )
            .await?;
        rows.into_iter()
            .next()
            .map(|row| details_from_row(row, purpose))
            .transpose()
    }

    async fn skill_inputs(&self, context: Option<&str>) -> Result<Vec<SkillInput>, StoreError> {
        let mut params = vec![param("select", "skill_name,input_context")];
        if let Some(context) = context {
            params.push(eq("input_context", context));
        }
        self.select("user_skills_input", &params).await
    }

    async fn topic_inputs(&self) -> Result<Vec<String>, StoreError> {
        let rows: Vec<TopicRow> = self
            .select("user_topics_input", &[param("select", "topic_name")])
            .await?;
        Ok(rows.into_iter().map(|r| r.topic_name).collect())
    }

    async fn descriptions(
        &self,
        kind: DescriptionKind,
        limit: usize,
    ) -> Result<Vec<DescriptionInput>, StoreError> {
        self.select(
            kind.table(),
            &[
                param("select", "description,created_at"),
                param("order", "created_at.desc"),
                param("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn count_descriptions(&self, kind: DescriptionKind) -> Result<usize, StoreError> {
        let resp = self
            .request(reqwest::Method::HEAD, kind.table())
            .header("Prefer", "count=exact")
            .query(&[("select", "description")])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: String::new(),
            });
        }
        resp.headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| StoreError::Decode(format!("{}: missing row count", kind.table())))
    }

    async fn insert_user(&self, user: &NewUser) -> Result<Uuid, StoreError> {
        let rows = self.insert("users", user).await?;
        rows.into_iter()
            .next()
            .map(serde_json::from_value::<IdRow>)
            .transpose()
            .map_err(|e| StoreError::Decode(format!("users: {e}")))?
            .map(|row| row.id)
            .ok_or(StoreError::EmptyInsert("users"))
    }

    async fn insert_purpose_details(
        &self,
        user_id: Uuid,
        details: &PurposeDetails,
    ) -> Result<(), StoreError> {
        let row = details_to_row(user_id, details)?;
        self.insert(details.table(), &row).await?;
        Ok(())
    }

    async fn insert_skill_input(
        &self,
        user_id: Uuid,
        input: &SkillInput,
    ) -> Result<(), StoreError> {
        let row = SkillInputRow {
            user_id,
            skill_name: &input.skill_name,
            input_context: &input.input_context,
        };
        self.insert("user_skills_input", &row).await?;
        Ok(())
    }

    async fn insert_topic_input(&self, user_id: Uuid, topic: &str) -> Result<(), StoreError> {
        let row = TopicInputRow {
            user_id,
            topic_name: topic,
        };
        self.insert("user_topics_input", &row).await?;
        Ok(())
    }

    async fn insert_description(
        &self,
        user_id: Uuid,
        kind: DescriptionKind,
        description: &str,
    ) -> Result<(), StoreError> {
        let row = DescriptionRow {
            user_id,
            description,
        };
        self.insert(kind.table(), &row).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserType;

    #[test]
    fn test_user_query_params() {
        let params = user_query_params(&UserQuery {
            name: Some("Иван".into()),
            faculty: Some("ИУ".into()),
            user_type: Some("networker".into()),
            limit: 50,
            ..Default::default()
        });
        assert_eq!(
            params,
            vec![
                param("select", "*"),
                param("faculty", "eq.ИУ"),
                param("user_type", "eq.networker"),
                param("full_name", "ilike.*Иван*"),
                param("limit", "50"),
            ]
        );
    }

    #[test]
    fn test_filter_params_follow_filter_set() {
        let filters = FilterSet {
            course: Some("3 курс".into()),
            user_type: Some(UserType::ProjectCreator),
            faculty: None,
            group_name: Some("ИУ7-31Б".into()),
        };
        let params = filter_params(None, &filters, 20);
        assert_eq!(
            params,
            vec![
                param("select", "*"),
                param("course", "eq.3 курс"),
                param("user_type", "eq.project_creator"),
                param("group_name", "eq.ИУ7-31Б"),
                param("limit", "20"),
            ]
        );
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-0/42"), Some(42));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-9/*"), None);
    }

    #[test]
    fn test_details_row_round_trip_drops_tag() {
        let user_id = Uuid::new_v4();
        let details = PurposeDetails::FindPeople {
            project_description: Some("Платформа для кружков".into()),
            looking_for: Some("frontend".into()),
            required_skills: Some("React".into()),
        };
        let row = details_to_row(user_id, &details).unwrap();
        assert!(row.get("purpose").is_none());
        assert_eq!(row["user_id"], user_id.to_string());

        let back = details_from_row(row, "find_people").unwrap();
        assert_eq!(back, details);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let store = PostgrestStore::new(reqwest::Client::new(), "https://x.supabase.co/", "k");
        assert_eq!(store.base_url, "https://x.supabase.co/rest/v1");
    }
}
