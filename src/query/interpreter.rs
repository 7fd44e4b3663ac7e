use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::InterpretError;
use crate::llm::ChatProvider;
use crate::models::{Course, ParsedQuery, Requirement, Skill, SkillStatus};
use crate::query::faculty::resolve_faculty_code;
use crate::query::weights::{clamp_weight, follows_weight_ladder, DEFAULT_WEIGHT};

// Reply keys, as requested in the prompt.
const KEY_SKILLS: &str = "навыки";
const KEY_SKILL_NAME: &str = "навык";
const KEY_SKILL_STATUS: &str = "статус";
const KEY_SKILL_WEIGHT: &str = "баллы";
const KEY_COURSE: &str = "курс";
const KEY_USER_TYPE: &str = "тип пользователя";
const KEY_FACULTY: &str = "факультет";
const KEY_GROUP: &str = "номер группы";
const KEY_REQUIREMENTS: &str = "requirements";

/// Reply field names and the field names used in `ParsedQuery::requirements`.
const REQUIREMENT_FIELDS: &[(&str, &str)] = &[
    (KEY_COURSE, "course"),
    (KEY_USER_TYPE, "user_type"),
    (KEY_FACULTY, "faculty"),
    (KEY_GROUP, "group"),
];

/// Turns free-text search queries into `ParsedQuery` records via a chat model.
///
/// Construct one per application and share it through `AppState`.
pub struct QueryInterpreter {
    provider: Arc<dyn ChatProvider>,
    timeout_ms: AtomicU64,
}

impl QueryInterpreter {
    pub fn new(provider: Arc<dyn ChatProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout_ms: AtomicU64::new(timeout.as_millis() as u64),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.load(Ordering::Relaxed))
    }

    /// Applies to calls started after this returns.
    pub fn set_timeout(&self, timeout: Duration) {
        self.timeout_ms
            .store(timeout.as_millis() as u64, Ordering::Relaxed);
    }

    /// Interpret `query`, reporting why interpretation failed if it did.
    ///
    /// Performs exactly one provider call; nothing is retried.
    pub async fn interpret(&self, query: &str) -> Result<ParsedQuery, InterpretError> {
        let prompt = build_prompt(query);
        let timeout = self.timeout();

        let reply = tokio::time::timeout(timeout, self.provider.complete_json(&prompt))
            .await
            .map_err(|_| {
                InterpretError::Unavailable(format!(
                    "no reply within {}s",
                    timeout.as_secs_f32()
                ))
            })??;

        let parsed = parse_reply(&reply)?;
        if !follows_weight_ladder(&parsed.skills) {
            tracing::debug!(
                "Optional skill weights deviate from the ladder: {:?}",
                parsed.optional_skills().map(|s| s.weight).collect::<Vec<_>>()
            );
        }
        Ok(parsed)
    }

    /// Interpret `query`, falling back to the empty `ParsedQuery` on any failure.
    pub async fn parse(&self, query: &str) -> ParsedQuery {
        match self.interpret(query).await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Query interpretation failed: {e}");
                ParsedQuery::default()
            }
        }
    }
}

/// Build the instruction prompt for one query.
pub fn build_prompt(query: &str) -> String {
    let query = query.replace('\n', " ");
    format!(
        r#"Проанализируй поисковый запрос студента и извлеки из него навыки, курс, тип пользователя, факультет и номер группы, если они упомянуты.

Для каждого навыка определи статус:
- "required": запрос явно требует навык ("нужен", "обязательно", "только", "именно") или контекст подразумевает строгое требование;
- "optional": навык упомянут как пожелание ("желательно", "предпочтительно", "лучше"), с оговоркой ("можно", "возможно", "по возможности") или контекст допускает гибкость.

Только необязательным (optional) навыкам присвой баллы важности. Сначала упорядочь их по важности: порядок упоминания (раньше — важнее), акценты ("очень желательно" важнее "желательно"), специфичность, связь с основной деятельностью. Затем распредели баллы в зависимости от количества необязательных навыков:
- 1 навык: 1
- 2 навыка: 2, 1
- 3 навыка: 3, 2, 1
- 4 навыка: 4, 3, 2, 1
- 5 и более: 5, 4, 3, 2, остальным по 1
Обязательным навыкам баллы не присваивай.

Определения:
- Навык — умение или область знаний: конкретная технология (Python, Java) или общая категория (программирование, дизайн, анализ данных).
- Курс — уровень обучения: 1, 2, 3, 4, 5, 6, магистратура, аспирантура.
- Тип пользователя — ровно одна из категорий: "Поиск участников для проекта", "Участие в существующих проектах", "Расширение профессиональных контактов". Если ни одна не подходит, укажи null.
- Факультет — название факультета или направления (например, физический, информационные технологии).
- Номер группы — идентификатор учебной группы (например, ИТ-301, Ф-21, М-1).

Для отсутствующих сведений укажи null, для навыков — пустой массив. В "requirements" для каждого поля укажи "required", "optional" или null.

Ответь только JSON-объектом такого вида:
{{
    "{KEY_SKILLS}": [
        {{"{KEY_SKILL_NAME}": "название", "{KEY_SKILL_STATUS}": "required|optional", "{KEY_SKILL_WEIGHT}": 1}}
    ],
    "{KEY_COURSE}": null,
    "{KEY_USER_TYPE}": null,
    "{KEY_FACULTY}": null,
    "{KEY_GROUP}": null,
    "{KEY_REQUIREMENTS}": {{
        "{KEY_COURSE}": null,
        "{KEY_USER_TYPE}": null,
        "{KEY_FACULTY}": null,
        "{KEY_GROUP}": null
    }}
}}

Запрос: {query}"#
    )
}

/// Parse a provider reply into a normalized `ParsedQuery`.
///
/// Missing keys default to empty; a reply that is not a JSON object, or whose
/// skills are not an array, is malformed.
pub fn parse_reply(content: &str) -> Result<ParsedQuery, InterpretError> {
    let object = extract_object(content)?;

    let skills = match object.get(KEY_SKILLS) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(normalize_skill).collect(),
        Some(other) => {
            return Err(InterpretError::Malformed(format!(
                "'{KEY_SKILLS}' is not an array: {other}"
            )))
        }
    };

    let faculty = object.get(KEY_FACULTY).and_then(text_value);
    let faculty_code = faculty
        .as_deref()
        .and_then(resolve_faculty_code)
        .map(str::to_string);

    Ok(ParsedQuery {
        skills,
        course: object.get(KEY_COURSE).and_then(course_value),
        user_type: object.get(KEY_USER_TYPE).and_then(text_value),
        faculty,
        faculty_code,
        group: object.get(KEY_GROUP).and_then(text_value),
        requirements: object
            .get(KEY_REQUIREMENTS)
            .map(normalize_requirements)
            .unwrap_or_default(),
    })
}

/// Find the JSON object in a reply, tolerating prose or code fences around it.
fn extract_object(content: &str) -> Result<Map<String, Value>, InterpretError> {
    let json_str = match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => content,
    };

    match serde_json::from_str::<Value>(json_str) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(InterpretError::Malformed(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(InterpretError::Malformed(e.to_string())),
    }
}

fn normalize_skill(item: &Value) -> Option<Skill> {
    match item {
        Value::Object(fields) => {
            let Some(name) = fields.get(KEY_SKILL_NAME).and_then(text_value) else {
                tracing::debug!("Dropping skill without a name: {item}");
                return None;
            };
            let status = match fields.get(KEY_SKILL_STATUS).and_then(Value::as_str) {
                Some(s) if s.trim().eq_ignore_ascii_case("required") => SkillStatus::Required,
                _ => SkillStatus::Optional,
            };
            Some(match status {
                SkillStatus::Required => Skill::required(name),
                SkillStatus::Optional => {
                    let weight = fields
                        .get(KEY_SKILL_WEIGHT)
                        .and_then(weight_value)
                        .unwrap_or(DEFAULT_WEIGHT);
                    Skill::optional(name, weight)
                }
            })
        }
        Value::Null => None,
        // Bare strings (or numbers) instead of skill objects
        other => text_value(other).map(|name| Skill::optional(name, DEFAULT_WEIGHT)),
    }
}

/// Normalize a skill picked by the user: a serialized `Skill`, a reply-shaped
/// object or a bare name. The result follows the same invariants as skills
/// parsed from a provider reply.
pub fn normalize_tagged_skill(item: &Value) -> Option<Skill> {
    let Ok(skill) = serde_json::from_value::<Skill>(item.clone()) else {
        return normalize_skill(item);
    };
    let name = skill.name.trim();
    if name.is_empty() {
        return None;
    }
    Some(match skill.status {
        SkillStatus::Required => Skill::required(name),
        SkillStatus::Optional => Skill::optional(
            name,
            skill
                .weight
                .map(|w| clamp_weight(i64::from(w)))
                .unwrap_or(DEFAULT_WEIGHT),
        ),
    })
}

fn weight_value(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Some(clamp_weight(raw))
}

/// Non-empty trimmed text for strings and numbers, `None` otherwise.
fn text_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty() && text != "null").then_some(text)
}

fn course_value(value: &Value) -> Option<Course> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(0) => None,
            Some(course) => Some(Course::Number(course)),
            None => text_value(value).map(Course::Text),
        },
        other => text_value(other).map(Course::Text),
    }
}

fn normalize_requirements(value: &Value) -> BTreeMap<String, Requirement> {
    let Value::Object(entries) = value else {
        return BTreeMap::new();
    };

    entries
        .iter()
        .map(|(key, level)| {
            let field = REQUIREMENT_FIELDS
                .iter()
                .find(|(reply_key, _)| reply_key == key)
                .map(|(_, field)| field.to_string())
                .unwrap_or_else(|| key.clone());
            let level = match level.as_str().map(str::trim) {
                Some("required") => Requirement::Required,
                Some("optional") => Requirement::Optional,
                _ => Requirement::Absent,
            };
            (field, level)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::query::weights::{weight_ladder, MAX_WEIGHT, MIN_WEIGHT};

    struct Replying(String);

    #[async_trait]
    impl ChatProvider for Replying {
        async fn complete_json(&self, _prompt: &str) -> Result<String, InterpretError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl ChatProvider for Failing {
        async fn complete_json(&self, _prompt: &str) -> Result<String, InterpretError> {
            Err(InterpretError::Unavailable("connection refused".into()))
        }
    }

    struct Slow;

    #[async_trait]
    impl ChatProvider for Slow {
        async fn complete_json(&self, _prompt: &str) -> Result<String, InterpretError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("{}".into())
        }
    }

    fn interpreter(provider: impl ChatProvider + 'static) -> QueryInterpreter {
        QueryInterpreter::new(Arc::new(provider), Duration::from_secs(1))
    }

    fn assert_skill_invariants(parsed: &ParsedQuery) {
        for skill in &parsed.skills {
            match skill.status {
                SkillStatus::Required => assert!(skill.weight.is_none(), "{skill:?}"),
                SkillStatus::Optional => {
                    let w = skill.weight.expect("optional skill without weight");
                    assert!((MIN_WEIGHT..=MAX_WEIGHT).contains(&w), "{skill:?}");
                }
            }
        }
    }

    #[test]
    fn test_prompt_embeds_query_and_schema() {
        let prompt = build_prompt("нужен Python разработчик,\nжелательно 3 курс");
        assert!(prompt.contains("Запрос: нужен Python разработчик, желательно 3 курс"));
        assert!(prompt.contains("\"навыки\""));
        assert!(prompt.contains("\"номер группы\""));
        assert!(prompt.contains("\"requirements\""));
        assert!(prompt.contains("5, 4, 3, 2, остальным по 1"));
    }

    #[test]
    fn test_parse_full_reply() {
        let reply = json!({
            "навыки": [
                {"навык": "Python", "статус": "required"},
                {"навык": "Docker", "статус": "optional", "баллы": 2},
                {"навык": "Kubernetes", "статус": "optional", "баллы": 1}
            ],
            "курс": 3,
            "тип пользователя": "Поиск участников для проекта",
            "факультет": "Информационные технологии",
            "номер группы": "ИУ7-31Б",
            "requirements": {
                "курс": "required",
                "тип пользователя": "optional",
                "факультет": null,
                "номер группы": "null"
            }
        })
        .to_string();

        let parsed = parse_reply(&reply).unwrap();
        assert_eq!(
            parsed.skills,
            vec![
                Skill::required("Python"),
                Skill::optional("Docker", 2),
                Skill::optional("Kubernetes", 1),
            ]
        );
        assert_eq!(parsed.course, Some(Course::Number(3)));
        assert_eq!(parsed.user_type.as_deref(), Some("Поиск участников для проекта"));
        assert_eq!(parsed.faculty.as_deref(), Some("Информационные технологии"));
        assert_eq!(parsed.faculty_code.as_deref(), Some("ИУ"));
        assert_eq!(parsed.group.as_deref(), Some("ИУ7-31Б"));
        assert_eq!(parsed.requirements["course"], Requirement::Required);
        assert_eq!(parsed.requirements["user_type"], Requirement::Optional);
        assert_eq!(parsed.requirements["faculty"], Requirement::Absent);
        assert_eq!(parsed.requirements["group"], Requirement::Absent);
        assert!(follows_weight_ladder(&parsed.skills));
    }

    #[test]
    fn test_bare_string_skills_default_to_optional_mid_weight() {
        let parsed = parse_reply(r#"{"навыки": ["Figma", "UX"]}"#).unwrap();
        assert_eq!(
            parsed.skills,
            vec![Skill::optional("Figma", 3), Skill::optional("UX", 3)]
        );
    }

    #[test]
    fn test_tagged_skills_follow_skill_invariants() {
        assert_eq!(
            normalize_tagged_skill(&json!("Docker")),
            Some(Skill::optional("Docker", DEFAULT_WEIGHT))
        );
        assert_eq!(
            normalize_tagged_skill(&json!({"name": "Go", "status": "required", "weight": 4})),
            Some(Skill::required("Go"))
        );
        assert_eq!(
            normalize_tagged_skill(&json!({"name": "SQL", "status": "optional"})),
            Some(Skill::optional("SQL", DEFAULT_WEIGHT))
        );
        assert_eq!(
            normalize_tagged_skill(&json!({"name": "Rust", "status": "optional", "weight": 9})),
            Some(Skill::optional("Rust", MAX_WEIGHT))
        );
        assert_eq!(
            normalize_tagged_skill(&json!({"навык": "Java", "статус": "required"})),
            Some(Skill::required("Java"))
        );
        assert_eq!(normalize_tagged_skill(&json!({"name": " ", "status": "required"})), None);
        assert_eq!(normalize_tagged_skill(&Value::Null), None);
    }

    #[test]
    fn test_required_skill_drops_weight() {
        let parsed =
            parse_reply(r#"{"навыки": [{"навык": "Go", "статус": "required", "баллы": 5}]}"#)
                .unwrap();
        assert_eq!(parsed.skills, vec![Skill::required("Go")]);
    }

    #[test]
    fn test_optional_weight_clamped_and_defaulted() {
        let reply = r#"{"навыки": [
            {"навык": "A", "статус": "optional", "баллы": 9},
            {"навык": "B", "статус": "optional", "баллы": 0},
            {"навык": "C", "статус": "optional"},
            {"навык": "D", "статус": "optional", "баллы": "2"},
            {"навык": "E", "статус": "optional", "баллы": 3.6},
            {"навык": "F", "статус": "maybe", "баллы": "много"}
        ]}"#;
        let parsed = parse_reply(reply).unwrap();
        let weights: Vec<_> = parsed.skills.iter().map(|s| s.weight).collect();
        assert_eq!(
            weights,
            vec![Some(5), Some(1), Some(3), Some(2), Some(4), Some(3)]
        );
        assert_skill_invariants(&parsed);
    }

    #[test]
    fn test_skill_objects_without_name_are_dropped() {
        let reply = r#"{"навыки": [{"статус": "required"}, {"навык": ""}, null, {"навык": "SQL"}]}"#;
        let parsed = parse_reply(reply).unwrap();
        assert_eq!(parsed.skills, vec![Skill::optional("SQL", 3)]);
    }

    #[test]
    fn test_ladder_replies_are_preserved_in_order() {
        for n in 1..=7 {
            let ladder = weight_ladder(n);
            let skills: Vec<Value> = ladder
                .iter()
                .enumerate()
                .map(|(i, w)| json!({"навык": format!("skill-{i}"), "статус": "optional", "баллы": w}))
                .collect();
            let parsed = parse_reply(&json!({ "навыки": skills }).to_string()).unwrap();
            let weights: Vec<u8> = parsed.skills.iter().filter_map(|s| s.weight).collect();
            assert_eq!(weights, ladder, "n = {n}");
            assert!(follows_weight_ladder(&parsed.skills));
        }
        assert_eq!(weight_ladder(4), vec![4, 3, 2, 1]);
        assert_eq!(weight_ladder(6), vec![5, 4, 3, 2, 1, 1]);
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let parsed = parse_reply(r#"{"extra": true}"#).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_textual_course_and_zero_course() {
        let parsed = parse_reply(r#"{"курс": "магистратура"}"#).unwrap();
        assert_eq!(parsed.course, Some(Course::Text("магистратура".into())));

        let parsed = parse_reply(r#"{"курс": "3"}"#).unwrap();
        assert_eq!(parsed.course, Some(Course::Text("3".into())));

        let parsed = parse_reply(r#"{"курс": 0}"#).unwrap();
        assert!(parsed.course.is_none());
    }

    #[test]
    fn test_unknown_faculty_has_no_code() {
        let parsed = parse_reply(r#"{"факультет": "физический"}"#).unwrap();
        assert_eq!(parsed.faculty.as_deref(), Some("физический"));
        assert!(parsed.faculty_code.is_none());
    }

    #[test]
    fn test_reply_wrapped_in_code_fence() {
        let reply = "```json\n{\"номер группы\": \"Ф-21\"}\n```";
        let parsed = parse_reply(reply).unwrap();
        assert_eq!(parsed.group.as_deref(), Some("Ф-21"));
    }

    #[test]
    fn test_malformed_replies() {
        assert!(matches!(
            parse_reply("I cannot help with that."),
            Err(InterpretError::Malformed(_))
        ));
        assert!(matches!(
            parse_reply("[1, 2, 3]"),
            Err(InterpretError::Malformed(_))
        ));
        assert!(matches!(
            parse_reply(r#"{"навыки": "Python"}"#),
            Err(InterpretError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_parse_uses_provider_reply() {
        let interp = interpreter(Replying(
            r#"{"навыки": [{"навык": "Rust", "статус": "optional", "баллы": 1}], "курс": 2}"#
                .to_string(),
        ));
        let parsed = interp.parse("желательно Rust, 2 курс").await;
        assert_eq!(parsed.skills, vec![Skill::optional("Rust", 1)]);
        assert_eq!(parsed.course, Some(Course::Number(2)));
        assert_skill_invariants(&parsed);
    }

    #[tokio::test]
    async fn test_provider_failure_yields_empty_query() {
        let interp = interpreter(Failing);
        assert!(matches!(
            interp.interpret("anything").await,
            Err(InterpretError::Unavailable(_))
        ));
        let parsed = interp.parse("anything").await;
        assert_eq!(parsed, ParsedQuery::default());
        assert!(parsed.skills.is_empty());
        assert!(parsed.requirements.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_reply_yields_empty_query() {
        let interp = interpreter(Replying("not json at all".into()));
        assert!(interp.parse("anything").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_empty_query() {
        let interp = interpreter(Slow);
        let err = interp.interpret("anything").await.unwrap_err();
        assert!(matches!(err, InterpretError::Unavailable(_)));
        assert!(interp.parse("anything").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_raised_timeout_lets_slow_provider_answer() {
        let interp = interpreter(Slow);
        interp.set_timeout(Duration::from_secs(10));
        assert_eq!(interp.timeout(), Duration::from_secs(10));
        assert!(interp.interpret("anything").await.unwrap().is_empty());
    }
}
