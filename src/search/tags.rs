use serde_json::{Map, Value};

use crate::models::{ParsedQuery, Skill};
use crate::query::faculty::resolve_faculty_code;
use crate::query::interpreter::normalize_tagged_skill;

/// Merge user-picked tags into a serialized parsed query.
///
/// Array fields are extended with the tag values, any other existing field
/// is replaced, and unknown tag keys are added as-is.
pub fn merge_tags(parsed: Value, tags: &Map<String, Value>) -> Value {
    let mut merged = match parsed {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    for (key, tag_values) in tags {
        match merged.get_mut(key) {
            Some(Value::Array(existing)) => match tag_values {
                Value::Array(values) => existing.extend(values.iter().cloned()),
                other => existing.push(other.clone()),
            },
            _ => {
                merged.insert(key.clone(), tag_values.clone());
            }
        }
    }

    Value::Object(merged)
}

/// Merge tags into a parsed query and restore its invariants.
///
/// Every skill ends up a well-formed `Skill`, and a `faculty` tag re-resolves
/// `faculty_code` unless the tags set the code themselves.
pub fn merge_query_tags(parsed: &ParsedQuery, tags: &Map<String, Value>) -> Value {
    let parsed_json = serde_json::to_value(parsed).unwrap_or_default();
    let mut merged = merge_tags(parsed_json, tags);
    if let Value::Object(fields) = &mut merged {
        normalize_skills(fields);
        if tags.contains_key("faculty") && !tags.contains_key("faculty_code") {
            let code = fields
                .get("faculty")
                .and_then(Value::as_str)
                .and_then(resolve_faculty_code);
            fields.insert(
                "faculty_code".to_string(),
                code.map_or(Value::Null, Value::from),
            );
        }
    }
    merged
}

fn normalize_skills(fields: &mut Map<String, Value>) {
    let Some(Value::Array(items)) = fields.get("skills") else {
        return;
    };
    let skills: Vec<Skill> = items.iter().filter_map(normalize_tagged_skill).collect();
    fields.insert(
        "skills".to_string(),
        serde_json::to_value(skills).unwrap_or_default(),
    );
}
