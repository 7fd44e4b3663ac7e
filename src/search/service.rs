use std::time::Instant;

use serde::Serialize;

const SUGGESTION_SUFFIXES: &[&str] = &["документация", "спецификация", "руководство"];
const MAX_SUGGESTIONS: usize = 5;

const TRENDING_SEARCHES: &[&str] = &[
    "Техническая документация",
    "Программная архитектура",
    "Системное администрирование",
    "Безопасность данных",
];

/// Full-text search envelope.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResults {
    pub results: Vec<serde_json::Value>,
    pub total: usize,
    pub query: String,
    pub processing_time: f64,
}

/// Placeholder full-text search backend.
///
/// `search` has no index behind it yet and always returns an empty page;
/// suggestions and trending entries are canned.
#[derive(Debug, Clone, Default)]
pub struct SearchService;

impl SearchService {
    pub fn new() -> Self {
        Self
    }

    // TODO: back this with the users table once profile text is indexed
    pub fn search(&self, query: &str) -> SearchResults {
        let started = Instant::now();
        SearchResults {
            results: Vec::new(),
            total: 0,
            query: query.to_string(),
            processing_time: started.elapsed().as_secs_f64(),
        }
    }

    pub fn suggestions(&self, partial_query: &str) -> Vec<String> {
        SUGGESTION_SUFFIXES
            .iter()
            .map(|suffix| format!("{partial_query} {suffix}"))
            .take(MAX_SUGGESTIONS)
            .collect()
    }

    pub fn trending(&self) -> Vec<String> {
        TRENDING_SEARCHES.iter().map(|s| s.to_string()).collect()
    }
}
