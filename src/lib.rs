//! # stroka
//!
//! Backend for a student networking directory. Students register with a
//! profile and a purpose (find people for a project, join one, expand their
//! network, or just explore), and others find them with free-text queries.
//!
//! ## Query pipeline
//!
//! ```text
//!   "нужен Python разработчик с 3 курса ИУ"
//!                    │
//!                    ▼
//!        ┌───────────────────────┐
//!        │   QueryInterpreter    │  one chat-model call, JSON reply
//!        │   (ChatProvider)      │  timeout → empty ParsedQuery
//!        └───────────┬───────────┘
//!                    │ ParsedQuery
//!                    ▼
//!        ┌───────────────────────┐
//!        │    build_filters      │  course "3 курс", faculty code,
//!        │    (pure)             │  user type, group
//!        └───────────┬───────────┘
//!                    │ FilterSet
//!                    ▼
//!        ┌───────────────────────┐
//!        │  UserStore            │  exact-match select,
//!        │  advanced_search      │  then required-skill filter
//!        └───────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, LLM and store
//! - [`models`] - Parsed queries, filters, user rows and request/response types
//! - [`llm`] - Chat provider trait and the HTTP client for Mistral/OpenAI/Ollama
//! - [`query`] - Query interpretation, weight ladder, faculty codes, filter building
//! - [`store`] - User store trait, REST and in-memory backends, aggregates
//! - [`registration`] - Registration validation and insert sequence
//! - [`search`] - Suggestions, trending queries, tag merging
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod query;
pub mod registration;
pub mod search;
pub mod state;
pub mod store;
