pub mod service;
pub mod tags;

pub use service::{SearchResults, SearchService};
pub use tags::{merge_query_tags, merge_tags};
