//! Natural-language query interpretation and filter translation.
//!
//! [`interpreter::QueryInterpreter`] asks the chat model for a structured
//! breakdown of the query; [`filters::build_filters`] turns that breakdown
//! into exact-match predicates for the user store.

pub mod faculty;
pub mod filters;
pub mod interpreter;
pub mod weights;

pub use filters::build_filters;
pub use interpreter::QueryInterpreter;
