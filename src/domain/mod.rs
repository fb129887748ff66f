//! Domain layer - Pure business abstractions
//!
//! This layer contains NO framework dependencies (no SeaORM, no Axum).
//! Only trait definitions, search/validation rules and domain error types.

pub mod errors;
pub mod repositories;
pub mod search;
pub mod validation;

pub use errors::DomainError;
pub use repositories::*;
pub use search::{BookQuery, SearchMethod, SearchRange, UserQuery};
pub use validation::ValidationErrors;
