//! Services Layer
//!
//! This module contains business logic extracted from HTTP handlers:
//! validation plus orchestration across repositories and storage.

pub mod account_service;
pub mod image_service;
pub mod profile_service;

pub use image_service::{ImageSize, ProfileImage};
pub use profile_service::ProfileForm;
