#![warn(clippy::all, missing_docs)]

//! Core domain logic for the Cardfile contact manager.
//!
//! This crate hosts the contact model and session store, creation-form
//! validation, profile-picture loading, and configuration handling used by
//! the terminal UI and any future frontends.

pub mod config;
pub mod models;
pub mod picture;
pub mod store;
pub mod validate;

pub use config::AppConfig;
pub use models::{Contact, ContactDraft};
pub use picture::{LoadedPicture, PictureEntry, PictureError, PLACEHOLDER_PICTURE_URL};
pub use store::{ContactStore, IdGenerator, SequentialIds};
pub use validate::{FieldError, FieldReport};
