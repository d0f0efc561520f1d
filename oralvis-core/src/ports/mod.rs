//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod image_store;
mod renderer;
mod repository;

pub use image_store::ImageStore;
pub use renderer::DocumentRenderer;
pub use repository::{AccountStore, ScanRepository};
