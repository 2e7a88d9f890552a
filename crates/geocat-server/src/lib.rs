//! geocat-server: Service layer of the catalog
//!
//! This crate wires the domain to the outside world:
//! - Configuration management
//! - Logging bootstrap
//! - Catalog fixtures (YAML seeds for the in-memory store)
//! - The `metadata.admin` privileges handler
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                geocat-server                │
//! ├─────────────────────────────────────────────┤
//! │  config.rs      - Configuration management  │
//! │  error.rs       - Handler and fixture errors│
//! │  observability/ - Logging setup             │
//! │  fixtures.rs    - YAML catalog seeds        │
//! │  handlers/      - Request handlers          │
//! │    admin_oper.rs - Privilege matrix         │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod fixtures;
pub mod handlers;
pub mod observability;

// Re-exports for convenience
pub use config::{ConfigLoadError, ServerConfig};
pub use error::{FixtureError, HandlerError, HandlerResult};
pub use fixtures::CatalogFixture;
pub use handlers::{AdminOperParams, AdminOperResponse, GetAdminOperHandler};
