//! Person record service.
//!
//! Persons are addressed by a token that is either a numeric id or a display
//! name. Names are stored in a canonical form (see [`normalize`]) and kept
//! unique by the backing store.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod normalize;
pub mod resolver;
pub mod service;
pub mod state;
pub mod store;

pub use app::build_router;
pub use error::{AppResult, PersonError};
pub use service::PersonService;
