//! # API crate: remote access for the incident reporting client
//!
//! Everything here talks to a service outside the process. The controllers in
//! the `ui` crate never import `reqwest`; they go through the types below.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`gateway`] | [`Gateway`]: the HTTP implementation of [`store::Backend`] for the REST and storage endpoints |
//! | [`auth`] | Identity adapter: [`IdentityProvider`] trait, Firebase token exchange, in-memory provider |
//! | [`config`] | Loading [`store::BackendConfig`] from the environment |
//!
//! ## Wiring
//!
//! ```no_run
//! let config = api::config::backend_from_env()?;
//! let repo = store::Repository::new(api::Gateway::new(config.clone()), config.bucket);
//! # Ok::<(), store::ConfigError>(())
//! ```

pub mod auth;
pub mod config;
pub mod gateway;

pub use auth::{AuthError, FirebaseAuth, IdentityProvider, IdentityWatch, MemoryIdentity};
pub use gateway::Gateway;
pub use store::{Identity, Repository};

/// Repository backed by the hosted service.
pub type RemoteRepository = Repository<Gateway>;

/// Build a repository for the hosted service from `config`.
pub fn remote_repository(config: store::BackendConfig) -> RemoteRepository {
    let bucket = config.bucket.clone();
    Repository::new(Gateway::new(config), bucket)
}
