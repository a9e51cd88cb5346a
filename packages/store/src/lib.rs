pub mod config;
pub mod error;
pub mod models;
pub mod repo;

mod memory;
pub use memory::MemoryBackend;

pub use config::BackendConfig;
pub use error::{ConfigError, GatewayError, RepositoryError};
pub use models::{
    Comment, CommentInsert, Identity, Report, ReportFilter, ReportInsert, Vote, VoteInsert,
    VoteTally, VoteType,
};
pub use repo::{first_row, Backend, Repository};
