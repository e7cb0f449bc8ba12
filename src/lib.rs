pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logger;
pub mod projects;
pub mod session;
pub mod state;
pub mod storage;
pub mod workflow;

pub use api::ApiClient;
pub use cache::{Mutation, QueryCache, ResourceGroup};
pub use error::{Error, Result};
pub use session::Session;
