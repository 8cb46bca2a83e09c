pub mod config;
pub mod errors;
pub mod gitlab_client;
pub mod provider;
pub mod queries;
pub mod types;
