pub mod api;
pub mod bootstrap;
pub mod comments;
pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
pub mod moderation;
pub mod posts;
pub mod telemetry;
pub mod threading;
pub mod tree;
pub mod utils;
