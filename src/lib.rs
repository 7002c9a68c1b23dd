pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod queries;
pub mod server;
