pub mod audio;
pub mod auth;
pub mod config;
pub mod error;
pub mod library;
pub mod logging;
pub mod mpris;
pub mod runtime;
pub mod store;
