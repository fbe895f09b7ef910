//! Core gateway engine module

pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod identity;
pub mod models;
pub mod normalize;
pub mod prompts;
pub mod quota;
pub mod service;
pub mod store;
