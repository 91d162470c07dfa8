//! Data models: configuration, requests and results.

pub mod config;
pub mod request;
pub mod result;
