//! Shared pieces of Sonic Compass: wire types, query handling, the backend
//! client, configuration and platform paths.

pub mod client;
pub mod config;
pub mod platform;
pub mod protocol;
pub mod query;
