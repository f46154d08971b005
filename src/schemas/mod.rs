//! HTTP request / response types (serde + OpenAPI schemas).

pub mod chat;
pub mod event;
pub mod session;
