//! HTTP handlers for skillbridge-service.

pub mod api;
pub mod health;
