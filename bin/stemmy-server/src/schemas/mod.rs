//! Request / response DTO types.
//!
//! Field names follow the wire contract the browser client already speaks.
//! Types are annotated with [`utoipa`] attributes to generate the OpenAPI
//! document.

pub mod chat;
pub mod emotion;
pub mod health;
pub mod topic;
