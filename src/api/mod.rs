//! Request extraction shared by the handlers

pub mod json;

pub use json::ApiJson;
