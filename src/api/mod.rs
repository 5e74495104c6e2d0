//! Request pipeline for the travel agency backend.
//!
//! Every call goes through [`ApiClient`], which attaches the admin bearer
//! token, drives the overlay from the number of in-flight requests,
//! caches GET responses and turns failures into user-facing messages.

mod client;
mod error;
mod options;
mod pending;
mod travel;
pub mod types;

pub use client::{ApiClient, ApiResponse, ResponseSource};
pub use error::ApiError;
pub use options::{RequestOptions, Verb};
pub use pending::PendingCounter;
pub use travel::TravelApi;
