//! Terminal client for the travel agency backend.
//!
//! The interesting part is the request pipeline in [`api`]: one client
//! wrapper that attaches the admin token, drives the shared [`overlay`]
//! from the number of in-flight requests, memoizes GET responses in the
//! [`cache`] and classifies failures into user-facing messages.

pub mod api;
pub mod app;
pub mod cache;
pub mod commands;
pub mod config;
pub mod logging;
pub mod overlay;
pub mod session;
