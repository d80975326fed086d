//! HTTP route handlers

pub mod monitor;
