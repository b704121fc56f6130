//! Heygen API client for avatar video generation.

pub mod client;
pub mod models;

pub use client::HeygenClient;
