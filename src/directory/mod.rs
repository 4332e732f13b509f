//! Directory/mail HTTP API integration.
//!
//! Wraps the Microsoft Graph users-listing endpoint (with server-driven
//! pagination) and the sendMail endpoint.

pub mod client;
pub mod models;

pub use client::DirectoryClient;
pub use models::UserRecord;
