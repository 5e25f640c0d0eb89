//! Utility modules for festival contacts

pub mod auth;
