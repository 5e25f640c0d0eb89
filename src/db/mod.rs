//! Database module for festival contacts
//!
//! SQLite storage for the artist collection using SQLx.

mod engine;
pub mod tables;

pub use engine::DbEngine;
pub use tables::ArtistTable;
