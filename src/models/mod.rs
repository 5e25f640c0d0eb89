//! Data models for festival contacts
//!
//! The artist record and the typed field updates that flow between the
//! browser client, the HTTP layer and the record store.

mod artist;
mod enums;

pub use artist::{Artist, ArtistField, ArtistUpdate, NewArtist, UpdateError};
pub use enums::YesNo;
