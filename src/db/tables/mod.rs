//! Database table operations

mod artist_table;

pub use artist_table::ArtistTable;
