//! Client side of artist synchronization
//!
//! `BoardState` is the optimistic in-memory copy of the records, `Session`
//! drives it against a server through any `ArtistApi`, and
//! `HttpArtistClient` is the reqwest implementation used by the CLI.

mod board;
mod http;
mod session;

pub use board::{BoardRow, EditState, Notice};
pub use http::{ClientError, HttpArtistClient};

#[cfg(test)]
pub use board::BoardState;
pub use session::Session;
