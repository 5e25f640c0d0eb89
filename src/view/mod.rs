//! Presentation of the artist board

mod table;

pub use table::{coerce_input, TableEvent, TableView};
