//! Display ordering and totals for artist tables

use std::cmp::Ordering;

use crate::models::{Artist, YesNo};

/// Anything that can be laid out as a row of the artist table
pub trait BookingRow {
    fn response(&self) -> YesNo;
    fn available(&self) -> YesNo;
    fn cost(&self) -> f64;
}

impl BookingRow for Artist {
    fn response(&self) -> YesNo {
        self.response
    }

    fn available(&self) -> YesNo {
        self.available
    }

    fn cost(&self) -> f64 {
        self.cost
    }
}

/// Sorting library
pub struct SortLib;

impl SortLib {
    /// Response Yes first, then available Yes first, then cost high to low
    pub fn compare_for_display<T: BookingRow + ?Sized>(a: &T, b: &T) -> Ordering {
        a.response()
            .display_cmp(&b.response())
            .then_with(|| a.available().display_cmp(&b.available()))
            .then_with(|| b.cost().total_cmp(&a.cost()))
    }

    /// Sorted view over `rows`; the slice itself is left untouched
    pub fn sort_for_display<T: BookingRow>(rows: &[T]) -> Vec<&T> {
        let mut sorted: Vec<&T> = rows.iter().collect();
        // stable, so equal keys keep collection order between renders
        sorted.sort_by(|a, b| Self::compare_for_display(*a, *b));
        sorted
    }

    /// Sum of cost over every row, regardless of order or selection
    pub fn total_cost<T: BookingRow>(rows: &[T]) -> f64 {
        rows.iter().map(|r| r.cost()).sum()
    }
}
