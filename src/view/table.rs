//! Artist table rendering
//!
//! Pure functions of the board: rows are laid out in display order, the
//! total is taken over every record, and user input is turned into events.
//! Nothing here talks to the network.

use std::fmt::Write as _;

use crate::client::{BoardRow, EditState};
use crate::core::SortLib;
use crate::models::{ArtistField, ArtistUpdate, YesNo};

/// User interaction forwarded to the board
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    Edit {
        id: String,
        field: ArtistField,
        raw: String,
    },
    Toggle {
        id: String,
    },
}

/// Cost input coercion: empty, unparseable, negative or non-finite input is 0
pub fn parse_cost_input(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(cost) if cost.is_finite() && cost >= 0.0 => cost,
        _ => 0.0,
    }
}

/// Turn raw cell input into a typed update; None when the input is unusable
pub fn coerce_input(field: ArtistField, raw: &str) -> Option<ArtistUpdate> {
    match field {
        ArtistField::Name => Some(ArtistUpdate::Name(raw.to_string())),
        ArtistField::Response => YesNo::parse_input(raw).map(ArtistUpdate::Response),
        ArtistField::Available => YesNo::parse_input(raw).map(ArtistUpdate::Available),
        ArtistField::Cost => Some(ArtistUpdate::Cost(parse_cost_input(raw))),
        ArtistField::Saved => match raw.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(ArtistUpdate::Saved(true)),
            "false" | "no" | "0" => Some(ArtistUpdate::Saved(false)),
            _ => None,
        },
    }
}

/// Cost as shown in the table
pub fn format_cost(cost: f64) -> String {
    if cost.fract() == 0.0 {
        format!("£{:.0}", cost)
    } else {
        format!("£{:.2}", cost)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// 1-based position in display order
    pub position: usize,
    pub id: String,
    pub name: String,
    pub response: YesNo,
    pub available: YesNo,
    pub cost: f64,
    pub selected: bool,
    pub is_temp: bool,
    pub sync: Option<EditState>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub rows: Vec<TableRow>,
    pub total_cost: f64,
}

impl TableView {
    pub fn build(rows: &[BoardRow]) -> Self {
        // totals come from the full collection, not the sorted view
        let total_cost = SortLib::total_cost(rows);
        let rows = SortLib::sort_for_display(rows)
            .into_iter()
            .enumerate()
            .map(|(index, row)| TableRow {
                position: index + 1,
                id: row.id().to_string(),
                name: row.artist.name.clone(),
                response: row.artist.response,
                available: row.artist.available,
                cost: row.artist.cost,
                selected: row.selected,
                is_temp: row.is_temp,
                sync: row.sync_state(),
            })
            .collect();

        Self { rows, total_cost }
    }

    /// Plain-text table for terminals
    pub fn render(&self) -> String {
        let name_width = self
            .rows
            .iter()
            .map(|r| r.name.chars().count())
            .max()
            .unwrap_or(0)
            .max(4);
        let id_width = self
            .rows
            .iter()
            .map(|r| r.id.len())
            .max()
            .unwrap_or(0)
            .max(2);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>3}  {:<name_width$}  {:<8}  {:<9}  {:>10}  {:<6}  {:<id_width$}",
            "#",
            "Name",
            "Response",
            "Available",
            "Cost (£)",
            "Select",
            "Id",
        );

        for row in &self.rows {
            let marker = match (row.is_temp, row.sync) {
                (true, _) => " ~",
                (false, Some(EditState::Pending)) => " *",
                (false, Some(EditState::Failed)) => " !",
                _ => "",
            };
            let _ = writeln!(
                out,
                "{:>3}  {:<name_width$}  {:<8}  {:<9}  {:>10}  {:<6}  {:<id_width$}{}",
                row.position,
                row.name,
                row.response.as_str(),
                row.available.as_str(),
                format_cost(row.cost),
                if row.selected { "[x]" } else { "[ ]" },
                row.id,
                marker,
            );
        }

        let _ = write!(out, "Total Cost: {}", format_cost(self.total_cost));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::BoardState;
    use crate::models::{Artist, NewArtist};

    fn board() -> BoardState {
        let artist = |id: &str, response, available, cost| {
            Artist::from_new(
                id.to_string(),
                NewArtist {
                    name: id.to_string(),
                    response,
                    available,
                    cost,
                },
            )
        };
        let mut board = BoardState::new();
        board.load(vec![
            artist("no-no", YesNo::No, YesNo::No, 900.0),
            artist("yes-yes", YesNo::Yes, YesNo::Yes, 100.0),
            artist("yes-no", YesNo::Yes, YesNo::No, 500.0),
        ]);
        board
    }

    #[test]
    fn test_cost_coercion() {
        assert_eq!(parse_cost_input(""), 0.0);
        assert_eq!(parse_cost_input("   "), 0.0);
        assert_eq!(parse_cost_input("750"), 750.0);
        assert_eq!(parse_cost_input(" 12.5 "), 12.5);
        assert_eq!(parse_cost_input("1e3"), 1000.0);
        assert_eq!(parse_cost_input("abc"), 0.0);
        assert_eq!(parse_cost_input("-20"), 0.0);
        assert_eq!(parse_cost_input("NaN"), 0.0);
        assert_eq!(parse_cost_input("inf"), 0.0);
    }

    #[test]
    fn test_coerce_input() {
        assert_eq!(
            coerce_input(ArtistField::Cost, ""),
            Some(ArtistUpdate::Cost(0.0))
        );
        assert_eq!(
            coerce_input(ArtistField::Response, "yes"),
            Some(ArtistUpdate::Response(YesNo::Yes))
        );
        assert_eq!(coerce_input(ArtistField::Available, "later"), None);
        assert_eq!(
            coerce_input(ArtistField::Name, " spaced "),
            Some(ArtistUpdate::Name(" spaced ".into()))
        );
    }

    #[test]
    fn test_build_sorts_and_totals() {
        let board = board();
        let view = TableView::build(board.rows());

        let ids: Vec<&str> = view.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["yes-yes", "yes-no", "no-no"]);
        assert_eq!(view.rows[0].position, 1);
        assert_eq!(view.total_cost, 1500.0);
        // board order untouched
        assert_eq!(board.rows()[0].id(), "no-no");
    }

    #[test]
    fn test_total_unaffected_by_selection() {
        let mut board = board();
        board.toggle_select("yes-no");
        assert_eq!(TableView::build(board.rows()).total_cost, 1500.0);
    }

    #[test]
    fn test_render_marks_rows() {
        let mut board = board();
        board.toggle_select("no-no");
        board.edit("yes-no", ArtistUpdate::Cost(12.5));
        board.add();

        let text = TableView::build(board.rows()).render();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].contains("Cost (£)"));
        assert!(text.contains("[x]"));
        assert!(text.contains("£12.50"));
        assert!(lines.iter().any(|l| l.ends_with(" *")));
        assert!(lines.iter().any(|l| l.ends_with(" ~")));
        assert_eq!(*lines.last().unwrap(), "Total Cost: £1012.50");
    }
}
