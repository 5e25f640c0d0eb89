//! Client-side artist board
//!
//! Holds the session copy of every record and applies edits optimistically.
//! Nothing here performs I/O: mutations return the `SyncCommand` that must be
//! sent to the server, and server replies come back as `SyncOutcome`s.
//!
//! Each synced field edit moves through `Pending -> Confirmed | Failed`.
//! Only the newest edit of a (record, field) pair decides what is shown; a
//! failed newest edit rolls the field back to the last value the server
//! acknowledged.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::BookingRow;
use crate::models::{Artist, ArtistField, ArtistUpdate, NewArtist, YesNo};
use crate::view::TableEvent;

pub type EditTicket = u64;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Placeholder id for a record the server has not acknowledged yet
pub fn temp_id() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("temp-{}-{}", nanos, n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Copy)]
struct FieldSync {
    ticket: EditTicket,
    state: EditState,
}

/// One record as the client sees it
#[derive(Debug, Clone)]
pub struct BoardRow {
    /// What is displayed, including unconfirmed edits
    pub artist: Artist,
    pub selected: bool,
    pub is_temp: bool,
    /// Last values the server acknowledged
    confirmed: Artist,
    fields: HashMap<ArtistField, FieldSync>,
    /// Fields edited before the record had a server id
    edited_while_temp: Vec<ArtistField>,
}

impl BoardRow {
    fn from_server(artist: Artist) -> Self {
        Self {
            confirmed: artist.clone(),
            artist,
            selected: false,
            is_temp: false,
            fields: HashMap::new(),
            edited_while_temp: Vec::new(),
        }
    }

    fn temporary(id: String, draft: &NewArtist) -> Self {
        let mut row = Self::from_server(Artist::from_new(id, draft.clone()));
        row.is_temp = true;
        row
    }

    pub fn id(&self) -> &str {
        &self.artist.id
    }

    pub fn field_state(&self, field: ArtistField) -> Option<EditState> {
        self.fields.get(&field).map(|f| f.state)
    }

    /// Newest edit state across all fields, failures first
    pub fn sync_state(&self) -> Option<EditState> {
        let states: Vec<EditState> = ArtistField::ALL
            .iter()
            .filter_map(|field| self.field_state(*field))
            .collect();
        if states.contains(&EditState::Failed) {
            Some(EditState::Failed)
        } else if states.contains(&EditState::Pending) {
            Some(EditState::Pending)
        } else if states.is_empty() {
            None
        } else {
            Some(EditState::Confirmed)
        }
    }
}

impl BookingRow for BoardRow {
    fn response(&self) -> YesNo {
        self.artist.response
    }

    fn available(&self) -> YesNo {
        self.artist.available
    }

    fn cost(&self) -> f64 {
        self.artist.cost
    }
}

/// Server call requested by a local mutation
#[derive(Debug, Clone, PartialEq)]
pub enum SyncCommand {
    UpdateOne {
        ticket: EditTicket,
        id: String,
        update: ArtistUpdate,
    },
    Create {
        temp_id: String,
        draft: NewArtist,
    },
    UpdateMany {
        ids: Vec<String>,
        update: ArtistUpdate,
    },
}

/// Server reply to a `SyncCommand`
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    Updated {
        ticket: EditTicket,
        id: String,
        field: ArtistField,
        result: Result<Artist, String>,
    },
    Created {
        temp_id: String,
        result: Result<Artist, String>,
    },
    BulkUpdated {
        ids: Vec<String>,
        update: ArtistUpdate,
        result: Result<usize, String>,
    },
}

/// Something the user should be told about
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Saved(usize),
    SaveFailed(String),
    EditFailed {
        id: String,
        field: ArtistField,
        message: String,
    },
    CreateFailed(String),
}

/// Result of applying a server reply
#[derive(Debug, Default)]
pub struct Applied {
    pub follow_up: Vec<SyncCommand>,
    pub notice: Option<Notice>,
}

#[derive(Debug, Default)]
pub struct BoardState {
    rows: Vec<BoardRow>,
    next_ticket: EditTicket,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a fresh server listing; nothing starts selected
    pub fn load(&mut self, artists: Vec<Artist>) {
        self.rows = artists.into_iter().map(BoardRow::from_server).collect();
    }

    pub fn rows(&self) -> &[BoardRow] {
        &self.rows
    }

    pub fn row(&self, id: &str) -> Option<&BoardRow> {
        self.rows.iter().find(|r| r.id() == id)
    }

    fn row_mut(&mut self, id: &str) -> Option<&mut BoardRow> {
        self.rows.iter_mut().find(|r| r.id() == id)
    }

    fn ticket(&mut self) -> EditTicket {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// Apply a field edit locally; temporary records are never synced
    pub fn edit(&mut self, id: &str, update: ArtistUpdate) -> Option<SyncCommand> {
        let ticket = self.ticket();
        let row = self.row_mut(id)?;
        let field = update.field();
        update.apply(&mut row.artist);

        if row.is_temp {
            if !row.edited_while_temp.contains(&field) {
                row.edited_while_temp.push(field);
            }
            return None;
        }

        row.fields.insert(
            field,
            FieldSync {
                ticket,
                state: EditState::Pending,
            },
        );
        Some(SyncCommand::UpdateOne {
            ticket,
            id: id.to_string(),
            update,
        })
    }

    /// Flip the checkbox of one row; returns the new state
    pub fn toggle_select(&mut self, id: &str) -> Option<bool> {
        let row = self.row_mut(id)?;
        row.selected = !row.selected;
        Some(row.selected)
    }

    /// Route an event from the table view
    pub fn handle(&mut self, event: TableEvent) -> Option<SyncCommand> {
        match event {
            TableEvent::Edit { id, field, raw } => {
                let update = crate::view::coerce_input(field, &raw)?;
                self.edit(&id, update)
            }
            TableEvent::Toggle { id } => {
                self.toggle_select(&id);
                None
            }
        }
    }

    /// Append a temporary record; returns its placeholder id and the create request
    pub fn add(&mut self) -> (String, SyncCommand) {
        let draft = NewArtist::default();
        let temp_id = temp_id();
        self.rows.push(BoardRow::temporary(temp_id.clone(), &draft));
        let cmd = SyncCommand::Create {
            temp_id: temp_id.clone(),
            draft,
        };
        (temp_id, cmd)
    }

    /// Bulk-commit every selected, non-temporary record
    pub fn save_selected(&mut self) -> Option<SyncCommand> {
        let ids: Vec<String> = self
            .rows
            .iter()
            .filter(|r| r.selected && !r.is_temp)
            .map(|r| r.id().to_string())
            .collect();

        if ids.is_empty() {
            return None;
        }
        Some(SyncCommand::UpdateMany {
            ids,
            update: ArtistUpdate::Saved(true),
        })
    }

    /// Reconcile a server reply
    pub fn apply(&mut self, outcome: SyncOutcome) -> Applied {
        match outcome {
            SyncOutcome::Updated {
                ticket,
                id,
                field,
                result,
            } => self.apply_updated(ticket, &id, field, result),
            SyncOutcome::Created { temp_id, result } => self.apply_created(&temp_id, result),
            SyncOutcome::BulkUpdated {
                ids,
                update,
                result,
            } => self.apply_bulk(&ids, &update, result),
        }
    }

    fn apply_updated(
        &mut self,
        ticket: EditTicket,
        id: &str,
        field: ArtistField,
        result: Result<Artist, String>,
    ) -> Applied {
        let Some(row) = self.row_mut(id) else {
            return Applied::default();
        };
        let newest = row.fields.get(&field).copied();
        let is_newest = newest.map(|f| f.ticket == ticket).unwrap_or(false);

        match result {
            Ok(server) => {
                let value = ArtistUpdate::read(field, &server);
                value.apply(&mut row.confirmed);

                if is_newest {
                    row.fields.insert(
                        field,
                        FieldSync {
                            ticket,
                            state: EditState::Confirmed,
                        },
                    );
                } else if newest.map(|f| f.state) == Some(EditState::Failed) {
                    // a later edit failed and was rolled back; show what the server has now
                    value.apply(&mut row.artist);
                }
                Applied::default()
            }
            Err(message) if is_newest => {
                ArtistUpdate::read(field, &row.confirmed).apply(&mut row.artist);
                row.fields.insert(
                    field,
                    FieldSync {
                        ticket,
                        state: EditState::Failed,
                    },
                );
                Applied {
                    follow_up: Vec::new(),
                    notice: Some(Notice::EditFailed {
                        id: id.to_string(),
                        field,
                        message,
                    }),
                }
            }
            // superseded by a newer edit of the same field
            Err(_) => Applied::default(),
        }
    }

    fn apply_created(&mut self, temp_id: &str, result: Result<Artist, String>) -> Applied {
        let Some(index) = self.rows.iter().position(|r| r.id() == temp_id) else {
            return Applied::default();
        };

        let server = match result {
            Ok(server) => server,
            Err(message) => {
                self.rows.remove(index);
                return Applied {
                    follow_up: Vec::new(),
                    notice: Some(Notice::CreateFailed(message)),
                };
            }
        };

        let temp = std::mem::replace(&mut self.rows[index], BoardRow::from_server(server.clone()));

        // carry edits made before the id existed over to the real record
        let mut follow_up = Vec::new();
        for field in temp.edited_while_temp {
            let update = ArtistUpdate::read(field, &temp.artist);
            if ArtistUpdate::read(field, &server) == update {
                continue;
            }
            if let Some(cmd) = self.edit(&server.id, update) {
                follow_up.push(cmd);
            }
        }

        Applied {
            follow_up,
            notice: None,
        }
    }

    fn apply_bulk(
        &mut self,
        ids: &[String],
        update: &ArtistUpdate,
        result: Result<usize, String>,
    ) -> Applied {
        match result {
            Ok(_) => {
                for row in self.rows.iter_mut().filter(|r| ids.iter().any(|id| id == r.id())) {
                    row.selected = false;
                    row.is_temp = false;
                    update.apply(&mut row.artist);
                    update.apply(&mut row.confirmed);
                }
                Applied {
                    follow_up: Vec::new(),
                    notice: Some(Notice::Saved(ids.len())),
                }
            }
            Err(message) => Applied {
                follow_up: Vec::new(),
                notice: Some(Notice::SaveFailed(message)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_artist(id: &str, cost: f64) -> Artist {
        Artist::from_new(
            id.to_string(),
            NewArtist {
                name: id.to_string(),
                cost,
                ..NewArtist::default()
            },
        )
    }

    fn loaded() -> BoardState {
        let mut board = BoardState::new();
        board.load(vec![server_artist("a", 100.0), server_artist("b", 200.0)]);
        board
    }

    fn ticket_of(cmd: &SyncCommand) -> EditTicket {
        match cmd {
            SyncCommand::UpdateOne { ticket, .. } => *ticket,
            other => panic!("expected UpdateOne, got {:?}", other),
        }
    }

    #[test]
    fn test_load_clears_selection() {
        let mut board = loaded();
        board.toggle_select("a");
        board.load(vec![server_artist("a", 100.0)]);
        assert!(!board.rows()[0].selected);
        assert!(!board.rows()[0].is_temp);
    }

    #[test]
    fn test_edit_is_optimistic_and_pending() {
        let mut board = loaded();
        let cmd = board.edit("a", ArtistUpdate::Cost(750.0)).unwrap();

        assert_eq!(board.row("a").unwrap().artist.cost, 750.0);
        assert_eq!(
            board.row("a").unwrap().field_state(ArtistField::Cost),
            Some(EditState::Pending)
        );
        match cmd {
            SyncCommand::UpdateOne { id, update, .. } => {
                assert_eq!(id, "a");
                assert_eq!(update, ArtistUpdate::Cost(750.0));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_edit_confirmed() {
        let mut board = loaded();
        let cmd = board.edit("a", ArtistUpdate::Cost(750.0)).unwrap();
        board.apply(SyncOutcome::Updated {
            ticket: ticket_of(&cmd),
            id: "a".into(),
            field: ArtistField::Cost,
            result: Ok(server_artist("a", 750.0)),
        });

        let row = board.row("a").unwrap();
        assert_eq!(row.field_state(ArtistField::Cost), Some(EditState::Confirmed));
        assert_eq!(row.confirmed.cost, 750.0);
        assert_eq!(row.artist.cost, 750.0);
    }

    #[test]
    fn test_failed_edit_rolls_back() {
        let mut board = loaded();
        let cmd = board.edit("a", ArtistUpdate::Cost(750.0)).unwrap();
        let applied = board.apply(SyncOutcome::Updated {
            ticket: ticket_of(&cmd),
            id: "a".into(),
            field: ArtistField::Cost,
            result: Err("boom".into()),
        });

        let row = board.row("a").unwrap();
        assert_eq!(row.artist.cost, 100.0);
        assert_eq!(row.field_state(ArtistField::Cost), Some(EditState::Failed));
        assert_eq!(row.sync_state(), Some(EditState::Failed));
        assert!(matches!(applied.notice, Some(Notice::EditFailed { .. })));
    }

    #[test]
    fn test_stale_failure_does_not_clobber_newer_edit() {
        let mut board = loaded();
        let first = board.edit("a", ArtistUpdate::Cost(300.0)).unwrap();
        let second = board.edit("a", ArtistUpdate::Cost(400.0)).unwrap();

        let applied = board.apply(SyncOutcome::Updated {
            ticket: ticket_of(&first),
            id: "a".into(),
            field: ArtistField::Cost,
            result: Err("late failure".into()),
        });
        assert!(applied.notice.is_none());
        assert_eq!(board.row("a").unwrap().artist.cost, 400.0);
        assert_eq!(
            board.row("a").unwrap().field_state(ArtistField::Cost),
            Some(EditState::Pending)
        );

        board.apply(SyncOutcome::Updated {
            ticket: ticket_of(&second),
            id: "a".into(),
            field: ArtistField::Cost,
            result: Ok(server_artist("a", 400.0)),
        });
        assert_eq!(
            board.row("a").unwrap().field_state(ArtistField::Cost),
            Some(EditState::Confirmed)
        );
    }

    #[test]
    fn test_temp_record_edits_stay_local() {
        let mut board = loaded();
        let (temp_id, create) = board.add();
        match &create {
            SyncCommand::Create { temp_id: sent, draft } => {
                assert_eq!(sent, &temp_id);
                assert_eq!(draft, &NewArtist::default());
            }
            other => panic!("unexpected command {:?}", other),
        }

        let row = board.row(&temp_id).unwrap();
        assert!(row.is_temp);
        assert_eq!(row.artist.response, YesNo::No);

        assert!(board
            .edit(&temp_id, ArtistUpdate::Name("Late Band".into()))
            .is_none());
        assert_eq!(board.row(&temp_id).unwrap().artist.name, "Late Band");
    }

    #[test]
    fn test_temp_ids_are_distinct() {
        let mut board = BoardState::new();
        let (a, _) = board.add();
        let (b, _) = board.add();
        assert_ne!(a, b);
        assert_eq!(board.rows().len(), 2);
    }

    #[test]
    fn test_created_replaces_temp_and_carries_edits() {
        let mut board = loaded();
        let (temp_id, _) = board.add();
        board.toggle_select(&temp_id);
        board.edit(&temp_id, ArtistUpdate::Name("Late Band".into()));

        let applied = board.apply(SyncOutcome::Created {
            temp_id: temp_id.clone(),
            result: Ok(server_artist("srv-1", 0.0)),
        });

        assert!(board.row(&temp_id).is_none());
        let row = board.row("srv-1").unwrap();
        assert!(!row.is_temp);
        assert!(!row.selected);
        assert_eq!(row.artist.name, "Late Band");
        assert_eq!(board.rows().len(), 3);
        assert_eq!(board.rows()[2].id(), "srv-1");

        assert_eq!(applied.follow_up.len(), 1);
        match &applied.follow_up[0] {
            SyncCommand::UpdateOne { id, update, .. } => {
                assert_eq!(id, "srv-1");
                assert_eq!(update, &ArtistUpdate::Name("Late Band".into()));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_failed_create_removes_temp() {
        let mut board = loaded();
        let (temp_id, _) = board.add();
        let applied = board.apply(SyncOutcome::Created {
            temp_id: temp_id.clone(),
            result: Err("down".into()),
        });
        assert!(board.row(&temp_id).is_none());
        assert_eq!(applied.notice, Some(Notice::CreateFailed("down".into())));
    }

    #[test]
    fn test_save_selected_skips_temp_and_empty() {
        let mut board = loaded();
        assert!(board.save_selected().is_none());

        let (temp_id, _) = board.add();
        board.toggle_select(&temp_id);
        assert!(board.save_selected().is_none());

        board.toggle_select("b");
        let cmd = board.save_selected().unwrap();
        assert_eq!(
            cmd,
            SyncCommand::UpdateMany {
                ids: vec!["b".to_string()],
                update: ArtistUpdate::Saved(true),
            }
        );

        let applied = board.apply(SyncOutcome::BulkUpdated {
            ids: vec!["b".to_string()],
            update: ArtistUpdate::Saved(true),
            result: Ok(1),
        });
        assert_eq!(applied.notice, Some(Notice::Saved(1)));
        let row = board.row("b").unwrap();
        assert!(!row.selected);
        assert_eq!(row.artist.saved, Some(true));
        // temp row keeps its selection
        assert!(board.row(&temp_id).unwrap().selected);
    }

    #[test]
    fn test_failed_save_keeps_selection() {
        let mut board = loaded();
        board.toggle_select("a");
        let applied = board.apply(SyncOutcome::BulkUpdated {
            ids: vec!["a".to_string()],
            update: ArtistUpdate::Saved(true),
            result: Err("offline".into()),
        });
        assert_eq!(applied.notice, Some(Notice::SaveFailed("offline".into())));
        assert!(board.row("a").unwrap().selected);
        assert_eq!(board.row("a").unwrap().artist.saved, None);
    }

    #[test]
    fn test_total_cost_includes_temp_rows() {
        let mut board = loaded();
        let (temp_id, _) = board.add();
        board.edit(&temp_id, ArtistUpdate::Cost(50.0));
        assert_eq!(crate::core::SortLib::total_cost(board.rows()), 350.0);
    }

    #[test]
    fn test_handle_table_events() {
        let mut board = loaded();
        let cmd = board.handle(TableEvent::Edit {
            id: "a".into(),
            field: ArtistField::Cost,
            raw: "".into(),
        });
        assert!(cmd.is_some());
        assert_eq!(board.row("a").unwrap().artist.cost, 0.0);

        assert!(board
            .handle(TableEvent::Toggle { id: "a".into() })
            .is_none());
        assert!(board.row("a").unwrap().selected);
    }
}
