//! Async driver for the artist board
//!
//! Local mutations apply immediately; the matching server calls run on
//! spawned tasks and report back over a channel. Nothing is awaited on the
//! edit path, so a slow update never blocks the next one.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::board::{BoardState, Notice, SyncCommand, SyncOutcome};
use super::http::{ArtistApi, ClientResult};
use crate::view::{TableEvent, TableView};

pub struct Session<A: ArtistApi + 'static> {
    api: Arc<A>,
    board: BoardState,
    tx: mpsc::UnboundedSender<SyncOutcome>,
    rx: mpsc::UnboundedReceiver<SyncOutcome>,
    in_flight: usize,
    notices: Vec<Notice>,
}

impl<A: ArtistApi + 'static> Session<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            board: BoardState::new(),
            tx,
            rx,
            in_flight: 0,
            notices: Vec::new(),
        }
    }

    /// Fetch every record from the server
    pub async fn load(&mut self) -> ClientResult<()> {
        let artists = self.api.list().await?;
        debug!(count = artists.len(), "loaded artists");
        self.board.load(artists);
        Ok(())
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn view(&self) -> TableView {
        TableView::build(self.board.rows())
    }

    pub fn handle(&mut self, event: TableEvent) {
        if let Some(cmd) = self.board.handle(event) {
            self.dispatch(cmd);
        }
    }

    /// Add a temporary row and return its placeholder id
    pub fn add(&mut self) -> String {
        let (temp_id, cmd) = self.board.add();
        self.dispatch(cmd);
        temp_id
    }

    /// Returns false when nothing eligible was selected
    pub fn save_selected(&mut self) -> bool {
        match self.board.save_selected() {
            Some(cmd) => {
                self.dispatch(cmd);
                true
            }
            None => false,
        }
    }

    /// Wait until no server call is outstanding
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.rx.recv().await {
                Some(outcome) => self.reconcile(outcome),
                None => break,
            }
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn reconcile(&mut self, outcome: SyncOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let applied = self.board.apply(outcome);
        if let Some(notice) = applied.notice {
            self.notices.push(notice);
        }
        for cmd in applied.follow_up {
            self.dispatch(cmd);
        }
    }

    fn dispatch(&mut self, cmd: SyncCommand) {
        self.in_flight += 1;
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = execute(api.as_ref(), cmd).await;
            if tx.send(outcome).is_err() {
                warn!("session dropped before a server reply arrived");
            }
        });
    }
}

async fn execute<A: ArtistApi>(api: &A, cmd: SyncCommand) -> SyncOutcome {
    match cmd {
        SyncCommand::UpdateOne { ticket, id, update } => {
            let result = api
                .update_one(&id, &update)
                .await
                .map_err(|e| e.to_string());
            SyncOutcome::Updated {
                ticket,
                id,
                field: update.field(),
                result,
            }
        }
        SyncCommand::Create { temp_id, draft } => {
            let result = api.create(&draft).await.map_err(|e| e.to_string());
            SyncOutcome::Created { temp_id, result }
        }
        SyncCommand::UpdateMany { ids, update } => {
            let result = api
                .update_many(&ids, &update)
                .await
                .map_err(|e| e.to_string());
            SyncOutcome::BulkUpdated {
                ids,
                update,
                result,
            }
        }
    }
}
