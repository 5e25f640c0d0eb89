//! Festival contacts - booking tracker for festival artists
//!
//! `serve` runs the HTTP API over the configured record store; the other
//! subcommands are a terminal client for a running server.

mod api;
mod client;
mod config;
mod core;
mod db;
mod models;
mod stores;
mod utils;
mod view;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::{ClientError, HttpArtistClient, Notice, Session};
use crate::config::{Paths, Settings, StoreBackend};
use crate::models::ArtistField;
use crate::stores::ArtistStore;
use crate::view::{coerce_input, TableEvent};

/// Festival contacts - track artist bookings for a festival
#[derive(Parser, Debug)]
#[command(name = "festival-contacts")]
#[command(version)]
#[command(about = "Track which artists have responded, are available and what they cost")]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),

    /// Print the artist table
    List(RemoteArgs),

    /// Add an artist
    Add {
        #[command(flatten)]
        remote: RemoteArgs,

        #[arg(long)]
        name: Option<String>,

        /// Yes or No
        #[arg(long)]
        response: Option<String>,

        /// Yes or No
        #[arg(long)]
        available: Option<String>,

        #[arg(long)]
        cost: Option<String>,
    },

    /// Change one field of one artist
    Edit {
        #[command(flatten)]
        remote: RemoteArgs,

        id: String,

        /// name, response, available or cost
        field: String,

        value: String,
    },

    /// Mark artists as saved
    Save {
        #[command(flatten)]
        remote: RemoteArgs,

        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Host address to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Path to config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Record store backend (sqlite or memory)
    #[arg(long)]
    store: Option<String>,

    /// Path to web client
    #[arg(long)]
    client: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RemoteArgs {
    /// Server base URL
    #[arg(long, default_value = "http://localhost:3000")]
    server: String,

    /// Access password, when the server requires one
    #[arg(long, env = "FESTIVAL_ACCESS_PASSWORD")]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("{},sqlx=warn", log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::List(remote) => {
            let session = connect(&remote).await?;
            println!("{}", session.view().render());
            Ok(())
        }
        Command::Add {
            remote,
            name,
            response,
            available,
            cost,
        } => add(&remote, name, response, available, cost).await,
        Command::Edit {
            remote,
            id,
            field,
            value,
        } => edit(&remote, id, &field, value).await,
        Command::Save { remote, ids } => save(&remote, &ids).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    info!("Festival contacts v{} starting...", env!("CARGO_PKG_VERSION"));

    let paths = Paths::new(args.config, args.client)?;
    info!("Config directory: {:?}", paths.config_dir());

    let mut settings = Settings::load(&paths)?;
    settings.apply_env()?;
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(store) = args.store {
        settings.database.backend = match StoreBackend::from_str(&store) {
            Some(backend) => backend,
            None => bail!("--store must be sqlite or memory, got {}", store),
        };
    }
    settings.validate()?;

    let store = open_store(&settings, &paths).await?;
    let service = core::SyncService::new(Arc::clone(&store));
    let gate = api::AccessGate::from_settings(&settings);
    if gate.is_open() {
        info!("No access password configured; artist routes are open");
    }

    let client_path = paths.client_path().to_path_buf();
    if !client_path.is_dir() {
        warn!("Web client not found at {:?}; serving API only", client_path);
    }

    let addr = format!("{}:{}", settings.host, settings.port);
    info!("Server listening on http://{}", addr);

    use actix_cors::Cors;
    use actix_web::{middleware, web, App, HttpServer};

    let result = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let mut app = App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(service.clone()))
            .app_data(web::Data::new(gate.clone()))
            .configure(api::configure);

        if client_path.is_dir() {
            app = app.service(
                actix_files::Files::new("/", client_path.clone()).index_file("index.html"),
            );
        }
        app
    })
    .bind(addr)?
    .run()
    .await;

    info!("Closing record store...");
    store.close().await;

    result?;
    Ok(())
}

async fn open_store(settings: &Settings, paths: &Paths) -> Result<Arc<dyn ArtistStore>> {
    let store: Arc<dyn ArtistStore> = match settings.database.backend {
        StoreBackend::Sqlite => {
            let path = settings.database_path(paths);
            info!(
                "Opening SQLite store {:?}, collection {}",
                path, settings.database.collection
            );
            let engine = db::DbEngine::connect(&path, &settings.database.collection).await?;
            Arc::new(db::ArtistTable::new(engine))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; records are lost on shutdown");
            Arc::new(stores::MemoryArtistStore::new())
        }
    };
    Ok(store)
}

async fn connect(remote: &RemoteArgs) -> Result<Session<HttpArtistClient>> {
    let api = HttpArtistClient::new(&remote.server)?;
    if let Some(password) = &remote.password {
        api.login(password).await?;
    }
    let mut session = Session::new(Arc::new(api));
    match session.load().await {
        Ok(()) => Ok(session),
        Err(ClientError::Unreachable(e)) => {
            bail!("Cannot reach server at {}: {}", remote.server, e)
        }
        Err(e) => Err(e.into()),
    }
}

/// Reject raw input the board would silently drop
fn check_input(field: ArtistField, raw: &str) -> Result<()> {
    if coerce_input(field, raw).is_some() {
        return Ok(());
    }
    let expected = match field {
        ArtistField::Response | ArtistField::Available => "Yes or No",
        ArtistField::Saved => "true or false",
        // never rejected: names are free text, bad costs coerce to 0
        ArtistField::Name | ArtistField::Cost => "any value",
    };
    bail!("Invalid {}: {:?} (expected {})", field, raw, expected)
}

fn edit_event(id: String, field: ArtistField, raw: String) -> Result<TableEvent> {
    check_input(field, &raw)?;
    Ok(TableEvent::Edit { id, field, raw })
}

async fn add(
    remote: &RemoteArgs,
    name: Option<String>,
    response: Option<String>,
    available: Option<String>,
    cost: Option<String>,
) -> Result<()> {
    // fail before anything is created
    for (field, raw) in [
        (ArtistField::Response, &response),
        (ArtistField::Available, &available),
    ] {
        if let Some(raw) = raw {
            check_input(field, raw)?;
        }
    }

    let mut session = connect(remote).await?;
    let temp_id = session.add();

    let fields = [
        (ArtistField::Name, name),
        (ArtistField::Response, response),
        (ArtistField::Available, available),
        (ArtistField::Cost, cost),
    ];
    for (field, raw) in fields {
        let Some(raw) = raw else { continue };
        session.handle(edit_event(temp_id.clone(), field, raw)?);
    }

    finish(session).await
}

async fn edit(remote: &RemoteArgs, id: String, field: &str, value: String) -> Result<()> {
    let field = match ArtistField::from_str(field) {
        Some(ArtistField::Saved) | None => {
            bail!("Unknown field {:?}; use name, response, available or cost", field)
        }
        Some(field) => field,
    };
    let event = edit_event(id.clone(), field, value)?;

    let mut session = connect(remote).await?;
    if session.board().row(&id).is_none() {
        bail!("No artist with id {}", id);
    }
    session.handle(event);

    finish(session).await
}

async fn save(remote: &RemoteArgs, ids: &[String]) -> Result<()> {
    let mut session = connect(remote).await?;
    for id in ids {
        if session.board().row(id).is_none() {
            warn!("No artist with id {}; skipping", id);
            continue;
        }
        session.handle(TableEvent::Toggle { id: id.clone() });
    }
    if !session.save_selected() {
        bail!("Nothing to save");
    }

    finish(session).await
}

/// Wait for outstanding calls, report what happened and print the table
async fn finish(mut session: Session<HttpArtistClient>) -> Result<()> {
    session.settle().await;

    let mut failed = false;
    for notice in session.take_notices() {
        match notice {
            Notice::Saved(count) => println!("Saved {} artist(s)", count),
            Notice::SaveFailed(message) => {
                failed = true;
                eprintln!("Failed to save artists: {}", message);
            }
            Notice::EditFailed { id, field, message } => {
                failed = true;
                eprintln!("Failed to update {} of {}: {}", field, id, message);
            }
            Notice::CreateFailed(message) => {
                failed = true;
                eprintln!("Failed to add artist: {}", message);
            }
        }
    }

    println!("{}", session.view().render());
    if failed {
        bail!("Some changes were not saved");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yes_no_fields_name_their_choices() {
        let err = check_input(ArtistField::Response, "maybe").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid response: \"maybe\" (expected Yes or No)"
        );
        assert!(check_input(ArtistField::Available, "later")
            .unwrap_err()
            .to_string()
            .contains("expected Yes or No"));
        assert!(check_input(ArtistField::Saved, "soon")
            .unwrap_err()
            .to_string()
            .contains("expected true or false"));
    }

    #[test]
    fn test_name_and_cost_input_always_accepted() {
        assert!(check_input(ArtistField::Name, "").is_ok());
        assert!(check_input(ArtistField::Cost, "abc").is_ok());

        let event = edit_event("a1".into(), ArtistField::Cost, "12.5".into()).unwrap();
        assert_eq!(
            event,
            TableEvent::Edit {
                id: "a1".into(),
                field: ArtistField::Cost,
                raw: "12.5".into(),
            }
        );
    }
}
