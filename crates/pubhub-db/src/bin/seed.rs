//! # Seed Data Generator
//!
//! Populates a Pubhub database with sample pubs, events and users for
//! development, then reads the relationships back through the manager.
//!
//! ## Usage
//! ```bash
//! # Sample data into the configured database (pubhub.toml / environment)
//! cargo run -p pubhub-db --bin seed
//!
//! # Specify database path
//! cargo run -p pubhub-db --bin seed -- --db ./data/pubhub.db
//!
//! # Load a JSON fixture instead of the built-in sample
//! cargo run -p pubhub-db --bin seed -- --fixture ./fixtures/madrid.json
//! ```
//!
//! ## Fixture Format
//! ```json
//! {
//!   "pubs":   [{ "id": "1111", "name": "The Crown", "latitude": 40.41, "longitude": -3.70 }],
//!   "events": [{ "id": "e1", "name": "Quiz", "startsAt": "2026-06-01T20:00:00Z", "pubIds": ["1111"] }],
//!   "users":  [{ "id": "u1", "name": "Irene", "favorites": ["1111"] }]
//! }
//! ```

use chrono::{Duration, Utc};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pubhub_core::{generate_id, Event, Pub, User};
use pubhub_db::{DbConfig, DbManager, DbManagerBuilder, ManagerConfig};

/// Sample pubs: (id, name, address, latitude, longitude)
const PUBS: &[(&str, &str, &str, f64, f64)] = &[
    ("1111", "The Crown", "Calle Mayor 1, Madrid", 40.4168, -3.7038),
    ("2222", "Anchor Bar", "Calle de Atocha 12, Madrid", 40.4125, -3.7010),
    ("3333", "The Red Lion", "Gran Via 30, Madrid", 40.4199, -3.7016),
    ("4444", "Old Harbour", "Calle de Toledo 45, Madrid", 40.4093, -3.7093),
];

/// Sample events: (name, days from now, hosting pub ids)
const EVENTS: &[(&str, i64, &[&str])] = &[
    ("Pub Quiz", 1, &["1111", "2222"]),
    ("Live Jazz", 3, &["1111"]),
    ("Craft Beer Tasting", 7, &["3333", "4444"]),
    ("Football Night", 10, &["2222", "3333"]),
];

#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    pubs: Vec<Pub>,
    #[serde(default)]
    events: Vec<Event>,
    #[serde(default)]
    users: Vec<User>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut fixture_path: Option<PathBuf> = None;
    let mut in_memory = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--fixture" | "-f" => {
                if i + 1 < args.len() {
                    fixture_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--in-memory" => in_memory = true,
            "--help" | "-h" => {
                println!("Pubhub Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (default: from pubhub.toml)");
                println!("  -f, --fixture <PATH>   JSON fixture with pubs, events and users");
                println!("      --in-memory        Use a throwaway in-memory database");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let builder = if in_memory {
        DbManagerBuilder::new().init(DbConfig::in_memory())
    } else if let Some(path) = db_path {
        DbManagerBuilder::new().init(DbConfig::new(path))
    } else {
        DbManagerBuilder::from_config(&ManagerConfig::load(None)?)?
    };

    let manager = builder.build().await?;
    info!(backend = %manager.db_type(), "Connected to database");

    let fixture = match fixture_path {
        Some(path) => {
            info!(path = %path.display(), "Loading fixture");
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        }
        None => sample_fixture()?,
    };

    let start = std::time::Instant::now();
    seed(manager.as_ref(), &fixture).await?;
    info!(
        pubs = fixture.pubs.len(),
        events = fixture.events.len(),
        users = fixture.users.len(),
        elapsed = ?start.elapsed(),
        "Seed data written"
    );

    report(manager.as_ref(), &fixture).await?;

    manager.close().await;
    info!("Seed complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pubhub=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Builds the built-in sample data set.
fn sample_fixture() -> Result<Fixture, Box<dyn std::error::Error>> {
    let now = Utc::now();

    let pubs = PUBS
        .iter()
        .map(|(id, name, address, lat, lon)| {
            Pub::builder(*id, *name)
                .address(*address)
                .location(*lat, *lon)
                .build()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let events = EVENTS
        .iter()
        .map(|(name, days, pub_ids)| {
            let starts_at = now + Duration::days(*days);
            Event::builder(generate_id(), *name, starts_at)
                .ends_at(starts_at + Duration::hours(3))
                .pub_ids(pub_ids.iter().copied())
                .build()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let users = vec![
        User::builder("58b2aef6d9f0163f6eee636e")
            .name("Irene")
            .email("irene@gmail.com")
            .photo_url("http://images.com/irene.jpg")
            .favorites(["1111", "2222"])
            .build()?,
        User::builder(generate_id())
            .name("Marco")
            .favorites(["3333"])
            .build()?,
    ];

    Ok(Fixture {
        pubs,
        events,
        users,
    })
}

async fn seed(manager: &dyn DbManager, fixture: &Fixture) -> Result<(), Box<dyn std::error::Error>> {
    for venue in &fixture.pubs {
        manager.save_pub(venue).await?;
    }
    for event in &fixture.events {
        manager.save_event(event).await?;
    }
    for user in &fixture.users {
        manager.save_user(user).await?;
    }
    Ok(())
}

/// Reads the relationships back to verify the data set.
async fn report(manager: &dyn DbManager, fixture: &Fixture) -> Result<(), Box<dyn std::error::Error>> {
    for venue in &fixture.pubs {
        let events = manager.get_events_from_pub(venue.id()).await?;
        info!(pub_id = %venue.id(), name = %venue.name(), events = events.len(), "Pub");
    }

    for event in &fixture.events {
        let pubs = manager.get_pubs_from_event(event.id()).await?;
        info!(event_id = %event.id(), name = %event.name(), pubs = ?pubs.ids(), "Event");
    }

    for user in &fixture.users {
        let favorites = manager.get_favorites_from_user(user.id()).await?;
        info!(user_id = %user.id(), name = %user.name(), favorites = ?favorites.ids(), "User");
    }

    Ok(())
}
