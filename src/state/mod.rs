// state module: AppState, initialization, and re-exports of submodules.

use anyhow::Result;
use mongodb::{Client, Collection, Database};

use crate::billing::DefaulterPolicy;
use crate::config::AppConfig;
use crate::models::{Bill, BillableAccount, Payment, Session, User, Zone};

mod ledger;
mod seed;
mod users;

pub use ledger::*;
pub use users::*;

pub const SESSION_TTL_SECONDS: u64 = 60 * 60 * 12; // half a day

#[derive(Clone)]
pub struct AppState {
    pub users: Collection<User>,
    pub sessions: Collection<Session>,
    pub zones: Collection<Zone>,
    pub accounts: Collection<BillableAccount>,
    pub bills: Collection<Bill>,
    pub payments: Collection<Payment>,
    pub policy: DefaulterPolicy,
}

/// Opens the collections without touching the server; the driver connects lazily.
pub async fn connect_state(config: &AppConfig) -> Result<AppState> {
    let client = Client::with_uri_str(&config.mongodb_uri).await?;
    Ok(state_for(&client.database(&config.mongodb_db), config))
}

pub async fn init_state(config: &AppConfig) -> Result<AppState> {
    let client = Client::with_uri_str(&config.mongodb_uri).await?;
    let db = client.database(&config.mongodb_db);

    seed::ensure_collections(&db).await?;

    // Only seed when the database is effectively empty (no users).
    if seed::is_database_empty(&db).await? {
        let default_users = seed::load_default_users(&config.users_file)?;
        seed::seed_default_users(&db, &default_users).await?;
        let ledger = seed::load_ledger(&config.ledger_file)?;
        seed::seed_sample_ledger(&db, &ledger).await?;
        tracing::info!(
            users = default_users.len(),
            accounts = ledger.accounts.len(),
            bills = ledger.bills.len(),
            "seeded empty database"
        );
    }

    Ok(state_for(&db, config))
}

fn state_for(db: &Database, config: &AppConfig) -> AppState {
    AppState {
        users: db.collection::<User>("users"),
        sessions: db.collection::<Session>("sessions"),
        zones: db.collection::<Zone>("zones"),
        accounts: db.collection::<BillableAccount>("accounts"),
        bills: db.collection::<Bill>("bills"),
        payments: db.collection::<Payment>("payments"),
        policy: config.policy,
    }
}
