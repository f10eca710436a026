#![allow(dead_code)]

use std::{
    env,
    sync::{Mutex, MutexGuard, OnceLock},
    time::{SystemTime, UNIX_EPOCH},
};

use mongodb::Client;

use quickbill::{
    billing::DefaulterPolicy,
    config::AppConfig,
    state::{AppState, init_state},
};

/// Global lock so integration tests that mutate the DB run one-at-a-time.
static TEST_DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub struct TestContext {
    pub state: AppState,
    pub db_name: String,
    uri: String,
    _guard: MutexGuard<'static, ()>,
}

fn mongodb_uri() -> String {
    env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017/?serverSelectionTimeoutMS=2000".to_string())
}

pub fn test_config(db_name: &str) -> AppConfig {
    let root = env!("CARGO_MANIFEST_DIR");
    AppConfig {
        addr: "127.0.0.1:0".parse().expect("static socket address"),
        mongodb_uri: mongodb_uri(),
        mongodb_db: db_name.to_string(),
        users_file: format!("{root}/data/users.json"),
        ledger_file: format!("{root}/data/ledger.json"),
        policy: DefaulterPolicy::default(),
    }
}

/// Fresh database seeded from `data/`. `None` when MongoDB is unreachable, so
/// callers return early instead of failing.
pub async fn setup_state() -> Option<TestContext> {
    let guard = TEST_DB_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let uri = mongodb_uri();
    let db_name = format!(
        "quickbilltest_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis()
    );

    let client = match Client::with_uri_str(&uri).await {
        Ok(c) => c,
        Err(err) => {
            eprintln!("Skipping test; cannot connect to MongoDB: {err:?}");
            return None;
        }
    };
    if let Err(err) = client.database(&db_name).drop().await {
        eprintln!("Skipping test; cannot drop test DB: {err:?}");
        return None;
    }

    match init_state(&test_config(&db_name)).await {
        Ok(state) => Some(TestContext {
            state,
            db_name,
            uri,
            _guard: guard,
        }),
        Err(err) => {
            eprintln!("Skipping test; init_state failed: {err:?}");
            None
        }
    }
}

pub async fn teardown(ctx: TestContext) {
    if let Ok(client) = Client::with_uri_str(&ctx.uri).await {
        let _ = client.database(&ctx.db_name).drop().await;
    }
    drop(ctx);
}
