use std::{collections::HashMap, fs, io};

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, TimeZone, Utc};
use futures::stream::TryStreamExt;
use mongodb::{
    Database,
    bson::{DateTime, doc, oid::ObjectId},
};

use crate::models::{
    Bill, BillableAccount, Payment, SeedLedger, SeedUser, ServedStatus, User, Zone,
};

const COLLECTIONS: [&str; 6] = ["users", "sessions", "zones", "accounts", "bills", "payments"];

pub(super) async fn is_database_empty(db: &Database) -> Result<bool> {
    let users_coll = db.collection::<User>("users");
    let count = users_coll.estimated_document_count().await?;
    Ok(count == 0)
}

pub(super) fn load_default_users(path: &str) -> Result<Vec<SeedUser>> {
    let users_json =
        fs::read_to_string(path).with_context(|| format!("cannot read users file {path}"))?;
    let users = serde_json::from_str::<Vec<SeedUser>>(&users_json)?;
    Ok(users)
}

/// A missing ledger file just means no sample data.
pub(super) fn load_ledger(path: &str) -> Result<SeedLedger> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(serde_json::from_str::<SeedLedger>(&contents)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(path, "ledger file not found; skipping sample ledger");
            Ok(SeedLedger::default())
        }
        Err(err) => Err(err).with_context(|| format!("reading ledger file {path}")),
    }
}

pub(super) async fn ensure_collections(db: &Database) -> Result<()> {
    let existing = db.list_collection_names().await?;
    for name in COLLECTIONS {
        if !existing.iter().any(|n| n == name) {
            db.create_collection(name).await?;
        }
    }
    Ok(())
}

pub(super) async fn seed_default_users(db: &Database, users: &[SeedUser]) -> Result<()> {
    let users_coll = db.collection::<User>("users");
    for user in users {
        // Upsert by email so re-seeding never duplicates staff.
        let res = users_coll
            .update_one(
                doc! { "email": &user.email },
                doc! { "$set": {
                    "secret": &user.secret,
                    "full_name": &user.full_name,
                    "role": user.role.as_str(),
                } },
            )
            .await?;
        if res.matched_count == 0 {
            users_coll
                .insert_one(User {
                    id: None,
                    email: user.email.clone(),
                    secret: user.secret.clone(),
                    full_name: user.full_name.clone(),
                    role: user.role,
                })
                .await?;
        }
    }
    Ok(())
}

pub(super) async fn seed_sample_ledger(db: &Database, ledger: &SeedLedger) -> Result<()> {
    let accounts_coll = db.collection::<BillableAccount>("accounts");
    if accounts_coll.estimated_document_count().await? > 0 {
        return Ok(());
    }

    let zones_coll = db.collection::<Zone>("zones");
    let bills_coll = db.collection::<Bill>("bills");
    let payments_coll = db.collection::<Payment>("payments");
    let users_coll = db.collection::<User>("users");

    let now = Utc::now();
    let days_ago = |days: i64| DateTime::from_chrono(now - Duration::days(days));

    let mut staff: HashMap<String, ObjectId> = HashMap::new();
    let mut cursor = users_coll.find(doc! {}).await?;
    while let Some(user) = cursor.try_next().await? {
        if let Some(id) = user.id {
            staff.insert(user.email, id);
        }
    }

    let mut zone_ids = HashMap::new();
    for zone in &ledger.zones {
        let res = zones_coll
            .insert_one(Zone {
                id: None,
                name: zone.name.clone(),
                code: zone.code.clone(),
            })
            .await?;
        let id = res
            .inserted_id
            .as_object_id()
            .context("zone insert missing _id")?;
        zone_ids.insert(zone.name.clone(), id);
    }

    let mut account_ids = HashMap::new();
    for acc in &ledger.accounts {
        let zone_id = match &acc.zone {
            Some(name) => Some(*zone_ids.get(name).with_context(|| {
                format!("account {} references unknown zone {name}", acc.account_number)
            })?),
            None => None,
        };
        let res = accounts_coll
            .insert_one(BillableAccount {
                id: None,
                account_type: acc.account_type,
                account_number: acc.account_number.clone(),
                name: acc.name.clone(),
                owner_name: acc.owner_name.clone(),
                zone_id,
                amount_payable: acc.amount_payable,
            })
            .await?;
        let id = res
            .inserted_id
            .as_object_id()
            .context("account insert missing _id")?;
        account_ids.insert(acc.account_number.clone(), (id, acc.account_type));
    }

    let mut bill_ids = HashMap::new();
    for bill in &ledger.bills {
        let (reference_id, bill_type) = *account_ids
            .get(&bill.account_number)
            .with_context(|| format!("bill {} references unknown account", bill.bill_number))?;
        let billing_year = now.year() + bill.billing_year_offset;
        let due_date = Utc
            .with_ymd_and_hms(billing_year, 3, 31, 0, 0, 0)
            .single()
            .unwrap_or(now);
        let res = bills_coll
            .insert_one(Bill {
                id: None,
                bill_number: bill.bill_number.clone(),
                bill_type,
                reference_id,
                billing_year,
                amount_payable: bill.amount_payable,
                due_date: DateTime::from_chrono(due_date),
                served_status: if bill.served_days_ago.is_some() {
                    ServedStatus::Served
                } else {
                    ServedStatus::Unserved
                },
                served_at: bill.served_days_ago.map(days_ago),
                served_by: bill.served_by.as_ref().and_then(|email| staff.get(email).copied()),
            })
            .await?;
        let id = res
            .inserted_id
            .as_object_id()
            .context("bill insert missing _id")?;
        bill_ids.insert(bill.bill_number.clone(), id);
    }

    for payment in &ledger.payments {
        let bill_id = *bill_ids
            .get(&payment.bill_number)
            .with_context(|| format!("payment references unknown bill {}", payment.bill_number))?;
        payments_coll
            .insert_one(Payment {
                id: None,
                bill_id,
                amount_paid: payment.amount_paid,
                payment_method: payment.payment_method,
                payment_status: payment.payment_status,
                payment_date: days_ago(payment.paid_days_ago),
                received_by: payment
                    .received_by
                    .as_ref()
                    .and_then(|email| staff.get(email).copied()),
                reference: None,
            })
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ledger_file_seeds_nothing() {
        let ledger = load_ledger("data/no-such-ledger.json").unwrap();
        assert!(ledger.zones.is_empty());
        assert!(ledger.accounts.is_empty());
        assert!(ledger.bills.is_empty());
    }

    #[test]
    fn unreadable_ledger_path_is_an_error() {
        // A directory exists but cannot be read as a file.
        assert!(load_ledger(env!("CARGO_MANIFEST_DIR")).is_err());
    }

    #[test]
    fn bundled_ledger_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/ledger.json");
        let ledger = load_ledger(path).unwrap();
        assert!(!ledger.accounts.is_empty());
    }
}
