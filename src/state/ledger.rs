// Ledger queries over zones, billable accounts, bills and payments.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, Document, doc, oid::ObjectId};

use crate::models::{
    AccountType, Bill, BillableAccount, Payment, PaymentMethod, PaymentStatus, ServedStatus, Zone,
};

use super::AppState;

pub async fn list_zones(state: &AppState) -> Result<Vec<Zone>> {
    let mut cursor = state.zones.find(doc! {}).sort(doc! { "name": 1 }).await?;
    let mut zones = Vec::new();
    while let Some(zone) = cursor.try_next().await? {
        zones.push(zone);
    }
    Ok(zones)
}

pub async fn zone_names(state: &AppState) -> Result<HashMap<ObjectId, String>> {
    Ok(list_zones(state)
        .await?
        .into_iter()
        .filter_map(|z| z.id.map(|id| (id, z.name)))
        .collect())
}

pub async fn list_accounts(state: &AppState, filter: Document) -> Result<Vec<BillableAccount>> {
    let mut cursor = state.accounts.find(filter).await?;
    let mut items = Vec::new();
    while let Some(account) = cursor.try_next().await? {
        items.push(account);
    }
    Ok(items)
}

pub async fn get_account_by_id(state: &AppState, id: &ObjectId) -> Result<Option<BillableAccount>> {
    state
        .accounts
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn list_bills(state: &AppState, filter: Document) -> Result<Vec<Bill>> {
    let mut cursor = state.bills.find(filter).await?;
    let mut items = Vec::new();
    while let Some(bill) = cursor.try_next().await? {
        items.push(bill);
    }
    Ok(items)
}

pub async fn list_payments(state: &AppState, filter: Document) -> Result<Vec<Payment>> {
    let mut cursor = state
        .payments
        .find(filter)
        .sort(doc! { "payment_date": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(payment) = cursor.try_next().await? {
        items.push(payment);
    }
    Ok(items)
}

/// Sum of successful payments across every bill of one account.
pub async fn successful_total_for_account(
    state: &AppState,
    account_type: AccountType,
    account_id: &ObjectId,
) -> Result<f64> {
    let mut bill_ids = Vec::new();
    let mut cursor = state
        .bills
        .clone_with_type::<Document>()
        .find(doc! { "bill_type": account_type.as_str(), "reference_id": account_id })
        .projection(doc! { "_id": 1 })
        .await?;
    while let Some(row) = cursor.try_next().await? {
        if let Ok(id) = row.get_object_id("_id") {
            bill_ids.push(id);
        }
    }
    if bill_ids.is_empty() {
        return Ok(0.0);
    }

    let pipeline = vec![
        doc! { "$match": {
            "bill_id": { "$in": bill_ids },
            "payment_status": PaymentStatus::Successful.as_str(),
        }},
        doc! { "$group": {
            "_id": null,
            "total": { "$sum": "$amount_paid" },
        }},
    ];
    let mut total = 0.0;
    let mut agg = state.payments.aggregate(pipeline).await?;
    while let Some(row) = agg.try_next().await? {
        total += row.get_f64("total").unwrap_or(0.0);
    }
    Ok(total)
}

pub async fn create_zone(state: &AppState, name: &str, code: Option<String>) -> Result<ObjectId> {
    let res = state
        .zones
        .insert_one(Zone {
            id: None,
            name: name.to_string(),
            code,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("zone insert missing _id")
}

pub async fn create_account(
    state: &AppState,
    account_type: AccountType,
    account_number: &str,
    name: &str,
    zone_id: Option<ObjectId>,
    amount_payable: f64,
) -> Result<ObjectId> {
    if amount_payable < 0.0 {
        bail!("amount payable cannot be negative");
    }
    let res = state
        .accounts
        .insert_one(BillableAccount {
            id: None,
            account_type,
            account_number: account_number.to_string(),
            name: name.to_string(),
            owner_name: None,
            zone_id,
            amount_payable,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("account insert missing _id")
}

pub async fn create_bill(
    state: &AppState,
    account_id: &ObjectId,
    bill_number: &str,
    billing_year: i32,
    amount_payable: f64,
    due_date: DateTime,
) -> Result<ObjectId> {
    let account = get_account_by_id(state, account_id)
        .await?
        .context("bill references missing account")?;
    let res = state
        .bills
        .insert_one(Bill {
            id: None,
            bill_number: bill_number.to_string(),
            bill_type: account.account_type,
            reference_id: *account_id,
            billing_year,
            amount_payable,
            due_date,
            served_status: ServedStatus::Unserved,
            served_at: None,
            served_by: None,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("bill insert missing _id")
}

/// Records delivery of a bill. Serving is one-way; re-serving keeps the first timestamp.
pub async fn mark_bill_served(
    state: &AppState,
    bill_id: &ObjectId,
    served_at: DateTime,
    served_by: Option<ObjectId>,
) -> Result<()> {
    state
        .bills
        .update_one(
            doc! { "_id": bill_id, "served_status": ServedStatus::Unserved.as_str() },
            doc! { "$set": {
                "served_status": ServedStatus::Served.as_str(),
                "served_at": served_at,
                "served_by": served_by,
            } },
        )
        .await?;
    Ok(())
}

pub async fn record_payment(
    state: &AppState,
    bill_id: &ObjectId,
    amount_paid: f64,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    payment_date: DateTime,
    received_by: Option<ObjectId>,
) -> Result<ObjectId> {
    if amount_paid <= 0.0 {
        bail!("payment amount must be positive");
    }
    let res = state
        .payments
        .insert_one(Payment {
            id: None,
            bill_id: *bill_id,
            amount_paid,
            payment_method,
            payment_status,
            payment_date,
            received_by,
            reference: None,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("payment insert missing _id")
}
