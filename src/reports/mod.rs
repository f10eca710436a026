// reports module: one submodule per report page.
// Each exposes a pure `build` over loaded rows and a `load` that queries the
// store and falls back to an empty report when the query fails.

use anyhow::Result;
use mongodb::bson::{Document, doc, oid::ObjectId};

use crate::billing::ReportFilter;
use crate::models::{Bill, Payment, PaymentStatus};
use crate::state::{AppState, list_accounts, list_bills, list_payments};

pub mod bill_status;
pub mod collections;
pub mod defaulters;
pub mod revenue;
pub mod zone_performance;

pub use bill_status::*;
pub use collections::*;
pub use defaulters::*;
pub use revenue::*;
pub use zone_performance::*;

/// Bills of `year` that satisfy the filter's account type and zone.
pub(crate) async fn scoped_bills(
    state: &AppState,
    filter: &ReportFilter,
    year: i32,
) -> Result<Vec<Bill>> {
    let mut matcher = filter.clone().with_billing_year(year).bill_match();
    if filter.zone_id.is_some() {
        let ids: Vec<ObjectId> = list_accounts(state, filter.account_match())
            .await?
            .into_iter()
            .filter_map(|a| a.id)
            .collect();
        matcher.insert("reference_id", doc! { "$in": ids });
    }
    list_bills(state, matcher).await
}

/// Successful payments made against any of `bills`.
pub(crate) async fn payments_for_bills(state: &AppState, bills: &[Bill]) -> Result<Vec<Payment>> {
    let ids: Vec<ObjectId> = bills.iter().filter_map(|b| b.id).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    list_payments(state, successful_on_bills(ids)).await
}

fn successful_on_bills(ids: Vec<ObjectId>) -> Document {
    doc! {
        "bill_id": { "$in": ids },
        "payment_status": PaymentStatus::Successful.as_str(),
    }
}
