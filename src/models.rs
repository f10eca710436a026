// models.rs
// Domain models for seed data (users.json, ledger.json) and MongoDB collections.

use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Staff roles for authorization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Finance,
    #[default]
    Collector,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Finance => "finance",
            UserRole::Collector => "collector",
        }
    }

    /// Admins and finance staff can open the report pages.
    pub fn can_view_reports(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Finance)
    }
}

/// User definition as stored in users.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub email: String,
    pub secret: String,
    pub full_name: String,
    #[serde(default)]
    pub role: UserRole,
}

/// Staff user document stored in MongoDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub secret: String,
    pub full_name: String,
    pub role: UserRole,
}

/// Session document stored in MongoDB linking a token to a user and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub token: String,
    pub user_email: String,
    pub expires_at: DateTime,
}

/// Collection zone a billable account belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Business,
    Property,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Business => "business",
            AccountType::Property => "property",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Business => "Business",
            AccountType::Property => "Property",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "business" => Some(AccountType::Business),
            "property" => Some(AccountType::Property),
            _ => None,
        }
    }
}

/// A business or property that receives bills.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillableAccount {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub account_type: AccountType,
    pub account_number: String,
    pub name: String,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub zone_id: Option<ObjectId>,
    /// Current nominal amount owed before payments are netted.
    pub amount_payable: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServedStatus {
    #[default]
    Unserved,
    Served,
}

impl ServedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServedStatus::Unserved => "unserved",
            ServedStatus::Served => "served",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub bill_number: String,
    pub bill_type: AccountType,
    /// Id of the business or property this bill was generated for.
    pub reference_id: ObjectId,
    pub billing_year: i32,
    pub amount_payable: f64,
    pub due_date: DateTime,
    #[serde(default)]
    pub served_status: ServedStatus,
    #[serde(default)]
    pub served_at: Option<DateTime>,
    #[serde(default)]
    pub served_by: Option<ObjectId>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    MobileMoney,
    BankTransfer,
    Cheque,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Card => "card",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::MobileMoney => "Mobile Money",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Cheque => "Cheque",
            PaymentMethod::Card => "Card",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Successful,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Successful => "successful",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn counts_toward_balance(&self) -> bool {
        matches!(self, PaymentStatus::Successful)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub bill_id: ObjectId,
    pub amount_paid: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_date: DateTime,
    #[serde(default)]
    pub received_by: Option<ObjectId>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Sample ledger loaded from ledger.json. Dates are relative to the seeding day.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedLedger {
    #[serde(default)]
    pub zones: Vec<SeedZone>,
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,
    #[serde(default)]
    pub bills: Vec<SeedBill>,
    #[serde(default)]
    pub payments: Vec<SeedPayment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedZone {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedAccount {
    pub account_type: AccountType,
    pub account_number: String,
    pub name: String,
    #[serde(default)]
    pub owner_name: Option<String>,
    /// Zone name; accounts without one stay unassigned.
    #[serde(default)]
    pub zone: Option<String>,
    pub amount_payable: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedBill {
    pub bill_number: String,
    pub account_number: String,
    /// 0 for the current year, -1 for last year, and so on.
    #[serde(default)]
    pub billing_year_offset: i32,
    pub amount_payable: f64,
    #[serde(default)]
    pub served_days_ago: Option<i64>,
    /// Email of the staff member who served the bill.
    #[serde(default)]
    pub served_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedPayment {
    pub bill_number: String,
    pub amount_paid: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub paid_days_ago: i64,
    #[serde(default)]
    pub received_by: Option<String>,
}
