use serde::Serialize;

use crate::models::Payment;

/// Outstanding position of one billable account.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Balance {
    pub amount_payable: f64,
    pub total_paid: f64,
    pub remaining_balance: f64,
}

impl Balance {
    /// Nets payments against the amount owed. Overpayment never yields a negative balance.
    pub fn settle(amount_payable: f64, total_paid: f64) -> Self {
        let remaining = round_cents((amount_payable - total_paid).max(0.0));
        Self {
            amount_payable: round_cents(amount_payable),
            total_paid: round_cents(total_paid),
            remaining_balance: remaining,
        }
    }

    /// Nothing known to be paid: the whole amount is outstanding.
    pub fn unpaid(amount_payable: f64) -> Self {
        Self::settle(amount_payable, 0.0)
    }

    /// Settles against a payment lookup. A failed lookup assumes nothing was paid.
    pub fn from_lookup(amount_payable: f64, lookup: anyhow::Result<f64>) -> Self {
        match lookup {
            Ok(total_paid) => Self::settle(amount_payable, total_paid),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    amount_payable,
                    "payment lookup failed; treating full amount as outstanding"
                );
                Self::unpaid(amount_payable)
            }
        }
    }

    pub fn is_outstanding(&self) -> bool {
        self.remaining_balance > 0.0
    }
}

/// Sum of the payments that count toward a balance.
pub fn successful_total<'a>(payments: impl IntoIterator<Item = &'a Payment>) -> f64 {
    payments
        .into_iter()
        .filter(|p| p.payment_status.counts_toward_balance())
        .map(|p| p.amount_paid)
        .sum()
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentMethod, PaymentStatus};
    use mongodb::bson::{DateTime, oid::ObjectId};

    fn payment(amount: f64, status: PaymentStatus) -> Payment {
        Payment {
            id: None,
            bill_id: ObjectId::new(),
            amount_paid: amount,
            payment_method: PaymentMethod::Cash,
            payment_status: status,
            payment_date: DateTime::now(),
            received_by: None,
            reference: None,
        }
    }

    #[test]
    fn settle_subtracts_payments() {
        let balance = Balance::settle(300.0, 50.0);
        assert_eq!(balance.remaining_balance, 250.0);
        assert_eq!(balance.total_paid, 50.0);
        assert!(balance.is_outstanding());
    }

    #[test]
    fn overpayment_clamps_to_zero() {
        let balance = Balance::settle(100.0, 130.0);
        assert_eq!(balance.remaining_balance, 0.0);
        assert_eq!(balance.total_paid, 130.0);
        assert!(!balance.is_outstanding());
    }

    #[test]
    fn cent_noise_does_not_leave_a_balance() {
        let balance = Balance::settle(0.3, 0.1 + 0.2);
        assert_eq!(balance.remaining_balance, 0.0);
    }

    #[test]
    fn failed_lookup_assumes_nothing_paid() {
        let balance = Balance::from_lookup(400.0, Err(anyhow::anyhow!("store offline")));
        assert_eq!(balance.remaining_balance, 400.0);
        assert_eq!(balance.total_paid, 0.0);
    }

    #[test]
    fn only_successful_payments_count() {
        let payments = vec![
            payment(100.0, PaymentStatus::Successful),
            payment(70.0, PaymentStatus::Failed),
            payment(20.0, PaymentStatus::Pending),
            payment(30.0, PaymentStatus::Successful),
        ];
        assert_eq!(successful_total(&payments), 130.0);
    }
}
