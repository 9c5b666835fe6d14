use serde::{Deserialize, Serialize};

use super::{Cents, Tone, deserialize_cents, deserialize_opt_cents, format_cents};

pub type CustomerId = i64;

/// Read-only snapshot of a customer, fetched per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(rename = "nome_completo")]
    pub full_name: String,
    #[serde(rename = "saldo", deserialize_with = "deserialize_cents")]
    pub balance: Cents,
    #[serde(rename = "fido_massimo", deserialize_with = "deserialize_cents")]
    pub credit_limit: Cents,
}

impl Customer {
    pub fn new(
        id: CustomerId,
        full_name: impl Into<String>,
        balance: Cents,
        credit_limit: Cents,
    ) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            balance,
            credit_limit,
        }
    }

    /// Credit still spendable within the limit.
    /// A negative balance eats into the limit; a positive one adds to it.
    pub fn available_credit(&self) -> Cents {
        if self.balance < 0 {
            self.credit_limit.saturating_sub(self.balance.saturating_abs())
        } else {
            self.credit_limit.saturating_add(self.balance)
        }
    }

    /// True when the debt is numerically larger than the credit limit.
    pub fn credit_exceeded(&self) -> bool {
        self.balance < 0 && self.balance.saturating_abs() > self.credit_limit
    }

    /// How far past the credit limit the customer is, zero when within it.
    pub fn credit_excess(&self) -> Cents {
        if self.credit_exceeded() {
            self.balance.saturating_abs().saturating_sub(self.credit_limit)
        } else {
            0
        }
    }

    pub fn balance_tone(&self) -> Tone {
        Tone::of(self.balance)
    }

    pub fn display_balance(&self) -> String {
        format!("{} €", format_cents(self.balance))
    }
}

/// Partial customer payload returned by the settle endpoint.
/// Only the id and the new balance are guaranteed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub id: CustomerId,
    #[serde(rename = "saldo", deserialize_with = "deserialize_cents")]
    pub balance: Cents,
    #[serde(rename = "fido_massimo", default, deserialize_with = "deserialize_opt_cents")]
    pub credit_limit: Option<Cents>,
}

impl Customer {
    /// Fold a settle response into the snapshot.
    pub fn apply_update(&mut self, update: &BalanceUpdate) {
        self.balance = update.balance;
        if let Some(limit) = update.credit_limit {
            self.credit_limit = limit;
        }
    }
}
