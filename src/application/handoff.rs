use chrono::Utc;
use tracing::{debug, info};

use crate::domain::{Cents, ClosingDifference, ClosingInput, format_cents, parse_cents};
use crate::storage::{FINAL_CASH_SLOT, SessionStore};

use super::AppError;

/// Where the operator goes to close the distinta.
pub const CLOSING_ROUTE: &str = "chiudi_distinta";

/// Parked values older than this belong to an earlier shift.
pub const PARKED_VALUE_MAX_AGE_HOURS: i64 = 12;

/// The closing form of a distinta.
#[derive(Debug, Clone, Default)]
pub struct ClosingForm {
    pub initial_cash: Cents,
    pub final_cash: Option<Cents>,
    pub inflows_total: Cents,
    pub outflows_total: Cents,
    pub drinks_total: Cents,
    pub terminal_balance: Cents,
}

impl ClosingForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_final_cash(&mut self, value: Cents) {
        self.final_cash = Some(value);
    }

    /// Cash difference for the current fields; `None` until the final cash is known.
    pub fn difference(&self) -> Option<ClosingDifference> {
        let final_cash = self.final_cash?;
        Some(ClosingDifference::compute(ClosingInput {
            initial_cash: self.initial_cash,
            final_cash,
            inflows_total: self.inflows_total,
            outflows_total: self.outflows_total,
            drinks_total: self.drinks_total,
            terminal_balance: self.terminal_balance,
        }))
    }

    /// Fill the final cash from a value parked by the cash count, if any.
    /// Stale slots are dropped first. Returns whether a value was found.
    pub async fn prefill_from_session(&mut self, store: &SessionStore) -> Result<bool, AppError> {
        let cutoff = Utc::now() - chrono::Duration::hours(PARKED_VALUE_MAX_AGE_HOURS);
        let expired = store.expire_before(cutoff).await?;
        if expired > 0 {
            debug!(expired, "dropped stale session slots");
        }

        let Some(slot) = store.take(FINAL_CASH_SLOT).await? else {
            return Ok(false);
        };
        let value = parse_cents(&slot.value)
            .map_err(|e| AppError::InvalidAmount(format!("{} ({})", slot.value, e)))?;
        self.set_final_cash(value);
        Ok(true)
    }
}

/// What happened to a cash-count result handed to the closing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handoff {
    /// The closing form was at hand and now holds the value
    Applied(Cents),
    /// No closing form here: the value waits in the session slot
    Stored { value: Cents, redirect: &'static str },
}

/// Copy a cash-count result into the closing form, or park it for later.
pub async fn hand_off(
    result: Cents,
    closing: Option<&mut ClosingForm>,
    store: &SessionStore,
) -> Result<Handoff, AppError> {
    match closing {
        Some(form) => {
            form.set_final_cash(result);
            Ok(Handoff::Applied(result))
        }
        None => {
            store.put(FINAL_CASH_SLOT, &format_cents(result)).await?;
            info!(value = %format_cents(result), "cash count parked for closing");
            Ok(Handoff::Stored {
                value: result,
                redirect: CLOSING_ROUTE,
            })
        }
    }
}
