// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use distinta::application::{
    AppError, CancelHandle, ClientConfig, CustomerEntries, LedgerApi, SettleResponse, Settlement,
};
use distinta::domain::{BalanceUpdate, Customer, CustomerId, EntryId, EntryKind, LedgerEntry};

/// In-memory ledger service. Settling an entry drops it from the unsettled
/// set and recomputes the balance as the sum of what is left.
pub struct FakeLedger {
    state: Mutex<FakeState>,
}

struct FakeState {
    customer: Customer,
    entries: Vec<LedgerEntry>,
    settle_calls: Vec<EntryId>,
    fetches: usize,
    failing: HashSet<EntryId>,
    fetch_fails: bool,
    cancel_after: Option<(usize, CancelHandle)>,
}

impl FakeLedger {
    pub fn new(customer: Customer, entries: Vec<LedgerEntry>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                customer,
                entries,
                settle_calls: Vec::new(),
                fetches: 0,
                failing: HashSet::new(),
                fetch_fails: false,
                cancel_after: None,
            }),
        }
    }

    /// Settle calls for these entries answer with an error.
    pub fn failing_on(self, ids: &[EntryId]) -> Self {
        self.state.lock().unwrap().failing.extend(ids);
        self
    }

    pub fn with_broken_fetch(self) -> Self {
        self.state.lock().unwrap().fetch_fails = true;
        self
    }

    /// Fire `handle` once `calls` settle calls have been served.
    pub fn cancel_after(self, calls: usize, handle: CancelHandle) -> Self {
        self.state.lock().unwrap().cancel_after = Some((calls, handle));
        self
    }

    pub fn settle_calls(&self) -> Vec<EntryId> {
        self.state.lock().unwrap().settle_calls.clone()
    }

    pub fn fetches(&self) -> usize {
        self.state.lock().unwrap().fetches
    }

    pub fn remaining(&self) -> Vec<EntryId> {
        self.state.lock().unwrap().entries.iter().map(|e| e.id).collect()
    }
}

#[async_trait]
impl LedgerApi for FakeLedger {
    async fn customer_entries(&self, customer: CustomerId) -> Result<CustomerEntries, AppError> {
        let mut state = self.state.lock().unwrap();
        state.fetches += 1;
        if state.fetch_fails {
            return Err(AppError::Status {
                status: 500,
                message: "Internal Server Error".into(),
            });
        }
        if customer != state.customer.id {
            return Err(AppError::CustomerNotFound(customer));
        }
        Ok(CustomerEntries {
            customer: Some(state.customer.clone()),
            entries: state.entries.clone(),
        })
    }

    async fn settle_entry(&self, entry: EntryId) -> Result<SettleResponse, AppError> {
        let mut state = self.state.lock().unwrap();
        state.settle_calls.push(entry);

        let served = state.settle_calls.len();
        if let Some((after, handle)) = &state.cancel_after {
            if *after == served {
                handle.cancel();
            }
        }

        if state.failing.contains(&entry) {
            return Err(AppError::Status {
                status: 400,
                message: "Movimento già saldato".into(),
            });
        }

        let Some(pos) = state.entries.iter().position(|e| e.id == entry) else {
            return Err(AppError::Status {
                status: 404,
                message: "Not Found".into(),
            });
        };
        let settled = state.entries.remove(pos);
        state.customer.balance = state.entries.iter().map(|e| e.amount).sum();

        Ok(SettleResponse {
            success: Some(true),
            message: Some(format!(
                "Movimento {} di {} € saldato!",
                settled.kind.label(),
                distinta::format_cents(settled.amount.abs())
            )),
            customer: Some(BalanceUpdate {
                id: state.customer.id,
                balance: state.customer.balance,
                credit_limit: Some(state.customer.credit_limit),
            }),
        })
    }
}

/// Customer 7 with three unsettled entries: 41 (schedina 25.00),
/// 42 (ricarica 15.00) and 43 (prelievo 10.00). Balance -30.00.
pub fn standard_ledger() -> FakeLedger {
    let entries = vec![
        LedgerEntry::new(41, EntryKind::Schedina, 2500).with_date("01/05/2025 10:00"),
        LedgerEntry::new(42, EntryKind::Ricarica, 1500).with_date("02/05/2025 11:30"),
        LedgerEntry::new(43, EntryKind::Prelievo, 1000).with_date("03/05/2025 18:45"),
    ];
    let balance = entries.iter().map(|e| e.amount).sum();
    FakeLedger::new(Customer::new(7, "Verdi Luca", balance, 10000), entries)
}

pub fn fast_config() -> ClientConfig {
    ClientConfig::default().without_delays()
}

/// Settlement over `ledger` with customer 7 already selected.
pub async fn settlement_for(ledger: FakeLedger) -> Settlement<FakeLedger> {
    let mut settlement = Settlement::new(ledger, fast_config());
    settlement.select_customer(7).await;
    settlement
}
