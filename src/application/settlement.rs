use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{CustomerId, EntryId};
use crate::view::{LedgerView, NoticeLevel, ViewEvent};

use super::{AppError, CancelToken, ClientConfig, LedgerApi, SettleResponse};

pub const DEFAULT_SETTLED_MESSAGE: &str = "Movimento saldato con successo";
pub const SETTLE_FAILED_MESSAGE: &str = "Errore durante il saldo del movimento";
pub const NOTHING_TO_SETTLE_MESSAGE: &str = "Non ci sono movimenti da saldare per questo cliente";

/// Outcome of a "settle all" run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub customer: Option<CustomerId>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Settle calls issued, in order
    pub attempted: Vec<EntryId>,
    pub settled: Vec<EntryId>,
    pub failed: Vec<(EntryId, String)>,
    pub cancelled: bool,
}

impl BatchReport {
    fn start(customer: Option<CustomerId>) -> Self {
        let now = Utc::now();
        Self {
            batch_id: Uuid::new_v4(),
            customer,
            started_at: now,
            finished_at: now,
            attempted: Vec::new(),
            settled: Vec::new(),
            failed: Vec::new(),
            cancelled: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attempted.is_empty()
    }
}

/// Drives the unsettled-entries view of one page: loading a customer,
/// settling entries one by one or as a sequential batch.
pub struct Settlement<A: LedgerApi> {
    api: A,
    config: ClientConfig,
    view: LedgerView,
}

impl<A: LedgerApi> Settlement<A> {
    pub fn new(api: A, config: ClientConfig) -> Self {
        Self {
            api,
            config,
            view: LedgerView::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn view(&self) -> &LedgerView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut LedgerView {
        &mut self.view
    }

    // ========================
    // Customer view
    // ========================

    /// Select a customer and fetch their unsettled entries.
    pub async fn select_customer(&mut self, customer: CustomerId) {
        self.view.apply(ViewEvent::CustomerSelected(customer));
        self.reload().await;
    }

    /// Re-fetch the selected customer's view. Failures end up in the panel.
    pub async fn reload(&mut self) {
        let Some(customer) = self.view.selected_customer() else {
            return;
        };
        self.view.apply(ViewEvent::CustomerSelected(customer));

        match self.api.customer_entries(customer).await {
            Ok(payload) => {
                debug!(customer, entries = payload.entries.len(), "customer view loaded");
                self.view.apply(ViewEvent::EntriesLoaded {
                    customer: payload.customer,
                    entries: payload.entries,
                });
            }
            Err(e) => {
                warn!(customer, error = %e, "failed to load customer view");
                self.view.apply(ViewEvent::LoadFailed(e.to_string()));
            }
        }
    }

    async fn reload_after_delay(&mut self) {
        if self.view.selected_customer().is_some() {
            tokio::time::sleep(self.config.reload_delay).await;
            self.reload().await;
        }
    }

    /// Raise a transient notice, clearing the ones that timed out.
    fn notify(&mut self, level: NoticeLevel, message: String) {
        self.view.expire_notices(Utc::now(), self.config.notice_ttl);
        self.view.apply(ViewEvent::Notice(level, message));
    }

    // ========================
    // Settling
    // ========================

    /// One settle call plus the row updates a success implies.
    async fn settle_call(&mut self, entry: EntryId) -> Result<SettleResponse, AppError> {
        let response = self.api.settle_entry(entry).await?;
        self.view.apply(ViewEvent::EntrySettled {
            id: entry,
            update: response.customer.clone(),
        });
        Ok(response)
    }

    /// Settle a single entry, then refresh the customer view.
    pub async fn settle_one(&mut self, entry: EntryId) -> Result<SettleResponse, AppError> {
        match self.settle_call(entry).await {
            Ok(response) => {
                info!(entry, "entry settled");
                let message = response
                    .message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SETTLED_MESSAGE.to_string());
                self.notify(NoticeLevel::Success, message);
                self.reload_after_delay().await;
                Ok(response)
            }
            Err(e) => {
                warn!(entry, error = %e, "settle failed");
                let message = match &e {
                    AppError::Status { .. } | AppError::SettleRejected(..) => {
                        format!("{}: {}", SETTLE_FAILED_MESSAGE, e.notice_text())
                    }
                    _ => SETTLE_FAILED_MESSAGE.to_string(),
                };
                self.notify(NoticeLevel::Danger, message);
                Err(e)
            }
        }
    }

    /// Settle every entry currently shown as unsettled, one call at a time in
    /// display order. Failures are logged and skipped; the batch is not atomic.
    pub async fn settle_all(&mut self, cancel: &CancelToken) -> BatchReport {
        let mut report = BatchReport::start(self.view.selected_customer());
        let snapshot = self
            .view
            .sheet()
            .map(|sheet| sheet.entry_ids())
            .unwrap_or_default();

        if snapshot.is_empty() {
            self.notify(NoticeLevel::Warning, NOTHING_TO_SETTLE_MESSAGE.to_string());
            return report;
        }

        info!(batch = %report.batch_id, total = snapshot.len(), "settle batch started");
        self.view.apply(ViewEvent::BatchStarted {
            total: snapshot.len(),
        });

        for (index, entry) in snapshot.iter().copied().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            report.attempted.push(entry);
            match self.settle_call(entry).await {
                Ok(_) => {
                    debug!(batch = %report.batch_id, entry, "entry settled");
                    report.settled.push(entry);
                }
                Err(e) => {
                    warn!(batch = %report.batch_id, entry, error = %e, "settle failed, moving on");
                    report.failed.push((entry, e.to_string()));
                }
            }
            self.view.apply(ViewEvent::BatchProgress { done: index + 1 });

            let remaining = snapshot.len() - index - 1;
            if cancel.sleep(self.config.settle_delay).await && remaining > 0 {
                report.cancelled = true;
                break;
            }
        }

        self.view.apply(ViewEvent::BatchFinished);
        report.finished_at = Utc::now();
        info!(
            batch = %report.batch_id,
            settled = report.settled.len(),
            failed = report.failed.len(),
            cancelled = report.cancelled,
            "settle batch finished"
        );

        self.reload_after_delay().await;
        report
    }
}
