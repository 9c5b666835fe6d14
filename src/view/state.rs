use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::{BalanceUpdate, Customer, CustomerId, EntryId, LedgerEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Danger,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Danger => "danger",
        }
    }
}

/// A transient message shown above the page content.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now - self.raised_at >= ttl,
            // Out of range: never expires
            Err(_) => false,
        }
    }
}

/// State of the "settle all" trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchControl {
    Enabled,
    Running { done: usize, total: usize },
}

/// The unsettled-entries panel for the selected customer.
#[derive(Debug, Clone)]
pub struct CustomerSheet {
    pub customer: Customer,
    pub rows: Vec<LedgerEntry>,
    pub batch: BatchControl,
}

impl CustomerSheet {
    pub fn entry_ids(&self) -> Vec<EntryId> {
        self.rows.iter().map(|e| e.id).collect()
    }

    pub fn has_row(&self, id: EntryId) -> bool {
        self.rows.iter().any(|e| e.id == id)
    }
}

#[derive(Debug, Clone)]
pub enum CustomerPanel {
    NoCustomer,
    Loading(CustomerId),
    Failed(String),
    Loaded(CustomerSheet),
}

/// A row in one of the other tables showing the same entries.
#[derive(Debug, Clone)]
pub struct RelatedRow {
    pub entry: LedgerEntry,
}

impl RelatedRow {
    pub fn status_label(&self) -> &'static str {
        if self.entry.settled { "Saldato" } else { "Da saldare" }
    }

    pub fn settle_action_visible(&self) -> bool {
        !self.entry.settled
    }
}

#[derive(Debug, Clone)]
pub struct RelatedTable {
    pub title: &'static str,
    pub rows: Vec<RelatedRow>,
}

/// Everything the view shows, changed only through [`ViewEvent`]s.
#[derive(Debug, Clone)]
pub struct LedgerView {
    /// Page query string reflecting the selected customer, e.g. "?cliente=7"
    pub location: Option<String>,
    pub panel: CustomerPanel,
    pub related: Vec<RelatedTable>,
    pub notices: Vec<Notice>,
    selected: Option<CustomerId>,
}

#[derive(Debug, Clone)]
pub enum ViewEvent {
    CustomerSelected(CustomerId),
    EntriesLoaded {
        customer: Option<Customer>,
        entries: Vec<LedgerEntry>,
    },
    LoadFailed(String),
    EntrySettled {
        id: EntryId,
        update: Option<BalanceUpdate>,
    },
    BatchStarted { total: usize },
    BatchProgress { done: usize },
    BatchFinished,
    Notice(NoticeLevel, String),
}

impl Default for LedgerView {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerView {
    pub fn new() -> Self {
        Self {
            location: None,
            panel: CustomerPanel::NoCustomer,
            related: Vec::new(),
            notices: Vec::new(),
            selected: None,
        }
    }

    pub fn selected_customer(&self) -> Option<CustomerId> {
        self.selected
    }

    pub fn sheet(&self) -> Option<&CustomerSheet> {
        match &self.panel {
            CustomerPanel::Loaded(sheet) => Some(sheet),
            _ => None,
        }
    }

    fn sheet_mut(&mut self) -> Option<&mut CustomerSheet> {
        match &mut self.panel {
            CustomerPanel::Loaded(sheet) => Some(sheet),
            _ => None,
        }
    }

    pub fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::CustomerSelected(id) => {
                if self.selected != Some(id) {
                    self.related.clear();
                }
                self.selected = Some(id);
                self.location = Some(format!("?cliente={}", id));
                self.panel = CustomerPanel::Loading(id);
            }

            ViewEvent::EntriesLoaded { customer, entries } => match customer {
                Some(customer) => {
                    if self.related.is_empty() {
                        self.related = split_by_direction(&entries);
                    }
                    self.panel = CustomerPanel::Loaded(CustomerSheet {
                        customer,
                        rows: entries,
                        batch: BatchControl::Enabled,
                    });
                }
                None => self.panel = CustomerPanel::NoCustomer,
            },

            ViewEvent::LoadFailed(reason) => self.panel = CustomerPanel::Failed(reason),

            ViewEvent::EntrySettled { id, update } => {
                if let Some(sheet) = self.sheet_mut() {
                    sheet.rows.retain(|e| e.id != id);
                    if let Some(update) = &update {
                        sheet.customer.apply_update(update);
                    }
                }
                for row in self
                    .related
                    .iter_mut()
                    .flat_map(|t| t.rows.iter_mut())
                    .filter(|r| r.entry.id == id)
                {
                    row.entry.settled = true;
                }
            }

            ViewEvent::BatchStarted { total } => {
                if let Some(sheet) = self.sheet_mut() {
                    sheet.batch = BatchControl::Running { done: 0, total };
                }
            }

            ViewEvent::BatchProgress { done } => {
                if let Some(sheet) = self.sheet_mut() {
                    if let BatchControl::Running { total, .. } = sheet.batch {
                        sheet.batch = BatchControl::Running { done, total };
                    }
                }
            }

            ViewEvent::BatchFinished => {
                if let Some(sheet) = self.sheet_mut() {
                    sheet.batch = BatchControl::Enabled;
                }
            }

            ViewEvent::Notice(level, message) => self.notices.push(Notice {
                level,
                message,
                raised_at: Utc::now(),
            }),
        }
    }

    /// Drop notices older than `ttl`.
    pub fn expire_notices(&mut self, now: DateTime<Utc>, ttl: Duration) {
        self.notices.retain(|n| !n.is_expired(now, ttl));
    }

    /// Hand over pending notices, e.g. to print them once.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

/// The "Entrate" and "Uscite" tabs of the distinta page.
fn split_by_direction(entries: &[LedgerEntry]) -> Vec<RelatedTable> {
    let (inflows, outflows): (Vec<_>, Vec<_>) =
        entries.iter().cloned().partition(|e| e.is_inflow());
    vec![
        RelatedTable {
            title: "Entrate",
            rows: inflows.into_iter().map(|entry| RelatedRow { entry }).collect(),
        },
        RelatedTable {
            title: "Uscite",
            rows: outflows.into_iter().map(|entry| RelatedRow { entry }).collect(),
        },
    ]
}
