use serde::{Deserialize, Deserializer, Serialize};

use super::{Cents, deserialize_cents, format_signed_euro};

/// Server-assigned ledger entry identifier.
pub type EntryId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Betting slip sold on credit
    Schedina,
    /// Top-up of a gaming account
    Ricarica,
    /// Cash withdrawal paid out to the customer
    Prelievo,
    /// Customer pays back a credit
    IncassoCredito,
    /// Agency pays back a debt
    PagamentoDebito,
}

impl EntryKind {
    pub const ALL: [EntryKind; 5] = [
        EntryKind::Schedina,
        EntryKind::Ricarica,
        EntryKind::Prelievo,
        EntryKind::IncassoCredito,
        EntryKind::PagamentoDebito,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Schedina => "schedina",
            EntryKind::Ricarica => "ricarica",
            EntryKind::Prelievo => "prelievo",
            EntryKind::IncassoCredito => "incasso_credito",
            EntryKind::PagamentoDebito => "pagamento_debito",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Schedina => "Schedina",
            EntryKind::Ricarica => "Ricarica",
            EntryKind::Prelievo => "Prelievo",
            EntryKind::IncassoCredito => "Incasso Credito",
            EntryKind::PagamentoDebito => "Pagamento Debito",
        }
    }

    /// Parse either the machine code ("incasso_credito") or the display
    /// label ("Incasso Credito"), case-insensitively.
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(' ', "_");
        Self::ALL.into_iter().find(|k| k.as_str() == normalized)
    }

    /// Outflow kinds lower the customer's balance and are stored negative.
    pub fn is_outflow(&self) -> bool {
        matches!(
            self,
            EntryKind::Schedina | EntryKind::Ricarica | EntryKind::PagamentoDebito
        )
    }

    /// Apply the kind's direction to an amount, whatever sign it came with.
    pub fn signed(&self, amount: Cents) -> Cents {
        if self.is_outflow() {
            -amount.saturating_abs()
        } else {
            amount.saturating_abs()
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl<'de> Deserialize<'de> for EntryKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        EntryKind::from_str(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown entry kind '{}'", raw)))
    }
}

/// A ledger entry (movimento) affecting a customer's balance.
/// Created server-side; the client only reads it and asks for it to be settled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    #[serde(rename = "tipo")]
    pub kind: EntryKind,
    /// Signed amount: negative for outflows
    #[serde(rename = "importo", deserialize_with = "deserialize_cents")]
    pub amount: Cents,
    /// Display string, "dd/mm/yyyy HH:MM"
    #[serde(rename = "data", default)]
    pub date: String,
    #[serde(rename = "saldato", default)]
    pub settled: bool,
    #[serde(rename = "distinta_id", default)]
    pub distinta_id: Option<i64>,
}

impl LedgerEntry {
    pub fn new(id: EntryId, kind: EntryKind, amount: Cents) -> Self {
        Self {
            id,
            kind,
            amount: kind.signed(amount),
            date: String::new(),
            settled: false,
            distinta_id: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    /// The unsettled-entries endpoint sends absolute amounts; restore the
    /// sign from the kind.
    pub fn normalized(mut self) -> Self {
        self.amount = self.kind.signed(self.amount);
        self
    }

    pub fn is_inflow(&self) -> bool {
        self.amount >= 0
    }

    pub fn display_amount(&self) -> String {
        format_signed_euro(self.amount, true)
    }
}
