use super::{Cents, Tone, coerce_cents, format_euro, format_signed_euro};

/// The four operator-entered amounts of a partial cash count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CashCountInput {
    /// Balance reported by the betting terminal
    pub terminal_balance: Cents,
    /// Inflows recorded on the open distinta
    pub inflows_total: Cents,
    /// Outflows recorded on the open distinta
    pub outflows_total: Cents,
    /// Cash outside the terminal (drinks, tips)
    pub extra_cash: Cents,
}

/// Outcome of a cash count: the inputs it was computed from and the signed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CashCount {
    pub input: CashCountInput,
    pub result: Cents,
}

impl CashCount {
    /// result = terminal + inflows - outflows + extra, saturating at the
    /// bounds of [`Cents`].
    pub fn compute(input: CashCountInput) -> Self {
        let result = input
            .terminal_balance
            .saturating_add(input.inflows_total)
            .saturating_sub(input.outflows_total)
            .saturating_add(input.extra_cash);
        Self { input, result }
    }

    /// Human-readable equation, e.g. "100,00 € + 50,00 € - 20,00 € + 5,00 € = 135,00 €"
    pub fn equation(&self) -> String {
        format!(
            "{} + {} - {} + {} = {}",
            format_euro(self.input.terminal_balance),
            format_euro(self.input.inflows_total),
            format_euro(self.input.outflows_total),
            format_euro(self.input.extra_cash),
            format_euro(self.result)
        )
    }

    pub fn display_result(&self) -> String {
        format_euro(self.result)
    }

    pub fn tone(&self) -> Tone {
        Tone::of(self.result)
    }
}

/// Amounts reconciled when the distinta is closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosingInput {
    pub initial_cash: Cents,
    pub final_cash: Cents,
    pub inflows_total: Cents,
    pub outflows_total: Cents,
    pub drinks_total: Cents,
    pub terminal_balance: Cents,
}

/// Cash difference at closing. Anything but zero means the drawer does not
/// match the distinta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosingDifference {
    pub input: ClosingInput,
    pub difference: Cents,
}

impl ClosingDifference {
    /// difference = final - initial - inflows + outflows + drinks - terminal
    pub fn compute(input: ClosingInput) -> Self {
        let difference = input
            .final_cash
            .saturating_sub(input.initial_cash)
            .saturating_sub(input.inflows_total)
            .saturating_add(input.outflows_total)
            .saturating_add(input.drinks_total)
            .saturating_sub(input.terminal_balance);
        Self { input, difference }
    }

    pub fn is_balanced(&self) -> bool {
        self.difference == 0
    }

    pub fn tone(&self) -> Tone {
        if self.is_balanced() {
            Tone::Success
        } else {
            Tone::Danger
        }
    }

    /// e.g. "-15.00 €"
    pub fn display_difference(&self) -> String {
        format_signed_euro(self.difference, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashCountField {
    TerminalBalance,
    Inflows,
    Outflows,
    ExtraCash,
}

impl CashCountField {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "terminal" | "saldo_terminale" => Some(CashCountField::TerminalBalance),
            "inflows" | "entrate" => Some(CashCountField::Inflows),
            "outflows" | "uscite" => Some(CashCountField::Outflows),
            "extra" | "bevande" => Some(CashCountField::ExtraCash),
            _ => None,
        }
    }
}

/// Raw field text as typed by the operator. Every edit recomputes the count.
#[derive(Debug, Clone, Default)]
pub struct CashCountForm {
    terminal_balance: String,
    inflows_total: String,
    outflows_total: String,
    extra_cash: String,
}

impl CashCountForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the distinta totals, which the operator does not type.
    pub fn with_totals(mut self, inflows: Cents, outflows: Cents) -> Self {
        self.inflows_total = super::format_cents(inflows);
        self.outflows_total = super::format_cents(outflows);
        self
    }

    /// Replace one field's text and return the recomputed count.
    pub fn set(&mut self, field: CashCountField, text: impl Into<String>) -> CashCount {
        let text = text.into();
        match field {
            CashCountField::TerminalBalance => self.terminal_balance = text,
            CashCountField::Inflows => self.inflows_total = text,
            CashCountField::Outflows => self.outflows_total = text,
            CashCountField::ExtraCash => self.extra_cash = text,
        }
        self.count()
    }

    pub fn input(&self) -> CashCountInput {
        CashCountInput {
            terminal_balance: coerce_cents(&self.terminal_balance),
            inflows_total: coerce_cents(&self.inflows_total),
            outflows_total: coerce_cents(&self.outflows_total),
            extra_cash: coerce_cents(&self.extra_cash),
        }
    }

    pub fn count(&self) -> CashCount {
        CashCount::compute(self.input())
    }
}
