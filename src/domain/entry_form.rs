use super::{Cents, EntryKind, coerce_cents, format_cents};

/// Preset amounts offered as one-tap buttons next to the amount field.
pub const QUICK_AMOUNTS: [Cents; 6] = [500, 1000, 2000, 5000, 10000, 20000];

/// The "new entry" form of a distinta page.
///
/// A closed distinta shows the form without its amount field, so setters
/// report whether there was a field to write into.
#[derive(Debug, Clone)]
pub struct NewEntryForm {
    pub kind: EntryKind,
    amount: Option<String>,
    highlighted: Option<Cents>,
}

impl NewEntryForm {
    pub fn new(kind: EntryKind) -> Self {
        Self {
            kind,
            amount: Some(String::new()),
            highlighted: None,
        }
    }

    pub fn without_amount_field(kind: EntryKind) -> Self {
        Self {
            kind,
            amount: None,
            highlighted: None,
        }
    }

    pub fn has_amount_field(&self) -> bool {
        self.amount.is_some()
    }

    /// Write a preset amount into the amount field and highlight its button.
    /// Returns `false`, leaving the form untouched, when there is no field.
    pub fn set_amount(&mut self, value: Cents) -> bool {
        let Some(field) = self.amount.as_mut() else {
            return false;
        };
        *field = format_cents(value);
        self.highlighted = Some(value);
        true
    }

    /// Operator typing replaces the text and drops the preset highlight.
    pub fn type_amount(&mut self, text: impl Into<String>) -> bool {
        let Some(field) = self.amount.as_mut() else {
            return false;
        };
        *field = text.into();
        self.highlighted = None;
        true
    }

    /// Raw field text, `None` when the form has no amount field.
    pub fn amount_text(&self) -> Option<&str> {
        self.amount.as_deref()
    }

    /// Amount as typed, coerced leniently.
    pub fn amount(&self) -> Option<Cents> {
        self.amount.as_deref().map(coerce_cents)
    }

    /// Amount with the kind's direction applied.
    pub fn signed_amount(&self) -> Option<Cents> {
        self.amount().map(|amount| self.kind.signed(amount))
    }

    /// The preset whose button is lit, if the field still holds it.
    pub fn highlighted(&self) -> Option<Cents> {
        self.highlighted
    }
}
