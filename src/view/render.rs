use std::fmt::Write;

use crate::domain::{
    CashCount, ClosingDifference, NewEntryForm, QUICK_AMOUNTS, Tone, format_cents,
    format_signed_euro,
};

use super::{BatchControl, CustomerPanel, CustomerSheet, LedgerView, Notice, RelatedTable};

/// Render the whole view. Output depends on the state only.
pub fn render(view: &LedgerView) -> String {
    let mut out = String::new();
    for notice in &view.notices {
        out.push_str(&render_notice(notice));
        out.push('\n');
    }
    out.push_str(&render_panel(&view.panel));
    for table in &view.related {
        if !table.rows.is_empty() {
            out.push('\n');
            out.push_str(&render_related(table));
        }
    }
    out
}

pub fn render_notice(notice: &Notice) -> String {
    format!("[{}] {}", notice.level.as_str(), notice.message)
}

pub fn render_panel(panel: &CustomerPanel) -> String {
    match panel {
        CustomerPanel::NoCustomer => {
            "Seleziona un cliente per vedere i movimenti da saldare\n".to_string()
        }
        CustomerPanel::Loading(_) => "Caricamento movimenti in corso...\n".to_string(),
        CustomerPanel::Failed(reason) => format!(
            "Errore nel caricamento dei dati del cliente\n  {}\n",
            reason
        ),
        CustomerPanel::Loaded(sheet) => render_sheet(sheet),
    }
}

fn render_sheet(sheet: &CustomerSheet) -> String {
    let customer = &sheet.customer;
    let mut out = String::new();

    let _ = writeln!(out, "{}", customer.full_name);
    let _ = writeln!(
        out,
        "  Saldo: {} ({})   Fido: {} €   Disponibile: {} €",
        customer.display_balance(),
        customer.balance_tone(),
        format_cents(customer.credit_limit),
        format_cents(customer.available_credit())
    );
    if customer.credit_exceeded() {
        let _ = writeln!(
            out,
            "  Fido superato di {} €",
            format_cents(customer.credit_excess())
        );
    }

    if sheet.rows.is_empty() {
        let _ = writeln!(out, "Nessun movimento da saldare per questo cliente");
        return out;
    }

    match sheet.batch {
        BatchControl::Enabled => {
            let _ = writeln!(out, "  [Salda Tutti]");
        }
        BatchControl::Running { done, total } => {
            let _ = writeln!(out, "  Saldamento in corso... ({}/{})", done, total);
        }
    }

    let _ = writeln!(
        out,
        "{:<8} {:<18} {:>12} {:<17}",
        "ID", "TIPO", "IMPORTO", "DATA"
    );
    let _ = writeln!(out, "{}", "-".repeat(58));
    for entry in &sheet.rows {
        let _ = writeln!(
            out,
            "{:<8} {:<18} {:>12} {:<17}",
            entry.id,
            entry.kind.label(),
            entry.display_amount(),
            entry.date
        );
    }
    out
}

fn render_related(table: &RelatedTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", table.title);
    for row in &table.rows {
        let _ = writeln!(
            out,
            "  {:<8} {:<18} {:>12} {:<10}{}",
            row.entry.id,
            row.entry.kind.label(),
            row.entry.display_amount(),
            row.status_label(),
            if row.settle_action_visible() { " [Salda]" } else { "" }
        );
    }
    out
}

/// Render the cash-count card: equation, result and its classification.
pub fn render_cash_count(count: &CashCount) -> String {
    let marker = match count.tone() {
        Tone::Success => "ok",
        Tone::Danger => "ATTENZIONE",
    };
    format!(
        "{}\nCassa: {} ({}, {})\n",
        count.equation(),
        count.display_result(),
        count.tone(),
        marker
    )
}

/// Render the new-entry form: preset buttons, the lit one in brackets.
pub fn render_entry_form(form: &NewEntryForm) -> String {
    let mut out = format!("Nuovo movimento: {}\n", form.kind.label());
    let Some(text) = form.amount_text() else {
        out.push_str("Importo non modificabile\n");
        return out;
    };

    let buttons: Vec<String> = QUICK_AMOUNTS
        .iter()
        .map(|&value| {
            if form.highlighted() == Some(value) {
                format!("[{}]", format_cents(value))
            } else {
                format!(" {} ", format_cents(value))
            }
        })
        .collect();
    let _ = writeln!(out, "Importi rapidi: {}", buttons.join(""));
    let _ = writeln!(out, "Importo: {}", text);
    if let Some(signed) = form.signed_amount() {
        let _ = writeln!(out, "Registrato come: {}", format_signed_euro(signed, true));
    }
    out
}

/// Render the closing reconciliation line.
pub fn render_closing(closing: &ClosingDifference) -> String {
    format!(
        "Differenza cassa: {} ({})\n",
        closing.display_difference(),
        closing.tone()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CashCountInput, ClosingInput, Customer, EntryKind, LedgerEntry};
    use crate::view::ViewEvent;

    #[test]
    fn test_render_loaded_sheet() {
        let mut view = LedgerView::new();
        view.apply(ViewEvent::CustomerSelected(7));
        view.apply(ViewEvent::EntriesLoaded {
            customer: Some(Customer::new(7, "Verdi Luca", -6000, 5000)),
            entries: vec![
                LedgerEntry::new(42, EntryKind::Schedina, 1500).with_date("03/05/2025 18:30"),
            ],
        });

        let out = render(&view);
        assert!(out.contains("Verdi Luca"));
        assert!(out.contains("Saldo: -60.00 € (danger)"));
        assert!(out.contains("Fido superato di 10.00 €"));
        assert!(out.contains("[Salda Tutti]"));
        assert!(out.contains("-15.00 €"));
        assert!(out.contains("Uscite"));
    }

    #[test]
    fn test_render_empty_and_failed_panels() {
        assert!(render_panel(&CustomerPanel::NoCustomer).contains("Seleziona un cliente"));
        assert!(render_panel(&CustomerPanel::Failed("timeout".into())).contains("timeout"));
    }

    #[test]
    fn test_render_cash_count() {
        let count = CashCount::compute(CashCountInput {
            terminal_balance: 1000,
            inflows_total: 0,
            outflows_total: 5000,
            extra_cash: 0,
        });
        let out = render_cash_count(&count);
        assert!(out.contains("Cassa: -40,00 € (danger, ATTENZIONE)"));
    }

    #[test]
    fn test_render_entry_form_highlights_preset() {
        let mut form = NewEntryForm::new(EntryKind::Schedina);
        form.set_amount(2000);
        let out = render_entry_form(&form);
        assert!(out.contains("Nuovo movimento: Schedina"));
        assert!(out.contains("[20.00]"));
        assert!(out.contains(" 10.00 "));
        assert!(out.contains("Importo: 20.00"));
        assert!(out.contains("Registrato come: -20.00 €"));

        let closed = NewEntryForm::without_amount_field(EntryKind::Schedina);
        assert!(render_entry_form(&closed).contains("Importo non modificabile"));
    }

    #[test]
    fn test_render_closing() {
        let closing = ClosingDifference::compute(ClosingInput {
            initial_cash: 10000,
            final_cash: 9000,
            ..ClosingInput::default()
        });
        assert_eq!(render_closing(&closing), "Differenza cassa: -10.00 € (danger)\n");
    }
}
