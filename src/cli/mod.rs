use std::io::BufRead;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::application::{
    BatchReport, ClientConfig, ClosingForm, Handoff, HttpLedgerClient, Settlement, cancel_pair,
    hand_off,
};
use crate::domain::{
    CashCount, CashCountField, CashCountForm, CustomerId, EntryId, EntryKind, NewEntryForm,
    coerce_cents, format_cents,
};
use crate::storage::SessionStore;
use crate::view::{render, render_cash_count, render_closing, render_entry_form, render_notice};

/// Distinta - cash-count and ledger settlement client
#[derive(Parser)]
#[command(name = "distinta")]
#[command(about = "Cash-count reconciliation and ledger settlement for the distinta back office")]
#[command(version)]
pub struct Cli {
    /// Back-office base URL
    #[arg(long, env = "DISTINTA_URL", default_value = "http://localhost:8000")]
    pub url: String,

    /// Session store file (bridges values between commands)
    #[arg(long, env = "DISTINTA_SESSION_DB", default_value = "distinta-session.db")]
    pub session_db: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Skip the pacing delays between settle calls
    #[arg(long, global = true)]
    pub no_delay: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Partial cash count: terminal + inflows - outflows + extra
    Count {
        /// Balance shown by the terminal
        #[arg(long, default_value = "")]
        terminal: String,

        /// Inflows total of the open distinta
        #[arg(long, default_value = "")]
        inflows: String,

        /// Outflows total of the open distinta
        #[arg(long, default_value = "")]
        outflows: String,

        /// Extra cash (drinks etc.)
        #[arg(long, default_value = "")]
        extra: String,

        /// Keep the result as final cash for closing the distinta
        #[arg(long)]
        use_as_final: bool,

        /// Read "<field> <value>" lines from stdin, recomputing after each one
        #[arg(short, long)]
        interactive: bool,
    },

    /// Prepare the distinta closing, picking up a parked cash count
    Close {
        /// Final cash (omit to use the value kept by `count --use-as-final`)
        #[arg(long)]
        final_cash: Option<String>,

        /// Cash in the drawer when the distinta was opened
        #[arg(long, default_value = "")]
        initial: String,

        /// Inflows total of the distinta
        #[arg(long, default_value = "")]
        inflows: String,

        /// Outflows total of the distinta
        #[arg(long, default_value = "")]
        outflows: String,

        /// Drinks total
        #[arg(long, default_value = "")]
        drinks: String,

        /// Balance shown by the terminal
        #[arg(long, default_value = "")]
        terminal: String,
    },

    /// Preview a new entry, optionally filling the amount with a preset
    Draft {
        /// Entry kind (e.g. schedina, "Incasso Credito")
        kind: String,

        /// Preset amount, as the quick buttons would set it
        #[arg(long, conflicts_with = "amount")]
        quick: Option<String>,

        /// Amount typed by hand
        #[arg(long)]
        amount: Option<String>,

        /// The distinta is closed: the form has no amount field
        #[arg(long)]
        closed: bool,
    },

    /// Show a customer's unsettled entries
    Entries {
        /// Customer ID
        #[arg(short, long, env = "DISTINTA_CUSTOMER")]
        customer: CustomerId,
    },

    /// Settle a single entry
    Settle {
        /// Entry ID
        entry: EntryId,

        /// Customer whose view is refreshed afterwards
        #[arg(short, long, env = "DISTINTA_CUSTOMER")]
        customer: Option<CustomerId>,
    },

    /// Settle all unsettled entries of a customer, one by one (Ctrl-C stops)
    SettleAll {
        /// Customer ID
        #[arg(short, long, env = "DISTINTA_CUSTOMER")]
        customer: CustomerId,
    },
}

/// Install the tracing subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("distinta={},reqwest=warn,sqlx=warn", level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let config = ClientConfig::new(&self.url)?.with_timeout(Duration::from_secs(self.timeout));
        Ok(if self.no_delay {
            config.without_delays()
        } else {
            config
        })
    }

    fn settlement(&self) -> Result<Settlement<HttpLedgerClient>> {
        let config = self.client_config()?;
        let client = HttpLedgerClient::new(config.clone())?;
        Ok(Settlement::new(client, config))
    }

    pub async fn run(self) -> Result<()> {
        init_tracing(self.verbose);

        match &self.command {
            Commands::Count {
                terminal,
                inflows,
                outflows,
                extra,
                use_as_final,
                interactive,
            } => {
                let mut form = CashCountForm::new().with_totals(
                    coerce_cents(inflows),
                    coerce_cents(outflows),
                );
                form.set(CashCountField::TerminalBalance, terminal.as_str());
                let count = form.set(CashCountField::ExtraCash, extra.as_str());

                let count = if *interactive {
                    run_interactive_count(form)?
                } else {
                    print!("{}", render_cash_count(&count));
                    count
                };

                if *use_as_final {
                    let store = SessionStore::open(&self.session_db).await?;
                    run_hand_off(&count, &store).await?;
                }
            }

            Commands::Close {
                final_cash,
                initial,
                inflows,
                outflows,
                drinks,
                terminal,
            } => {
                let store = SessionStore::open(&self.session_db).await?;
                let form = ClosingForm {
                    initial_cash: coerce_cents(initial),
                    inflows_total: coerce_cents(inflows),
                    outflows_total: coerce_cents(outflows),
                    drinks_total: coerce_cents(drinks),
                    terminal_balance: coerce_cents(terminal),
                    ..ClosingForm::default()
                };
                run_close_command(&store, form, final_cash.as_deref()).await?;
            }

            Commands::Draft {
                kind,
                quick,
                amount,
                closed,
            } => {
                run_draft_command(kind, quick.as_deref(), amount.as_deref(), *closed)?;
            }

            Commands::Entries { customer } => {
                let mut settlement = self.settlement()?;
                settlement.select_customer(*customer).await;
                print!("{}", render(settlement.view()));
            }

            Commands::Settle { entry, customer } => {
                let mut settlement = self.settlement()?;
                if let Some(customer) = customer {
                    settlement.select_customer(*customer).await;
                }
                let outcome = settlement.settle_one(*entry).await;
                print!("{}", render(settlement.view()));
                outcome.with_context(|| format!("Entry {} was not settled", entry))?;
            }

            Commands::SettleAll { customer } => {
                let mut settlement = self.settlement()?;
                settlement.select_customer(*customer).await;

                let (handle, token) = cancel_pair();
                let watcher = tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        eprintln!("Stopping after the current entry...");
                        handle.cancel();
                    }
                });

                let report = settlement.settle_all(&token).await;
                watcher.abort();

                for notice in settlement.view_mut().drain_notices() {
                    println!("{}", render_notice(&notice));
                }
                print_batch_report(&report);
                println!();
                print!("{}", render(settlement.view()));
            }
        }

        Ok(())
    }
}

fn run_interactive_count(mut form: CashCountForm) -> Result<CashCount> {
    let mut count = form.count();
    print!("{}", render_cash_count(&count));
    eprintln!("Fields: terminal, inflows, outflows, extra. Empty line to finish.");

    for line in std::io::stdin().lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        let (name, value) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match CashCountField::from_str(name) {
            Some(field) => {
                count = form.set(field, value.trim());
                print!("{}", render_cash_count(&count));
            }
            None => eprintln!("Unknown field '{}'", name),
        }
    }
    Ok(count)
}

async fn run_hand_off(count: &CashCount, store: &SessionStore) -> Result<()> {
    // No closing form is open from the command line, so the value is parked.
    match hand_off(count.result, None, store).await? {
        Handoff::Applied(value) => {
            println!("Cassa finale impostata: {}", format_cents(value));
        }
        Handoff::Stored { value, redirect } => {
            println!(
                "Valore salvato ({})! Ora chiudi la distinta con `distinta close` ({}).",
                format_cents(value),
                redirect
            );
        }
    }
    Ok(())
}

async fn run_close_command(
    store: &SessionStore,
    mut form: ClosingForm,
    final_cash: Option<&str>,
) -> Result<()> {
    match final_cash {
        Some(value) => {
            form.set_final_cash(coerce_cents(value));
        }
        None => {
            if !form.prefill_from_session(store).await? {
                println!(
                    "Nessun conteggio cassa salvato: usa `distinta count --use-as-final` \
                     oppure --final-cash."
                );
                return Ok(());
            }
        }
    }

    if let Some(value) = form.final_cash {
        println!("Chiusura distinta");
        println!("  Cassa finale: {} €", format_cents(value));
    }
    if let Some(closing) = form.difference() {
        print!("  {}", render_closing(&closing));
    }
    Ok(())
}

fn run_draft_command(
    kind: &str,
    quick: Option<&str>,
    amount: Option<&str>,
    closed: bool,
) -> Result<()> {
    let Some(kind) = EntryKind::from_str(kind) else {
        bail!("Unknown entry kind '{}'", kind);
    };
    let mut form = if closed {
        NewEntryForm::without_amount_field(kind)
    } else {
        NewEntryForm::new(kind)
    };

    if let Some(text) = amount {
        form.type_amount(text);
    }
    if let Some(value) = quick {
        if !form.set_amount(coerce_cents(value)) {
            bail!("No amount field on this form: the distinta is closed");
        }
    }

    print!("{}", render_entry_form(&form));
    Ok(())
}

fn print_batch_report(report: &BatchReport) {
    if report.is_empty() {
        return;
    }
    match report.customer {
        Some(customer) => println!("Batch {} (cliente {})", report.batch_id, customer),
        None => println!("Batch {}", report.batch_id),
    }
    println!(
        "  Saldati: {}   Errori: {}   Tentati: {}{}",
        report.settled.len(),
        report.failed.len(),
        report.attempted.len(),
        if report.cancelled { "   (interrotto)" } else { "" }
    );
    for (entry, reason) in &report.failed {
        println!("  #{}: {}", entry, reason);
    }
    println!(
        "  Durata: {} ms",
        (report.finished_at - report.started_at).num_milliseconds()
    );
}
