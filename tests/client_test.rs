use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use distinta::application::{AppError, ClientConfig, HttpLedgerClient, LedgerApi, Settlement};
use distinta::domain::{EntryKind, Tone};
use mockito::{Matcher, Server};

fn client_for(server: &Server) -> Result<HttpLedgerClient> {
    let config = ClientConfig::new(server.url())?.without_delays();
    Ok(HttpLedgerClient::new(config)?)
}

const ENTRIES_BODY: &str = r#"{
    "cliente": {
        "id": 7,
        "nome_completo": "Verdi Luca",
        "saldo": "-40.00",
        "fido_massimo": "100.00",
        "saldo_disponibile": "60.00"
    },
    "movimenti": [
        {"id": 41, "tipo": "Schedina", "importo": "25.00", "data": "01/05/2025 10:00", "distinta_id": 3},
        {"id": 42, "tipo": "Ricarica", "importo": "15.00", "data": "02/05/2025 11:30", "distinta_id": 3}
    ]
}"#;

const ENTRIES_AFTER_SETTLE_BODY: &str = r#"{
    "cliente": {"id": 7, "nome_completo": "Verdi Luca", "saldo": "-25.00", "fido_massimo": "100.00"},
    "movimenti": [
        {"id": 41, "tipo": "Schedina", "importo": "25.00", "data": "01/05/2025 10:00"}
    ]
}"#;

#[tokio::test]
async fn test_fetch_customer_entries() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/movimenti-cliente/")
        .match_query(Matcher::UrlEncoded("cliente_id".into(), "7".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ENTRIES_BODY)
        .create_async()
        .await;

    let client = client_for(&server)?;
    let payload = client.customer_entries(7).await?;

    mock.assert_async().await;
    let customer = payload.customer.expect("customer present");
    assert_eq!(customer.full_name, "Verdi Luca");
    assert_eq!(customer.balance, -4000);
    assert_eq!(customer.credit_limit, 10000);

    assert_eq!(payload.entries.len(), 2);
    assert_eq!(payload.entries[0].kind, EntryKind::Schedina);
    // Unsigned on the wire, signed by kind on our side
    assert_eq!(payload.entries[0].amount, -2500);
    assert_eq!(payload.entries[0].distinta_id, Some(3));
    Ok(())
}

#[tokio::test]
async fn test_fetch_without_customer() -> Result<()> {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/movimenti-cliente/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"movimenti": []}"#)
        .create_async()
        .await;

    let payload = client_for(&server)?.customer_entries(7).await?;
    assert!(payload.customer.is_none());
    assert!(payload.entries.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_fetch_unknown_customer() -> Result<()> {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/movimenti-cliente/")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"error": "Cliente non trovato"}"#)
        .create_async()
        .await;

    let result = client_for(&server)?.customer_entries(99).await;
    assert!(matches!(result, Err(AppError::CustomerNotFound(99))));
    Ok(())
}

#[tokio::test]
async fn test_settle_sends_xhr_header() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/movimenti/42/salda/")
        .match_header("x-requested-with", "XMLHttpRequest")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "ok", "cliente": {"id": 7, "saldo": "-15.00"}}"#)
        .create_async()
        .await;

    let response = client_for(&server)?.settle_entry(42).await?;

    mock.assert_async().await;
    assert_eq!(response.message.as_deref(), Some("ok"));
    let update = response.customer.expect("balance update");
    assert_eq!(update.id, 7);
    assert_eq!(update.balance, -1500);
    Ok(())
}

#[tokio::test]
async fn test_settle_error_carries_server_message() -> Result<()> {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/movimenti/42/salda/")
        .with_status(400)
        .with_body(r#"{"success": false, "message": "Non esiste una distinta aperta"}"#)
        .create_async()
        .await;

    let err = client_for(&server)?.settle_entry(42).await.unwrap_err();
    match &err {
        AppError::Status { status, message } => {
            assert_eq!(*status, 400);
            assert_eq!(message, "Non esiste una distinta aperta");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.notice_text(), "Non esiste una distinta aperta");
    Ok(())
}

#[tokio::test]
async fn test_settle_refused_with_ok_status() -> Result<()> {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/movimenti/42/salda/")
        .with_status(200)
        .with_body(r#"{"success": false, "message": "Movimento già saldato"}"#)
        .create_async()
        .await;

    let result = client_for(&server)?.settle_entry(42).await;
    assert!(matches!(result, Err(AppError::SettleRejected(42, _))));
    Ok(())
}

#[tokio::test]
async fn test_settle_through_http_updates_view() -> Result<()> {
    let mut server = Server::new_async().await;
    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = fetches.clone();
    server
        .mock("GET", "/api/movimenti-cliente/")
        .match_query(Matcher::UrlEncoded("cliente_id".into(), "7".into()))
        .with_status(200)
        .with_body_from_request(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                ENTRIES_BODY.into()
            } else {
                ENTRIES_AFTER_SETTLE_BODY.into()
            }
        })
        .expect(2)
        .create_async()
        .await;
    server
        .mock("GET", "/movimenti/42/salda/")
        .match_header("x-requested-with", "XMLHttpRequest")
        .with_status(200)
        .with_body(r#"{"message": "ok", "cliente": {"id": 7, "saldo": "-15.00"}}"#)
        .create_async()
        .await;

    let config = ClientConfig::new(server.url())?.without_delays();
    let mut settlement = Settlement::new(HttpLedgerClient::new(config.clone())?, config);
    settlement.select_customer(7).await;
    assert!(settlement.view().sheet().unwrap().has_row(42));

    settlement.settle_one(42).await?;

    let sheet = settlement.view().sheet().unwrap();
    assert!(!sheet.has_row(42));
    assert_eq!(sheet.customer.balance_tone(), Tone::Danger);
    assert_eq!(settlement.view().notices[0].message, "ok");
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_service_fails_the_panel() -> Result<()> {
    // Nothing listens on this port
    let config = ClientConfig::new("http://127.0.0.1:9")?.without_delays();
    let mut settlement = Settlement::new(HttpLedgerClient::new(config.clone())?, config);

    settlement.select_customer(7).await;

    assert!(matches!(
        settlement.view().panel,
        distinta::view::CustomerPanel::Failed(_)
    ));
    Ok(())
}
