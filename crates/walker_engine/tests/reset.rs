mod common;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use walker_engine::{
    Coordinator, Extractor, HostError, HostPage, MemoryJobStore, SnapshotHost, WalkSettings,
};

use common::{fixed_clock, two_page_host, TAB_URL};

fn extractor(host: Arc<SnapshotHost>) -> Arc<Extractor> {
    extractor_with_settings(host, WalkSettings::default())
}

fn extractor_with_settings(host: Arc<SnapshotHost>, settings: WalkSettings) -> Arc<Extractor> {
    let coordinator = Arc::new(Coordinator::with_clock(
        Arc::new(MemoryJobStore::new()),
        fixed_clock(),
    ));
    Arc::new(Extractor::new(host, coordinator, settings))
}

#[tokio::test]
async fn reset_rewinds_cursor_and_reloads() {
    let host = Arc::new(
        two_page_host()
            .with_view_state("theme", "dark")
            .with_view_state("output-tax-table", r#"{"first":10,"rows":10,"sortField":"date"}"#),
    );
    let extractor = extractor(host.clone());

    let rewritten = extractor.rewind_and_reload().await.unwrap();

    assert!(rewritten);
    assert_eq!(host.reloads(), 1);
    assert_eq!(host.view_state_entry("theme").as_deref(), Some("dark"));
    let table: serde_json::Value =
        serde_json::from_str(&host.view_state_entry("output-tax-table").unwrap()).unwrap();
    assert_eq!(table["first"], 0);
    assert_eq!(table["rows"], 10);
    assert_eq!(table["sortField"], "date");
}

#[tokio::test]
async fn reset_without_cursor_still_reloads() {
    let host = Arc::new(two_page_host().with_view_state("theme", "dark"));
    let extractor = extractor(host.clone());

    let rewritten = extractor.rewind_and_reload().await.unwrap();

    assert!(!rewritten);
    assert_eq!(host.reloads(), 1);
    assert_eq!(host.view_state_entry("theme").as_deref(), Some("dark"));
}

#[tokio::test(start_paused = true)]
async fn reset_view_acks_then_returns_table_to_first_page() {
    let host = Arc::new(
        two_page_host().with_view_state("output-tax-table", r#"{"first":10,"rows":10}"#),
    );
    let extractor = extractor(host.clone());
    extractor.run_walk(&CancellationToken::new()).await.unwrap();
    assert_eq!(host.current_page(), 1);

    let ack = extractor.reset_view();
    assert!(ack.success);
    assert_eq!(host.reloads(), 0);

    extractor.wait_idle().await;
    assert_eq!(host.reloads(), 1);
    assert_eq!(host.current_page(), 0);
}

#[tokio::test]
async fn reset_on_closed_tab_reports_error() {
    let host = Arc::new(two_page_host());
    host.detach();
    let extractor = extractor(host);

    assert!(extractor.rewind_and_reload().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn reset_follows_configured_cursor_field() {
    let host = Arc::new(
        two_page_host()
            .with_cursor_field("offset")
            .with_view_state("output-tax-table", r#"{"offset":10,"rows":10}"#),
    );
    let settings = WalkSettings {
        cursor_field: "offset".to_string(),
        ..WalkSettings::default()
    };
    let extractor = extractor_with_settings(host.clone(), settings);
    extractor.run_walk(&CancellationToken::new()).await.unwrap();
    assert_eq!(host.current_page(), 1);

    assert!(extractor.rewind_and_reload().await.unwrap());

    assert_eq!(host.current_page(), 0);
    let table: serde_json::Value =
        serde_json::from_str(&host.view_state_entry("output-tax-table").unwrap()).unwrap();
    assert_eq!(table["offset"], 0);
}

#[tokio::test]
async fn url_is_reported_only_while_attached() {
    let host = two_page_host();
    assert_eq!(host.url().await.unwrap(), TAB_URL);

    host.detach();
    assert!(matches!(host.url().await, Err(HostError::Detached(_))));
}
