//! End-to-end tests for the patch pipeline.
//!
//! The orchestrator runs against the in-memory store and either the
//! scripted lookup or the real HTTP client talking to an in-process fake
//! vendor service.

use patcher_core::{
    CancelToken, FailureKind, PatchConfig, PatchContext, PatchOrchestrator, PatchOutcome,
    StrategyRegistry, TenantReport, LOCAL_LEGAL_NAME,
};
use patcher_lookup::{Credentials, VendorServiceClient};
use patcher_store::{RecordStore, StoreError};
use patcher_test_utils::{t1_scenario, tenant, vendor, InMemoryRecordStore, ScriptedLookup, T1Scenario};
use patcher_types::{LookupConfig, Record, Tenant};
use pretty_assertions::assert_eq;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Reply};

struct Patched {
    report: TenantReport,
    store: Arc<InMemoryRecordStore>,
    lookup: Arc<ScriptedLookup>,
    tenant: Tenant,
}

async fn patch_t1(concurrency: usize) -> Patched {
    let T1Scenario {
        tenant,
        store,
        lookup,
    } = t1_scenario();
    let store = Arc::new(store);
    let lookup = Arc::new(lookup);

    let orchestrator = PatchOrchestrator::new(
        store.clone(),
        StrategyRegistry::with_defaults(lookup.clone()),
        PatchConfig::new().with_concurrency(concurrency),
    );
    let report = orchestrator
        .run_tenant(LOCAL_LEGAL_NAME, &tenant)
        .await
        .unwrap();

    Patched {
        report,
        store,
        lookup,
        tenant,
    }
}

fn legal_name(patched: &Patched, code: &str) -> String {
    patched
        .store
        .record(&patched.tenant, code)
        .map(|r| r.local_legal_name)
        .unwrap_or_default()
}

/// A("") is filled, B("X") is left alone without a lookup, C("") has no data.
#[tokio::test]
async fn t1_end_to_end() {
    let patched = patch_t1(1).await;

    assert_eq!(legal_name(&patched, "A"), "Legal A");
    assert_eq!(legal_name(&patched, "B"), "X");
    assert_eq!(legal_name(&patched, "C"), "");

    assert!(!patched.lookup.was_called_for("B"));
    assert_eq!(patched.lookup.call_count(), 2);
    assert_eq!(patched.store.total_writes(), 1);

    let mut expected = TenantReport::new("T1", 3);
    expected.updated = 1;
    expected.already_repaired = 1;
    expected.no_data = 1;
    assert_eq!(patched.report, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn t1_unbounded_matches_sequential() {
    let sequential = patch_t1(1).await;
    let unbounded = patch_t1(0).await;

    assert_eq!(sequential.report, unbounded.report);
    assert_eq!(
        sequential.store.scan_all(&sequential.tenant).await.unwrap(),
        unbounded.store.scan_all(&unbounded.tenant).await.unwrap()
    );
}

/// A second run over the repaired table changes nothing and writes nothing.
#[tokio::test]
async fn rerun_is_idempotent() {
    let T1Scenario {
        tenant,
        store,
        lookup,
    } = t1_scenario();
    let store = Arc::new(store);
    let orchestrator = PatchOrchestrator::new(
        store.clone(),
        StrategyRegistry::with_defaults(Arc::new(lookup)),
        PatchConfig::new().with_concurrency(2),
    );

    orchestrator.run_tenant(LOCAL_LEGAL_NAME, &tenant).await.unwrap();
    let after_first = store.scan_all(&tenant).await.unwrap();

    let second = orchestrator.run_tenant(LOCAL_LEGAL_NAME, &tenant).await.unwrap();
    let after_second = store.scan_all(&tenant).await.unwrap();

    assert_eq!(after_first, after_second);
    assert_eq!(second.updated, 0);
    assert_eq!(second.already_repaired, 2);
    assert_eq!(store.total_writes(), 1);
}

/// Every record is patched exactly once whatever the page size.
#[tokio::test]
async fn every_page_is_patched() {
    let sg = tenant("FP_SG");
    let records: Vec<Record> = (0..23)
        .map(|i| vendor(&format!("v{i:02}"), &format!("Shop {i}")))
        .collect();

    for page_size in [1, 2, 5, 22, 23, 24, 100] {
        let lookup = Arc::new(records.iter().fold(ScriptedLookup::new(), |lookup, r| {
            lookup.with_value(&r.code, &format!("Legal {}", r.code))
        }));
        let store = Arc::new(
            InMemoryRecordStore::new()
                .with_page_size(page_size)
                .with_records(&sg, records.clone()),
        );

        let report = PatchOrchestrator::new(
            store.clone(),
            StrategyRegistry::with_defaults(lookup.clone()),
            PatchConfig::new().with_concurrency(3),
        )
        .run_tenant(LOCAL_LEGAL_NAME, &sg)
        .await
        .unwrap();

        assert_eq!(report.total, 23, "page size {page_size}");
        assert_eq!(report.updated, 23, "page size {page_size}");
        assert_eq!(lookup.call_count(), 23, "page size {page_size}");
        for record in &records {
            assert_eq!(store.writes_for(&record.code), 1, "page size {page_size}");
        }
    }
}

/// A write the store rejects fails only that record.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rejected_write_leaves_siblings_patched() {
    let sg = tenant("FP_SG");
    let lookup = Arc::new(
        ScriptedLookup::new()
            .with_value("X", "Legal X")
            .with_value("Y", "Legal Y")
            .with_value("Z", "Legal Z"),
    );
    let store = Arc::new(InMemoryRecordStore::new().with_records(
        &sg,
        [vendor("X", "Shop X"), vendor("Y", "Shop Y"), vendor("Z", "Shop Z")],
    ));
    store.fail_write(
        "X",
        StoreError::Write {
            key: "GEID#FP_SG,VENDOR#X".to_string(),
            message: "provisioned throughput exceeded".to_string(),
            retryable: true,
        },
    );

    let report = PatchOrchestrator::new(
        store.clone(),
        StrategyRegistry::with_defaults(lookup.clone()),
        PatchConfig::new().with_concurrency(3),
    )
    .run_tenant(LOCAL_LEGAL_NAME, &sg)
    .await
    .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.updated, 2);
    assert_eq!(report.failed.get(&FailureKind::Write), Some(&1));
    assert_eq!(report.failed_total(), 1);

    assert_eq!(store.record(&sg, "X").unwrap().local_legal_name, "");
    assert_eq!(store.record(&sg, "Y").unwrap().local_legal_name, "Legal Y");
    assert_eq!(store.record(&sg, "Z").unwrap().local_legal_name, "Legal Z");
    assert_eq!(store.writes_for("X"), 0);
    assert_eq!(lookup.call_count(), 3);
}

fn vendor_service_reply(code: &str) -> warp::reply::Response {
    match code {
        "A" => warp::reply::json(&serde_json::json!({ "account_name_localized": "Legal A" }))
            .into_response(),
        "C" => warp::reply::json(&serde_json::json!({ "account_name_localized": "" }))
            .into_response(),
        _ => warp::reply::with_status("internal error", StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
    }
}

async fn fake_vendor_service() -> SocketAddr {
    let route = warp::path!(String / "vendors" / String)
        .and(warp::header::exact("authorization", "Bearer tok"))
        .and_then(|_country: String, code: String| async move {
            Ok::<_, Infallible>(vendor_service_reply(&code))
        });

    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

/// Same scenario through the HTTP client, plus a vendor the service fails on.
#[tokio::test]
async fn http_lookup_end_to_end() {
    let addr = fake_vendor_service().await;
    let client = VendorServiceClient::new(
        &LookupConfig {
            endpoint_template: format!("http://{addr}/{{country}}/vendors/{{vendor}}"),
            timeout_secs: 5,
        },
        Credentials::new("tok", "ops@example.com"),
    )
    .unwrap();

    let T1Scenario { tenant, store, .. } = t1_scenario();
    store.insert(&tenant, vendor("D", "Vendor D"));
    let store = Arc::new(store);

    let report = PatchOrchestrator::new(
        store.clone(),
        StrategyRegistry::with_defaults(Arc::new(client)),
        PatchConfig::new().with_concurrency(4),
    )
    .run("local_legal_name", std::slice::from_ref(&tenant))
    .await
    .unwrap();

    let tenant_report = &report.tenants[0];
    assert_eq!(tenant_report.updated, 1);
    assert_eq!(tenant_report.no_data, 1);
    assert_eq!(tenant_report.already_repaired, 1);
    assert_eq!(tenant_report.failed.get(&FailureKind::LookupRejected), Some(&1));
    assert!(!report.has_tenant_failures());

    let names: Vec<(String, String)> = store
        .scan_all(&tenant)
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.code, r.local_legal_name))
        .collect();
    assert_eq!(
        names,
        vec![
            ("A".to_string(), "Legal A".to_string()),
            ("B".to_string(), "X".to_string()),
            ("C".to_string(), String::new()),
            ("D".to_string(), String::new()),
        ]
    );
}

/// The store refuses to overwrite a value written after the scan.
#[tokio::test]
async fn concurrent_writer_wins() {
    let sg = tenant("FP_SG");
    let lookup = Arc::new(ScriptedLookup::new().with_value("a", "From Service"));
    let store = Arc::new(InMemoryRecordStore::new().with_records(&sg, [vendor("a", "A")]));

    let stale = store.scan_all(&sg).await.unwrap();
    store.insert(&sg, vendor("a", "A").with_local_legal_name("From Worker"));

    let strategy = StrategyRegistry::with_defaults(lookup)
        .resolve(LOCAL_LEGAL_NAME)
        .unwrap();
    let ctx = PatchContext::new(sg.clone(), store.clone(), CancelToken::new());
    let outcome = strategy.apply(&ctx, &stale[0]).await;

    assert_eq!(outcome, PatchOutcome::AlreadyRepaired);
    assert_eq!(store.record(&sg, "a").unwrap().local_legal_name, "From Worker");
}
