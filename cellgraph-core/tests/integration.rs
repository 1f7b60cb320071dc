//! Integration Tests for the Cell Graph
//!
//! These tests verify that cells, inputs, invalidation and observers work
//! together correctly on a single-threaded runtime.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cellgraph_core::{
    CellError, CellGraph, CellOptions, CellStatus, ComputeError, ConfigError, GraphConfig,
};
use tokio::sync::{broadcast::error::TryRecvError, watch};

fn graph() -> CellGraph {
    CellGraph::new(GraphConfig::named("integration"))
}

/// Let spawned evaluations run until `counter` reaches `target`.
async fn wait_for(counter: &AtomicUsize, target: usize) {
    while counter.load(Ordering::SeqCst) < target {
        tokio::task::yield_now().await;
    }
}

/// Test that a cell without dependencies resolves to its compute output.
#[tokio::test]
async fn independent_cell_resolves_to_compute_output() {
    let graph = graph();
    let studies = graph
        .define(
            "all_studies",
            &[],
            |_| async { Ok(vec!["acc_tcga", "brca_tcga"]) },
            CellOptions::new(),
        )
        .unwrap();

    let snapshot = graph.settled(&studies).await.unwrap();
    assert_eq!(snapshot.status, CellStatus::Complete);
    assert_eq!(snapshot.value.as_deref(), Some(&vec!["acc_tcga", "brca_tcga"]));

    let untyped = graph.get("all_studies").unwrap();
    assert!(untyped.is_complete());
    assert_eq!(untyped.value_as::<Vec<&str>>().unwrap().len(), 2);
}

/// Test the doubling scenario: 5 -> 10, then source changes to 7 -> 14.
#[tokio::test]
async fn doubled_cell_follows_its_source() {
    let graph = graph();
    let source = Arc::new(AtomicI32::new(5));

    let source_clone = source.clone();
    let a = graph
        .define(
            "cellA",
            &[],
            move |_| {
                let value = source_clone.load(Ordering::SeqCst);
                async move { Ok(value) }
            },
            CellOptions::new(),
        )
        .unwrap();

    let a_handle = a.clone();
    let b = graph
        .define(
            "cellB",
            &["cellA"],
            move |inputs| {
                let a = inputs.get(&a_handle);
                async move { a.map(|a| *a * 2) }
            },
            CellOptions::new(),
        )
        .unwrap();

    // Nothing has run yet.
    let early = graph.read(&b).unwrap();
    assert!(early.is_pending());
    assert!(early.value.is_none());

    let done = graph.settled(&b).await.unwrap();
    assert_eq!(done.value.as_deref(), Some(&10));

    source.store(7, Ordering::SeqCst);
    graph.invalidate("cellA").unwrap();
    assert!(graph.read(&b).unwrap().is_pending());

    let again = graph.settled(&b).await.unwrap();
    assert_eq!(again.value.as_deref(), Some(&14));
    assert_eq!(graph.read(&a).unwrap().value.as_deref(), Some(&7));
}

/// Test that a cell over two dependencies completes only after both.
#[tokio::test]
async fn dependent_waits_for_every_dependency() {
    let graph = graph();
    let (open_a, gate_a) = watch::channel(false);
    let (open_b, gate_b) = watch::channel(false);

    graph
        .define(
            "a",
            &[],
            move |_| {
                let mut gate = gate_a.clone();
                async move {
                    let _ = gate.wait_for(|open| *open).await;
                    Ok::<_, ComputeError>(3)
                }
            },
            CellOptions::new(),
        )
        .unwrap();
    graph
        .define(
            "b",
            &[],
            move |_| {
                let mut gate = gate_b.clone();
                async move {
                    let _ = gate.wait_for(|open| *open).await;
                    Ok::<_, ComputeError>(4)
                }
            },
            CellOptions::new(),
        )
        .unwrap();
    let d = graph
        .define(
            "d",
            &["a", "b"],
            |inputs| {
                let a = inputs.by_name::<i32>("a");
                let b = inputs.by_name::<i32>("b");
                async move { a.and_then(|a| b.map(|b| (*a, *b))) }
            },
            CellOptions::new(),
        )
        .unwrap();

    assert!(graph.read(&d).unwrap().is_pending());

    open_a.send(true).unwrap();
    let a = graph.await_all(&["a"]).await.unwrap();
    assert!(a[0].is_complete());
    assert!(graph.read(&d).unwrap().is_pending());

    open_b.send(true).unwrap();
    let d = graph.settled(&d).await.unwrap();
    assert_eq!(d.value.as_deref(), Some(&(3, 4)));
}

/// Test that a shared dependency is evaluated once, not once per dependent.
#[tokio::test]
async fn shared_dependency_is_evaluated_once() {
    let graph = graph();
    let session_calls = Arc::new(AtomicUsize::new(0));

    let calls = session_calls.clone();
    graph
        .define(
            "session",
            &[],
            move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(vec!["group1".to_string(), "group2".to_string()]) }
            },
            CellOptions::new(),
        )
        .unwrap();
    graph
        .define(
            "group_count",
            &["session"],
            |inputs| {
                let groups = inputs.by_name::<Vec<String>>("session");
                async move { groups.map(|g| g.len()) }
            },
            CellOptions::new(),
        )
        .unwrap();
    graph
        .define(
            "first_group",
            &["session"],
            |inputs| {
                let groups = inputs.by_name::<Vec<String>>("session");
                async move { groups.map(|g| g.first().cloned()) }
            },
            CellOptions::new(),
        )
        .unwrap();
    graph
        .define(
            "title",
            &["group_count", "first_group"],
            |inputs| {
                let count = inputs.by_name::<usize>("group_count");
                let first = inputs.by_name::<Option<String>>("first_group");
                async move {
                    count.and_then(|count| {
                        first.map(|first| format!("{} groups, starting with {:?}", count, first))
                    })
                }
            },
            CellOptions::new(),
        )
        .unwrap();

    let title = graph.await_all(&["title"]).await.unwrap();
    assert_eq!(
        title[0].value_as::<String>().as_deref().map(String::as_str),
        Some("2 groups, starting with Some(\"group1\")")
    );
    assert_eq!(session_calls.load(Ordering::SeqCst), 1);
}

/// Test that invalidating with unchanged inputs yields the same value in a
/// new generation.
#[tokio::test]
async fn invalidation_with_unchanged_inputs_is_idempotent() {
    let graph = graph();
    let calls = Arc::new(AtomicUsize::new(0));

    let calls_clone = calls.clone();
    let cell = graph
        .define(
            "sample_count",
            &[],
            move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                async { Ok(412usize) }
            },
            CellOptions::new(),
        )
        .unwrap();

    let first = graph.settled(&cell).await.unwrap();
    graph.invalidate("sample_count").unwrap();
    let second = graph.settled(&cell).await.unwrap();

    assert_eq!(first.value, second.value);
    assert_eq!(first.generation, 1);
    assert_eq!(second.generation, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Test error propagation, with and without a default.
#[tokio::test]
async fn upstream_failure_propagates_unless_defaulted() {
    let graph = graph();

    graph
        .define(
            "session",
            &[],
            |_| async { Err::<Vec<String>, _>(ComputeError::new("503 Service Unavailable")) },
            CellOptions::new(),
        )
        .unwrap();
    let groups = graph
        .define(
            "groups",
            &["session"],
            |inputs| {
                let session = inputs.by_name::<Vec<String>>("session");
                async move { session.map(|s| s.len()) }
            },
            CellOptions::new(),
        )
        .unwrap();
    let studies = graph
        .define(
            "studies",
            &["session"],
            |inputs| {
                let session = inputs.by_name::<Vec<String>>("session");
                async move { session.map(|s| s.to_vec()) }
            },
            CellOptions::new().default_value(Vec::new()),
        )
        .unwrap();

    let groups = graph.settled(&groups).await.unwrap();
    assert_eq!(groups.status, CellStatus::Error);
    assert!(groups.value.is_none());
    let err = groups.error.unwrap();
    assert!(err.is_upstream());
    assert!(matches!(
        err.root_cause(),
        CellError::Compute { cell, source } if &**cell == "session" && source.message() == "503 Service Unavailable"
    ));

    let studies = graph.settled(&studies).await.unwrap();
    assert_eq!(studies.status, CellStatus::Error);
    assert_eq!(studies.value.as_deref(), Some(&Vec::<String>::new()));
    assert!(studies.error.is_some());
}

/// Test that a failed cell never exposes a previous generation's value.
#[tokio::test]
async fn failed_cell_hides_stale_value() {
    let graph = graph();
    let failing = Arc::new(AtomicBool::new(false));

    let failing_clone = failing.clone();
    let cell = graph
        .define(
            "mutations",
            &[],
            move |_| {
                let fail = failing_clone.load(Ordering::SeqCst);
                async move {
                    if fail {
                        Err(ComputeError::new("timeout"))
                    } else {
                        Ok(17u32)
                    }
                }
            },
            CellOptions::new(),
        )
        .unwrap();

    assert_eq!(graph.settled(&cell).await.unwrap().value.as_deref(), Some(&17));

    failing.store(true, Ordering::SeqCst);
    graph.invalidate("mutations").unwrap();
    let failed = graph.settled(&cell).await.unwrap();
    assert!(failed.is_error());
    assert!(failed.value.is_none());

    // Retrying is explicit.
    failing.store(false, Ordering::SeqCst);
    graph.invalidate("mutations").unwrap();
    assert_eq!(graph.settled(&cell).await.unwrap().value.as_deref(), Some(&17));
}

/// Test that only the latest generation's result is ever observed.
#[tokio::test]
async fn superseded_generations_are_dropped() {
    let graph = graph();
    let calls = Arc::new(AtomicUsize::new(0));
    let (open, gate) = watch::channel(false);

    let calls_clone = calls.clone();
    let cell = graph
        .define(
            "session",
            &[],
            move |_| {
                let call = calls_clone.fetch_add(1, Ordering::SeqCst) + 1;
                let mut gate = gate.clone();
                async move {
                    let _ = gate.wait_for(|open| *open).await;
                    Ok::<_, ComputeError>(call * 10)
                }
            },
            CellOptions::new(),
        )
        .unwrap();
    let mut events = graph.subscribe();

    graph.get("session").unwrap();
    wait_for(&calls, 1).await;
    graph.invalidate("session").unwrap();
    wait_for(&calls, 2).await;
    graph.invalidate("session").unwrap();
    wait_for(&calls, 3).await;

    open.send(true).unwrap();
    let snapshot = graph.settled(&cell).await.unwrap();
    assert_eq!(snapshot.value.as_deref(), Some(&30));
    assert_eq!(snapshot.generation, 3);

    // Give the superseded evaluations time to finish and be discarded.
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert_eq!(graph.read(&cell).unwrap().value.as_deref(), Some(&30));

    let mut completions = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) if event.status == CellStatus::Complete => completions.push(event.generation),
            Ok(_) => {}
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            Err(TryRecvError::Lagged(_)) => continue,
        }
    }
    assert_eq!(completions, vec![3]);
}

/// Test that a placeholder is read while pending.
#[tokio::test]
async fn placeholder_is_read_while_pending() {
    let graph = graph();
    let (open, gate) = watch::channel(false);

    let cell = graph
        .define(
            "displayed_studies",
            &[],
            move |_| {
                let mut gate = gate.clone();
                async move {
                    let _ = gate.wait_for(|open| *open).await;
                    Ok::<_, ComputeError>(vec!["brca_tcga".to_string()])
                }
            },
            CellOptions::new().placeholder(Vec::new()),
        )
        .unwrap();

    let pending = graph.read(&cell).unwrap();
    assert!(pending.is_pending());
    assert_eq!(pending.value.as_deref().map(Vec::len), Some(0));

    open.send(true).unwrap();
    let done = graph.settled(&cell).await.unwrap();
    assert_eq!(done.value.as_deref().map(Vec::len), Some(1));
}

/// Test that input cells cascade into their dependents.
#[tokio::test]
async fn input_changes_cascade() {
    let graph = graph();
    let session_id = graph.input("session_id", "abc".to_string()).unwrap();

    let id_cell = session_id.cell().clone();
    let url = graph
        .define(
            "session_url",
            &["session_id"],
            move |inputs| {
                let id = inputs.get(&id_cell);
                async move { id.map(|id| format!("/api/session/{}", id)) }
            },
            CellOptions::new(),
        )
        .unwrap();

    assert_eq!(
        graph.settled(&url).await.unwrap().value.as_deref().map(String::as_str),
        Some("/api/session/abc")
    );

    graph.set_input(&session_id, "def".to_string());
    assert_eq!(session_id.current().as_str(), "def");
    assert_eq!(
        graph.settled(&url).await.unwrap().value.as_deref().map(String::as_str),
        Some("/api/session/def")
    );

    graph.update_input(&session_id, |id| format!("{}-v2", id));
    assert_eq!(
        graph.settled(&url).await.unwrap().value.as_deref().map(String::as_str),
        Some("/api/session/def-v2")
    );
}

/// Test that lazy graphs recompute only on the next read.
#[tokio::test]
async fn lazy_refresh_waits_for_next_read() {
    let graph = CellGraph::new(GraphConfig {
        eager_refresh: false,
        ..GraphConfig::named("lazy")
    });
    let calls = Arc::new(AtomicUsize::new(0));

    let calls_clone = calls.clone();
    let cell = graph
        .define(
            "clinical_attributes",
            &[],
            move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                async { Ok(3u8) }
            },
            CellOptions::new(),
        )
        .unwrap();

    graph.settled(&cell).await.unwrap();
    graph.invalidate("clinical_attributes").unwrap();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert!(graph.read(&cell).unwrap().is_pending());
    graph.settled(&cell).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Test that cells nobody has read are not computed after invalidation.
#[tokio::test]
async fn unobserved_dependents_stay_lazy() {
    let graph = graph();
    let derived_calls = Arc::new(AtomicUsize::new(0));
    let source = graph.input("group_order", vec![2, 1]).unwrap();

    let calls = derived_calls.clone();
    graph
        .define(
            "sorted_groups",
            &["group_order"],
            move |inputs| {
                calls.fetch_add(1, Ordering::SeqCst);
                let order = inputs.by_name::<Vec<i32>>("group_order");
                async move {
                    order.map(|order| {
                        let mut sorted = order.to_vec();
                        sorted.sort();
                        sorted
                    })
                }
            },
            CellOptions::new(),
        )
        .unwrap();

    graph.settled(source.cell()).await.unwrap();
    graph.set_input(&source, vec![3, 1, 2]);
    graph.settled(source.cell()).await.unwrap();
    assert_eq!(derived_calls.load(Ordering::SeqCst), 0);

    let sorted = graph.await_all(&["sorted_groups"]).await.unwrap();
    assert_eq!(sorted[0].value_as::<Vec<i32>>().as_deref(), Some(&vec![1, 2, 3]));
    assert_eq!(derived_calls.load(Ordering::SeqCst), 1);
}

/// Test result and error hooks.
#[tokio::test]
async fn hooks_run_on_current_results() {
    let graph = graph();
    let results = Arc::new(Mutex::new(Vec::new()));
    let errors = Arc::new(Mutex::new(Vec::new()));
    let fail = Arc::new(AtomicBool::new(false));

    let results_clone = results.clone();
    let errors_clone = errors.clone();
    let fail_clone = fail.clone();
    let cell = graph
        .define(
            "session",
            &[],
            move |_| {
                let fail = fail_clone.load(Ordering::SeqCst);
                async move {
                    if fail {
                        Err(ComputeError::new("not found"))
                    } else {
                        Ok(5)
                    }
                }
            },
            CellOptions::new()
                .on_result(move |v: &i32| results_clone.lock().unwrap().push(*v))
                .on_error(move |e: &CellError| errors_clone.lock().unwrap().push(e.to_string())),
        )
        .unwrap();

    graph.settled(&cell).await.unwrap();
    fail.store(true, Ordering::SeqCst);
    graph.invalidate("session").unwrap();
    graph.settled(&cell).await.unwrap();

    assert_eq!(*results.lock().unwrap(), vec![5]);
    assert_eq!(
        *errors.lock().unwrap(),
        vec!["cell `session` failed to compute: not found".to_string()]
    );
}

/// Test that a panicking compute function puts the cell in error.
#[tokio::test]
async fn panicking_compute_is_an_error() {
    let graph = graph();
    let cell = graph
        .define(
            "oncokb",
            &[],
            |_| async {
                let missing: Option<u32> = None;
                Ok::<_, ComputeError>(missing.expect("annotation service returned nothing"))
            },
            CellOptions::new(),
        )
        .unwrap();

    let snapshot = graph.settled(&cell).await.unwrap();
    assert!(snapshot.is_error());
    let err = snapshot.error.unwrap();
    assert!(err.to_string().contains("panicked"));
}

/// Test the combined status of several cells.
#[tokio::test]
async fn group_status_combines_cells() {
    let graph = graph();
    let (open, gate) = watch::channel(false);

    graph.input("studies", vec!["brca_tcga"]).unwrap();
    graph
        .define(
            "samples",
            &[],
            move |_| {
                let mut gate = gate.clone();
                async move {
                    let _ = gate.wait_for(|open| *open).await;
                    Ok::<_, ComputeError>(120usize)
                }
            },
            CellOptions::new(),
        )
        .unwrap();
    graph
        .define(
            "virtual_studies",
            &[],
            |_| async { Err::<Vec<String>, _>(ComputeError::new("session service down")) },
            CellOptions::new(),
        )
        .unwrap();

    assert_eq!(
        graph.group_status(&["studies", "samples"]).unwrap(),
        CellStatus::Pending
    );

    open.send(true).unwrap();
    graph.await_all(&["studies", "samples", "virtual_studies"]).await.unwrap();

    assert_eq!(
        graph.group_status(&["studies", "samples"]).unwrap(),
        CellStatus::Complete
    );
    assert_eq!(
        graph
            .group_status(&["studies", "samples", "virtual_studies"])
            .unwrap(),
        CellStatus::Error
    );
}

/// Test that observers are told about status changes of watched cells.
#[tokio::test]
async fn observer_sees_watched_cells() {
    let graph = graph();
    let seen = Arc::new(Mutex::new(Vec::new()));

    graph.input("sample_filter", "all".to_string()).unwrap();
    graph.input("unrelated", 0u8).unwrap();

    let seen_clone = seen.clone();
    let observer = graph
        .observe(&["sample_filter"], move |event| {
            seen_clone
                .lock()
                .unwrap()
                .push((event.status, event.generation));
        })
        .unwrap();

    graph.await_all(&["sample_filter", "unrelated"]).await.unwrap();
    graph.invalidate("sample_filter").unwrap();
    graph.invalidate("unrelated").unwrap();
    graph.await_all(&["sample_filter", "unrelated"]).await.unwrap();

    while observer.run_count() < 3 {
        tokio::task::yield_now().await;
    }
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (CellStatus::Complete, 1),
            (CellStatus::Pending, 2),
            (CellStatus::Complete, 2),
        ]
    );

    observer.dispose();
    assert!(observer.is_disposed());
}

/// Test the status report of a settled graph.
#[tokio::test]
async fn report_reflects_settled_graph() {
    let graph = CellGraph::new(GraphConfig::named("study-view"));
    graph.input("study_ids", vec!["acc_tcga".to_string()]).unwrap();
    graph
        .define(
            "study_count",
            &["study_ids"],
            |inputs| {
                let ids = inputs.by_name::<Vec<String>>("study_ids");
                async move { ids.map(|ids| ids.len()) }
            },
            CellOptions::new(),
        )
        .unwrap();
    graph
        .define(
            "mutated_genes",
            &["study_ids"],
            |_| async { Err::<Vec<String>, _>(ComputeError::new("500")) },
            CellOptions::new(),
        )
        .unwrap();

    graph.await_all(&["study_count", "mutated_genes"]).await.unwrap();
    let report = graph.report();

    assert_eq!(report.graph, "study-view");
    assert_eq!(report.count(CellStatus::Complete), 2);
    assert_eq!(report.count(CellStatus::Error), 1);

    let genes = report.cell("mutated_genes").unwrap();
    assert!(!genes.has_value);
    assert_eq!(
        genes.error.as_deref(),
        Some("cell `mutated_genes` failed to compute: 500")
    );
    assert_eq!(report.cell("study_count").unwrap().value_type, "usize");

    let json = report.to_json().unwrap();
    assert!(json.contains("\"mutated_genes\""));
}

/// Test that unknown names are rejected before anything runs.
#[tokio::test]
async fn unknown_names_are_config_errors() {
    let graph = graph();
    graph.input("a", 1).unwrap();

    assert!(matches!(
        graph.await_all(&["a", "missing"]).await.unwrap_err(),
        ConfigError::UnknownCell(ref name) if name == "missing"
    ));
    assert!(matches!(
        graph.invalidate("missing").unwrap_err(),
        ConfigError::UnknownCell(_)
    ));
    assert!(matches!(
        graph.get("missing").unwrap_err(),
        ConfigError::UnknownCell(_)
    ));
    assert!(matches!(
        graph.observe(&["missing"], |_| {}).unwrap_err(),
        ConfigError::UnknownCell(_)
    ));
    assert!(!graph.contains("missing"));
}

fn with_refresh(eager_refresh: bool) -> CellGraph {
    CellGraph::new(GraphConfig {
        eager_refresh,
        ..GraphConfig::named("refresh")
    })
}

/// Invalidate a cell that `await_all` has already seen settle, while it is
/// still waiting on a later cell.
async fn invalidation_during_await_all(eager_refresh: bool) {
    let graph = with_refresh(eager_refresh);
    let study_calls = Arc::new(AtomicUsize::new(0));
    let (open, gate) = watch::channel(false);

    let calls = study_calls.clone();
    graph
        .define(
            "studies",
            &[],
            move |_| {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok(call) }
            },
            CellOptions::new(),
        )
        .unwrap();
    graph
        .define(
            "samples",
            &[],
            move |_| {
                let mut gate = gate.clone();
                async move {
                    let _ = gate.wait_for(|open| *open).await;
                    Ok::<_, ComputeError>(120usize)
                }
            },
            CellOptions::new(),
        )
        .unwrap();

    let waiter = tokio::spawn({
        let graph = graph.clone();
        async move { graph.await_all(&["studies", "samples"]).await }
    });

    while !graph.get("studies").unwrap().is_complete() {
        tokio::task::yield_now().await;
    }
    graph.invalidate("studies").unwrap();
    open.send(true).unwrap();

    let snapshots = tokio::time::timeout(Duration::from_secs(2), waiter)
        .await
        .expect("await_all resolves after a mid-wait invalidation")
        .unwrap()
        .unwrap();

    assert!(snapshots.iter().all(|s| s.is_complete()));
    assert_eq!(snapshots[0].generation, 2);
    assert_eq!(snapshots[0].value_as::<usize>().as_deref(), Some(&2));
    assert_eq!(study_calls.load(Ordering::SeqCst), 2);
}

/// Test that a mid-wait invalidation is recomputed with eager refresh.
#[tokio::test]
async fn await_all_survives_invalidation_eager() {
    invalidation_during_await_all(true).await;
}

/// Test that a mid-wait invalidation is recomputed with lazy refresh.
#[tokio::test]
async fn await_all_survives_invalidation_lazy() {
    invalidation_during_await_all(false).await;
}

/// Invalidate a dependency while its dependent's evaluation is waiting on it.
async fn invalidation_during_dependent_evaluation(eager_refresh: bool) {
    let graph = with_refresh(eager_refresh);
    let source = Arc::new(AtomicI32::new(5));
    let doubled_calls = Arc::new(AtomicUsize::new(0));
    let (open, gate) = watch::channel(false);

    let source_clone = source.clone();
    graph
        .define(
            "cellA",
            &[],
            move |_| {
                let value = source_clone.load(Ordering::SeqCst);
                let mut gate = gate.clone();
                async move {
                    let _ = gate.wait_for(|open| *open).await;
                    Ok::<_, ComputeError>(value)
                }
            },
            CellOptions::new(),
        )
        .unwrap();

    let calls = doubled_calls.clone();
    let b = graph
        .define(
            "cellB",
            &["cellA"],
            move |inputs| {
                calls.fetch_add(1, Ordering::SeqCst);
                let a = inputs.by_name::<i32>("cellA");
                async move { a.map(|a| *a * 2) }
            },
            CellOptions::new(),
        )
        .unwrap();

    // cellB is evaluating and blocked on cellA.
    assert!(graph.read(&b).unwrap().is_pending());
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    source.store(7, Ordering::SeqCst);
    graph.invalidate("cellA").unwrap();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    open.send(true).unwrap();

    let snapshot = tokio::time::timeout(Duration::from_secs(2), graph.settled(&b))
        .await
        .expect("dependent settles after its dependency is invalidated")
        .unwrap();

    assert_eq!(snapshot.value.as_deref(), Some(&14));
    assert_eq!(snapshot.generation, 2);
    // The superseded evaluation never reached compute.
    assert_eq!(doubled_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dependency_invalidated_mid_evaluation_eager() {
    invalidation_during_dependent_evaluation(true).await;
}

#[tokio::test]
async fn dependency_invalidated_mid_evaluation_lazy() {
    invalidation_during_dependent_evaluation(false).await;
}

/// Test that a panicking hook does not swallow the status change.
#[tokio::test]
async fn panicking_hook_still_publishes() {
    let graph = graph();
    let mut events = graph.subscribe();

    graph
        .define(
            "session",
            &[],
            |_| async { Ok(1u8) },
            CellOptions::new().on_result(|_: &u8| panic!("render failed")),
        )
        .unwrap();
    graph
        .define(
            "groups",
            &["session"],
            |inputs| {
                let session = inputs.by_name::<u8>("session");
                async move { session.map(|s| *s + 1) }
            },
            CellOptions::new(),
        )
        .unwrap();

    // Observe both so the dependent is restarted by the settle path.
    graph.await_all(&["session", "groups"]).await.unwrap();
    graph.invalidate("session").unwrap();
    let groups = tokio::time::timeout(
        Duration::from_secs(2),
        graph.await_all(&["groups"]),
    )
    .await
    .expect("dependent settles despite the hook panic")
    .unwrap();
    assert_eq!(groups[0].value_as::<u8>().as_deref(), Some(&2));

    let mut completed = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) if event.status == CellStatus::Complete => {
                completed.push((event.cell.to_string(), event.generation))
            }
            Ok(_) => {}
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    assert!(completed.contains(&("session".to_string(), 1)));
    assert!(completed.contains(&("session".to_string(), 2)));
    assert!(completed.contains(&("groups".to_string(), 2)));
}
