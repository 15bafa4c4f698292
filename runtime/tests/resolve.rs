use segue_core::{
    AlwaysContinue, Bus, Params, ResolverConfig, SegmentInfo, TimelineEvent, Traced,
    TransitionError, continue_fn,
};
use segue_runtime::{Resolver, TransitionState};
use segue_test::{CallLog, ScriptedContinuation, ScriptedHandler, unresolved_chain};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Continuation checks made while resolving one unresolved segment: four
/// inside the record (around `before_model`, `model`, `after_model`) and one
/// after its redirect hook.
const CHECKS_PER_SEGMENT: usize = 5;

/// 1-based number of the check that gates entry into segment `k`.
fn check_before(k: usize) -> usize {
    if k == 0 { 1 } else { CHECKS_PER_SEGMENT * k }
}

#[tokio::test]
async fn resolves_every_segment_and_fires_redirects_in_order() {
    let log = CallLog::new();
    let state = TransitionState::new(unresolved_chain(&log, &["a", "b", "c"]));
    let check = ScriptedContinuation::passing();
    let mut bus = Bus::new();

    let state = state.resolve(&check, &mut bus).await.unwrap();

    assert_eq!(state.cursor(), 3);
    assert!(state.is_fully_resolved());
    assert_eq!(log.calls_of("redirect"), vec!["a", "b", "c"]);
    assert_eq!(check.calls(), 3 * CHECKS_PER_SEGMENT);
    assert_eq!(bus.resolve_index(), 3);
    assert_eq!(bus.resolved_model("b"), Some(&json!({ "name": "b" })));
}

#[tokio::test]
async fn redirect_of_a_segment_runs_before_the_next_segment_starts() {
    let log = CallLog::new();
    let state = TransitionState::new(unresolved_chain(&log, &["a", "b"]));

    state.resolve(&AlwaysContinue, &mut Bus::new()).await.unwrap();

    assert_eq!(
        log.entries(),
        vec![
            "a:before_model",
            "a:model",
            "a:after_model",
            "a:redirect",
            "b:before_model",
            "b:model",
            "b:after_model",
            "b:redirect",
        ]
    );
}

#[tokio::test]
async fn resolution_failure_is_attributed_to_the_failing_segment() {
    let log = CallLog::new();
    let segments = vec![
        SegmentInfo::by_params("a", ScriptedHandler::new("a", &log).shared(), Params::new()),
        SegmentInfo::by_params(
            "b",
            ScriptedHandler::new("b", &log).failing_model("boom").shared(),
            Params::new(),
        ),
        SegmentInfo::by_params("c", ScriptedHandler::new("c", &log).shared(), Params::new()),
    ];
    let b_handler = Arc::clone(segments[1].handler());

    let failure = TransitionState::new(segments)
        .resolve(&AlwaysContinue, &mut Bus::new())
        .await
        .unwrap_err();

    assert_eq!(failure.error.to_string(), "boom");
    assert!(matches!(failure.error, TransitionError::Resolution(_)));
    assert!(Arc::ptr_eq(&failure.handler_with_error, &b_handler));
    assert!(!failure.was_aborted);

    // resolved prefix is kept, nothing after the failure ran
    assert_eq!(failure.state.cursor(), 1);
    assert!(failure.state.segments[0].is_resolved());
    assert!(!failure.state.segments[1].is_resolved());
    assert_eq!(log.calls_of("redirect"), vec!["a"]);
    assert!(log.calls_of("before_model").iter().all(|name| name != "c"));
}

#[tokio::test]
async fn abort_before_a_segment_is_attributed_to_that_segment() {
    for k in 0..3 {
        let log = CallLog::new();
        let state = TransitionState::new(unresolved_chain(&log, &["a", "b", "c"]));
        let check = ScriptedContinuation::reject_on(check_before(k), "superseded");

        let failure = state.resolve(&check, &mut Bus::new()).await.unwrap_err();

        let expected = ["a", "b", "c"][k];
        assert_eq!(failure.handler_with_error.name(), expected, "k = {k}");
        assert!(failure.was_aborted);
        assert!(failure.error.is_abort());
        assert_eq!(failure.error.to_string(), "superseded");
        assert_eq!(failure.state.cursor(), k);
        assert_eq!(log.calls_of("redirect").len(), k);
        assert!(log.calls_of("model").iter().all(|name| name != expected));
    }
}

#[tokio::test]
async fn abort_after_the_last_segment_is_attributed_to_the_last_segment() {
    let log = CallLog::new();
    let state = TransitionState::new(unresolved_chain(&log, &["a", "b", "c"]));
    let check = ScriptedContinuation::reject_on(3 * CHECKS_PER_SEGMENT, "superseded");

    let failure = state.resolve(&check, &mut Bus::new()).await.unwrap_err();

    assert_eq!(failure.handler_with_error.name(), "c");
    assert!(failure.was_aborted);
    assert_eq!(failure.state.cursor(), 3);
    assert!(failure.state.is_fully_resolved());
    assert_eq!(log.calls_of("redirect"), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn abort_inside_a_segment_is_tagged_as_abort() {
    let log = CallLog::new();
    let state = TransitionState::new(unresolved_chain(&log, &["a", "b"]));
    // third check of "b": between its model and after_model hooks
    let check = ScriptedContinuation::reject_on(CHECKS_PER_SEGMENT + 3, "superseded");

    let failure = state.resolve(&check, &mut Bus::new()).await.unwrap_err();

    assert_eq!(failure.handler_with_error.name(), "b");
    assert!(failure.was_aborted);
    assert!(log.calls_of("model").contains(&"b".to_string()));
    assert!(!log.calls_of("after_model").contains(&"b".to_string()));
}

#[tokio::test]
async fn already_resolved_segments_never_fire_redirect() {
    let log = CallLog::new();
    let segments = vec![
        SegmentInfo::resolved(
            "a",
            ScriptedHandler::new("a", &log).shared(),
            Params::new(),
            json!({ "cached": true }),
        ),
        SegmentInfo::by_params("b", ScriptedHandler::new("b", &log).shared(), Params::new()),
    ];
    let mut bus = Bus::new();

    let state = TransitionState::new(segments)
        .resolve(&AlwaysContinue, &mut bus)
        .await
        .unwrap();

    assert!(state.is_fully_resolved());
    assert_eq!(log.calls_of("redirect"), vec!["b"]);
    assert!(log.calls_of("model").iter().all(|name| name != "a"));
    assert_eq!(bus.resolved_model("a"), Some(&json!({ "cached": true })));
}

#[tokio::test]
async fn resolving_a_resolved_state_again_fires_no_hooks() {
    let log = CallLog::new();
    let state = TransitionState::new(unresolved_chain(&log, &["a", "b", "c"]))
        .resolve(&AlwaysContinue, &mut Bus::new())
        .await
        .unwrap();
    log.clear();

    let check = ScriptedContinuation::passing();
    let again = state.resolve(&check, &mut Bus::new()).await.unwrap();

    assert_eq!(again.cursor(), 3);
    assert!(again.is_fully_resolved());
    assert!(log.entries().is_empty());
    // only the check after each step; resolved records do not consult it
    assert_eq!(check.calls(), 3);

    let timeline = again.timeline().unwrap();
    assert!(timeline.redirects().is_empty());
    assert!(timeline.events.iter().all(|e| match e {
        TimelineEvent::SegmentResolved { was_already_resolved, .. } => *was_already_resolved,
        _ => true,
    }));
}

#[tokio::test]
async fn redirect_that_supersedes_the_transition_aborts_before_the_next_segment() {
    let log = CallLog::new();
    let superseded = Arc::new(AtomicBool::new(false));
    let flag = superseded.clone();
    let segments = vec![
        SegmentInfo::by_params("a", ScriptedHandler::new("a", &log).shared(), Params::new()),
        SegmentInfo::by_params(
            "b",
            ScriptedHandler::new("b", &log)
                .on_redirect(move |_bus| flag.store(true, Ordering::SeqCst))
                .shared(),
            Params::new(),
        ),
        SegmentInfo::by_params("c", ScriptedHandler::new("c", &log).shared(), Params::new()),
    ];
    let check = continue_fn(|| {
        let superseded = superseded.clone();
        async move {
            anyhow::ensure!(!superseded.load(Ordering::SeqCst), "transition superseded");
            Ok(())
        }
    });

    let failure = TransitionState::new(segments)
        .resolve(&check, &mut Bus::new())
        .await
        .unwrap_err();

    assert!(failure.was_aborted);
    assert_eq!(failure.handler_with_error.name(), "c");
    assert_eq!(failure.error.to_string(), "transition superseded");
    assert!(log.entries().iter().all(|entry| !entry.starts_with("c:")));
}

#[tokio::test]
async fn redirect_failure_flows_into_the_failure_path() {
    let log = CallLog::new();
    let segments = vec![
        SegmentInfo::by_params(
            "a",
            ScriptedHandler::new("a", &log).failing_redirect("no access").shared(),
            Params::new(),
        ),
        SegmentInfo::by_params("b", ScriptedHandler::new("b", &log).shared(), Params::new()),
    ];

    let failure = TransitionState::new(segments)
        .resolve(&AlwaysContinue, &mut Bus::new())
        .await
        .unwrap_err();

    assert!(matches!(failure.error, TransitionError::Hook(_)));
    assert_eq!(failure.error.to_string(), "no access");
    assert!(!failure.was_aborted);
    // the cursor already moved past "a" when its redirect ran
    assert_eq!(failure.state.cursor(), 1);
    assert_eq!(failure.handler_with_error.name(), "b");
    assert!(failure.state.segments[0].is_resolved());
}

#[tokio::test]
async fn params_are_computed_before_resolution_and_query_params_reach_the_bus() {
    let log = CallLog::new();
    let segments = vec![
        SegmentInfo::by_params(
            "posts",
            ScriptedHandler::new("posts", &log).shared(),
            Params::from([("page".to_string(), "2".to_string())]),
        ),
        SegmentInfo::by_object(
            "post",
            ScriptedHandler::new("post", &log).shared(),
            json!({ "id": 11 }),
            vec!["post_id".to_string()],
        ),
    ];
    let query = Params::from([("sort".to_string(), "asc".to_string())]);
    let mut bus = Bus::new();

    let state = TransitionState::new(segments)
        .with_query_params(query.clone())
        .resolve(&AlwaysContinue, &mut bus)
        .await
        .unwrap();

    assert_eq!(state.params["posts"]["page"], "2");
    assert_eq!(state.params["post"]["post_id"], "11");
    assert_eq!(bus.query_params(), Some(&query));
    // the object-backed segment skipped its model hook
    assert_eq!(log.calls_of("model"), vec!["posts"]);
    assert_eq!(bus.resolved_model("post"), Some(&json!({ "id": 11 })));
}

#[tokio::test]
async fn empty_chain_resolves_without_consulting_the_continuation() {
    let check = ScriptedContinuation::reject_on(1, "never");

    let state = TransitionState::new(vec![])
        .resolve(&check, &mut Bus::new())
        .await
        .unwrap();

    assert_eq!(state.cursor(), 0);
    assert_eq!(check.calls(), 0);
}

#[tokio::test]
async fn timeline_follows_config() {
    let log = CallLog::new();
    let recorded = TransitionState::new(unresolved_chain(&log, &["a", "b"]))
        .resolve(&AlwaysContinue, &mut Bus::new())
        .await
        .unwrap();
    assert_eq!(recorded.timeline().unwrap().redirects(), vec!["a", "b"]);

    let quiet = Resolver::new(ResolverConfig {
        record_timeline: false,
        ..Default::default()
    });
    let state = quiet
        .resolve(
            TransitionState::new(unresolved_chain(&log, &["a"])),
            &AlwaysContinue,
            &mut Bus::new(),
        )
        .await
        .unwrap();
    assert!(state.timeline().is_none());
}

#[tokio::test]
async fn failure_is_recorded_on_the_timeline() {
    let log = CallLog::new();
    let check = ScriptedContinuation::reject_on(check_before(1), "superseded");

    let failure = TransitionState::new(unresolved_chain(&log, &["a", "b"]))
        .resolve(&check, &mut Bus::new())
        .await
        .unwrap_err();

    let last = failure.state.timeline().unwrap().events.last().cloned();
    assert!(matches!(last, Some(TimelineEvent::Aborted { index: 1, .. })));
    assert!(failure.to_string().contains("'b'"));
}

#[tokio::test]
async fn traced_handlers_resolve_like_their_inner_handler() {
    let log = CallLog::new();
    let segments = vec![SegmentInfo::by_params(
        "a",
        Arc::new(Traced::new(ScriptedHandler::new("a", &log))),
        Params::new(),
    )];

    let state = TransitionState::new(segments)
        .resolve(&AlwaysContinue, &mut Bus::new())
        .await
        .unwrap();

    assert!(state.is_fully_resolved());
    assert_eq!(log.calls_of("redirect"), vec!["a"]);
}

#[tokio::test]
async fn suspended_continuation_that_rejects_aborts_the_segment_it_gates() {
    let log = CallLog::new();
    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = calls.clone();
    // "b" is checked on calls 6 and 7: before and after its before_model hook
    let check = continue_fn(move || {
        let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            tokio::task::yield_now().await;
            anyhow::ensure!(call != CHECKS_PER_SEGMENT + 2, "superseded while pending");
            Ok(())
        }
    });

    let failure = TransitionState::new(unresolved_chain(&log, &["a", "b", "c"]))
        .resolve(&check, &mut Bus::new())
        .await
        .unwrap_err();

    assert!(failure.was_aborted);
    assert_eq!(failure.handler_with_error.name(), "b");
    assert_eq!(failure.error.to_string(), "superseded while pending");
    assert_eq!(failure.state.cursor(), 1);
    assert!(log.calls_of("before_model").contains(&"b".to_string()));
    assert!(!log.calls_of("model").contains(&"b".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), CHECKS_PER_SEGMENT + 2);
}

#[tokio::test]
async fn resolution_and_hook_failures_are_recorded_on_the_timeline() {
    let log = CallLog::new();
    let segments = vec![
        SegmentInfo::by_params("a", ScriptedHandler::new("a", &log).shared(), Params::new()),
        SegmentInfo::by_params(
            "b",
            ScriptedHandler::new("b", &log).failing_model("boom").shared(),
            Params::new(),
        ),
    ];
    let failure = TransitionState::new(segments)
        .resolve(&AlwaysContinue, &mut Bus::new())
        .await
        .unwrap_err();

    let last = failure.state.timeline().unwrap().events.last().cloned();
    assert!(matches!(
        last,
        Some(TimelineEvent::Failed { index: 1, ref kind, .. }) if kind == "resolution"
    ));

    let segments = vec![SegmentInfo::by_params(
        "only",
        ScriptedHandler::new("only", &log).failing_redirect("no access").shared(),
        Params::new(),
    )];
    let failure = TransitionState::new(segments)
        .resolve(&AlwaysContinue, &mut Bus::new())
        .await
        .unwrap_err();

    assert_eq!(failure.handler_with_error.name(), "only");
    let last = failure.state.timeline().unwrap().events.last().cloned();
    assert!(matches!(
        last,
        Some(TimelineEvent::Failed { index: 0, ref kind, .. }) if kind == "hook"
    ));
}
