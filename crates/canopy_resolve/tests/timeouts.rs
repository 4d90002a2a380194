//! Timeout behavior, measured on tokio's paused clock.


use core::time::Duration;

use canopy_resolve::{ResolveError, ResolveOptions, Status, bulk};
use canopy_tree::SceneNode;
use futures::FutureExt;
use test_utils::{assert_pending, is_scene, manual_resolver, workspace};
use tokio::time::Instant;

fn within(timeout: Duration) -> ResolveOptions {
    ResolveOptions::new().with_timeout(timeout)
}

#[tokio::test(start_paused = true)]
async fn missing_path_times_out() {
    let (resolver, _ticker) = manual_resolver();
    let root = workspace();
    let start = Instant::now();

    let err = resolver
        .resolve_path(&root, "A.B", &within(Duration::from_millis(100)))
        .await
        .unwrap_err();

    let waited = start.elapsed();
    assert!(waited >= Duration::from_millis(100));
    assert!(waited < Duration::from_millis(150));
    match err {
        ResolveError::Timeout {
            target, timeout, ..
        } => {
            assert_eq!(target, "A.B");
            assert_eq!(timeout, Duration::from_millis(100));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(root.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn timeout_after_partial_progress_releases_deep_step() {
    let (resolver, _ticker) = manual_resolver();
    let root = workspace();
    let resolution = resolver.resolve_path(&root, "A.B", &within(Duration::from_millis(100)));
    let a = SceneNode::new_child(&root, "Folder", "A");
    assert!(a.listener_count() > 0);

    assert!(resolution.await.unwrap_err().is_timeout());
    assert_eq!(a.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn settles_before_deadline() {
    let (resolver, _ticker) = manual_resolver();
    let root = workspace();
    let resolution = resolver.resolve_path(&root, "A", &within(Duration::from_millis(100)));

    let adder = {
        let root = root.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            SceneNode::new_child(&root, "Part", "A")
        })
    };

    let node = resolution.await.unwrap();
    let a = adder.await.unwrap();
    assert!(is_scene(&node, &a));
}

#[tokio::test(start_paused = true)]
async fn no_timeout_waits_indefinitely() {
    let (resolver, _ticker) = manual_resolver();
    let root = workspace();
    let mut resolution = resolver.resolve_path(&root, "A", &ResolveOptions::default());

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert!((&mut resolution).now_or_never().is_none());
    assert_eq!(resolution.status(), Status::Pending);
}

#[tokio::test(start_paused = true)]
async fn resolver_default_timeout_applies() {
    let (resolver, _ticker) = manual_resolver();
    let resolver = resolver.with_default_timeout(Duration::from_millis(50));
    let root = workspace();

    let start = Instant::now();
    let err = resolver
        .find_descendant(&root, "Ghost", None, &ResolveOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(start.elapsed() >= Duration::from_millis(50));

    // A per-call timeout overrides the default.
    let start = Instant::now();
    let err = resolver
        .wait_for_child(&root, "Ghost", &within(Duration::from_millis(200)))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn anchor_wait_gets_a_fresh_window() {
    let (resolver, _ticker) = manual_resolver();
    let root = workspace();
    let mut resolution = resolver.resolve_anchor(&root, "Car", &within(Duration::from_millis(100)));

    tokio::time::sleep(Duration::from_millis(80)).await;
    let model = SceneNode::new_child(&root, "Model", "Car");
    assert!((&mut resolution).now_or_never().is_none());

    // Past the original deadline, inside the anchor's own window.
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!((&mut resolution).now_or_never().is_none());
    assert_pending(&resolution);

    let start = Instant::now();
    let err = resolution.await.unwrap_err();
    assert!(err.is_timeout());
    assert!(start.elapsed() <= Duration::from_millis(30));
    assert_eq!(model.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_beats_timer() {
    let (resolver, _ticker) = manual_resolver();
    let root = workspace();
    let resolution = resolver.resolve_path(&root, "A", &within(Duration::from_millis(100)));
    resolution.cancel();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(matches!(resolution.await, Err(ResolveError::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn deadline_passes_while_nobody_polls() {
    let (resolver, _ticker) = manual_resolver();
    let root = workspace();
    let resolution = resolver.resolve_path(&root, "A", &within(Duration::from_millis(100)));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(resolution.status(), Status::Rejected);
    assert_eq!(root.listener_count(), 0);

    // Too late: the lookup already gave up.
    let _a = SceneNode::new_child(&root, "Part", "A");
    assert!(resolution.await.unwrap_err().is_timeout());
}

#[tokio::test(start_paused = true)]
async fn bulk_input_times_out_while_earlier_one_waits() {
    let (resolver, _ticker) = manual_resolver();
    let root = workspace();
    let slow = resolver.resolve_path(&root, "Slow", &ResolveOptions::default());
    let fast = resolver.resolve_path(&root, "Fast", &within(Duration::from_millis(100)));

    let adder = {
        let root = root.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1000)).await;
            let _ = SceneNode::new_child(&root, "Part", "Slow");
            let _ = SceneNode::new_child(&root, "Part", "Fast");
        })
    };

    let err = bulk([slow, fast]).await.unwrap_err();
    adder.await.unwrap();
    match err {
        ResolveError::Aggregate { index, source } => {
            assert_eq!(index, 1);
            assert!(source.is_timeout());
        }
        other => panic!("expected aggregate error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn resolve_paths_times_out_on_the_original_deadline() {
    let (resolver, _ticker) = manual_resolver();
    let root = workspace();

    let adder = {
        let root = root.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(90)).await;
            let _ = SceneNode::new_child(&root, "Part", "A");
        })
    };

    let start = Instant::now();
    let err = resolver
        .resolve_paths(&root, ["A", "B"], &within(Duration::from_millis(100)))
        .await
        .unwrap_err();
    adder.await.unwrap();

    assert!(start.elapsed() < Duration::from_millis(150));
    assert!(matches!(
        err,
        ResolveError::Aggregate { index: 1, ref source } if source.is_timeout()
    ));
    assert_eq!(root.listener_count(), 0);
}
