//! Fail-fast bulk waits and multi-path resolution.


use core::time::Duration;

use canopy_resolve::{ResolveError, ResolveOptions, Status, bulk};
use canopy_tree::SceneNode;
use futures::FutureExt;
use test_utils::{assert_pending, chain, is_scene, manual_resolver, workspace};

#[test]
fn resolve_paths_preserves_input_order() {
    let (resolver, _ticker) = manual_resolver();
    let root = workspace();
    let spawn = chain(&root, &["Map", "Spawn"]);
    let lights = chain(&root, &["Lighting"]);

    let nodes = resolver
        .resolve_paths(&root, ["Lighting", "Map.Spawn"], &ResolveOptions::default())
        .now_or_never()
        .unwrap()
        .unwrap();
    assert_eq!(nodes.len(), 2);
    assert!(is_scene(&nodes[0], &lights));
    assert!(is_scene(&nodes[1], &spawn));
}

#[tokio::test(start_paused = true)]
async fn resolve_paths_waits_for_all() {
    let (resolver, _ticker) = manual_resolver();
    let root = workspace();
    let paths = vec!["A".to_owned(), "B".to_owned()];
    let pending = tokio::spawn(resolver.resolve_paths(&root, paths, &ResolveOptions::default()));

    tokio::task::yield_now().await;
    let b = SceneNode::new_child(&root, "Part", "B");
    tokio::task::yield_now().await;
    assert!(!pending.is_finished());

    let a = SceneNode::new_child(&root, "Part", "A");
    let nodes = pending.await.unwrap().unwrap();
    assert!(is_scene(&nodes[0], &a));
    assert!(is_scene(&nodes[1], &b));
}

#[tokio::test(start_paused = true)]
async fn resolve_paths_reports_failing_index() {
    let (resolver, _ticker) = manual_resolver();
    let root = workspace();
    let _present = chain(&root, &["Present"]);

    let options = ResolveOptions::new().with_timeout(Duration::from_millis(100));
    let err = resolver
        .resolve_paths(&root, ["Present", "Missing", "AlsoMissing"], &options)
        .await
        .unwrap_err();

    match err {
        ResolveError::Aggregate { index, source } => {
            assert_eq!(index, 1);
            assert!(source.is_timeout());
        }
        other => panic!("expected aggregate error, got {other:?}"),
    }

    // The remaining lookup was dropped along with the combinator.
    assert_eq!(root.listener_count(), 0);
}

#[test]
fn borrowed_inputs_survive_failure() {
    let (resolver, _ticker) = manual_resolver();
    let root = workspace();
    let options = ResolveOptions::default();

    let mut first = resolver.resolve_path(&root, "First", &options);
    let mut second = resolver.resolve_path(&root, "Second", &options);
    let mut third = resolver.resolve_path(&root, "Third", &options);
    second.cancel();

    let _first_node = SceneNode::new_child(&root, "Part", "First");
    let err = bulk([&mut first, &mut second, &mut third])
        .now_or_never()
        .unwrap()
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Aggregate { index: 1, ref source } if source.is_cancelled()
    ));

    // The first input was consumed by the bulk wait; the third is untouched.
    assert_eq!(first.status(), Status::Resolved);
    assert_pending(&third);
    let third_node = SceneNode::new_child(&root, "Part", "Third");
    let found = (&mut third).now_or_never().unwrap().unwrap();
    assert!(is_scene(&found, &third_node));
}

#[test]
fn root_cause_unwraps_aggregate() {
    let (resolver, _ticker) = manual_resolver();
    let root = workspace();
    let options = ResolveOptions::default();

    let first = resolver.resolve_path(&root, "First", &options);
    first.cancel();
    let err = bulk([first]).now_or_never().unwrap().unwrap_err();
    assert_eq!(err.root_cause(), &ResolveError::Cancelled);
}
