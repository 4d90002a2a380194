//! A scripted session against a live scene.
//!
//! Each step starts a lookup, then mutates the scene from a background task
//! the way a game would while loading, so that every lookup has to wait for
//! at least part of its target.

use core::time::Duration;

use canopy_resolve::{ResolveError, ResolveOptions, Resolver};
use canopy_tree::{Node, SceneNode, Table};
use serde_json::json;

/// One successful lookup.
#[derive(Debug, Clone)]
pub struct Finding {
    /// The operation that produced it.
    pub operation: &'static str,
    /// What was looked up.
    pub target: String,
    /// Label of the node found.
    pub found: String,
}

impl Finding {
    fn new(operation: &'static str, target: impl Into<String>, node: &Node) -> Self {
        let finding = Self {
            operation,
            target: target.into(),
            found: node.label(),
        };
        tracing::info!(
            operation = finding.operation,
            target = %finding.target,
            found = %finding.found,
            "resolved"
        );
        finding
    }
}

/// Runs `mutate` on `scene` after `delay`, on a background task.
fn later(delay: Duration, scene: &SceneNode, mutate: impl FnOnce(&SceneNode) + Send + 'static) {
    let scene = scene.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        mutate(&scene);
    });
}

/// Drives every resolver entry point against `workspace`.
///
/// `workspace` should be the bundled scene (see `scene.json`); the session
/// adds the nodes it waits for. Lookups use `timeout` as their deadline.
///
/// # Errors
///
/// Returns the first lookup error other than the deliberate timeout at the
/// end of the session.
pub async fn run(
    resolver: &Resolver,
    workspace: &SceneNode,
    timeout: Duration,
) -> Result<Vec<Finding>, ResolveError> {
    let options = ResolveOptions::new().with_timeout(timeout);
    let step = timeout / 4;
    let mut findings = Vec::new();

    // Already present: settles without waiting.
    let spawn = resolver.resolve_path(workspace, "Map.Spawn", &options).await?;
    findings.push(Finding::new("resolve_path", "Map.Spawn", &spawn));

    // Two missing segments, added one after the other.
    later(step, workspace, |ws| {
        let lobby = SceneNode::new_child(ws, "Folder", "Lobby");
        let _ = SceneNode::new_child(&lobby, "Part", "Door");
    });
    let door = resolver.resolve_path(workspace, "Lobby.Door", &options).await?;
    findings.push(Finding::new("resolve_path", "Lobby.Door", &door));

    // A kart whose anchor is assigned after it is parented.
    later(step, workspace, |ws| {
        if let Some(vehicles) = ws.find_first_child("Vehicles") {
            let buggy = SceneNode::new_child(&vehicles, "Model", "Buggy");
            let frame = SceneNode::new_child(&buggy, "Part", "Frame");
            buggy.set_reference("PrimaryPart", Some(&frame));
        }
    });
    let frame = resolver
        .resolve_anchor(workspace, "Vehicles.Buggy", &options)
        .await?;
    findings.push(Finding::new("resolve_anchor", "Vehicles.Buggy", &frame));

    // A checkpoint deep in the course, found by name and class.
    later(step, workspace, |ws| {
        if let Some(course) = ws.find_first_child("Map").and_then(|m| m.find_first_child("Course")) {
            let stage = SceneNode::new_child(&course, "Folder", "Stage2");
            let _ = SceneNode::new_child(&stage, "Part", "Finish");
        }
    });
    let finish = resolver
        .find_descendant(workspace, "Finish", Some("Part"), &options)
        .await?;
    findings.push(Finding::new("find_descendant", "Finish", &finish));

    // A child whose name contains the separator.
    later(step, workspace, |ws| {
        let _ = SceneNode::new_child(ws, "Folder", "Scores.v2");
    });
    let scores = resolver.wait_for_child(workspace, "Scores.v2", &options).await?;
    findings.push(Finding::new("wait_for_child", "Scores.v2", &scores));

    // Several paths at once.
    let nodes = resolver
        .resolve_paths(workspace, ["Map.Spawn", "Vehicles.Kart.Seat"], &options)
        .await?;
    for (path, node) in ["Map.Spawn", "Vehicles.Kart.Seat"].into_iter().zip(&nodes) {
        findings.push(Finding::new("resolve_paths", path, node));
    }

    // A plain table pointing back into the scene.
    let settings = Table::from_json(&json!({ "round": { "laps": 3 } })).unwrap_or_default();
    settings.insert("scene", workspace);
    let laps = resolver
        .resolve_path(settings.clone(), "round.laps", &options)
        .await?;
    findings.push(Finding::new("resolve_path", "round.laps", &laps));
    let kart = resolver
        .resolve_path(settings, "scene.Vehicles.Kart", &options)
        .await?;
    findings.push(Finding::new("resolve_path", "scene.Vehicles.Kart", &kart));

    // Nobody ever adds this one.
    match resolver
        .resolve_path(workspace, "Map.Treasure", &options)
        .await
    {
        Err(err @ ResolveError::Timeout { .. }) => {
            tracing::warn!(error = %err, "lookup gave up as expected");
        }
        Err(err) => return Err(err),
        Ok(node) => findings.push(Finding::new("resolve_path", "Map.Treasure", &node)),
    }

    Ok(findings)
}
