//! Canopy demo CLI.
//!
//! Builds a scene and resolves nodes in it while it changes.
//!
//! # Usage
//!
//! ```bash
//! canopy-demo [scene.json]
//! ```
//!
//! Without an argument the bundled scene is used.
//!
//! # Environment
//!
//! - `RUST_LOG` - log filter (default `info`)
//! - `CANOPY_TIMEOUT_MS` - per-lookup timeout in milliseconds (default 2000)

use canopy_core::{BuildInfo, TracingConfig, TracingFormat};
use canopy_resolve::Resolver;
use core::time::Duration;
use example::SceneSpec;

const BUNDLED_SCENE: &str = include_str!("../scene.json");
const DEFAULT_TIMEOUT_MS: u64 = 2_000;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    TracingConfig::new()
        .with_format(TracingFormat::Compact)
        .init();

    let info = BuildInfo::default();
    tracing::info!(version = info.version, debug = info.debug, "canopy demo starting");

    let description = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error: cannot read {path}: {e}");
                std::process::exit(1);
            }
        },
        None => BUNDLED_SCENE.to_owned(),
    };

    let workspace = match SceneSpec::from_json(&description).and_then(|spec| spec.build()) {
        Ok(workspace) => workspace,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let timeout = std::env::var("CANOPY_TIMEOUT_MS")
        .ok()
        .and_then(|ms| ms.parse().ok())
        .map_or(Duration::from_millis(DEFAULT_TIMEOUT_MS), Duration::from_millis);

    let resolver = Resolver::default();
    match example::run(&resolver, &workspace, timeout).await {
        Ok(findings) => {
            tracing::info!(count = findings.len(), "demo finished");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
