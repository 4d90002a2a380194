//! Example Canopy application.
//!
//! Loads a scene from a JSON description, then walks through every resolver
//! entry point while background tasks keep mutating the scene, the way a
//! client sees a world that is still streaming in.
//!
//! ```text
//! ┌──────────────┐  build   ┌────────────┐  mutate   ┌─────────────────┐
//! │  scene.json  │────────▶│ SceneNode  │◀──────────│ background tasks │
//! └──────────────┘         └─────┬──────┘           └─────────────────┘
//!                                │ signals
//!                                ▼
//!                         ┌────────────┐   Resolution   ┌──────────┐
//!                         │  Resolver  │──────────────▶│ Findings │
//!                         └────────────┘                └──────────┘
//! ```

pub mod demo;
mod scene;

pub use demo::{Finding, run};
pub use scene::{SceneError, SceneSpec};
