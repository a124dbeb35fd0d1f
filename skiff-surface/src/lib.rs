//! Content surface abstraction for the skiff browser core.
//!
//! This crate provides:
//! - The [`ContentSurface`] trait: the seam between tab state and a real web
//!   engine, driven fire-and-forget with results pulled via `drain_events`
//! - [`SurfaceFactory`] for lazy surface creation (dormant tab materialization)
//! - Navigation, security, and history snapshot types shared with the tab layer
//! - [`HeadlessSurface`]: a deterministic in-memory engine for tests and tooling
//! - [`UserAgentPolicy`] for per-host desktop/mobile selection

pub mod events;
pub mod headless;
pub mod history;
pub mod surface;
pub mod user_agent;

// Re-export main types for convenience
pub use events::{NavigationState, SecurityState, SurfaceEvent};
pub use headless::{HeadlessFactory, HeadlessSurface};
pub use history::SessionHistory;
pub use surface::{ContentSurface, SurfaceFactory};
pub use user_agent::{MemoryUserAgentPolicy, UserAgentPolicy};
