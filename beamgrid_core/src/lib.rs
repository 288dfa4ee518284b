//! Beamgrid Core - Procedural Wireless Topology Engine
//!
//! This library is the data side of a city-scale wireless network demo:
//! 1. **Layout Generator**: seeded procedural city (building grid, user
//!    scatter, wall-mounted reflecting surface panels)
//! 2. **Dynamic Position Resolver**: pure derivation of current building and
//!    access-point positions from a siting offset factor
//! 3. **Assignment Engine**: nearest-neighbor link assignment (panel-to-user,
//!    panel-to-AP, per-user top-4 AP ranking, two-hop link construction)
//!
//! Rendering is deliberately left to external consumers; the optional
//! `visualization` feature streams scene snapshots to a Rerun viewer.

pub mod beamgrid_layout;
pub mod beamgrid_links;
pub mod beamgrid_scene;

#[cfg(feature = "visualization")]
pub mod visualization;

// Re-export key types for convenience
pub use beamgrid_layout::{Building, CityLayout, LayoutConfig, SurfacePanel, User, WallFace};
pub use beamgrid_links::{
    compute_links, LinkClass, LinkParams, LinkReport, LinkSegment, MAX_DIRECT_RANKS,
};
pub use beamgrid_scene::{AccessPoint, ResolvedBuilding, SceneStats, SceneView};
