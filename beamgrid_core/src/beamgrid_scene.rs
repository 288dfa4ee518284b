//! The "SCENE" Engine - Dynamic Position Resolution
//!
//! Derives the *current* scene from the static layout: access-point hosts are
//! nudged away from their canonical grid slot toward their random siting
//! target as the offset factor grows, and an access point is materialized
//! above each host's roof.
//!
//! Resolution is a pure function over the layout. It is cheap enough to rerun
//! on every slider tick and never mutates the generator's output.

use crate::beamgrid_layout::CityLayout;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Vertical offset of the antenna above its host building's roof.
pub const ANTENNA_MAST_HEIGHT: f64 = 1.0;

/// A building with its session-current position applied. Self-contained so a
/// renderer needs nothing but the view to draw solid geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBuilding {
    pub position: Point3<f64>,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub is_ap_host: bool,
    pub style_id: u8,
}

/// An access point, derived from its host building. `id` is the index among
/// hosts in generation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPoint {
    pub id: usize,
    pub position: Point3<f64>,
}

/// Summary counts for the on-screen statistics display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneStats {
    pub users: usize,
    pub access_points: usize,
    pub panels: usize,
}

/// The resolved scene for one value of the offset factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneView {
    pub buildings: Vec<ResolvedBuilding>,
    pub access_points: Vec<AccessPoint>,
}

impl SceneView {
    /// Resolve current positions for the given offset factor.
    ///
    /// Hosts move linearly: `current = base + offset_factor * ap_offset`.
    /// Non-hosts pass through unchanged. The reference UI drives the factor
    /// over [0, 0.7].
    pub fn resolve(layout: &CityLayout, offset_factor: f64) -> Self {
        let mut buildings = Vec::with_capacity(layout.buildings.len());
        let mut access_points = Vec::new();

        for b in &layout.buildings {
            let position = if b.is_ap_host {
                Point3::new(
                    b.base_position.x + offset_factor * b.ap_offset.x,
                    b.base_position.y,
                    b.base_position.z + offset_factor * b.ap_offset.y,
                )
            } else {
                b.base_position
            };

            if b.is_ap_host {
                access_points.push(AccessPoint {
                    id: access_points.len(),
                    position: Point3::new(position.x, b.height + ANTENNA_MAST_HEIGHT, position.z),
                });
            }

            buildings.push(ResolvedBuilding {
                position,
                width: b.width,
                depth: b.depth,
                height: b.height,
                is_ap_host: b.is_ap_host,
                style_id: b.style_id,
            });
        }

        Self {
            buildings,
            access_points,
        }
    }

    /// Summary counts for this view of the given layout.
    pub fn stats(&self, layout: &CityLayout) -> SceneStats {
        SceneStats {
            users: layout.users.len(),
            access_points: self.access_points.len(),
            panels: layout.panels.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beamgrid_layout::LayoutConfig;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layout() -> CityLayout {
        let mut rng = StdRng::seed_from_u64(99);
        CityLayout::generate(LayoutConfig::default(), &mut rng)
    }

    #[test]
    fn test_zero_factor_is_identity() {
        let layout = layout();
        let view = SceneView::resolve(&layout, 0.0);

        for (resolved, base) in view.buildings.iter().zip(&layout.buildings) {
            assert_eq!(resolved.position, base.base_position);
        }
    }

    #[test]
    fn test_host_positions_linear_in_factor() {
        let layout = layout();

        for factor in [0.1, 0.35, 0.7] {
            let view = SceneView::resolve(&layout, factor);

            for (resolved, base) in view.buildings.iter().zip(&layout.buildings) {
                if base.is_ap_host {
                    assert_abs_diff_eq!(
                        resolved.position.x,
                        base.base_position.x + factor * base.ap_offset.x,
                        epsilon = 1e-12
                    );
                    assert_abs_diff_eq!(
                        resolved.position.z,
                        base.base_position.z + factor * base.ap_offset.y,
                        epsilon = 1e-12
                    );
                } else {
                    assert_eq!(resolved.position, base.base_position);
                }
            }
        }
    }

    #[test]
    fn test_access_points_track_shifted_hosts() {
        let layout = layout();
        let view = SceneView::resolve(&layout, 0.5);

        assert_eq!(view.access_points.len(), layout.host_count());

        let hosts: Vec<_> = view
            .buildings
            .iter()
            .filter(|b| b.is_ap_host)
            .collect();

        for (ap, host) in view.access_points.iter().zip(hosts) {
            assert_eq!(ap.position.x, host.position.x);
            assert_eq!(ap.position.z, host.position.z);
            assert_eq!(ap.position.y, host.height + ANTENNA_MAST_HEIGHT);
        }
    }

    #[test]
    fn test_access_point_ids_are_generation_order() {
        let layout = layout();
        let view = SceneView::resolve(&layout, 0.0);

        for (idx, ap) in view.access_points.iter().enumerate() {
            assert_eq!(ap.id, idx);
        }
    }

    #[test]
    fn test_resolve_does_not_mutate_layout() {
        let layout = layout();
        let before = layout.clone();

        let _ = SceneView::resolve(&layout, 0.7);
        let _ = SceneView::resolve(&layout, 0.2);

        assert_eq!(layout, before);
    }

    #[test]
    fn test_stats_counts() {
        let layout = layout();
        let view = SceneView::resolve(&layout, 0.0);
        let stats = view.stats(&layout);

        assert_eq!(stats.users, 15);
        assert_eq!(stats.access_points, 16);
        assert_eq!(stats.panels, 25);
    }
}
