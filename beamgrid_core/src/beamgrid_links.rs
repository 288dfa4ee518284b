//! The "LINK" Engine - Connection Assignment
//!
//! Computes which users connect to which access points and reflecting
//! panels, as a flat list of drawable link segments:
//!
//! 1. **Panel assignment**: each panel serves at most one user (nearest
//!    within the connectivity radius) and pairs with its own nearest access
//!    point, always evaluated over the full population regardless of any
//!    display filter.
//! 2. **Direct ranking**: each user gets its four nearest access points,
//!    strongest-first, with a fixed per-rank opacity falloff.
//! 3. **Two-hop construction**: whenever a panel's served user and paired
//!    access point line up with a surviving (user, ranked AP) pair, a
//!    user-to-panel plus panel-to-AP segment pair is emitted *alongside* the
//!    direct segment. The reflected path augments the direct path; it never
//!    replaces it.
//!
//! All nearest/ranking decisions use planar (x, z) distance. Ties break to
//! the lowest index. The engine is pure, synchronous and total: empty inputs
//! or a non-positive radius yield empty results, never errors.

use crate::beamgrid_layout::{SurfacePanel, User};
use crate::beamgrid_scene::AccessPoint;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ============================================================================
// PARAMETERS & OUTPUT MODEL
// ============================================================================

/// How many ranked direct candidates each user gets.
pub const MAX_DIRECT_RANKS: usize = 4;

/// Opacity per direct-link rank, strongest first. A visual falloff choice,
/// not a propagation model.
pub const DIRECT_RANK_OPACITY: [f32; 4] = [0.6, 0.4, 0.25, 0.15];

/// Opacity of both halves of a two-hop reflected link.
pub const REFLECTED_OPACITY: f32 = 0.5;

/// Beam anchor lift above a user's ground position.
pub const USER_ANCHOR_LIFT: f64 = 0.35;

/// Beam anchor lift above an access point's mast position.
pub const AP_ANCHOR_LIFT: f64 = 1.2;

/// Inputs to one assignment evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkParams {
    /// Connectivity radius for panel-to-user assignment (reference UI range
    /// 2-40; non-positive values legitimately serve nothing)
    pub radius: f64,

    /// Restrict direct/reflected output to a single user id
    pub user_filter: Option<usize>,

    /// Restrict direct/reflected output to a single AP rank (0..=3)
    pub rank_filter: Option<usize>,
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            radius: 15.0,
            user_filter: None,
            rank_filter: None,
        }
    }
}

/// Visual class of a segment; renderers map this to the beam palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkClass {
    Direct,
    Reflected,
}

/// One drawable beam segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSegment {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
    pub class: LinkClass,
    pub opacity: f32,
}

/// Assignment of one panel: its served user and, when any access point
/// exists, the AP the panel relays toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelAssignment {
    pub user: usize,
    pub access_point: Option<usize>,
}

/// Result of one assignment evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkReport {
    pub segments: Vec<LinkSegment>,

    /// Distinct users served by at least one panel, counted over the full
    /// population (independent of display filters).
    pub served_users: usize,
}

// ============================================================================
// DISTANCE & ANCHORS
// ============================================================================

/// Planar (x, z) Euclidean distance; elevation never influences assignment.
pub fn planar_distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a.x - b.x).hypot(a.z - b.z)
}

fn lift(p: &Point3<f64>, dy: f64) -> Point3<f64> {
    Point3::new(p.x, p.y + dy, p.z)
}

// ============================================================================
// STEP A: PANEL ASSIGNMENT
// ============================================================================

/// Assign each panel its served user (nearest within radius, lowest index on
/// ties) and paired access point (nearest to the panel itself, independent of
/// the served user). Index-aligned with `panels`; `None` where no user is in
/// range.
pub fn assign_panels(
    users: &[User],
    access_points: &[AccessPoint],
    panels: &[SurfacePanel],
    radius: f64,
) -> Vec<Option<PanelAssignment>> {
    panels
        .iter()
        .map(|panel| {
            let served = nearest_within(users.iter().map(|u| &u.position), &panel.position, radius)?;

            // The panel always relays toward its own nearest AP, which is not
            // necessarily the AP nearest its served user.
            let access_point =
                nearest_within(access_points.iter().map(|ap| &ap.position), &panel.position, f64::INFINITY);

            Some(PanelAssignment {
                user: users[served].id,
                access_point: access_point.map(|idx| access_points[idx].id),
            })
        })
        .collect()
}

/// Index of the nearest position within `radius` (inclusive), first-wins on
/// exact ties.
fn nearest_within<'a>(
    positions: impl Iterator<Item = &'a Point3<f64>>,
    target: &Point3<f64>,
    radius: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (idx, pos) in positions.enumerate() {
        let d = planar_distance(pos, target);
        if d > radius {
            continue;
        }
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((idx, d)),
        }
    }

    best.map(|(idx, _)| idx)
}

/// Distinct users served by at least one panel. A user nearest to several
/// panels is counted once.
pub fn count_served_users(assignments: &[Option<PanelAssignment>]) -> usize {
    let mut served: Vec<usize> = assignments
        .iter()
        .flatten()
        .map(|a| a.user)
        .collect();
    served.sort_unstable();
    served.dedup();
    served.len()
}

// ============================================================================
// STEP B: DIRECT RANKING
// ============================================================================

/// The user's access points as (index into `access_points`, distance) pairs,
/// sorted by planar distance ascending and truncated to the top four. The
/// sort is stable, so equidistant APs keep slice order. Indexing by position
/// rather than by `AccessPoint::id` keeps the ranking valid for filtered or
/// reordered slices.
pub fn rank_access_points(user: &User, access_points: &[AccessPoint]) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = access_points
        .iter()
        .enumerate()
        .map(|(idx, ap)| (idx, planar_distance(&user.position, &ap.position)))
        .collect();

    ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    ranked.truncate(MAX_DIRECT_RANKS);
    ranked
}

// ============================================================================
// STEP C: LINK CONSTRUCTION
// ============================================================================

/// Compute the full set of drawable link segments plus the served-user count.
pub fn compute_links(
    users: &[User],
    access_points: &[AccessPoint],
    panels: &[SurfacePanel],
    params: &LinkParams,
) -> LinkReport {
    // The served-count statistic stays stable while the UI filters flicker,
    // so panel assignment runs over the full population.
    let assignments = assign_panels(users, access_points, panels, params.radius);
    let served_users = count_served_users(&assignments);

    let mut segments = Vec::new();

    for user in users {
        if let Some(filter) = params.user_filter {
            if user.id != filter {
                continue;
            }
        }

        let user_anchor = lift(&user.position, USER_ANCHOR_LIFT);

        for (rank, (ap_idx, _)) in rank_access_points(user, access_points).iter().enumerate() {
            if let Some(filter) = params.rank_filter {
                if rank != filter {
                    continue;
                }
            }

            let ap = &access_points[*ap_idx];
            let ap_anchor = lift(&ap.position, AP_ANCHOR_LIFT);

            segments.push(LinkSegment {
                start: user_anchor,
                end: ap_anchor,
                class: LinkClass::Direct,
                opacity: DIRECT_RANK_OPACITY[rank],
            });

            // A panel contributes a two-hop path only when its served user
            // and paired AP both match this surviving pair.
            for (panel_idx, assignment) in assignments.iter().enumerate() {
                let Some(assignment) = assignment else { continue };
                if assignment.user != user.id || assignment.access_point != Some(ap.id) {
                    continue;
                }

                let panel_anchor = panels[panel_idx].position;
                segments.push(LinkSegment {
                    start: user_anchor,
                    end: panel_anchor,
                    class: LinkClass::Reflected,
                    opacity: REFLECTED_OPACITY,
                });
                segments.push(LinkSegment {
                    start: panel_anchor,
                    end: ap_anchor,
                    class: LinkClass::Reflected,
                    opacity: REFLECTED_OPACITY,
                });
            }
        }
    }

    LinkReport {
        segments,
        served_users,
    }
}

// ============================================================================
// TESTS
// ============================================================================
