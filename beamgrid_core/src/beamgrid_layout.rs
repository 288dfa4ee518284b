//! The "CITY" Engine - Procedural Topology Generation
//!
//! Produces the static per-session layout:
//! - A square building grid with a regular sub-grid of access-point hosts
//! - Mobile users scattered over an area wider than the city footprint
//! - Reflecting surface panels snapped to buildings and flush-mounted on a
//!   randomly chosen cardinal wall
//!
//! Generation is deterministic in *shape* (grid size, counts) and randomized
//! in *content* (dimensions, siting offsets, wall choice). The random source
//! is injected, so a fixed seed reproduces the exact same city.

use nalgebra::{Point3, Vector2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the layout generator.
///
/// The defaults reproduce the reference topology: a 12x12 building grid with
/// 16 access-point hosts on a 4x4 sub-grid and 25 surface-panel candidates on
/// the block-ring intersections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Buildings per side of the square city grid (default: 12)
    pub grid_dim: usize,

    /// Edge length of one grid block in scene units (default: 10.0)
    pub block_size: f64,

    /// The building at grid cell (i, j) hosts an access point iff
    /// `i % host_stride == 1 && j % host_stride == 1` (default: 3)
    pub host_stride: usize,

    /// Building footprint range, width and depth (default: 4.0 .. 6.0)
    pub footprint_min: f64,
    pub footprint_max: f64,

    /// Building height range (default: 6.0 .. 20.0)
    pub height_min: f64,
    pub height_max: f64,

    /// Number of rendering style themes to pick from (default: 3)
    pub style_count: u8,

    /// Full span of the random planar siting offset drawn for each
    /// access-point host (default: 20.0, i.e. each axis in [-10, 10))
    pub ap_offset_spread: f64,

    /// Number of mobile users to scatter (default: 15)
    pub num_users: usize,

    /// User scatter area as a multiple of the full city size (default: 1.8)
    pub user_spread: f64,

    /// Fixed user elevation (default: 0.2)
    pub user_elevation: f64,

    /// Absolute mount height of every surface panel (default: 5.0)
    pub panel_mount_height: f64,

    /// Gap between a panel and its host wall (default: 0.05)
    pub panel_clearance: f64,

    /// Panel width as a fraction of the host wall width (default: 0.9)
    pub panel_width_ratio: f64,

    /// Hard cap on panel width so it never dwarfs the wall (default: 3.5)
    pub panel_max_width: f64,

    /// Panel height (default: 3.0)
    pub panel_height: f64,

    /// Panel thickness (default: 0.2)
    pub panel_thickness: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid_dim: 12,
            block_size: 10.0,
            host_stride: 3,
            footprint_min: 4.0,
            footprint_max: 6.0,
            height_min: 6.0,
            height_max: 20.0,
            style_count: 3,
            ap_offset_spread: 20.0,
            num_users: 15,
            user_spread: 1.8,
            user_elevation: 0.2,
            panel_mount_height: 5.0,
            panel_clearance: 0.05,
            panel_width_ratio: 0.9,
            panel_max_width: 3.5,
            panel_height: 3.0,
            panel_thickness: 0.2,
        }
    }
}

impl LayoutConfig {
    /// Half of the city's edge length. The grid spans [-half, +half).
    pub fn city_half_size(&self) -> f64 {
        self.grid_dim as f64 * self.block_size / 2.0
    }

    /// Panel candidates per side: one at every host-block ring intersection.
    pub fn panel_grid_dim(&self) -> usize {
        if self.grid_dim == 0 {
            0
        } else {
            self.grid_dim / self.host_stride + 1
        }
    }

    /// Spacing between adjacent panel candidate coordinates.
    pub fn panel_spacing(&self) -> f64 {
        self.host_stride as f64 * self.block_size
    }
}

// ============================================================================
// DATA MODEL
// ============================================================================

/// A building on the city grid. Immutable after generation; the *current*
/// position of an access-point host is derived elsewhere from `base_position`
/// plus `ap_offset` scaled by the global offset factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    /// Canonical grid-slot position on the ground plane (y = 0)
    pub base_position: Point3<f64>,

    /// Whether this building hosts an access point (grid-parity rule)
    pub is_ap_host: bool,

    /// Random planar siting offset; only meaningful for hosts
    pub ap_offset: Vector2<f64>,

    pub width: f64,
    pub depth: f64,
    pub height: f64,

    /// Rendering theme only, never consulted by any assignment logic
    pub style_id: u8,
}

/// A mobile user. Placed once per session; `id` is its generation-order index
/// and is stable for selection filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: usize,
    pub position: Point3<f64>,
}

/// The wall a surface panel is mounted on, with its cardinal yaw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallFace {
    /// +z
    Front,
    /// -z
    Back,
    /// +x
    Right,
    /// -x
    Left,
}

impl WallFace {
    /// Yaw of the outward wall normal: {0, pi, pi/2, -pi/2} for
    /// {front, back, right, left}.
    pub fn yaw(self) -> f64 {
        match self {
            WallFace::Front => 0.0,
            WallFace::Back => PI,
            WallFace::Right => FRAC_PI_2,
            WallFace::Left => -FRAC_PI_2,
        }
    }

    fn sample(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..4) {
            0 => WallFace::Front,
            1 => WallFace::Back,
            2 => WallFace::Right,
            _ => WallFace::Left,
        }
    }
}

/// A reconfigurable reflecting surface panel, flush-mounted on one wall of
/// its host building.
///
/// Panels are frozen at generation time: when an access-point host later
/// shifts under the offset factor, mounts on that building do not follow.
/// That is a deliberate simplification of the demo, not an oversight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfacePanel {
    /// Generation-order index
    pub id: usize,

    /// Index of the host building in the layout's building list
    pub host_building: usize,

    pub wall: WallFace,

    /// Absolute mount position (panel center)
    pub position: Point3<f64>,

    pub width: f64,
    pub height: f64,
    pub thickness: f64,
}

impl SurfacePanel {
    /// Cardinal yaw of the panel, matching its mount wall.
    pub fn yaw(&self) -> f64 {
        self.wall.yaw()
    }
}

// ============================================================================
// CITY LAYOUT
// ============================================================================

/// The static per-session city: buildings, users and surface panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityLayout {
    pub config: LayoutConfig,
    pub buildings: Vec<Building>,
    pub users: Vec<User>,
    pub panels: Vec<SurfacePanel>,
}

impl CityLayout {
    /// Generate a city from the given configuration and random source.
    ///
    /// Degenerate configurations (zero users, zero grid cells) produce empty
    /// collections; generation itself never fails.
    pub fn generate(config: LayoutConfig, rng: &mut impl Rng) -> Self {
        let buildings = generate_buildings(&config, rng);
        let users = generate_users(&config, rng);
        let panels = generate_panels(&config, &buildings, rng);

        Self {
            config,
            buildings,
            users,
            panels,
        }
    }

    /// Number of access-point hosts in the layout.
    pub fn host_count(&self) -> usize {
        self.buildings.iter().filter(|b| b.is_ap_host).count()
    }
}

/// Lay buildings on the grid, one centered in each block.
fn generate_buildings(config: &LayoutConfig, rng: &mut impl Rng) -> Vec<Building> {
    let half = config.city_half_size();
    let half_offset = config.ap_offset_spread * 0.5;
    let mut buildings = Vec::with_capacity(config.grid_dim * config.grid_dim);

    for i in 0..config.grid_dim {
        for j in 0..config.grid_dim {
            let x = -half + i as f64 * config.block_size + config.block_size / 2.0;
            let z = -half + j as f64 * config.block_size + config.block_size / 2.0;

            // Host classification is decided here, once, and never revisited.
            let is_ap_host = i % config.host_stride == 1 && j % config.host_stride == 1;

            let ap_offset = if is_ap_host {
                Vector2::new(
                    rng.gen_range(-half_offset..half_offset),
                    rng.gen_range(-half_offset..half_offset),
                )
            } else {
                Vector2::zeros()
            };

            buildings.push(Building {
                base_position: Point3::new(x, 0.0, z),
                is_ap_host,
                ap_offset,
                width: rng.gen_range(config.footprint_min..config.footprint_max),
                depth: rng.gen_range(config.footprint_min..config.footprint_max),
                height: rng.gen_range(config.height_min..config.height_max),
                style_id: rng.gen_range(0..config.style_count.max(1)),
            });
        }
    }

    buildings
}

/// Scatter users uniformly over an area wider than the city footprint,
/// simulating roaming beyond the tight building lines.
fn generate_users(config: &LayoutConfig, rng: &mut impl Rng) -> Vec<User> {
    let half_extent = config.city_half_size() * config.user_spread;

    (0..config.num_users)
        .map(|id| User {
            id,
            position: Point3::new(
                rng.gen_range(-half_extent..half_extent),
                config.user_elevation,
                rng.gen_range(-half_extent..half_extent),
            ),
        })
        .collect()
}

/// Place surface panels: walk the fixed grid of candidate intersection
/// coordinates, snap each to its nearest building, and mount a panel on a
/// uniformly random cardinal wall of that building.
fn generate_panels(
    config: &LayoutConfig,
    buildings: &[Building],
    rng: &mut impl Rng,
) -> Vec<SurfacePanel> {
    if buildings.is_empty() {
        return Vec::new();
    }

    let half = config.city_half_size();
    let spacing = config.panel_spacing();
    let dim = config.panel_grid_dim();
    let mut panels = Vec::with_capacity(dim * dim);

    for i in 0..dim {
        for j in 0..dim {
            let x = -half + i as f64 * spacing;
            let z = -half + j as f64 * spacing;

            // Strict less-than scan: on exact distance ties the lowest
            // building index wins.
            let host = nearest_building(buildings, x, z);
            let wall = WallFace::sample(rng);
            panels.push(mount_panel(config, panels.len(), host, &buildings[host], wall));
        }
    }

    panels
}

/// Nearest building to a planar coordinate by (x, z) Euclidean distance.
fn nearest_building(buildings: &[Building], x: f64, z: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;

    for (idx, b) in buildings.iter().enumerate() {
        let d = (b.base_position.x - x).hypot(b.base_position.z - z);
        if d < best_dist {
            best = idx;
            best_dist = d;
        }
    }

    best
}

/// Compute the flush mount position and extent of a panel on one wall.
fn mount_panel(
    config: &LayoutConfig,
    id: usize,
    host_building: usize,
    building: &Building,
    wall: WallFace,
) -> SurfacePanel {
    let b = building.base_position;
    let y = config.panel_mount_height;
    let clearance = config.panel_clearance;

    // Offset from the footprint center by half the footprint plus clearance;
    // the usable wall width is the footprint edge the panel lies along.
    let (position, wall_width) = match wall {
        WallFace::Front => (
            Point3::new(b.x, y, b.z + building.depth / 2.0 + clearance),
            building.width,
        ),
        WallFace::Back => (
            Point3::new(b.x, y, b.z - building.depth / 2.0 - clearance),
            building.width,
        ),
        WallFace::Right => (
            Point3::new(b.x + building.width / 2.0 + clearance, y, b.z),
            building.depth,
        ),
        WallFace::Left => (
            Point3::new(b.x - building.width / 2.0 - clearance, y, b.z),
            building.depth,
        ),
    };

    SurfacePanel {
        id,
        host_building,
        wall,
        position,
        width: (wall_width * config.panel_width_ratio).min(config.panel_max_width),
        height: config.panel_height,
        thickness: config.panel_thickness,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn reference_layout(seed: u64) -> CityLayout {
        let mut rng = StdRng::seed_from_u64(seed);
        CityLayout::generate(LayoutConfig::default(), &mut rng)
    }

    #[test]
    fn test_reference_counts() {
        let layout = reference_layout(7);

        assert_eq!(layout.buildings.len(), 144);
        assert_eq!(layout.host_count(), 16);
        assert_eq!(layout.users.len(), 15);
        assert_eq!(layout.panels.len(), 25);
    }

    #[test]
    fn test_host_parity_pattern() {
        let layout = reference_layout(7);

        for i in 0..12 {
            for j in 0..12 {
                let b = &layout.buildings[i * 12 + j];
                let expected = i % 3 == 1 && j % 3 == 1;
                assert_eq!(b.is_ap_host, expected, "cell ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_buildings_centered_in_blocks() {
        let layout = reference_layout(3);

        // First building sits in the corner block, centered at (-55, -55).
        let first = &layout.buildings[0];
        assert_eq!(first.base_position.x, -55.0);
        assert_eq!(first.base_position.z, -55.0);
        assert_eq!(first.base_position.y, 0.0);

        // Last building: (11, 11) -> (55, 55).
        let last = layout.buildings.last().unwrap();
        assert_eq!(last.base_position.x, 55.0);
        assert_eq!(last.base_position.z, 55.0);
    }

    #[test]
    fn test_dimension_ranges() {
        let layout = reference_layout(11);
        let cfg = &layout.config;

        for b in &layout.buildings {
            assert!(b.width >= cfg.footprint_min && b.width < cfg.footprint_max);
            assert!(b.depth >= cfg.footprint_min && b.depth < cfg.footprint_max);
            assert!(b.height >= cfg.height_min && b.height < cfg.height_max);
            assert!(b.style_id < cfg.style_count);

            if b.is_ap_host {
                let half = cfg.ap_offset_spread / 2.0;
                assert!(b.ap_offset.x.abs() <= half);
                assert!(b.ap_offset.y.abs() <= half);
            } else {
                assert_eq!(b.ap_offset, Vector2::zeros());
            }
        }
    }

    #[test]
    fn test_panel_yaw_matches_wall() {
        use std::f64::consts::{FRAC_PI_2, PI};

        let layout = reference_layout(5);

        for panel in &layout.panels {
            let expected = match panel.wall {
                WallFace::Front => 0.0,
                WallFace::Back => PI,
                WallFace::Right => FRAC_PI_2,
                WallFace::Left => -FRAC_PI_2,
            };
            assert_eq!(panel.yaw(), expected);
        }
    }

    #[test]
    fn test_panels_flush_against_host_wall() {
        let layout = reference_layout(13);
        let cfg = &layout.config;

        for panel in &layout.panels {
            let host = &layout.buildings[panel.host_building];
            let b = host.base_position;

            assert_eq!(panel.position.y, cfg.panel_mount_height);

            match panel.wall {
                WallFace::Front => {
                    assert_eq!(panel.position.x, b.x);
                    assert_eq!(panel.position.z, b.z + host.depth / 2.0 + cfg.panel_clearance);
                }
                WallFace::Back => {
                    assert_eq!(panel.position.x, b.x);
                    assert_eq!(panel.position.z, b.z - host.depth / 2.0 - cfg.panel_clearance);
                }
                WallFace::Right => {
                    assert_eq!(panel.position.z, b.z);
                    assert_eq!(panel.position.x, b.x + host.width / 2.0 + cfg.panel_clearance);
                }
                WallFace::Left => {
                    assert_eq!(panel.position.z, b.z);
                    assert_eq!(panel.position.x, b.x - host.width / 2.0 - cfg.panel_clearance);
                }
            }
        }
    }

    #[test]
    fn test_panel_extent_capped() {
        let layout = reference_layout(17);
        let cfg = &layout.config;

        for panel in &layout.panels {
            let host = &layout.buildings[panel.host_building];
            let wall_width = match panel.wall {
                WallFace::Front | WallFace::Back => host.width,
                WallFace::Right | WallFace::Left => host.depth,
            };

            assert!(panel.width <= cfg.panel_max_width);
            assert!(panel.width <= wall_width * cfg.panel_width_ratio);
            assert_eq!(panel.height, cfg.panel_height);
            assert_eq!(panel.thickness, cfg.panel_thickness);
        }
    }

    #[test]
    fn test_panel_snaps_to_nearest_building() {
        let layout = reference_layout(19);
        let cfg = &layout.config;
        let half = cfg.city_half_size();
        let spacing = cfg.panel_spacing();
        let dim = cfg.panel_grid_dim();

        for (idx, panel) in layout.panels.iter().enumerate() {
            let x = -half + (idx / dim) as f64 * spacing;
            let z = -half + (idx % dim) as f64 * spacing;

            let host = &layout.buildings[panel.host_building];
            let host_dist = (host.base_position.x - x).hypot(host.base_position.z - z);

            for b in &layout.buildings {
                let d = (b.base_position.x - x).hypot(b.base_position.z - z);
                assert!(d >= host_dist, "panel {} not snapped to nearest building", idx);
            }
        }
    }

    #[test]
    fn test_same_seed_reproduces_layout() {
        let a = reference_layout(42);
        let b = reference_layout(42);
        assert_eq!(a, b);

        let c = reference_layout(43);
        assert_ne!(a, c);
    }

    #[test]
    fn test_zero_users_is_empty_not_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = LayoutConfig {
            num_users: 0,
            ..Default::default()
        };

        let layout = CityLayout::generate(config, &mut rng);
        assert!(layout.users.is_empty());
        assert_eq!(layout.buildings.len(), 144);
    }

    #[test]
    fn test_empty_grid_is_empty_not_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = LayoutConfig {
            grid_dim: 0,
            ..Default::default()
        };

        let layout = CityLayout::generate(config, &mut rng);
        assert!(layout.buildings.is_empty());
        assert!(layout.panels.is_empty());
        assert_eq!(layout.users.len(), 15);
    }

    #[test]
    fn test_user_scatter_bounds_and_elevation() {
        let layout = reference_layout(23);
        let half_extent = layout.config.city_half_size() * layout.config.user_spread;

        for user in &layout.users {
            assert!(user.position.x.abs() <= half_extent);
            assert!(user.position.z.abs() <= half_extent);
            assert_eq!(user.position.y, layout.config.user_elevation);
        }
    }
}
