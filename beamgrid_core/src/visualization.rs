//! Visualization module for Beamgrid using Rerun.io
//!
//! Streams scene snapshots to a Rerun viewer:
//! - Buildings and surface panels as oriented boxes
//! - Users and access points as points
//! - Direct and reflected link segments as line strips
//!
//! This is a convenience for inspecting generated topologies; the production
//! renderer is an external consumer of the core's data. Enable with the
//! `visualization` feature flag.

use crate::beamgrid_layout::{CityLayout, SurfacePanel};
use crate::beamgrid_links::{LinkClass, LinkSegment};
use crate::beamgrid_scene::SceneView;
use nalgebra::{UnitQuaternion, Vector3};
use rerun::{RecordingStream, RecordingStreamBuilder};

// Reference demo palette
const COLOR_BUILDING: [u8; 4] = [24, 27, 42, 255];
const COLOR_HOST: [u8; 4] = [0, 120, 140, 255];
const COLOR_PANEL: [u8; 4] = [57, 255, 20, 220];
const COLOR_USER: [u8; 4] = [255, 0, 60, 255];
const COLOR_AP: [u8; 4] = [0, 240, 255, 255];
const COLOR_DIRECT: [u8; 3] = [0, 240, 255];
const COLOR_REFLECTED: [u8; 3] = [57, 255, 20];

/// Rerun-based visualizer for Beamgrid topology snapshots
pub struct RerunVisualizer {
    rec: RecordingStream,
}

impl RerunVisualizer {
    /// Create a new visualizer that spawns the Rerun viewer
    pub fn new(app_id: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let rec = RecordingStreamBuilder::new(app_id).spawn()?;

        rec.log_static("world", &rerun::ViewCoordinates::RIGHT_HAND_Y_UP())?;

        Ok(Self { rec })
    }

    /// Create a visualizer that saves to a file (for sharing)
    pub fn new_to_file(app_id: &str, path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let rec = RecordingStreamBuilder::new(app_id).save(path)?;

        rec.log_static("world", &rerun::ViewCoordinates::RIGHT_HAND_Y_UP())?;

        Ok(Self { rec })
    }

    /// Log the resolved city: buildings, panels, users and access points.
    pub fn log_scene(
        &self,
        layout: &CityLayout,
        view: &SceneView,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let centers: Vec<[f32; 3]> = view
            .buildings
            .iter()
            .map(|b| {
                [
                    b.position.x as f32,
                    (b.height / 2.0) as f32,
                    b.position.z as f32,
                ]
            })
            .collect();
        let half_sizes: Vec<[f32; 3]> = view
            .buildings
            .iter()
            .map(|b| {
                [
                    (b.width / 2.0) as f32,
                    (b.height / 2.0) as f32,
                    (b.depth / 2.0) as f32,
                ]
            })
            .collect();
        let colors: Vec<[u8; 4]> = view
            .buildings
            .iter()
            .map(|b| if b.is_ap_host { COLOR_HOST } else { COLOR_BUILDING })
            .collect();

        self.rec.log(
            "world/buildings",
            &rerun::Boxes3D::from_centers_and_half_sizes(centers, half_sizes)
                .with_colors(colors),
        )?;

        self.log_panels(&layout.panels)?;

        let user_points: Vec<[f32; 3]> = layout
            .users
            .iter()
            .map(|u| {
                [
                    u.position.x as f32,
                    u.position.y as f32,
                    u.position.z as f32,
                ]
            })
            .collect();
        self.rec.log(
            "world/users",
            &rerun::Points3D::new(user_points)
                .with_colors([COLOR_USER])
                .with_radii([0.4]),
        )?;

        let ap_points: Vec<[f32; 3]> = view
            .access_points
            .iter()
            .map(|ap| {
                [
                    ap.position.x as f32,
                    ap.position.y as f32,
                    ap.position.z as f32,
                ]
            })
            .collect();
        self.rec.log(
            "world/access_points",
            &rerun::Points3D::new(ap_points)
                .with_colors([COLOR_AP])
                .with_radii([0.6]),
        )?;

        Ok(())
    }

    fn log_panels(&self, panels: &[SurfacePanel]) -> Result<(), Box<dyn std::error::Error>> {
        let centers: Vec<[f32; 3]> = panels
            .iter()
            .map(|p| {
                [
                    p.position.x as f32,
                    p.position.y as f32,
                    p.position.z as f32,
                ]
            })
            .collect();
        let half_sizes: Vec<[f32; 3]> = panels
            .iter()
            .map(|p| {
                [
                    (p.width / 2.0) as f32,
                    (p.height / 2.0) as f32,
                    (p.thickness / 2.0) as f32,
                ]
            })
            .collect();
        let quaternions: Vec<[f32; 4]> = panels
            .iter()
            .map(|p| {
                let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), p.yaw());
                [q.i as f32, q.j as f32, q.k as f32, q.w as f32]
            })
            .collect();

        self.rec.log(
            "world/panels",
            &rerun::Boxes3D::from_centers_and_half_sizes(centers, half_sizes)
                .with_quaternions(quaternions)
                .with_colors([COLOR_PANEL]),
        )?;

        Ok(())
    }

    /// Log the computed link segments as line strips, colored by class with
    /// the segment opacity carried in the alpha channel.
    pub fn log_links(&self, segments: &[LinkSegment]) -> Result<(), Box<dyn std::error::Error>> {
        let strips: Vec<[[f32; 3]; 2]> = segments
            .iter()
            .map(|s| {
                [
                    [s.start.x as f32, s.start.y as f32, s.start.z as f32],
                    [s.end.x as f32, s.end.y as f32, s.end.z as f32],
                ]
            })
            .collect();
        let colors: Vec<[u8; 4]> = segments
            .iter()
            .map(|s| {
                let rgb = match s.class {
                    LinkClass::Direct => COLOR_DIRECT,
                    LinkClass::Reflected => COLOR_REFLECTED,
                };
                [rgb[0], rgb[1], rgb[2], (s.opacity * 255.0) as u8]
            })
            .collect();

        self.rec.log(
            "world/links",
            &rerun::LineStrips3D::new(strips)
                .with_colors(colors)
                .with_radii([0.05]),
        )?;

        Ok(())
    }
}
