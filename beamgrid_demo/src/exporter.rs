//! JSON exporter for external renderers.
//!
//! Serializes one resolved scene plus its computed links so a presentation
//! layer (browser renderer, notebook, Rerun script) can draw it without
//! linking against the core.

use beamgrid_core::{CityLayout, LinkClass, LinkReport, SceneView};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// Errors raised while writing a scene export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize export: {0}")]
    Json(#[from] serde_json::Error),
}

/// A solid box the renderer should draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingShape {
    pub x: f64,
    pub z: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub is_ap_host: bool,
    pub style_id: u8,
}

/// A wall-mounted panel with its cardinal yaw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelShape {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
    pub width: f64,
    pub height: f64,
    pub thickness: f64,
}

/// A point entity (user or access point).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointEntry {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One beam segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEntry {
    pub start: [f64; 3],
    pub end: [f64; 3],
    pub class: LinkClass,
    pub opacity: f32,
}

/// Complete scene export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneExport {
    /// Seed used for generation
    pub seed: u64,

    /// Connectivity radius the links were computed with
    pub radius: f64,

    /// Siting offset factor the scene was resolved with
    pub ap_factor: f64,

    pub buildings: Vec<BuildingShape>,
    pub panels: Vec<PanelShape>,
    pub users: Vec<PointEntry>,
    pub access_points: Vec<PointEntry>,
    pub links: Vec<LinkEntry>,

    /// Distinct users served by at least one panel
    pub served_users: usize,
}

impl SceneExport {
    /// Flatten a layout, resolved view and link report into one export.
    pub fn build(
        seed: u64,
        radius: f64,
        ap_factor: f64,
        layout: &CityLayout,
        view: &SceneView,
        report: &LinkReport,
    ) -> Self {
        let buildings = view
            .buildings
            .iter()
            .map(|b| BuildingShape {
                x: b.position.x,
                z: b.position.z,
                width: b.width,
                depth: b.depth,
                height: b.height,
                is_ap_host: b.is_ap_host,
                style_id: b.style_id,
            })
            .collect();

        let panels = layout
            .panels
            .iter()
            .map(|p| PanelShape {
                x: p.position.x,
                y: p.position.y,
                z: p.position.z,
                yaw: p.yaw(),
                width: p.width,
                height: p.height,
                thickness: p.thickness,
            })
            .collect();

        let users = layout
            .users
            .iter()
            .map(|u| PointEntry {
                id: u.id,
                x: u.position.x,
                y: u.position.y,
                z: u.position.z,
            })
            .collect();

        let access_points = view
            .access_points
            .iter()
            .map(|ap| PointEntry {
                id: ap.id,
                x: ap.position.x,
                y: ap.position.y,
                z: ap.position.z,
            })
            .collect();

        let links = report
            .segments
            .iter()
            .map(|s| LinkEntry {
                start: [s.start.x, s.start.y, s.start.z],
                end: [s.end.x, s.end.y, s.end.z],
                class: s.class,
                opacity: s.opacity,
            })
            .collect();

        Self {
            seed,
            radius,
            ap_factor,
            buildings,
            panels,
            users,
            access_points,
            links,
            served_users: report.served_users,
        }
    }

    /// Write the export as pretty-printed JSON.
    pub fn write_to_file(&self, path: &str) -> Result<(), ExportError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
