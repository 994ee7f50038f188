//! Runtime debug-view configuration loaded from `assets/debug_view.toml`.
//!
//! [`DebugViewConfig`] is a Bevy [`Resource`] that mirrors the tunables in
//! [`crate::constants`].  At startup, [`load_debug_view_config`] reads
//! `assets/debug_view.toml` and replaces the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the values you care about:
//!
//! ```toml
//! display_per_sim = 64.0
//! initial_flags = ["shape", "joint", "contact_points", "performance_graph"]
//!
//! [colors]
//! static_shape = [0.3, 0.8, 0.3, 1.0]
//! ```
//!
//! A file that fails to parse or validate is reported with `warn!` and the
//! defaults stay in place.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `DebugViewConfig::default()`.

use std::io::ErrorKind;
use std::path::Path;

use crate::constants::*;
use crate::debug_view::DebugViewFlags;
use crate::draw::{srgba, JointColors};
use crate::error::{
    validate_min_count, validate_positive, validate_range, DebugResult, DebugViewError,
};
use crate::graph::GraphColors;
use bevy::prelude::*;
use serde::Deserialize;

/// Location of the optional configuration file, relative to the working directory.
pub const DEBUG_VIEW_CONFIG_PATH: &str = "assets/debug_view.toml";

/// Per-channel overlay colours, sRGBA.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DebugColors {
    // ── Shapes ────────────────────────────────────────────────────────────────
    pub default_shape: [f32; 4],
    pub inactive_shape: [f32; 4],
    pub kinematic_shape: [f32; 4],
    pub sleeping_shape: [f32; 4],
    pub static_shape: [f32; 4],
    pub text: [f32; 4],

    // ── Joints ────────────────────────────────────────────────────────────────
    pub joint: [f32; 4],
    pub mouse_anchor: [f32; 4],
    pub mouse_line: [f32; 4],
    pub revolute_anchor_a: [f32; 4],
    pub revolute_anchor_b: [f32; 4],

    // ── Contacts & overlays ───────────────────────────────────────────────────
    pub contact_added: [f32; 4],
    pub contact_persisted: [f32; 4],
    pub contact_normal: [f32; 4],
    pub polygon_point: [f32; 4],
    pub aabb: [f32; 4],
    pub buoyancy: [f32; 4],

    // ── Performance graph ─────────────────────────────────────────────────────
    pub graph_line: [f32; 4],
    pub graph_background: [f32; 4],
}

impl Default for DebugColors {
    fn default() -> Self {
        Self {
            default_shape: DEFAULT_SHAPE_COLOR,
            inactive_shape: INACTIVE_SHAPE_COLOR,
            kinematic_shape: KINEMATIC_SHAPE_COLOR,
            sleeping_shape: SLEEPING_SHAPE_COLOR,
            static_shape: STATIC_SHAPE_COLOR,
            text: TEXT_COLOR,
            joint: JOINT_COLOR,
            mouse_anchor: MOUSE_ANCHOR_COLOR,
            mouse_line: MOUSE_LINE_COLOR,
            revolute_anchor_a: REVOLUTE_ANCHOR_A_COLOR,
            revolute_anchor_b: REVOLUTE_ANCHOR_B_COLOR,
            contact_added: CONTACT_ADDED_COLOR,
            contact_persisted: CONTACT_PERSISTED_COLOR,
            contact_normal: CONTACT_NORMAL_COLOR,
            polygon_point: POLYGON_POINT_COLOR,
            aabb: AABB_COLOR,
            buoyancy: BUOYANCY_COLOR,
            graph_line: GRAPH_LINE_COLOR,
            graph_background: GRAPH_BACKGROUND_COLOR,
        }
    }
}

impl DebugColors {
    pub fn joint_colors(&self) -> JointColors {
        JointColors {
            joint: srgba(self.joint),
            mouse_anchor: srgba(self.mouse_anchor),
            mouse_line: srgba(self.mouse_line),
            revolute_anchor_a: srgba(self.revolute_anchor_a),
            revolute_anchor_b: srgba(self.revolute_anchor_b),
        }
    }

    pub fn graph_colors(&self) -> GraphColors {
        GraphColors {
            line: srgba(self.graph_line),
            background: srgba(self.graph_background),
            text: srgba(self.text),
        }
    }
}

/// Runtime-tunable debug view and step driver configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DebugViewConfig {
    // ── Units ─────────────────────────────────────────────────────────────────
    pub display_per_sim: f32,

    // ── Flags ─────────────────────────────────────────────────────────────────
    /// Lower-case flag names, e.g. `"shape"`, `"contact_normals"`.
    pub initial_flags: Vec<String>,

    // ── Shapes & contacts ─────────────────────────────────────────────────────
    pub circle_segments: u32,
    pub max_contact_points: usize,

    // ── Debug panel ───────────────────────────────────────────────────────────
    pub debug_panel_position: [f32; 2],
    pub debug_panel_column_offset: f32,

    // ── Performance graph ─────────────────────────────────────────────────────
    pub values_to_graph: usize,
    pub adaptive_limits: bool,
    pub graph_minimum_value: f32,
    pub graph_maximum_value: f32,
    /// `[x, y, width, height]`, display units, origin top-left.
    pub performance_panel_bounds: [f32; 4],

    // ── Stepping ──────────────────────────────────────────────────────────────
    pub minimum_update_delta_time: f32,
    pub enable_mouse_picking: bool,

    // ── Text ──────────────────────────────────────────────────────────────────
    /// Font under `assets/`; `None` uses Bevy's default font.
    pub font_path: Option<String>,
    pub font_size: f32,

    pub colors: DebugColors,
}

impl Default for DebugViewConfig {
    fn default() -> Self {
        Self {
            display_per_sim: DISPLAY_PER_SIM,
            initial_flags: vec!["shape".into(), "controllers".into(), "joint".into()],
            circle_segments: CIRCLE_SEGMENTS,
            max_contact_points: MAX_CONTACT_POINTS,
            debug_panel_position: DEBUG_PANEL_POSITION,
            debug_panel_column_offset: DEBUG_PANEL_COLUMN_OFFSET,
            values_to_graph: VALUES_TO_GRAPH,
            adaptive_limits: ADAPTIVE_LIMITS,
            graph_minimum_value: GRAPH_MINIMUM_VALUE,
            graph_maximum_value: GRAPH_MAXIMUM_VALUE,
            performance_panel_bounds: PERFORMANCE_PANEL_BOUNDS,
            minimum_update_delta_time: MINIMUM_UPDATE_DELTA_TIME,
            enable_mouse_picking: ENABLE_MOUSE_PICKING,
            font_path: None,
            font_size: DEBUG_FONT_SIZE,
            colors: DebugColors::default(),
        }
    }
}

impl DebugViewConfig {
    /// Initial flag set named by `initial_flags`.
    pub fn flags(&self) -> DebugResult<DebugViewFlags> {
        DebugViewFlags::from_names(&self.initial_flags)
    }

    /// Graph panel rectangle from `performance_panel_bounds`.
    pub fn performance_panel_rect(&self) -> Rect {
        let [x, y, w, h] = self.performance_panel_bounds;
        Rect::new(x, y, x + w, y + h)
    }

    pub fn validate(&self) -> DebugResult<()> {
        validate_positive("display_per_sim", self.display_per_sim)?;
        validate_min_count("circle_segments", self.circle_segments as usize, 3, "[3, ∞)")?;
        validate_min_count("max_contact_points", self.max_contact_points, 1, "[1, ∞)")?;
        validate_min_count("values_to_graph", self.values_to_graph, 2, "[2, ∞)")?;
        validate_range(
            "graph_maximum_value",
            self.graph_minimum_value,
            self.graph_maximum_value,
        )?;
        validate_positive(
            "performance_panel_bounds.width",
            self.performance_panel_bounds[2],
        )?;
        validate_positive(
            "performance_panel_bounds.height",
            self.performance_panel_bounds[3],
        )?;
        validate_positive("minimum_update_delta_time", self.minimum_update_delta_time)?;
        validate_positive("font_size", self.font_size)?;
        self.flags().map(|_| ())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> DebugResult<Self> {
        Self::parse(contents, "<inline>")
    }

    /// Read, parse and validate `path`.  A missing file yields `Ok(None)`.
    pub fn load_from_path(path: impl AsRef<Path>) -> DebugResult<Option<Self>> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents, &path.display().to_string()).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DebugViewError::ConfigIo {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn parse(contents: &str, path: &str) -> DebugResult<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| DebugViewError::ConfigParse {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Startup system: attempt to load `assets/debug_view.toml` and replace the
/// `DebugViewConfig` resource with it.
///
/// Missing keys retain their compiled defaults.  Read, parse and validation
/// errors are logged and the current resource is kept.
pub fn load_debug_view_config(mut config: ResMut<DebugViewConfig>) {
    let path = DEBUG_VIEW_CONFIG_PATH;
    match DebugViewConfig::load_from_path(path) {
        Ok(Some(loaded)) => {
            *config = loaded;
            info!("Loaded debug view config from {path}");
        }
        Ok(None) => {
            info!("No {path} found; using compiled defaults");
        }
        Err(e) => {
            warn!("{e}; using defaults");
        }
    }
}
