//! Centralised debug-view and step-driver defaults.
//!
//! Every tuneable value lives here so it can be found and reasoned about in one
//! place.  [`crate::config::DebugViewConfig::default`] mirrors these constants,
//! and `assets/debug_view.toml` can override any subset at startup.
//!
//! Colours are stored as sRGBA arrays so they can be written verbatim in TOML.

// ── Units ─────────────────────────────────────────────────────────────────────

/// Display units (pixels) per simulation unit (meter).
///
/// At 100.0 a 1 m box is drawn 100 px wide at camera scale 1.0.
pub const DISPLAY_PER_SIM: f32 = 100.0;

// ── Shapes ────────────────────────────────────────────────────────────────────

/// Number of segments used to tessellate circles.
///
/// Below 8 circles read as polygons; above ~48 the vertex count dominates the
/// line batch for scenes with many small bodies.
pub const CIRCLE_SEGMENTS: u32 = 24;

/// Side length (sim units) of the square marker drawn for contact points and
/// polygon vertices.
pub const POINT_MARKER_SIZE: f32 = 0.1;

/// Side length (sim units) of the square marker drawn at a mouse joint anchor.
pub const MOUSE_ANCHOR_MARKER_SIZE: f32 = 0.5;

/// Radius (sim units) of the filled circles drawn at revolute joint anchors.
pub const REVOLUTE_ANCHOR_RADIUS: f32 = 0.1;

/// Length (sim units) of contact-normal indicators.
pub const CONTACT_NORMAL_SCALE: f32 = 0.3;

/// Length (sim units) of the axes drawn by the centre-of-mass overlay.
pub const TRANSFORM_AXIS_SCALE: f32 = 0.4;

// ── Contacts ──────────────────────────────────────────────────────────────────

/// Maximum contact points captured between two render frames.
///
/// The buffer is allocated once at this size; points past it are dropped for
/// the frame.
pub const MAX_CONTACT_POINTS: usize = 2048;

// ── Debug Panel ───────────────────────────────────────────────────────────────

/// Top-left corner of the counters block (display pixels).
pub const DEBUG_PANEL_POSITION: [f32; 2] = [55.0, 100.0];

/// Horizontal offset of the timings block from the counters block (pixels).
pub const DEBUG_PANEL_COLUMN_OFFSET: f32 = 110.0;

// ── Performance Graph ─────────────────────────────────────────────────────────

/// Number of step-time samples kept in the rolling window.
pub const VALUES_TO_GRAPH: usize = 500;

/// Whether the graph's vertical range tracks the observed maximum.
pub const ADAPTIVE_LIMITS: bool = true;

/// Fixed lower bound of the graph (ms) when adaptive limits are off.
pub const GRAPH_MINIMUM_VALUE: f32 = 0.0;

/// Fixed upper bound of the graph (ms) when adaptive limits are off.
pub const GRAPH_MAXIMUM_VALUE: f32 = 10.0;

/// Graph panel rectangle `[x, y, width, height]` in display pixels
/// (origin top-left, y down).
pub const PERFORMANCE_PANEL_BOUNDS: [f32; 4] = [330.0, 100.0, 200.0, 100.0];

/// Horizontal gap between the graph's right edge and its labels (pixels).
pub const GRAPH_LABEL_OFFSET: f32 = 10.0;

// ── Stepping ──────────────────────────────────────────────────────────────────

/// Upper bound on the delta handed to `step`, in seconds.
///
/// Frame hitches longer than this run in slow motion instead of feeding the
/// solver a large step.
pub const MINIMUM_UPDATE_DELTA_TIME: f32 = 1.0 / 30.0;

/// Whether left-click dragging of dynamic bodies is enabled.
pub const ENABLE_MOUSE_PICKING: bool = true;

// ── Text ──────────────────────────────────────────────────────────────────────

/// Font size for panel and graph text (logical pixels).
pub const DEBUG_FONT_SIZE: f32 = 12.0;

// ── Colours (sRGBA) ───────────────────────────────────────────────────────────

pub const DEFAULT_SHAPE_COLOR: [f32; 4] = [0.9, 0.7, 0.7, 1.0];
pub const INACTIVE_SHAPE_COLOR: [f32; 4] = [0.5, 0.5, 0.3, 1.0];
pub const KINEMATIC_SHAPE_COLOR: [f32; 4] = [0.5, 0.5, 0.9, 1.0];
pub const SLEEPING_SHAPE_COLOR: [f32; 4] = [0.6, 0.6, 0.6, 1.0];
pub const STATIC_SHAPE_COLOR: [f32; 4] = [0.5, 0.9, 0.5, 1.0];
pub const TEXT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

pub const JOINT_COLOR: [f32; 4] = [0.5, 0.8, 0.8, 1.0];
pub const MOUSE_ANCHOR_COLOR: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
pub const MOUSE_LINE_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];
pub const REVOLUTE_ANCHOR_A_COLOR: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
pub const REVOLUTE_ANCHOR_B_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

pub const CONTACT_ADDED_COLOR: [f32; 4] = [0.3, 0.95, 0.3, 1.0];
pub const CONTACT_PERSISTED_COLOR: [f32; 4] = [0.3, 0.3, 0.95, 1.0];
pub const CONTACT_NORMAL_COLOR: [f32; 4] = [0.4, 0.9, 0.4, 1.0];
pub const POLYGON_POINT_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
pub const AABB_COLOR: [f32; 4] = [0.9, 0.3, 0.9, 1.0];
pub const BUOYANCY_COLOR: [f32; 4] = [0.68, 0.85, 0.9, 1.0];

pub const GRAPH_LINE_COLOR: [f32; 4] = [0.56, 0.93, 0.56, 1.0];
pub const GRAPH_BACKGROUND_COLOR: [f32; 4] = [0.66, 0.66, 0.66, 1.0];
