//! Primitive batch sink: colored vertices tagged as line-list or triangle-list.
//!
//! [`PrimitiveBatch`] is the seam between the debug view and whatever actually
//! rasterizes vertices.  [`VertexBatch`] is the in-crate implementation: it
//! accumulates one [`BatchPass`] per `begin`/`end` pair, and the Bevy adapter in
//! [`crate::rendering`] drains the passes once per frame.

use bevy::prelude::*;

/// Topology a vertex contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Every two vertices form a segment.
    Line,
    /// Every three vertices form a filled triangle.
    Triangle,
}

/// A single colored vertex in display space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugVertex {
    pub position: Vec2,
    pub color: Color,
}

/// Sink for batched debug primitives.
///
/// Every `begin` must be matched by an `end`.  Vertices are only accepted
/// between the two.
pub trait PrimitiveBatch {
    fn begin(&mut self, projection: Mat4, view: Mat4);
    fn add_vertex(&mut self, position: Vec2, color: Color, kind: PrimitiveKind);
    fn end(&mut self);
}

/// Vertices collected between one `begin`/`end` pair, with the transform pair
/// they must be rendered under.
#[derive(Debug, Clone)]
pub struct BatchPass {
    pub projection: Mat4,
    pub view: Mat4,
    pub lines: Vec<DebugVertex>,
    pub triangles: Vec<DebugVertex>,
}

impl BatchPass {
    fn new(projection: Mat4, view: Mat4) -> Self {
        Self {
            projection,
            view,
            lines: Vec::new(),
            triangles: Vec::new(),
        }
    }

    /// Matrix taking a display-space vertex of this pass to clip space.
    pub fn clip_from_display(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Number of complete segments in the pass.
    pub fn line_count(&self) -> usize {
        self.lines.len() / 2
    }

    /// Number of complete triangles in the pass.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }
}

/// Accumulating [`PrimitiveBatch`] stored as a Bevy resource.
#[derive(Resource, Debug, Default)]
pub struct VertexBatch {
    active: Option<BatchPass>,
    passes: Vec<BatchPass>,
}

impl VertexBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a pass is open.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Completed passes, oldest first.
    pub fn passes(&self) -> &[BatchPass] {
        &self.passes
    }

    /// Take every completed pass, leaving the batch empty.
    pub fn take_passes(&mut self) -> Vec<BatchPass> {
        std::mem::take(&mut self.passes)
    }
}

impl PrimitiveBatch for VertexBatch {
    fn begin(&mut self, projection: Mat4, view: Mat4) {
        if let Some(unfinished) = self.active.take() {
            warn!("VertexBatch::begin called twice without end; closing previous pass");
            self.passes.push(unfinished);
        }
        self.active = Some(BatchPass::new(projection, view));
    }

    fn add_vertex(&mut self, position: Vec2, color: Color, kind: PrimitiveKind) {
        let Some(pass) = self.active.as_mut() else {
            warn!("VertexBatch::add_vertex called outside begin/end; vertex dropped");
            return;
        };
        let vertex = DebugVertex { position, color };
        match kind {
            PrimitiveKind::Line => pass.lines.push(vertex),
            PrimitiveKind::Triangle => pass.triangles.push(vertex),
        }
    }

    fn end(&mut self) {
        match self.active.take() {
            Some(pass) => self.passes.push(pass),
            None => warn!("VertexBatch::end called without begin"),
        }
    }
}
