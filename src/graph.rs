//! Rolling performance graph of step timings.
//!
//! Samples are kept in a bounded FIFO; the graph is drawn in display units
//! (origin top-left, y down) inside a fixed panel rectangle, newest sample at
//! the left edge.

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::batch::PrimitiveBatch;
use crate::constants::{
    ADAPTIVE_LIMITS, GRAPH_BACKGROUND_COLOR, GRAPH_LABEL_OFFSET, GRAPH_LINE_COLOR,
    GRAPH_MAXIMUM_VALUE, GRAPH_MINIMUM_VALUE, PERFORMANCE_PANEL_BOUNDS, TEXT_COLOR,
    VALUES_TO_GRAPH,
};
use crate::draw::{srgba, DrawContext};
use crate::text::StringQueue;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphColors {
    pub line: Color,
    pub background: Color,
    pub text: Color,
}

impl Default for GraphColors {
    fn default() -> Self {
        Self {
            line: srgba(GRAPH_LINE_COLOR),
            background: srgba(GRAPH_BACKGROUND_COLOR),
            text: srgba(TEXT_COLOR),
        }
    }
}

/// Summary of the sample window, refreshed on render.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GraphStats {
    pub min: f32,
    pub avg: f32,
    pub max: f32,
}

#[derive(Debug, Clone)]
pub struct PerformanceGraph {
    samples: VecDeque<f32>,
    capacity: usize,
    pub adaptive_limits: bool,
    pub minimum_value: f32,
    pub maximum_value: f32,
    /// Panel rectangle in display units.
    pub bounds: Rect,
    stats: GraphStats,
}

impl Default for PerformanceGraph {
    fn default() -> Self {
        let [x, y, w, h] = PERFORMANCE_PANEL_BOUNDS;
        Self::new(
            VALUES_TO_GRAPH,
            ADAPTIVE_LIMITS,
            GRAPH_MINIMUM_VALUE,
            GRAPH_MAXIMUM_VALUE,
            Rect::new(x, y, x + w, y + h),
        )
    }
}

impl PerformanceGraph {
    /// `capacity` is clamped to at least 2 so the polyline can be drawn.
    pub fn new(
        capacity: usize,
        adaptive_limits: bool,
        minimum_value: f32,
        maximum_value: f32,
        bounds: Rect,
    ) -> Self {
        let capacity = capacity.max(2);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
            adaptive_limits,
            minimum_value,
            maximum_value,
            bounds,
            stats: GraphStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }

    pub fn stats(&self) -> GraphStats {
        self.stats
    }

    pub fn record_sample(&mut self, ms: f32) {
        self.samples.push_back(ms);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.stats = GraphStats::default();
    }

    /// Draw the graph into a display-unit context.
    pub fn render<B: PrimitiveBatch + ?Sized>(
        &mut self,
        ctx: &mut DrawContext<'_, B>,
        strings: &mut StringQueue,
        colors: &GraphColors,
    ) {
        let bounds = self.bounds;

        if self.samples.len() >= 2 {
            self.refresh_stats();
            if self.adaptive_limits {
                self.maximum_value = self.stats.max;
                self.minimum_value = 0.0;
            }

            let dx = bounds.width() / self.capacity as f32;
            let mut prev: Option<Vec2> = None;
            for (n, value) in self.samples.iter().rev().enumerate() {
                let x = (bounds.min.x + n as f32 * dx).clamp(bounds.min.x, bounds.max.x);
                let p = Vec2::new(x, self.plot_y(*value));
                if let Some(q) = prev {
                    ctx.segment(q, p, colors.line);
                }
                prev = Some(p);
            }
        }

        let label_x = bounds.max.x + GRAPH_LABEL_OFFSET;
        strings.push(
            Vec2::new(label_x, bounds.min.y),
            format!("Max: {:.2} ms", self.stats.max),
            colors.text,
        );
        strings.push(
            Vec2::new(label_x, bounds.center().y - 7.0),
            format!("Avg: {:.2} ms", self.stats.avg),
            colors.text,
        );
        strings.push(
            Vec2::new(label_x, bounds.max.y - 15.0),
            format!("Min: {:.2} ms", self.stats.min),
            colors.text,
        );

        let background = [
            Vec2::new(bounds.min.x, bounds.min.y),
            Vec2::new(bounds.max.x, bounds.min.y),
            Vec2::new(bounds.max.x, bounds.max.y),
            Vec2::new(bounds.min.x, bounds.max.y),
        ];
        ctx.solid_polygon(&background, colors.background, true);
    }

    fn refresh_stats(&mut self) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        let mut sum = 0.0;
        for &v in &self.samples {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        self.stats = GraphStats {
            min,
            avg: sum / self.samples.len() as f32,
            max,
        };
    }

    fn plot_y(&self, value: f32) -> f32 {
        let range = self.maximum_value - self.minimum_value;
        if range <= 0.0 {
            return self.bounds.max.y;
        }
        let t = (value - self.minimum_value) / range;
        (self.bounds.max.y - t * self.bounds.height()).clamp(self.bounds.min.y, self.bounds.max.y)
    }
}
