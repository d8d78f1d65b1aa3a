//! CPU canvas producing stroke triangles.

use glam::{Affine2, Vec2};

use super::path::{arc_sweep, flatten_arc, flatten_cubic, tessellate_polyline, StrokeVertex, Subpath};
use super::Surface;
use crate::color::Rgba;

#[derive(Debug, Clone, Copy)]
struct DrawState {
    transform: Affine2,
    stroke_color: Rgba,
    line_width: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine2::IDENTITY,
            stroke_color: Rgba::BLACK,
            line_width: 1.0,
        }
    }
}

/// Everything stroked since the last clear
#[derive(Debug, Default, Clone)]
pub struct DrawList {
    pub vertices: Vec<StrokeVertex>,
    /// Number of `stroke` calls recorded
    pub strokes: usize,
}

impl DrawList {
    pub fn is_empty(&self) -> bool {
        self.strokes == 0
    }

    fn clear(&mut self) {
        self.vertices.clear();
        self.strokes = 0;
    }
}

pub struct Canvas {
    width: f32,
    height: f32,
    state: DrawState,
    stack: Vec<DrawState>,
    path: Vec<Subpath>,
    draw_list: DrawList,
    clears: u64,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            state: DrawState::default(),
            stack: Vec::new(),
            path: Vec::new(),
            draw_list: DrawList::default(),
            clears: 0,
        }
    }

    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    /// Number of `clear` calls since creation
    pub fn clear_count(&self) -> u64 {
        self.clears
    }

    /// Depth of the save/restore stack
    pub fn saved_states(&self) -> usize {
        self.stack.len()
    }

    pub fn transform(&self) -> Affine2 {
        self.state.transform
    }

    fn map(&self, x: f32, y: f32) -> Vec2 {
        self.state.transform.transform_point2(Vec2::new(x, y))
    }

    /// Current subpath, starting one at `p` if there is none
    fn ensure_subpath(&mut self, p: Vec2) -> &mut Subpath {
        if self.path.is_empty() {
            self.path.push(Subpath::starting_at(p));
        }
        let last = self.path.len() - 1;
        &mut self.path[last]
    }
}

impl Surface for Canvas {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.state = DrawState::default();
        self.stack.clear();
        self.path.clear();
        self.draw_list.clear();
    }

    fn clear(&mut self) {
        self.draw_list.clear();
        self.clears += 1;
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform * Affine2::from_translation(Vec2::new(x, y));
    }

    fn rotate(&mut self, angle: f32) {
        self.state.transform = self.state.transform * Affine2::from_angle(angle);
    }

    fn set_stroke_color(&mut self, color: Rgba) {
        self.state.stroke_color = color;
    }

    fn set_line_width(&mut self, width: f32) {
        // Non-positive and non-finite widths are ignored, as on a canvas
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.path.push(Subpath::starting_at(p));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.ensure_subpath(p).points.push(p);
    }

    fn bezier_curve_to(&mut self, cp1x: f32, cp1y: f32, cp2x: f32, cp2y: f32, x: f32, y: f32) {
        let p1 = self.map(cp1x, cp1y);
        let p2 = self.map(cp2x, cp2y);
        let p3 = self.map(x, y);
        let subpath = self.ensure_subpath(p1);
        let p0 = subpath.last().unwrap_or(p1);
        flatten_cubic(p0, p1, p2, p3, &mut subpath.points);
    }

    fn arc(&mut self, x: f32, y: f32, radius: f32, start_angle: f32, end_angle: f32, anticlockwise: bool) {
        let radius = radius.max(0.0);
        let sweep = arc_sweep(start_angle, end_angle, anticlockwise);
        let mut points = Vec::new();
        flatten_arc(
            &self.state.transform,
            Vec2::new(x, y),
            radius,
            start_angle,
            sweep,
            &mut points,
        );

        // Connects to an existing subpath with a straight line
        match self.path.last_mut() {
            Some(subpath) => subpath.points.extend(points),
            None => self.path.push(Subpath { points }),
        }
    }

    fn stroke(&mut self) {
        let scale = self.state.transform.matrix2.determinant().abs().sqrt();
        let width = self.state.line_width * scale;
        let color = self.state.stroke_color.to_array();
        for subpath in &self.path {
            tessellate_polyline(&subpath.points, width, color, &mut self.draw_list.vertices);
        }
        self.draw_list.strokes += 1;
    }
}
