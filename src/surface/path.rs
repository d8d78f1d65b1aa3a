//! Path flattening and stroke tessellation.

use bytemuck::{Pod, Zeroable};
use glam::{Affine2, Vec2};
use std::f32::consts::TAU;

/// Target length of one flattened curve segment (pixels)
const SEGMENT_LENGTH_PX: f32 = 3.0;
const MIN_SEGMENTS: usize = 4;
const MAX_SEGMENTS: usize = 96;

/// Vertex for the stroke pipeline (pixel position + straight-alpha sRGB colour)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct StrokeVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// An open polyline in device space
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subpath {
    pub points: Vec<Vec2>,
}

impl Subpath {
    pub fn starting_at(p: Vec2) -> Self {
        Self { points: vec![p] }
    }

    pub fn last(&self) -> Option<Vec2> {
        self.points.last().copied()
    }
}

fn segments_for_length(length: f32) -> usize {
    ((length / SEGMENT_LENGTH_PX).ceil() as usize).clamp(MIN_SEGMENTS, MAX_SEGMENTS)
}

/// Append the points of a cubic Bezier from `p0` (excluded) to `p3`.
pub fn flatten_cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, out: &mut Vec<Vec2>) {
    // Control polygon length bounds the curve length
    let hull = p0.distance(p1) + p1.distance(p2) + p2.distance(p3);
    let n = segments_for_length(hull);
    for i in 1..=n {
        let t = i as f32 / n as f32;
        let mt = 1.0 - t;
        let point = p0 * (mt * mt * mt)
            + p1 * (3.0 * mt * mt * t)
            + p2 * (3.0 * mt * t * t)
            + p3 * (t * t * t);
        out.push(point);
    }
}

/// Signed sweep of a canvas arc from `start` to `end` (radians).
///
/// Follows canvas rules: a requested sweep of a full turn or more in the
/// drawing direction becomes exactly one turn, anything else is reduced
/// modulo a turn.
pub fn arc_sweep(start: f32, end: f32, anticlockwise: bool) -> f32 {
    if !anticlockwise && end - start >= TAU {
        TAU
    } else if anticlockwise && start - end >= TAU {
        -TAU
    } else if anticlockwise {
        -(start - end).rem_euclid(TAU)
    } else {
        (end - start).rem_euclid(TAU)
    }
}

/// Append arc points (in user space, mapped through `transform`),
/// including the start point.
pub fn flatten_arc(
    transform: &Affine2,
    center: Vec2,
    radius: f32,
    start: f32,
    sweep: f32,
    out: &mut Vec<Vec2>,
) {
    let scale = transform.matrix2.determinant().abs().sqrt();
    let n = segments_for_length(sweep.abs() * radius * scale);
    for i in 0..=n {
        let angle = start + sweep * i as f32 / n as f32;
        let local = center + Vec2::new(angle.cos(), angle.sin()) * radius;
        out.push(transform.transform_point2(local));
    }
}

/// Expand a polyline into quads of the given width (two triangles each).
/// Zero-length segments are skipped.
pub fn tessellate_polyline(points: &[Vec2], width: f32, color: [f32; 4], out: &mut Vec<StrokeVertex>) {
    let half = width * 0.5;
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let Some(dir) = (b - a).try_normalize() else {
            continue;
        };
        let offset = dir.perp() * half;
        let corners = [a + offset, a - offset, b + offset, b - offset];
        for idx in [0, 1, 2, 2, 1, 3] {
            out.push(StrokeVertex {
                position: corners[idx].to_array(),
                color,
            });
        }
    }
}
