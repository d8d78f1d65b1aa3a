//! 2D drawing surface with canvas-style state and path semantics.
//!
//! [`Surface`] is what the bars draw onto. [`Canvas`] implements it by
//! tessellating strokes into a [`DrawList`] the renderer uploads.

mod canvas;
mod path;

pub use canvas::{Canvas, DrawList};
pub use path::{arc_sweep, flatten_arc, flatten_cubic, tessellate_polyline, StrokeVertex, Subpath};

use std::ops::{Deref, DerefMut};

use crate::color::Rgba;

/// Immediate-mode drawing target with a save/restore state stack.
///
/// Coordinates are pixels, origin top-left, y down. Path coordinates are
/// mapped through the current transform when they are added.
pub trait Surface {
    fn size(&self) -> (f32, f32);

    /// Resizing resets the surface: contents, path and state stack.
    fn resize(&mut self, width: f32, height: f32);

    /// Erase everything drawn so far.
    fn clear(&mut self);

    fn save(&mut self);

    /// Pop the last saved state; no-op when nothing is saved.
    fn restore(&mut self);

    fn translate(&mut self, x: f32, y: f32);

    /// Rotate clockwise (on screen) by `angle` radians.
    fn rotate(&mut self, angle: f32);

    fn set_stroke_color(&mut self, color: Rgba);

    fn set_line_width(&mut self, width: f32);

    fn begin_path(&mut self);

    fn move_to(&mut self, x: f32, y: f32);

    fn line_to(&mut self, x: f32, y: f32);

    fn bezier_curve_to(&mut self, cp1x: f32, cp1y: f32, cp2x: f32, cp2y: f32, x: f32, y: f32);

    fn arc(&mut self, x: f32, y: f32, radius: f32, start_angle: f32, end_angle: f32, anticlockwise: bool);

    /// Stroke the current path with the current colour and width.
    fn stroke(&mut self);

    /// Save now, restore when the returned guard drops.
    fn scope(&mut self) -> TransformScope<'_, Self>
    where
        Self: Sized,
    {
        TransformScope::new(self)
    }
}

/// Scoped save/restore. The restore also runs while unwinding, so a panic
/// mid-draw cannot leak a transform into later drawing.
pub struct TransformScope<'a, S: Surface + ?Sized> {
    surface: &'a mut S,
}

impl<'a, S: Surface + ?Sized> TransformScope<'a, S> {
    pub fn new(surface: &'a mut S) -> Self {
        surface.save();
        Self { surface }
    }
}

impl<S: Surface + ?Sized> Deref for TransformScope<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: Surface + ?Sized> DerefMut for TransformScope<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: Surface + ?Sized> Drop for TransformScope<'_, S> {
    fn drop(&mut self) {
        self.surface.restore();
    }
}
