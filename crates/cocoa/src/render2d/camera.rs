//! Orthographic 2D camera.
//!
//! Y points up, the origin of the view is the camera position, and one world
//! unit maps to `1 / zoom` pixels: a zoom of 2 shows twice as much of the
//! world. Gizmo handles are scaled by the zoom so they keep their on-screen
//! size.

use serde::{Deserialize, Serialize};

use crate::math::{Mat4, Vec2, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera2d {
    pub position: Vec2,
    pub zoom: f32,
    /// Surface size in physical pixels. Kept in sync by the app on resize.
    #[serde(skip)]
    pub viewport: Vec2,
}

impl Default for Camera2d {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport: Vec2::new(1280.0, 720.0),
        }
    }
}

impl Camera2d {
    pub fn projection(&self) -> Mat4 {
        let half = self.viewport * 0.5 * self.zoom;
        Mat4::orthographic_rh(-half.x, half.x, -half.y, half.y, -1000.0, 1000.0)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_translation(-self.position.extend(0.0))
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Window pixel coordinates (origin top-left, y down) to world space.
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return self.position;
        }
        let ndc = Vec2::new(
            screen.x / self.viewport.x * 2.0 - 1.0,
            1.0 - screen.y / self.viewport.y * 2.0,
        );
        let world = self.view_projection().inverse() * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        Vec2::new(world.x, world.y)
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_center_is_camera_position() {
        let cam = Camera2d {
            position: Vec2::new(100.0, -50.0),
            ..Camera2d::default()
        };
        let w = cam.screen_to_world(Vec2::new(640.0, 360.0));
        assert!((w - cam.position).length() < 1e-3);
    }

    #[test]
    fn zoom_widens_the_view() {
        let cam = Camera2d {
            zoom: 2.0,
            ..Camera2d::default()
        };
        let top_right = cam.screen_to_world(Vec2::new(1280.0, 0.0));
        assert!((top_right.x - 1280.0).abs() < 1e-2);
        assert!((top_right.y - 720.0).abs() < 1e-2);
    }
}
