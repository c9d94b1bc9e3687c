//! # Gizmos: Drag Handles for the Active Entity
//!
//! Three handles are shown around the active entity, either the move set or
//! the scale set. Dragging one pushes position or scale edits through the
//! command history, so a whole drag becomes one undo entry.
//!
//! ```text
//!              ▲            vertical handle   (Y only)
//!              │
//!          ┌───┴───┐
//!          │entity │──────►  horizontal handle (X only)
//!          └───────┘
//!            ■               free handle       (X and Y)
//! ```
//!
//! Handle offsets, sizes and hit boxes are in screen pixels and get scaled
//! by the camera zoom, so the handles keep their on-screen size.
//!
//! ## Drag lifecycle
//!
//! ```text
//! mouse_pressed   hot handle?  yes → start drag with it (entity stays active)
//!                              no  → picked entity (or none) becomes active
//! update          dragging     → ChangeVec3Command(Position | Scale), merged
//!                 otherwise    → recompute the hot handle under the mouse
//! mouse_released               → end drag, set_no_merge_most_recent()
//! ```

use std::ops::Range;

use crate::asset::{AssetError, TextureAssets, TextureHandle};
use crate::commands::{ChangeVec3Command, CommandHistory, Vec3Field};
use crate::components::Sprite;
use crate::ecs::Entity;
use crate::input::KeyCode;
use crate::math::{self, Transform, Vec2, Vec3};
use crate::render2d::{Drawable, Layer, RenderError, RenderSystem};
use crate::scene::Scene;

pub const VT_SCALE: usize = 0;
pub const HZ_SCALE: usize = 1;
pub const FREE_SCALE: usize = 2;
pub const VT_MOVE: usize = 3;
pub const HZ_MOVE: usize = 4;
pub const FREE_MOVE: usize = 5;

/// Scale handles change scale by this much per world unit dragged.
const SCALE_SENSITIVITY: f32 = 0.2;

const HOT_TINT: Vec3 = Vec3::new(0.4, 0.4, 0.4);
const GIZMO_Z: i32 = 0;

// Generated handle sheet: five 16×40 cells side by side.
const CELL_W: u32 = 16;
const CELL_H: u32 = 40;
const SHEET_W: u32 = CELL_W * 5;
const SHEET_H: u32 = CELL_H;

const CELL_FREE: u32 = 0;
const CELL_HZ_MOVE: u32 = 1;
const CELL_HZ_SCALE: u32 = 2;
const CELL_VT_MOVE: u32 = 3;
const CELL_VT_SCALE: u32 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GizmoMode {
    #[default]
    Translate,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GizmoAxis {
    Horizontal,
    Vertical,
    Free,
}

impl GizmoAxis {
    /// Zero out the components this axis does not move.
    fn constrain(self, delta: Vec2) -> Vec2 {
        match self {
            GizmoAxis::Horizontal => Vec2::new(delta.x, 0.0),
            GizmoAxis::Vertical => Vec2::new(0.0, delta.y),
            GizmoAxis::Free => delta,
        }
    }
}

/// One handle. Lengths are in pixels at zoom 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gizmo {
    pub axis: GizmoAxis,
    /// From the entity position to the handle center.
    pub offset: Vec2,
    /// Sprite rotation in degrees. The horizontal handles reuse the upright
    /// art turned by -90.
    pub rotation: f32,
    pub half_size: Vec2,
    pub hit_half_size: Vec2,
    /// From the handle center to its hit box center, unrotated.
    pub hit_offset: Vec2,
    pub uv_min: Vec2,
    pub uv_max: Vec2,
}

impl Gizmo {
    fn new(texture: TextureHandle, axis: GizmoAxis, offset: Vec2, rotation: f32, cell: u32) -> Self {
        let (uv_min, uv_max) =
            Sprite::from_sheet(texture, SHEET_W, SHEET_H, CELL_W, CELL_H, cell).uv_bounds();
        let (hit_half_size, hit_offset) = match axis {
            GizmoAxis::Free => (Vec2::new(8.0, 8.0), Vec2::new(0.0, -12.0)),
            _ => (Vec2::new(5.0, 20.0), Vec2::ZERO),
        };
        Self {
            axis,
            offset,
            rotation,
            half_size: Vec2::new(8.0, 20.0),
            hit_half_size,
            hit_offset,
            uv_min,
            uv_max,
        }
    }

    fn center(&self, entity_pos: Vec2, zoom: f32) -> Vec2 {
        entity_pos + self.offset * zoom
    }

    fn hit(&self, mouse: Vec2, entity_pos: Vec2, zoom: f32) -> bool {
        let box_center = self.center(entity_pos, zoom) + self.hit_offset * zoom;
        math::point_in_box(mouse, self.hit_half_size * zoom, box_center, self.rotation)
    }
}

/// Handle state for the editor viewport.
#[derive(Debug)]
pub struct GizmoSystem {
    gizmos: [Gizmo; 6],
    texture: TextureHandle,
    mode: GizmoMode,
    hot: Option<usize>,
    active: Option<usize>,
    dragging: bool,
    drag_start: Vec2,
    mouse_offset: Vec3,
    original_scale: Vec3,
}

impl GizmoSystem {
    /// Register the handle sheet with `assets` and lay out the six handles.
    pub fn new(assets: &mut TextureAssets) -> Result<Self, AssetError> {
        let texture = assets.from_rgba("gizmos", SHEET_W, SHEET_H, gizmo_sheet_pixels())?;
        let gizmo = |axis, x, y, rotation, cell| Gizmo::new(texture, axis, Vec2::new(x, y), rotation, cell);
        let gizmos = [
            gizmo(GizmoAxis::Vertical, -8.0, 12.0, 0.0, CELL_VT_SCALE),
            gizmo(GizmoAxis::Horizontal, 15.0, -10.0, -90.0, CELL_HZ_SCALE),
            gizmo(GizmoAxis::Free, 5.0, 15.0, 0.0, CELL_FREE),
            gizmo(GizmoAxis::Vertical, -8.0, 12.0, 0.0, CELL_VT_MOVE),
            gizmo(GizmoAxis::Horizontal, 15.0, -10.0, -90.0, CELL_HZ_MOVE),
            gizmo(GizmoAxis::Free, 5.0, 15.0, 0.0, CELL_FREE),
        ];
        Ok(Self {
            gizmos,
            texture,
            mode: GizmoMode::default(),
            hot: None,
            active: None,
            dragging: false,
            drag_start: Vec2::ZERO,
            mouse_offset: Vec3::ZERO,
            original_scale: Vec3::ONE,
        })
    }

    pub fn gizmo(&self, index: usize) -> Option<&Gizmo> {
        self.gizmos.get(index)
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn mode(&self) -> GizmoMode {
        self.mode
    }

    /// Switching mode mid-drag is ignored.
    pub fn set_mode(&mut self, mode: GizmoMode) {
        if !self.dragging {
            self.mode = mode;
        }
    }

    pub fn hot(&self) -> Option<usize> {
        self.hot
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// G selects translate, S selects scale. Returns whether the key was used.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::KeyG => self.set_mode(GizmoMode::Translate),
            KeyCode::KeyS => self.set_mode(GizmoMode::Scale),
            _ => return false,
        }
        true
    }

    fn visible_range(&self) -> Range<usize> {
        match self.mode {
            GizmoMode::Scale => VT_SCALE..FREE_SCALE + 1,
            GizmoMode::Translate => VT_MOVE..FREE_MOVE + 1,
        }
    }

    /// Left button went down at `mouse` (world space). `picked` is the
    /// entity under the cursor according to the picking pass.
    pub fn mouse_pressed(&mut self, scene: &mut Scene, mouse: Vec2, picked: Option<Entity>) {
        if self.dragging {
            return;
        }
        self.drag_start = mouse;

        let target = match self.hot {
            Some(_) => scene.active_entity(),
            None => picked,
        };
        let transform = target.and_then(|e| scene.world.get::<Transform>(e).copied());

        match (self.hot, target, transform) {
            (Some(hot), Some(entity), Some(tf)) => {
                scene.set_active_entity(Some(entity));
                self.active = Some(hot);
                self.dragging = true;
                self.mouse_offset = mouse.extend(0.0) - tf.position;
                self.original_scale = tf.scale;
            }
            _ => {
                self.active = None;
                scene.set_active_entity(target);
            }
        }
    }

    /// End the drag. The edits made during it stay one undo entry.
    pub fn mouse_released(&mut self, history: &mut CommandHistory) {
        if self.dragging {
            self.dragging = false;
            self.active = None;
            history.set_no_merge_most_recent();
        }
    }

    /// Apply an ongoing drag, or find the handle under the mouse.
    pub fn update(&mut self, scene: &mut Scene, history: &mut CommandHistory, mouse: Vec2) {
        let Some((entity, tf)) = scene
            .active_entity()
            .and_then(|e| scene.world.get::<Transform>(e).map(|tf| (e, *tf)))
        else {
            self.hot = None;
            if self.dragging {
                self.mouse_released(history);
            }
            return;
        };

        if self.dragging {
            if let Some(index) = self.active {
                let axis = self.gizmos[index].axis;
                let moved = axis.constrain(mouse - self.drag_start);
                let command = if (VT_MOVE..=FREE_MOVE).contains(&index) {
                    let position = moved.extend(0.0) + self.drag_start.extend(0.0) - self.mouse_offset;
                    ChangeVec3Command::new(entity, Vec3Field::Position, position)
                } else {
                    let scale = self.original_scale + (moved * SCALE_SENSITIVITY).extend(0.0);
                    ChangeVec3Command::new(entity, Vec3Field::Scale, scale)
                };
                if history.add_command(scene, command).is_err() {
                    self.mouse_released(history);
                }
            }
            return;
        }

        let zoom = scene.camera.zoom;
        let pos = tf.position.truncate();
        self.hot = self
            .visible_range()
            .find(|&i| self.gizmos[i].hit(mouse, pos, zoom));
    }

    /// Queue the visible handles as textured quads on the top layer.
    pub fn submit(&self, scene: &Scene, render: &mut RenderSystem) -> Result<(), RenderError> {
        let Some(tf) = scene
            .active_entity()
            .and_then(|e| scene.world.get::<Transform>(e))
        else {
            return Ok(());
        };
        let zoom = scene.camera.zoom;
        let pos = tf.position.truncate();

        for index in self.visible_range() {
            let gizmo = &self.gizmos[index];
            let highlighted = self.hot == Some(index) || (self.dragging && self.active == Some(index));
            let color = if highlighted { HOT_TINT } else { Vec3::ONE };
            render.submit(
                Drawable::TexturedQuad {
                    texture: self.texture,
                    size: gizmo.half_size * 2.0 * zoom,
                    position: gizmo.center(pos, zoom),
                    color,
                    uv_min: gizmo.uv_min,
                    uv_max: gizmo.uv_max,
                    rotation: gizmo.rotation,
                },
                GIZMO_Z,
                Layer::Top,
            )?;
        }
        Ok(())
    }
}

// ── Handle art ───────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Shape {
    Square,
    Arrow,
    Knob,
}

/// RGBA8 pixels of the handle sheet. Row 0 is the top of each handle.
fn gizmo_sheet_pixels() -> Vec<u8> {
    const RED: [u8; 3] = [230, 64, 64];
    const GREEN: [u8; 3] = [72, 200, 72];
    const BLUE: [u8; 3] = [80, 128, 232];
    let cells = [
        (Shape::Square, BLUE),
        (Shape::Arrow, RED),
        (Shape::Knob, RED),
        (Shape::Arrow, GREEN),
        (Shape::Knob, GREEN),
    ];

    let mut pixels = vec![0u8; (SHEET_W * SHEET_H * 4) as usize];
    for (cell, (shape, rgb)) in cells.into_iter().enumerate() {
        for y in 0..CELL_H {
            for x in 0..CELL_W {
                if !covers(shape, x, y) {
                    continue;
                }
                let px = cell as u32 * CELL_W + x;
                let i = ((y * SHEET_W + px) * 4) as usize;
                pixels[i..i + 3].copy_from_slice(&rgb);
                pixels[i + 3] = 255;
            }
        }
    }
    pixels
}

fn covers(shape: Shape, x: u32, y: u32) -> bool {
    let shaft = (6..10).contains(&x) && y >= 12;
    match shape {
        // Lower 16×16 of the cell, matching the free handle's hit box.
        Shape::Square => y >= CELL_H - CELL_W,
        Shape::Arrow => {
            let from_center = (x as f32 + 0.5 - CELL_W as f32 / 2.0).abs();
            shaft || (y < 12 && from_center <= (y as f32 + 1.0) * 0.65)
        }
        Shape::Knob => shaft || ((2..14).contains(&x) && y < 12),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render2d::HeadlessBackend;

    fn setup() -> (Scene, CommandHistory, GizmoSystem, Entity) {
        let mut assets = TextureAssets::new();
        let gizmos = GizmoSystem::new(&mut assets).unwrap();
        let mut scene = Scene::new();
        let entity = scene.world.spawn((Transform::from_xy(100.0, 50.0),));
        scene.set_active_entity(Some(entity));
        (scene, CommandHistory::new(), gizmos, entity)
    }

    /// A point inside the hit box of handle `index` for an entity at `pos`.
    fn grab_point(gizmos: &GizmoSystem, index: usize, pos: Vec2) -> Vec2 {
        let g = gizmos.gizmo(index).unwrap();
        g.center(pos, 1.0) + g.hit_offset
    }

    fn position(scene: &Scene, entity: Entity) -> Vec3 {
        scene.world.get::<Transform>(entity).unwrap().position
    }

    #[test]
    fn sheet_has_pixels_for_every_cell() {
        let pixels = gizmo_sheet_pixels();
        assert_eq!(pixels.len(), (SHEET_W * SHEET_H * 4) as usize);
        for cell in 0..5 {
            let opaque = (0..CELL_H).any(|y| {
                (0..CELL_W).any(|x| {
                    let px = cell * CELL_W + x;
                    pixels[((y * SHEET_W + px) * 4 + 3) as usize] == 255
                })
            });
            assert!(opaque, "cell {cell} is empty");
        }
    }

    #[test]
    fn keys_switch_mode() {
        let (.., mut gizmos, _) = setup();
        assert_eq!(gizmos.mode(), GizmoMode::Translate);
        assert!(gizmos.handle_key(KeyCode::KeyS));
        assert_eq!(gizmos.mode(), GizmoMode::Scale);
        assert!(gizmos.handle_key(KeyCode::KeyG));
        assert_eq!(gizmos.mode(), GizmoMode::Translate);
        assert!(!gizmos.handle_key(KeyCode::KeyQ));
    }

    #[test]
    fn hot_handle_follows_mouse() {
        let (mut scene, mut history, mut gizmos, _) = setup();
        let pos = Vec2::new(100.0, 50.0);

        gizmos.update(&mut scene, &mut history, grab_point(&gizmos, HZ_MOVE, pos));
        assert_eq!(gizmos.hot(), Some(HZ_MOVE));

        gizmos.update(&mut scene, &mut history, Vec2::new(-500.0, -500.0));
        assert_eq!(gizmos.hot(), None);
    }

    #[test]
    fn horizontal_drag_moves_x_only_and_is_one_undo_entry() {
        let (mut scene, mut history, mut gizmos, entity) = setup();
        let pos = Vec2::new(100.0, 50.0);
        let start = grab_point(&gizmos, HZ_MOVE, pos);

        gizmos.update(&mut scene, &mut history, start);
        gizmos.mouse_pressed(&mut scene, start, None);
        assert!(gizmos.is_dragging());
        assert_eq!(scene.active_entity(), Some(entity));

        for step in 1..=5 {
            let mouse = start + Vec2::new(step as f32 * 10.0, step as f32 * 3.0);
            gizmos.update(&mut scene, &mut history, mouse);
        }
        gizmos.mouse_released(&mut history);

        assert_eq!(position(&scene, entity), Vec3::new(150.0, 50.0, 0.0));
        assert_eq!(history.undo_len(), 1);

        assert!(history.undo(&mut scene));
        assert_eq!(position(&scene, entity), Vec3::new(100.0, 50.0, 0.0));
    }

    #[test]
    fn second_drag_is_a_separate_entry() {
        let (mut scene, mut history, mut gizmos, entity) = setup();
        for round in 0..2 {
            let pos = position(&scene, entity).truncate();
            let start = grab_point(&gizmos, FREE_MOVE, pos);
            gizmos.update(&mut scene, &mut history, start);
            gizmos.mouse_pressed(&mut scene, start, None);
            gizmos.update(&mut scene, &mut history, start + Vec2::new(4.0, 6.0));
            gizmos.mouse_released(&mut history);
            assert_eq!(history.undo_len(), round + 1);
        }
        assert_eq!(position(&scene, entity), Vec3::new(108.0, 62.0, 0.0));
    }

    #[test]
    fn vertical_scale_uses_sensitivity() {
        let (mut scene, mut history, mut gizmos, entity) = setup();
        gizmos.handle_key(KeyCode::KeyS);
        let start = grab_point(&gizmos, VT_SCALE, Vec2::new(100.0, 50.0));

        gizmos.update(&mut scene, &mut history, start);
        assert_eq!(gizmos.hot(), Some(VT_SCALE));
        gizmos.mouse_pressed(&mut scene, start, None);
        gizmos.update(&mut scene, &mut history, start + Vec2::new(20.0, 10.0));
        gizmos.mouse_released(&mut history);

        let scale = scene.world.get::<Transform>(entity).unwrap().scale;
        assert_eq!(scale, Vec3::new(1.0, 3.0, 1.0));
    }

    #[test]
    fn click_away_selects_picked_entity_or_clears() {
        let (mut scene, mut history, mut gizmos, _) = setup();
        let other = scene.world.spawn((Transform::from_xy(-300.0, 0.0),));

        gizmos.update(&mut scene, &mut history, Vec2::new(-300.0, 0.0));
        gizmos.mouse_pressed(&mut scene, Vec2::new(-300.0, 0.0), Some(other));
        assert_eq!(scene.active_entity(), Some(other));
        assert!(!gizmos.is_dragging());

        gizmos.update(&mut scene, &mut history, Vec2::new(900.0, 900.0));
        gizmos.mouse_pressed(&mut scene, Vec2::new(900.0, 900.0), None);
        assert_eq!(scene.active_entity(), None);
        assert_eq!(history.undo_len(), 0);
    }

    #[test]
    fn submit_draws_three_handles_on_top_with_hot_tint() {
        let (mut scene, mut history, mut gizmos, _) = setup();
        let start = grab_point(&gizmos, VT_MOVE, Vec2::new(100.0, 50.0));
        gizmos.update(&mut scene, &mut history, start);

        let mut render = RenderSystem::new(16);
        render.begin_frame();
        gizmos.submit(&scene, &mut render).unwrap();

        let mut backend = HeadlessBackend::new();
        assert_eq!(render.render(&mut backend, Layer::Bottom).unwrap().quads, 0);
        let stats = render.render(&mut backend, Layer::Top).unwrap();
        assert_eq!(stats.quads, 3);
        assert_eq!(stats.draw_calls, 1);

        let tinted = render.batches()[0]
            .vertices()
            .iter()
            .filter(|v| v.color[0] == 0.4)
            .count();
        assert_eq!(tinted, 4);
    }

    #[test]
    fn nothing_drawn_without_active_entity() {
        let (mut scene, _, gizmos, _) = setup();
        scene.set_active_entity(None);
        let mut render = RenderSystem::new(16);
        gizmos.submit(&scene, &mut render).unwrap();
        assert!(render.batches().is_empty());
    }
}
