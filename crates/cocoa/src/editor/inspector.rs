//! Component inspector on the right.
//!
//! Fields are edited on copies; every change becomes a command so it can be
//! undone. A `DragValue` reports a change on every frame of a drag, and the
//! history merges those into one entry until the drag stops.

use crate::commands::{
    ChangeEnumCommand, ChangeFloatCommand, ChangeVec2Command, ChangeVec3Command,
    ChangeVec4Command, EnumField, FloatField, SceneCommand, Vec2Field, Vec3Field, Vec4Field,
};
use crate::components::{BodyType2D, Box2D, Rigidbody2D, SpriteRenderer};
use crate::ecs::{Entity, World};
use crate::math::{Transform, Vec4};

const AXES: [&str; 4] = ["X: ", "Y: ", "Z: ", "W: "];

/// Edits requested by the inspector this frame.
#[derive(Default)]
pub(crate) struct InspectorEdits {
    pub commands: Vec<SceneCommand>,
    /// A drag ended or a text edit lost focus.
    pub finished: bool,
}

impl InspectorEdits {
    fn push(&mut self, command: impl Into<SceneCommand>) {
        self.commands.push(command.into());
    }

    fn track(&mut self, response: &egui::Response) -> bool {
        if response.drag_stopped() || response.lost_focus() {
            self.finished = true;
        }
        response.changed()
    }
}

/// A row of drag values, one per component. Returns whether any changed.
fn drag_row(
    ui: &mut egui::Ui,
    edits: &mut InspectorEdits,
    label: &str,
    values: &mut [&mut f32],
    speed: f64,
) -> bool {
    let mut changed = false;
    ui.label(label);
    ui.horizontal(|ui| {
        for (value, prefix) in values.iter_mut().zip(AXES) {
            let response = ui.add(egui::DragValue::new(&mut **value).speed(speed).prefix(prefix));
            changed |= edits.track(&response);
        }
    });
    changed
}

fn drag_one(ui: &mut egui::Ui, edits: &mut InspectorEdits, label: &str, value: &mut f32, speed: f64) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        let response = ui.add(egui::DragValue::new(value).speed(speed));
        edits.track(&response)
    })
    .inner
}

/// Draw the inspector for `selected` and collect the requested edits.
pub(crate) fn inspector_panel(
    ctx: &egui::Context,
    world: &World,
    selected: Option<Entity>,
) -> InspectorEdits {
    let mut edits = InspectorEdits::default();

    egui::SidePanel::right("inspector_panel")
        .default_width(280.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.heading("Inspector");
            ui.separator();

            let Some(entity) = selected.filter(|&e| world.is_alive(e)) else {
                ui.label("No entity selected");
                return;
            };

            ui.label(format!("Entity {entity}"));
            if let Some(name) = world.entity_name(entity) {
                ui.label(format!("Name: {name}"));
            }
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                if let Some(tf) = world.get::<Transform>(entity) {
                    transform_section(ui, &mut edits, entity, *tf);
                }
                if let Some(sr) = world.get::<SpriteRenderer>(entity) {
                    sprite_section(ui, &mut edits, entity, *sr);
                }
                if let Some(rb) = world.get::<Rigidbody2D>(entity) {
                    rigidbody_section(ui, &mut edits, entity, *rb);
                }
                if let Some(b) = world.get::<Box2D>(entity) {
                    box_section(ui, &mut edits, entity, *b);
                }
            });
        });

    edits
}

fn transform_section(ui: &mut egui::Ui, edits: &mut InspectorEdits, entity: Entity, tf: Transform) {
    egui::CollapsingHeader::new("Transform")
        .default_open(true)
        .show(ui, |ui| {
            let mut p = tf.position;
            if drag_row(ui, edits, "Position", &mut [&mut p.x, &mut p.y, &mut p.z], 1.0) {
                edits.push(ChangeVec3Command::new(entity, Vec3Field::Position, p));
            }
            let mut s = tf.scale;
            if drag_row(ui, edits, "Scale", &mut [&mut s.x, &mut s.y, &mut s.z], 0.01) {
                edits.push(ChangeVec3Command::new(entity, Vec3Field::Scale, s));
            }
            let mut r = tf.euler_rotation;
            if drag_row(ui, edits, "Rotation (deg)", &mut [&mut r.x, &mut r.y, &mut r.z], 0.5) {
                edits.push(ChangeVec3Command::new(entity, Vec3Field::EulerRotation, r));
            }
        });
}

fn sprite_section(ui: &mut egui::Ui, edits: &mut InspectorEdits, entity: Entity, sr: SpriteRenderer) {
    egui::CollapsingHeader::new("Sprite Renderer")
        .default_open(true)
        .show(ui, |ui| {
            let mut c = sr.color;
            if drag_row(ui, edits, "Color", &mut [&mut c.x, &mut c.y, &mut c.z, &mut c.w], 0.01) {
                edits.push(ChangeVec4Command::new(
                    entity,
                    Vec4Field::SpriteColor,
                    c.clamp(Vec4::ZERO, Vec4::ONE),
                ));
            }
            let mut w = sr.sprite.width;
            if drag_one(ui, edits, "Width", &mut w, 0.5) {
                edits.push(ChangeFloatCommand::new(entity, FloatField::SpriteWidth, w));
            }
            let mut h = sr.sprite.height;
            if drag_one(ui, edits, "Height", &mut h, 0.5) {
                edits.push(ChangeFloatCommand::new(entity, FloatField::SpriteHeight, h));
            }
            ui.label(format!("z-index: {}", sr.z_index));
            ui.label(match sr.sprite.texture {
                Some(texture) => format!("Texture #{}", texture.id()),
                None => "Untextured".to_owned(),
            });
        });
}

fn rigidbody_section(ui: &mut egui::Ui, edits: &mut InspectorEdits, entity: Entity, rb: Rigidbody2D) {
    egui::CollapsingHeader::new("Rigidbody 2D")
        .default_open(true)
        .show(ui, |ui| {
            let mut body_type = rb.body_type;
            egui::ComboBox::from_label("Body Type")
                .selected_text(body_type.label())
                .show_ui(ui, |ui| {
                    for option in BodyType2D::ALL {
                        ui.selectable_value(&mut body_type, option, option.label());
                    }
                });
            if body_type != rb.body_type {
                edits.push(ChangeEnumCommand::new(entity, EnumField::BodyType, body_type));
                edits.finished = true;
            }

            let mut v = rb.velocity;
            if drag_row(ui, edits, "Velocity", &mut [&mut v.x, &mut v.y], 0.1) {
                edits.push(ChangeVec2Command::new(entity, Vec2Field::Velocity, v));
            }
            let mut mass = rb.mass;
            if drag_one(ui, edits, "Mass", &mut mass, 0.05) {
                edits.push(ChangeFloatCommand::new(entity, FloatField::Mass, mass.max(0.0)));
            }
            let mut linear = rb.linear_damping;
            if drag_one(ui, edits, "Linear Damping", &mut linear, 0.01) {
                edits.push(ChangeFloatCommand::new(entity, FloatField::LinearDamping, linear.max(0.0)));
            }
            let mut angular = rb.angular_damping;
            if drag_one(ui, edits, "Angular Damping", &mut angular, 0.01) {
                edits.push(ChangeFloatCommand::new(entity, FloatField::AngularDamping, angular.max(0.0)));
            }
        });
}

fn box_section(ui: &mut egui::Ui, edits: &mut InspectorEdits, entity: Entity, b: Box2D) {
    egui::CollapsingHeader::new("Box Collider 2D")
        .default_open(true)
        .show(ui, |ui| {
            let mut size = b.size;
            if drag_row(ui, edits, "Size", &mut [&mut size.x, &mut size.y], 0.5) {
                edits.push(ChangeVec2Command::new(entity, Vec2Field::BoxSize, size));
            }
            let mut half = b.half_size;
            if drag_row(ui, edits, "Half Size", &mut [&mut half.x, &mut half.y], 0.25) {
                edits.push(ChangeVec2Command::new(entity, Vec2Field::BoxHalfSize, half));
            }
            let mut offset = b.offset;
            if drag_row(ui, edits, "Offset", &mut [&mut offset.x, &mut offset.y], 0.5) {
                edits.push(ChangeVec2Command::new(entity, Vec2Field::BoxOffset, offset));
            }
        });
}
