//! Entity list on the left. Clicking an entry makes it the active entity.

use crate::ecs::{Entity, World};

/// Draw the hierarchy panel. Returns the selection after this frame.
pub(crate) fn hierarchy_panel(
    ctx: &egui::Context,
    world: &World,
    selected: Option<Entity>,
) -> Option<Entity> {
    let mut new_selected = selected;

    egui::SidePanel::left("hierarchy_panel")
        .default_width(200.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.heading("Hierarchy");
            ui.label(format!("{} entities", world.entity_count()));
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                for entity in world.entities() {
                    let label = display_name(world, entity);
                    if ui
                        .selectable_label(selected == Some(entity), label)
                        .clicked()
                    {
                        new_selected = Some(entity);
                    }
                }
            });
        });

    new_selected
}

fn display_name(world: &World, entity: Entity) -> String {
    match world.entity_name(entity) {
        Some(name) => format!("{name} ({})", entity.index()),
        None => format!("Entity {}", entity.index()),
    }
}
