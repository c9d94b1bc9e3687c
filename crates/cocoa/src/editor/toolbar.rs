//! Top toolbar: undo/redo, save/load, play/stop, gizmo mode.

use super::{EditorAction, GizmoMode};

/// What the toolbar needs to know to enable its buttons.
pub(crate) struct ToolbarStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub playing: bool,
    pub mode: GizmoMode,
}

/// Draw the toolbar. Returns the clicked action, if any.
pub(crate) fn toolbar_panel(ctx: &egui::Context, status: &ToolbarStatus) -> Option<EditorAction> {
    let mut action = None;
    egui::TopBottomPanel::top("editor_toolbar").show(ctx, |ui| {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.label("cocoa");
            ui.separator();

            let editing = !status.playing;
            if ui
                .add_enabled(editing && status.can_undo, egui::Button::new("Undo"))
                .on_hover_text("Ctrl+Z")
                .clicked()
            {
                action = Some(EditorAction::Undo);
            }
            if ui
                .add_enabled(editing && status.can_redo, egui::Button::new("Redo"))
                .on_hover_text("Ctrl+Y")
                .clicked()
            {
                action = Some(EditorAction::Redo);
            }

            ui.separator();

            if ui.button("Save").on_hover_text("Ctrl+S").clicked() {
                action = Some(EditorAction::Save);
            }
            if ui.button("Load").clicked() {
                action = Some(EditorAction::Load);
            }

            ui.separator();

            let play_label = if status.playing { "Stop" } else { "Play" };
            if ui.button(play_label).clicked() {
                action = Some(EditorAction::TogglePlay);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let mode = match status.mode {
                    GizmoMode::Translate => "Move (G)",
                    GizmoMode::Scale => "Scale (S)",
                };
                ui.label(format!("{mode}  |  F12 to hide"));
            });
        });
    });
    action
}
