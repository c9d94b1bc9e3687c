//! # Level Editor
//!
//! [`LevelEditor`] is the context object the app hands to every editing
//! path: it owns the command history, the gizmos, the open project, and the
//! engine settings. The scene and the texture store live next to it in the
//! app and are passed in, so the same editor logic runs headless in tests.
//!
//! ## Play mode
//!
//! ```text
//! start_play   snapshot = scene.save()   physics world built from scene
//! update       physics.step(scene, dt)   gizmos hidden, edits ignored
//! stop_play    scene.load(snapshot)      history cleared (entity ids changed)
//! ```
//!
//! With the `editor` feature an egui overlay (toolbar, hierarchy,
//! inspector) is layered on top; see [`EditorOverlay`].

pub mod gizmo;

#[cfg(feature = "editor")]
mod hierarchy;
#[cfg(feature = "editor")]
mod inspector;
#[cfg(feature = "editor")]
mod overlay;
#[cfg(feature = "editor")]
mod toolbar;

#[cfg(feature = "editor")]
pub use overlay::EditorOverlay;

use std::path::PathBuf;

pub use gizmo::{GizmoAxis, GizmoMode, GizmoSystem};

use crate::asset::{AssetError, TextureAssets};
use crate::commands::{CommandError, CommandHistory, SceneCommand};
use crate::ecs::Entity;
use crate::input::{KeyCode, Modifiers};
use crate::math::Vec2;
#[cfg(feature = "physics2d")]
use crate::physics2d::PhysicsWorld2d;
use crate::project::ProjectData;
use crate::render2d::{RenderError, RenderSystem};
use crate::scene::{Scene, SceneData, SceneError};
use crate::settings::EngineSettings;

/// Used when the project names no current scene.
pub const DEFAULT_SCENE_FILE: &str = "scene.json";

/// Requests raised by toolbar buttons, applied after the UI pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Undo,
    Redo,
    Save,
    Load,
    TogglePlay,
}

struct PlaySession {
    snapshot: SceneData,
    #[cfg(feature = "physics2d")]
    physics: PhysicsWorld2d,
}

pub struct LevelEditor {
    pub history: CommandHistory,
    pub gizmos: GizmoSystem,
    pub project: ProjectData,
    pub settings: EngineSettings,
    play: Option<PlaySession>,
}

impl LevelEditor {
    pub fn new(settings: EngineSettings, assets: &mut TextureAssets) -> Result<Self, AssetError> {
        Ok(Self {
            history: CommandHistory::new(),
            gizmos: GizmoSystem::new(assets)?,
            project: ProjectData::default(),
            settings,
            play: None,
        })
    }

    pub fn with_project(mut self, project: ProjectData) -> Self {
        self.project = project;
        self
    }

    pub fn is_playing(&self) -> bool {
        self.play.is_some()
    }

    // ── Editing ──────────────────────────────────────────────────────────

    /// Execute an edit through the history. Ignored while playing.
    pub fn apply(&mut self, scene: &mut Scene, command: impl Into<SceneCommand>) -> Result<(), CommandError> {
        if self.is_playing() {
            return Ok(());
        }
        self.history.add_command(scene, command)
    }

    /// The current continuous edit (a drag) is finished.
    pub fn end_edit(&mut self) {
        self.history.set_no_merge_most_recent();
    }

    /// Undo one step. The next edit starts a new entry rather than merging
    /// into the one now on top.
    pub fn undo(&mut self, scene: &mut Scene) -> bool {
        if self.is_playing() {
            return false;
        }
        let undone = self.history.undo(scene);
        self.end_edit();
        undone
    }

    pub fn redo(&mut self, scene: &mut Scene) -> bool {
        if self.is_playing() {
            return false;
        }
        let redone = self.history.redo(scene);
        self.end_edit();
        redone
    }

    /// Keyboard shortcuts. Returns whether the key was handled.
    ///
    /// Ctrl+Z undoes, Ctrl+Y and Ctrl+Shift+Z redo, Ctrl+S saves. Without a
    /// modifier G and S switch the gizmo mode.
    pub fn handle_key(
        &mut self,
        scene: &mut Scene,
        assets: &TextureAssets,
        key: KeyCode,
        modifiers: Modifiers,
    ) -> bool {
        if modifiers.ctrl {
            match key {
                KeyCode::KeyZ if modifiers.shift => {
                    self.redo(scene);
                }
                KeyCode::KeyZ => {
                    self.undo(scene);
                }
                KeyCode::KeyY => {
                    self.redo(scene);
                }
                KeyCode::KeyS => {
                    if let Err(e) = self.save_scene(scene, assets) {
                        log::error!("save failed: {e}");
                    }
                }
                _ => return false,
            }
            return true;
        }
        !self.is_playing() && self.gizmos.handle_key(key)
    }

    // ── Viewport ─────────────────────────────────────────────────────────

    pub fn mouse_pressed(&mut self, scene: &mut Scene, mouse_world: Vec2, picked: Option<Entity>) {
        if self.is_playing() {
            scene.set_active_entity(picked);
            return;
        }
        self.gizmos.mouse_pressed(scene, mouse_world, picked);
    }

    pub fn mouse_released(&mut self) {
        self.gizmos.mouse_released(&mut self.history);
    }

    /// Per-frame step: physics while playing, gizmo dragging otherwise.
    #[cfg_attr(not(feature = "physics2d"), allow(unused_variables))]
    pub fn update(&mut self, scene: &mut Scene, mouse_world: Vec2, dt: f32) {
        match &mut self.play {
            Some(session) => {
                #[cfg(feature = "physics2d")]
                session.physics.step(scene, dt);
            }
            None => self.gizmos.update(scene, &mut self.history, mouse_world),
        }
    }

    /// Queue the scene sprites, then the gizmos unless playing.
    pub fn submit(&self, scene: &Scene, render: &mut RenderSystem) -> Result<usize, RenderError> {
        let sprites = render.submit_scene(scene)?;
        if !self.is_playing() {
            self.gizmos.submit(scene, render)?;
        }
        Ok(sprites)
    }

    // ── Play mode ────────────────────────────────────────────────────────

    pub fn start_play(&mut self, scene: &mut Scene, assets: &TextureAssets) {
        if self.is_playing() {
            return;
        }
        self.gizmos.mouse_released(&mut self.history);
        let snapshot = scene.save(assets);
        #[cfg(feature = "physics2d")]
        let physics = {
            let mut physics = PhysicsWorld2d::new(&self.settings.physics);
            physics.add_scene(scene);
            physics
        };
        self.play = Some(PlaySession {
            snapshot,
            #[cfg(feature = "physics2d")]
            physics,
        });
        log::info!("play mode started");
    }

    /// Restore the scene as it was when play started.
    pub fn stop_play(&mut self, scene: &mut Scene, assets: &mut TextureAssets) {
        let Some(session) = self.play.take() else {
            return;
        };
        let camera = scene.camera;
        scene.load(&session.snapshot, assets);
        scene.camera = camera;
        self.history.clear();
        log::info!("play mode stopped");
    }

    pub fn toggle_play(&mut self, scene: &mut Scene, assets: &mut TextureAssets) {
        if self.is_playing() {
            self.stop_play(scene, assets);
        } else {
            self.start_play(scene, assets);
        }
    }

    // ── Files ────────────────────────────────────────────────────────────

    pub fn scene_path(&self) -> PathBuf {
        self.project
            .current_scene_path()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCENE_FILE))
    }

    /// Write the scene to [`scene_path`](Self::scene_path). While playing,
    /// the pre-play snapshot is written instead of the simulated state.
    pub fn save_scene(&self, scene: &Scene, assets: &TextureAssets) -> Result<PathBuf, SceneError> {
        let path = self.scene_path();
        match &self.play {
            Some(session) => session.snapshot.write_to_file(&path)?,
            None => scene.save_to_file(assets, &path)?,
        }
        Ok(path)
    }

    /// Replace the scene with the file at [`scene_path`](Self::scene_path).
    /// On success play mode ends and the history is cleared; a failed load
    /// changes nothing.
    pub fn load_scene(&mut self, scene: &mut Scene, assets: &mut TextureAssets) -> Result<usize, SceneError> {
        let path = self.scene_path();
        let entities = scene.load_from_file(assets, &path)?;
        if self.play.take().is_some() {
            log::info!("play mode ended by scene load");
        }
        self.history.clear();
        Ok(entities.len())
    }

    /// Run a toolbar request. File errors are logged.
    pub fn perform(&mut self, action: EditorAction, scene: &mut Scene, assets: &mut TextureAssets) {
        match action {
            EditorAction::Undo => {
                self.undo(scene);
            }
            EditorAction::Redo => {
                self.redo(scene);
            }
            EditorAction::Save => {
                if let Err(e) = self.save_scene(scene, assets) {
                    log::error!("save failed: {e}");
                }
            }
            EditorAction::Load => {
                if let Err(e) = self.load_scene(scene, assets) {
                    log::error!("load failed: {e}");
                }
            }
            EditorAction::TogglePlay => self.toggle_play(scene, assets),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{ChangeVec3Command, Vec3Field};
    use crate::components::{Sprite, SpriteRenderer};
    use crate::math::{Transform, Vec3};

    const CTRL: Modifiers = Modifiers { ctrl: true, shift: false };
    const CTRL_SHIFT: Modifiers = Modifiers { ctrl: true, shift: true };

    fn setup() -> (LevelEditor, Scene, TextureAssets, Entity) {
        let mut assets = TextureAssets::new();
        let editor = LevelEditor::new(EngineSettings::default(), &mut assets).unwrap();
        let mut scene = Scene::new();
        let entity = scene
            .world
            .spawn((Transform::from_xy(0.0, 0.0), SpriteRenderer::colored(1.0, 0.0, 0.0, 1.0)));
        (editor, scene, assets, entity)
    }

    fn x(scene: &Scene, entity: Entity) -> f32 {
        scene.world.get::<Transform>(entity).unwrap().position.x
    }

    #[test]
    fn shortcuts_undo_and_redo() {
        let (mut editor, mut scene, assets, entity) = setup();
        editor
            .apply(&mut scene, ChangeVec3Command::new(entity, Vec3Field::Position, Vec3::new(5.0, 0.0, 0.0)))
            .unwrap();

        assert!(editor.handle_key(&mut scene, &assets, KeyCode::KeyZ, CTRL));
        assert_eq!(x(&scene, entity), 0.0);
        assert!(editor.handle_key(&mut scene, &assets, KeyCode::KeyY, CTRL));
        assert_eq!(x(&scene, entity), 5.0);
        editor.handle_key(&mut scene, &assets, KeyCode::KeyZ, CTRL);
        assert!(editor.handle_key(&mut scene, &assets, KeyCode::KeyZ, CTRL_SHIFT));
        assert_eq!(x(&scene, entity), 5.0);
    }

    #[test]
    fn plain_keys_go_to_gizmos() {
        let (mut editor, mut scene, assets, _) = setup();
        assert!(editor.handle_key(&mut scene, &assets, KeyCode::KeyS, Modifiers::default()));
        assert_eq!(editor.gizmos.mode(), GizmoMode::Scale);
        assert!(!editor.handle_key(&mut scene, &assets, KeyCode::KeyP, Modifiers::default()));
    }

    #[test]
    fn stop_play_restores_snapshot_and_clears_history() {
        let (mut editor, mut scene, mut assets, entity) = setup();
        editor
            .apply(&mut scene, ChangeVec3Command::new(entity, Vec3Field::Position, Vec3::new(3.0, 0.0, 0.0)))
            .unwrap();

        editor.start_play(&mut scene, &assets);
        assert!(editor.is_playing());
        scene.world.get_mut::<Transform>(entity).unwrap().position.x = 99.0;
        assert!(!editor.undo(&mut scene));

        editor.stop_play(&mut scene, &mut assets);
        assert!(!editor.is_playing());
        assert!(!editor.history.can_undo());
        let restored = scene.world.entities();
        assert_eq!(restored.len(), 1);
        assert_eq!(x(&scene, restored[0]), 3.0);
    }

    #[test]
    fn edit_after_undo_starts_new_entry() {
        let (mut editor, mut scene, assets, entity) = setup();
        let move_to = |x: f32| ChangeVec3Command::new(entity, Vec3Field::Position, Vec3::new(x, 0.0, 0.0));
        editor.apply(&mut scene, move_to(5.0)).unwrap();
        editor.end_edit();
        editor.apply(&mut scene, move_to(6.0)).unwrap();

        assert!(editor.handle_key(&mut scene, &assets, KeyCode::KeyZ, CTRL));
        assert_eq!(x(&scene, entity), 5.0);
        editor.apply(&mut scene, move_to(8.0)).unwrap();
        assert_eq!(editor.history.undo_len(), 2);

        editor.undo(&mut scene);
        assert_eq!(x(&scene, entity), 5.0);
    }

    #[test]
    fn stop_play_keeps_generated_textures() {
        let (mut editor, mut scene, mut assets, _) = setup();
        let checker = assets.from_rgba("checker", 2, 1, vec![200; 8]).unwrap();
        let textured = scene.world.spawn((
            Transform::from_xy(4.0, 0.0),
            SpriteRenderer::textured(Sprite::new(checker, 16.0, 16.0)),
        ));
        scene.world.name_entity(textured, "crate");

        editor.start_play(&mut scene, &assets);
        editor.stop_play(&mut scene, &mut assets);

        let restored = scene.world.try_named("crate").unwrap();
        let renderer = scene.world.get::<SpriteRenderer>(restored).unwrap();
        assert_eq!(renderer.sprite.texture, Some(checker));
    }

    #[test]
    fn failed_load_keeps_play_session() {
        let (mut editor, mut scene, mut assets, entity) = setup();
        editor.project = ProjectData {
            current_scene: "cocoa_no_such_scene.json".into(),
            working_directory: std::env::temp_dir().join("cocoa_missing_dir").display().to_string(),
            ..Default::default()
        };

        editor.start_play(&mut scene, &assets);
        scene.world.get_mut::<Transform>(entity).unwrap().position.x = 99.0;
        assert!(matches!(
            editor.load_scene(&mut scene, &mut assets),
            Err(SceneError::Io { .. })
        ));
        assert!(editor.is_playing());

        editor.stop_play(&mut scene, &mut assets);
        let restored = scene.world.entities();
        assert_eq!(restored.len(), 1);
        assert_eq!(x(&scene, restored[0]), 0.0);
    }

    #[test]
    fn update_while_playing_records_no_edits() {
        let (mut editor, mut scene, mut assets, entity) = setup();
        scene.set_active_entity(Some(entity));
        editor.start_play(&mut scene, &assets);
        for _ in 0..3 {
            editor.update(&mut scene, Vec2::new(50.0, 50.0), 1.0 / 60.0);
        }
        assert!(!editor.history.can_undo());
        editor.stop_play(&mut scene, &mut assets);
        assert_eq!(scene.world.entities().len(), 1);
    }

    #[test]
    fn submit_hides_gizmos_while_playing() {
        let (mut editor, mut scene, mut assets, entity) = setup();
        scene.set_active_entity(Some(entity));
        let mut render = RenderSystem::new(100);

        render.begin_frame();
        assert_eq!(editor.submit(&scene, &mut render).unwrap(), 1);
        let queued: usize = render.batches().iter().map(|b| b.len()).sum();
        assert_eq!(queued, 4);

        editor.toggle_play(&mut scene, &mut assets);
        render.begin_frame();
        editor.submit(&scene, &mut render).unwrap();
        let queued: usize = render.batches().iter().map(|b| b.len()).sum();
        assert_eq!(queued, 1);
    }

    #[test]
    fn save_and_load_through_project_path() {
        let (mut editor, mut scene, mut assets, entity) = setup();
        let dir = std::env::temp_dir();
        editor.project = ProjectData {
            current_scene: "cocoa_editor_scene.json".into(),
            working_directory: dir.display().to_string(),
            ..Default::default()
        };
        editor
            .apply(&mut scene, ChangeVec3Command::new(entity, Vec3Field::Position, Vec3::new(7.0, 0.0, 0.0)))
            .unwrap();

        let path = editor.save_scene(&scene, &assets).unwrap();
        assert_eq!(path, dir.join("cocoa_editor_scene.json"));

        scene.world.clear_entities();
        assert_eq!(editor.load_scene(&mut scene, &mut assets).unwrap(), 1);
        assert!(!editor.history.can_undo());
        let loaded = scene.world.entities()[0];
        assert_eq!(x(&scene, loaded), 7.0);
    }
}
