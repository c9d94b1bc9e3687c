//! Undo/redo stacks.

use crate::scene::Scene;

use super::{Command, CommandError, SceneCommand};

/// Undo and redo stacks plus the no-merge flag.
///
/// `add_command` executes the command right away. Consecutive commands that
/// target the same field collapse into one entry until
/// [`set_no_merge_most_recent`](Self::set_no_merge_most_recent) is called
/// (the editor does this on mouse release).
#[derive(Debug)]
pub struct CommandHistory<C: Command = SceneCommand> {
    undo_stack: Vec<C>,
    redo_stack: Vec<C>,
    no_merge: bool,
}

impl<C: Command> Default for CommandHistory<C> {
    fn default() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            no_merge: false,
        }
    }
}

impl<C: Command> CommandHistory<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute `command` and record it.
    ///
    /// A command whose target cannot be resolved is not recorded, and the
    /// history is left untouched.
    pub fn add_command(&mut self, scene: &mut Scene, command: impl Into<C>) -> Result<(), CommandError> {
        let mut command = command.into();
        if let Err(e) = command.execute(scene) {
            log::warn!("command rejected: {e}");
            return Err(e);
        }

        let merged = !self.no_merge
            && self
                .undo_stack
                .last_mut()
                .is_some_and(|top| top.try_merge(&command));
        if !merged {
            self.undo_stack.push(command);
        }
        self.no_merge = false;
        self.redo_stack.clear();
        Ok(())
    }

    /// Undo the most recent entry. Returns whether a step happened.
    ///
    /// An entry whose target is gone is dropped with a warning and nothing
    /// else changes, so one call never undoes more than one entry.
    pub fn undo(&mut self, scene: &mut Scene) -> bool {
        let Some(mut command) = self.undo_stack.pop() else {
            return false;
        };
        match command.undo(scene) {
            Ok(()) => {
                self.redo_stack.push(command);
                true
            }
            Err(e) => {
                log::warn!("dropping undo entry: {e}");
                false
            }
        }
    }

    /// Redo the most recently undone entry.
    pub fn redo(&mut self, scene: &mut Scene) -> bool {
        let Some(mut command) = self.redo_stack.pop() else {
            return false;
        };
        match command.execute(scene) {
            Ok(()) => {
                self.undo_stack.push(command);
                true
            }
            Err(e) => {
                log::warn!("dropping redo entry: {e}");
                false
            }
        }
    }

    /// The next `add_command` starts a new entry instead of merging.
    pub fn set_no_merge_most_recent(&mut self) {
        self.no_merge = true;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Forget everything, e.g. after loading another scene.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.no_merge = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{ChangeFloatCommand, ChangeVec3Command, FloatField, Vec3Field};
    use crate::components::Rigidbody2D;
    use crate::ecs::Entity;
    use crate::math::{Transform, Vec3};

    fn scene_with_body() -> (Scene, Entity) {
        let mut scene = Scene::new();
        let e = scene.world.spawn((
            Transform::default(),
            Rigidbody2D {
                mass: 0.0,
                ..Default::default()
            },
        ));
        (scene, e)
    }

    fn mass(scene: &Scene, e: Entity) -> f32 {
        scene.world.get::<Rigidbody2D>(e).unwrap().mass
    }

    fn position(scene: &Scene, e: Entity) -> Vec3 {
        scene.world.get::<Transform>(e).unwrap().position
    }

    #[test]
    fn merged_float_edits_undo_in_one_step() {
        let (mut scene, e) = scene_with_body();
        let mut history = CommandHistory::<SceneCommand>::new();
        history
            .add_command(&mut scene, ChangeFloatCommand::new(e, FloatField::Mass, 5.0))
            .unwrap();
        history
            .add_command(&mut scene, ChangeFloatCommand::new(e, FloatField::Mass, 10.0))
            .unwrap();
        assert_eq!(mass(&scene, e), 10.0);
        assert_eq!(history.undo_len(), 1);

        assert!(history.undo(&mut scene));
        assert_eq!(mass(&scene, e), 0.0);
        assert!(!history.can_undo());
    }

    #[test]
    fn drag_sequence_merges_until_no_merge() {
        let (mut scene, e) = scene_with_body();
        let mut history = CommandHistory::<SceneCommand>::new();
        for x in 1..=5 {
            history
                .add_command(
                    &mut scene,
                    ChangeVec3Command::new(e, Vec3Field::Position, Vec3::new(x as f32, 0.0, 0.0)),
                )
                .unwrap();
        }
        assert_eq!(history.undo_len(), 1);

        history.set_no_merge_most_recent();
        history
            .add_command(&mut scene, ChangeVec3Command::new(e, Vec3Field::Position, Vec3::new(9.0, 0.0, 0.0)))
            .unwrap();
        assert_eq!(history.undo_len(), 2);

        history.undo(&mut scene);
        assert_eq!(position(&scene, e), Vec3::new(5.0, 0.0, 0.0));
        history.undo(&mut scene);
        assert_eq!(position(&scene, e), Vec3::ZERO);
    }

    #[test]
    fn no_merge_flag_is_consumed_by_one_add() {
        let (mut scene, e) = scene_with_body();
        let mut history = CommandHistory::<SceneCommand>::new();
        history
            .add_command(&mut scene, ChangeFloatCommand::new(e, FloatField::Mass, 1.0))
            .unwrap();
        history.set_no_merge_most_recent();
        history
            .add_command(&mut scene, ChangeFloatCommand::new(e, FloatField::Mass, 2.0))
            .unwrap();
        history
            .add_command(&mut scene, ChangeFloatCommand::new(e, FloatField::Mass, 3.0))
            .unwrap();
        assert_eq!(history.undo_len(), 2);
    }

    #[test]
    fn undo_then_redo_restores_state() {
        let (mut scene, e) = scene_with_body();
        let mut history = CommandHistory::<SceneCommand>::new();
        history
            .add_command(&mut scene, ChangeVec3Command::new(e, Vec3Field::Scale, Vec3::splat(2.0)))
            .unwrap();
        history.set_no_merge_most_recent();
        history
            .add_command(&mut scene, ChangeFloatCommand::new(e, FloatField::LinearDamping, 0.1))
            .unwrap();
        let before = (*scene.world.get::<Transform>(e).unwrap(), *scene.world.get::<Rigidbody2D>(e).unwrap());

        assert!(history.undo(&mut scene));
        assert!(history.redo(&mut scene));
        let after = (*scene.world.get::<Transform>(e).unwrap(), *scene.world.get::<Rigidbody2D>(e).unwrap());
        assert_eq!(before, after);
        assert!(!history.can_redo());
    }

    #[test]
    fn empty_stacks_are_no_ops() {
        let (mut scene, _) = scene_with_body();
        let mut history = CommandHistory::<SceneCommand>::new();
        assert!(!history.undo(&mut scene));
        assert!(!history.redo(&mut scene));
    }

    #[test]
    fn new_command_clears_redo() {
        let (mut scene, e) = scene_with_body();
        let mut history = CommandHistory::<SceneCommand>::new();
        history
            .add_command(&mut scene, ChangeFloatCommand::new(e, FloatField::Mass, 1.0))
            .unwrap();
        history.undo(&mut scene);
        assert!(history.can_redo());
        history
            .add_command(&mut scene, ChangeFloatCommand::new(e, FloatField::Mass, 4.0))
            .unwrap();
        assert!(!history.can_redo());
    }

    #[test]
    fn rejected_command_is_not_recorded() {
        let mut scene = Scene::new();
        let bare = scene.world.spawn((Transform::default(),));
        let mut history = CommandHistory::<SceneCommand>::new();
        let err = history
            .add_command(&mut scene, ChangeFloatCommand::new(bare, FloatField::Mass, 1.0))
            .unwrap_err();
        assert!(matches!(err, CommandError::MissingComponent { .. }));
        assert!(!history.can_undo());
    }

    #[test]
    fn stale_entry_is_dropped_without_undoing_the_next() {
        let (mut scene, e) = scene_with_body();
        let other = scene.world.spawn((Transform::default(),));
        let mut history = CommandHistory::<SceneCommand>::new();
        history
            .add_command(&mut scene, ChangeVec3Command::new(other, Vec3Field::Position, Vec3::ONE))
            .unwrap();
        history
            .add_command(&mut scene, ChangeFloatCommand::new(e, FloatField::Mass, 2.0))
            .unwrap();
        scene.world.despawn(e);

        assert!(!history.undo(&mut scene));
        assert_eq!(scene.world.get::<Transform>(other).unwrap().position, Vec3::ONE);
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.redo_len(), 0);

        assert!(history.undo(&mut scene));
        assert_eq!(scene.world.get::<Transform>(other).unwrap().position, Vec3::ZERO);
        assert_eq!(history.redo_len(), 1);
    }

    #[test]
    fn add_after_undo_merges_into_same_field() {
        let (mut scene, e) = scene_with_body();
        let mut history = CommandHistory::<SceneCommand>::new();
        history
            .add_command(&mut scene, ChangeFloatCommand::new(e, FloatField::Mass, 1.0))
            .unwrap();
        history.set_no_merge_most_recent();
        history
            .add_command(&mut scene, ChangeFloatCommand::new(e, FloatField::Mass, 2.0))
            .unwrap();
        assert_eq!(history.undo_len(), 2);

        assert!(history.undo(&mut scene));
        history
            .add_command(&mut scene, ChangeFloatCommand::new(e, FloatField::Mass, 7.0))
            .unwrap();
        assert_eq!(history.undo_len(), 1);
        assert_eq!(mass(&scene, e), 7.0);

        assert!(history.undo(&mut scene));
        assert_eq!(mass(&scene, e), 0.0);
    }
}
