//! 2D physics integration via Rapier.
//!
//! Entities with a [`Transform`] and a [`Rigidbody2D`] (and optionally a
//! [`Box2D`] collider) are registered with [`PhysicsWorld2d::add_entity`] or
//! all at once with [`PhysicsWorld2d::add_scene`]. Each frame
//! [`PhysicsWorld2d::step`] advances the simulation with a fixed timestep and
//! writes position and z rotation back into the transforms.

use std::collections::HashMap;

use rapier2d::prelude::*;

use crate::components::{BodyType2D, Box2D, Rigidbody2D};
use crate::ecs::Entity;
use crate::math::{self, Transform};
use crate::scene::Scene;
use crate::settings::Physics2dSettings;

fn body_type_to_rapier(bt: BodyType2D) -> RigidBodyType {
    match bt {
        BodyType2D::Dynamic => RigidBodyType::Dynamic,
        BodyType2D::Kinematic => RigidBodyType::KinematicPositionBased,
        BodyType2D::Static => RigidBodyType::Fixed,
    }
}

/// The simulation and the entity ↔ body mapping.
pub struct PhysicsWorld2d {
    gravity: Vec2,
    pipeline: PhysicsPipeline,
    params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    settings: Physics2dSettings,
    body_to_entity: HashMap<RigidBodyHandle, Entity>,
    entity_to_body: HashMap<Entity, RigidBodyHandle>,
    accumulator: f32,
}

impl std::fmt::Debug for PhysicsWorld2d {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld2d")
            .field("gravity", &self.settings.gravity)
            .field("bodies", &self.bodies.len())
            .field("colliders", &self.colliders.len())
            .finish()
    }
}

impl PhysicsWorld2d {
    pub fn new(settings: &Physics2dSettings) -> Self {
        let mut params = IntegrationParameters::default();
        params.dt = settings.timestep;
        Self {
            gravity: Vec2::new(settings.gravity[0], settings.gravity[1]),
            pipeline: PhysicsPipeline::new(),
            params,
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            settings: settings.clone(),
            body_to_entity: HashMap::new(),
            entity_to_body: HashMap::new(),
            accumulator: 0.0,
        }
    }

    pub fn settings(&self) -> &Physics2dSettings {
        &self.settings
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entity_to_body.contains_key(&entity)
    }

    /// Create a body (and a cuboid collider when `box_collider` is given)
    /// from the entity's components. Re-adding an entity replaces its body.
    pub fn add_entity(
        &mut self,
        entity: Entity,
        transform: &Transform,
        rigidbody: &Rigidbody2D,
        box_collider: Option<&Box2D>,
    ) {
        self.remove_entity(entity);

        let mut builder = RigidBodyBuilder::new(body_type_to_rapier(rigidbody.body_type))
            .translation(Vec2::new(transform.position.x, transform.position.y))
            .rotation(transform.euler_rotation.z.to_radians())
            .linvel(Vec2::new(rigidbody.velocity.x, rigidbody.velocity.y))
            .linear_damping(rigidbody.linear_damping)
            .angular_damping(rigidbody.angular_damping)
            .additional_mass(rigidbody.mass)
            .ccd_enabled(rigidbody.continuous_collision);
        if rigidbody.fixed_rotation {
            builder = builder.lock_rotations();
        }
        let handle = self.bodies.insert(builder.build());

        if let Some(b) = box_collider {
            let collider = ColliderBuilder::cuboid(
                b.half_size.x * transform.scale.x,
                b.half_size.y * transform.scale.y,
            )
            .translation(Vec2::new(b.offset.x, b.offset.y))
            .build();
            self.colliders
                .insert_with_parent(collider, handle, &mut self.bodies);
        }

        self.body_to_entity.insert(handle, entity);
        self.entity_to_body.insert(entity, handle);
    }

    /// Register every entity of the scene that has a transform and a rigid
    /// body. Returns how many were added.
    pub fn add_scene(&mut self, scene: &Scene) -> usize {
        let mut added = 0;
        for entity in scene.world.entities() {
            let (Some(transform), Some(rigidbody)) = (
                scene.world.get::<Transform>(entity),
                scene.world.get::<Rigidbody2D>(entity),
            ) else {
                continue;
            };
            let box_collider = scene.world.get::<Box2D>(entity);
            self.add_entity(entity, transform, rigidbody, box_collider);
            added += 1;
        }
        log::info!("physics: {added} bodies registered");
        added
    }

    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        let Some(handle) = self.entity_to_body.remove(&entity) else {
            return false;
        };
        self.body_to_entity.remove(&handle);
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        true
    }

    /// Drop every body, e.g. when play mode stops.
    pub fn clear(&mut self) {
        let entities: Vec<Entity> = self.entity_to_body.keys().copied().collect();
        for entity in entities {
            self.remove_entity(entity);
        }
        self.accumulator = 0.0;
    }

    /// Advance by `frame_dt` seconds in fixed steps and write the results
    /// back into the scene. Returns the number of fixed steps taken.
    pub fn step(&mut self, scene: &mut Scene, frame_dt: f32) -> u32 {
        let dead: Vec<Entity> = self
            .entity_to_body
            .keys()
            .copied()
            .filter(|e| !scene.world.is_alive(*e))
            .collect();
        for entity in dead {
            self.remove_entity(entity);
        }

        if frame_dt <= 0.0 {
            return 0;
        }
        // Capped to avoid a spiral of death after a long stall.
        self.accumulator += frame_dt.min(0.25);

        let fixed_dt = self.params.dt;
        let mut steps = 0;
        while self.accumulator >= fixed_dt {
            self.pipeline.step(
                self.gravity,
                &self.params,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                &(),
                &(),
            );
            self.accumulator -= fixed_dt;
            steps += 1;
        }

        if steps > 0 {
            self.sync_to_scene(scene);
        }
        steps
    }

    fn sync_to_scene(&self, scene: &mut Scene) {
        for (&handle, &entity) in &self.body_to_entity {
            let Some(body) = self.bodies.get(handle) else {
                continue;
            };
            if !body.is_dynamic() {
                continue;
            }
            let pos = body.translation();
            let angle = body.rotation().angle();
            let linvel = body.linvel();
            if let Some(tf) = scene.world.get_mut::<Transform>(entity) {
                tf.position.x = pos.x;
                tf.position.y = pos.y;
                tf.euler_rotation.z = angle.to_degrees();
            }
            if let Some(rb) = scene.world.get_mut::<Rigidbody2D>(entity) {
                rb.velocity = math::Vec2::new(linvel.x, linvel.y);
            }
        }
    }

    /// The registered entity whose box collider contains `point`.
    pub fn overlap_point(&self, scene: &Scene, point: math::Vec2) -> Option<Entity> {
        let mut hits: Vec<Entity> = self
            .entity_to_body
            .keys()
            .copied()
            .filter(|&entity| {
                let (Some(tf), Some(b)) = (
                    scene.world.get::<Transform>(entity),
                    scene.world.get::<Box2D>(entity),
                ) else {
                    return false;
                };
                let center = tf.position.truncate() + b.offset;
                let half = b.half_size * tf.scale.truncate();
                math::point_in_box(point, half, center, tf.euler_rotation.z)
            })
            .collect();
        hits.sort();
        hits.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn falling_scene() -> (Scene, Entity, Entity) {
        let mut scene = Scene::new();
        let ball = scene.world.spawn((
            Transform::from_xy(0.0, 10.0),
            Rigidbody2D {
                linear_damping: 0.0,
                ..Default::default()
            },
            Box2D::new(1.0, 1.0),
        ));
        let ground = scene.world.spawn((
            Transform::from_xy(0.0, -100.0),
            Rigidbody2D {
                body_type: BodyType2D::Static,
                ..Default::default()
            },
            Box2D::new(100.0, 2.0),
        ));
        (scene, ball, ground)
    }

    #[test]
    fn dynamic_body_falls_and_static_stays() {
        let (mut scene, ball, ground) = falling_scene();
        let mut physics = PhysicsWorld2d::new(&Physics2dSettings::default());
        assert_eq!(physics.add_scene(&scene), 2);

        let steps = physics.step(&mut scene, 0.5);
        assert!(steps >= 29);
        assert!(scene.world.get::<Transform>(ball).unwrap().position.y < 10.0);
        assert!(scene.world.get::<Rigidbody2D>(ball).unwrap().velocity.y < 0.0);
        assert_eq!(scene.world.get::<Transform>(ground).unwrap().position.y, -100.0);
    }

    #[test]
    fn small_frames_accumulate() {
        let (mut scene, ..) = falling_scene();
        let mut physics = PhysicsWorld2d::new(&Physics2dSettings::default());
        physics.add_scene(&scene);
        assert_eq!(physics.step(&mut scene, 0.005), 0);
        assert_eq!(physics.step(&mut scene, 0.005), 0);
        assert_eq!(physics.step(&mut scene, 0.01), 1);
    }

    #[test]
    fn despawned_entities_lose_their_bodies() {
        let (mut scene, ball, _) = falling_scene();
        let mut physics = PhysicsWorld2d::new(&Physics2dSettings::default());
        physics.add_scene(&scene);
        scene.world.despawn(ball);
        physics.step(&mut scene, 0.0);
        assert!(!physics.contains(ball));
        assert_eq!(physics.body_count(), 1);
    }

    #[test]
    fn overlap_point_uses_scaled_box() {
        let (scene, ball, ground) = falling_scene();
        let mut physics = PhysicsWorld2d::new(&Physics2dSettings::default());
        physics.add_scene(&scene);
        assert_eq!(physics.overlap_point(&scene, math::Vec2::new(0.2, 10.2)), Some(ball));
        assert_eq!(physics.overlap_point(&scene, math::Vec2::new(40.0, -100.5)), Some(ground));
        assert_eq!(physics.overlap_point(&scene, math::Vec2::new(0.0, 50.0)), None);
    }
}
