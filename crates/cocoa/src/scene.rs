//! # Scene: World, Active Entity, Camera, Save/Load
//!
//! A [`Scene`] is what the editor edits and the renderer draws: an ECS
//! [`World`], the entity the gizmos are attached to, and the 2D camera.
//!
//! ## File Format
//!
//! Scenes are saved as JSON. Each entity stores the components this engine
//! knows about, by name; a sprite's texture is stored as the path it was
//! loaded from, since [`TextureHandle`]s are only meaningful at runtime.
//!
//! ```text
//! {
//!   "camera":   { "position": [0, 0], "zoom": 1 },
//!   "entities": [
//!     { "name": "player",
//!       "transform":       { "position": [0, 0, 0], ... },
//!       "sprite_renderer": { "color": [1, 1, 1, 1], ... },
//!       "texture":         "assets/player.png",
//!       "rigidbody":       { "body_type": "Dynamic", ... },
//!       "box_collider":    { "size": [32, 32], ... } }
//!   ]
//! }
//! ```
//!
//! An in-memory [`SceneData`] (the play-mode snapshot) also keeps each
//! sprite's handle, so textures built with
//! [`TextureAssets::from_rgba`](crate::asset::TextureAssets::from_rgba),
//! which have no path, survive a save/load inside one session.
//!
//! Entity ids are not preserved; loading replaces every entity of the world
//! and clears the active entity.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::asset::TextureAssets;
use crate::components::{Box2D, Rigidbody2D, SpriteRenderer};
use crate::ecs::{Entity, World};
use crate::math::Transform;
use crate::render2d::Camera2d;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("scene file I/O failed for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("scene JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Serialized form ──────────────────────────────────────────────────────

/// One entity in a saved scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprite_renderer: Option<SpriteRenderer>,
    /// Path of the sprite's texture, if it was loaded from disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rigidbody: Option<Rigidbody2D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_collider: Option<Box2D>,
}

/// A whole saved scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneData {
    pub camera: Camera2d,
    pub entities: Vec<EntityData>,
}

impl SceneData {
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| SceneError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("saved scene to {}", path.display());
        Ok(())
    }
}

// ── Scene ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct Scene {
    pub world: World,
    pub camera: Camera2d,
    active_entity: Option<Entity>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entity the gizmos and the inspector operate on.
    ///
    /// Returns `None` if nothing is selected or the selected entity has been
    /// despawned since.
    pub fn active_entity(&self) -> Option<Entity> {
        self.active_entity.filter(|&e| self.world.is_alive(e))
    }

    pub fn set_active_entity(&mut self, entity: Option<Entity>) {
        if entity != self.active_entity {
            log::debug!("active entity: {:?}", entity);
        }
        self.active_entity = entity;
    }

    /// Resolve a value read from the picking target (`index + 1`, 0 = none).
    pub fn entity_from_picking_id(&self, id: u32) -> Option<Entity> {
        if id == 0 {
            return None;
        }
        self.world.entity_at_index(id - 1)
    }

    /// Snapshot every entity into a [`SceneData`].
    pub fn save(&self, assets: &TextureAssets) -> SceneData {
        let entities = self
            .world
            .entities()
            .into_iter()
            .map(|entity| {
                let sprite_renderer = self.world.get::<SpriteRenderer>(entity).copied();
                let texture = sprite_renderer
                    .and_then(|r| r.sprite.texture)
                    .and_then(|t| assets.path_of(t))
                    .map(str::to_owned);
                EntityData {
                    name: self.world.entity_name(entity).map(str::to_owned),
                    transform: self.world.get::<Transform>(entity).copied(),
                    sprite_renderer,
                    texture,
                    rigidbody: self.world.get::<Rigidbody2D>(entity).copied(),
                    box_collider: self.world.get::<Box2D>(entity).copied(),
                }
            })
            .collect();

        SceneData {
            camera: self.camera,
            entities,
        }
    }

    /// Replace the world's contents with `data`. Returns the new entities in
    /// file order.
    ///
    /// A sprite keeps its texture handle if `assets` still holds it;
    /// otherwise the texture is reloaded by path. A texture that fails to
    /// load leaves its sprite untextured.
    pub fn load(&mut self, data: &SceneData, assets: &mut TextureAssets) -> Vec<Entity> {
        self.world.clear_entities();
        self.active_entity = None;

        let viewport = self.camera.viewport;
        self.camera = data.camera;
        self.camera.viewport = viewport;

        let mut spawned = Vec::with_capacity(data.entities.len());
        for entry in &data.entities {
            let entity = self.world.spawn_empty();
            if let Some(name) = &entry.name {
                self.world.name_entity(entity, name);
            }
            if let Some(transform) = entry.transform {
                self.world.insert(entity, transform);
            }
            if let Some(mut renderer) = entry.sprite_renderer {
                let live = renderer.sprite.texture.filter(|&t| assets.get(t).is_some());
                renderer.sprite.texture = match (live, &entry.texture) {
                    (Some(handle), _) => Some(handle),
                    (None, Some(path)) => match assets.load(path) {
                        Ok(handle) => Some(handle),
                        Err(e) => {
                            log::warn!("{e}; sprite of {entity} drawn untextured");
                            None
                        }
                    },
                    (None, None) => None,
                };
                self.world.insert(entity, renderer);
            }
            if let Some(rigidbody) = entry.rigidbody {
                self.world.insert(entity, rigidbody);
            }
            if let Some(box_collider) = entry.box_collider {
                self.world.insert(entity, box_collider);
            }
            spawned.push(entity);
        }
        log::info!("loaded scene with {} entities", spawned.len());
        spawned
    }

    pub fn save_to_file(&self, assets: &TextureAssets, path: impl AsRef<Path>) -> Result<(), SceneError> {
        self.save(assets).write_to_file(path)
    }

    pub fn load_from_file(
        &mut self,
        assets: &mut TextureAssets,
        path: impl AsRef<Path>,
    ) -> Result<Vec<Entity>, SceneError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let data: SceneData = serde_json::from_str(&json)?;
        Ok(self.load(&data, assets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BodyType2D, Sprite};
    use crate::math::Vec2;

    fn write_png(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn picking_id_resolves_to_live_entity() {
        let mut scene = Scene::new();
        let a = scene.world.spawn_empty();
        let b = scene.world.spawn_empty();
        assert_eq!(scene.entity_from_picking_id(0), None);
        assert_eq!(scene.entity_from_picking_id(a.picking_id()), Some(a));
        assert_eq!(scene.entity_from_picking_id(b.picking_id()), Some(b));

        scene.world.despawn(b);
        assert_eq!(scene.entity_from_picking_id(b.picking_id()), None);
    }

    #[test]
    fn active_entity_is_cleared_by_despawn() {
        let mut scene = Scene::new();
        let e = scene.world.spawn_empty();
        scene.set_active_entity(Some(e));
        assert_eq!(scene.active_entity(), Some(e));
        scene.world.despawn(e);
        assert_eq!(scene.active_entity(), None);
    }

    #[test]
    fn save_and_load_keep_components_and_texture_paths() {
        let png = write_png("cocoa_scene_texture.png");
        let mut assets = TextureAssets::new();
        let tex = assets.load(&png).unwrap();

        let mut scene = Scene::new();
        scene.camera.zoom = 2.0;
        let player = scene.world.spawn((
            Transform::from_xy(10.0, 20.0),
            SpriteRenderer::textured(Sprite::new(tex, 16.0, 16.0)).z(3),
            Rigidbody2D {
                body_type: BodyType2D::Static,
                ..Default::default()
            },
            Box2D::new(16.0, 16.0),
        ));
        scene.world.name_entity(player, "player");
        scene.world.spawn((Transform::from_xy(-5.0, 0.0),));

        let data = scene.save(&assets);
        let json = serde_json::to_string(&data).unwrap();
        let data: SceneData = serde_json::from_str(&json).unwrap();

        let mut loaded = Scene::new();
        let mut fresh_assets = TextureAssets::new();
        let entities = loaded.load(&data, &mut fresh_assets);
        assert_eq!(entities.len(), 2);
        assert_eq!(loaded.camera.zoom, 2.0);

        let p = loaded.world.try_named("player").unwrap();
        assert_eq!(loaded.world.get::<Transform>(p).unwrap().position.x, 10.0);
        let renderer = loaded.world.get::<SpriteRenderer>(p).unwrap();
        assert_eq!(renderer.z_index, 3);
        assert!(renderer.sprite.texture.is_some());
        assert_eq!(
            loaded.world.get::<Rigidbody2D>(p).unwrap().body_type,
            BodyType2D::Static
        );
        assert_eq!(loaded.world.get::<Box2D>(p).unwrap().half_size, Vec2::new(8.0, 8.0));
        assert!(!loaded.world.has::<SpriteRenderer>(entities[1]));
    }

    #[test]
    fn load_replaces_world_and_clears_selection() {
        let mut scene = Scene::new();
        let old = scene.world.spawn((Transform::default(),));
        scene.set_active_entity(Some(old));

        let data = SceneData {
            entities: vec![EntityData::default(); 3],
            ..Default::default()
        };
        scene.load(&data, &mut TextureAssets::new());
        assert_eq!(scene.world.entity_count(), 3);
        assert_eq!(scene.active_entity(), None);
        assert!(!scene.world.is_alive(old));
    }

    #[test]
    fn missing_texture_leaves_sprite_untextured() {
        let data = SceneData {
            entities: vec![EntityData {
                sprite_renderer: Some(SpriteRenderer::default()),
                texture: Some("definitely/not/here.png".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut scene = Scene::new();
        let entities = scene.load(&data, &mut TextureAssets::new());
        let renderer = scene.world.get::<SpriteRenderer>(entities[0]).unwrap();
        assert_eq!(renderer.sprite.texture, None);
    }

    #[test]
    fn in_memory_snapshot_keeps_generated_texture() {
        let mut assets = TextureAssets::new();
        let checker = assets.from_rgba("checker", 1, 1, vec![255; 4]).unwrap();
        let mut scene = Scene::new();
        scene
            .world
            .spawn((Transform::default(), SpriteRenderer::textured(Sprite::new(checker, 8.0, 8.0))));

        let snapshot = scene.save(&assets);
        assert_eq!(snapshot.entities[0].texture, None);
        let entities = scene.load(&snapshot, &mut assets);
        let renderer = scene.world.get::<SpriteRenderer>(entities[0]).unwrap();
        assert_eq!(renderer.sprite.texture, Some(checker));

        // A handle from another texture store is not trusted.
        let mut other = Scene::new();
        let entities = other.load(&snapshot, &mut TextureAssets::new());
        assert_eq!(other.world.get::<SpriteRenderer>(entities[0]).unwrap().sprite.texture, None);
    }

    #[test]
    fn file_round_trip() {
        let path = std::env::temp_dir().join("cocoa_scene_file.json");
        let mut scene = Scene::new();
        scene.world.spawn((Transform::from_xy(1.0, 2.0), SpriteRenderer::colored(1.0, 0.0, 0.0, 1.0)));
        let assets = TextureAssets::new();
        scene.save_to_file(&assets, &path).unwrap();

        let mut loaded = Scene::new();
        let entities = loaded.load_from_file(&mut TextureAssets::new(), &path).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(
            loaded.world.get::<SpriteRenderer>(entities[0]).unwrap().color.x,
            1.0
        );
        assert!(matches!(
            loaded.load_from_file(&mut TextureAssets::new(), "no/such/scene.json"),
            Err(SceneError::Io { .. })
        ));
    }
}
