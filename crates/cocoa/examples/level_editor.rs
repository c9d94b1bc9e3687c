//! Level editor: a small scene to select, drag, scale, and undo.
//!
//! Click a sprite to select it. Drag the arrows to move it (G) or switch to
//! the scale handles (S). Ctrl+Z / Ctrl+Y undo and redo, Ctrl+S saves to
//! `scene.json`. With the `editor` feature, F12 toggles the panels.
//!
//! Run with:
//!     RUST_LOG=info cargo run -p cocoa --example level_editor --features full

use cocoa::prelude::*;

fn main() -> Result<(), AppError> {
    env_logger::init();

    let settings = EngineSettings::load_or_default("cocoa.json");
    let project = std::env::args()
        .nth(1)
        .map(ProjectData::load)
        .transpose()?
        .unwrap_or_default();

    App::new(settings).project(project).setup(setup).run()
}

fn setup(scene: &mut Scene, assets: &mut TextureAssets) {
    if scene.world.entity_count() > 0 {
        return;
    }

    let checker = match checker_texture(assets) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("{e}");
            None
        }
    };

    let ground = scene.world.spawn((
        Transform::from_xy(0.0, -220.0),
        SpriteRenderer::colored(0.3, 0.35, 0.4, 1.0).size(900.0, 40.0).z(-1),
        Rigidbody2D {
            body_type: BodyType2D::Static,
            ..Default::default()
        },
        Box2D::new(900.0, 40.0),
    ));
    scene.world.name_entity(ground, "ground");

    for i in 0..5 {
        let x = -240.0 + i as f32 * 120.0;
        let renderer = match checker {
            Some(texture) => SpriteRenderer::textured(Sprite::new(texture, 64.0, 64.0)),
            None => SpriteRenderer::colored(0.9, 0.6, 0.2, 1.0).size(64.0, 64.0),
        };
        let crate_entity = scene.world.spawn((
            Transform::from_xy(x, 40.0 * i as f32).with_rotation_z(i as f32 * 10.0),
            renderer,
            Rigidbody2D::default(),
            Box2D::new(64.0, 64.0),
        ));
        scene.world.name_entity(crate_entity, &format!("crate_{i}"));
    }

    let marker = scene.world.spawn((
        Transform::from_xy(0.0, 200.0).with_scale(2.0, 1.0),
        SpriteRenderer::colored(0.2, 0.7, 1.0, 0.8).size(48.0, 48.0).z(1),
    ));
    scene.world.name_entity(marker, "marker");

    log::info!("click a sprite to select it, G/S switch between move and scale handles");
}

/// 2×2 checkerboard, scaled up by the sampler.
fn checker_texture(assets: &mut TextureAssets) -> Result<TextureHandle, AssetError> {
    let light = [225, 190, 120, 255];
    let dark = [160, 110, 60, 255];
    let pixels = [light, dark, dark, light].concat();
    assets.from_rgba("checker", 2, 2, pixels)
}
