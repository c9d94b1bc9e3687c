//! # Assets: CPU-Side Texture Registry
//!
//! Textures are loaded once, decoded to RGBA8 with the `image` crate, and
//! addressed everywhere else by a [`TextureHandle`]. The render core only
//! ever compares handles (texture-slot allocation); the GPU backend uploads
//! the pixels the first time a handle is bound.
//!
//! ```text
//! TextureAssets
//! ┌───────────────────────────────────────────────┐
//! │ entries:    Vec<TextureAsset>                 │
//! │   [0] "assets/player.png"   64×64             │
//! │   [1] "gizmos" (generated)  80×40             │
//! │ path_cache: "assets/player.png" → Handle(0)   │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Scenes serialize textures by path; loading a scene resolves the paths
//! back to handles through the same cache.

use std::collections::HashMap;
use std::path::Path;

/// Handle to a texture in [`TextureAssets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub(crate) u32);

impl TextureHandle {
    pub fn id(self) -> u32 {
        self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to load texture '{path}': {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("texture '{label}' is {width}x{height} but got {len} bytes of RGBA8")]
    BadPixelData {
        label: String,
        width: u32,
        height: u32,
        len: usize,
    },
}

/// Decoded texture data.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub label: String,
    /// `None` for generated textures.
    pub path: Option<String>,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct TextureAssets {
    entries: Vec<TextureAsset>,
    path_cache: HashMap<String, TextureHandle>,
}

impl TextureAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a texture from disk, or return the cached handle for the path.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<TextureHandle, AssetError> {
        let key = path.as_ref().to_string_lossy().into_owned();
        if let Some(&handle) = self.path_cache.get(&key) {
            return Ok(handle);
        }

        let img = image::open(path.as_ref())
            .map_err(|source| AssetError::Image {
                path: key.clone(),
                source,
            })?
            .to_rgba8();
        let (width, height) = img.dimensions();

        let handle = self.push(TextureAsset {
            label: key.clone(),
            path: Some(key.clone()),
            width,
            height,
            pixels: img.into_raw(),
        });
        self.path_cache.insert(key, handle);
        log::info!("loaded texture {:?} ({}x{})", path.as_ref(), width, height);
        Ok(handle)
    }

    /// Register raw RGBA8 pixels (generated textures, tests).
    pub fn from_rgba(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<TextureHandle, AssetError> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return Err(AssetError::BadPixelData {
                label: label.to_owned(),
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(self.push(TextureAsset {
            label: label.to_owned(),
            path: None,
            width,
            height,
            pixels,
        }))
    }

    fn push(&mut self, asset: TextureAsset) -> TextureHandle {
        let handle = TextureHandle(self.entries.len() as u32);
        self.entries.push(asset);
        handle
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&TextureAsset> {
        self.entries.get(handle.0 as usize)
    }

    pub fn path_of(&self, handle: TextureHandle) -> Option<&str> {
        self.get(handle)?.path.as_deref()
    }

    pub fn handle_for_path(&self, path: &str) -> Option<TextureHandle> {
        self.path_cache.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_checks_size() {
        let mut assets = TextureAssets::new();
        let ok = assets.from_rgba("white", 1, 1, vec![255; 4]);
        assert!(ok.is_ok());
        let bad = assets.from_rgba("short", 2, 2, vec![255; 4]);
        assert!(matches!(bad, Err(AssetError::BadPixelData { .. })));
        assert_eq!(assets.len(), 1);
    }

    #[test]
    fn load_caches_by_path() {
        let path = std::env::temp_dir().join("cocoa_asset_cache_test.png");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let mut assets = TextureAssets::new();
        let a = assets.load(&path).unwrap();
        let b = assets.load(&path).unwrap();
        assert_eq!(a, b);
        assert_eq!(assets.len(), 1);
        let key = path.to_string_lossy().into_owned();
        assert_eq!(assets.path_of(a), Some(key.as_str()));
        assert_eq!(assets.handle_for_path(&key), Some(a));
        assert_eq!(assets.get(a).unwrap().pixels[..4], [10, 20, 30, 255]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut assets = TextureAssets::new();
        let err = assets.load("definitely/not/here.png").unwrap_err();
        assert!(err.to_string().contains("definitely/not/here.png"));
    }
}
