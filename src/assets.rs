/*
 *  assets.rs
 *
 *  yrpaper - forecast to e-paper
 *	(c) 2020-26 Stuart Hunter
 *
 *	Icon and glyph bitmaps by symbolic name
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */
use embedded_graphics::geometry::Size;
use embedded_graphics::image::ImageRaw;
use embedded_graphics::pixelcolor::BinaryColor;
use log::{debug, info};
use mini_moka::sync::Cache;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::svgimage::{Monochrome, SvgImageRenderer};

pub const DEFAULT_CACHE_CAPACITY: u64 = 64;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset '{0}' not found")]
    AssetNotFound(String),
    #[error("asset '{name}' could not be rasterized: {detail}")]
    Rasterize { name: String, detail: String },
    #[error("asset '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// 1 bit per pixel image, rows padded to whole bytes, MSB first, 1 = ink.
///
/// Same layout `ImageRaw<BinaryColor>` reads, so it blits without conversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    pub fn blank(width: u32, height: u32) -> Self {
        let stride = (width as usize).div_ceil(8);
        Self { width, height, data: vec![0; stride * height as usize] }
    }

    /// Build from text rows, `#` is ink. Handy for tiny hand drawn glyphs.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let mut bitmap = Self::blank(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    bitmap.set(x as u32, y as u32, true);
                }
            }
        }
        bitmap
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn size(&self) -> Size { Size::new(self.width, self.height) }
    pub fn data(&self) -> &[u8] { &self.data }

    fn stride(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte = self.data[y as usize * self.stride() + x as usize / 8];
        byte & (0x80 >> (x % 8)) != 0
    }

    pub fn set(&mut self, x: u32, y: u32, ink: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let stride = self.stride();
        let byte = &mut self.data[y as usize * stride + x as usize / 8];
        if ink {
            *byte |= 0x80 >> (x % 8);
        } else {
            *byte &= !(0x80 >> (x % 8));
        }
    }

    pub fn count_on(&self) -> usize {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.get(x, y))
            .count()
    }

    /// Nearest neighbour scale to `size`.
    pub fn resized(&self, size: Size) -> Bitmap {
        if size == self.size() {
            return self.clone();
        }
        let mut out = Bitmap::blank(size.width, size.height);
        if self.width == 0 || self.height == 0 {
            return out;
        }
        for y in 0..size.height {
            let sy = (y as u64 * self.height as u64 / size.height as u64) as u32;
            for x in 0..size.width {
                let sx = (x as u64 * self.width as u64 / size.width as u64) as u32;
                if self.get(sx, sy) {
                    out.set(x, y, true);
                }
            }
        }
        out
    }

    pub fn image_raw(&self) -> ImageRaw<'_, BinaryColor> {
        ImageRaw::<BinaryColor>::new(&self.data, self.width)
    }
}

/// Lookup of bitmaps by symbolic name at a requested size.
///
/// Names in use: condition codes (`<code>_<variant>` or `<code>`),
/// `digit_0`..`digit_9`, `umbrella` and `wind`.
pub trait AssetStore {
    fn bitmap(&self, name: &str, size: Size) -> Result<Bitmap, AssetError>;

    /// First of `names` the store can supply. A miss on all of them reports
    /// the last, least specific name.
    fn first_of(&self, names: &[String], size: Size) -> Result<Bitmap, AssetError> {
        let mut missing = String::new();
        for name in names {
            match self.bitmap(name, size) {
                Ok(bitmap) => return Ok(bitmap),
                Err(AssetError::AssetNotFound(n)) => missing = n,
                Err(e) => return Err(e),
            }
        }
        Err(AssetError::AssetNotFound(missing))
    }
}

impl<S: AssetStore + ?Sized> AssetStore for &S {
    fn bitmap(&self, name: &str, size: Size) -> Result<Bitmap, AssetError> {
        (**self).bitmap(name, size)
    }
}

/// Directory of `<name>.svg` files rasterized on demand.
pub struct SvgAssetStore {
    dir: PathBuf,
    mode: Monochrome,
    cache: Cache<(String, u32, u32), Arc<Bitmap>>,
}

impl std::fmt::Debug for SvgAssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgAssetStore")
            .field("dir", &self.dir)
            .field("mode", &self.mode)
            .field("cached", &self.cache.entry_count())
            .finish()
    }
}

impl SvgAssetStore {
    pub fn new(dir: impl Into<PathBuf>, mode: Monochrome, capacity: u64) -> Self {
        let dir = dir.into();
        info!("Asset store at {} ({:?}, cache {})", dir.display(), mode, capacity);
        Self { dir, mode, cache: Cache::new(capacity) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn rasterize(&self, name: &str, size: Size) -> Result<Bitmap, AssetError> {
        // names come off the network, keep them inside the asset directory
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(AssetError::AssetNotFound(name.to_string()));
        }
        let path = self.dir.join(format!("{}.svg", name));
        let svg = match fs::read_to_string(&path) {
            Ok(svg) => svg,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AssetError::AssetNotFound(name.to_string()));
            }
            Err(source) => return Err(AssetError::Io { name: name.to_string(), source }),
        };
        let renderer = SvgImageRenderer::new(&svg, size.width, size.height)
            .map_err(|e| AssetError::Rasterize { name: name.to_string(), detail: e.to_string() })?;
        renderer
            .render(self.mode)
            .map_err(|e| AssetError::Rasterize { name: name.to_string(), detail: e.to_string() })
    }
}

impl AssetStore for SvgAssetStore {
    fn bitmap(&self, name: &str, size: Size) -> Result<Bitmap, AssetError> {
        let key = (name.to_string(), size.width, size.height);
        if let Some(hit) = self.cache.get(&key) {
            return Ok((*hit).clone());
        }
        let bitmap = self.rasterize(name, size)?;
        debug!("Cached {} at {}x{}", name, size.width, size.height);
        self.cache.insert(key, Arc::new(bitmap.clone()));
        Ok(bitmap)
    }
}

/// Bitmaps held in memory, scaled to the requested size on lookup.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetStore {
    bitmaps: HashMap<String, Bitmap>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bitmap: Bitmap) -> &mut Self {
        self.bitmaps.insert(name.into(), bitmap);
        self
    }

    pub fn with(mut self, name: impl Into<String>, bitmap: Bitmap) -> Self {
        self.insert(name, bitmap);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bitmaps.contains_key(name)
    }
}

impl AssetStore for MemoryAssetStore {
    fn bitmap(&self, name: &str, size: Size) -> Result<Bitmap, AssetError> {
        self.bitmaps
            .get(name)
            .map(|b| b.resized(size))
            .ok_or_else(|| AssetError::AssetNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let dir = std::env::temp_dir().join(format!("yrpaper-assets-{}-{}", tag, nanos));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_bitmap_rows_and_resize() {
        let bitmap = Bitmap::from_rows(&["#.", ".#"]);
        assert!(bitmap.get(0, 0));
        assert!(!bitmap.get(1, 0));
        assert_eq!(bitmap.count_on(), 2);

        let big = bitmap.resized(Size::new(4, 4));
        assert_eq!(big.count_on(), 8);
        assert!(big.get(1, 1));
        assert!(big.get(3, 3));
        assert!(!big.get(3, 0));
    }

    #[test]
    fn test_memory_store_missing() {
        let store = MemoryAssetStore::new().with("umbrella", Bitmap::from_rows(&["#"]));
        assert!(store.bitmap("umbrella", Size::new(16, 16)).is_ok());
        assert!(matches!(
            store.bitmap("wind", Size::new(16, 16)),
            Err(AssetError::AssetNotFound(n)) if n == "wind"
        ));
    }

    #[test]
    fn test_first_of_prefers_specific_name() {
        let store = MemoryAssetStore::new()
            .with("rain", Bitmap::from_rows(&["#"]))
            .with("rain_night", Bitmap::from_rows(&["."]));
        let names = vec!["rain_night".to_string(), "rain".to_string()];
        assert_eq!(store.first_of(&names, Size::new(2, 2)).unwrap().count_on(), 0);

        let names = vec!["fog_day".to_string(), "fog".to_string()];
        assert!(matches!(
            store.first_of(&names, Size::new(2, 2)),
            Err(AssetError::AssetNotFound(n)) if n == "fog"
        ));
    }

    #[test]
    fn test_svg_store_rasterizes_and_caches() {
        let dir = scratch_dir("svg");
        fs::write(
            dir.join("umbrella.svg"),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"><rect width="8" height="8" fill="black"/></svg>"#,
        )
        .unwrap();

        let store = SvgAssetStore::new(&dir, Monochrome::Threshold, 8);
        let first = store.bitmap("umbrella", Size::new(16, 16)).unwrap();
        assert_eq!(first.count_on(), 256);

        // served from cache once the file is gone
        fs::remove_file(dir.join("umbrella.svg")).unwrap();
        assert_eq!(store.bitmap("umbrella", Size::new(16, 16)).unwrap(), first);
        assert!(matches!(
            store.bitmap("umbrella", Size::new(8, 8)),
            Err(AssetError::AssetNotFound(_))
        ));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_svg_store_keeps_names_inside_dir() {
        let root = scratch_dir("escape");
        let dir = root.join("icons");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            root.join("secret.svg"),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"><rect width="8" height="8"/></svg>"#,
        )
        .unwrap();

        let store = SvgAssetStore::new(&dir, Monochrome::Threshold, 8);
        for name in ["../secret", "..", "sub/rain", "sub\\rain", ""] {
            match store.bitmap(name, Size::new(8, 8)) {
                Err(AssetError::AssetNotFound(missing)) => assert_eq!(missing, name),
                other => panic!("{name:?} resolved: {:?}", other.map(|b| b.count_on())),
            }
        }
        let _ = fs::remove_dir_all(root);
    }
}
