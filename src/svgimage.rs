//! Module for rasterizing SVG icons to a monochrome bitmap.
//!
//! This module uses `resvg` (with its `usvg` re-export) for SVG parsing and
//! rendering onto a `tiny-skia` pixmap. The output is a 1-bit per pixel
//! bitmap suitable for e-paper, where dark opaque pixels become ink.

use resvg::{
    render,
    usvg::{
        Tree as ResvgTree,
        Options as ResvgUsvgOptions,
        Transform,
    }
}; // Use resvg's re-exports for usvg types

use log::debug;
use serde::{Deserialize, Serialize};
use std::{error::Error};
use std::fmt;
use tiny_skia::Pixmap;

use crate::assets::Bitmap;

/// Custom error type for SVG rendering operations.
#[derive(Debug)]
pub enum SvgImageError {
    /// Error parsing the SVG data.
    SvgParseError(String),
    /// Error creating a pixmap for rendering.
    PixmapCreationError(String),
}

impl fmt::Display for SvgImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SvgImageError::SvgParseError(msg) => write!(f, "SVG parse error: {}", msg),
            SvgImageError::PixmapCreationError(msg) => write!(f, "Pixmap creation error: {}", msg),
        }
    }
}

impl Error for SvgImageError {}

/// How grey levels are reduced to ink or paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Monochrome {
    /// hard cut at mid grey
    #[default]
    Threshold,
    /// Floyd-Steinberg error diffusion, keeps shading of coloured icons
    Dither,
}

const THRESHOLD: f32 = 128.0;

/// Renders SVG data to a monochrome bitmap.
#[derive(Debug)]
pub struct SvgImageRenderer {
    tree: ResvgTree,
    target_width: u32,
    target_height: u32,
}

impl SvgImageRenderer {
    /// Creates a new `SvgImageRenderer` from SVG string data and target dimensions.
    ///
    /// The SVG will be scaled to fit `target_width` and `target_height`.
    pub fn new(svg_data: &str, target_width: u32, target_height: u32) -> Result<Self, SvgImageError> {
        let usvg_options = ResvgUsvgOptions::default(); // Use resvg's re-exported Options
        let tree = ResvgTree::from_str(svg_data, &usvg_options) // Use resvg's re-exported Tree
            .map_err(|e| SvgImageError::SvgParseError(format!("Failed to parse SVG: {:?}", e)))?;
        Ok(SvgImageRenderer {
            tree,
            target_width,
            target_height,
        })
    }

    /// Grey levels (0 black .. 255 white) of the SVG composited over white paper.
    fn grey_levels(&self) -> Result<Vec<f32>, SvgImageError> {
        let mut pixmap = Pixmap::new(self.target_width, self.target_height)
            .ok_or_else(|| SvgImageError::PixmapCreationError("Failed to create pixmap".to_string()))?;

        // simple scale from (0,0); a viewBox with a non zero origin is handled by usvg
        let svg_size = self.tree.size();
        let scale_x = self.target_width as f32 / svg_size.width();
        let scale_y = self.target_height as f32 / svg_size.height();
        let transform = Transform::from_scale(scale_x, scale_y);

        render(&self.tree, transform, &mut pixmap.as_mut());

        // pixmap is premultiplied, so adding the uncovered share of white
        // composites it over paper
        Ok(pixmap
            .pixels()
            .iter()
            .map(|p| {
                let luminance = 0.299 * p.red() as f32 + 0.587 * p.green() as f32 + 0.114 * p.blue() as f32;
                luminance + (255 - p.alpha()) as f32
            })
            .collect())
    }

    /// Renders the SVG into a bitmap of the target size.
    pub fn render(&self, mode: Monochrome) -> Result<Bitmap, SvgImageError> {
        let width = self.target_width as usize;
        let height = self.target_height as usize;
        let mut grey = self.grey_levels()?;
        let mut bitmap = Bitmap::blank(self.target_width, self.target_height);

        for y in 0..height {
            for x in 0..width {
                let old = grey[y * width + x];
                let ink = old < THRESHOLD;
                if ink {
                    bitmap.set(x as u32, y as u32, true);
                }
                if mode == Monochrome::Dither {
                    let error = old - if ink { 0.0 } else { 255.0 };
                    // (x + 1, y) 7/16, (x - 1, y + 1) 3/16, (x, y + 1) 5/16, (x + 1, y + 1) 1/16
                    if x + 1 < width {
                        grey[y * width + x + 1] += error * 7.0 / 16.0;
                    }
                    if y + 1 < height {
                        if x > 0 {
                            grey[(y + 1) * width + x - 1] += error * 3.0 / 16.0;
                        }
                        grey[(y + 1) * width + x] += error * 5.0 / 16.0;
                        if x + 1 < width {
                            grey[(y + 1) * width + x + 1] += error * 1.0 / 16.0;
                        }
                    }
                }
            }
        }

        debug!("SVG rendered to {}x{} bitmap ({:?}).", width, height, mode);
        Ok(bitmap)
    }
}
