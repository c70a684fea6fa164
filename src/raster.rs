/*
 *  raster.rs
 *
 *  yrpaper - forecast to e-paper
 *	(c) 2020-26 Stuart Hunter
 *
 *	1-bit canvas the layout is composed on
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

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Orientation directive handed to the sink alongside a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg180,
}

impl Rotation {
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg180 => 180,
        }
    }
}

/// A fixed size monochrome framebuffer for embedded-graphics.
///
/// `BinaryColor::On` is ink (black on paper), `Off` is blank paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    buf: Vec<BinaryColor>,
    w: usize,
    h: usize,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![BinaryColor::Off; w * h], w, h }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    /// Immutable raw access, row major
    pub fn as_slice(&self) -> &[BinaryColor] { &self.buf }

    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        self.idx(Point::new(x as i32, y as i32)).map(|i| self.buf[i])
    }

    pub fn count_on(&self) -> usize {
        self.buf.iter().filter(|p| p.is_on()).count()
    }

    /// Count inked pixels inside `area` (clipped to the canvas).
    pub fn count_on_in(&self, area: &Rectangle) -> usize {
        area.points()
            .filter_map(|p| self.idx(p))
            .filter(|&i| self.buf[i].is_on())
            .count()
    }

    /// Copy of this raster turned by `rotation`.
    pub fn rotated(&self, rotation: Rotation) -> Raster {
        match rotation {
            Rotation::Deg0 => self.clone(),
            // a half turn of a row major buffer is the buffer reversed
            Rotation::Deg180 => Raster {
                buf: self.buf.iter().rev().copied().collect(),
                w: self.w,
                h: self.h,
            },
        }
    }

    /// Pack to 1 bit per pixel, rows padded to whole bytes, MSB first,
    /// 1 = ink. This is what e-paper controllers and PBM expect.
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        let stride = self.w.div_ceil(8);
        let mut bytes = vec![0u8; stride * self.h];
        for (y, row) in self.buf.chunks(self.w.max(1)).enumerate().take(self.h) {
            for (x, pixel) in row.iter().enumerate() {
                if pixel.is_on() {
                    bytes[y * stride + x / 8] |= 0x80 >> (x % 8);
                }
            }
        }
        bytes
    }

    /// Binary PBM (P4) image of the raster.
    pub fn to_pbm(&self) -> Vec<u8> {
        let mut out = format!("P4\n{} {}\n", self.w, self.h).into_bytes();
        out.extend(self.to_packed_bytes());
        out
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl OriginDimensions for Raster {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl DrawTarget for Raster {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buf.fill(color);
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        if area.is_zero_sized() { return Ok(()); }
        let (x0, y0) = (area.top_left.x as usize, area.top_left.y as usize);
        let (w, h) = (area.size.width as usize, area.size.height as usize);
        for row in y0..y0 + h {
            let base = row * self.w;
            self.buf[base + x0..base + x0 + w].fill(color);
        }
        Ok(())
    }
}
