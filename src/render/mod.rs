/*
 *  render/mod.rs
 *
 *  yrpaper - forecast to e-paper
 *	(c) 2020-26 Stuart Hunter
 *
 *	Normalized forecast to raster
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

//! Layout renderer.
//!
//! Rendering is split in two: [`Renderer::plan`] turns the normalized fields
//! into a [`PageLayout`] of positioned fields, [`Renderer::paint`] draws a
//! layout onto any monochrome `DrawTarget`. Only painting touches the asset
//! store.

use chrono::{FixedOffset, Local};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;
use thiserror::Error;

use crate::assets::{AssetError, AssetStore};
use crate::normalize::{NormalizedFields, TemperatureBand};
use crate::raster::{Raster, Rotation};

pub mod draw;
pub mod field;
pub mod layout;

pub use field::{Content, Face, Field, PageLayout};
use layout::*;

/// Orientation of the panel in its frame; applied once per frame.
pub const PANEL_ROTATION: Rotation = Rotation::Deg180;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("asset '{0}' not found")]
    AssetNotFound(String),
    #[error(transparent)]
    Asset(AssetError),
    #[error("drawing field '{field}' failed: {detail}")]
    Draw { field: String, detail: String },
}

impl From<AssetError> for RenderError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::AssetNotFound(name) => RenderError::AssetNotFound(name),
            other => RenderError::Asset(other),
        }
    }
}

/// Time zone the "updated" stamp is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StampZone {
    #[default]
    Local,
    Fixed(FixedOffset),
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    zone: StampZone,
}

impl Renderer {
    pub fn new(zone: StampZone) -> Self {
        Self { zone }
    }

    fn stamp(&self, fields: &NormalizedFields) -> String {
        match self.zone {
            StampZone::Local => fields.updated_at.with_timezone(&Local).format(UPDATED_FORMAT).to_string(),
            StampZone::Fixed(offset) => fields.updated_at.with_timezone(&offset).format(UPDATED_FORMAT).to_string(),
        }
    }

    /// Position every element of the frame. Pure.
    pub fn plan(&self, fields: &NormalizedFields) -> PageLayout {
        let mut page = PageLayout::new("forecast");

        page.push(Field::glyph("condition_icon", CONDITION_ICON, fields.condition.icon_names()));
        plan_temperature(&mut page, fields.band);

        for (i, line) in draw::wrap_text(&fields.description, DESCRIPTION_WRAP, DESCRIPTION_LINES)
            .into_iter()
            .enumerate()
        {
            let at = DESCRIPTION_AT + Point::new(0, i as i32 * DESCRIPTION_LEADING);
            page.push(Field::text(format!("description_{}", i), at, line, Face::Medium));
        }

        page.push(Field::glyph(
            "chance_icon",
            Rectangle::new(UMBRELLA_AT, SMALL_GLYPH),
            vec!["umbrella".to_string()],
        ));
        page.push(Field::text("chance", CHANCE_AT, format!("{}%", fields.precipitation_chance), Face::Large));
        page.push(Field::glyph(
            "wind_icon",
            Rectangle::new(WIND_ICON_AT, SMALL_GLYPH),
            vec!["wind".to_string()],
        ));
        page.push(Field::text(
            "wind",
            WIND_AT,
            format!("{}-{} m/s", fields.wind_speed, fields.wind_gust),
            Face::Medium,
        ));
        if let Some(direction) = fields.wind_direction {
            page.push(Field::text("wind_direction", WIND_DIRECTION_AT, direction.label(), Face::Medium));
        }

        page.push(Field::fill("rule_top", RULE_TOP));
        page.push(Field::fill("rule_split", RULE_SPLIT));
        page.push(Field::fill("rule_bottom", RULE_BOTTOM));

        for (key, panel, temperature, condition) in [
            ("6h", SUMMARY_6H, fields.temperature_6h, &fields.condition_6h),
            ("12h", SUMMARY_12H, fields.temperature_12h, &fields.condition_12h),
        ] {
            page.push(Field::text(format!("summary_{}_label", key), panel.label_at, panel.label, Face::Small));
            page.push(Field::text(
                format!("summary_{}_temperature", key),
                panel.temperature_at,
                format!("{}°", temperature),
                Face::Large,
            ));
            page.push(Field::glyph(format!("summary_{}_icon", key), panel.icon, condition.icon_names()));
        }

        for (label, at) in DIAGRAM_LABELS {
            page.push(Field::text(format!("diagram_label_{}", label), at, label, Face::Small));
        }
        page.push(Field::fill("diagram_axis", DIAGRAM_AXIS));
        for (i, ((slot, actual), maximum)) in DIAGRAM_SLOTS
            .iter()
            .zip(fields.precipitation.iter())
            .zip(fields.precipitation_max.iter())
            .enumerate()
        {
            if let Some(bar) = slot.bar(*actual) {
                page.push(Field::fill(format!("precip_bar_{}", i), bar));
            }
            if let Some(bound) = slot.bar(*maximum) {
                page.push(Field::outline(format!("precip_max_{}", i), bound));
            }
        }

        page.push(Field::text("updated", UPDATED_AT, self.stamp(fields), Face::Small));
        page
    }

    /// Draw `page` onto `target`, fetching glyph bitmaps from `assets`.
    pub fn paint<D, A>(&self, page: &PageLayout, assets: &A, target: &mut D) -> Result<(), RenderError>
    where
        D: DrawTarget<Color = BinaryColor> + OriginDimensions,
        D::Error: std::fmt::Debug,
        A: AssetStore + ?Sized,
    {
        for field in page.fields() {
            let drawn = match &field.content {
                Content::Text { text, face } => draw::draw_text(target, text, field.position(), face.font()),
                Content::Glyph { names } => {
                    let bitmap = assets.first_of(names, field.bounds.size)?;
                    draw::draw_bitmap(target, &bitmap, field.position())
                }
                Content::Fill => draw::draw_box(target, field.bounds),
                Content::Outline => draw::draw_outline(target, field.bounds, 1),
            };
            drawn.map_err(|e| RenderError::Draw {
                field: field.name.clone(),
                detail: format!("{:?}", e),
            })?;
        }
        Ok(())
    }

    /// Frame in reading orientation.
    pub fn compose<A>(&self, fields: &NormalizedFields, assets: &A) -> Result<Raster, RenderError>
    where
        A: AssetStore + ?Sized,
    {
        let page = self.plan(fields);
        let mut raster = Raster::new(CANVAS_WIDTH, CANVAS_HEIGHT);
        self.paint(&page, assets, &mut raster)?;
        debug!("Composed {} fields, {} pixels inked", page.fields().len(), raster.count_on());
        Ok(raster)
    }

    /// Frame as the panel shows it: composed, then turned by [`PANEL_ROTATION`].
    pub fn render<A>(&self, fields: &NormalizedFields, assets: &A) -> Result<Raster, RenderError>
    where
        A: AssetStore + ?Sized,
    {
        Ok(self.compose(fields, assets)?.rotated(PANEL_ROTATION))
    }
}

fn digit_glyph(digit: char) -> Vec<String> {
    vec![format!("digit_{}", digit)]
}

fn plan_temperature(page: &mut PageLayout, band: TemperatureBand) {
    let anchor = match band {
        TemperatureBand::Signed(_) => ANCHOR_SIGNED,
        TemperatureBand::Positive(_) | TemperatureBand::BelowZero(_) => ANCHOR_DOUBLE,
    };
    for (i, digit) in band.digits().chars().enumerate() {
        let at = Point::new(anchor + i as i32 * DIGIT_PITCH, DIGIT_TOP);
        page.push(Field::glyph(
            format!("temperature_digit_{}", i),
            Rectangle::new(at, DIGIT_SIZE),
            digit_glyph(digit),
        ));
    }
    if band.needs_minus() {
        page.push(Field::fill("temperature_minus", MINUS_BAR));
    }
    if band.below_zero_marker() {
        page.push(Field::text("below_zero", BELOW_ZERO_AT, BELOW_ZERO_TEXT, Face::Small));
    }
}
