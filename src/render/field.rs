/*
 *  render/field.rs
 *
 *  yrpaper - forecast to e-paper
 *	(c) 2020-26 Stuart Hunter
 *
 *	Field-based layout, the page is planned first and painted second
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

use embedded_graphics::mono_font::{iso_8859_1, MonoFont};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Fonts available to text fields. Latin-1 so the degree sign is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    /// 6x10
    Small,
    /// 7x13
    Medium,
    /// 9x15
    Large,
}

impl Face {
    pub fn font(&self) -> &'static MonoFont<'static> {
        match self {
            Face::Small => &iso_8859_1::FONT_6X10,
            Face::Medium => &iso_8859_1::FONT_7X13,
            Face::Large => &iso_8859_1::FONT_9X15,
        }
    }

    pub fn cell(&self) -> Size {
        self.font().character_size
    }
}

/// Field type determines rendering behavior
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Text, drawn from the top left of the bounds
    Text { text: String, face: Face },
    /// Bitmap from the asset store, first name found wins, scaled to bounds
    Glyph { names: Vec<String> },
    /// Solid ink box
    Fill,
    /// One pixel ink outline, inside left blank
    Outline,
}

/// Field definition - declarative element positioning
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field identifier (e.g., "condition_icon", "chance", "precip_bar_3")
    pub name: String,

    /// Bounding rectangle
    pub bounds: Rectangle,

    pub content: Content,
}

impl Field {
    /// Text field sized to its content.
    pub fn text(name: impl Into<String>, top_left: Point, text: impl Into<String>, face: Face) -> Self {
        let text = text.into();
        let cell = face.cell();
        let size = Size::new(cell.width * text.chars().count() as u32, cell.height);
        Self {
            name: name.into(),
            bounds: Rectangle::new(top_left, size),
            content: Content::Text { text, face },
        }
    }

    pub fn glyph(name: impl Into<String>, bounds: Rectangle, names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            bounds,
            content: Content::Glyph { names },
        }
    }

    pub fn fill(name: impl Into<String>, bounds: Rectangle) -> Self {
        Self { name: name.into(), bounds, content: Content::Fill }
    }

    pub fn outline(name: impl Into<String>, bounds: Rectangle) -> Self {
        Self { name: name.into(), bounds, content: Content::Outline }
    }

    /// Text of a text field.
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            Content::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Asset names of a glyph field.
    pub fn glyph_names(&self) -> Option<&[String]> {
        match &self.content {
            Content::Glyph { names } => Some(names),
            _ => None,
        }
    }

    /// Get top-left position
    pub fn position(&self) -> Point {
        self.bounds.top_left
    }
}

/// Page layout - the ordered fields making up one frame
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// Page identifier
    pub name: String,

    /// Fields in paint order
    pub fields: Vec<Field>,
}

impl PageLayout {
    /// Create a new page layout
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field to the page
    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Get a field by name
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields whose name starts with `prefix`, in paint order
    pub fn fields_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| f.name.starts_with(prefix))
    }

    /// All text on the page, in paint order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter_map(Field::text_content)
    }

    /// Get all fields
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_field_bounds_follow_font() {
        let field = Field::text("chance", Point::new(24, 135), "40%", Face::Large);
        assert_eq!(field.bounds.size, Size::new(27, 15));
        assert_eq!(field.text_content(), Some("40%"));
        assert!(field.glyph_names().is_none());
    }

    #[test]
    fn test_page_lookup() {
        let mut page = PageLayout::new("forecast");
        page.push(Field::fill("precip_bar_0", Rectangle::new(Point::zero(), Size::new(1, 1))));
        page.push(Field::outline("precip_max_0", Rectangle::new(Point::zero(), Size::new(1, 1))));
        page.push(Field::fill("precip_bar_1", Rectangle::new(Point::zero(), Size::new(1, 1))));

        assert_eq!(page.fields_with_prefix("precip_bar_").count(), 2);
        assert_eq!(page.get_field("precip_max_0").map(|f| &f.content), Some(&Content::Outline));
        assert!(page.get_field("wind").is_none());
        assert_eq!(page.fields().len(), 3);
    }
}
