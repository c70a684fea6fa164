/*
 *  render/layout.rs
 *
 *  yrpaper - forecast to e-paper
 *	(c) 2020-26 Stuart Hunter
 *
 *	Fixed geometry of the 176x264 portrait panel
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

// all coordinates are for the unrotated canvas, origin top left

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::normalize::SERIES_LEN;

pub const CANVAS_WIDTH: u32 = 176;
pub const CANVAS_HEIGHT: u32 = 264;

// top band
pub const CONDITION_ICON: Rectangle = Rectangle::new(Point::new(0, 0), Size::new(96, 96));

pub const DIGIT_SIZE: Size = Size::new(36, 60);
pub const DIGIT_TOP: i32 = 8;
pub const DIGIT_PITCH: i32 = 38;
/// single digit, -9..9
pub const ANCHOR_SIGNED: i32 = 120;
/// two digits, positive or below zero
pub const ANCHOR_DOUBLE: i32 = 98;
pub const MINUS_BAR: Rectangle = Rectangle::new(Point::new(102, 36), Size::new(14, 5));
pub const BELOW_ZERO_AT: Point = Point::new(98, 75);
pub const BELOW_ZERO_TEXT: &str = "BELOW ZERO";

// condition description
pub const DESCRIPTION_AT: Point = Point::new(5, 97);
pub const DESCRIPTION_WRAP: usize = 16;
/// "... showers and thunder" needs all three at 16 columns
pub const DESCRIPTION_LINES: usize = 3;
/// 7x13 face, the last line ends on the chance row
pub const DESCRIPTION_LEADING: i32 = 12;

// chance of rain and wind
pub const SMALL_GLYPH: Size = Size::new(16, 16);
pub const UMBRELLA_AT: Point = Point::new(5, 134);
pub const CHANCE_AT: Point = Point::new(24, 135);
pub const WIND_ICON_AT: Point = Point::new(66, 134);
pub const WIND_AT: Point = Point::new(86, 136);
/// room for two digit speed and gust before it
pub const WIND_DIRECTION_AT: Point = Point::new(154, 136);

pub const RULE_TOP: Rectangle = Rectangle::new(Point::new(0, 152), Size::new(CANVAS_WIDTH, 2));
pub const RULE_SPLIT: Rectangle = Rectangle::new(Point::new(87, 154), Size::new(2, 44));
pub const RULE_BOTTOM: Rectangle = Rectangle::new(Point::new(0, 198), Size::new(CANVAS_WIDTH, 2));

/// One of the twin 6 h / 12 h summary panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryPanel {
    pub label: &'static str,
    pub label_at: Point,
    pub temperature_at: Point,
    pub icon: Rectangle,
}

pub const SUMMARY_ICON: Size = Size::new(36, 36);

pub const SUMMARY_6H: SummaryPanel = SummaryPanel {
    label: "+6h",
    label_at: Point::new(4, 158),
    temperature_at: Point::new(4, 174),
    icon: Rectangle::new(Point::new(48, 158), SUMMARY_ICON),
};

pub const SUMMARY_12H: SummaryPanel = SummaryPanel {
    label: "+12h",
    label_at: Point::new(93, 158),
    temperature_at: Point::new(93, 174),
    icon: Rectangle::new(Point::new(137, 158), SUMMARY_ICON),
};

// precipitation diagram
pub const DIAGRAM_BASELINE: i32 = 247;
pub const DIAGRAM_AXIS: Rectangle = Rectangle::new(Point::new(2, DIAGRAM_BASELINE), Size::new(172, 1));
/// bar height per mm, the clamp ceiling of 4 mm gives 32 px
pub const PX_PER_MM: f64 = 8.0;
pub const DIAGRAM_LABELS: [(&str, Point); 3] = [
    ("now", Point::new(4, 203)),
    ("+6h", Point::new(88, 203)),
    ("+12h", Point::new(150, 203)),
];

/// Horizontal extent of one hourly slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagramSlot {
    pub x: i32,
    pub width: u32,
}

pub const DIAGRAM_SLOTS: [DiagramSlot; SERIES_LEN] = [
    DiagramSlot { x: 4, width: 12 },
    DiagramSlot { x: 18, width: 12 },
    DiagramSlot { x: 32, width: 12 },
    DiagramSlot { x: 46, width: 12 },
    DiagramSlot { x: 60, width: 12 },
    DiagramSlot { x: 74, width: 12 },
    DiagramSlot { x: 88, width: 12 },
    DiagramSlot { x: 102, width: 12 },
    DiagramSlot { x: 116, width: 12 },
    DiagramSlot { x: 130, width: 12 },
    DiagramSlot { x: 144, width: 12 },
    DiagramSlot { x: 158, width: 12 },
];

impl DiagramSlot {
    /// Box of a bar for `value` mm, standing on the baseline. None when the
    /// value is not positive.
    pub fn bar(&self, value: f64) -> Option<Rectangle> {
        if !(value > 0.0) {
            return None;
        }
        // a trace still shows as one pixel
        let height = ((value * PX_PER_MM).round() as u32).max(1);
        Some(Rectangle::new(
            Point::new(self.x, DIAGRAM_BASELINE - height as i32),
            Size::new(self.width, height),
        ))
    }
}

// footer
pub const UPDATED_AT: Point = Point::new(2, 253);
pub const UPDATED_FORMAT: &str = "%d.%m.%y %H:%M";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_fit_canvas_and_do_not_overlap() {
        for pair in DIAGRAM_SLOTS.windows(2) {
            assert!(pair[0].x + pair[0].width as i32 <= pair[1].x);
        }
        let last = DIAGRAM_SLOTS[SERIES_LEN - 1];
        assert!(last.x + last.width as i32 <= CANVAS_WIDTH as i32);
    }

    #[test]
    fn test_bar_top_falls_with_value() {
        let slot = DIAGRAM_SLOTS[0];
        let low = slot.bar(1.0).unwrap();
        let high = slot.bar(4.0).unwrap();
        assert!(high.top_left.y < low.top_left.y);
        assert_eq!(high.top_left.y, DIAGRAM_BASELINE - 32);
        assert_eq!(high.top_left.y + high.size.height as i32, DIAGRAM_BASELINE);
        assert_eq!(slot.bar(0.01).unwrap().size.height, 1);
        assert!(slot.bar(0.0).is_none());
        assert!(slot.bar(-0.5).is_none());
    }

    #[test]
    fn test_tallest_bar_clears_labels() {
        let tallest = DIAGRAM_SLOTS[0].bar(4.0).unwrap();
        assert!(tallest.top_left.y > DIAGRAM_LABELS[0].1.y + 10);
    }
}
