use embedded_graphics::{
    image::Image,
    mono_font::{MonoFont, MonoTextStyleBuilder},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle},
    text::{Baseline, Text},
};

use crate::assets::Bitmap;

pub fn draw_text<D>(
    target: &mut D,
    text: &str,
    top_left: Point,
    font: &MonoFont,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor> + OriginDimensions,
{
    Text::with_baseline(
        text,
        top_left,
        MonoTextStyleBuilder::new()
            .font(font)
            .text_color(BinaryColor::On)
            .build(),
        Baseline::Top,
    )
    .draw(target)?;
    Ok(())
}

/// Solid ink box.
pub fn draw_box<D>(target: &mut D, rect: Rectangle) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor> + OriginDimensions,
{
    rect.into_styled(
        PrimitiveStyleBuilder::new()
            .fill_color(BinaryColor::On)
            .build(),
    )
    .draw(target)?;
    Ok(())
}

/// Hollow box, the stroke sits inside `rect`.
pub fn draw_outline<D>(target: &mut D, rect: Rectangle, stroke_width: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor> + OriginDimensions,
{
    rect.into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, stroke_width))
        .draw(target)?;
    Ok(())
}

/// Blit a bitmap, paper pixels included.
pub fn draw_bitmap<D>(target: &mut D, bitmap: &Bitmap, top_left: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor> + OriginDimensions,
{
    let raw = bitmap.image_raw();
    Image::new(&raw, top_left).draw(target)?;
    Ok(())
}

/// Greedy word wrap to `width` characters, words longer than a line are
/// broken. Output is cut to `max_lines`.
pub fn wrap_text(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        loop {
            let used = line.chars().count();
            let gap = if used == 0 { 0 } else { 1 };
            if used + gap + word.len() <= width {
                if gap == 1 {
                    line.push(' ');
                }
                line.extend(word.iter());
                break;
            }
            if used > 0 {
                lines.push(std::mem::take(&mut line));
                continue;
            }
            // word alone overflows an empty line
            let rest = word.split_off(width);
            lines.push(word.iter().collect());
            word = rest;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines.truncate(max_lines);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Raster;

    #[test]
    fn test_wrap_on_words() {
        assert_eq!(
            wrap_text("Light rain showers and thunder", 16, 3),
            vec!["Light rain", "showers and", "thunder"]
        );
        assert_eq!(wrap_text("Partly cloudy", 16, 2), vec!["Partly cloudy"]);
    }

    #[test]
    fn test_wrap_breaks_long_words_and_truncates() {
        assert_eq!(
            wrap_text("Kraftigesluddbyger og torden", 8, 2),
            vec!["Kraftige", "sluddbyg"]
        );
        assert!(wrap_text("   ", 16, 2).is_empty());
    }

    #[test]
    fn test_outline_leaves_inside_blank() {
        let mut raster = Raster::new(10, 10);
        draw_outline(&mut raster, Rectangle::new(Point::new(1, 1), Size::new(5, 5)), 1).unwrap();
        assert_eq!(raster.count_on(), 16);
        assert_eq!(raster.pixel(3, 3), Some(BinaryColor::Off));
    }

    #[test]
    fn test_bitmap_blit() {
        let mut raster = Raster::new(8, 8);
        let bitmap = Bitmap::from_rows(&["##", "#."]);
        draw_bitmap(&mut raster, &bitmap, Point::new(2, 3)).unwrap();
        assert_eq!(raster.count_on(), 3);
        assert_eq!(raster.pixel(2, 3), Some(BinaryColor::On));
        assert_eq!(raster.pixel(3, 4), Some(BinaryColor::Off));
    }
}
