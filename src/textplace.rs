/*
 *  textplace.rs
 *
 *  wxpanel - minute-true weather panel
 *	(c) 2020-26 Stuart Hunter
 *
 *	Text measurement and anchor-relative placement
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

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Baseline, Text};

use crate::bitmap::INK;
use crate::raster::PointF;

/// Pixel size of `text` rendered in `font` on a single line.
pub fn text_size(text: &str, font: &MonoFont<'_>) -> Size {
    let n = text.chars().count() as u32;
    if n == 0 {
        return Size::new(0, font.character_size.height);
    }
    let width = n * font.character_size.width + (n - 1) * font.character_spacing;
    Size::new(width, font.character_size.height)
}

/// Largest font (by rendered width of `sample`) that still fits `max_width`.
pub fn font_for_max_width<'a>(
    candidates: &[&'a MonoFont<'a>],
    sample: &str,
    max_width: u32,
) -> Option<&'a MonoFont<'a>> {
    candidates
        .iter()
        .copied()
        .map(|font| (text_size(sample, font).width, font))
        .filter(|(w, _)| *w <= max_width)
        .max_by_key(|(w, _)| *w)
        .map(|(_, font)| font)
}

/// Fractional justification of a label around its anchor.
///
/// `xa`/`ya` of 0 put the anchor on the left/top edge of the text, 1 on the
/// right/bottom edge, 0.5 centres. Values outside 0..1 push the text clear
/// of the anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPlacer {
    pub xa: f32,
    pub ya: f32,
}

impl TextPlacer {
    pub const TOP_LEFT: TextPlacer = TextPlacer { xa: 0.0, ya: 0.0 };

    pub fn new(xa: f32, ya: f32) -> Self {
        Self { xa, ya }
    }

    /// Top-left of the text box. With `clamp` the box is kept inside
    /// `0..clamp`; a box larger than `clamp` is pinned to 0 and overflows
    /// on the far edge.
    pub fn position(&self, anchor: PointF, text: Size, clamp: Option<Size>) -> Point {
        let (w, h) = (text.width as f32, text.height as f32);
        let mut x = anchor.x - w * self.xa;
        let mut y = anchor.y - h * self.ya;
        if let Some(bounds) = clamp {
            x = x.min(bounds.width as f32 - w).max(0.0);
            y = y.min(bounds.height as f32 - h).max(0.0);
        }
        Point::new(x.round() as i32, y.round() as i32)
    }

    /// Draw `text` in ink and return the rectangle it occupies.
    pub fn draw<D>(
        &self,
        target: &mut D,
        anchor: PointF,
        text: &str,
        font: &MonoFont<'_>,
        clamp: Option<Size>,
    ) -> Result<Rectangle, D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let size = text_size(text, font);
        let top_left = self.position(anchor, size, clamp);
        Text::with_baseline(text, top_left, MonoTextStyle::new(font, INK), Baseline::Top)
            .draw(target)?;
        Ok(Rectangle::new(top_left, size))
    }
}
