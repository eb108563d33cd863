/*
 *  raster.rs
 *
 *  wxpanel - minute-true weather panel
 *	(c) 2020-26 Stuart Hunter
 *
 *	Drawing helpers shared by the chart layers and widgets
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

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, Polyline, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle};

/// Plot-space point. Chart maths stays in f32 until the pixel is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_pixel(self) -> Point {
        Point::new(self.x.round() as i32, self.y.round() as i32)
    }
}

/// Connected line through `points` with the given stroke width.
pub fn draw_polyline<D, C>(target: &mut D, points: &[PointF], color: C, width: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    if points.len() < 2 {
        return Ok(());
    }
    let pixels: Vec<Point> = points.iter().map(|p| p.to_pixel()).collect();
    Polyline::new(&pixels)
        .into_styled(PrimitiveStyle::with_stroke(color, width))
        .draw(target)
}

pub fn draw_line<D, C>(target: &mut D, start: Point, end: Point, color: C, width: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    Line::new(start, end)
        .into_styled(PrimitiveStyleBuilder::new().stroke_width(width).stroke_color(color).build())
        .draw(target)
}

/// Horizontal line with every `step`-th pixel set, starting at x = 0.
pub fn draw_dotted_hline<D, C>(target: &mut D, y: i32, width: u32, step: usize, color: C) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    let step = step.max(1);
    target.draw_iter((0..width as i32).step_by(step).map(|x| Pixel(Point::new(x, y), color)))
}

/// Filled rectangle whose corners are both inclusive.
pub fn fill_rect_inclusive<D, C>(target: &mut D, a: Point, b: Point, color: C) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    if b.x < a.x || b.y < a.y {
        return Ok(());
    }
    Rectangle::with_corners(a, b)
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(target)
}

/// Scan-line fill of a closed polygon (even-odd rule), outline included.
///
/// embedded-graphics ships no polygon primitive; rows are sampled at pixel
/// centres and each span is rounded to whole pixels.
pub fn fill_polygon<D, C>(target: &mut D, vertices: &[PointF], color: C) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C> + OriginDimensions,
    C: PixelColor,
{
    if vertices.len() < 3 {
        return Ok(());
    }
    let height = target.size().height as i32;
    let min_y = vertices.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_y = vertices.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
    let y_start = (min_y.floor() as i32).max(0);
    let y_end = (max_y.ceil() as i32).min(height - 1);

    let mut crossings: Vec<f32> = Vec::with_capacity(vertices.len());
    for y in y_start..=y_end {
        let sample = y as f32 + 0.5;
        crossings.clear();
        for (i, a) in vertices.iter().enumerate() {
            let b = vertices[(i + 1) % vertices.len()];
            if (a.y <= sample && b.y > sample) || (b.y <= sample && a.y > sample) {
                let t = (sample - a.y) / (b.y - a.y);
                crossings.push(a.x + t * (b.x - a.x));
            }
        }
        crossings.sort_by(|l, r| l.total_cmp(r));
        for span in crossings.chunks_exact(2) {
            let x0 = span[0].round() as i32;
            let x1 = span[1].round() as i32;
            if x1 >= x0 {
                fill_rect_inclusive(target, Point::new(x0, y), Point::new(x1, y), color)?;
            }
        }
    }

    // close the gaps the centre sampling leaves on shallow edges
    let mut outline: Vec<Point> = vertices.iter().map(|p| p.to_pixel()).collect();
    outline.push(vertices[0].to_pixel());
    Polyline::new(&outline)
        .into_styled(PrimitiveStyle::with_stroke(color, 1))
        .draw(target)
}
