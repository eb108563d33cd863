/*
 *  bitmap.rs
 *
 *  wxpanel - minute-true weather panel
 *	(c) 2020-26 Stuart Hunter
 *
 *	Runtime-sized pixel buffers the widgets and chart layers draw into
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
use std::io::{self, Write};

use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{BinaryColor, Gray8, GrayColor, PixelColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Paper colour of a 1-bit bitmap. `BinaryColor::On` is ink.
pub const PAPER: BinaryColor = BinaryColor::Off;
pub const INK: BinaryColor = BinaryColor::On;

/// A runtime-sized bitmap usable as an embedded-graphics target.
///
/// 1-bit bitmaps (`Bitmap<BinaryColor>`) are what the panel composites;
/// `Bitmap<Gray8>` is the 8-bit intermediate for the cloud band.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap<C: PixelColor> {
    buf: Vec<C>,
    w: usize,
    h: usize,
}

impl<C: PixelColor> Bitmap<C> {
    pub fn new(width: u32, height: u32, fill: C) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![fill; w * h], w, h }
    }

    pub fn width(&self) -> u32 { self.w as u32 }
    pub fn height(&self) -> u32 { self.h as u32 }

    pub fn as_slice(&self) -> &[C] { &self.buf }

    pub fn fill(&mut self, color: C) {
        self.buf.fill(color);
    }

    /// Map (x,y) to linear index; None when outside the bitmap
    #[inline]
    fn idx(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 {
            let (x, y) = (x as usize, y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<C> {
        self.idx(x, y).map(|i| self.buf[i])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: C) {
        if let Some(i) = self.idx(x, y) {
            self.buf[i] = color;
        }
    }

    /// Copy `src` onto this bitmap with its top-left at (x, y).
    ///
    /// Every source pixel overwrites, paper included. Parts of `src` that
    /// fall outside this bitmap are dropped.
    pub fn blit(&mut self, src: &Bitmap<C>, x: i32, y: i32) {
        for sy in 0..src.h {
            let ty = y + sy as i32;
            if ty < 0 || ty as usize >= self.h {
                continue;
            }
            for sx in 0..src.w {
                let tx = x + sx as i32;
                if let Some(i) = self.idx(tx, ty) {
                    self.buf[i] = src.buf[sy * src.w + sx];
                }
            }
        }
    }
}

impl Bitmap<BinaryColor> {
    pub fn count_ink(&self) -> usize {
        self.buf.iter().filter(|&&p| p == INK).count()
    }

    /// Plain PBM (P1), 1 = ink.
    pub fn write_pbm<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "P1")?;
        writeln!(out, "{} {}", self.w, self.h)?;
        for row in self.buf.chunks(self.w.max(1)) {
            let line: Vec<&str> = row
                .iter()
                .map(|&p| if p == INK { "1" } else { "0" })
                .collect();
            writeln!(out, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

impl Bitmap<Gray8> {
    pub fn luma(&self, x: i32, y: i32) -> Option<u8> {
        self.pixel(x, y).map(|p| p.luma())
    }
}

impl<C: PixelColor> OriginDimensions for Bitmap<C> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl<C: PixelColor> DrawTarget for Bitmap<C> {
    type Color = C;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p.x, p.y) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        // clip once, then fill rows
        let area = area.intersection(&self.bounding_box());
        let Size { width, height } = area.size;
        if width == 0 || height == 0 {
            return Ok(());
        }
        let (x0, y0) = (area.top_left.x as usize, area.top_left.y as usize);
        for row in y0..y0 + height as usize {
            let base = row * self.w;
            self.buf[base + x0..base + x0 + width as usize].fill(color);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    #[test]
    fn test_new_bitmap_is_paper() {
        let bmp = Bitmap::new(10, 4, PAPER);
        assert_eq!(bmp.size(), Size::new(10, 4));
        assert_eq!(bmp.count_ink(), 0);
    }

    #[test]
    fn test_out_of_bounds_pixels_are_ignored() {
        let mut bmp = Bitmap::new(4, 4, PAPER);
        bmp.set_pixel(-1, 0, INK);
        bmp.set_pixel(4, 0, INK);
        bmp.set_pixel(0, 7, INK);
        assert_eq!(bmp.count_ink(), 0);
        assert_eq!(bmp.pixel(9, 9), None);
    }

    #[test]
    fn test_drawing_through_embedded_graphics() {
        let mut bmp = Bitmap::new(16, 16, PAPER);
        Line::new(Point::new(0, 0), Point::new(15, 0))
            .into_styled(PrimitiveStyle::with_stroke(INK, 1))
            .draw(&mut bmp)
            .unwrap();
        assert_eq!(bmp.count_ink(), 16);
        assert_eq!(bmp.pixel(15, 0), Some(INK));
        assert_eq!(bmp.pixel(0, 1), Some(PAPER));
    }

    #[test]
    fn test_fill_solid_clips_to_bounds() {
        let mut bmp = Bitmap::new(8, 8, PAPER);
        bmp.fill_solid(&Rectangle::new(Point::new(-4, 6), Size::new(20, 10)), INK)
            .unwrap();
        assert_eq!(bmp.count_ink(), 16);
    }

    #[test]
    fn test_blit_overwrites_including_paper() {
        let mut canvas = Bitmap::new(8, 8, INK);
        let patch = Bitmap::new(3, 2, PAPER);
        canvas.blit(&patch, 6, 7);
        // only the 2x1 visible corner lands
        assert_eq!(canvas.count_ink(), 64 - 2);
        assert_eq!(canvas.pixel(6, 7), Some(PAPER));
        assert_eq!(canvas.pixel(7, 7), Some(PAPER));
        assert_eq!(canvas.pixel(5, 7), Some(INK));
    }

    #[test]
    fn test_write_pbm() {
        let mut bmp = Bitmap::new(3, 2, PAPER);
        bmp.set_pixel(1, 1, INK);
        let mut out = Vec::new();
        bmp.write_pbm(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "P1\n3 2\n0 0 0\n0 1 0\n");
    }

    #[test]
    fn test_gray_luma() {
        let bmp = Bitmap::new(2, 2, Gray8::new(200));
        assert_eq!(bmp.luma(1, 1), Some(200));
        assert_eq!(bmp.luma(2, 1), None);
    }
}
