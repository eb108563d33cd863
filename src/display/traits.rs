/*
 *  display/traits.rs
 *
 *  wxpanel - minute-true weather panel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for the output panel
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use crate::bitmap::Bitmap;
use crate::display::error::PanelError;

/// The shared canvas every widget pushes its bitmaps to.
///
/// `draw` only accumulates; nothing reaches the physical output until
/// `flush`, which may block for as long as the hardware needs.
pub trait Panel {
    /// Composite `image` with its top-left at (x, y). Repeating the same
    /// call leaves the canvas unchanged.
    fn draw(&mut self, image: &Bitmap<BinaryColor>, x: i32, y: i32);

    /// Commit the accumulated canvas to the output.
    fn flush(&mut self) -> Result<(), PanelError>;
}

/// A rendered bitmap together with its fixed offset on the canvas.
///
/// Owned by the render call that produced it and consumed by `draw_on`.
#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub image: Bitmap<BinaryColor>,
    pub origin: Point,
}

impl Placed {
    pub fn new(image: Bitmap<BinaryColor>, origin: Point) -> Self {
        Self { image, origin }
    }

    pub fn draw_on<P: Panel + ?Sized>(self, panel: &mut P) {
        panel.draw(&self.image, self.origin.x, self.origin.y);
    }
}
