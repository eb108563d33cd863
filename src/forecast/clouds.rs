/*
 *  forecast/clouds.rs
 *
 *  wxpanel - minute-true weather panel
 *	(c) 2020-26 Stuart Hunter
 *
 *	Cloud cover band: grayscale strip dithered down to 1-bit
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

use chrono::{TimeDelta, TimeZone};
use embedded_graphics::pixelcolor::{BinaryColor, Gray8, GrayColor};
use embedded_graphics::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bitmap::{Bitmap, INK, PAPER};
use crate::geometry::ChartMapper;
use crate::permute::PermutationCache;
use crate::raster::fill_rect_inclusive;
use crate::weather::ForecastPoint;

/// Luma below this quantises to ink.
const THRESHOLD: f32 = 128.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DitherMode {
    /// Error diffusion, 7/16 right, 3/16 down-left, 5/16 down, 1/16 down-right
    #[default]
    FloydSteinberg,
    /// Ordered threshold, per-pixel level from a stable permutation
    Scattered,
}

/// Draws the cloud band: one rectangle per point, one hour wide and
/// centred on the point, darker for more cover. Later points overwrite.
#[derive(Debug)]
pub struct CloudBandRenderer {
    width: u32,
    height: u32,
    mode: DitherMode,
    permutations: PermutationCache,
}

impl CloudBandRenderer {
    pub fn new(width: u32, height: u32, mode: DitherMode) -> Self {
        Self {
            width,
            height,
            mode,
            permutations: PermutationCache::new(),
        }
    }

    pub fn render<Tz: TimeZone>(&mut self, points: &[ForecastPoint], mapper: &ChartMapper<Tz>) -> Bitmap<BinaryColor> {
        let gray = self.render_gray(points, mapper);
        match self.mode {
            DitherMode::FloydSteinberg => floyd_steinberg(&gray),
            DitherMode::Scattered => scattered(&gray, &mut self.permutations),
        }
    }

    /// 8-bit strip before dithering: white is clear sky, black full cover.
    pub fn render_gray<Tz: TimeZone>(&self, points: &[ForecastPoint], mapper: &ChartMapper<Tz>) -> Bitmap<Gray8> {
        let mut strip = Bitmap::new(self.width, self.height, Gray8::WHITE);
        let half_hour = TimeDelta::minutes(30);
        for point in points {
            // truncation toward zero, matching integer pixel columns
            let x0 = mapper.map_x(&(point.time - half_hour)) as i32;
            let x1 = mapper.map_x(&(point.time + half_hour)) as i32;
            let luma = cover_luma(point.cloud_cover);
            // bottom corner one past the strip, clipped by the bitmap
            fill_rect_inclusive(
                &mut strip,
                Point::new(x0, 0),
                Point::new(x1, self.height as i32),
                Gray8::new(luma),
            )
            .unwrap_or_else(|never| match never {});
        }
        strip
    }
}

/// `255 * (1 - cover)`, cover clamped to 0..=1.
pub fn cover_luma(cloud_cover: f64) -> u8 {
    (255.0 * (1.0 - cloud_cover.clamp(0.0, 1.0))) as u8
}

pub fn floyd_steinberg(gray: &Bitmap<Gray8>) -> Bitmap<BinaryColor> {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let mut levels: Vec<f32> = gray.as_slice().iter().map(|p| p.luma() as f32).collect();
    let mut out = Bitmap::new(gray.width(), gray.height(), PAPER);

    for y in 0..h {
        for x in 0..w {
            let old = levels[y * w + x];
            let (new, color) = if old < THRESHOLD { (0.0, INK) } else { (255.0, PAPER) };
            out.set_pixel(x as i32, y as i32, color);

            let error = old - new;
            let mut spread = |dx: isize, dy: usize, weight: f32| {
                let nx = x as isize + dx;
                let ny = y + dy;
                if nx >= 0 && (nx as usize) < w && ny < h {
                    levels[ny * w + nx as usize] += error * weight / 16.0;
                }
            };
            spread(1, 0, 7.0);
            spread(-1, 1, 3.0);
            spread(0, 1, 5.0);
            spread(1, 1, 1.0);
        }
    }
    out
}

/// Each pixel gets its own threshold level, `rank` of the pixel index under
/// the cached permutation of `0..w*h`.
pub fn scattered(gray: &Bitmap<Gray8>, permutations: &mut PermutationCache) -> Bitmap<BinaryColor> {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let limit = w * h;
    let mut out = Bitmap::new(gray.width(), gray.height(), PAPER);
    if limit == 0 {
        return out;
    }
    let table = permutations.table(limit);
    for (i, pixel) in gray.as_slice().iter().enumerate() {
        let level = (table[i] as f32 + 0.5) * 255.0 / limit as f32;
        if (pixel.luma() as f32) < level {
            out.set_pixel((i % w) as i32, (i / w) as i32, INK);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CLOUD_COVER_HEIGHT, PlotGeometry, TimeWindow};
    use chrono::Utc;
    use embedded_graphics::mono_font::iso_8859_1::FONT_6X10;

    fn setup(cover: impl Fn(i64) -> f64) -> (Vec<ForecastPoint>, ChartMapper<Utc>, PlotGeometry) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let window = TimeWindow::starting_at(start, 47).unwrap();
        let geometry = PlotGeometry::from_scale_font(&FONT_6X10);
        let points = (-1..=48)
            .map(|h| ForecastPoint {
                time: start + TimeDelta::hours(h),
                temperature: 10.0,
                dew_point: 5.0,
                precip_intensity: 0.0,
                cloud_cover: cover(h),
            })
            .collect();
        (points, ChartMapper::new(window, &geometry), geometry)
    }

    #[test]
    fn test_cover_extremes_before_dither() {
        assert_eq!(cover_luma(1.0), 0);
        assert_eq!(cover_luma(0.0), 255);

        let (points, mapper, geo) = setup(|h| if h < 24 { 1.0 } else { 0.0 });
        let renderer = CloudBandRenderer::new(geo.plot_width, CLOUD_COVER_HEIGHT, DitherMode::default());
        let gray = renderer.render_gray(&points, &mapper);
        assert_eq!(gray.luma(10, 5), Some(0));
        assert_eq!(gray.luma(360, 19), Some(255));
    }

    #[test]
    fn test_later_points_overwrite() {
        // adjacent hour rectangles share their boundary column
        let (points, mapper, geo) = setup(|h| if h % 2 == 0 { 1.0 } else { 0.0 });
        let renderer = CloudBandRenderer::new(geo.plot_width, CLOUD_COVER_HEIGHT, DitherMode::default());
        let gray = renderer.render_gray(&points, &mapper);
        let boundary = mapper.map_x(&(points[2].time + TimeDelta::minutes(30))) as i32;
        // points[3] (even hour, overcast) was painted after points[2]
        assert_eq!(gray.luma(boundary, 0), Some(0));
        assert_eq!(gray.luma(boundary - 1, 0), Some(255));
    }

    #[test]
    fn test_floyd_steinberg_preserves_density() {
        let gray = Bitmap::new(100, 20, Gray8::new(128));
        let bits = floyd_steinberg(&gray);
        let ink = bits.count_ink() as f32 / 2000.0;
        assert!((ink - 0.5).abs() < 0.05, "ink fraction {}", ink);

        assert_eq!(floyd_steinberg(&Bitmap::new(10, 10, Gray8::BLACK)).count_ink(), 100);
        assert_eq!(floyd_steinberg(&Bitmap::new(10, 10, Gray8::WHITE)).count_ink(), 0);
    }

    #[test]
    fn test_scattered_is_stable_and_proportional() {
        let gray = Bitmap::new(40, 20, Gray8::new(64));
        let a = scattered(&gray, &mut PermutationCache::new());
        let b = scattered(&gray, &mut PermutationCache::new());
        assert_eq!(a, b);
        let ink = a.count_ink() as f32 / 800.0;
        assert!((ink - 0.75).abs() < 0.02, "ink fraction {}", ink);

        let mut cache = PermutationCache::new();
        assert_eq!(scattered(&Bitmap::new(8, 4, Gray8::BLACK), &mut cache).count_ink(), 32);
        assert_eq!(scattered(&Bitmap::new(8, 4, Gray8::WHITE), &mut cache).count_ink(), 0);
    }

    #[test]
    fn test_render_modes_differ_but_agree_on_solid_cover() {
        let (points, mapper, geo) = setup(|_| 1.0);
        let mut fs = CloudBandRenderer::new(geo.plot_width, CLOUD_COVER_HEIGHT, DitherMode::FloydSteinberg);
        let mut sc = CloudBandRenderer::new(geo.plot_width, CLOUD_COVER_HEIGHT, DitherMode::Scattered);
        let full = (geo.plot_width * CLOUD_COVER_HEIGHT) as usize;
        assert_eq!(fs.render(&points, &mapper).count_ink(), full);
        assert_eq!(sc.render(&points, &mapper).count_ink(), full);
    }
}
