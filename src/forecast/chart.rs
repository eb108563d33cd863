/*
 *  forecast/chart.rs
 *
 *  wxpanel - minute-true weather panel
 *	(c) 2020-26 Stuart Hunter
 *
 *	Forecast chart layers: precipitation, curves, scales and annotations
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

use std::convert::Infallible;
use std::fmt::Display;

use chrono::{DateTime, TimeDelta, TimeZone, Timelike};
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::iso_8859_1::{FONT_10X20, FONT_6X10};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use log::debug;

use crate::bitmap::{Bitmap, INK, PAPER};
use crate::geometry::{
    AxisRanger, ChartMapper, PlotGeometry, TIME_SCALE_PADDING, TimeWindow, ValueRange, PRECIP_RANGE,
};
use crate::raster::{PointF, draw_dotted_hline, draw_line, draw_polyline, fill_polygon};
use crate::textplace::{TextPlacer, text_size};
use crate::weather::ForecastPoint;

/// Axis labels, time labels and captions
pub const SCALE_FONT: &MonoFont<'static> = &FONT_6X10;
/// Min/max annotations and placeholder messages
pub const NOTE_FONT: &MonoFont<'static> = &FONT_10X20;

const TEMP_GRID_STEP: i64 = 5;
const PRECIP_GRID_STEP: usize = 2;
const GRID_DOT_STEP: usize = 3;
const TIME_LABEL_HOURS: u32 = 6;

const DEW_POINT_WIDTH: u32 = 1;
const TEMPERATURE_WIDTH: u32 = 2;

/// The four independently placed chart bitmaps.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayers {
    pub left_scale: Bitmap<BinaryColor>,
    pub right_scale: Bitmap<BinaryColor>,
    pub plot_area: Bitmap<BinaryColor>,
    pub time_scale: Bitmap<BinaryColor>,
}

impl ChartLayers {
    fn blank(geometry: &PlotGeometry) -> Self {
        let scale_height = geometry.vertical_scale_height();
        Self {
            left_scale: Bitmap::new(geometry.left_scale_width, scale_height, PAPER),
            right_scale: Bitmap::new(geometry.right_scale_width_with_label, scale_height, PAPER),
            plot_area: Bitmap::new(geometry.plot_width, geometry.plot_height, PAPER),
            time_scale: Bitmap::new(geometry.plot_width, geometry.time_scale_height, PAPER),
        }
    }
}

/// Draws the forecast chart for one window.
///
/// Layers go onto the plot area in a fixed order, later ones occluding
/// earlier ones: precipitation, dew point, temperature, temperature grid,
/// day lines, min/max notes. Scale strips only carry labels.
#[derive(Clone)]
pub struct ChartRenderer {
    geometry: PlotGeometry,
    scale_font: &'static MonoFont<'static>,
    note_font: &'static MonoFont<'static>,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRenderer {
    pub fn new() -> Self {
        Self::with_fonts(SCALE_FONT, NOTE_FONT)
    }

    /// Scale widths follow `scale_font`, see `PlotGeometry::from_scale_font`.
    pub fn with_fonts(scale_font: &'static MonoFont<'static>, note_font: &'static MonoFont<'static>) -> Self {
        Self {
            geometry: PlotGeometry::from_scale_font(scale_font),
            scale_font,
            note_font,
        }
    }

    pub fn geometry(&self) -> &PlotGeometry {
        &self.geometry
    }

    /// Render `points` (already narrowed to the window) into fresh layers.
    /// With no points the plot area carries a "no data" note instead.
    pub fn render<Tz>(&self, points: &[ForecastPoint], window: &TimeWindow<Tz>) -> ChartLayers
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        match self.try_render(points, window) {
            Ok(layers) => layers,
            Err(never) => match never {},
        }
    }

    /// Blank layers with `message` centred in the plot area.
    pub fn placeholder(&self, message: &str) -> ChartLayers {
        let mut layers = ChartLayers::blank(&self.geometry);
        match self.draw_message(&mut layers.plot_area, message) {
            Ok(()) => layers,
            Err(never) => match never {},
        }
    }

    fn try_render<Tz>(&self, points: &[ForecastPoint], window: &TimeWindow<Tz>) -> Result<ChartLayers, Infallible>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut layers = ChartLayers::blank(&self.geometry);
        let values = points.iter().flat_map(|p| [p.temperature, p.dew_point]);
        let Some(temp_range) = AxisRanger::temperature(values) else {
            debug!("No forecast points in window");
            self.draw_message(&mut layers.plot_area, "no data")?;
            return Ok(layers);
        };
        let precip_range = AxisRanger::precipitation();
        let mapper = ChartMapper::new(window.clone(), &self.geometry);
        debug!(
            "Chart of {} points, temperature base {:.1} span {:.1}",
            points.len(),
            temp_range.base,
            temp_range.span
        );

        self.draw_precipitation(&mut layers.plot_area, &mapper, points, &precip_range)?;
        self.draw_curves(&mut layers.plot_area, &mapper, points, &temp_range)?;
        self.draw_temperature_scale(&mut layers, &mapper, &temp_range)?;
        self.draw_precipitation_scale(&mut layers.right_scale, &mapper, &precip_range)?;
        self.draw_captions(&mut layers)?;
        self.draw_time_scale(&mut layers, &mapper)?;
        self.draw_extremes(&mut layers.plot_area, &mapper, points, &temp_range)?;
        Ok(layers)
    }

    fn draw_precipitation<Tz: TimeZone>(
        &self,
        plot: &mut Bitmap<BinaryColor>,
        mapper: &ChartMapper<Tz>,
        points: &[ForecastPoint],
        range: &ValueRange,
    ) -> Result<(), Infallible> {
        let window = mapper.window();
        let mut outline: Vec<PointF> = points
            .iter()
            .map(|p| mapper.map_point(&p.time, range.normalize(p.precip_intensity)))
            .collect();
        // close along the baseline, end edge first
        outline.push(mapper.map_point(window.end(), 0.0));
        outline.push(mapper.map_point(window.start(), 0.0));
        fill_polygon(plot, &outline, INK)
    }

    fn draw_curves<Tz: TimeZone>(
        &self,
        plot: &mut Bitmap<BinaryColor>,
        mapper: &ChartMapper<Tz>,
        points: &[ForecastPoint],
        range: &ValueRange,
    ) -> Result<(), Infallible> {
        let dew: Vec<PointF> = points
            .iter()
            .map(|p| mapper.map_point(&p.time, range.normalize(p.dew_point)))
            .collect();
        draw_polyline(plot, &dew, INK, DEW_POINT_WIDTH)?;

        let temperature: Vec<PointF> = points
            .iter()
            .map(|p| mapper.map_point(&p.time, range.normalize(p.temperature)))
            .collect();
        draw_polyline(plot, &temperature, INK, TEMPERATURE_WIDTH)
    }

    fn draw_temperature_scale<Tz: TimeZone>(
        &self,
        layers: &mut ChartLayers,
        mapper: &ChartMapper<Tz>,
        range: &ValueRange,
    ) -> Result<(), Infallible> {
        let label_anchor_x = self.geometry.left_scale_width as f32;
        for mark in temperature_marks(range) {
            let y = mapper.map_y(range.normalize(mark as f64));
            TextPlacer::new(1.0, 0.5).draw(
                &mut layers.left_scale,
                PointF::new(label_anchor_x, y),
                &mark.to_string(),
                self.scale_font,
                None,
            )?;
            draw_dotted_hline(&mut layers.plot_area, y.round() as i32, self.geometry.plot_width, GRID_DOT_STEP, INK)?;
        }
        Ok(())
    }

    fn draw_precipitation_scale<Tz: TimeZone>(
        &self,
        right: &mut Bitmap<BinaryColor>,
        mapper: &ChartMapper<Tz>,
        range: &ValueRange,
    ) -> Result<(), Infallible> {
        let x = (self.geometry.right_scale_width_with_label - self.geometry.right_scale_width) as f32;
        for mark in (0..=PRECIP_RANGE as i64).step_by(PRECIP_GRID_STEP) {
            let label = mark.to_string();
            let half = text_size(&label, self.scale_font).height as f32 / 2.0;
            let y = mapper.map_y(range.normalize(mark as f64));
            TextPlacer::TOP_LEFT.draw(right, PointF::new(x, y - half), &label, self.scale_font, None)?;
        }
        Ok(())
    }

    fn draw_captions(&self, layers: &mut ChartLayers) -> Result<(), Infallible> {
        let y = (self.geometry.plot_height as i32 + TIME_SCALE_PADDING) as f32;
        TextPlacer::TOP_LEFT.draw(&mut layers.right_scale, PointF::new(0.0, y), "mm", self.scale_font, None)?;
        TextPlacer::TOP_LEFT.draw(&mut layers.left_scale, PointF::new(2.0, y), "°C", self.scale_font, None)?;
        Ok(())
    }

    fn draw_time_scale<Tz>(&self, layers: &mut ChartLayers, mapper: &ChartMapper<Tz>) -> Result<(), Infallible>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let label_y = TIME_SCALE_PADDING as f32;
        let bottom = self.geometry.plot_height as i32;
        for mark in time_scale_marks(mapper.window()) {
            let x = mapper.map_x(&mark);
            let label = mark.format("%H:%M").to_string();
            TextPlacer::new(0.5, 0.0).draw(
                &mut layers.time_scale,
                PointF::new(x, label_y),
                &label,
                self.scale_font,
                None,
            )?;
            if mark.hour() == 0 && mark.minute() == 0 {
                let line_x = (x - 1.0).round() as i32;
                draw_line(&mut layers.plot_area, Point::new(line_x, 0), Point::new(line_x, bottom), INK, 1)?;
            }
        }
        Ok(())
    }

    fn draw_extremes<Tz: TimeZone>(
        &self,
        plot: &mut Bitmap<BinaryColor>,
        mapper: &ChartMapper<Tz>,
        points: &[ForecastPoint],
        range: &ValueRange,
    ) -> Result<(), Infallible> {
        let Some((coldest, warmest)) = temperature_extremes(points) else {
            return Ok(());
        };
        let bounds = Some(plot.size());
        for (point, placer) in [(coldest, TextPlacer::new(0.5, -0.1)), (warmest, TextPlacer::new(0.5, 1.1))] {
            let anchor = mapper.map_point(&point.time, range.normalize(point.temperature));
            let label = format!("{:.1}°C", point.temperature);
            placer.draw(plot, anchor, &label, self.note_font, bounds)?;
        }
        Ok(())
    }

    fn draw_message(&self, plot: &mut Bitmap<BinaryColor>, message: &str) -> Result<(), Infallible> {
        let size = plot.size();
        let centre = PointF::new(size.width as f32 / 2.0, size.height as f32 / 2.0);
        TextPlacer::new(0.5, 0.5).draw(plot, centre, message, self.note_font, Some(size))?;
        Ok(())
    }
}

/// Multiples of 5 from the first one at or above `base`, stopping before
/// the first multiple at or above the range top.
fn temperature_marks(range: &ValueRange) -> impl Iterator<Item = i64> {
    let first = (range.base / TEMP_GRID_STEP as f64).ceil() as i64 * TEMP_GRID_STEP;
    let last = (range.top() / TEMP_GRID_STEP as f64).ceil() as i64 * TEMP_GRID_STEP;
    (first..last).step_by(TEMP_GRID_STEP as usize)
}

/// Label times for the time strip.
///
/// Counting from the 6-hour boundary at or before the window start (local
/// wall clock), every following boundary up to and including the end.
/// Wall times that do not exist locally are skipped.
pub fn time_scale_marks<Tz: TimeZone>(window: &TimeWindow<Tz>) -> Vec<DateTime<Tz>> {
    let tz = window.start().timezone();
    let start = window.start().naive_local();
    let step = TimeDelta::hours(TIME_LABEL_HOURS.into());
    let last_wall = window.end().naive_local().checked_add_signed(TimeDelta::days(1));
    let hour = start.hour() - start.hour() % TIME_LABEL_HOURS;
    let Some(mut wall) = start.date().and_hms_opt(hour, 0, 0) else {
        return Vec::new();
    };

    let mut marks = Vec::new();
    loop {
        wall = match wall.checked_add_signed(step) {
            Some(next) if last_wall.is_none_or(|last| next <= last) => next,
            _ => break,
        };
        let Some(mark) = tz.from_local_datetime(&wall).earliest() else {
            continue;
        };
        if mark > *window.end() {
            break;
        }
        marks.push(mark);
    }
    marks
}

/// Coldest and warmest points; ties go to the earliest point.
pub fn temperature_extremes(points: &[ForecastPoint]) -> Option<(&ForecastPoint, &ForecastPoint)> {
    let (first, rest) = points.split_first()?;
    Some(rest.iter().fold((first, first), |(lo, hi), p| {
        (
            if p.temperature < lo.temperature { p } else { lo },
            if p.temperature > hi.temperature { p } else { hi },
        )
    }))
}
