/*
 *  geometry.rs
 *
 *  wxpanel - minute-true weather panel
 *	(c) 2020-26 Stuart Hunter
 *
 *	Chart geometry: plot layout, value ranges and the time/value to pixel map
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

use chrono::{DateTime, TimeDelta, TimeZone};
use embedded_graphics::mono_font::MonoFont;

use crate::raster::PointF;
use crate::textplace::text_size;

pub const CANVAS_WIDTH: u32 = 400;
pub const CANVAS_HEIGHT: u32 = 300;

pub const PLOT_AREA_HEIGHT: u32 = 183;
pub const TIME_SCALE_HEIGHT: u32 = 15;
pub const TIME_SCALE_PADDING: i32 = 3;
pub const CLOUD_COVER_HEIGHT: u32 = 20;

/// Precipitation axis is fixed at 0..5 mm/h
pub const PRECIP_RANGE: f64 = 5.0;
/// degrees
pub const MIN_TEMP_RANGE: f64 = 15.0;
/// degrees
pub const TEMP_PADDING: f64 = 2.5;

/// Forecast horizon to render, `start < end` always holds.
#[derive(Debug, Clone)]
pub struct TimeWindow<Tz: TimeZone> {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl<Tz: TimeZone> TimeWindow<Tz> {
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Option<Self> {
        if start < end { Some(Self { start, end }) } else { None }
    }

    /// `now .. now + hours`, None if the end is not representable.
    pub fn starting_at(now: DateTime<Tz>, hours: u32) -> Option<Self> {
        let end = now.clone().checked_add_signed(TimeDelta::hours(hours.into()))?;
        Self::new(now, end)
    }

    pub fn start(&self) -> &DateTime<Tz> { &self.start }
    pub fn end(&self) -> &DateTime<Tz> { &self.end }

    pub fn span_secs(&self) -> f64 {
        (self.end.timestamp_millis() - self.start.timestamp_millis()) as f64 / 1000.0
    }
}

/// Mapping domain for one axis, `span > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub base: f64,
    pub span: f64,
}

impl ValueRange {
    /// `(v - base) / span`, not clamped
    pub fn normalize(&self, v: f64) -> f64 {
        (v - self.base) / self.span
    }

    pub fn top(&self) -> f64 {
        self.base + self.span
    }
}

/// Auto-ranging for the temperature axis, fixed range for precipitation.
pub struct AxisRanger;

impl AxisRanger {
    /// Range covering every value with at least `MIN_TEMP_RANGE` of width,
    /// padded by `TEMP_PADDING` either side. None for an empty input.
    pub fn temperature<I>(values: I) -> Option<ValueRange>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for v in values.into_iter().filter(|v| v.is_finite()) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if lo > hi {
            return None;
        }

        let raw_span = hi - lo;
        let (base, span) = if raw_span > MIN_TEMP_RANGE {
            (lo, raw_span)
        } else {
            (lo - (MIN_TEMP_RANGE - raw_span) / 2.0, MIN_TEMP_RANGE)
        };
        Some(ValueRange {
            base: base - TEMP_PADDING,
            span: span + TEMP_PADDING * 2.0,
        })
    }

    pub fn precipitation() -> ValueRange {
        ValueRange { base: 0.0, span: PRECIP_RANGE }
    }
}

/// Fixed layout of the forecast chart, derived once from the scale font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotGeometry {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub plot_width: u32,
    pub plot_height: u32,
    pub left_scale_width: u32,
    pub right_scale_width: u32,
    pub right_scale_width_with_label: u32,
    pub time_scale_height: u32,
    pub cloud_cover_height: u32,
}

impl PlotGeometry {
    /// Scale strips are as wide as the widest label they carry.
    pub fn from_scale_font(font: &MonoFont<'_>) -> Self {
        let left_scale_width = text_size("-10", font).width;
        let right_scale_width = text_size("10", font).width;
        let right_scale_width_with_label = text_size("mm", font).width;
        Self {
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            plot_width: CANVAS_WIDTH - left_scale_width - right_scale_width,
            plot_height: PLOT_AREA_HEIGHT,
            left_scale_width,
            right_scale_width,
            right_scale_width_with_label,
            time_scale_height: TIME_SCALE_HEIGHT,
            cloud_cover_height: CLOUD_COVER_HEIGHT,
        }
    }

    /// Height of the side scales: plot area plus the time strip below it.
    pub fn vertical_scale_height(&self) -> u32 {
        self.plot_height + self.time_scale_height
    }
}

/// Shared coordinate system for every chart layer.
#[derive(Debug, Clone)]
pub struct ChartMapper<Tz: TimeZone> {
    window: TimeWindow<Tz>,
    plot_width: f64,
    plot_height: f64,
}

impl<Tz: TimeZone> ChartMapper<Tz> {
    pub fn new(window: TimeWindow<Tz>, geometry: &PlotGeometry) -> Self {
        Self {
            window,
            plot_width: geometry.plot_width as f64,
            plot_height: geometry.plot_height as f64,
        }
    }

    pub fn window(&self) -> &TimeWindow<Tz> {
        &self.window
    }

    /// Linear in time; times outside the window land outside `0..=plot_width`.
    pub fn map_x<T: TimeZone>(&self, t: &DateTime<T>) -> f32 {
        let rel = (t.timestamp_millis() - self.window.start.timestamp_millis()) as f64 / 1000.0;
        (rel * self.plot_width / self.window.span_secs()) as f32
    }

    /// 1.0 maps to the top edge, 0.0 to the bottom.
    pub fn map_y(&self, normalized: f64) -> f32 {
        (self.plot_height * (1.0 - normalized)) as f32
    }

    pub fn map_point<T: TimeZone>(&self, t: &DateTime<T>, normalized: f64) -> PointF {
        PointF::new(self.map_x(t), self.map_y(normalized))
    }
}
