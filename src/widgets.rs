/*
 *  widgets.rs
 *
 *  wxpanel - minute-true weather panel
 *	(c) 2020-26 Stuart Hunter
 *
 *	Clock, room temperature, CO2 and forecast widgets
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

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::iso_8859_1::{FONT_10X20, FONT_9X15};
use embedded_graphics::prelude::*;
use log::{debug, warn};
use profont::{
    PROFONT_7_POINT, PROFONT_9_POINT, PROFONT_10_POINT, PROFONT_12_POINT, PROFONT_14_POINT,
    PROFONT_18_POINT, PROFONT_24_POINT,
};

use crate::bitmap::{Bitmap, PAPER};
use crate::display::{Panel, Placed};
use crate::forecast::{ForecastCompositor, ForecastFrame};
use crate::geometry::{CANVAS_WIDTH, TimeWindow};
use crate::raster::PointF;
use crate::sensors::{Co2Source, TemperatureSource};
use crate::textplace::{TextPlacer, font_for_max_width, text_size};
use crate::weather::{ForecastProvider, WeatherApiError, select_window};

const CLOCK_FONT: &MonoFont<'static> = &PROFONT_24_POINT;
const DATE_FONTS: [&MonoFont<'static>; 7] = [
    &PROFONT_7_POINT,
    &PROFONT_9_POINT,
    &PROFONT_10_POINT,
    &PROFONT_12_POINT,
    &PROFONT_14_POINT,
    &PROFONT_18_POINT,
    &PROFONT_24_POINT,
];
const TEMP_FONT: &MonoFont<'static> = &FONT_10X20;
const CO2_FONT: &MonoFont<'static> = &FONT_9X15;

/// Gap between the time and date lines
const DATE_SPACING: u32 = 5;
/// Gap between the temperature and CO2 boxes
const CO2_SPACING: i32 = 10;

pub const NO_FORECAST: &str = "no forecast";

/// `HH:MM` over a centred `YYYY-MM-DD`, top right of the canvas.
#[derive(Clone)]
pub struct ClockWidget {
    date_font: &'static MonoFont<'static>,
    time_size: Size,
    date_size: Size,
}

impl Default for ClockWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockWidget {
    pub fn new() -> Self {
        let time_size = text_size("00:00", CLOCK_FONT);
        // largest date font no wider than the time line, else the smallest
        let date_font = font_for_max_width(&DATE_FONTS, "0000-00-00", time_size.width).unwrap_or(DATE_FONTS[0]);
        let date_size = text_size("0000-00-00", date_font);
        debug!(
            "Clock {}x{}, date font {}x{}",
            time_size.width, time_size.height, date_font.character_size.width, date_font.character_size.height
        );
        Self { date_font, time_size, date_size }
    }

    pub fn size(&self) -> Size {
        Size::new(self.time_size.width, self.time_size.height + DATE_SPACING + self.date_size.height)
    }

    pub fn date_font(&self) -> &'static MonoFont<'static> {
        self.date_font
    }

    pub fn render<Tz>(&self, at: &DateTime<Tz>) -> Placed
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let size = self.size();
        let mut image = Bitmap::new(size.width, size.height, PAPER);
        let time = at.format("%H:%M").to_string();
        let date = at.format("%Y-%m-%d").to_string();

        let date_x = (self.time_size.width as i32 - self.date_size.width as i32) / 2;
        let date_y = (self.time_size.height + DATE_SPACING) as f32;
        TextPlacer::TOP_LEFT
            .draw(&mut image, PointF::new(0.0, 0.0), &time, CLOCK_FONT, None)
            .unwrap_or_else(|never| match never {});
        TextPlacer::TOP_LEFT
            .draw(&mut image, PointF::new(date_x as f32, date_y), &date, self.date_font, None)
            .unwrap_or_else(|never| match never {});

        Placed::new(image, Point::new((CANVAS_WIDTH - self.time_size.width) as i32, 0))
    }
}

/// Room temperature, top left. A failed reading shows `NaN`.
pub struct TemperatureWidget<S> {
    source: S,
    size: Size,
}

impl<S: TemperatureSource> TemperatureWidget<S> {
    pub fn new(source: S) -> Self {
        Self { source, size: text_size("-10.0°C", TEMP_FONT) }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub async fn render(&self) -> Placed {
        let reading = match self.source.read_celsius().await {
            Ok(celsius) => Some(celsius),
            Err(e) => {
                warn!("Temperature reading failed: {}", e);
                None
            }
        };
        self.render_reading(reading)
    }

    pub fn render_reading(&self, reading: Option<f64>) -> Placed {
        let text = match reading {
            Some(celsius) => format!("{:.1}°C", celsius),
            None => "NaN".to_string(),
        };
        let mut image = Bitmap::new(self.size.width, self.size.height, PAPER);
        TextPlacer::TOP_LEFT
            .draw(&mut image, PointF::new(0.0, 0.0), &text, TEMP_FONT, None)
            .unwrap_or_else(|never| match never {});
        Placed::new(image, Point::zero())
    }
}

/// CO2 in ppm, right aligned below the temperature. Without a reading the
/// box is drawn blank so a stale value does not linger.
pub struct Co2Widget<S> {
    source: S,
    size: Size,
    origin: Point,
}

impl<S: Co2Source> Co2Widget<S> {
    /// `temperature_height` is the height of the temperature box above.
    pub fn new(source: S, temperature_height: u32) -> Self {
        Self {
            source,
            size: text_size("2000ppm", CO2_FONT),
            origin: Point::new(0, temperature_height as i32 + CO2_SPACING),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub async fn render(&self) -> Placed {
        let reading = match self.source.read_ppm().await {
            Ok(ppm) => ppm,
            Err(e) => {
                warn!("CO2 reading failed: {}", e);
                None
            }
        };
        self.render_reading(reading)
    }

    pub fn render_reading(&self, reading: Option<i64>) -> Placed {
        let mut image = Bitmap::new(self.size.width, self.size.height, PAPER);
        if let Some(ppm) = reading {
            TextPlacer::new(1.0, 0.0)
                .draw(&mut image, PointF::new(self.size.width as f32, 0.0), &format!("{}ppm", ppm), CO2_FONT, None)
                .unwrap_or_else(|never| match never {});
        }
        Placed::new(image, self.origin)
    }
}

/// What a forecast tick puts on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastUpdate {
    Chart(ForecastFrame),
    Placeholder(Placed),
    /// Nothing drawn, the previous chart stays
    Kept,
}

impl ForecastUpdate {
    pub fn draw_on<P: Panel + ?Sized>(self, panel: &mut P) {
        match self {
            ForecastUpdate::Chart(frame) => frame.draw_on(panel),
            ForecastUpdate::Placeholder(placed) => placed.draw_on(panel),
            ForecastUpdate::Kept => {}
        }
    }
}

/// Forecast chart for `now .. now + horizon`.
///
/// Without credentials no fetch is attempted and a placeholder is shown.
/// A failed fetch leaves the last chart in place until the next try.
pub struct ForecastWidget<P> {
    provider: P,
    compositor: ForecastCompositor,
    horizon_hours: u32,
}

impl<P: ForecastProvider> ForecastWidget<P> {
    pub fn new(provider: P, compositor: ForecastCompositor, horizon_hours: u32) -> Self {
        Self { provider, compositor, horizon_hours }
    }

    pub async fn render<Tz>(&mut self, now: DateTime<Tz>) -> ForecastUpdate
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        if !self.provider.has_credentials() {
            debug!("Forecast provider has no credentials, drawing placeholder");
            return ForecastUpdate::Placeholder(self.compositor.placeholder(NO_FORECAST));
        }
        let Some(window) = TimeWindow::starting_at(now, self.horizon_hours) else {
            warn!("Forecast window of {}h is out of range, skipping", self.horizon_hours);
            return ForecastUpdate::Kept;
        };

        match self.provider.hourly().await {
            Ok(points) => {
                let shown = select_window(&points, window.start(), window.end());
                ForecastUpdate::Chart(self.compositor.compose(&shown, &window))
            }
            Err(WeatherApiError::MissingApiKey(var)) => {
                warn!("Forecast API key missing ({}), drawing placeholder", var);
                ForecastUpdate::Placeholder(self.compositor.placeholder(NO_FORECAST))
            }
            Err(e) => {
                warn!("Forecast fetch failed, keeping previous chart: {}", e);
                ForecastUpdate::Kept
            }
        }
    }
}
