/*
 *  forecast/compositor.rs
 *
 *  wxpanel - minute-true weather panel
 *	(c) 2020-26 Stuart Hunter
 *
 *	Places the chart layers and cloud band on the canvas
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

use chrono::TimeZone;
use embedded_graphics::prelude::*;

use crate::bitmap::{Bitmap, PAPER};
use crate::display::{Panel, Placed};
use crate::forecast::chart::{ChartLayers, ChartRenderer, NOTE_FONT};
use crate::forecast::clouds::{CloudBandRenderer, DitherMode};
use crate::geometry::{ChartMapper, PlotGeometry, TimeWindow};
use crate::raster::PointF;
use crate::textplace::TextPlacer;
use crate::weather::ForecastPoint;

/// Everything the forecast puts on the canvas, in draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastFrame {
    pub items: Vec<Placed>,
}

impl ForecastFrame {
    pub fn draw_on<P: Panel + ?Sized>(self, panel: &mut P) {
        for item in self.items {
            item.draw_on(panel);
        }
    }
}

pub struct ForecastCompositor {
    chart: ChartRenderer,
    clouds: CloudBandRenderer,
}

impl ForecastCompositor {
    pub fn new(mode: DitherMode) -> Self {
        let chart = ChartRenderer::new();
        let geometry = *chart.geometry();
        Self {
            chart,
            clouds: CloudBandRenderer::new(geometry.plot_width, geometry.cloud_cover_height, mode),
        }
    }

    pub fn geometry(&self) -> &PlotGeometry {
        self.chart.geometry()
    }

    /// Render the chart and cloud band for `window` and place them:
    /// left scale, time scale, right scale, plot area, cloud band.
    pub fn compose<Tz>(&mut self, points: &[ForecastPoint], window: &TimeWindow<Tz>) -> ForecastFrame
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let geo = *self.chart.geometry();
        let layers = self.chart.render(points, window);
        let mapper = ChartMapper::new(window.clone(), &geo);
        let band = self.clouds.render(points, &mapper);

        let mut items = self.place_layers(layers);
        items.push(Placed::new(band, self.cloud_band_origin()));
        ForecastFrame { items }
    }

    /// Blank over the whole forecast region with `message` centred in it.
    pub fn placeholder(&self, message: &str) -> Placed {
        let geo = self.chart.geometry();
        let height = geo.vertical_scale_height() + geo.cloud_cover_height;
        let mut image = Bitmap::new(geo.canvas_width, height, PAPER);
        let centre = PointF::new(geo.canvas_width as f32 / 2.0, height as f32 / 2.0);
        let bounds = Some(image.size());
        TextPlacer::new(0.5, 0.5)
            .draw(&mut image, centre, message, NOTE_FONT, bounds)
            .unwrap_or_else(|never| match never {});
        Placed::new(image, Point::new(0, self.cloud_band_origin().y))
    }

    fn place_layers(&self, layers: ChartLayers) -> Vec<Placed> {
        let geo = self.chart.geometry();
        let (cw, ch) = (geo.canvas_width as i32, geo.canvas_height as i32);
        let left_w = geo.left_scale_width as i32;
        let scale_top = ch - geo.vertical_scale_height() as i32;
        vec![
            Placed::new(layers.left_scale, Point::new(0, scale_top)),
            Placed::new(layers.time_scale, Point::new(left_w, ch - geo.time_scale_height as i32)),
            Placed::new(
                layers.right_scale,
                Point::new(cw - geo.right_scale_width_with_label as i32, scale_top),
            ),
            Placed::new(layers.plot_area, Point::new(left_w, scale_top)),
        ]
    }

    fn cloud_band_origin(&self) -> Point {
        let geo = self.chart.geometry();
        let top = geo.canvas_height as i32 - geo.vertical_scale_height() as i32 - geo.cloud_cover_height as i32;
        Point::new(geo.left_scale_width as i32, top)
    }
}
