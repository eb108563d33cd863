/*
 *  tests/forecast_scenarios.rs
 *
 *  Forecast chart end to end: ranging, window selection, canvas placement
 *
 *  wxpanel - minute-true weather panel
 *  (c) 2020-26 Stuart Hunter
 */

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use embedded_graphics::prelude::*;

use wxpanel::bitmap::{INK, PAPER};
use wxpanel::display::{MemoryPanel, Panel};
use wxpanel::forecast::{DitherMode, ForecastCompositor};
use wxpanel::geometry::{AxisRanger, TimeWindow};
use wxpanel::weather::{ForecastPoint, select_window};

fn hourly(t0: DateTime<Utc>, hours: i64, f: impl Fn(i64) -> (f64, f64)) -> Vec<ForecastPoint> {
    (0..hours)
        .map(|h| {
            let (temperature, dew_point) = f(h);
            ForecastPoint {
                time: t0 + TimeDelta::hours(h),
                temperature,
                dew_point,
                precip_intensity: 0.0,
                cloud_cover: 0.0,
            }
        })
        .collect()
}

fn window() -> TimeWindow<Utc> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 2, 23, 0, 0).unwrap();
    TimeWindow::new(start, end).unwrap()
}

#[test]
fn test_wide_day_is_padded_not_centred() {
    let w = window();
    // 2..18 over the day, dew point bottoming out at 0
    let points = hourly(*w.start(), 48, |h| {
        let phase = (h % 24) as f64;
        (2.0 + 16.0 * (1.0 - (phase - 12.0).abs() / 12.0), 0.0)
    });
    let range = AxisRanger::temperature(points.iter().flat_map(|p| [p.temperature, p.dew_point])).unwrap();
    assert!((range.base - -2.5).abs() < 1e-9);
    assert!((range.span - 23.0).abs() < 1e-9);
}

#[test]
fn test_narrow_day_is_centred() {
    let w = window();
    let points = hourly(*w.start(), 48, |h| (10.0 + (h % 3) as f64, 10.0));
    let range = AxisRanger::temperature(points.iter().flat_map(|p| [p.temperature, p.dew_point])).unwrap();
    assert_eq!(range.span, 20.0);
    assert_eq!(range.base, 10.0 - (15.0 - 2.0) / 2.0 - 2.5);
}

#[test]
fn test_chart_lands_in_forecast_region() {
    let w = window();
    let all = hourly(*w.start() - TimeDelta::hours(3), 60, |h| (5.0 + (h % 10) as f64, 2.0));
    let shown = select_window(&all, w.start(), w.end());
    assert!(shown.first().unwrap().time < *w.start());
    assert!(shown.last().unwrap().time > *w.end());

    let mut compositor = ForecastCompositor::new(DitherMode::FloydSteinberg);
    let mut panel = MemoryPanel::new(None);
    compositor.compose(&shown, &w).draw_on(&mut panel);
    panel.flush().unwrap();

    let canvas = panel.canvas();
    // nothing above the cloud band, clear sky leaves the band blank
    for y in 0..102 {
        for x in 0..400 {
            assert_eq!(canvas.pixel(x, y), Some(PAPER), "({}, {})", x, y);
        }
    }
    let plot_ink = (102..285)
        .flat_map(|y| (18..388).map(move |x| (x, y)))
        .filter(|&(x, y)| canvas.pixel(x, y) == Some(INK))
        .count();
    assert!(plot_ink > 0);
    assert_eq!(panel.flush_count(), 1);
}

#[test]
fn test_redraw_replaces_previous_chart() {
    let w = window();
    let mut compositor = ForecastCompositor::new(DitherMode::Scattered);
    let mut panel = MemoryPanel::new(None);

    let warm = hourly(*w.start(), 48, |h| (20.0 + (h % 5) as f64, 12.0));
    compositor.compose(&warm, &w).draw_on(&mut panel);
    let first = panel.canvas().clone();

    compositor.placeholder("no forecast").draw_on(&mut panel);
    compositor.compose(&warm, &w).draw_on(&mut panel);
    assert_eq!(panel.canvas(), &first);
    assert_eq!(panel.canvas().size(), Size::new(400, 300));
}
