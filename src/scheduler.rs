/*
 *  scheduler.rs
 *
 *  wxpanel - minute-true weather panel
 *	(c) 2020-26 Stuart Hunter
 *
 *	Minute-aligned update loop with flush latency compensation
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
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use log::{debug, error, info};

use crate::display::Panel;
use crate::sensors::{Co2Source, TemperatureSource};
use crate::weather::ForecastProvider;
use crate::widgets::{ClockWidget, Co2Widget, ForecastWidget, TemperatureWidget};

/// Weight of the newest flush measurement in the estimate
pub const SMOOTHING: f64 = 0.1;
pub const TICK_SECS: f64 = 60.0;

const FORECAST_EVERY: u64 = 15;
const TEMPERATURE_EVERY: u64 = 5;

/// Exponential moving average of flush latency, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlushEstimator {
    expected_secs: f64,
}

impl FlushEstimator {
    pub fn new(expected_secs: f64) -> Self {
        Self { expected_secs }
    }

    #[inline]
    pub fn expected_secs(&self) -> f64 {
        self.expected_secs
    }

    /// Fold in one measured flush. A zero-length flush does not count.
    pub fn observe(&mut self, elapsed: Duration) -> bool {
        if elapsed.is_zero() {
            return false;
        }
        self.expected_secs = self.expected_secs * (1.0 - SMOOTHING) + elapsed.as_secs_f64() * SMOOTHING;
        true
    }
}

/// Which widgets redraw on a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    pub forecast: bool,
    pub temperature: bool,
    pub co2: bool,
    pub clock: bool,
}

impl TickPlan {
    pub fn for_minute(minutes_passed: u64) -> Self {
        Self {
            forecast: minutes_passed % FORECAST_EVERY == 0,
            temperature: minutes_passed % TEMPERATURE_EVERY == 0,
            co2: true,
            clock: true,
        }
    }
}

/// Time left until the next minute boundary, less the expected flush.
/// None when that is not positive: the tick is late and runs at once.
pub fn next_sleep(now_epoch: f64, expected_flush_secs: f64) -> Option<Duration> {
    let secs = TICK_SECS - now_epoch.rem_euclid(TICK_SECS) - expected_flush_secs;
    if secs > 0.0 { Some(Duration::from_secs_f64(secs)) } else { None }
}

/// Time the clock should show: the frame becomes visible once the flush
/// is done.
pub fn clock_time<Tz: TimeZone>(now: DateTime<Tz>, expected_flush_secs: f64) -> DateTime<Tz> {
    let ahead = TimeDelta::milliseconds((expected_flush_secs * 1000.0).round() as i64);
    now.clone().checked_add_signed(ahead).unwrap_or(now)
}

fn epoch_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Loop state; lives only as long as the process.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SchedulerState {
    pub minutes_passed: u64,
    pub flush: FlushEstimator,
}

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub minute: u64,
    pub plan: TickPlan,
    /// None when the flush failed
    pub flush_secs: Option<f64>,
    pub sleep: Option<Duration>,
}

/// Drives the widgets on a wall-clock minute cadence.
///
/// Every tick renders what its `TickPlan` asks for, flushes once, folds the
/// flush time into the estimate and sleeps until just before the next
/// minute so the flushed frame lands on the boundary. Widget failures are
/// handled inside the widgets; a failed flush is logged and the loop goes on.
pub struct UpdateScheduler<P, F, T, C> {
    panel: P,
    forecast: ForecastWidget<F>,
    temperature: TemperatureWidget<T>,
    co2: Co2Widget<C>,
    clock: ClockWidget,
    state: SchedulerState,
}

impl<P, F, T, C> UpdateScheduler<P, F, T, C>
where
    P: Panel,
    F: ForecastProvider,
    T: TemperatureSource,
    C: Co2Source,
{
    pub fn new(
        panel: P,
        forecast: ForecastWidget<F>,
        temperature: TemperatureWidget<T>,
        co2: Co2Widget<C>,
        clock: ClockWidget,
    ) -> Self {
        Self {
            panel,
            forecast,
            temperature,
            co2,
            clock,
            state: SchedulerState::default(),
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub async fn tick(&mut self) -> TickReport {
        let minute = self.state.minutes_passed;
        let plan = TickPlan::for_minute(minute);
        debug!("Tick {}: {:?}", minute, plan);

        if plan.forecast {
            self.forecast.render(Local::now()).await.draw_on(&mut self.panel);
        }
        if plan.temperature {
            self.temperature.render().await.draw_on(&mut self.panel);
        }
        if plan.co2 {
            self.co2.render().await.draw_on(&mut self.panel);
        }
        if plan.clock {
            let shown = clock_time(Local::now(), self.state.flush.expected_secs());
            self.clock.render(&shown).draw_on(&mut self.panel);
        }

        let flush_start = Instant::now();
        let flushed = self.panel.flush();
        let elapsed = flush_start.elapsed();
        let flush_secs = match flushed {
            Ok(()) => {
                self.state.flush.observe(elapsed);
                Some(elapsed.as_secs_f64())
            }
            Err(e) => {
                error!("Panel flush failed: {}", e);
                None
            }
        };

        let sleep = next_sleep(epoch_secs(), self.state.flush.expected_secs());
        debug!(
            "Flush took {:?}s, expecting {:.3}s, sleeping {:?}",
            flush_secs,
            self.state.flush.expected_secs(),
            sleep
        );
        self.state.minutes_passed += 1;

        TickReport { minute, plan, flush_secs, sleep }
    }

    /// Tick forever. Late ticks run back to back, skipped minutes are not
    /// caught up.
    pub async fn run(&mut self) {
        info!("Update loop started");
        loop {
            let report = self.tick().await;
            if let Some(pause) = report.sleep {
                tokio::time::sleep(pause).await;
            }
        }
    }
}
