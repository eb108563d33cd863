/*
 *  main.rs
 *
 *  wxpanel - minute-true weather panel
 *	(c) 2020-26 Stuart Hunter
 *
 *	Daemon entry: configuration, logging, wiring and the update loop
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

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use wxpanel::config::{self, Cli};
use wxpanel::display::MemoryPanel;
use wxpanel::forecast::ForecastCompositor;
use wxpanel::scheduler::UpdateScheduler;
use wxpanel::sensors::{HttpCo2Source, LineTemperatureSource};
use wxpanel::weather::HttpForecastProvider;
use wxpanel::widgets::{ClockWidget, Co2Widget, ForecastWidget, TemperatureWidget};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Waits for SIGINT, SIGTERM or SIGHUP.
#[cfg(unix)]
async fn signal_handler() -> anyhow::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => info!("SIGINT received, shutting down."),
        _ = sigterm.recv() => info!("SIGTERM received, shutting down."),
        _ = sighup.recv() => info!("SIGHUP received, shutting down."),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn signal_handler() -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down.");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("loading configuration")?;

    if cli.dump_config {
        print!("{}", serde_yaml::to_string(&cfg).context("serialising configuration")?);
        return Ok(());
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_filter(&cfg)))
        .format_timestamp_secs()
        .init();

    info!("{} panel", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    // the key is never part of the YAML
    let api_key = std::env::var(&cfg.forecast.api_key_env).ok().filter(|k| !k.is_empty());
    if api_key.is_none() {
        warn!("No {} env variable, forecast disabled", cfg.forecast.api_key_env);
    }

    let provider = HttpForecastProvider::new(&cfg.forecast, &cfg.location, api_key)
        .context("building forecast client")?;
    let co2_source = HttpCo2Source::new(&cfg.sensors).context("building CO2 client")?;
    let temperature_source = LineTemperatureSource::new(&cfg.sensors);

    let forecast = ForecastWidget::new(
        provider,
        ForecastCompositor::new(cfg.panel.dither),
        cfg.forecast.horizon_hours,
    );
    let temperature = TemperatureWidget::new(temperature_source);
    let co2 = Co2Widget::new(co2_source, temperature.size().height);
    let clock = ClockWidget::new();

    if let Some(path) = cfg.panel.snapshot_path.as_ref() {
        info!("Writing canvas snapshots to {}", path.display());
    }
    let panel = MemoryPanel::new(cfg.panel.snapshot_path.clone());

    let mut scheduler = UpdateScheduler::new(panel, forecast, temperature, co2, clock);

    tokio::select! {
        res = signal_handler() => res?,
        _ = scheduler.run() => {}
    }

    info!(
        "Stopped after {} ticks, flush estimate {:.3}s",
        scheduler.state().minutes_passed,
        scheduler.state().flush.expected_secs()
    );
    Ok(())
}
