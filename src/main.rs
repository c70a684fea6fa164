/*
 *  main.rs
 *
 *  yrpaper - forecast to e-paper
 *	(c) 2020-26 Stuart Hunter
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

use anyhow::{anyhow, Context};
use chrono::FixedOffset;
use env_logger::Env;
use log::{error, info};

use yrpaper::config::{self, Settings};
use yrpaper::cycle::ErrorKind;
use yrpaper::display::DisplaySinkFactory;
use yrpaper::{
    CycleDriver, ErrorJournal, Fetcher, HttpTransport, LegendTable, Renderer, StampZone, SvgAssetStore,
};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

fn main() -> anyhow::Result<()> {
    let (cfg, cli) = config::load()?;
    let settings = Settings::resolve(&cfg);

    env_logger::Builder::from_env(Env::default().default_filter_or(settings.log_level.as_str()))
        .format_timestamp_secs()
        .init();

    info!("This is {}, weather from Yr on e-paper", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);
    info!(
        "Forecast for {:.4},{:.4}, legend in {}, refresh every {} seconds",
        settings.location.lat,
        settings.location.lon,
        settings.language,
        settings.cycle_delay.as_secs()
    );

    let journal = match &settings.error_log {
        Some(path) => ErrorJournal::to_file(path),
        None => ErrorJournal::disabled(),
    };

    let transport = HttpTransport::new(&settings.user_agent, settings.timeout)
        .context("could not build the HTTP client")?;

    // legend is loaded once, a failure here is fatal like any exhausted fetch
    let legend = match &settings.legend_file {
        Some(path) => LegendTable::from_file(path, settings.language)
            .with_context(|| format!("could not load legend from {}", path.display()))?,
        None => LegendTable::load(&transport, &settings.legend_url, settings.language, &settings.retry)
            .inspect_err(|e| journal.record(ErrorKind::FetchFailed.as_str(), &e.to_string()))?,
    };

    let zone = match settings.utc_offset_minutes {
        Some(minutes) => StampZone::Fixed(
            FixedOffset::east_opt(minutes * 60).ok_or_else(|| anyhow!("invalid utc offset {} minutes", minutes))?,
        ),
        None => StampZone::Local,
    };

    let assets = SvgAssetStore::new(&settings.assets_dir, settings.monochrome, settings.cache_capacity);
    let sink = DisplaySinkFactory::create_from_settings(&settings).context("could not open the display sink")?;
    let fetcher = Fetcher::new(transport, settings.forecast_url.clone(), settings.retry.clone());

    let mut driver = CycleDriver::new(fetcher, settings.location.clone(), legend, Renderer::new(zone), assets, sink)
        .with_journal(journal)
        .with_delay(settings.cycle_delay);

    if cli.once {
        driver.run_once()?;
        info!("Single cycle complete");
        return Ok(());
    }

    if let Err(e) = driver.run() {
        error!("Stopping: {}", e);
        return Err(e.into());
    }
    Ok(())
}
