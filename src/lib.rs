/*
 *  lib.rs
 *
 *  yrpaper - forecast to e-paper
 *	(c) 2020-26 Stuart Hunter
 *
 *	Weather forecast from Yr, delivered by the Norwegian Meteorological
 *	Institute, on a 176x264 monochrome e-paper panel
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

pub mod assets;
pub mod config;
pub mod cycle;
pub mod display;
pub mod fetch;
pub mod forecast;
pub mod journal;
pub mod legend;
pub mod normalize;
pub mod raster;
pub mod render;
pub mod svgimage;

pub use assets::{AssetError, AssetStore, Bitmap, MemoryAssetStore, SvgAssetStore};
pub use cycle::{CycleDriver, CycleError, CycleState, ErrorKind};
pub use display::{DisplayError, DisplaySink, MockSink, PackedSink, PbmSink};
pub use fetch::{Fetcher, FetchError, HttpTransport, Location, MockTransport, RetryPolicy, Transport};
pub use forecast::{ForecastSnapshot, PeriodRecord};
pub use journal::ErrorJournal;
pub use legend::{Language, LegendTable};
pub use normalize::{normalize, CompassPoint, NormalizedFields, NormalizeError, TemperatureBand};
pub use raster::{Raster, Rotation};
pub use render::{RenderError, Renderer, StampZone};
