/*
 *  lib.rs
 *
 *  wxpanel - minute-true weather panel
 *	(c) 2020-26 Stuart Hunter
 *
 *	Clock, room climate and 48h forecast composited onto a 400x300
 *	monochrome canvas, redrawn once a minute
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

pub mod bitmap;
pub mod config;
pub mod display;
pub mod forecast;
pub mod geometry;
pub mod permute;
pub mod raster;
pub mod scheduler;
pub mod sensors;
pub mod textplace;
pub mod weather;
pub mod widgets;
