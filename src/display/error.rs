/*
 *  display/error.rs
 *
 *  wxpanel - minute-true weather panel
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error type for panel output
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    /// Snapshot or device write failed
    #[error("panel I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output refused the frame
    #[error("flush failed: {0}")]
    FlushFailed(String),
}
