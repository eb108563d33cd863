/*
 *  display/memory.rs
 *
 *  wxpanel - minute-true weather panel
 *  (c) 2020-26 Stuart Hunter
 *
 *  In-process 400x300 canvas, optionally dumped as PBM on every flush
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

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use embedded_graphics::pixelcolor::BinaryColor;
use log::debug;

use crate::bitmap::{Bitmap, PAPER};
use crate::display::error::PanelError;
use crate::display::traits::Panel;
use crate::geometry::{CANVAS_HEIGHT, CANVAS_WIDTH};

/// Canvas kept in memory.
///
/// Stands in for the physical display: tests inspect the canvas, and with a
/// snapshot path every flush writes the frame out as a plain PBM.
#[derive(Debug, Clone)]
pub struct MemoryPanel {
    canvas: Bitmap<BinaryColor>,
    snapshot: Option<PathBuf>,
    draw_count: usize,
    flush_count: usize,
}

impl MemoryPanel {
    pub fn new(snapshot: Option<PathBuf>) -> Self {
        Self {
            canvas: Bitmap::new(CANVAS_WIDTH, CANVAS_HEIGHT, PAPER),
            snapshot,
            draw_count: 0,
            flush_count: 0,
        }
    }

    pub fn canvas(&self) -> &Bitmap<BinaryColor> {
        &self.canvas
    }

    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    fn write_snapshot(&self, path: &Path) -> Result<(), PanelError> {
        // write aside then rename so readers never see half a frame
        let tmp = path.with_extension("pbm.tmp");
        let mut out = BufWriter::new(File::create(&tmp)?);
        self.canvas.write_pbm(&mut out)?;
        out.flush()?;
        drop(out);
        fs::rename(&tmp, path)?;
        debug!("Snapshot written to {}", path.display());
        Ok(())
    }
}

impl Panel for MemoryPanel {
    fn draw(&mut self, image: &Bitmap<BinaryColor>, x: i32, y: i32) {
        self.canvas.blit(image, x, y);
        self.draw_count += 1;
    }

    fn flush(&mut self) -> Result<(), PanelError> {
        self.flush_count += 1;
        if let Some(path) = self.snapshot.as_ref() {
            self.write_snapshot(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::INK;

    #[test]
    fn test_memory_panel_composites() {
        let mut panel = MemoryPanel::new(None);
        assert_eq!(panel.canvas().width(), 400);
        assert_eq!(panel.canvas().height(), 300);

        let patch = Bitmap::new(10, 5, INK);
        panel.draw(&patch, 395, 298);
        assert_eq!(panel.canvas().count_ink(), 5 * 2);
        // same call again leaves the canvas unchanged
        panel.draw(&patch, 395, 298);
        assert_eq!(panel.canvas().count_ink(), 5 * 2);
        assert_eq!(panel.draw_count(), 2);

        panel.flush().unwrap();
        assert_eq!(panel.flush_count(), 1);
    }

    #[test]
    fn test_memory_panel_snapshot() {
        let path = std::env::temp_dir().join(format!("wxpanel-test-{}.pbm", std::process::id()));
        let mut panel = MemoryPanel::new(Some(path.clone()));
        panel.draw(&Bitmap::new(2, 2, INK), 0, 0);
        panel.flush().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("P1"));
        assert_eq!(lines.next(), Some("400 300"));
        assert!(lines.next().unwrap().starts_with("1 1 0"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_snapshot_to_missing_dir_fails() {
        let mut panel = MemoryPanel::new(Some(PathBuf::from("/nonexistent/dir/panel.pbm")));
        assert!(matches!(panel.flush(), Err(PanelError::Io(_))));
    }
}
