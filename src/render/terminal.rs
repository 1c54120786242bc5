//! Character-cell surface: one surface unit per terminal column/row.

#![allow(missing_docs)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use super::surface::{DrawSurface, Rect, TextStyle};
use super::theme::Paint;
use crate::timeline::color::Rgb;

/// Upper bound on grid dimensions; guards against absurd zoom factors.
const MAX_CELLS_PER_AXIS: usize = 4096;

/// One terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Rgb>,
    pub bg: Option<Rgb>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg: None,
        }
    }
}

/// Grid of cells that the Gantt renderer can draw on.
#[derive(Debug, Clone, Default)]
pub struct CellSurface {
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl CellSurface {
    #[must_use]
    pub fn new(cols: usize, rows: usize) -> Self {
        let mut surface = Self::default();
        surface.resize(cols, rows);
        surface
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cell(&self, col: usize, row: usize) -> Option<&Cell> {
        if col < self.cols && row < self.rows {
            self.cells.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Iterate rows as slices.
    pub fn lines(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.cols.max(1)).take(self.rows)
    }

    /// Plain-text rendering with trailing spaces trimmed per line.
    #[must_use]
    pub fn to_plain_text(&self) -> String {
        self.lines()
            .map(|line| {
                let s: String = line.iter().map(|c| c.ch).collect();
                s.trim_end().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| *c == Cell::default())
    }

    fn resize(&mut self, cols: usize, rows: usize) {
        self.cols = cols.min(MAX_CELLS_PER_AXIS);
        self.rows = rows.min(MAX_CELLS_PER_AXIS);
        self.cells = vec![Cell::default(); self.cols * self.rows];
    }

    fn cell_mut(&mut self, col: usize, row: usize) -> Option<&mut Cell> {
        if col < self.cols && row < self.rows {
            self.cells.get_mut(row * self.cols + col)
        } else {
            None
        }
    }
}

fn to_index(v: f64) -> usize {
    if v.is_finite() && v > 0.0 {
        v as usize
    } else {
        0
    }
}

impl DrawSurface for CellSurface {
    fn set_size(&mut self, width: f64, height: f64) {
        self.resize(to_index(width.ceil()), to_index(height.ceil()));
    }

    fn size(&self) -> (f64, f64) {
        (self.cols as f64, self.rows as f64)
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    fn fill_rect(&mut self, rect: Rect, paint: Paint) {
        let rgb = paint.to_rgb();
        let col0 = to_index(rect.x.floor());
        // Every non-empty rect covers at least one column.
        let col1 = to_index(rect.right().floor()).max(col0 + 1);
        let row0 = to_index(rect.y.floor());
        let row1 = to_index((rect.y + rect.height).ceil()).max(row0 + 1);
        for row in row0..row1 {
            for col in col0..col1 {
                if let Some(cell) = self.cell_mut(col, row) {
                    cell.bg = Some(rgb);
                    cell.ch = ' ';
                }
            }
        }
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: TextStyle) {
        let fg = style.paint.to_rgb();
        let row = to_index(y.floor());
        let start = to_index(x.floor());
        for (offset, ch) in text.chars().enumerate() {
            if let Some(cell) = self.cell_mut(start + offset, row) {
                cell.ch = ch;
                cell.fg = Some(fg);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };

    #[test]
    fn rect_covers_floor_to_floor_columns() {
        let mut s = CellSurface::new(10, 3);
        s.fill_rect(Rect::new(2.4, 1.0, 3.0, 1.0), Paint::Rgb(RED));
        assert_eq!(s.cell(1, 1).unwrap().bg, None);
        assert_eq!(s.cell(2, 1).unwrap().bg, Some(RED));
        assert_eq!(s.cell(4, 1).unwrap().bg, Some(RED));
        assert_eq!(s.cell(5, 1).unwrap().bg, None);
    }

    #[test]
    fn narrow_rect_still_visible() {
        let mut s = CellSurface::new(10, 1);
        s.fill_rect(Rect::new(3.2, 0.0, 0.1, 1.0), Paint::Rgb(RED));
        assert_eq!(s.cell(3, 0).unwrap().bg, Some(RED));
    }

    #[test]
    fn text_clips_at_edge_and_keeps_background() {
        let mut s = CellSurface::new(4, 1);
        s.fill_rect(Rect::new(0.0, 0.0, 4.0, 1.0), Paint::Rgb(RED));
        s.fill_text(
            "P1 (0-5)",
            1.0,
            0.0,
            TextStyle {
                paint: Paint::Rgb(Rgb { r: 0, g: 0, b: 0 }),
                font_size: 1.0,
            },
        );
        assert_eq!(s.to_plain_text(), " P1");
        assert_eq!(s.cell(1, 0).unwrap().bg, Some(RED));
    }

    #[test]
    fn clear_blanks_all_cells() {
        let mut s = CellSurface::new(3, 2);
        s.fill_rect(Rect::new(0.0, 0.0, 3.0, 2.0), Paint::Rgb(RED));
        s.clear();
        assert!(s.is_blank());
    }

    #[test]
    fn set_size_rounds_up() {
        let mut s = CellSurface::default();
        s.set_size(79.2, 4.0);
        assert_eq!((s.cols(), s.rows()), (80, 4));
    }
}
