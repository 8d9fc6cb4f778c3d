//! Showing the pane.

use crate::config::DisplayConfig;
use drizzle::{droplet::Droplet, pipeline::{Renderer, Viewport}};
use std::{io::{self, Stdout, Write}, ops::Range};


const CURSOR_HOME: &str = "\x1b[H";
const CLEAR_SCREEN: &str = "\x1b[2J";
const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";
const EMPTY: char = ' ';


/// The visible pane, in pixels
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Screen {
    pub width: f64,
    pub height: f64,
}

impl Screen {
    pub fn new(display: &DisplayConfig) -> Self {
        Screen { width: display.width, height: display.height }
    }
}

impl Viewport for Screen {
    fn is_visible(&self, droplet: &Droplet) -> bool {
        droplet.y - droplet.r < self.height
    }
}

fn glyph(r: f64) -> char {
    if r < 3.0 {
        '.'
    } else if r < 5.0 {
        'o'
    } else if r < 8.0 {
        'O'
    } else {
        '@'
    }
}

/// Paints droplets onto a character grid and writes it out as ANSI text
///
/// Each cell covers a `width / columns` by `height / rows` patch of the pane. Owns the terminal
/// while alive: the cursor is hidden on construction and shown again on drop.
pub struct TermRenderer<W: Write = Stdout> {
    out: W,
    screen: Screen,
    columns: usize,
    rows: usize,
    grid: Vec<char>,
    failed: bool,
}

impl TermRenderer<Stdout> {
    pub fn stdout(display: &DisplayConfig) -> Self {
        TermRenderer::new(io::stdout(), display)
    }
}

impl<W: Write> TermRenderer<W> {
    pub fn new(out: W, display: &DisplayConfig) -> Self {
        let mut renderer = TermRenderer {
            out,
            screen: Screen::new(display),
            columns: display.columns,
            rows: display.rows,
            grid: vec![EMPTY; display.columns * display.rows],
            failed: false,
        };
        renderer.write(&[HIDE_CURSOR, CLEAR_SCREEN]);
        renderer
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Current contents of the grid, one string per row.
    pub fn lines(&self) -> Vec<String> {
        self.grid.chunks(self.columns).map(|row| row.iter().collect()).collect()
    }

    fn cell_width(&self) -> f64 {
        self.screen.width / self.columns as f64
    }

    fn cell_height(&self) -> f64 {
        self.screen.height / self.rows as f64
    }

    // grid cells overlapping the pixel span [lo, hi], clipped to the grid.
    fn span(lo: f64, hi: f64, cell: f64, len: usize) -> Range<usize> {
        let first = (lo / cell).floor().max(0.0);
        let last = (hi / cell).floor() + 1.0;
        if last <= 0.0 || first >= len as f64 {
            return 0..0;
        }
        first as usize..(last as usize).min(len)
    }

    fn cols(&self, droplet: &Droplet) -> Range<usize> {
        Self::span(droplet.x - droplet.r, droplet.x + droplet.r, self.cell_width(), self.columns)
    }

    fn rows(&self, droplet: &Droplet) -> Range<usize> {
        Self::span(droplet.y - droplet.r, droplet.y + droplet.r, self.cell_height(), self.rows)
    }

    fn write(&mut self, parts: &[&str]) {
        if self.failed {
            return;
        }
        let result = parts.iter()
            .try_for_each(|part| self.out.write_all(part.as_bytes()))
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            warn!(%e, "terminal write failed, no longer drawing");
            self.failed = true;
        }
    }
}

impl<W: Write> Renderer for TermRenderer<W> {
    fn erase(&mut self, droplet: &Droplet) {
        for row in self.rows(droplet) {
            for col in self.cols(droplet) {
                self.grid[row * self.columns + col] = EMPTY;
            }
        }
    }

    fn draw(&mut self, droplet: &Droplet, _prior: &Droplet) {
        let (cw, ch) = (self.cell_width(), self.cell_height());
        let c = glyph(droplet.r);
        let r_sq = droplet.r * droplet.r;
        let mut painted = false;
        for row in self.rows(droplet) {
            for col in self.cols(droplet) {
                let dx = (col as f64 + 0.5) * cw - droplet.x;
                let dy = (row as f64 + 0.5) * ch - droplet.y;
                if dx * dx + dy * dy <= r_sq {
                    self.grid[row * self.columns + col] = c;
                    painted = true;
                }
            }
        }

        // droplets smaller than a cell still show up in the cell holding their centre
        if !painted && droplet.x >= 0.0 && droplet.y >= 0.0 {
            let col = (droplet.x / cw) as usize;
            let row = (droplet.y / ch) as usize;
            if col < self.columns && row < self.rows {
                self.grid[row * self.columns + col] = c;
            }
        }
    }

    fn present(&mut self) {
        let mut frame = String::with_capacity(self.grid.len() + 2 * self.rows + CURSOR_HOME.len());
        frame.push_str(CURSOR_HOME);
        for (i, line) in self.lines().into_iter().enumerate() {
            if i > 0 {
                frame.push_str("\r\n");
            }
            frame.push_str(&line);
        }
        self.write(&[&frame]);
    }
}

impl<W: Write> Drop for TermRenderer<W> {
    fn drop(&mut self) {
        self.write(&["\r\n", SHOW_CURSOR]);
    }
}

/// Renderer for running without a terminal, logging what each frame would have drawn
#[derive(Debug, Default)]
pub struct LogRenderer {
    frame: u64,
    erased: usize,
    drawn: usize,
}

impl Renderer for LogRenderer {
    fn erase(&mut self, _droplet: &Droplet) {
        self.erased += 1;
    }

    fn draw(&mut self, _droplet: &Droplet, _prior: &Droplet) {
        self.drawn += 1;
    }

    fn present(&mut self) {
        debug!(frame = self.frame, erased = self.erased, drawn = self.drawn, "frame");
        self.frame += 1;
        self.erased = 0;
        self.drawn = 0;
    }
}
