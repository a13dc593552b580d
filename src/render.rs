// Stats table rendering

use std::io::{self, Write};

use crossterm::QueueableCommand;
use crossterm::cursor::MoveTo;
use crossterm::terminal::{Clear, ClearType};

use crate::models::DerivedMetrics;
use crate::snapshot::Snapshot;
use crate::units::{bytes_size, human_size};

pub const HEADER: [&str; 6] = [
    "CPU %",
    "MEM USAGE / LIMIT",
    "MEM %",
    "NET I/O",
    "BLOCK I/O",
    "PIDS",
];

const MIN_CELL_WIDTH: usize = 20;
const CELL_PADDING: usize = 3;
const IO_PRECISION: usize = 3;

/// Format one table row for `m`.
pub fn format_row(m: &DerivedMetrics) -> [String; 6] {
    [
        format!("{:.2}%", m.cpu_percent),
        format!(
            "{} / {}",
            bytes_size(m.memory_bytes),
            bytes_size(m.memory_limit_bytes)
        ),
        format!("{:.2}%", m.memory_percent),
        format!(
            "{} / {}",
            human_size(m.net_rx_bytes, IO_PRECISION),
            human_size(m.net_tx_bytes, IO_PRECISION)
        ),
        format!(
            "{} / {}",
            human_size(m.block_read_bytes, IO_PRECISION),
            human_size(m.block_write_bytes, IO_PRECISION)
        ),
        m.pids_current.to_string(),
    ]
}

/// Lay out rows in columns: every column but the last is padded to
/// `max(MIN_CELL_WIDTH, widest cell + CELL_PADDING)`.
pub fn format_table<S: AsRef<str>>(rows: &[&[S]]) -> String {
    let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            let widest = rows
                .iter()
                .filter(|r| c + 1 < r.len())
                .map(|r| r[c].as_ref().chars().count())
                .max()
                .unwrap_or(0);
            (widest + CELL_PADDING).max(MIN_CELL_WIDTH)
        })
        .collect();

    let mut out = String::new();
    for row in rows {
        for (c, cell) in row.iter().enumerate() {
            let cell = cell.as_ref();
            if c + 1 < row.len() {
                out.push_str(&format!("{cell:<width$}", width = widths[c]));
            } else {
                out.push_str(cell);
            }
        }
        out.push('\n');
    }
    out
}

/// Writes one frame per tick. A newly recorded error replaces the data row
/// for exactly one frame; later frames show the metrics again. A warning is
/// printed under the data row for as long as it is set.
pub struct Renderer<W> {
    out: W,
    clear_screen: bool,
    shown_error: u64,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, clear_screen: bool) -> Self {
        Self {
            out,
            clear_screen,
            shown_error: 0,
        }
    }

    pub fn render(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        if self.clear_screen {
            self.out
                .queue(Clear(ClearType::All))?
                .queue(MoveTo(0, 0))?;
        }

        let mut frame = String::new();
        let fresh_error = snapshot
            .error
            .as_ref()
            .filter(|recorded| recorded.seq > self.shown_error);

        match fresh_error {
            Some(recorded) => {
                self.shown_error = recorded.seq;
                frame.push_str(&format_table(&[&HEADER[..]]));
                frame.push_str(&recorded.error.to_string());
                frame.push('\n');
            }
            None => {
                let row = format_row(&snapshot.metrics);
                let row: Vec<&str> = row.iter().map(String::as_str).collect();
                frame.push_str(&format_table(&[&HEADER[..], &row[..]]));
                if let Some(warning) = &snapshot.warning {
                    frame.push_str(&warning.to_string());
                    frame.push('\n');
                }
            }
        }

        self.out.write_all(frame.as_bytes())?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
