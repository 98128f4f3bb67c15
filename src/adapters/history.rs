//! Append-only CSV history store.
//!
//! ```text
//! timestamp,ambient_light,screen_brightness,is_manual_adjustment
//! 1714000000,312,6000,1
//! ```
//!
//! The header is written when the file is created. Readers locate the
//! columns by header name, so files with extra trailing columns still load.
//! Rows that do not parse are skipped with a warning.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::app::ports::HistoryPort;
use crate::error::HistoryError;
use crate::model::DataPoint;

/// Column names in file order.
pub const CSV_HEADER: [&str; 4] = [
    "timestamp",
    "ambient_light",
    "screen_brightness",
    "is_manual_adjustment",
];

pub struct CsvHistory {
    path: PathBuf,
}

impl CsvHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn io_err(e: std::io::Error) -> HistoryError {
    HistoryError::Io(e.to_string())
}

fn encode(point: &DataPoint) -> String {
    format!(
        "{},{},{},{}\n",
        point.timestamp,
        point.ambient_light,
        point.screen_brightness,
        u8::from(point.is_manual_adjustment)
    )
}

/// Index of each known column. Falls back to file order when the header
/// is missing a name.
fn column_map(header: &str) -> [usize; 4] {
    let names: Vec<&str> = header.split(',').map(str::trim).collect();
    let mut map = [0, 1, 2, 3];
    for (slot, want) in map.iter_mut().zip(CSV_HEADER) {
        match names.iter().position(|n| *n == want) {
            Some(idx) => *slot = idx,
            None => {
                warn!("history header has no `{want}` column, assuming file order");
                return [0, 1, 2, 3];
            }
        }
    }
    map
}

fn decode(line: &str, columns: [usize; 4]) -> Result<DataPoint, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let field = |i: usize| {
        fields
            .get(columns[i])
            .copied()
            .ok_or_else(|| format!("missing `{}`", CSV_HEADER[i]))
    };
    let int = |i: usize| -> Result<i64, String> {
        let raw = field(i)?;
        raw.parse()
            .map_err(|_| format!("`{}` is not a number: {raw:?}", CSV_HEADER[i]))
    };
    let uint = |i: usize| -> Result<u32, String> {
        let v = int(i)?;
        u32::try_from(v).map_err(|_| format!("`{}` out of range: {v}", CSV_HEADER[i]))
    };

    let manual = match field(3)? {
        "1" | "true" | "True" => true,
        "0" | "false" | "False" => false,
        other => return Err(format!("bad manual flag {other:?}")),
    };
    Ok(DataPoint {
        timestamp: int(0)?,
        ambient_light: uint(1)?,
        screen_brightness: uint(2)?,
        is_manual_adjustment: manual,
    })
}

impl HistoryPort for CsvHistory {
    fn append(&mut self, point: &DataPoint) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;

        let mut out = String::new();
        if file.metadata().map_err(io_err)?.len() == 0 {
            out.push_str(&CSV_HEADER.join(","));
            out.push('\n');
        }
        out.push_str(&encode(point));
        file.write_all(out.as_bytes()).map_err(io_err)?;
        file.sync_data().map_err(io_err)
    }

    fn read_all(&self) -> Result<Vec<DataPoint>, HistoryError> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e)),
        };

        let mut lines = BufReader::new(file).lines();
        let columns = match lines.next() {
            Some(header) => column_map(&header.map_err(io_err)?),
            None => return Ok(Vec::new()),
        };

        let mut points = Vec::new();
        for (n, line) in lines.enumerate() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            match decode(&line, columns) {
                Ok(p) => points.push(p),
                // header is line 1
                Err(e) => warn!("{}:{}: skipping row: {e}", self.path.display(), n + 2),
            }
        }
        Ok(points)
    }
}
