//! Line-oriented bulk insertion for `simgram build`.

use anyhow::{Context, Result};
use simgram_core::Database;
use std::io::BufRead;
use std::time::{Duration, Instant};

/// Insertion statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildStats {
    pub inserted: usize,
    pub duration: Duration,
}

impl BuildStats {
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn strings_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.inserted as f64 / secs
        } else {
            0.0
        }
    }
}

/// Inserts every line of `reader` as one string. Line terminators (`\n` or
/// `\r\n`) are stripped; empty lines are inserted as empty strings.
///
/// Stops at the first line that cannot be read or inserted. The lines before
/// it stay inserted, and the error reports how many there were.
pub fn insert_lines<R: BufRead>(db: &mut Database, reader: R) -> Result<BuildStats> {
    let start = Instant::now();
    let mut inserted = 0usize;

    for (number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| {
            format!(
                "cannot read input line {} ({inserted} lines inserted before it)",
                number + 1
            )
        })?;
        db.insert(&line).with_context(|| {
            format!(
                "cannot insert input line {} ({inserted} lines inserted before it)",
                number + 1
            )
        })?;
        inserted += 1;
    }

    let stats = BuildStats {
        inserted,
        duration: start.elapsed(),
    };
    tracing::info!(inserted, elapsed_ms = stats.duration_ms(), "Build finished");
    Ok(stats)
}
