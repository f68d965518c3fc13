//! Query execution and output for `simgram query`.

use anyhow::Result;
use serde::Serialize;
use simgram_core::{Database, Match, Measure};
use std::io::Write;
use std::time::{Duration, Instant};

/// How results are printed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Style {
    /// Print the query before its matches (text output).
    pub echo: bool,
    /// One JSON object per query instead of text.
    pub json: bool,
    /// Counts and timings only.
    pub benchmark: bool,
}

/// Matches of one query, with its latency.
#[derive(Debug)]
pub struct Outcome<'a> {
    pub query: &'a str,
    pub matches: Vec<Match>,
    pub elapsed: Duration,
}

impl Outcome<'_> {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    matches: Option<&'a [Match]>,
    count: usize,
    elapsed_ms: f64,
}

/// Runs `query` against `db` and prints the outcome to `out`.
pub fn run<W: Write>(
    db: &Database,
    query: &str,
    measure: Measure,
    threshold: f64,
    style: Style,
    out: &mut W,
) -> Result<()> {
    let start = Instant::now();
    let matches = db.retrieve_scored(query, measure, threshold)?;
    let outcome = Outcome {
        query,
        matches,
        elapsed: start.elapsed(),
    };
    write_outcome(&outcome, style, out)
}

/// Prints `outcome` in `style`.
pub fn write_outcome<W: Write>(outcome: &Outcome<'_>, style: Style, out: &mut W) -> Result<()> {
    if style.json {
        let report = JsonReport {
            query: outcome.query,
            matches: (!style.benchmark).then_some(outcome.matches.as_slice()),
            count: outcome.matches.len(),
            elapsed_ms: outcome.elapsed_ms(),
        };
        serde_json::to_writer(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    if style.benchmark {
        writeln!(
            out,
            "{} strings retrieved ({:.3} ms)",
            outcome.matches.len(),
            outcome.elapsed_ms()
        )?;
        return Ok(());
    }

    if style.echo {
        writeln!(out, "{}", outcome.query)?;
        for m in &outcome.matches {
            writeln!(out, "\t{}", m.text)?;
        }
    } else {
        for m in &outcome.matches {
            writeln!(out, "{}", m.text)?;
        }
    }
    Ok(())
}
