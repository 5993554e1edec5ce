use std::io::{self, Write};

use crate::bench::{BenchmarkRecord, Mode};

const RULE: &str = " +---------------+----------+----------------+----------+--------------+";

/// Prints records as a table, one block per signal length.
///
/// Each block opens with the serial baseline, then a rule, then the parallel
/// runs. Parallel speedups above 1 carry a trailing `+`.
pub fn write_table<W: Write>(out: &mut W, records: &[BenchmarkRecord]) -> io::Result<()> {
    writeln!(out, "{}", RULE)?;
    writeln!(
        out,
        " | {:>13} | {:>8} | {:>14} | {:<8} | {:>12} |",
        "Threads", "N", "Time (ms)", "Mode", "Speedup"
    )?;
    writeln!(out, "{}", RULE)?;

    let mut previous_n = None;
    for record in records {
        let n = record.config.n;
        if previous_n.is_some() && previous_n != Some(n) {
            writeln!(out, "{}", RULE)?;
        }
        previous_n = Some(n);

        writeln!(
            out,
            " | {:>13} | {:>8} | {:>14.4} | {:<8} | {:>12} |",
            record.config.threads,
            n,
            record.millis(),
            record.mode.to_string(),
            speedup_cell(record)
        )?;
        if record.mode == Mode::Serial {
            writeln!(out, "{}", RULE)?;
        }
    }

    if !records.is_empty() {
        writeln!(out, "{}", RULE)?;
    }
    Ok(())
}

fn speedup_cell(record: &BenchmarkRecord) -> String {
    match record.speedup {
        None => "-".to_string(),
        Some(s) if s > 1.0 => format!("{:.3}+", s),
        Some(s) => format!("{:.3} ", s),
    }
}

/// Writes records as CSV with a header row.
pub fn write_csv<W: Write>(out: &mut W, records: &[BenchmarkRecord]) -> io::Result<()> {
    writeln!(out, "mode,threads,n,m,time_ms,speedup")?;
    for record in records {
        let speedup = match record.speedup {
            Some(s) => format!("{:.4}", s),
            None => String::new(),
        };
        writeln!(
            out,
            "{},{},{},{},{:.6},{}",
            record.mode,
            record.config.threads,
            record.config.n,
            record.config.m,
            record.millis(),
            speedup
        )?;
    }
    Ok(())
}
