use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use par_conv::backend::BackendKind;
use par_conv::bench::{run_plan, BenchmarkPlan};
use par_conv::report::{write_csv, write_table};

#[derive(Parser, Debug)]
#[command(name = "par-conv")]
#[command(about = "Benchmark serial vs multi-threaded 1D convolution", long_about = None)]
struct Args {
    /// Signal lengths to benchmark
    #[arg(short = 'n', long, value_delimiter = ',', default_value = "10,100,1000,10000,100000")]
    sizes: Vec<usize>,

    /// Kernel length
    #[arg(short = 'm', long, default_value_t = 10)]
    kernel_len: usize,

    /// Thread counts for the parallel runs
    #[arg(short = 't', long, value_delimiter = ',', default_value = "2,4,8,16", value_parser = parse_at_least_one)]
    threads: Vec<usize>,

    /// Worker backend: threads or rayon
    #[arg(short, long, default_value = "threads")]
    backend: BackendKind,

    /// Timed repetitions per run, averaged
    #[arg(short, long, default_value_t = 1, value_parser = parse_at_least_one)]
    repeats: usize,

    /// Seed for reproducible inputs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Also write the results to this CSV file
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Check every parallel result against the serial one
    #[arg(long)]
    verify: bool,

    /// Disable progress bar
    #[arg(short, long)]
    quiet: bool,
}

fn parse_at_least_one(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(v) => Ok(v),
        Err(e) => Err(e.to_string()),
    }
}

// info lines would tear through the progress bar on stderr
fn default_log_filter(quiet: bool) -> &'static str {
    if quiet {
        "info"
    } else {
        "warn"
    }
}

fn create_progress_bar(total_runs: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total_runs as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} runs {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_log_filter(args.quiet)),
    )
    .init();

    let plan = BenchmarkPlan {
        sizes: args.sizes,
        kernel_len: args.kernel_len,
        threads: args.threads,
        backend: args.backend,
        repeats: args.repeats,
        seed: args.seed,
        verify: args.verify,
    };

    println!(
        "Convolving with a {}-tap kernel on the {} backend ({} cores available)",
        plan.kernel_len,
        plan.backend,
        num_cpus::get()
    );

    let progress = if !args.quiet {
        Some(create_progress_bar(plan.total_runs())?)
    } else {
        None
    };

    let start_time = Instant::now();
    let records = run_plan(&plan, |record| {
        if let Some(ref pb) = progress {
            pb.set_message(format!("n={} threads={}", record.config.n, record.config.threads));
            pb.inc(1);
        }
    })?;

    if let Some(ref pb) = progress {
        pb.finish_and_clear();
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_table(&mut out, &records)?;
    writeln!(out, "\n{} runs in {:.2?}", records.len(), start_time.elapsed())?;

    if let Some(path) = args.csv {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        write_csv(&mut writer, &records)?;
        writer.flush()?;
        writeln!(out, "Results written to {}", path.display())?;
    }

    Ok(())
}
