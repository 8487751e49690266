use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{ArgAction, Parser};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use short_cycles::{incidence, CycleCensus, CycleCounter, DenseMatrixRef, Distribution, Girth, Parallel, ProductStrategy, Serial};

const USAGE: &str = "short-cycles [OPTIONS] <COLUMNS> <ROWS> <MATRIX_FILE>\n       short-cycles [OPTIONS] <ALIST_FILE>";

/// Girth and short-cycle counts of a bipartite (Tanner) graph.
#[derive(Parser, Debug)]
#[command(name = "short-cycles", version, override_usage = USAGE)]
struct Args {
    /// Either an alist file, or the column count, row count and a dense matrix file
    #[arg(value_name = "INPUT")]
    inputs: Vec<String>,

    /// Split matrix products across the rayon pool
    #[arg(long)]
    parallel: bool,

    /// Worker threads for --parallel (defaults to one per core)
    #[arg(long, value_name = "N", requires = "parallel")]
    threads: Option<usize>,

    /// Print the census as JSON instead of the text report
    #[arg(long)]
    json: bool,

    /// Raise the log level (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

enum Source<'a> {
    Dense { columns: usize, rows: usize, path: &'a Path },
    Alist { path: &'a Path },
}

impl<'a> Source<'a> {
    fn from_args(inputs: &'a [String]) -> Option<Self> {
        match inputs {
            [path] => Some(Source::Alist { path: Path::new(path) }),
            [columns, rows, path] => Some(Source::Dense {
                columns: columns.parse().ok()?,
                rows: rows.parse().ok()?,
                path: Path::new(path),
            }),
            _ => None,
        }
    }

    fn load<S: ProductStrategy>(&self) -> anyhow::Result<DenseMatrixRef<S>> {
        match *self {
            Source::Dense { columns, rows, path } => incidence::open_dense(path, columns, rows)
                .with_context(|| format!("reading {rows}x{columns} matrix from {}", path.display())),
            Source::Alist { path } => incidence::open_alist(path)
                .with_context(|| format!("reading alist file {}", path.display())),
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    census: &'a CycleCensus,
    distributions: [Distribution; 3],
    elapsed_secs: f64,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).with_writer(std::io::stderr);
    // fails only if a global subscriber is already installed
    let _ = Registry::default().with(filter).with(fmt_layer).try_init();
}

fn census<S: ProductStrategy>(source: &Source) -> anyhow::Result<CycleCensus> {
    let e = source.load::<S>()?;
    info!(rows = e.rows(), cols = e.cols(), bytes = e.estimate_memory_usage(), "incidence loaded");
    let counter = CycleCounter::new(e).context("incidence matrix rejected")?;
    Ok(counter.count()?)
}

/// Lengths for the three report labels; symbolic when there is no cycle.
fn labels(girth: Girth) -> [String; 3] {
    match girth {
        Girth::Cycle(g) => [g, g + 2, g + 4].map(|l| l.to_string()),
        Girth::Acyclic => ["g", "g+2", "g+4"].map(String::from),
    }
}

fn print_report(census: &CycleCensus, distributions: &[Distribution; 3], elapsed_secs: f64) {
    let labels = labels(census.girth);
    println!();
    println!("Cycle Count:");
    println!("girth = {}", census.girth);
    for (label, tally) in labels.iter().zip(&census.tallies) {
        println!("N_{label} = {}", tally.count);
    }
    println!();
    println!("Cycle Distribution:");
    for (label, d) in labels.iter().zip(distributions) {
        println!("mu_{label} = {}, sigma_{label} = {}", d.mean, d.std_dev);
    }
    println!();
    println!("Elapsed time: {elapsed_secs} s");
}

fn run(args: &Args, source: &Source) -> anyhow::Result<()> {
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring the rayon pool")?;
    }

    let start = Instant::now();
    let census = if args.parallel { census::<Parallel>(source)? } else { census::<Serial>(source)? };
    let distributions = [0, 1, 2].map(|i| census.tallies[i].distribution());
    let elapsed_secs = start.elapsed().as_secs_f64();
    info!(girth = %census.girth, elapsed_secs, "census complete");

    if args.json {
        let report = Report { census: &census, distributions, elapsed_secs };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&census, &distributions, elapsed_secs);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let Some(source) = Source::from_args(&args.inputs) else {
        eprintln!("Usage: {USAGE}");
        return ExitCode::from(2);
    };

    match run(&args, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_source_forms() {
        let one = args(&["code.alist"]);
        assert!(matches!(Source::from_args(&one), Some(Source::Alist { .. })));

        let three = args(&["6", "3", "h.txt"]);
        match Source::from_args(&three) {
            Some(Source::Dense { columns, rows, .. }) => assert_eq!((columns, rows), (6, 3)),
            _ => panic!("expected a dense source"),
        }

        assert!(Source::from_args(&args(&[])).is_none());
        assert!(Source::from_args(&args(&["a", "b"])).is_none());
        assert!(Source::from_args(&args(&["x", "3", "h.txt"])).is_none());
    }

    #[test]
    fn test_labels() {
        assert_eq!(labels(Girth::Cycle(6)), ["6", "8", "10"]);
        assert_eq!(labels(Girth::Acyclic), ["g", "g+2", "g+4"]);
    }

    #[test]
    fn test_cli_parses_flags() {
        let a = Args::try_parse_from(["short-cycles", "--parallel", "--threads", "2", "-vv", "h.alist"]).unwrap();
        assert!(a.parallel);
        assert_eq!(a.threads, Some(2));
        assert_eq!(a.verbose, 2);
        assert_eq!(a.inputs, ["h.alist"]);
        assert!(Args::try_parse_from(["short-cycles", "--threads", "2", "h.alist"]).is_err());
    }

    #[test]
    fn test_json_report_shape() {
        let e = incidence::complete::<Serial>(2, 2).unwrap();
        let census = CycleCounter::new(e).unwrap().count().unwrap();
        let distributions = [0, 1, 2].map(|i| census.tallies[i].distribution());
        let report = Report { census: &census, distributions, elapsed_secs: 0.0 };
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["girth"], 4);
        assert_eq!(v["tallies"][0]["count"], 1);
        assert_eq!(v["distributions"][0]["mean"], 2.0);
    }
}
