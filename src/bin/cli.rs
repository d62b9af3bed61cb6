use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use pss_demux::Reporter;
use pss_demux::demuxer::{Options, run};
use tracing_subscriber::EnvFilter;

/// Split a PSS container into its video (.m2v) and audio (.ss2) streams
#[derive(Parser)]
#[clap(version)]
struct Opt {
    /// PSS file to demux
    input: PathBuf,

    /// Write outputs here instead of next to the input
    #[clap(short, long)]
    output_dir: Option<PathBuf>,

    /// Accept input that ends without a program end code
    #[clap(long, default_value_t = false)]
    allow_missing_end: bool,

    /// Print the run report as JSON on stdout
    #[clap(long, default_value_t = false)]
    json: bool,

    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[clap(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    init_logging(opt.verbose);

    let report = run(&Options {
        input: opt.input.clone(),
        output_dir: opt.output_dir,
        allow_missing_end: opt.allow_missing_end,
    })
    .with_context(|| format!("failed to demux {}", opt.input.display()))?;

    if opt.json {
        println!("{}", Reporter::generate_json_report(&report)?);
    } else {
        print!("{}", Reporter::generate_text_report(&report));
    }
    Ok(())
}
