//! Time pattern compilation and matcher throughput on generated inputs.
//!
//! Usage:
//!   cargo run --release --bin bench_patlak                  # all workloads
//!   cargo run --release --bin bench_patlak -- ident         # one workload
//!   cargo run --release --bin bench_patlak -- --output bench/results.md

use std::fmt::Write;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use rayon::prelude::*;

use patlak::pattern::Program;

#[derive(Parser)]
#[command(about = "Benchmark the patlak matcher. Optionally writes a markdown report.")]
struct Args {
    /// Workload name, or omit for all
    #[arg(default_value = "all")]
    mode: String,

    /// Timed runs per workload (the median is reported)
    #[arg(long, default_value_t = 5)]
    runs: u32,

    /// Inputs matched per run
    #[arg(long, default_value_t = 20_000)]
    inputs: usize,

    /// Markdown report path
    #[arg(long)]
    output: Option<PathBuf>,
}

const LEXICON: &str = "
letter  = 'a'..'z' | 'A'..'Z' | '_'
digit   = '0'..'9'
ident   = letter [letter | digit]*
number  = digit+ ['.' digit+]? [['e' | 'E'] ['+' | '-']? digit+]?
string  = '\"' ['\\\\' . | ' '..'!' | '#'..'~']* '\"'
keyword = 'return' | 'if' | 'else' | 'while' | 'fn' | 'let'
token   = keyword | ident | number | string
";

struct Workload {
    name: &'static str,
    pattern: &'static str,
    generate: fn(usize) -> String,
}

static WORKLOADS: &[Workload] = &[
    Workload {
        name: "ident",
        pattern: "ident",
        generate: |i| format!("name_{i}_{}", "x".repeat(i % 24)),
    },
    Workload {
        name: "number",
        pattern: "number",
        generate: |i| format!("{}.{}e-{}", i * 7919, i % 1000, i % 30),
    },
    Workload {
        name: "string",
        pattern: "string",
        generate: |i| format!("\"line {i} with \\\"escapes\\\" {}\"", "-".repeat(i % 40)),
    },
    Workload {
        name: "token",
        pattern: "token",
        generate: |i| match i % 4 {
            0 => "return".to_string(),
            1 => format!("v{i}"),
            2 => format!("{i}"),
            _ => format!("\"s{i}\""),
        },
    },
];

struct Timing {
    name: &'static str,
    inputs: usize,
    bytes: usize,
    matched: usize,
    serial: f64,
    parallel: f64,
}

fn median(mut samples: Vec<f64>) -> f64 {
    samples.sort_by(f64::total_cmp);
    samples[samples.len() / 2]
}

fn format_time(seconds: f64) -> String {
    if seconds >= 1.0 {
        format!("{seconds:.2}s")
    } else {
        let ms = seconds * 1000.0;
        format!("{ms:.1}ms")
    }
}

fn throughput(bytes: usize, seconds: f64) -> String {
    if seconds <= 0.0 {
        return "-".to_string();
    }
    format!("{:.1} MB/s", bytes as f64 / seconds / 1_000_000.0)
}

fn run_workload(program: &Program, workload: &Workload, args: &Args) -> Timing {
    let inputs: Vec<String> = (0..args.inputs).map(workload.generate).collect();
    let bytes = inputs.iter().map(String::len).sum();

    let count = |input: &String| {
        program
            .matches(workload.pattern, input.as_bytes())
            .ok()
            .flatten()
            .is_some()
    };

    let mut serial = Vec::new();
    let mut parallel = Vec::new();
    let mut matched = 0;
    for _ in 0..args.runs.max(1) {
        let start = Instant::now();
        matched = inputs.iter().filter(|input| count(*input)).count();
        serial.push(start.elapsed().as_secs_f64());

        let start = Instant::now();
        let par_matched = inputs.par_iter().filter(|input| count(*input)).count();
        parallel.push(start.elapsed().as_secs_f64());
        assert_eq!(matched, par_matched, "parallel run disagrees on {}", workload.name);
    }

    Timing {
        name: workload.name,
        inputs: inputs.len(),
        bytes,
        matched,
        serial: median(serial),
        parallel: median(parallel),
    }
}

fn generate_report(compile_time: f64, timings: &[Timing], args: &Args) -> String {
    let mut md = String::new();
    writeln!(md, "# patlak Matcher Benchmark").unwrap();
    writeln!(md).unwrap();
    writeln!(
        md,
        "**Config:** {} runs, {} inputs per workload, {} threads",
        args.runs,
        args.inputs,
        rayon::current_num_threads()
    )
    .unwrap();
    writeln!(md, "**Compile:** {}", format_time(compile_time)).unwrap();
    writeln!(md).unwrap();
    writeln!(md, "| Workload | Inputs | Matched | Serial | Parallel | Serial throughput |").unwrap();
    writeln!(md, "|----------|-------:|--------:|-------:|---------:|------------------:|").unwrap();
    for t in timings {
        writeln!(
            md,
            "| {} | {} | {} | {} | {} | {} |",
            t.name,
            t.inputs,
            t.matched,
            format_time(t.serial),
            format_time(t.parallel),
            throughput(t.bytes, t.serial),
        )
        .unwrap();
    }
    md
}

fn main() {
    let args = Args::parse();

    let start = Instant::now();
    let program = Program::compile(LEXICON).unwrap();
    let compile_time = start.elapsed().as_secs_f64();

    let selected: Vec<&Workload> = WORKLOADS
        .iter()
        .filter(|w| args.mode == "all" || w.name == args.mode)
        .collect();
    if selected.is_empty() {
        let names: Vec<&str> = WORKLOADS.iter().map(|w| w.name).collect();
        eprintln!("unknown workload `{}`; expected one of: all, {}", args.mode, names.join(", "));
        std::process::exit(2);
    }

    let mut timings = Vec::new();
    for workload in selected {
        eprintln!("running {}...", workload.name);
        timings.push(run_workload(&program, workload, &args));
    }

    let md = generate_report(compile_time, &timings, &args);
    match &args.output {
        Some(path) => {
            fs::write(path, &md).unwrap();
            eprintln!("\nWrote {}", path.display());
        }
        None => print!("{md}"),
    }
}
