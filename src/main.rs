use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use eqcheck::script::Runner;

/// Statistics checkpoints collected across runs, keyed by the line number
/// the checkpoint was taken at (every 50 000 lines and at end of input).
/// Each checkpoint holds one `(total_time, stats_line)` entry per run, so
/// the performance report can median every checkpoint independently.
type TotalTimes = BTreeMap<u32, Vec<(f64, String)>>;

#[derive(Parser)]
#[command(name = "eqcheck")]
#[command(about = "Script-driven harness for the Boolean equivalence engine")]
struct Args {
    /// Input script files; reads stdin when none are given ("-" also works).
    files: Vec<PathBuf>,

    /// Run each input five times and report median statistics per
    /// checkpoint.
    #[arg(long)]
    test_performance: bool,

    /// Report assert_is failures on stdout instead of exiting.
    #[arg(long)]
    find_mismatches: bool,

    /// Log verbosity (-v: info, -vv: debug, -vvv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Groups thousands with spaces: 1234567 -> "1 234 567".
fn format_thousands(n: u64) -> String {
    if n < 1000 {
        return n.to_string();
    }
    format!("{} {:03}", format_thousands(n / 1000), n % 1000)
}

fn millis(seconds: f64) -> u64 {
    (seconds * 1000.0) as u64
}

fn stats_line(runner: &Runner, total_time: f64) -> String {
    let stats = runner.context().stats();
    let other_time = total_time - (stats.sat_time + stats.clauses_time);
    format!(
        "{}: {} ms, {} solutions {} ms, {} clauses {} ms, other {} ms",
        runner.line_no(),
        format_thousands(millis(total_time)),
        format_thousands(stats.num_sat_solutions),
        format_thousands(millis(stats.sat_time)),
        format_thousands(stats.num_clauses),
        format_thousands(millis(stats.clauses_time)),
        format_thousands(millis(other_time.max(0.0))),
    )
}

/// Runs one script once, printing a stats line at every checkpoint and
/// recording it into `total_times` for the performance report.
fn run_script(path: &str, content: &str, find_mismatches: bool, total_times: &mut TotalTimes) {
    let mut runner = Runner::new(path);
    runner.find_mismatches = find_mismatches;

    let start = Instant::now();
    let checkpoint = |runner: &Runner, total_times: &mut TotalTimes| {
        let total_time = start.elapsed().as_secs_f64();
        let line = stats_line(runner, total_time);
        println!("{}", line);
        total_times
            .entry(runner.line_no())
            .or_default()
            .push((total_time, line));
    };

    let mut last_reported = 0;
    for line in content.lines() {
        if let Err(err) = runner.run_line(line) {
            eprintln!("{}", err);
            std::process::exit(1);
        }
        if runner.line_no() % 50_000 == 0 {
            checkpoint(&runner, total_times);
            last_reported = runner.line_no();
        }
    }
    if runner.line_no() != last_reported {
        checkpoint(&runner, total_times);
    }
}

fn read_input(path: &PathBuf) -> color_eyre::Result<(String, String)> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        Ok(("<stdin>".to_string(), content))
    } else {
        let content = fs::read_to_string(path)?;
        Ok((path.display().to_string(), content))
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let level = match args.verbose {
        0 => simplelog::LevelFilter::Warn,
        1 => simplelog::LevelFilter::Info,
        2 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let files = if args.files.is_empty() {
        vec![PathBuf::from("-")]
    } else {
        args.files.clone()
    };

    let num_runs = if args.test_performance { 5 } else { 1 };
    let mut total_times = TotalTimes::new();

    for file in &files {
        let (path, content) = read_input(file)?;

        for n in 0..num_runs {
            if args.test_performance {
                if n != 0 {
                    println!();
                }
                println!("run #{}", n + 1);
            }
            run_script(&path, &content, args.find_mismatches, &mut total_times);
        }
    }

    if args.test_performance {
        println!("\nmedian times:");
        for entries in total_times.values_mut() {
            entries.sort_by(|a, b| a.0.total_cmp(&b.0));
            println!("{}", entries[entries.len() / 2].1);
        }
    }

    Ok(())
}
