use std::env;
use std::io::Write;
use std::time::Instant;

use anyhow::{bail, Error};
use clap::{App, AppSettings, Arg};
use env_logger::{fmt, Builder, Target};
use log::{info, warn};
use log::{Level, LevelFilter, Record};

use lrat_slim::stats::average;
use lrat_slim::{Output, Statistics, TrimConfig, Trimmer};

mod files;

use files::{open_files, FileSlots};

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            eprintln!("lrat-slim: error: {}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn init_logging(level: LevelFilter) {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        match record.level() {
            Level::Info => writeln!(buf, "c {}", record.args()),
            Level::Warn => writeln!(buf, "c WARNING {}", record.args()),
            Level::Error => writeln!(buf, "c ERROR {}", record.args()),
            _ => writeln!(buf, "c LOGGING {}", record.args()),
        }
    };

    let mut builder = Builder::new();
    builder.target(Target::Stdout).format(format).filter(None, level);

    if let Ok(ref env_var) = env::var("LRAT_SLIM_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

fn banner() {
    info!(
        "LRAT-SLIM Version {} trims and checks LRAT proofs",
        env!("CARGO_PKG_VERSION")
    );
}

fn print_mode(slots: &FileSlots, config: &TrimConfig) {
    let mode = match (
        slots.cnf_input.is_some(),
        slots.proof_output.is_some(),
        slots.cnf_output.is_some(),
    ) {
        (true, true, true) => "reading CNF and LRAT files and writing them too",
        (true, true, false) => "reading CNF and LRAT files and writing LRAT file",
        (true, false, true) => "reading CNF and LRAT files and writing CNF file",
        (true, false, false) => "reading CNF and LRAT files",
        (false, true, _) => "reading and writing LRAT files",
        (false, false, _) => "only reading LRAT file",
    };
    info!("{}", mode);

    let mode = match (config.checking, config.forward, config.trimming) {
        (true, true, true) => "forward checking all clauses followed by trimming proof",
        (true, true, false) => "forward checking all clauses without trimming proof",
        (true, false, true) => "backward checking trimmed clauses after trimming proof",
        (true, false, false) => "backward checking all clauses without trimming proof",
        (false, _, true) => "trimming proof without checking clauses",
        (false, _, false) => "neither trimming proof nor checking clauses",
    };
    info!("{}", mode);
}

fn print_statistics(stats: &Statistics, config: &TrimConfig, seconds: f64) {
    if config.checking {
        info!(
            "checked {} clauses {:.0} per second",
            stats.checked,
            average(stats.checked as f64, seconds)
        );
        info!(
            "resolved {} clauses {:.2} per checked clause",
            stats.resolved,
            average(stats.resolved as f64, stats.checked as f64)
        );
        info!(
            "assigned {} literals {:.2} per checked clause",
            stats.assigned,
            average(stats.assigned as f64, stats.checked as f64)
        );
    }
    info!("total time of {:.2} seconds", seconds);
}

fn main_with_err() -> Result<i32, Error> {
    let matches = App::new("lrat-slim")
        .version(env!("CARGO_PKG_VERSION"))
        .about(
            "Parses, trims and checks proofs in LRAT format.\n\n\
             The files are one to four of: <input-proof>, \
             <input-cnf> <input-proof>, <input-proof> <output-proof>, \
             <input-cnf> <input-proof> <output-proof> [<output-cnf>]. \
             With exactly two files the first byte of the first file decides \
             between the second and third form ('c' or 'p' means DIMACS). \
             A '-' reads from stdin or writes to stdout and '/dev/null' is a \
             hard-coded sentinel that is never opened.",
        )
        .setting(AppSettings::DisableHelpSubcommand)
        .arg_from_usage("-f, --force 'Overwrite a CNF alike second file with the proof'")
        .arg_from_usage("-S, --forward 'Forward check all added clauses eagerly'")
        .arg_from_usage("-l, --log 'Print all messages including logging messages'")
        .arg_from_usage("-q, --quiet 'Be quiet and do not print any messages'")
        .arg_from_usage("-t, --track 'Track line information for clauses'")
        .arg_from_usage("-v, --verbose 'Enable verbose messages'")
        .arg_from_usage("--no-check 'Disable checking clauses (default without CNF)'")
        .arg_from_usage("--no-trim 'Disable trimming (assume all clauses used)'")
        .arg(
            Arg::with_name("files")
                .value_name("FILE")
                .multiple(true)
                .help("Input CNF and proof plus output proof and CNF"),
        )
        .get_matches();

    let quiet = matches.is_present("quiet");
    let verbose = matches.is_present("verbose");
    let force = matches.is_present("force");
    let forward = matches.is_present("forward");
    let track = matches.is_present("track");
    let no_check = matches.is_present("no-check");
    let no_trim = matches.is_present("no-trim");

    let level = if matches.is_present("log") {
        if cfg!(feature = "logging") {
            LevelFilter::Trace
        } else {
            bail!("invalid option '-l' (built without logging support)");
        }
    } else if quiet {
        LevelFilter::Off
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    init_logging(level);
    banner();

    let paths: Vec<&str> = matches
        .values_of("files")
        .map(|values| values.collect())
        .unwrap_or_default();

    let mut slots = open_files(&paths, force, no_trim)?;

    if slots.cnf_input.is_none() && no_check {
        warn!("using '--no-check' without CNF does not make sense");
    }
    if slots.cnf_input.is_none() && forward {
        warn!("using '--forward' without CNF does not make sense");
    }

    let config = TrimConfig::from_options(
        no_check,
        no_trim,
        forward,
        track,
        slots.cnf_input.is_some(),
        slots.proof_output.is_some() || slots.cnf_output.is_some(),
    );
    print_mode(&slots, &config);

    let start = Instant::now();
    let mut trimmer = Trimmer::new(config);

    if let Some(cnf_input) = &mut slots.cnf_input {
        trimmer.parse_cnf(cnf_input)?;
    }
    trimmer.parse_proof(&mut slots.proof_input)?;
    trimmer.trim();
    trimmer.check()?;

    if let Some(path) = &slots.proof_output {
        let mut output = Output::create(path)?;
        info!("writing proof to '{}'", output.path());
        trimmer.write_proof(&mut output)?;
        output.close()?;
        info!(
            "trimmed {} bytes to {} bytes {:.0}%",
            slots.proof_input.bytes,
            output.bytes,
            lrat_slim::stats::percent(output.bytes as f64, slots.proof_input.bytes as f64)
        );
    }
    if slots.cnf_output.is_some() {
        warn!("writing the clausal core as CNF is not implemented yet");
        warn!("(only trimming and writing the input proof)");
    }

    print_statistics(trimmer.stats(), &config, start.elapsed().as_secs_f64());

    if trimmer.verified() {
        println!("s VERIFIED");
        Ok(20)
    } else {
        info!("no empty clause found and checked");
        Ok(0)
    }
}
