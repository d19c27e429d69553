// Copyright (c) 2016-2021 Fabian Schuiki

//! Realize stochastic L-system grammars from the command line.

extern crate clap;
extern crate lsys;
#[macro_use]
extern crate log;

use clap::{App, Arg, ArgMatches};
use lsys::engine::LSystem;
use lsys::engine::Sym;
use lsys::errors::*;
use lsys::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::str::FromStr;

fn main() {
    let matches = App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Realizes stochastic L-system grammars.")
        .arg(
            Arg::with_name("verbosity")
                .short("v")
                .multiple(true)
                .help("Increase message verbosity"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .help("Silence all log output"),
        )
        .arg(
            Arg::with_name("verbosity-opts")
                .short("V")
                .help("Sets verbosity settings")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .possible_values(&["grammar", "generations"]),
        )
        .arg(
            Arg::with_name("max-generations")
                .short("n")
                .long("max-generations")
                .value_name("N")
                .help("Stop after N generations, even without a fixpoint")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("seed")
                .short("s")
                .long("seed")
                .value_name("SEED")
                .help("Seed the random number generator for reproducible output")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("count")
                .short("c")
                .long("count")
                .value_name("N")
                .help("Realize the grammar N times")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("INPUT")
                .help("The grammar file to realize")
                .required(true),
        )
        .get_matches();

    // Configure the logger.
    let level = if matches.is_present("quiet") {
        log::LevelFilter::Off
    } else {
        match matches.occurrences_of("verbosity") {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .init();

    // Configure the session.
    let mut session = Session::new();
    for v in matches
        .values_of("verbosity-opts")
        .into_iter()
        .flat_map(|v| v)
    {
        session.opts.verbosity |= match v {
            "grammar" => Verbosity::GRAMMAR,
            "generations" => Verbosity::GENERATIONS,
            _ => unreachable!(),
        };
    }
    session.opts.max_generations = number_arg(&matches, "max-generations");
    session.opts.seed = number_arg(&matches, "seed");
    session.opts.count = number_arg(&matches, "count").unwrap_or(1);

    if let Err(d) = run(&session, &matches) {
        session.emit(d);
    }
    if session.failed() {
        std::process::exit(1);
    }
}

/// Parse an optional numeric argument, exiting with a usage error if it is
/// malformed.
fn number_arg<T: FromStr>(matches: &ArgMatches, name: &str) -> Option<T> {
    matches.value_of(name).map(|v| {
        v.parse().unwrap_or_else(|_| {
            clap::Error {
                message: format!("invalid value for '{}': {}", name, v),
                kind: clap::ErrorKind::InvalidValue,
                info: None,
            }
            .exit()
        })
    })
}

fn run(sess: &Session, matches: &ArgMatches) -> DiagResult2<()> {
    let filename = matches.value_of("INPUT").unwrap_or_default();
    let grammar = grammar::parse_file(filename, sess)?;
    if sess.has_verbosity(Verbosity::GRAMMAR) {
        print!("{}", grammar);
    }
    let system = grammar.into_system()?;
    debug!("realizing `{}` {} time(s)", filename, sess.opts.count);

    for i in 0..sess.opts.count {
        match sess.opts.seed {
            Some(seed) => walk(sess, &system, StdRng::seed_from_u64(seed.wrapping_add(i as u64))),
            None => walk(sess, &system, rand::thread_rng()),
        }
    }
    Ok(())
}

/// Derive one walk through the system and print it.
fn walk<R: Rng>(sess: &Session, system: &LSystem<Sym>, rng: R) {
    let limit = sess.opts.max_generations.unwrap_or(usize::max_value());
    let verbose = sess.has_verbosity(Verbosity::GENERATIONS);
    let axiom = engine::Generation::new(0, system.axiom().tokens());
    if verbose {
        println!("0: {}", axiom);
    }
    let mut last = None;
    for gen in system.expand_with(rng).take(limit) {
        if verbose {
            println!("{}: {}", gen.index(), gen);
        }
        last = Some(gen);
    }
    if !verbose {
        println!("{}", last.unwrap_or(axiom));
    }
}
