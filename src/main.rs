//! fx-propagation CLI
//!
//! Terminal front-end for the live currency converter.
//!
//! # Usage
//!
//! ```bash
//! # Show current cross rates
//! fx-propagation rates
//!
//! # Convert one amount into every other currency
//! fx-propagation convert --from USD --amount 100
//!
//! # Interactive converter fed from stdin
//! fx-propagation session
//!
//! # Replay a random edit stream
//! fx-propagation simulate --edits 1000 --offline
//! ```

use fx_propagation::config::ConverterConfig;
use fx_propagation::core::currency::CurrencyCode;
use fx_propagation::engine::display::DisplayBoard;
use fx_propagation::engine::propagation::{Propagation, PropagationEngine};
use fx_propagation::engine::rate_board::RateBoard;
use fx_propagation::rates::provider::{RateProvider, StaticRateProvider};
use fx_propagation::rates::refresh::{refresh, RateRefresher, RefreshOutcome};
use fx_propagation::simulation::edit_stream::{generate_edit_stream, replay, EditStreamConfig};
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::process;

fn print_usage() {
    eprintln!(
        r#"fx-propagation — live multi-currency converter

USAGE:
    fx-propagation <COMMAND> [OPTIONS]

COMMANDS:
    rates       Load exchange rates and print the cross-rate board
    convert     Convert one amount into every other currency
    session     Interactive converter reading edits from stdin
    simulate    Replay a random edit stream through the engine
    help        Show this message

OPTIONS (all commands):
    --config <FILE>     JSON configuration file
    --offline           Do not fetch; use the default rates

OPTIONS (rates, convert, simulate):
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (convert):
    --from <CODE>       Currency of the amount (e.g. USD)
    --amount <TEXT>     Amount as typed into the field

OPTIONS (simulate):
    --edits <N>         Number of edits to replay (default: 1000)

SESSION INPUT:
    <CODE> <AMOUNT>     Type an amount into a currency field
    clear               Clear all fields
    refresh             Reload rates in the background
    rates               Print the cross-rate board
    quit                Leave the session

EXAMPLES:
    fx-propagation rates
    fx-propagation convert --from EUR --amount 250
    fx-propagation convert --from RUB --amount 10000 --format json --offline
    RUST_LOG=debug fx-propagation session"#
    );
}

/// Options accepted by every command.
#[derive(Default)]
struct Options {
    config_path: Option<String>,
    offline: bool,
    json: bool,
    from: Option<String>,
    amount: Option<String>,
    edits: usize,
}

fn take_value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| {
        eprintln!("{} requires {}", flag, what);
        process::exit(1);
    })
}

fn parse_options(args: &[String], allowed: &[&str]) -> Options {
    let mut options = Options {
        edits: 1000,
        ..Default::default()
    };
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if !allowed.contains(&flag) && flag != "--config" && flag != "--offline" {
            eprintln!("Unknown option: {}", flag);
            process::exit(1);
        }
        match flag {
            "--config" => {
                i += 1;
                options.config_path = Some(take_value(args, i, flag, "a file path"));
            }
            "--offline" => options.offline = true,
            "--format" => {
                i += 1;
                options.json = match take_value(args, i, flag, "'text' or 'json'").as_str() {
                    "json" => true,
                    "text" => false,
                    other => {
                        eprintln!("Unknown format: {}", other);
                        process::exit(1);
                    }
                };
            }
            "--from" => {
                i += 1;
                options.from = Some(take_value(args, i, flag, "a currency code"));
            }
            "--amount" => {
                i += 1;
                options.amount = Some(take_value(args, i, flag, "an amount"));
            }
            "--edits" => {
                i += 1;
                options.edits = take_value(args, i, flag, "a number")
                    .parse()
                    .unwrap_or_else(|_| {
                        eprintln!("--edits requires a number");
                        process::exit(1);
                    });
            }
            _ => unreachable!("flag checked against the allowed list"),
        }
        i += 1;
    }
    options
}

fn load_config(options: &Options) -> ConverterConfig {
    match &options.config_path {
        Some(path) => ConverterConfig::load(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => ConverterConfig::default(),
    }
}

fn build_engine(config: &ConverterConfig) -> PropagationEngine {
    let registry = config.registry().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });
    PropagationEngine::new(registry)
}

fn build_provider(config: &ConverterConfig, offline: bool) -> Box<dyn RateProvider> {
    if offline {
        return Box::new(StaticRateProvider::unavailable("offline mode"));
    }
    match config.http_provider() {
        Ok(provider) => Box::new(provider),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Build an engine and load its rates, reporting a fallback on stderr.
fn loaded_engine(options: &Options) -> (PropagationEngine, RefreshOutcome) {
    let config = load_config(options);
    let mut engine = build_engine(&config);
    let outcome = refresh(&mut engine, &build_provider(&config, options.offline));
    if !outcome.is_live() {
        eprintln!("Warning: {}", outcome);
    }
    (engine, outcome)
}

fn rate_board(engine: &PropagationEngine) -> RateBoard {
    RateBoard::from_registry(engine.registry(), engine.rates_date()).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    })
}

fn print_fields(engine: &PropagationEngine, board: &DisplayBoard) {
    for currency in engine.registry().currencies() {
        let text = board.text(currency.code());
        println!(
            "  {:<4} {:>3}  {:>20}   {}",
            currency.code().as_str(),
            currency.symbol(),
            if text.is_empty() { "—" } else { text },
            currency.display_name()
        );
    }
}

#[derive(serde::Serialize)]
struct ConvertOutput {
    source: String,
    input: String,
    outcome: Propagation,
    fields: BTreeMap<String, String>,
    rates: RefreshOutcome,
}

fn cmd_rates(args: &[String]) {
    let options = parse_options(args, &["--format"]);
    let (engine, _) = loaded_engine(&options);
    let board = rate_board(&engine);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&board).unwrap_or_default());
    } else {
        print!("{}", board);
    }
}

fn cmd_convert(args: &[String]) {
    let options = parse_options(args, &["--format", "--from", "--amount"]);
    let source = CurrencyCode::new(options.from.clone().unwrap_or_else(|| {
        eprintln!("Error: --from <CODE> is required");
        process::exit(1);
    }));
    let text = options.amount.clone().unwrap_or_else(|| {
        eprintln!("Error: --amount <TEXT> is required");
        process::exit(1);
    });

    let (engine, rates) = loaded_engine(&options);
    let mut board = DisplayBoard::with_fields(engine.registry().codes());
    board.type_text(&source, &text);

    let outcome = engine
        .on_text_changed(&source, &text, &mut board)
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        });

    if options.json {
        let output = ConvertOutput {
            source: source.to_string(),
            input: text,
            outcome,
            fields: board
                .fields()
                .iter()
                .map(|(code, field)| (code.to_string(), field.text.clone()))
                .collect(),
            rates,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
    } else {
        if let Propagation::Skipped(reason) = outcome {
            eprintln!("Nothing converted: {}", reason);
        }
        print_fields(&engine, &board);
    }
}

const SESSION_USAGE: &str = "<CODE> <AMOUNT> | clear | refresh | rates | quit";

/// One line of session input.
#[derive(Debug, PartialEq)]
enum SessionCommand<'a> {
    Blank,
    Quit,
    Rates,
    Clear,
    Refresh,
    Edit { source: CurrencyCode, text: &'a str },
    Unknown(&'a str),
    /// Too many words, or a keyword followed by an argument.
    Malformed,
}

fn parse_session_line(line: &str) -> SessionCommand<'_> {
    let mut words = line.split_whitespace();
    let (first, second) = (words.next(), words.next());
    if words.next().is_some() {
        return SessionCommand::Malformed;
    }
    match (first, second) {
        (None, _) => SessionCommand::Blank,
        (Some("quit" | "exit"), None) => SessionCommand::Quit,
        (Some("rates"), None) => SessionCommand::Rates,
        (Some("clear"), None) => SessionCommand::Clear,
        (Some("refresh"), None) => SessionCommand::Refresh,
        (Some("quit" | "exit" | "rates" | "clear" | "refresh"), Some(_)) => SessionCommand::Malformed,
        (Some(code), Some(text)) => SessionCommand::Edit {
            source: CurrencyCode::new(code.to_uppercase()),
            text,
        },
        (Some(other), None) => SessionCommand::Unknown(other),
    }
}

fn cmd_session(args: &[String]) {
    let options = parse_options(args, &[]);
    let config = load_config(&options);
    let mut engine = build_engine(&config);
    let mut board = DisplayBoard::with_fields(engine.registry().codes());
    let mut refresher = Some(RateRefresher::spawn(build_provider(&config, options.offline)));

    println!("Loading current rates...");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if let Some(pending) = refresher.as_mut() {
            if let Some(outcome) = pending.poll(&mut engine) {
                println!("{}", outcome);
                print!("{}", rate_board(&engine));
                refresher = None;
            }
        }

        print!("> ");
        let _ = io::stdout().flush();
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
            None => break,
        };

        match parse_session_line(&line) {
            SessionCommand::Blank => continue,
            SessionCommand::Quit => break,
            SessionCommand::Rates => print!("{}", rate_board(&engine)),
            SessionCommand::Clear => {
                if let Err(e) = engine.clear_all(&mut board) {
                    eprintln!("Error: {}", e);
                }
                print_fields(&engine, &board);
            }
            SessionCommand::Refresh => {
                if refresher.is_some() {
                    println!("A refresh is already running.");
                } else {
                    println!("Loading current rates...");
                    refresher = Some(RateRefresher::spawn(build_provider(&config, options.offline)));
                }
            }
            SessionCommand::Edit { source, text } => {
                if engine.registry().get(&source).is_err() {
                    println!("Unknown currency: {}", source);
                    continue;
                }
                board.type_text(&source, text);
                match engine.on_text_changed(&source, text, &mut board) {
                    Ok(Propagation::Skipped(reason)) => println!("({})", reason),
                    Ok(Propagation::Completed { .. }) => {}
                    Err(e) => eprintln!("Error: {}", e),
                }
                print_fields(&engine, &board);
            }
            SessionCommand::Unknown(other) => println!("Unknown command: {} (try 'USD 100')", other),
            SessionCommand::Malformed => println!("Usage: {}", SESSION_USAGE),
        }
    }
}

fn cmd_simulate(args: &[String]) {
    let options = parse_options(args, &["--format", "--edits"]);
    let (engine, _) = loaded_engine(&options);

    let config = EditStreamConfig {
        edits: options.edits,
        currencies: engine.registry().codes().cloned().collect(),
        ..Default::default()
    };
    let edits = generate_edit_stream(&config);

    let mut board = DisplayBoard::with_fields(engine.registry().codes());
    let stats = replay(&engine, &edits, &mut board).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    if options.json {
        println!("{}", serde_json::to_string_pretty(&stats).unwrap_or_default());
    } else {
        println!("Edits replayed:   {}", stats.edits);
        println!("Passes run:       {}", stats.passes);
        println!("Edits skipped:    {}", stats.skipped);
        println!("Fields written:   {}", stats.fields_written);
        println!("Final fields:");
        print_fields(&engine, &board);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "rates" => cmd_rates(rest),
        "convert" => cmd_convert(rest),
        "session" => cmd_session(rest),
        "simulate" => cmd_simulate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
