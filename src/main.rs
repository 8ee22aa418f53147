//! Purpose: `graphfeed` CLI entry point: optional destructive reseed, then a timed feed read.
//! Role: Binary crate root; parses args, opens the store, runs the seeder and feed reader.
//! Invariants: stdout carries only feed lines and the final `elapsed:` line.
//! Invariants: Errors go to stderr as one JSON object, or as text when stderr is a terminal.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal, Write};
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use graphfeed::api::{
    DEFAULT_BASE_URL, DEFAULT_DATABASE, Error, ErrorKind, MemoryGraph, Neo4jClient,
    QueryExecutor, SeedPlan, SeededRandom, Seeder, read_feed, to_exit_code,
};

fn main() {
    if let Err(err) = run() {
        report(&err);
        std::process::exit(to_exit_code(err.kind()));
    }
}

fn run() -> Result<(), Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(
            err.kind(),
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion
        ) =>
        {
            return err.print().map_err(|io_err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to write help")
                    .with_source(io_err)
            });
        }
        Err(err) => return Err(usage_from_clap(&err)),
    };

    init_tracing();
    execute(cli)
}

#[derive(Parser, Debug)]
#[command(
    name = "graphfeed",
    version,
    about = "Seed a graph store with random users and things, then time a feed read",
    long_about = None,
    after_help = r#"EXAMPLES
  $ graphfeed --reset --user neo4j --password secret    # wipe, reseed, read
  $ graphfeed --user neo4j --password secret            # read only
  $ graphfeed --store memory --reset --users 10 --seed 7

Logging goes to stderr; set RUST_LOG=info (or debug) for progress."#
)]
struct Cli {
    #[arg(short = 'r', long, help = "Wipe the store and reseed it before reading")]
    reset: bool,

    #[arg(
        long,
        value_enum,
        default_value = "neo4j",
        env = "GRAPHFEED_STORE",
        help = "Store to run statements against"
    )]
    store: StoreKind,

    #[arg(
        long,
        default_value = DEFAULT_BASE_URL,
        env = "GRAPHFEED_URL",
        help = "Neo4j base URL (scheme, host and port only)"
    )]
    url: String,

    #[arg(
        long,
        default_value = DEFAULT_DATABASE,
        env = "GRAPHFEED_DATABASE",
        help = "Neo4j database name"
    )]
    database: String,

    #[arg(long, env = "GRAPHFEED_USER", help = "Basic-auth user")]
    user: Option<String>,

    #[arg(
        long,
        env = "GRAPHFEED_PASSWORD",
        hide_env_values = true,
        help = "Basic-auth password"
    )]
    password: Option<String>,

    #[arg(long, default_value_t = 100, help = "Users to seed and feed pages to read")]
    users: usize,

    #[arg(
        long = "max-things",
        default_value_t = 500,
        help = "Exclusive upper bound on things per user"
    )]
    max_things: usize,

    #[arg(long, default_value_t = 50, help = "KNOWS attempts per anchor user")]
    rels_per_user: usize,

    #[arg(long, help = "Random seed (default: drawn from the OS and logged)")]
    seed: Option<u64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    Neo4j,
    Memory,
}

impl Cli {
    fn plan(&self) -> SeedPlan {
        SeedPlan {
            users: self.users,
            max_things_per_user: self.max_things,
            rels_per_user: self.rels_per_user,
        }
    }
}

fn execute(cli: Cli) -> Result<(), Error> {
    let mut store = open_store(&cli)?;

    if cli.reset {
        let random = match cli.seed {
            Some(seed) => SeededRandom::new(seed),
            None => SeededRandom::from_entropy()?,
        };
        tracing::info!(seed = random.seed(), "seeding with random seed");
        Seeder::new(&mut store, random).reset(&cli.plan())?;
    }

    tracing::info!(pages = cli.users, "reading data");
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let (items, elapsed) = read_timed(&mut store, cli.users, &mut out)?;
    tracing::info!(items, "feed read complete");
    writeln!(out, "elapsed: {elapsed:?}").map_err(stdout_error)?;
    Ok(())
}

fn open_store(cli: &Cli) -> Result<Box<dyn QueryExecutor>, Error> {
    match cli.store {
        StoreKind::Memory => Ok(Box::new(MemoryGraph::new())),
        StoreKind::Neo4j => {
            let mut client = Neo4jClient::new(cli.url.clone())?.with_database(&cli.database)?;
            match (&cli.user, &cli.password) {
                (Some(user), password) => {
                    client = client.with_credentials(user, password.as_deref().unwrap_or(""))?;
                }
                (None, Some(_)) => {
                    return Err(Error::new(ErrorKind::Usage)
                        .with_message("--password requires --user")
                        .with_hint("Pass --user (or set GRAPHFEED_USER)."));
                }
                (None, None) => {}
            }
            tracing::debug!(url = %client.display_url(), database = client.database(), "store opened");
            Ok(Box::new(client))
        }
    }
}

/// Streams the feed to `out` and times only the read phase.
fn read_timed<E: QueryExecutor>(
    executor: E,
    user_count: usize,
    out: &mut impl Write,
) -> Result<(usize, Duration), Error> {
    let start = Instant::now();
    let mut items = 0;
    for item in read_feed(executor, user_count) {
        let item = item?;
        writeln!(
            out,
            "> Thing {} was created by {}",
            item.thing.title, item.creator.username
        )
        .map_err(stdout_error)?;
        items += 1;
    }
    Ok((items, start.elapsed()))
}

fn stdout_error(err: io::Error) -> Error {
    Error::new(ErrorKind::Io)
        .with_message("failed to write to stdout")
        .with_source(err)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .try_init();
}

/// First line of clap's rendered error, without its `error:` label.
fn usage_from_clap(err: &clap::Error) -> Error {
    let rendered = err.to_string();
    let summary = rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error:").trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string());
    Error::new(ErrorKind::Usage)
        .with_message(summary)
        .with_hint("Try `graphfeed --help`.")
}

fn report(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
    } else {
        eprintln!("{}", error_json(err));
    }
}

/// Context fields shared by the text and JSON renderings, in display order.
fn error_fields(err: &Error) -> Vec<(&'static str, Value)> {
    let message = err.message().map(str::to_string).unwrap_or_else(|| {
        match err.kind() {
            ErrorKind::Internal => "internal error",
            ErrorKind::Usage => "usage error",
            ErrorKind::Execution => "statement execution failed",
            ErrorKind::Decode => "unexpected row shape",
            ErrorKind::Io => "i/o error",
        }
        .to_string()
    });
    let mut fields = vec![("message", json!(message))];
    fields.extend(err.hint().map(|hint| ("hint", json!(hint))));
    fields.extend(err.code().map(|code| ("code", json!(code))));
    fields.extend(err.page().map(|page| ("page", json!(page))));
    fields.extend(err.statement().map(|text| ("statement", json!(text))));
    if err.is_transient() {
        fields.push(("transient", json!(true)));
    }
    let causes: Vec<String> = std::iter::successors(err.source(), |&cause| cause.source())
        .map(ToString::to_string)
        .collect();
    if !causes.is_empty() {
        fields.push(("causes", json!(causes)));
    }
    fields
}

fn error_json(err: &Error) -> Value {
    let mut body = Map::new();
    body.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    body.extend(
        error_fields(err)
            .into_iter()
            .map(|(name, value)| (name.to_string(), value)),
    );
    json!({ "error": body })
}

fn error_text(err: &Error) -> String {
    error_fields(err)
        .into_iter()
        .filter_map(|(name, value)| match (name, value) {
            ("message", Value::String(message)) => Some(format!("error: {message}")),
            ("statement" | "transient", _) => None,
            ("causes", Value::Array(causes)) => causes
                .first()
                .and_then(Value::as_str)
                .map(|cause| format!("caused by: {cause}")),
            (name, Value::String(text)) => Some(format!("{name}: {text}")),
            (name, other) => Some(format!("{name}: {other}")),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
