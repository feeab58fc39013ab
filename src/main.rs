use clap::{Parser as ClapParser, Subcommand};
use sql_to_mongodb_query::cli::{self, CheckOptions, CliError, TranslateOptions};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "sql2mongo")]
#[command(about = "Translate SQL SELECT statements into MongoDB find queries and aggregation pipelines")]
#[command(version)]
struct Cli {
    /// Log translation steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a SELECT statement and print the query as JSON
    Translate {
        /// The SQL statement (reads from stdin if not provided)
        sql: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Check that a SELECT statement translates, without printing it
    Check {
        /// The SQL statement (reads from stdin if not provided)
        sql: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Translate { sql, pretty } => run_translate(sql, pretty),
        Commands::Check { sql } => run_check(sql),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// SQL from the argument, or from stdin when it is piped.
fn read_sql(sql: Option<String>) -> Result<String, CliError> {
    match sql {
        Some(s) => Ok(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Ok(buffer)
        }
        None => Err(CliError::NoInput),
    }
}

fn run_translate(sql: Option<String>, pretty: bool) -> Result<(), CliError> {
    let options = TranslateOptions {
        sql: read_sql(sql)?,
        pretty,
    };

    println!("{}", cli::execute_translate(&options)?);
    Ok(())
}

fn run_check(sql: Option<String>) -> Result<(), CliError> {
    let options = CheckOptions { sql: read_sql(sql)? };

    println!("{}", cli::execute_check(&options)?);
    Ok(())
}
