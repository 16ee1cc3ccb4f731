use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser as ClapParser;

use glue_lang::fetch::{Fetcher, HttpFetcher};
use glue_lang::server::{self, RoutingTable};
use glue_lang::{Lexer, ParseError, Parser, Program, SourceReader};

#[derive(ClapParser)]
#[command(name = "glue")]
#[command(about = "Glue - declare HTTP endpoints as first-class language constructs")]
#[command(version)]
struct Cli {
    /// Print the parsed AST before starting the server
    #[arg(long)]
    debug: bool,

    /// Serve ad-hoc programs sent as HTTP request bodies instead of a
    /// source file's endpoints
    #[arg(long)]
    eval: bool,

    /// Port for the eval server
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Reserved for future use
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Glue source file (required unless --eval is given)
    source_file: Option<PathBuf>,
}

enum CliError {
    Io(io::Error),
    Parse(ParseError),
    MissingSource,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "Error: {}", e),
            CliError::Parse(e) => write!(f, "{}", e),
            CliError::MissingSource => {
                write!(
                    f,
                    "Error: missing source file\nUsage: glue [--debug] [--eval] [--output=<file>] [--port=<int>] <source_file>"
                )
            }
        }
    }
}

fn load_program(path: &PathBuf, debug: bool) -> Result<Program, CliError> {
    let source = SourceReader::from_file(path).map_err(CliError::Io)?;
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program().map_err(CliError::Parse)?;

    if debug {
        println!("{:#?}", program);
    }

    Ok(program)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Some(path) = &cli.output {
        eprintln!("note: --output is reserved and ignored ({})", path.display());
    }

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher);

    if cli.eval {
        // A source file given alongside --eval is parsed (so --debug can
        // dump it) but not served
        if let Some(path) = &cli.source_file {
            load_program(path, cli.debug)?;
        }
        return server::serve_eval(cli.port, fetcher).await.map_err(CliError::Io);
    }

    let path = cli.source_file.as_ref().ok_or(CliError::MissingSource)?;
    let program = load_program(path, cli.debug)?;

    let table = RoutingTable::build(program);
    if table.is_empty() {
        println!("no endpoints declared, nothing to serve");
        return Ok(());
    }

    server::serve(table, fetcher).await.map_err(CliError::Io)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
