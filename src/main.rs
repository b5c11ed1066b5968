//! gdoc2doc CLI - Export Google Docs using natural language queries.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use gdoc2doc::selector::{self, Selection};
use gdoc2doc::formats::SUPPORTED_FORMATS;
use gdoc2doc::{
    Authenticator, DriveClient, ExportFormat, Exporter, GdocError, MatcherConfig, QueryMatcher,
};

const GOOGLE_TOKEN_ENV: &str = "GOOGLE-DOCS_JWT_KEY";
const TOGETHER_KEY_ENV: &str = "TOGETHER_API_KEY";

const AFTER_HELP: &str = "\
Examples:
  gdoc2doc \"meeting notes\"
  gdoc2doc -t md \"project proposal\"
  gdoc2doc -type docx -output ./exports \"report\"
  gdoc2doc -list

Setup:
  GOOGLE-DOCS_JWT_KEY  OAuth token JSON (token, refresh_token, token_uri,
                       client_id, client_secret, scopes)
  TOGETHER_API_KEY     Together AI API key
  Both may also be placed in a .env file in the working directory.";

/// Export Google Docs using natural language queries.
#[derive(Parser)]
#[command(name = "gdoc2doc")]
#[command(author, version, about, long_about = None, after_help = AFTER_HELP)]
struct Cli {
    /// Output directory for exported files.
    #[arg(long, short = 'o', default_value = "downloads")]
    output: PathBuf,

    /// List all documents without filtering.
    #[arg(long)]
    list: bool,

    /// Export format: pdf, docx, odt, rtf, txt, html, epub, md.
    #[arg(long = "type", short = 't', default_value = "pdf")]
    format: String,

    /// Show debug logging.
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Google OAuth token JSON.
    #[arg(long, env = "GOOGLE-DOCS_JWT_KEY", hide = true, hide_env_values = true)]
    google_token: Option<String>,

    /// Together AI API key.
    #[arg(long, env = "TOGETHER_API_KEY", hide = true, hide_env_values = true)]
    together_api_key: Option<String>,

    /// Natural-language description of the documents to export.
    query: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors exit 1 like every other failure; help and version exit 0.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    init_tracing(cli.verbose);

    let query = cli.query.join(" ");

    if query.is_empty() && !cli.list {
        Cli::command().print_help()?;
        return Ok(());
    }

    let format = ExportFormat::lookup(&cli.format)
        .map_err(|e| anyhow::anyhow!("{}\nSupported formats: {}", e, SUPPORTED_FORMATS))?;
    debug!(%format, output = %cli.output.display(), "export settings");

    let token_json = require_secret(
        cli.google_token,
        GOOGLE_TOKEN_ENV,
        "Set it to the OAuth token JSON produced by the Google setup flow.",
    )?;
    let auth = Authenticator::from_json(&token_json)
        .with_context(|| format!("Failed to load credentials from {}", GOOGLE_TOKEN_ENV))?;
    debug!(scopes = ?auth.scopes(), "loaded Google token");

    let client = DriveClient::new(auth);

    println!("Fetching documents from Google Drive...");
    let documents = client
        .list_documents()
        .await
        .context("Failed to list documents")?;

    if documents.is_empty() {
        println!("No Google Docs found in your Drive.");
        return Ok(());
    }

    println!("Found {} documents.\n", documents.len());

    if cli.list {
        for (index, document) in documents.iter().enumerate() {
            println!("{}. {}", index + 1, document);
        }
        return Ok(());
    }

    let api_key = require_secret(
        cli.together_api_key,
        TOGETHER_KEY_ENV,
        "Set it to your Together AI API key.",
    )?;

    println!("Filtering documents with query: {}", query);
    println!("Sending to Together AI...");

    let matcher = QueryMatcher::new(MatcherConfig::new(api_key));
    let matches = matcher
        .find_matches(&documents, &query)
        .await
        .context("Error filtering documents")?;

    if matches.is_empty() {
        println!("\nNo documents matched your query.");
        return Ok(());
    }

    println!("\nFound {} matching document(s):", matches.len());
    for (index, document) in matches.iter().enumerate() {
        println!("  {}. {}", index + 1, document.name);
    }

    let selection = {
        let mut stdin = io::stdin().lock();
        let mut stdout = io::stdout();
        selector::select(&matches, &mut stdin, &mut stdout)?
    };

    let exporter = Exporter::new(&client, cli.output, format);

    match selection {
        Selection::Empty => {}
        Selection::Quit => println!("Exiting."),
        Selection::One(index) => {
            let document = &matches[index];
            exporter
                .export(document)
                .await
                .with_context(|| format!("Error exporting {}", document.name))?;
        }
        Selection::All => {
            let summary = exporter.export_all(&matches).await;
            println!(
                "\nExported {} of {} document(s).",
                summary.exported.len(),
                matches.len()
            );
        }
    }

    Ok(())
}

/// Unwrap a secret taken from the environment, or explain how to set it.
fn require_secret(value: Option<String>, name: &str, hint: &str) -> Result<String, GdocError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GdocError::MissingEnvVar {
            name: name.to_string(),
            hint: hint.to_string(),
        })
}

/// Long flags that may also be spelled with a single dash.
const SINGLE_DASH_LONG_FLAGS: [&str; 3] = ["output", "list", "type"];

/// Rewrite `-output`, `-list` and `-type` (optionally `=value`) to their
/// `--` forms. Arguments after a bare `--` are left alone.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let mut after_terminator = false;

    args.into_iter()
        .map(Into::into)
        .map(|arg: OsString| {
            if after_terminator {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                after_terminator = true;
                return arg;
            }
            let Some(rest) = text.strip_prefix('-').filter(|r| !r.starts_with('-')) else {
                return arg;
            };
            let name = rest.split('=').next().unwrap_or(rest);
            if SINGLE_DASH_LONG_FLAGS.contains(&name) {
                OsString::from(format!("-{}", text))
            } else {
                arg
            }
        })
        .collect()
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("gdoc2doc=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}
