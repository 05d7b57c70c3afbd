//! Email Builder CLI
//!
//! Usage:
//!   email-builder [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --config <FILE>      Engine configuration (TOML format)
//!   -f, --format <FORMAT>    Output format: html, script, tags or json
//!   -m, --mobile             Render the narrow mobile view
//!   -t, --theme <HEX>        Override the document theme seed
//!   --logo <FILE>            Inline a logo image for `src=logo`
//!   --palette <HEX>          Print the palette derived from a seed and exit
//!   -s, --starter <NAME>     Start from a built-in template instead of input
//!   -g, --grammar            Show the script syntax reference
//!   -d, --debug              Verbose logging on stderr
//!   -h, --help               Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use email_builder::{
    compile, derive_theme, resolve_email, starter, to_html, to_script, to_tag_script, Company,
    Email, EngineConfig, ResolveContext,
};

#[derive(Parser)]
#[command(name = "email-builder")]
#[command(about = "Compile email template scripts into email-safe HTML")]
struct Cli {
    /// Input file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Engine configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Render the mobile view (narrow width, stacked columns)
    #[arg(short, long)]
    mobile: bool,

    /// Theme seed color overriding the document's own
    #[arg(short, long, value_name = "HEX")]
    theme: Option<String>,

    /// Logo image inlined as a data URL for `src=logo` images
    #[arg(long, value_name = "FILE")]
    logo: Option<PathBuf>,

    /// Print the palette derived from a seed color as JSON and exit
    #[arg(long, value_name = "HEX")]
    palette: Option<String>,

    /// Use a built-in starter template as input
    #[arg(short, long, value_enum)]
    starter: Option<Starter>,

    /// Show the script syntax reference
    #[arg(short, long)]
    grammar: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    debug: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Html,
    Script,
    Tags,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Starter {
    Welcome,
    Newsletter,
    Promotion,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    // Handle documentation flags first
    if cli.grammar {
        print_grammar();
        return;
    }

    if let Some(seed) = &cli.palette {
        match serde_json::to_string_pretty(&derive_theme(seed)) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(&format!("Error encoding palette: {}", e)),
        }
        return;
    }

    // If no input file and stdin is a terminal (interactive), show intro help
    if cli.input.is_none() && cli.starter.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path).unwrap_or_else(|e| {
            fail(&format!("Error loading config '{}': {}", path.display(), e))
        }),
        None => EngineConfig::default(),
    };

    let mut email = match cli.starter {
        Some(starter) => starter_email(starter),
        None => {
            let source = read_source(cli.input.as_deref());
            match compile(&source) {
                Ok(email) => email,
                Err(e) => {
                    let filename = cli
                        .input
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "<stdin>".to_string());
                    eprint!("{}", e.format(&source, &filename));
                    std::process::exit(1);
                }
            }
        }
    };

    if let Some(theme) = cli.theme {
        email.theme = Some(theme);
    }

    let output = match cli.format {
        Format::Script => to_script(&email),
        Format::Tags => to_tag_script(&email),
        Format::Json => serde_json::to_string_pretty(&email)
            .unwrap_or_else(|e| fail(&format!("Error encoding document: {}", e))),
        Format::Html => {
            let mut ctx = ResolveContext::new()
                .with_mobile_view(cli.mobile)
                .with_config(config.render.clone());
            if let Some(path) = &cli.logo {
                ctx = ctx.with_company(Company::with_logo(logo_data_url(path)));
            }
            to_html(&resolve_email(&email, &ctx), &config.render)
        }
    };
    println!("{}", output);
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

fn starter_email(starter: Starter) -> Email {
    match starter {
        Starter::Welcome => starter::welcome(),
        Starter::Newsletter => starter::newsletter(),
        Starter::Promotion => starter::promotion(),
    }
}

fn read_source(input: Option<&Path>) -> String {
    match input {
        Some(path) => fs::read_to_string(path).unwrap_or_else(|e| {
            fail(&format!("Error reading file '{}': {}", path.display(), e))
        }),
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                fail(&format!("Error reading from stdin: {}", e));
            }
            buffer
        }
    }
}

/// Read an image file into a `data:` URL
fn logo_data_url(path: &Path) -> String {
    let bytes = fs::read(path)
        .unwrap_or_else(|e| fail(&format!("Error reading logo '{}': {}", path.display(), e)));
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    debug!(path = %path.display(), bytes = bytes.len(), mime, "inlining logo");
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

fn print_intro() {
    println!(
        r#"Email Builder - compile email template scripts into email-safe HTML

USAGE:
    email-builder [OPTIONS] [FILE]
    echo '<script>' | email-builder

OPTIONS:
    -f, --format       html (default), script, tags or json
    -m, --mobile       Render the mobile view
    -t, --theme        Override the theme seed color
    --logo             Inline a logo for `src=logo` images
    --palette          Print the palette derived from a seed color
    -s, --starter      Start from welcome, newsletter or promotion
    -c, --config       Engine configuration (TOML file)
    -g, --grammar      Show the script syntax reference
    -d, --debug        Verbose logging
    -h, --help         Print help

QUICK START:
    echo 'ROW {{ COLUMN {{ TEXT content=<p>Hi</p> }} }}' | email-builder > email.html

Run --grammar for the syntax reference."#
    );
}

fn print_grammar() {
    println!(
        r#"EMAIL TEMPLATE SCRIPT
=====================

BRACE FORM
----------
EMAIL name="Launch" styleVariant=outline theme=#3B82F6 {{
  ROW type=hero padding=32,24 {{
    COLUMN width=50% {{
      HEADING level=h1 content="Big news"
      TEXT content=<p>Rich <b>text</b></p>
    }}
    COLUMN {{ IMAGE src=logo alt="Logo" }}
  }}
}}

The EMAIL wrapper is optional; bare ROWs are accepted.

TAG FORM
--------
<EMAIL name="Launch">
  <ROW type=footer>
    <COLUMN><TEXT><p>Bye</p></TEXT></COLUMN>
    <COLUMN><DIVIDER padding=8,0 /></COLUMN>
  </ROW>
</EMAIL>

One document uses one form; mixing them is an error.

ELEMENTS
--------
EMAIL ROW COLUMN
TEXT HEADING IMAGE BUTTON LINK DIVIDER SOCIALS SURVEY TABLE LIST SPACER ICON

VALUES
------
key=value         Literal; true/false and numbers are typed
key="a b"         Quoted, supports \" and \\
padding=8,16      Box shorthand (padding, margin), CSS 1-4 value rules
rows=[["A","B"]]  Embedded JSON
content=<p>..</p> Inline HTML up to the matching closing tag

ROWS AND COLUMNS
----------------
ROW type=header|footer|hero|gallery|cart|discount|cta
ROW containerAlign=center containerBackgroundColor=#111
COLUMN width=50%  or  COLUMN width=6 (of 12 grid units)
Unsized columns share the remaining width."#
    );
}
