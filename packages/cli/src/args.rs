//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use memoires_http::config::DEFAULT_BASE_URL;
use memoires_http::Method;

/// memoires - query and maintain the thesis catalogue
#[derive(Parser, Debug)]
#[command(name = "memoires")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// API base URL, including the `/api` prefix
    #[arg(long, env = "MEMOIRES_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "MEMOIRES_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Session cookies as `name=value; name2=value2`, used by `request`
    #[arg(long, env = "MEMOIRES_COOKIE")]
    pub cookie: Option<String>,

    /// Refuse mutating `request` calls when no CSRF token cookie is present
    #[arg(long, env = "MEMOIRES_REQUIRE_CSRF")]
    pub require_csrf: bool,

    /// Log requests and cache decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Catalogue summary: counts, latest year, tallies per year and track
    Stats,

    /// List theses, optionally filtered
    List {
        #[arg(long)]
        year: Option<i32>,

        /// Track id or name
        #[arg(long)]
        filiere: Option<String>,

        /// Supervisor id or name
        #[arg(long)]
        encadreur: Option<String>,

        /// Newest first, keeping N entries (default 5)
        #[arg(long, value_name = "N")]
        recent: Option<Option<usize>>,
    },

    /// Show one thesis
    Show { id: u64 },

    /// Case-insensitive search
    Search {
        query: String,

        /// Field to scan; repeatable (default: titre, auteur, mots_cles, description)
        #[arg(long = "field", value_name = "FIELD")]
        fields: Vec<String>,
    },

    /// List tracks, or show one with its statistics
    Filieres {
        #[arg(long)]
        id: Option<u64>,
    },

    /// List supervisors, or show one with its statistics
    Encadreurs {
        #[arg(long)]
        id: Option<u64>,
    },

    /// List keywords
    Keywords,

    /// Upload a thesis file with its fields
    Upload {
        #[arg(long)]
        file: PathBuf,

        /// Form field carrying the file
        #[arg(long, default_value = "fichier_pdf")]
        file_field: String,

        /// MIME type; guessed from the extension when omitted
        #[arg(long)]
        mime: Option<String>,

        /// Largest accepted file, in MB
        #[arg(long, default_value_t = 10.0)]
        max_size_mb: f64,

        /// Form field as `key=value`; repeatable
        #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Delete theses one after another
    Delete {
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Raw request with session cookies and CSRF header
    Request {
        method: Method,

        /// Path relative to the API base, e.g. `/tracks/1/`
        path: String,

        /// JSON body
        #[arg(long)]
        data: Option<String>,
    },
}

/// Parse a `key=value` form field. The value may be empty; the key may not.
pub fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty field name in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}
