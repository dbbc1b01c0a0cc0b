//! CLI commands and argument parsing

use crate::patient::{DateParam, Gender, PatientSearchOptions};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// NHS Personal Demographics Service FHIR client
#[derive(Parser, Debug)]
#[command(name = "nhs-fhir")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, overriding the configuration file
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Give up after this many seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log level for the subscriber
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retrieve a patient by NHS number
    Get {
        /// 10 digit NHS number
        nhs_number: String,
    },

    /// Search for patients
    Search(SearchArgs),

    /// Print a signed client assertion for the configured JWT auth
    Assertion,

    /// Check an NHS number offline
    Validate {
        /// 10 digit NHS number
        nhs_number: String,
    },
}

/// Patient search filters
#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Family name; wildcards allowed unless fuzzy
    #[arg(long)]
    pub family: Option<String>,

    /// Given name (repeatable)
    #[arg(long)]
    pub given: Vec<String>,

    #[arg(long)]
    pub gender: Option<Gender>,

    /// Birth date, optionally prefixed, e.g. ge2010-01-01 (repeatable)
    #[arg(long)]
    pub birthdate: Vec<DateParam>,

    /// Death date, optionally prefixed (repeatable)
    #[arg(long)]
    pub death_date: Vec<DateParam>,

    #[arg(long)]
    pub postcode: Option<String>,

    /// ODS code of the registered GP practice
    #[arg(long)]
    pub general_practitioner: Option<String>,

    /// Fuzzy search
    #[arg(long)]
    pub fuzzy: bool,

    /// Only exact matches
    #[arg(long)]
    pub exact: bool,

    /// Include historic data
    #[arg(long)]
    pub history: bool,

    #[arg(long, default_value = "1")]
    pub max_results: u32,

    /// Print the whole bundle, match scores included
    #[arg(long)]
    pub bundle: bool,
}

impl SearchArgs {
    /// Flags left unset are not sent
    pub fn to_options(&self) -> PatientSearchOptions {
        PatientSearchOptions {
            fuzzy_match: self.fuzzy.then_some(true),
            exact_match: self.exact.then_some(true),
            history: self.history.then_some(true),
            max_results: self.max_results,
            family: self.family.clone(),
            given: self.given.clone(),
            gender: self.gender,
            birthdate: self.birthdate.clone(),
            death_date: self.death_date.clone(),
            postcode: self.postcode.clone(),
            general_practitioner: self.general_practitioner.clone(),
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    #[default]
    Pretty,
}
