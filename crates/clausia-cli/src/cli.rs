//! Command-line definitions.
//!
//! Every global option has an environment fallback; a `.env` file in the
//! working directory is loaded before parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clausia_core::{DEFAULT_RELATIONSHIP_TYPE, RelationshipScope, timeline::DEFAULT_CLAUSE_TYPE};

#[derive(Parser, Debug)]
#[command(name = "clausia", version)]
#[command(about = "Contract genealogy, prevailing terms and obligations for legal matters")]
pub struct Cli {
    /// DuckDB database file
    #[arg(long, env = "CLAUSIA_DB", default_value = "clausia.duckdb", global = true)]
    pub db: PathBuf,

    /// Directory uploaded files are stored under
    #[arg(long, env = "CLAUSIA_FILES", default_value = "clausia-files", global = true)]
    pub files: PathBuf,

    /// AI backend base URL
    #[arg(long, env = "CLAUSIA_BACKEND_URL", default_value = "http://localhost:8000", global = true)]
    pub backend_url: String,

    /// Acting user id
    #[arg(long, env = "CLAUSIA_USER", global = true)]
    pub user: Option<String>,

    /// Active organization id; selects the organization's tenant
    #[arg(long, env = "CLAUSIA_ORG", global = true)]
    pub org: Option<String>,

    /// Relationships considered by matter queries (tenant, touching, matter)
    #[arg(long, env = "CLAUSIA_SCOPE", default_value = "matter", global = true)]
    pub scope: RelationshipScope,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create, list and delete matters
    #[command(subcommand)]
    Matter(MatterCommand),

    /// Upload, list, link and delete documents
    #[command(subcommand)]
    Doc(DocCommand),

    /// Show a matter's document genealogy graph
    Genealogy { matter: String },

    /// Resolve which document's terms prevail in a matter
    Prevailing { matter: String },

    /// Show how one clause type evolved across a matter's documents
    Timeline {
        matter: String,
        #[arg(long, default_value = DEFAULT_CLAUSE_TYPE)]
        clause_type: String,
    },

    /// List a matter's obligations with due-date urgency
    Obligations { matter: String },

    /// Obligations, prevailing terms and clause timeline in one view
    Panel {
        matter: String,
        #[arg(long, default_value = DEFAULT_CLAUSE_TYPE)]
        clause_type: String,
    },

    /// Add and list reviewer notes on a document
    #[command(subcommand)]
    Note(NoteCommand),

    /// Ask the AI backend a question about the tenant's contracts
    Chat { question: String },

    /// Replace every table with `{table}.parquet` files from a directory
    Import { dir: PathBuf },

    /// Write every table to `{table}.parquet` files in a directory
    Export { dir: PathBuf },

    /// Row counts per table
    Stats,

    /// Run SQL against the database and print the result
    Query { sql: String },
}

#[derive(Subcommand, Debug)]
pub enum MatterCommand {
    /// Open a new matter
    Create(CreateMatter),
    /// List the tenant's matters, newest first
    List,
    /// Delete a matter with all of its documents and files
    Delete { id: String },
    /// Find existing matters for a client name
    Conflicts { client: String },
}

#[derive(Args, Debug)]
pub struct CreateMatter {
    pub title: String,
    #[arg(long)]
    pub practice_area: String,
    #[arg(long)]
    pub client: String,
    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Subcommand, Debug)]
pub enum DocCommand {
    /// Upload a file into a matter
    Upload(UploadArgs),
    /// List a matter's documents, oldest first
    List { matter: String },
    /// Record that `child` derives from `parent`
    Link {
        parent: String,
        child: String,
        #[arg(long, default_value = DEFAULT_RELATIONSHIP_TYPE)]
        relationship: String,
    },
    /// Delete a document and its stored file
    Delete { id: String },
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    pub matter: String,
    pub path: PathBuf,
    /// Document title (defaults to the file name)
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    /// Existing document this upload amends or derives from
    #[arg(long)]
    pub parent: Option<String>,
    #[arg(long, default_value = DEFAULT_RELATIONSHIP_TYPE)]
    pub relationship: String,
    /// Skip AI ingestion even for PDFs
    #[arg(long)]
    pub no_ingest: bool,
}

#[derive(Subcommand, Debug)]
pub enum NoteCommand {
    /// Anchor a comment to a quote in a document
    Add {
        document: String,
        #[arg(long)]
        quote: String,
        #[arg(long)]
        comment: String,
        /// Highlight position as JSON
        #[arg(long, default_value = "{}")]
        position: String,
    },
    /// List a document's notes, newest first
    List { document: String },
}
