use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Book catalog and recommendation engine.
#[derive(Parser, Debug, Clone)]
#[command(name = "bookrec")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "BOOKREC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Initialize database and create default config.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },

    /// Import the book catalog from a delimited file.
    Import {
        /// Path to the book file.
        file: PathBuf,
    },

    /// User management commands.
    User {
        /// User subcommand action.
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Print aggregated ratings and suggestion counts for a book.
    Stats {
        /// Book id to aggregate.
        book_id: i64,
    },
}

/// User management subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum UserCommand {
    /// Register a new user.
    Add {
        /// Login handle.
        user_id: String,
        /// First name.
        #[arg(long)]
        name: String,
        /// Surname.
        #[arg(long)]
        surname: String,
        /// Fiscal code (16 characters).
        #[arg(long)]
        tax_code: String,
        /// E-mail address.
        #[arg(long)]
        email: String,
        /// Password.
        #[arg(short, long)]
        password: String,
    },

    /// Delete a user and everything they own.
    Del {
        /// Handle to delete.
        user_id: String,
    },

    /// List all users.
    List,
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Catalog configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Which persistence backend holds the mutable stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Relational layout in one SQLite file.
    Sqlite,
    /// Flat delimited files in one directory.
    Flat,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Selected backend.
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory holding the flat record files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            db_path: default_db_path(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_backend() -> StorageBackend {
    StorageBackend::Sqlite
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/bookrec.db")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/records")
}

/// Catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the delimited book file.
    #[serde(default = "default_books_file")]
    pub books_file: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            books_file: default_books_file(),
        }
    }
}

fn default_books_file() -> PathBuf {
    PathBuf::from("Libri.dati.csv")
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &PathBuf) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::DomainError::Storage(format!("failed to read config file: {e}"))
        })?;

        toml::from_str(&content).map_err(|e| {
            crate::error::DomainError::Storage(format!("failed to parse config file: {e}"))
        })
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("config.toml"),
            PathBuf::from("bookrec.toml"),
            dirs::config_dir()
                .map(|p| p.join("bookrec-rs").join("config.toml"))
                .unwrap_or_default(),
            PathBuf::from("/etc/bookrec-rs/config.toml"),
        ];

        candidates.into_iter().find(|p| p.exists())
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# bookrec-rs configuration

[storage]
# Backend: "sqlite" or "flat"
backend = "sqlite"
db_path = "data/bookrec.db"
# Directory for the flat record files (used when backend = "flat")
data_dir = "data/records"

[catalog]
# Delimited book file the catalog loads from
books_file = "Libri.dati.csv"
"#
        .to_string()
    }
}
