//! bookrec admin entry point.

use bookrec_rs::{
    aggregate::AggregationEngine,
    catalog,
    config::{Cli, Command, Config, StorageBackend, UserCommand},
    store::{Store, User, flat::FlatStore, sqlite::SqliteStore},
    users::UserDirectory,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    match cli.command {
        Some(Command::Init { force }) => cmd_init(force),
        Some(Command::Import { file }) => cmd_import(&file, &config),
        Some(Command::User { action }) => cmd_user(action, &config),
        Some(Command::Stats { book_id }) => cmd_stats(book_id, &config),
        None => cmd_status(&config),
    }
}

/// Open the configured storage backend.
fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    Ok(match config.storage.backend {
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(&config.storage.db_path)?),
        StorageBackend::Flat => Arc::new(FlatStore::open(&config.storage.data_dir)?),
    })
}

/// Initialize config and database.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());

    let config = Config::default();
    let _db = SqliteStore::open(&config.storage.db_path)?;
    println!("Initialized database: {}", config.storage.db_path.display());

    println!("\nEdit config.toml to configure storage.");
    println!("Then run: bookrec import Libri.dati.csv");
    Ok(())
}

/// Import the book catalog into the relational layout.
fn cmd_import(file: &PathBuf, config: &Config) -> anyhow::Result<()> {
    let books = catalog::reader::read_books(file)?;
    let db = SqliteStore::open(&config.storage.db_path)?;
    let inserted = db.insert_books(&books)?;
    println!(
        "Imported {} books into {}",
        inserted,
        config.storage.db_path.display()
    );
    Ok(())
}

/// User management commands.
fn cmd_user(action: UserCommand, config: &Config) -> anyhow::Result<()> {
    let directory = UserDirectory::new(open_store(config)?);

    match action {
        UserCommand::Add {
            user_id,
            name,
            surname,
            tax_code,
            email,
            password,
        } => {
            let user = directory.register(User {
                user_id,
                name,
                surname,
                tax_code,
                email,
                password,
            })?;
            println!("Registered user: {}", user.user_id);
        }

        UserCommand::Del { user_id } => {
            if directory.remove(&user_id)? {
                println!("Deleted user: {user_id}");
            } else {
                println!("No such user: {user_id}");
            }
        }

        UserCommand::List => {
            let users = directory.list()?;
            if users.is_empty() {
                println!("No registered users.");
            }
            for user in users {
                println!("{}  {} {}  <{}>", user.user_id, user.name, user.surname, user.email);
            }
        }
    }

    Ok(())
}

/// Print aggregated ratings and suggestion counts for one book.
fn cmd_stats(book_id: i64, config: &Config) -> anyhow::Result<()> {
    let engine = AggregationEngine::new(open_store(config)?);

    match engine.aggregate_ratings(book_id)? {
        None => println!("No ratings for book {book_id}."),
        Some(summary) => {
            println!("Ratings for book {book_id} ({} total):", summary.count);
            for c in bookrec_rs::Criterion::ALL {
                println!(
                    "  {:<13} {:.2}  note: {}",
                    c.label(),
                    summary.mean(c),
                    summary.note_sample(c)
                );
            }
            println!("  {:<13} {:.2}  note: {}", "overall", summary.overall_mean, summary.overall_note_sample);
        }
    }

    let freq = engine.recommendation_frequency(book_id)?;
    if freq.is_empty() {
        println!("No suggestions recorded for book {book_id}.");
    } else {
        let mut entries: Vec<_> = freq.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        println!("Suggested alongside book {book_id}:");
        for (target, count) in entries {
            println!("  book {target}  suggested {count} time(s)");
        }
    }

    Ok(())
}

/// With no subcommand, report what the configured stores contain.
fn cmd_status(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let users = store.list_users()?;

    let catalog = if config.catalog.books_file.exists() {
        bookrec_rs::Catalog::load(&config.catalog.books_file)?
    } else if config.storage.backend == StorageBackend::Sqlite {
        let db = SqliteStore::open(&config.storage.db_path)?;
        bookrec_rs::Catalog::new(db.load_books()?)
    } else {
        bookrec_rs::Catalog::new(Vec::new())
    };

    println!("Catalog: {} books", catalog.len());
    println!("Users:   {} registered", users.len());
    println!("Run 'bookrec --help' for commands.");
    Ok(())
}
