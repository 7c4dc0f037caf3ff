use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todos::cli::{Cli, Commands};
use todos::web::{self, AppState};
use todos::{Config, Database, InMemoryStore, Profile, TodoStore, utils};

#[tokio::main]
async fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todos=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // --dev selects the separate dev config/database, otherwise prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from_path(&utils::expand_path(path))?,
        None => Config::load_with_profile(profile)?,
    };

    let command = cli.command.unwrap_or(Commands::Serve {
        bind: None,
        in_memory: false,
    });

    match command {
        Commands::Serve { bind, in_memory } => {
            let store: Arc<dyn TodoStore> = if in_memory {
                info!("using in-memory store");
                Arc::new(InMemoryStore::new())
            } else {
                Arc::new(open_database(&config)?)
            };
            let addr = bind.unwrap_or_else(|| config.bind_address.clone());
            let state = AppState::new(store)?;
            web::serve(state, &addr).await?;
        }
        Commands::AddTodo {
            title,
            description,
            due,
        } => {
            let db = open_database(&config)?;
            let message = todos::cli::handle_add_todo(title, description, due, &db)?;
            println!("{}", message);
        }
    }

    Ok(())
}

fn open_database(config: &Config) -> Result<Database> {
    let db_path = config.get_database_path();
    let path = db_path
        .to_str()
        .ok_or_else(|| eyre!("Database path contains invalid UTF-8"))?;
    info!(path, "opening database");
    Ok(Database::new(path)?)
}
