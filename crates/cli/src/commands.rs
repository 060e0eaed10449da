//! CLI commands

use anyhow::{Context, Result};
use clap::Subcommand;
use cutline_app::{AuthStatus, Session};
use cutline_core::{FileStorage, MemoryNavigator, Route};
use cutline_http::{Credentials, ListQuery, Page, Resource};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config;
use crate::prompt::TerminalPrompt;

#[derive(Subcommand)]
pub enum Commands {
    /// Configuration file operations
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    #[command(flatten)]
    Session(SessionCommands),
}

/// Commands that talk to the backend through a session
#[derive(Subcommand)]
pub enum SessionCommands {
    /// Log in and store the session tokens
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "CUTLINE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the session locally and on the server
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Keep the session open and report expiry until Ctrl-C
    Watch,

    /// List a resource collection
    List {
        resource: Resource,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        page_size: Option<u32>,

        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        ordering: Option<String>,

        /// Extra filter as key=value, may be repeated
        #[arg(short, long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },

    /// Show one item of a resource
    Show { resource: Resource, id: String },

    /// Delete one item of a resource
    Delete { resource: Resource, id: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration file
    Init {
        /// Output file path (defaults to DATA_DIR/config.toml)
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Commands {
    pub async fn execute(self, config_file: Option<PathBuf>, data_dir: PathBuf) -> Result<()> {
        match self {
            Commands::Config { command } => command.execute(&data_dir),
            Commands::Session(command) => {
                let session = open_session(config_file.as_deref(), &data_dir)?;
                command.execute(&session).await
            }
        }
    }
}

impl SessionCommands {
    pub async fn execute(self, session: &Session) -> Result<()> {
        match self {
            SessionCommands::Login { username, password } => login(session, username, password).await,
            SessionCommands::Logout => {
                session.auth().logout().await;
                println!("Logged out");
                Ok(())
            }
            SessionCommands::Whoami => whoami(session).await,
            SessionCommands::Watch => watch(session).await,
            SessionCommands::List {
                resource,
                page,
                page_size,
                search,
                ordering,
                filters,
            } => {
                let mut query = ListQuery::new();
                if let Some(page) = page {
                    query = query.page(page);
                }
                if let Some(size) = page_size {
                    query = query.page_size(size);
                }
                if let Some(search) = search {
                    query = query.search(search);
                }
                if let Some(ordering) = ordering {
                    query = query.ordering(ordering);
                }
                for (key, value) in filters {
                    query = query.filter(key, value);
                }
                list(session, resource, &query).await
            }
            SessionCommands::Show { resource, id } => {
                let item: Value = session.client().fetch(resource, &id).await?;
                println!("{}", serde_json::to_string_pretty(&item)?);
                Ok(())
            }
            SessionCommands::Delete { resource, id } => {
                session.client().remove(resource, &id).await?;
                println!("Deleted {resource} {id}");
                Ok(())
            }
        }
    }
}

impl ConfigCommands {
    pub fn execute(self, data_dir: &Path) -> Result<()> {
        match self {
            ConfigCommands::Init { output, force } => {
                let config_path = output.unwrap_or_else(|| config::default_config_path(data_dir));
                config::generate_default_config(&config_path, force)?;
                println!("Generated configuration at: {}", config_path.display());
                Ok(())
            }
        }
    }
}

fn open_session(config_file: Option<&Path>, data_dir: &Path) -> Result<Session> {
    let config = config::load_config(config_file, data_dir)?;
    let token_file = config.session.token_file(data_dir);
    let storage = FileStorage::open(&token_file)
        .with_context(|| format!("Failed to open token file {}", token_file.display()))?;

    Session::builder(config)
        .storage(Arc::new(storage))
        .navigator(Arc::new(MemoryNavigator::new(Route::Home)))
        .prompt(Arc::new(TerminalPrompt))
        .build()
        .context("Failed to build session")
}

async fn login(session: &Session, username: String, password: String) -> Result<()> {
    let user = session
        .auth()
        .login(&Credentials::new(username, password))
        .await
        .context("Login failed")?;
    println!("Logged in as {}", user.username);
    Ok(())
}

async fn whoami(session: &Session) -> Result<()> {
    let status = session.init().await;
    session.teardown().await;

    match (status, session.auth().current_user()) {
        (AuthStatus::Authenticated, Some(user)) => {
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        _ => println!("Not logged in"),
    }
    Ok(())
}

async fn watch(session: &Session) -> Result<()> {
    let mut state = session.auth().subscribe();
    let status = session.init().await;
    drop(state.borrow_and_update());
    info!(?status, "Watching session, press Ctrl-C to stop");

    if status != AuthStatus::Authenticated {
        println!("Not logged in");
    }

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                match snapshot.user {
                    Some(user) => println!("Authenticated as {}", user.username),
                    None => println!("Session ended"),
                }
            }
        }
    }

    session.teardown().await;
    Ok(())
}

async fn list(session: &Session, resource: Resource, query: &ListQuery) -> Result<()> {
    let page: Page<Value> = session.client().list(resource, query).await?;
    for item in &page.results {
        println!("{}", serde_json::to_string(item)?);
    }
    println!(
        "{} of {} {resource}{}",
        page.results.len(),
        page.count,
        if page.has_next() { " (more available)" } else { "" }
    );
    Ok(())
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("filter must look like key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("filter key is empty in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
