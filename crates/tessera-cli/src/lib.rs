//! Command-line front end for tessera services.
//!
//! Every invocation loads a JSON data file into a
//! [`MemoryDatabase`](tessera::MemoryDatabase), runs one service operation
//! against a table, prints the result as JSON, and writes the data file back
//! when the operation changed it.
//!
//! ```text
//! tessera --table todos create '{"title": "write docs", "done": false}'
//! tessera --table todos find '{"done": false, "$sort": {"title": 1}}'
//! tessera --table todos patch --query '{"done": false}' '{"done": true}'
//! tessera --table todos remove --id 1
//! ```

pub mod store;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tessera::{MemoryDatabase, Params, RemoveTarget, Service, ServiceSettings};
use tracing::debug;

use crate::store::DataFile;

/// Query and edit JSON tables from the command line.
#[derive(Debug, Parser)]
#[command(name = "tessera", version, about)]
pub struct Cli {
    /// JSON data file holding the tables
    #[arg(id = "data_file", short = 'd', long = "data", value_name = "DATA", default_value = "tessera.json", global = true)]
    pub data: PathBuf,

    /// YAML service settings (name, id, paginate)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Table to operate on, overriding the settings file
    #[arg(short, long, global = true)]
    pub table: Option<String>,

    /// Database name
    #[arg(long, default_value = "local", global = true)]
    pub db: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Find records matching a query
    Find {
        /// Filter query
        #[arg(value_parser = parse_json)]
        query: Option<Value>,
    },

    /// Fetch one record by id, or the first record matching a query
    Get(Target),

    /// Create a record, or each record of an array
    Create {
        #[arg(value_parser = parse_json)]
        data: Value,
    },

    /// Merge fields into records selected by id or query
    Patch {
        #[command(flatten)]
        target: Target,

        #[arg(value_parser = parse_json)]
        data: Value,
    },

    /// Replace the record with the given id
    Update {
        #[arg(long, value_parser = parse_id)]
        id: Value,

        #[arg(value_parser = parse_json)]
        data: Value,
    },

    /// Remove records by id or query
    Remove {
        #[command(flatten)]
        target: Target,

        /// Remove every record
        #[arg(long, conflicts_with_all = ["id", "query"])]
        all: bool,
    },
}

impl Command {
    /// Returns `true` for commands that may change the data file.
    pub fn is_write(&self) -> bool {
        !matches!(self, Command::Find { .. } | Command::Get(_))
    }
}

/// Record selection by id or query.
#[derive(Debug, Clone, Args)]
pub struct Target {
    /// Record id; JSON when it parses as JSON, a string otherwise
    #[arg(long, value_parser = parse_id)]
    pub id: Option<Value>,

    /// Filter query
    #[arg(long, value_parser = parse_json)]
    pub query: Option<Value>,
}

impl Target {
    fn params(&self) -> Result<Params> {
        match &self.query {
            Some(query) => Ok(Params::from_query(query.clone())?),
            None => Ok(Params::new()),
        }
    }
}

fn parse_json(arg: &str) -> std::result::Result<Value, serde_json::Error> {
    serde_json::from_str(arg)
}

fn parse_id(arg: &str) -> std::result::Result<Value, std::convert::Infallible> {
    Ok(serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string())))
}

/// Reads service settings from a YAML file.
pub fn load_settings(path: &Path) -> Result<ServiceSettings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("invalid settings {}", path.display()))
}

/// Runs one command and returns its JSON result.
pub async fn run(cli: Cli) -> Result<Value> {
    let mut settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => ServiceSettings::default(),
    };
    if let Some(table) = cli.table {
        settings.name = Some(table);
    }

    let mut db = MemoryDatabase::new(cli.db);
    if let Some(id) = &settings.id {
        db = db.with_primary_key(id.clone());
    }
    let file = DataFile::open(&cli.data, db)?;
    let service = Service::new(settings.with_model(file.database().clone()))?;
    debug!(table = service.name(), command = ?cli.command, "running command");

    let write = cli.command.is_write();
    let output = execute(&service, cli.command).await?;
    if write {
        file.save()?;
    }
    Ok(output)
}

async fn execute(service: &Service<MemoryDatabase>, command: Command) -> Result<Value> {
    let output = match command {
        Command::Find { query } => {
            let params = match query {
                Some(query) => Params::from_query(query)?,
                None => Params::new(),
            };
            serde_json::to_value(service.find(params).await?)?
        }
        Command::Get(target) => service.get(target.id.as_ref(), target.params()?).await?,
        Command::Create { data } => service.create(data, Params::new()).await?,
        Command::Patch { target, data } => service
            .patch(target.id.as_ref(), data, target.params()?)
            .await?
            .into(),
        Command::Update { id, data } => service.update(&id, data, Params::new()).await?,
        Command::Remove { target, all } => {
            let removal = match (&target.id, &target.query, all) {
                (Some(id), _, _) => RemoveTarget::Id(id.clone()),
                (None, Some(_), _) => RemoveTarget::Matching(target.params()?),
                (None, None, true) => RemoveTarget::Matching(Params::new()),
                (None, None, false) => RemoveTarget::Unspecified,
            };
            service.remove_target(removal).await?.into()
        }
    };
    Ok(output)
}
