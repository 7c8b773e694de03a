//! CLI argument definitions for the drawconnect binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use drawconnect::store::Deadlines;

/// Document store backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// MongoDB deployment (default, production)
    Mongodb,
    /// In-memory with JSON persistence (for development and ephemeral deployments)
    Inmemory,
}

/// drawconnect user service
#[derive(Parser, Debug)]
#[command(name = "drawconnect")]
#[command(about = "drawconnect: users and pen-stroke signatures over a document store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Check health of a running drawconnect server
    Health(HealthArgs),
}

/// Arguments for the serve command
#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3031, env = "DRAWCONNECT_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "DRAWCONNECT_HOST")]
    pub host: String,

    #[command(flatten)]
    pub backend_config: BackendArgs,
}

impl Default for ServeArgs {
    fn default() -> Self {
        // Parsing an empty argument list applies every default and env override.
        Self::from(ServeOnly::parse_from(["drawconnect"]))
    }
}

/// Helper parser used to build [`ServeArgs`] when no subcommand is given.
#[derive(Parser, Debug)]
struct ServeOnly {
    #[command(flatten)]
    args: ServeArgs,
}

impl From<ServeOnly> for ServeArgs {
    fn from(only: ServeOnly) -> Self {
        only.args
    }
}

/// Document store configuration shared by commands that open a store
#[derive(clap::Args, Debug, Clone)]
pub struct BackendArgs {
    /// Document store to use
    #[arg(short, long, default_value = "mongodb", env = "DRAWCONNECT_BACKEND")]
    pub backend: Backend,

    /// MongoDB host
    #[arg(long, default_value = "localhost", env = "DRAWCONNECT_DB_HOST")]
    pub db_host: String,

    /// MongoDB port
    #[arg(long, default_value_t = 27017, env = "DRAWCONNECT_DB_PORT")]
    pub db_port: u16,

    /// MongoDB database name
    #[arg(long, default_value = "drawConnect", env = "DRAWCONNECT_DB_NAME")]
    pub db_name: String,

    /// MongoDB collection holding users
    #[arg(long, default_value = "user", env = "DRAWCONNECT_COLLECTION")]
    pub collection: String,

    /// Data directory for the in-memory backend's drawconnect.json
    #[arg(short = 'D', long, env = "DRAWCONNECT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enforce unique emails (unique index for MongoDB, insert check in memory)
    #[arg(long, env = "DRAWCONNECT_UNIQUE_EMAIL")]
    pub unique_email: bool,

    /// Deadline for establishing the store handle, in milliseconds
    #[arg(long, default_value_t = 2000, env = "DRAWCONNECT_CONNECT_TIMEOUT_MS")]
    pub connect_timeout_ms: u64,

    /// Deadline for liveness probes, in milliseconds
    #[arg(long, default_value_t = 2000, env = "DRAWCONNECT_PING_TIMEOUT_MS")]
    pub ping_timeout_ms: u64,

    /// Deadline for find calls, in milliseconds
    #[arg(long, default_value_t = 5000, env = "DRAWCONNECT_QUERY_TIMEOUT_MS")]
    pub query_timeout_ms: u64,

    /// Deadline for insert calls, in milliseconds
    #[arg(long, default_value_t = 5000, env = "DRAWCONNECT_INSERT_TIMEOUT_MS")]
    pub insert_timeout_ms: u64,
}

impl BackendArgs {
    pub fn deadlines(&self) -> Deadlines {
        Deadlines {
            connect: Duration::from_millis(self.connect_timeout_ms),
            ping: Duration::from_millis(self.ping_timeout_ms),
            query: Duration::from_millis(self.query_timeout_ms),
            insert: Duration::from_millis(self.insert_timeout_ms),
        }
    }

    /// Location of the in-memory backend's persistence file.
    pub fn data_file(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drawconnect.json")
    }
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Port of the server to check
    #[arg(short, long, default_value_t = 3031, env = "DRAWCONNECT_PORT")]
    pub port: u16,

    /// Host of the server to check
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}
