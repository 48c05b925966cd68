use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "polygon-dml-indexer")]
#[command(about = "Syncs marketplace transactions from a subgraph and serves them over HTTP")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run one sync pass in the background and serve GET /data
    Serve,
    /// Run one sync pass and exit
    Sync,
    /// Print one page of stored transactions as JSON
    Query {
        #[arg(short, long, default_value_t = 1)]
        page: i64,
    },
}
