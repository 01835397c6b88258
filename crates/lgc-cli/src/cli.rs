use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lgc",
    about = "Layer Group Commit: publish layer groups with their openings and perforators",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Repository directory holding objects and refs
    #[arg(long, global = true, default_value = ".lgc")]
    pub repo: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a repository with one stream
    Init(InitArgs),
    /// List or create branches of a stream
    Branch(BranchArgs),
    /// Publish a layer group element from a host document
    Publish(PublishArgs),
    /// Show the parsed metadata of a host element
    Metadata(MetadataArgs),
    /// Show commit history of a branch
    Log(LogArgs),
    /// Fetch the layer group at a branch head
    Receive(ReceiveArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub stream: String,
}

#[derive(Args)]
pub struct BranchArgs {
    #[arg(short, long)]
    pub stream: String,
    /// Branch to create; lists branches when omitted
    pub name: Option<String>,
}

#[derive(Args)]
pub struct PublishArgs {
    /// Host document exported as JSON
    pub document: PathBuf,
    /// Unique id or element id of the layer group element
    pub element: String,
    /// TOML publish configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(short, long)]
    pub stream: Option<String>,
    #[arg(short, long)]
    pub branch: Option<String>,
    #[arg(short, long)]
    pub message: Option<String>,
    #[arg(long)]
    pub source_tag: Option<String>,
    /// Fail unless the branch head is this commit
    #[arg(long)]
    pub expected_head: Option<String>,
    #[arg(long)]
    pub max_concurrency: Option<usize>,
}

#[derive(Args)]
pub struct MetadataArgs {
    pub document: PathBuf,
    pub element: String,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short, long)]
    pub stream: String,
    #[arg(short, long, default_value = "main")]
    pub branch: String,
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ReceiveArgs {
    #[arg(short, long)]
    pub stream: String,
    #[arg(short, long, default_value = "main")]
    pub branch: String,
}
