use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use lgc_metadata::{parse, LayerGroupMetadata, MetadataStore, LAYER_GROUP_SCHEMA};
use lgc_refs::{Commit, CommitService, FileCommitService};
use lgc_sdk::{
    CancellationToken, CommitPublisher, Element, JsonDocument, Pipeline, PublishConfig, Receiver,
};
use lgc_store::{FileObjectStore, ObjectStoreTransport};
use lgc_types::{CommitId, EntityId, StreamId};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::cli::*;

const OBJECTS_DIR: &str = "objects";
const REFS_FILE: &str = "refs.json";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Init(args) => cmd_init(&cli.repo, args, format).await,
        Command::Branch(args) => cmd_branch(&Repo::open(&cli.repo)?, args, format).await,
        Command::Publish(args) => cmd_publish(&Repo::open(&cli.repo)?, args, format).await,
        Command::Metadata(args) => cmd_metadata(args, format),
        Command::Log(args) => cmd_log(&Repo::open(&cli.repo)?, args, format).await,
        Command::Receive(args) => cmd_receive(&Repo::open(&cli.repo)?, args, format).await,
    }
}

/// Local stand-in for the remote store: loose objects plus a refs document.
struct Repo {
    objects: Arc<FileObjectStore>,
    commits: Arc<FileCommitService>,
}

impl Repo {
    fn open(root: &Path) -> anyhow::Result<Self> {
        let refs = root.join(REFS_FILE);
        if !refs.exists() {
            bail!(
                "{} is not an lgc repository (run `lgc init <stream>` first)",
                root.display()
            );
        }
        Self::open_unchecked(root)
    }

    fn open_unchecked(root: &Path) -> anyhow::Result<Self> {
        let objects = FileObjectStore::open(root.join(OBJECTS_DIR))
            .with_context(|| format!("opening object store in {}", root.display()))?;
        let commits = FileCommitService::open(root.join(REFS_FILE))?;
        debug!(repo = %root.display(), "opened repository");
        Ok(Self {
            objects: Arc::new(objects),
            commits: Arc::new(commits),
        })
    }

    fn publisher(&self) -> CommitPublisher {
        CommitPublisher::new(
            Arc::new(ObjectStoreTransport::new(Arc::clone(&self.objects))),
            self.commits.clone(),
        )
    }

    fn receiver(&self) -> Receiver {
        Receiver::new(
            Arc::new(ObjectStoreTransport::new(Arc::clone(&self.objects))),
            self.commits.clone(),
        )
    }
}

async fn cmd_init(root: &Path, args: InitArgs, format: OutputFormat) -> anyhow::Result<()> {
    let stream = StreamId::new(args.stream)?;
    std::fs::create_dir_all(root).with_context(|| format!("creating {}", root.display()))?;
    let repo = Repo::open_unchecked(root)?;
    repo.commits.create_stream(&stream).await?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "repo": root.display().to_string(),
            "stream": stream,
            "branch": lgc_refs::DEFAULT_BRANCH,
        }))?,
        OutputFormat::Text => {
            println!(
                "{} Initialized lgc repository in {}",
                "✓".green().bold(),
                root.display().to_string().bold()
            );
            println!("  Stream: {}", stream.to_string().cyan());
            println!("  Branch: {}", lgc_refs::DEFAULT_BRANCH.yellow());
        }
    }
    Ok(())
}

async fn cmd_branch(repo: &Repo, args: BranchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let stream = StreamId::new(args.stream)?;
    if let Some(name) = &args.name {
        repo.commits.create_branch(&stream, name).await?;
        match format {
            OutputFormat::Json => print_json(&json!({ "created": name }))?,
            OutputFormat::Text => println!("Created branch {}", name.yellow()),
        }
        return Ok(());
    }

    let branches = repo.commits.list_branches(&stream).await?;
    match format {
        OutputFormat::Json => print_json(&branches)?,
        OutputFormat::Text => {
            for branch in &branches {
                let head = branch
                    .head
                    .map(|id| id.short_id())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "  {:<24} {}  ({} commits)",
                    branch.name.green(),
                    head.dimmed(),
                    branch.commit_count
                );
            }
        }
    }
    Ok(())
}

async fn cmd_publish(repo: &Repo, args: PublishArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = publish_config(&args)?;
    let document = JsonDocument::load(&args.document)?;
    let root = find_element(&document, &args.element)?.clone();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let pipeline = Pipeline::new(repo.publisher(), &config);
    let published = pipeline
        .run(&document, &root, &cancel)
        .await
        .map_err(|e| anyhow!("{} failed: {e}", e.stage()))?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "commit": published.commit,
            "upload": {
                "root": published.upload.root,
                "written": published.upload.written,
                "skipped": published.upload.skipped,
            },
        }))?,
        OutputFormat::Text => {
            println!("{} Published layer group", "✓".green().bold());
            print_commit(&published.commit);
            println!(
                "  Objects: {} written, {} already stored",
                published.upload.written.to_string().bold(),
                published.upload.skipped
            );
        }
    }
    Ok(())
}

/// Config file first, then flag overrides.
fn publish_config(args: &PublishArgs) -> anyhow::Result<PublishConfig> {
    let mut config = match (&args.config, &args.stream) {
        (Some(path), _) => PublishConfig::load(path)?,
        (None, Some(stream)) => PublishConfig::new(StreamId::new(stream.as_str())?),
        (None, None) => bail!("either --config or --stream is required"),
    };
    if let Some(stream) = &args.stream {
        config.stream_id = StreamId::new(stream.as_str())?;
    }
    if let Some(branch) = &args.branch {
        config.branch_name = branch.clone();
    }
    if let Some(message) = &args.message {
        config.message = message.clone();
    }
    if let Some(tag) = &args.source_tag {
        config.source_tag = tag.clone();
    }
    if let Some(limit) = args.max_concurrency {
        config.max_concurrency = limit;
    }
    if let Some(head) = &args.expected_head {
        config.expected_head = Some(head.parse::<CommitId>()?);
    }
    config.validate()?;
    Ok(config)
}

fn cmd_metadata(args: MetadataArgs, format: OutputFormat) -> anyhow::Result<()> {
    let document = JsonDocument::load(&args.document)?;
    let element = find_element(&document, &args.element)?;
    let raw = document
        .read_metadata(element, &LAYER_GROUP_SCHEMA)?
        .ok_or_else(|| anyhow!("element {} carries no layer group metadata", args.element))?;
    let metadata = parse(&raw)?;

    match format {
        OutputFormat::Json => print_json(&metadata)?,
        OutputFormat::Text => print_metadata(&metadata),
    }
    Ok(())
}

async fn cmd_log(repo: &Repo, args: LogArgs, format: OutputFormat) -> anyhow::Result<()> {
    let stream = StreamId::new(args.stream)?;
    let commits = repo.commits.log(&stream, &args.branch, args.limit).await?;

    match format {
        OutputFormat::Json => print_json(&commits)?,
        OutputFormat::Text if commits.is_empty() => {
            println!("No commits on {}.", args.branch.yellow());
        }
        OutputFormat::Text => {
            for commit in &commits {
                if args.oneline {
                    println!(
                        "{} {} {}",
                        commit.id.short_id().yellow(),
                        commit.object_id.short_hex().dimmed(),
                        commit.message
                    );
                } else {
                    print_commit(commit);
                    println!();
                }
            }
        }
    }
    Ok(())
}

async fn cmd_receive(repo: &Repo, args: ReceiveArgs, format: OutputFormat) -> anyhow::Result<()> {
    let stream = StreamId::new(args.stream)?;
    let Some(received) = repo.receiver().receive(&stream, &args.branch).await? else {
        println!("No commits on {}.", args.branch.yellow());
        return Ok(());
    };
    let metadata = received.metadata()?;
    let openings = received.root.children("@openings").len();
    let perforators = received.root.children("@perforators").len();

    match format {
        OutputFormat::Json => print_json(&json!({
            "commit": received.commit,
            "kind": received.root.kind(),
            "openings": openings,
            "perforators": perforators,
            "metadata": metadata,
        }))?,
        OutputFormat::Text => {
            print_commit(&received.commit);
            println!(
                "  Root: {} with {} openings, {} perforators",
                received.root.kind().bold(),
                openings,
                perforators
            );
            print_metadata(&metadata);
        }
    }
    Ok(())
}

fn find_element<'a>(document: &'a JsonDocument, raw: &str) -> anyhow::Result<&'a Element> {
    let id = EntityId::parse(raw)?;
    document
        .get(&id)
        .ok_or_else(|| anyhow!("no element {id} in document"))
}

fn print_commit(commit: &Commit) {
    println!(
        "{}  {}  ({})",
        commit.id.short_id().yellow().bold(),
        commit.object_id.short_hex().dimmed(),
        commit.branch.green()
    );
    println!("  Date: {}", commit.created_at.to_rfc3339());
    println!("  Source: {}", commit.source_application);
    println!("  Message: {}", commit.message);
}

fn print_metadata(metadata: &LayerGroupMetadata) {
    if let Some(guid) = metadata.self_guid() {
        println!("  Element: {}", guid.cyan());
    }
    let data = metadata.perforator_data();
    println!("  Openings ({}):", data.openings.len());
    for id in &data.openings {
        println!("    {id}");
    }
    println!("  Perforators ({}):", data.perforators.len());
    for id in &data.perforators {
        println!("    {id}");
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
