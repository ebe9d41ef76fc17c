use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use bytes::BytesMut;
use colored::Colorize;
use dockyard_registry::{BlobStore, Manifest, Registry, RegistryConfig};
use dockyard_store::{Content, StorageConfig};
use dockyard_types::{Digest, DigestAlgorithm, DigestHasher, ManifestRef, RepoName};
use futures::stream::{self, StreamExt};
use serde_json::json;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::cli::*;

/// Data directory used when neither `--config` nor `--root` is given.
const DEFAULT_ROOT: &str = ".dockyard";

const CHUNK_SIZE: usize = 64 * 1024;

pub async fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = load_config(cli.config.as_deref(), cli.root.as_deref())?;
    let registry = Registry::from_config(&config);
    let format = cli.format;
    match cli.command {
        Command::Put(args) => cmd_put(&registry, args, format).await,
        Command::Exists(args) => cmd_exists(&registry, args, format).await,
        Command::Cat(args) => cmd_cat(&registry, args).await,
        Command::Resolve(args) => cmd_resolve(&registry, args, format).await,
        Command::Digest(args) => cmd_digest(config.digest_algorithm, args, format).await,
    }
}

fn load_config(path: Option<&Path>, root: Option<&Path>) -> anyhow::Result<RegistryConfig> {
    let mut config = match path {
        Some(path) => RegistryConfig::load(path)?,
        None => RegistryConfig {
            storage: StorageConfig::Filesystem {
                root: PathBuf::from(DEFAULT_ROOT),
            },
            ..RegistryConfig::default()
        },
    };
    if let Some(root) = root {
        config.storage = StorageConfig::Filesystem {
            root: root.to_path_buf(),
        };
    }
    Ok(config)
}

async fn cmd_put(registry: &Registry, args: PutArgs, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let content = open_input(args.file.as_deref()).await?;
    let blob = registry.blobs().put(content).await.context("storing blob")?;
    info!(digest = %blob.digest(), "blob stored");
    match format {
        OutputFormat::Text => println!("{}", blob.digest()),
        OutputFormat::Json => println!("{}", json!({ "digest": blob.digest() })),
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_exists(registry: &Registry, args: ExistsArgs, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let digest = parse_digest(&args.digest)?;
    let exists = registry.blobs().exists(&digest).await?;
    match format {
        OutputFormat::Text => println!("{exists}"),
        OutputFormat::Json => println!("{}", json!({ "digest": digest, "exists": exists })),
    }
    Ok(if exists { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

async fn cmd_cat(registry: &Registry, args: CatArgs) -> anyhow::Result<ExitCode> {
    let digest = parse_digest(&args.digest)?;
    let mut stdout = tokio::io::stdout();
    if !copy_blob(registry, &digest, &mut stdout).await? {
        anyhow::bail!("blob {digest} not found");
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_resolve(registry: &Registry, args: ResolveArgs, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let name = RepoName::new(args.repo.as_str())?;
    let reference = ManifestRef::parse(&args.reference)?;
    match registry.repo(name).manifest(&reference).await? {
        Some(manifest) => {
            println!("{}", render_manifest(&manifest, format)?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("{} {}:{} not found", "✗".red(), args.repo.bold(), args.reference.yellow());
            Ok(ExitCode::from(1))
        }
    }
}

async fn cmd_digest(algorithm: DigestAlgorithm, args: DigestArgs, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let content = open_input(args.file.as_deref()).await?;
    let digest = hash_content(algorithm, content).await.context("reading input")?;
    match format {
        OutputFormat::Text => println!("{digest}"),
        OutputFormat::Json => println!("{}", json!({ "digest": digest })),
    }
    Ok(ExitCode::SUCCESS)
}

fn parse_digest(s: &str) -> anyhow::Result<Digest> {
    Digest::parse(s).with_context(|| format!("invalid digest {s:?}"))
}

/// Open `file` for streaming, or stdin when no file is given.
async fn open_input(file: Option<&Path>) -> anyhow::Result<Content> {
    match file {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            let size = file.metadata().await?.len();
            Ok(Content::from_file(file, size))
        }
        None => Ok(reader_content(tokio::io::stdin())),
    }
}

/// Stream any reader as content in fixed-size chunks.
fn reader_content<R>(reader: R) -> Content
where
    R: AsyncRead + Unpin + Send + 'static,
{
    Content::from_stream(stream::try_unfold(reader, |mut reader| async move {
        let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
        let n = reader.read_buf(&mut buf).await?;
        if n == 0 {
            Ok::<_, io::Error>(None)
        } else {
            Ok(Some((buf.freeze(), reader)))
        }
    }))
}

async fn hash_content(algorithm: DigestAlgorithm, content: Content) -> io::Result<Digest> {
    let mut hasher = DigestHasher::new(algorithm);
    let mut chunks = content.into_stream();
    while let Some(chunk) = chunks.next().await {
        hasher.update(&chunk?);
    }
    Ok(hasher.finalize())
}

/// Copy a stored blob to `out`. Returns `false` when no such blob exists.
async fn copy_blob<W>(registry: &Registry, digest: &Digest, out: &mut W) -> anyhow::Result<bool>
where
    W: AsyncWrite + Unpin,
{
    let Some(blob) = registry.blobs().blob(digest).await? else {
        return Ok(false);
    };
    let mut chunks = blob.content().await?.into_stream();
    while let Some(chunk) = chunks.next().await {
        out.write_all(&chunk?).await?;
    }
    out.flush().await?;
    Ok(true)
}

fn render_manifest(manifest: &Manifest, format: OutputFormat) -> anyhow::Result<String> {
    if format == OutputFormat::Json {
        let doc = json!({
            "digest": manifest.digest(),
            "mediaType": manifest.media_type(),
            "schemaVersion": manifest.schema_version(),
            "config": manifest.config(),
            "layers": manifest.layers(),
            "manifests": manifest.manifests(),
        });
        return Ok(serde_json::to_string_pretty(&doc)?);
    }

    let mut lines = vec![
        format!("Digest:     {}", manifest.digest().to_string().yellow()),
        format!("Media type: {}", manifest.media_type().unwrap_or("(unspecified)")),
    ];
    if manifest.is_index() {
        lines.push(format!("Manifests ({}):", manifest.manifests().len()));
        for d in manifest.manifests() {
            let platform = match &d.platform {
                Some(p) => match &p.variant {
                    Some(v) => format!("{}/{}/{v}", p.os, p.architecture),
                    None => format!("{}/{}", p.os, p.architecture),
                },
                None => "-".to_string(),
            };
            lines.push(format!("  {}  {}", d.digest.to_string().cyan(), platform));
        }
    } else {
        if let Some(config) = manifest.config() {
            lines.push(format!("Config:     {}", config.digest.to_string().cyan()));
        }
        lines.push(format!("Layers ({}):", manifest.layers().len()));
        for d in manifest.layers() {
            lines.push(format!("  {}  {:>10}  {}", d.digest.to_string().cyan(), d.size, d.media_type.dimmed()));
        }
    }
    Ok(lines.join("\n"))
}
