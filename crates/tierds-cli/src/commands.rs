use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use colored::Colorize;
use tierds_server::{BlockServer, ServerConfig};
use tierds_store::Datastore;
use tierds_tiered::{DatastoreConfig, HttpTieredDatastore};
use tierds_types::{cid_to_key, multihash_to_key, sha256_multihash, Cid, Context, DatastoreKey};

use crate::cli::*;

/// Options shared by every command that opens the tiered store.
struct StoreOptions {
    config: PathBuf,
    root: Option<PathBuf>,
    timeout: Option<u64>,
}

impl StoreOptions {
    fn load(&self) -> anyhow::Result<DatastoreConfig> {
        DatastoreConfig::load(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))
    }

    fn open(&self) -> anyhow::Result<HttpTieredDatastore> {
        let config = self.load()?;
        let root = match &self.root {
            Some(root) => root.clone(),
            None => self
                .config
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        Ok(config.create(&root)?)
    }

    /// Request context: cancelled on Ctrl-C, bounded by `--timeout`.
    fn context(&self) -> Context {
        let ctx = match self.timeout {
            Some(secs) => Context::background().with_timeout(Duration::from_secs(secs)),
            None => Context::background(),
        };
        let on_interrupt = ctx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });
        ctx
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let opts = StoreOptions {
        config: cli.config,
        root: cli.root,
        timeout: cli.timeout,
    };
    match cli.command {
        Command::Get(args) => cmd_get(&opts, args).await,
        Command::Has(args) => cmd_has(&opts, args).await,
        Command::Size(args) => cmd_size(&opts, args).await,
        Command::Put(args) => cmd_put(&opts, args).await,
        Command::DiskSpec => cmd_disk_spec(&opts),
        Command::Serve(args) => cmd_serve(args).await,
    }
}

/// Accept either a datastore key or a CID.
fn parse_key(raw: &str) -> anyhow::Result<DatastoreKey> {
    if raw.starts_with('/') {
        return Ok(DatastoreKey::new(raw));
    }
    let cid = Cid::try_from(raw).with_context(|| format!("{raw:?} is neither a key nor a CID"))?;
    Ok(cid_to_key(&cid))
}

fn log_metrics(ds: &HttpTieredDatastore) {
    tracing::info!(metrics = ?ds.metrics().snapshot(), "resolution finished");
}

async fn cmd_get(opts: &StoreOptions, args: GetArgs) -> anyhow::Result<()> {
    let key = parse_key(&args.key)?;
    let ds = opts.open()?;
    let data = ds
        .get(&opts.context(), &key)
        .await
        .with_context(|| format!("get {key}"))?;
    log_metrics(&ds);
    match args.output {
        Some(path) => {
            tokio::fs::write(&path, &data)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!(
                "{} {} bytes written to {}",
                "✓".green().bold(),
                data.len(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

async fn cmd_has(opts: &StoreOptions, args: KeyArgs) -> anyhow::Result<()> {
    let key = parse_key(&args.key)?;
    let ds = opts.open()?;
    let found = ds.has(&opts.context(), &key).await.with_context(|| format!("has {key}"))?;
    log_metrics(&ds);
    if found {
        println!("{} {}", key.to_string().yellow(), "present".green());
    } else {
        println!("{} {}", key.to_string().yellow(), "absent".red());
    }
    Ok(())
}

async fn cmd_size(opts: &StoreOptions, args: KeyArgs) -> anyhow::Result<()> {
    let key = parse_key(&args.key)?;
    let ds = opts.open()?;
    let size = ds
        .get_size(&opts.context(), &key)
        .await
        .with_context(|| format!("size {key}"))?;
    log_metrics(&ds);
    println!("{size}");
    Ok(())
}

async fn cmd_put(opts: &StoreOptions, args: PutArgs) -> anyhow::Result<()> {
    let data = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let key = match &args.key {
        Some(raw) => parse_key(raw)?,
        None => multihash_to_key(&sha256_multihash(&data)),
    };
    let ds = opts.open()?;
    ds.put(&opts.context(), &key, &data)
        .await
        .with_context(|| format!("put {key}"))?;
    println!(
        "{} Stored {} ({} bytes)",
        "✓".green().bold(),
        key.to_string().yellow(),
        data.len()
    );
    Ok(())
}

fn cmd_disk_spec(opts: &StoreOptions) -> anyhow::Result<()> {
    let spec = opts.load()?.disk_spec();
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = ServerConfig {
        bind_addr: args.bind,
        store_path: args.store,
        shard_func: args.shard_func,
        sync: !args.no_sync,
    };
    let server = BlockServer::open(config)?;
    println!(
        "Serving {} on {}",
        server.config().store_path.display().to_string().bold(),
        server.config().bind_addr.to_string().cyan()
    );
    server.serve().await?;
    Ok(())
}
