//! relaymap CLI
//!
//! Maps a fleet-management deployment: queries the inventory server (or
//! reloads a snapshot), resolves the relay hierarchy, and renders it with a
//! Graphviz layout engine.

use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::warn;

use relaymap_core::graph::{emit_dot, GroupMode};
use relaymap_core::models::{DEFAULT_GROUP_PROPERTY, DEFAULT_PORT};
use relaymap_core::source::rest::{RestConfig, RestSource};
use relaymap_core::source::{DeploymentSource, LiveSource, SnapshotSource};
use relaymap_core::{snapshot, BuildOptions, DuplicatePolicy, OverrideMap, RunConfig};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Inventory REST server name or IP address
    #[clap(short = 's', long)]
    server: Option<String>,

    /// Inventory REST port number
    #[clap(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// REST user name
    #[clap(short = 'U', long)]
    user: Option<String>,

    /// REST password
    #[clap(short = 'P', long)]
    password: Option<String>,

    /// Load a snapshot from a previous run instead of querying
    #[clap(short = 'j', long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Write query results to a snapshot file for reuse
    #[clap(short = 'w', long, value_name = "FILE")]
    write_snapshot: Option<PathBuf>,

    /// Output file base name
    #[clap(short = 'o', long, default_value = "./deployment-map")]
    output: String,

    /// Graphviz layout engine (dot, neato, ...)
    #[clap(short = 'e', long, default_value = "dot")]
    engine: String,

    /// Output format(s), comma separated
    #[clap(short = 'f', long, default_value = "pdf", value_delimiter = ',')]
    format: Vec<String>,

    /// Inventory property to group and count endpoints on
    #[clap(short = 'g', long, default_value = DEFAULT_GROUP_PROPERTY)]
    group_property: String,

    /// Relay name overrides: from:to[,from:to...]
    #[clap(short = 'm', long)]
    map: Option<String>,

    /// Render relays only
    #[clap(short = 'r', long)]
    relays_only: bool,

    /// Create a node for each endpoint instead of group summaries
    #[clap(short = 'd', long)]
    detail: bool,

    /// Accept self-signed server certificates
    #[clap(long)]
    insecure: bool,

    /// Keep the last-seen record when relay names collide
    #[clap(long)]
    allow_duplicate_relays: bool,
}

impl Args {
    fn group_mode(&self) -> GroupMode {
        if self.relays_only {
            GroupMode::RelaysOnly
        } else if self.detail {
            GroupMode::Detail
        } else {
            GroupMode::Summary
        }
    }
}

/// Render DOT source into one output file via the selected layout engine.
fn render(engine: &str, dot: &str, output: &str, format: &str) -> Result<()> {
    let out_file = format!("{output}.{format}");
    let mut child = Command::new(engine)
        .arg(format!("-T{format}"))
        .arg("-o")
        .arg(&out_file)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("cannot run layout engine {engine:?}"))?;

    child
        .stdin
        .take()
        .context("layout engine has no stdin")?
        .write_all(dot.as_bytes())?;

    let status = child.wait()?;
    if !status.success() {
        bail!("layout engine {engine:?} failed with {status} for {out_file}");
    }
    Ok(())
}

fn build_source(args: &Args) -> Result<Box<dyn DeploymentSource>> {
    if let Some(path) = &args.snapshot {
        return Ok(Box::new(SnapshotSource::new(path.clone())));
    }

    let (Some(server), Some(user), Some(password)) = (&args.server, &args.user, &args.password)
    else {
        bail!("specify either --snapshot or --server, --user, and --password");
    };

    let overrides = match &args.map {
        Some(spec) => OverrideMap::parse(spec)?,
        None => OverrideMap::new(),
    };
    let options = BuildOptions {
        overrides,
        duplicate_policy: if args.allow_duplicate_relays {
            DuplicatePolicy::Overwrite
        } else {
            DuplicatePolicy::Reject
        },
        config: RunConfig {
            server: server.clone(),
            port: args.port,
            group_property: args.group_property.clone(),
        },
    };

    let rest = RestSource::connect(RestConfig {
        server: server.clone(),
        port: args.port,
        user: user.clone(),
        password: password.clone(),
        insecure: args.insecure,
        group_property: args.group_property.clone(),
    })
    .context("cannot connect to the inventory server")?;

    Ok(Box::new(LiveSource::new(rest, options)))
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut source = build_source(&args)?;
    let outcome = source.load()?;
    if !outcome.unresolved.is_empty() {
        // Stragglers are expected in real inventories; warn and carry on.
        warn!(
            count = outcome.unresolved.len(),
            "some endpoints could not be resolved to a relay"
        );
    }

    if let Some(path) = &args.write_snapshot {
        snapshot::write_file(path, &outcome.deployment)
            .with_context(|| format!("cannot write snapshot to {}", path.display()))?;
    }

    let dot = emit_dot(&outcome.deployment, args.group_mode());
    for format in &args.format {
        render(&args.engine, &dot, &args.output, format)?;
    }

    println!("Done.");
    Ok(())
}
