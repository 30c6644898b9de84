//! Demo service with failpoints wired in.
//!
//! A toy ledger appends entries from a few workers. Each append passes three
//! failpoints (`ledger::commit`, `ledger::fsync`, `ledger::replicate`) that
//! can be flipped over HTTP while it runs.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin tripwire-demo -- --listen 127.0.0.1:1234 \
//!     --failpoints 'ledger::fsync=25%sleep(200ms)'
//!
//! curl -X PUT -d '3*return("disk full")' 127.0.0.1:1234/ledger::commit
//! curl 127.0.0.1:1234/
//! ```
//!
//! Without flags the start-up terms and the listen address come from
//! `TRIPWIRE_FAILPOINTS` and `TRIPWIRE_HTTP`.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tripwire::{fail_point_async, Bootstrap, Failpoint, Registry, Value};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "tripwire-demo")]
#[command(about = "Toy ledger service with runtime failpoints", long_about = None)]
struct Args {
    /// Control plane listen address (falls back to $TRIPWIRE_HTTP)
    #[arg(short, long)]
    listen: Option<String>,

    /// Start-up failpoints as name=term;... (falls back to $TRIPWIRE_FAILPOINTS)
    #[arg(short, long)]
    failpoints: Option<String>,

    /// Number of appending workers
    #[arg(short, long, default_value = "2")]
    workers: usize,

    /// Seed for probability draws
    #[arg(long)]
    seed: Option<u64>,

    /// Pause between appends, in milliseconds
    #[arg(long, default_value = "500")]
    interval_ms: u64,
}

struct Ledger {
    commit: Arc<Failpoint>,
    fsync: Arc<Failpoint>,
    replicate: Arc<Failpoint>,
}

impl Ledger {
    fn register(registry: &Registry) -> Self {
        Self {
            commit: registry.register("ledger::commit"),
            fsync: registry.register("ledger::fsync"),
            replicate: registry.register("ledger::replicate"),
        }
    }

    async fn append(&self, worker: usize) -> Result<(), String> {
        fail_point_async!(self.commit, |v: Value| Err(format!("commit rejected: {v}")));
        fail_point_async!(self.fsync);
        fail_point_async!(self.replicate, if worker % 2 == 0, |v: Value| {
            Err(format!("replica {v} unreachable"))
        });
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tripwire=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let bootstrap = match args.failpoints.as_deref() {
        Some(config) => Bootstrap::parse(config),
        None => Bootstrap::from_env(),
    };
    let bootstrap = match bootstrap {
        Ok(bootstrap) => bootstrap,
        Err(e) => {
            tracing::error!(error = %e, "refusing to start");
            std::process::exit(1);
        }
    };

    let mut builder = Registry::builder().bootstrap(bootstrap);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let registry = builder.build();
    let ledger = Arc::new(Ledger::register(&registry));

    let server = match args.listen.or_else(Bootstrap::http_addr_from_env) {
        Some(addr) => {
            let listener = tripwire_http::bind(&addr).await?;
            Some(tripwire_http::spawn(listener, registry.clone())?)
        }
        None => {
            tracing::warn!("no control plane address; only start-up failpoints apply");
            None
        }
    };

    let interval = Duration::from_millis(args.interval_ms);
    for worker in 0..args.workers {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move {
            let mut appended = 0u64;
            loop {
                match ledger.append(worker).await {
                    Ok(()) => {
                        appended += 1;
                        tracing::debug!(worker, appended, "append ok");
                    }
                    Err(e) => tracing::warn!(worker, error = %e, "append failed"),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }

    tracing::info!(workers = args.workers, "ledger running, ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    if let Some(server) = server {
        server.shutdown().await?;
    }
    Ok(())
}
