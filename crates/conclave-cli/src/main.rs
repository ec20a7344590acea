//! `conclave`: runs the agent coordination loop from a TOML config.

mod config;

use clap::{Parser, Subcommand};
use conclave_core::AgentFilter;
use conclave_discovery::{AgentRegistry, HybridDiscovery, RemoteRegistryClient};
use conclave_orchestrator::{
    CoordinationLoop, FileActionProvider, LogCommunication, Orchestrator, SystemClock, TaskQueue,
};
use config::{parse_config, ConclaveConfig, TOKEN_ENV};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "conclave", about = "Conclave: agent discovery and task delegation")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "conclave.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the coordination loop until interrupted
    Run,
    /// List agents through hybrid discovery
    Agents {
        /// Only agents advertising this skill
        #[arg(long)]
        skill: Option<String>,
        /// Only agents advertising this capability
        #[arg(long)]
        capability: Option<String>,
        /// Only agents of this type
        #[arg(long = "type")]
        agent_type: Option<String>,
    },
    /// Run one coordination pass and print the task status view
    Status,
}

/// Everything the commands need, wired from the config.
struct Runtime {
    discovery: Arc<HybridDiscovery>,
    coordinator: Arc<CoordinationLoop>,
}

async fn build_runtime(config: ConclaveConfig, publish_seeds: bool) -> anyhow::Result<Runtime> {
    let registry = Arc::new(AgentRegistry::new());
    let discovery = Arc::new(match RemoteRegistryClient::from_config(&config.discovery)? {
        Some(client) => {
            info!(url = %client.base_url(), "Remote directory configured");
            HybridDiscovery::new(registry.clone(), Arc::new(client), config.discovery.timeout())
        }
        None => {
            info!("No remote directory configured, running local-only");
            HybridDiscovery::local_only(registry.clone())
        }
    });

    for card in config.agents {
        if publish_seeds {
            discovery.register_agent(card).await?;
        } else {
            registry.register_agent(card)?;
        }
    }
    info!(count = registry.len(), "Seed agents registered");

    let clock = Arc::new(SystemClock);
    let queue = Arc::new(TaskQueue::new(
        Arc::new(FileActionProvider::new(config.actions_file)),
        config.queue.retry,
        clock.clone(),
    ));
    let orchestrator = Arc::new(
        Orchestrator::new(discovery.clone(), Arc::new(LogCommunication))
            .with_id(config.orchestrator_id),
    );
    let coordinator = Arc::new(CoordinationLoop::new(
        orchestrator,
        queue,
        clock,
        config.queue.timing,
    ));

    Ok(Runtime {
        discovery,
        coordinator,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = parse_config(&cli.config)?;
    config.override_token(std::env::var(TOKEN_ENV).ok());

    match cli.command {
        Commands::Run => {
            let runtime = build_runtime(config, true).await?;
            let handle = runtime.coordinator.clone().spawn();
            tokio::signal::ctrl_c().await?;
            warn!("Interrupted, stopping coordination loop");
            handle.abort();

            let summary = runtime.coordinator.queue().summary().await;
            info!(
                total = summary.total,
                completed = summary.completed,
                failed = summary.failed,
                exhausted = summary.exhausted,
                "Coordination loop stopped"
            );
        }
        Commands::Agents {
            skill,
            capability,
            agent_type,
        } => {
            let runtime = build_runtime(config, false).await?;
            let filter = AgentFilter {
                agent_type,
                capability,
                skill,
                ..AgentFilter::any()
            };
            let discovery = runtime.discovery.discover(&filter).await;
            println!("{}", serde_json::to_string_pretty(&discovery)?);
        }
        Commands::Status => {
            let runtime = build_runtime(config, false).await?;
            let report = runtime.coordinator.tick().await;
            info!(
                harvested = report.harvested.len(),
                requeued = report.requeued.len(),
                dispatched = report.dispatch.dispatched.len(),
                "Coordination pass complete"
            );
            let view = runtime.coordinator.queue().status_view().await;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}
