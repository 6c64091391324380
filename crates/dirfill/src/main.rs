use anyhow::Result;
use clap::{Parser, Subcommand};
use dirfill_dom::{MemoryDom, fixture};
use dirfill_engine::backend::DomBackend;
use dirfill_engine::config::{FileSettingsStore, SettingsLoader};
use dirfill_engine::discovery;
use dirfill_engine::engine::{FillEngine, PassOutcome};
use dirfill_engine::lookup::{DEFAULT_WHOAMI_URL, HttpUsernameLookup};
use dirfill_engine::resolver::{REMOTE_LOOKUP_DEADLINE, UsernameLookup};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dirfill", version, about = "Directory-username autofill engine")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Settings file (defaults to ./dirfill.yaml, then ~/.dirfill/config.yaml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a fill cascade against a YAML page fixture
    Fill {
        /// Page fixture to load
        #[arg(long)]
        page: PathBuf,

        /// Identity service endpoint
        #[arg(long, default_value = DEFAULT_WHOAMI_URL)]
        url: String,

        /// Fixture injected into the page after a delay, to exercise
        /// mutation-reactive filling
        #[arg(long)]
        inject: Option<PathBuf>,

        /// Delay before the injection
        #[arg(long, default_value_t = 1000)]
        inject_after_ms: u64,
    },
    /// Query the identity service and print the reported username
    Whoami {
        #[arg(long, default_value = DEFAULT_WHOAMI_URL)]
        url: String,
    },
    /// Print the effective settings
    Settings,
    /// Clear the cached username
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = match &args.settings {
        Some(path) => SettingsLoader::load_from(path).await?,
        None => SettingsLoader::load_default().await?,
    };

    let default_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let store_path = args
        .settings
        .clone()
        .unwrap_or_else(FileSettingsStore::default_path);
    let store = Arc::new(FileSettingsStore::new(store_path));

    match args.command {
        Command::Fill {
            page,
            url,
            inject,
            inject_after_ms,
        } => {
            let nodes = fixture::load(&page)?;
            let dom = Arc::new(MemoryDom::from_fixture(&nodes));
            let lookup = Arc::new(HttpUsernameLookup::new(url));
            let engine = Arc::new(FillEngine::new(
                dom.clone(),
                lookup,
                store,
                settings.clone(),
            ));

            let watcher = engine.clone().watch_mutations();
            let injecting = inject.is_some();
            if let Some(inject_path) = inject {
                let late_nodes = fixture::load(&inject_path)?;
                let dom = dom.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(inject_after_ms)).await;
                    info!("injecting {} late node(s)", late_nodes.len());
                    for node in &late_nodes {
                        dom.insert(None, node);
                    }
                });
            }

            let outcome = engine.run_cascade().await;
            report(&outcome);

            if injecting {
                // Leave room for the injection and its mutation-triggered pass.
                tokio::time::sleep(Duration::from_millis(
                    inject_after_ms + settings.interval_ms,
                ))
                .await;
                let elements = dom.snapshot().await?;
                for candidate in discovery::discover(&elements, &settings) {
                    if let Ok(el) = dom.element(candidate.id).await {
                        println!(
                            "#{} <{}> via {:?}: {:?}",
                            el.id,
                            el.tag,
                            candidate.method,
                            el.current_content()
                        );
                    }
                }
            }
            watcher.abort();
        }
        Command::Whoami { url } => {
            let lookup = HttpUsernameLookup::new(url);
            match lookup.lookup(REMOTE_LOOKUP_DEADLINE).await {
                Ok(username) => println!("{username}"),
                Err(e) => {
                    eprintln!("lookup failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::Settings => {
            print!("{}", serde_yaml::to_string(&settings)?);
        }
        Command::ClearCache => {
            store.clear_cache().await?;
            println!("cache cleared");
        }
    }

    Ok(())
}

fn report(outcome: &PassOutcome) {
    match outcome {
        PassOutcome::Filled(o) => println!(
            "filled {} field(s), {} already filled, {} candidate(s)",
            o.filled, o.already_filled, o.total
        ),
        PassOutcome::NothingFillable(o) => {
            println!("no writable empty field among {} candidate(s)", o.total)
        }
        PassOutcome::NoCandidates => println!("no candidate field found"),
        PassOutcome::NoUsername => println!("no username available"),
    }
}
