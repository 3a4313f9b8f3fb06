use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use featuremap::config::ToolConfig;
use featuremap::project_io;
use featuremap::session::{EditorSession, HeadlessBridge};
use featuremap::storage::{HttpProjectStore, ProjectStore};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    /// Path to a YAML config file
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,
    /// Storage server base URL (overrides config)
    #[clap(short, long, global = true)]
    server: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a project record file and report what it contains
    Validate { file: PathBuf },
    /// Import a record and export it again, proving a clean round-trip
    Roundtrip {
        file: PathBuf,
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// List project names on the storage server
    List,
    /// Fetch a project record from the storage server
    Load {
        name: String,
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload a project record file to the storage server
    Save { name: String, file: PathBuf },
    /// Delete a project on the storage server
    Delete { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    let config = match &args.config {
        Some(path) => ToolConfig::from_file(path)?,
        None => ToolConfig::default(),
    };
    let server_url = args.server.clone().unwrap_or(config.server_url.clone());

    match args.command {
        Commands::Validate { file } => {
            let record = project_io::read_record(&file)?;
            let mut session = EditorSession::with_magnet_radius(HeadlessBridge, config.magnet_radius);
            let summary = session.import(&record);
            info!(
                "Project '{}': {} nodes, {} connections, {} statuses, {} feature projects",
                record.name,
                summary.nodes_imported,
                summary.connections_imported,
                session.registry().statuses().len(),
                session.registry().projects().len(),
            );
            for warning in &summary.warnings {
                warn!("{}", warning);
            }
            if let Err(errors) = session.store().verify_integrity() {
                for error in errors {
                    warn!("{}", error);
                }
                anyhow::bail!("record failed integrity checks");
            }
            info!("{}", session.store().stats());
        }
        Commands::Roundtrip { file, output } => {
            let record = project_io::read_record(&file)?;
            let mut session = EditorSession::with_magnet_radius(HeadlessBridge, config.magnet_radius);
            let summary = session.import(&record);
            if summary.connections_dropped > 0 {
                warn!(
                    "{} connection(s) dropped during import",
                    summary.connections_dropped
                );
            }
            let exported = session.export(&record.name);
            let target = output.unwrap_or(file);
            project_io::write_record(&target, &exported, true)?;
            info!("Wrote round-tripped record to {}", target.display());
        }
        Commands::List => {
            let store = HttpProjectStore::new(&server_url);
            for name in store.list_projects().await? {
                println!("{}", name);
            }
        }
        Commands::Load { name, output } => {
            let store = HttpProjectStore::new(&server_url);
            let record = store.load_project(&name).await?;
            match output {
                Some(path) => {
                    project_io::write_record(&path, &record, true)?;
                    info!("Saved project '{}' to {}", name, path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&record)?),
            }
        }
        Commands::Save { name, file } => {
            let record = project_io::read_record(&file)?;
            let store = HttpProjectStore::new(&server_url);
            store.save_project(&name, &record).await?;
            info!("Saved project '{}'", name);
        }
        Commands::Delete { name } => {
            let store = HttpProjectStore::new(&server_url);
            store.delete_project(&name).await?;
            info!("Deleted project '{}'", name);
        }
    }

    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level.to_string()))
        .without_time()
        .init();
}
