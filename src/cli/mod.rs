pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgStore, Store};

#[derive(Parser)]
#[command(name = "clientflow-admin")]
#[command(about = "ClientFlow admin CLI - migrations, seed content and plan catalogue")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Load roadmap items from a YAML seed file")]
    SeedRoadmap(commands::seed_roadmap::SeedRoadmapArgs),

    #[command(about = "Plan catalogue management")]
    Plans {
        #[command(subcommand)]
        cmd: commands::plans::PlanCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = AppConfig::from_env();
    let manager = DatabaseManager::connect(&config.database).await?;

    let result = match cli.command {
        Commands::Migrate => commands::migrate::handle(&manager, output_format).await,
        Commands::SeedRoadmap(args) => {
            let store = Store::from_backend(PgStore::from_manager(&manager));
            commands::seed_roadmap::handle(&store, args, output_format).await
        }
        Commands::Plans { cmd } => {
            let store = Store::from_backend(PgStore::from_manager(&manager));
            commands::plans::handle(&store, cmd, output_format).await
        }
    };

    manager.close().await;
    result
}
