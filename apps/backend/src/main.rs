use std::path::PathBuf;

use clap::{Parser, Subcommand};

use phrase_trainer_backend::config::Config;
use phrase_trainer_backend::services::generation::{clamp_count, Level};

#[derive(Parser)]
#[command(name = "phrase-trainer-backend")]
#[command(about = "German phrase flashcard backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Import seed phrases that are not stored yet
    Import {
        /// Seed file in the camelCase phrase shape (default: bundled set)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Generate phrases with Gemini and store them
    Generate {
        /// Number of phrases, 1 to 50
        #[arg(long, default_value_t = 10)]
        count: u32,
        #[arg(long, value_enum, default_value_t = Level::Beginner)]
        level: Level,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    phrase_trainer_backend::init_tracing();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => phrase_trainer_backend::serve(config).await?,
        Command::Import { file } => {
            let report = phrase_trainer_backend::run_import(&config, file.as_deref()).await?;
            println!(
                "Imported {} phrases ({} already present)",
                report.imported.len(),
                report.skipped
            );
        }
        Command::Generate { count, level } => {
            let saved =
                phrase_trainer_backend::run_generate(&config, clamp_count(Some(count)), level)
                    .await?;
            println!("Saved {} generated phrases", saved.len());
            for phrase in saved {
                println!("  {} - {}", phrase.german, phrase.russian);
            }
        }
    }

    Ok(())
}
