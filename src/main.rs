use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use recipe_scout::commands::CommandHandler;
use recipe_scout::config::AppConfig;
use recipe_scout::favorites::{FavoritesStore, JsonFileStorage};
use recipe_scout::images::UnsplashClient;
use recipe_scout::providers::groq::GroqProvider;
use recipe_scout::recipes::generation::SYSTEM_PROMPT;
use recipe_scout::recipes::RecipeGenerator;
use recipe_scout::search::SearchController;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Groq API key; falls back to the GROQ_API_KEY environment variable.
    #[arg(long)]
    api_key: Option<String>,

    /// Unsplash access key; falls back to the UNSPLASH_KEY environment variable.
    #[arg(long)]
    image_key: Option<String>,

    /// Path of the favorites JSON blob.
    #[arg(long)]
    favorites: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize colored output
    colored::control::set_override(true);

    // Load environment variables
    dotenv().ok();
    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();

    let mut config = AppConfig::from_env();
    if let Some(key) = args.api_key {
        config.groq_api_key = Some(key);
    }
    if let Some(key) = args.image_key {
        config.unsplash_key = Some(key);
    }
    if let Some(path) = args.favorites {
        config.favorites_path = path;
    }

    // Without the model key the favorites screens still work; the first
    // search will surface the error state.
    let provider = config.groq_api_key.clone().map(|key| {
        GroqProvider::new(
            key,
            SYSTEM_PROMPT.to_string(),
            config.model.clone(),
            config.api_url.clone(),
            config.temperature,
        )
    });
    if provider.is_none() {
        println!(
            "{}",
            "GROQ_API_KEY is not set; recipe search is unavailable until it is.".yellow()
        );
    }

    let images = UnsplashClient::new(config.unsplash_key.clone());
    let generator = RecipeGenerator::new(provider, images);
    let controller = SearchController::new(generator);
    let favorites = FavoritesStore::open(JsonFileStorage::new(&config.favorites_path)).await;

    let handler = CommandHandler::new(controller, favorites);

    // Show initial help menu
    handler.handle_command(":help").await.ok();

    // Initialize rustyline editor
    let mut rl = Editor::<(), DefaultHistory>::new()?;

    // Main input loop
    loop {
        match rl.readline("🍳 ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                match handler.handle_command(input).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("{}", e.red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}
