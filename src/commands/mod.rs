use std::time::Duration;

use colored::Colorize;
use indicatif::ProgressBar;

use crate::favorites::FavoritesStore;
use crate::recipes::{Recipe, RecipeSource};
use crate::search::{SearchController, SearchPhase, SearchSnapshot};

/// Popular searches shown while nothing has been searched yet.
pub const QUICK_SUGGESTIONS: [&str; 6] =
    ["Pasta", "Chicken", "Soup", "Dessert", "Vegetarian", "Quick 30 min"];

/// The interactive surface: free text fires a search, `:` commands manage
/// favorites and the detail view.
pub struct CommandHandler<S: RecipeSource + 'static> {
    controller: SearchController<S>,
    favorites: FavoritesStore,
}

impl<S: RecipeSource + 'static> CommandHandler<S> {
    pub fn new(controller: SearchController<S>, favorites: FavoritesStore) -> Self {
        Self { controller, favorites }
    }

    /// Dispatches one line of input. Returns `Ok(false)` when the user asked
    /// to quit.
    pub async fn handle_command(&self, input: &str) -> Result<bool, String> {
        let input = input.trim();

        match input.split_whitespace().next() {
            Some(":help") => {
                self.print_help();
                Ok(true)
            }
            Some(":quit") | Some(":exit") => Ok(false),
            Some(":favs") => {
                self.render_favorites().await;
                Ok(true)
            }
            Some(":fav") => {
                let n = parse_index(input, ":fav")?;
                let recipe = self.resolve_display_recipe(n).await?;
                let saved = self.favorites.toggle(&recipe).await.map_err(|e| e.to_string())?;
                if saved {
                    println!("{} {}", "♥ Saved".green(), recipe.title);
                } else {
                    println!("{} {}", "♡ Removed".yellow(), recipe.title);
                }
                Ok(true)
            }
            Some(":unfav") => {
                let id = input.trim_start_matches(":unfav").trim();
                if id.is_empty() {
                    return Err("Usage: :unfav <recipe-id>".to_string());
                }
                self.favorites.remove(id).await.map_err(|e| e.to_string())?;
                println!("{} {}", "♡ Removed".yellow(), id);
                Ok(true)
            }
            Some(":show") => {
                let n = parse_index(input, ":show")?;
                let recipe = self.resolve_display_recipe(n).await?;
                // Navigation handoff: the detail view receives the recipe
                // fully serialized, exactly as a route payload would.
                let payload = serde_json::to_string(&recipe).map_err(|e| e.to_string())?;
                self.render_recipe_detail(&payload).await;
                Ok(true)
            }
            Some(":again") => {
                let query = self.controller.snapshot().await.query;
                if query.is_empty() {
                    return Err("Nothing searched yet.".to_string());
                }
                self.search(&query).await;
                Ok(true)
            }
            Some(":retry") => {
                self.spin_while(self.controller.retry()).await;
                self.render_state().await;
                Ok(true)
            }
            Some(":clear") => {
                self.controller.clear().await;
                self.render_state().await;
                Ok(true)
            }
            Some(text) if text.starts_with(':') => {
                Err(format!("Unknown command {:?}. Type :help for the list.", text))
            }
            Some(_) => {
                self.search(input).await;
                Ok(true)
            }
            None => Ok(true),
        }
    }

    async fn search(&self, text: &str) {
        self.spin_while(self.controller.submit_query(text)).await;
        self.render_state().await;
    }

    async fn spin_while<F: std::future::Future<Output = ()>>(&self, fut: F) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_message("Cooking up suggestions...");
        spinner.enable_steady_tick(Duration::from_millis(80));
        fut.await;
        spinner.finish_and_clear();
    }

    /// The n-th (1-based) displayed result. A saved copy with the same title
    /// shadows the freshly fetched one, so local edits win over the model's
    /// latest rendition.
    pub async fn resolve_display_recipe(&self, n: usize) -> Result<Recipe, String> {
        let snapshot = self.controller.snapshot().await;
        let recipe = snapshot
            .results
            .get(n.checked_sub(1).ok_or("Recipe numbers start at 1.")?)
            .ok_or_else(|| format!("No recipe #{} in the current results.", n))?;

        Ok(self
            .favorites
            .find_by_title(&recipe.title)
            .await
            .unwrap_or_else(|| recipe.clone()))
    }

    async fn render_state(&self) {
        let snapshot = self.controller.snapshot().await;
        match snapshot.phase {
            SearchPhase::Idle => self.render_suggestions(),
            SearchPhase::Loading => println!("{}", "Loading...".dimmed()),
            SearchPhase::Success => self.render_results(&snapshot).await,
            SearchPhase::Empty => {
                println!("{}", format!("No recipes found for {:?}.", snapshot.query).yellow());
                println!("Try searching for something else.");
            }
            SearchPhase::Error => {
                if let Some(message) = &snapshot.error {
                    println!("{}", message.red());
                }
                println!("Type {} to try again.", ":retry".bold());
            }
        }
    }

    fn render_suggestions(&self) {
        println!("{}", "Discover delicious recipes!".bold());
        println!("Start by typing what you feel like eating.");
        println!();
        println!("{}", "Popular searches".bold());
        for suggestion in QUICK_SUGGESTIONS {
            println!("  - {}", suggestion);
        }
    }

    async fn render_results(&self, snapshot: &SearchSnapshot) {
        println!("{}", "Suggested recipes".bold());
        for (i, fetched) in snapshot.results.iter().enumerate() {
            let recipe = self
                .favorites
                .find_by_title(&fetched.title)
                .await
                .unwrap_or_else(|| fetched.clone());
            let heart = if self.favorites.is_favorite(&recipe.id).await {
                "♥".red().to_string()
            } else {
                "♡".dimmed().to_string()
            };
            println!("{}. {} {} ({})", i + 1, heart, recipe.title.bold(), recipe.prep_time);
        }
        println!();
        println!(
            "{}",
            "Commands: :show <n> for details, :fav <n> to save, :again for other ideas.".dimmed()
        );
    }

    async fn render_favorites(&self) {
        let favorites = self.favorites.all().await;
        println!("{}", "Favorites".bold());
        if favorites.is_empty() {
            println!("Your favorite recipes will appear here.");
            println!("Use {} on any search result to add one.", ":fav <n>".bold());
            return;
        }
        for recipe in favorites {
            println!("  {} {} ({}) [{}]", "♥".red(), recipe.title.bold(), recipe.prep_time, recipe.id);
        }
    }

    /// Renders the detail view from its serialized payload; a bad payload
    /// renders a not-found screen instead of crashing.
    pub async fn render_recipe_detail(&self, payload: &str) {
        let recipe: Recipe = match serde_json::from_str(payload) {
            Ok(recipe) => recipe,
            Err(e) => {
                log::warn!("bad recipe payload: {}", e);
                println!("{}", "Recipe not found".red());
                return;
            }
        };

        if let Some(image_url) = &recipe.image_url {
            println!("{}", image_url.dimmed());
        }
        let heart = if self.favorites.is_favorite(&recipe.id).await {
            "♥".red().to_string()
        } else {
            "♡".dimmed().to_string()
        };
        println!("{} {} ({})", heart, recipe.title.bold(), recipe.prep_time);

        println!();
        println!("{}", "Ingredients".bold());
        for item in &recipe.ingredients {
            println!("  - {}", item);
        }

        println!();
        println!("{}", "Instructions".bold());
        for (i, step) in recipe.instructions.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
    }

    fn print_help(&self) {
        println!("{}", "Recipe Scout".bold());
        println!("Type what you feel like eating to search, or:");
        println!("  :show <n>   Show the full recipe for result n");
        println!("  :fav <n>    Save / unsave result n");
        println!("  :favs       List saved recipes");
        println!("  :unfav <id> Remove a saved recipe by id");
        println!("  :again      Different suggestions for the same craving");
        println!("  :retry      Retry after an error");
        println!("  :clear      Back to the start screen");
        println!("  :quit       Exit");
    }
}

fn parse_index(input: &str, command: &str) -> Result<usize, String> {
    input
        .trim_start_matches(command)
        .trim()
        .parse()
        .map_err(|_| format!("Usage: {} <result number>", command))
}
