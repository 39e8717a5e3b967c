use anyhow::{anyhow, bail};

use crate::api::HttpRecipeApi;
use crate::config::Layout;
use crate::manager::RecipeManager;
use crate::mirror::RecipeListView;
use crate::models::{Recipe, RecipeParams};
use crate::screens::{RecipeAction, RecipesScreen, ScreenState};
use crate::state::ClientState;

const GRID_COLUMNS: usize = 3;
const GRID_CELL_WIDTH: usize = 24;

/// Fields to change on edit; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct RecipeEdits {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub ingredients: Option<String>,
    pub steps: Option<String>,
}

impl RecipeEdits {
    pub fn apply_to(self, recipe: &Recipe) -> RecipeParams {
        let mut params = RecipeParams::from(recipe);
        if let Some(name) = self.name {
            params.name = name;
        }
        if let Some(image_url) = self.image_url {
            params.image_url = image_url;
        }
        if let Some(ingredients) = self.ingredients {
            params.ingredients = ingredients;
        }
        if let Some(steps) = self.steps {
            params.steps = steps;
        }
        params
    }
}

pub(crate) fn screen_for(
    state: &ClientState,
    email: Option<&str>,
) -> anyhow::Result<RecipesScreen<HttpRecipeApi>> {
    let manager = RecipeManager::new(
        state.api.clone(),
        state.mirror.clone(),
        state.writer.clone(),
        email.map(str::to_string),
    );
    let view = RecipeListView::new(state.mirror.clone(), email)?;
    Ok(RecipesScreen::new(
        manager,
        view,
        state.session.clone(),
        state.images.clone(),
    ))
}

fn signed_in_screen(state: &ClientState) -> anyhow::Result<RecipesScreen<HttpRecipeApi>> {
    let Some(email) = state.session.email()? else {
        bail!("Not signed in. Run `recipebox signin` first.");
    };
    let mut screen = screen_for(state, Some(&email))?;
    screen.show_offline()?;
    Ok(screen)
}

/// Load from the server; fail the command when the screen could not get there.
async fn load_ready(screen: &mut RecipesScreen<HttpRecipeApi>) -> anyhow::Result<()> {
    match screen.load().await {
        ScreenState::Ready => Ok(()),
        ScreenState::SignedOut => bail!("Session expired. Sign in again."),
        _ => bail!("Could not load recipes. Try again, or use --offline."),
    }
}

fn finish(action: RecipeAction, done: &str) -> anyhow::Result<()> {
    match action {
        RecipeAction::Done => {
            println!("{done}");
            Ok(())
        }
        RecipeAction::RetryDialog(e) => Err(anyhow!(e).context("Request failed, try again")),
        RecipeAction::SignedOut => bail!("Session expired. Sign in again."),
        RecipeAction::InvalidImage => bail!("Image URL did not load as an image"),
    }
}

pub async fn list(state: &ClientState, layout: Layout, offline: bool) -> anyhow::Result<()> {
    let mut screen = signed_in_screen(state)?;
    screen.set_layout(layout);
    if !offline {
        load_ready(&mut screen).await?;
    }

    let recipes = screen.view().recipes();
    if recipes.is_empty() {
        println!("No recipes yet");
        return Ok(());
    }
    let rendered = match screen.layout() {
        Layout::List => render_list(recipes),
        Layout::Grid => render_grid(recipes),
    };
    println!("{rendered}");
    Ok(())
}

pub async fn show(state: &ClientState, id: &str) -> anyhow::Result<()> {
    let mut screen = signed_in_screen(state)?;
    if let Err(e) = load_ready(&mut screen).await {
        tracing::warn!("Showing local copy: {}", e);
    }

    let Some(recipe) = screen.recipe(id).cloned() else {
        bail!("No recipe with id {id}");
    };
    let image = match screen.image(&recipe.image_url).await {
        Some(data) => format!("{} bytes", data.len()),
        None => "unavailable".to_string(),
    };
    println!("{}", render_details(&recipe, &image));
    Ok(())
}

pub async fn add(state: &ClientState, params: &RecipeParams) -> anyhow::Result<()> {
    let mut screen = signed_in_screen(state)?;
    let action = screen.add_recipe(params).await;
    finish(action, &format!("Added {}", params.name))
}

pub async fn edit(state: &ClientState, id: &str, edits: RecipeEdits) -> anyhow::Result<()> {
    let mut screen = signed_in_screen(state)?;
    load_ready(&mut screen).await?;

    let Some(current) = screen.recipe(id).cloned() else {
        bail!("No recipe with id {id}");
    };
    let params = edits.apply_to(&current);
    let action = screen.edit_recipe(&params, id).await;
    finish(action, &format!("Updated {}", params.name))
}

pub async fn delete(state: &ClientState, id: &str) -> anyhow::Result<()> {
    let mut screen = signed_in_screen(state)?;
    let action = screen.delete_recipe(id).await;
    finish(action, &format!("Deleted {id}"))
}

pub fn render_list(recipes: &[Recipe]) -> String {
    recipes
        .iter()
        .map(|r| format!("{:<12} {}", r.id, r.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_grid(recipes: &[Recipe]) -> String {
    recipes
        .chunks(GRID_COLUMNS)
        .map(|row| {
            row.iter()
                .map(|r| {
                    let name = truncate(&r.name, GRID_CELL_WIDTH - 2);
                    format!("{name:<GRID_CELL_WIDTH$}")
                })
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_details(recipe: &Recipe, image: &str) -> String {
    format!(
        "{}\n  id: {}\n  image: {} ({})\n\nIngredients:\n{}\n\nSteps:\n{}",
        recipe.name, recipe.id, recipe.image_url, image, recipe.ingredients, recipe.steps
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
