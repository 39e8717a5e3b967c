//! The session's source of truth for recipes.
//!
//! Remote results land in the in-memory list first; the mirror is brought in
//! line through the serial writer afterwards.

use std::sync::Arc;

use crate::api::RecipeApi;
use crate::error::{ClientError, ClientResult};
use crate::mirror::{LocalMirror, MirrorWriter, ReconcileReport};
use crate::models::{Recipe, RecipeParams};

/// Receives list mutations as they happen. All methods default to no-ops.
pub trait RecipeManagerDelegate: Send + Sync {
    fn added_recipe(&self, _index: usize) {}
    fn updated_recipe(&self, _index: usize) {}
    fn removed_recipe(&self, _index: usize) {}
    /// The remote call succeeded but the local copy could not be written.
    fn mirror_save_failed(&self, _error: &ClientError) {}
}

/// Result of a successful remote load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub fetched: usize,
    pub report: ReconcileReport,
}

pub struct RecipeManager<A: RecipeApi> {
    recipes: Vec<Recipe>,
    api: Arc<A>,
    mirror: LocalMirror,
    writer: MirrorWriter,
    user: Option<String>,
    delegate: Option<Arc<dyn RecipeManagerDelegate>>,
}

impl<A: RecipeApi> RecipeManager<A> {
    pub fn new(
        api: Arc<A>,
        mirror: LocalMirror,
        writer: MirrorWriter,
        user: Option<String>,
    ) -> Self {
        Self {
            recipes: Vec::new(),
            api,
            mirror,
            writer,
            user,
            delegate: None,
        }
    }

    /// Seed the in-memory list without touching the network or the mirror.
    pub fn with_recipes(mut self, recipes: Vec<Recipe>) -> Self {
        self.recipes = recipes;
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecipeManagerDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn mirror(&self) -> &LocalMirror {
        &self.mirror
    }

    /// Move to another user's partition and show what is mirrored for them.
    pub async fn switch_user(&mut self, email: Option<&str>) -> ClientResult<()> {
        self.user = email.map(str::to_string);
        self.recipes.clear();

        if let Some(email) = email {
            self.writer.ensure_user(email).await?;
        }
        self.load_recipes_from_db()?;

        tracing::info!(user = ?self.user, count = self.recipes.len(), "switched user");
        Ok(())
    }

    /// Replace the in-memory list with the current user's mirrored rows.
    pub fn load_recipes_from_db(&mut self) -> ClientResult<()> {
        self.recipes = match &self.user {
            Some(email) => self.mirror.fetch_all(email)?,
            None => Vec::new(),
        };
        Ok(())
    }

    /// Reconcile the mirror with the in-memory list.
    pub async fn save_recipes_in_db(&self) -> ClientResult<ReconcileReport> {
        let Some(email) = &self.user else {
            return Ok(ReconcileReport::default());
        };
        self.writer.reconcile(email, self.recipes.clone()).await
    }

    /// Fetch from the server; on success the in-memory list is exactly the
    /// fetched list and the mirror is reconciled to it. A failed fetch
    /// changes nothing. A failed mirror write after a good fetch is reported
    /// to the delegate and the load still succeeds with an empty report.
    pub async fn load_recipes(&mut self) -> ClientResult<SyncOutcome> {
        let fetched = self.api.get_all_recipes().await?;
        let count = fetched.len();
        self.recipes = fetched;

        let report = match self.save_recipes_in_db().await {
            Ok(report) => report,
            Err(e) => {
                self.report_mirror_failure(e);
                ReconcileReport::default()
            }
        };
        tracing::info!(
            fetched = count,
            inserted = report.inserted,
            updated = report.updated,
            deleted = report.deleted,
            "recipes loaded"
        );

        Ok(SyncOutcome {
            fetched: count,
            report,
        })
    }

    pub async fn add_recipe(&mut self, params: &RecipeParams) -> ClientResult<Recipe> {
        let id = self.api.add_recipe(params).await?;
        let recipe = Recipe::from_params(params, id);

        self.recipes.push(recipe.clone());
        let index = self.recipes.len() - 1;

        if let Some(email) = &self.user {
            if let Err(e) = self.writer.insert(email, recipe.clone()).await {
                self.report_mirror_failure(e);
            }
        }
        if let Some(delegate) = &self.delegate {
            delegate.added_recipe(index);
        }

        Ok(recipe)
    }

    /// Returns the updated recipe, or `None` when `id` is not in the list.
    pub async fn edit_recipe(
        &mut self,
        params: &RecipeParams,
        id: &str,
    ) -> ClientResult<Option<Recipe>> {
        let echoed = self.api.edit_recipe(params, id).await?;
        if echoed != id {
            tracing::warn!(requested = id, echoed = %echoed, "server echoed a different id");
        }

        let Some(row) = self.recipes.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        let modified = Recipe::from_params(params, id);
        self.recipes[row] = modified.clone();

        if let Some(email) = &self.user {
            if let Err(e) = self.writer.update(email, modified.clone()).await {
                self.report_mirror_failure(e);
            }
        }
        if let Some(delegate) = &self.delegate {
            delegate.updated_recipe(row);
        }

        Ok(Some(modified))
    }

    /// Returns whether the recipe was in the list.
    pub async fn delete_recipe(&mut self, id: &str) -> ClientResult<bool> {
        self.api.delete_recipe(id).await?;

        let Some(row) = self.recipes.iter().position(|r| r.id == id) else {
            // Still drop any stale mirrored copy
            if let Some(email) = &self.user {
                if let Err(e) = self.writer.delete(email, id).await {
                    self.report_mirror_failure(e);
                }
            }
            return Ok(false);
        };
        self.recipes.remove(row);

        if let Some(email) = &self.user {
            if let Err(e) = self.writer.delete(email, id).await {
                self.report_mirror_failure(e);
            }
        }
        if let Some(delegate) = &self.delegate {
            delegate.removed_recipe(row);
        }

        Ok(true)
    }

    fn report_mirror_failure(&self, error: ClientError) {
        tracing::error!("Could not update local mirror: {}", error);
        if let Some(delegate) = &self.delegate {
            delegate.mirror_save_failed(&error);
        }
    }
}
