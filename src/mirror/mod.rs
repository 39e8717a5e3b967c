//! On-device copy of each user's recipes.
//!
//! Rows are partitioned by owner email. Every committed write is announced on
//! a broadcast channel so list views can refresh and diff.

mod view;
mod writer;

use rusqlite::{params, OptionalExtension};
use std::collections::{HashMap, HashSet};
use tokio::sync::broadcast;

use crate::db::models::{RecipeRow, UserRow};
use crate::error::ClientResult;
use crate::models::Recipe;
use crate::state::DbPool;

pub use self::view::RecipeListView;
pub use self::writer::MirrorWriter;

/// Published after a write to `email`'s partition commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorEvent {
    pub email: String,
}

/// What a reconciliation changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.deleted == 0
    }
}

#[derive(Clone)]
pub struct LocalMirror {
    pool: DbPool,
    events: broadcast::Sender<MirrorEvent>,
}

impl LocalMirror {
    pub fn new(pool: DbPool) -> Self {
        let (events, _) = broadcast::channel(64);
        Self { pool, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MirrorEvent> {
        self.events.subscribe()
    }

    fn notify(&self, email: &str) {
        // No subscribers is fine
        let _ = self.events.send(MirrorEvent {
            email: email.to_string(),
        });
    }

    pub fn ensure_user(&self, email: &str) -> ClientResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR IGNORE INTO users (email) VALUES (?1)",
            params![email],
        )?;
        Ok(())
    }

    pub fn user(&self, email: &str) -> ClientResult<Option<UserRow>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                "SELECT email, created_at FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(UserRow {
                        email: row.get(0)?,
                        created_at: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// The user's recipes ordered by name, ties broken by id.
    pub fn fetch_all(&self, email: &str) -> ClientResult<Vec<Recipe>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT owner_email, id, name, image_url, ingredients, steps, updated_at
             FROM recipes
             WHERE owner_email = ?1
             ORDER BY name ASC, id ASC",
        )?;
        let recipes = stmt
            .query_map(params![email], RecipeRow::from_row)?
            .map(|row| row.map(Recipe::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    pub fn fetch(&self, email: &str, id: &str) -> ClientResult<Option<Recipe>> {
        let conn = self.pool.get()?;
        let row = conn
            .query_row(
                "SELECT owner_email, id, name, image_url, ingredients, steps, updated_at
                 FROM recipes
                 WHERE owner_email = ?1 AND id = ?2",
                params![email, id],
                RecipeRow::from_row,
            )
            .optional()?;
        Ok(row.map(Recipe::from))
    }

    pub fn count(&self, email: &str) -> ClientResult<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recipes WHERE owner_email = ?1",
            params![email],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Insert, or overwrite the fields of an existing row with the same id.
    pub fn insert(&self, email: &str, recipe: &Recipe) -> ClientResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR IGNORE INTO users (email) VALUES (?1)",
            params![email],
        )?;
        upsert(&conn, email, recipe)?;
        drop(conn);

        self.notify(email);
        Ok(())
    }

    /// Overwrite an existing row. Returns false when the id is not mirrored.
    pub fn update(&self, email: &str, recipe: &Recipe) -> ClientResult<bool> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE recipes
             SET name = ?3, image_url = ?4, ingredients = ?5, steps = ?6,
                 updated_at = datetime('now')
             WHERE owner_email = ?1 AND id = ?2",
            params![
                email,
                recipe.id,
                recipe.name,
                recipe.image_url,
                recipe.ingredients,
                recipe.steps
            ],
        )?;
        drop(conn);

        if rows > 0 {
            self.notify(email);
        }
        Ok(rows > 0)
    }

    /// Returns false when the id was not mirrored.
    pub fn delete(&self, email: &str, id: &str) -> ClientResult<bool> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "DELETE FROM recipes WHERE owner_email = ?1 AND id = ?2",
            params![email, id],
        )?;
        drop(conn);

        if rows > 0 {
            self.notify(email);
        }
        Ok(rows > 0)
    }

    /// Make `email`'s partition hold exactly the ids in `recipes`, with their
    /// fields. Runs in one transaction.
    pub fn reconcile(&self, email: &str, recipes: &[Recipe]) -> ClientResult<ReconcileReport> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT OR IGNORE INTO users (email) VALUES (?1)",
            params![email],
        )?;

        let local: HashMap<String, Recipe> = {
            let mut stmt = tx.prepare(
                "SELECT owner_email, id, name, image_url, ingredients, steps, updated_at
                 FROM recipes WHERE owner_email = ?1",
            )?;
            let rows = stmt
                .query_map(params![email], RecipeRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter()
                .map(|row| (row.id.clone(), Recipe::from(row)))
                .collect()
        };

        // A repeated id later in the list wins
        let mut remote: HashMap<&str, &Recipe> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for recipe in recipes {
            if remote.insert(recipe.id.as_str(), recipe).is_none() {
                order.push(recipe.id.as_str());
            }
        }

        let mut report = ReconcileReport::default();
        for id in &order {
            let recipe = remote[id];
            match local.get(*id) {
                None => {
                    upsert(&tx, email, recipe)?;
                    report.inserted += 1;
                }
                Some(existing) if existing != recipe => {
                    upsert(&tx, email, recipe)?;
                    report.updated += 1;
                }
                Some(_) => {}
            }
        }

        let remote_ids: HashSet<&str> = remote.keys().copied().collect();
        for id in local.keys() {
            if !remote_ids.contains(id.as_str()) {
                tx.execute(
                    "DELETE FROM recipes WHERE owner_email = ?1 AND id = ?2",
                    params![email, id],
                )?;
                report.deleted += 1;
            }
        }

        tx.commit()?;
        drop(conn);

        tracing::debug!(
            email,
            inserted = report.inserted,
            updated = report.updated,
            deleted = report.deleted,
            "reconciled local mirror"
        );

        if !report.is_empty() {
            self.notify(email);
        }
        Ok(report)
    }
}

fn upsert(conn: &rusqlite::Connection, email: &str, recipe: &Recipe) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO recipes (owner_email, id, name, image_url, ingredients, steps)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(owner_email, id) DO UPDATE SET
           name = excluded.name,
           image_url = excluded.image_url,
           ingredients = excluded.ingredients,
           steps = excluded.steps,
           updated_at = datetime('now')",
        params![
            email,
            recipe.id,
            recipe.name,
            recipe.image_url,
            recipe.ingredients,
            recipe.steps
        ],
    )
}
