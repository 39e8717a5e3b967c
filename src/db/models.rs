use serde::{Deserialize, Serialize};

use crate::models::Recipe;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub email: String,
    pub created_at: String,
}

/// One mirrored recipe, scoped to its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRow {
    pub owner_email: String,
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub ingredients: String,
    pub steps: String,
    pub updated_at: String,
}

impl RecipeRow {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            owner_email: row.get("owner_email")?,
            id: row.get("id")?,
            name: row.get("name")?,
            image_url: row.get("image_url")?,
            ingredients: row.get("ingredients")?,
            steps: row.get("steps")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Recipe {
            id: row.id,
            name: row.name,
            image_url: row.image_url,
            ingredients: row.ingredients,
            steps: row.steps,
        }
    }
}
