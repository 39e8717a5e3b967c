use serde::{Deserialize, Serialize};

/// A recipe as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    #[serde(rename = "imageURL", default)]
    pub image_url: String,
    #[serde(default)]
    pub ingredients: String,
    #[serde(default)]
    pub steps: String,
}

impl Recipe {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        image_url: impl Into<String>,
        ingredients: impl Into<String>,
        steps: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_url: image_url.into(),
            ingredients: ingredients.into(),
            steps: steps.into(),
        }
    }

    /// Build the recipe shown locally after the server accepted `params` under `id`.
    pub fn from_params(params: &RecipeParams, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: params.name.clone(),
            image_url: params.image_url.clone(),
            ingredients: params.ingredients.clone(),
            steps: params.steps.clone(),
        }
    }

    /// True when every mutable field matches `params`.
    pub fn matches_params(&self, params: &RecipeParams) -> bool {
        self.name == params.name
            && self.image_url == params.image_url
            && self.ingredients == params.ingredients
            && self.steps == params.steps
    }
}

/// Request body for creating or editing a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeParams {
    pub name: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub ingredients: String,
    pub steps: String,
}

impl From<&Recipe> for RecipeParams {
    fn from(recipe: &Recipe) -> Self {
        Self {
            name: recipe.name.clone(),
            image_url: recipe.image_url.clone(),
            ingredients: recipe.ingredients.clone(),
            steps: recipe.steps.clone(),
        }
    }
}

/// Request body for sign-in and sign-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipesResponse {
    pub recipes: Vec<Recipe>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    pub auth_token: String,
}

/// Returned by sign-up, add and edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: String,
}
