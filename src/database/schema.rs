use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{NAME_MAX_LEN, TEXT_MAX_LEN};
use crate::error::ApiError;
use crate::form::Form;
use crate::validate::validate_quantity;

pub type Uuid = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl TryFrom<Value> for UserRole {
    type Error = ApiError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some("user") => Ok(Self::User),
            Some("admin") => Ok(Self::Admin),
            Some(other) => Err(ApiError::Validation(format!("Unknown role `{other}`"))),
            None => Err(ApiError::validation("Failed to parse value as string")),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub uid: UserRole,
}

/// Read shape of a user. `is_subscribed` is computed against an explicit
/// viewer id; an anonymous viewer always sees `false`.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One ingredient line of a recipe, joined with the ingredient catalog.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Short feed row. `count` carries the window total for pagination.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
    pub count: i64,
}

/// Full read shape of a recipe: expanded relations plus the viewer's
/// membership flags.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub id: Uuid,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub author: UserRow,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// User listing row with the pagination window total.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct UserListRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub count: i64,
}

/// Subscribed author card: user fields plus their recipe count.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub recipes_count: i64,
    pub count: i64,
}

/// One raw ingredient line pulled out of the viewer's cart before grouping.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Rendered aggregation result, ready for the serving layer to attach as a
/// download.
#[derive(Debug, Clone, Serialize)]
pub struct ShoppingList {
    pub filename: String,
    pub content_type: &'static str,
    pub content: String,
}

/// Ingredient reference inside a recipe write payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngredientEntry {
    pub id: Uuid,
    pub amount: i32,
}

impl TryFrom<Value> for IngredientEntry {
    type Error = ApiError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let invalid = || ApiError::validation("Ingredient entries must carry `id` and `amount`");

        let entry = value.as_object().ok_or_else(invalid)?;
        let id = entry
            .get("id")
            .and_then(Value::as_i64)
            .and_then(|id| Uuid::try_from(id).ok())
            .ok_or_else(invalid)?;
        let amount = entry
            .get("amount")
            .and_then(Value::as_i64)
            .and_then(|amount| i32::try_from(amount).ok())
            .ok_or_else(invalid)?;

        Ok(Self { id, amount })
    }
}

/// Write shape of a recipe: raw foreign-key ids, no expansion. The same
/// payload drives both create and update; on update a missing `image`
/// keeps the stored one.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientEntry>,
    pub tags: Vec<Uuid>,
    pub image: Option<String>,
}

impl RecipeDraft {
    pub fn from_form(form: &Form) -> Result<Self, ApiError> {
        Ok(Self {
            name: form.get_str("name")?,
            text: form.get_str("text")?,
            cooking_time: form.get_number("cooking_time")?,
            ingredients: form.get_list("ingredients")?,
            tags: form.get_id_list("tags")?,
            image: form.get_opt_str("image"),
        })
    }

    /// Field-level checks that must all pass before any row is written.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.is_empty() || self.name.len() > NAME_MAX_LEN {
            return Err(ApiError::validation("Recipe name has invalid length"));
        }
        if self.text.len() > TEXT_MAX_LEN {
            return Err(ApiError::validation("Recipe text is too long"));
        }
        if self.ingredients.is_empty() {
            return Err(ApiError::validation(
                "Recipe must contain at least one ingredient",
            ));
        }
        if self.tags.is_empty() {
            return Err(ApiError::validation("Recipe must carry at least one tag"));
        }

        let mut seen: HashSet<Uuid> = HashSet::new();
        for tag_id in &self.tags {
            if !seen.insert(*tag_id) {
                return Err(ApiError::Validation(format!(
                    "Tag {tag_id} appears more than once"
                )));
            }
        }

        validate_quantity(self.cooking_time)?;
        for entry in &self.ingredients {
            validate_quantity(entry.amount)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft() -> RecipeDraft {
        RecipeDraft {
            name: "Pea soup".to_string(),
            text: "Soak, boil, serve".to_string(),
            cooking_time: 90,
            ingredients: vec![
                IngredientEntry { id: 1, amount: 500 },
                IngredientEntry { id: 2, amount: 5 },
            ],
            tags: vec![1, 2],
            image: None,
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn empty_ingredient_list_is_rejected() {
        let mut draft = draft();
        draft.ingredients.clear();
        assert!(draft.validate().is_err());
    }

    #[test]
    fn empty_tag_list_is_rejected() {
        let mut draft = draft();
        draft.tags.clear();
        assert!(draft.validate().is_err());
    }

    #[test]
    fn repeated_tag_is_rejected() {
        let mut draft = draft();
        draft.tags = vec![3, 1, 3];
        assert!(draft.validate().is_err());
    }

    #[test]
    fn quantity_range_applies_to_amounts_and_cooking_time() {
        let mut too_long = draft();
        too_long.cooking_time = 10_000;
        assert!(too_long.validate().is_err());

        let mut zero_amount = draft();
        zero_amount.ingredients[0].amount = 0;
        assert!(zero_amount.validate().is_err());

        let mut boundary = draft();
        boundary.cooking_time = 9999;
        boundary.ingredients[0].amount = 1;
        assert!(boundary.validate().is_ok());
    }

    #[test]
    fn draft_parses_from_form() {
        let payload = json!({
            "name": "Pancakes",
            "text": "Whisk and fry",
            "cooking_time": 20,
            "ingredients": [{ "id": 4, "amount": 300 }, { "id": 7, "amount": 2 }],
            "tags": [1],
            "image": "data:image/png;base64,aGVsbG8="
        });
        let form = Form::from_data(payload.as_object().unwrap().clone().into_iter().collect());

        let draft = RecipeDraft::from_form(&form).unwrap();
        assert_eq!(draft.name, "Pancakes");
        assert_eq!(draft.ingredients.len(), 2);
        assert_eq!(draft.ingredients[1], IngredientEntry { id: 7, amount: 2 });
        assert_eq!(draft.tags, vec![1]);
        assert!(draft.image.is_some());
        assert!(draft.validate().is_ok());
    }
}
