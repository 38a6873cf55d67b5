use std::collections::BTreeMap;

use sqlx::{Pool, Postgres};

use crate::{
    constants::{
        RECIPE_COUNT_PER_PAGE, SHOPPING_LIST_CONTENT_TYPE, SHOPPING_LIST_FILENAME_SUFFIX,
        SHOPPING_LIST_HEADER,
    },
    error::ApiError,
    pagination::PageContext,
    schema::{CartIngredientRow, RecipeRow, ShoppingList, Uuid},
};

use super::recipes::get_recipe;
use super::users::get_user_by_id;

pub async fn is_in_cart(recipe_id: Uuid, user_id: Uuid, pool: &Pool<Postgres>) -> Result<bool, ApiError> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT recipe_id FROM cart_entries WHERE recipe_id = $1 AND user_id = $2",
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Puts a recipe into the user's cart. At most one entry per (user, recipe)
/// pair; the unique index arbitrates concurrent duplicates, the pre-check
/// only shapes the error.
pub async fn add_to_cart(recipe_id: Uuid, user_id: Uuid, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    if get_recipe(recipe_id, pool).await?.is_none() {
        return Err(ApiError::not_found("No recipe exists with specified id"));
    }

    let result = sqlx::query(
        "INSERT INTO cart_entries (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("Recipe is already in the shopping cart"));
    }

    Ok(())
}

pub async fn remove_from_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM cart_entries WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Recipe is not in the shopping cart"));
    }

    Ok(())
}

pub async fn fetch_cart(
    user_id: Uuid,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.id, r.name, r.image, r.cooking_time, COUNT(*) OVER() AS count
        FROM cart_entries c
        INNER JOIN recipes r ON r.id = c.recipe_id
        WHERE c.user_id = $1
        ORDER BY r.created_at DESC, r.id DESC
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(RECIPE_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    Ok(PageContext::from_rows(
        rows,
        total_count,
        RECIPE_COUNT_PER_PAGE,
        offset,
    ))
}

/// Every ingredient line of every recipe currently in the user's cart,
/// ungrouped.
pub async fn list_cart_ingredients(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<CartIngredientRow>, ApiError> {
    let rows: Vec<CartIngredientRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM cart_entries c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Groups cart lines by (name, measurement_unit) and sums the amounts, so
/// the same ingredient needed by several recipes becomes a single total.
pub fn aggregate_ingredients(rows: &[CartIngredientRow]) -> BTreeMap<(String, String), i64> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        *totals
            .entry((row.name.clone(), row.measurement_unit.clone()))
            .or_insert(0) += i64::from(row.amount);
    }
    totals
}

/// Renders the grouped totals as the downloadable report: a header line,
/// then one line per (ingredient, unit) in alphabetical order.
pub fn render_shopping_list(totals: &BTreeMap<(String, String), i64>) -> String {
    let lines = totals
        .iter()
        .map(|((name, unit), amount)| format!("- {name} ({unit}) - {amount}"))
        .collect::<Vec<String>>()
        .join("\n");

    format!("{SHOPPING_LIST_HEADER}\n{lines}")
}

/// Builds the user's aggregated shopping list. Pure read; an empty cart
/// yields the header with no ingredient lines.
pub async fn build_shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<ShoppingList, ApiError> {
    let user = get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No user exists with specified id"))?;

    let rows = list_cart_ingredients(user_id, pool).await?;
    let content = render_shopping_list(&aggregate_ingredients(&rows));

    Ok(ShoppingList {
        filename: format!("{}{SHOPPING_LIST_FILENAME_SUFFIX}", user.username),
        content_type: SHOPPING_LIST_CONTENT_TYPE,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
        CartIngredientRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn amounts_sum_across_recipes() {
        let rows = vec![row("Salt", "g", 5), row("Salt", "g", 3)];
        let totals = aggregate_ingredients(&rows);

        assert_eq!(totals.len(), 1);
        assert_eq!(totals[&("Salt".to_string(), "g".to_string())], 8);
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let rows = vec![row("Milk", "ml", 200), row("Milk", "tbsp", 2)];
        let totals = aggregate_ingredients(&rows);

        assert_eq!(totals.len(), 2);
    }

    #[test]
    fn rendered_list_is_alphabetical() {
        let rows = vec![
            row("Salt", "g", 5),
            row("Butter", "g", 100),
            row("Salt", "g", 3),
            row("Eggs", "pcs", 4),
        ];
        let content = render_shopping_list(&aggregate_ingredients(&rows));

        assert_eq!(
            content,
            "Shopping list\n- Butter (g) - 100\n- Eggs (pcs) - 4\n- Salt (g) - 8"
        );
    }

    #[test]
    fn empty_cart_renders_header_only() {
        let content = render_shopping_list(&aggregate_ingredients(&[]));
        assert_eq!(content, "Shopping list\n");
    }
}
