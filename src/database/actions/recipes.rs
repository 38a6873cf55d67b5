use sqlx::{Pool, Postgres, Transaction};

use crate::{
    constants::RECIPE_COUNT_PER_PAGE,
    error::ApiError,
    pagination::PageContext,
    permissions::{ActionType, Actor},
    schema::{Recipe, RecipeDetail, RecipeDraft, RecipeIngredient, RecipeRow, Uuid},
};

use super::cart::is_in_cart;
use super::tags::list_recipe_tags;
use super::users::get_user_row;

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn find_recipe(name: &str, pool: &Pool<Postgres>) -> Result<Option<Uuid>, ApiError> {
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM recipes WHERE LOWER(name) = LOWER($1)")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.0))
}

/// Resolves a recipe for mutation: it must exist, and the actor must be its
/// author or hold the manage-all grant.
pub async fn get_recipe_mut(
    id: Uuid,
    actor: &Actor,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let recipe = get_recipe(id, pool).await?;
    actor.authorize(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => {
            if actor.can(ActionType::ManageAllRecipes) || recipe.author_id == actor.user_id {
                Ok(recipe)
            } else {
                Err(ApiError::permission_denied(
                    "Only the author may modify this recipe",
                ))
            }
        }
        None => Err(ApiError::not_found("No recipe exists with specified id")),
    }
}

/// Writes the draft's ingredient amounts and tag links for one recipe.
/// Runs inside the caller's transaction: an unknown ingredient or tag id
/// aborts the whole write, never leaving a partial set behind.
async fn insert_components(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    draft: &RecipeDraft,
) -> Result<(), ApiError> {
    for entry in &draft.ingredients {
        let ingredient: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = $1")
            .bind(entry.id)
            .fetch_optional(&mut **tx)
            .await?;
        if ingredient.is_none() {
            return Err(ApiError::NotFound(format!(
                "No ingredient exists with id {}",
                entry.id
            )));
        }

        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES ($1, $2, $3)",
        )
        .bind(recipe_id)
        .bind(entry.id)
        .bind(entry.amount)
        .execute(&mut **tx)
        .await?;
    }

    for tag_id in &draft.tags {
        let tag: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE id = $1")
            .bind(tag_id)
            .fetch_optional(&mut **tx)
            .await?;
        if tag.is_none() {
            return Err(ApiError::NotFound(format!("No tag exists with id {tag_id}")));
        }

        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2)")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

/// Creates a recipe with its ingredient amounts and tag links as one atomic
/// unit. A duplicate name surfaces as a conflict from the unique index.
pub async fn create_recipe(
    actor: &Actor,
    draft: &RecipeDraft,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, ApiError> {
    actor.authorize(ActionType::CreateRecipes)?;
    draft.validate()?;

    let mut tx = pool.begin().await?;

    let recipe: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, cooking_time, image)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(actor.user_id)
    .bind(&draft.name)
    .bind(&draft.text)
    .bind(draft.cooking_time)
    .bind(&draft.image)
    .fetch_one(&mut *tx)
    .await?;

    let recipe_id = recipe.0;
    insert_components(&mut tx, recipe_id, draft).await?;

    tx.commit().await?;
    log::info!("Created recipe {recipe_id} for user {}", actor.user_id);

    get_recipe_detail(recipe_id, Some(actor.user_id), pool).await
}

/// Replaces a recipe's state with the draft wholesale: all existing
/// ingredient amounts and tag links are dropped and rebuilt from the
/// payload, then the scalar fields are updated. A missing `image` keeps
/// the stored one.
pub async fn update_recipe(
    id: Uuid,
    actor: &Actor,
    draft: &RecipeDraft,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, ApiError> {
    let recipe = get_recipe_mut(id, actor, pool).await?;
    draft.validate()?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tx)
        .await?;

    insert_components(&mut tx, recipe.id, draft).await?;

    let image = draft.image.as_ref().or(recipe.image.as_ref());
    sqlx::query("UPDATE recipes SET name = $1, text = $2, cooking_time = $3, image = $4 WHERE id = $5")
        .bind(&draft.name)
        .bind(&draft.text)
        .bind(draft.cooking_time)
        .bind(image)
        .bind(recipe.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    get_recipe_detail(recipe.id, Some(actor.user_id), pool).await
}

/// Deletes a recipe; its ingredient amounts, tag links and cart/favorite
/// references cascade at the storage layer.
pub async fn delete_recipe(id: Uuid, actor: &Actor, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let recipe = get_recipe_mut(id, actor, pool).await?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe.id)
        .execute(pool)
        .await?;

    log::info!("Deleted recipe {} (`{}`)", recipe.id, recipe.name);
    Ok(())
}

pub async fn list_recipe_ingredients(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredient>, ApiError> {
    let rows: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Full read shape for one recipe, with membership flags computed for the
/// given viewer. Anonymous viewers see both flags as `false`.
pub async fn get_recipe_detail(
    id: Uuid,
    viewer_id: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, ApiError> {
    let recipe = get_recipe(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("No recipe exists with specified id"))?;

    let author = get_user_row(recipe.author_id, viewer_id, pool).await?;
    let tags = list_recipe_tags(pool, recipe.id).await?;
    let ingredients = list_recipe_ingredients(recipe.id, pool).await?;

    let (is_favorited, is_in_shopping_cart) = match viewer_id {
        Some(viewer) => (
            is_favorite(recipe.id, viewer, pool).await?,
            is_in_cart(recipe.id, viewer, pool).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeDetail {
        id: recipe.id,
        name: recipe.name,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        image: recipe.image,
        author,
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
    })
}

/// Paginated feed, newest first.
pub async fn fetch_recipes(
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.id, r.name, r.image, r.cooking_time, COUNT(*) OVER() AS count
        FROM recipes r
        ORDER BY r.created_at DESC, r.id DESC
        LIMIT $1 OFFSET $2
    ",
    )
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

/// Short rows of one author's recipes, newest first, optionally capped.
pub async fn list_author_recipes(
    author_id: Uuid,
    limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeRow>, ApiError> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.id, r.name, r.image, r.cooking_time, COUNT(*) OVER() AS count
        FROM recipes r
        WHERE r.author_id = $1
        ORDER BY r.created_at DESC, r.id DESC
        LIMIT $2
    ",
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn is_favorite(id: Uuid, user_id: Uuid, pool: &Pool<Postgres>) -> Result<bool, ApiError> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT recipe_id FROM user_favorites WHERE recipe_id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

pub async fn fetch_favorites(
    user_id: Uuid,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.id, r.name, r.image, r.cooking_time, COUNT(*) OVER() AS count
        FROM user_favorites f
        INNER JOIN recipes r ON r.id = f.recipe_id
        WHERE f.user_id = $1
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

/// Adds a recipe to the user's favorites. The existence probe gives the
/// friendlier message; the unique pair index is what actually arbitrates
/// concurrent duplicates.
pub async fn add_to_favorites(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if get_recipe(id, pool).await?.is_none() {
        return Err(ApiError::not_found("No recipe exists with specified id"));
    }

    let result = sqlx::query(
        "INSERT INTO user_favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("Recipe is already in favorites"));
    }

    Ok(())
}

pub async fn remove_from_favorites(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Recipe is not in favorites"));
    }

    Ok(())
}
