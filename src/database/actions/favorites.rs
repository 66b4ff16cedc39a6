use sqlx::{Pool, Postgres};

use crate::{
    constants::RECIPE_COUNT_PER_PAGE,
    database::{
        error::Error,
        pagination::Page,
        schema::{ShortRecipe, Uuid},
    },
};

/// Adds a recipe to the user's favorites. The unique (user, recipe)
/// constraint is the backstop against concurrent duplicate adds; a redundant
/// request is a `Conflict`, never a silent no-op.
pub async fn add_to_favorites(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<ShortRecipe, Error> {
    let recipe: Option<ShortRecipe> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .fetch_optional(pool)
            .await?;
    let recipe = recipe.ok_or_else(|| Error::not_found("No recipe exists with specified id"))?;

    let result = sqlx::query(
        "INSERT INTO user_favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::conflict("Recipe is already in favorites"));
    }

    Ok(recipe)
}

pub async fn remove_from_favorites(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Recipe is not in favorites"));
    }

    Ok(())
}

pub async fn fetch_favorites(
    user_id: Uuid,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<Page<ShortRecipe>, Error> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: Uuid,
        name: String,
        image: Option<String>,
        cooking_time: i32,
        count: i64,
    }

    let rows: Vec<Row> = sqlx::query_as(
        "
        SELECT r.id, r.name, r.image, r.cooking_time, COUNT(*) OVER() AS count
        FROM user_favorites f
        INNER JOIN recipes r ON r.id = f.recipe_id
        WHERE f.user_id = $1
        ORDER BY r.created_at DESC
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(RECIPE_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total = rows.first().map(|r| r.count).unwrap_or(0);
    let rows = rows
        .into_iter()
        .map(|r| ShortRecipe {
            id: r.id,
            name: r.name,
            image: r.image,
            cooking_time: r.cooking_time,
        })
        .collect();

    Ok(Page::from_rows(rows, total, RECIPE_COUNT_PER_PAGE, offset))
}
