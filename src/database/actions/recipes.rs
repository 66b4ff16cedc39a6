use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use crate::{
    authentication::{jwt::SessionData, permissions::ActionType},
    constants::{Limits, RECIPE_COUNT_PER_PAGE},
    database::{
        error::Error,
        membership,
        pagination::Page,
        schema::{
            AuthorCard, Recipe, RecipeFilter, RecipeFull, RecipeIngredient, RecipePayload,
            RecipeRow, Uuid,
        },
        validate::validate_recipe_payload,
    },
};

use super::{tags::list_recipe_tags, users::get_user_by_id};

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Fetches a recipe for mutation. Authors manage their own recipes;
/// moderators and admins hold the manage-all action and override the
/// ownership check.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != session.user_id {
                    Err(Error::forbidden("Only the author can modify this recipe"))
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(Error::not_found("No recipe exists with specified id")),
    }
}

/// Replaces a recipe's tag links and composition rows inside the caller's
/// transaction. Wholesale delete-then-insert: composition rows are owned by
/// exactly one recipe and nothing else references them, so diffing would buy
/// nothing. The validator has already guaranteed both lists are non-empty.
async fn replace_associations(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    payload: &RecipePayload,
) -> Result<(), Error> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    query_builder.push_values(&payload.tags, |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(tag_id);
    });
    query_builder.build().execute(&mut **tx).await?;

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    query_builder.push_values(&payload.ingredients, |mut b, entry| {
        b.push_bind(recipe_id)
            .push_bind(entry.id)
            .push_bind(entry.amount);
    });
    query_builder.build().execute(&mut **tx).await?;

    Ok(())
}

/// Creates a recipe together with its tag set and ingredient composition as
/// one transaction. Validation runs up front; if any insert fails the whole
/// write rolls back, so no recipe is ever observable without its ingredients.
pub async fn create_recipe(
    author_id: Uuid,
    payload: RecipePayload,
    limits: &Limits,
    pool: &Pool<Postgres>,
) -> Result<RecipeFull, Error> {
    validate_recipe_payload(&payload, limits, pool).await?;

    let mut tx = pool.begin().await?;

    let id: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&payload.name)
    .bind(&payload.image)
    .bind(&payload.text)
    .bind(payload.cooking_time)
    .fetch_one(&mut *tx)
    .await?;

    replace_associations(&mut tx, id.0, &payload).await?;

    tx.commit().await?;

    get_recipe_full(id.0, Some(author_id), pool).await
}

/// Replaces a recipe's scalar fields, tag set and composition wholesale.
/// The author reference never changes.
pub async fn update_recipe(
    recipe_id: Uuid,
    session: &SessionData,
    payload: RecipePayload,
    limits: &Limits,
    pool: &Pool<Postgres>,
) -> Result<RecipeFull, Error> {
    let recipe = get_recipe_mut(recipe_id, session, pool).await?;
    validate_recipe_payload(&payload, limits, pool).await?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE recipes SET name = $1, image = $2, text = $3, cooking_time = $4 WHERE id = $5",
    )
    .bind(&payload.name)
    .bind(&payload.image)
    .bind(&payload.text)
    .bind(payload.cooking_time)
    .bind(recipe.id)
    .execute(&mut *tx)
    .await?;

    replace_associations(&mut tx, recipe.id, &payload).await?;

    tx.commit().await?;

    get_recipe_full(recipe.id, Some(session.user_id), pool).await
}

/// Deletes a recipe and everything that references it. The store schema does
/// not auto-cascade; children go first, in one transaction.
pub async fn delete_recipe(
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let recipe = get_recipe_mut(recipe_id, session, pool).await?;

    let mut tx = pool.begin().await?;

    for table in [
        "recipe_ingredients",
        "user_favorites",
        "shopping_cart_entries",
        "recipe_tags",
    ] {
        sqlx::query(&format!("DELETE FROM {table} WHERE recipe_id = $1"))
            .bind(recipe.id)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

pub async fn list_recipe_ingredients(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredient>, Error> {
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

/// Hydrates one recipe for the given viewer: tags, composition, author card
/// and the viewer-scoped membership flags.
pub async fn get_recipe_full(
    recipe_id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeFull, Error> {
    let recipe = get_recipe(recipe_id, pool)
        .await?
        .ok_or_else(|| Error::not_found("No recipe exists with specified id"))?;

    let author = get_user_by_id(recipe.author_id, pool)
        .await?
        .ok_or_else(|| Error::not_found("Recipe author does not exist"))?;

    let tags = list_recipe_tags(recipe.id, pool).await?;
    let ingredients = list_recipe_ingredients(recipe.id, pool).await?;

    let is_subscribed = membership::is_subscribed(viewer, author.id, pool).await?;
    let is_favorited = membership::is_favorited(viewer, recipe.id, pool).await?;
    let is_in_shopping_cart = membership::is_in_shopping_cart(viewer, recipe.id, pool).await?;

    Ok(RecipeFull {
        id: recipe.id,
        author: AuthorCard::new(&author, is_subscribed),
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        created_at: recipe.created_at,
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
    })
}

/// Filtered recipe listing, newest first. The membership filters only narrow
/// the result for authenticated viewers; anonymous requests ignore them.
pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<Uuid>,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<Page<RecipeFull>, Error> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

    if let Some(author_id) = filter.author {
        query_builder.push(" AND r.author_id = ");
        query_builder.push_bind(author_id);
    }

    if !filter.tags.is_empty() {
        query_builder.push(
            " AND r.id IN (SELECT rt.recipe_id FROM recipe_tags rt \
             INNER JOIN tags t ON t.id = rt.tag_id WHERE t.slug = ANY(",
        );
        query_builder.push_bind(&filter.tags);
        query_builder.push("))");
    }

    if let Some(user_id) = viewer {
        if filter.is_favorited == Some(true) {
            query_builder
                .push(" AND r.id IN (SELECT recipe_id FROM user_favorites WHERE user_id = ");
            query_builder.push_bind(user_id);
            query_builder.push(")");
        }
        if filter.is_in_shopping_cart == Some(true) {
            query_builder
                .push(" AND r.id IN (SELECT recipe_id FROM shopping_cart_entries WHERE user_id = ");
            query_builder.push_bind(user_id);
            query_builder.push(")");
        }
    }

    query_builder.push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ");
    query_builder.push_bind(RECIPE_COUNT_PER_PAGE);
    query_builder.push(" OFFSET ");
    query_builder.push_bind(offset);

    let rows: Vec<RecipeRow> = query_builder.build_query_as().fetch_all(pool).await?;

    let total = rows.first().map(|r| r.count).unwrap_or(0);

    let mut hydrated = Vec::with_capacity(rows.len());
    for row in rows {
        hydrated.push(get_recipe_full(row.id, viewer, pool).await?);
    }

    Ok(Page::from_rows(hydrated, total, RECIPE_COUNT_PER_PAGE, offset))
}
