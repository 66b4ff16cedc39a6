use sqlx::{Pool, Postgres};

use super::{error::Error, schema::Uuid};

/// Existence checks decorating read responses. Every check takes the viewer
/// as an `Option`: anonymous callers get `false` without a store round trip.

pub async fn is_favorited(
    viewer: Option<Uuid>,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let Some(user_id) = viewer else {
        return Ok(false);
    };

    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT recipe_id FROM user_favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.is_some())
}

pub async fn is_in_shopping_cart(
    viewer: Option<Uuid>,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let Some(user_id) = viewer else {
        return Ok(false);
    };

    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT recipe_id FROM shopping_cart_entries WHERE user_id = $1 AND recipe_id = $2",
    )
    .bind(user_id)
    .bind(recipe_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

pub async fn is_subscribed(
    viewer: Option<Uuid>,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let Some(subscriber_id) = viewer else {
        return Ok(false);
    };

    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT author_id FROM user_subscriptions WHERE subscriber_id = $1 AND author_id = $2",
    )
    .bind(subscriber_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}
