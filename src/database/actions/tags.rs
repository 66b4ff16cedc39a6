use sqlx::{Pool, Postgres};

use crate::{
    authentication::{jwt::SessionData, permissions::ActionType},
    database::{
        error::Error,
        schema::{Tag, TagPayload, Uuid},
        validate::validate_tag_payload,
    },
};

/// Creates a tag. Administrator-only; name, color and slug are each unique,
/// so a constraint race comes back as `Conflict`.
pub async fn create_tag(
    payload: TagPayload,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Uuid, Error> {
    session.authenticate(ActionType::ManageTags)?;
    validate_tag_payload(&payload)?;

    let id: (Uuid,) = sqlx::query_as(
        "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&payload.name)
    .bind(&payload.color)
    .bind(&payload.slug)
    .fetch_one(pool)
    .await?;

    Ok(id.0)
}

pub async fn delete_tag(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    session.authenticate(ActionType::ManageTags)?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM recipe_tags WHERE tag_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM tags WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("No tag exists with specified id"));
    }

    Ok(())
}

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let rows: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

pub async fn list_recipe_tags(recipe_id: Uuid, pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let rows: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
