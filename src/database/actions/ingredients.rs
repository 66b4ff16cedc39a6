use sqlx::{Pool, Postgres};

use crate::{
    constants::INGREDIENT_COUNT_PER_PAGE,
    database::{
        error::Error,
        pagination::Page,
        schema::{Ingredient, Uuid},
    },
};

pub async fn get_ingredient(
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, Error> {
    let rows: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Prefix search over the catalog, the autocomplete behind the recipe form.
pub async fn fetch_ingredients(
    search: &str,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<Page<Ingredient>, Error> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: Uuid,
        name: String,
        measurement_unit: String,
        count: i64,
    }

    let rows: Vec<Row> = sqlx::query_as(
        "
        SELECT i.*, COUNT(*) OVER() AS count
        FROM ingredients i
        WHERE i.name ILIKE $1 || '%'
        ORDER BY i.name
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(search)
    .bind(INGREDIENT_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total = rows.first().map(|r| r.count).unwrap_or(0);
    let rows = rows
        .into_iter()
        .map(|r| Ingredient {
            id: r.id,
            name: r.name,
            measurement_unit: r.measurement_unit,
        })
        .collect();

    Ok(Page::from_rows(rows, total, INGREDIENT_COUNT_PER_PAGE, offset))
}
