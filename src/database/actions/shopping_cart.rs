use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use crate::database::{
    error::Error,
    schema::{CartIngredientRow, ShoppingListItem, ShortRecipe, Uuid},
    validate::Violation,
};

/// Adds a recipe to the user's shopping cart; same two-state semantics as
/// favorites.
pub async fn add_to_cart(
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
        "INSERT INTO shopping_cart_entries (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::conflict("Recipe is already in the shopping cart"));
    }

    Ok(recipe)
}

pub async fn remove_from_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result =
        sqlx::query("DELETE FROM shopping_cart_entries WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Recipe is not in the shopping cart"));
    }

    Ok(())
}

/// Merges the composition rows of every cart recipe into one purchase list.
/// Grouping key is (name, measurement_unit) — the ingredient uniqueness
/// invariant — so "200 g flour" from two recipes becomes one 400 g line.
/// Output is sorted by name, then unit, so reports are reproducible even
/// when names collide across units.
pub fn merge_purchase_items(rows: Vec<CartIngredientRow>) -> Vec<ShoppingListItem> {
    let mut totals: HashMap<(String, String), i64> = HashMap::new();
    for row in rows {
        *totals
            .entry((row.name, row.measurement_unit))
            .or_insert(0) += i64::from(row.amount);
    }

    let mut items: Vec<ShoppingListItem> = totals
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| ShoppingListItem {
            name,
            measurement_unit,
            total_amount,
        })
        .collect();
    items.sort_by(|a, b| {
        (&a.name, &a.measurement_unit).cmp(&(&b.name, &b.measurement_unit))
    });
    items
}

/// Resolves the user's cart into a deduplicated, summed ingredient list.
/// An empty cart yields an empty list; whether that is an error is the
/// caller's call.
pub async fn aggregate_shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListItem>, Error> {
    let rows: Vec<CartIngredientRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_cart_entries c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(merge_purchase_items(rows))
}

/// Renders the aggregate as the downloadable plain-text document, one line
/// per ingredient: `{name}, {total_amount} {measurement_unit}`.
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    let mut out = String::from("Shopping list\n\n");
    for item in items {
        out.push_str(&format!(
            "{}, {} {}\n",
            item.name, item.total_amount, item.measurement_unit
        ));
    }
    out
}

/// The download endpoint treats an empty cart as a client error (400).
pub async fn download_shopping_list(user_id: Uuid, pool: &Pool<Postgres>) -> Result<String, Error> {
    let items = aggregate_shopping_list(user_id, pool).await?;
    if items.is_empty() {
        return Err(Violation::EmptyCart.into());
    }

    Ok(render_shopping_list(&items))
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
    fn sums_identical_ingredients_across_recipes() {
        let items = merge_purchase_items(vec![
            row("flour", "g", 200),
            row("flour", "g", 200),
            row("sugar", "g", 50),
        ]);

        assert_eq!(
            items,
            vec![
                ShoppingListItem {
                    name: String::from("flour"),
                    measurement_unit: String::from("g"),
                    total_amount: 400,
                },
                ShoppingListItem {
                    name: String::from("sugar"),
                    measurement_unit: String::from("g"),
                    total_amount: 50,
                },
            ]
        );
    }

    #[test]
    fn groups_by_name_and_unit_not_name_alone() {
        let items = merge_purchase_items(vec![row("milk", "ml", 100), row("milk", "tbsp", 2)]);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn name_ties_are_ordered_by_unit() {
        let rows = vec![
            row("milk", "tbsp", 2),
            row("milk", "l", 1),
            row("milk", "g", 30),
            row("milk", "kg", 1),
            row("milk", "cup", 1),
            row("milk", "ml", 100),
        ];
        let units: Vec<String> = merge_purchase_items(rows)
            .into_iter()
            .map(|i| i.measurement_unit)
            .collect();
        assert_eq!(units, vec!["cup", "g", "kg", "l", "ml", "tbsp"]);
    }

    #[test]
    fn empty_cart_yields_empty_list() {
        assert!(merge_purchase_items(vec![]).is_empty());
    }

    #[test]
    fn output_is_sorted_by_name() {
        let items = merge_purchase_items(vec![
            row("zucchini", "pcs", 1),
            row("apple", "pcs", 3),
            row("milk", "ml", 200),
        ]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "milk", "zucchini"]);
    }

    #[test]
    fn report_line_format() {
        let report = render_shopping_list(&[ShoppingListItem {
            name: String::from("flour"),
            measurement_unit: String::from("g"),
            total_amount: 400,
        }]);
        assert!(report.ends_with("flour, 400 g\n"));
    }
}
