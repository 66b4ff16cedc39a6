use sqlx::{Pool, Postgres};

use crate::{
    constants::SUBSCRIPTION_COUNT_PER_PAGE,
    database::{
        error::Error,
        pagination::Page,
        schema::{SubscriptionRow, Uuid},
        validate::Violation,
    },
};

use super::users::get_user_by_id;

/// Subscribes `subscriber_id` to `author_id`'s recipe feed. Self-subscription
/// is rejected before anything touches the store; duplicates come back as
/// `Conflict` via the unique (subscriber, author) constraint.
pub async fn subscribe(
    subscriber_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    if subscriber_id == author_id {
        return Err(Violation::SelfSubscription.into());
    }

    if get_user_by_id(author_id, pool).await?.is_none() {
        return Err(Error::not_found("No user exists with specified id"));
    }

    let result = sqlx::query(
        "INSERT INTO user_subscriptions (subscriber_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(subscriber_id)
    .bind(author_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::conflict("Already subscribed to this user"));
    }

    Ok(())
}

pub async fn unsubscribe(
    subscriber_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query(
        "DELETE FROM user_subscriptions WHERE subscriber_id = $1 AND author_id = $2",
    )
    .bind(subscriber_id)
    .bind(author_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Not subscribed to this user"));
    }

    Ok(())
}

/// The subscription feed: every author the user follows, with their recipe
/// count, newest subscriptions first.
pub async fn fetch_subscriptions(
    subscriber_id: Uuid,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<Page<SubscriptionRow>, Error> {
    let rows: Vec<SubscriptionRow> = sqlx::query_as(
        "
        SELECT u.id AS author_id, u.username, u.first_name, u.last_name,
               (SELECT COUNT(*) FROM recipes r WHERE r.author_id = u.id) AS recipe_count,
               COUNT(*) OVER() AS count
        FROM user_subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.subscriber_id = $1
        ORDER BY s.created_at DESC
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(subscriber_id)
    .bind(SUBSCRIPTION_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total = rows.first().map(|r| r.count).unwrap_or(0);
    Ok(Page::from_rows(
        rows,
        total,
        SUBSCRIPTION_COUNT_PER_PAGE,
        offset,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    // The self-subscription guard runs before any query; exercising it does
    // not need a live pool, only a lazily-connected one.
    #[tokio::test]
    async fn self_subscription_is_rejected_without_touching_the_store() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unreachable")
            .unwrap();

        let err = subscribe(7, 7, &pool).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
