use sqlx::{Pool, Postgres};

use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt,
    },
    database::{
        error::Error,
        schema::{RegisterPayload, User, Uuid},
        validate::validate_register_payload,
    },
};

pub async fn get_user_by_email(
    email: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(user_id: Uuid, pool: &Pool<Postgres>) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Registers a user with the default `user` role. The password is stored as
/// an argon2 hash; duplicate usernames or emails surface as `Conflict`.
pub async fn register_user(payload: RegisterPayload, pool: &Pool<Postgres>) -> Result<Uuid, Error> {
    validate_register_payload(&payload)?;

    let hash =
        hash_password(&payload.password).map_err(|e| Error::Query(format!("password hash: {e}")))?;

    let id: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO users (username, email, first_name, last_name, password, role)
        VALUES ($1, $2, $3, $4, $5, 'user')
        RETURNING id;
    ",
    )
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&hash)
    .fetch_one(pool)
    .await?;

    Ok(id.0)
}

/// Verifies credentials against the stored hash and mints a session token.
/// The email is the login field.
pub async fn login_user(
    email: &str,
    password: &str,
    secret: &str,
    ttl_hours: i64,
    pool: &Pool<Postgres>,
) -> Result<String, Error> {
    let user = get_user_by_email(email, pool)
        .await?
        .ok_or(Error::AuthenticationRequired)?;

    let authenticated = verify_password(password, &user.password)
        .map_err(|e| Error::Query(format!("password verify: {e}")))?;
    if !authenticated {
        return Err(Error::AuthenticationRequired);
    }

    jwt::generate_jwt_session(&user, secret, ttl_hours)
}
