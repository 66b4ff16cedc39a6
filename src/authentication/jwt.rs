use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::database::error::Error;
use crate::database::schema::{User, UserRole, Uuid};

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Uuid, username: String, role: UserRole, ttl_hours: i64) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(ttl_hours)).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }
}

/// Verified request context, threaded explicitly into every action that needs
/// a requestor. There is no ambient current-user state.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), Error> {
        if !action.permitted(&self.role) {
            return Err(Error::forbidden(
                "You don't have permission to perform this action",
            ));
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            role: value.role,
        }
    }
}

fn signing_key(secret: &str) -> Result<Hmac<Sha256>, Error> {
    Hmac::new_from_slice(secret.as_bytes()).map_err(|e| Error::Query(format!("jwt key: {e}")))
}

pub fn generate_jwt_session(user: &User, secret: &str, ttl_hours: i64) -> Result<String, Error> {
    let key = signing_key(secret)?;
    let claims = JwtSessionData::new(
        user.id,
        user.username.to_owned(),
        user.role.to_owned(),
        ttl_hours,
    );

    claims
        .sign_with_key(&key)
        .map_err(|e| Error::Query(format!("jwt sign: {e}")))
}

pub fn verify_jwt_session(token: &str, secret: &str) -> Result<JwtSessionData, Error> {
    let key = signing_key(secret)?;

    let session: JwtSessionData = token
        .verify_with_key(&key)
        .map_err(|_| Error::AuthenticationRequired)?;

    if session.exp <= Utc::now().timestamp() {
        return Err(Error::AuthenticationRequired);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 3,
            username: String::from("chef"),
            email: String::from("chef@example.org"),
            first_name: String::from("Ada"),
            last_name: String::from("Cook"),
            password: String::from("<hash>"),
            role: UserRole::User,
        }
    }

    #[test]
    fn sign_verify_roundtrip() {
        let token = generate_jwt_session(&user(), "topsecret", 1).unwrap();
        let session = verify_jwt_session(&token, "topsecret").unwrap();
        assert_eq!(session.user_id, 3);
        assert_eq!(session.role, UserRole::User);
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = generate_jwt_session(&user(), "topsecret", 1).unwrap();
        assert!(matches!(
            verify_jwt_session(&token, "other"),
            Err(Error::AuthenticationRequired)
        ));
    }

    #[test]
    fn rejects_expired_token() {
        use jwt::SignWithKey;

        let claims = JwtSessionData::new(3, String::from("chef"), UserRole::User, -1);
        let key = signing_key("topsecret").unwrap();
        let token = claims.sign_with_key(&key).unwrap();

        assert!(matches!(
            verify_jwt_session(&token, "topsecret"),
            Err(Error::AuthenticationRequired)
        ));
    }
}
