use std::convert::Infallible;

use warp::{reject::Rejection, Filter};

use crate::database::error::Error;

use super::jwt::{verify_jwt_session, SessionData};

/// Extracts a verified session from the `session` cookie; rejects with 401
/// when the cookie is missing or invalid.
pub fn with_session(
    secret: String,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::cookie::optional::<String>("session").and_then(move |cookie: Option<String>| {
        let secret = secret.clone();
        async move {
            match cookie {
                Some(token) => verify_jwt_session(&token, &secret)
                    .map(SessionData::from)
                    .map_err(Rejection::from),
                None => Err(Error::AuthenticationRequired.into()),
            }
        }
    })
}

/// Like [`with_session`], but anonymous callers pass through with `None`.
/// Membership checks short-circuit on that `None` instead of erroring.
pub fn with_possible_session(
    secret: String,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Infallible> + Clone {
    warp::cookie::optional::<String>("session").map(move |cookie: Option<String>| {
        cookie
            .and_then(|token| verify_jwt_session(&token, &secret).ok())
            .map(SessionData::from)
    })
}
