use crate::error::AppError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Token lifetime used when `JWT_EXPIRATION_HOURS` is unset or unparsable.
pub const DEFAULT_EXPIRATION_HOURS: i64 = 24;

/// Claims carried by a bearer token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Id of the user the token was issued to.
    pub sub: i32,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// A usable signing secret: set and not blank. Shared with
/// [`Config`](crate::config::Config) so both accept the same values.
pub(crate) fn parse_secret(value: &str) -> Option<&str> {
    Some(value).filter(|v| !v.trim().is_empty())
}

/// A positive number of hours. Shared with [`Config`](crate::config::Config).
pub(crate) fn parse_expiration_hours(value: &str) -> Option<i64> {
    value.trim().parse().ok().filter(|hours: &i64| *hours > 0)
}

fn jwt_secret() -> Result<String, AppError> {
    std::env::var("JWT_SECRET")
        .ok()
        .filter(|value| parse_secret(value).is_some())
        .ok_or_else(|| {
            log::error!("JWT_SECRET is not set");
            AppError::InternalServerError("JWT_SECRET not set".into())
        })
}

fn expiration_hours() -> i64 {
    std::env::var("JWT_EXPIRATION_HOURS")
        .ok()
        .and_then(|value| parse_expiration_hours(&value))
        .unwrap_or(DEFAULT_EXPIRATION_HOURS)
}

/// Signs an HS256 token for `user_id`, valid for `JWT_EXPIRATION_HOURS`.
///
/// Returns `AppError::InternalServerError` if `JWT_SECRET` is not set or
/// encoding fails.
pub fn generate_token(user_id: i32) -> Result<String, AppError> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(expiration_hours()))
        .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id,
        exp: expiration,
    };

    let secret = jwt_secret()?;
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Verifies signature and expiry of a token and returns its claims.
///
/// Returns `AppError::Unauthorized` for malformed, forged or expired tokens.
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    let secret = jwt_secret()?;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lazy_static::lazy_static;

    lazy_static! {
        pub(crate) static ref JWT_ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    }

    /// Runs `test_logic` with `JWT_SECRET` temporarily set, restoring the
    /// previous value afterwards even if the closure panics.
    pub(crate) fn run_with_temp_jwt_secret<F>(secret_value: &str, test_logic: F)
    where
        F: FnOnce(),
    {
        let _guard = JWT_ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let original_secret_val = std::env::var("JWT_SECRET").ok();
        std::env::set_var("JWT_SECRET", secret_value);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test_logic));

        if let Some(original) = original_secret_val {
            std::env::set_var("JWT_SECRET", original);
        } else {
            std::env::remove_var("JWT_SECRET");
        }

        if let Err(panic_payload) = result {
            std::panic::resume_unwind(panic_payload);
        }
    }

    #[test]
    fn test_token_generation_and_verification() {
        run_with_temp_jwt_secret("test_secret_for_gen_verify", || {
            let token = generate_token(17).unwrap();
            let claims = verify_token(&token).unwrap();
            assert_eq!(claims.sub, 17);

            let now = chrono::Utc::now().timestamp() as usize;
            assert!(claims.exp > now);
        });
    }

    #[test]
    fn test_expired_token_is_rejected() {
        run_with_temp_jwt_secret("test_secret_for_expiration", || {
            let expiration = chrono::Utc::now()
                .checked_sub_signed(chrono::Duration::hours(2))
                .unwrap()
                .timestamp() as usize;

            let expired_token = encode(
                &Header::default(),
                &Claims {
                    sub: 2,
                    exp: expiration,
                },
                &EncodingKey::from_secret("test_secret_for_expiration".as_bytes()),
            )
            .unwrap();

            match verify_token(&expired_token) {
                Err(AppError::Unauthorized(msg)) => {
                    assert!(msg.contains("ExpiredSignature"), "{}", msg)
                }
                other => panic!("expected expiry rejection, got {:?}", other),
            }
        });
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = {
            let _guard = JWT_ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            encode(
                &Header::default(),
                &Claims {
                    sub: 9,
                    exp: (chrono::Utc::now().timestamp() + 3600) as usize,
                },
                &EncodingKey::from_secret(b"someone_elses_secret"),
            )
            .unwrap()
        };

        run_with_temp_jwt_secret("blog_secret", || {
            assert!(matches!(
                verify_token(&token),
                Err(AppError::Unauthorized(_))
            ));
            assert!(matches!(
                verify_token("not-a-jwt"),
                Err(AppError::Unauthorized(_))
            ));
        });
    }

    #[test]
    fn test_blank_secret_is_rejected() {
        run_with_temp_jwt_secret("   ", || {
            assert!(matches!(
                generate_token(1),
                Err(AppError::InternalServerError(_))
            ));
        });
    }

    #[test]
    fn test_expiration_hours_fallback() {
        let _guard = JWT_ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let original = std::env::var("JWT_EXPIRATION_HOURS").ok();

        std::env::set_var("JWT_EXPIRATION_HOURS", "48");
        assert_eq!(expiration_hours(), 48);
        std::env::set_var("JWT_EXPIRATION_HOURS", "soon");
        assert_eq!(expiration_hours(), DEFAULT_EXPIRATION_HOURS);
        std::env::set_var("JWT_EXPIRATION_HOURS", "0");
        assert_eq!(expiration_hours(), DEFAULT_EXPIRATION_HOURS);
        std::env::set_var("JWT_EXPIRATION_HOURS", " 12 ");
        assert_eq!(expiration_hours(), 12);

        match original {
            Some(value) => std::env::set_var("JWT_EXPIRATION_HOURS", value),
            None => std::env::remove_var("JWT_EXPIRATION_HOURS"),
        }
    }
}
