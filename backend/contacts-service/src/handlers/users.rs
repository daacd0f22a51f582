/// User account handlers - signup, sessions, verification and avatars
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use validator::Validate;

use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Subscription, User};
use crate::security::password;
use crate::services::avatar::{AvatarStore, MAX_AVATAR_BYTES};
use crate::services::gravatar;
use crate::validators;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, max = 64, message = "Password must be between 6 and 64 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, max = 64, message = "Password must be between 6 and 64 characters"))]
    pub password: String,
}

/// Email arrives optional so its absence maps to the documented
/// message instead of a deserializer error.
#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubscriptionRequest {
    pub subscription: Subscription,
}

/// Public projection of an account.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub email: String,
    pub subscription: Subscription,
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            subscription: user.subscription,
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub email: String,
    pub subscription: Subscription,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct CurrentResponse {
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

/// Opaque single-use token mailed to the user (32 random bytes, hex).
fn generate_verification_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen::<u8>()).collect();
    hex::encode(bytes)
}

/// Dispatch the verification email off the request path. Delivery
/// failures are logged, never surfaced to the caller.
fn spawn_verification_email(state: &AppState, email: String, token: String) {
    let mailer = state.email.clone();
    tokio::spawn(async move {
        if let Err(err) = mailer.send_verification_email(&email, &token).await {
            tracing::warn!(error = %err, email = %email, "failed to send verification email");
        }
    });
}

/// Register a new account.
///
/// Uniqueness rides on the database constraint: a duplicate insert maps
/// to a conflict without a pre-flight lookup, so concurrent signups for
/// the same email cannot both succeed.
pub async fn signup(
    state: web::Data<AppState>,
    payload: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let password_hash = password::hash_password(&payload.password)?;
    let avatar_url = gravatar::identicon_url(&payload.email);
    let verification_token = generate_verification_token();

    let user = match user_repo::create_user(
        &state.db,
        &payload.email,
        &password_hash,
        &avatar_url,
        &verification_token,
    )
    .await
    {
        Ok(user) => user,
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(AppError::Conflict("Email in use".to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    spawn_verification_email(&state, user.email.clone(), verification_token);

    tracing::info!(user_id = %user.id, "user registered");

    Ok(HttpResponse::Created().json(SignupResponse {
        user: UserProfile::from(&user),
    }))
}

/// Exchange credentials for a session token.
///
/// Unknown email and wrong password answer identically; only a
/// verified account may log in. The issued token replaces whatever
/// token was stored before.
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let user = user_repo::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| AppError::Authentication("Email or password is wrong".to_string()))?;

    if !password::verify_password(&payload.password, &user.password_hash) {
        return Err(AppError::Authentication("Email or password is wrong".to_string()));
    }

    if !user.verified {
        return Err(AppError::Authentication("Email not verified".to_string()));
    }

    let token = state.token_issuer.issue(user.id)?;

    let user = user_repo::set_session_token(&state.db, user.id, Some(&token))
        .await?
        .ok_or_else(|| AppError::Authentication("Email or password is wrong".to_string()))?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        user: UserSummary {
            email: user.email,
            subscription: user.subscription,
        },
    }))
}

/// Clear the stored session token.
pub async fn logout(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse> {
    user_repo::set_session_token(&state.db, auth.id, None)
        .await?
        .ok_or_else(|| AppError::Authentication("Not authorized".to_string()))?;

    tracing::info!(user_id = %auth.id, "user logged out");

    Ok(HttpResponse::NoContent().finish())
}

/// Return the authenticated account's public projection.
pub async fn current_user(auth: AuthUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(CurrentResponse {
        user: UserProfile {
            email: auth.email,
            subscription: auth.subscription,
            avatar_url: auth.avatar_url,
        },
    }))
}

/// Switch the subscription tier.
pub async fn update_subscription(
    state: web::Data<AppState>,
    auth: AuthUser,
    payload: web::Json<UpdateSubscriptionRequest>,
) -> Result<HttpResponse> {
    let user = user_repo::update_subscription(&state.db, auth.id, payload.subscription)
        .await?
        .ok_or_else(|| AppError::Authentication("Not authorized".to_string()))?;

    tracing::info!(user_id = %user.id, subscription = ?user.subscription, "subscription updated");

    Ok(HttpResponse::Ok().json(user))
}

/// Replace the account avatar from a multipart upload.
///
/// The file streams into staging; the avatar URL only changes after the
/// image has been decoded, resized and moved into the served directory.
pub async fn update_avatar(
    state: web::Data<AppState>,
    auth: AuthUser,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let mut staged: Option<(std::path::PathBuf, String)> = None;

    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?;

        let (is_avatar, filename) = {
            let Some(disposition) = field.content_disposition() else {
                continue;
            };
            (
                disposition.get_name() == Some("avatar"),
                disposition.get_filename().map(str::to_string),
            )
        };

        if !is_avatar {
            continue;
        }
        let Some(filename) = filename else {
            continue;
        };

        let Some(ext) = AvatarStore::allowed_extension(&filename) else {
            return Err(AppError::Validation("Unsupported image type".to_string()));
        };

        let path = state.avatars.staging_path(&ext);
        let mut file = tokio::fs::File::create(&path).await?;
        let mut written = 0usize;

        while let Some(chunk) = field.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    state.avatars.discard(&path).await;
                    return Err(AppError::BadRequest(format!(
                        "Invalid multipart payload: {}",
                        e
                    )));
                }
            };

            written += chunk.len();
            if written > MAX_AVATAR_BYTES {
                state.avatars.discard(&path).await;
                return Err(AppError::Validation(
                    "Avatar file exceeds the size limit".to_string(),
                ));
            }

            if let Err(e) = file.write_all(&chunk).await {
                state.avatars.discard(&path).await;
                return Err(e.into());
            }
        }

        if let Err(e) = file.flush().await {
            state.avatars.discard(&path).await;
            return Err(e.into());
        }

        staged = Some((path, ext));
        break;
    }

    let Some((path, ext)) = staged else {
        return Err(AppError::Validation("Avatar file is required".to_string()));
    };

    let relative = state.avatars.publish(&path, auth.id, &ext).await?;

    let user = user_repo::update_avatar_url(&state.db, auth.id, &relative)
        .await?
        .ok_or_else(|| AppError::Authentication("Not authorized".to_string()))?;

    tracing::info!(user_id = %user.id, avatar = %user.avatar_url, "avatar updated");

    Ok(HttpResponse::Ok().json(AvatarResponse {
        avatar_url: user.avatar_url,
    }))
}

/// Consume a verification token from the emailed link.
pub async fn verify_email(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let token = path.into_inner();

    let user = user_repo::confirm_verification(&state.db, &token)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "email verified");

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Verification successful".to_string(),
    }))
}

/// Re-send the stored verification token to an unverified account.
pub async fn resend_verification(
    state: web::Data<AppState>,
    payload: web::Json<ResendVerificationRequest>,
) -> Result<HttpResponse> {
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::Validation("missing required field email".to_string()))?;

    if !validators::validate_email(email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }

    let user = user_repo::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.verified {
        return Err(AppError::BadRequest(
            "Verification has already been passed".to_string(),
        ));
    }

    // The stored token is re-sent as-is; tokens are single-use but not
    // regenerated on resend.
    let token = user.verification_token.clone().ok_or_else(|| {
        AppError::Internal("Verification token missing for unverified user".to_string())
    })?;

    spawn_verification_email(&state, user.email, token);

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Verification email sent".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_token_is_hex_of_32_bytes() {
        let token = generate_verification_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verification_tokens_are_unique() {
        assert_ne!(generate_verification_token(), generate_verification_token());
    }

    #[test]
    fn test_signup_request_validation() {
        let valid = SignupRequest {
            email: "user@example.com".to_string(),
            password: "s3cret".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = SignupRequest {
            email: "not-an-email".to_string(),
            password: "s3cret".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = SignupRequest {
            email: "user@example.com".to_string(),
            password: "12345".to_string(),
        };
        assert!(short_password.validate().is_err());

        let long_password = SignupRequest {
            email: "user@example.com".to_string(),
            password: "x".repeat(65),
        };
        assert!(long_password.validate().is_err());
    }

    #[test]
    fn test_user_profile_renames_avatar_url() {
        let profile = UserProfile {
            email: "user@example.com".to_string(),
            subscription: Subscription::Starter,
            avatar_url: "avatars/abc.png".to_string(),
        };

        let value = serde_json::to_value(profile).unwrap();
        assert_eq!(value["avatarURL"], "avatars/abc.png");
        assert!(value.get("avatar_url").is_none());
    }
}
