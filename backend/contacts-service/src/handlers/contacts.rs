/// Contact handlers - owner-scoped CRUD over the contact collection
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::contact_repo::{self, ContactFilter};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::AppState;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub favorite: Option<bool>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContactBody {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,

    pub favorite: Option<bool>,
}

/// Favorite arrives optional so its absence maps to the documented
/// message; an explicit `false` is a valid value.
#[derive(Debug, Deserialize)]
pub struct FavoriteBody {
    pub favorite: Option<bool>,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

/// A malformed id cannot name any contact, so it reads as not-found
/// rather than a client error.
fn parse_contact_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Not Found".to_string()))
}

/// Resolve page/limit into a LIMIT/OFFSET window. Out-of-range values
/// are clamped instead of rejected.
fn page_window(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = page.saturating_sub(1).saturating_mul(limit);
    (limit, offset)
}

/// List the caller's contacts with pagination and field filters.
pub async fn list_contacts(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let (limit, offset) = page_window(query.page, query.limit);

    let filter = ContactFilter {
        favorite: query.favorite,
        name: query.name,
        email: query.email,
        phone: query.phone,
        limit,
        offset,
    };

    let contacts = contact_repo::list_contacts(&state.db, auth.id, &filter).await?;

    Ok(HttpResponse::Ok().json(contacts))
}

/// Fetch a single contact owned by the caller.
pub async fn get_contact(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let contact_id = parse_contact_id(&path.into_inner())?;

    let contact = contact_repo::find_owned(&state.db, auth.id, contact_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not Found".to_string()))?;

    Ok(HttpResponse::Ok().json(contact))
}

/// Create a contact owned by the caller.
pub async fn create_contact(
    state: web::Data<AppState>,
    auth: AuthUser,
    payload: web::Json<ContactBody>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let contact = contact_repo::create_contact(
        &state.db,
        auth.id,
        &payload.name,
        &payload.email,
        &payload.phone,
        payload.favorite.unwrap_or(false),
    )
    .await?;

    tracing::info!(contact_id = %contact.id, owner = %auth.id, "contact created");

    Ok(HttpResponse::Created().json(contact))
}

/// Replace every mutable field of a contact.
pub async fn update_contact(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    payload: web::Json<ContactBody>,
) -> Result<HttpResponse> {
    let contact_id = parse_contact_id(&path.into_inner())?;
    payload.validate()?;

    let contact = contact_repo::replace_contact(
        &state.db,
        auth.id,
        contact_id,
        &payload.name,
        &payload.email,
        &payload.phone,
        payload.favorite.unwrap_or(false),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Not Found".to_string()))?;

    Ok(HttpResponse::Ok().json(contact))
}

/// Toggle the favorite flag on a contact.
pub async fn update_favorite(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    payload: web::Json<FavoriteBody>,
) -> Result<HttpResponse> {
    let contact_id = parse_contact_id(&path.into_inner())?;

    let favorite = payload
        .favorite
        .ok_or_else(|| AppError::Validation("missing field favorite".to_string()))?;

    let contact = contact_repo::set_favorite(&state.db, auth.id, contact_id, favorite)
        .await?
        .ok_or_else(|| AppError::NotFound("Not Found".to_string()))?;

    Ok(HttpResponse::Ok().json(contact))
}

/// Delete a contact owned by the caller.
pub async fn remove_contact(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let contact_id = parse_contact_id(&path.into_inner())?;

    let contact = contact_repo::delete_contact(&state.db, auth.id, contact_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not Found".to_string()))?;

    tracing::info!(contact_id = %contact.id, owner = %auth.id, "contact deleted");

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "contact deleted".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_contact_id_valid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_contact_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_parse_contact_id_malformed_reads_as_not_found() {
        let err = parse_contact_id("not-a-uuid").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.to_string(), "Not Found");
    }

    #[test]
    fn test_page_window_defaults() {
        assert_eq!(page_window(None, None), (20, 0));
    }

    #[test]
    fn test_page_window_offset() {
        assert_eq!(page_window(Some(3), Some(10)), (10, 20));
    }

    #[test]
    fn test_page_window_clamps_limit() {
        assert_eq!(page_window(Some(1), Some(1000)), (100, 0));
        assert_eq!(page_window(Some(1), Some(0)), (1, 0));
    }

    #[test]
    fn test_page_window_floors_page() {
        assert_eq!(page_window(Some(0), Some(10)), (10, 0));
        assert_eq!(page_window(Some(-5), Some(10)), (10, 0));
    }

    #[test]
    fn test_page_window_saturates_on_huge_page() {
        // An absurd page number must clamp to a valid window, not overflow.
        assert_eq!(page_window(Some(i64::MAX), Some(100)), (100, i64::MAX));
    }

    #[test]
    fn test_contact_body_validation() {
        let valid = ContactBody {
            name: "Allen Raymond".to_string(),
            email: "nulla.ante@vestibul.co.uk".to_string(),
            phone: "(992) 914-3792".to_string(),
            favorite: None,
        };
        assert!(valid.validate().is_ok());

        let missing_name = ContactBody {
            name: String::new(),
            email: "nulla.ante@vestibul.co.uk".to_string(),
            phone: "(992) 914-3792".to_string(),
            favorite: None,
        };
        assert!(missing_name.validate().is_err());

        let bad_email = ContactBody {
            name: "Allen Raymond".to_string(),
            email: "not-an-email".to_string(),
            phone: "(992) 914-3792".to_string(),
            favorite: Some(true),
        };
        assert!(bad_email.validate().is_err());
    }
}
