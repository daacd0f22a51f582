/// Contact repository - owner-scoped database operations for contacts
///
/// Every query here carries the owner id; a contact id belonging to a
/// different account behaves exactly like a missing row.
use crate::models::Contact;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// Optional equality filters plus pagination for listing.
#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    pub favorite: Option<bool>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// List the owner's contacts, oldest first.
pub async fn list_contacts(
    pool: &PgPool,
    owner: Uuid,
    filter: &ContactFilter,
) -> Result<Vec<Contact>, sqlx::Error> {
    sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, name, email, phone, favorite, owner, created_at, updated_at
        FROM contacts
        WHERE owner = $1
          AND ($2::boolean IS NULL OR favorite = $2)
          AND ($3::text IS NULL OR name = $3)
          AND ($4::text IS NULL OR email = $4)
          AND ($5::text IS NULL OR phone = $5)
        ORDER BY created_at ASC
        LIMIT $6 OFFSET $7
        "#,
    )
    .bind(owner)
    .bind(filter.favorite)
    .bind(filter.name.as_deref())
    .bind(filter.email.as_deref())
    .bind(filter.phone.as_deref())
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(pool)
    .await
}

/// Find a single contact owned by the given account
pub async fn find_owned(
    pool: &PgPool,
    owner: Uuid,
    contact_id: Uuid,
) -> Result<Option<Contact>, sqlx::Error> {
    sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, name, email, phone, favorite, owner, created_at, updated_at
        FROM contacts
        WHERE id = $1 AND owner = $2
        "#,
    )
    .bind(contact_id)
    .bind(owner)
    .fetch_optional(pool)
    .await
}

/// Create a contact bound to the owner
pub async fn create_contact(
    pool: &PgPool,
    owner: Uuid,
    name: &str,
    email: &str,
    phone: &str,
    favorite: bool,
) -> Result<Contact, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query_as::<_, Contact>(
        r#"
        INSERT INTO contacts (id, name, email, phone, favorite, owner, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING id, name, email, phone, favorite, owner, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(favorite)
    .bind(owner)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Replace every mutable field of an owned contact
pub async fn replace_contact(
    pool: &PgPool,
    owner: Uuid,
    contact_id: Uuid,
    name: &str,
    email: &str,
    phone: &str,
    favorite: bool,
) -> Result<Option<Contact>, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, Contact>(
        r#"
        UPDATE contacts
        SET name = $1, email = $2, phone = $3, favorite = $4, updated_at = $5
        WHERE id = $6 AND owner = $7
        RETURNING id, name, email, phone, favorite, owner, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(favorite)
    .bind(now)
    .bind(contact_id)
    .bind(owner)
    .fetch_optional(pool)
    .await
}

/// Flip only the favorite flag of an owned contact
pub async fn set_favorite(
    pool: &PgPool,
    owner: Uuid,
    contact_id: Uuid,
    favorite: bool,
) -> Result<Option<Contact>, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, Contact>(
        r#"
        UPDATE contacts
        SET favorite = $1, updated_at = $2
        WHERE id = $3 AND owner = $4
        RETURNING id, name, email, phone, favorite, owner, created_at, updated_at
        "#,
    )
    .bind(favorite)
    .bind(now)
    .bind(contact_id)
    .bind(owner)
    .fetch_optional(pool)
    .await
}

/// Delete an owned contact, returning the removed row if it existed
pub async fn delete_contact(
    pool: &PgPool,
    owner: Uuid,
    contact_id: Uuid,
) -> Result<Option<Contact>, sqlx::Error> {
    sqlx::query_as::<_, Contact>(
        r#"
        DELETE FROM contacts
        WHERE id = $1 AND owner = $2
        RETURNING id, name, email, phone, favorite, owner, created_at, updated_at
        "#,
    )
    .bind(contact_id)
    .bind(owner)
    .fetch_optional(pool)
    .await
}
