use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
///
/// A token column and its paired expiry are always set and cleared together.
/// The raw token never appears here; these columns hold SHA-256 hashes.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub profile_pic: Option<String>,
    pub bio: Option<String>,
    pub native_language: Option<String>,
    pub learning_language: Option<String>,
    pub location: Option<String>,
    pub is_email_verified: bool,
    pub is_onboarded: bool,
    pub email_verification_token: Option<String>,
    pub email_verification_token_expires: Option<OffsetDateTime>,
    pub last_verification_email_sent_at: Option<OffsetDateTime>,
    pub password_reset_token: Option<String>,
    pub password_reset_token_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}
