use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Postgres unique-constraint violation (SQLSTATE 23505).
///
/// Concurrent signups for one email can both pass the pre-insert lookup; the
/// unique index on `email` is what actually decides the race, so the loser's
/// insert error must be recognizable as a duplicate.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

const USER_COLUMNS: &str = r#"
    id, email, full_name, password_hash, profile_pic, bio,
    native_language, learning_language, location,
    is_email_verified, is_onboarded,
    email_verification_token, email_verification_token_expires,
    last_verification_email_sent_at,
    password_reset_token, password_reset_token_expires,
    created_at
"#;

/// Fields persisted at signup; the verification token pair and throttle
/// marker are written in the same insert as the user itself.
pub struct NewUser<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub full_name: &'a str,
    pub password_hash: &'a str,
    pub profile_pic: &'a str,
    pub verification_token_hash: &'a str,
    pub verification_token_expires: OffsetDateTime,
    pub verification_email_sent_at: OffsetDateTime,
}

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Create an unverified, not-onboarded user with its first verification
    /// token already outstanding.
    pub async fn create(db: &PgPool, new: &NewUser<'_>) -> sqlx::Result<User> {
        let query = format!(
            r#"
            INSERT INTO users (
                id, email, full_name, password_hash, profile_pic,
                email_verification_token, email_verification_token_expires,
                last_verification_email_sent_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&query)
            .bind(new.id)
            .bind(new.email)
            .bind(new.full_name)
            .bind(new.password_hash)
            .bind(new.profile_pic)
            .bind(new.verification_token_hash)
            .bind(new.verification_token_expires)
            .bind(new.verification_email_sent_at)
            .fetch_one(db)
            .await
    }

    /// Replace any outstanding verification token with a fresh one.
    pub async fn set_verification_token(
        db: &PgPool,
        user_id: Uuid,
        token_hash: &str,
        expires: OffsetDateTime,
        sent_at: OffsetDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET email_verification_token = $2,
                email_verification_token_expires = $3,
                last_verification_email_sent_at = $4
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires)
        .bind(sent_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Atomically consume an outstanding verification token.
    ///
    /// The expiry guard and the clearing of the token pair live in one
    /// statement, so a token matches at most once even under concurrent
    /// submissions. `None` covers wrong, expired and already-used tokens
    /// alike.
    pub async fn consume_verification_token(
        db: &PgPool,
        token_hash: &str,
    ) -> sqlx::Result<Option<User>> {
        let query = format!(
            r#"
            UPDATE users
            SET is_email_verified = TRUE,
                email_verification_token = NULL,
                email_verification_token_expires = NULL,
                last_verification_email_sent_at = NULL
            WHERE email_verification_token = $1
              AND email_verification_token_expires > now()
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&query)
            .bind(token_hash)
            .fetch_optional(db)
            .await
    }

    /// Replace any outstanding password-reset token with a fresh one.
    pub async fn set_reset_token(
        db: &PgPool,
        user_id: Uuid,
        token_hash: &str,
        expires: OffsetDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = $2,
                password_reset_token_expires = $3
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Atomically consume a reset token, storing the new password hash and
    /// clearing only the reset pair.
    pub async fn consume_reset_token(
        db: &PgPool,
        token_hash: &str,
        new_password_hash: &str,
    ) -> sqlx::Result<Option<User>> {
        let query = format!(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_reset_token = NULL,
                password_reset_token_expires = NULL
            WHERE password_reset_token = $1
              AND password_reset_token_expires > now()
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&query)
            .bind(token_hash)
            .bind(new_password_hash)
            .fetch_optional(db)
            .await
    }

    /// Persist the onboarding allow-list and flip `is_onboarded`.
    pub async fn complete_onboarding(
        db: &PgPool,
        user_id: Uuid,
        full_name: &str,
        bio: &str,
        native_language: &str,
        learning_language: &str,
        location: &str,
    ) -> sqlx::Result<Option<User>> {
        let query = format!(
            r#"
            UPDATE users
            SET full_name = $2,
                bio = $3,
                native_language = $4,
                learning_language = $5,
                location = $6,
                is_onboarded = TRUE
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .bind(full_name)
            .bind(bio)
            .bind(native_language)
            .bind(learning_language)
            .bind(location)
            .fetch_optional(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
