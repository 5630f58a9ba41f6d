use axum::{
    extract::{FromRef, Query, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        cookie::{clear_session_cookie, session_cookie},
        dto::{
            ApiMessage, ForgotPasswordRequest, GenericMessage, LoginRequest, OnboardRequest,
            PublicUser, ResetPasswordRequest, SignupRequest, UserResponse, VerifyEmailRequest,
        },
        error::AuthError,
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{is_unique_violation, NewUser},
        repo_types::User,
        token::{generate_raw_token, hash_token},
    },
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 6;
const VERIFICATION_TOKEN_TTL: Duration = Duration::minutes(30);
const RESET_TOKEN_TTL: Duration = Duration::minutes(10);
const RESEND_COOLDOWN: Duration = Duration::seconds(60);

/// Identical body for existing and unknown emails, so forgot-password never
/// reveals whether an account exists.
const FORGOT_PASSWORD_MESSAGE: &str = "If the email exists, a reset link has been sent";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Collect the names of required fields that are absent or blank.
fn missing_fields(fields: &[(&'static str, &Option<String>)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| is_blank(value))
        .map(|(name, _)| *name)
        .collect()
}

fn require_all(fields: &[(&'static str, &Option<String>)]) -> Result<(), AuthError> {
    let missing = missing_fields(fields);
    if missing.is_empty() {
        Ok(())
    } else {
        warn!(?missing, "missing required fields");
        Err(AuthError::MissingFields(missing))
    }
}

fn check_password_length(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }
    Ok(())
}

/// Whether a resend must be refused because the last verification email went
/// out less than the cooldown ago. A user who was never sent one (or whose
/// marker was cleared) is never throttled.
fn resend_throttled(last_sent: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    last_sent.is_some_and(|sent_at| now - sent_at < RESEND_COOLDOWN)
}

fn dicebear_avatar(seed: Uuid) -> String {
    format!("https://api.dicebear.com/6.x/adventurer/svg?seed={seed}")
}

fn verification_email(frontend_url: &str, raw_token: &str) -> (String, String) {
    let url = format!(
        "{}/verify-email?token={raw_token}",
        frontend_url.trim_end_matches('/')
    );
    let html = format!(
        "<h2>Welcome to Chatty 👋</h2>\
         <p>Please verify your email to continue.</p>\
         <a href=\"{url}\">Verify Email</a>\
         <p>This link expires in 30 minutes.</p>"
    );
    ("Verify your email - Chatty".to_string(), html)
}

fn reset_email(frontend_url: &str, raw_token: &str) -> (String, String) {
    let url = format!(
        "{}/reset-password?token={raw_token}",
        frontend_url.trim_end_matches('/')
    );
    let html = format!(
        "<h2>Password Reset</h2>\
         <a href=\"{url}\">Reset Password</a>\
         <p>This link expires in 10 minutes.</p>"
    );
    ("Reset your password - Chatty".to_string(), html)
}

/// Persisted state comes first; the email send is attempted afterwards and
/// a failure is logged, never surfaced. The stored token stays valid so the
/// user can ask for a resend.
async fn send_mail_best_effort(state: &AppState, to: &str, subject: &str, html: &str) {
    if let Err(err) = state.mailer.send(to, subject, html).await {
        warn!(error = %err, to = %to, "email send failed; token remains valid");
    }
}

async fn upsert_presence_best_effort(state: &AppState, user: &User) {
    let image = user.profile_pic.as_deref().unwrap_or("");
    if let Err(err) = state
        .presence
        .upsert_user(user.id, &user.full_name, image)
        .await
    {
        warn!(error = %err, user_id = %user.id, "presence upsert failed");
    }
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AuthError> {
    require_all(&[
        ("email", &payload.email),
        ("password", &payload.password),
        ("fullName", &payload.full_name),
    ])?;

    let email = payload.email.as_deref().unwrap_or_default().trim().to_string();
    let password = payload.password.unwrap_or_default();
    let full_name = payload.full_name.as_deref().unwrap_or_default().trim().to_string();

    check_password_length(&password)?;

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email format");
        return Err(AuthError::Validation("Invalid email format".into()));
    }

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AuthError::EmailTaken);
    }

    let password_hash = hash_password(&password)?;

    let user_id = Uuid::new_v4();
    let raw_token = generate_raw_token();
    let now = OffsetDateTime::now_utc();
    let user = User::create(
        &state.db,
        &NewUser {
            id: user_id,
            email: &email,
            full_name: &full_name,
            password_hash: &password_hash,
            profile_pic: &dicebear_avatar(user_id),
            verification_token_hash: &hash_token(&raw_token),
            verification_token_expires: now + VERIFICATION_TOKEN_TTL,
            verification_email_sent_at: now,
        },
    )
    .await
    .map_err(|err| {
        // The unique index decides races the pre-insert lookup cannot see.
        if is_unique_violation(&err) {
            warn!(email = %email, "email already registered (insert race)");
            AuthError::EmailTaken
        } else {
            err.into()
        }
    })?;

    upsert_presence_best_effort(&state, &user).await;

    let (subject, html) = verification_email(&state.config.frontend_url, &raw_token);
    send_mail_best_effort(&state, &user.email, &subject, &html).await;

    info!(user_id = %user.id, email = %user.email, "user signed up, verification pending");
    Ok((
        StatusCode::CREATED,
        Json(ApiMessage::ok("Signup successful. Please verify your email.")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    require_all(&[("email", &payload.email), ("password", &payload.password)])?;

    let email = payload.email.as_deref().unwrap_or_default().trim().to_string();
    let password = payload.password.unwrap_or_default();

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| {
            warn!(email = %email, "login unknown email");
            AuthError::InvalidCredentials
        })?;

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    // No credential is minted before the verification gate.
    if !user.is_email_verified {
        warn!(user_id = %user.id, "login rejected, email not verified");
        return Err(AuthError::EmailNotVerified);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_session(user.id)?;
    let cookie = session_cookie(
        state.config.environment,
        &token,
        keys.session_ttl.whole_seconds(),
    );

    info!(user_id = %user.id, "user logged in");
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(UserResponse {
            success: true,
            user: PublicUser::from(user),
        }),
    ))
}

#[instrument(skip(state, query, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailRequest>,
    payload: Option<Json<VerifyEmailRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let token = payload
        .and_then(|Json(body)| body.token)
        .or(query.token)
        .unwrap_or_default();
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Validation("Token is required".into()));
    }

    // Single atomic statement: a miss here covers wrong, expired and
    // already-consumed tokens without distinguishing them.
    let user = User::consume_verification_token(&state.db, &hash_token(token))
        .await?
        .ok_or(AuthError::InvalidToken)?;

    let keys = JwtKeys::from_ref(&state);
    let session = keys.sign_session(user.id)?;
    let cookie = session_cookie(
        state.config.environment,
        &session,
        keys.session_ttl.whole_seconds(),
    );

    info!(user_id = %user.id, "email verified");
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(ApiMessage::ok("Email verified successfully")),
    ))
}

#[instrument(skip(state))]
pub async fn resend_verification(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AuthError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if user.is_email_verified {
        return Err(AuthError::AlreadyVerified);
    }

    let now = OffsetDateTime::now_utc();
    if resend_throttled(user.last_verification_email_sent_at, now) {
        warn!(user_id = %user.id, "resend throttled");
        return Err(AuthError::ResendThrottled);
    }

    // Re-minting invalidates any previously issued verification token.
    let raw_token = generate_raw_token();
    User::set_verification_token(
        &state.db,
        user.id,
        &hash_token(&raw_token),
        now + VERIFICATION_TOKEN_TTL,
        now,
    )
    .await?;

    let (subject, html) = verification_email(&state.config.frontend_url, &raw_token);
    send_mail_best_effort(&state, &user.email, &subject, &html).await;

    info!(user_id = %user.id, "verification email resent");
    Ok(Json(ApiMessage::ok("Verification email resent")))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    require_all(&[("email", &payload.email)])?;
    let email = payload.email.as_deref().unwrap_or_default().trim().to_string();

    // Unknown emails get the same response; only the side effects differ.
    if let Some(user) = User::find_by_email(&state.db, &email).await? {
        let raw_token = generate_raw_token();
        User::set_reset_token(
            &state.db,
            user.id,
            &hash_token(&raw_token),
            OffsetDateTime::now_utc() + RESET_TOKEN_TTL,
        )
        .await?;

        let (subject, html) = reset_email(&state.config.frontend_url, &raw_token);
        send_mail_best_effort(&state, &user.email, &subject, &html).await;
        info!(user_id = %user.id, "password reset email queued");
    }

    Ok(Json(GenericMessage {
        message: FORGOT_PASSWORD_MESSAGE.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    require_all(&[("token", &payload.token), ("password", &payload.password)])?;

    let token = payload.token.unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    check_password_length(&password)?;

    let password_hash = hash_password(&password)?;
    let user = User::consume_reset_token(&state.db, &hash_token(token.trim()), &password_hash)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    info!(user_id = %user.id, "password reset");
    Ok(Json(ApiMessage::ok(
        "Password reset successful. Please login.",
    )))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    // Stateless sessions: nothing to revoke server-side, the client just
    // drops the cookie.
    (
        AppendHeaders([(SET_COOKIE, clear_session_cookie(state.config.environment))]),
        Json(ApiMessage::ok("Logout successful")),
    )
}

#[instrument(skip(state, payload))]
pub async fn onboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<OnboardRequest>,
) -> Result<impl IntoResponse, AuthError> {
    require_all(&[
        ("fullName", &payload.full_name),
        ("bio", &payload.bio),
        ("nativeLanguage", &payload.native_language),
        ("learningLanguage", &payload.learning_language),
        ("location", &payload.location),
    ])?;

    let user = User::complete_onboarding(
        &state.db,
        user_id,
        payload.full_name.as_deref().unwrap_or_default().trim(),
        payload.bio.as_deref().unwrap_or_default().trim(),
        payload.native_language.as_deref().unwrap_or_default().trim(),
        payload.learning_language.as_deref().unwrap_or_default().trim(),
        payload.location.as_deref().unwrap_or_default().trim(),
    )
    .await?
    .ok_or(AuthError::UserNotFound)?;

    upsert_presence_best_effort(&state, &user).await;

    info!(user_id = %user.id, "onboarding completed");
    Ok(Json(UserResponse {
        success: true,
        user: PublicUser::from(user),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;
    Ok(Json(PublicUser::from(user)))
}
