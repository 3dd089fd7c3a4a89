//! Authentication handlers.

use actix_web::cookie::Cookie;
use actix_web::{HttpResponse, web};
use std::sync::Arc;

use fable_core::domain::{Role, User, normalize_email};
use fable_core::ports::{PasswordService, TokenService};
use fable_shared::dto::{LoginRequest, RegisterRequest, SessionResponse, UserResponse};

use crate::config::CookieConfig;
use crate::middleware::auth::{AUTHENTICATED, Identity, authorize};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn session_cookie(config: &CookieConfig, token: String) -> Cookie<'static> {
    Cookie::build(config.name.clone(), token)
        .http_only(true)
        .secure(config.secure)
        .same_site(config.same_site)
        .path("/")
        .finish()
}

/// POST /auth/register
pub async fn register(
    state: web::Data<AppState>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let email = normalize_email(&req.email);

    // Validate input
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let password_hash = password_service
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    // Registration always yields a plain USER. A duplicate email surfaces
    // from the unique index as a conflict; there is no pre-check to race.
    let user = User::new(email, password_hash, Role::User);
    let saved = state.users.insert(user).await.map_err(|e| {
        match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Email is already taken".to_string()),
            other => other,
        }
    })?;

    Ok(HttpResponse::Created().json(UserResponse::from(saved)))
}

/// POST /auth/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    cookie_config: web::Data<CookieConfig>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let email = normalize_email(&req.email);

    // Unknown email and wrong password take the same exit: the response
    // must not reveal whether the account exists.
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = password_service
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        return Err(AppError::Unauthorized);
    }

    let token = token_service
        .generate_token(user.id, &user.email, user.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&cookie_config, token))
        .json(UserResponse::from(user)))
}

/// POST /auth/logout
pub async fn logout(cookie_config: web::Data<CookieConfig>) -> HttpResponse {
    let mut cookie = session_cookie(&cookie_config, String::new());
    cookie.make_removal();

    HttpResponse::NoContent().cookie(cookie).finish()
}

/// GET /auth/me - requires a valid session cookie.
pub async fn me(identity: Identity) -> AppResult<HttpResponse> {
    authorize(&AUTHENTICATED, Some(&identity))?;

    Ok(HttpResponse::Ok().json(SessionResponse {
        user_id: identity.user_id,
        email: identity.email,
        role: identity.role,
    }))
}
