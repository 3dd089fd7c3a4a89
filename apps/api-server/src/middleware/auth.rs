//! Authentication middleware and extractors.

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use std::future::{Ready, ready};
use std::sync::Arc;

use fable_core::domain::Role;
use fable_core::ports::{AuthError, TokenClaims, TokenService};

use crate::config::CookieConfig;
use crate::middleware::error::AppError;

/// Authenticated user identity extractor.
///
/// Use this in handlers to require a valid session cookie:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, user {}!", identity.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub email: String,
    pub role: Role,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Per-route authorization declaration, checked by [`authorize`].
pub struct RouteAccess {
    pub requires_auth: bool,
    pub required_roles: &'static [Role],
}

/// Routes any authenticated user may call.
pub const AUTHENTICATED: RouteAccess = RouteAccess {
    requires_auth: true,
    required_roles: &[],
};

/// Routes restricted to admins.
pub const ADMIN_ONLY: RouteAccess = RouteAccess {
    requires_auth: true,
    required_roles: &[Role::Admin],
};

/// The single authorization check: verifies presence of an identity when
/// the route requires one, then its role against the route's declared set.
/// An empty role set passes any authenticated caller.
pub fn authorize(access: &RouteAccess, identity: Option<&Identity>) -> Result<(), AppError> {
    let Some(identity) = identity else {
        if access.requires_auth {
            return Err(AppError::Unauthorized);
        }
        return Ok(());
    };

    if access.required_roles.is_empty() || access.required_roles.contains(&identity.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match &self.0 {
            AuthError::TokenExpired => actix_web::http::StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken(_) => actix_web::http::StatusCode::UNAUTHORIZED,
            AuthError::MissingAuth => actix_web::http::StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => actix_web::http::StatusCode::FORBIDDEN,
            _ => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        use fable_shared::ErrorResponse;

        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your session has expired. Please login again."),
            AuthError::InvalidToken(_) => ErrorResponse::unauthorized(),
            AuthError::MissingAuth => ErrorResponse::unauthorized(),
            AuthError::InsufficientPermissions => ErrorResponse::forbidden(),
            _ => ErrorResponse::internal_error(),
        };

        actix_web::HttpResponse::build(self.status_code()).json(error)
    }
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Services registered in app data
        let token_service = match req.app_data::<actix_web::web::Data<Arc<dyn TokenService>>>() {
            Some(service) => service,
            None => {
                tracing::error!("TokenService not found in app data");
                return ready(Err(AuthenticationError(AuthError::InvalidToken(
                    "Server configuration error".to_string(),
                ))));
            }
        };
        let cookie_name = match req.app_data::<actix_web::web::Data<CookieConfig>>() {
            Some(config) => config.name.as_str(),
            None => {
                tracing::error!("CookieConfig not found in app data");
                return ready(Err(AuthenticationError(AuthError::InvalidToken(
                    "Server configuration error".to_string(),
                ))));
            }
        };

        // The session token travels in an HTTP-only cookie, not a header.
        let cookie = match req.cookie(cookie_name) {
            Some(cookie) => cookie,
            None => return ready(Err(AuthenticationError(AuthError::MissingAuth))),
        };

        match token_service.validate_token(cookie.value()) {
            Ok(claims) => ready(Ok(Identity::from(claims))),
            Err(e) => ready(Err(AuthenticationError(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "t@x.com".to_string(),
            role,
        }
    }

    #[test]
    fn missing_identity_on_protected_route_is_unauthorized() {
        let result = authorize(&AUTHENTICATED, None);
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn empty_role_set_passes_any_authenticated_user() {
        assert!(authorize(&AUTHENTICATED, Some(&identity(Role::User))).is_ok());
        assert!(authorize(&AUTHENTICATED, Some(&identity(Role::Admin))).is_ok());
    }

    #[test]
    fn admin_only_route_rejects_plain_users() {
        assert!(authorize(&ADMIN_ONLY, Some(&identity(Role::Admin))).is_ok());
        let result = authorize(&ADMIN_ONLY, Some(&identity(Role::User)));
        assert!(matches!(result, Err(AppError::Forbidden)));
    }
}
