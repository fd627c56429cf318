use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub exp: usize,
    pub role: String,
    /// Tenant scope; TPO reads are restricted to this college.
    pub college_id: Option<Uuid>,
}

fn decode_bearer(req: &Request) -> std::result::Result<Claims, Response> {
    let unauthorized = |code: &str| {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
    };

    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err(unauthorized("missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(unauthorized("bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(unauthorized("unsupported_scheme"));
    };

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| unauthorized("invalid_token"))
}

async fn require_roles(mut req: Request, next: Next, allowed: &[&str]) -> Response {
    let claims = match decode_bearer(&req) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };
    if !allowed.iter().any(|r| r.eq_ignore_ascii_case(&claims.role)) {
        return (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"}))).into_response();
    }
    req.extensions_mut().insert(claims);
    next.run(req).await
}

pub async fn require_student(req: Request, next: Next) -> Response {
    require_roles(req, next, &["student"]).await
}

pub async fn require_tpo_or_admin(req: Request, next: Next) -> Response {
    require_roles(req, next, &["tpo", "admin"]).await
}
