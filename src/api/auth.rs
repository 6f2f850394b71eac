// src/api/auth.rs

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage, HttpResponse, post, web};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use serde::Serialize;
use std::task::{Context, Poll};
use utoipa::ToSchema;

use crate::AppState;
use crate::accounts::{self, LoginRequest, RegisterRequest};
use crate::error::AppError;

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i32,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User and profile created", body = AuthResponse),
        (status = 400, description = "Missing or invalid fields")
    )
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = accounts::register_user(&state.pool, &payload).await?;
    let token = accounts::issue_token(&state.jwt_secret, user_id)?;

    Ok(HttpResponse::Ok().json(AuthResponse { token, user_id }))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = accounts::authenticate(&state.pool, &payload).await?;
    let token = accounts::issue_token(&state.jwt_secret, user_id)?;

    Ok(HttpResponse::Ok().json(AuthResponse { token, user_id }))
}

/// Middleware that:
/// - reads `Authorization: Bearer <jwt>`
/// - validates it against the secret in `AppState`
/// - puts the `i32` user id into `req.extensions_mut()`
pub struct JwtMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtMiddlewareInner<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareInner { service }))
    }
}

pub struct JwtMiddlewareInner<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareInner<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            log::error!("jwt middleware mounted without AppState");
            let err = Error::from(AppError::Unauthorized("Authentication unavailable"));
            return Box::pin(async move { Err(err) });
        };

        let token = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));

        let Some(token) = token else {
            let err = Error::from(AppError::Unauthorized("Missing or invalid Authorization header"));
            return Box::pin(async move { Err(err) });
        };

        let decoded = accounts::decode_token(&state.jwt_secret, token);

        match decoded {
            Ok(user_id) => {
                req.extensions_mut().insert(user_id);
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(e) => {
                let err = Error::from(e);
                Box::pin(async move { Err(err) })
            }
        }
    }
}
