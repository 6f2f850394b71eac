// src/api/profile.rs

use actix_web::web::ReqData;
use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::AppState;
use crate::catalog;
use crate::error::AppError;
use crate::messaging::{self, ChatThread};
use crate::models::{ChatSummary, Milestone, UserMilestone};
use crate::profiles::{self, NewAddress, ProfileEdit, ProfileOverview, SellerRegistration};
use crate::progression::{self, ClaimOutcome};

#[utoipa::path(
    get,
    path = "/profile/",
    tag = "profile",
    responses((status = 200, description = "Points, level, counters and milestones", body = ProfileOverview))
)]
#[get("/")]
pub async fn overview(state: web::Data<AppState>, user_id: ReqData<i32>) -> Result<HttpResponse, AppError> {
    let view = profiles::profile_overview(&state.pool, user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/edit/")]
pub async fn edit(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    body: web::Json<ProfileEdit>,
) -> Result<HttpResponse, AppError> {
    let profile = profiles::edit_profile(&state.pool, user_id.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Profile updated",
        "profile": profile,
    })))
}

#[get("/addresses/")]
pub async fn addresses(state: web::Data<AppState>, user_id: ReqData<i32>) -> Result<HttpResponse, AppError> {
    let saved = profiles::list_addresses(&state.pool, user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "addresses": saved })))
}

#[post("/addresses/add/")]
pub async fn add_address(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    body: web::Json<NewAddress>,
) -> Result<HttpResponse, AppError> {
    let address = profiles::add_address(&state.pool, user_id.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "address": address })))
}

#[post("/addresses/{id}/delete/")]
pub async fn delete_address(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    profiles::delete_address(&state.pool, user_id.into_inner(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Address deleted" })))
}

#[post("/seller/register/")]
pub async fn register_seller(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    body: web::Json<SellerRegistration>,
) -> Result<HttpResponse, AppError> {
    let seller = profiles::register_seller(&state.pool, user_id.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "seller": seller })))
}

#[get("/wishlist/")]
pub async fn wishlist(state: web::Data<AppState>, user_id: ReqData<i32>) -> Result<HttpResponse, AppError> {
    let entries = catalog::list_wishlist(&state.pool, user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "wishlist": entries })))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MilestoneBoard {
    pub success: bool,
    pub points: i32,
    pub available: Vec<Milestone>,
    pub achieved: Vec<UserMilestone>,
}

#[utoipa::path(
    get,
    path = "/profile/milestones/",
    tag = "progression",
    responses((status = 200, description = "Active milestones and the ones already awarded", body = MilestoneBoard))
)]
#[get("/milestones/")]
pub async fn milestones(state: web::Data<AppState>, user_id: ReqData<i32>) -> Result<HttpResponse, AppError> {
    let user_id = user_id.into_inner();
    let profile = profiles::profile_overview(&state.pool, user_id).await?;
    let available = progression::list_milestones(&state.pool).await?;

    Ok(HttpResponse::Ok().json(MilestoneBoard {
        success: true,
        points: profile.profile.points,
        available,
        achieved: profile.milestones,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MilestoneClaimed {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub outcome: ClaimOutcome,
}

#[utoipa::path(
    post,
    path = "/profile/milestones/{id}/claim/",
    tag = "progression",
    params(("id" = i32, Path, description = "Milestone id")),
    responses(
        (status = 200, description = "Claimed, or success=false with too few points", body = MilestoneClaimed),
        (status = 404, description = "Unknown or inactive milestone")
    )
)]
#[post("/milestones/{id}/claim/")]
pub async fn claim_milestone(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let outcome = progression::claim_milestone(&state.pool, user_id.into_inner(), path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(MilestoneClaimed {
        success: true,
        message: format!("Milestone '{}' claimed", outcome.milestone.name),
        outcome,
    }))
}

#[utoipa::path(
    get,
    path = "/profile/chat/",
    tag = "chat",
    responses((status = 200, description = "Threads, most recently active first", body = [ChatSummary]))
)]
#[get("/chat/")]
pub async fn chats(state: web::Data<AppState>, user_id: ReqData<i32>) -> Result<HttpResponse, AppError> {
    let threads = messaging::list_chats(&state.pool, user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "chats": threads })))
}

#[utoipa::path(
    get,
    path = "/profile/chat/{id}/",
    tag = "chat",
    params(("id" = i32, Path, description = "Chat id")),
    responses(
        (status = 200, description = "Thread with messages oldest first; marks them read", body = ChatThread),
        (status = 404, description = "Not a participant")
    )
)]
#[get("/chat/{id}/")]
pub async fn chat_detail(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let thread = messaging::open_chat(&state.pool, path.into_inner(), user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(thread))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageBody {
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageSent {
    pub success: bool,
    pub message_id: i32,
}

#[utoipa::path(
    post,
    path = "/profile/chat/{id}/send/",
    tag = "chat",
    params(("id" = i32, Path, description = "Chat id")),
    request_body = SendMessageBody,
    responses(
        (status = 200, description = "Message stored", body = MessageSent),
        (status = 400, description = "Empty message"),
        (status = 404, description = "Not a participant")
    )
)]
#[post("/chat/{id}/send/")]
pub async fn send_message(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
    body: web::Json<SendMessageBody>,
) -> Result<HttpResponse, AppError> {
    let message =
        messaging::send_message(&state.pool, path.into_inner(), user_id.into_inner(), &body.content).await?;

    Ok(HttpResponse::Ok().json(MessageSent {
        success: true,
        message_id: message.id,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatStarted {
    pub success: bool,
    pub chat_id: i32,
    pub created: bool,
}

#[utoipa::path(
    post,
    path = "/profile/chat/start/{user_id}/",
    tag = "chat",
    params(("user_id" = i32, Path, description = "The other participant")),
    responses(
        (status = 200, description = "New or reused thread", body = ChatStarted),
        (status = 400, description = "Chat with yourself"),
        (status = 404, description = "Unknown user")
    )
)]
#[post("/chat/start/{user_id}/")]
pub async fn start_chat(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let start = messaging::start_chat(&state.pool, user_id.into_inner(), path.into_inner(), None).await?;

    Ok(HttpResponse::Ok().json(ChatStarted {
        success: true,
        chat_id: start.chat_id,
        created: start.created,
    }))
}

#[post("/chat/start/{user_id}/product/{product_id}/")]
pub async fn start_product_chat(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, AppError> {
    let (other_user_id, product_id) = path.into_inner();
    let start =
        messaging::start_chat(&state.pool, user_id.into_inner(), other_user_id, Some(product_id)).await?;

    Ok(HttpResponse::Ok().json(ChatStarted {
        success: true,
        chat_id: start.chat_id,
        created: start.created,
    }))
}
