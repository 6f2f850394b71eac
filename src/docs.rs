use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::products::list_products,
        crate::api::products::product_detail,
        crate::api::products::list_categories,
        crate::api::products::create_listing,
        crate::api::products::edit_listing,
        crate::api::products::add_image,
        crate::api::products::toggle_wishlist,
        crate::api::cart::view,
        crate::api::cart::add,
        crate::api::cart::update,
        crate::api::cart::remove,
        crate::api::cart::clear,
        crate::api::orders::list,
        crate::api::orders::create,
        crate::api::orders::detail,
        crate::api::orders::cancel,
        crate::api::orders::track,
        crate::api::orders::refund,
        crate::api::orders::advance,
        crate::api::profile::overview,
        crate::api::profile::milestones,
        crate::api::profile::claim_milestone,
        crate::api::profile::chats,
        crate::api::profile::chat_detail,
        crate::api::profile::send_message,
        crate::api::profile::start_chat,
        crate::api::chatbot::chat
    ),
    components(
        schemas(
            crate::accounts::RegisterRequest,
            crate::accounts::LoginRequest,
            crate::api::auth::AuthResponse,
            crate::api::cart::CartItemBody,
            crate::api::cart::RemoveItemBody,
            crate::api::cart::CartView,
            crate::api::cart::CartChanged,
            crate::api::cart::CartUpdated,
            crate::api::orders::OrderCreated,
            crate::api::orders::StatusChanged,
            crate::api::orders::RefundBody,
            crate::api::orders::RefundRequested,
            crate::api::products::ProductList,
            crate::api::products::ListingCreated,
            crate::api::products::WishlistToggled,
            crate::api::profile::MilestoneBoard,
            crate::api::profile::MilestoneClaimed,
            crate::api::profile::SendMessageBody,
            crate::api::profile::MessageSent,
            crate::api::profile::ChatStarted,
            crate::api::chatbot::ChatbotRequest,
            crate::api::chatbot::ChatbotReply,
            crate::catalog::NewProduct,
            crate::catalog::ProductUpdate,
            crate::catalog::NewImage,
            crate::catalog::ProductDetail,
            crate::orders::CheckoutRequest,
            crate::orders::ShippingInfo,
            crate::orders::AdvanceRequest,
            crate::orders::OrderDetail,
            crate::orders::TrackingView,
            crate::profiles::ProfileOverview,
            crate::messaging::ChatThread,
            crate::models::Condition,
            crate::models::ProductStatus,
            crate::models::OrderStatus,
            crate::models::PaymentMethod,
            crate::models::PaymentStatus
        )
    ),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "catalog", description = "Public product browsing"),
        (name = "listings", description = "Seller listings, images, reviews and wishlist"),
        (name = "cart", description = "Shopping cart"),
        (name = "orders", description = "Checkout, tracking, cancellation and refunds"),
        (name = "profile", description = "Profile overview"),
        (name = "progression", description = "Points, levels and milestones"),
        (name = "chat", description = "Buyer-seller messaging"),
        (name = "support", description = "Support chatbot")
    )
)]
pub struct ApiDoc;
