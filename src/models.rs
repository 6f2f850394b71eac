// src/models.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;

/// A TEXT column held a value none of the enum variants spell.
#[derive(Debug, Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Enums stored as TEXT with a CHECK constraint. The column text, the JSON
/// spelling and `as_str` are the same string.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

text_enum!(Condition {
    Excellent => "excellent",
    Good => "good",
    Fair => "fair",
    Poor => "poor",
});

text_enum!(ProductStatus {
    Available => "available",
    Sold => "sold",
    Pending => "pending",
    Draft => "draft",
});

text_enum!(
    /// Order lifecycle: pending -> confirmed -> shipped -> delivered, with
    /// cancelled and returned as terminal side branches.
    OrderStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        Shipped => "shipped",
        Delivered => "delivered",
        Cancelled => "cancelled",
        Returned => "returned",
    }
);

impl OrderStatus {
    pub fn is_cancellable(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Forward moves a seller may make while fulfilling an order.
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Confirmed, OrderStatus::Shipped)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
                | (OrderStatus::Delivered, OrderStatus::Returned)
        )
    }
}

text_enum!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

text_enum!(PaymentMethod {
    CashOnDelivery => "cash_on_delivery",
    Online => "online",
    Upi => "upi",
    Card => "card",
});

text_enum!(RefundStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Processed => "processed",
});

text_enum!(RewardType {
    Badge => "badge",
    Discount => "discount",
    Feature => "feature",
    Title => "title",
});

text_enum!(AddressType {
    Home => "home",
    Work => "work",
    Other => "other",
});

text_enum!(BusinessType {
    Individual => "individual",
    Business => "business",
    Organization => "organization",
});

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserProfile {
    pub id: i32,
    pub user_id: i32,
    pub phone: String,
    pub bio: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub points: i32,
    pub level: i32,
    pub total_products_sold: i32,
    pub total_products_listed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SellerProfile {
    pub id: i32,
    pub user_id: i32,
    pub business_name: String,
    #[sqlx(try_from = "String")]
    pub business_type: BusinessType,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Address {
    pub id: i32,
    pub user_id: i32,
    #[sqlx(try_from = "String")]
    pub address_type: AddressType,
    pub name: String,
    pub phone: String,
    pub address_line_1: String,
    pub address_line_2: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Product {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub category_id: i32,
    pub seller_id: i32,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    #[sqlx(try_from = "String")]
    pub condition: Condition,
    pub brand: String,
    #[sqlx(try_from = "String")]
    pub status: ProductStatus,
    pub is_featured: bool,
    pub city: String,
    pub state: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whole-percent markdown from the original price, 0 when there is none.
    pub fn discount_percentage(&self) -> u32 {
        discount_percentage(self.price, self.original_price)
    }
}

pub fn discount_percentage(price: Decimal, original_price: Option<Decimal>) -> u32 {
    match original_price {
        Some(original) if original > price && original > Decimal::ZERO => {
            ((original - price) / original * Decimal::ONE_HUNDRED)
                .round()
                .to_u32()
                .unwrap_or(0)
        }
        _ => 0,
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ProductImage {
    pub id: i32,
    pub product_id: i32,
    pub image_url: String,
    pub alt_text: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ProductReview {
    pub id: i32,
    pub product_id: i32,
    pub user_id: i32,
    pub username: String,
    pub rating: i32,
    pub title: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct WishlistEntry {
    pub product_id: i32,
    pub title: String,
    pub slug: String,
    pub price: Decimal,
    pub added_at: DateTime<Utc>,
}

/// One cart line joined with the product's current price.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CartLine {
    pub product_id: i32,
    pub title: String,
    pub slug: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl CartLine {
    pub fn total_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Cart {
    pub id: i32,
    pub user_id: i32,
    pub items: Vec<CartLine>,
}

impl Cart {
    pub fn total_items(&self) -> i64 {
        self.items.iter().map(|line| i64::from(line.quantity)).sum()
    }

    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartLine::total_price).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Order {
    pub id: i32,
    pub order_number: String,
    pub user_id: i32,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    #[sqlx(try_from = "String")]
    pub payment_method: PaymentMethod,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub shipping_name: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_pincode: String,
    pub shipping_country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// `price` is the unit price frozen at checkout.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub title: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl OrderItem {
    pub fn total_price(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TrackingEntry {
    pub id: i32,
    pub order_id: i32,
    pub status: String,
    pub description: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Refund {
    pub id: i32,
    pub order_id: i32,
    pub reason: String,
    #[sqlx(try_from = "String")]
    pub status: RefundStatus,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Milestone {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub points_required: i32,
    #[sqlx(try_from = "String")]
    pub reward_type: RewardType,
    pub reward_value: String,
    pub icon: String,
    pub is_active: bool,
}

/// A milestone as awarded to one user.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserMilestone {
    pub milestone_id: i32,
    pub name: String,
    pub points_required: i32,
    #[sqlx(try_from = "String")]
    pub reward_type: RewardType,
    pub reward_value: String,
    pub achieved_at: DateTime<Utc>,
    pub is_claimed: bool,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Chat {
    pub id: i32,
    pub product_id: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Message {
    pub id: i32,
    pub chat_id: i32,
    pub sender_id: i32,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ChatSummary {
    pub chat_id: i32,
    pub other_user_id: i32,
    pub other_username: String,
    pub product_id: Option<i32>,
    pub product_title: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
    pub updated_at: DateTime<Utc>,
}
