// src/support.rs

use crate::api::gemini_client::GeminiClient;
use crate::config::GeminiConfig;

pub const MARKETPLACE_CONTEXT: &str = "\
You are an AI assistant for EcoFinds, an eco-friendly marketplace for second-hand products.
EcoFinds specializes in:
- Second-hand clothing, electronics, furniture, books, and other items
- Promoting sustainability and reducing waste
- Connecting buyers and sellers in an eco-conscious community
- Quality assurance with condition ratings (Excellent, Good, Fair, Poor)
- Competitive pricing for pre-owned items

Please provide helpful, friendly, and informative responses about product recommendations,
the sustainability benefits of buying second-hand, shopping tips, and the platform itself.
Keep responses concise and focused on sustainable shopping.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Greeting,
    Search,
    Sustainability,
    Pricing,
    Condition,
    Shipping,
    Returns,
    Account,
    Help,
}

/// Checked in order; the first topic with a matching keyword wins.
const TOPICS: &[(Topic, &[&str])] = &[
    (Topic::Greeting, &["hello", "hi", "hey", "greetings"]),
    (Topic::Search, &["search", "find", "looking for", "need", "want"]),
    (
        Topic::Sustainability,
        &["eco", "sustainable", "sustainability", "environment", "green", "recycle"],
    ),
    (
        Topic::Pricing,
        &["price", "prices", "cost", "expensive", "cheap", "affordable"],
    ),
    (Topic::Condition, &["condition", "quality", "used", "damaged", "wear"]),
    (Topic::Shipping, &["shipping", "delivery", "ship", "send"]),
    (Topic::Returns, &["return", "returns", "refund", "exchange", "problem"]),
    (Topic::Account, &["account", "profile", "login", "register"]),
    (Topic::Help, &["help", "support", "assistance", "how"]),
];

fn words(message: &str) -> Vec<String> {
    message
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn mentions(words: &[String], keyword: &str) -> bool {
    let phrase: Vec<&str> = keyword.split_whitespace().collect();
    words
        .windows(phrase.len())
        .any(|window| window.iter().zip(&phrase).all(|(w, p)| w == p))
}

/// Single-word keywords match whole words only; multi-word keywords match
/// as consecutive words.
pub fn classify(message: &str) -> Option<Topic> {
    let words = words(message);
    TOPICS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| mentions(&words, k)))
        .map(|(topic, _)| *topic)
}

pub fn fallback_response(message: &str) -> String {
    let canned = match classify(message) {
        Some(Topic::Greeting) => {
            "Hello! Welcome to EcoFinds. I'm here to help you find great second-hand products and answer questions about sustainable shopping. How can I assist you today?"
        }
        Some(Topic::Search) => {
            "I can help you find products on EcoFinds! We have a wide selection of second-hand items including clothing, electronics, furniture, and more. What type of product are you looking for?"
        }
        Some(Topic::Sustainability) => {
            "Great question! Buying second-hand gives items a new life. It reduces waste, saves resources, and helps build a circular economy."
        }
        Some(Topic::Pricing) => {
            "Our products are competitively priced second-hand items, typically 30-70% less than retail prices. Prices vary based on condition, brand, and demand. You can filter products by price range to find items within your budget."
        }
        Some(Topic::Condition) => {
            "Every product is rated Excellent (like new), Good (minor wear), Fair (moderate wear) or Poor (significant wear but functional). Each listing includes a condition description and photos."
        }
        Some(Topic::Shipping) => {
            "Shipping costs and delivery times depend on your location and the seller's location. You can follow every order from the tracking page once it ships."
        }
        Some(Topic::Returns) => {
            "If you're not satisfied with your purchase, you can request a refund from the order page. Our support team reviews every request."
        }
        Some(Topic::Account) => {
            "You can manage your account, addresses and seller details from your profile page. If you need help with login or registration, I can guide you through the process."
        }
        Some(Topic::Help) => {
            "I'm here to help! You can ask me about products, pricing, shipping, returns, or any other questions about EcoFinds. What would you like to know?"
        }
        None => {
            return format!(
                "I understand you're asking about: '{message}'. Could you please provide more details so I can help you better? You can also browse our categories or search for products using keywords."
            );
        }
    };

    canned.to_string()
}

/// Answers support questions with Gemini when configured, and with the
/// scripted responder otherwise or whenever the AI call fails.
#[derive(Debug, Clone, Default)]
pub struct SupportResponder {
    gemini: Option<GeminiClient>,
}

impl SupportResponder {
    pub fn new(gemini: Option<GeminiClient>) -> Self {
        Self { gemini }
    }

    pub fn fallback_only() -> Self {
        Self { gemini: None }
    }

    /// A client that cannot be built leaves the responder on the fallback.
    pub fn from_config(config: Option<&GeminiConfig>) -> Self {
        let gemini = config.and_then(|cfg| match GeminiClient::new(cfg) {
            Ok(client) => Some(client),
            Err(e) => {
                log::warn!("gemini client unavailable, using scripted responses: {e}");
                None
            }
        });

        Self { gemini }
    }

    pub fn is_ai_enabled(&self) -> bool {
        self.gemini.is_some()
    }

    pub async fn respond(&self, message: &str) -> String {
        let Some(client) = &self.gemini else {
            return fallback_response(message);
        };

        let prompt = format!("{MARKETPLACE_CONTEXT}\n\nUser question: {message}");
        match client.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("gemini request failed, using fallback: {e}");
                fallback_response(message)
            }
        }
    }
}
