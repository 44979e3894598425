//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAuth, ShopperSession};
use crate::routes::Layout;
use crate::routes::products::{ListingControls, ListingQuery};
use crate::routes::views::ProductCard;
use crate::routes::wishlist::load_wishlist;
use crate::state::AppState;

// =============================================================================
// Static content
// =============================================================================

/// A question in the FAQ accordion.
pub struct Faq {
    pub question: &'static str,
    pub answer: &'static str,
}

pub const FAQS: &[Faq] = &[
    Faq {
        question: "What payment methods do you accept?",
        answer: "We accept UPI payments (PhonePe, Google Pay, etc.), Net Banking, and Cash on \
                 Delivery (COD). For online payments, please share the payment screenshot via \
                 WhatsApp.",
    },
    Faq {
        question: "What is your return/exchange policy?",
        answer: "We have a strict no returns/exchanges policy. Please check all product details, \
                 colors, and sizes carefully before placing your order. We share detailed \
                 product videos on WhatsApp to help you make the right choice.",
    },
    Faq {
        question: "How long does delivery take?",
        answer: "Orders within Hyderabad are delivered within 1-3 business days. For other \
                 cities, delivery takes 5-7 business days depending on the location.",
    },
    Faq {
        question: "Is Cash on Delivery available?",
        answer: "Yes, Cash on Delivery is available for all orders across India. COD orders \
                 require a confirmation call before dispatch.",
    },
    Faq {
        question: "How can I track my order?",
        answer: "Once your order is dispatched, we will share the tracking details via \
                 WhatsApp. You can also contact us anytime for order updates.",
    },
    Faq {
        question: "Are the product colors accurate?",
        answer: "We try our best to capture accurate colors, but slight variations may occur \
                 due to screen settings. Contact us on WhatsApp for live videos of products.",
    },
];

pub const TRUST_BADGES: [&str; 4] = [
    "SSL Secured",
    "Verified Store",
    "Secure Checkout",
    "5-Star Rated",
];

// =============================================================================
// Handler
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCard>,
    pub featured: Vec<ProductCard>,
    pub controls: ListingControls,
    pub faqs: &'static [Faq],
    pub badges: [&'static str; 4],
    /// Digits only, for `tel:` links.
    pub phone: String,
}

/// Featured products shown above New Arrivals.
const FEATURED_LIMIT: usize = 4;

/// Display the home page.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    layout: Layout,
    OptionalAuth(user): OptionalAuth,
    session: ShopperSession,
    Query(query): Query<ListingQuery>,
) -> Result<HomeTemplate, AppError> {
    let (wishlist, _) = load_wishlist(&state, &session, user.as_ref()).await;
    let number = &state.config().store.whatsapp_number;

    let catalog = state.catalog();
    let filter = query.filter();
    let sort = query.sort();
    let arrivals = catalog.new_arrivals(&filter, sort).await;
    let featured = catalog.featured(FEATURED_LIMIT).await;
    let controls = ListingControls::new(&state, &query, "/").await;

    Ok(HomeTemplate {
        layout,
        products: ProductCard::list(&arrivals, Some(&wishlist), number),
        featured: ProductCard::list(&featured, Some(&wishlist), number),
        controls,
        faqs: FAQS,
        badges: TRUST_BADGES,
        phone: local_number(number),
    })
}

/// Drop the country code from a WhatsApp number for display and `tel:`.
fn local_number(number: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    match digits.strip_prefix("91") {
        Some(rest) if rest.len() == 10 => rest.to_owned(),
        _ => digits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_number_strips_country_code() {
        assert_eq!(local_number("917680924488"), "7680924488");
        assert_eq!(local_number("+91 76809 24488"), "7680924488");
        assert_eq!(local_number("7680924488"), "7680924488");
    }
}
