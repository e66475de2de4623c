//! Callback-query payload vocabulary
//!
//! Inline-keyboard payloads are flat prefixed strings on the wire; they are
//! parsed into a typed action as early as possible so the rest of the code
//! never string-matches. Unrecognized payloads parse to `None` and are
//! ignored by the router, not treated as errors.

use std::fmt;

/// Payment options offered at the last checkout step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    Bank,
}

impl PaymentMethod {
    /// Value stored on the order record and shown to the admin
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Наличные при получении",
            PaymentMethod::Bank => "Перевод на карту",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parsed inline-keyboard action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Open the first product page of a category
    OpenCategory { category_id: String },
    /// Jump to a specific product page within a category
    CategoryPage { category_id: String, page: usize },
    ShowProduct { product_id: String },
    AddToCart { product_id: String },
    Checkout,
    Payment { method: PaymentMethod },
    /// Admin affordance: start composing a reply to a support ticket
    SupportReply { ticket_id: String },
    BackToCatalog,
    /// Inert label button (e.g. the page indicator)
    Noop,
}

impl CallbackAction {
    /// Parse a raw callback payload against the fixed prefix vocabulary
    pub fn parse(data: &str) -> Option<CallbackAction> {
        if let Some(category_id) = data.strip_prefix("category_") {
            if category_id.is_empty() {
                return None;
            }
            return Some(CallbackAction::OpenCategory { category_id: category_id.to_string() });
        }
        if let Some(rest) = data.strip_prefix("catpage_") {
            // Page number is the last underscore-separated field; the
            // category id itself never contains underscores
            let (category_id, page) = rest.rsplit_once('_')?;
            if category_id.is_empty() {
                return None;
            }
            let page = page.parse().ok()?;
            return Some(CallbackAction::CategoryPage { category_id: category_id.to_string(), page });
        }
        if let Some(product_id) = data.strip_prefix("add_to_cart_") {
            if product_id.is_empty() {
                return None;
            }
            return Some(CallbackAction::AddToCart { product_id: product_id.to_string() });
        }
        if let Some(product_id) = data.strip_prefix("product_") {
            if product_id.is_empty() {
                return None;
            }
            return Some(CallbackAction::ShowProduct { product_id: product_id.to_string() });
        }
        if let Some(ticket_id) = data.strip_prefix("support_reply_") {
            if ticket_id.is_empty() {
                return None;
            }
            return Some(CallbackAction::SupportReply { ticket_id: ticket_id.to_string() });
        }
        match data {
            "checkout" => Some(CallbackAction::Checkout),
            "payment_cash" => Some(CallbackAction::Payment { method: PaymentMethod::Cash }),
            "payment_bank" => Some(CallbackAction::Payment { method: PaymentMethod::Bank }),
            "back_to_catalog" => Some(CallbackAction::BackToCatalog),
            "noop" => Some(CallbackAction::Noop),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_payloads() {
        assert_eq!(
            CallbackAction::parse("category_c1"),
            Some(CallbackAction::OpenCategory { category_id: "c1".into() })
        );
        assert_eq!(
            CallbackAction::parse("catpage_c1_2"),
            Some(CallbackAction::CategoryPage { category_id: "c1".into(), page: 2 })
        );
        assert_eq!(
            CallbackAction::parse("product_p9"),
            Some(CallbackAction::ShowProduct { product_id: "p9".into() })
        );
        assert_eq!(
            CallbackAction::parse("add_to_cart_p9"),
            Some(CallbackAction::AddToCart { product_id: "p9".into() })
        );
        assert_eq!(
            CallbackAction::parse("support_reply_t3"),
            Some(CallbackAction::SupportReply { ticket_id: "t3".into() })
        );
    }

    #[test]
    fn parses_bare_payloads() {
        assert_eq!(CallbackAction::parse("checkout"), Some(CallbackAction::Checkout));
        assert_eq!(
            CallbackAction::parse("payment_cash"),
            Some(CallbackAction::Payment { method: PaymentMethod::Cash })
        );
        assert_eq!(
            CallbackAction::parse("payment_bank"),
            Some(CallbackAction::Payment { method: PaymentMethod::Bank })
        );
        assert_eq!(CallbackAction::parse("back_to_catalog"), Some(CallbackAction::BackToCatalog));
        assert_eq!(CallbackAction::parse("noop"), Some(CallbackAction::Noop));
    }

    #[test]
    fn unrecognized_payloads_are_ignored() {
        assert_eq!(CallbackAction::parse(""), None);
        assert_eq!(CallbackAction::parse("category_"), None);
        assert_eq!(CallbackAction::parse("catpage_c1_abc"), None);
        assert_eq!(CallbackAction::parse("catpage_c1"), None);
        assert_eq!(CallbackAction::parse("payment_crypto"), None);
        assert_eq!(CallbackAction::parse("cart_plus_p1"), None);
        assert_eq!(CallbackAction::parse("something_else"), None);
    }

    #[test]
    fn add_to_cart_wins_over_shorter_prefixes() {
        // "add_to_cart_" must be tried before any hypothetical "add_" prefix
        assert_eq!(
            CallbackAction::parse("add_to_cart_product_1"),
            Some(CallbackAction::AddToCart { product_id: "product_1".into() })
        );
    }
}
