//! Which storefront tabs a shopper may open.

use serde::{Deserialize, Serialize};

/// Shopper authentication level as reported by the customer service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    #[default]
    Guest,
    Registered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Home,
    Search,
    Wishlist,
    Cart,
    Customer,
    Login,
}

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(Screen),
}

/// Decide whether `auth` may open `screen`.
pub fn resolve(screen: Screen, auth: AuthType) -> Access {
    match (screen, auth) {
        (Screen::Wishlist | Screen::Customer, AuthType::Guest) => Access::Redirect(Screen::Login),
        (Screen::Login, AuthType::Registered) => Access::Redirect(Screen::Customer),
        _ => Access::Allow,
    }
}

/// Badge text for the cart tab; hidden for an empty basket.
pub fn basket_badge(item_count: u32) -> Option<String> {
    match item_count {
        0 => None,
        n => Some(n.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_is_sent_to_login() {
        assert_eq!(
            resolve(Screen::Wishlist, AuthType::Guest),
            Access::Redirect(Screen::Login)
        );
        assert_eq!(
            resolve(Screen::Customer, AuthType::Guest),
            Access::Redirect(Screen::Login)
        );
        assert_eq!(resolve(Screen::Login, AuthType::Guest), Access::Allow);
        assert_eq!(resolve(Screen::Search, AuthType::Guest), Access::Allow);
    }

    #[test]
    fn test_registered_skips_login() {
        assert_eq!(
            resolve(Screen::Login, AuthType::Registered),
            Access::Redirect(Screen::Customer)
        );
        assert_eq!(resolve(Screen::Wishlist, AuthType::Registered), Access::Allow);
        assert_eq!(resolve(Screen::Cart, AuthType::Registered), Access::Allow);
    }

    #[test]
    fn test_basket_badge() {
        assert_eq!(basket_badge(0), None);
        assert_eq!(basket_badge(3).as_deref(), Some("3"));
    }
}
