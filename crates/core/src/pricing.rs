//! Tiered unit-price and visibility resolution.
//!
//! Both functions are pure and constant time; the order assembler calls them
//! once per cart line with the identity loaded for the current request.

use rust_decimal::Decimal;

use crate::types::{DealerTier, PriceTable, UserIdentity, UserType, Visibility};

/// Errors raised while resolving a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// A dealer account without a tier. Treated as a data problem rather
    /// than silently charging retail.
    #[error("dealer account has no dealer tier")]
    MissingDealerTier,
}

/// Unit price the given user pays for a product.
///
/// Anonymous shoppers, customers and franchise accounts pay retail. Admin and
/// supplier accounts also get retail; they manage rather than purchase.
/// Dealers pay the column matching their tier.
///
/// # Errors
///
/// Returns [`PricingError::MissingDealerTier`] for a dealer with no tier.
pub fn resolve_price(
    prices: &PriceTable,
    user: Option<&UserIdentity>,
) -> Result<Decimal, PricingError> {
    let Some(user) = user else {
        return Ok(prices.retail);
    };

    match user.user_type {
        UserType::Customer | UserType::Franchise | UserType::Admin | UserType::Supplier => {
            Ok(prices.retail)
        }
        UserType::Dealer => match user.dealer_tier {
            Some(DealerTier::Small) => Ok(prices.dealer_small),
            Some(DealerTier::Medium) => Ok(prices.dealer_medium),
            Some(DealerTier::Large) => Ok(prices.dealer_large),
            Some(DealerTier::MainDealer) => Ok(prices.dealer_main),
            None => Err(PricingError::MissingDealerTier),
        },
    }
}

/// Whether the given user may see (and therefore order) a product.
#[must_use]
pub fn resolve_visibility(visibility: &Visibility, user: Option<&UserIdentity>) -> bool {
    let Some(user) = user else {
        return visibility.customer;
    };

    match user.user_type {
        UserType::Customer | UserType::Franchise => visibility.customer,
        UserType::Dealer if user.dealer_tier == Some(DealerTier::MainDealer) => {
            visibility.dealer || visibility.dealer_main
        }
        UserType::Dealer => visibility.dealer,
        UserType::Admin | UserType::Supplier => true,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::UserId;

    fn table() -> PriceTable {
        PriceTable {
            retail: Decimal::from(100),
            dealer_small: Decimal::from(95),
            dealer_medium: Decimal::from(90),
            dealer_large: Decimal::from(80),
            dealer_main: Decimal::from(70),
        }
    }

    fn user(user_type: UserType, dealer_tier: Option<DealerTier>) -> UserIdentity {
        UserIdentity {
            id: UserId::new(1),
            user_type,
            dealer_tier,
        }
    }

    #[test]
    fn test_anonymous_and_customer_pay_retail() {
        let prices = table();
        assert_eq!(resolve_price(&prices, None).unwrap(), Decimal::from(100));
        let customer = user(UserType::Customer, None);
        assert_eq!(
            resolve_price(&prices, Some(&customer)).unwrap(),
            Decimal::from(100)
        );
    }

    #[test]
    fn test_dealer_tiers_select_their_column() {
        let prices = table();
        let cases = [
            (DealerTier::Small, 95),
            (DealerTier::Medium, 90),
            (DealerTier::Large, 80),
            (DealerTier::MainDealer, 70),
        ];
        for (tier, expected) in cases {
            let dealer = user(UserType::Dealer, Some(tier));
            assert_eq!(
                resolve_price(&prices, Some(&dealer)).unwrap(),
                Decimal::from(expected),
                "tier {tier}"
            );
        }
    }

    #[test]
    fn test_managing_roles_pay_retail() {
        let prices = table();
        for user_type in [UserType::Admin, UserType::Supplier, UserType::Franchise] {
            let u = user(user_type, None);
            assert_eq!(resolve_price(&prices, Some(&u)).unwrap(), prices.retail);
        }
    }

    #[test]
    fn test_dealer_without_tier_is_rejected() {
        let dealer = user(UserType::Dealer, None);
        assert_eq!(
            resolve_price(&table(), Some(&dealer)),
            Err(PricingError::MissingDealerTier)
        );
    }

    #[test]
    fn test_price_always_comes_from_the_table() {
        let prices = table();
        let columns = [
            prices.retail,
            prices.dealer_small,
            prices.dealer_medium,
            prices.dealer_large,
            prices.dealer_main,
        ];
        let tiers = [
            None,
            Some(DealerTier::Small),
            Some(DealerTier::Medium),
            Some(DealerTier::Large),
            Some(DealerTier::MainDealer),
        ];
        for user_type in [
            UserType::Customer,
            UserType::Dealer,
            UserType::Admin,
            UserType::Franchise,
            UserType::Supplier,
        ] {
            for tier in tiers {
                let u = user(user_type, tier);
                if let Ok(price) = resolve_price(&prices, Some(&u)) {
                    assert!(columns.contains(&price));
                }
            }
        }
    }

    #[test]
    fn test_visibility_by_segment() {
        let dealer_only = Visibility {
            customer: false,
            dealer: true,
            dealer_main: false,
        };
        assert!(!resolve_visibility(&dealer_only, None));
        assert!(!resolve_visibility(
            &dealer_only,
            Some(&user(UserType::Customer, None))
        ));
        assert!(resolve_visibility(
            &dealer_only,
            Some(&user(UserType::Dealer, Some(DealerTier::Small)))
        ));
        assert!(resolve_visibility(
            &dealer_only,
            Some(&user(UserType::Admin, None))
        ));
    }

    #[test]
    fn test_main_dealer_sees_main_dealer_products() {
        let main_only = Visibility {
            customer: false,
            dealer: false,
            dealer_main: true,
        };
        assert!(resolve_visibility(
            &main_only,
            Some(&user(UserType::Dealer, Some(DealerTier::MainDealer)))
        ));
        assert!(!resolve_visibility(
            &main_only,
            Some(&user(UserType::Dealer, Some(DealerTier::Large)))
        ));
        assert!(resolve_visibility(
            &main_only,
            Some(&user(UserType::Supplier, None))
        ));
    }
}
