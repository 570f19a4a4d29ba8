//! Checkout: turn every cart line into an order.
//!
//! The API has no checkout endpoint, so the storefront runs the conversion
//! itself, one line at a time and in cart order:
//!
//! 1. `POST /orders` for the line
//! 2. `DELETE /cart/{line}` once the order exists
//!
//! The first failure stops the run. A failed order create leaves that line and
//! every later one in the cart. A failed line delete would leave the same shoe
//! both ordered and in the cart, so the order just created is deleted again
//! before stopping. Lines converted earlier stay converted.

use tracing::{error, info, instrument, warn};

use ys_shoe_core::{CartLineId, OrderId, UserId};

use crate::api::{ApiError, ApiSession, CartLine, NewOrder, ShoeStoreApi};

/// A cart line that became an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedLine {
    pub line_id: CartLineId,
    /// Id of the new order, when the API reported one.
    pub order_id: Option<OrderId>,
}

/// What happened to the order created for a line whose removal failed.
#[derive(Debug)]
pub enum Compensation {
    /// The order was deleted again; the line is only in the cart.
    RolledBack,
    /// The API did not say which order it created, so nothing was deleted.
    Unavailable,
    /// Deleting the order failed too; the shoe is both ordered and in the cart.
    Failed(ApiError),
}

/// The step at which checkout stopped.
#[derive(Debug)]
pub enum CheckoutFailure {
    /// `POST /orders` failed for this line.
    CreateOrder { line_id: CartLineId, error: ApiError },
    /// The order was created but the cart line could not be deleted.
    RemoveLine {
        line_id: CartLineId,
        error: ApiError,
        compensation: Compensation,
    },
}

impl CheckoutFailure {
    /// Message shown to the shopper.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::CreateOrder { .. } => "Failed to create order",
            Self::RemoveLine {
                compensation: Compensation::RolledBack,
                ..
            } => "Failed to remove item",
            Self::RemoveLine { .. } => {
                "Failed to remove item. An order may have been placed for an item that is \
                 still in your cart; please check your orders."
            }
        }
    }

    /// Whether the cart and the orders now disagree about a line.
    #[must_use]
    pub const fn needs_attention(&self) -> bool {
        matches!(
            self,
            Self::RemoveLine {
                compensation: Compensation::Unavailable | Compensation::Failed(_),
                ..
            }
        )
    }
}

/// Outcome of a checkout run.
#[derive(Debug)]
pub struct CheckoutReport {
    pub converted: Vec<ConvertedLine>,
    pub failure: Option<CheckoutFailure>,
}

impl CheckoutReport {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Convert `lines` into orders for `customer`.
#[instrument(skip(api, session, lines), fields(customer_id = %customer, lines = lines.len()))]
pub async fn checkout(
    api: &dyn ShoeStoreApi,
    session: &ApiSession,
    customer: UserId,
    lines: &[CartLine],
) -> CheckoutReport {
    let mut converted = Vec::with_capacity(lines.len());

    for line in lines {
        let order_id = match api
            .create_order(session, &NewOrder::from_cart_line(customer, line))
            .await
        {
            Ok(order_id) => order_id,
            Err(error) => {
                warn!(line_id = %line.id, error = %error, "Order create failed, stopping checkout");
                return CheckoutReport {
                    converted,
                    failure: Some(CheckoutFailure::CreateOrder {
                        line_id: line.id,
                        error,
                    }),
                };
            }
        };

        if let Err(error) = api.delete_cart_line(session, line.id).await {
            warn!(line_id = %line.id, error = %error, "Cart line delete failed, compensating");
            let compensation = compensate(api, session, order_id).await;
            return CheckoutReport {
                converted,
                failure: Some(CheckoutFailure::RemoveLine {
                    line_id: line.id,
                    error,
                    compensation,
                }),
            };
        }

        converted.push(ConvertedLine {
            line_id: line.id,
            order_id,
        });
    }

    info!(orders = converted.len(), "Checkout complete");
    CheckoutReport {
        converted,
        failure: None,
    }
}

/// Delete the order created for a line that could not be removed.
async fn compensate(
    api: &dyn ShoeStoreApi,
    session: &ApiSession,
    order_id: Option<OrderId>,
) -> Compensation {
    let Some(order_id) = order_id else {
        error!("Order id unknown, cannot roll back order for unremoved cart line");
        return Compensation::Unavailable;
    };

    match api.delete_order(session, order_id).await {
        Ok(()) => Compensation::RolledBack,
        Err(e) => {
            error!(order_id = %order_id, error = %e, "Failed to roll back order");
            Compensation::Failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::Sequence;
    use mockall::predicate::eq;

    use super::*;
    use crate::api::MockShoeStoreApi;
    use ys_shoe_core::{Price, ShoeId};

    fn line(id: i64, shoe: i64, quantity: u32) -> CartLine {
        CartLine {
            id: CartLineId::new(id),
            customer_id: Some(UserId::new(42)),
            shoe_id: ShoeId::new(shoe),
            quantity,
            name: format!("Shoe {shoe}"),
            brand: "Bata".to_string(),
            size: "42".to_string(),
            color: "Black".to_string(),
            price: Price::parse_lenient("10"),
            stock: 10,
        }
    }

    fn api_error() -> ApiError {
        ApiError::Api {
            status: 500,
            message: String::new(),
        }
    }

    #[tokio::test]
    async fn test_checkout_converts_lines_in_order() {
        let mut api = MockShoeStoreApi::new();
        let mut seq = Sequence::new();

        for (line_id, shoe_id, order_id) in [(1, 3, 100), (2, 5, 101)] {
            api.expect_create_order()
                .withf(move |_, order| {
                    order.shoe_id == ShoeId::new(shoe_id) && order.customer_id == UserId::new(42)
                })
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_, _| Ok(Some(OrderId::new(order_id))));
            api.expect_delete_cart_line()
                .with(mockall::predicate::always(), eq(CartLineId::new(line_id)))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }

        let lines = [line(1, 3, 2), line(2, 5, 1)];
        let report = checkout(&api, &ApiSession::anonymous(), UserId::new(42), &lines).await;

        assert!(report.is_success());
        assert_eq!(
            report.converted,
            vec![
                ConvertedLine {
                    line_id: CartLineId::new(1),
                    order_id: Some(OrderId::new(100))
                },
                ConvertedLine {
                    line_id: CartLineId::new(2),
                    order_id: Some(OrderId::new(101))
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_checkout_stops_at_first_create_failure() {
        let mut api = MockShoeStoreApi::new();
        let mut seq = Sequence::new();

        api.expect_create_order()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Some(OrderId::new(100))));
        api.expect_delete_cart_line()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        api.expect_create_order()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(api_error()));
        api.expect_delete_order().never();

        let lines = [line(1, 3, 1), line(2, 5, 1), line(3, 7, 1)];
        let report = checkout(&api, &ApiSession::anonymous(), UserId::new(42), &lines).await;

        assert_eq!(report.converted.len(), 1);
        let failure = report.failure.unwrap_or_else(|| panic!("checkout should fail"));
        assert!(matches!(
            failure,
            CheckoutFailure::CreateOrder { line_id, .. } if line_id == CartLineId::new(2)
        ));
        assert_eq!(failure.message(), "Failed to create order");
        assert!(!failure.needs_attention());
    }

    #[tokio::test]
    async fn test_failed_line_delete_rolls_back_order() {
        let mut api = MockShoeStoreApi::new();
        let mut seq = Sequence::new();

        api.expect_create_order()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Some(OrderId::new(100))));
        api.expect_delete_cart_line()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(api_error()));
        api.expect_delete_order()
            .with(mockall::predicate::always(), eq(OrderId::new(100)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let lines = [line(1, 3, 1), line(2, 5, 1)];
        let report = checkout(&api, &ApiSession::anonymous(), UserId::new(42), &lines).await;

        assert!(report.converted.is_empty());
        let failure = report.failure.unwrap_or_else(|| panic!("checkout should fail"));
        assert!(matches!(
            failure,
            CheckoutFailure::RemoveLine {
                compensation: Compensation::RolledBack,
                ..
            }
        ));
        assert_eq!(failure.message(), "Failed to remove item");
    }

    #[tokio::test]
    async fn test_failed_rollback_needs_attention() {
        let mut api = MockShoeStoreApi::new();
        api.expect_create_order()
            .returning(|_, _| Ok(Some(OrderId::new(100))));
        api.expect_delete_cart_line()
            .returning(|_, _| Err(api_error()));
        api.expect_delete_order()
            .times(1)
            .returning(|_, _| Err(api_error()));

        let report = checkout(&api, &ApiSession::anonymous(), UserId::new(42), &[line(1, 3, 1)]).await;

        let failure = report.failure.unwrap_or_else(|| panic!("checkout should fail"));
        assert!(failure.needs_attention());
        assert!(failure.message().starts_with("Failed to remove item."));
    }

    #[tokio::test]
    async fn test_unknown_order_id_skips_rollback() {
        let mut api = MockShoeStoreApi::new();
        api.expect_create_order().returning(|_, _| Ok(None));
        api.expect_delete_cart_line()
            .returning(|_, _| Err(api_error()));
        api.expect_delete_order().never();

        let report = checkout(&api, &ApiSession::anonymous(), UserId::new(42), &[line(1, 3, 1)]).await;

        assert!(matches!(
            report.failure,
            Some(CheckoutFailure::RemoveLine {
                compensation: Compensation::Unavailable,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_empty_cart_makes_no_calls() {
        let api = MockShoeStoreApi::new();
        let report = checkout(&api, &ApiSession::anonymous(), UserId::new(42), &[]).await;
        assert!(report.is_success());
        assert!(report.converted.is_empty());
    }
}
