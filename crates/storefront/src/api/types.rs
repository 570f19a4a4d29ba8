//! Records exchanged with the shoe store REST API.
//!
//! Responses use the API's uppercase column names (`ID`, `NAME`, ...). Request
//! bodies use lowercase snake case. Fields are decoded leniently: the API is
//! backed by a SQL database whose drivers serialize booleans as `0`/`1` and
//! sizes as either numbers or strings.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};

use ys_shoe_core::{CartLineId, Email, LineQuantity, OrderId, Price, Rating, ShoeId, UserId};

// =============================================================================
// Entities
// =============================================================================

/// A registered customer or administrator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    #[serde(rename = "ID")]
    pub id: UserId,
    #[serde(rename = "NAME", default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "EMAIL", default, deserialize_with = "lenient::text")]
    pub email: String,
    #[serde(rename = "ISADMIN", default, deserialize_with = "lenient::flag")]
    pub is_admin: bool,
}

/// A shoe in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Shoe {
    #[serde(rename = "ID")]
    pub id: ShoeId,
    #[serde(rename = "NAME", default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "BRAND", default, deserialize_with = "lenient::text")]
    pub brand: String,
    #[serde(rename = "SIZE", default, deserialize_with = "lenient::text")]
    pub size: String,
    #[serde(rename = "COLOR", default, deserialize_with = "lenient::text")]
    pub color: String,
    #[serde(rename = "PRICE", default)]
    pub price: Price,
    /// Units in stock.
    #[serde(rename = "QUANTITY", default, deserialize_with = "lenient::count")]
    pub stock: u32,
    #[serde(rename = "DESCRIPTION", default, deserialize_with = "lenient::text")]
    pub description: String,
}

/// A persisted cart line, denormalized with the shoe fields needed for display.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CartLine {
    #[serde(rename = "ID")]
    pub id: CartLineId,
    #[serde(rename = "CUSTOMER_ID", default)]
    pub customer_id: Option<UserId>,
    #[serde(rename = "SHOE_ID")]
    pub shoe_id: ShoeId,
    #[serde(rename = "CART_QUANTITY", default, deserialize_with = "lenient::count")]
    pub quantity: u32,
    #[serde(rename = "NAME", default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "BRAND", default, deserialize_with = "lenient::text")]
    pub brand: String,
    #[serde(rename = "SIZE", default, deserialize_with = "lenient::text")]
    pub size: String,
    #[serde(rename = "COLOR", default, deserialize_with = "lenient::text")]
    pub color: String,
    #[serde(rename = "PRICE", default)]
    pub price: Price,
    #[serde(rename = "STOCK_QUANTITY", default, deserialize_with = "lenient::count")]
    pub stock: u32,
}

impl CartLine {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }

    /// Stepping bounds for the quantity controls.
    #[must_use]
    pub const fn bounds(&self) -> LineQuantity {
        LineQuantity::new(self.quantity, self.stock)
    }
}

/// A placed order for a single shoe.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Order {
    #[serde(rename = "ID")]
    pub id: OrderId,
    #[serde(rename = "CUSTOMER_ID")]
    pub customer_id: UserId,
    #[serde(rename = "SHOE_ID")]
    pub shoe_id: ShoeId,
    #[serde(rename = "QUANTITY", default, deserialize_with = "lenient::count")]
    pub quantity: u32,
}

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCartLine {
    pub customer_id: UserId,
    pub shoe_id: ShoeId,
    pub quantity: u32,
}

impl NewCartLine {
    /// One unit of `shoe_id` for `customer_id`, as every "Add to Cart" button sends.
    #[must_use]
    pub const fn single(customer_id: UserId, shoe_id: ShoeId) -> Self {
        Self {
            customer_id,
            shoe_id,
            quantity: 1,
        }
    }
}

/// Body of `PUT /cart/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuantityUpdate {
    pub quantity: u32,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub customer_id: UserId,
    pub shoe_id: ShoeId,
    pub quantity: u32,
}

impl NewOrder {
    /// The order that replaces `line` at checkout.
    #[must_use]
    pub const fn from_cart_line(customer_id: UserId, line: &CartLine) -> Self {
        Self {
            customer_id,
            shoe_id: line.shoe_id,
            quantity: line.quantity,
        }
    }
}

/// Body of `POST /feedback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFeedback {
    pub customer_id: UserId,
    pub rating: Rating,
    pub comment: String,
}

/// Body of `POST /login`.
///
/// The password is kept in a [`SecretString`] and only exposed while the body
/// is serialized.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: Email,
    pub password: SecretString,
}

impl Serialize for LoginRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = serializer.serialize_struct("LoginRequest", 2)?;
        body.serialize_field("email", self.email.as_str())?;
        body.serialize_field("password", self.password.expose_secret())?;
        body.end()
    }
}

/// Body of `POST /customers`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    pub password: SecretString,
}

impl Serialize for Registration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = serializer.serialize_struct("Registration", 3)?;
        body.serialize_field("name", &self.name)?;
        body.serialize_field("email", self.email.as_str())?;
        body.serialize_field("password", self.password.expose_secret())?;
        body.end()
    }
}

/// Successful `POST /login` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub id: UserId,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub admin: bool,
}

// =============================================================================
// Lenient field decoding
// =============================================================================

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Strings pass through; numbers and booleans are rendered; null is empty.
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    /// `true`, any non-zero number, or `"1"`/`"true"`/`"yes"`.
    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
            _ => false,
        })
    }

    /// Non-negative counts from numbers or numeric strings; anything else is 0.
    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0),
            Value::String(s) => s.trim().parse::<u32>().unwrap_or(0),
            _ => 0,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shoe_from_api_row() {
        let shoe: Shoe = serde_json::from_value(json!({
            "ID": 3,
            "NAME": "Court Classic",
            "BRAND": "Bata",
            "SIZE": 42,
            "COLOR": "White",
            "PRICE": "1299.5",
            "QUANTITY": 8,
            "DESCRIPTION": null,
            "CREATED_AT": "2024-01-01"
        }))
        .unwrap();

        assert_eq!(shoe.id, ShoeId::new(3));
        assert_eq!(shoe.size, "42");
        assert_eq!(shoe.price.to_string(), "1299.50");
        assert_eq!(shoe.stock, 8);
        assert!(shoe.description.is_empty());
    }

    #[test]
    fn test_cart_line_totals_and_bounds() {
        let line: CartLine = serde_json::from_value(json!({
            "ID": 11,
            "CUSTOMER_ID": 42,
            "SHOE_ID": 3,
            "CART_QUANTITY": "2",
            "NAME": "Court Classic",
            "PRICE": 49.99,
            "STOCK_QUANTITY": 2
        }))
        .unwrap();

        assert_eq!(line.line_total().to_string(), "99.98");
        assert!(!line.bounds().can_increment());
        assert!(line.bounds().can_decrement());
    }

    #[test]
    fn test_user_admin_flag_variants() {
        let users: Vec<User> = serde_json::from_value(json!([
            {"ID": 1, "NAME": "Yara", "EMAIL": "yara@ysshoestore.eg", "ISADMIN": 1},
            {"ID": 2, "NAME": "Sami", "EMAIL": "sami@ysshoestore.eg", "ISADMIN": false},
            {"ID": 3, "NAME": "Omar", "EMAIL": "omar@ysshoestore.eg"}
        ]))
        .unwrap();

        let flags: Vec<bool> = users.iter().map(|u| u.is_admin).collect();
        assert_eq!(flags, [true, false, false]);
    }

    #[test]
    fn test_login_response_ignores_greeting() {
        let login: LoginResponse = serde_json::from_value(json!({
            "id": 42,
            "admin": 0,
            "message": "Login successful"
        }))
        .unwrap();
        assert_eq!(
            login,
            LoginResponse {
                id: UserId::new(42),
                admin: false,
            }
        );
    }

    #[test]
    fn test_login_request_serializes_password() {
        let request = LoginRequest {
            email: Email::parse("yara@ysshoestore.eg").unwrap(),
            password: SecretString::from("s3cret!"),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body, json!({"email": "yara@ysshoestore.eg", "password": "s3cret!"}));
        assert!(!format!("{request:?}").contains("s3cret!"));
    }

    #[test]
    fn test_request_bodies_use_snake_case() {
        let line = NewCartLine::single(UserId::new(42), ShoeId::new(3));
        assert_eq!(
            serde_json::to_value(&line).unwrap(),
            json!({"customer_id": 42, "shoe_id": 3, "quantity": 1})
        );

        let feedback = NewFeedback {
            customer_id: UserId::new(42),
            rating: Rating::new(5).unwrap(),
            comment: "Great fit".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&feedback).unwrap(),
            json!({"customer_id": 42, "rating": 5, "comment": "Great fit"})
        );
    }
}
