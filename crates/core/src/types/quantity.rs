//! Cart line quantity stepping rules.

/// The quantity of a cart line together with the stock it is bounded by.
///
/// The cart view offers `-` and `+` controls; these rules decide which of them
/// are live. The API re-checks stock on every update, so these bounds only
/// keep obviously doomed requests from being sent.
///
/// ```
/// use ys_shoe_core::LineQuantity;
///
/// let line = LineQuantity::new(1, 3);
/// assert!(!line.can_decrement());
/// assert_eq!(line.incremented(), Some(2));
///
/// let full = LineQuantity::new(3, 3);
/// assert!(!full.can_increment());
/// assert_eq!(full.decremented(), Some(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineQuantity {
    quantity: u32,
    stock: u32,
}

impl LineQuantity {
    /// Create the bounds for a line holding `quantity` of an item with `stock` available.
    #[must_use]
    pub const fn new(quantity: u32, stock: u32) -> Self {
        Self { quantity, stock }
    }

    /// Current quantity on the line.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Units in stock for the line's shoe.
    #[must_use]
    pub const fn stock(&self) -> u32 {
        self.stock
    }

    /// `+` is disabled once the quantity reaches the stock level.
    #[must_use]
    pub const fn can_increment(&self) -> bool {
        self.quantity < self.stock
    }

    /// `-` is disabled at quantity 1; removal is a separate action.
    #[must_use]
    pub const fn can_decrement(&self) -> bool {
        self.quantity > 1
    }

    /// The quantity after pressing `+`, if allowed.
    #[must_use]
    pub const fn incremented(&self) -> Option<u32> {
        if self.can_increment() {
            Some(self.quantity + 1)
        } else {
            None
        }
    }

    /// The quantity after pressing `-`, if allowed.
    #[must_use]
    pub const fn decremented(&self) -> Option<u32> {
        if self.can_decrement() {
            Some(self.quantity - 1)
        } else {
            None
        }
    }

    /// Whether moving the line to `target` is a step these bounds allow.
    ///
    /// Any reduction to at least one unit is allowed even when stock has
    /// since dropped below the current quantity.
    #[must_use]
    pub const fn permits(&self, target: u32) -> bool {
        target >= 1 && (target <= self.stock || target < self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_disabled_at_stock() {
        assert!(LineQuantity::new(2, 3).can_increment());
        assert!(!LineQuantity::new(3, 3).can_increment());
        assert!(!LineQuantity::new(4, 3).can_increment());
        assert_eq!(LineQuantity::new(3, 3).incremented(), None);
    }

    #[test]
    fn test_decrement_disabled_at_one() {
        assert!(!LineQuantity::new(1, 10).can_decrement());
        assert_eq!(LineQuantity::new(1, 10).decremented(), None);
        assert_eq!(LineQuantity::new(5, 10).decremented(), Some(4));
    }

    #[test]
    fn test_permits() {
        let line = LineQuantity::new(4, 2);
        assert!(line.permits(3), "reductions stay allowed above stock");
        assert!(!line.permits(5));
        assert!(!line.permits(0));
        assert!(LineQuantity::new(1, 2).permits(2));
    }
}
