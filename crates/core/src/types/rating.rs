//! Star rating attached to customer feedback.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingError {
    /// No star was picked (the form posts 0).
    #[error("no rating selected")]
    Unselected,
    /// The value is outside 1-5.
    #[error("rating must be between {min} and {max}, got {0}", min = Rating::MIN, max = Rating::MAX)]
    OutOfRange(u8),
}

/// A feedback rating of one to five stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest rating.
    pub const MIN: u8 = 1;
    /// Highest rating.
    pub const MAX: u8 = 5;

    /// Validate a star count.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::Unselected`] for 0 and
    /// [`RatingError::OutOfRange`] for anything above 5.
    pub const fn new(stars: u8) -> Result<Self, RatingError> {
        match stars {
            0 => Err(RatingError::Unselected),
            Self::MIN..=Self::MAX => Ok(Self(stars)),
            other => Err(RatingError::OutOfRange(other)),
        }
    }

    /// The number of stars.
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(stars: u8) -> Result<Self, Self::Error> {
        Self::new(stars)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bounds() {
        assert_eq!(Rating::new(0), Err(RatingError::Unselected));
        assert_eq!(Rating::new(6), Err(RatingError::OutOfRange(6)));
        assert_eq!(Rating::new(1).unwrap().stars(), 1);
        assert_eq!(Rating::new(5).unwrap().stars(), 5);
    }

    #[test]
    fn test_serializes_as_number() {
        let rating = Rating::new(4).unwrap();
        assert_eq!(serde_json::to_string(&rating).unwrap(), "4");
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }
}
