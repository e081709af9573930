//! Status and kind enums for orders, discounts, and products.

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
///
/// The nominal flow is PENDING → CONFIRMED → SHIPPED → DELIVERED, with
/// CANCELLED as the escape hatch. Transitions are not constrained in the
/// data model: any status may be set by an admin update. DELIVERED is the
/// status that unlocks review eligibility for the order's line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether leaving this status is an anomaly worth flagging.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// How a discount code's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// `value` is a percentage of the base amount.
    Percentage,
    /// `value` is an absolute amount, capped at the base.
    Fixed,
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Percentage => write!(f, "PERCENTAGE"),
            Self::Fixed => write!(f, "FIXED"),
        }
    }
}

impl std::str::FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERCENTAGE" => Ok(Self::Percentage),
            "FIXED" => Ok(Self::Fixed),
            _ => Err(format!("invalid discount type: {s}")),
        }
    }
}

/// Crystal tone families the catalog is organized around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Amethyst,
    Rose,
    Aqua,
    Amber,
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Amethyst => "amethyst",
            Self::Rose => "rose",
            Self::Aqua => "aqua",
            Self::Amber => "amber",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amethyst" => Ok(Self::Amethyst),
            "rose" => Ok(Self::Rose),
            "aqua" => Ok(Self::Aqua),
            "amber" => Ok(Self::Amber),
            _ => Err(format!("invalid tone: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_order_status_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_str(&status.to_string()).unwrap(), status);
        }
        assert!(OrderStatus::from_str("SHIPPING").is_err());
    }

    #[test]
    fn test_order_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::Delivered).unwrap();
        assert_eq!(json, "\"DELIVERED\"");
    }

    #[test]
    fn test_discount_type_round_trip() {
        assert_eq!(
            DiscountType::from_str("PERCENTAGE").unwrap(),
            DiscountType::Percentage
        );
        assert_eq!(DiscountType::Fixed.to_string(), "FIXED");
        assert!(DiscountType::from_str("percent").is_err());
    }

    #[test]
    fn test_tone_round_trip() {
        for tone in [Tone::Amethyst, Tone::Rose, Tone::Aqua, Tone::Amber] {
            assert_eq!(Tone::from_str(&tone.to_string()).unwrap(), tone);
        }
        assert!(Tone::from_str("jade").is_err());
    }
}
