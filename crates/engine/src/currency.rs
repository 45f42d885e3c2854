use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Display currency of a user and of the entries they record.
///
/// Amounts are always stored with two fractional digits (see `Money`); the
/// currency only drives the symbol shown to clients and is copied on each entry
/// so that a later change of the user's currency does not rewrite history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Vnd,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Vnd => "VND",
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Vnd => "₫",
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "VND" => Ok(Currency::Vnd),
            other => Err(EngineError::InvalidAmount(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_parse_case_insensitively() {
        assert_eq!(Currency::try_from("vnd").unwrap(), Currency::Vnd);
        assert_eq!(Currency::try_from(" Usd ").unwrap(), Currency::Usd);
        assert!(Currency::try_from("GBP").is_err());
    }

    #[test]
    fn symbols() {
        assert_eq!(Currency::Vnd.symbol(), "₫");
        assert_eq!(Currency::default().symbol(), "$");
    }
}
