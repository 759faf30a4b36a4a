//! Locale-correct currency formatting.
//!
//! Every monetary value the dashboard renders goes through
//! [`CurrencyFormatter`]; ad hoc `format!("{:.2}")` string building mishandles
//! negative zero and produces no thousands grouping.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::DISPLAY_DECIMAL_PRECISION;

/// Formats decimals as localized currency strings.
///
/// The default instance renders Brazilian Real: `R$ 1.234,56`, with the sign
/// ahead of the symbol for negative amounts (`-R$ 117,83`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormatter {
    symbol: String,
    decimal_sep: char,
    group_sep: char,
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        Self::brl()
    }
}

impl CurrencyFormatter {
    /// Brazilian Real, pt-BR conventions.
    pub fn brl() -> Self {
        Self {
            symbol: "R$".to_string(),
            decimal_sep: ',',
            group_sep: '.',
        }
    }

    pub fn new(symbol: impl Into<String>, decimal_sep: char, group_sep: char) -> Self {
        Self {
            symbol: symbol.into(),
            decimal_sep,
            group_sep,
        }
    }

    /// Formats a value with two fraction digits and thousands grouping.
    ///
    /// Negative zero normalizes to the canonical zero display.
    pub fn format(&self, value: Decimal) -> String {
        let rounded = value.round_dp_with_strategy(
            DISPLAY_DECIMAL_PRECISION,
            RoundingStrategy::MidpointAwayFromZero,
        );
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let abs = rounded.abs();

        let units = abs.trunc();
        let cents = ((abs - units) * Decimal::ONE_HUNDRED)
            .round()
            .to_u32()
            .unwrap_or(0);

        let grouped = self.group_thousands(&units.to_string());
        format!(
            "{}{} {}{}{:02}",
            if negative { "-" } else { "" },
            self.symbol,
            grouped,
            self.decimal_sep,
            cents
        )
    }

    /// Formats a raw numeric string; non-numeric input yields the canonical
    /// zero display instead of failing.
    pub fn format_lossy(&self, raw: &str) -> String {
        match raw.trim().parse::<Decimal>() {
            Ok(value) => self.format(value),
            Err(_) => self.zero_display(),
        }
    }

    /// The canonical zero display (`R$ 0,00` for the default locale).
    pub fn zero_display(&self) -> String {
        self.format(Decimal::ZERO)
    }

    fn group_thousands(&self, digits: &str) -> String {
        let chars: Vec<char> = digits.chars().collect();
        let mut out = String::with_capacity(chars.len() + chars.len() / 3);
        for (i, ch) in chars.iter().enumerate() {
            if i > 0 && (chars.len() - i) % 3 == 0 {
                out.push(self.group_sep);
            }
            out.push(*ch);
        }
        out
    }
}
