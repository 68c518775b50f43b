//! # Money Module
//!
//! Provides `Money` and `FxRate`, the two numeric types every price,
//! total, and conversion in the ledger flows through.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    10.10 × 600 = 6059.999999999999  ❌ WRONG!                           │
//! │                                                                         │
//! │  SDG amounts are USD × exchange rate, and rates carry fractions        │
//! │  (e.g. 601.25). Integer cents alone cannot hold the intermediate       │
//! │  product exactly.                                                       │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal                                             │
//! │    10.10 × 600 = 6060.00 exactly                                       │
//! │    Every stored amount is rounded ONCE, to 2 digits, half-to-even      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use nile_core::money::{FxRate, Money};
//! use rust_decimal::Decimal;
//!
//! let price_usd = Money::from_cents(1000);            // 10.00 USD
//! let rate = FxRate::new(Decimal::from(600)).unwrap(); // 600 SDG per USD
//!
//! let price_sdg = rate.usd_to_sdg(price_usd).unwrap();
//! assert_eq!(price_sdg, Money::from_cents(600_000));   // 6000.00 SDG
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::error::{CoreError, CoreResult, ValidationError};

/// Fractional digits kept on every stored currency amount.
pub const MONEY_SCALE: u32 = 2;

/// Fractional digits kept on an exchange rate.
pub const RATE_SCALE: u32 = 4;

/// Rounds to `scale` digits with banker's rounding and pins the scale, so
/// `6000` and `6000.00` have the same textual form.
fn round_to(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.rescale(scale);
    rounded
}

// =============================================================================
// Money Type
// =============================================================================

/// A currency amount (USD or SDG) with exactly two fractional digits.
///
/// Money does not carry its currency: field names (`price_usd`,
/// `total_current_sdg`) say which one it is.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  Product.price_usd ──┬──► InvoiceItem.price_usd ──► total_usd           │
/// │                      └──► × current rate ──► total_current_sdg          │
/// │                                                                         │
/// │  Product.price_sdg ─────► InvoiceItem.original_price_sdg                │
/// │                           ──► total_original_sdg                        │
/// │                                                                         │
/// │  Σ lines ──► Invoice totals ──► profit_loss                             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Creates Money from any decimal, rounding half-to-even to 2 digits.
    ///
    /// ## Example
    /// ```rust
    /// use nile_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// // 0.125 → 0.12 (half goes to the even neighbour)
    /// let m = Money::new(Decimal::new(125, 3));
    /// assert_eq!(m.to_string(), "0.12");
    /// ```
    pub fn new(amount: Decimal) -> Self {
        Money(round_to(amount, MONEY_SCALE))
    }

    /// Creates Money from hundredths of the currency unit.
    ///
    /// ## Example
    /// ```rust
    /// use nile_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(550_000).to_string(), "5500.00");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, MONEY_SCALE))
    }

    /// Creates Money from a whole number of currency units.
    #[inline]
    pub fn from_units(units: i64) -> Self {
        Money::new(Decimal::from(units))
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns the amount in hundredths of the currency unit.
    #[inline]
    pub fn cents(&self) -> i128 {
        self.0.mantissa()
    }

    /// Returns zero money value.
    #[inline]
    pub fn zero() -> Self {
        Money::new(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use nile_core::money::Money;
    ///
    /// let unit = Money::from_units(5500);
    /// assert_eq!(unit.multiply_quantity(3).unwrap(), Money::from_units(16500));
    /// ```
    pub fn multiply_quantity(&self, qty: i64) -> CoreResult<Self> {
        self.0
            .checked_mul(Decimal::from(qty))
            .map(Money::new)
            .ok_or_else(|| CoreError::overflow("quantity total"))
    }

    /// Adds two amounts, reporting overflow instead of panicking.
    pub fn checked_add(&self, other: Money) -> CoreResult<Self> {
        self.0
            .checked_add(other.0)
            .map(Money::new)
            .ok_or_else(|| CoreError::overflow("sum"))
    }

    /// Subtracts two amounts, reporting overflow instead of panicking.
    pub fn checked_sub(&self, other: Money) -> CoreResult<Self> {
        self.0
            .checked_sub(other.0)
            .map(Money::new)
            .ok_or_else(|| CoreError::overflow("difference"))
    }

    /// Sums amounts, reporting overflow instead of panicking.
    pub fn checked_sum<I>(amounts: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================
//
// The operator impls below panic if the underlying `Decimal` overflows, as
// `Decimal`'s own operators do. Ledger totals go through `checked_add`,
// `checked_sub` and `checked_sum` instead.

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Money::new)
            .map_err(|e| ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: e.to_string(),
            })
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money::new(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money::new(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money::new(-self.0)
    }
}

/// # Panics
/// On `Decimal` overflow. Use [`Money::checked_sum`] for untrusted input.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// SDG per 1 USD. Always strictly positive.
///
/// Kept to four fractional digits; a rate like `601.1250` is stored exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct FxRate(Decimal);

impl FxRate {
    /// Creates a rate, rejecting zero and negative values.
    ///
    /// ## Example
    /// ```rust
    /// use nile_core::money::FxRate;
    /// use rust_decimal::Decimal;
    ///
    /// assert!(FxRate::new(Decimal::from(600)).is_ok());
    /// assert!(FxRate::new(Decimal::ZERO).is_err());
    /// ```
    pub fn new(rate: Decimal) -> Result<Self, ValidationError> {
        let rate = round_to(rate, RATE_SCALE);
        if rate <= Decimal::ZERO {
            return Err(ValidationError::must_be_positive("exchangeRate"));
        }
        Ok(FxRate(rate))
    }

    /// Creates a rate from a whole number of SDG per USD.
    pub fn from_units(units: i64) -> Result<Self, ValidationError> {
        FxRate::new(Decimal::from(units))
    }

    #[inline]
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Converts a USD amount to SDG at this rate.
    pub fn usd_to_sdg(&self, usd: Money) -> CoreResult<Money> {
        usd.amount()
            .checked_mul(self.0)
            .map(Money::new)
            .ok_or_else(|| CoreError::overflow("USD to SDG conversion"))
    }

    /// Converts an SDG amount to USD at this rate.
    pub fn sdg_to_usd(&self, sdg: Money) -> CoreResult<Money> {
        sdg.amount()
            .checked_div(self.0)
            .map(Money::new)
            .ok_or_else(|| CoreError::overflow("SDG to USD conversion"))
    }
}

impl fmt::Display for FxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl TryFrom<Decimal> for FxRate {
    type Error = ValidationError;

    fn try_from(rate: Decimal) -> Result<Self, Self::Error> {
        FxRate::new(rate)
    }
}

impl From<FxRate> for Decimal {
    fn from(rate: FxRate) -> Self {
        rate.0
    }
}

impl FromStr for FxRate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rate = Decimal::from_str(s.trim()).map_err(|e| ValidationError::InvalidFormat {
            field: "exchangeRate".to_string(),
            reason: e.to_string(),
        })?;
        FxRate::new(rate)
    }
}

// =============================================================================
// SQLite Storage
// =============================================================================

/// Amounts and rates are stored as TEXT so SQLite never routes them
/// through a REAL column.
#[cfg(feature = "sqlx")]
mod sqlite_text {
    use super::{FxRate, Money};
    use sqlx::encode::IsNull;
    use sqlx::error::BoxDynError;
    use sqlx::sqlite::{Sqlite, SqliteTypeInfo, SqliteValueRef};
    use sqlx::{Database, Decode, Encode, Type};

    macro_rules! text_decimal {
        ($ty:ty) => {
            impl Type<Sqlite> for $ty {
                fn type_info() -> SqliteTypeInfo {
                    <String as Type<Sqlite>>::type_info()
                }

                fn compatible(ty: &SqliteTypeInfo) -> bool {
                    <String as Type<Sqlite>>::compatible(ty)
                }
            }

            impl<'q> Encode<'q, Sqlite> for $ty {
                fn encode_by_ref(
                    &self,
                    buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
                ) -> Result<IsNull, BoxDynError> {
                    <String as Encode<'q, Sqlite>>::encode(self.to_string(), buf)
                }
            }

            impl<'r> Decode<'r, Sqlite> for $ty {
                fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
                    let text = <&str as Decode<'r, Sqlite>>::decode(value)?;
                    Ok(text.parse::<$ty>()?)
                }
            }
        };
    }

    text_decimal!(Money);
    text_decimal!(FxRate);
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_rounds_to_two_places() {
        assert_eq!(Money::new(dec!(10.005)).to_string(), "10.00");
        assert_eq!(Money::new(dec!(10.015)).to_string(), "10.02");
        assert_eq!(Money::new(dec!(10.0151)).to_string(), "10.02");
        assert_eq!(Money::new(dec!(6000)).to_string(), "6000.00");
    }

    #[test]
    fn test_negative_zero_is_plain_zero() {
        let m = Money::new(dec!(-0.001));
        assert!(m.is_zero());
        assert_eq!(m.to_string(), "0.00");
    }

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.amount(), dec!(10.99));
        assert_eq!(money.cents(), 1099);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_units(18000);
        let b = Money::from_units(16500);

        assert_eq!(a + b, Money::from_units(34500));
        assert_eq!(a - b, Money::from_units(1500));
        assert_eq!(b - a, -Money::from_units(1500));
        assert!((b - a).is_negative());
        assert_eq!((b - a).abs(), Money::from_units(1500));

        let mut acc = Money::zero();
        acc += a;
        acc -= b;
        assert_eq!(acc, Money::from_units(1500));
    }

    #[test]
    fn test_sum() {
        let total: Money = [dec!(0.10), dec!(0.20), dec!(0.30)]
            .into_iter()
            .map(Money::new)
            .sum();
        assert_eq!(total, Money::new(dec!(0.60)));
    }

    #[test]
    fn test_checked_sum_reports_overflow() {
        let total = Money::checked_sum([Money::from_units(10), Money::from_cents(5)]).unwrap();
        assert_eq!(total, Money::new(dec!(10.05)));
        assert!(Money::checked_sum(std::iter::empty()).unwrap().is_zero());

        let err = Money::checked_sum([Money::new(Decimal::MAX), Money::new(Decimal::MAX)])
            .unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));
    }

    #[test]
    fn test_multiply_quantity() {
        let unit = Money::new(dec!(2.99));
        assert_eq!(unit.multiply_quantity(3).unwrap(), Money::new(dec!(8.97)));
    }

    #[test]
    fn test_multiply_quantity_overflow() {
        let huge = Money::new(Decimal::MAX / dec!(10));
        let err = huge.multiply_quantity(1_000).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));
    }

    #[test]
    fn test_parse_and_display() {
        let m: Money = "5500".parse().unwrap();
        assert_eq!(m.to_string(), "5500.00");
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn test_serde_as_decimal() {
        let m = Money::from_units(30);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"30.00\"");

        let back: Money = serde_json::from_str("12.345").unwrap();
        assert_eq!(back, Money::new(dec!(12.34)));
    }

    #[test]
    fn test_rate_must_be_positive() {
        assert!(FxRate::new(dec!(600)).is_ok());
        assert!(FxRate::new(dec!(0)).is_err());
        assert!(FxRate::new(dec!(-1)).is_err());
        assert!(FxRate::new(dec!(0.00001)).is_err());
        assert!(serde_json::from_str::<FxRate>("0").is_err());
    }

    #[test]
    fn test_rate_conversions() {
        let rate = FxRate::new(dec!(650)).unwrap();
        assert_eq!(
            rate.usd_to_sdg(Money::from_units(10)).unwrap(),
            Money::from_units(6500)
        );
        assert_eq!(
            rate.sdg_to_usd(Money::from_units(6500)).unwrap(),
            Money::from_units(10)
        );

        let odd = FxRate::new(dec!(601.25)).unwrap();
        assert_eq!(
            odd.usd_to_sdg(Money::new(dec!(10.10))).unwrap(),
            Money::new(dec!(6072.62))
        );
    }

    #[test]
    fn test_rate_display_and_parse() {
        let rate: FxRate = "601.2500".parse().unwrap();
        assert_eq!(rate.to_string(), "601.25");
        assert_eq!(rate.value(), dec!(601.25));
        assert!("0".parse::<FxRate>().is_err());
    }
}
