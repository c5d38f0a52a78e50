//! Price ratio to `sqrt_price_x64` conversion.
//!
//! Pools store the square root of the price as a Q64.64 fixed-point integer:
//! `sqrt_price_x64 = floor(sqrt(price) * 2^64)`. Pool ticks are sensitive down
//! to the last fractional bit, so the conversion is done on exact big-integer
//! rationals and never goes through `f64`.

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive, Zero};

use crate::errors::{ClientError, Result};

/// Lowest sqrt price a pool accepts (tick -443636).
pub const MIN_SQRT_PRICE_X64: u128 = 4_295_048_016;
/// Highest sqrt price a pool accepts (tick 443636).
pub const MAX_SQRT_PRICE_X64: u128 = 79_226_673_515_401_279_992_447_579_055;

/// Largest decimal exponent, in either direction, accepted by
/// [`Price::from_decimal`]. Far past any precision `sqrt_price_x64` can hold.
pub const MAX_DECIMAL_EXPONENT: u32 = 1_000;

/// Price of token X quoted in token Y, i.e. how many Y one X buys.
///
/// Held as an exact rational so nothing is lost before the square root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    numerator: BigInt,
    /// Never negative; zero only when the X amount was zero.
    denominator: BigInt,
}

impl Price {
    /// Build a price from raw token amounts and their decimal places.
    ///
    /// `price = (amount_y / 10^decimals_y) / (amount_x / 10^decimals_x)`
    pub fn from_amounts(amount_x: u128, decimals_x: u8, amount_y: u128, decimals_y: u8) -> Self {
        Self {
            numerator: BigInt::from(amount_y) * pow10(decimals_x as u32),
            denominator: BigInt::from(amount_x) * pow10(decimals_y as u32),
        }
    }

    /// Build a price from an exact rational `numerator / denominator`.
    pub fn from_ratio(numerator: BigInt, denominator: BigInt) -> Self {
        if denominator.sign() == Sign::Minus {
            Self {
                numerator: -numerator,
                denominator: -denominator,
            }
        } else {
            Self {
                numerator,
                denominator,
            }
        }
    }

    /// Build a price from a human-readable decimal already expressed in whole
    /// token units (e.g. `"150.25"` USDC per SOL).
    ///
    /// Exponents beyond [`MAX_DECIMAL_EXPONENT`] are rejected as `InvalidPrice`.
    pub fn from_decimal(value: &BigDecimal) -> Result<Self> {
        let (mantissa, scale) = value.as_bigint_and_exponent();
        let exp = u32::try_from(scale.unsigned_abs())
            .ok()
            .filter(|exp| *exp <= MAX_DECIMAL_EXPONENT)
            .ok_or_else(|| ClientError::InvalidPrice(format!("exponent {scale} out of range")))?;
        if scale >= 0 {
            Ok(Self::from_ratio(mantissa, pow10(exp)))
        } else {
            Ok(Self::from_ratio(mantissa * pow10(exp), BigInt::one()))
        }
    }

    pub fn numerator(&self) -> &BigInt {
        &self.numerator
    }

    pub fn denominator(&self) -> &BigInt {
        &self.denominator
    }

    /// Decimal view of the ratio, `None` when the denominator is zero.
    pub fn to_decimal(&self) -> Option<BigDecimal> {
        if self.denominator.is_zero() {
            return None;
        }
        Some(BigDecimal::new(self.numerator.clone(), 0) / BigDecimal::new(self.denominator.clone(), 0))
    }
}

/// Convert a price into its on-chain `sqrt_price_x64` encoding.
///
/// The result is `floor(sqrt(price) * 2^64)`, computed as
/// `isqrt(floor(num * 2^128 / den))`. Both forms are equal for any
/// non-negative rational, so the value never overstates the price.
///
/// Fails with [`ClientError::InvalidPrice`] for zero, negative or undefined
/// prices, and with [`ClientError::Overflow`] when the result needs more than
/// 128 bits.
pub fn to_sqrt_price_x64(price: &Price) -> Result<u128> {
    if price.denominator.is_zero() {
        return Err(ClientError::InvalidPrice(
            "base token amount is zero".to_string(),
        ));
    }
    if price.numerator.sign() != Sign::Plus {
        return Err(ClientError::InvalidPrice(format!(
            "price must be strictly positive, got {}/{}",
            price.numerator, price.denominator
        )));
    }

    // Both are positive here, so the conversions cannot fail.
    let (Some(num), Some(den)) = (price.numerator.to_biguint(), price.denominator.to_biguint())
    else {
        return Err(ClientError::InvalidPrice("negative component".to_string()));
    };

    let scaled: BigUint = (num << 128u32) / den;
    scaled.sqrt().to_u128().ok_or(ClientError::Overflow)
}

/// Decode a `sqrt_price_x64` back into the decimal price it encodes,
/// `sqrt_price_x64^2 / 2^128`.
///
/// Exact up to the 100 significant digits `BigDecimal` keeps on division.
pub fn sqrt_price_x64_to_price(sqrt_price_x64: u128) -> BigDecimal {
    let sqrt = BigInt::from(sqrt_price_x64);
    BigDecimal::new(&sqrt * &sqrt, 0) / BigDecimal::new(BigInt::one() << 128u32, 0)
}

/// Whether a pool would accept this sqrt price.
pub fn is_within_pool_bounds(sqrt_price_x64: u128) -> bool {
    (MIN_SQRT_PRICE_X64..=MAX_SQRT_PRICE_X64).contains(&sqrt_price_x64)
}

fn pow10(exp: u32) -> BigInt {
    BigInt::from(10u32).pow(exp)
}
