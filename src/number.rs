// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::cmp::Ordering;
use core::fmt::{self, Debug, Display, Formatter};
use core::str::FromStr;

use crate::Rc;

use num_bigint::{BigInt, Sign};
use num_traits::{One, Signed, ToPrimitive, Zero};

use serde::ser::Serializer;
use serde::Serialize;

// Beyond this many trailing zeros a literal-less number is written in
// scientific form instead of being expanded.
const MAX_EXPANDED_ZEROS: i128 = 20;

/// An exact decimal number.
///
/// The value is `mantissa * 10^exponent` with the mantissa stripped of
/// trailing zeros, so that `3`, `3.0` and `0.3e1` compare equal. A number read
/// from source text remembers that text and prints it back verbatim.
#[derive(Clone)]
pub struct Number {
    mantissa: Rc<BigInt>,
    // Wider than any exponent a JSON literal can spell in i64, so that
    // normalization and digit arithmetic cannot overflow.
    exponent: i128,
    // Number of decimal digits in the mantissa. Zero for zero.
    digits: i128,
    literal: Option<Rc<str>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseNumberError;

impl Display for ParseNumberError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("invalid number")
    }
}

impl std::error::Error for ParseNumberError {}

impl Number {
    fn normalized(mut mantissa: BigInt, mut exponent: i128, literal: Option<Rc<str>>) -> Self {
        if mantissa.is_zero() {
            return Self {
                mantissa: Rc::new(mantissa),
                exponent: 0,
                digits: 0,
                literal,
            };
        }

        let ten = BigInt::from(10u8);
        while (&mantissa % &ten).is_zero() {
            mantissa /= &ten;
            exponent += 1;
        }

        let digits = mantissa.magnitude().to_str_radix(10).len() as i128;
        Self {
            mantissa: Rc::new(mantissa),
            exponent,
            digits,
            literal,
        }
    }

    /// Converts a finite float. Non-finite floats have no decimal form.
    pub fn from_f64(value: f64) -> Option<Number> {
        if !value.is_finite() {
            return None;
        }
        // Debug formatting is the shortest text that round-trips and keeps a
        // trailing `.0` on integral values.
        Number::from_str(&format!("{value:?}")).ok()
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    pub fn is_integer(&self) -> bool {
        self.exponent >= 0
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.is_negative()
    }

    /// The integral value, if the number is integral and not absurdly large.
    pub fn as_bigint(&self) -> Option<BigInt> {
        if self.exponent < 0 {
            return None;
        }
        if self.exponent > i128::from(u16::MAX) {
            return None;
        }
        Some(&*self.mantissa * pow10_bigint(self.exponent as u32))
    }

    pub fn as_u64(&self) -> Option<u64> {
        if self.digits + self.exponent > 20 {
            return None;
        }
        self.as_bigint()?.to_u64()
    }

    pub fn as_i64(&self) -> Option<i64> {
        if self.digits + self.exponent > 20 {
            return None;
        }
        self.as_bigint()?.to_i64()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.format_decimal().parse::<f64>().ok()
    }

    // Position of the most significant digit: `d.ddd * 10^adjusted`.
    fn adjusted_exponent(&self) -> i128 {
        self.exponent + self.digits - 1
    }

    fn cmp_magnitude(&self, other: &Number) -> Ordering {
        match self.adjusted_exponent().cmp(&other.adjusted_exponent()) {
            Ordering::Equal => (),
            ord => return ord,
        }

        // Same leading position, so the exponent gap is bounded by the
        // difference in digit counts.
        let base = self.exponent.min(other.exponent);
        let a = self.mantissa.magnitude() * pow10_biguint((self.exponent - base) as u32);
        let b = other.mantissa.magnitude() * pow10_biguint((other.exponent - base) as u32);
        a.cmp(&b)
    }

    pub fn format_decimal(&self) -> String {
        if let Some(literal) = &self.literal {
            return literal.to_string();
        }
        self.format_canonical()
    }

    fn format_canonical(&self) -> String {
        if self.mantissa.is_zero() {
            return "0".to_string();
        }

        let sign = if self.mantissa.is_negative() { "-" } else { "" };
        let digits = self.mantissa.magnitude().to_str_radix(10);

        if self.exponent >= 0 {
            if self.exponent > MAX_EXPANDED_ZEROS {
                return format!("{sign}{digits}e{}", self.exponent);
            }
            return format!("{sign}{digits}{}", "0".repeat(self.exponent as usize));
        }

        if -self.exponent > MAX_EXPANDED_ZEROS + digits.len() as i128 {
            return format!("{sign}{digits}e{}", self.exponent);
        }
        let frac_len = (-self.exponent) as usize;
        if digits.len() > frac_len {
            let (int_part, frac_part) = digits.split_at(digits.len() - frac_len);
            format!("{sign}{int_part}.{frac_part}")
        } else {
            let zeros = "0".repeat(frac_len - digits.len());
            format!("{sign}0.{zeros}{digits}")
        }
    }
}

impl Debug for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = self.format_decimal();
        let v = serde_json::Number::from_str(&s)
            .map_err(|_| serde::ser::Error::custom("could not serialize number"))?;
        v.serialize(serializer)
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::normalized(value, 0, None)
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Number::from(BigInt::from(value))
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number::from(BigInt::from(value))
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::from(BigInt::from(value))
    }
}

// See https://www.json.org/json-en.html for number's grammar
impl FromStr for Number {
    type Err = ParseNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let mut pos = 0;

        let negative = bytes.first() == Some(&b'-');
        if negative {
            pos += 1;
        }

        // Integer part: 0 or a non-zero digit followed by digits.
        let int_start = pos;
        match bytes.get(pos) {
            Some(b'0') => pos += 1,
            Some(b'1'..=b'9') => {
                while matches!(bytes.get(pos), Some(b'0'..=b'9')) {
                    pos += 1;
                }
            }
            _ => return Err(ParseNumberError),
        }
        let mut digits = s[int_start..pos].to_string();
        let mut exponent: i128 = 0;

        // Fraction part: . followed by at least one digit.
        if bytes.get(pos) == Some(&b'.') {
            pos += 1;
            let frac_start = pos;
            while matches!(bytes.get(pos), Some(b'0'..=b'9')) {
                pos += 1;
            }
            if pos == frac_start {
                return Err(ParseNumberError);
            }
            digits.push_str(&s[frac_start..pos]);
            exponent -= (pos - frac_start) as i128;
        }

        // Exponent part: e or E, optional sign, at least one digit.
        if matches!(bytes.get(pos), Some(b'e' | b'E')) {
            pos += 1;
            let exp_start = pos;
            if matches!(bytes.get(pos), Some(b'+' | b'-')) {
                pos += 1;
            }
            let digits_start = pos;
            while matches!(bytes.get(pos), Some(b'0'..=b'9')) {
                pos += 1;
            }
            if pos == digits_start {
                return Err(ParseNumberError);
            }
            let e = s[exp_start..pos]
                .parse::<i64>()
                .map_err(|_| ParseNumberError)?;
            let e = i128::from(e);
            exponent = exponent.checked_add(e).ok_or(ParseNumberError)?;
        }

        if pos != bytes.len() {
            return Err(ParseNumberError);
        }

        let mut mantissa = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or(ParseNumberError)?;
        if negative {
            mantissa = -mantissa;
        }

        Ok(Number::normalized(mantissa, exponent, Some(s.into())))
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        let (sa, sb) = (self.mantissa.sign(), other.mantissa.sign());
        if sa != sb {
            return sa.cmp(&sb);
        }
        match sa {
            Sign::NoSign => Ordering::Equal,
            Sign::Plus => self.cmp_magnitude(other),
            Sign::Minus => self.cmp_magnitude(other).reverse(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn pow10_biguint(exp: u32) -> num_bigint::BigUint {
    num_bigint::BigUint::from(10u8).pow(exp)
}

fn pow10_bigint(exp: u32) -> BigInt {
    if exp == 0 {
        return BigInt::one();
    }
    BigInt::from(10u8).pow(exp)
}
