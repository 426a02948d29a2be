use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

/// Extra fractional digits carried through a division before normalizing.
const DIV_SCALE: u32 = 32;

/// Arbitrary-precision signed decimal: `mantissa * 10^-scale`.
///
/// Always kept normalized (no trailing zero digits in the fraction), so that
/// structural comparison of equal quantities is cheap and rendering is
/// canonical.
#[derive(Debug, Clone)]
pub struct Decimal {
    mantissa: BigInt,
    scale: u32,
}

impl Decimal {
    pub fn from_i64(value: i64) -> Self {
        Self {
            mantissa: BigInt::from(value),
            scale: 0,
        }
    }

    /// Parse a decimal literal of the form `[-]digits[.digits]`.
    pub fn parse(text: &str) -> Option<Self> {
        let (sign, rest) = match text.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, text),
        };
        if rest.is_empty() {
            return None;
        }
        let (int_part, frac_part) = match rest.split_once('.') {
            Some((i, f)) => (i, f),
            None => (rest, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let mut digits = String::with_capacity(int_part.len() + frac_part.len());
        digits.push_str(int_part);
        digits.push_str(frac_part);
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let mantissa: BigInt = digits.parse().ok()?;
        Some(
            Self {
                mantissa: mantissa * sign,
                scale: frac_part.len() as u32,
            }
            .normalized(),
        )
    }

    fn normalized(mut self) -> Self {
        let ten = BigInt::from(10);
        while self.scale > 0 && (&self.mantissa % &ten).is_zero() {
            self.mantissa /= &ten;
            self.scale -= 1;
        }
        self
    }

    /// Scale both operands up to a common exponent.
    fn aligned(&self, other: &Decimal) -> (BigInt, BigInt, u32) {
        let scale = self.scale.max(other.scale);
        let a = &self.mantissa * pow10(scale - self.scale);
        let b = &other.mantissa * pow10(scale - other.scale);
        (a, b, scale)
    }

    pub fn add(&self, other: &Decimal) -> Decimal {
        let (a, b, scale) = self.aligned(other);
        Decimal {
            mantissa: a + b,
            scale,
        }
        .normalized()
    }

    pub fn sub(&self, other: &Decimal) -> Decimal {
        let (a, b, scale) = self.aligned(other);
        Decimal {
            mantissa: a - b,
            scale,
        }
        .normalized()
    }

    pub fn mul(&self, other: &Decimal) -> Decimal {
        Decimal {
            mantissa: &self.mantissa * &other.mantissa,
            scale: self.scale + other.scale,
        }
        .normalized()
    }

    /// Division carries `DIV_SCALE` fractional digits, truncating toward zero.
    /// Returns None on division by zero.
    pub fn div(&self, other: &Decimal) -> Option<Decimal> {
        if other.mantissa.is_zero() {
            return None;
        }
        let (a, b, _) = self.aligned(other);
        let scaled = a * pow10(DIV_SCALE);
        Some(
            Decimal {
                mantissa: scaled / b,
                scale: DIV_SCALE,
            }
            .normalized(),
        )
    }

    /// Remainder of truncated division: `a - trunc(a/b) * b`.
    pub fn rem(&self, other: &Decimal) -> Option<Decimal> {
        if other.mantissa.is_zero() {
            return None;
        }
        let (a, b, scale) = self.aligned(other);
        let q = &a / &b;
        Some(
            Decimal {
                mantissa: a - q * b,
                scale,
            }
            .normalized(),
        )
    }

    pub fn neg(&self) -> Decimal {
        Decimal {
            mantissa: -&self.mantissa,
            scale: self.scale,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.is_negative()
    }

    pub fn compare(&self, other: &Decimal) -> Ordering {
        let (a, b, _) = self.aligned(other);
        a.cmp(&b)
    }

    /// Truncate toward zero; None when the integral part exceeds i64.
    pub fn to_i64(&self) -> Option<i64> {
        (&self.mantissa / pow10(self.scale)).to_i64()
    }
}

fn pow10(exp: u32) -> BigInt {
    BigInt::from(10).pow(exp)
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl fmt::Display for Decimal {
    /// Canonical form always contains a decimal point (`5` renders as `5.0`)
    /// so the reader can tell Decimal and Int literals apart.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}.0", self.mantissa);
        }
        let negative = self.mantissa.is_negative();
        let digits = self.mantissa.abs().to_string();
        let scale = self.scale as usize;
        let (int_part, frac_part) = if digits.len() > scale {
            let split = digits.len() - scale;
            (digits[..split].to_string(), digits[split..].to_string())
        } else {
            ("0".to_string(), format!("{:0>width$}", digits, width = scale))
        };
        let sign = if negative { "-" } else { "" };
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

#[cfg(test)]
mod tests {
    use super::Decimal;
    use std::cmp::Ordering;

    #[test]
    fn parse_and_render_are_canonical() {
        assert_eq!(Decimal::parse("1.50").unwrap().to_string(), "1.5");
        assert_eq!(Decimal::parse("5.0").unwrap().to_string(), "5.0");
        assert_eq!(Decimal::parse("-0.25").unwrap().to_string(), "-0.25");
        assert_eq!(Decimal::parse("0.0").unwrap().to_string(), "0.0");
    }

    #[test]
    fn arithmetic_aligns_scales() {
        let a = Decimal::parse("1.25").unwrap();
        let b = Decimal::parse("0.75").unwrap();
        assert_eq!(a.add(&b).to_string(), "2.0");
        assert_eq!(a.sub(&b).to_string(), "0.5");
        assert_eq!(a.mul(&b).to_string(), "0.9375");
    }

    #[test]
    fn division_truncates_and_rejects_zero() {
        let a = Decimal::from_i64(1);
        let b = Decimal::from_i64(3);
        let q = a.div(&b).unwrap().to_string();
        assert!(q.starts_with("0.3333"));
        assert!(a.div(&Decimal::from_i64(0)).is_none());
    }

    #[test]
    fn compare_is_numeric() {
        let a = Decimal::parse("2.5").unwrap();
        let b = Decimal::parse("2.50").unwrap();
        assert_eq!(a.compare(&b), Ordering::Equal);
        assert_eq!(
            Decimal::parse("-1.5").unwrap().compare(&Decimal::from_i64(0)),
            Ordering::Less
        );
    }
}
