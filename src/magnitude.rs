//! Fixed-point distance magnitudes.
//!
//! A magnitude is a decimal with at most [`Magnitude::MAX_DIGITS`] digits, of which exactly
//! [`Magnitude::DECIMAL_PLACES`] are fractional. It is held as an integer count of hundredths,
//! which is also how the store persists it.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// A decimal distance value with two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Magnitude(i64);

/// Reasons a string is not an acceptable magnitude.
///
/// Checks run in declaration order and the first failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MagnitudeError {
    /// Not a plain decimal number.
    #[error("Enter a number.")]
    Invalid,
    /// More significant digits than the field allows.
    #[error("Ensure that there are no more than {} digits in total.", Magnitude::MAX_DIGITS)]
    TooManyDigits,
    /// More fractional digits than the field allows.
    #[error("Ensure that there are no more than {} decimal places.", Magnitude::DECIMAL_PLACES)]
    TooManyDecimalPlaces,
    /// More digits before the point than `MAX_DIGITS - DECIMAL_PLACES`.
    #[error(
        "Ensure that there are no more than {} digits before the decimal point.",
        Magnitude::MAX_DIGITS - Magnitude::DECIMAL_PLACES
    )]
    TooManyWholeDigits,
}

impl Magnitude {
    /// Total number of digits a magnitude may carry.
    pub const MAX_DIGITS: usize = 8;
    /// Number of digits after the decimal point.
    pub const DECIMAL_PLACES: usize = 2;

    const SCALE: i64 = 100;

    /// Builds a magnitude from a count of hundredths.
    pub fn from_hundredths(hundredths: i64) -> Self {
        Magnitude(hundredths)
    }

    /// The value as a count of hundredths.
    pub fn hundredths(self) -> i64 {
        self.0
    }

    /// Parses user input such as `"10.5"`, `"-3"` or `".25"`.
    ///
    /// Leading zeros of the whole part do not count towards the digit limit; trailing
    /// fractional zeros do, so `"1.500"` is rejected for having three decimal places.
    pub fn parse(input: &str) -> Result<Self, MagnitudeError> {
        let s = input.trim();
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (whole, frac) = body.split_once('.').unwrap_or((body, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(MagnitudeError::Invalid);
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(MagnitudeError::Invalid);
        }

        let significant = whole.trim_start_matches('0');
        if significant.len() + frac.len() > Self::MAX_DIGITS {
            return Err(MagnitudeError::TooManyDigits);
        }
        if frac.len() > Self::DECIMAL_PLACES {
            return Err(MagnitudeError::TooManyDecimalPlaces);
        }
        if significant.len() > Self::MAX_DIGITS - Self::DECIMAL_PLACES {
            return Err(MagnitudeError::TooManyWholeDigits);
        }

        let whole_value: i64 = if significant.is_empty() {
            0
        } else {
            significant.parse().map_err(|_| MagnitudeError::Invalid)?
        };
        let mut frac_value: i64 = 0;
        for (position, digit) in frac.bytes().enumerate() {
            let weight = if position == 0 { 10 } else { 1 };
            frac_value += i64::from(digit - b'0') * weight;
        }
        let hundredths = whole_value * Self::SCALE + frac_value;
        Ok(Magnitude(if negative { -hundredths } else { hundredths }))
    }
}

impl FromStr for Magnitude {
    type Err = MagnitudeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Magnitude::parse(s)
    }
}

impl Display for Magnitude {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = Self::SCALE.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / scale, abs % scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_pads_to_two_places() {
        assert_eq!(Magnitude::parse("10.5").unwrap().to_string(), "10.50");
        assert_eq!(Magnitude::parse("10.50").unwrap().hundredths(), 1050);
        assert_eq!(Magnitude::parse("7").unwrap().to_string(), "7.00");
        assert_eq!(Magnitude::parse(".25").unwrap().to_string(), "0.25");
        assert_eq!(Magnitude::parse("3.").unwrap().to_string(), "3.00");
        assert_eq!(Magnitude::parse(" 42.01 ").unwrap().hundredths(), 4201);
    }

    #[test]
    fn signs() {
        assert_eq!(Magnitude::parse("-1.25").unwrap().to_string(), "-1.25");
        assert_eq!(Magnitude::parse("+1.25").unwrap().hundredths(), 125);
        assert_eq!(Magnitude::parse("-0.05").unwrap().to_string(), "-0.05");
    }

    #[test]
    fn rejects_non_numbers() {
        for input in ["", " ", "-", ".", "abc", "1e3", "1.2.3", "1,5", "--1", "0x10"] {
            assert_eq!(Magnitude::parse(input), Err(MagnitudeError::Invalid), "{input:?}");
        }
    }

    #[test]
    fn digit_limits_in_order() {
        assert_eq!(Magnitude::parse("123456789"), Err(MagnitudeError::TooManyDigits));
        assert_eq!(Magnitude::parse("1.23456789"), Err(MagnitudeError::TooManyDigits));
        assert_eq!(Magnitude::parse("1.234"), Err(MagnitudeError::TooManyDecimalPlaces));
        assert_eq!(Magnitude::parse("1.500"), Err(MagnitudeError::TooManyDecimalPlaces));
        assert_eq!(Magnitude::parse("1234567"), Err(MagnitudeError::TooManyWholeDigits));
        assert_eq!(Magnitude::parse("1234567.5"), Err(MagnitudeError::TooManyWholeDigits));
    }

    #[test]
    fn leading_zeros_are_not_significant() {
        assert_eq!(Magnitude::parse("000000123456.78").unwrap().hundredths(), 12_345_678);
        assert_eq!(Magnitude::parse("999999.99").unwrap().to_string(), "999999.99");
    }

    #[test]
    fn error_messages() {
        assert_eq!(MagnitudeError::Invalid.to_string(), "Enter a number.");
        assert_eq!(
            MagnitudeError::TooManyDigits.to_string(),
            "Ensure that there are no more than 8 digits in total."
        );
        assert_eq!(
            MagnitudeError::TooManyDecimalPlaces.to_string(),
            "Ensure that there are no more than 2 decimal places."
        );
        assert_eq!(
            MagnitudeError::TooManyWholeDigits.to_string(),
            "Ensure that there are no more than 6 digits before the decimal point."
        );
    }
}
