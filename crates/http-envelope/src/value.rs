//! Scalar values carried by parameter and info maps

use std::fmt;

use serde::{Deserialize, Serialize};

/// A flat value: never a nested structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean, rendered as `true` / `false`
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    Str(String),
}

impl Scalar {
    /// Borrow the string form when this is a [`Scalar::Str`]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view, parsing strings when needed
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            Scalar::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Scalar::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Float view, parsing strings when needed
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Str(s) => s.trim().parse().ok(),
            Scalar::Bool(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(n) => write!(f, "{n}"),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<&String> for Scalar {
    fn from(value: &String) -> Self {
        Scalar::Str(value.clone())
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Scalar::Float(value.into())
    }
}

macro_rules! scalar_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::Int(value.into())
                }
            }
        )*
    };
}

scalar_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// Values outside the `i64` range keep their decimal text
macro_rules! scalar_from_wide_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    i64::try_from(value)
                        .map_or_else(|_| Scalar::Str(value.to_string()), Scalar::Int)
                }
            }
        )*
    };
}

scalar_from_wide_int!(isize, usize, u64, i128, u128);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Scalar::from(1234).to_string(), "1234");
        assert_eq!(Scalar::from("name").to_string(), "name");
        assert_eq!(Scalar::from(true).to_string(), "true");
        assert_eq!(Scalar::from(0.5).to_string(), "0.5");
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Scalar::from("404").as_i64(), Some(404));
        assert_eq!(Scalar::from(404u16).as_i64(), Some(404));
        assert_eq!(Scalar::from(2.0).as_i64(), Some(2));
        assert_eq!(Scalar::from(true).as_i64(), None);
        assert_eq!(Scalar::from(3).as_f64(), Some(3.0));
    }

    #[test]
    fn test_wide_integers() {
        assert_eq!(Scalar::from(42u64), Scalar::Int(42));
        assert_eq!(Scalar::from(3usize), Scalar::Int(3));
        assert_eq!(Scalar::from(-5i128), Scalar::Int(-5));
        assert_eq!(
            Scalar::from(u64::MAX),
            Scalar::Str("18446744073709551615".to_string())
        );
        assert_eq!(Scalar::from(u64::MAX).to_string(), u64::MAX.to_string());
    }

    #[test]
    fn test_untagged_deserialize() {
        let values: Vec<Scalar> =
            serde_json::from_str(r#"[true, 7, 1.5, "x"]"#).expect("Valid scalars");
        assert_eq!(
            values,
            vec![
                Scalar::Bool(true),
                Scalar::Int(7),
                Scalar::Float(1.5),
                Scalar::Str("x".to_string())
            ]
        );
    }
}
