//! Uniform boxed-value convention shared by every compiled accessor.
//!
//! Arguments and results travel as [Value]. `()` stands for a method with no
//! return, [Null] for an explicit null. Conversions between numeric shapes
//! go through [Number] so a caller holding an `i32` can bind it to an `i64`
//! parameter without knowing the target type up front.

use std::any::Any;

/// A boxed value of any `'static + Send` type
pub type Value = Box<dyn Any + Send>;

/// Bind-time conversion hook. Returns the original value on failure.
pub type Coercion = fn(Value) -> Result<Value, Value>;

/// Marker for an explicit null argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Null;

pub fn boxed<T: Any + Send>(value: T) -> Value {
    Box::new(value)
}

pub fn null() -> Value {
    Box::new(Null)
}

pub fn unit() -> Value {
    Box::new(())
}

pub fn is_null(value: &Value) -> bool {
    (**value).is::<Null>()
}

pub fn is_unit(value: &Value) -> bool {
    (**value).is::<()>()
}

/// Unbox a value into `T`, handing the value back when it is something else.
pub fn into<T: Any>(value: Value) -> Result<T, Value> {
    value.downcast::<T>().map(|inner| *inner)
}

/// Borrow the payload of a value as `T`
pub fn peek<T: Any>(value: &Value) -> Option<&T> {
    (**value).downcast_ref::<T>()
}

/// Coercion that accepts nothing beyond an exact type match
pub fn no_coercion(value: Value) -> Result<Value, Value> {
    Err(value)
}

/// Numeric payload extracted from any primitive number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Signed(i128),
    Unsigned(u128),
    Float(f64),
}

macro_rules! read_number {
    ($value:expr; signed: $($s:ty),*; unsigned: $($u:ty),*; float: $($f:ty),*) => {{
        let value: &dyn Any = $value;
        $(
            if let Some(n) = value.downcast_ref::<$s>() {
                return Some(Number::Signed(*n as i128));
            }
        )*
        $(
            if let Some(n) = value.downcast_ref::<$u>() {
                return Some(Number::Unsigned(*n as u128));
            }
        )*
        $(
            if let Some(n) = value.downcast_ref::<$f>() {
                return Some(Number::Float(*n as f64));
            }
        )*
        None
    }};
}

impl Number {
    /// Read a number out of any primitive numeric value
    pub fn of(value: &dyn Any) -> Option<Number> {
        read_number!(value;
            signed: i8, i16, i32, i64, i128, isize;
            unsigned: u8, u16, u32, u64, u128, usize;
            float: f32, f64)
    }

    /// The value as an `i128`, if it is integral and in range
    pub fn as_i128(self) -> Option<i128> {
        match self {
            Number::Signed(n) => Some(n),
            Number::Unsigned(n) => i128::try_from(n).ok(),
            Number::Float(f) => integral_float(f).map(|n| n as i128),
        }
    }

    pub fn as_u128(self) -> Option<u128> {
        match self {
            Number::Signed(n) => u128::try_from(n).ok(),
            Number::Unsigned(n) => Some(n),
            Number::Float(f) if f >= 0.0 => integral_float(f).map(|n| n as u128),
            Number::Float(_) => None,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Signed(n) => n as f64,
            Number::Unsigned(n) => n as f64,
            Number::Float(f) => f,
        }
    }
}

/// A float with no fractional part that fits an i128
fn integral_float(f: f64) -> Option<f64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 1.7e38).then_some(f)
}

macro_rules! signed_coercion {
    ($($name:ident => $t:ty),* $(,)?) => {
        $(
            pub fn $name(value: Value) -> Result<Value, Value> {
                let converted = Number::of(&*value)
                    .and_then(Number::as_i128)
                    .and_then(|n| <$t>::try_from(n).ok());
                match converted {
                    Some(n) => Ok(boxed(n)),
                    None => Err(value),
                }
            }
        )*
    };
}

macro_rules! unsigned_coercion {
    ($($name:ident => $t:ty),* $(,)?) => {
        $(
            pub fn $name(value: Value) -> Result<Value, Value> {
                let converted = Number::of(&*value)
                    .and_then(Number::as_u128)
                    .and_then(|n| <$t>::try_from(n).ok());
                match converted {
                    Some(n) => Ok(boxed(n)),
                    None => Err(value),
                }
            }
        )*
    };
}

/// Checked numeric conversions, one per primitive target
pub mod coerce {
    use super::{Number, Value, boxed};

    signed_coercion! {
        to_i8 => i8,
        to_i16 => i16,
        to_i32 => i32,
        to_i64 => i64,
        to_i128 => i128,
        to_isize => isize,
    }

    unsigned_coercion! {
        to_u8 => u8,
        to_u16 => u16,
        to_u32 => u32,
        to_u64 => u64,
        to_u128 => u128,
        to_usize => usize,
    }

    pub fn to_f32(value: Value) -> Result<Value, Value> {
        match Number::of(&*value) {
            Some(n) => Ok(boxed(n.as_f64() as f32)),
            None => Err(value),
        }
    }

    pub fn to_f64(value: Value) -> Result<Value, Value> {
        match Number::of(&*value) {
            Some(n) => Ok(boxed(n.as_f64())),
            None => Err(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_reads_every_primitive() {
        assert_eq!(Number::of(&7u8), Some(Number::Unsigned(7)));
        assert_eq!(Number::of(&-7i16), Some(Number::Signed(-7)));
        assert_eq!(Number::of(&1.5f32), Some(Number::Float(1.5)));
        assert_eq!(Number::of(&"7"), None);
    }

    #[test]
    fn test_widening_and_checked_narrowing() {
        let wide = coerce::to_i64(boxed(12i32)).unwrap();
        assert_eq!(peek::<i64>(&wide), Some(&12));

        let overflow = coerce::to_u8(boxed(300i32));
        assert!(overflow.is_err());

        let negative = coerce::to_u32(boxed(-1i64));
        assert!(negative.is_err());
    }

    #[test]
    fn test_float_to_integer_requires_integral_value() {
        assert_eq!(
            into::<i32>(coerce::to_i32(boxed(4.0f64)).unwrap()).unwrap(),
            4
        );
        assert!(coerce::to_i32(boxed(4.5f64)).is_err());
    }

    #[test]
    fn test_failed_coercion_returns_original() {
        let original = coerce::to_f64(boxed(String::from("nope"))).unwrap_err();
        assert_eq!(peek::<String>(&original).map(String::as_str), Some("nope"));
    }

    #[test]
    fn test_markers() {
        assert!(is_null(&null()));
        assert!(is_unit(&unit()));
        assert!(!is_null(&unit()));
    }
}
