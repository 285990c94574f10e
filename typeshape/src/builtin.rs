//! [Introspect] for primitives, standard collections and the well-known
//! value types (uuid, url, decimal, chrono, time).

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet, LinkedList, VecDeque};
use std::future::Future;
use std::net::IpAddr;
use std::ops::{Range, RangeInclusive};
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use dashmap::{DashMap, DashSet};
use indexmap::{IndexMap, IndexSet};
use rust_decimal::Decimal;

use crate::enclosed::KeyValuePair;
use crate::raw::{Introspect, RawType, TypeLink, generic_name};
use crate::system_type::Kind;
use crate::value::{self, Number, Value, boxed, coerce};

/// Boxed future: the asynchronous-result wrapper shape
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

// ============================================================================
// Scalars
// ============================================================================

macro_rules! scalar {
    ($($ty:ty => $name:literal, $kind:ident $(, coerce = $coerce:path)? $(, default = $default:expr)?;)*) => {
        $(
            impl Introspect for $ty {
                fn introspect() -> RawType {
                    RawType::new::<Self>($name, $name, Kind::$kind)
                }

                $(
                    fn coerce(value: Value) -> Result<Value, Value> {
                        $coerce(value)
                    }
                )?

                $(
                    fn default_value() -> Option<Value> {
                        Some(boxed::<$ty>($default))
                    }
                )?
            }
        )*
    };
}

scalar! {
    () => "()", Struct, default = ();
    bool => "bool", Struct, default = false;
    char => "char", Struct, default = '\0';
    i8 => "i8", Struct, coerce = coerce::to_i8, default = 0;
    i16 => "i16", Struct, coerce = coerce::to_i16, default = 0;
    i32 => "i32", Struct, coerce = coerce::to_i32, default = 0;
    i64 => "i64", Struct, coerce = coerce::to_i64, default = 0;
    i128 => "i128", Struct, coerce = coerce::to_i128, default = 0;
    isize => "isize", Struct, coerce = coerce::to_isize, default = 0;
    u8 => "u8", Struct, coerce = coerce::to_u8, default = 0;
    u16 => "u16", Struct, coerce = coerce::to_u16, default = 0;
    u32 => "u32", Struct, coerce = coerce::to_u32, default = 0;
    u64 => "u64", Struct, coerce = coerce::to_u64, default = 0;
    u128 => "u128", Struct, coerce = coerce::to_u128, default = 0;
    usize => "usize", Struct, coerce = coerce::to_usize, default = 0;
    f32 => "f32", Struct, coerce = coerce::to_f32, default = 0.0;
    f64 => "f64", Struct, coerce = coerce::to_f64, default = 0.0;
    Decimal => "Decimal", Struct, coerce = decimal_from_number, default = Decimal::ZERO;
    String => "String", Class, coerce = string_from_str, default = String::new();
    &'static str => "&str", Class, default = "";
    uuid::Uuid => "Uuid", Struct, default = uuid::Uuid::nil();
    url::Url => "Url", Class;
    PathBuf => "PathBuf", Class, default = PathBuf::new();
    IpAddr => "IpAddr", Struct;
    chrono::DateTime<chrono::Utc> => "DateTime<Utc>", Struct, default = chrono::DateTime::<chrono::Utc>::default();
    chrono::NaiveDateTime => "NaiveDateTime", Struct, default = chrono::NaiveDateTime::default();
    chrono::NaiveDate => "NaiveDate", Struct, default = chrono::NaiveDate::default();
    chrono::NaiveTime => "NaiveTime", Struct, default = chrono::NaiveTime::default();
    time::OffsetDateTime => "OffsetDateTime", Struct;
    Duration => "Duration", Struct, default = Duration::ZERO;
    SystemTime => "SystemTime", Struct;
}

fn string_from_str(value: Value) -> Result<Value, Value> {
    match value::into::<&'static str>(value) {
        Ok(s) => Ok(boxed(s.to_string())),
        Err(value) => Err(value),
    }
}

fn decimal_from_number(value: Value) -> Result<Value, Value> {
    let converted = match Number::of(&*value) {
        Some(Number::Signed(n)) => i64::try_from(n).ok().map(Decimal::from),
        Some(Number::Unsigned(n)) => u64::try_from(n).ok().map(Decimal::from),
        Some(Number::Float(f)) => Decimal::try_from(f).ok(),
        None => None,
    };
    converted.map(boxed).ok_or(value)
}

// ============================================================================
// Wrappers
// ============================================================================

impl<T: Introspect + Send> Introspect for Option<T> {
    fn introspect() -> RawType {
        let args = vec![TypeLink::of::<T>()];
        RawType::new::<Self>(generic_name("Option", &args), "Option", Kind::Struct)
            .with_generic_args(args)
    }

    /// `Null` becomes `None`; a payload (exact or coercible) becomes `Some`
    fn coerce(value: Value) -> Result<Value, Value> {
        if value::is_null(&value) {
            return Ok(boxed(None::<T>));
        }
        let payload = if (*value).is::<T>() {
            value
        } else {
            T::coerce(value)?
        };
        value::into::<T>(payload).map(|inner| boxed(Some(inner)))
    }

    fn default_value() -> Option<Value> {
        Some(boxed(None::<T>))
    }
}

impl<T: Introspect + Send> Introspect for Box<T> {
    fn introspect() -> RawType {
        let args = vec![TypeLink::of::<T>()];
        RawType::new::<Self>(generic_name("Box", &args), "Box", Kind::Class).with_generic_args(args)
    }

    fn coerce(value: Value) -> Result<Value, Value> {
        let payload = if (*value).is::<T>() {
            value
        } else {
            T::coerce(value)?
        };
        value::into::<T>(payload).map(|inner| boxed(Box::new(inner)))
    }
}

impl<T: Introspect> Introspect for BoxFuture<T> {
    fn introspect() -> RawType {
        let args = vec![TypeLink::of::<T>()];
        RawType::new::<Self>(generic_name("BoxFuture", &args), "BoxFuture", Kind::Class)
            .with_generic_args(args)
    }
}

impl<T: Introspect> Introspect for Range<T> {
    fn introspect() -> RawType {
        let args = vec![TypeLink::of::<T>()];
        RawType::new::<Self>(generic_name("Range", &args), "Range", Kind::Struct)
            .with_generic_args(args)
    }
}

impl<T: Introspect> Introspect for RangeInclusive<T> {
    fn introspect() -> RawType {
        let args = vec![TypeLink::of::<T>()];
        RawType::new::<Self>(
            generic_name("RangeInclusive", &args),
            "RangeInclusive",
            Kind::Struct,
        )
        .with_generic_args(args)
    }
}

impl<T: Introspect> Introspect for *const T {
    fn introspect() -> RawType {
        let element = TypeLink::of::<T>();
        let mut raw = RawType::new::<Self>(format!("*const {}", element.name()), "*const T", Kind::Struct)
            .with_element(element);
        raw.is_pointer = true;
        raw
    }
}

impl<T: Introspect> Introspect for *mut T {
    fn introspect() -> RawType {
        let element = TypeLink::of::<T>();
        let mut raw = RawType::new::<Self>(format!("*mut {}", element.name()), "*mut T", Kind::Struct)
            .with_element(element);
        raw.is_pointer = true;
        raw
    }
}

// ============================================================================
// Delegates
// ============================================================================

macro_rules! delegate {
    ($($arg:ident),*) => {
        impl<$($arg: Introspect,)* R: Introspect> Introspect for fn($($arg),*) -> R {
            fn introspect() -> RawType {
                let params: Vec<TypeLink> = vec![$(TypeLink::of::<$arg>()),*];
                let ret = TypeLink::of::<R>();
                let names: Vec<String> = params.iter().map(TypeLink::name).collect();
                let name = format!("fn({}) -> {}", names.join(", "), ret.name());
                let mut args = params;
                args.push(ret);
                RawType::new::<Self>(name, "fn", Kind::Delegate).with_generic_args(args)
            }
        }
    };
}

delegate!();
delegate!(A);
delegate!(A, B);
delegate!(A, B, C);

// ============================================================================
// Sequences and sets
// ============================================================================

macro_rules! sequence {
    ($($ty:ident => $label:literal $(, $new:ident)?;)*) => {
        $(
            impl<T: Introspect + Send> Introspect for $ty<T> {
                fn introspect() -> RawType {
                    let args = vec![TypeLink::of::<T>()];
                    RawType::new::<Self>(generic_name($label, &args), $label, Kind::Class)
                        .with_generic_args(args)
                        .enumerable()
                }

                $(
                    fn default_value() -> Option<Value> {
                        Some(boxed($ty::<T>::$new()))
                    }
                )?
            }
        )*
    };
}

sequence! {
    Vec => "Vec", new;
    VecDeque => "VecDeque", new;
    LinkedList => "LinkedList", new;
    BinaryHeap => "BinaryHeap";
    HashSet => "HashSet", new;
    BTreeSet => "BTreeSet", new;
    IndexSet => "IndexSet", new;
    DashSet => "DashSet";
}

impl<T: Introspect + Send, const N: usize> Introspect for [T; N] {
    fn introspect() -> RawType {
        let element = TypeLink::of::<T>();
        RawType::new::<Self>(format!("[{}; {}]", element.name(), N), "[T; N]", Kind::Struct)
            .with_element(element)
            .enumerable()
    }
}

impl<T: Introspect + Sync> Introspect for &'static [T] {
    fn introspect() -> RawType {
        let element = TypeLink::of::<T>();
        RawType::new::<Self>(format!("&[{}]", element.name()), "&[T]", Kind::Class)
            .with_element(element)
            .enumerable()
    }
}

impl<T: Introspect + Clone + Send + Sync> Introspect for Cow<'static, [T]> {
    fn introspect() -> RawType {
        let args = vec![TypeLink::of::<T>()];
        RawType::new::<Self>(generic_name("Cow<[T]>", &args), "Cow<[T]>", Kind::Class)
            .with_generic_args(args)
            .enumerable()
    }
}

// ============================================================================
// Immutable shared shapes
// ============================================================================

impl<T: Introspect + Send + Sync> Introspect for Arc<[T]> {
    fn introspect() -> RawType {
        let args = vec![TypeLink::of::<T>()];
        RawType::new::<Self>(generic_name("Arc<[T]>", &args), "Arc<[T]>", Kind::Class)
            .with_generic_args(args)
            .enumerable()
    }
}

impl<T: Introspect + Send + Sync> Introspect for Arc<Vec<T>> {
    fn introspect() -> RawType {
        let args = vec![TypeLink::of::<T>()];
        RawType::new::<Self>(generic_name("Arc<Vec>", &args), "Arc<Vec>", Kind::Class)
            .with_generic_args(args)
            .enumerable()
    }
}

impl<T: Introspect + Send + Sync> Introspect for Arc<HashSet<T>> {
    fn introspect() -> RawType {
        let args = vec![TypeLink::of::<T>()];
        RawType::new::<Self>(generic_name("Arc<HashSet>", &args), "Arc<HashSet>", Kind::Class)
            .with_generic_args(args)
            .enumerable()
    }
}

impl Introspect for Arc<str> {
    fn introspect() -> RawType {
        RawType::new::<Self>("Arc<str>", "Arc<str>", Kind::Class)
    }

    fn coerce(value: Value) -> Result<Value, Value> {
        let value = match value::into::<String>(value) {
            Ok(s) => return Ok(boxed(Arc::<str>::from(s))),
            Err(value) => value,
        };
        match value::into::<&'static str>(value) {
            Ok(s) => Ok(boxed(Arc::<str>::from(s))),
            Err(value) => Err(value),
        }
    }
}

// ============================================================================
// Dictionaries
// ============================================================================

macro_rules! dictionary {
    ($($ty:ty => $label:literal $(, $new:expr)?;)*) => {
        $(
            impl<K, V> Introspect for $ty
            where
                K: Introspect + Clone + Send + Sync,
                V: Introspect + Clone + Send + Sync,
            {
                fn introspect() -> RawType {
                    let args = vec![TypeLink::of::<K>(), TypeLink::of::<V>()];
                    let mut raw = RawType::new::<Self>(generic_name($label, &args), $label, Kind::Class)
                        .with_generic_args(args)
                        .enumerable();
                    raw.key_value_pair = Some(TypeLink::of::<KeyValuePair<K, V>>());
                    raw
                }

                $(
                    fn default_value() -> Option<Value> {
                        Some(boxed::<$ty>($new))
                    }
                )?
            }
        )*
    };
}

dictionary! {
    HashMap<K, V> => "HashMap", HashMap::new();
    BTreeMap<K, V> => "BTreeMap", BTreeMap::new();
    IndexMap<K, V> => "IndexMap", IndexMap::new();
    DashMap<K, V> => "DashMap";
    Arc<HashMap<K, V>> => "Arc<HashMap>";
}
