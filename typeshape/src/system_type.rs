//! Closed shape categories and the predicates derived from them.

use bitflags::bitflags;
use serde::Serialize;

/// Declaration kind of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Kind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Class => "Class",
            Kind::Struct => "Struct",
            Kind::Interface => "Interface",
            Kind::Enum => "Enum",
            Kind::Delegate => "Delegate",
        }
    }

    /// Whether values of this kind can be produced and held by value
    pub fn is_value_shaped(&self) -> bool {
        match self {
            Kind::Class | Kind::Struct | Kind::Enum => true,
            Kind::Interface | Kind::Delegate => false,
        }
    }
}

/// Visibility of a type or member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Visibility {
    Private,
    /// `pub(crate)` and other restricted visibilities
    Crate,
    Public,
}

bitflags! {
    /// Predicate bits for a [SystemType]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShapeFlags: u8 {
        const COLLECTION = 1 << 0;
        const DICTIONARY = 1 << 1;
        const IMMUTABLE = 1 << 2;
        const CONCURRENT = 1 << 3;
        const READ_ONLY = 1 << 4;
        const PRIMITIVE = 1 << 5;
        const CONVERTIBLE = 1 << 6;
    }
}

/// Structural classification of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SystemType {
    Unknown,
    Unit,

    // Primitives
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,

    // Scalars with identity or text semantics
    Decimal,
    String,
    Str,
    Uuid,
    Url,
    Path,
    IpAddress,

    // Date and time
    DateTime,
    DateTimeOffset,
    NaiveDateTime,
    Date,
    Time,
    Duration,
    SystemTime,

    // Wrappers
    Nullable,
    Boxed,
    AsyncResult,
    Range,
    RangeInclusive,
    KeyValuePair,

    // Collections
    Array,
    List,
    Deque,
    LinkedList,
    PriorityQueue,
    HashSet,
    SortedSet,
    OrderedSet,
    Enumerable,

    // Dictionaries
    Dictionary,
    SortedDictionary,
    OrderedDictionary,

    // Immutable shapes
    ImmutableArray,
    ImmutableList,
    ImmutableString,
    ImmutableDictionary,
    ImmutableSet,

    // Read-only views
    ReadOnlyCollection,
    ReadOnlyList,

    // Concurrent collections
    ConcurrentDictionary,
    ConcurrentSet,
}

impl SystemType {
    /// Every variant, in declaration order
    pub const ALL: [SystemType; 59] = [
        SystemType::Unknown,
        SystemType::Unit,
        SystemType::Bool,
        SystemType::Char,
        SystemType::I8,
        SystemType::I16,
        SystemType::I32,
        SystemType::I64,
        SystemType::I128,
        SystemType::Isize,
        SystemType::U8,
        SystemType::U16,
        SystemType::U32,
        SystemType::U64,
        SystemType::U128,
        SystemType::Usize,
        SystemType::F32,
        SystemType::F64,
        SystemType::Decimal,
        SystemType::String,
        SystemType::Str,
        SystemType::Uuid,
        SystemType::Url,
        SystemType::Path,
        SystemType::IpAddress,
        SystemType::DateTime,
        SystemType::DateTimeOffset,
        SystemType::NaiveDateTime,
        SystemType::Date,
        SystemType::Time,
        SystemType::Duration,
        SystemType::SystemTime,
        SystemType::Nullable,
        SystemType::Boxed,
        SystemType::AsyncResult,
        SystemType::Range,
        SystemType::RangeInclusive,
        SystemType::KeyValuePair,
        SystemType::Array,
        SystemType::List,
        SystemType::Deque,
        SystemType::LinkedList,
        SystemType::PriorityQueue,
        SystemType::HashSet,
        SystemType::SortedSet,
        SystemType::OrderedSet,
        SystemType::Enumerable,
        SystemType::Dictionary,
        SystemType::SortedDictionary,
        SystemType::OrderedDictionary,
        SystemType::ImmutableArray,
        SystemType::ImmutableList,
        SystemType::ImmutableString,
        SystemType::ImmutableDictionary,
        SystemType::ImmutableSet,
        SystemType::ReadOnlyCollection,
        SystemType::ReadOnlyList,
        SystemType::ConcurrentDictionary,
        SystemType::ConcurrentSet,
    ];

    /// Predicate bits for this variant. Exhaustive: adding a variant without
    /// deciding its flags is a compile error.
    pub const fn flags(self) -> ShapeFlags {
        const SCALAR: ShapeFlags = ShapeFlags::PRIMITIVE.union(ShapeFlags::CONVERTIBLE);
        const MAP: ShapeFlags = ShapeFlags::COLLECTION.union(ShapeFlags::DICTIONARY);
        const FROZEN: ShapeFlags = ShapeFlags::IMMUTABLE.union(ShapeFlags::READ_ONLY);

        match self {
            SystemType::Unknown | SystemType::Unit => ShapeFlags::empty(),

            SystemType::Bool
            | SystemType::Char
            | SystemType::I8
            | SystemType::I16
            | SystemType::I32
            | SystemType::I64
            | SystemType::I128
            | SystemType::Isize
            | SystemType::U8
            | SystemType::U16
            | SystemType::U32
            | SystemType::U64
            | SystemType::U128
            | SystemType::Usize
            | SystemType::F32
            | SystemType::F64 => SCALAR,

            SystemType::Decimal
            | SystemType::String
            | SystemType::Str
            | SystemType::DateTime
            | SystemType::NaiveDateTime => ShapeFlags::CONVERTIBLE,

            SystemType::Uuid
            | SystemType::Url
            | SystemType::Path
            | SystemType::IpAddress
            | SystemType::DateTimeOffset
            | SystemType::Date
            | SystemType::Time
            | SystemType::Duration
            | SystemType::SystemTime => ShapeFlags::empty(),

            SystemType::Nullable
            | SystemType::Boxed
            | SystemType::AsyncResult
            | SystemType::Range
            | SystemType::RangeInclusive
            | SystemType::KeyValuePair => ShapeFlags::empty(),

            SystemType::Array
            | SystemType::List
            | SystemType::Deque
            | SystemType::LinkedList
            | SystemType::PriorityQueue
            | SystemType::HashSet
            | SystemType::SortedSet
            | SystemType::OrderedSet
            | SystemType::Enumerable => ShapeFlags::COLLECTION,

            SystemType::Dictionary | SystemType::SortedDictionary | SystemType::OrderedDictionary => {
                MAP
            }

            SystemType::ImmutableArray | SystemType::ImmutableList | SystemType::ImmutableSet => {
                FROZEN.union(ShapeFlags::COLLECTION)
            }
            SystemType::ImmutableDictionary => FROZEN.union(MAP),
            SystemType::ImmutableString => FROZEN,

            SystemType::ReadOnlyCollection | SystemType::ReadOnlyList => {
                ShapeFlags::COLLECTION.union(ShapeFlags::READ_ONLY)
            }

            SystemType::ConcurrentDictionary => MAP.union(ShapeFlags::CONCURRENT),
            SystemType::ConcurrentSet => ShapeFlags::COLLECTION.union(ShapeFlags::CONCURRENT),
        }
    }

    pub fn is_collection(self) -> bool {
        self.flags().contains(ShapeFlags::COLLECTION)
    }

    pub fn is_dictionary(self) -> bool {
        self.flags().contains(ShapeFlags::DICTIONARY)
    }

    pub fn is_immutable(self) -> bool {
        self.flags().contains(ShapeFlags::IMMUTABLE)
    }

    pub fn is_concurrent(self) -> bool {
        self.flags().contains(ShapeFlags::CONCURRENT)
    }

    pub fn is_read_only(self) -> bool {
        self.flags().contains(ShapeFlags::READ_ONLY)
    }

    pub fn is_primitive(self) -> bool {
        self.flags().contains(ShapeFlags::PRIMITIVE)
    }

    pub fn is_convertible(self) -> bool {
        self.flags().contains(ShapeFlags::CONVERTIBLE)
    }
}

impl std::fmt::Display for SystemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
