mod compare;
mod composite;
mod float;


use crate::traits::Object;
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

// re-exports
pub use compare::{canonical_cmp, numeric_eq, strict_order_cmp};
pub use composite::CompositeValue;
pub use float::{Float64, NonFiniteFloat};

///
/// Value
///
/// Runtime value produced by path evaluation and consumed by the query
/// evaluator. The variant set is closed; canonical ordering ranks variants
/// in declaration order.
///
/// Null       → absent value (null navigation, optional members)
/// Composite  → synthetic multi-part key built from a composite attribute
/// Object     → shared handle to a runtime object exposing members
///

#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(Float64),
    Text(String),
    List(Vec<Self>),
    Composite(CompositeValue),
    Object(ObjectRef),
}

impl Value {
    /// Construct a float value, mapping non-finite input to `None`.
    #[must_use]
    pub fn float(v: f64) -> Option<Self> {
        Float64::try_new(v).map(Self::Float)
    }

    /// Wrap a runtime object in a shared value handle.
    #[must_use]
    pub fn object<T: Object>(object: T) -> Self {
        Self::Object(ObjectRef::new(object))
    }

    #[must_use]
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for null and for text that is empty or whitespace-only.
    #[must_use]
    pub fn is_null_or_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Numeric view used for widening comparisons between `Int` and `Float`.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(f.get()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Any,
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Text(_) => ValueType::Text,
            Self::List(_) => ValueType::List,
            Self::Composite(_) => ValueType::Composite,
            Self::Object(_) => ValueType::Object,
        }
    }

    // Canonical variant rank; ordering across variants is rank-only.
    pub(crate) const fn canonical_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Float(_) => 3,
            Self::Text(_) => 4,
            Self::List(_) => 5,
            Self::Composite(_) => 6,
            Self::Object(_) => 7,
        }
    }

    /// Render the value for string concatenation; null renders empty.
    #[must_use]
    pub fn to_concat_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        canonical_cmp(self, other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        canonical_cmp(self, other)
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_rank().hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(n) => n.hash(state),
            Self::Float(f) => f.hash(state),
            Self::Text(text) => text.hash(state),
            Self::List(items) => items.hash(state),
            Self::Composite(composite) => composite.hash(state),
            Self::Object(object) => object.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{:?}", x.get()),
            Self::Text(text) => write!(f, "{text}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Composite(composite) => write!(f, "{composite}"),
            Self::Object(object) => write!(f, "{}", object.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<Float64> for Value {
    fn from(f: Float64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<CompositeValue> for Value {
    fn from(c: CompositeValue) -> Self {
        Self::Composite(c)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

///
/// ValueType
///
/// Declared value type of a query attribute. `Any` accepts every variant.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ValueType {
    #[default]
    Any,
    Bool,
    Int,
    Float,
    Text,
    List,
    Composite,
    Object,
}

impl ValueType {
    /// Whether a literal of type `other` may be compared against this type.
    #[must_use]
    pub const fn accepts(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Any, _)
                | (_, Self::Any)
                | (Self::Int | Self::Float, Self::Int | Self::Float)
        ) || self as u8 == other as u8
    }
}

///
/// ObjectRef
///
/// Shared handle to a runtime object. Identity (pointer) semantics for
/// equality, ordering and hashing.
///

#[derive(Clone)]
pub struct ObjectRef(Arc<dyn Object>);

impl ObjectRef {
    #[must_use]
    pub fn new<T: Object>(object: T) -> Self {
        Self(Arc::new(object))
    }

    #[must_use]
    pub fn from_arc(object: Arc<dyn Object>) -> Self {
        Self(object)
    }

    #[must_use]
    pub fn get(&self) -> &dyn Object {
        self.0.as_ref()
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// Borrow the concrete object when it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_ref(), f)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for ObjectRef {}

impl Ord for ObjectRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.type_name()
            .cmp(other.type_name())
            .then_with(|| self.addr().cmp(&other.addr()))
    }
}

impl PartialOrd for ObjectRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

///
/// Slot
///
/// Current position of a path walk: either a borrowed object inside the
/// evaluation root, or an owned value. Borrowing lets navigation pass
/// through nested structs without cloning them.
///

#[derive(Clone, Debug)]
pub enum Slot<'a> {
    Ref(&'a dyn Object),
    Owned(Value),
}

impl Slot<'_> {
    #[must_use]
    pub const fn null() -> Self {
        Self::Owned(Value::Null)
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Owned(Value::Null))
    }

    /// Materialize the slot into an owned value.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Ref(object) => Value::Object(object.clone_object()),
            Self::Owned(value) => value,
        }
    }

    /// Detach the slot from its borrow.
    #[must_use]
    pub fn into_owned(self) -> Slot<'static> {
        Slot::Owned(self.into_value())
    }

    /// Render the slot for diagnostics without cloning borrowed objects.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Ref(object) => format!("{object:?}"),
            Self::Owned(Value::Text(text)) => format!("{text:?}"),
            Self::Owned(value) => value.to_string(),
        }
    }
}

impl From<Value> for Slot<'_> {
    fn from(value: Value) -> Self {
        Self::Owned(value)
    }
}
