//! Member resolution: static accessor tables, resolver capability and the
//! per-type descriptor cache.

pub(crate) mod builtin;
mod resolver;

use crate::{
    traits::Object,
    value::{Slot, Value, ValueType},
};
use std::fmt;
use thiserror::Error as ThisError;

// re-exports
pub use resolver::{CachingResolver, MemberResolver, TableResolver, default_resolver};

/// Read one member from an object.
pub type Getter = for<'a> fn(&'a dyn Object) -> Result<Slot<'a>, MemberError>;

/// Replace one member value on an object.
pub type Setter = fn(&mut dyn Object, Value) -> Result<(), MemberError>;

/// Borrow an object-typed member mutably; `None` when the member is null.
pub type ChildMut =
    for<'a> fn(&'a mut dyn Object) -> Result<Option<&'a mut dyn Object>, MemberError>;

/// Invoke one method with already evaluated arguments.
pub type Invoker = fn(&dyn Object, &[Value]) -> Result<Value, MemberError>;

///
/// MemberDescriptor
///
/// One entry of an object's static attribute table.
///

#[derive(Clone, Copy)]
pub struct MemberDescriptor {
    pub name: &'static str,
    pub get: Getter,
    pub set: Option<Setter>,
    pub child_mut: Option<ChildMut>,
}

impl MemberDescriptor {
    /// Construct a read-only descriptor.
    #[must_use]
    pub const fn read_only(name: &'static str, get: Getter) -> Self {
        Self {
            name,
            get,
            set: None,
            child_mut: None,
        }
    }

    #[must_use]
    pub const fn with_setter(mut self, set: Setter) -> Self {
        self.set = Some(set);
        self
    }

    #[must_use]
    pub const fn with_child_mut(mut self, child_mut: ChildMut) -> Self {
        self.child_mut = Some(child_mut);
        self
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("settable", &self.set.is_some())
            .field("navigable", &self.child_mut.is_some())
            .finish()
    }
}

///
/// MethodDescriptor
///
/// One entry of an object's static method table. `arity` of `None` accepts
/// any argument count.
///

#[derive(Clone, Copy)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub arity: Option<usize>,
    pub invoke: Invoker,
}

impl MethodDescriptor {
    #[must_use]
    pub const fn new(name: &'static str, arity: usize, invoke: Invoker) -> Self {
        Self {
            name,
            arity: Some(arity),
            invoke,
        }
    }

    #[must_use]
    pub const fn variadic(name: &'static str, invoke: Invoker) -> Self {
        Self {
            name,
            arity: None,
            invoke,
        }
    }

    /// Check arity, then invoke.
    pub fn call(&self, receiver: &dyn Object, args: &[Value]) -> Result<Value, MemberError> {
        if let Some(expected) = self.arity
            && expected != args.len()
        {
            return Err(MemberError::Arity {
                method: self.name.to_string(),
                expected,
                found: args.len(),
            });
        }

        (self.invoke)(receiver, args)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

///
/// MemberError
///
/// Failure raised by an accessor or method body.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MemberError {
    #[error("expected {expected} value, found {found:?}")]
    TypeMismatch {
        expected: &'static str,
        found: ValueType,
    },

    #[error("value {value} is out of range for {target}")]
    OutOfRange { target: &'static str, value: i64 },

    #[error("accessor for '{expected}' applied to object of type '{found}'")]
    WrongReceiver {
        expected: &'static str,
        found: &'static str,
    },

    #[error("method '{method}' expects {expected} argument(s), found {found}")]
    Arity {
        method: String,
        expected: usize,
        found: usize,
    },

    #[error("member '{member}' is read-only")]
    ReadOnly { member: String },

    #[error("{0}")]
    Invocation(String),
}

/// Downcast an accessor receiver to its concrete type.
pub fn downcast_ref<T: Object>(object: &dyn Object) -> Result<&T, MemberError> {
    let found = object.type_name();
    object
        .as_any()
        .downcast_ref::<T>()
        .ok_or(MemberError::WrongReceiver {
            expected: std::any::type_name::<T>(),
            found,
        })
}

/// Mutable counterpart of [`downcast_ref`].
pub fn downcast_mut<T: Object>(object: &mut dyn Object) -> Result<&mut T, MemberError> {
    let found = object.type_name();
    object
        .as_any_mut()
        .downcast_mut::<T>()
        .ok_or(MemberError::WrongReceiver {
            expected: std::any::type_name::<T>(),
            found,
        })
}
