mod field_value;

use crate::{
    member::{MemberDescriptor, MethodDescriptor},
    value::ObjectRef,
};
use std::{any::Any, fmt::Debug};

// re-exports
pub use field_value::FieldValue;

///
/// Object
///
/// Runtime-typed item that exposes named members and methods to path
/// evaluation. Implementations are normally generated by
/// `#[derive(Members)]`; the tables are static so resolvers can cache
/// descriptors per concrete type.
///

pub trait Object: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Short type label used in diagnostics.
    fn type_name(&self) -> &'static str;

    /// Static accessor table for attributes.
    fn members(&self) -> &'static [MemberDescriptor];

    /// Static method table.
    fn methods(&self) -> &'static [MethodDescriptor] {
        &[]
    }

    /// Clone this object into a shared value handle.
    fn clone_object(&self) -> ObjectRef;
}

///
/// Localizer
///
/// Narrow localization contract used only to render attribute and operator
/// titles. Returns `None` when no resource exists for the key.
///

pub trait Localizer {
    fn localize(&self, key: &str) -> Option<String>;
}

///
/// NoLocalizer
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoLocalizer;

impl Localizer for NoLocalizer {
    fn localize(&self, _key: &str) -> Option<String> {
        None
    }
}

impl<F> Localizer for F
where
    F: Fn(&str) -> Option<String>,
{
    fn localize(&self, key: &str) -> Option<String> {
        self(key)
    }
}
