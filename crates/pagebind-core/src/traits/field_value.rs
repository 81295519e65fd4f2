use crate::{
    member::MemberError,
    traits::Object,
    value::{Float64, Slot, Value},
};

///
/// FieldValue
///
/// Conversion between a Rust field type and the runtime `Value` model.
/// `to_slot` lets object-typed fields hand out a borrow instead of a clone;
/// `as_object_mut` exposes object-typed fields to mutable path navigation.
///

pub trait FieldValue {
    fn to_value(&self) -> Value;

    fn to_slot(&self) -> Slot<'_> {
        Slot::Owned(self.to_value())
    }

    fn as_object_mut(&mut self) -> Option<&mut dyn Object> {
        None
    }

    fn from_value(value: Value) -> Result<Self, MemberError>
    where
        Self: Sized;
}

fn mismatch(expected: &'static str, value: &Value) -> MemberError {
    MemberError::TypeMismatch {
        expected,
        found: value.value_type(),
    }
}

impl FieldValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self, MemberError> {
        Ok(value)
    }
}

impl FieldValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, MemberError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl FieldValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, MemberError> {
        match value {
            Value::Text(text) => Ok(text),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl FieldValue for Float64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, MemberError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(n) => {
                #[expect(clippy::cast_precision_loss)]
                let widened = n as f64;
                Self::try_new(widened).ok_or_else(|| mismatch("float", &Value::Int(n)))
            }
            other => Err(mismatch("float", &other)),
        }
    }
}

impl FieldValue for f64 {
    fn to_value(&self) -> Value {
        Float64::try_new(*self).map_or(Value::Null, Value::Float)
    }

    fn from_value(value: Value) -> Result<Self, MemberError> {
        Float64::from_value(value).map(Float64::get)
    }
}

// Integer types convert through i64 with range checks on the way back in.
// Values of the wide unsigned types that exceed i64 saturate at i64::MAX.
macro_rules! impl_field_value_int {
    ($($ty:ty => $widen:expr),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Int($widen(*self))
                }

                fn from_value(value: Value) -> Result<Self, MemberError> {
                    match value {
                        Value::Int(n) => <$ty>::try_from(n).map_err(|_| MemberError::OutOfRange {
                            target: stringify!($ty),
                            value: n,
                        }),
                        other => Err(mismatch(stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

fn saturating_i64(n: impl TryInto<i64>) -> i64 {
    n.try_into().unwrap_or(i64::MAX)
}

impl_field_value_int!(
    i8 => i64::from,
    i16 => i64::from,
    i32 => i64::from,
    i64 => std::convert::identity,
    u8 => i64::from,
    u16 => i64::from,
    u32 => i64::from,
    u64 => saturating_i64,
    usize => saturating_i64,
);

impl<T: FieldValue> FieldValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, FieldValue::to_value)
    }

    fn to_slot(&self) -> Slot<'_> {
        self.as_ref().map_or(Slot::null(), FieldValue::to_slot)
    }

    fn as_object_mut(&mut self) -> Option<&mut dyn Object> {
        self.as_mut().and_then(FieldValue::as_object_mut)
    }

    fn from_value(value: Value) -> Result<Self, MemberError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, MemberError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch("list", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_maps_none_to_null() {
        let none: Option<String> = None;

        assert_eq!(none.to_value(), Value::Null);
        assert!(none.to_slot().is_null());
        assert_eq!(
            Option::<String>::from_value(Value::Null).expect("null should decode"),
            None
        );
    }

    #[test]
    fn integers_are_range_checked() {
        let err = u8::from_value(Value::Int(300)).expect_err("300 must not fit in u8");

        assert!(matches!(err, MemberError::OutOfRange { target: "u8", .. }));
        assert_eq!(u32::from_value(Value::Int(7)).expect("7 fits"), 7);
    }

    #[test]
    fn wide_unsigned_values_saturate_instead_of_wrapping() {
        assert_eq!(u64::MAX.to_value(), Value::Int(i64::MAX));
        assert_eq!(usize::MAX.to_value(), Value::Int(i64::MAX));
        assert_eq!(42_u64.to_value(), Value::Int(42));
        assert_eq!((-3_i8).to_value(), Value::Int(-3));
    }

    #[test]
    fn lists_round_trip_through_values() {
        let names = vec!["a".to_string(), "b".to_string()];
        let value = names.to_value();

        assert_eq!(value, Value::list(["a", "b"]));
        assert_eq!(
            Vec::<String>::from_value(value).expect("list should decode"),
            names
        );
    }

    #[test]
    fn text_rejects_numbers() {
        let err = String::from_value(Value::Int(1)).expect_err("int is not text");

        assert!(matches!(err, MemberError::TypeMismatch { expected: "text", .. }));
    }
}
