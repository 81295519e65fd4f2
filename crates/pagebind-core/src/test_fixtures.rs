//! Shared object fixtures for unit tests.

use crate::{
    member::{MemberError, MethodDescriptor, downcast_ref},
    traits::Object,
    value::Value,
};
use pagebind_derive::Members;

#[derive(Clone, Debug, Default, Members, PartialEq)]
pub struct Address {
    pub city: String,
    pub zip: Option<String>,
}

#[derive(Clone, Debug, Default, Members, PartialEq)]
#[members(methods = PERSON_METHODS)]
pub struct Person {
    pub name: String,
    pub age: i64,
    pub address: Option<Address>,

    #[members(readonly)]
    pub id: i64,

    #[members(rename = "nick")]
    pub nickname: Option<String>,

    #[members(skip)]
    pub secret: String,
}

impl Person {
    pub fn new(id: i64, name: &str, age: i64) -> Self {
        Self {
            id,
            name: name.to_string(),
            age,
            ..Self::default()
        }
    }

    pub fn living_in(mut self, city: &str) -> Self {
        self.address = Some(Address {
            city: city.to_string(),
            zip: None,
        });
        self
    }
}

const PERSON_METHODS: &[MethodDescriptor] = &[
    MethodDescriptor::new("greet", 1, greet),
    MethodDescriptor::new("initial", 0, initial),
    MethodDescriptor::new("home", 0, home),
];

fn greet(object: &dyn Object, args: &[Value]) -> Result<Value, MemberError> {
    let person = downcast_ref::<Person>(object)?;
    Ok(Value::Text(format!(
        "{} {}",
        args[0].to_concat_string(),
        person.name
    )))
}

fn initial(object: &dyn Object, _args: &[Value]) -> Result<Value, MemberError> {
    let person = downcast_ref::<Person>(object)?;
    Ok(person
        .name
        .chars()
        .next()
        .map_or(Value::Null, |c| Value::Text(c.to_string())))
}

fn home(object: &dyn Object, _args: &[Value]) -> Result<Value, MemberError> {
    let person = downcast_ref::<Person>(object)?;
    Ok(person.address.clone().map_or(Value::Null, Value::object))
}
