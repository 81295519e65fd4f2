use crate::{
    config::SyntaxVersion,
    path::{ParseError, PathExpr},
    traits::Localizer,
    value::ValueType,
};
use convert_case::{Case, Casing};
use std::fmt;

///
/// PathAttr
///
/// Queryable attribute backed by a path expression. The name defaults to
/// the path's alias, then to its source text.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathAttr {
    name: String,
    path: PathExpr,
    value_type: ValueType,
    title_key: Option<String>,
}

impl PathAttr {
    /// Parse `path` with the default syntax.
    pub fn new(path: &str, value_type: ValueType) -> Result<Self, ParseError> {
        Self::parse(path, SyntaxVersion::default(), value_type)
    }

    pub fn parse(
        path: &str,
        syntax: SyntaxVersion,
        value_type: ValueType,
    ) -> Result<Self, ParseError> {
        PathExpr::parse(path, syntax).map(|path| Self::from_path(path, value_type))
    }

    #[must_use]
    pub fn from_path(path: PathExpr, value_type: ValueType) -> Self {
        let name = path.alias().unwrap_or(path.source()).to_string();

        Self {
            name,
            path,
            value_type,
            title_key: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_title_key(mut self, key: impl Into<String>) -> Self {
        self.title_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn path(&self) -> &PathExpr {
        &self.path
    }

    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[must_use]
    pub fn title(&self, localizer: &dyn Localizer) -> String {
        title(&self.name, self.title_key.as_deref(), localizer)
    }
}

///
/// CompositeAttr
///
/// Ordered multi-part attribute, typically a multi-field identity key.
/// Its value is a `CompositeValue` holding one entry per part.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompositeAttr {
    name: String,
    parts: Vec<PathAttr>,
}

impl CompositeAttr {
    #[must_use]
    pub fn new(name: impl Into<String>, parts: Vec<PathAttr>) -> Self {
        Self {
            name: name.into(),
            parts,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parts(&self) -> &[PathAttr] {
        &self.parts
    }
}

///
/// QueryAttr
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueryAttr {
    Path(PathAttr),
    Composite(CompositeAttr),
}

impl QueryAttr {
    /// Untyped path attribute with the default syntax.
    pub fn path(path: &str) -> Result<Self, ParseError> {
        PathAttr::new(path, ValueType::Any).map(Self::Path)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Path(attr) => attr.name(),
            Self::Composite(attr) => attr.name(),
        }
    }

    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Path(attr) => attr.value_type(),
            Self::Composite(_) => ValueType::Composite,
        }
    }

    #[must_use]
    pub fn title(&self, localizer: &dyn Localizer) -> String {
        match self {
            Self::Path(attr) => attr.title(localizer),
            Self::Composite(attr) => title(&attr.name, None, localizer),
        }
    }
}

impl From<PathAttr> for QueryAttr {
    fn from(attr: PathAttr) -> Self {
        Self::Path(attr)
    }
}

impl From<CompositeAttr> for QueryAttr {
    fn from(attr: CompositeAttr) -> Self {
        Self::Composite(attr)
    }
}

impl fmt::Display for QueryAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Localized under the title key (or the name); otherwise the last path
// segment in title case, so `address.zipCode` renders as "Zip Code".
fn title(name: &str, key: Option<&str>, localizer: &dyn Localizer) -> String {
    localizer.localize(key.unwrap_or(name)).unwrap_or_else(|| {
        let last = name.rsplit('.').next().unwrap_or(name);
        last.to_case(Case::Title)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NoLocalizer;

    #[test]
    fn name_prefers_alias_over_source() {
        let attr = PathAttr::new("(as:city)address.city", ValueType::Text)
            .expect("path should parse");
        assert_eq!(attr.name(), "city");

        let attr = PathAttr::new(" address.city ", ValueType::Text).expect("path should parse");
        assert_eq!(attr.name(), "address.city");
    }

    #[test]
    fn titles_fall_back_to_title_case() {
        let attr = QueryAttr::path("address.zipCode").expect("path should parse");
        assert_eq!(attr.title(&NoLocalizer), "Zip Code");

        let localizer = |key: &str| (key == "address.zipCode").then(|| "Postcode".to_string());
        assert_eq!(attr.title(&localizer), "Postcode");
    }
}
