use crate::query::QueryError;
use regex::Regex;
use std::collections::HashMap;

///
/// LikeCache
///
/// Compiled LIKE patterns keyed by the (already normalized) pattern text.
/// Lives for one evaluation run only.
///

#[derive(Debug, Default)]
pub(crate) struct LikeCache {
    compiled: HashMap<String, Regex>,
}

impl LikeCache {
    pub(crate) fn matches(&mut self, pattern: &str, text: &str) -> Result<bool, QueryError> {
        if let Some(regex) = self.compiled.get(pattern) {
            return Ok(regex.is_match(text));
        }

        let regex = compile(pattern)?;
        let matched = regex.is_match(text);
        self.compiled.insert(pattern.to_string(), regex);

        Ok(matched)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.compiled.len()
    }
}

// `%` matches any sequence, `_` any single character; everything else is
// literal. The whole text must match.
fn compile(pattern: &str) -> Result<Regex, QueryError> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push_str("(?s)^");

    let mut literal = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut literal))),
        }
    }
    source.push('$');

    Regex::new(&source).map_err(|err| QueryError::InvalidLikePattern {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_translate() {
        let mut cache = LikeCache::default();

        assert!(cache.matches("a%", "abc").expect("pattern should compile"));
        assert!(cache.matches("a_c", "abc").expect("pattern should compile"));
        assert!(!cache.matches("a_c", "abbc").expect("pattern should compile"));
        assert!(!cache.matches("b%", "abc").expect("pattern should compile"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let mut cache = LikeCache::default();

        assert!(cache.matches("1.5%", "1.5 kg").expect("pattern should compile"));
        assert!(!cache.matches("1.5%", "125 kg").expect("pattern should compile"));
        assert!(cache.matches("(x)*", "(x)*").expect("pattern should compile"));
    }

    #[test]
    fn patterns_compile_once_per_run() {
        let mut cache = LikeCache::default();
        for text in ["ab", "ac", "bd"] {
            let _ = cache.matches("a%", text).expect("pattern should compile");
        }

        assert_eq!(cache.len(), 1);
    }
}
