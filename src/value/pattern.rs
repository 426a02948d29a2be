use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use regex::Regex;

thread_local! {
    /// Compiled patterns, memoized by their source text. Scripts tend to
    /// re-evaluate the same `//…//` literal many times (validation rules run
    /// per record), so compilation must happen once per distinct source.
    static PATTERN_CACHE: RefCell<HashMap<String, Rc<Regex>>> = RefCell::new(HashMap::new());
}

/// A `//…//` pattern literal: the raw source plus its compiled matcher.
#[derive(Debug, Clone)]
pub struct PatternValue {
    pub source: Rc<str>,
    pub regex: Rc<Regex>,
}

impl PatternValue {
    /// Compile (or fetch the memoized compilation of) a pattern source.
    pub fn compile(source: &str) -> Result<Self, String> {
        let regex = PATTERN_CACHE.with(|cache| {
            if let Some(re) = cache.borrow().get(source) {
                return Ok(re.clone());
            }
            match Regex::new(source) {
                Ok(re) => {
                    let re = Rc::new(re);
                    cache
                        .borrow_mut()
                        .insert(source.to_string(), re.clone());
                    Ok(re)
                }
                Err(err) => Err(err.to_string()),
            }
        })?;
        Ok(Self {
            source: Rc::from(source),
            regex,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for PatternValue {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

#[cfg(test)]
mod tests {
    use super::PatternValue;
    use std::rc::Rc;

    #[test]
    fn compile_is_memoized_by_source() {
        let a = PatternValue::compile("[0-9]+").unwrap();
        let b = PatternValue::compile("[0-9]+").unwrap();
        assert!(Rc::ptr_eq(&a.regex, &b.regex));
    }

    #[test]
    fn invalid_pattern_reports_error() {
        assert!(PatternValue::compile("(unclosed").is_err());
    }

    #[test]
    fn matching_is_partial() {
        let p = PatternValue::compile("[0-9]{3}").unwrap();
        assert!(p.is_match("abc123"));
        assert!(!p.is_match("ab12"));
    }
}
