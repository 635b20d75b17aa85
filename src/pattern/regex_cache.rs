//! Thread-local cache of anchored regular expressions
//!
//! [`Pattern::regex`](super::Pattern::regex) compiles every expression
//! anchored at the match start (`\A(?:...)`). Grammars tend to rebuild the
//! same token patterns, so compiled programs are kept per thread and handed
//! out as cheap clones.

use hashbrown::HashMap;
use regex::Regex;
use std::cell::RefCell;

thread_local! {
    static ANCHORED: RefCell<HashMap<String, Regex>> = RefCell::new(HashMap::new());
}

/// Get the anchored program for `expr`, compiling it on first use
///
/// The returned regex only ever matches at the start of the haystack.
pub fn anchored(expr: &str) -> Result<Regex, regex::Error> {
    ANCHORED.with(|cache| {
        if let Some(regex) = cache.borrow().get(expr) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(&format!(r"\A(?:{})", expr))?;
        cache.borrow_mut().insert(expr.to_string(), regex.clone());
        Ok(regex)
    })
}

/// Drop every cached program on this thread
pub fn clear() {
    ANCHORED.with(|cache| cache.borrow_mut().clear());
}

/// Number of programs cached on this thread
pub fn len() -> usize {
    ANCHORED.with(|cache| cache.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiles_once() {
        clear();
        assert!(anchored("[0-9]+").is_ok());
        assert!(anchored("[0-9]+").is_ok());
        assert_eq!(len(), 1);
        assert!(anchored("[a-z]+").is_ok());
        assert_eq!(len(), 2);
    }

    #[test]
    fn test_invalid_expression_is_not_cached() {
        clear();
        assert!(anchored("[unclosed").is_err());
        assert_eq!(len(), 0);
    }

    #[test]
    fn test_anchoring() {
        let r = anchored("b+").unwrap();
        assert!(r.find("abbb").is_none());
        assert_eq!(r.find("bbba").map(|m| m.end()), Some(3));
    }

    #[test]
    fn test_alternation_is_grouped() {
        let r = anchored("x|ab").unwrap();
        assert!(r.find("cab").is_none());
        assert_eq!(r.find("ab").map(|m| m.end()), Some(2));
    }
}
