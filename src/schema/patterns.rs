//! Process-wide compiled pattern cache
//!
//! The built-in email and URL matchers are initialised once on first use
//! and never change afterwards. User patterns are compiled by the schema
//! compiler and interned by their text, so a pattern shared by many fields
//! or many schemas is compiled exactly once. Compiled fields hold the
//! returned `Arc<Regex>` directly; validation never touches the intern
//! table.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, OnceLock, PoisonError};

use regex::Regex;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$";

const URL_PATTERN: &str = r"^https?://[^\s/$.?#][^\s]*$";

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"));

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(URL_PATTERN).expect("url pattern is a valid regex"));

static INTERNED: OnceLock<Mutex<HashMap<String, Arc<Regex>>>> = OnceLock::new();

/// Returns true if `s` is a syntactically valid email address.
pub fn is_email(s: &str) -> bool {
    EMAIL.is_match(s)
}

/// Returns true if `s` is an absolute http(s) URL.
pub fn is_url(s: &str) -> bool {
    URL.is_match(s)
}

/// Returns the compiled form of `pattern`, compiling it on first request.
///
/// Malformed patterns are not cached; the error is returned to the
/// compiler every time.
pub fn intern(pattern: &str) -> Result<Arc<Regex>, regex::Error> {
    let table = INTERNED.get_or_init(|| Mutex::new(HashMap::new()));
    let mut table = table.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(regex) = table.get(pattern) {
        return Ok(Arc::clone(regex));
    }

    let regex = Arc::new(Regex::new(pattern)?);
    table.insert(pattern.to_string(), Arc::clone(&regex));
    Ok(regex)
}
