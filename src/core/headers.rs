//! Header Normalization
//!
//! Canonical, deduplicated outgoing header collection.

use std::collections::HashMap;

/// Canonical header name: first character uppercased, the rest lowercased.
///
/// `content-TYPE` becomes `Content-type`.
pub fn canonical_name(name: &str) -> String {
    let name = name.trim();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Format `value` as a `"Name: value"` line unless it already is one.
fn header_line(name: &str, value: &str) -> String {
    let already_formatted = value.len() > name.len()
        && value.is_char_boundary(name.len())
        && value[..name.len()].eq_ignore_ascii_case(name)
        && value.as_bytes()[name.len()] == b':';

    if already_formatted {
        value.to_string()
    } else {
        format!("{}: {}", canonical_name(name), value)
    }
}

/// Ordered header lines keyed by case-insensitive name.
///
/// Each entry holds one fully formatted `"Name: value"` line. Replacing an
/// existing entry keeps its position; new names append.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    /// Create an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a caller header, formatting the value as a header line.
    pub fn insert(&mut self, name: &str, value: &str) {
        let line = header_line(name.trim(), value);
        self.put(name, line);
    }

    /// Insert a header line exactly as given, replacing any entry with the
    /// same name.
    pub fn insert_line(&mut self, name: &str, line: impl Into<String>) {
        self.put(name, line.into());
    }

    fn put(&mut self, name: &str, line: String) {
        let key = canonical_name(name);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = line,
            None => self.entries.push((key, line)),
        }
    }

    /// Get the header line for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        let key = canonical_name(name);
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, line)| line.as_str())
    }

    /// Check whether a header with `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Header names in wire order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Header lines in wire order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, line)| line.as_str())
    }

    /// Header lines as an owned list, as handed to the transport.
    pub fn to_lines(&self) -> Vec<String> {
        self.lines().map(str::to_string).collect()
    }

    /// Number of headers in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Header normalizer.
pub struct HeaderNormalizer;

impl HeaderNormalizer {
    /// Normalize caller headers into a [`HeaderSet`].
    ///
    /// Iteration order of `headers` decides the wire order and, for names that
    /// collide case-insensitively, which value wins (the last one).
    pub fn normalize<'a, I>(headers: I) -> HeaderSet
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut set = HeaderSet::new();
        for (name, value) in headers {
            if name.trim().is_empty() {
                continue;
            }
            set.insert(name, value);
        }
        set
    }

    /// Normalize a map whose iteration order is unspecified.
    ///
    /// Names are sorted first so the result does not depend on hash order.
    pub fn normalize_map(headers: &HashMap<String, String>) -> HeaderSet {
        let mut sorted: Vec<_> = headers.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        Self::normalize(sorted)
    }
}
