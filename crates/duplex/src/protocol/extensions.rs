//! Chunk extension metadata.
//!
//! Every chunk written to a chunked body may carry `name=value` extensions next to its size
//! line. [`Extensions`] keeps them as an ordered multimap: a name may appear more than once,
//! insertion order is preserved and names are compared ignoring ASCII case, the same way
//! HTTP header names are.

use std::fmt;

/// An ordered list of `name -> value` chunk extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    entries: Vec<(String, String)>,
}

impl Extensions {
    /// Creates an empty set of extensions.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Alias of [`Extensions::new`], reads better at call sites that pass "no extensions".
    #[inline]
    pub fn empty() -> Self {
        Self::new()
    }

    /// Appends an entry, builder style.
    #[must_use]
    pub fn with<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.insert(name, value);
        self
    }

    /// Appends an entry, keeping any existing entries with the same name.
    pub fn insert<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.entries.push((name.into(), value.into()));
    }

    /// Returns the value of the first entry with the given name.
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    /// Returns every value of the given name, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries.iter().filter(move |(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get_first(name).is_some()
    }

    /// Returns a copy of `self` merged with `other`.
    ///
    /// Names present in `other` replace all of their entries in `self`; `other`'s entries
    /// are appended after the surviving ones, keeping their own order.
    #[must_use]
    pub fn and(&self, other: &Extensions) -> Extensions {
        let mut entries: Vec<(String, String)> = self
            .entries
            .iter()
            .filter(|(name, _)| !other.contains(name))
            .cloned()
            .collect();
        entries.extend(other.entries.iter().cloned());
        Extensions { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Extensions {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect() }
    }
}

impl fmt::Display for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}
