//! Tag sets attached to provider identities.

use std::collections::BTreeMap;
use std::fmt;

/// Ordered key/value pairs that refine a provider [`Key`](crate::Key).
///
/// Tags let several providers of the same type coexist and be selected
/// individually at resolution time. Matching is a superset check: a request
/// matches a stored tag set when every requested pair is present in the
/// stored set. A stored value of `"*"` matches any requested value for
/// that key.
///
/// # Examples
///
/// ```rust
/// use lattice_di::Tags;
///
/// let stored = Tags::new().with("role", "primary").with("zone", "*");
/// assert!(stored.matches(&Tags::new().with("role", "primary")));
/// assert!(stored.matches(&Tags::new().with("zone", "eu-west")));
/// assert!(!stored.matches(&Tags::new().with("role", "replica")));
/// // The empty request matches everything.
/// assert!(stored.matches(&Tags::new()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Tags(BTreeMap<&'static str, &'static str>);

impl Tags {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Tags(BTreeMap::new())
    }

    /// Returns a copy of this tag set with the given pair added.
    pub fn with(mut self, key: &'static str, value: &'static str) -> Self {
        self.0.insert(key, value);
        self
    }

    /// Inserts a pair in place.
    pub fn insert(&mut self, key: &'static str, value: &'static str) {
        self.0.insert(key, value);
    }

    /// Looks up a tag value.
    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.0.get(key).copied()
    }

    /// True if no tags are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Superset check against a requested tag set.
    ///
    /// Every requested pair must be present here; a stored `"*"` value
    /// accepts any requested value for its key.
    pub fn matches(&self, requested: &Tags) -> bool {
        for (key, want) in requested.iter() {
            match self.0.get(key) {
                Some(&"*") => continue,
                Some(have) if *have == want => continue,
                _ => return false,
            }
        }
        true
    }
}

impl fmt::Display for Tags {
    /// Renders as `[k:v;k:v]`, or nothing when empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        write!(f, "[")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            write!(f, "{}:{}", k, v)?;
        }
        write!(f, "]")
    }
}

impl FromIterator<(&'static str, &'static str)> for Tags {
    fn from_iter<I: IntoIterator<Item = (&'static str, &'static str)>>(iter: I) -> Self {
        Tags(iter.into_iter().collect())
    }
}
