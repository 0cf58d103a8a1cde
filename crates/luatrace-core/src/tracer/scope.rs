/*!
# Scope Snapshots

Ordered set of local names visible at one point of sequential execution.
Snapshots are plain values: every node gets its own copy.
*/

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    names: Vec<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Add `name`; a shadowing redeclaration keeps its first position.
    pub fn bind(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.contains(&name) {
            self.names.push(name);
        }
    }

    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.bind(name);
        }
    }

    /// A copy of this scope with `names` added.
    pub fn with<I, S>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut scope = self.clone();
        scope.extend(names);
        scope
    }

    /// Render as a self-keyed table constructor: `{a=a, b=b}`.
    pub fn to_record(&self) -> String {
        let fields: Vec<String> = self.names.iter().map(|n| format!("{n}={n}")).collect();
        format!("{{{}}}", fields.join(", "))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_record())
    }
}

impl<S: Into<String>> FromIterator<S> for Scope {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut scope = Scope::new();
        scope.extend(iter);
        scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_rendering() {
        assert_eq!(Scope::new().to_record(), "{}");
        let scope: Scope = ["a", "f"].into_iter().collect();
        assert_eq!(scope.to_record(), "{a=a, f=f}");
    }

    #[test]
    fn test_with_leaves_original_untouched() {
        let outer: Scope = ["a"].into_iter().collect();
        let inner = outer.with(["b"]);
        assert_eq!(outer.names(), &["a"]);
        assert_eq!(inner.names(), &["a", "b"]);
    }

    #[test]
    fn test_shadowing_keeps_single_entry() {
        let mut scope: Scope = ["a", "b"].into_iter().collect();
        scope.bind("a");
        assert_eq!(scope.names(), &["a", "b"]);
    }
}
