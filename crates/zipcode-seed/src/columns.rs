//! Column selection for a seed run.

use std::fmt;

/// Ordered set of column names requested by the caller.
///
/// An empty spec means "every column in the CSV header".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSpec {
    names: Vec<String>,
}

impl ColumnSpec {
    /// A spec selecting every column of the source file.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parses a comma-separated list such as `"zip, city,state"`.
    ///
    /// Names are trimmed, blank entries are dropped and repeats collapse to
    /// their first occurrence.
    pub fn parse(list: &str) -> Self {
        list.split(',').collect()
    }

    /// Builds a spec from an optional `--columns` value.
    pub fn from_option(list: Option<&str>) -> Self {
        list.map(Self::parse).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    fn push(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() && !self.contains(name) {
            self.names.push(name.to_string());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for ColumnSpec {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut spec = Self::default();
        for name in iter {
            spec.push(name.as_ref());
        }
        spec
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("*")
        } else {
            f.write_str(&self.names.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_dedups() {
        let spec = ColumnSpec::parse(" zip, city ,,zip,state ");
        let names: Vec<&str> = spec.iter().collect();
        assert_eq!(names, vec!["zip", "city", "state"]);
    }

    #[test]
    fn test_empty_option_means_all() {
        assert!(ColumnSpec::from_option(None).is_empty());
        assert!(ColumnSpec::from_option(Some("")).is_empty());
        assert!(ColumnSpec::from_option(Some(" , ")).is_empty());
        assert_eq!(ColumnSpec::all().to_string(), "*");
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let spec = ColumnSpec::parse("Zip,zip");
        assert_eq!(spec.len(), 2);
        assert!(spec.contains("Zip"));
        assert!(!spec.contains("ZIP"));
    }
}
