//! Project properties keyed by a static tag
//!
//! A [`PropertyGroup`] holds at most one live [`Property`] per
//! [`PropertyKey`]. Single-valued settings such as the target framework can
//! therefore be updated from several places without ever producing two
//! competing entries.

use std::fmt;

/// Tag identifying a property. Known properties get their own variant;
/// anything else goes through [`PropertyKey::Named`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    TargetFramework,
    TargetFrameworks,
    RuntimeIdentifier,
    RuntimeIdentifiers,
    OutputType,
    Nullable,
    LangVersion,
    ImplicitUsings,
    TreatWarningsAsErrors,
    NoWarn,
    WarningsAsErrors,
    AnalysisLevel,
    EnableNetAnalyzers,
    Named(String),
}

impl PropertyKey {
    /// Element name used in the serialized descriptor
    #[must_use]
    pub fn element_name(&self) -> &str {
        match self {
            Self::TargetFramework => "TargetFramework",
            Self::TargetFrameworks => "TargetFrameworks",
            Self::RuntimeIdentifier => "RuntimeIdentifier",
            Self::RuntimeIdentifiers => "RuntimeIdentifiers",
            Self::OutputType => "OutputType",
            Self::Nullable => "Nullable",
            Self::LangVersion => "LangVersion",
            Self::ImplicitUsings => "ImplicitUsings",
            Self::TreatWarningsAsErrors => "TreatWarningsAsErrors",
            Self::NoWarn => "NoWarn",
            Self::WarningsAsErrors => "WarningsAsErrors",
            Self::AnalysisLevel => "AnalysisLevel",
            Self::EnableNetAnalyzers => "EnableNETAnalyzers",
            Self::Named(name) => name,
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// One property entry: one or more values plus optional condition and label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    key: PropertyKey,
    values: Vec<String>,
    separator: String,
    condition: Option<String>,
    label: Option<String>,
}

impl Property {
    #[must_use]
    pub fn new(key: PropertyKey) -> Self {
        Self {
            key,
            values: Vec::new(),
            separator: ";".to_string(),
            condition: None,
            label: None,
        }
    }

    #[must_use]
    pub fn key(&self) -> &PropertyKey {
        &self.key
    }

    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Replace all values with a single one
    pub fn set_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.values.clear();
        self.values.push(value.into());
        self
    }

    /// Append a value; multi-valued properties join them on serialization
    pub fn add_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.values.push(value.into());
        self
    }

    pub fn clear(&mut self) -> &mut Self {
        self.values.clear();
        self
    }

    pub fn set_separator(&mut self, separator: impl Into<String>) -> &mut Self {
        self.separator = separator.into();
        self
    }

    pub fn set_condition(&mut self, condition: impl Into<String>) -> &mut Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn set_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Values joined by the separator, blanks dropped, duplicates removed
    /// keeping the first occurrence.
    #[must_use]
    pub fn resolved_value(&self) -> String {
        let mut seen: Vec<&str> = Vec::with_capacity(self.values.len());
        for value in &self.values {
            let value = value.trim();
            if !value.is_empty() && !seen.contains(&value) {
                seen.push(value);
            }
        }
        seen.join(&self.separator)
    }
}

/// Ordered collection of properties, unique per key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyGroup {
    entries: Vec<Property>,
}

impl PropertyGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the live entry for `key`, appending a default one first if
    /// the group has none.
    pub fn get_or_add(&mut self, key: PropertyKey) -> &mut Property {
        let index = match self.entries.iter().position(|p| p.key == key) {
            Some(index) => index,
            None => {
                self.entries.push(Property::new(key));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }

    #[must_use]
    pub fn get(&self, key: &PropertyKey) -> Option<&Property> {
        self.entries.iter().find(|p| &p.key == key)
    }

    /// Drop the entry for `key`, returning it
    pub fn remove(&mut self, key: &PropertyKey) -> Option<Property> {
        let index = self.entries.iter().position(|p| &p.key == key)?;
        Some(self.entries.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_add_same_key_is_same_entry() {
        let mut group = PropertyGroup::new();
        let first: *const Property = group.get_or_add(PropertyKey::Nullable);
        group.get_or_add(PropertyKey::Nullable).set_value("enable");
        let second: *const Property = group.get_or_add(PropertyKey::Nullable);

        assert_eq!(first, second);
        assert_eq!(group.len(), 1);
        assert_eq!(
            group.get(&PropertyKey::Nullable).unwrap().resolved_value(),
            "enable"
        );
    }

    #[test]
    fn test_distinct_keys_add_one_entry_each() {
        let mut group = PropertyGroup::new();
        group.get_or_add(PropertyKey::TargetFramework);
        assert_eq!(group.len(), 1);
        group.get_or_add(PropertyKey::RuntimeIdentifier);
        assert_eq!(group.len(), 2);
        group.get_or_add(PropertyKey::Named("Deterministic".into()));
        group.get_or_add(PropertyKey::Named("Deterministic".into()));
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn test_resolved_value_dedups_and_joins() {
        let mut prop = Property::new(PropertyKey::NoWarn);
        prop.add_value("CS1591")
            .add_value("CA1000")
            .add_value("CS1591")
            .add_value("  ");
        assert_eq!(prop.resolved_value(), "CS1591;CA1000");

        prop.set_separator(",");
        assert_eq!(prop.resolved_value(), "CS1591,CA1000");

        prop.set_value("net8.0");
        assert_eq!(prop.values(), ["net8.0"]);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut group = PropertyGroup::new();
        group.get_or_add(PropertyKey::OutputType);
        group.get_or_add(PropertyKey::TargetFramework);
        group.get_or_add(PropertyKey::LangVersion);
        let names: Vec<_> = group.iter().map(|p| p.key().element_name()).collect();
        assert_eq!(names, ["OutputType", "TargetFramework", "LangVersion"]);
    }
}
