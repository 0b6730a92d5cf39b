//! Exclusion filter.
//!
//! Evaluated before any logging or correlation work. An excluded method
//! produces no log line and leaves the correlation id untouched.

use std::collections::HashSet;

use crate::config::ExclusionRules;
use crate::descriptor::MethodDescriptor;

/// Decides whether a method is observed at all.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    packages: Vec<String>,
    methods: HashSet<String>,
}

impl ExclusionFilter {
    /// Creates a filter from configured rules.
    pub fn new(rules: &ExclusionRules) -> Self {
        Self {
            packages: rules
                .packages
                .iter()
                .filter(|fragment| !fragment.is_empty())
                .cloned()
                .collect(),
            methods: rules.methods.iter().cloned().collect(),
        }
    }

    /// Returns true if the declaring type path contains an excluded package
    /// fragment, or the method name equals an excluded method name.
    pub fn is_excluded(&self, method: &MethodDescriptor) -> bool {
        self.methods.contains(&method.name)
            || self
                .packages
                .iter()
                .any(|fragment| method.declaring_type.contains(fragment.as_str()))
    }

    /// Inverse of [`ExclusionFilter::is_excluded`].
    pub fn should_log(&self, method: &MethodDescriptor) -> bool {
        !self.is_excluded(method)
    }
}
