//! Attribute stores keyed by `subject.attribute`.
//!
//! [`AttributeStore`] holds its lock only for the map access and evaluates
//! patterns after releasing it. [`CoarseAttributeStore`] keeps the lock for the
//! whole query and is kept for comparison.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::{Mutex, MutexGuard, PoisonError};

use regex_automata::meta::Regex;
use regex_syntax::hir::{Hir, Look};
use regex_syntax::Parser;
use tracing::trace;

use crate::error::StoreError;

type Attributes = HashMap<String, String>;

fn lock(attributes: &Mutex<Attributes>) -> MutexGuard<'_, Attributes> {
    // Every critical section is a single map operation, so a poisoned map is still whole.
    attributes.lock().unwrap_or_else(PoisonError::into_inner)
}

fn key(subject: &str, attribute: &str) -> String {
    format!("{}.{}", subject, attribute)
}

fn user_subject(name: &str) -> String {
    format!("users.{}", name)
}

/// Compiles `pattern` so that it only matches a whole value.
///
/// The anchors are added to the parsed pattern rather than to its text, so
/// flags such as `(?x)` comments cannot reach them.
fn compile(pattern: &str) -> Result<Regex, StoreError> {
    let invalid = |source: Box<dyn StdError + Send + Sync>| StoreError::InvalidPattern {
        pattern: pattern.to_owned(),
        source,
    };
    let hir = Parser::new()
        .parse(pattern)
        .map_err(|e| invalid(Box::new(e)))?;
    let anchored = Hir::concat(vec![Hir::look(Look::Start), hir, Hir::look(Look::End)]);
    Regex::builder()
        .build_from_hir(&anchored)
        .map_err(|e| invalid(Box::new(e)))
}

fn matches(pattern: &str, value: &str) -> Result<bool, StoreError> {
    Ok(compile(pattern)?.is_match(value))
}

#[derive(Debug, Default)]
pub struct AttributeStore {
    attributes: Mutex<Attributes>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_attribute(&self, subject: &str, attribute: &str, value: impl Into<String>) {
        let key = key(subject, attribute);
        trace!(%key, "set attribute");
        lock(&self.attributes).insert(key, value.into());
    }

    /// Returns a copy of the stored value. The lock is released before returning.
    pub fn attribute(&self, subject: &str, attribute: &str) -> Option<String> {
        let key = key(subject, attribute);
        lock(&self.attributes).get(&key).cloned()
    }

    /// Looks the value up under the lock, then runs `predicate` on it with the
    /// lock released. A missing value yields `Ok(false)` and `predicate` is not
    /// called.
    pub fn attribute_satisfies<F, E>(
        &self,
        subject: &str,
        attribute: &str,
        predicate: F,
    ) -> Result<bool, E>
    where
        F: FnOnce(&str) -> Result<bool, E>,
    {
        match self.attribute(subject, attribute) {
            Some(value) => predicate(&value),
            None => Ok(false),
        }
    }

    /// Whether the stored value matches `pattern` in its entirety.
    ///
    /// The pattern is only compiled when a value is present, so a malformed
    /// pattern against a missing key is not reported.
    pub fn attribute_matches(
        &self,
        subject: &str,
        attribute: &str,
        pattern: &str,
    ) -> Result<bool, StoreError> {
        self.attribute_satisfies(subject, attribute, |value| matches(pattern, value))
    }

    pub fn set_user_location(&self, name: &str, location: impl Into<String>) {
        self.set_attribute(&user_subject(name), "location", location);
    }

    pub fn user_location_matches(&self, name: &str, pattern: &str) -> Result<bool, StoreError> {
        self.attribute_matches(&user_subject(name), "location", pattern)
    }
}

/// Same contract as [`AttributeStore`], but queries hold the lock while the
/// predicate runs, so every reader and writer waits on pattern evaluation.
#[derive(Debug, Default)]
pub struct CoarseAttributeStore {
    attributes: Mutex<Attributes>,
}

impl CoarseAttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_attribute(&self, subject: &str, attribute: &str, value: impl Into<String>) {
        let key = key(subject, attribute);
        trace!(%key, "set attribute");
        lock(&self.attributes).insert(key, value.into());
    }

    pub fn attribute_satisfies<F, E>(
        &self,
        subject: &str,
        attribute: &str,
        predicate: F,
    ) -> Result<bool, E>
    where
        F: FnOnce(&str) -> Result<bool, E>,
    {
        let key = key(subject, attribute);
        let attributes = lock(&self.attributes);
        match attributes.get(&key) {
            Some(value) => predicate(value),
            None => Ok(false),
        }
    }

    pub fn attribute_matches(
        &self,
        subject: &str,
        attribute: &str,
        pattern: &str,
    ) -> Result<bool, StoreError> {
        self.attribute_satisfies(subject, attribute, |value| matches(pattern, value))
    }

    pub fn set_user_location(&self, name: &str, location: impl Into<String>) {
        self.set_attribute(&user_subject(name), "location", location);
    }

    pub fn user_location_matches(&self, name: &str, pattern: &str) -> Result<bool, StoreError> {
        self.attribute_matches(&user_subject(name), "location", pattern)
    }
}
