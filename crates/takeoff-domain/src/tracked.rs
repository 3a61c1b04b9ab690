//! Tracked values - a field value paired with its provenance tier
//!
//! Every scalar attribute in the entity graph is a [`Tracked`] value. The
//! field-merge policy lives here and nowhere else:
//!
//! - [`Tracked::absorb`] is the "truthy overwrite" used by accumulating merges.
//!   A candidate replaces the stored value only when it is present and truthy.
//! - [`Tracked::replace`] is used by verification passes, where the verifier's
//!   value wins even when it is zero or empty.
//! - [`Tracked::set_manual`] is the only path that touches a Manual field.

use crate::confidence::Confidence;
use serde::{Deserialize, Serialize};

/// Values that have a notion of "present and meaningful"
pub trait Truthy {
    /// Whether this value should overwrite a stored one during an accumulating merge
    fn is_truthy(&self) -> bool;
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Truthy for u32 {
    fn is_truthy(&self) -> bool {
        *self != 0
    }
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

/// A field value with the confidence tier it was recorded at
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tracked<T> {
    /// Current value
    pub value: T,

    /// Provenance of the current value
    #[serde(default)]
    pub confidence: Confidence,
}

impl<T> Tracked<T> {
    /// Create a tracked value at the given tier
    pub fn new(value: T, confidence: Confidence) -> Self {
        Self { value, confidence }
    }

    /// Pin a reviewer-supplied value
    pub fn set_manual(&mut self, value: T) {
        self.value = value;
        self.confidence = Confidence::Manual;
    }

    /// Whether the field is pinned by a reviewer
    pub fn is_manual(&self) -> bool {
        self.confidence.is_manual()
    }

    /// Verification overwrite: any present candidate wins unless the field is Manual
    ///
    /// Returns true when the stored value or tier changed.
    pub fn replace(&mut self, candidate: Option<T>, confidence: Confidence) -> bool
    where
        T: PartialEq,
    {
        if self.is_manual() {
            return false;
        }
        match candidate {
            Some(value) => self.store(value, confidence),
            None => false,
        }
    }

    fn store(&mut self, value: T, confidence: Confidence) -> bool
    where
        T: PartialEq,
    {
        let changed = self.value != value || self.confidence != confidence;
        self.value = value;
        self.confidence = confidence;
        changed
    }
}

impl<T: Truthy + PartialEq> Tracked<T> {
    /// Truthy overwrite: a present, truthy candidate replaces a non-Manual value
    ///
    /// Falsy candidates (zero, empty, `false`) never erase what is stored, so
    /// repeating a payload is a no-op. Returns true when anything changed.
    pub fn absorb(&mut self, candidate: Option<T>, confidence: Confidence) -> bool {
        if self.is_manual() {
            return false;
        }
        match candidate {
            Some(value) if value.is_truthy() => self.store(value, confidence),
            _ => false,
        }
    }
}

impl<T: Clone> Tracked<T> {
    /// Copy of the current value
    pub fn get(&self) -> T {
        self.value.clone()
    }
}

/// Set-union of string evidence lists
///
/// Blank entries are dropped and duplicates are ignored, keeping first-seen
/// order so repeated merges leave the list unchanged. Returns the number of
/// entries added.
pub fn union_into<I>(target: &mut Vec<String>, incoming: I) -> usize
where
    I: IntoIterator<Item = String>,
{
    let mut added = 0;
    for item in incoming {
        let item = item.trim().to_string();
        if item.is_empty() || target.iter().any(|existing| existing == &item) {
            continue;
        }
        target.push(item);
        added += 1;
    }
    added
}
