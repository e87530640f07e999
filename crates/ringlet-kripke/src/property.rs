//! Recorded property snapshots that label Kripke states

use ringlet_core::{Value, Variables};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One recorded value.
///
/// Equality and hashing compare floats by bit pattern so property lists can
/// key hash maps; `NaN` equals itself and `0.0` differs from `-0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KripkeStateProperty {
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// Floating point number
    Float(f64),
    /// String
    String(String),
    /// Value that may be absent
    Optional(Option<Box<KripkeStateProperty>>),
    /// Ordered collection
    Collection(Vec<KripkeStateProperty>),
    /// Nested property list
    Compound(KripkeStatePropertyList),
}

impl KripkeStateProperty {
    /// Name of the property's type
    pub fn type_name(&self) -> &'static str {
        match self {
            KripkeStateProperty::Bool(_) => "Bool",
            KripkeStateProperty::Int(_) => "Int",
            KripkeStateProperty::UInt(_) => "UInt",
            KripkeStateProperty::Float(_) => "Float",
            KripkeStateProperty::String(_) => "String",
            KripkeStateProperty::Optional(_) => "Optional",
            KripkeStateProperty::Collection(_) => "Collection",
            KripkeStateProperty::Compound(_) => "Compound",
        }
    }

    /// True for absent optionals and for collections or compounds holding
    /// nothing but empty values
    pub fn is_empty(&self) -> bool {
        match self {
            KripkeStateProperty::Optional(value) => value.is_none(),
            KripkeStateProperty::Collection(items) => items.iter().all(KripkeStateProperty::is_empty),
            KripkeStateProperty::Compound(list) => list.values().all(KripkeStateProperty::is_empty),
            _ => false,
        }
    }

    fn discriminant(&self) -> u8 {
        match self {
            KripkeStateProperty::Bool(_) => 0,
            KripkeStateProperty::Int(_) => 1,
            KripkeStateProperty::UInt(_) => 2,
            KripkeStateProperty::Float(_) => 3,
            KripkeStateProperty::String(_) => 4,
            KripkeStateProperty::Optional(_) => 5,
            KripkeStateProperty::Collection(_) => 6,
            KripkeStateProperty::Compound(_) => 7,
        }
    }
}

impl PartialEq for KripkeStateProperty {
    fn eq(&self, other: &Self) -> bool {
        use KripkeStateProperty::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (String(a), String(b)) => a == b,
            (Optional(a), Optional(b)) => a == b,
            (Collection(a), Collection(b)) => a == b,
            (Compound(a), Compound(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for KripkeStateProperty {}

impl Hash for KripkeStateProperty {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.discriminant().hash(state);
        match self {
            KripkeStateProperty::Bool(b) => b.hash(state),
            KripkeStateProperty::Int(i) => i.hash(state),
            KripkeStateProperty::UInt(u) => u.hash(state),
            KripkeStateProperty::Float(f) => f.to_bits().hash(state),
            KripkeStateProperty::String(s) => s.hash(state),
            KripkeStateProperty::Optional(value) => value.hash(state),
            KripkeStateProperty::Collection(items) => items.hash(state),
            KripkeStateProperty::Compound(list) => list.hash(state),
        }
    }
}

impl From<&Value> for KripkeStateProperty {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(b) => KripkeStateProperty::Bool(*b),
            Value::Int(i) => KripkeStateProperty::Int(*i),
            Value::UInt(u) => KripkeStateProperty::UInt(*u),
            Value::Float(f) => KripkeStateProperty::Float(*f),
            Value::String(s) => KripkeStateProperty::String(s.clone()),
            Value::List(items) => KripkeStateProperty::Collection(items.iter().map(Into::into).collect()),
            Value::Record(fields) => KripkeStateProperty::Compound(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), KripkeStateProperty::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for KripkeStateProperty {
    fn from(value: bool) -> Self {
        KripkeStateProperty::Bool(value)
    }
}

impl From<i64> for KripkeStateProperty {
    fn from(value: i64) -> Self {
        KripkeStateProperty::Int(value)
    }
}

impl From<u64> for KripkeStateProperty {
    fn from(value: u64) -> Self {
        KripkeStateProperty::UInt(value)
    }
}

impl From<&str> for KripkeStateProperty {
    fn from(value: &str) -> Self {
        KripkeStateProperty::String(value.to_string())
    }
}

impl From<String> for KripkeStateProperty {
    fn from(value: String) -> Self {
        KripkeStateProperty::String(value)
    }
}

impl From<KripkeStatePropertyList> for KripkeStateProperty {
    fn from(value: KripkeStatePropertyList) -> Self {
        KripkeStateProperty::Compound(value)
    }
}

impl<T: Into<KripkeStateProperty>> From<Option<T>> for KripkeStateProperty {
    fn from(value: Option<T>) -> Self {
        KripkeStateProperty::Optional(value.map(|v| Box::new(v.into())))
    }
}

impl fmt::Display for KripkeStateProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KripkeStateProperty::Bool(b) => write!(f, "{b}"),
            KripkeStateProperty::Int(i) => write!(f, "{i}"),
            KripkeStateProperty::UInt(u) => write!(f, "{u}"),
            KripkeStateProperty::Float(x) => write!(f, "{x}"),
            KripkeStateProperty::String(s) => write!(f, "\"{s}\""),
            KripkeStateProperty::Optional(None) => f.write_str("nil"),
            KripkeStateProperty::Optional(Some(value)) => write!(f, "{value}"),
            KripkeStateProperty::Collection(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            KripkeStateProperty::Compound(list) => write!(f, "{list}"),
        }
    }
}

/// Sorted map of property names to recorded values.
///
/// Two lists are equal when they hold the same keys with equal values,
/// which is what the structure uses to recognize an already seen state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KripkeStatePropertyList(BTreeMap<String, KripkeStateProperty>);

impl KripkeStatePropertyList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a property
    pub fn get(&self, key: &str) -> Option<&KripkeStateProperty> {
        self.0.get(key)
    }

    /// Store a property, returning the previous one
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<KripkeStateProperty>,
    ) -> Option<KripkeStateProperty> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<KripkeStateProperty>) -> Self {
        self.insert(key, value);
        self
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &KripkeStateProperty)> {
        self.0.iter()
    }

    /// Iterate over values in key order
    pub fn values(&self) -> impl Iterator<Item = &KripkeStateProperty> {
        self.0.values()
    }

    /// Merge `other` over `self`.
    ///
    /// On conflicting keys `other` wins, except that two compound values
    /// are merged recursively.
    pub fn merged(&self, other: &KripkeStatePropertyList) -> KripkeStatePropertyList {
        let mut result = self.clone();
        for (key, value) in &other.0 {
            let merged = match (result.0.get(key), value) {
                (
                    Some(KripkeStateProperty::Compound(existing)),
                    KripkeStateProperty::Compound(incoming),
                ) => KripkeStateProperty::Compound(existing.merged(incoming)),
                _ => value.clone(),
            };
            result.0.insert(key.clone(), merged);
        }
        result
    }
}

impl From<&Variables> for KripkeStatePropertyList {
    fn from(variables: &Variables) -> Self {
        variables
            .iter()
            .map(|(key, value)| (key.clone(), KripkeStateProperty::from(value)))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, KripkeStateProperty)> for KripkeStatePropertyList {
    fn from_iter<I: IntoIterator<Item = (K, KripkeStateProperty)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }
}

impl<'a> IntoIterator for &'a KripkeStatePropertyList {
    type Item = (&'a String, &'a KripkeStateProperty);
    type IntoIter = std::collections::btree_map::Iter<'a, String, KripkeStateProperty>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for KripkeStatePropertyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (key, value)) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_merge_prefers_right_and_recurses() {
        let left = KripkeStatePropertyList::new()
            .with("a", 1_i64)
            .with("b", true)
            .with("nested", KripkeStatePropertyList::new().with("x", 1_i64).with("y", 2_i64));
        let right = KripkeStatePropertyList::new()
            .with("b", false)
            .with("nested", KripkeStatePropertyList::new().with("y", 5_i64));

        let merged = left.merged(&right);
        let nested = KripkeStatePropertyList::new().with("x", 1_i64).with("y", 5_i64);
        assert_eq!(merged.get("a"), Some(&KripkeStateProperty::Int(1)));
        assert_eq!(merged.get("b"), Some(&KripkeStateProperty::Bool(false)));
        assert_eq!(merged.get("nested"), Some(&KripkeStateProperty::Compound(nested)));
    }

    #[test]
    fn test_floats_compare_by_bits() {
        let nan = KripkeStateProperty::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_ne!(KripkeStateProperty::Float(0.0), KripkeStateProperty::Float(-0.0));

        let mut seen = HashSet::new();
        seen.insert(KripkeStatePropertyList::new().with("f", KripkeStateProperty::Float(1.5)));
        assert!(seen.contains(&KripkeStatePropertyList::new().with("f", KripkeStateProperty::Float(1.5))));
    }

    #[test]
    fn test_conversion_from_values() {
        let vars = Variables::new()
            .with("count", 2_u64)
            .with("items", vec![1_i64, 2]);
        let list = KripkeStatePropertyList::from(&vars);
        assert_eq!(list.get("count"), Some(&KripkeStateProperty::UInt(2)));
        assert_eq!(
            list.get("items"),
            Some(&KripkeStateProperty::Collection(vec![
                KripkeStateProperty::Int(1),
                KripkeStateProperty::Int(2)
            ]))
        );
        assert_eq!(list.to_string(), "{count: 2, items: [1, 2]}");
    }

    #[test]
    fn test_emptiness() {
        assert!(KripkeStateProperty::from(None::<bool>).is_empty());
        assert!(KripkeStateProperty::Collection(vec![]).is_empty());
        assert!(!KripkeStateProperty::from(Some(true)).is_empty());
    }
}
