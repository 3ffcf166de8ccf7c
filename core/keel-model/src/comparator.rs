//! Ordering of entities by an attribute path.
//!
//! Values are compared by kind first and then naturally within a kind:
//! booleans, then numbers, then text. Values with no natural order (nested
//! objects such as entity references, arrays) are compared by their JSON text
//! and rank as text. This keeps the order total for any mix of values.
//!
//! Null and missing values sort as the minimum unless
//! [`NullOrdering::Last`] is chosen. Descending order negates the complete
//! result, nulls included.

use std::cmp::Ordering;

use serde_json::Value;

use crate::path::PropertyPath;
use crate::{Entity, ModelError};

/// Where null or missing values sort in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullOrdering {
    #[default]
    First,
    Last,
}

/// How a comparator reads its value, resolved once at construction.
#[derive(Debug, Clone)]
enum Accessor {
    /// Single static attribute.
    Property(String),
    /// Single dynamic attribute, by code.
    DynamicAttribute(String),
    /// Nested path, walked per value.
    Path(PropertyPath),
}

/// Three-way ordering of entities by one attribute path.
#[derive(Debug, Clone)]
pub struct EntityComparator {
    path: PropertyPath,
    accessor: Accessor,
    ascending: bool,
    nulls: NullOrdering,
}

impl EntityComparator {
    pub fn new(path: &str, ascending: bool) -> Result<Self, ModelError> {
        Ok(Self::for_path(PropertyPath::parse(path)?, ascending))
    }

    pub fn for_path(path: PropertyPath, ascending: bool) -> Self {
        let accessor = if path.is_direct() {
            let name = &path.segments()[0];
            match PropertyPath::dynamic_code(name) {
                Some(code) => Accessor::DynamicAttribute(code.to_string()),
                None => Accessor::Property(name.clone()),
            }
        } else {
            Accessor::Path(path.clone())
        };

        Self {
            path,
            accessor,
            ascending,
            nulls: NullOrdering::default(),
        }
    }

    #[must_use]
    pub fn with_null_ordering(mut self, nulls: NullOrdering) -> Self {
        self.nulls = nulls;
        self
    }

    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    pub fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        let ordering = compare_nullable(self.value_of(a), self.value_of(b), self.nulls);
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }

    /// Stable sort by this comparator.
    pub fn sort(&self, entities: &mut [Entity]) {
        entities.sort_by(|a, b| self.compare(a, b));
    }

    fn value_of<'e>(&self, entity: &'e Entity) -> Option<&'e Value> {
        let value = match &self.accessor {
            Accessor::Property(name) => entity.value(name),
            Accessor::DynamicAttribute(code) => entity.dynamic_value(code),
            Accessor::Path(path) => entity.value_ex(path),
        };
        value.filter(|v| !v.is_null())
    }
}

fn compare_nullable(a: Option<&Value>, b: Option<&Value>, nulls: NullOrdering) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => match nulls {
            NullOrdering::First => Ordering::Less,
            NullOrdering::Last => Ordering::Greater,
        },
        (Some(_), None) => match nulls {
            NullOrdering::First => Ordering::Greater,
            NullOrdering::Last => Ordering::Less,
        },
        (Some(a), Some(b)) => SortKey::of(a).cmp(&SortKey::of(b)),
    }
}

/// A non-null value projected onto a totally ordered key.
#[derive(Debug)]
enum SortKey<'a> {
    Bool(bool),
    Number(&'a serde_json::Number),
    Text(std::borrow::Cow<'a, str>),
}

impl<'a> SortKey<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            Value::Bool(b) => SortKey::Bool(*b),
            Value::Number(n) => SortKey::Number(n),
            Value::String(s) => SortKey::Text(s.as_str().into()),
            other => SortKey::Text(other.to_string().into()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Bool(_) => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
        }
    }
}

impl PartialEq for SortKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey<'_> {}

impl PartialOrd for SortKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => compare_numbers(a, b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Exact comparison of JSON numbers, integers and floats alike.
///
/// Integers are widened to `i128` and never rounded through `f64`, so the
/// order stays transitive beyond 2^53.
fn compare_numbers(a: &serde_json::Number, b: &serde_json::Number) -> Ordering {
    match (Exact::of(a), Exact::of(b)) {
        (Exact::Int(a), Exact::Int(b)) => a.cmp(&b),
        (Exact::Float(a), Exact::Float(b)) => a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b)),
        (Exact::Int(a), Exact::Float(b)) => compare_int_float(a, b),
        (Exact::Float(a), Exact::Int(b)) => compare_int_float(b, a).reverse(),
    }
}

enum Exact {
    Int(i128),
    Float(f64),
}

impl Exact {
    fn of(n: &serde_json::Number) -> Self {
        if let Some(i) = n.as_i64() {
            Exact::Int(i128::from(i))
        } else if let Some(u) = n.as_u64() {
            Exact::Int(i128::from(u))
        } else {
            Exact::Float(n.as_f64().unwrap_or(0.0))
        }
    }
}

fn compare_int_float(int: i128, float: f64) -> Ordering {
    if float.is_nan() {
        return Ordering::Less;
    }
    // Saturating cast; every i128 built from a JSON integer lies well inside.
    let whole = float.trunc() as i128;
    int.cmp(&whole).then_with(|| {
        let fraction = float - float.trunc();
        if fraction > 0.0 {
            Ordering::Less
        } else if fraction < 0.0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}
