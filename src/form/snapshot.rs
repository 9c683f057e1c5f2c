use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use super::controller::{FormError, FormResult};

trait SnapshotAny: Any + Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Debug> SnapshotAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A field value with its type erased at the form boundary.
#[derive(Clone)]
pub struct SnapshotValue {
    value: Rc<dyn SnapshotAny>,
    type_name: &'static str,
}

impl SnapshotValue {
    pub fn new<V: Any + Debug>(value: V) -> Self {
        Self {
            value: Rc::new(value),
            type_name: std::any::type_name::<V>(),
        }
    }

    pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
        let value: &dyn SnapshotAny = &*self.value;
        value.as_any().downcast_ref::<V>()
    }

    pub fn is<V: Any>(&self) -> bool {
        self.downcast_ref::<V>().is_some()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl Debug for SnapshotValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let value: &dyn SnapshotAny = &*self.value;
        Debug::fmt(value, f)
    }
}

/// Latest value of every registered field, in registration order. `None`
/// marks a field that never produced a value.
#[derive(Clone)]
pub struct FormSnapshot<K> {
    entries: Vec<(K, Option<SnapshotValue>)>,
}

impl<K> FormSnapshot<K> {
    pub(super) fn new(entries: Vec<(K, Option<SnapshotValue>)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, Option<&SnapshotValue>)> {
        self.entries.iter().map(|(key, value)| (key, value.as_ref()))
    }

    pub fn field_ids(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(key, _)| key)
    }
}

impl<K: PartialEq> FormSnapshot<K> {
    pub fn contains(&self, field: &K) -> bool {
        self.entries.iter().any(|(key, _)| key == field)
    }

    pub fn value(&self, field: &K) -> Option<&SnapshotValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == field)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn get<V: Any>(&self, field: &K) -> Option<&V> {
        self.value(field).and_then(SnapshotValue::downcast_ref::<V>)
    }
}

impl<K: PartialEq + Debug> FormSnapshot<K> {
    /// Typed, owned lookup used by [`FromSnapshot`] implementations.
    pub fn require<V: Any + Clone>(&self, field: &K) -> FormResult<V> {
        let value = self
            .value(field)
            .ok_or_else(|| FormError::MissingSnapshotValue {
                field: format!("{field:?}"),
            })?;
        value
            .downcast_ref::<V>()
            .cloned()
            .ok_or_else(|| FormError::SnapshotTypeMismatch {
                field: format!("{field:?}"),
                expected: std::any::type_name::<V>(),
                found: value.type_name(),
            })
    }

    pub fn extract<T: FromSnapshot<K>>(&self) -> FormResult<T> {
        T::from_snapshot(self)
    }
}

impl<K: Debug> Debug for FormSnapshot<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(key, value)| (key, value)))
            .finish()
    }
}

/// Typed view over a submitted snapshot. Derivable with
/// `#[derive(FormValues)]` for `&'static str` keyed forms.
pub trait FromSnapshot<K>: Sized {
    fn from_snapshot(snapshot: &FormSnapshot<K>) -> FormResult<Self>;
}
