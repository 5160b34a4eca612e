//! Array element storage
//!
//! Elements start out dense: a vector of optional values, all with default
//! attributes, where `None` is a hole. Writing far past the end, or giving
//! an element non-default attributes, switches the array to a sparse map
//! whose occupied indices are tracked by a `UInt32BitSet`. `length` is kept
//! here, separate from the element count.

use super::object::{Property, PropertyFlags, Slot};
use super::value::Value;
use crate::bitset::UInt32BitSet;
use rustc_hash::FxHashMap as HashMap;

/// Largest gap a write may open past the end of a dense array
const DENSE_GAP: usize = 1024;

enum Elements {
    Dense(Vec<Option<Value>>),
    Sparse {
        props: HashMap<u32, Property>,
        present: UInt32BitSet,
    },
}

/// Indexed elements and `length` of an Array object
pub struct ArrayStorage {
    length: u32,
    length_writable: bool,
    elements: Elements,
}

impl ArrayStorage {
    /// Array with `length` holes
    pub fn with_length(length: u32) -> Self {
        Self {
            length,
            length_writable: true,
            elements: Elements::Dense(Vec::new()),
        }
    }

    /// Dense array holding `values`
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            length: values.len() as u32,
            length_writable: true,
            elements: Elements::Dense(values.into_iter().map(Some).collect()),
        }
    }

    /// Dense array with explicit holes
    pub fn from_elements(elements: Vec<Option<Value>>) -> Self {
        Self {
            length: elements.len() as u32,
            length_writable: true,
            elements: Elements::Dense(elements),
        }
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn length_writable(&self) -> bool {
        self.length_writable
    }

    /// Make `length` read-only
    pub fn freeze_length(&mut self) {
        self.length_writable = false;
    }

    /// Element property at `index`
    pub fn get(&self, index: u32) -> Option<Property> {
        match &self.elements {
            Elements::Dense(values) => values
                .get(index as usize)?
                .clone()
                .map(|v| Property::data(v, PropertyFlags::DEFAULT)),
            Elements::Sparse { props, .. } => props.get(&index).cloned(),
        }
    }

    /// Overwrite the value of an existing writable data element
    pub fn set_value(&mut self, index: u32, value: Value) {
        match &mut self.elements {
            Elements::Dense(values) => {
                if let Some(slot) = values.get_mut(index as usize) {
                    *slot = Some(value);
                }
            }
            Elements::Sparse { props, .. } => {
                if let Some(Property {
                    slot: Slot::Data(v),
                    ..
                }) = props.get_mut(&index)
                {
                    *v = value;
                }
            }
        }
    }

    /// Store an element, growing `length` past it; false when `length` is
    /// read-only and would have to grow
    pub fn define(&mut self, index: u32, prop: Property) -> bool {
        if index >= self.length && !self.length_writable {
            return false;
        }
        let plain = prop.flags == PropertyFlags::DEFAULT && !prop.is_accessor();
        if let Elements::Dense(values) = &mut self.elements {
            let i = index as usize;
            if plain && i <= values.len() + DENSE_GAP {
                if i >= values.len() {
                    values.resize(i + 1, None);
                }
                values[i] = Some(prop.value());
                self.length = self.length.max(index + 1);
                return true;
            }
            self.make_sparse();
        }
        if let Elements::Sparse { props, present } = &mut self.elements {
            props.insert(index, prop);
            present.set(index);
        }
        self.length = self.length.max(index + 1);
        true
    }

    fn make_sparse(&mut self) {
        if let Elements::Dense(values) = &mut self.elements {
            let mut props = HashMap::default();
            let mut present = UInt32BitSet::new();
            for (i, v) in values.drain(..).enumerate() {
                if let Some(v) = v {
                    props.insert(i as u32, Property::data(v, PropertyFlags::DEFAULT));
                    present.set(i as u32);
                }
            }
            self.elements = Elements::Sparse { props, present };
        }
    }

    /// Remove an element; false when it is non-configurable
    pub fn delete(&mut self, index: u32) -> bool {
        match &mut self.elements {
            Elements::Dense(values) => {
                if let Some(slot) = values.get_mut(index as usize) {
                    *slot = None;
                }
                while matches!(values.last(), Some(None)) {
                    values.pop();
                }
                true
            }
            Elements::Sparse { props, present } => match props.get(&index) {
                Some(p) if !p.configurable() => false,
                Some(_) => {
                    props.remove(&index);
                    present.clear(index);
                    true
                }
                None => true,
            },
        }
    }

    /// Change `length`, deleting elements at or above it
    ///
    /// Deletion proceeds from the top and stops at the first
    /// non-configurable element, leaving `length` just above it and
    /// returning false.
    pub fn set_length(&mut self, new_len: u32) -> bool {
        if new_len >= self.length {
            self.length = new_len;
            return true;
        }
        match &mut self.elements {
            Elements::Dense(values) => {
                values.truncate(new_len as usize);
            }
            Elements::Sparse { props, present } => {
                let mut doomed = Vec::new();
                let mut floor = new_len;
                let mut next = present.next_set_bit(new_len);
                while let Some(index) = next {
                    if props.get(&index).is_some_and(|p| !p.configurable()) {
                        floor = index + 1;
                        doomed.clear();
                    } else {
                        doomed.push(index);
                    }
                    next = index.checked_add(1).and_then(|i| present.next_set_bit(i));
                }
                for index in doomed {
                    props.remove(&index);
                }
                present.clear_from(floor);
                if floor > new_len {
                    self.length = floor;
                    return false;
                }
            }
        }
        self.length = new_len;
        true
    }

    /// Occupied indices in ascending order
    pub fn indices(&self) -> Vec<u32> {
        match &self.elements {
            Elements::Dense(values) => values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_some())
                .map(|(i, _)| i as u32)
                .collect(),
            Elements::Sparse { present, .. } => present.iter().collect(),
        }
    }

    /// Lowest occupied index at or after `from`
    pub fn next_index(&self, from: u32) -> Option<u32> {
        match &self.elements {
            Elements::Dense(values) => values
                .get(from as usize..)?
                .iter()
                .position(Option::is_some)
                .map(|i| from + i as u32),
            Elements::Sparse { present, .. } => present.next_set_bit(from),
        }
    }

    /// Highest occupied index at or before `at`
    pub fn prev_index(&self, at: u32) -> Option<u32> {
        match &self.elements {
            Elements::Dense(values) => {
                let end = values.len().min(at as usize + 1);
                values[..end].iter().rposition(Option::is_some).map(|i| i as u32)
            }
            Elements::Sparse { present, .. } => u32::try_from(present.last_set_bit(at)).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(n: f64) -> Property {
        Property::data(Value::Number(n), PropertyFlags::DEFAULT)
    }

    fn is_sparse(arr: &ArrayStorage) -> bool {
        matches!(arr.elements, Elements::Sparse { .. })
    }

    #[test]
    fn test_define_grows_length() {
        let mut arr = ArrayStorage::with_length(0);
        assert!(arr.define(5, plain(1.0)));
        assert_eq!(arr.length(), 6);
        assert_eq!(arr.indices(), vec![5]);
        assert!(!is_sparse(&arr));
    }

    #[test]
    fn test_far_write_goes_sparse() {
        let mut arr = ArrayStorage::from_values(vec![Value::Number(0.0)]);
        arr.define(4_000_000_000, plain(2.0));
        assert!(is_sparse(&arr));
        assert_eq!(arr.length(), 4_000_000_001);
        assert_eq!(arr.indices(), vec![0, 4_000_000_000]);
    }

    #[test]
    fn test_truncate_stops_at_non_configurable() {
        let mut arr = ArrayStorage::from_values(vec![Value::Null; 5]);
        arr.define(2, Property::data(Value::Null, PropertyFlags::WRITABLE));
        assert!(!arr.set_length(0));
        assert_eq!(arr.length(), 3);
        assert_eq!(arr.indices(), vec![0, 1, 2]);
    }

    #[test]
    fn test_read_only_length_blocks_growth() {
        let mut arr = ArrayStorage::from_values(vec![Value::Null]);
        arr.freeze_length();
        assert!(!arr.define(1, plain(1.0)));
        assert!(arr.define(0, plain(1.0)));
        assert_eq!(arr.length(), 1);
    }

    #[test]
    fn test_holes_are_absent() {
        let arr = ArrayStorage::from_elements(vec![Some(Value::Null), None, Some(Value::Null)]);
        assert!(arr.get(1).is_none());
        assert_eq!(arr.indices().len(), 2);
    }

    #[test]
    fn test_sparse_cursors() {
        let mut arr = ArrayStorage::with_length(0);
        arr.define(3, plain(1.0));
        arr.define(3_000_000_000, plain(2.0));
        assert!(is_sparse(&arr));
        assert_eq!(arr.next_index(0), Some(3));
        assert_eq!(arr.next_index(4), Some(3_000_000_000));
        assert_eq!(arr.next_index(3_000_000_001), None);
        assert_eq!(arr.prev_index(u32::MAX - 1), Some(3_000_000_000));
        assert_eq!(arr.prev_index(2_999_999_999), Some(3));
        assert_eq!(arr.prev_index(2), None);
    }

    #[test]
    fn test_dense_cursors_skip_holes() {
        let arr = ArrayStorage::from_elements(vec![None, Some(Value::Null), None, Some(Value::Null)]);
        assert_eq!(arr.next_index(0), Some(1));
        assert_eq!(arr.next_index(2), Some(3));
        assert_eq!(arr.next_index(4), None);
        assert_eq!(arr.prev_index(100), Some(3));
        assert_eq!(arr.prev_index(2), Some(1));
        assert_eq!(arr.prev_index(0), None);
    }

    #[test]
    fn test_sparse_truncate() {
        let mut arr = ArrayStorage::with_length(0);
        for i in [1u32, 5_000, 4_000_000_000] {
            arr.define(i, plain(f64::from(i)));
        }
        assert!(arr.set_length(2));
        assert_eq!(arr.indices(), vec![1]);
        assert_eq!(arr.length(), 2);
    }

    #[test]
    fn test_sparse_truncate_stops_at_non_configurable() {
        let mut arr = ArrayStorage::with_length(0);
        arr.define(10, plain(1.0));
        arr.define(70_000, Property::data(Value::Null, PropertyFlags::WRITABLE));
        arr.define(3_000_000_000, plain(2.0));
        assert!(!arr.set_length(0));
        assert_eq!(arr.length(), 70_001);
        assert_eq!(arr.indices(), vec![10, 70_000]);
    }
}
