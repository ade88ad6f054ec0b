//! Constant table: the index space every body constant refers to.

use std::ops::Range;

use swamp_runtime::ValueRef;

use crate::{Section, UnpackError, UnpackResult};

/// Append-only table of decoded values, addressed by position.
///
/// Positions are assigned in stream order across all data sections.
/// A position is readable once it has been pushed; there is no removal.
#[derive(Debug, Clone, Default)]
pub struct ConstantTable {
    slots: Vec<ValueRef>,
    capacity: Option<usize>,
    resource_names: Vec<String>,
    sections: Vec<(Section, Range<usize>)>,
}

impl ConstantTable {
    /// Unbounded table.
    pub fn new() -> Self { Self::default() }

    /// Table refusing more than `capacity` entries, when set.
    pub fn with_capacity_limit(capacity: Option<usize>) -> Self { Self { capacity, ..Self::default() } }

    /// Number of entries.
    pub fn len(&self) -> usize { self.slots.len() }

    /// True when empty.
    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    /// Configured maximum, if any.
    pub fn capacity_limit(&self) -> Option<usize> { self.capacity }

    /// Appends `r` and returns its position.
    pub fn push(&mut self, r: ValueRef) -> UnpackResult<usize> {
        let index = self.slots.len();
        if let Some(capacity) = self.capacity {
            if index >= capacity {
                return Err(UnpackError::TableCapacityExceeded { capacity });
            }
        }
        self.slots.push(r);
        Ok(index)
    }

    /// Handle stored at `index`.
    pub fn get(&self, index: usize) -> UnpackResult<ValueRef> {
        self.slots
            .get(index)
            .copied()
            .ok_or(UnpackError::ConstantIndexOutOfRange { index, len: self.slots.len() })
    }

    /// All handles, by position.
    pub fn as_slice(&self) -> &[ValueRef] { &self.slots }

    /// `(position, handle)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, ValueRef)> + '_ { self.slots.iter().copied().enumerate() }

    /// Records a resource name; its position in the side table is returned.
    pub(crate) fn push_resource_name(&mut self, name: String) -> usize {
        self.resource_names.push(name);
        self.resource_names.len() - 1
    }

    /// Human-readable name of resource handle `handle`.
    pub fn resource_name(&self, handle: usize) -> Option<&str> {
        self.resource_names.get(handle).map(String::as_str)
    }

    /// The resource side table.
    pub fn resource_names(&self) -> &[String] { &self.resource_names }

    pub(crate) fn record_section(&mut self, section: Section, range: Range<usize>) {
        self.sections.push((section, range));
    }

    /// Positions filled by `section`. Empty for sections not (yet) read and
    /// for the body section, which adds nothing.
    pub fn section_range(&self, section: Section) -> Range<usize> {
        self.sections.iter().find(|(s, _)| *s == section).map_or(0..0, |(_, r)| r.clone())
    }

    /// Section that filled `index`.
    pub fn section_of(&self, index: usize) -> Option<Section> {
        self.sections.iter().find(|(_, r)| r.contains(&index)).map(|(s, _)| *s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use swamp_runtime::Heap;

    fn refs(n: usize) -> Vec<ValueRef> {
        let mut heap = Heap::new();
        (0..n).map(|i| heap.alloc_integer(i32::try_from(i).unwrap()).unwrap()).collect()
    }

    #[test]
    fn positions_follow_push_order() {
        let mut table = ConstantTable::new();
        let rs = refs(3);
        for (i, r) in rs.iter().enumerate() {
            assert_eq!(table.push(*r).unwrap(), i);
        }
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(1).unwrap(), rs[1]);
        assert_eq!(table.as_slice(), rs.as_slice());
    }

    #[test]
    fn lookup_past_end_fails() {
        let mut table = ConstantTable::new();
        table.push(refs(1)[0]).unwrap();
        assert!(matches!(table.get(1), Err(UnpackError::ConstantIndexOutOfRange { index: 1, len: 1 })));
    }

    #[test]
    fn capacity_is_enforced() {
        let mut table = ConstantTable::with_capacity_limit(Some(2));
        let rs = refs(3);
        table.push(rs[0]).unwrap();
        table.push(rs[1]).unwrap();
        assert!(matches!(table.push(rs[2]), Err(UnpackError::TableCapacityExceeded { capacity: 2 })));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn sections_and_resources() {
        let mut table = ConstantTable::new();
        table.record_section(Section::Booleans, 0..2);
        table.record_section(Section::Strings, 2..2);
        assert_eq!(table.section_of(1), Some(Section::Booleans));
        assert_eq!(table.section_of(2), None);
        assert_eq!(table.section_range(Section::Integers), 0..0);

        assert_eq!(table.push_resource_name("a".into()), 0);
        assert_eq!(table.push_resource_name("b".into()), 1);
        assert_eq!(table.resource_name(1), Some("b"));
        assert_eq!(table.resource_name(2), None);
    }
}
