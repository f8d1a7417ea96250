//! Keyed, insertion-ordered collection of addressable items.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use linked_hash_map::LinkedHashMap;

use super::item::{AccessKind, BitSpan, MapError, MapItem};

/// One structural conflict between two items, reported in bus terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// Two byte ranges overlap.
    ByteRange {
        /// Access kind under which the conflict exists.
        kind: AccessKind,

        /// Designator of the first item, with its half-open byte range.
        lhs: (String, u64, u64),

        /// Designator of the second item, with its half-open byte range.
        rhs: (String, u64, u64),
    },

    /// Two bit fields of the same register word overlap.
    BitRange {
        /// Access kind under which the conflict exists.
        kind: AccessKind,

        /// Shared byte offset of the register word.
        offset: u64,

        /// Designator and bit span of the first field.
        lhs: (String, BitSpan),

        /// Designator and bit span of the second field.
        rhs: (String, BitSpan),
    },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::ByteRange { kind, lhs, rhs } => write!(
                f,
                "{} address ranges of `{}` [{:#x}, {:#x}) and `{}` [{:#x}, {:#x}) overlap",
                kind, lhs.0, lhs.1, lhs.2, rhs.0, rhs.1, rhs.2
            ),
            Conflict::BitRange { kind, offset, lhs, rhs } => write!(
                f,
                "{} bit fields `{}` {} and `{}` {} overlap at offset {:#x}",
                kind, lhs.0, lhs.1, rhs.0, rhs.1, offset
            ),
        }
    }
}

fn byte_ranges_overlap(lhs: (u64, u64), rhs: (u64, u64)) -> bool { lhs.0 < rhs.1 && rhs.0 < lhs.1 }

/// Generic keyed collection of addressable items.
///
/// Items are owned by an insertion-ordered sequence; a designator index and
/// per-access offset buckets borrow positions into it.
#[derive(Debug, Default)]
pub struct AddressMap {
    allow_multiple_at_offset: bool,
    items: Vec<MapItem>,
    index: HashMap<String, usize>,
    read_offsets: LinkedHashMap<u64, Vec<usize>>,
    write_offsets: LinkedHashMap<u64, Vec<usize>>,
}

impl AddressMap {
    /// Creates an empty map.
    ///
    /// With `allow_multiple_at_offset`, several items may share one byte
    /// offset (bit fields of one register word); otherwise the second `add`
    /// at an occupied offset fails.
    pub fn new(allow_multiple_at_offset: bool) -> Self {
        Self { allow_multiple_at_offset, ..Self::default() }
    }

    /// Returns `true` if several items may share one byte offset.
    pub fn allows_multiple_at_offset(&self) -> bool { self.allow_multiple_at_offset }

    /// Number of items in the map.
    pub fn len(&self) -> usize { self.items.len() }

    /// Returns `true` if the map holds no items.
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    fn buckets(&self, kind: AccessKind) -> &LinkedHashMap<u64, Vec<usize>> {
        match kind {
            AccessKind::Read => &self.read_offsets,
            AccessKind::Write => &self.write_offsets,
        }
    }

    /// Adds an item, indexing it by designator and under the offset buckets
    /// of every access kind its accessibility covers.
    pub fn add<I: Into<MapItem>>(&mut self, item: I) -> Result<(), MapError> {
        let item = item.into();
        let designator = item.designator().to_string();

        if !item.access().allows(AccessKind::Read) && !item.access().allows(AccessKind::Write) {
            return Err(MapError::NotAccessible { designator });
        }
        if self.index.contains_key(&designator) {
            return Err(MapError::DuplicateDesignator(designator));
        }
        if !self.allow_multiple_at_offset
            && (self.read_offsets.contains_key(&item.offset()) || self.write_offsets.contains_key(&item.offset()))
        {
            return Err(MapError::OffsetInUse { designator, offset: item.offset() });
        }

        let position = self.items.len();
        if item.access().allows(AccessKind::Read) {
            self.read_offsets.entry(item.offset()).or_insert_with(Vec::new).push(position);
        }
        if item.access().allows(AccessKind::Write) {
            self.write_offsets.entry(item.offset()).or_insert_with(Vec::new).push(position);
        }
        let _ = self.index.insert(designator, position);
        self.items.push(item);

        Ok(())
    }

    /// Looks an item up by designator.
    pub fn lookup(&self, designator: &str) -> Option<&MapItem> {
        self.index.get(designator).map(|position| &self.items[*position])
    }

    /// Returns the first item at the given offset for the given access kind.
    pub fn lookup_at(&self, kind: AccessKind, offset: u64) -> Option<&MapItem> {
        self.buckets(kind).get(&offset).and_then(|positions| positions.first()).map(|position| &self.items[*position])
    }

    /// Returns every item at the given offset for the given access kind, in insertion order.
    pub fn items_at(&self, kind: AccessKind, offset: u64) -> Vec<&MapItem> {
        self.buckets(kind)
            .get(&offset)
            .map(|positions| positions.iter().map(|position| &self.items[*position]).collect())
            .unwrap_or_default()
    }

    /// Returns every item accessible under the given kind, in insertion order.
    pub fn items_for(&self, kind: AccessKind) -> Vec<&MapItem> {
        self.items.iter().filter(|item| item.access().allows(kind)).collect()
    }

    /// Offsets occupied under the given kind, in insertion order.
    pub fn offsets(&self, kind: AccessKind) -> Vec<u64> { self.buckets(kind).keys().copied().collect() }

    /// Reports every pair of items of the given kind whose byte ranges overlap.
    ///
    /// On a multiple-at-offset map, items sharing one offset are what the map
    /// permits; those pairs are left to the bit-level check and only ranges
    /// spilling across distinct offsets are reported here.
    pub fn check_overlaps(&self, kind: AccessKind) -> Vec<Conflict> {
        self.items_for(kind)
            .into_iter()
            .tuple_combinations()
            .filter(|(lhs, rhs)| !(self.allow_multiple_at_offset && lhs.offset() == rhs.offset()))
            .filter(|(lhs, rhs)| byte_ranges_overlap(lhs.byte_range(), rhs.byte_range()))
            .map(|(lhs, rhs)| {
                let (lhs_lo, lhs_hi) = lhs.byte_range();
                let (rhs_lo, rhs_hi) = rhs.byte_range();
                Conflict::ByteRange {
                    kind,
                    lhs: (lhs.designator().to_string(), lhs_lo, lhs_hi),
                    rhs: (rhs.designator().to_string(), rhs_lo, rhs_hi),
                }
            })
            .collect()
    }

    /// Reports byte-range overlaps across several maps.
    ///
    /// For each unique offset the item with the largest length is taken as
    /// the representative of that offset, then the representatives are swept
    /// pairwise. Two smaller same-offset items shadowed by a larger third are
    /// therefore not compared against each other; this approximation is part
    /// of the contract.
    pub fn check_overlaps_across(&self, kind: AccessKind, others: &[&AddressMap]) -> Vec<Conflict> {
        let representatives = self
            .unique_offsets(kind, others)
            .into_iter()
            .filter_map(|offset| {
                ::std::iter::once(self)
                    .chain(others.iter().copied())
                    .flat_map(|map| map.items_at(kind, offset))
                    .max_by_key(|item| item.length())
            })
            .collect::<Vec<_>>();

        representatives
            .into_iter()
            .tuple_combinations()
            .filter(|(lhs, rhs)| byte_ranges_overlap(lhs.byte_range(), rhs.byte_range()))
            .map(|(lhs, rhs)| {
                let (lhs_lo, lhs_hi) = lhs.byte_range();
                let (rhs_lo, rhs_hi) = rhs.byte_range();
                Conflict::ByteRange {
                    kind,
                    lhs: (lhs.designator().to_string(), lhs_lo, lhs_hi),
                    rhs: (rhs.designator().to_string(), rhs_lo, rhs_hi),
                }
            })
            .collect()
    }

    /// Merges the byte spans of the given kind into maximal contiguous-or-touching ranges.
    pub fn simplified_ranges(&self, kind: AccessKind) -> Vec<(u64, usize)> {
        let mut spans =
            self.items_for(kind).into_iter().map(|item| (item.offset(), item.length())).collect::<Vec<_>>();
        spans.sort_unstable();

        let mut ranges: Vec<(u64, usize)> = Vec::new();
        for (offset, length) in spans {
            match ranges.last_mut() {
                Some((last_offset, last_length)) if offset <= *last_offset + *last_length as u64 => {
                    let end = (offset + length as u64).max(*last_offset + *last_length as u64);
                    *last_length = (end - *last_offset) as usize;
                }
                _ => ranges.push((offset, length)),
            }
        }
        ranges
    }

    /// Sorted distinct offsets of the given kind across this map and `others`.
    pub fn unique_offsets(&self, kind: AccessKind, others: &[&AddressMap]) -> Vec<u64> {
        ::std::iter::once(self)
            .chain(others.iter().copied())
            .flat_map(|map| map.offsets(kind))
            .sorted()
            .dedup()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::item::{Access, MemoryItem, MemoryKind, RegisterItem, RegisterKind};
    use super::*;

    fn word(designator: &str, offset: u64, access: Access) -> RegisterItem {
        RegisterItem::full(designator, offset, access, RegisterKind::StdLogic, 32, 0).unwrap()
    }

    #[test]
    fn add_then_lookup_returns_the_item() {
        let mut map = AddressMap::new(false);
        map.add(word("ctrl", 0, Access::ReadWrite)).unwrap();
        map.add(word("status", 4, Access::Read)).unwrap();

        assert_eq!(map.lookup("ctrl").unwrap().designator(), "ctrl");
        assert_eq!(map.lookup_at(AccessKind::Read, 4).unwrap().designator(), "status");
        assert!(map.lookup_at(AccessKind::Write, 4).is_none(), "status is not write-indexed");
        assert!(map.lookup("missing").is_none());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn duplicate_designator_fails() {
        let mut map = AddressMap::new(false);
        map.add(word("ctrl", 0, Access::ReadWrite)).unwrap();
        assert!(
            matches!(map.add(word("ctrl", 8, Access::Read)), Err(MapError::DuplicateDesignator(_))),
            "the designator table is unique"
        );
    }

    #[test]
    fn occupied_offset_fails_unless_permitted() {
        let mut map = AddressMap::new(false);
        map.add(word("a", 0, Access::Read)).unwrap();
        assert!(
            matches!(map.add(word("b", 0, Access::Write)), Err(MapError::OffsetInUse { .. })),
            "offsets are exclusive across access kinds"
        );

        let mut shared = AddressMap::new(true);
        shared.add(word("a", 0, Access::Read)).unwrap();
        shared.add(word("b", 0, Access::Write)).unwrap();
        assert_eq!(shared.len(), 2);
    }

    #[test]
    fn inaccessible_item_is_rejected() {
        let mut map = AddressMap::new(false);
        assert!(matches!(map.add(word("ghost", 0, Access::None)), Err(MapError::NotAccessible { .. })));
    }

    #[test]
    fn overlap_sweep_reports_each_pair_once() {
        let mut map = AddressMap::new(true);
        map.add(MemoryItem::new("a", 0, 4, Access::Read, MemoryKind::Ram).unwrap()).unwrap();
        map.add(MemoryItem::new("b", 2, 4, Access::Read, MemoryKind::Ram).unwrap()).unwrap();

        let conflicts = map.check_overlaps(AccessKind::Read);
        assert_eq!(conflicts.len(), 1, "[0,4) and [2,6) overlap exactly once");
        let text = conflicts[0].to_string();
        assert!(text.contains("`a`") && text.contains("`b`"), "conflict names both items: {}", text);

        let mut adjacent = AddressMap::new(false);
        adjacent.add(word("a", 0, Access::Read)).unwrap();
        adjacent.add(word("b", 4, Access::Read)).unwrap();
        assert!(adjacent.check_overlaps(AccessKind::Read).is_empty(), "touching ranges do not overlap");
    }

    #[test]
    fn overlap_sweep_is_per_access_kind() {
        let mut map = AddressMap::new(true);
        map.add(MemoryItem::new("rd", 0, 8, Access::Read, MemoryKind::Ram).unwrap()).unwrap();
        map.add(MemoryItem::new("wr", 4, 8, Access::Write, MemoryKind::Ram).unwrap()).unwrap();

        assert!(map.check_overlaps(AccessKind::Read).is_empty(), "the write item is invisible to reads");
        assert!(map.check_overlaps(AccessKind::Write).is_empty(), "the read item is invisible to writes");
    }

    #[test]
    fn simplified_ranges_merge_touching_spans() {
        let mut map = AddressMap::new(false);
        map.add(word("a", 0, Access::Read)).unwrap();
        map.add(word("b", 4, Access::Read)).unwrap();
        map.add(word("c", 12, Access::Read)).unwrap();

        assert_eq!(map.simplified_ranges(AccessKind::Read), vec![(0, 8), (12, 4)]);
    }

    #[test]
    fn cross_map_check_uses_largest_representative() {
        let mut registers = AddressMap::new(false);
        registers.add(word("reg", 0x10, Access::Read)).unwrap();

        let mut memories = AddressMap::new(false);
        memories.add(MemoryItem::new("ram", 0x0, 0x20, Access::Read, MemoryKind::Ram).unwrap()).unwrap();

        let conflicts = registers.check_overlaps_across(AccessKind::Read, &[&memories]);
        assert_eq!(conflicts.len(), 1, "the register sits inside the RAM span");

        // The representative policy: at a shared offset only the largest item
        // is compared, so a small item hiding behind it goes unreported.
        let mut small = AddressMap::new(true);
        small.add(MemoryItem::new("x", 0, 8, Access::Read, MemoryKind::Ram).unwrap()).unwrap();
        small.add(MemoryItem::new("y", 0, 4, Access::Read, MemoryKind::Ram).unwrap()).unwrap();
        let mut big = AddressMap::new(false);
        big.add(MemoryItem::new("z", 0, 16, Access::Read, MemoryKind::Ram).unwrap()).unwrap();
        let conflicts = small.check_overlaps_across(AccessKind::Read, &[&big]);
        assert!(conflicts.is_empty(), "same-offset items collapse to the largest representative");
    }

    #[test]
    fn unique_offsets_are_sorted_and_distinct() {
        let mut lhs = AddressMap::new(false);
        lhs.add(word("a", 8, Access::Read)).unwrap();
        lhs.add(word("b", 0, Access::Read)).unwrap();
        let mut rhs = AddressMap::new(false);
        rhs.add(word("c", 8, Access::Read)).unwrap();
        rhs.add(word("d", 16, Access::Read)).unwrap();

        assert_eq!(lhs.unique_offsets(AccessKind::Read, &[&rhs]), vec![0, 8, 16]);
    }
}
