//! Address map aware of bit fields sharing one register word.

use std::ops::{Deref, DerefMut};

use itertools::Itertools;

use super::item::{AccessKind, MapItem};
use super::map::{AddressMap, Conflict};

/// An [`AddressMap`] that permits several items per offset and validates
/// their bit spans against each other.
#[derive(Debug, Default)]
pub struct BitFieldMap {
    inner: AddressMap,
}

impl Deref for BitFieldMap {
    type Target = AddressMap;

    fn deref(&self) -> &AddressMap { &self.inner }
}

impl DerefMut for BitFieldMap {
    fn deref_mut(&mut self) -> &mut AddressMap { &mut self.inner }
}

impl BitFieldMap {
    /// Creates an empty map with multiple-at-offset permitted.
    pub fn new() -> Self { Self { inner: AddressMap::new(true) } }

    /// Reports every pair of same-offset items of the given kind whose bit
    /// spans share at least one bit.
    pub fn check_bit_overlaps(&self, kind: AccessKind) -> Vec<Conflict> {
        self.inner
            .offsets(kind)
            .into_iter()
            .flat_map(|offset| {
                self.inner
                    .items_at(kind, offset)
                    .into_iter()
                    .filter_map(|item| item.span().map(|span| (item, span)))
                    .tuple_combinations()
                    .filter(|((_, lhs), (_, rhs))| lhs.overlaps(rhs))
                    .map(move |((lhs_item, lhs), (rhs_item, rhs))| Conflict::BitRange {
                        kind,
                        offset,
                        lhs: (lhs_item.designator().to_string(), lhs),
                        rhs: (rhs_item.designator().to_string(), rhs),
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Reports address-level and bit-level conflicts of the given kind in one pass.
    pub fn check_overlaps(&self, kind: AccessKind) -> Vec<Conflict> {
        let mut conflicts = self.inner.check_overlaps(kind);
        conflicts.extend(self.check_bit_overlaps(kind));
        conflicts
    }

    /// Returns every item of the given kind at `offset` whose byte-lane
    /// mapping includes `lane`, with the lane-local bit sub-range it covers.
    pub fn fields_in_byte_lane(&self, kind: AccessKind, offset: u64, lane: usize) -> Vec<(&MapItem, usize, usize)> {
        self.inner
            .items_at(kind, offset)
            .into_iter()
            .filter_map(|item| {
                let span = item.span()?;
                span.lane_slices(item.length())
                    .into_iter()
                    .find(|slice| slice.lane == lane)
                    .map(|slice| (item, slice.local_start(), slice.local_end()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::item::{Access, BitSpan, RegisterItem, RegisterKind};
    use super::*;

    fn field(designator: &str, offset: u64, lo: usize, hi: usize) -> RegisterItem {
        RegisterItem::new(designator, offset, Access::ReadWrite, RegisterKind::StdLogic, 32, BitSpan::new(lo, hi), 0)
            .unwrap()
    }

    #[test]
    fn overlapping_bit_fields_are_flagged() {
        let mut map = BitFieldMap::new();
        map.add(field("low", 0, 0, 7)).unwrap();
        map.add(field("mid", 0, 4, 11)).unwrap();

        let conflicts = map.check_bit_overlaps(AccessKind::Read);
        assert_eq!(conflicts.len(), 1, "[0:7] and [4:11] share bits 4..=7");
        assert!(conflicts[0].to_string().contains("bit fields"), "reported as a bit conflict");
    }

    #[test]
    fn disjoint_bit_fields_pass() {
        let mut map = BitFieldMap::new();
        map.add(field("low", 0, 0, 7)).unwrap();
        map.add(field("high", 0, 8, 15)).unwrap();

        assert!(map.check_bit_overlaps(AccessKind::Read).is_empty());
        assert!(map.check_overlaps(AccessKind::Read).is_empty(), "the combined check is clean too");
    }

    #[test]
    fn combined_check_reports_both_levels() {
        let mut map = BitFieldMap::new();
        // A 64-bit word at 0 spills into the word at 4; two fields collide at 8.
        map.add(
            RegisterItem::full("wide", 0, Access::ReadWrite, RegisterKind::StdLogic, 64, 0).unwrap(),
        )
        .unwrap();
        map.add(field("next", 4, 0, 31)).unwrap();
        map.add(field("a", 8, 0, 3)).unwrap();
        map.add(field("b", 8, 2, 5)).unwrap();

        let conflicts = map.check_overlaps(AccessKind::Read);
        assert_eq!(conflicts.len(), 2, "one byte-range and one bit-range conflict: {:?}", conflicts);
        assert!(matches!(conflicts[0], Conflict::ByteRange { .. }));
        assert!(matches!(conflicts[1], Conflict::BitRange { .. }));
    }

    #[test]
    fn byte_lane_query_is_lane_local() {
        let mut map = BitFieldMap::new();
        map.add(field("wide", 0, 4, 19)).unwrap();
        map.add(field("top", 0, 24, 31)).unwrap();

        let lane1 = map.fields_in_byte_lane(AccessKind::Write, 0, 1);
        assert_eq!(lane1.len(), 1, "only `wide` touches lane 1");
        assert_eq!((lane1[0].1, lane1[0].2), (0, 7), "lane 1 is fully covered");

        let lane2 = map.fields_in_byte_lane(AccessKind::Write, 0, 2);
        assert_eq!((lane2[0].1, lane2[0].2), (0, 3), "lane 2 keeps bits 16..=19 only");

        let lane3 = map.fields_in_byte_lane(AccessKind::Write, 0, 3);
        assert_eq!(lane3.len(), 1, "only `top` touches lane 3");
        assert_eq!(lane3[0].0.designator(), "top");
    }
}
