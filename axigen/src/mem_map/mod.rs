//! Address/bit map of the register space.
//!
//! Items are built once by the caller, validated at construction and at
//! [`AddressMap::add`], then handed read-only to the synthesizer. Overlap
//! queries never fail; they return every conflict they find and leave the
//! escalation decision to the caller.

mod bitfield;
mod item;
mod map;

pub use bitfield::BitFieldMap;
pub use item::{
    Access, AccessKind, BitSpan, ItemCore, LaneSlice, MapError, MapItem, MemoryItem, MemoryKind, NotificationItem,
    RegisterItem, RegisterKind,
};
pub use map::{AddressMap, Conflict};
