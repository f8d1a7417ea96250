//! Addressable items of the register space.

use std::fmt;

use arrayvec::ArrayVec;
use thiserror::Error;

/// Widest register word the item model accepts, in bits.
const MAX_REGISTER_WIDTH: usize = 64;

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum MapError {
    #[error("item `{designator}` has length {length}, expected a multiple of 4 and at least 4 bytes")]
    BadLength { designator: String, length: usize },

    #[error("item `{designator}` has register width {width}, expected 32 or 64")]
    BadRegisterWidth { designator: String, width: usize },

    #[error("item `{designator}` has bit {bit} outside its {width}-bit register word")]
    BadBitRange { designator: String, bit: usize, width: usize },

    #[error("ROM block `{designator}` cannot be write-accessible")]
    RomWritable { designator: String },

    #[error("item `{designator}` is not accessible")]
    NotAccessible { designator: String },

    #[error("designator `{0}` is already present in the map")]
    DuplicateDesignator(String),

    #[error("offset {offset:#x} of item `{designator}` is already occupied")]
    OffsetInUse { designator: String, offset: u64 },
}

/// Accessibility of one item, as described by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Not reachable from the bus. Rejected at [`add`](super::AddressMap::add) time.
    None,

    /// Read-only.
    Read,

    /// Write-only.
    Write,

    /// Read and write.
    ReadWrite,
}

impl Access {
    /// Returns `true` if this accessibility covers the given access kind.
    pub fn allows(self, kind: AccessKind) -> bool {
        match self {
            Access::None => false,
            Access::Read => kind == AccessKind::Read,
            Access::Write => kind == AccessKind::Write,
            Access::ReadWrite => true,
        }
    }
}

/// Query-side access selector. One kind per query; combined kinds are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Read access.
    Read,

    /// Write access.
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Read => write!(f, "read"),
            AccessKind::Write => write!(f, "write"),
        }
    }
}

/// Inclusive bit range inside a register word, normalized so `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSpan {
    start: usize,
    end: usize,
}

impl BitSpan {
    /// Creates a normalized span from two bit indices in either order.
    pub fn new(a: usize, b: usize) -> Self { Self { start: a.min(b), end: a.max(b) } }

    /// Lowest covered bit.
    pub fn start(&self) -> usize { self.start }

    /// Highest covered bit.
    pub fn end(&self) -> usize { self.end }

    /// Number of covered bits.
    pub fn width(&self) -> usize { self.end - self.start + 1 }

    /// Returns `true` if the two spans share at least one bit.
    pub fn overlaps(&self, other: &BitSpan) -> bool { self.start <= other.end && other.start <= self.end }

    /// Splits the span per byte lane of a word `byte_width` bytes wide.
    ///
    /// Each entry carries the lane index and the absolute bit sub-range of
    /// that lane covered by this span.
    pub fn lane_slices(&self, byte_width: usize) -> ArrayVec<LaneSlice, 8> {
        let mut slices = ArrayVec::new();
        for lane in 0..byte_width {
            let lane_lo = lane * 8;
            let lane_hi = lane_lo + 7;
            if self.start <= lane_hi && self.end >= lane_lo {
                slices.push(LaneSlice { lane, start_bit: self.start.max(lane_lo), end_bit: self.end.min(lane_hi) });
            }
        }
        slices
    }
}

impl fmt::Display for BitSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "[{}:{}]", self.start, self.end) }
}

/// One byte lane's share of a [`BitSpan`]. Bit indices are absolute within the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneSlice {
    /// Byte lane index, 0-based from the least significant byte.
    pub lane: usize,

    /// Lowest covered bit, absolute within the register word.
    pub start_bit: usize,

    /// Highest covered bit, absolute within the register word.
    pub end_bit: usize,
}

impl LaneSlice {
    /// Lowest covered bit, relative to the lane.
    pub fn local_start(&self) -> usize { self.start_bit - self.lane * 8 }

    /// Highest covered bit, relative to the lane.
    pub fn local_end(&self) -> usize { self.end_bit - self.lane * 8 }

    /// Number of covered bits.
    pub fn width(&self) -> usize { self.end_bit - self.start_bit + 1 }
}

/// Fields shared by every addressable item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCore {
    /// Unique string key across the whole register space.
    pub designator: String,

    /// Display name. Cosmetic; mutable after construction.
    pub name: String,

    /// Category label.
    pub type_name: String,

    /// Byte address of the item.
    pub offset: u64,

    /// Byte footprint. Always a multiple of 4, at least 4.
    pub length: usize,

    /// Accessibility from the bus.
    pub access: Access,

    /// Free-form description. Cosmetic; mutable after construction.
    pub description: String,
}

impl ItemCore {
    fn new(designator: &str, type_name: &str, offset: u64, length: usize, access: Access) -> Self {
        Self {
            designator: designator.to_string(),
            name: designator.to_string(),
            type_name: type_name.to_string(),
            offset,
            length,
            access,
            description: String::new(),
        }
    }

    /// Half-open byte range occupied by the item.
    pub fn byte_range(&self) -> (u64, u64) { (self.offset, self.offset + self.length as u64) }
}

/// Storage interpretation of a register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    /// Plain vector of flops.
    StdLogic,

    /// Vector interpreted as an unsigned quantity; writes go through an unsigned cast.
    Unsigned,
}

/// Kind of a memory block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryKind {
    /// Read/write block RAM.
    Ram,

    /// Read-only block. Write accessibility is a construction error.
    Rom,
}

fn check_register_word(designator: &str, width: usize, span: BitSpan) -> Result<(), MapError> {
    if width != 32 && width != MAX_REGISTER_WIDTH {
        return Err(MapError::BadRegisterWidth { designator: designator.to_string(), width });
    }
    if span.end() >= width {
        return Err(MapError::BadBitRange { designator: designator.to_string(), bit: span.end(), width });
    }
    Ok(())
}

/// A full register or a named bit field inside one register word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterItem {
    /// Common item fields.
    pub core: ItemCore,

    /// Width of the whole register word in bits.
    pub register_width: usize,

    /// Bits of the word covered by this value.
    pub span: BitSpan,

    /// Storage interpretation.
    pub kind: RegisterKind,

    /// Name of the backing signal driven and read by the generated logic.
    pub backing_signal: String,

    /// Reset/default value of the backing signal.
    pub default_value: u64,
}

impl RegisterItem {
    /// Creates a bit-field register value.
    ///
    /// The byte footprint is the parent word's full footprint regardless of
    /// how many bits the span covers.
    pub fn new(
        designator: &str, offset: u64, access: Access, kind: RegisterKind, register_width: usize, span: BitSpan,
        default_value: u64,
    ) -> Result<Self, MapError> {
        check_register_word(designator, register_width, span)?;

        Ok(Self {
            core: ItemCore::new(designator, "register", offset, register_width / 8, access),
            register_width,
            span,
            kind,
            backing_signal: format!("{}_reg", designator),
            default_value,
        })
    }

    /// Creates a register value covering the whole word.
    pub fn full(
        designator: &str, offset: u64, access: Access, kind: RegisterKind, register_width: usize, default_value: u64,
    ) -> Result<Self, MapError> {
        Self::new(designator, offset, access, kind, register_width, BitSpan::new(0, register_width - 1), default_value)
    }

    /// Replaces the backing signal name.
    #[must_use]
    pub fn with_backing_signal(mut self, name: &str) -> Self {
        self.backing_signal = name.to_string();
        self
    }

    /// Sets the cosmetic description text.
    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.core.description = description.to_string();
        self
    }

    /// Verilog type of the backing signal.
    pub fn backing_type(&self) -> String {
        if self.span.width() > 1 {
            format!("reg [{}:0]", self.span.width() - 1)
        } else {
            "reg".to_string()
        }
    }
}

/// A pulse fired when its bit range is read or written; stores nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    /// Common item fields.
    pub core: ItemCore,

    /// Width of the whole register word in bits.
    pub register_width: usize,

    /// Bits of the word this notification watches.
    pub span: BitSpan,

    /// Pulse asserted for one cycle on a read of the range.
    pub read_pulse: String,

    /// Pulse asserted for one cycle on a write of the range.
    pub write_pulse: String,
}

impl NotificationItem {
    /// Creates a notification over a bit range of one register word.
    pub fn new(
        designator: &str, offset: u64, access: Access, register_width: usize, span: BitSpan,
    ) -> Result<Self, MapError> {
        check_register_word(designator, register_width, span)?;

        Ok(Self {
            core: ItemCore::new(designator, "notification", offset, register_width / 8, access),
            register_width,
            span,
            read_pulse: format!("{}_rd_pulse", designator),
            write_pulse: format!("{}_wr_pulse", designator),
        })
    }
}

/// A variable-latency external or block-RAM-backed region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryItem {
    /// Common item fields.
    pub core: ItemCore,

    /// RAM or ROM.
    pub kind: MemoryKind,

    /// Registered data output of the block, sampled once the latency elapses.
    pub output_register: String,

    /// Pulse asserted for one cycle when a read of the block starts.
    pub read_pulse: String,

    /// Pulse asserted for one cycle when a write to the block commits.
    pub write_pulse: String,

    /// Name of the read wait state dedicated to this block.
    pub wait_state: String,
}

impl MemoryItem {
    /// Creates a memory block of `length` bytes.
    pub fn new(designator: &str, offset: u64, length: usize, access: Access, kind: MemoryKind) -> Result<Self, MapError> {
        if length < 4 || length % 4 != 0 {
            return Err(MapError::BadLength { designator: designator.to_string(), length });
        }
        if kind == MemoryKind::Rom && access.allows(AccessKind::Write) {
            return Err(MapError::RomWritable { designator: designator.to_string() });
        }

        Ok(Self {
            core: ItemCore::new(designator, "memory", offset, length, access),
            kind,
            output_register: format!("{}_dout", designator),
            read_pulse: format!("{}_rd_pulse", designator),
            write_pulse: format!("{}_wr_pulse", designator),
            wait_state: format!("RD_MEM_{}", designator.to_uppercase()),
        })
    }
}

/// Any addressable item of the register space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapItem {
    /// Full register or bit field.
    Register(RegisterItem),

    /// Read/write pulse without storage.
    Notification(NotificationItem),

    /// Variable-latency memory block.
    Memory(MemoryItem),
}

impl MapItem {
    /// Common item fields.
    pub fn core(&self) -> &ItemCore {
        match self {
            MapItem::Register(item) => &item.core,
            MapItem::Notification(item) => &item.core,
            MapItem::Memory(item) => &item.core,
        }
    }

    /// Unique string key of the item.
    pub fn designator(&self) -> &str { &self.core().designator }

    /// Byte address of the item.
    pub fn offset(&self) -> u64 { self.core().offset }

    /// Byte footprint of the item.
    pub fn length(&self) -> usize { self.core().length }

    /// Accessibility of the item.
    pub fn access(&self) -> Access { self.core().access }

    /// Half-open byte range occupied by the item.
    pub fn byte_range(&self) -> (u64, u64) { self.core().byte_range() }

    /// Bit span within a register word, for word-scoped items.
    pub fn span(&self) -> Option<BitSpan> {
        match self {
            MapItem::Register(item) => Some(item.span),
            MapItem::Notification(item) => Some(item.span),
            MapItem::Memory(_) => None,
        }
    }

    /// Mutable access to the common item fields, for the cosmetic ones.
    pub fn core_mut(&mut self) -> &mut ItemCore {
        match self {
            MapItem::Register(item) => &mut item.core,
            MapItem::Notification(item) => &mut item.core,
            MapItem::Memory(item) => &mut item.core,
        }
    }
}

impl From<RegisterItem> for MapItem {
    fn from(item: RegisterItem) -> Self { MapItem::Register(item) }
}

impl From<NotificationItem> for MapItem {
    fn from(item: NotificationItem) -> Self { MapItem::Notification(item) }
}

impl From<MemoryItem> for MapItem {
    fn from(item: MemoryItem) -> Self { MapItem::Memory(item) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_geometry_is_validated() {
        assert!(
            RegisterItem::full("ctrl", 0, Access::ReadWrite, RegisterKind::StdLogic, 32, 0).is_ok(),
            "a plain 32-bit register is valid"
        );
        assert!(
            matches!(
                RegisterItem::full("ctrl", 0, Access::ReadWrite, RegisterKind::StdLogic, 24, 0),
                Err(MapError::BadRegisterWidth { .. })
            ),
            "only 32- and 64-bit words are allowed"
        );
        assert!(
            matches!(
                RegisterItem::new(
                    "ctrl",
                    0,
                    Access::ReadWrite,
                    RegisterKind::StdLogic,
                    32,
                    BitSpan::new(30, 34),
                    0
                ),
                Err(MapError::BadBitRange { .. })
            ),
            "bits outside the word are rejected"
        );
    }

    #[test]
    fn field_occupies_full_word_footprint() {
        let field =
            RegisterItem::new("mode", 8, Access::ReadWrite, RegisterKind::Unsigned, 32, BitSpan::new(4, 11), 3)
                .unwrap();
        assert_eq!(field.core.length, 4, "a bit field still claims its parent's bytes");
        assert_eq!(field.span.width(), 8);

        let wide = RegisterItem::full("wide", 16, Access::Read, RegisterKind::StdLogic, 64, 0).unwrap();
        assert_eq!(wide.core.length, 8);
    }

    #[test]
    fn bit_span_is_normalized() {
        let span = BitSpan::new(11, 4);
        assert_eq!((span.start(), span.end()), (4, 11), "indices swap into order");
        assert!(span.overlaps(&BitSpan::new(0, 7)));
        assert!(span.overlaps(&BitSpan::new(11, 31)));
        assert!(!span.overlaps(&BitSpan::new(12, 15)));
    }

    #[test]
    fn lane_slices_split_on_byte_boundaries() {
        let slices = BitSpan::new(4, 19).lane_slices(4);
        assert_eq!(slices.len(), 3, "bits [4,19] touch three lanes of a 32-bit word");
        assert_eq!((slices[0].lane, slices[0].start_bit, slices[0].end_bit), (0, 4, 7));
        assert_eq!((slices[1].lane, slices[1].start_bit, slices[1].end_bit), (1, 8, 15));
        assert_eq!((slices[2].lane, slices[2].start_bit, slices[2].end_bit), (2, 16, 19));
        assert_eq!(slices[2].local_start(), 0);
        assert_eq!(slices[2].local_end(), 3);
    }

    #[test]
    fn rom_rejects_write_access() {
        assert!(
            matches!(
                MemoryItem::new("boot", 0x100, 64, Access::ReadWrite, MemoryKind::Rom),
                Err(MapError::RomWritable { .. })
            ),
            "writable ROM is a construction error"
        );
        assert!(MemoryItem::new("boot", 0x100, 64, Access::Read, MemoryKind::Rom).is_ok());
        assert!(
            matches!(
                MemoryItem::new("buf", 0x100, 6, Access::ReadWrite, MemoryKind::Ram),
                Err(MapError::BadLength { .. })
            ),
            "length must be a multiple of 4"
        );
    }
}
