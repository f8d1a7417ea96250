//! AXI-Lite slave register-space synthesizer.
//!
//! Consumes the finished, immutable item maps and derives the synchronous
//! read/write state machines plus the combinational response and readiness
//! logic implementing the AXI-Lite handshake over that address map. One
//! synthesis pass either succeeds with a [`vir::Module`] or aborts with every
//! conflict found.

mod read;
mod write;

use thiserror::Error;

use crate::axi::{self, Resp};
use crate::config::SynthConfig;
use crate::geometry::{BusGeometry, MAX_ADDR_WIDTH};
use crate::mem_map::{
    AccessKind, AddressMap, BitFieldMap, Conflict, MapError, MapItem, MemoryItem, NotificationItem, RegisterItem,
};
use crate::utils::{clog2, hex_lit, zero_lit};
use crate::vir;
use crate::vir::{BinaryOp, Declaration, Expression, ModuleItem, PortDeclaration, Range, Statement, UnaryOp};

pub(crate) const RD_STATE: &str = "rd_state_reg";
pub(crate) const RD_ADDR: &str = "rd_addr_reg";
pub(crate) const RD_LATENCY: &str = "rd_latency_reg";
pub(crate) const RRESP: &str = "rresp_reg";
pub(crate) const RRESP_NEXT: &str = "rresp_next";
pub(crate) const RVALID: &str = "rvalid_reg";
pub(crate) const RVALID_NEXT: &str = "rvalid_next";
pub(crate) const RDATA: &str = "rdata_reg";
pub(crate) const RDATA_NEXT: &str = "rdata_next";
pub(crate) const RD_MISALIGNED: &str = "rd_misaligned";
pub(crate) const RD_HIT: &str = "rd_addr_hit";

pub(crate) const WR_STATE: &str = "wr_state_reg";
pub(crate) const WR_ADDR: &str = "wr_addr_reg";
pub(crate) const WR_DATA: &str = "wr_data_reg";
pub(crate) const WR_STRB: &str = "wr_strb_reg";
pub(crate) const BRESP: &str = "bresp_reg";
pub(crate) const BRESP_NEXT: &str = "bresp_next";
pub(crate) const BVALID: &str = "bvalid_reg";
pub(crate) const BVALID_NEXT: &str = "bvalid_next";
pub(crate) const REG_WR_PULSE: &str = "reg_wr_pulse";
pub(crate) const WR_MISALIGNED: &str = "wr_misaligned";
pub(crate) const WR_HIT: &str = "wr_addr_hit";

fn fmt_conflicts(conflicts: &[Conflict]) -> String {
    conflicts.iter().map(|conflict| format!("  - {}", conflict)).collect::<Vec<_>>().join("\n")
}

#[allow(missing_docs)]
#[allow(variant_size_differences)]
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("register space holds {} conflicting items:\n{}", .0.len(), fmt_conflicts(.0))]
    Conflicts(Vec<Conflict>),

    #[error("register space needs {required} address bits, more than the bus supports")]
    AddrWidthExceeded { required: usize },

    #[error(transparent)]
    Map(#[from] MapError),
}

/// Synthesizer for one AXI-Lite slave register space.
///
/// Registers and notifications share one [`BitFieldMap`] (they may cohabit a
/// register word); memory blocks live in their own [`AddressMap`].
#[derive(Debug)]
pub struct SlaveSynthesizer {
    geometry: BusGeometry,
    config: SynthConfig,
    registers: BitFieldMap,
    memories: AddressMap,
}

impl SlaveSynthesizer {
    /// Creates an empty synthesizer over the given geometry.
    pub fn new(geometry: BusGeometry, config: SynthConfig) -> Self {
        Self { geometry, config, registers: BitFieldMap::new(), memories: AddressMap::new(false) }
    }

    /// Bus geometry of this instance.
    pub fn geometry(&self) -> &BusGeometry { &self.geometry }

    /// Register and notification map.
    pub fn registers(&self) -> &BitFieldMap { &self.registers }

    /// Memory block map.
    pub fn memories(&self) -> &AddressMap { &self.memories }

    fn check_word_width(&self, designator: &str, width: usize) -> Result<(), MapError> {
        if width != self.geometry.register_width() {
            return Err(MapError::BadRegisterWidth { designator: designator.to_string(), width });
        }
        Ok(())
    }

    /// Adds a register value to the space.
    pub fn add_register(&mut self, item: RegisterItem) -> Result<(), MapError> {
        self.check_word_width(&item.core.designator, item.register_width)?;
        self.registers.add(item)
    }

    /// Adds a notification to the space.
    pub fn add_notification(&mut self, item: NotificationItem) -> Result<(), MapError> {
        self.check_word_width(&item.core.designator, item.register_width)?;
        self.registers.add(item)
    }

    /// Adds a memory block to the space.
    pub fn add_memory(&mut self, item: MemoryItem) -> Result<(), MapError> { self.memories.add(item) }

    /// Reports every structural conflict of the space: byte-range overlaps
    /// across registers and memories plus bit-range overlaps within register
    /// words, for both access kinds.
    pub fn check_conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for kind in [AccessKind::Read, AccessKind::Write] {
            conflicts.extend(self.registers.check_overlaps_across(kind, &[&self.memories]));
            conflicts.extend(self.registers.check_bit_overlaps(kind));
        }
        conflicts
    }

    /// Runs one synthesis pass, emitting the complete slave module.
    pub fn synthesize(&self, module_name: &str) -> Result<vir::Module, SynthError> {
        let conflicts = self.check_conflicts();
        if !conflicts.is_empty() {
            return Err(SynthError::Conflicts(conflicts));
        }

        let ctx = Ctx::new(self)?;

        let module_items = vec![
            constants(&ctx),
            signals(&ctx),
            decode(&ctx),
            read::read_channel(&ctx),
            write::write_channel(&ctx),
            write::register_write(&ctx),
        ];

        Ok(vir::Module { name: module_name.to_string(), port_decls: ports(&ctx), module_items })
    }
}

/// Precomputed view of the space shared by the emission passes.
#[derive(Debug)]
pub(crate) struct Ctx<'a> {
    pub(crate) geometry: &'a BusGeometry,
    pub(crate) config: &'a SynthConfig,
    pub(crate) registers: &'a BitFieldMap,
    pub(crate) addr_width: usize,
    pub(crate) latency_width: usize,
    pub(crate) read_mems: Vec<&'a MemoryItem>,
    pub(crate) write_mems: Vec<&'a MemoryItem>,
    pub(crate) read_states: Vec<String>,
    pub(crate) read_state_width: usize,
    pub(crate) read_ranges: Vec<(u64, usize)>,
    pub(crate) write_ranges: Vec<(u64, usize)>,
    pub(crate) reg_write_ranges: Vec<(u64, usize)>,
}

fn as_memory(item: &MapItem) -> &MemoryItem {
    match item {
        MapItem::Memory(memory) => memory,
        _ => panic!("internal error: memory map holds a non-memory item"),
    }
}

/// Merges two ascending simplified range lists into one.
fn merge_ranges(lhs: Vec<(u64, usize)>, rhs: Vec<(u64, usize)>) -> Vec<(u64, usize)> {
    let mut spans = [lhs, rhs].concat();
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

impl<'a> Ctx<'a> {
    fn new(slave: &'a SlaveSynthesizer) -> Result<Self, SynthError> {
        let top_end = slave
            .registers
            .items_for(AccessKind::Read)
            .into_iter()
            .chain(slave.registers.items_for(AccessKind::Write))
            .chain(slave.memories.items_for(AccessKind::Read))
            .chain(slave.memories.items_for(AccessKind::Write))
            .map(|item| item.byte_range().1)
            .max()
            .unwrap_or(0);

        let required = clog2(top_end as usize);
        if required > MAX_ADDR_WIDTH {
            return Err(SynthError::AddrWidthExceeded { required });
        }
        let addr_width = required.max(slave.geometry.min_addr_width());

        let read_mems =
            slave.memories.items_for(AccessKind::Read).into_iter().map(as_memory).collect::<Vec<_>>();
        let write_mems =
            slave.memories.items_for(AccessKind::Write).into_iter().map(as_memory).collect::<Vec<_>>();

        let mut read_states = vec!["RD_IDLE".to_string()];
        read_states.extend(read_mems.iter().map(|memory| memory.wait_state.clone()));
        read_states.push("RD_REG".to_string());
        read_states.push("RD_RESP".to_string());

        let read_ranges = merge_ranges(
            slave.registers.simplified_ranges(AccessKind::Read),
            slave.memories.simplified_ranges(AccessKind::Read),
        );
        let write_ranges = merge_ranges(
            slave.registers.simplified_ranges(AccessKind::Write),
            slave.memories.simplified_ranges(AccessKind::Write),
        );

        Ok(Self {
            geometry: &slave.geometry,
            config: &slave.config,
            registers: &slave.registers,
            addr_width,
            latency_width: clog2(slave.config.mem_latency + 1).max(1),
            read_mems,
            write_mems,
            read_state_width: clog2(read_states.len()).max(1),
            read_states,
            read_ranges,
            write_ranges,
            reg_write_ranges: slave.registers.simplified_ranges(AccessKind::Write),
        })
    }

    pub(crate) fn data_width(&self) -> usize { self.geometry.register_width() }

    pub(crate) fn strb_width(&self) -> usize { self.geometry.register_byte_width() }

    /// Readable register-word items at the given offset, in insertion order.
    pub(crate) fn read_fields_at(&self, offset: u64) -> Vec<&'a MapItem> {
        self.registers.items_at(AccessKind::Read, offset)
    }
}

// Small expression builders shared by the emission passes.

pub(crate) fn ident(name: &str) -> Expression { Expression::ident(name.to_string()) }

pub(crate) fn num(value: impl ToString) -> Expression { Expression::number(value.to_string()) }

pub(crate) fn eq(lhs: Expression, rhs: Expression) -> Expression { Expression::binary(BinaryOp::Eq, lhs, rhs) }

pub(crate) fn and(lhs: Expression, rhs: Expression) -> Expression {
    Expression::binary(BinaryOp::LogicalAnd, lhs, rhs)
}

pub(crate) fn or(lhs: Expression, rhs: Expression) -> Expression { Expression::binary(BinaryOp::LogicalOr, lhs, rhs) }

pub(crate) fn not(expr: Expression) -> Expression { Expression::unary(UnaryOp::Negation, expr) }

pub(crate) fn bit(name: &str, index: usize) -> Expression {
    ident(name).with_range(Range::new_index(num(index)))
}

pub(crate) fn slice(name: &str, base: usize, width: usize) -> Expression {
    ident(name).with_range(Range::new_range(num(base), num(width)))
}

/// `lo <= addr && addr <= hi - 1` over a half-open byte range.
///
/// The upper bound is compared inclusively: a range ending exactly at the top
/// of the address space would otherwise need a literal one bit too wide.
pub(crate) fn addr_in_range(addr: &str, range: (u64, usize), addr_width: usize) -> Expression {
    let (lo, length) = range;
    let last = lo + length as u64 - 1;
    and(
        Expression::binary(BinaryOp::Ge, ident(addr), num(hex_lit(addr_width, lo))),
        Expression::binary(BinaryOp::Le, ident(addr), num(hex_lit(addr_width, last))),
    )
}

/// Disjunction of `addr_in_range` over every range; `1'b0` when none exist.
pub(crate) fn addr_in_any_range(addr: &str, ranges: &[(u64, usize)], addr_width: usize) -> Expression {
    ranges
        .iter()
        .map(|range| addr_in_range(addr, *range, addr_width))
        .reduce(or)
        .unwrap_or_else(|| num("1'b0"))
}

fn ports(ctx: &Ctx<'_>) -> Vec<PortDeclaration> {
    let geom = ctx.geometry;
    vec![
        PortDeclaration::input(1, geom.clock()),
        PortDeclaration::input(1, geom.reset()),
        PortDeclaration::input(ctx.addr_width, geom.port("AWADDR")),
        PortDeclaration::input(1, geom.port("AWVALID")),
        PortDeclaration::output(1, geom.port("AWREADY")),
        PortDeclaration::input(ctx.data_width(), geom.port("WDATA")),
        PortDeclaration::input(ctx.strb_width(), geom.port("WSTRB")),
        PortDeclaration::input(1, geom.port("WVALID")),
        PortDeclaration::output(1, geom.port("WREADY")),
        PortDeclaration::output(axi::RESP_WIDTH, geom.port("BRESP")),
        PortDeclaration::output(1, geom.port("BVALID")),
        PortDeclaration::input(1, geom.port("BREADY")),
        PortDeclaration::input(ctx.addr_width, geom.port("ARADDR")),
        PortDeclaration::input(1, geom.port("ARVALID")),
        PortDeclaration::output(1, geom.port("ARREADY")),
        PortDeclaration::output(ctx.data_width(), geom.port("RDATA")),
        PortDeclaration::output(axi::RESP_WIDTH, geom.port("RRESP")),
        PortDeclaration::output(1, geom.port("RVALID")),
    ]
}

fn constants(ctx: &Ctx<'_>) -> ModuleItem {
    let mut decls = vec![
        Declaration::localparam("RESP_OKAY".to_string(), num(Resp::Okay.literal())),
        Declaration::localparam("RESP_SLVERR".to_string(), num(Resp::Slverr.literal())),
        Declaration::localparam("C_MEM_LATENCY".to_string(), num(ctx.config.mem_latency)),
        Declaration::localparam(
            "DEFAULT_RDATA".to_string(),
            num(hex_lit(ctx.data_width(), ctx.config.default_read_value as u64)),
        ),
    ];

    for (encoding, state) in ctx.read_states.iter().enumerate() {
        decls.push(Declaration::localparam(state.clone(), num(encoding)));
    }
    for (encoding, state) in ["WR_IDLE", "WR_WAIT_ADDR", "WR_WAIT_DATA", "WR_RESP"].iter().enumerate() {
        decls.push(Declaration::localparam(state.to_string(), num(encoding)));
    }

    ModuleItem::Commented(
        "Constants".to_string(),
        Some("End constants".to_string()),
        vec![ModuleItem::Declarations(decls)],
    )
}

fn signals(ctx: &Ctx<'_>) -> ModuleItem {
    let data_width = ctx.data_width();
    let mut decls = vec![
        Declaration::reg(ctx.read_state_width, RD_STATE.to_string())
            .with_init(num("RD_IDLE"))
            .with_comment("read channel state".to_string()),
        Declaration::reg(ctx.addr_width, RD_ADDR.to_string())
            .with_init(num(zero_lit(ctx.addr_width)))
            .with_comment("latched read address".to_string()),
        Declaration::reg(ctx.latency_width, RD_LATENCY.to_string())
            .with_init(num(zero_lit(ctx.latency_width)))
            .with_comment("memory access latency counter".to_string()),
        Declaration::reg(axi::RESP_WIDTH, RRESP.to_string())
            .with_init(num("RESP_OKAY"))
            .with_comment("read response".to_string()),
        Declaration::reg(axi::RESP_WIDTH, RRESP_NEXT.to_string()),
        Declaration::reg(1, RVALID.to_string()).with_init(num("1'b0")).with_comment("read data valid".to_string()),
        Declaration::reg(1, RVALID_NEXT.to_string()),
        Declaration::reg(data_width, RDATA.to_string())
            .with_init(num(zero_lit(data_width)))
            .with_comment("read data".to_string()),
        Declaration::reg(data_width, RDATA_NEXT.to_string()),
        Declaration::reg(2, WR_STATE.to_string())
            .with_init(num("WR_IDLE"))
            .with_comment("write channel state".to_string()),
        Declaration::reg(ctx.addr_width, WR_ADDR.to_string())
            .with_init(num(zero_lit(ctx.addr_width)))
            .with_comment("latched write address".to_string()),
        Declaration::reg(data_width, WR_DATA.to_string())
            .with_init(num(zero_lit(data_width)))
            .with_comment("latched write data".to_string()),
        Declaration::reg(ctx.strb_width(), WR_STRB.to_string())
            .with_init(num(zero_lit(ctx.strb_width())))
            .with_comment("latched write strobe".to_string()),
        Declaration::reg(axi::RESP_WIDTH, BRESP.to_string())
            .with_init(num("RESP_OKAY"))
            .with_comment("write response".to_string()),
        Declaration::reg(axi::RESP_WIDTH, BRESP_NEXT.to_string()),
        Declaration::reg(1, BVALID.to_string())
            .with_init(num("1'b0"))
            .with_comment("write response valid".to_string()),
        Declaration::reg(1, BVALID_NEXT.to_string()),
        Declaration::reg(1, REG_WR_PULSE.to_string())
            .with_init(num("1'b0"))
            .with_comment("register range write commit".to_string()),
    ];

    for item in ctx.registers.items_for(AccessKind::Read) {
        if let MapItem::Notification(notification) = item {
            decls.push(
                Declaration::reg(1, notification.read_pulse.clone())
                    .with_init(num("1'b0"))
                    .with_comment(format!("read pulse of `{}`", notification.core.designator)),
            );
        }
    }
    for item in ctx.registers.items_for(AccessKind::Write) {
        if let MapItem::Notification(notification) = item {
            decls.push(
                Declaration::reg(1, notification.write_pulse.clone())
                    .with_init(num("1'b0"))
                    .with_comment(format!("write pulse of `{}`", notification.core.designator)),
            );
        }
    }

    let mut seen = Vec::new();
    for kind in [AccessKind::Read, AccessKind::Write] {
        for item in ctx.registers.items_for(kind) {
            if let MapItem::Register(register) = item {
                if seen.contains(&&register.core.designator) {
                    continue;
                }
                seen.push(&register.core.designator);
                let comment = if register.core.description.is_empty() {
                    format!("backing value of `{}`", register.core.designator)
                } else {
                    register.core.description.clone()
                };
                decls.push(
                    Declaration::reg(register.span.width(), register.backing_signal.clone())
                        .with_init(num(hex_lit(register.span.width(), register.default_value)))
                        .with_comment(comment),
                );
            }
        }
    }

    for memory in &ctx.read_mems {
        decls.push(
            Declaration::net(ctx.data_width(), memory.output_register.clone())
                .with_comment(format!("registered output of `{}`", memory.core.designator)),
        );
        decls.push(
            Declaration::reg(1, memory.read_pulse.clone())
                .with_init(num("1'b0"))
                .with_comment(format!("read start pulse of `{}`", memory.core.designator)),
        );
    }
    for memory in &ctx.write_mems {
        decls.push(
            Declaration::reg(1, memory.write_pulse.clone())
                .with_init(num("1'b0"))
                .with_comment(format!("write commit pulse of `{}`", memory.core.designator)),
        );
    }

    ModuleItem::Commented(
        "Signals".to_string(),
        Some("End signals".to_string()),
        vec![ModuleItem::Declarations(decls)],
    )
}

fn decode(ctx: &Ctx<'_>) -> ModuleItem {
    let geom = ctx.geometry;
    let decls = vec![
        Declaration::net(1, RD_MISALIGNED.to_string()),
        Declaration::net(1, RD_HIT.to_string()),
        Declaration::net(1, WR_MISALIGNED.to_string()),
        Declaration::net(1, WR_HIT.to_string()),
    ];

    let lsb = geom.addr_lsb();
    let conts = vec![
        vir::ContinuousAssign::new(
            ident(RD_MISALIGNED),
            Expression::binary(
                BinaryOp::Neq,
                slice(&geom.port("ARADDR"), 0, lsb),
                num(zero_lit(lsb)),
            ),
        ),
        vir::ContinuousAssign::new(
            ident(RD_HIT),
            addr_in_any_range(&geom.port("ARADDR"), &ctx.read_ranges, ctx.addr_width),
        ),
        vir::ContinuousAssign::new(
            ident(WR_MISALIGNED),
            Expression::binary(
                BinaryOp::Neq,
                slice(&geom.port("AWADDR"), 0, lsb),
                num(zero_lit(lsb)),
            ),
        ),
        vir::ContinuousAssign::new(
            ident(WR_HIT),
            addr_in_any_range(&geom.port("AWADDR"), &ctx.write_ranges, ctx.addr_width),
        ),
    ];

    ModuleItem::Commented(
        "Address decode".to_string(),
        Some("End address decode".to_string()),
        vec![ModuleItem::Declarations(decls), ModuleItem::ContinuousAssigns(conts)],
    )
}

/// Nonblocking `lhs <= rhs` on a plain identifier.
pub(crate) fn nb(lhs: &str, rhs: Expression) -> Statement {
    Statement::nonblocking_assignment(ident(lhs), rhs)
}

/// Blocking `lhs = rhs` on a plain identifier.
pub(crate) fn blk(lhs: &str, rhs: Expression) -> Statement { Statement::blocking_assignment(ident(lhs), rhs) }

/// The clocked event expression of the bus.
pub(crate) fn clocked(ctx: &Ctx<'_>) -> String { format!("always @(posedge {})", ctx.geometry.clock()) }

/// Synchronous reset guard appended at the tail of a clocked process.
pub(crate) fn reset_guard(ctx: &Ctx<'_>, stmts: Vec<Statement>) -> Statement {
    Statement::Conditional(not(ident(&ctx.geometry.reset())), stmts, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BusRole;
    use crate::mem_map::{Access, BitSpan, MemoryKind, RegisterKind};

    fn slave() -> SlaveSynthesizer {
        SlaveSynthesizer::new(BusGeometry::new(BusRole::Slave, 8).unwrap(), SynthConfig::default())
    }

    /// A small but complete space: two word registers, an unsigned bit field,
    /// a write notification, and a RAM block.
    fn populated() -> SlaveSynthesizer {
        let mut slave = slave();
        slave
            .add_register(
                RegisterItem::full("ctrl", 0x0, Access::ReadWrite, RegisterKind::StdLogic, 32, 0x11).unwrap(),
            )
            .unwrap();
        slave
            .add_register(RegisterItem::full("status", 0x4, Access::Read, RegisterKind::StdLogic, 32, 0).unwrap())
            .unwrap();
        slave
            .add_register(
                RegisterItem::new(
                    "mode",
                    0x8,
                    Access::ReadWrite,
                    RegisterKind::Unsigned,
                    32,
                    BitSpan::new(4, 11),
                    0,
                )
                .unwrap(),
            )
            .unwrap();
        slave
            .add_notification(
                NotificationItem::new("irq", 0xc, Access::Write, 32, BitSpan::new(0, 0)).unwrap(),
            )
            .unwrap();
        slave
            .add_memory(MemoryItem::new("dpram", 0x40, 0x40, Access::ReadWrite, MemoryKind::Ram).unwrap())
            .unwrap();
        slave
    }

    #[test]
    fn conflicts_are_batched_before_emission() {
        let mut slave = slave();
        slave
            .add_register(RegisterItem::full("ctrl", 0x10, Access::ReadWrite, RegisterKind::StdLogic, 32, 0).unwrap())
            .unwrap();
        slave.add_memory(MemoryItem::new("ram", 0x0, 0x20, Access::ReadWrite, MemoryKind::Ram).unwrap()).unwrap();
        slave
            .add_register(
                RegisterItem::new("a", 0x40, Access::ReadWrite, RegisterKind::StdLogic, 32, BitSpan::new(0, 7), 0)
                    .unwrap(),
            )
            .unwrap();
        slave
            .add_register(
                RegisterItem::new("b", 0x40, Access::ReadWrite, RegisterKind::StdLogic, 32, BitSpan::new(4, 11), 0)
                    .unwrap(),
            )
            .unwrap();

        let conflicts = slave.check_conflicts();
        assert_eq!(conflicts.len(), 4, "byte and bit conflicts, each per access kind: {:?}", conflicts);

        match slave.synthesize("bad_slave") {
            Err(SynthError::Conflicts(reported)) => {
                assert_eq!(reported.len(), 4, "generation aborts with the full list")
            }
            other => panic!("expected a conflict abort, got {:?}", other),
        }
    }

    #[test]
    fn word_width_must_match_the_geometry() {
        let mut slave = slave();
        let wide = RegisterItem::full("wide", 0, Access::Read, RegisterKind::StdLogic, 64, 0).unwrap();
        assert!(
            matches!(slave.add_register(wide), Err(MapError::BadRegisterWidth { .. })),
            "a 64-bit item cannot enter a 32-bit Lite space"
        );
    }

    #[test]
    fn address_space_must_fit_the_bus() {
        let mut slave = slave();
        slave
            .add_register(
                RegisterItem::full("far", 0x1_0000_0000, Access::Read, RegisterKind::StdLogic, 32, 0).unwrap(),
            )
            .unwrap();
        assert!(matches!(slave.synthesize("far_slave"), Err(SynthError::AddrWidthExceeded { .. })));
    }

    #[test]
    fn read_path_carries_the_response_policy() {
        let text = populated().synthesize("reg_slave").unwrap().to_string();

        // Misaligned reads error out; unclaimed reads return the default.
        assert!(text.contains("if (rd_misaligned) begin"), "misaligned branch exists");
        assert!(text.contains("rresp_next = RESP_SLVERR;"), "misaligned reads answer SLVERR");
        assert!(text.contains("if (!rd_addr_hit) begin"), "unclaimed branch exists");
        assert!(text.contains("rdata_next = DEFAULT_RDATA;"), "unclaimed reads answer the default value");

        // One wait state per readable memory, gated by the latency counter.
        assert!(text.contains("localparam RD_MEM_DPRAM = 1;"), "the RAM owns read state 1");
        assert!(text.contains("if (rd_latency_reg == C_MEM_LATENCY) begin"), "latency gate exists");
        assert!(text.contains("rdata_next = dpram_dout;"), "memory data comes from the block output");

        // Register pass-through data assembly.
        assert!(text.contains("case (rd_addr_reg)"), "data mux switches on the latched address");
        assert!(text.contains("rdata_next = status_reg;"), "full words drive the whole data word");
        assert!(text.contains("rdata_next[4 +: 8] = mode_reg;"), "fields drive only their span");

        // Handshake scaffolding.
        assert!(text.contains("assign S_AXI_ARREADY = rd_state_reg == RD_IDLE;"));
        assert!(text.contains("if (S_AXI_RREADY) begin"), "the response state waits for the requester");
    }

    #[test]
    fn write_path_flags_unclaimed_addresses() {
        let text = populated().synthesize("reg_slave").unwrap().to_string();

        assert!(text.contains("assign wr_addr_hit ="), "write claim decode exists");
        assert!(text.contains("bresp_next = RESP_SLVERR;"), "unclaimed or misaligned writes answer SLVERR");
        assert!(text.contains("localparam WR_WAIT_ADDR = 1;"), "data-first ordering has its state");
        assert!(text.contains("localparam WR_WAIT_DATA = 2;"), "address-first ordering has its state");
        assert!(
            text.contains("if (bresp_reg == RESP_OKAY) begin"),
            "a flagged address never commits its late data"
        );
        assert!(text.contains("dpram_wr_pulse <= 1'b1;"), "memory writes fire the block's pulse");
        assert!(text.contains("reg_wr_pulse <= 1'b1;"), "register writes fire the shared pulse");
    }

    #[test]
    fn register_writes_are_strobe_qualified() {
        let text = populated().synthesize("reg_slave").unwrap().to_string();

        assert!(text.contains("if (reg_wr_pulse) begin"), "commits happen on the shared pulse");
        assert!(text.contains("if (wr_strb_reg[0]) begin"), "lane 0 strobe gate");
        assert!(text.contains("if (wr_strb_reg[3]) begin"), "lane 3 strobe gate");
        assert!(text.contains("ctrl_reg[8 +: 8] <= wr_data_reg[8 +: 8];"), "full words update lane by lane");
        assert!(
            text.contains("mode_reg[0 +: 4] <= $unsigned(wr_data_reg[4 +: 4]);"),
            "unsigned fields are written through a cast"
        );
        assert!(text.contains("irq_wr_pulse <= 1'b1;"), "notifications fire instead of storing");
    }

    #[test]
    fn reset_returns_every_channel_to_idle() {
        let text = populated().synthesize("reg_slave").unwrap().to_string();

        assert!(text.contains("if (!S_AXI_ARESETN) begin"), "reset is sampled synchronously");
        assert!(text.contains("rd_state_reg <= RD_IDLE;"));
        assert!(text.contains("wr_state_reg <= WR_IDLE;"));
        assert!(text.contains("dpram_rd_pulse <= 1'b0;"), "memory pulses clear on reset");
    }
}
