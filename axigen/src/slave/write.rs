//! Write channel: state machine, response/next logic, readiness, and the
//! strobe-qualified register write process.

use itertools::Itertools;

use super::*;
use crate::mem_map::RegisterKind;

fn write_notifications<'a>(ctx: &Ctx<'a>) -> Vec<&'a NotificationItem> {
    ctx.registers
        .items_for(AccessKind::Write)
        .into_iter()
        .filter_map(|item| match item {
            MapItem::Notification(notification) => Some(notification),
            _ => None,
        })
        .collect()
}

/// Emits the whole write side of the slave.
pub(super) fn write_channel(ctx: &Ctx<'_>) -> ModuleItem {
    ModuleItem::Commented(
        "Write channel".to_string(),
        Some("End write channel".to_string()),
        vec![ready_outputs(ctx), fsm(ctx), response(ctx)],
    )
}

/// Write-ready and registered write response outputs.
///
/// Address and data are each accepted while their latch is still empty, so
/// the two channels may arrive in either order.
fn ready_outputs(ctx: &Ctx<'_>) -> ModuleItem {
    let geom = ctx.geometry;
    ModuleItem::ContinuousAssigns(vec![
        vir::ContinuousAssign::new(
            ident(&geom.port("AWREADY")),
            or(eq(ident(WR_STATE), num("WR_IDLE")), eq(ident(WR_STATE), num("WR_WAIT_ADDR"))),
        ),
        vir::ContinuousAssign::new(
            ident(&geom.port("WREADY")),
            or(eq(ident(WR_STATE), num("WR_IDLE")), eq(ident(WR_STATE), num("WR_WAIT_DATA"))),
        ),
        vir::ContinuousAssign::new(ident(&geom.port("BVALID")), ident(BVALID)),
        vir::ContinuousAssign::new(ident(&geom.port("BRESP")), ident(BRESP)),
    ])
}

/// Pulse dispatch for a committing write at `addr`: the matching memory
/// block's write pulse, or the shared register write pulse when the address
/// falls in a register-claimed range.
fn dispatch(ctx: &Ctx<'_>, addr: &str) -> Vec<Statement> {
    let mut stmts = Vec::new();
    for memory in &ctx.write_mems {
        stmts.push(Statement::Conditional(
            addr_in_range(addr, (memory.core.offset, memory.core.length), ctx.addr_width),
            vec![nb(&memory.write_pulse, num("1'b1"))],
            Vec::new(),
        ));
    }
    if !ctx.reg_write_ranges.is_empty() {
        stmts.push(Statement::Conditional(
            addr_in_any_range(addr, &ctx.reg_write_ranges, ctx.addr_width),
            vec![nb(REG_WR_PULSE, num("1'b1"))],
            Vec::new(),
        ));
    }
    stmts
}

fn latch_data(ctx: &Ctx<'_>) -> Vec<Statement> {
    let geom = ctx.geometry;
    vec![nb(WR_DATA, ident(&geom.port("WDATA"))), nb(WR_STRB, ident(&geom.port("WSTRB")))]
}

/// Write state machine over the split address/data handshake.
fn fsm(ctx: &Ctx<'_>) -> ModuleItem {
    let geom = ctx.geometry;
    let awaddr = geom.port("AWADDR");
    let awvalid = geom.port("AWVALID");
    let wvalid = geom.port("WVALID");

    let mut stmts = vec![nb(REG_WR_PULSE, num("1'b0"))];
    for memory in &ctx.write_mems {
        stmts.push(nb(&memory.write_pulse, num("1'b0")));
    }
    stmts.push(nb(BRESP, ident(BRESP_NEXT)));
    stmts.push(nb(BVALID, ident(BVALID_NEXT)));

    let both = {
        let mut commit = dispatch(ctx, &awaddr);
        commit.push(nb(WR_STATE, num("WR_RESP")));
        let mut body = vec![nb(WR_ADDR, ident(&awaddr))];
        body.extend(latch_data(ctx));
        body.push(Statement::Conditional(
            or(ident(WR_MISALIGNED), not(ident(WR_HIT))),
            vec![nb(WR_STATE, num("WR_RESP"))],
            commit,
        ));
        body
    };

    let addr_only = vec![nb(WR_ADDR, ident(&awaddr)), nb(WR_STATE, num("WR_WAIT_DATA"))];
    let data_only = {
        let mut body = latch_data(ctx);
        body.push(nb(WR_STATE, num("WR_WAIT_ADDR")));
        body
    };

    let idle = vec![Statement::Conditional(
        and(ident(&awvalid), ident(&wvalid)),
        both,
        vec![Statement::Conditional(
            ident(&awvalid),
            addr_only,
            vec![Statement::Conditional(ident(&wvalid), data_only, Vec::new())],
        )],
    )];

    // Data already latched; the late address goes through the same checks.
    let wait_addr = {
        let mut commit = dispatch(ctx, &awaddr);
        commit.push(nb(WR_STATE, num("WR_RESP")));
        vec![Statement::Conditional(
            ident(&awvalid),
            vec![
                nb(WR_ADDR, ident(&awaddr)),
                Statement::Conditional(
                    or(ident(WR_MISALIGNED), not(ident(WR_HIT))),
                    vec![nb(WR_STATE, num("WR_RESP"))],
                    commit,
                ),
            ],
            Vec::new(),
        )]
    };

    // Address already latched; commit only if its pending response is OKAY.
    let wait_data = {
        let mut body = latch_data(ctx);
        body.push(Statement::Conditional(
            eq(ident(BRESP), num("RESP_OKAY")),
            dispatch(ctx, WR_ADDR),
            Vec::new(),
        ));
        body.push(nb(WR_STATE, num("WR_RESP")));
        vec![Statement::Conditional(ident(&wvalid), body, Vec::new())]
    };

    let wait_resp = vec![Statement::Conditional(
        ident(&geom.port("BREADY")),
        vec![nb(WR_STATE, num("WR_IDLE"))],
        Vec::new(),
    )];

    stmts.push(Statement::Case(
        ident(WR_STATE),
        vec![
            (num("WR_IDLE"), idle),
            (num("WR_WAIT_ADDR"), wait_addr),
            (num("WR_WAIT_DATA"), wait_data),
            (num("WR_RESP"), wait_resp),
        ],
        vec![nb(WR_STATE, num("WR_IDLE"))],
    ));

    let mut reset = vec![
        nb(WR_STATE, num("WR_IDLE")),
        nb(WR_ADDR, num(zero_lit(ctx.addr_width))),
        nb(WR_DATA, num(zero_lit(ctx.data_width()))),
        nb(WR_STRB, num(zero_lit(ctx.strb_width()))),
        nb(BRESP, num("RESP_OKAY")),
        nb(BVALID, num("1'b0")),
        nb(REG_WR_PULSE, num("1'b0")),
    ];
    for memory in &ctx.write_mems {
        reset.push(nb(&memory.write_pulse, num("1'b0")));
    }
    stmts.push(reset_guard(ctx, reset));

    ModuleItem::AlwaysConstruct(clocked(ctx), stmts)
}

/// Combinational write response shadow.
///
/// Misaligned or unclaimed writes answer SLVERR, unlike reads; valid rises
/// once both channels have been seen, in whichever order they came.
fn response(ctx: &Ctx<'_>) -> ModuleItem {
    let geom = ctx.geometry;
    let awvalid = geom.port("AWVALID");
    let wvalid = geom.port("WVALID");

    let grade = Statement::Conditional(
        or(ident(WR_MISALIGNED), not(ident(WR_HIT))),
        vec![blk(BRESP_NEXT, num("RESP_SLVERR"))],
        vec![blk(BRESP_NEXT, num("RESP_OKAY"))],
    );

    let idle = vec![
        Statement::Conditional(ident(&awvalid), vec![grade.clone()], Vec::new()),
        Statement::Conditional(
            and(ident(&awvalid), ident(&wvalid)),
            vec![blk(BVALID_NEXT, num("1'b1"))],
            Vec::new(),
        ),
    ];

    let wait_addr = vec![Statement::Conditional(
        ident(&awvalid),
        vec![grade, blk(BVALID_NEXT, num("1'b1"))],
        Vec::new(),
    )];

    let wait_data = vec![Statement::Conditional(
        ident(&wvalid),
        vec![blk(BVALID_NEXT, num("1'b1"))],
        Vec::new(),
    )];

    let wait_resp = vec![Statement::Conditional(
        ident(&geom.port("BREADY")),
        vec![blk(BVALID_NEXT, num("1'b0"))],
        Vec::new(),
    )];

    let stmts = vec![
        blk(BRESP_NEXT, ident(BRESP)),
        blk(BVALID_NEXT, ident(BVALID)),
        Statement::Case(
            ident(WR_STATE),
            vec![
                (num("WR_IDLE"), idle),
                (num("WR_WAIT_ADDR"), wait_addr),
                (num("WR_WAIT_DATA"), wait_data),
                (num("WR_RESP"), wait_resp),
            ],
            Vec::new(),
        ),
    ];

    ModuleItem::AlwaysConstruct("always @*".to_string(), stmts)
}

/// Strobe-qualified register write process.
///
/// For every claimed word offset, each asserted strobe lane copies the lane's
/// share of the latched data word into every field mapped onto that lane and
/// fires the write pulse of every notification watching it. A field packed
/// into a lane is written in full whenever that lane's strobe is set.
pub(super) fn register_write(ctx: &Ctx<'_>) -> ModuleItem {
    let mut stmts = Vec::new();
    for notification in write_notifications(ctx) {
        stmts.push(nb(&notification.write_pulse, num("1'b0")));
    }

    let arms = ctx
        .registers
        .offsets(AccessKind::Write)
        .into_iter()
        .sorted()
        .filter_map(|offset| {
            let mut lanes = Vec::new();
            for lane in 0..ctx.strb_width() {
                let updates = ctx
                    .registers
                    .fields_in_byte_lane(AccessKind::Write, offset, lane)
                    .into_iter()
                    .map(|(item, _, _)| lane_update(ctx, item, lane))
                    .collect::<Vec<_>>();
                if !updates.is_empty() {
                    lanes.push(Statement::Conditional(bit(WR_STRB, lane), updates, Vec::new()));
                }
            }
            if lanes.is_empty() {
                None
            } else {
                Some((num(hex_lit(ctx.addr_width, offset)), lanes))
            }
        })
        .collect::<Vec<_>>();

    let mut body = Vec::new();
    if !arms.is_empty() {
        body.push(Statement::Case(ident(WR_ADDR), arms, Vec::new()));
    }
    stmts.push(Statement::Conditional(ident(REG_WR_PULSE), body, Vec::new()));

    let mut reset = Vec::new();
    for item in ctx.registers.items_for(AccessKind::Write) {
        if let MapItem::Register(register) = item {
            reset.push(nb(
                &register.backing_signal,
                num(hex_lit(register.span.width(), register.default_value)),
            ));
        }
    }
    for notification in write_notifications(ctx) {
        reset.push(nb(&notification.write_pulse, num("1'b0")));
    }
    stmts.push(reset_guard(ctx, reset));

    ModuleItem::Commented(
        "Register write".to_string(),
        Some("End register write".to_string()),
        vec![ModuleItem::AlwaysConstruct(clocked(ctx), stmts)],
    )
}

/// One lane's update of one field: the lane slice of the data word lands in
/// the matching slice of the backing signal; notifications fire instead.
fn lane_update(ctx: &Ctx<'_>, item: &MapItem, lane: usize) -> Statement {
    match item {
        MapItem::Register(register) => {
            let lane_slices = register.span.lane_slices(ctx.strb_width());
            let slice_part =
                lane_slices.iter().find(|part| part.lane == lane).expect("lane mapping vanished between queries");

            let source = slice(WR_DATA, slice_part.start_bit, slice_part.width());
            let source = match register.kind {
                RegisterKind::StdLogic => source,
                RegisterKind::Unsigned => Expression::function_call("$unsigned", vec![source]),
            };

            if slice_part.start_bit == register.span.start() && slice_part.end_bit == register.span.end() {
                nb(&register.backing_signal, source)
            } else {
                Statement::nonblocking_assignment(
                    slice(
                        &register.backing_signal,
                        slice_part.start_bit - register.span.start(),
                        slice_part.width(),
                    ),
                    source,
                )
            }
        }
        MapItem::Notification(notification) => nb(&notification.write_pulse, num("1'b1")),
        MapItem::Memory(_) => panic!("internal error: memory item inside the register map"),
    }
}
