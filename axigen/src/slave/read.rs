//! Read channel: state machine, response/next logic, readiness.

use itertools::Itertools;

use super::*;
use crate::mem_map::NotificationItem as Notification;

fn read_notifications<'a>(ctx: &Ctx<'a>) -> Vec<&'a Notification> {
    ctx.registers
        .items_for(AccessKind::Read)
        .into_iter()
        .filter_map(|item| match item {
            MapItem::Notification(notification) => Some(notification),
            _ => None,
        })
        .collect()
}

/// Emits the whole read side of the slave.
pub(super) fn read_channel(ctx: &Ctx<'_>) -> ModuleItem {
    ModuleItem::Commented(
        "Read channel".to_string(),
        Some("End read channel".to_string()),
        vec![ready_outputs(ctx), fsm(ctx), response(ctx)],
    )
}

/// Read-ready and registered read outputs.
fn ready_outputs(ctx: &Ctx<'_>) -> ModuleItem {
    let geom = ctx.geometry;
    ModuleItem::ContinuousAssigns(vec![
        vir::ContinuousAssign::new(ident(&geom.port("ARREADY")), eq(ident(RD_STATE), num("RD_IDLE"))),
        vir::ContinuousAssign::new(ident(&geom.port("RVALID")), ident(RVALID)),
        vir::ContinuousAssign::new(ident(&geom.port("RRESP")), ident(RRESP)),
        vir::ContinuousAssign::new(ident(&geom.port("RDATA")), ident(RDATA)),
    ])
}

/// Read state machine.
///
/// `Idle` latches the incoming address and routes it to a memory wait state,
/// the register pass-through state, or straight to the response state for
/// misaligned/unclaimed addresses. Wait states count latency cycles; the
/// response state holds until the requester takes the data.
fn fsm(ctx: &Ctx<'_>) -> ModuleItem {
    let geom = ctx.geometry;
    let araddr = geom.port("ARADDR");

    let mut stmts = Vec::new();
    for memory in &ctx.read_mems {
        stmts.push(nb(&memory.read_pulse, num("1'b0")));
    }
    for notification in read_notifications(ctx) {
        stmts.push(nb(&notification.read_pulse, num("1'b0")));
    }
    stmts.push(nb(RRESP, ident(RRESP_NEXT)));
    stmts.push(nb(RVALID, ident(RVALID_NEXT)));
    stmts.push(nb(RDATA, ident(RDATA_NEXT)));

    // Idle dispatch, built innermost-first: the register path is the final
    // else of the per-memory match chain.
    let mut register_path = read_notifications(ctx)
        .into_iter()
        .map(|notification| {
            Statement::Conditional(
                eq(ident(&araddr), num(hex_lit(ctx.addr_width, notification.core.offset))),
                vec![nb(&notification.read_pulse, num("1'b1"))],
                Vec::new(),
            )
        })
        .collect::<Vec<_>>();
    register_path.push(nb(RD_STATE, num("RD_REG")));

    let mut dispatch = register_path;
    for memory in ctx.read_mems.iter().rev() {
        dispatch = vec![Statement::Conditional(
            addr_in_range(&araddr, (memory.core.offset, memory.core.length), ctx.addr_width),
            vec![
                nb(&memory.read_pulse, num("1'b1")),
                nb(RD_LATENCY, num(zero_lit(ctx.latency_width))),
                nb(RD_STATE, num(memory.wait_state.clone())),
            ],
            dispatch,
        )];
    }

    let idle = vec![Statement::Conditional(
        ident(&geom.port("ARVALID")),
        vec![
            nb(RD_ADDR, ident(&araddr)),
            Statement::Conditional(
                or(ident(RD_MISALIGNED), not(ident(RD_HIT))),
                vec![nb(RD_STATE, num("RD_RESP"))],
                dispatch,
            ),
        ],
        Vec::new(),
    )];

    let mut arms = vec![(num("RD_IDLE"), idle)];
    for memory in &ctx.read_mems {
        arms.push((num(memory.wait_state.clone()), vec![Statement::Conditional(
            eq(ident(RD_LATENCY), num("C_MEM_LATENCY")),
            vec![nb(RD_STATE, num("RD_RESP"))],
            vec![nb(RD_LATENCY, Expression::binary(BinaryOp::Add, ident(RD_LATENCY), num(1)))],
        )]));
    }
    arms.push((num("RD_REG"), vec![nb(RD_STATE, num("RD_RESP"))]));
    arms.push((num("RD_RESP"), vec![Statement::Conditional(
        ident(&geom.port("RREADY")),
        vec![nb(RD_STATE, num("RD_IDLE"))],
        Vec::new(),
    )]));

    stmts.push(Statement::Case(ident(RD_STATE), arms, vec![nb(RD_STATE, num("RD_IDLE"))]));

    let mut reset = vec![
        nb(RD_STATE, num("RD_IDLE")),
        nb(RD_ADDR, num(zero_lit(ctx.addr_width))),
        nb(RD_LATENCY, num(zero_lit(ctx.latency_width))),
        nb(RRESP, num("RESP_OKAY")),
        nb(RVALID, num("1'b0")),
        nb(RDATA, num(zero_lit(ctx.data_width()))),
    ];
    for memory in &ctx.read_mems {
        reset.push(nb(&memory.read_pulse, num("1'b0")));
    }
    for notification in read_notifications(ctx) {
        reset.push(nb(&notification.read_pulse, num("1'b0")));
    }
    stmts.push(reset_guard(ctx, reset));

    ModuleItem::AlwaysConstruct(clocked(ctx), stmts)
}

/// Combinational read response shadow.
///
/// Misaligned reads answer SLVERR with zero data. Aligned reads that claim
/// nothing answer OKAY with the configured default value, not an error.
fn response(ctx: &Ctx<'_>) -> ModuleItem {
    let geom = ctx.geometry;

    let mut stmts = vec![
        blk(RRESP_NEXT, ident(RRESP)),
        blk(RVALID_NEXT, ident(RVALID)),
        blk(RDATA_NEXT, ident(RDATA)),
    ];

    let idle = vec![Statement::Conditional(
        ident(&geom.port("ARVALID")),
        vec![Statement::Conditional(
            ident(RD_MISALIGNED),
            vec![
                blk(RRESP_NEXT, num("RESP_SLVERR")),
                blk(RVALID_NEXT, num("1'b1")),
                blk(RDATA_NEXT, num(zero_lit(ctx.data_width()))),
            ],
            vec![Statement::Conditional(
                not(ident(RD_HIT)),
                vec![
                    blk(RRESP_NEXT, num("RESP_OKAY")),
                    blk(RVALID_NEXT, num("1'b1")),
                    blk(RDATA_NEXT, num("DEFAULT_RDATA")),
                ],
                Vec::new(),
            )],
        )],
        Vec::new(),
    )];

    let mut arms = vec![(num("RD_IDLE"), idle)];
    for memory in &ctx.read_mems {
        arms.push((num(memory.wait_state.clone()), vec![Statement::Conditional(
            eq(ident(RD_LATENCY), num("C_MEM_LATENCY")),
            vec![
                blk(RRESP_NEXT, num("RESP_OKAY")),
                blk(RVALID_NEXT, num("1'b1")),
                blk(RDATA_NEXT, ident(&memory.output_register)),
            ],
            Vec::new(),
        )]));
    }
    arms.push((num("RD_REG"), register_data(ctx)));
    arms.push((num("RD_RESP"), vec![Statement::Conditional(
        ident(&geom.port("RREADY")),
        vec![blk(RVALID_NEXT, num("1'b0"))],
        Vec::new(),
    )]));

    stmts.push(Statement::Case(ident(RD_STATE), arms, Vec::new()));

    ModuleItem::AlwaysConstruct("always @*".to_string(), stmts)
}

/// Data assembly for the register pass-through state: one case arm per
/// claimed word offset, each field driving its own bit span; unclaimed
/// offsets fall to the default value.
fn register_data(ctx: &Ctx<'_>) -> Vec<Statement> {
    let mut stmts = vec![
        blk(RRESP_NEXT, num("RESP_OKAY")),
        blk(RVALID_NEXT, num("1'b1")),
        blk(RDATA_NEXT, num("DEFAULT_RDATA")),
    ];

    let arms = ctx
        .registers
        .offsets(AccessKind::Read)
        .into_iter()
        .sorted()
        .filter_map(|offset| {
            let drives = ctx
                .read_fields_at(offset)
                .into_iter()
                .filter_map(|item| match item {
                    MapItem::Register(register) => Some(register),
                    _ => None,
                })
                .map(|register| {
                    let value = ident(&register.backing_signal);
                    if register.span.width() == ctx.data_width() {
                        blk(RDATA_NEXT, value)
                    } else {
                        Statement::blocking_assignment(
                            slice(RDATA_NEXT, register.span.start(), register.span.width()),
                            value,
                        )
                    }
                })
                .collect::<Vec<_>>();

            if drives.is_empty() {
                None
            } else {
                Some((num(hex_lit(ctx.addr_width, offset)), drives))
            }
        })
        .collect::<Vec<_>>();

    if !arms.is_empty() {
        stmts.push(Statement::Case(ident(RD_ADDR), arms, Vec::new()));
    }
    stmts
}
