//! Control/status space of a small DMA engine.

use axigen::mem_map::{Access, BitSpan, MemoryItem, MemoryKind, NotificationItem, RegisterItem, RegisterKind};
use axigen::{vir, BusGeometry, BusRole, SlaveSynthesizer, SynthConfig};

pub fn dma_csr() -> vir::Module {
    let geometry = BusGeometry::new(BusRole::Slave, 8).unwrap().with_shared_clock();
    let config = SynthConfig::default().mem_latency(2);
    let mut slave = SlaveSynthesizer::new(geometry, config);

    slave
        .add_register(
            RegisterItem::full("src_addr", 0x00, Access::ReadWrite, RegisterKind::Unsigned, 32, 0)
                .unwrap()
                .with_description("transfer source byte address"),
        )
        .unwrap();
    slave
        .add_register(
            RegisterItem::full("dst_addr", 0x04, Access::ReadWrite, RegisterKind::Unsigned, 32, 0)
                .unwrap()
                .with_description("transfer destination byte address"),
        )
        .unwrap();
    slave
        .add_register(
            RegisterItem::new("burst_len", 0x08, Access::ReadWrite, RegisterKind::Unsigned, 32, BitSpan::new(0, 7), 1)
                .unwrap()
                .with_description("beats per burst"),
        )
        .unwrap();
    slave
        .add_register(
            RegisterItem::new("busy", 0x0c, Access::Read, RegisterKind::StdLogic, 32, BitSpan::new(0, 0), 0)
                .unwrap()
                .with_description("transfer in flight"),
        )
        .unwrap();
    slave
        .add_notification(NotificationItem::new("start", 0x10, Access::Write, 32, BitSpan::new(0, 0)).unwrap())
        .unwrap();
    slave
        .add_memory(MemoryItem::new("descr", 0x40, 0x40, Access::ReadWrite, MemoryKind::Ram).unwrap())
        .unwrap();

    slave.synthesize("dma_csr").unwrap()
}
