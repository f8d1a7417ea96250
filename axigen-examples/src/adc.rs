//! Register space of an ADC front-end with a calibration ROM.

use axigen::mem_map::{Access, BitSpan, MemoryItem, MemoryKind, NotificationItem, RegisterItem, RegisterKind};
use axigen::{vir, BusGeometry, BusRole, SlaveSynthesizer, SynthConfig};

pub fn adc_csr() -> vir::Module {
    let geometry = BusGeometry::new(BusRole::Slave, 10).unwrap();
    let config = SynthConfig::default().default_read_value(0xffff_ffff).mem_latency(3);
    let mut slave = SlaveSynthesizer::new(geometry, config);

    slave
        .add_register(
            RegisterItem::new("gain", 0x00, Access::ReadWrite, RegisterKind::Unsigned, 32, BitSpan::new(0, 11), 0x800)
                .unwrap()
                .with_description("front-end gain, 12-bit fixed point"),
        )
        .unwrap();
    slave
        .add_register(
            RegisterItem::new("enable", 0x00, Access::ReadWrite, RegisterKind::StdLogic, 32, BitSpan::new(31, 31), 0)
                .unwrap()
                .with_description("sampling enable"),
        )
        .unwrap();
    slave
        .add_register(
            RegisterItem::full("sample_count", 0x04, Access::Read, RegisterKind::Unsigned, 32, 0).unwrap(),
        )
        .unwrap();
    slave
        .add_notification(NotificationItem::new("clear", 0x08, Access::ReadWrite, 32, BitSpan::new(0, 0)).unwrap())
        .unwrap();
    slave
        .add_memory(MemoryItem::new("cal", 0x200, 0x100, Access::Read, MemoryKind::Rom).unwrap())
        .unwrap();

    slave.synthesize("adc_csr").unwrap()
}
