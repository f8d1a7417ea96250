//! Bus geometry: protocol-fixed parameters and naming for one interface instance.

use thiserror::Error;

use crate::utils::clog2;

/// Widest address the generated logic will decode.
pub const MAX_ADDR_WIDTH: usize = 32;

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("address width {0} is outside 1..={MAX_ADDR_WIDTH}")]
    AddrWidth(usize),
}

/// Role of the bus interface, selecting the conventional base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusRole {
    /// Slave interface (`S_AXI`).
    Slave,

    /// Master interface (`M_AXI`).
    Master,

    /// Monitor interface (`MON_AXI`).
    Monitor,
}

impl BusRole {
    fn base_name(self) -> &'static str {
        match self {
            BusRole::Slave => "S_AXI",
            BusRole::Master => "M_AXI",
            BusRole::Monitor => "MON_AXI",
        }
    }
}

/// Derived, immutable geometry of one AXI-Lite interface instance.
///
/// The Lite profile fixes the register width at 32 bits; everything else is
/// derived from it and from the requested minimum address width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusGeometry {
    register_width: usize,
    min_addr_width: usize,
    base_name: String,
    shared_clock: bool,
}

impl BusGeometry {
    /// Creates geometry for the given role with the conventional base name.
    pub fn new(role: BusRole, min_addr_width: usize) -> Result<Self, GeometryError> {
        Self::with_base_name(role.base_name().to_string(), min_addr_width)
    }

    /// Creates geometry with a caller-supplied base name.
    pub fn with_base_name(base_name: String, min_addr_width: usize) -> Result<Self, GeometryError> {
        if min_addr_width == 0 || min_addr_width > MAX_ADDR_WIDTH {
            return Err(GeometryError::AddrWidth(min_addr_width));
        }

        Ok(Self { register_width: 32, min_addr_width, base_name, shared_clock: false })
    }

    /// Marks the clock and reset as shared across buses, dropping the
    /// per-interface prefix from their names.
    #[must_use]
    pub fn with_shared_clock(mut self) -> Self {
        self.shared_clock = true;
        self
    }

    /// Register width in bits.
    pub fn register_width(&self) -> usize { self.register_width }

    /// Register width in bytes.
    pub fn register_byte_width(&self) -> usize { self.register_width / 8 }

    /// Number of low address bits that select a byte inside one register word.
    ///
    /// An aligned access keeps these bits zero: 2 for 32-bit registers, 3 for
    /// 64-bit ones.
    pub fn addr_lsb(&self) -> usize { clog2(self.register_byte_width()) }

    /// Minimum address width requested by the caller.
    pub fn min_addr_width(&self) -> usize { self.min_addr_width }

    /// Base name of the interface, e.g. `S_AXI`.
    pub fn base_name(&self) -> &str { &self.base_name }

    /// Name of the data-width generic constant.
    pub fn data_width_constant(&self) -> String { format!("C_{}_DATA_WIDTH", self.base_name) }

    /// Name of the address-width generic constant.
    pub fn addr_width_constant(&self) -> String { format!("C_{}_ADDR_WIDTH", self.base_name) }

    /// Name of a channel signal on this interface, e.g. `port("ARADDR")`.
    pub fn port(&self, field: &str) -> String { format!("{}_{}", self.base_name, field) }

    /// Clock signal name.
    pub fn clock(&self) -> String {
        if self.shared_clock {
            "ACLK".to_string()
        } else {
            self.port("ACLK")
        }
    }

    /// Reset signal name (active low, sampled synchronously).
    pub fn reset(&self) -> String {
        if self.shared_clock {
            "ARESETN".to_string()
        } else {
            self.port("ARESETN")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_pick_conventional_base_names() {
        let slave = BusGeometry::new(BusRole::Slave, 8).unwrap();
        assert_eq!(slave.base_name(), "S_AXI");
        assert_eq!(slave.port("AWADDR"), "S_AXI_AWADDR");
        assert_eq!(slave.clock(), "S_AXI_ACLK");
        assert_eq!(slave.reset(), "S_AXI_ARESETN");

        let mon = BusGeometry::new(BusRole::Monitor, 8).unwrap();
        assert_eq!(mon.data_width_constant(), "C_MON_AXI_DATA_WIDTH");

        let custom = BusGeometry::with_base_name("CSR_AXI".to_string(), 8).unwrap();
        assert_eq!(custom.addr_width_constant(), "C_CSR_AXI_ADDR_WIDTH");

        let shared = BusGeometry::new(BusRole::Slave, 8).unwrap().with_shared_clock();
        assert_eq!(shared.clock(), "ACLK", "a shared clock drops the bus prefix");
        assert_eq!(shared.reset(), "ARESETN");
        assert_eq!(shared.port("ARADDR"), "S_AXI_ARADDR", "channel signals keep the prefix");
    }

    #[test]
    fn lite_profile_geometry_is_fixed() {
        let geom = BusGeometry::new(BusRole::Slave, 12).unwrap();
        assert_eq!(geom.register_width(), 32);
        assert_eq!(geom.register_byte_width(), 4);
        assert_eq!(geom.addr_lsb(), 2, "two sub-word address bits for a 32-bit bus");
        assert_eq!(geom.min_addr_width(), 12);
    }

    #[test]
    fn address_width_bounds_are_enforced() {
        assert!(BusGeometry::new(BusRole::Slave, 0).is_err(), "zero-width addressing is rejected");
        assert!(BusGeometry::new(BusRole::Slave, 33).is_err(), "wider than the bus is rejected");
        assert!(BusGeometry::new(BusRole::Slave, 32).is_ok());
    }
}
