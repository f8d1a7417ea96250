mod adc;
mod dma;

use std::path::Path;

use axigen::{Package, PackageError};

fn main() -> Result<(), PackageError> {
    let mut package = Package::default();
    package.add(dma::dma_csr());
    package.add(adc::adc_csr());
    package.gen_vir(Path::new("./build"))
}
