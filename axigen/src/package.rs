//! Package of generated modules and its file emission.

use std::fs;
use std::fs::File;
use std::io;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::vir;

#[allow(missing_docs)]
#[allow(variant_size_differences)]
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("file system error: {error:?}")]
    Fs { error: io::Error },

    #[error("synthesis error: {error}")]
    Synth { error: crate::slave::SynthError },
}

impl From<crate::slave::SynthError> for PackageError {
    fn from(error: crate::slave::SynthError) -> Self { PackageError::Synth { error } }
}

/// Package.
#[derive(Debug, Default)]
pub struct Package {
    /// Modules.
    pub modules: Vec<vir::Module>,
}

impl Package {
    /// Adds the given module to package.
    pub fn add(&mut self, module: vir::Module) { self.modules.push(module); }

    /// Generates Verilog code at the given directory path, one file per module.
    pub fn gen_vir<P: AsRef<Path>>(&self, path_dir: P) -> Result<(), PackageError> {
        fs::create_dir_all(path_dir.as_ref()).map_err(|error| PackageError::Fs { error })?;

        for module in &self.modules {
            let path = path_dir.as_ref().join(format!("{}.v", module.name));
            let mut file = File::create(path).map_err(|error| PackageError::Fs { error })?;
            writeln!(file, "{}", module.to_string()).map_err(|error| PackageError::Fs { error })?;
        }

        Ok(())
    }
}
