//! Headless converter for amimus.
//!
//! Provides a single API for loading a module, exporting it to a sequence
//! and writing a Standard MIDI File, used by the command-line front end.

mod export;
mod instrument_map;
mod smf;

use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;

// Re-export common types so callers don't need the lower crates directly.
pub use am_engine::{Sequence, Track};
pub use am_formats::{FormatError, HippelCosoModule, Module, SonicArrangerModule};

pub use export::{
    export_hippel_coso, export_sonic_arranger, ExportError, ExportOptions, InstrumentTracking,
    DIVISION, HIPPEL_COSO_TEMPO_SCALE, NOTE_TICKS, SONIC_ARRANGER_TEMPO_SCALE, TRACKS, VELOCITY,
};
pub use instrument_map::{InstrumentMap, Mapping};
pub use smf::{encode_track, sequence_to_smf, write_smf, write_vlq, SmfLayout};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("no module loaded")]
    NoModule,
    #[error("failed to decode module: {0}")]
    Format(#[from] FormatError),
    #[error("failed to export module: {0}")]
    Export(#[from] ExportError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Export any decoded module.
pub fn export_module(
    module: &Module,
    map: &InstrumentMap,
    options: &ExportOptions,
) -> Result<Sequence, ExportError> {
    match module {
        Module::SonicArranger(sa) => export_sonic_arranger(sa, map, options),
        Module::HippelCoso(coso) => export_hippel_coso(coso, options),
    }
}

/// Owns a decoded module and the settings used to convert it.
pub struct Converter {
    module: Option<Module>,
    instruments: InstrumentMap,
    options: ExportOptions,
}

impl Converter {
    pub fn new(instruments: InstrumentMap, options: ExportOptions) -> Self {
        Self {
            module: None,
            instruments,
            options,
        }
    }

    // --- Module management ---

    pub fn module(&self) -> Option<&Module> {
        self.module.as_ref()
    }

    pub fn load(&mut self, data: &[u8], samples: Option<&[u8]>) -> Result<&Module, ConvertError> {
        let module = am_formats::load_module_bytes(data, samples)?;
        Ok(self.module.insert(module))
    }

    pub fn load_file(
        &mut self,
        path: &Path,
        samples: Option<&Path>,
    ) -> Result<&Module, ConvertError> {
        let data = std::fs::read(path)?;
        let samples = samples.map(std::fs::read).transpose()?;
        self.load(&data, samples.as_deref())
    }

    // --- Settings ---

    pub fn instruments(&self) -> &InstrumentMap {
        &self.instruments
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ExportOptions) {
        self.options = options;
    }

    // --- Conversion ---

    pub fn export(&self) -> Result<Sequence, ConvertError> {
        let module = self.module.as_ref().ok_or(ConvertError::NoModule)?;
        Ok(export_module(module, &self.instruments, &self.options)?)
    }

    /// Export and write in one step.
    pub fn write_midi(&self, w: &mut impl Write, layout: SmfLayout) -> Result<(), ConvertError> {
        let mut sequence = self.export()?;
        write_smf(w, &mut sequence, layout)?;
        Ok(())
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(InstrumentMap::new(), ExportOptions::default())
    }
}
