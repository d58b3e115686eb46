//! Instrument name to General MIDI program table.
//!
//! Read from an INI-style file of `name=program` lines. `#` starts a comment
//! line. A negative program disables the instrument.

use std::collections::HashMap;
use std::io;
use std::path::Path;

/// How an instrument name maps to MIDI output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mapping {
    /// Select this General MIDI program
    Program(u8),
    /// Known instrument that should not select any program
    Disabled,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstrumentMap {
    entries: HashMap<String, Mapping>,
}

impl InstrumentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse map text. Malformed lines are logged and skipped.
    pub fn parse(text: &str) -> Self {
        let mut map = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parsed = line
                .split_once('=')
                .map(|(name, value)| (name.trim(), value.trim()))
                .filter(|(name, _)| !name.is_empty())
                .and_then(|(name, value)| Some((name, value.parse::<i64>().ok()?)));
            let Some((name, value)) = parsed else {
                log::warn!("malformed settings line: {line}");
                continue;
            };
            match value {
                v if v < 0 => map.insert(name, Mapping::Disabled),
                v => match u8::try_from(v).ok().filter(|&p| p <= 127) {
                    Some(program) => map.insert(name, Mapping::Program(program)),
                    None => log::warn!("program {v} for {name} is out of range 0..=127"),
                },
            }
        }
        map
    }

    /// Load a map file. A missing file yields an empty map.
    pub fn load(path: &Path) -> io::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no instrument map at {}", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(e),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, mapping: Mapping) {
        self.entries.insert(name.into(), mapping);
    }

    /// Look up an instrument by name, ignoring surrounding whitespace.
    pub fn get(&self, name: &str) -> Option<Mapping> {
        self.entries.get(name.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_programs_and_disabled_entries() {
        let map = InstrumentMap::parse(
            "# drums are handled elsewhere\n\
             \n\
             Bass = 33\n\
             Lead=81\n\
             Snare=-1\n",
        );
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("Bass"), Some(Mapping::Program(33)));
        assert_eq!(map.get("Lead"), Some(Mapping::Program(81)));
        assert_eq!(map.get("Snare"), Some(Mapping::Disabled));
        assert_eq!(map.get("Lead  "), Some(Mapping::Program(81)));
        assert_eq!(map.get("Pad"), None);
    }

    #[test]
    fn skips_malformed_lines() {
        let map = InstrumentMap::parse("Bass\nLead=loud\n=5\nPad=\nStrings=200\nChoir=52");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("Choir"), Some(Mapping::Program(52)));
        assert_eq!(map.get("Strings"), None);
    }

    #[test]
    fn splits_on_first_equals() {
        let map = InstrumentMap::parse("a=b=3\nx=y=\n");
        assert!(map.is_empty());
        let map = InstrumentMap::parse("Key=7 \n");
        assert_eq!(map.get("Key"), Some(Mapping::Program(7)));
    }

    #[test]
    fn missing_file_is_empty() {
        let map = InstrumentMap::load(Path::new("/nonexistent/amimus-test.ini")).unwrap();
        assert!(map.is_empty());
    }
}
