//! Optional per-generation population stats.
//!
//! One JSON object per line, aggregate counts only; the grid itself is
//! never persisted between generations. The sink is fed by the last
//! worker at the end of each generation.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::errors::Result;

/// One JSON line in the stats file.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRecord {
    pub generation: u32,
    pub rabbits: u32,
    pub foxes: u32,
    pub total: u32,
    pub timestamp: String,
}

/// JSON-lines sink for generation records.
pub struct StatsWriter {
    out: Box<dyn Write + Send>,
}

impl StatsWriter {
    /// Create (or truncate) a stats file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    /// Wrap an arbitrary writer; used by the tests.
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Box::new(writer),
        }
    }

    /// Append one generation record.
    pub fn record(&mut self, generation: u32, rabbits: u32, foxes: u32) -> Result<()> {
        let record = GenerationRecord {
            generation,
            rabbits,
            foxes,
            total: rabbits + foxes,
            timestamp: Utc::now().to_rfc3339(),
        };
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    /// Flush the sink.
    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_records_are_json_lines() {
        let buffer = SharedBuffer::default();
        let mut writer = StatsWriter::from_writer(buffer.clone());
        writer.record(0, 12, 3).unwrap();
        writer.record(1, 11, 4).unwrap();
        writer.finish().unwrap();

        let bytes = buffer.0.lock().unwrap().clone();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["generation"], 0);
        assert_eq!(first["rabbits"], 12);
        assert_eq!(first["foxes"], 3);
        assert_eq!(first["total"], 15);
        assert!(first["timestamp"].is_string());
    }
}
