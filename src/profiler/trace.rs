//! Binary memory trace format.
//!
//! ```text
//! header:  magic "JWMP" | version u16 | flags u16 | started_at_ms u64
//! sample:  elapsed_ms u64 | current u64 | peak u64 | allocations u64 | deallocations u64
//! ```
//!
//! All integers little-endian. Samples follow the header until EOF; a
//! truncated trailing sample (the profiler was killed mid-write) is dropped.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::profiler::allocator::MemorySnapshot;
use crate::profiler::ProfilerError;

pub const MAGIC: &[u8; 4] = b"JWMP";
pub const VERSION: u16 = 1;
const FLAG_LEAKS: u16 = 0b1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceHeader {
    pub version: u16,
    pub leaks: bool,
    pub started_at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceSample {
    pub elapsed_ms: u64,
    pub current_bytes: u64,
    pub peak_bytes: u64,
    pub allocations: u64,
    pub deallocations: u64,
}

impl TraceSample {
    pub fn from_snapshot(elapsed_ms: u64, snapshot: MemorySnapshot) -> Self {
        Self {
            elapsed_ms,
            current_bytes: snapshot.current_bytes,
            peak_bytes: snapshot.peak_bytes,
            allocations: snapshot.allocations,
            deallocations: snapshot.deallocations,
        }
    }
}

/// A decoded trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub header: TraceHeader,
    pub samples: Vec<TraceSample>,
}

impl Trace {
    pub fn peak_bytes(&self) -> u64 {
        self.samples.iter().map(|s| s.peak_bytes).max().unwrap_or(0)
    }

    pub fn duration_ms(&self) -> u64 {
        self.samples.last().map(|s| s.elapsed_ms).unwrap_or(0)
    }

    /// Bytes still held at the last sample compared with the first.
    pub fn retained_bytes(&self) -> i64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.current_bytes as i64 - first.current_bytes as i64,
            _ => 0,
        }
    }
}

/// Streams samples to a sink, flushing after each one so the trace can be
/// read while recording.
pub struct TraceWriter<W: Write> {
    inner: W,
}

impl<W: Write> TraceWriter<W> {
    pub fn new(mut inner: W, header: TraceHeader) -> io::Result<Self> {
        inner.write_all(MAGIC)?;
        inner.write_u16::<LittleEndian>(header.version)?;
        inner.write_u16::<LittleEndian>(if header.leaks { FLAG_LEAKS } else { 0 })?;
        inner.write_u64::<LittleEndian>(header.started_at_ms)?;
        inner.flush()?;
        Ok(Self { inner })
    }

    pub fn write_sample(&mut self, sample: &TraceSample) -> io::Result<()> {
        self.inner.write_u64::<LittleEndian>(sample.elapsed_ms)?;
        self.inner.write_u64::<LittleEndian>(sample.current_bytes)?;
        self.inner.write_u64::<LittleEndian>(sample.peak_bytes)?;
        self.inner.write_u64::<LittleEndian>(sample.allocations)?;
        self.inner.write_u64::<LittleEndian>(sample.deallocations)?;
        self.inner.flush()
    }
}

pub fn read_trace<R: Read>(mut reader: R) -> Result<Trace, ProfilerError> {
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|_| ProfilerError::InvalidReport("missing header".into()))?;
    if &magic != MAGIC {
        return Err(ProfilerError::InvalidReport("bad magic bytes".into()));
    }

    let version = reader.read_u16::<LittleEndian>()?;
    if version != VERSION {
        return Err(ProfilerError::InvalidReport(format!(
            "unsupported version {}",
            version
        )));
    }
    let flags = reader.read_u16::<LittleEndian>()?;
    let started_at_ms = reader.read_u64::<LittleEndian>()?;

    let mut samples = Vec::new();
    while let Some(sample) = read_sample(&mut reader)? {
        samples.push(sample);
    }

    Ok(Trace {
        header: TraceHeader {
            version,
            leaks: flags & FLAG_LEAKS != 0,
            started_at_ms,
        },
        samples,
    })
}

fn read_sample<R: Read>(reader: &mut R) -> io::Result<Option<TraceSample>> {
    let mut fields = [0u64; 5];
    for field in fields.iter_mut() {
        match reader.read_u64::<LittleEndian>() {
            Ok(value) => *field = value,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        }
    }
    Ok(Some(TraceSample {
        elapsed_ms: fields[0],
        current_bytes: fields[1],
        peak_bytes: fields[2],
        allocations: fields[3],
        deallocations: fields[4],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(elapsed_ms: u64, current_bytes: u64) -> TraceSample {
        TraceSample {
            elapsed_ms,
            current_bytes,
            peak_bytes: current_bytes,
            allocations: elapsed_ms,
            deallocations: 0,
        }
    }

    #[test]
    fn written_trace_reads_back() {
        let header = TraceHeader {
            version: VERSION,
            leaks: true,
            started_at_ms: 1_700_000_000_000,
        };
        let mut writer = TraceWriter::new(Vec::new(), header).unwrap();
        writer.write_sample(&sample(0, 100)).unwrap();
        writer.write_sample(&sample(100, 4096)).unwrap();

        let trace = read_trace(writer.inner.as_slice()).unwrap();
        assert_eq!(trace.header, header);
        assert_eq!(trace.samples.len(), 2);
        assert_eq!(trace.peak_bytes(), 4096);
        assert_eq!(trace.duration_ms(), 100);
        assert_eq!(trace.retained_bytes(), 3996);
    }

    #[test]
    fn truncated_sample_is_dropped() {
        let header = TraceHeader {
            version: VERSION,
            leaks: false,
            started_at_ms: 0,
        };
        let mut writer = TraceWriter::new(Vec::new(), header).unwrap();
        writer.write_sample(&sample(0, 1)).unwrap();
        let mut bytes = writer.inner;
        bytes.extend_from_slice(&[1, 2, 3]);

        let trace = read_trace(bytes.as_slice()).unwrap();
        assert_eq!(trace.samples.len(), 1);
    }

    #[test]
    fn garbage_is_rejected() {
        let err = read_trace(&b"nope, not a trace"[..]).unwrap_err();
        assert!(matches!(err, ProfilerError::InvalidReport(_)));
    }
}
