// SleepCam - Persistent Cycle Store
//
// The cross-cycle record lives in a small region that survives deep sleep but
// not a power-off. Layout:
//
//   offset 0  magic "SC"
//   offset 2  payload length (u16 LE)
//   offset 4  CRC-32/ISO-HDLC of the payload (u32 LE)
//   offset 8  payload: {"bootNum":<u32>,"previousAverageColor":<f64>}
//
// Anything that fails to verify is reported as corrupt and loads as "no
// record", so a torn write or stray bytes fall back to first-run behaviour
// instead of stopping the sampling loop.

use crc::{Crc, CRC_32_ISO_HDLC};
use serde::{Deserialize, Serialize};

use crate::drivers::PersistentRegion;
use crate::error::{Error, Result};
use crate::mean::Brightness;

const MAGIC: [u8; 2] = *b"SC";
pub const HEADER_LEN: usize = 8;
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

// ---------------------------------------------------------------------------
// Cycle record
// ---------------------------------------------------------------------------

/// The only state that survives from one wake cycle to the next.
///
/// Both fields are optional on the way in so that a record written by an
/// older firmware (or by hand) still loads; the controller always writes
/// both.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CycleRecord {
    #[serde(rename = "bootNum", default, skip_serializing_if = "Option::is_none")]
    pub boot_num: Option<u32>,
    #[serde(
        rename = "previousAverageColor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub previous_average_color: Option<Brightness>,
}

impl CycleRecord {
    pub fn new(boot_num: u32, previous_average_color: Brightness) -> Self {
        Self {
            boot_num: Some(boot_num),
            previous_average_color: Some(previous_average_color),
        }
    }

    /// Record to persist after a cycle that measured `current`.
    ///
    /// The boot counter starts at 0 when nothing (or no counter) was loaded.
    pub fn successor(loaded: Option<&CycleRecord>, current: Brightness) -> Self {
        let boot_num = loaded
            .and_then(|r| r.boot_num)
            .map_or(0, |n| n.saturating_add(1));
        Self::new(boot_num, current)
    }

    /// The previous reading, or `current` itself when none was stored.
    pub fn previous_or(&self, current: Brightness) -> Brightness {
        self.previous_average_color.unwrap_or(current)
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

pub fn encode(record: &CycleRecord) -> Result<Vec<u8>> {
    let payload =
        serde_json::to_vec(record).map_err(|e| Error::PersistenceWrite(e.to_string()))?;
    frame(&payload)
}

fn frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u16::try_from(payload.len()).map_err(|_| {
        Error::PersistenceWrite(format!("payload of {} bytes is too large", payload.len()))
    })?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&CRC32.checksum(payload).to_le_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Decode a region image. Trailing bytes past the framed payload are ignored.
pub fn decode(raw: &[u8]) -> Result<CycleRecord> {
    if raw.len() < HEADER_LEN {
        return Err(Error::PersistenceDecode(format!(
            "{} bytes is shorter than the {HEADER_LEN}-byte header",
            raw.len()
        )));
    }
    if raw[..2] != MAGIC {
        return Err(Error::PersistenceDecode("bad magic".into()));
    }

    let len = u16::from_le_bytes([raw[2], raw[3]]) as usize;
    let expected_crc = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
    let payload = raw.get(HEADER_LEN..HEADER_LEN + len).ok_or_else(|| {
        Error::PersistenceDecode(format!(
            "header claims {len} payload bytes, only {} present",
            raw.len() - HEADER_LEN
        ))
    })?;
    if CRC32.checksum(payload) != expected_crc {
        return Err(Error::PersistenceDecode("payload checksum mismatch".into()));
    }

    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(|e| Error::PersistenceDecode(e.to_string()))?;
    if !value.is_object() {
        return Err(Error::PersistenceDecode("payload is not a mapping".into()));
    }
    CycleRecord::deserialize(value).map_err(|e| Error::PersistenceDecode(e.to_string()))
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Outcome of reading the region, kept apart for diagnostics only. `Empty`
/// and `Corrupt` lead to the same fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loaded(CycleRecord),
    Empty,
    Corrupt(Error),
}

impl LoadStatus {
    pub fn record(self) -> Option<CycleRecord> {
        match self {
            Self::Loaded(record) => Some(record),
            Self::Empty | Self::Corrupt(_) => None,
        }
    }
}

pub struct CycleStore<R> {
    region: R,
}

impl<R: PersistentRegion> CycleStore<R> {
    pub fn new(region: R) -> Self {
        Self { region }
    }

    pub fn region(&self) -> &R {
        &self.region
    }

    pub fn into_region(self) -> R {
        self.region
    }

    pub fn load_with_status(&self) -> LoadStatus {
        match self.region.read_raw() {
            None => LoadStatus::Empty,
            Some(raw) if raw.is_empty() => LoadStatus::Empty,
            Some(raw) => match decode(&raw) {
                Ok(record) => LoadStatus::Loaded(record),
                Err(e) => LoadStatus::Corrupt(e),
            },
        }
    }

    /// Never fails: an absent or unreadable record is simply `None`.
    pub fn load(&self) -> Option<CycleRecord> {
        match self.load_with_status() {
            LoadStatus::Loaded(record) => {
                log::info!("Loaded cycle record {:?}", record);
                Some(record)
            }
            LoadStatus::Empty => {
                log::info!("No persisted cycle record (first run)");
                None
            }
            LoadStatus::Corrupt(e) => {
                log::warn!("Discarding persisted cycle record: {}", e);
                None
            }
        }
    }

    /// Overwrite the region with `record`. Not retried on failure.
    pub fn store(&mut self, record: &CycleRecord) -> Result<()> {
        let bytes = encode(record)?;
        let capacity = self.region.capacity();
        if bytes.len() > capacity {
            return Err(Error::PersistenceWrite(format!(
                "{} byte record exceeds {capacity} byte region",
                bytes.len()
            )));
        }
        self.region.write_raw(&bytes)
    }
}
