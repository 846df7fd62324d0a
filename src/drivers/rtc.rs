// SleepCam - RTC Slow Memory Region
//
// A static buffer linked into `.rtc.data`: ESP-IDF reloads it from flash on a
// cold boot (all zeroes) and leaves it untouched across deep sleep.

use core::ptr::{addr_of, addr_of_mut};
use core::sync::atomic::{compiler_fence, AtomicBool, Ordering};

use crate::config::RTC_REGION_CAPACITY;
use crate::drivers::PersistentRegion;
use crate::error::{Error, Result};

#[link_section = ".rtc.data"]
static mut RTC_REGION: [u8; RTC_REGION_CAPACITY] = [0; RTC_REGION_CAPACITY];

static TAKEN: AtomicBool = AtomicBool::new(false);

// Length of the prefix that marks a written image (the record magic).
const COMMIT_LEN: usize = 2;

pub struct RtcRegion {
    _private: (),
}

impl RtcRegion {
    /// Claim the region. Returns `None` if it was already taken.
    pub fn take() -> Option<Self> {
        if TAKEN.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(Self { _private: () })
    }
}

impl PersistentRegion for RtcRegion {
    fn capacity(&self) -> usize {
        RTC_REGION_CAPACITY
    }

    fn read_raw(&self) -> Option<Vec<u8>> {
        // SAFETY: `TAKEN` guarantees this handle is the only accessor and the
        // firmware is single-threaded while it holds it.
        let region = unsafe { &*addr_of!(RTC_REGION) };
        if region[..COMMIT_LEN].iter().all(|&b| b == 0) {
            return None;
        }
        Some(region.to_vec())
    }

    /// Clear the commit prefix, write the body, then publish the prefix, so a
    /// power loss part-way leaves an image that reads as absent or fails its
    /// checksum instead of mixing old and new fields.
    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > RTC_REGION_CAPACITY || bytes.len() < COMMIT_LEN {
            return Err(Error::PersistenceWrite(format!(
                "{} byte image does not fit the {} byte RTC region",
                bytes.len(),
                RTC_REGION_CAPACITY
            )));
        }

        // SAFETY: see `read_raw`.
        let region = unsafe { &mut *addr_of_mut!(RTC_REGION) };
        region[..COMMIT_LEN].fill(0);
        compiler_fence(Ordering::SeqCst);
        region[COMMIT_LEN..bytes.len()].copy_from_slice(&bytes[COMMIT_LEN..]);
        region[bytes.len()..].fill(0);
        compiler_fence(Ordering::SeqCst);
        region[..COMMIT_LEN].copy_from_slice(&bytes[..COMMIT_LEN]);
        Ok(())
    }
}
