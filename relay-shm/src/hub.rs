//! Name-indexed region registry
//!
//! Regions are either *bound* (attached to a pre-existing block, the read
//! path) or *created* (newly allocated, the written path). The hub keeps
//! the name-to-block mapping for the process-local implementation.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::RegionError;
use crate::region::{Region, SharedRegion};

#[derive(Default)]
pub struct RegionHub {
    regions: Mutex<HashMap<String, SharedRegion>>,
}

impl RegionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach to a region that must already exist.
    pub fn attach(&self, name: &str) -> Result<SharedRegion, RegionError> {
        let regions = self.regions.lock();
        let region = regions
            .get(name)
            .cloned()
            .ok_or_else(|| RegionError::Attach(name.to_string()))?;
        log::info!("attached to region '{name}' ({} bytes)", region.len());
        Ok(region)
    }

    /// Allocate a new region of exactly `len` bytes under `name`.
    pub fn create(&self, name: &str, len: usize) -> Result<SharedRegion, RegionError> {
        let mut regions = self.regions.lock();
        if regions.contains_key(name) {
            return Err(RegionError::Alloc(name.to_string()));
        }
        let region = SharedRegion::new(name, len);
        regions.insert(name.to_string(), region.clone());
        log::info!("created region '{name}' ({len} bytes)");
        Ok(region)
    }

    /// Drop a region from the registry; existing handles stay valid.
    pub fn release(&self, name: &str) {
        if self.regions.lock().remove(name).is_some() {
            log::info!("released region '{name}'");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.regions.lock().contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_to_missing_region_fails() {
        let hub = RegionHub::new();
        assert_eq!(
            hub.attach("video0.i420"),
            Err(RegionError::Attach("video0.i420".to_string()))
        );
    }

    #[test]
    fn test_create_then_attach() {
        let hub = RegionHub::new();
        hub.create("video0.i420", 640 * 480 * 3 / 2).unwrap();
        let region = hub.attach("video0.i420").unwrap();
        assert_eq!(region.len(), 640 * 480 * 3 / 2);
    }

    #[test]
    fn test_duplicate_create_fails() {
        let hub = RegionHub::new();
        hub.create("out", 64).unwrap();
        assert_eq!(hub.create("out", 64), Err(RegionError::Alloc("out".to_string())));
    }

    #[test]
    fn test_release_frees_name() {
        let hub = RegionHub::new();
        hub.create("out", 64).unwrap();
        hub.release("out");
        assert!(!hub.contains("out"));
        assert!(hub.create("out", 64).is_ok());
    }

    #[test]
    fn test_handles_share_storage() {
        let hub = RegionHub::new();
        let writer = hub.create("shared", 8).unwrap();
        let reader = hub.attach("shared").unwrap();
        writer.with_lock(|data| data.bytes_mut().fill(7));
        reader.with_lock(|data| assert!(data.bytes().iter().all(|&b| b == 7)));
    }
}
