//! Settings store on NOR flash, through a `sequential-storage` map

use core::ops::Range;

use embassy_embedded_hal::adapter::BlockingAsync;
use embedded_storage::nor_flash::NorFlash;
use embedded_storage_async::nor_flash::NorFlash as AsyncNorFlash;
use input_runtime_types::config::ProcessorConfig;
use sequential_storage::Error as SSError;
use sequential_storage::cache::NoCache;
use sequential_storage::map::{SerializationError, Value, fetch_item, store_item};

use super::{SETTINGS_RECORD_SIZE, SettingsStore, decode_settings, encode_settings, settings_key};
use crate::error::StoreError;

/// Read/write buffer, a record plus the map's item header and key
const FLASH_BUFFER_SIZE: usize = 128;

/// Map key of a processor: FNV-1a of its zero padded name
fn record_key(name: &str) -> Result<u32, StoreError> {
    let key = settings_key(name)?;
    Ok(key
        .iter()
        .fold(0x811c_9dc5_u32, |hash, &b| (hash ^ b as u32).wrapping_mul(0x0100_0193)))
}

/// Record as stored in the map. Records that don't decode read as `None`.
struct SettingsRecord(Option<ProcessorConfig>);

impl Value<'_> for SettingsRecord {
    fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
        let Some(config) = &self.0 else {
            return Err(SerializationError::InvalidFormat);
        };
        if buffer.len() < SETTINGS_RECORD_SIZE {
            return Err(SerializationError::BufferTooSmall);
        }
        encode_settings(config, buffer)
            .map(|bytes| bytes.len())
            .map_err(|_| SerializationError::InvalidFormat)
    }

    fn deserialize_from(buffer: &[u8]) -> Result<Self, SerializationError>
    where
        Self: Sized,
    {
        Ok(SettingsRecord(decode_settings(buffer)))
    }
}

fn print_storage_error<F: AsyncNorFlash>(e: SSError<F::Error>) {
    match e {
        #[cfg(feature = "defmt")]
        SSError::Storage { value: e } => error!("Flash error: {:?}", defmt::Debug2Format(&e)),
        #[cfg(not(feature = "defmt"))]
        SSError::Storage { value: _e } => error!("Flash error"),
        SSError::FullStorage => error!("Storage is full"),
        SSError::Corrupted {} => error!("Storage is corrupted"),
        SSError::BufferTooBig => error!("Buffer too big"),
        SSError::BufferTooSmall(x) => error!("Buffer too small, needs {} bytes", x),
        SSError::SerializationError(e) => error!("Map value error: {:?}", e),
        _ => error!("Unknown storage error"),
    }
}

pub struct FlashSettingsStore<F: AsyncNorFlash> {
    flash: F,
    storage_range: Range<u32>,
    buffer: [u8; FLASH_BUFFER_SIZE],
}

impl<F: NorFlash> FlashSettingsStore<BlockingAsync<F>> {
    /// Store on a blocking flash driver
    pub fn new_blocking(flash: F, storage_range: Range<u32>) -> Self {
        Self::new(BlockingAsync::new(flash), storage_range)
    }
}

impl<F: AsyncNorFlash> FlashSettingsStore<F> {
    /// `storage_range` must span whole erase pages reserved for processor settings
    pub fn new(flash: F, storage_range: Range<u32>) -> Self {
        Self {
            flash,
            storage_range,
            buffer: [0; FLASH_BUFFER_SIZE],
        }
    }
}

impl<F: AsyncNorFlash> SettingsStore for FlashSettingsStore<F> {
    async fn load(&mut self, name: &str) -> Result<Option<ProcessorConfig>, StoreError> {
        let key = record_key(name)?;
        let record = fetch_item::<u32, SettingsRecord, _>(
            &mut self.flash,
            self.storage_range.clone(),
            &mut NoCache::new(),
            &mut self.buffer,
            &key,
        )
        .await
        .map_err(|e| {
            print_storage_error::<F>(e);
            StoreError::Flash
        })?;
        Ok(record.and_then(|r| r.0))
    }

    async fn save(&mut self, name: &str, config: &ProcessorConfig) -> Result<(), StoreError> {
        let key = record_key(name)?;
        store_item::<u32, SettingsRecord, _>(
            &mut self.flash,
            self.storage_range.clone(),
            &mut NoCache::new(),
            &mut self.buffer,
            &key,
            &SettingsRecord(Some(*config)),
        )
        .await
        .map_err(|e| {
            print_storage_error::<F>(e);
            StoreError::Flash
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keys_differ() {
        assert_ne!(record_key("ball").unwrap(), record_key("wheel").unwrap());
        assert_eq!(record_key("ball").unwrap(), record_key("ball").unwrap());
        assert!(record_key("too_long_name").is_err());
    }
}
