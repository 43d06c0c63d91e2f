//! Durable storage of processor settings.
//!
//! One record per processor, keyed by processor name: a version byte
//! followed by the postcard encoding of its persistent [`ProcessorConfig`].

#[cfg(feature = "storage")]
pub mod flash;

use heapless::Vec;
use input_runtime_types::config::ProcessorConfig;
use postcard::experimental::max_size::MaxSize;

use crate::PROCESSOR_NAME_MAX_LEN;
use crate::error::StoreError;
use crate::registry::SaveRequest;

/// Bump when the layout of [`ProcessorConfig`] changes
pub const SETTINGS_RECORD_VERSION: u8 = 1;
/// Max size of an encoded record
pub const SETTINGS_RECORD_SIZE: usize = 1 + ProcessorConfig::POSTCARD_MAX_SIZE;

/// Key-value store of processor settings
pub trait SettingsStore {
    /// Stored record of processor `name`, `None` if there is no valid one
    async fn load(&mut self, name: &str) -> Result<Option<ProcessorConfig>, StoreError>;

    async fn save(&mut self, name: &str, config: &ProcessorConfig) -> Result<(), StoreError>;
}

/// Encode a settings record into `buffer`, returning the used part
pub fn encode_settings<'b>(config: &ProcessorConfig, buffer: &'b mut [u8]) -> Result<&'b [u8], StoreError> {
    let Some((version, body)) = buffer.split_first_mut() else {
        return Err(StoreError::BufferTooSmall);
    };
    *version = SETTINGS_RECORD_VERSION;
    let len = postcard::to_slice(config, body)
        .map_err(|e| match e {
            postcard::Error::SerializeBufferFull => StoreError::BufferTooSmall,
            _ => StoreError::Serialization,
        })?
        .len();
    Ok(&buffer[..1 + len])
}

/// Decode a settings record. Records of another version or that don't
/// decode are treated as missing.
pub fn decode_settings(bytes: &[u8]) -> Option<ProcessorConfig> {
    match bytes.split_first() {
        Some((&SETTINGS_RECORD_VERSION, body)) => match postcard::from_bytes(body) {
            Ok(config) => Some(config),
            Err(_) => {
                warn!("Discarding undecodable settings record");
                None
            }
        },
        Some((version, _)) => {
            warn!("Discarding settings record of version {}", version);
            None
        }
        None => None,
    }
}

/// Stored settings of `name`. Failures are logged and read as no record.
pub(crate) async fn load_stored<S: SettingsStore>(store: &mut S, name: &str) -> Option<ProcessorConfig> {
    match store.load(name).await {
        Ok(Some(config)) => Some(config),
        Ok(None) => {
            debug!("No stored settings for processor {}", name);
            None
        }
        Err(e) => {
            error!("Failed to load settings of processor {}: {:?}", name, e);
            None
        }
    }
}

/// Write a due save, failures are logged and dropped
pub(crate) async fn save_settings<S: SettingsStore>(store: &mut S, request: &SaveRequest) {
    match store.save(request.name, &request.config).await {
        Ok(()) => info!("Saved settings of processor {}", request.name),
        Err(e) => error!("Failed to save settings of processor {}: {:?}", request.name, e),
    }
}

/// Zero padded processor name, the key of its record
pub fn settings_key(name: &str) -> Result<[u8; PROCESSOR_NAME_MAX_LEN], StoreError> {
    let mut key = [0u8; PROCESSOR_NAME_MAX_LEN];
    key.get_mut(..name.len())
        .ok_or(StoreError::BufferTooSmall)?
        .copy_from_slice(name.as_bytes());
    Ok(key)
}

type SettingsKey = [u8; PROCESSOR_NAME_MAX_LEN];

/// Settings store in RAM, for boards without flash. Settings survive until
/// the next reset.
pub struct RamStore<const N: usize> {
    records: Vec<(SettingsKey, Vec<u8, SETTINGS_RECORD_SIZE>), N>,
    writes: usize,
}

impl<const N: usize> Default for RamStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RamStore<N> {
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
            writes: 0,
        }
    }

    /// Number of successful saves
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Raw record of `name`
    pub fn record(&self, name: &str) -> Option<&[u8]> {
        let key = settings_key(name).ok()?;
        self.records
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, record)| record.as_slice())
    }

    /// Store raw bytes as the record of `name`
    pub fn insert_raw(&mut self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let key = settings_key(name)?;
        let record = Vec::from_slice(bytes).map_err(|_| StoreError::BufferTooSmall)?;
        match self.records.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = record,
            None => self
                .records
                .push((key, record))
                .map_err(|_| StoreError::BufferTooSmall)?,
        }
        Ok(())
    }
}

impl<const N: usize> SettingsStore for RamStore<N> {
    async fn load(&mut self, name: &str) -> Result<Option<ProcessorConfig>, StoreError> {
        Ok(self.record(name).and_then(decode_settings))
    }

    async fn save(&mut self, name: &str, config: &ProcessorConfig) -> Result<(), StoreError> {
        let mut buffer = [0u8; SETTINGS_RECORD_SIZE];
        let bytes = encode_settings(config, &mut buffer)?;
        self.insert_raw(name, bytes)?;
        self.writes += 1;
        Ok(())
    }
}
