//! Errors of the runtime processors and their collaborators

/// Errors reported synchronously to callers of the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProcessorError {
    /// No processor has this index
    UnknownProcessor(u8),
    /// No processor has this name
    UnknownName,
    /// Raw axis snap mode out of range
    InvalidSnapMode(u8),
    /// Processor name longer than [`crate::PROCESSOR_NAME_MAX_LEN`]
    NameTooLong,
    DuplicateName,
    /// X and Y code lists have different lengths
    CodeListMismatch,
    /// More descriptors than the registry capacity
    RegistryFull,
}

/// Errors of the keymap collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeymapError {
    InvalidLayer(u8),
}

/// Errors of a settings store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// The underlying flash operation failed
    Flash,
    /// Record could not be encoded
    Serialization,
    BufferTooSmall,
}
