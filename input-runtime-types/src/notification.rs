use crate::config::ProcessorConfig;

/// Published after a durable configuration change of a processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProcessorChanged {
    pub id: u8,
    pub name: &'static str,
    /// Active copy of the configuration
    pub config: ProcessorConfig,
}
