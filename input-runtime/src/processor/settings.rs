//! Active and persistent copies of a processor's tunables

use input_runtime_types::config::ProcessorConfig;

/// The tunables of one processor.
///
/// `active` drives the pipeline. `persistent` mirrors what is (or will be)
/// in the settings store. Temporary writes only touch `active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub active: ProcessorConfig,
    pub persistent: ProcessorConfig,
}

impl Settings {
    pub const fn new(defaults: ProcessorConfig) -> Self {
        Self {
            active: defaults,
            persistent: defaults,
        }
    }

    /// Apply `f` to the active copy, and to the persistent copy as well if
    /// `persistent` is set.
    pub fn update(&mut self, persistent: bool, f: impl Fn(&mut ProcessorConfig)) {
        f(&mut self.active);
        if persistent {
            f(&mut self.persistent);
        }
    }

    /// Throw away temporary changes
    pub fn restore_persistent(&mut self) {
        self.active = self.persistent;
    }

    /// Overwrite both copies, e.g. with the defaults or a stored record
    pub fn replace(&mut self, config: ProcessorConfig) {
        self.active = config;
        self.persistent = config;
    }
}
