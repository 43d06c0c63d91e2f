//! Channels shared between the runtime processors and the rest of the firmware

use embassy_sync::channel::Channel;
use embassy_sync::pubsub::{PubSubChannel, Subscriber};
use embassy_sync::signal::Signal;
use input_runtime_types::notification::ProcessorChanged;

use crate::event::KeyEvent;
use crate::{
    KEY_EVENT_CHANNEL_SIZE, PROCESSOR_CHANGED_CHANNEL_PUBS, PROCESSOR_CHANGED_CHANNEL_SIZE,
    PROCESSOR_CHANGED_CHANNEL_SUBS, RawMutex,
};

pub type ProcessorChangedSub = Subscriber<
    'static,
    RawMutex,
    ProcessorChanged,
    PROCESSOR_CHANGED_CHANNEL_SIZE,
    PROCESSOR_CHANGED_CHANNEL_SUBS,
    PROCESSOR_CHANGED_CHANNEL_PUBS,
>;

/// Key presses and releases, consumed by [`crate::runner::run_runtime_processors`]
pub static KEY_EVENT_CHANNEL: Channel<RawMutex, KeyEvent, KEY_EVENT_CHANNEL_SIZE> = Channel::new();

/// Durable configuration changes, for the host protocol layer
pub static PROCESSOR_CHANGED_CHANNEL: PubSubChannel<
    RawMutex,
    ProcessorChanged,
    PROCESSOR_CHANGED_CHANNEL_SIZE,
    PROCESSOR_CHANGED_CHANNEL_SUBS,
    PROCESSOR_CHANGED_CHANNEL_PUBS,
> = PubSubChannel::new();

/// Signal this after turning keymap layers on or off outside the processors
pub static LAYER_STATE_SIGNAL: Signal<RawMutex, ()> = Signal::new();

/// Signaled whenever a task is scheduled, so that the runner re-reads the next deadline
pub(crate) static SCHEDULE_SIGNAL: Signal<RawMutex, ()> = Signal::new();

pub(crate) fn publish_processor_changed(message: ProcessorChanged) {
    PROCESSOR_CHANGED_CHANNEL.immediate_publisher().publish_immediate(message);
}
