//! Process control messages.

mod stop;

pub use stop::StopMessage;
