//! Alternative transmissions
//!
//! Each variant keeps the [`Transmission`](crate::Transmission) surface
//! while swapping the wire for something simpler:
//!
//! | Variant | Purpose |
//! |---------|---------|
//! | `null` | Discards everything (also used when sending is disabled) |
//! | `mock` | Appends events to an in-memory list, for tests |
//! | `console` | Writes one JSON line per event to stdout |

mod console;
mod mock;
mod null;

pub use console::ConsoleTransmission;
pub use mock::MockTransmission;
pub use null::NullTransmission;
