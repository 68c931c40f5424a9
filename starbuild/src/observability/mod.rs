//! Observability utilities.

mod logging;
mod timer;

pub use logging::{default_directive, init_logging, LogFormat};
pub use timer::SpanTimer;
