pub mod attrs;
pub mod console;
pub mod emitter;
pub mod metrics;
pub mod otel;
pub mod sink;
pub mod span;

pub use emitter::Emitter;
