use pulselog_core::ids::Correlation;
use pulselog_core::model::value::ErrorValue;

use crate::attrs::Attributes;

/// The span active while an event is emitted. Callers pass one explicitly;
/// passing `None` means no span is active.
pub trait ActiveSpan {
    /// Trace/span ids, if the span carries any.
    fn correlation(&self) -> Option<Correlation>;

    fn set_error_status(&self, message: &str);

    fn record_exception(&self, exception: &ErrorValue, attributes: &Attributes);

    fn add_event(&self, name: &str, attributes: &Attributes);
}
