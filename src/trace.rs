//! Stage spans and stage counters.
//!
//! Every post-processing stage (`decode_detections`, `nms`, `detect`, ...)
//! opens an info span and reports how many items it kept or dropped as a
//! debug event. Without the `tracing` feature both macros compile away and
//! the span is a [`DisabledSpan`].

/// Opens the info span of a post-processing stage.
#[cfg(feature = "tracing")]
macro_rules! stage_span {
    ($stage:literal $(, $($field:tt)*)?) => {
        tracing::info_span!($stage $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! stage_span {
    ($stage:literal $(, $($field:tt)*)?) => {
        $crate::trace::DisabledSpan
    };
}

/// Reports the item counts of a finished stage at debug level.
#[cfg(feature = "tracing")]
macro_rules! stage_counts {
    ($stage:literal, $($key:ident = $count:expr),+ $(,)?) => {
        tracing::debug!(name: $stage, $($key = $count),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! stage_counts {
    ($stage:literal, $($key:ident = $count:expr),+ $(,)?) => {
        $(let _: usize = $count;)+
    };
}

pub(crate) use stage_counts;
pub(crate) use stage_span;

/// Span stand-in when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
pub struct DisabledSpan;

#[cfg(not(feature = "tracing"))]
impl DisabledSpan {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
