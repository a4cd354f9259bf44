//! Feature-gated tracing hooks for the detection and fitting stages.
//!
//! With the `tracing` feature the macros below forward to `tracing` spans and
//! events; without it they expand to nothing observable, so call sites never
//! need their own `cfg` attributes. `trace_field!` and `trace_mask!` summarise
//! a stage's output buffer and skip that work entirely when tracing is off.

/// Opens an info-level span around one pipeline stage.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::StageSpan
    };
}

/// Records stage measurements (counts, thresholds, losses).
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::info!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

/// Records the finite value range of a stage output field.
///
/// The O(N) scan only runs when tracing is compiled in.
#[cfg(feature = "tracing")]
macro_rules! trace_field {
    ($name:expr, $field:expr) => {{
        let field: &$crate::image::ScalarField = $field;
        if let Some((min, max)) = field.min_max() {
            tracing::info!(
                name: $name,
                width = field.width(),
                height = field.height(),
                min = min,
                max = max
            );
        }
    }};
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_field {
    ($name:expr, $field:expr) => {{
        let _: &$crate::image::ScalarField = $field;
    }};
}

/// Records how much of a mask is foreground, plus any extra stage fields.
#[cfg(feature = "tracing")]
macro_rules! trace_mask {
    ($name:expr, $mask:expr $(, $key:ident = $value:expr)* $(,)?) => {{
        let mask: &$crate::image::BinaryMask = $mask;
        let foreground = mask.count_ones();
        let area = mask.width() * mask.height();
        tracing::info!(
            name: $name,
            foreground = foreground,
            coverage = foreground as f64 / area as f64
            $(, $key = $value)*
        );
    }};
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_mask {
    ($name:expr, $mask:expr $(, $key:ident = $value:expr)* $(,)?) => {{
        let _: &$crate::image::BinaryMask = $mask;
        $(let _ = $value;)*
    }};
}

pub(crate) use trace_event;
pub(crate) use trace_field;
pub(crate) use trace_mask;
pub(crate) use trace_span;

/// Stand-in span returned by `trace_span!` when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
pub struct StageSpan;

#[cfg(not(feature = "tracing"))]
impl StageSpan {
    /// Mirrors `tracing::Span::entered` so guards read the same either way.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
