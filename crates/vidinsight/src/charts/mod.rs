//! Chart normalization.
//!
//! Raw chart records are converted into [`ChartSpec`]s at a single boundary
//! ([`normalize`]); everything downstream works on the canonical union.

pub mod drawable;
mod normalize;
mod raw;
mod spec;
mod variants;

pub use drawable::{describe, Drawable, Shape};
pub use normalize::{normalize, validate_categorical, DEFAULT_GAUGE_MAX};
pub use raw::{
    RawChart, CATEGORY_ALIASES, MAX_ALIASES, PLOT_TYPE_ALIASES, SERIES_ALIASES, TITLE_ALIASES,
    VALUE_ALIASES,
};
pub use spec::{
    ChartSeries, ChartSpec, ChartStatus, ChartValidationFailure, NamedSeries, Orientation,
    PlotType,
};
pub use variants::expand_variants;

/// Normalizes every raw chart of a payload, in order.
pub fn normalize_all(raw: &[RawChart]) -> Vec<ChartSpec> {
    raw.iter()
        .enumerate()
        .map(|(index, chart)| normalize(chart, index))
        .collect()
}
