//! Deterministic alternate encodings of one chart.
//!
//! Gauge variants are illustrative placeholders. The pie split, the ramp,
//! the bell-shaped histogram and the fixed-proportion waterfall are
//! mechanical decompositions of a single scalar and carry no statistical
//! meaning. Callers showing them should label them as such.

use super::spec::{ChartSeries, ChartSpec, ChartStatus, Orientation, PlotType};

/// Categorical encoding family, in output order.
const CATEGORICAL_FAMILY: &[(&str, PlotType, Orientation)] = &[
    ("pie", PlotType::Pie, Orientation::Vertical),
    ("donut", PlotType::Donut, Orientation::Vertical),
    ("hbar", PlotType::Bar, Orientation::Horizontal),
    ("vbar", PlotType::Bar, Orientation::Vertical),
];

/// Relative frequencies of the illustrative histogram, one per bucket.
const BELL_TEMPLATE: [f64; 8] = [0.02, 0.07, 0.16, 0.25, 0.25, 0.16, 0.07, 0.02];

/// Waterfall component shares. The last component absorbs rounding.
const WATERFALL_SHARES: [(&str, f64); 4] = [
    ("Component 1", 0.4),
    ("Component 2", 0.3),
    ("Component 3", 0.2),
    ("Component 4", 0.1),
];

/// Ramp points of the line variant, as fractions of the value.
const RAMP_STEPS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Returns `spec` followed by its variants in a stable order. Variant ids
/// are `{id}_{tag}`. A categorical source drawn outside the family (line,
/// histogram, waterfall) gets all four family encodings.
pub fn expand_variants(spec: &ChartSpec) -> Vec<ChartSpec> {
    let mut out = vec![spec.clone()];

    match &spec.series {
        ChartSeries::Categorical { .. } => {
            let own = spec.encoding_tag();
            for (tag, plot_type, orientation) in CATEGORICAL_FAMILY {
                if own == Some(*tag) {
                    continue;
                }
                out.push(derive(spec, tag, *plot_type, *orientation, spec.series.clone()));
            }
        }
        ChartSeries::Gauge {
            value, max_value, ..
        } if value.is_finite() && max_value.is_finite() && *max_value > 0.0 => {
            out.push(derive(
                spec,
                "pie",
                PlotType::Pie,
                Orientation::Vertical,
                pie_split(*value, *max_value),
            ));
            out.push(derive(
                spec,
                "line",
                PlotType::Line,
                Orientation::Vertical,
                ramp(*value),
            ));
            out.push(derive(
                spec,
                "histogram",
                PlotType::Histogram,
                Orientation::Vertical,
                bell_histogram(*max_value, spec.status),
            ));
            out.push(derive(
                spec,
                "waterfall",
                PlotType::Waterfall,
                Orientation::Vertical,
                waterfall(*value),
            ));
        }
        _ => {}
    }

    out
}

fn derive(
    source: &ChartSpec,
    tag: &str,
    plot_type: PlotType,
    orientation: Orientation,
    series: ChartSeries,
) -> ChartSpec {
    ChartSpec {
        id: format!("{}_{}", source.id, tag),
        title: format!("{} ({})", source.title, plot_type),
        plot_type,
        orientation,
        series,
        status: source.status,
        insights: source.insights.clone(),
        source_id: Some(source.id.clone()),
    }
}

fn pie_split(value: f64, max_value: f64) -> ChartSeries {
    ChartSeries::Categorical {
        categories: vec!["Value".to_string(), "Remaining".to_string()],
        values: vec![value, (max_value - value).max(0.0)],
    }
}

fn ramp(value: f64) -> ChartSeries {
    ChartSeries::Categorical {
        categories: RAMP_STEPS
            .iter()
            .map(|step| format!("{}%", (step * 100.0) as u32))
            .collect(),
        values: RAMP_STEPS.iter().map(|step| step * value).collect(),
    }
}

fn bell_histogram(max_value: f64, status: ChartStatus) -> ChartSeries {
    let scale = match status {
        ChartStatus::Excellent => 100.0,
        ChartStatus::Good => 80.0,
        ChartStatus::AttentionNeeded => 60.0,
    };
    let width = max_value / BELL_TEMPLATE.len() as f64;

    let categories = (0..BELL_TEMPLATE.len())
        .map(|i| {
            let lo = round2(width * i as f64);
            let hi = round2(width * (i + 1) as f64);
            format!("{}-{}", lo, hi)
        })
        .collect();
    let values = BELL_TEMPLATE.iter().map(|f| round2(f * scale)).collect();

    ChartSeries::Categorical { categories, values }
}

fn waterfall(value: f64) -> ChartSeries {
    let mut values: Vec<f64> = WATERFALL_SHARES[..WATERFALL_SHARES.len() - 1]
        .iter()
        .map(|(_, share)| round2(value * share))
        .collect();
    let assigned: f64 = values.iter().sum();
    values.push(value - assigned);

    ChartSeries::Categorical {
        categories: WATERFALL_SHARES
            .iter()
            .map(|(name, _)| name.to_string())
            .collect(),
        values,
    }
}

fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}
