//! Pure mapping from a [`ChartSpec`] to drawable shapes.
//!
//! Coordinates are pixels with the origin at the top-left corner and y
//! growing downwards. Angles are radians, measured clockwise from the
//! positive x axis.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use serde::Serialize;

use super::spec::{ChartSeries, ChartSpec, ChartStatus, Orientation, PlotType};

pub type Color = [u8; 3];

pub const BACKGROUND: Color = [255, 255, 255];
pub const TRACK: Color = [229, 231, 235];
pub const AXIS: Color = [156, 163, 175];

/// Series colors, cycled by index.
pub const PALETTE: [Color; 8] = [
    [59, 130, 246],
    [16, 185, 129],
    [245, 158, 11],
    [239, 68, 68],
    [139, 92, 246],
    [236, 72, 153],
    [20, 184, 166],
    [107, 114, 128],
];

const MARGIN: f32 = 24.0;
const BADGE_HEIGHT: f32 = 6.0;
const DONUT_HOLE: f32 = 0.55;
const GAUGE_THICKNESS: f32 = 0.3;
const BAR_GAP: f32 = 0.2;
const LINE_WIDTH: f32 = 3.0;

pub fn palette_color(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

pub fn status_color(status: ChartStatus) -> Color {
    match status {
        ChartStatus::Excellent => [16, 185, 129],
        ChartStatus::Good => [59, 130, 246],
        ChartStatus::AttentionNeeded => [245, 158, 11],
    }
}

/// One primitive shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    /// Filled ring segment. `inner_radius == 0` draws a pie slice.
    Arc {
        cx: f32,
        cy: f32,
        radius: f32,
        inner_radius: f32,
        start: f32,
        sweep: f32,
        color: Color,
    },
    Polyline {
        points: Vec<(f32, f32)>,
        width: f32,
        color: Color,
    },
}

/// Everything needed to paint one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drawable {
    pub width: u32,
    pub height: u32,
    pub background: Color,
    pub shapes: Vec<Shape>,
}

impl Drawable {
    /// True when at least one shape would paint something.
    pub fn has_marks(&self) -> bool {
        self.shapes.iter().any(|shape| match shape {
            Shape::Rect { width, height, .. } => *width > 0.0 && *height > 0.0,
            Shape::Arc {
                radius,
                inner_radius,
                sweep,
                ..
            } => radius > inner_radius && sweep.abs() > 0.0,
            Shape::Polyline { points, .. } => points.len() > 1,
        })
    }
}

#[derive(Clone, Copy)]
struct Area {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Area {
    fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Describes how `spec` is drawn on a `width` x `height` canvas.
pub fn describe(spec: &ChartSpec, width: u32, height: u32) -> Drawable {
    let w = width as f32;
    let h = height as f32;
    let mut shapes = vec![Shape::Rect {
        x: 0.0,
        y: 0.0,
        width: w,
        height: BADGE_HEIGHT,
        color: status_color(spec.status),
    }];

    let area = Area {
        x: MARGIN,
        y: MARGIN + BADGE_HEIGHT,
        width: (w - 2.0 * MARGIN).max(0.0),
        height: (h - 2.0 * MARGIN - BADGE_HEIGHT).max(0.0),
    };

    if area.width > 0.0 && area.height > 0.0 {
        match &spec.series {
            ChartSeries::Gauge {
                value, max_value, ..
            } => gauge(&mut shapes, area, *value / *max_value, spec.status),
            ChartSeries::Categorical { values, .. } => match spec.plot_type {
                PlotType::Pie => slices(&mut shapes, area, values, 0.0),
                PlotType::Donut => slices(&mut shapes, area, values, DONUT_HOLE),
                PlotType::Line => lines(&mut shapes, area, &[values.as_slice()]),
                PlotType::Histogram => bars(&mut shapes, area, &[values.as_slice()], 0.0, spec.orientation),
                PlotType::Waterfall => waterfall(&mut shapes, area, values),
                PlotType::Bar | PlotType::Gauge | PlotType::Placeholder => {
                    bars(&mut shapes, area, &[values.as_slice()], BAR_GAP, spec.orientation)
                }
            },
            ChartSeries::MultiSeries { series, .. } => {
                let columns: Vec<&[f64]> = series.iter().map(|s| s.values.as_slice()).collect();
                if spec.plot_type == PlotType::Bar {
                    bars(&mut shapes, area, &columns, BAR_GAP, spec.orientation);
                } else {
                    lines(&mut shapes, area, &columns);
                }
            }
            ChartSeries::Unavailable { .. } => unavailable(&mut shapes, area),
        }
    }

    Drawable {
        width,
        height,
        background: BACKGROUND,
        shapes,
    }
}

fn gauge(shapes: &mut Vec<Shape>, area: Area, ratio: f64, status: ChartStatus) {
    let ratio = if ratio.is_finite() {
        ratio.clamp(0.0, 1.0) as f32
    } else {
        0.0
    };
    let radius = (area.width / 2.0).min(area.height);
    let inner_radius = radius * (1.0 - GAUGE_THICKNESS);
    let cx = area.x + area.width / 2.0;
    let cy = area.bottom();

    shapes.push(Shape::Arc {
        cx,
        cy,
        radius,
        inner_radius,
        start: PI,
        sweep: PI,
        color: TRACK,
    });
    if ratio > 0.0 {
        shapes.push(Shape::Arc {
            cx,
            cy,
            radius,
            inner_radius,
            start: PI,
            sweep: PI * ratio,
            color: status_color(status),
        });
    }
}

fn slices(shapes: &mut Vec<Shape>, area: Area, values: &[f64], hole: f32) {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    let (cx, cy) = area.center();
    let radius = area.width.min(area.height) / 2.0;

    if total <= 0.0 {
        shapes.push(Shape::Arc {
            cx,
            cy,
            radius,
            inner_radius: radius * hole,
            start: -FRAC_PI_2,
            sweep: TAU,
            color: TRACK,
        });
        return;
    }

    let mut start = -FRAC_PI_2;
    for (index, value) in values.iter().enumerate() {
        if *value <= 0.0 {
            continue;
        }
        let sweep = (*value / total) as f32 * TAU;
        shapes.push(Shape::Arc {
            cx,
            cy,
            radius,
            inner_radius: radius * hole,
            start,
            sweep,
            color: palette_color(index),
        });
        start += sweep;
    }
}

/// Value range covering zero and every value.
fn value_range<'a>(columns: impl IntoIterator<Item = &'a f64>) -> (f64, f64) {
    let (lo, hi) = columns
        .into_iter()
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if hi - lo <= f64::EPSILON {
        (lo, lo + 1.0)
    } else {
        (lo, hi)
    }
}

fn axes(shapes: &mut Vec<Shape>, area: Area) {
    shapes.push(Shape::Polyline {
        points: vec![
            (area.x, area.y),
            (area.x, area.bottom()),
            (area.x + area.width, area.bottom()),
        ],
        width: 1.0,
        color: AXIS,
    });
}

/// Grouped bars: one group per category, one bar per series column.
fn bars(
    shapes: &mut Vec<Shape>,
    area: Area,
    columns: &[&[f64]],
    gap: f32,
    orientation: Orientation,
) {
    let groups = columns.iter().map(|c| c.len()).max().unwrap_or(0);
    if groups == 0 {
        return;
    }
    let (lo, hi) = value_range(columns.iter().flat_map(|c| c.iter()));
    let span = (hi - lo) as f32;
    axes(shapes, area);

    let (along, across) = match orientation {
        Orientation::Vertical => (area.width, area.height),
        Orientation::Horizontal => (area.height, area.width),
    };
    let slot = along / groups as f32;
    let bar = slot * (1.0 - gap) / columns.len() as f32;
    let zero = ((0.0 - lo) as f32 / span) * across;

    for (series_index, column) in columns.iter().enumerate() {
        let color = if columns.len() == 1 {
            PALETTE[0]
        } else {
            palette_color(series_index)
        };
        for (group, value) in column.iter().enumerate() {
            let offset = group as f32 * slot + slot * gap / 2.0 + series_index as f32 * bar;
            let end = ((*value - lo) as f32 / span) * across;
            let (from, length) = if end >= zero {
                (zero, end - zero)
            } else {
                (end, zero - end)
            };
            let shape = match orientation {
                Orientation::Vertical => Shape::Rect {
                    x: area.x + offset,
                    y: area.bottom() - from - length,
                    width: bar,
                    height: length,
                    color,
                },
                Orientation::Horizontal => Shape::Rect {
                    x: area.x + from,
                    y: area.y + offset,
                    width: length,
                    height: bar,
                    color,
                },
            };
            shapes.push(shape);
        }
    }
}

fn lines(shapes: &mut Vec<Shape>, area: Area, columns: &[&[f64]]) {
    let (lo, hi) = value_range(columns.iter().flat_map(|c| c.iter()));
    let span = (hi - lo) as f32;
    axes(shapes, area);

    for (index, column) in columns.iter().enumerate() {
        let step = if column.len() > 1 {
            area.width / (column.len() - 1) as f32
        } else {
            0.0
        };
        let points = column
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let y = area.bottom() - ((*v - lo) as f32 / span) * area.height;
                (area.x + step * i as f32, y)
            })
            .collect();
        shapes.push(Shape::Polyline {
            points,
            width: LINE_WIDTH,
            color: palette_color(index),
        });
    }
}

/// Floating bars stacked on the running total, then the total itself.
fn waterfall(shapes: &mut Vec<Shape>, area: Area, values: &[f64]) {
    if values.is_empty() {
        return;
    }
    let mut running = 0.0;
    let mut levels = vec![0.0];
    for v in values {
        running += v;
        levels.push(running);
    }
    let (lo, hi) = value_range(levels.iter());
    let span = (hi - lo) as f32;
    axes(shapes, area);

    let slot = area.width / (values.len() + 1) as f32;
    let bar = slot * (1.0 - BAR_GAP);
    let y_of = |v: f64| area.bottom() - ((v - lo) as f32 / span) * area.height;

    for (index, pair) in levels.windows(2).enumerate() {
        let (top, bottom) = (y_of(pair[0].max(pair[1])), y_of(pair[0].min(pair[1])));
        shapes.push(Shape::Rect {
            x: area.x + index as f32 * slot + slot * BAR_GAP / 2.0,
            y: top,
            width: bar,
            height: bottom - top,
            color: palette_color(index),
        });
    }

    let (top, bottom) = (y_of(running.max(0.0)), y_of(running.min(0.0)));
    shapes.push(Shape::Rect {
        x: area.x + values.len() as f32 * slot + slot * BAR_GAP / 2.0,
        y: top,
        width: bar,
        height: bottom - top,
        color: AXIS,
    });
}

fn unavailable(shapes: &mut Vec<Shape>, area: Area) {
    shapes.push(Shape::Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: area.height,
        color: TRACK,
    });
    shapes.push(Shape::Polyline {
        points: vec![(area.x, area.y), (area.x + area.width, area.bottom())],
        width: 2.0,
        color: AXIS,
    });
    shapes.push(Shape::Polyline {
        points: vec![(area.x + area.width, area.y), (area.x, area.bottom())],
        width: 2.0,
        color: AXIS,
    });
}
