use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: f64,  // hour offset from the series origin
    pub value: f64, // pg/mL
}

/// Exposure metrics over a concentration series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub cmax: f64,
    pub tmax: f64,
    pub cmin: f64,
    pub cavg: f64, // time-weighted, AUC / duration
    pub auc: f64,  // pg*h/mL
}

impl SeriesPoint {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

impl SeriesSummary {
    pub fn from_series(series: &[SeriesPoint]) -> Option<Self> {
        let first = series.first()?;
        let last = series.last()?;

        let peak = series.iter()
            .max_by(|a, b| a.value.total_cmp(&b.value))?;
        let cmin = series.iter()
            .map(|p| p.value)
            .fold(f64::INFINITY, f64::min);

        let auc = trapezoidal_auc(series);
        let duration = last.time - first.time;
        let cavg = if duration > 0.0 { auc / duration } else { first.value };

        Some(Self {
            cmax: peak.value,
            tmax: peak.time,
            cmin,
            cavg,
            auc,
        })
    }

    /// Summary over the points with `time >= from`, e.g. a steady-state tail.
    pub fn from_series_after(series: &[SeriesPoint], from: f64) -> Option<Self> {
        let start = series.iter().position(|p| p.time >= from)?;
        Self::from_series(&series[start..])
    }
}

pub fn trapezoidal_auc(series: &[SeriesPoint]) -> f64 {
    series.windows(2)
        .map(|pair| {
            let dt = pair[1].time - pair[0].time;
            dt * (pair[0].value + pair[1].value) / 2.0
        })
        .sum()
}

/// Level at a fractional hour, linearly interpolated between the two nearest
/// points of an hourly series and clamped to its ends.
pub fn interpolate_level(series: &[SeriesPoint], hour: f64) -> f64 {
    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return 0.0,
    };

    if hour <= first.time {
        return first.value;
    }
    if hour >= last.time {
        return last.value;
    }

    let upper = series.partition_point(|p| p.time < hour);
    let hi = series[upper];
    if hi.time == hour || upper == 0 {
        return hi.value;
    }

    let lo = series[upper - 1];
    let fraction = (hour - lo.time) / (hi.time - lo.time);
    round_tenth(lo.value * (1.0 - fraction) + hi.value * fraction)
}

pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
