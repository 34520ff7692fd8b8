use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Worsening,
    #[default]
    Stable,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Worsening => "worsening",
            Trend::Stable => "stable",
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Improving => "↓",
            Trend::Worsening => "↑",
            Trend::Stable => "→",
        }
    }
}

/// Relative change of `recent` against `overall`, in percent.
///
/// A zero baseline is replaced with 1 so the result stays finite.
pub fn percent_change(recent: f64, overall: f64) -> f64 {
    let baseline = if overall == 0.0 { 1.0 } else { overall };
    (recent - overall) / baseline * 100.0
}

/// Classify a lower-is-better quantity (latency, mistake rate).
///
/// The threshold is exclusive: a change of exactly `threshold_pct` is stable.
pub fn classify(recent: f64, overall: f64, threshold_pct: f64) -> Trend {
    let change = percent_change(recent, overall);
    if change < -threshold_pct {
        Trend::Improving
    } else if change > threshold_pct {
        Trend::Worsening
    } else {
        Trend::Stable
    }
}

/// Classify a higher-is-better quantity (speed).
pub fn classify_higher_better(recent: f64, overall: f64, threshold_pct: f64) -> Trend {
    match classify(recent, overall, threshold_pct) {
        Trend::Improving => Trend::Worsening,
        Trend::Worsening => Trend::Improving,
        Trend::Stable => Trend::Stable,
    }
}
