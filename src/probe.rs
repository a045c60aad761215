//! Page-experience signals that the core consumes but never measures.
//!
//! Core Web Vitals, lab page-speed scores and a mobile-friendliness verdict all
//! come from an external service. The pipeline asks a [`PerformanceProbe`] once
//! per audit; a probe that has nothing to say returns `None` and the technical
//! checker degrades the affected categories.

use serde::{Deserialize, Serialize};
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "needs improvement")]
    NeedsImprovement,
    #[serde(rename = "poor")]
    Poor,
}

impl Rating {
    /// Classify a raw metric value where lower is better.
    pub fn from_value(value: f64, thresholds: Thresholds) -> Self {
        if value <= thresholds.good {
            Rating::Good
        } else if value > thresholds.poor {
            Rating::Poor
        } else {
            Rating::NeedsImprovement
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub good: f64,
    pub poor: f64,
}

pub const LCP_THRESHOLDS: Thresholds = Thresholds {
    good: 2.5,
    poor: 4.0,
};
pub const FID_THRESHOLDS: Thresholds = Thresholds {
    good: 100.0,
    poor: 300.0,
};
pub const CLS_THRESHOLDS: Thresholds = Thresholds {
    good: 0.1,
    poor: 0.25,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub value: f64,
    pub rating: Rating,
    pub thresholds: Thresholds,
}

impl Metric {
    pub fn rated(value: f64, thresholds: Thresholds) -> Self {
        Self {
            value,
            rating: Rating::from_value(value, thresholds),
            thresholds,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreWebVitals {
    /// Largest Contentful Paint, seconds.
    pub lcp: Option<Metric>,
    /// First Input Delay, milliseconds.
    pub fid: Option<Metric>,
    /// Cumulative Layout Shift, unitless.
    pub cls: Option<Metric>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSpeed {
    pub mobile_score: f64,
    pub desktop_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalSignals {
    pub core_web_vitals: Option<CoreWebVitals>,
    pub page_speed: Option<PageSpeed>,
    pub mobile_friendly: Option<bool>,
}

pub trait PerformanceProbe {
    fn probe(&self, url: &str) -> impl Future<Output = ExternalSignals> + Send;
}

/// Probe used when no external service is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

impl PerformanceProbe for NoProbe {
    async fn probe(&self, _url: &str) -> ExternalSignals {
        ExternalSignals::default()
    }
}

/// Probe that always answers with the same signals.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe(pub ExternalSignals);

impl PerformanceProbe for StaticProbe {
    async fn probe(&self, _url: &str) -> ExternalSignals {
        self.0.clone()
    }
}
