use super::labels::LabelSet;
use super::table::{MetricDef, MetricKind};

/// What a sample does to its series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Increment(f64),
    Observe(f64),
    GaugeAdd(f64),
    GaugeSet(f64),
}

impl Measurement {
    pub fn value(&self) -> f64 {
        match *self {
            Measurement::Increment(v)
            | Measurement::Observe(v)
            | Measurement::GaugeAdd(v)
            | Measurement::GaugeSet(v) => v,
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Measurement::Increment(_) => MetricKind::Counter,
            Measurement::Observe(_) => MetricKind::Histogram,
            Measurement::GaugeAdd(_) | Measurement::GaugeSet(_) => MetricKind::Gauge,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Measurement::Increment(_) => "increment",
            Measurement::Observe(_) => "observation",
            Measurement::GaugeAdd(_) => "gauge add",
            Measurement::GaugeSet(_) => "gauge set",
        }
    }
}

/// One typed measurement against a declared metric.
#[derive(Debug, Clone)]
pub struct MetricSample {
    pub def: &'static MetricDef,
    pub measurement: Measurement,
    pub labels: LabelSet,
}

impl MetricSample {
    pub fn increment(def: &'static MetricDef, labels: LabelSet) -> Self {
        Self::new(def, Measurement::Increment(1.0), labels)
    }

    pub fn observe(def: &'static MetricDef, labels: LabelSet, value: f64) -> Self {
        Self::new(def, Measurement::Observe(value), labels)
    }

    pub fn gauge_add(def: &'static MetricDef, labels: LabelSet, delta: f64) -> Self {
        Self::new(def, Measurement::GaugeAdd(delta), labels)
    }

    pub fn gauge_set(def: &'static MetricDef, labels: LabelSet, value: f64) -> Self {
        Self::new(def, Measurement::GaugeSet(value), labels)
    }

    pub fn new(def: &'static MetricDef, measurement: Measurement, labels: LabelSet) -> Self {
        MetricSample {
            def,
            measurement,
            labels,
        }
    }

    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn value(&self) -> f64 {
        self.measurement.value()
    }
}
