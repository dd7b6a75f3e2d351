use serde::Deserialize;
use serde_json::Value;

/// Core Web Vitals accepted by the web-vitals endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebVital {
    Fcp,
    Lcp,
    Fid,
    Cls,
    Ttfb,
}

impl WebVital {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "FCP" => Some(WebVital::Fcp),
            "LCP" => Some(WebVital::Lcp),
            "FID" => Some(WebVital::Fid),
            "CLS" => Some(WebVital::Cls),
            "TTFB" => Some(WebVital::Ttfb),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WebVital::Fcp => "FCP",
            WebVital::Lcp => "LCP",
            WebVital::Fid => "FID",
            WebVital::Cls => "CLS",
            WebVital::Ttfb => "TTFB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalRating {
    Good,
    NeedsImprovement,
    Poor,
    Unknown,
}

impl VitalRating {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("good") => VitalRating::Good,
            Some("needs-improvement") => VitalRating::NeedsImprovement,
            Some("poor") => VitalRating::Poor,
            _ => VitalRating::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VitalRating::Good => "good",
            VitalRating::NeedsImprovement => "needs-improvement",
            VitalRating::Poor => "poor",
            VitalRating::Unknown => "unknown",
        }
    }
}

/// Client applications allowed to report their own request metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    Frontend,
    Mobile,
}

impl ClientKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "frontend" => Some(ClientKind::Frontend),
            "mobile" => Some(ClientKind::Mobile),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientKind::Frontend => "frontend",
            ClientKind::Mobile => "mobile",
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct WebVitalReport {
    pub name: Option<String>,
    pub value: Option<f64>,
    pub rating: Option<String>,
}

/// A request observed by a client. `duration` is in milliseconds.
#[derive(Deserialize, Debug, Default)]
pub struct ClientReport {
    pub route: Option<String>,
    pub duration: Option<f64>,
    #[serde(default)]
    pub error: Value,
}

impl ClientReport {
    /// Clients send `error` as a flag, a message or an object; null, false,
    /// zero and empty strings mean no error.
    pub fn is_error(&self) -> bool {
        match &self.error {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Duration in seconds, when present, finite and non-negative.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration
            .filter(|ms| ms.is_finite() && *ms >= 0.0)
            .map(|ms| ms / 1000.0)
    }

    /// The route if it is on the allowlist, `other` otherwise.
    pub fn route_label<'a>(&'a self, allowed: &[String]) -> &'a str {
        match self.route.as_deref() {
            Some(route) if allowed.iter().any(|r| r == route) => route,
            _ => "other",
        }
    }
}
