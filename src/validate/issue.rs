use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    TooFewPoints,
    DegenerateTrack,
    HighVerticalG,
    StrongAirtime,
    HighLateralG,
    HighSpeed,
    Stall,
    LowHeight,
    SharpTurn,
    SteepGrade,
    TightRadius,
    SelfIntersection,
    IncompleteSimulation,
    Summary,
}

impl IssueKind {
    /// Stable numeric code used across the C ABI.
    pub fn code(self) -> u32 {
        match self {
            IssueKind::TooFewPoints => 1,
            IssueKind::DegenerateTrack => 2,
            IssueKind::HighVerticalG => 10,
            IssueKind::StrongAirtime => 11,
            IssueKind::HighLateralG => 12,
            IssueKind::HighSpeed => 13,
            IssueKind::Stall => 14,
            IssueKind::LowHeight => 20,
            IssueKind::SharpTurn => 21,
            IssueKind::SteepGrade => 22,
            IssueKind::TightRadius => 23,
            IssueKind::SelfIntersection => 24,
            IssueKind::IncompleteSimulation => 30,
            IssueKind::Summary => 0,
        }
    }
}

/// Where on the track a finding applies. Both fields empty means the whole
/// track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
}

impl IssueLocation {
    pub const TRACK: Self = Self {
        point_index: None,
        progress: None,
    };

    pub fn point(index: usize) -> Self {
        Self {
            point_index: Some(index),
            progress: None,
        }
    }

    /// A progress value and the control point nearest to it.
    pub fn along(progress: f32, point_index: usize) -> Self {
        Self {
            point_index: Some(point_index),
            progress: Some(progress),
        }
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub kind: IssueKind,
    pub message: String,
    pub location: IssueLocation,
    /// The measured quantity that triggered the finding, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
}

impl Issue {
    pub fn new(
        severity: Severity,
        kind: IssueKind,
        message: impl Into<String>,
        location: IssueLocation,
    ) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            location,
            value: None,
        }
    }

    pub fn error(kind: IssueKind, message: impl Into<String>, location: IssueLocation) -> Self {
        Self::new(Severity::Error, kind, message, location)
    }

    pub fn warning(kind: IssueKind, message: impl Into<String>, location: IssueLocation) -> Self {
        Self::new(Severity::Warning, kind, message, location)
    }

    pub fn info(kind: IssueKind, message: impl Into<String>, location: IssueLocation) -> Self {
        Self::new(Severity::Info, kind, message, location)
    }

    pub fn with_value(mut self, value: f32) -> Self {
        self.value = Some(value);
        self
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(index) = self.location.point_index {
            write!(f, " (point {index})")?;
        }
        Ok(())
    }
}
