use serde_json::{Map, Value};

/// Recommendation produced by the prediction agent. An empty string means the
/// agent has no recommendation for that field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prediction {
    pub team: String,
    pub component: String,
    pub confidence: f64,
}

impl Prediction {
    pub fn new(team: String, component: String, confidence: f64) -> Self {
        Self {
            team,
            component,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn has_recommendation(&self) -> bool {
        !self.team.is_empty() || !self.component.is_empty()
    }
}

/// One operator-approved recommendation, queued for writing but not yet
/// applied. Produced only by the review session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovedChange {
    pub key: String,
    pub team: String,
    pub component: String,
}

impl ApprovedChange {
    pub fn is_empty(&self) -> bool {
        self.team.is_empty() && self.component.is_empty()
    }
}

/// Outcome of applying one approved change. Failures are captured here, never
/// raised past the applier boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdateResult {
    pub updated: bool,
    pub message: String,
    pub details: Map<String, Value>,
}

impl FieldUpdateResult {
    pub fn success(message: impl Into<String>, details: Map<String, Value>) -> Self {
        Self {
            updated: true,
            message: message.into(),
            details,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            updated: false,
            message: message.into(),
            details: Map::new(),
        }
    }
}
