use crate::error::BackendError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

impl ApprovalDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalDecision::Approved => "Approved",
            ApprovalDecision::Rejected => "Rejected",
        }
    }
}

impl Serialize for ApprovalDecision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.as_str(), &())?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteOnOrbitRequestArgs {
    pub token_id: String,
    pub orbit_request_id: String,
    pub vote: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitRequestApprovalArgs {
    pub token_id: String,
    pub request_id: String,
    pub decision: ApprovalDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Outcome of a vote or approval call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionResult {
    Ok,
    Err(BackendError),
}

impl ActionResult {
    pub fn into_result(self) -> Result<(), BackendError> {
        match self {
            ActionResult::Ok => Ok(()),
            ActionResult::Err(e) => Err(e),
        }
    }
}
