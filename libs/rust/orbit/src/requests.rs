use crate::nat::WireNat;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub type TimestampRFC3339 = String;

/// Serializes a payload-less variant as `{"<name>": null}`.
fn serialize_tag<S: Serializer>(serializer: S, name: &str) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(name, &())?;
    map.end()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownTag {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub enum RequestStatusCode {
    Created,
    Approved,
    Rejected,
    Cancelled,
    Scheduled,
    Processing,
    Completed,
    Failed,
}

impl RequestStatusCode {
    /// Every status Orbit Station reports, in the order the status picker
    /// lists them.
    pub const ALL: [RequestStatusCode; 8] = [
        RequestStatusCode::Created,
        RequestStatusCode::Scheduled,
        RequestStatusCode::Processing,
        RequestStatusCode::Approved,
        RequestStatusCode::Completed,
        RequestStatusCode::Rejected,
        RequestStatusCode::Cancelled,
        RequestStatusCode::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatusCode::Created => "Created",
            RequestStatusCode::Approved => "Approved",
            RequestStatusCode::Rejected => "Rejected",
            RequestStatusCode::Cancelled => "Cancelled",
            RequestStatusCode::Scheduled => "Scheduled",
            RequestStatusCode::Processing => "Processing",
            RequestStatusCode::Completed => "Completed",
            RequestStatusCode::Failed => "Failed",
        }
    }

    /// Statuses in which a request still waits on a decision or execution.
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestStatusCode::Created | RequestStatusCode::Scheduled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatusCode::Rejected
                | RequestStatusCode::Cancelled
                | RequestStatusCode::Completed
                | RequestStatusCode::Failed
        )
    }
}

impl Serialize for RequestStatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_tag(serializer, self.as_str())
    }
}

impl FromStr for RequestStatusCode {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatusCode::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTag {
                kind: "request status",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for RequestStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    CreatedAt,
    ExpirationDt,
    LastModificationDt,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "CreatedAt",
            SortField::ExpirationDt => "ExpirationDt",
            SortField::LastModificationDt => "LastModificationDt",
        }
    }
}

impl FromStr for SortField {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            SortField::CreatedAt,
            SortField::ExpirationDt,
            SortField::LastModificationDt,
        ]
        .into_iter()
        .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| UnknownTag {
            kind: "sort field",
            value: s.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "Asc",
            SortDirection::Desc => "Desc",
        }
    }
}

impl Serialize for SortDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_tag(serializer, self.as_str())
    }
}

/// `{"ExpirationDt": {"Asc": null}}` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListRequestsSortBy {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Serialize for ListRequestsSortBy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.field.as_str(), &self.direction)?;
        map.end()
    }
}

/// Operation tags understood by `list_requests`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Transfer,
    AddAccount,
    EditAccount,
    AddUser,
    EditUser,
    AddUserGroup,
    EditUserGroup,
    RemoveUserGroup,
    AddAddressBookEntry,
    EditAddressBookEntry,
    RemoveAddressBookEntry,
    SystemUpgrade,
    SystemRestore,
    ChangeExternalCanister,
    ConfigureExternalCanister,
    CreateExternalCanister,
    CallExternalCanister,
    FundExternalCanister,
    MonitorExternalCanister,
    SnapshotExternalCanister,
    RestoreExternalCanister,
    PruneExternalCanister,
    EditPermission,
    AddRequestPolicy,
    EditRequestPolicy,
    RemoveRequestPolicy,
    ManageSystemInfo,
    SetDisasterRecovery,
    AddAsset,
    EditAsset,
    RemoveAsset,
    AddNamedRule,
    EditNamedRule,
    RemoveNamedRule,
}

impl OperationKind {
    pub const ALL: [OperationKind; 34] = [
        OperationKind::Transfer,
        OperationKind::AddAccount,
        OperationKind::EditAccount,
        OperationKind::AddUser,
        OperationKind::EditUser,
        OperationKind::AddUserGroup,
        OperationKind::EditUserGroup,
        OperationKind::RemoveUserGroup,
        OperationKind::AddAddressBookEntry,
        OperationKind::EditAddressBookEntry,
        OperationKind::RemoveAddressBookEntry,
        OperationKind::SystemUpgrade,
        OperationKind::SystemRestore,
        OperationKind::ChangeExternalCanister,
        OperationKind::ConfigureExternalCanister,
        OperationKind::CreateExternalCanister,
        OperationKind::CallExternalCanister,
        OperationKind::FundExternalCanister,
        OperationKind::MonitorExternalCanister,
        OperationKind::SnapshotExternalCanister,
        OperationKind::RestoreExternalCanister,
        OperationKind::PruneExternalCanister,
        OperationKind::EditPermission,
        OperationKind::AddRequestPolicy,
        OperationKind::EditRequestPolicy,
        OperationKind::RemoveRequestPolicy,
        OperationKind::ManageSystemInfo,
        OperationKind::SetDisasterRecovery,
        OperationKind::AddAsset,
        OperationKind::EditAsset,
        OperationKind::RemoveAsset,
        OperationKind::AddNamedRule,
        OperationKind::EditNamedRule,
        OperationKind::RemoveNamedRule,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Transfer => "Transfer",
            OperationKind::AddAccount => "AddAccount",
            OperationKind::EditAccount => "EditAccount",
            OperationKind::AddUser => "AddUser",
            OperationKind::EditUser => "EditUser",
            OperationKind::AddUserGroup => "AddUserGroup",
            OperationKind::EditUserGroup => "EditUserGroup",
            OperationKind::RemoveUserGroup => "RemoveUserGroup",
            OperationKind::AddAddressBookEntry => "AddAddressBookEntry",
            OperationKind::EditAddressBookEntry => "EditAddressBookEntry",
            OperationKind::RemoveAddressBookEntry => "RemoveAddressBookEntry",
            OperationKind::SystemUpgrade => "SystemUpgrade",
            OperationKind::SystemRestore => "SystemRestore",
            OperationKind::ChangeExternalCanister => "ChangeExternalCanister",
            OperationKind::ConfigureExternalCanister => "ConfigureExternalCanister",
            OperationKind::CreateExternalCanister => "CreateExternalCanister",
            OperationKind::CallExternalCanister => "CallExternalCanister",
            OperationKind::FundExternalCanister => "FundExternalCanister",
            OperationKind::MonitorExternalCanister => "MonitorExternalCanister",
            OperationKind::SnapshotExternalCanister => "SnapshotExternalCanister",
            OperationKind::RestoreExternalCanister => "RestoreExternalCanister",
            OperationKind::PruneExternalCanister => "PruneExternalCanister",
            OperationKind::EditPermission => "EditPermission",
            OperationKind::AddRequestPolicy => "AddRequestPolicy",
            OperationKind::EditRequestPolicy => "EditRequestPolicy",
            OperationKind::RemoveRequestPolicy => "RemoveRequestPolicy",
            OperationKind::ManageSystemInfo => "ManageSystemInfo",
            OperationKind::SetDisasterRecovery => "SetDisasterRecovery",
            OperationKind::AddAsset => "AddAsset",
            OperationKind::EditAsset => "EditAsset",
            OperationKind::RemoveAsset => "RemoveAsset",
            OperationKind::AddNamedRule => "AddNamedRule",
            OperationKind::EditNamedRule => "EditNamedRule",
            OperationKind::RemoveNamedRule => "RemoveNamedRule",
        }
    }

    /// Kinds whose filter carries an optional account or canister id.
    pub fn accepts_target(&self) -> bool {
        matches!(
            self,
            OperationKind::Transfer
                | OperationKind::ChangeExternalCanister
                | OperationKind::ConfigureExternalCanister
                | OperationKind::CallExternalCanister
                | OperationKind::FundExternalCanister
                | OperationKind::MonitorExternalCanister
                | OperationKind::SnapshotExternalCanister
                | OperationKind::RestoreExternalCanister
                | OperationKind::PruneExternalCanister
        )
    }
}

impl FromStr for OperationKind {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownTag {
                kind: "operation type",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `operation_types`. Targeted kinds serialize their target
/// (or `null` for "any"); the rest always serialize `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationType {
    pub kind: OperationKind,
    pub target: Option<String>,
}

impl OperationType {
    pub const fn any(kind: OperationKind) -> Self {
        Self { kind, target: None }
    }
}

impl Serialize for OperationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let target = if self.kind.accepts_target() {
            self.target.as_deref()
        } else {
            None
        };
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.kind.as_str(), &target)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct PaginationInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u16>,
}

/// Query accepted by `list_orbit_requests`. `None` fields are left out of
/// the payload entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ListRequestsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approver_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<RequestStatusCode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_types: Option<Vec<OperationType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_from_dt: Option<TimestampRFC3339>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_to_dt: Option<TimestampRFC3339>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_from_dt: Option<TimestampRFC3339>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_to_dt: Option<TimestampRFC3339>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paginate: Option<PaginationInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<ListRequestsSortBy>,
    pub only_approvable: bool,
    pub with_evaluation_results: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deduplication_keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListOrbitRequestsArgs {
    pub token_canister_id: String,
    pub filters: ListRequestsInput,
}

/// Status as reported in a request record: either a bare tag (`"Created"`)
/// or a variant carrying details (`{"Failed": {"reason": "..."}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireStatus {
    Tag(String),
    Variant(serde_json::Map<String, serde_json::Value>),
}

impl WireStatus {
    /// Splits the status into its code and the first textual detail it
    /// carries (a reason or a timestamp).
    pub fn resolve(&self) -> Result<(RequestStatusCode, Option<String>), UnknownTag> {
        match self {
            WireStatus::Tag(tag) => Ok((tag.parse()?, None)),
            WireStatus::Variant(map) => {
                let mut entries = map.iter();
                let (name, payload) = match (entries.next(), entries.next()) {
                    (Some(entry), None) => entry,
                    _ => {
                        return Err(UnknownTag {
                            kind: "request status",
                            value: serde_json::Value::Object(map.clone()).to_string(),
                        });
                    }
                };
                let code = name.parse()?;
                Ok((code, status_detail(payload)))
            }
        }
    }
}

fn status_detail(payload: &serde_json::Value) -> Option<String> {
    match payload {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Object(fields) => fields.values().find_map(status_detail),
        serde_json::Value::Array(items) => items.iter().find_map(status_detail),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireApproval {
    pub approver_id: String,
    pub status: WireStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    #[serde(default)]
    pub decided_at: WireNat,
}

/// A request record exactly as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub status: WireStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub operation_type: String,
    #[serde(default)]
    pub requested_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_name: Option<String>,
    #[serde(default)]
    pub created_at: WireNat,
    #[serde(default)]
    pub expires_at: WireNat,
    #[serde(default)]
    pub yes_votes: WireNat,
    #[serde(default)]
    pub no_votes: WireNat,
    #[serde(default)]
    pub total_voting_power: WireNat,
    #[serde(default)]
    pub approvals: Vec<WireApproval>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRequestsResponse {
    #[serde(default)]
    pub requests: Vec<WireRequest>,
    #[serde(default)]
    pub total: WireNat,
    #[serde(default)]
    pub next_offset: Option<WireNat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ListRequestsResult {
    Ok(ListRequestsResponse),
    Err(String),
}
