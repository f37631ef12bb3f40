//! Wire types for the DAOPad backend's Orbit Station proxy.
//!
//! The backend speaks a tagged-union encoding: enum values travel as
//! single-entry objects (`{"Created": null}`), optional fields are omitted
//! rather than sent as `null`, and 64-bit integers may arrive as decimal
//! strings.

pub mod decisions;
pub mod error;
pub mod nat;
pub mod requests;

pub use decisions::{ActionResult, ApprovalDecision, SubmitRequestApprovalArgs, VoteOnOrbitRequestArgs};
pub use error::{BackendError, ErrorDetail, codes};
pub use nat::{InvalidNat, WireNat};
pub use requests::{
    ListOrbitRequestsArgs, ListRequestsInput, ListRequestsResponse, ListRequestsResult,
    ListRequestsSortBy, OperationKind, OperationType, PaginationInput, RequestStatusCode,
    SortDirection, SortField, TimestampRFC3339, UnknownTag, WireApproval, WireRequest, WireStatus,
};
