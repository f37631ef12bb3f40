//! Logical request domains and the operation types each one covers.

use crate::models::Request;
use daopad_orbit::{OperationKind, OperationType};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Domain {
    #[default]
    All,
    Accounts,
    Transfers,
    Users,
    AddressBook,
    ExternalCanisters,
    System,
    Assets,
}

const ACCOUNTS: &[OperationType] = &[
    OperationType::any(OperationKind::AddAccount),
    OperationType::any(OperationKind::EditAccount),
];

const TRANSFERS: &[OperationType] = &[OperationType::any(OperationKind::Transfer)];

const USERS: &[OperationType] = &[
    OperationType::any(OperationKind::AddUser),
    OperationType::any(OperationKind::EditUser),
    OperationType::any(OperationKind::AddUserGroup),
    OperationType::any(OperationKind::EditUserGroup),
    OperationType::any(OperationKind::RemoveUserGroup),
];

const ADDRESS_BOOK: &[OperationType] = &[
    OperationType::any(OperationKind::AddAddressBookEntry),
    OperationType::any(OperationKind::EditAddressBookEntry),
    OperationType::any(OperationKind::RemoveAddressBookEntry),
];

const EXTERNAL_CANISTERS: &[OperationType] = &[
    OperationType::any(OperationKind::CreateExternalCanister),
    OperationType::any(OperationKind::ChangeExternalCanister),
    OperationType::any(OperationKind::ConfigureExternalCanister),
    OperationType::any(OperationKind::CallExternalCanister),
    OperationType::any(OperationKind::FundExternalCanister),
    OperationType::any(OperationKind::MonitorExternalCanister),
    OperationType::any(OperationKind::SnapshotExternalCanister),
    OperationType::any(OperationKind::RestoreExternalCanister),
    OperationType::any(OperationKind::PruneExternalCanister),
];

const SYSTEM: &[OperationType] = &[
    OperationType::any(OperationKind::SystemUpgrade),
    OperationType::any(OperationKind::SystemRestore),
    OperationType::any(OperationKind::ManageSystemInfo),
    OperationType::any(OperationKind::SetDisasterRecovery),
    OperationType::any(OperationKind::EditPermission),
    OperationType::any(OperationKind::AddRequestPolicy),
    OperationType::any(OperationKind::EditRequestPolicy),
    OperationType::any(OperationKind::RemoveRequestPolicy),
    OperationType::any(OperationKind::AddNamedRule),
    OperationType::any(OperationKind::EditNamedRule),
    OperationType::any(OperationKind::RemoveNamedRule),
];

const ASSETS: &[OperationType] = &[
    OperationType::any(OperationKind::AddAsset),
    OperationType::any(OperationKind::EditAsset),
    OperationType::any(OperationKind::RemoveAsset),
];

impl Domain {
    pub const ALL: [Domain; 8] = [
        Domain::All,
        Domain::Accounts,
        Domain::Transfers,
        Domain::Users,
        Domain::AddressBook,
        Domain::ExternalCanisters,
        Domain::System,
        Domain::Assets,
    ];

    /// Operation types belonging to the domain. Empty for `All`, which
    /// places no restriction on the query.
    pub fn operation_types(&self) -> &'static [OperationType] {
        match self {
            Domain::All => &[],
            Domain::Accounts => ACCOUNTS,
            Domain::Transfers => TRANSFERS,
            Domain::Users => USERS,
            Domain::AddressBook => ADDRESS_BOOK,
            Domain::ExternalCanisters => EXTERNAL_CANISTERS,
            Domain::System => SYSTEM,
            Domain::Assets => ASSETS,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Domain::All => "All Requests",
            Domain::Accounts => "Accounts",
            Domain::Transfers => "Transfers",
            Domain::Users => "Users",
            Domain::AddressBook => "Address Book",
            Domain::ExternalCanisters => "External Canisters",
            Domain::System => "System",
            Domain::Assets => "Assets",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Domain::All => "all",
            Domain::Accounts => "accounts",
            Domain::Transfers => "transfers",
            Domain::Users => "users",
            Domain::AddressBook => "address-book",
            Domain::ExternalCanisters => "external-canisters",
            Domain::System => "system",
            Domain::Assets => "assets",
        }
    }

    /// Domain an operation tag belongs to; `All` for tags no domain claims.
    pub fn classify(operation_type: &str) -> Domain {
        let Ok(kind) = operation_type.parse::<OperationKind>() else {
            return Domain::All;
        };
        Domain::ALL
            .into_iter()
            .skip(1)
            .find(|domain| domain.operation_types().iter().any(|op| op.kind == kind))
            .unwrap_or(Domain::All)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown domain {0:?}")]
pub struct UnknownDomain(pub String);

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Domain::ALL
            .into_iter()
            .find(|domain| {
                domain.slug() == needle || domain.slug().replace('-', "") == needle
            })
            .ok_or_else(|| UnknownDomain(s.to_string()))
    }
}

/// Number of requests per domain. `All` counts every request; a request
/// whose operation no domain claims only counts towards `All`.
pub fn counts_by_domain(requests: &[Request]) -> BTreeMap<Domain, usize> {
    let mut counts: BTreeMap<Domain, usize> = Domain::ALL.into_iter().map(|d| (d, 0)).collect();
    for request in requests {
        *counts.entry(Domain::All).or_default() += 1;
        let domain = Domain::classify(&request.operation_type);
        if domain != Domain::All {
            *counts.entry(domain).or_default() += 1;
        }
    }
    counts
}
