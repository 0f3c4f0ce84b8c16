//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `MemberProfileId` where an `AccountId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a back-office user.");
typed_id!(OrganizationId, "Unique identifier for a cooperative organization.");
typed_id!(BranchId, "Unique identifier for a branch of an organization.");
typed_id!(AccountId, "Unique identifier for a chart of accounts entry.");
typed_id!(MemberProfileId, "Unique identifier for a member profile.");
typed_id!(MemberTypeId, "Unique identifier for a member classification.");
typed_id!(LedgerEntryId, "Unique identifier for a general ledger entry.");
typed_id!(AccountSnapshotId, "Unique identifier for an account history row.");
typed_id!(
    MemberLedgerSummaryId,
    "Unique identifier for a per-member account summary."
);
typed_id!(InterestBatchId, "Unique identifier for an interest computation run.");
typed_id!(
    InterestBatchEntryId,
    "Unique identifier for one member/account line of an interest run."
);

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
