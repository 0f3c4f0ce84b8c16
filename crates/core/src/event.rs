//! Domain events returned by mutating operations.
//!
//! Events carry typed identifiers only. Turning them into topics and
//! delivering them is left to whoever consumes them.

use coopledger_shared::types::{
    AccountId, BranchId, InterestBatchId, LedgerEntryId, MemberLedgerSummaryId, MemberProfileId,
    OrganizationId,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The entity was inserted.
    Created,
    /// The entity was changed.
    Updated,
    /// The entity was deleted.
    Deleted,
}

/// The entity an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum EntityRef {
    /// An account.
    Account {
        /// Owning organization.
        organization_id: OrganizationId,
        /// Owning branch.
        branch_id: BranchId,
        /// The account.
        account_id: AccountId,
    },
    /// A ledger entry.
    LedgerEntry {
        /// Owning organization.
        organization_id: OrganizationId,
        /// Owning branch.
        branch_id: BranchId,
        /// Posted account.
        account_id: AccountId,
        /// Member, if the entry carries one.
        member_profile_id: Option<MemberProfileId>,
        /// The entry.
        entry_id: LedgerEntryId,
    },
    /// A member ledger summary.
    MemberLedgerSummary {
        /// Owning organization.
        organization_id: OrganizationId,
        /// Owning branch.
        branch_id: BranchId,
        /// Member.
        member_profile_id: MemberProfileId,
        /// Account.
        account_id: AccountId,
        /// The summary row.
        summary_id: MemberLedgerSummaryId,
    },
    /// An interest batch.
    InterestBatch {
        /// Owning organization.
        organization_id: OrganizationId,
        /// Owning branch.
        branch_id: BranchId,
        /// The batch.
        batch_id: InterestBatchId,
    },
}

impl EntityRef {
    /// Id of the entity itself.
    #[must_use]
    pub fn entity_id(&self) -> Uuid {
        match self {
            Self::Account { account_id, .. } => account_id.into_inner(),
            Self::LedgerEntry { entry_id, .. } => entry_id.into_inner(),
            Self::MemberLedgerSummary { summary_id, .. } => summary_id.into_inner(),
            Self::InterestBatch { batch_id, .. } => batch_id.into_inner(),
        }
    }

    /// Enclosing scope ids, outermost first.
    #[must_use]
    pub fn scope_ids(&self) -> Vec<Uuid> {
        match *self {
            Self::Account {
                organization_id,
                branch_id,
                ..
            }
            | Self::InterestBatch {
                organization_id,
                branch_id,
                ..
            } => vec![organization_id.into_inner(), branch_id.into_inner()],
            Self::LedgerEntry {
                organization_id,
                branch_id,
                account_id,
                member_profile_id,
                ..
            } => {
                let mut ids = vec![
                    organization_id.into_inner(),
                    branch_id.into_inner(),
                    account_id.into_inner(),
                ];
                ids.extend(member_profile_id.map(MemberProfileId::into_inner));
                ids
            }
            Self::MemberLedgerSummary {
                organization_id,
                branch_id,
                member_profile_id,
                account_id,
                ..
            } => vec![
                organization_id.into_inner(),
                branch_id.into_inner(),
                member_profile_id.into_inner(),
                account_id.into_inner(),
            ],
        }
    }
}

/// A change to a persisted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// What happened.
    pub kind: EventKind,
    /// What it happened to.
    pub entity: EntityRef,
}

impl LedgerEvent {
    /// A created event.
    #[must_use]
    pub const fn created(entity: EntityRef) -> Self {
        Self {
            kind: EventKind::Created,
            entity,
        }
    }

    /// An updated event.
    #[must_use]
    pub const fn updated(entity: EntityRef) -> Self {
        Self {
            kind: EventKind::Updated,
            entity,
        }
    }

    /// A deleted event.
    #[must_use]
    pub const fn deleted(entity: EntityRef) -> Self {
        Self {
            kind: EventKind::Deleted,
            entity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_entry_scope_ids_are_ordered() {
        let org = OrganizationId::new();
        let branch = BranchId::new();
        let account = AccountId::new();
        let member = MemberProfileId::new();
        let entry = LedgerEntryId::new();
        let event = LedgerEvent::created(EntityRef::LedgerEntry {
            organization_id: org,
            branch_id: branch,
            account_id: account,
            member_profile_id: Some(member),
            entry_id: entry,
        });

        assert_eq!(event.kind, EventKind::Created);
        assert_eq!(event.entity.entity_id(), entry.into_inner());
        assert_eq!(
            event.entity.scope_ids(),
            vec![
                org.into_inner(),
                branch.into_inner(),
                account.into_inner(),
                member.into_inner()
            ]
        );
    }

    #[test]
    fn test_scope_ids_are_deterministic() {
        let entity = EntityRef::InterestBatch {
            organization_id: OrganizationId::new(),
            branch_id: BranchId::new(),
            batch_id: InterestBatchId::new(),
        };
        assert_eq!(entity.scope_ids(), entity.scope_ids());
        assert_eq!(entity.scope_ids().len(), 2);
    }

    #[test]
    fn test_event_serializes_with_entity_tag() {
        let event = LedgerEvent::deleted(EntityRef::Account {
            organization_id: OrganizationId::new(),
            branch_id: BranchId::new(),
            account_id: AccountId::new(),
        });
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["kind"], "deleted");
        assert_eq!(json["entity"]["entity"], "account");
    }
}
