//! Event kinds emitted by the investment handler contract and the records
//! the indexer stores for them.
//!
//! Topics mirror `contracts/investment_handler/src/events.rs` and
//! `contracts/investment_handler/src/rbac.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the investment handler contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// `created`
    RoundCreated,
    /// `phase`
    PhaseChanged,
    /// `rwd_tok`
    RewardTokenSet,
    /// `rwd_alloc`
    RewardAllocationSet,
    /// `invested`
    Invested,
    /// `deposited`
    RewardDeposited,
    /// `claimed`
    Claimed,
    /// `withdrawn`
    PaymentWithdrawn,
    /// `lnk_add`
    LinkAdded,
    /// `lnk_del`
    LinkRemoved,
    /// `role_set`
    RoleSet,
    /// `role_del`
    RoleDel,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::RoundCreated,
            "phase" => Self::PhaseChanged,
            "rwd_tok" => Self::RewardTokenSet,
            "rwd_alloc" => Self::RewardAllocationSet,
            "invested" => Self::Invested,
            "deposited" => Self::RewardDeposited,
            "claimed" => Self::Claimed,
            "withdrawn" => Self::PaymentWithdrawn,
            "lnk_add" => Self::LinkAdded,
            "lnk_del" => Self::LinkRemoved,
            "role_set" => Self::RoleSet,
            "role_del" => Self::RoleDel,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoundCreated => "round_created",
            Self::PhaseChanged => "phase_changed",
            Self::RewardTokenSet => "reward_token_set",
            Self::RewardAllocationSet => "reward_allocation_set",
            Self::Invested => "invested",
            Self::RewardDeposited => "reward_deposited",
            Self::Claimed => "claimed",
            Self::PaymentWithdrawn => "payment_withdrawn",
            Self::LinkAdded => "link_added",
            Self::LinkRemoved => "link_removed",
            Self::RoleSet => "role_set",
            Self::RoleDel => "role_del",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the second topic is a round ID (as opposed to an address).
    pub fn keyed_by_round(&self) -> bool {
        matches!(
            self,
            Self::RoundCreated
                | Self::PhaseChanged
                | Self::RewardTokenSet
                | Self::RewardAllocationSet
                | Self::Invested
                | Self::RewardDeposited
                | Self::Claimed
                | Self::PaymentWithdrawn
        )
    }
}

/// A fully decoded contract event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerEvent {
    pub event_type: String,
    /// RPC event id; unique per contract event.
    pub event_id: Option<String>,
    pub round_id: Option<String>,
    /// Canonical identity the event concerns (investor, link owner, role holder).
    pub identity: Option<String>,
    /// Wallet or operator that acted (caller, depositor, recipient, delegate).
    pub actor: Option<String>,
    pub amount: Option<String>,
    /// Kind-specific extra value: new phase, reward token, signer, role.
    pub detail: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// An event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub event_id: Option<String>,
    pub round_id: Option<String>,
    pub identity: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub detail: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}
