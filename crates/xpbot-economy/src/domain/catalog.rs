//! # Perk Catalog
//!
//! The static weighted table of crate rewards and the draw walk over it.
//!
//! ## Invariants
//!
//! - The catalog is immutable at runtime; only the per-perk draw counters
//!   (stored separately, see `PerkStats`) ever change.
//! - Every entry has a positive, finite weight. Weights are relative and
//!   need not sum to 100; the draw normalizes against their sum.
//! - Entry ids are stable slugs assigned at definition time and used
//!   directly as confirmation/button token payloads, so there is no lossy
//!   re-encoding of display names to reverse-lookup later.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerkId(pub String);

impl PerkId {
    pub fn new(slug: impl Into<String>) -> Self {
        PerkId(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PerkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a perk does once equipped.
///
/// Closed set: the one call site that applies effects matches exhaustively,
/// so a new effect kind is a compile-time-checked extension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PerkEffect {
    /// Informational XP multiplier. Stored and displayed; not applied to
    /// accrual by this engine.
    XpBoost { multiplier: f64 },
    /// An external role-like entitlement to grant on equip and revoke on
    /// unequip. The id is opaque to the ledger.
    RoleGrant { role_id: u64 },
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerkDef {
    /// Stable slug used in tokens and storage keys.
    pub id: PerkId,
    /// Human-readable display name.
    pub name: String,
    /// Relative draw weight, > 0 and finite.
    pub weight: f64,
    /// Effect descriptor.
    pub effect: PerkEffect,
}

impl PerkDef {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        weight: f64,
        effect: PerkEffect,
    ) -> Self {
        Self {
            id: PerkId::new(id),
            name: name.into(),
            weight,
            effect,
        }
    }
}

/// A malformed catalog definition, rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidCatalog {
    Empty,
    NonPositiveWeight { id: String },
    DuplicateId { id: String },
}

impl fmt::Display for InvalidCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidCatalog::Empty => write!(f, "Perk catalog must have at least one entry"),
            InvalidCatalog::NonPositiveWeight { id } => {
                write!(f, "Perk {:?} has a non-positive or non-finite weight", id)
            }
            InvalidCatalog::DuplicateId { id } => {
                write!(f, "Perk id {:?} appears more than once", id)
            }
        }
    }
}

impl std::error::Error for InvalidCatalog {}

/// The fixed, ordered weighted table of rewards.
#[derive(Debug, Clone)]
pub struct PerkCatalog {
    entries: Vec<PerkDef>,
    total_weight: f64,
}

impl PerkCatalog {
    /// Build a catalog, validating weights and id uniqueness.
    pub fn new(entries: Vec<PerkDef>) -> Result<Self, InvalidCatalog> {
        if entries.is_empty() {
            return Err(InvalidCatalog::Empty);
        }
        let mut seen = std::collections::HashSet::new();
        for entry in &entries {
            if !(entry.weight.is_finite() && entry.weight > 0.0) {
                return Err(InvalidCatalog::NonPositiveWeight {
                    id: entry.id.0.clone(),
                });
            }
            if !seen.insert(entry.id.clone()) {
                return Err(InvalidCatalog::DuplicateId {
                    id: entry.id.0.clone(),
                });
            }
        }
        let total_weight = entries.iter().map(|e| e.weight).sum();
        Ok(Self {
            entries,
            total_weight,
        })
    }

    /// Sum of all entry weights (the draw range upper bound).
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Entries in declared order.
    pub fn entries(&self) -> &[PerkDef] {
        &self.entries
    }

    /// Look up an entry by its stable id.
    pub fn get(&self, id: &PerkId) -> Option<&PerkDef> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Resolve a draw point `r` taken uniformly from `[0, total_weight)`.
    ///
    /// Walks the declared order accumulating weight and returns the first
    /// entry whose cumulative range contains `r`. The upper bound of each
    /// range is exclusive, so a point landing exactly on a boundary belongs
    /// to the entry it is entering, not the one it is leaving.
    ///
    /// A point that exhausts the walk (possible only through floating-point
    /// edge cases in the caller's `r`) falls back to the first entry.
    pub fn draw_at(&self, r: f64) -> &PerkDef {
        let mut cumulative = 0.0;
        for entry in &self.entries {
            cumulative += entry.weight;
            if r < cumulative {
                return entry;
            }
        }
        // Deterministic fallback for out-of-range draw points.
        &self.entries[0]
    }
}

/// The catalog shipped with the bot.
///
/// Common perks are plain XP boosts; the rare tail grants chat-platform
/// roles. Weights are relative (they happen to sum to 100 here, but the
/// draw does not rely on that).
pub fn default_catalog() -> PerkCatalog {
    PerkCatalog::new(vec![
        PerkDef::new(
            "xp-boost-2x",
            "XP Boost x2",
            50.0,
            PerkEffect::XpBoost { multiplier: 2.0 },
        ),
        PerkDef::new(
            "xp-boost-3x",
            "XP Boost x3",
            30.0,
            PerkEffect::XpBoost { multiplier: 3.0 },
        ),
        PerkDef::new(
            "role-high-roller",
            "High Roller",
            15.0,
            PerkEffect::RoleGrant {
                role_id: 930_411_226_109_448_252,
            },
        ),
        PerkDef::new(
            "role-crate-baron",
            "Crate Baron",
            5.0,
            PerkEffect::RoleGrant {
                role_id: 930_411_312_747_268_131,
            },
        ),
    ])
    .expect("default catalog is well-formed")
}
