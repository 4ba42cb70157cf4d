use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One claimant's input to a proration run.
///
/// The field aliases accept the investor-oriented names used by the original
/// allocation portal (`name`, `average_amount`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Unique key of the claim within a request
    #[serde(alias = "name")]
    pub id: String,
    /// Amount asked for; the hard cap on what the claim can receive
    pub requested_amount: f64,
    /// Proration basis, e.g. a historical average amount
    #[serde(alias = "average_amount")]
    pub weight: f64,
}

impl Claim {
    /// Create a claim
    #[must_use]
    pub fn new(id: impl Into<String>, requested_amount: f64, weight: f64) -> Self {
        Self { id: id.into(), requested_amount, weight }
    }
}

/// A pool to distribute and the ordered claims competing for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Total amount available
    #[serde(alias = "allocation_amount")]
    pub pool: f64,
    /// Claims in caller order; the order is preserved in the result
    #[serde(alias = "investor_amounts")]
    pub claims: Vec<Claim>,
}

impl AllocationRequest {
    /// Create a request
    #[must_use]
    pub const fn new(pool: f64, claims: Vec<Claim>) -> Self {
        Self { pool, claims }
    }

    /// The sample offering shown by the allocation portal: a pool of 100
    /// shared by two investors asking for 150 and 50.
    #[must_use]
    pub fn example() -> Self {
        Self::new(
            100.0,
            vec![Claim::new("Investor A", 150.0, 100.0), Claim::new("Investor B", 50.0, 25.0)],
        )
    }

    /// Sum of all requested amounts
    #[must_use]
    pub fn total_requested(&self) -> f64 {
        self.claims.iter().map(|c| c.requested_amount).sum()
    }

    /// Whether demand exceeds the pool
    #[must_use]
    pub fn is_oversubscribed(&self) -> bool {
        self.total_requested() > self.pool
    }
}

/// The amount granted to a single claim.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimAllocation {
    /// Id of the claim this amount belongs to
    pub id: String,
    /// Allocated amount, rounded to cents
    pub amount: f64,
}

/// Result of a proration run: claim id to allocated amount, in claim order.
///
/// Serializes as a flat JSON object `{"<id>": <amount>, ...}`. Entries are kept
/// exactly as produced; duplicate ids are not merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allocations {
    entries: Vec<ClaimAllocation>,
}

impl Allocations {
    /// Create an empty mapping with room for `capacity` claims
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    /// Append an allocation
    pub fn push(&mut self, id: impl Into<String>, amount: f64) {
        self.entries.push(ClaimAllocation { id: id.into(), amount });
    }

    /// Amount allocated to `id`, first match wins
    #[must_use]
    pub fn get(&self, id: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.amount)
    }

    /// Iterate allocations in claim order
    pub fn iter(&self) -> std::slice::Iter<'_, ClaimAllocation> {
        self.entries.iter()
    }

    /// Number of allocations
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was allocated to anyone
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total allocated across all claims
    #[must_use]
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.amount).sum()
    }
}

impl<'a> IntoIterator for &'a Allocations {
    type Item = &'a ClaimAllocation;
    type IntoIter = std::slice::Iter<'a, ClaimAllocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(String, f64)> for Allocations {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(id, amount)| ClaimAllocation { id, amount }).collect(),
        }
    }
}

impl Serialize for Allocations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.id, &entry.amount)?;
        }
        map.end()
    }
}

struct AllocationsVisitor;

impl<'de> Visitor<'de> for AllocationsVisitor {
    type Value = Allocations;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of claim id to allocated amount")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut allocations = Allocations::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((id, amount)) = access.next_entry::<String, f64>()? {
            allocations.push(id, amount);
        }
        Ok(allocations)
    }
}

impl<'de> Deserialize<'de> for Allocations {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AllocationsVisitor)
    }
}
