use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier used for partitions and coupling-graph items.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id(NonZeroU32);

impl Id {
    /// Largest representable 0-based index.
    pub const MAX_INDEX: u32 = u32::MAX - 1;

    /// Create an Id from a 0-based index by storing index+1.
    ///
    /// Saturates at `u32::MAX - 1`.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Like [`Id::from_index`], but `None` past [`Id::MAX_INDEX`].
    pub fn try_from_index(index: u32) -> Option<Self> {
        index.checked_add(1).and_then(NonZeroU32::new).map(Self)
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Domain-specific ID aliases for clarity (no runtime cost).
pub type VertexId = Id;
pub type EdgeId = Id;
pub type PartitionId = Id;

/// Identifier of a degree of freedom that lives on a partition interface.
///
/// Two partitions are coupled exactly when they expose the same
/// `InterfaceDof`; the value is opaque and only compared/hashed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterfaceDof(pub u64);

impl fmt::Display for InterfaceDof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip_index() {
        for i in [0_u32, 1, 2, 42, 10_000] {
            let id = Id::from_index(i);
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn checked_ids_stop_at_the_last_index() {
        assert_eq!(Id::try_from_index(5), Some(Id::from_index(5)));
        assert_eq!(Id::try_from_index(Id::MAX_INDEX).map(Id::index), Some(Id::MAX_INDEX));
        assert_eq!(Id::try_from_index(u32::MAX), None);
        assert_eq!(Id::from_index(u32::MAX).index(), Id::MAX_INDEX);
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<Id>(),
            core::mem::size_of::<Option<Id>>()
        );
    }

    #[test]
    fn ids_order_by_index() {
        assert!(Id::from_index(1) < Id::from_index(2));
        assert!(InterfaceDof(3) > InterfaceDof(1));
    }
}
