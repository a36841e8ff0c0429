//! Core tract vocabulary: identifiers, race/ethnicity groups and
//! majority-category labels.

use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Canonical census tract identifier.
///
/// Parsed from the numeric string form used by both sources, so leading
/// zeros, surrounding quotes and a `.0` suffix all normalize to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TractId(u64);

impl TractId {
    /// Normalizes a raw identifier cell. Returns `None` when the cell is not
    /// a plain unsigned number.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().trim_matches('"').trim();
        let digits = match trimmed.split_once('.') {
            Some((int, frac)) if frac.chars().all(|c| c == '0') => int,
            Some(_) => return None,
            None => trimmed,
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(TractId)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of race/ethnicity categories, declared in classification
/// precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    White,
    Black,
    /// Asian and Native Hawaiian/Pacific Islander combined.
    Aapi,
    Aian,
    /// Some other race and two or more races combined.
    Multiracial,
    HispanicLatino,
}

impl Group {
    pub const ALL: [Group; 6] = [
        Group::White,
        Group::Black,
        Group::Aapi,
        Group::Aian,
        Group::Multiracial,
        Group::HispanicLatino,
    ];

    /// Display label, e.g. `"Hispanic/Latino"`.
    pub fn label(&self) -> &'static str {
        match self {
            Group::White => "White",
            Group::Black => "Black",
            Group::Aapi => "AAPI",
            Group::Aian => "AIAN",
            Group::Multiracial => "Multiracial",
            Group::HispanicLatino => "Hispanic/Latino",
        }
    }

    /// Column-safe name used when flattening per-group values into tables.
    pub fn column(&self) -> &'static str {
        match self {
            Group::White => "white",
            Group::Black => "black",
            Group::Aapi => "aapi",
            Group::Aian => "aian",
            Group::Multiracial => "multiracial",
            Group::HispanicLatino => "hispanic_latino",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Group {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One value per [`Group`], indexable by group.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerGroup<T>([T; 6]);

impl<T: Copy> PerGroup<T> {
    #[cfg(test)]
    pub fn from_fn(mut f: impl FnMut(Group) -> T) -> Self {
        PerGroup(Group::ALL.map(&mut f))
    }

    /// Iterates `(group, value)` pairs in precedence order.
    pub fn iter(&self) -> impl Iterator<Item = (Group, T)> + '_ {
        Group::ALL.iter().map(move |g| (*g, self.0[g.index()]))
    }
}

impl<T> Index<Group> for PerGroup<T> {
    type Output = T;

    fn index(&self, group: Group) -> &T {
        &self.0[group.index()]
    }
}

impl<T> IndexMut<Group> for PerGroup<T> {
    fn index_mut(&mut self, group: Group) -> &mut T {
        &mut self.0[group.index()]
    }
}

/// Population counts per group.
pub type GroupCounts = PerGroup<u64>;

/// Population shares per group, each in `[0, 1]` for well-formed data.
pub type GroupShares = PerGroup<f64>;

/// The single label assigned to every eligible tract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MajorityCategory {
    Majority(Group),
    RaciallyDiverse,
}

impl MajorityCategory {
    /// All labels in reporting order.
    pub fn all() -> impl Iterator<Item = MajorityCategory> {
        Group::ALL
            .into_iter()
            .map(MajorityCategory::Majority)
            .chain(std::iter::once(MajorityCategory::RaciallyDiverse))
    }
}

impl fmt::Display for MajorityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MajorityCategory::Majority(group) => write!(f, "Majority {}", group.label()),
            MajorityCategory::RaciallyDiverse => f.write_str("Racially Diverse"),
        }
    }
}

impl Serialize for MajorityCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tract_id_normalizes_formatting() {
        let a = TractId::parse("06037101110").unwrap();
        let b = TractId::parse(" 6037101110 ").unwrap();
        let c = TractId::parse("\"6037101110\"").unwrap();
        let d = TractId::parse("6037101110.0").unwrap();

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a, d);
        assert_eq!(a.to_string(), "6037101110");
    }

    #[test]
    fn test_tract_id_rejects_non_numeric() {
        assert!(TractId::parse("").is_none());
        assert!(TractId::parse("abc").is_none());
        assert!(TractId::parse("-12").is_none());
        assert!(TractId::parse("12.5").is_none());
        assert!(TractId::parse("1400000US06037101110").is_none());
    }

    #[test]
    fn test_group_order_is_precedence_order() {
        let mut sorted = Group::ALL;
        sorted.sort();
        assert_eq!(sorted, Group::ALL);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(
            MajorityCategory::Majority(Group::Black).to_string(),
            "Majority Black"
        );
        assert_eq!(
            MajorityCategory::Majority(Group::HispanicLatino).to_string(),
            "Majority Hispanic/Latino"
        );
        assert_eq!(MajorityCategory::RaciallyDiverse.to_string(), "Racially Diverse");
        assert_eq!(MajorityCategory::all().count(), 7);
    }

    #[test]
    fn test_per_group_indexing() {
        let mut counts = GroupCounts::default();
        counts[Group::Aian] = 12;
        assert_eq!(counts[Group::Aian], 12);
        assert_eq!(counts[Group::White], 0);
        assert_eq!(counts.iter().map(|(_, v)| v).sum::<u64>(), 12);
    }
}
