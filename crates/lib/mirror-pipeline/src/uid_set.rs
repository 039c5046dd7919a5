//! Sets of UIDs in IMAP sequence-set syntax.

use std::collections::BTreeSet;

/// An ordered set of UIDs, rendered in compressed range form (`1:3,5`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UidSet(BTreeSet<u32>);

impl UidSet {
    /// Add a UID to the set.
    pub fn insert(&mut self, uid: u32) -> bool {
        self.0.insert(uid)
    }

    /// Number of UIDs in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the UID is in the set.
    pub fn contains(&self, uid: u32) -> bool {
        self.0.contains(&uid)
    }

    /// UIDs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Contiguous inclusive ranges in ascending order.
    pub fn ranges(&self) -> Vec<(u32, u32)> {
        let mut ranges: Vec<(u32, u32)> = Vec::new();
        for uid in self.iter() {
            match ranges.last_mut() {
                Some((_, end)) if end.checked_add(1) == Some(uid) => *end = uid,
                _ => ranges.push((uid, uid)),
            }
        }
        ranges
    }
}

impl FromIterator<u32> for UidSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for UidSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (start, end)) in self.ranges().into_iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if start == end {
                write!(f, "{start}")?;
            } else {
                write!(f, "{start}:{end}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_ranges() {
        let set: UidSet = [5, 1, 2, 3, 9, 10].into_iter().collect();
        assert_eq!(set.to_string(), "1:3,5,9:10");
        assert_eq!(set.len(), 6);
    }

    #[test]
    fn single_and_empty() {
        assert_eq!(UidSet::default().to_string(), "");
        assert!(UidSet::default().is_empty());

        let set: UidSet = [42].into_iter().collect();
        assert_eq!(set.to_string(), "42");
    }

    #[test]
    fn max_uid_does_not_overflow() {
        let set: UidSet = [u32::MAX - 1, u32::MAX].into_iter().collect();
        assert_eq!(set.to_string(), format!("{}:{}", u32::MAX - 1, u32::MAX));
    }
}
