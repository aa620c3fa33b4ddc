use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::VersionError;

/// A `year.release[.patch]` tool version such as `2025.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolVersion {
    year: u16,
    release: u8,
    patch: u8,
}

impl ToolVersion {
    pub const fn new(year: u16, release: u8) -> Self {
        Self { year, release, patch: 0 }
    }

    pub const fn with_patch(self, patch: u8) -> Self {
        Self { patch, ..self }
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn release(&self) -> u8 {
        self.release
    }

    pub fn patch(&self) -> u8 {
        self.patch
    }
}

impl FromStr for ToolVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || VersionError::Malformed(s.to_string());
        let mut parts = s.split('.');
        let year = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
        let release = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
        let patch = match parts.next() {
            Some(p) => p.parse().map_err(|_| malformed())?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(Self { year, release, patch })
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.year, self.release)?;
        if self.patch != 0 {
            write!(f, ".{}", self.patch)?;
        }
        Ok(())
    }
}

impl Serialize for ToolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Half-open version range `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    from: ToolVersion,
    to: ToolVersion,
}

impl VersionRange {
    pub const fn new(from: ToolVersion, to: ToolVersion) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> ToolVersion {
        self.from
    }

    pub fn to(&self) -> ToolVersion {
        self.to
    }

    pub fn contains(&self, version: ToolVersion) -> bool {
        self.from <= version && version < self.to
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.from, self.to)
    }
}

pub const V2019_1: ToolVersion = ToolVersion::new(2019, 1);
pub const V2023_2: ToolVersion = ToolVersion::new(2023, 2);
pub const V2025_1: ToolVersion = ToolVersion::new(2025, 1);
pub const V2030_1: ToolVersion = ToolVersion::new(2030, 1);

/// Versions the bundled catalogs describe.
pub const SUPPORTED: VersionRange = VersionRange::new(V2019_1, V2030_1);

/// Ordered list of child specifications, optionally selected by tool version.
#[derive(Debug)]
pub enum Catalog<T: 'static> {
    Fixed(&'static [T]),
    Versioned(&'static [(VersionRange, &'static [T])]),
}

impl<T> Catalog<T> {
    pub const EMPTY: Self = Catalog::Fixed(&[]);

    /// Picks the entries for `version`.
    ///
    /// Versions below the first range use the oldest list; newer or unknown
    /// versions use the newest list.
    pub fn resolve(&self, version: Option<ToolVersion>) -> &'static [T] {
        match *self {
            Catalog::Fixed(entries) => entries,
            Catalog::Versioned(ranges) => {
                let (Some(first), Some(last)) = (ranges.first(), ranges.last()) else {
                    return &[];
                };
                let Some(version) = version else {
                    return last.1;
                };
                ranges
                    .iter()
                    .find(|(range, _)| range.contains(version))
                    .map(|(_, entries)| *entries)
                    .unwrap_or(if version < first.0.from() { first.1 } else { last.1 })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OLD: &[u8] = &[1];
    const NEW: &[u8] = &[2];
    const RANGES: &[(VersionRange, &[u8])] = &[
        (VersionRange::new(V2019_1, V2023_2), OLD),
        (VersionRange::new(V2023_2, V2030_1), NEW),
    ];

    #[test]
    fn test_parse_and_display() {
        let version: ToolVersion = "2025.1".parse().unwrap();
        assert_eq!(version, ToolVersion::new(2025, 1));
        assert_eq!(version.to_string(), "2025.1");

        let patched: ToolVersion = "2019.1.3".parse().unwrap();
        assert_eq!(patched, V2019_1.with_patch(3));
        assert_eq!(patched.to_string(), "2019.1.3");

        assert!("2025".parse::<ToolVersion>().is_err());
        assert!("v2025.1".parse::<ToolVersion>().is_err());
        assert!("2025.1.1.1".parse::<ToolVersion>().is_err());
    }

    #[test]
    fn test_ranges_are_half_open() {
        let range = VersionRange::new(V2019_1, V2023_2);
        assert!(range.contains(V2019_1));
        assert!(range.contains(ToolVersion::new(2023, 1).with_patch(2)));
        assert!(!range.contains(V2023_2));
    }

    #[test]
    fn test_catalog_resolution() {
        let catalog: Catalog<u8> = Catalog::Versioned(RANGES);
        assert_eq!(catalog.resolve(Some(ToolVersion::new(2020, 2))), OLD);
        assert_eq!(catalog.resolve(Some(V2023_2)), NEW);
        assert_eq!(catalog.resolve(Some(ToolVersion::new(2018, 3))), OLD);
        assert_eq!(catalog.resolve(Some(ToolVersion::new(2031, 1))), NEW);
        assert_eq!(catalog.resolve(None), NEW);
        assert_eq!(Catalog::Fixed(OLD).resolve(None), OLD);
    }
}
