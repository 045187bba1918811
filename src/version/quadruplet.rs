use crate::version::{Result, VersionError};
use std::fmt;
use std::str::FromStr;

/// A `major.minor.build.revision` version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VersionQuadruplet {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
}

/// Which components get bumped when a version is stamped.
///
/// The revision is not listed here: it is incremented on every stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IncrementFlags {
    pub increase_major: bool,
    pub increase_minor: bool,
    pub increase_build: bool,
    /// A release build bumps the build number, same as `increase_build`
    pub release: bool,
}

impl VersionQuadruplet {
    pub fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parse a raw literal as found in source files.
    ///
    /// Wildcards (`*`) count as zero and minus signs are dropped before the
    /// literal is split, so `1.2.*.4` parses as `1.2.0.4`. Anything other
    /// than exactly four non-negative integers is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        // RUST LEARNING: `filter` + `map` on chars builds the normalized string in one pass
        let normalized: String = raw
            .chars()
            .filter(|c| *c != '-')
            .map(|c| if c == '*' { '0' } else { c })
            .collect();

        let parts: Vec<&str> = normalized.split('.').collect();
        if parts.len() != 4 {
            return Err(VersionError::Format {
                literal: raw.to_string(),
                reason: format!("expected 4 components, found {}", parts.len()),
            });
        }

        let mut numbers = [0u32; 4];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            // `u32::from_str` would also take a leading '+'
            if !part.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(VersionError::Format {
                    literal: raw.to_string(),
                    reason: format!("component '{}' is not a number", part),
                });
            }
            *slot = part.parse::<u32>().map_err(|e| VersionError::Format {
                literal: raw.to_string(),
                reason: format!("component '{}': {}", part, e),
            })?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2], numbers[3]))
    }

    pub fn apply(self, flags: &IncrementFlags) -> Self {
        let mut next = self;
        if flags.increase_major {
            next.major = next.major.saturating_add(1);
        }
        if flags.increase_minor {
            next.minor = next.minor.saturating_add(1);
        }
        if flags.increase_build || flags.release {
            next.build = next.build.saturating_add(1);
        }
        next.revision = next.revision.saturating_add(1);
        next
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    /// `major.minor.build`, the form installers and package feeds expect
    pub fn three_part(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.build)
    }
}

impl fmt::Display for VersionQuadruplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl FromStr for VersionQuadruplet {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_literal() {
        let version = VersionQuadruplet::parse("1.2.3.4").unwrap();
        assert_eq!(version, VersionQuadruplet::new(1, 2, 3, 4));
    }

    #[test]
    fn test_parse_wildcard_and_minus() {
        assert_eq!(
            VersionQuadruplet::parse("1.2.*.4").unwrap(),
            VersionQuadruplet::new(1, 2, 0, 4)
        );
        assert_eq!(
            VersionQuadruplet::parse("1.2.3.-4").unwrap(),
            VersionQuadruplet::new(1, 2, 3, 4)
        );
        assert_eq!(
            VersionQuadruplet::parse("1.0.*.*").unwrap(),
            VersionQuadruplet::new(1, 0, 0, 0)
        );
    }

    #[test]
    fn test_parse_rejects_short_literal() {
        let err = VersionQuadruplet::parse("1.2.3").unwrap_err();
        match err {
            VersionError::Format { literal, .. } => assert_eq!(literal, "1.2.3"),
            other => panic!("Expected Format error, got: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_signed_components() {
        assert!(VersionQuadruplet::parse("+1.2.3.4").is_err());
        assert!(VersionQuadruplet::parse("1.2. 3.4").is_err());
        assert!(VersionQuadruplet::parse("1.2..4").is_err());
    }

    #[test]
    fn test_parse_rejects_garbage_components() {
        assert!(VersionQuadruplet::parse("1.2.3.4.5").is_err());
        assert!(VersionQuadruplet::parse("1.2.x.4").is_err());
        assert!(VersionQuadruplet::parse("1..3.4").is_err());
        assert!(VersionQuadruplet::parse("").is_err());
    }

    #[test]
    fn test_apply_major_always_bumps_revision() {
        let flags = IncrementFlags {
            increase_major: true,
            ..Default::default()
        };
        let next = VersionQuadruplet::new(1, 2, 3, 4).apply(&flags);
        assert_eq!(next, VersionQuadruplet::new(2, 2, 3, 5));
    }

    #[test]
    fn test_apply_release_bumps_build() {
        let flags = IncrementFlags {
            release: true,
            ..Default::default()
        };
        let next = VersionQuadruplet::new(1, 2, 3, 4).apply(&flags);
        assert_eq!(next, VersionQuadruplet::new(1, 2, 4, 5));
    }

    #[test]
    fn test_apply_combined_flags() {
        let flags = IncrementFlags {
            increase_major: true,
            increase_minor: true,
            increase_build: true,
            release: true,
        };
        // build + release still only bump the build number once
        let next = VersionQuadruplet::new(1, 2, 3, 4).apply(&flags);
        assert_eq!(next, VersionQuadruplet::new(2, 3, 4, 5));

        let untouched = VersionQuadruplet::new(1, 2, 3, 4).apply(&IncrementFlags::default());
        assert_eq!(untouched, VersionQuadruplet::new(1, 2, 3, 5));
    }

    #[test]
    fn test_render_has_no_wildcards_or_padding() {
        let version = VersionQuadruplet::parse("01.2.*.4").unwrap();
        assert_eq!(version.render(), "1.2.0.4");
        assert_eq!(version.three_part(), "1.2.0");
    }
}
