use crate::version::{IncrementFlags, Result, VersionError, VersionQuadruplet};
use log::debug;
use std::fs;
use std::ops::Range;
use std::path::Path;

const LITERAL_TERMINATOR: &str = "\")]";

/// The two version attributes an `AssemblyInfo.cs` file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionMarker {
    Assembly,
    File,
}

impl VersionMarker {
    pub fn from_file_version_flag(file_version: bool) -> Self {
        if file_version {
            VersionMarker::File
        } else {
            VersionMarker::Assembly
        }
    }

    /// Text that immediately precedes the version literal
    pub fn search_string(self) -> &'static str {
        match self {
            VersionMarker::Assembly => "\n[assembly: AssemblyVersion(\"",
            VersionMarker::File => "\n[assembly: AssemblyFileVersion(\"",
        }
    }

    /// Declaration appended when a file has no such attribute yet
    pub fn default_block(self) -> &'static str {
        match self {
            VersionMarker::Assembly => "\r\n[assembly: AssemblyVersion(\"1.0.0.0\")]",
            VersionMarker::File => "\r\n[assembly: AssemblyFileVersion(\"1.0.0.0\")]",
        }
    }
}

/// Byte range of the literal following the first occurrence of `marker`, if any.
pub fn find_literal(text: &str, marker: VersionMarker) -> Result<Option<Range<usize>>> {
    let search = marker.search_string();
    let Some(position) = text.find(search) else {
        return Ok(None);
    };

    let start = position + search.len();
    let end = text[start..]
        .find(LITERAL_TERMINATOR)
        .map(|offset| start + offset)
        .ok_or_else(|| VersionError::Unterminated {
            marker: search.trim_start().to_string(),
        })?;

    Ok(Some(start..end))
}

/// Find the literal for `marker`, appending a default declaration first when
/// the text has none. After the fallback a match is guaranteed.
pub fn locate(text: &mut String, marker: VersionMarker) -> Result<Range<usize>> {
    if let Some(span) = find_literal(text, marker)? {
        return Ok(span);
    }

    debug!("No {:?} version declaration found, appending default", marker);
    text.push_str(marker.default_block());

    find_literal(text, marker)?.ok_or_else(|| VersionError::Unterminated {
        marker: marker.search_string().trim_start().to_string(),
    })
}

/// Replace exactly `span` with `literal`, leaving every other byte alone.
pub fn rewrite(text: &str, span: Range<usize>, literal: &str) -> String {
    let mut result = String::with_capacity(text.len() + literal.len());
    result.push_str(&text[..span.start]);
    result.push_str(literal);
    result.push_str(&text[span.end..]);
    result
}

/// Parse the version declared for `marker` without modifying anything.
pub fn read_version(text: &str, marker: VersionMarker) -> Result<Option<VersionQuadruplet>> {
    match find_literal(text, marker)? {
        Some(span) => Ok(Some(VersionQuadruplet::parse(&text[span])?)),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampOutcome {
    pub text: String,
    /// Literal exactly as it appeared before stamping
    pub previous: String,
    pub version: VersionQuadruplet,
}

pub struct VersionStamper {
    marker: VersionMarker,
    flags: IncrementFlags,
}

impl VersionStamper {
    pub fn new(marker: VersionMarker, flags: IncrementFlags) -> Self {
        Self { marker, flags }
    }

    pub fn stamp_text(&self, text: &str) -> Result<StampOutcome> {
        let mut text = text.to_string();
        let span = locate(&mut text, self.marker)?;
        let previous = text[span.clone()].to_string();

        let version = VersionQuadruplet::parse(&previous)?.apply(&self.flags);
        debug!("Stamping {} -> {}", previous, version);

        Ok(StampOutcome {
            text: rewrite(&text, span, &version.render()),
            previous,
            version,
        })
    }

    pub fn stamp_file(&self, path: &Path) -> Result<StampOutcome> {
        debug!("Stamping version in: {}", path.display());
        let contents = fs::read_to_string(path)?;
        let outcome = self.stamp_text(&contents)?;
        fs::write(path, &outcome.text)?;
        Ok(outcome)
    }
}
