/*!
# Source Coordinates

Byte buffer of the original source plus the line-start table used to turn
analyzer `(line, column)` pairs into absolute byte offsets.
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, TraceError};

/// A zero-indexed point in the source. Columns count bytes from line start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.line, self.column)
    }
}

/// A span between two positions, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

impl Location {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Parse the analyzer's compact `"startLine,startCol-endLine,endCol"` form.
    ///
    /// Luau emits the separator as `" - "`, so whitespace around each
    /// component is ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        raw.parse()
    }
}

impl FromStr for Location {
    type Err = TraceError;

    fn from_str(raw: &str) -> Result<Self> {
        let invalid = || TraceError::InvalidLocation {
            raw: raw.to_string(),
        };

        let (start, end) = raw.split_once('-').ok_or_else(invalid)?;
        let point = |text: &str| -> Result<Position> {
            let (line, column) = text.split_once(',').ok_or_else(invalid)?;
            let line = line.trim().parse().map_err(|_| invalid())?;
            let column = column.trim().parse().map_err(|_| invalid())?;
            Ok(Position { line, column })
        };

        let location = Location {
            start: point(start)?,
            end: point(end)?,
        };
        if location.start > location.end {
            return Err(invalid());
        }
        Ok(location)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Immutable original source with its line-start offsets.
///
/// `line_offsets[i]` is the offset of the first byte of line `i`; entry 0 is
/// always 0 and every `\n` starts a new line, so a trailing newline yields a
/// final empty line.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    bytes: Vec<u8>,
    line_offsets: Vec<usize>,
}

impl SourceBuffer {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let mut line_offsets = vec![0];
        line_offsets.extend(
            bytes
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            bytes,
            line_offsets,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.line_offsets.len()
    }

    pub fn line_offsets(&self) -> &[usize] {
        &self.line_offsets
    }

    /// Offset of the first byte of `line`.
    pub fn line_start(&self, line: usize) -> Result<usize> {
        self.line_offsets
            .get(line)
            .copied()
            .ok_or(TraceError::LineOutOfRange {
                line,
                line_count: self.line_count(),
            })
    }

    /// Bytes of `line` without its terminating `\n`.
    pub fn line(&self, line: usize) -> Result<&[u8]> {
        let start = self.line_start(line)?;
        let end = match self.line_offsets.get(line + 1) {
            Some(next) => next - 1,
            None => self.bytes.len(),
        };
        Ok(&self.bytes[start..end])
    }

    pub fn to_offset(&self, position: Position) -> Result<usize> {
        let offset = self.line_start(position.line)? + position.column;
        if offset > self.bytes.len() {
            return Err(TraceError::OffsetOutOfRange {
                position,
                len: self.bytes.len(),
            });
        }
        Ok(offset)
    }

    /// Inverse of [`SourceBuffer::to_offset`], used for diagnostics.
    pub fn position(&self, offset: usize) -> Position {
        let line = match self.line_offsets.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Position {
            line,
            column: offset - self.line_offsets[line],
        }
    }
}
