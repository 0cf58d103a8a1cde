/*!
# Edit Planning

Every injection is turned into insertions against the untouched original
buffer, then all insertions are applied in one ordered pass. Offsets are
never renumbered.
*/

use tracing::debug;

use crate::source::SourceBuffer;
use crate::{Result, TraceError};

use super::rules::InjectionPoint;

/// Who asked for an edit. The header sorts ahead of injections at the
/// same offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EditOrigin {
    Header,
    Injection(usize),
}

/// Insert `bytes` at `offset` of the original buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub offset: usize,
    pub bytes: Vec<u8>,
    pub origin: EditOrigin,
}

/// All insertions for one invocation, in original-buffer coordinates.
#[derive(Debug, Default)]
pub struct EditPlan {
    edits: Vec<Edit>,
}

impl EditPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Add `hook(metadata)(` before and `)` after the injection's span.
    pub fn wrap(&mut self, buffer: &SourceBuffer, point: &InjectionPoint, hook: &str) -> Result<()> {
        let start = buffer.to_offset(point.location.start)?;
        let end = buffer.to_offset(point.location.end)?;
        let origin = EditOrigin::Injection(point.index);

        let (open, close) = if point.parenthesize { ("(", "))") } else { ("", ")") };

        self.edits.push(Edit {
            offset: start,
            bytes: format!("{open}{hook}({})(", point.metadata).into_bytes(),
            origin,
        });
        self.edits.push(Edit {
            offset: end,
            bytes: close.as_bytes().to_vec(),
            origin,
        });
        Ok(())
    }

    /// Sort edits and reject any two injection edits sharing an offset.
    fn ordered(mut self, buffer: &SourceBuffer) -> Result<Vec<Edit>> {
        self.edits.sort_by_key(|edit| (edit.offset, edit.origin));

        for pair in self.edits.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.offset == b.offset
                && matches!(a.origin, EditOrigin::Injection(_))
                && matches!(b.origin, EditOrigin::Injection(_))
            {
                return Err(TraceError::ConflictingEdits {
                    offset: a.offset,
                    position: buffer.position(a.offset),
                });
            }
        }
        Ok(self.edits)
    }

    /// Rewrite `buffer` in a single pass. Nothing is produced on conflict.
    pub fn apply(self, buffer: &SourceBuffer) -> Result<Vec<u8>> {
        let edits = self.ordered(buffer)?;
        let source = buffer.bytes();
        let inserted: usize = edits.iter().map(|edit| edit.bytes.len()).sum();
        let mut out = Vec::with_capacity(source.len() + inserted);

        let mut cut = 0;
        for edit in &edits {
            if edit.offset > source.len() {
                return Err(TraceError::OffsetOutOfRange {
                    position: buffer.position(source.len()),
                    len: source.len(),
                });
            }
            out.extend_from_slice(&source[cut..edit.offset]);
            out.extend_from_slice(&edit.bytes);
            cut = edit.offset;
        }
        out.extend_from_slice(&source[cut..]);

        debug!(edits = edits.len(), bytes = out.len(), "applied edit plan");
        Ok(out)
    }
}
