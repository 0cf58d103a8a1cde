/*!
# Header Injection

The registration statement that binds the hook variable. It goes at the
start of the first line after the leading `--!` directive lines, as one
more edit in the same plan as the body injections.
*/

use tracing::{debug, warn};

use crate::source::SourceBuffer;
use crate::Result;

use super::edits::{Edit, EditOrigin};

/// Leading-line marker of compiler directives such as `--!strict`.
pub const DIRECTIVE_MARKER: &str = "--!";

/// First line, counting from the top, that is not a directive line.
pub fn first_code_line(buffer: &SourceBuffer, marker: &str) -> Result<Option<usize>> {
    for line in 0..buffer.line_count() {
        if !buffer.line(line)?.starts_with(marker.as_bytes()) {
            return Ok(Some(line));
        }
    }
    Ok(None)
}

/// `local HOOK = require(LIB)._register("PATH"); `
///
/// No newline is emitted so runtime line numbers match the original file.
pub fn header_statement(hook: &str, library: &str, source_path: &str) -> String {
    format!(
        "local {hook} = require({library})._register({}); ",
        lua_string_literal(source_path)
    )
}

/// Quote `value` as a double-quoted Lua string literal.
pub fn lua_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// The header edit, or `None` when every line is a directive.
pub fn header_edit(
    buffer: &SourceBuffer,
    marker: &str,
    hook: &str,
    library: &str,
    source_path: &str,
) -> Result<Option<Edit>> {
    let Some(line) = first_code_line(buffer, marker)? else {
        warn!(source_path, "no line after directives, header not inserted");
        return Ok(None);
    };

    let offset = buffer.line_start(line)?;
    debug!(source_path, line, offset, "placing registration header");
    Ok(Some(Edit {
        offset,
        bytes: header_statement(hook, library, source_path).into_bytes(),
        origin: EditOrigin::Header,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_directives_places_header_at_start() -> Result<()> {
        let buffer = SourceBuffer::new("local a = 1\n");
        assert_eq!(first_code_line(&buffer, DIRECTIVE_MARKER)?, Some(0));
        let edit = header_edit(&buffer, DIRECTIVE_MARKER, "H", "script.Hook", "a.luau")?.unwrap();
        assert_eq!(edit.offset, 0);
        Ok(())
    }

    #[test]
    fn test_header_follows_directive_lines() -> Result<()> {
        let buffer = SourceBuffer::new("--!strict\n--!native\nlocal a = 1\n");
        assert_eq!(first_code_line(&buffer, DIRECTIVE_MARKER)?, Some(2));
        let edit = header_edit(&buffer, DIRECTIVE_MARKER, "H", "script.Hook", "a.luau")?.unwrap();
        assert_eq!(edit.offset, 20);
        Ok(())
    }

    #[test]
    fn test_plain_comment_ends_directive_scan() -> Result<()> {
        let buffer = SourceBuffer::new("-- header\n--!strict\n");
        assert_eq!(first_code_line(&buffer, DIRECTIVE_MARKER)?, Some(0));
        Ok(())
    }

    #[test]
    fn test_only_directives_yields_no_header() -> Result<()> {
        let buffer = SourceBuffer::new("--!strict");
        assert!(header_edit(&buffer, DIRECTIVE_MARKER, "H", "L", "p")?.is_none());
        Ok(())
    }

    #[test]
    fn test_header_statement_escapes_path() {
        assert_eq!(
            header_statement("__hook", "game.ReplicatedStorage.Hook", "src/\"odd\"\\x.luau"),
            "local __hook = require(game.ReplicatedStorage.Hook)._register(\"src/\\\"odd\\\"\\\\x.luau\"); "
        );
        assert_eq!(lua_string_literal("a\u{1}b"), "\"a\\001b\"");
    }
}
