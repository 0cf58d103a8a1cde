/*!
# Tracer - Hook Injection Engine

Rewrites Luau source so that a runtime debugger sees every executed
expression it cares about, together with the locals in scope there.

## Overview

An injection wraps an expression `E` as `HOOK(line, column, {a=a, ...})(E)`.
The hook is called first, then returns an identity wrapper, so the
expression's value and evaluation are unchanged apart from the side effect.

## Architecture

- `walker`: scope-aware flattening of the analyzer tree
- `InjectionRule`: trait for choosing spans to wrap (`hook_rules` has the
  standard set)
- `edits`: insertions planned against the original buffer, applied once
- `header`: the `_register` statement after leading `--!` directives
- `Instrumenter`: one file, end to end
- `FileTracer`: whole directories, files in parallel

## Example Usage

```rust,no_run
use luatrace_core::{InstrumentRequest, Instrumenter, ProcessAnalyzer};

# async fn run() -> luatrace_core::Result<()> {
let instrumenter = Instrumenter::new(ProcessAnalyzer::default());
let request = InstrumentRequest::new("src/main.luau", "print('hi')\n", "script.Parent.Hook");
let instrumented = instrumenter.instrument(&request).await?;
println!("{}", instrumented.source);
# Ok(())
# }
```
*/

pub mod edits;
pub mod file_tracer;
pub mod header;
pub mod hook_rules;
pub mod instrumenter;
pub mod rules;
pub mod scope;
pub mod walker;

#[cfg(test)]
mod walker_tests;

// Re-export main types
pub use edits::{Edit, EditOrigin, EditPlan};
pub use file_tracer::{FileTracer, FileTransformationSummary};
pub use instrumenter::{instrument_tree, Breakpoint, InstrumentRequest, Instrumented, Instrumenter};
pub use rules::{InjectionPoint, InjectionRule, RuleStats, Selector};
pub use scope::Scope;
pub use walker::{flatten, FlatNode};
