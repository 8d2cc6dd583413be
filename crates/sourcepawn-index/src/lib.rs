// lib.rs: cross-file completion index for SourcePawn.
//
// The index itself lives in `cross_file`; `declarations` supplies symbols
// from source text, and `backend` serves everything over LSP. The binary
// entry point in main.rs only parses arguments and starts the server.

pub mod backend;
pub mod completion_context;
pub mod cross_file;
pub mod declarations;
pub mod handlers;
pub mod state;
// test_utils is available in test builds and when the `test-support` feature is enabled.
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod utf16;
