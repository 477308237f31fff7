// lib.rs — Library crate shared by the server binary and integration tests.
//
// The binary entry point lives in main.rs; it dispatches on `cli::parse_args`
// and hands over to `backend::start_lsp`.

pub mod backend;
pub mod cli;
pub mod config;
pub mod handlers;
pub mod outline;
pub mod reserved_words;
pub mod scope;
pub mod state;
pub mod utf16;
pub mod variable_scanner;
