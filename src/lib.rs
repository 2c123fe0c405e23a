// Library root
// -----------
// The binary (`main.rs`) wires these modules into the interactive CLI.
//
// Module responsibilities:
// - `config`: environment-driven settings (endpoint, file locations).
// - `api`: blocking HTTP client for the Deezer search endpoint.
// - `library`: playlist files and the shared search history file.
// - `finder`: the search-and-save flow on top of `api` and `library`.
// - `logging`: tracing setup writing to a rolling log file.
// - `ui`: the numbered menu loop and its prompts.
pub mod api;
pub mod config;
pub mod finder;
pub mod library;
pub mod logging;
pub mod ui;
