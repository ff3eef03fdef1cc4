//! Code-intelligence provider interface and the language-server client that
//! implements it.
//!
//! The pipeline only depends on [`SymbolProvider`]; the client speaks
//! JSON-RPC to an out-of-process language server, one request at a time.

/// Language-server client.
pub mod client;

/// JSON-RPC 2.0 transport types and framing.
pub mod transport;

/// `file://` URI conversion.
pub mod uri;

pub use client::LspClient;
pub use transport::{IncomingMessage, JsonRpcError, JsonRpcRequest, JsonRpcResponse};

use crate::errors::Result;
use crate::types::{Location, Position, Symbol};

/// Source of symbol and reference data for project files.
///
/// Files are identified by their project-relative path. Any error is fatal
/// to the run; implementations must not retry.
#[allow(async_fn_in_trait)]
pub trait SymbolProvider {
    /// Returns the symbols declared in a file; may be empty.
    async fn document_symbols(&mut self, file: &str) -> Result<Vec<Symbol>>;

    /// Returns the locations referencing the symbol at `position`; may be empty.
    async fn references(&mut self, file: &str, position: Position) -> Result<Vec<Location>>;
}
