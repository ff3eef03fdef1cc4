use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::errors::{Result, SymGraphError};
use crate::types::{Location, Position, Range, Symbol, SymbolKind};

use super::transport::{
    encode_frame, read_frame, IncomingMessage, JsonRpcRequest, JsonRpcResponse,
};
use super::uri::{path_to_uri, uri_to_file_id};
use super::SymbolProvider;

/// Wire shape of a location in provider replies.
#[derive(Debug, Clone, Deserialize)]
struct WireLocation {
    uri: String,
    range: Range,
}

/// Flat symbol reply entry, carrying an optional container name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInformation {
    name: String,
    kind: u8,
    location: WireLocation,
    #[serde(default)]
    container_name: Option<String>,
}

/// Hierarchical symbol reply entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentSymbol {
    name: String,
    kind: u8,
    range: Range,
    selection_range: Range,
    #[serde(default)]
    children: Vec<DocumentSymbol>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SymbolReply {
    Flat(Vec<SymbolInformation>),
    Nested(Vec<DocumentSymbol>),
}

/// Converts a symbol reply into store symbols for `file`.
///
/// Nested replies are flattened depth-first; each child records its parent's
/// name as container so containment can be resolved the same way for both
/// reply shapes. Entries with an unknown kind number are skipped.
fn symbols_from_reply(file: &str, reply: SymbolReply) -> Vec<Symbol> {
    match reply {
        SymbolReply::Flat(entries) => entries
            .into_iter()
            .filter_map(|entry| {
                let kind = known_kind(file, &entry.name, entry.kind)?;
                Some(Symbol {
                    kind,
                    name: entry.name,
                    container_name: entry.container_name.filter(|c| !c.is_empty()),
                    range: entry.location.range,
                    selection_range: None,
                    file: file.to_string(),
                })
            })
            .collect(),
        SymbolReply::Nested(entries) => {
            let mut symbols = Vec::new();
            flatten(file, entries, None, &mut symbols);
            symbols
        }
    }
}

fn flatten(file: &str, entries: Vec<DocumentSymbol>, parent: Option<&str>, out: &mut Vec<Symbol>) {
    for entry in entries {
        if let Some(kind) = known_kind(file, &entry.name, entry.kind) {
            out.push(Symbol {
                kind,
                name: entry.name.clone(),
                container_name: parent.map(str::to_string),
                range: entry.range,
                selection_range: Some(entry.selection_range),
                file: file.to_string(),
            });
        }
        flatten(file, entry.children, Some(&entry.name), out);
    }
}

fn known_kind(file: &str, name: &str, number: u8) -> Option<SymbolKind> {
    let kind = SymbolKind::from_number(number);
    if kind.is_none() {
        tracing::warn!(file = %file, symbol = %name, kind = number, "unknown symbol kind, skipping");
    }
    kind
}

/// Reads a source file for `didOpen`.
///
/// Invalid UTF-8 is replaced rather than rejected, and an unreadable file is
/// opened empty; the server then simply reports no symbols for it.
async fn read_document(path: &Path) -> String {
    match tokio::fs::read(path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "source not readable, opening empty");
            String::new()
        }
    }
}

/// Client for a language server running as a child process.
///
/// Requests are strictly sequential: each call writes one request and reads
/// until the matching response arrives, answering server-initiated requests
/// and discarding notifications along the way.
pub struct LspClient {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: u64,
    root: PathBuf,
    language_id: String,
    opened: HashSet<String>,
}

impl LspClient {
    /// Starts the server and performs the initialize handshake.
    pub async fn spawn(
        command: &str,
        args: &[String],
        root: &Path,
        language_id: &str,
    ) -> Result<Self> {
        let mut child = Command::new(command)
            .args(args)
            .current_dir(root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SymGraphError::Transport {
                message: format!("failed to start language server '{}': {}", command, e),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| SymGraphError::Transport {
            message: "language server stdin unavailable".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| SymGraphError::Transport {
            message: "language server stdout unavailable".to_string(),
        })?;

        let mut client = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            next_id: 1,
            root: root.to_path_buf(),
            language_id: language_id.to_string(),
            opened: HashSet::new(),
        };
        client.initialize().await?;
        Ok(client)
    }

    async fn initialize(&mut self) -> Result<()> {
        let root_uri = path_to_uri(&self.root);
        let root_name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let params = json!({
            "processId": std::process::id(),
            "rootUri": root_uri,
            "workspaceFolders": [{ "uri": root_uri, "name": root_name }],
            "capabilities": {
                "textDocument": {
                    "documentSymbol": {
                        "hierarchicalDocumentSymbolSupport": true
                    },
                    "references": {}
                }
            }
        });
        let result = self.request("initialize", params).await?;
        let server_name = result
            .pointer("/serverInfo/name")
            .and_then(|name| name.as_str())
            .unwrap_or("unknown");
        tracing::debug!(server = %server_name, "language server initialized");
        self.notify("initialized", Some(json!({}))).await
    }

    /// Sends `shutdown` and `exit`, then waits for the process to end.
    pub async fn shutdown(mut self) -> Result<()> {
        self.request("shutdown", Value::Null).await?;
        self.notify("exit", None).await?;
        let status = self.child.wait().await?;
        tracing::debug!(%status, "language server exited");
        Ok(())
    }

    async fn send(&mut self, payload: &impl serde::Serialize) -> Result<()> {
        let body = serde_json::to_vec(payload)?;
        self.stdin
            .write_all(&encode_frame(&body))
            .await
            .map_err(|e| SymGraphError::Transport {
                message: format!("failed to write to language server: {}", e),
            })?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        self.send(&JsonRpcRequest::notification(method, params)).await
    }

    /// Issues one request and waits for its response.
    async fn request(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;
        self.send(&JsonRpcRequest::call(id, method, params)).await?;

        loop {
            let frame = read_frame(&mut self.stdout)
                .await?
                .ok_or_else(|| SymGraphError::Transport {
                    message: format!("language server closed the connection during '{}'", method),
                })?;
            let message: IncomingMessage = serde_json::from_slice(&frame)?;

            if message.is_server_request() {
                tracing::trace!(method = ?message.method, "answering server request");
                self.send(&JsonRpcResponse::success(message.id, Value::Null))
                    .await?;
                continue;
            }
            if message.is_notification() {
                tracing::trace!(method = ?message.method, params = ?message.params, "server notification");
                continue;
            }
            if message.id.as_u64() != Some(id) {
                tracing::debug!(id = %message.id, expected = id, "ignoring unexpected response");
                continue;
            }

            if let Some(error) = message.error {
                return Err(SymGraphError::Provider {
                    message: format!("{} (code {})", error.message, error.code),
                    method: method.to_string(),
                });
            }
            return Ok(message.result.unwrap_or(Value::Null));
        }
    }

    /// Opens a document with the server before its first query.
    async fn ensure_open(&mut self, file: &str) -> Result<String> {
        let path = self.root.join(file);
        let uri = path_to_uri(&path);
        if self.opened.contains(file) {
            return Ok(uri);
        }

        let text = read_document(&path).await;
        let params = json!({
            "textDocument": {
                "uri": uri,
                "languageId": self.language_id,
                "version": 1,
                "text": text
            }
        });
        self.notify("textDocument/didOpen", Some(params)).await?;
        self.opened.insert(file.to_string());
        Ok(uri)
    }
}

impl SymbolProvider for LspClient {
    async fn document_symbols(&mut self, file: &str) -> Result<Vec<Symbol>> {
        let uri = self.ensure_open(file).await?;
        let result = self
            .request(
                "textDocument/documentSymbol",
                json!({ "textDocument": { "uri": uri } }),
            )
            .await?;
        if result.is_null() {
            return Ok(Vec::new());
        }
        let reply: SymbolReply = serde_json::from_value(result)?;
        Ok(symbols_from_reply(file, reply))
    }

    async fn references(&mut self, file: &str, position: Position) -> Result<Vec<Location>> {
        let uri = self.ensure_open(file).await?;
        let result = self
            .request(
                "textDocument/references",
                json!({
                    "textDocument": { "uri": uri },
                    "position": position,
                    "context": { "includeDeclaration": false }
                }),
            )
            .await?;
        if result.is_null() {
            return Ok(Vec::new());
        }

        let locations: Vec<WireLocation> = serde_json::from_value(result)?;
        Ok(locations
            .into_iter()
            .filter_map(|loc| match uri_to_file_id(&loc.uri, &self.root) {
                Some(file) => Some(Location {
                    file,
                    range: loc.range,
                }),
                None => {
                    tracing::trace!(uri = %loc.uri, "reference outside project root");
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_reply_keeps_container_names() {
        let value = json!([
            {
                "name": "Foo",
                "kind": 5,
                "location": { "uri": "file:///p/a.py", "range": { "start": { "line": 0, "character": 0 }, "end": { "line": 4, "character": 0 } } }
            },
            {
                "name": "bar",
                "kind": 6,
                "containerName": "Foo",
                "location": { "uri": "file:///p/a.py", "range": { "start": { "line": 1, "character": 4 }, "end": { "line": 2, "character": 0 } } }
            }
        ]);
        let reply: SymbolReply = serde_json::from_value(value).unwrap();
        let symbols = symbols_from_reply("a.py", reply);
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].kind, SymbolKind::Class);
        assert_eq!(symbols[0].container_name, None);
        assert_eq!(symbols[1].container_name.as_deref(), Some("Foo"));
        assert_eq!(symbols[1].range, Range::from_coords(1, 4, 2, 0));
        assert!(symbols.iter().all(|s| s.file == "a.py"));
    }

    #[test]
    fn test_nested_reply_is_flattened() {
        let range = json!({ "start": { "line": 0, "character": 0 }, "end": { "line": 9, "character": 0 } });
        let inner = json!({ "start": { "line": 1, "character": 4 }, "end": { "line": 3, "character": 0 } });
        let value = json!([
            {
                "name": "Foo",
                "kind": 5,
                "range": range,
                "selectionRange": { "start": { "line": 0, "character": 6 }, "end": { "line": 0, "character": 9 } },
                "children": [
                    { "name": "bar", "kind": 6, "range": inner, "selectionRange": inner }
                ]
            }
        ]);
        let reply: SymbolReply = serde_json::from_value(value).unwrap();
        let symbols = symbols_from_reply("a.py", reply);
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].selection_range, Some(Range::from_coords(0, 6, 0, 9)));
        assert_eq!(symbols[1].name, "bar");
        assert_eq!(symbols[1].container_name.as_deref(), Some("Foo"));
    }

    #[test]
    fn test_unknown_kinds_are_skipped() {
        let range = json!({ "start": { "line": 0, "character": 0 }, "end": { "line": 9, "character": 0 } });
        let value = json!([
            { "name": "Odd", "kind": 99, "location": { "uri": "file:///p/a.py", "range": range } },
            { "name": "foo", "kind": 12, "location": { "uri": "file:///p/a.py", "range": range } }
        ]);
        let reply: SymbolReply = serde_json::from_value(value).unwrap();
        let symbols = symbols_from_reply("a.py", reply);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].kind, SymbolKind::Function);

        let nested = json!([
            {
                "name": "Odd",
                "kind": 0,
                "range": range,
                "selectionRange": range,
                "children": [{ "name": "bar", "kind": 6, "range": range, "selectionRange": range }]
            }
        ]);
        let reply: SymbolReply = serde_json::from_value(nested).unwrap();
        let symbols = symbols_from_reply("a.py", reply);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "bar");
        assert_eq!(symbols[0].container_name.as_deref(), Some("Odd"));
    }

    #[tokio::test]
    async fn test_read_document_tolerates_bad_sources() {
        let dir = tempfile::TempDir::new().unwrap();
        let latin1 = dir.path().join("x.py");
        std::fs::write(&latin1, b"name = 'caf\xe9'\n").unwrap();

        let text = read_document(&latin1).await;
        assert!(text.starts_with("name = 'caf"));
        assert!(text.contains('\u{FFFD}'));

        assert_eq!(read_document(&dir.path().join("missing.py")).await, "");
    }

    #[test]
    fn test_empty_reply_parses() {
        let reply: SymbolReply = serde_json::from_value(json!([])).unwrap();
        assert!(symbols_from_reply("a.py", reply).is_empty());
    }
}
