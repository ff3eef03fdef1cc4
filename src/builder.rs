use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{load_config, FileFilter, SymGraphConfig};
use crate::discovery::discover_files;
use crate::errors::{Result, SymGraphError};
use crate::graph::{write_gxl, Graph, ValidationReport};
use crate::provider::{LspClient, SymbolProvider};
use crate::resolution::{AnchorPolicy, ContainmentResolver, DropReason, ReferenceMapper};
use crate::source::LineCache;
use crate::store::SymbolStore;
use crate::types::{Location, Symbol};

/// Everything gathered from the provider, available only once collection
/// has finished for every file.
///
/// Holding a `CollectedProject` is what allows resolution to run: reference
/// locations may point into any collected file.
#[derive(Debug, Clone)]
pub struct CollectedProject {
    store: SymbolStore,
    /// Raw reference locations per definition id, in query order.
    references: Vec<(String, Vec<Location>)>,
    skipped_queries: usize,
}

impl CollectedProject {
    pub fn store(&self) -> &SymbolStore {
        &self.store
    }

    pub fn references(&self) -> &[(String, Vec<Location>)] {
        &self.references
    }

    /// Number of symbols whose reference query was skipped (import lines).
    pub fn skipped_queries(&self) -> usize {
        self.skipped_queries
    }
}

/// The validated graph of one run plus what was dropped along the way.
#[derive(Debug, Clone)]
pub struct ResolvedGraph {
    pub graph: Graph,
    pub validation: ValidationReport,
    /// Symbols without an enclosing symbol (the project root excluded).
    pub unparented: Vec<String>,
    /// References that could not be attributed to a referencing symbol.
    pub dropped_references: Vec<(Location, DropReason)>,
}

/// Summary of a full export.
pub struct ExportResult {
    /// Number of files queried.
    pub file_count: usize,
    /// Number of graph nodes written.
    pub node_count: usize,
    /// Number of graph edges written.
    pub edge_count: usize,
    /// Number of dangling edge endpoints reported by validation.
    pub dangling_count: usize,
    /// Where the document was written.
    pub output: PathBuf,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

/// Drives the two-phase pipeline: collect everything from the provider,
/// then resolve containment and references into a graph.
pub struct SymbolGraphBuilder<P> {
    provider: P,
    root_name: String,
    filter: FileFilter,
    policy: AnchorPolicy,
    lines: LineCache,
}

impl<P: SymbolProvider> SymbolGraphBuilder<P> {
    pub fn new(provider: P, project_root: &Path, filter: FileFilter, policy: AnchorPolicy) -> Self {
        let root_name = project_root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| project_root.display().to_string());
        Self {
            provider,
            root_name,
            filter,
            policy,
            lines: LineCache::new(project_root),
        }
    }

    /// Returns the provider, e.g. to shut it down after collection.
    pub fn into_provider(self) -> P {
        self.provider
    }

    /// Phase one: queries symbols and references for every file, strictly
    /// one provider request at a time.
    ///
    /// Any provider error aborts the collection.
    pub async fn collect(&mut self, files: &[String]) -> Result<CollectedProject> {
        let mut store = SymbolStore::new(self.root_name.clone());
        let mut references = Vec::new();
        let mut skipped_queries = 0;

        for file in files {
            let symbols: Vec<Symbol> = self
                .provider
                .document_symbols(file)
                .await?
                .into_iter()
                .map(|s| Symbol {
                    file: file.clone(),
                    ..s
                })
                .collect();
            tracing::debug!(file = %file, symbols = symbols.len(), "collected symbols");

            store.put(file, symbols);
            store.ensure_ancestor_chain(file);

            let declarations: Vec<Symbol> = store
                .symbols(file)
                .unwrap_or_default()
                .iter()
                .filter(|s| !s.is_file_kind())
                .cloned()
                .collect();

            for symbol in declarations {
                let line = self.lines.line(file, symbol.anchor().line).await;
                let Some(position) = self.policy.anchor(&symbol, line) else {
                    tracing::debug!(symbol = %symbol.name, file = %file, "import line, reference query skipped");
                    skipped_queries += 1;
                    continue;
                };
                let found = self.provider.references(file, position).await?;
                tracing::trace!(symbol = %symbol.name, references = found.len(), "collected references");
                references.push((symbol.id(), found));
            }
        }

        Ok(CollectedProject {
            store,
            references,
            skipped_queries,
        })
    }

    /// Phase two: builds and validates the graph from a completed collection.
    pub fn resolve(&self, collected: &CollectedProject) -> ResolvedGraph {
        resolve_graph(collected, &self.filter)
    }
}

/// Builds the graph from a completed collection.
///
/// Every stored symbol of an exported kind becomes a node; containment
/// links come first, then dependency links in query order.
pub fn resolve_graph(collected: &CollectedProject, filter: &FileFilter) -> ResolvedGraph {
    let store = &collected.store;
    let mut graph = Graph::new();

    for (_, symbols) in store.iter() {
        for symbol in symbols {
            graph.add_node(symbol);
        }
    }

    let containment = ContainmentResolver::new(store).resolve_all();
    for link in &containment.links {
        graph.add_edge(&link.from, &link.to, link.kind);
    }

    let mapper = ReferenceMapper::new(store, filter);
    let mut dropped_references = Vec::new();
    for (definition_id, locations) in &collected.references {
        let Some(definition) = store.symbol(definition_id) else {
            tracing::warn!(definition = %definition_id, "references recorded for unknown symbol");
            continue;
        };
        let mapping = mapper.map(definition, locations);
        for link in &mapping.links {
            graph.add_edge(&link.from, &link.to, link.kind);
        }
        dropped_references.extend(mapping.dropped);
    }

    let validation = graph.validate();
    let stats = graph.stats();
    tracing::info!(
        nodes = stats.node_count,
        enclosing = stats.enclosing_count,
        dependencies = stats.dependency_count,
        dropped = dropped_references.len(),
        dangling = validation.dangling.len(),
        "graph resolved"
    );

    ResolvedGraph {
        graph,
        validation,
        unparented: containment.unparented,
        dropped_references,
    }
}

/// Runs a complete export for the project at `project_root`: discovery,
/// collection through a spawned language server, resolution and encoding.
///
/// `output` overrides the configured output file.
pub async fn export_project(project_root: &Path, output: Option<PathBuf>) -> Result<ExportResult> {
    let start = Instant::now();
    let project_root = project_root
        .canonicalize()
        .map_err(|e| SymGraphError::File {
            message: format!("project root not accessible: {}", e),
            path: project_root.display().to_string(),
        })?;
    let config = load_config(&project_root)?;
    export_with_config(&project_root, &config, output, start).await
}

async fn export_with_config(
    project_root: &Path,
    config: &SymGraphConfig,
    output: Option<PathBuf>,
    start: Instant,
) -> Result<ExportResult> {
    let filter = FileFilter::from_config(config)?;
    let files = discover_files(project_root, config, &filter)?;
    tracing::info!(files = files.len(), root = %project_root.display(), "discovered files");

    let client = LspClient::spawn(
        &config.server_command,
        &config.server_args,
        project_root,
        &config.language_id,
    )
    .await?;

    let mut builder = SymbolGraphBuilder::new(
        client,
        project_root,
        filter,
        AnchorPolicy::from_config(config),
    );
    let collected = builder.collect(&files).await?;
    let resolved = builder.resolve(&collected);
    builder.into_provider().shutdown().await?;

    let output = output.unwrap_or_else(|| PathBuf::from(&config.output));
    let output = if output.is_absolute() {
        output
    } else {
        project_root.join(output)
    };
    let graph_id = collected.store().root_name().to_string();
    write_gxl(&resolved.graph, &graph_id, &output)?;

    let stats = resolved.graph.stats();
    Ok(ExportResult {
        file_count: files.len(),
        node_count: stats.node_count,
        edge_count: stats.edge_count,
        dangling_count: resolved.validation.dangling.len(),
        output,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}
