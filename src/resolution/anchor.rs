use crate::config::SymGraphConfig;
use crate::types::{Position, Symbol};

/// Decides where a reference query for a symbol is issued, or whether it is
/// issued at all.
///
/// The primary anchor is the start of the symbol's selection range. When the
/// provider only reports the full range, the text at that position may be a
/// declaration keyword (`class Foo:`); the anchor then moves past the keyword
/// and one separator. Lines carrying an import marker are bindings, not
/// declarations, and are never queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorPolicy {
    declaration_keywords: Vec<String>,
    import_markers: Vec<String>,
}

impl AnchorPolicy {
    pub fn new(declaration_keywords: Vec<String>, import_markers: Vec<String>) -> Self {
        Self {
            declaration_keywords,
            import_markers,
        }
    }

    pub fn from_config(config: &SymGraphConfig) -> Self {
        Self::new(
            config.declaration_keywords.clone(),
            config.import_markers.clone(),
        )
    }

    /// Returns `true` if any word of the line is an import marker.
    pub fn is_import_line(&self, line: &str) -> bool {
        line.split(|c: char| !is_identifier_char(c))
            .any(|word| self.import_markers.iter().any(|m| m == word))
    }

    /// Computes the reference query position for `symbol`.
    ///
    /// `line` is the text of the line the anchor sits on, if it could be
    /// read. Returns `None` when the query must be skipped.
    pub fn anchor(&self, symbol: &Symbol, line: Option<&str>) -> Option<Position> {
        let position = symbol.anchor();
        let Some(line) = line else {
            return Some(position);
        };

        if self.is_import_line(line) {
            return None;
        }

        let tail: String = line.chars().skip(position.character as usize).collect();
        for keyword in &self.declaration_keywords {
            let Some(rest) = tail.strip_prefix(keyword.as_str()) else {
                continue;
            };
            if rest.chars().next().is_some_and(|c| !is_identifier_char(c)) {
                let advance = keyword.chars().count() as u32 + 1;
                return Some(Position::new(
                    position.line,
                    position.character + advance,
                ));
            }
        }

        Some(position)
    }
}

impl Default for AnchorPolicy {
    fn default() -> Self {
        Self::from_config(&SymGraphConfig::default())
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
