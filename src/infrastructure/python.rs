//! Python source parser backed by tree-sitter.

use std::sync::Mutex;

use tracing::{debug, instrument, trace, warn};
use tree_sitter::{Node, Parser};

use crate::domain::{clean_docstring, ExportList, Symbol};
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::{ImportedName, ParsedSource, SourceParser};

const EXPORTS_NAME: &str = "__all__";

/// tree-sitter-python parser.
///
/// The underlying parser needs `&mut`; it sits behind a mutex so one
/// instance can be shared through the service container.
pub struct TreeSitterParser {
    parser: Mutex<Parser>,
}

impl TreeSitterParser {
    pub fn new() -> InfraResult<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| InfraError::Grammar {
                message: e.to_string(),
            })?;
        Ok(Self {
            parser: Mutex::new(parser),
        })
    }
}

impl std::fmt::Debug for TreeSitterParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSitterParser").finish_non_exhaustive()
    }
}

impl SourceParser for TreeSitterParser {
    #[instrument(level = "trace", skip_all, fields(bytes = source.len()))]
    fn parse(&self, source: &str) -> Result<ParsedSource, String> {
        let tree = {
            let mut parser = self
                .parser
                .lock()
                .map_err(|e| format!("parser lock poisoned: {e}"))?;
            parser
                .parse(source, None)
                .ok_or_else(|| "tree-sitter returned no tree".to_string())?
        };
        let root = tree.root_node();

        let mut block = Block::default();
        collect_block(root, source, false, &mut block);

        let parsed = ParsedSource {
            docstring: block_docstring(root, source),
            exports: block.exports,
            symbols: block.symbols,
            imports: block.imports,
            has_errors: root.has_error(),
        };
        debug!(
            "parsed {} symbols, {} imports",
            parsed.symbols.len(),
            parsed.imports.len()
        );
        Ok(parsed)
    }
}

#[derive(Default)]
struct Block {
    symbols: Vec<Symbol>,
    exports: Option<ExportList>,
    imports: Vec<ImportedName>,
}

fn text<'s>(node: Node, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

/// Statements of a block, comments skipped.
fn statements<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

fn first_named<'t>(node: Node<'t>) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let first = node.named_children(&mut cursor).find(|n| n.kind() != "comment");
    first
}

/// The string literal carried by a bare expression statement, if any.
fn statement_string(stmt: Node, source: &str) -> Option<String> {
    if stmt.kind() != "expression_statement" {
        return None;
    }
    let expr = first_named(stmt)?;
    match expr.kind() {
        "string" => Some(string_value(text(expr, source))),
        "concatenated_string" => {
            let mut cursor = expr.walk();
            let joined = expr
                .named_children(&mut cursor)
                .filter(|n| n.kind() == "string")
                .map(|n| string_value(text(n, source)))
                .collect::<String>();
            Some(joined)
        }
        _ => None,
    }
}

/// Docstring of a module root or a definition body.
fn block_docstring(block: Node, source: &str) -> Option<String> {
    let first = statements(block).into_iter().next()?;
    statement_string(first, source)
        .map(|raw| clean_docstring(&raw))
        .filter(|doc| !doc.is_empty())
}

fn definition_docstring(def: Node, source: &str) -> Option<String> {
    def.child_by_field_name("body")
        .and_then(|body| block_docstring(body, source))
}

/// Value of a Python string literal: prefix letters and quotes stripped.
fn string_value(literal: &str) -> String {
    let body = literal.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if body.len() >= 2 * quote.len() && body.starts_with(quote) && body.ends_with(quote) {
            return body[quote.len()..body.len() - quote.len()].to_string();
        }
    }
    body.to_string()
}

/// Items of a list or tuple made only of string literals.
///
/// `None` for anything else (`other.__all__ + [...]`, `list(...)`, splats).
fn string_items(node: Node, source: &str) -> Option<Vec<String>> {
    match node.kind() {
        "list" | "tuple" | "parenthesized_expression" => {
            let mut cursor = node.walk();
            node.named_children(&mut cursor)
                .filter(|n| n.kind() != "comment")
                .map(|n| (n.kind() == "string").then(|| string_value(text(n, source))))
                .collect()
        }
        _ => None,
    }
}

fn collect_block(block: Node, source: &str, in_class: bool, out: &mut Block) {
    let stmts = statements(block);
    for (i, stmt) in stmts.iter().enumerate() {
        let stmt = *stmt;
        match stmt.kind() {
            "function_definition" | "class_definition" => {
                if let Some(symbol) = definition(stmt, source) {
                    out.symbols.push(symbol);
                }
            }
            "decorated_definition" => {
                if let Some(symbol) = stmt
                    .child_by_field_name("definition")
                    .and_then(|def| definition(def, source))
                {
                    out.symbols.push(symbol);
                }
            }
            "expression_statement" => {
                let Some(expr) = first_named(stmt) else {
                    continue;
                };
                match expr.kind() {
                    "assignment" => {
                        let attribute_doc = stmts
                            .get(i + 1)
                            .and_then(|next| statement_string(*next, source))
                            .map(|raw| clean_docstring(&raw))
                            .filter(|doc| !doc.is_empty());
                        assignment(expr, source, in_class, attribute_doc, out);
                    }
                    "augmented_assignment" => augmented_assignment(expr, source, in_class, out),
                    _ => {}
                }
            }
            "import_from_statement" if !in_class => {
                out.imports.extend(import_from(stmt, source));
            }
            other => trace!("skipping {} statement", other),
        }
    }
}

fn definition(def: Node, source: &str) -> Option<Symbol> {
    let name = text(def.child_by_field_name("name")?, source);
    let docstring = definition_docstring(def, source);

    let mut symbol = match def.kind() {
        "function_definition" => Symbol::function(name),
        "class_definition" => {
            let mut members = Block::default();
            if let Some(body) = def.child_by_field_name("body") {
                collect_block(body, source, true, &mut members);
            }
            Symbol::class(name).with_members(members.symbols)
        }
        _ => return None,
    };
    symbol.docstring = docstring;
    Some(symbol)
}

fn assignment(
    expr: Node,
    source: &str,
    in_class: bool,
    docstring: Option<String>,
    out: &mut Block,
) {
    let Some(left) = expr.child_by_field_name("left") else {
        return;
    };
    if left.kind() != "identifier" {
        return;
    }
    let name = text(left, source);

    if name == EXPORTS_NAME {
        if !in_class {
            let right = expr.child_by_field_name("right");
            out.exports = right
                .and_then(|right| string_items(right, source))
                .map(ExportList::new);
            if out.exports.is_none() {
                warn!(
                    "{} = {} is not a literal list, falling back to name prefixes",
                    EXPORTS_NAME,
                    right.map(|r| text(r, source)).unwrap_or_default()
                );
            }
        }
        return;
    }

    let mut constant = Symbol::constant(name);
    constant.docstring = docstring;
    out.symbols.push(constant);
}

fn augmented_assignment(expr: Node, source: &str, in_class: bool, out: &mut Block) {
    let (Some(left), Some(op), Some(right)) = (
        expr.child_by_field_name("left"),
        expr.child_by_field_name("operator"),
        expr.child_by_field_name("right"),
    ) else {
        return;
    };
    if in_class || text(left, source) != EXPORTS_NAME || text(op, source) != "+=" {
        return;
    }
    match string_items(right, source) {
        Some(names) => out
            .exports
            .get_or_insert_with(ExportList::default)
            .extend(names),
        None => {
            warn!(
                "{} += {} is not a literal list, falling back to name prefixes",
                EXPORTS_NAME,
                text(right, source)
            );
            out.exports = None;
        }
    }
}

fn import_from(stmt: Node, source: &str) -> Vec<ImportedName> {
    let Some(module) = stmt.child_by_field_name("module_name") else {
        return Vec::new();
    };
    let module = text(module, source).to_string();

    let mut cursor = stmt.walk();
    let names: Vec<Node> = stmt.children_by_field_name("name", &mut cursor).collect();
    if names.is_empty() {
        trace!("wildcard import from {} ignored", module);
    }

    names
        .into_iter()
        .filter_map(|node| match node.kind() {
            "dotted_name" => Some(ImportedName {
                module: module.clone(),
                name: text(node, source).to_string(),
                alias: None,
            }),
            "aliased_import" => Some(ImportedName {
                module: module.clone(),
                name: text(node.child_by_field_name("name")?, source).to_string(),
                alias: node
                    .child_by_field_name("alias")
                    .map(|a| text(a, source).to_string()),
            }),
            _ => None,
        })
        .collect()
}
