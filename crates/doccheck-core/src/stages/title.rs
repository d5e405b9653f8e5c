//! Title stage
//!
//! The title section runs from the first level-1 heading up to the first
//! level-2 heading after it, in document order. It must contain a paragraph
//! with some visible text.

use tracing::debug;

use crate::diagnostics::{Diagnostic, Rule};
use crate::element::{Element, Heading, Paragraph};
use crate::error::CheckResult;
use crate::stage::{keys, Stage, StageInputs, StagePayload};
use crate::tree::{DocumentTree, NodeId};

use super::names;

const NODE_TYPE: &str = "Title";

#[derive(Debug, Clone, Copy, Default)]
pub struct TitleStage;

impl Stage for TitleStage {
    fn name(&self) -> &'static str {
        names::TITLE
    }

    fn description(&self) -> &'static str {
        "Require a level-1 title followed by a description paragraph"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![names::FRONT_MATTER]
    }

    fn diagnostics_key(&self) -> &'static str {
        keys::TITLE_DIAGNOSTICS
    }

    fn run(&self, inputs: &mut StageInputs) -> CheckResult<Vec<StagePayload>> {
        let file_id = inputs.text(keys::FILE_ID)?;
        let tree = inputs.tree(keys::WORKING_DOCUMENT)?;
        let diagnostics = check_title(file_id, tree);
        debug!(file = %file_id, findings = diagnostics.len(), "checked title section");

        Ok(vec![StagePayload::diagnostics(
            self.name(),
            keys::TITLE_DIAGNOSTICS,
            diagnostics,
        )])
    }
}

pub fn check_title(file_id: &str, tree: &DocumentTree) -> Vec<Diagnostic> {
    let root = tree.root();
    let Some(h1) = tree
        .query()
        .all()
        .filter::<Heading>(|h| h.level == 1)
        .first()
    else {
        return vec![Diagnostic::new(
            Rule::TitleMissingH1,
            file_id,
            "Document has no level-1 title heading",
        )
        .with_range(tree.range(root))
        .with_node_type(NODE_TYPE)];
    };

    let order = tree.preorder(root);
    let Some(start) = order.iter().position(|id| *id == h1) else {
        return Vec::new();
    };
    let section = &order[start + 1..];
    let end = section
        .iter()
        .position(|id| tree.get::<Heading>(*id).is_some_and(|h| h.level == 2))
        .unwrap_or(section.len());

    let described = section[..end].iter().any(|id| {
        tree.get::<Paragraph>(*id).is_some() && !collect_inline_text(tree, *id).trim().is_empty()
    });
    if described {
        return Vec::new();
    }

    let title = collect_inline_text(tree, h1);
    vec![Diagnostic::new(
        Rule::TitleMissingDescription,
        file_id,
        format!(
            "Title '{}' must be followed by a description paragraph",
            title.trim()
        ),
    )
    .with_range(tree.range(h1))
    .with_node(h1)
    .with_node_type(NODE_TYPE)]
}

/// Text and inline code under `id`, concatenated in document order
pub fn collect_inline_text(tree: &DocumentTree, id: NodeId) -> String {
    let mut out = String::new();
    let mut stack: Vec<NodeId> = tree.children(id).iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        match tree.element(node) {
            Element::Text(text) => out.push_str(&text.content),
            Element::CodeSpan(code) => out.push_str(&code.code),
            _ => stack.extend(tree.children(node).iter().rev().copied()),
        }
    }
    out
}
