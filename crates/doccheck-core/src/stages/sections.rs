//! Sections stage
//!
//! Checks the level-2 section layout of the document as parsed. Every
//! required section must be present, the title and the required sections must
//! appear in the configured order, and a described section must open with a
//! paragraph of text before any further heading.
//!
//! Only top-level blocks count: a heading inside a block quote or list is not
//! a section.

use tracing::debug;

use crate::diagnostics::{Diagnostic, Rule};
use crate::element::{Heading, Paragraph};
use crate::error::CheckResult;
use crate::stage::{keys, Stage, StageInputs, StagePayload};
use crate::tree::{DocumentTree, NodeId};

use super::names;
use super::title::collect_inline_text;

const DOCUMENT_NODE: &str = "Document";
const HEADING_NODE: &str = "Heading";

pub struct SectionsStage {
    required: Vec<String>,
    described: Vec<String>,
}

/// A located heading: label for messages, top-level index, node
struct Placed {
    label: String,
    index: usize,
    node: NodeId,
}

impl SectionsStage {
    pub fn new(required: Vec<String>, described: Vec<String>) -> Self {
        Self {
            required,
            described,
        }
    }

    pub fn check(&self, file_id: &str, tree: &DocumentTree) -> Vec<Diagnostic> {
        let root = tree.root();
        let top = tree.children(root);
        let mut diagnostics = Vec::new();

        let mut placed = Vec::new();
        if let Some(index) = top
            .iter()
            .position(|id| tree.get::<Heading>(*id).is_some_and(|h| h.level == 1))
        {
            placed.push(Placed {
                label: "the title".to_string(),
                index,
                node: top[index],
            });
        }

        for name in &self.required {
            match find_section(tree, name) {
                Some(index) => placed.push(Placed {
                    label: format!("'{}'", name),
                    index,
                    node: top[index],
                }),
                None => diagnostics.push(
                    Diagnostic::new(
                        Rule::StructureMissingSection,
                        file_id,
                        format!("Document is missing required '{}' section", name),
                    )
                    .with_range(tree.range(root))
                    .with_node_type(DOCUMENT_NODE),
                ),
            }
        }

        if !self.required.is_empty() {
            for pair in placed.windows(2) {
                let (before, after) = (&pair[0], &pair[1]);
                if before.index > after.index {
                    diagnostics.push(
                        Diagnostic::new(
                            Rule::StructureSectionOrder,
                            file_id,
                            format!(
                                "Section order is incorrect: {} must come before {}",
                                before.label, after.label
                            ),
                        )
                        .with_range(tree.range(before.node))
                        .with_node(before.node)
                        .with_node_type(HEADING_NODE),
                    );
                }
            }
        }

        for name in &self.described {
            let Some(index) = find_section(tree, name) else {
                continue;
            };
            if !opens_with_paragraph(tree, &top[index + 1..]) {
                let heading = top[index];
                diagnostics.push(
                    Diagnostic::new(
                        Rule::StructureMissingSectionDescription,
                        file_id,
                        format!("Section '{}' must open with a description paragraph", name),
                    )
                    .with_range(tree.range(heading))
                    .with_node(heading)
                    .with_node_type(HEADING_NODE),
                );
            }
        }

        diagnostics
    }
}

impl Stage for SectionsStage {
    fn name(&self) -> &'static str {
        names::SECTIONS
    }

    fn description(&self) -> &'static str {
        "Require the configured level-2 sections, in order, with descriptions"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![names::PARSING]
    }

    fn diagnostics_key(&self) -> &'static str {
        keys::SECTIONS_DIAGNOSTICS
    }

    fn run(&self, inputs: &mut StageInputs) -> CheckResult<Vec<StagePayload>> {
        let file_id = inputs.text(keys::FILE_ID)?;
        let tree = inputs.tree(keys::ORIGINAL_DOCUMENT)?;
        let diagnostics = self.check(file_id, tree);
        debug!(file = %file_id, findings = diagnostics.len(), "checked section layout");

        Ok(vec![StagePayload::diagnostics(
            self.name(),
            keys::SECTIONS_DIAGNOSTICS,
            diagnostics,
        )])
    }
}

/// Top-level index of the first level-2 heading titled `name`, ignoring case
/// and surrounding whitespace
pub fn find_section(tree: &DocumentTree, name: &str) -> Option<usize> {
    let wanted = name.trim().to_lowercase();
    tree.children(tree.root()).iter().position(|id| {
        tree.get::<Heading>(*id).is_some_and(|h| h.level == 2)
            && collect_inline_text(tree, *id).trim().to_lowercase() == wanted
    })
}

/// Does a non-blank paragraph come before the next heading? Other blocks,
/// lists included, are skipped.
fn opens_with_paragraph(tree: &DocumentTree, following: &[NodeId]) -> bool {
    for id in following {
        if tree.get::<Heading>(*id).is_some() {
            return false;
        }
        if tree.get::<Paragraph>(*id).is_some() {
            return !collect_inline_text(tree, *id).trim().is_empty();
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_document;
    use crate::config::types::{DESCRIBED_SECTIONS, RESOURCE_SECTIONS};
    use crate::reader::MemoryReader;
    use crate::stages::ParsingStage;
    use pretty_assertions::assert_eq;

    const PAGE: &str = "---\ndescription: |-\n  Use this resource to manage a VPC within HuaweiCloud.\n---\n\
# huaweicloud_vpc\n\nManages a VPC resource.\n\n\
## Example Usage\n\n```hcl\nresource \"huaweicloud_vpc\" \"vpc\" {}\n```\n\n\
## Argument Reference\n\nThe following arguments are supported:\n\n* `name` - (Required, String) The name.\n\n\
## Attribute Reference\n\nIn addition to all arguments above, the following attributes are exported:\n\n* `id` - The ID.\n";

    fn stage() -> SectionsStage {
        SectionsStage::new(
            RESOURCE_SECTIONS.iter().map(|s| s.to_string()).collect(),
            DESCRIBED_SECTIONS.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn rules(diagnostics: &[Diagnostic]) -> Vec<Rule> {
        diagnostics.iter().map(|d| d.rule_id).collect()
    }

    #[test]
    fn test_complete_page_is_clean() {
        let tree = build_document(PAGE);
        assert!(stage().check("a.md", &tree).is_empty());
    }

    #[test]
    fn test_unconfigured_stage_reports_nothing() {
        let tree = build_document("Just text.\n");
        let stage = SectionsStage::new(Vec::new(), Vec::new());
        assert!(stage.check("a.md", &tree).is_empty());
    }

    #[test]
    fn test_each_missing_section_is_reported() {
        let tree = build_document("# Title\n\nBody.\n\n## Argument Reference\n\nArguments:\n");
        let diagnostics = stage().check("a.md", &tree);
        assert_eq!(
            rules(&diagnostics),
            vec![Rule::StructureMissingSection, Rule::StructureMissingSection]
        );
        assert!(diagnostics[0].message.contains("'Example Usage'"));
        assert!(diagnostics[1].message.contains("'Attribute Reference'"));
        assert_eq!(diagnostics[0].range, Some(tree.range(tree.root())));
        assert_eq!(diagnostics[0].node_type.as_deref(), Some("Document"));
    }

    #[test]
    fn test_swapped_sections_report_order() {
        let source = PAGE
            .replace("## Argument Reference", "## Placeholder")
            .replace("## Attribute Reference", "## Argument Reference")
            .replace("## Placeholder", "## Attribute Reference");
        let tree = build_document(&source);
        let diagnostics = stage().check("a.md", &tree);
        assert_eq!(rules(&diagnostics), vec![Rule::StructureSectionOrder]);
        assert_eq!(
            diagnostics[0].message,
            "Section order is incorrect: 'Argument Reference' must come before 'Attribute Reference'"
        );

        let top = tree.children(tree.root());
        let arguments = top[find_section(&tree, "Argument Reference").unwrap()];
        assert_eq!(diagnostics[0].node_id, Some(arguments.to_string()));
        assert_eq!(diagnostics[0].range, Some(tree.range(arguments)));
    }

    #[test]
    fn test_title_must_precede_sections() {
        let source = "## Example Usage\n\nx\n\n# Title\n\nBody.\n\n## Argument Reference\n\nArgs.\n\n## Attribute Reference\n\nAttrs.\n";
        let tree = build_document(source);
        let diagnostics = stage().check("a.md", &tree);
        assert_eq!(rules(&diagnostics), vec![Rule::StructureSectionOrder]);
        assert!(diagnostics[0].message.contains("the title must come before 'Example Usage'"));
    }

    #[test]
    fn test_heading_match_ignores_case_and_padding() {
        let tree = build_document("# T\n\n## example usage \n\n## ARGUMENT REFERENCE\n");
        assert_eq!(find_section(&tree, "Example Usage"), Some(1));
        assert_eq!(find_section(&tree, " Argument Reference"), Some(2));
        assert_eq!(find_section(&tree, "Attribute Reference"), None);
    }

    #[test]
    fn test_nested_heading_is_not_a_section() {
        let tree = build_document("# T\n\n> ## Example Usage\n");
        assert_eq!(find_section(&tree, "Example Usage"), None);
    }

    #[test]
    fn test_list_before_description_is_skipped() {
        let tree = build_document(
            "## Argument Reference\n\n* `name` - The name.\n\nThe arguments above are supported.\n",
        );
        let stage = SectionsStage::new(Vec::new(), vec!["Argument Reference".to_string()]);
        assert!(stage.check("a.md", &tree).is_empty());
    }

    #[test]
    fn test_section_without_description() {
        let source = PAGE.replace("The following arguments are supported:\n\n", "");
        let tree = build_document(&source);
        let diagnostics = stage().check("a.md", &tree);
        assert_eq!(
            rules(&diagnostics),
            vec![Rule::StructureMissingSectionDescription]
        );
        assert!(diagnostics[0].message.contains("'Argument Reference'"));
        assert_eq!(diagnostics[0].node_type.as_deref(), Some("Heading"));
    }

    #[test]
    fn test_description_cut_off_by_next_heading() {
        let tree = build_document("## Attribute Reference\n\n### Nested\n\nToo late.\n");
        let stage = SectionsStage::new(Vec::new(), vec!["Attribute Reference".to_string()]);
        assert_eq!(
            rules(&stage.check("a.md", &tree)),
            vec![Rule::StructureMissingSectionDescription]
        );
    }

    #[test]
    fn test_stage_reads_original_tree() {
        let reader = MemoryReader::new().with("a.md", PAGE);
        let mut inputs = StageInputs::for_file("a.md");
        let parsed = ParsingStage::new(reader).run(&mut inputs).unwrap();
        inputs.extend(parsed);

        inputs.begin_stage(names::SECTIONS);
        let payloads = stage().run(&mut inputs).unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].name, keys::SECTIONS_DIAGNOSTICS);
        inputs.extend(payloads);
        assert!(inputs
            .diagnostics(keys::SECTIONS_DIAGNOSTICS)
            .unwrap()
            .is_empty());
    }
}
