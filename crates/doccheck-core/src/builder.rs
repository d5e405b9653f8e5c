//! Markdown to document tree
//!
//! Drives `pulldown-cmark` over the source with byte offsets and maps its
//! event stream onto [`Element`] nodes. Container tags open a node, their end
//! tag closes it; leaf events become childless nodes under the innermost open
//! container. Text inside code blocks, metadata blocks and HTML blocks is
//! folded into the block's payload instead of becoming `Text` children.
//!
//! Inline content of tight list items is wrapped in a [`Paragraph`], the same
//! shape a loose item gets from the parser.
//!
//! Tags without an element variant (definition lists, for example) are
//! transparent: their children attach to the nearest enclosing node.

use std::collections::HashSet;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use tracing::trace;

use crate::element::{
    BlockQuote, CodeBlock, CodeSpan, Element, Emphasis, FootnoteDefinition, FootnoteReference,
    FrontMatter, HardBreak, Heading, HtmlBlock, Image, InlineHtml, Link, List, ListItem,
    Paragraph, SoftBreak, Strikethrough, Strong, Table, TableCell, TableHead, TableRow,
    TaskListMarker, Text, ThematicBreak,
};
use crate::source::{LineIndex, SourceRange};
use crate::tree::{DocumentTree, NodeId};

/// Parser extensions enabled for resource documents
pub fn default_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
}

/// Build a document tree with [`default_options`]
pub fn build_document(source: &str) -> DocumentTree {
    build_document_with(source, default_options())
}

pub fn build_document_with(source: &str, options: Options) -> DocumentTree {
    let index = LineIndex::new(source);
    let mut tree = DocumentTree::new(index.full_range());
    let root = tree.root();

    // One entry per open tag; `None` for transparent tags
    let mut open: Vec<Option<NodeId>> = Vec::new();
    let mut wrappers = Wrappers::default();

    for (event, span) in Parser::new_ext(source, options).into_offset_iter() {
        let range = index.range(span.start, span.end);
        let parent = innermost(&open, root);

        match event {
            Event::Start(tag) => {
                let node = element_for_tag(&tag).map(|element| {
                    let parent = if element.is_block() {
                        parent
                    } else {
                        wrappers.inline_parent(&mut tree, parent, range)
                    };
                    tree.append(parent, element, range)
                });
                open.push(node);
            }
            Event::End(_) => {
                open.pop();
            }
            Event::Text(text) => {
                let absorbed = match tree.element_mut(parent) {
                    Element::CodeBlock(block) => {
                        block.literal.push_str(&text);
                        true
                    }
                    Element::FrontMatter(block) => {
                        block.content.push_str(&text);
                        true
                    }
                    Element::HtmlBlock(block) => {
                        block.raw.push_str(&text);
                        true
                    }
                    _ => false,
                };
                if !absorbed {
                    let parent = wrappers.inline_parent(&mut tree, parent, range);
                    tree.append(
                        parent,
                        Text {
                            content: text.to_string(),
                        }
                        .into(),
                        range,
                    );
                }
            }
            Event::Code(code) => {
                let parent = wrappers.inline_parent(&mut tree, parent, range);
                tree.append(
                    parent,
                    CodeSpan {
                        code: code.to_string(),
                    }
                    .into(),
                    range,
                );
            }
            Event::Html(html) => {
                let absorbed = match tree.element_mut(parent) {
                    Element::HtmlBlock(block) => {
                        block.raw.push_str(&html);
                        true
                    }
                    _ => false,
                };
                if !absorbed {
                    tree.append(
                        parent,
                        HtmlBlock {
                            raw: html.to_string(),
                        }
                        .into(),
                        range,
                    );
                }
            }
            Event::InlineHtml(html) => {
                let parent = wrappers.inline_parent(&mut tree, parent, range);
                tree.append(
                    parent,
                    InlineHtml {
                        raw: html.to_string(),
                    }
                    .into(),
                    range,
                );
            }
            Event::FootnoteReference(label) => {
                let parent = wrappers.inline_parent(&mut tree, parent, range);
                tree.append(
                    parent,
                    FootnoteReference {
                        label: label.to_string(),
                    }
                    .into(),
                    range,
                );
            }
            Event::SoftBreak => {
                let parent = wrappers.inline_parent(&mut tree, parent, range);
                tree.append(parent, SoftBreak.into(), range);
            }
            Event::HardBreak => {
                let parent = wrappers.inline_parent(&mut tree, parent, range);
                tree.append(parent, HardBreak.into(), range);
            }
            Event::Rule => {
                tree.append(parent, ThematicBreak.into(), range);
            }
            Event::TaskListMarker(checked) => {
                let parent = wrappers.inline_parent(&mut tree, parent, range);
                tree.append(parent, TaskListMarker { checked }.into(), range);
            }
            other => {
                trace!(?other, "skipping unmapped markdown event");
            }
        }
    }

    tree
}

fn innermost(open: &[Option<NodeId>], root: NodeId) -> NodeId {
    open.iter().rev().find_map(|node| *node).unwrap_or(root)
}

/// Paragraphs added around the inline content of tight list items
///
/// pulldown-cmark emits the text of a tight list item straight under the
/// item. Every run of inline content directly under an item is collected
/// into one paragraph so tight and loose lists have the same shape.
#[derive(Default)]
struct Wrappers {
    paragraphs: HashSet<NodeId>,
}

impl Wrappers {
    /// Node that inline content arriving under `parent` attaches to
    fn inline_parent(
        &mut self,
        tree: &mut DocumentTree,
        parent: NodeId,
        range: SourceRange,
    ) -> NodeId {
        if tree.get::<ListItem>(parent).is_none() {
            return parent;
        }
        if let Some(last) = tree.children(parent).last().copied() {
            if self.paragraphs.contains(&last) {
                tree.extend_range(last, range.end);
                return last;
            }
        }
        let paragraph = tree.append(parent, Paragraph.into(), range);
        self.paragraphs.insert(paragraph);
        paragraph
    }
}

fn element_for_tag(tag: &Tag<'_>) -> Option<Element> {
    let element = match tag {
        Tag::Paragraph => Paragraph.into(),
        Tag::Heading { level, .. } => Heading {
            level: heading_level(*level),
        }
        .into(),
        Tag::BlockQuote(_) => BlockQuote.into(),
        Tag::CodeBlock(kind) => CodeBlock {
            info: match kind {
                CodeBlockKind::Fenced(info) if !info.trim().is_empty() => {
                    Some(info.trim().to_string())
                }
                _ => None,
            },
            literal: String::new(),
        }
        .into(),
        Tag::HtmlBlock => HtmlBlock::default().into(),
        Tag::List(start) => List {
            ordered: start.is_some(),
            start: *start,
        }
        .into(),
        Tag::Item => ListItem.into(),
        Tag::FootnoteDefinition(label) => FootnoteDefinition {
            label: label.to_string(),
        }
        .into(),
        Tag::Table(_) => Table.into(),
        Tag::TableHead => TableHead.into(),
        Tag::TableRow => TableRow.into(),
        Tag::TableCell => TableCell.into(),
        Tag::Emphasis => Emphasis.into(),
        Tag::Strong => Strong.into(),
        Tag::Strikethrough => Strikethrough.into(),
        Tag::Link {
            dest_url, title, ..
        } => Link {
            destination: dest_url.to_string(),
            title: title.to_string(),
        }
        .into(),
        Tag::Image {
            dest_url, title, ..
        } => Image {
            destination: dest_url.to_string(),
            title: title.to_string(),
        }
        .into(),
        Tag::MetadataBlock(_) => FrontMatter::default().into(),
        _ => return None,
    };
    Some(element)
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
