//! Document elements
//!
//! Closed set of block and inline variants a document tree node can carry.
//! Every variant has its own payload struct so queries can be typed:
//! `tree.query().all().filter::<Heading>(|h| h.level == 1)` projects each
//! node's [`Element`] onto the `Heading` payload and skips everything else.

use serde::Serialize;

// =============================================================================
// BLOCK PAYLOADS
// =============================================================================

/// Root of a document tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document;

/// ATX or setext heading; `level` is in `1..=6`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Paragraph;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockQuote;

/// Fenced or indented code block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    /// Info string of a fenced block (`hcl`, `bash`, ...); `None` when indented
    pub info: Option<String>,
    pub literal: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct List {
    pub ordered: bool,
    /// First number of an ordered list
    pub start: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListItem;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThematicBreak;

/// YAML metadata block recognised by the parser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrontMatter {
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HtmlBlock {
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableHead;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableRow;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableCell;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FootnoteDefinition {
    pub label: String,
}

// =============================================================================
// INLINE PAYLOADS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Text {
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodeSpan {
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Emphasis;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Strong;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Strikethrough;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Link {
    pub destination: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Image {
    pub destination: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InlineHtml {
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SoftBreak;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HardBreak;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FootnoteReference {
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskListMarker {
    pub checked: bool,
}

// =============================================================================
// ELEMENT - THE CORE ENUM
// =============================================================================

/// Payload carried by every document tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Element {
    // Blocks
    Document(Document),
    Heading(Heading),
    Paragraph(Paragraph),
    BlockQuote(BlockQuote),
    CodeBlock(CodeBlock),
    List(List),
    ListItem(ListItem),
    ThematicBreak(ThematicBreak),
    FrontMatter(FrontMatter),
    HtmlBlock(HtmlBlock),
    Table(Table),
    TableHead(TableHead),
    TableRow(TableRow),
    TableCell(TableCell),
    FootnoteDefinition(FootnoteDefinition),

    // Inlines
    Text(Text),
    CodeSpan(CodeSpan),
    Emphasis(Emphasis),
    Strong(Strong),
    Strikethrough(Strikethrough),
    Link(Link),
    Image(Image),
    InlineHtml(InlineHtml),
    SoftBreak(SoftBreak),
    HardBreak(HardBreak),
    FootnoteReference(FootnoteReference),
    TaskListMarker(TaskListMarker),
}

impl Element {
    /// Stable lower-camel-case tag, used as a diagnostic node type
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Document(_) => "document",
            Element::Heading(_) => "heading",
            Element::Paragraph(_) => "paragraph",
            Element::BlockQuote(_) => "blockQuote",
            Element::CodeBlock(_) => "codeBlock",
            Element::List(_) => "list",
            Element::ListItem(_) => "listItem",
            Element::ThematicBreak(_) => "thematicBreak",
            Element::FrontMatter(_) => "frontMatter",
            Element::HtmlBlock(_) => "htmlBlock",
            Element::Table(_) => "table",
            Element::TableHead(_) => "tableHead",
            Element::TableRow(_) => "tableRow",
            Element::TableCell(_) => "tableCell",
            Element::FootnoteDefinition(_) => "footnoteDefinition",
            Element::Text(_) => "text",
            Element::CodeSpan(_) => "codeSpan",
            Element::Emphasis(_) => "emphasis",
            Element::Strong(_) => "strong",
            Element::Strikethrough(_) => "strikethrough",
            Element::Link(_) => "link",
            Element::Image(_) => "image",
            Element::InlineHtml(_) => "inlineHtml",
            Element::SoftBreak(_) => "softBreak",
            Element::HardBreak(_) => "hardBreak",
            Element::FootnoteReference(_) => "footnoteReference",
            Element::TaskListMarker(_) => "taskListMarker",
        }
    }

    /// Block-level elements; everything else is inline
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Element::Document(_)
                | Element::Heading(_)
                | Element::Paragraph(_)
                | Element::BlockQuote(_)
                | Element::CodeBlock(_)
                | Element::List(_)
                | Element::ListItem(_)
                | Element::ThematicBreak(_)
                | Element::FrontMatter(_)
                | Element::HtmlBlock(_)
                | Element::Table(_)
                | Element::TableHead(_)
                | Element::TableRow(_)
                | Element::TableCell(_)
                | Element::FootnoteDefinition(_)
        )
    }

    /// Heading level, if this is a heading
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            Element::Heading(h) => Some(h.level),
            _ => None,
        }
    }
}

// =============================================================================
// TYPED PROJECTION
// =============================================================================

/// A payload type that can be projected out of an [`Element`]
pub trait ElementVariant: Sized {
    fn project(element: &Element) -> Option<&Self>;
}

macro_rules! element_variants {
    ($($variant:ident),* $(,)?) => {
        $(
            impl ElementVariant for $variant {
                fn project(element: &Element) -> Option<&Self> {
                    match element {
                        Element::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }

            impl From<$variant> for Element {
                fn from(inner: $variant) -> Self {
                    Element::$variant(inner)
                }
            }
        )*
    };
}

element_variants!(
    Document,
    Heading,
    Paragraph,
    BlockQuote,
    CodeBlock,
    List,
    ListItem,
    ThematicBreak,
    FrontMatter,
    HtmlBlock,
    Table,
    TableHead,
    TableRow,
    TableCell,
    FootnoteDefinition,
    Text,
    CodeSpan,
    Emphasis,
    Strong,
    Strikethrough,
    Link,
    Image,
    InlineHtml,
    SoftBreak,
    HardBreak,
    FootnoteReference,
    TaskListMarker,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_matches_variant() {
        let element = Element::from(Heading { level: 2 });
        assert_eq!(Heading::project(&element).map(|h| h.level), Some(2));
        assert!(Paragraph::project(&element).is_none());
    }

    #[test]
    fn test_kind_and_block_flag() {
        let text = Element::from(Text {
            content: "x".into(),
        });
        assert_eq!(text.kind(), "text");
        assert!(!text.is_block());
        assert!(Element::from(Paragraph).is_block());
        assert_eq!(Element::from(Heading { level: 1 }).heading_level(), Some(1));
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let json = serde_json::to_value(Element::from(CodeSpan {
            code: "id".into(),
        }))
        .unwrap();
        assert_eq!(json["type"], "codeSpan");
        assert_eq!(json["code"], "id");
    }
}
