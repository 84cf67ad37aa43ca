use serde_json::Value;

/// The searchable text a content block contributes, by where it comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockText {
    /// Any block carrying a `rich_text` array (paragraphs, headings, list items, ...).
    RichText(String),
    /// The expression of an equation block.
    Equation(String),
    /// The title of a child page.
    ChildPage(String),
    /// Dividers, images and other blocks without text.
    Empty,
}

impl BlockText {
    pub fn as_str(&self) -> &str {
        match self {
            BlockText::RichText(text) | BlockText::Equation(text) | BlockText::ChildPage(text) => {
                text
            }
            BlockText::Empty => "",
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

/// The parts of a block-children entry the text walker needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNode {
    pub id: String,
    pub has_children: bool,
    pub text: BlockText,
}

impl BlockNode {
    pub fn from_json(raw: &Value) -> Self {
        Self {
            id: raw
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string(),
            has_children: raw
                .get("has_children")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            text: block_text(raw),
        }
    }
}

fn block_text(raw: &Value) -> BlockText {
    let Some(block_type) = raw.get("type").and_then(Value::as_str) else {
        return BlockText::Empty;
    };
    let data = raw.get(block_type);

    if let Some(runs) = data.and_then(|d| d.get("rich_text")).and_then(Value::as_array) {
        let text: String = runs
            .iter()
            .filter_map(|run| run.get("plain_text").and_then(Value::as_str))
            .collect();
        let text = text.trim();
        if !text.is_empty() {
            return BlockText::RichText(text.to_string());
        }
    }

    let field = match block_type {
        "equation" => "expression",
        "child_page" => "title",
        _ => return BlockText::Empty,
    };
    let text = data
        .and_then(|d| d.get(field))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim();
    match (block_type, text.is_empty()) {
        (_, true) => BlockText::Empty,
        ("equation", false) => BlockText::Equation(text.to_string()),
        _ => BlockText::ChildPage(text.to_string()),
    }
}
