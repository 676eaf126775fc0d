//! Structured model for formatted advice text.
//!
//! Advice arrives as lightly marked-up plain text (`### ` headings, `**bold**`,
//! numbered and dashed list lines). It is parsed into a small tree that
//! renderers walk, instead of being spliced into markup strings.

/// Inline run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Bold(String),
}

/// Block-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(Vec<Span>),
    Paragraph(Vec<Span>),
    ListItem { ordered: bool, spans: Vec<Span> },
    /// One or more blank lines.
    Break,
}

/// Parse advice text into blocks.
pub fn parse(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();

    let flush = |paragraph: &mut Vec<String>, blocks: &mut Vec<Block>| {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(parse_inline(&paragraph.join(" "))));
            paragraph.clear();
        }
    };

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            flush(&mut paragraph, &mut blocks);
            if !matches!(blocks.last(), Some(Block::Break) | None) {
                blocks.push(Block::Break);
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("###") {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading(parse_inline(rest.trim())));
        } else if let Some(rest) = ordered_item(line) {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block::ListItem {
                ordered: true,
                spans: parse_inline(rest),
            });
        } else if let Some(rest) = line.strip_prefix('-') {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block::ListItem {
                ordered: false,
                spans: parse_inline(rest.trim_start()),
            });
        } else {
            paragraph.push(line.to_string());
        }
    }
    flush(&mut paragraph, &mut blocks);
    if matches!(blocks.last(), Some(Block::Break)) {
        blocks.pop();
    }
    blocks
}

/// `12. text` → `text`.
fn ordered_item(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix('.').map(str::trim_start)
}

/// Split `**bold**` runs out of a line. An unmatched `**` stays literal.
pub fn parse_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("**") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("**") else {
            break;
        };
        if open > 0 {
            spans.push(Span::Text(rest[..open].to_string()));
        }
        spans.push(Span::Bold(after[..close].to_string()));
        rest = &after[close + 2..];
    }
    if !rest.is_empty() {
        spans.push(Span::Text(rest.to_string()));
    }
    spans
}

/// Flatten spans back to plain text.
pub fn plain(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|s| match s {
            Span::Text(t) | Span::Bold(t) => t.as_str(),
        })
        .collect()
}
