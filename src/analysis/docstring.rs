//! Docstring extraction.
//!
//! A docstring is the first statement of a body when that statement is a
//! plain string literal (implicit concatenation allowed, bytes and f-strings
//! excluded). The literal is evaluated and then cleaned like
//! `inspect.cleandoc`: tabs expanded, the first line stripped, the common
//! indentation of the remaining lines removed, and leading/trailing blank
//! lines dropped.

use tree_sitter::Node;

use super::ParsedSource;

/// Extract the cleaned docstring of a body block, if any.
pub fn extract(parsed: &ParsedSource, body: Node) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|node| node.kind() != "comment")?;

    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }

    let expr = first.named_child(0)?;
    let value = match expr.kind() {
        "string" => evaluate_literal(parsed.node_text(expr))?,
        "concatenated_string" => {
            let mut value = String::new();
            let mut parts = expr.walk();
            for part in expr.named_children(&mut parts) {
                if part.kind() == "comment" {
                    continue;
                }
                value.push_str(&evaluate_literal(parsed.node_text(part))?);
            }
            value
        }
        _ => return None,
    };

    Some(clean(&value))
}

/// Evaluate a single string literal. Returns `None` for bytes and f-strings.
pub fn evaluate_literal(text: &str) -> Option<String> {
    let quote_pos = text.find(['"', '\''])?;
    let prefix = text[..quote_pos].to_ascii_lowercase();
    if prefix.contains('b') || prefix.contains('f') {
        return None;
    }
    let raw = prefix.contains('r');

    let body = &text[quote_pos..];
    let delimiter = if body.starts_with("\"\"\"") || body.starts_with("'''") {
        &body[..3]
    } else {
        &body[..1]
    };
    if body.len() < delimiter.len() * 2 || !body.ends_with(delimiter) {
        return None;
    }

    let inner = body[delimiter.len()..body.len() - delimiter.len()].replace("\r\n", "\n");
    if raw {
        Some(inner)
    } else {
        Some(unescape(&inner))
    }
}

fn unescape(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            None => out.push('\\'),
            Some('\n') => {}
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\x0b'),
            Some(d @ '0'..='7') => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            Some(kind @ ('x' | 'u' | 'U')) => {
                let width = match kind {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let mut digits = String::with_capacity(width);
                while digits.len() < width {
                    match chars.peek() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            digits.push(*c);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                let decoded = if digits.len() == width {
                    u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)
                } else {
                    None
                };
                match decoded {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('\\');
                        out.push(kind);
                        out.push_str(&digits);
                    }
                }
            }
            // Named escapes (\N{...}) and unknown escapes are kept verbatim.
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

/// Clean docstring indentation.
pub fn clean(doc: &str) -> String {
    let mut lines: Vec<String> = doc.split('\n').map(expand_tabs).collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter_map(|line| {
            let content = line.trim_start().chars().count();
            if content == 0 {
                None
            } else {
                Some(line.chars().count() - content)
            }
        })
        .min();

    if let Some(first) = lines.first_mut() {
        *first = first.trim_start().to_string();
    }
    if let Some(margin) = margin {
        for line in lines.iter_mut().skip(1) {
            *line = line.chars().skip(margin).collect();
        }
    }

    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    let leading_blank = lines.iter().take_while(|line| line.is_empty()).count();
    lines.drain(..leading_blank);

    lines.join("\n")
}

fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let spaces = 8 - column % 8;
            out.extend(std::iter::repeat(' ').take(spaces));
            column += spaces;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}
