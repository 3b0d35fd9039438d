//! Node identifiers and label text.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Network,
    Service,
}

impl NodeKind {
    pub fn prefix(self) -> &'static str {
        match self {
            NodeKind::Network => "network",
            NodeKind::Service => "service",
        }
    }
}

/// Builds the graph identifier `<kind>_<id>` for a cluster object.
///
/// ASCII alphanumerics are kept; every other character (including `_` and `-`) becomes
/// `_<hex codepoint>_`. The mapping is injective, so two distinct raw ids never share a graph
/// identifier, and the kind prefix keeps networks and services apart. Engine object ids are hex
/// strings and come out unchanged.
pub fn node_id(kind: NodeKind, raw: &str) -> String {
    let prefix = kind.prefix();
    let mut out = String::with_capacity(prefix.len() + 1 + raw.len());
    out.push_str(prefix);
    out.push('_');
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else {
            let _ = write!(out, "_{:x}_", ch as u32);
        }
    }
    out
}

fn breaks_mermaid_shape(ch: char) -> bool {
    matches!(
        ch,
        '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>' | '|' | '"' | ';' | '#' | '`'
    ) || ch.is_control()
}

/// Label text for a Mermaid node shape.
///
/// Plain names pass through verbatim (an empty name stays empty). Anything that could close the
/// shape early is wrapped in a quoted string, with `"` written as the `#quot;` entity and control
/// characters flattened to spaces.
pub fn mermaid_label(label: &str) -> Cow<'_, str> {
    if !label.chars().any(breaks_mermaid_shape) {
        return Cow::Borrowed(label);
    }

    let mut out = String::with_capacity(label.len() + 8);
    out.push('"');
    for ch in label.chars() {
        match ch {
            '"' => out.push_str("#quot;"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out.push('"');
    Cow::Owned(out)
}

/// Double-quoted DOT string.
pub fn dot_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_ids_are_kept_verbatim() {
        assert_eq!(
            node_id(NodeKind::Network, "3kq8x2a1b0c9"),
            "network_3kq8x2a1b0c9"
        );
        assert_eq!(node_id(NodeKind::Service, "s1"), "service_s1");
    }

    #[test]
    fn separators_are_escaped_without_collisions() {
        let dashed = node_id(NodeKind::Network, "my-net");
        let underscored = node_id(NodeKind::Network, "my_net");
        assert_eq!(dashed, "network_my_2d_net");
        assert_eq!(underscored, "network_my_5f_net");
        assert_ne!(dashed, underscored);

        // A raw id that looks like an escape sequence must not alias the escaped form.
        assert_ne!(node_id(NodeKind::Network, "my_2d_net"), dashed);
    }

    #[test]
    fn kinds_never_share_an_identifier() {
        assert_ne!(
            node_id(NodeKind::Network, "abc"),
            node_id(NodeKind::Service, "abc")
        );
    }

    #[test]
    fn plain_labels_pass_through() {
        assert_eq!(mermaid_label("ingress"), "ingress");
        assert_eq!(mermaid_label("stack_web.net-a"), "stack_web.net-a");
        assert_eq!(mermaid_label(""), "");
    }

    #[test]
    fn labels_with_shape_characters_are_quoted() {
        assert_eq!(mermaid_label("api {v2}"), "\"api {v2}\"");
        assert_eq!(mermaid_label("say \"hi\""), "\"say #quot;hi#quot;\"");
        assert_eq!(mermaid_label("a\nb;"), "\"a b;\"");
    }

    #[test]
    fn dot_strings_escape_quotes_and_backslashes() {
        assert_eq!(dot_quote(r#"a"b\c"#), r#""a\"b\\c""#);
    }
}
