//! Output grammars.
//!
//! Extraction produces [`crate::GraphLine`]s with grammar-neutral identifiers; a
//! [`GraphFormatter`] turns each one into a line of text.

use crate::ids::{NodeKind, dot_quote, mermaid_label};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub trait GraphFormatter {
    /// Line emitted before any declaration.
    fn begin(&self) -> Option<String> {
        None
    }

    fn node(&self, kind: NodeKind, id: &str, label: &str) -> String;

    fn edge(&self, from: &str, to: &str, label: Option<&str>) -> String;

    /// Line emitted after the last declaration.
    fn end(&self) -> Option<String> {
        None
    }
}

/// Flowchart direction written in the Mermaid `graph` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Direction {
    #[default]
    LR,
    RL,
    TB,
    BT,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Direction::LR => "LR",
            Direction::RL => "RL",
            Direction::TB => "TB",
            Direction::BT => "BT",
        })
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LR" => Ok(Self::LR),
            "RL" => Ok(Self::RL),
            "TB" | "TD" => Ok(Self::TB),
            "BT" => Ok(Self::BT),
            other => Err(format!("unknown direction {other:?} (expected LR, RL, TB or BT)")),
        }
    }
}

impl TryFrom<String> for Direction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Mermaid flowchart statements.
///
/// Networks are rhombus nodes (`network_<id>{name}`), services are rounded nodes
/// (`service_<id>(name)`), attachments are open links (`---`). Without a header the output is a
/// bare statement list, ready to be appended to a `graph` declaration by the consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MermaidFormatter {
    pub header: Option<Direction>,
}

impl MermaidFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, direction: Direction) -> Self {
        self.header = Some(direction);
        self
    }
}

impl GraphFormatter for MermaidFormatter {
    fn begin(&self) -> Option<String> {
        self.header.map(|direction| format!("graph {direction}"))
    }

    fn node(&self, kind: NodeKind, id: &str, label: &str) -> String {
        let label = mermaid_label(label);
        match kind {
            NodeKind::Network => format!("{id}{{{label}}}"),
            NodeKind::Service => format!("{id}({label})"),
        }
    }

    fn edge(&self, from: &str, to: &str, label: Option<&str>) -> String {
        match label {
            Some(label) => format!("{from} ---|{}| {to}", mermaid_label(label)),
            None => format!("{from} --- {to}"),
        }
    }
}

/// Graphviz undirected graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotFormatter {
    pub name: String,
}

impl Default for DotFormatter {
    fn default() -> Self {
        Self {
            name: "topology".to_string(),
        }
    }
}

impl GraphFormatter for DotFormatter {
    fn begin(&self) -> Option<String> {
        Some(format!("graph {} {{", dot_quote(&self.name)))
    }

    fn node(&self, kind: NodeKind, id: &str, label: &str) -> String {
        let shape = match kind {
            NodeKind::Network => "shape=diamond",
            NodeKind::Service => "shape=box, style=rounded",
        };
        format!("  {id} [label={}, {shape}];", dot_quote(label))
    }

    fn edge(&self, from: &str, to: &str, label: Option<&str>) -> String {
        match label {
            Some(label) => format!("  {from} -- {to} [label={}];", dot_quote(label)),
            None => format!("  {from} -- {to};"),
        }
    }

    fn end(&self) -> Option<String> {
        Some("}".to_string())
    }
}

/// Config files and `--format` accept the same names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OutputFormat {
    #[default]
    Mermaid,
    Dot,
}

impl OutputFormat {
    /// `header` only affects Mermaid output; DOT always needs its graph statement.
    pub fn formatter(self, header: Option<Direction>) -> Box<dyn GraphFormatter + Send + Sync> {
        match self {
            OutputFormat::Mermaid => Box::new(MermaidFormatter { header }),
            OutputFormat::Dot => Box::new(DotFormatter::default()),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mermaid" | "mmd" => Ok(Self::Mermaid),
            "dot" | "graphviz" => Ok(Self::Dot),
            other => Err(format!("unknown output format {other:?} (expected mermaid or dot)")),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
