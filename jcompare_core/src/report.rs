//! Report building: flattening categorized changes into ordered entries,
//! one-line value previews, nested regrouping by shared path prefix, and the
//! two rendering modes (grouped tree and flat lines).

use crate::accessor::AccessorPath;
use crate::engine::CategorizedChanges;
use jcompare_common::RenderOptions;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Placeholder preview for records that carry no value
const MOVED_TEXT: &str = "(moved)";

/// What a flattened entry did to its location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeTag {
    New,
    Removed,
    Moved,
}

impl ChangeTag {
    pub fn leader(self) -> &'static str {
        match self {
            ChangeTag::New => "+ ",
            ChangeTag::Removed => "- ",
            ChangeTag::Moved => "  ",
        }
    }

    fn color(self) -> &'static str {
        match self {
            ChangeTag::New => GREEN,
            ChangeTag::Removed => RED,
            ChangeTag::Moved => CYAN,
        }
    }
}

/// One flattened change record
#[derive(Debug, Clone, Serialize)]
pub struct FlatEntry {
    pub path: AccessorPath,
    pub tag: ChangeTag,
    /// Absent for moves, which carry no value
    pub value: Option<Value>,
}

/// Nested report tree, regrouping flat entries by shared path prefix.
///
/// A leaf holds every change recorded at one location, in flatten order; a
/// branch maps bracketed path segments to subtrees in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReportNode {
    Leaf(Vec<(ChangeTag, String)>),
    Branch(Vec<(String, ReportNode)>),
}

/// Flatten categorized changes into ordered entries, truncating past
/// `max_items` (0 = unlimited) with a `...(k more items)` note.
///
/// Bucket order: additions (object then sequence), removals (object then
/// sequence), value changes (each expanding to removed-old then new-new),
/// then moves. A move is suppressed when the value at the same path also
/// changed.
pub fn flatten(
    changes: &CategorizedChanges,
    max_items: usize,
) -> (Vec<FlatEntry>, Option<String>) {
    let mut entries = Vec::new();

    for record in &changes.added_keys {
        entries.push(FlatEntry {
            path: record.path.clone(),
            tag: ChangeTag::New,
            value: Some(record.value.clone()),
        });
    }
    for record in &changes.added_items {
        entries.push(FlatEntry {
            path: record.path.clone(),
            tag: ChangeTag::New,
            value: Some(record.value.clone()),
        });
    }
    for record in &changes.removed_keys {
        entries.push(FlatEntry {
            path: record.path.clone(),
            tag: ChangeTag::Removed,
            value: Some(record.value.clone()),
        });
    }
    for record in &changes.removed_items {
        entries.push(FlatEntry {
            path: record.path.clone(),
            tag: ChangeTag::Removed,
            value: Some(record.value.clone()),
        });
    }
    for change in &changes.changed_values {
        entries.push(FlatEntry {
            path: change.path.clone(),
            tag: ChangeTag::Removed,
            value: Some(change.old.clone()),
        });
        entries.push(FlatEntry {
            path: change.path.clone(),
            tag: ChangeTag::New,
            value: Some(change.new.clone()),
        });
    }

    let changed_paths: HashSet<&AccessorPath> =
        changes.changed_values.iter().map(|c| &c.path).collect();
    for path in &changes.moved_items {
        if changed_paths.contains(path) {
            continue;
        }
        entries.push(FlatEntry {
            path: path.clone(),
            tag: ChangeTag::Moved,
            value: None,
        });
    }

    let note = if max_items > 0 && entries.len() > max_items {
        let remaining = entries.len() - max_items;
        entries.truncate(max_items);
        Some(format!("...({} more items)", remaining))
    } else {
        None
    };

    (entries, note)
}

/// One-line value summary within a character budget.
///
/// The compact serialization is returned verbatim when it fits. Oversized
/// objects render their keys only, oversized sequences render an item count;
/// when even the summarized form does not fit, the serialization is cut to
/// exactly `limit` characters with a dropped-character note.
pub fn preview(value: &Value, limit: usize) -> String {
    let compact = value.to_string();
    if compact.chars().count() <= limit {
        return compact;
    }

    match value {
        Value::Object(map) => {
            let keys: Vec<String> = map.keys().map(|k| format!("\"{}\": ...", k)).collect();
            let summary = format!("{{ {} }}", keys.join(", "));
            if summary.chars().count() <= limit {
                summary
            } else {
                hard_truncate(&compact, limit)
            }
        }
        Value::Array(items) => {
            let summary = format!("[ ({} items) ]", items.len());
            if summary.chars().count() <= limit {
                summary
            } else {
                hard_truncate(&compact, limit)
            }
        }
        _ => hard_truncate(&compact, limit),
    }
}

fn hard_truncate(text: &str, limit: usize) -> String {
    let total = text.chars().count();
    let kept: String = text.chars().take(limit).collect();
    format!("{}...({} more chars)", kept, total - limit)
}

/// Regroup flat entries into a nested tree keyed by bracketed path segments.
///
/// Entries addressing the document root are grouped under the `root` key.
pub fn nest(entries: &[FlatEntry], preview_len: usize) -> ReportNode {
    let mut children = Vec::new();
    for entry in entries {
        let text = match &entry.value {
            Some(value) => preview(value, preview_len),
            None => MOVED_TEXT.to_string(),
        };
        let keys: Vec<String> = if entry.path.is_empty() {
            vec!["root".to_string()]
        } else {
            entry.path.segments().iter().map(|s| s.to_string()).collect()
        };
        insert(&mut children, &keys, entry.tag, text);
    }
    ReportNode::Branch(children)
}

fn insert(children: &mut Vec<(String, ReportNode)>, keys: &[String], tag: ChangeTag, text: String) {
    let (head, rest) = match keys.split_first() {
        Some(split) => split,
        None => return,
    };

    let position = children.iter().position(|(key, _)| key == head);
    let position = match position {
        Some(index) => index,
        None => {
            let node = if rest.is_empty() {
                ReportNode::Leaf(Vec::new())
            } else {
                ReportNode::Branch(Vec::new())
            };
            children.push((head.clone(), node));
            children.len() - 1
        }
    };

    // The engine never emits a path that is a strict prefix of another, so a
    // leaf and a branch cannot collide at one key.
    match (&mut children[position].1, rest.is_empty()) {
        (ReportNode::Leaf(list), true) => list.push((tag, text)),
        (ReportNode::Branch(kids), false) => insert(kids, rest, tag, text),
        _ => {}
    }
}

/// Render the nested tree.
///
/// Chains of single-child branches collapse onto one line when they end in a
/// one-entry leaf, colorized by that entry's tag; multi-entry leaves list
/// each entry under their key, one indent deeper. The truncation note, if
/// any, comes last.
pub fn render(node: &ReportNode, note: Option<&str>, options: &RenderOptions) -> String {
    let mut out = String::new();
    match node {
        ReportNode::Branch(children) => render_children(children, 0, options, &mut out),
        ReportNode::Leaf(entries) => {
            for (tag, text) in entries {
                let line = format!("{}{}", tag.leader(), text);
                push_line(&mut out, &line, *tag, options);
            }
        }
    }
    if let Some(note) = note {
        out.push_str(note);
        out.push('\n');
    }
    out
}

fn render_children(
    children: &[(String, ReportNode)],
    indent: usize,
    options: &RenderOptions,
    out: &mut String,
) {
    for (key, child) in children {
        // Accumulate the chain of single-child branches into one key line
        let mut label = key.clone();
        let mut node = child;
        while let ReportNode::Branch(kids) = node {
            if kids.len() != 1 {
                break;
            }
            label.push_str(&kids[0].0);
            node = &kids[0].1;
        }

        let pad = "  ".repeat(indent);
        match node {
            ReportNode::Leaf(entries) if entries.len() == 1 => {
                let (tag, text) = &entries[0];
                let line = format!("{}{}: {}{}", pad, label, tag.leader(), text);
                push_line(out, &line, *tag, options);
            }
            ReportNode::Leaf(entries) => {
                out.push_str(&pad);
                out.push_str(&label);
                out.push_str(":\n");
                for (tag, text) in entries {
                    let line = format!("{}  {}{}", pad, tag.leader(), text);
                    push_line(out, &line, *tag, options);
                }
            }
            ReportNode::Branch(kids) => {
                out.push_str(&pad);
                out.push_str(&label);
                out.push_str(":\n");
                render_children(kids, indent + 1, options, out);
            }
        }
    }
}

/// Flat rendering: one line per entry, full bracketed path and preview.
pub fn render_flat(entries: &[FlatEntry], note: Option<&str>, options: &RenderOptions) -> String {
    let mut out = String::new();
    for entry in entries {
        let text = match &entry.value {
            Some(value) => preview(value, options.max_preview_len),
            None => MOVED_TEXT.to_string(),
        };
        let path = if entry.path.is_empty() {
            "root".to_string()
        } else {
            entry.path.to_string()
        };
        let line = format!("{}{}: {}", entry.tag.leader(), path, text);
        push_line(&mut out, &line, entry.tag, options);
    }
    if let Some(note) = note {
        out.push_str(note);
        out.push('\n');
    }
    out
}

fn push_line(out: &mut String, line: &str, tag: ChangeTag, options: &RenderOptions) {
    if options.color {
        out.push_str(tag.color());
        out.push_str(line);
        out.push_str(RESET);
    } else {
        out.push_str(line);
    }
    out.push('\n');
}
