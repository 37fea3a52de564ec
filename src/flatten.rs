use crate::style::{Palette, Role};
use crate::tree::Tree;
use indextree::NodeId;

/// Trailing selection marker.
const MARKER: &str = " <-";

/// Code points reserved when truncating: "..." plus the marker.
const TRUNC_RESERVE: usize = 6;

/// Placeholder shown inside an empty current directory.
const EMPTY_DIR_PLACEHOLDER: &str = "...";

/// One rendered row of the tree outline. Lives only for the duration of
/// a single render call.
#[derive(Debug)]
pub struct DisplayLine {
    pub text: String,
    pub selected: bool,
    pub depth: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct LineFlags {
    pub is_dir: bool,
    pub is_marked: bool,
    pub is_selected: bool,
}

/// Flatten the tree into display lines in stored child order, returning
/// the lines and the index of the selected line.
///
/// Traversal is pre-order over an explicit stack of (node, depth) pairs;
/// children are pushed in reverse so siblings come off in stored order.
/// Directories whose children were never loaded are leaves. An empty
/// current directory gets one synthetic placeholder line right below it,
/// carrying the selection marker.
pub fn flatten(tree: &Tree, width: usize, palette: &Palette) -> (Vec<DisplayLine>, usize) {
    let mut lines: Vec<DisplayLine> = Vec::new();
    let mut selected_index = 0;

    let Some(root) = tree.root() else {
        return (lines, 0);
    };
    let selected = tree.selected_child();
    let marked = tree.marked();

    let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
    while let Some((id, depth)) = stack.pop() {
        let Some(entry) = tree.get(id) else {
            continue;
        };

        let is_selected = selected == Some(id);
        let text = format_line(
            &entry.name,
            depth,
            width,
            LineFlags {
                is_dir: entry.is_dir,
                is_marked: marked == Some(id),
                is_selected,
            },
            palette,
        );
        if is_selected {
            selected_index = lines.len();
        }
        lines.push(DisplayLine {
            text,
            selected: is_selected,
            depth,
        });

        if entry.children_loaded {
            let children: Vec<NodeId> = tree.children(id).collect();
            if children.is_empty() && tree.current_dir() == Some(id) {
                // An empty current directory has no selectable child, so
                // the placeholder is the selection target.
                let text = format!(
                    "{}{}{}",
                    "  ".repeat(depth + 1),
                    EMPTY_DIR_PLACEHOLDER,
                    palette.colorize(MARKER, Role::Marker),
                );
                selected_index = lines.len();
                lines.push(DisplayLine {
                    text,
                    selected: true,
                    depth: depth + 1,
                });
            }
            for &child in children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }
    (lines, selected_index)
}

/// Format one node as a single newline-free line within `width` code
/// points: indentation, code-point truncation with a "..." suffix, and
/// role styling that never affects the counted width.
pub fn format_line(
    name: &str,
    depth: usize,
    width: usize,
    flags: LineFlags,
    palette: &Palette,
) -> String {
    let indent = "  ".repeat(depth);
    let indent_count = indent.chars().count();
    let name_count = name.chars().count();
    let reserve = if flags.is_selected {
        MARKER.chars().count()
    } else {
        0
    };

    let mut shown;
    if indent_count + name_count + reserve > width {
        let keep = width.saturating_sub(indent_count + TRUNC_RESERVE);
        shown = name.chars().take(keep).collect::<String>();
        shown.push_str("...");
    } else {
        shown = name.to_string();
    }

    if flags.is_dir {
        shown = palette.colorize(&shown, Role::Path);
    }
    if flags.is_marked {
        shown = palette.colorize(&shown, Role::Highlight);
    }

    let mut line = indent;
    line.push_str(&shown);
    if flags.is_selected {
        line.push_str(&palette.colorize(MARKER, Role::Marker));
    }
    line
}
