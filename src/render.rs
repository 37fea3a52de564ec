use crate::flatten::flatten;
use crate::style::{self, Frame, Palette, Role};
use crate::tree::Tree;
use crate::viewport::Viewport;
use chrono::{DateTime, Local};
use tracing::trace;

/// Cap on bytes read from the selected file for the preview pane.
pub const PREVIEW_BYTES_LIMIT: u64 = 10_000;

/// Rows occupied by the heading block.
const HEADING_ROWS: usize = 3;

// Below these pane dimensions layout gives up and shows a notice.
const MIN_WIDTH: usize = 10;
const MIN_HEIGHT: usize = 10;

/// Turn a byte count into a human-readable size. Two decimals from the
/// first unit above bytes upward; zero is a special case.
pub fn format_size(mut size: f64, base: f64) -> String {
    const UNITS: [&str; 7] = ["b", "Kb", "Mb", "Gb", "Tb", "Pb", "Eb"];
    if size == 0.0 {
        return "0 B".to_string();
    }
    let mut unit = 0;
    while size >= base && unit < UNITS.len() - 1 {
        size /= base;
        unit += 1;
    }
    if unit == 0 {
        format!("{:.0} {}", size, UNITS[unit])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

/// Immediate-mode renderer: one call per frame, producing a text block
/// ready for the terminal. Owns the viewport state, so every view needs
/// its own instance.
pub struct Renderer {
    viewport: Viewport,
    palette: Palette,
}

impl Renderer {
    pub fn new(edge_padding: usize, palette: Palette) -> Self {
        Self {
            viewport: Viewport::new(edge_padding),
            palette,
        }
    }

    /// Render the whole frame. Total: degenerate input produces
    /// placeholder text, never an error.
    pub fn render(&mut self, tree: &Tree, height: usize, width: usize) -> String {
        let heading = self.render_heading(tree);
        let body = self.render_panes(tree, height.saturating_sub(HEADING_ROWS), width);
        format!("{}\n{}", heading, body)
    }

    /// Heading block: selected path, modification time and size, and a
    /// status bar showing the marked path if any.
    fn render_heading(&self, tree: &Tree) -> String {
        let selected = tree.selected_child().and_then(|id| tree.get(id));
        let (path, time, size) = match selected {
            Some(entry) => (
                entry.path.display().to_string(),
                DateTime::<Local>::from(entry.modified)
                    .format("%d %b %y %H:%M %Z")
                    .to_string(),
                format_size(entry.size as f64, 1024.0),
            ),
            None => {
                // empty current directory: selection sits on the placeholder
                let base = tree
                    .current_dir()
                    .and_then(|id| tree.get(id))
                    .map(|e| e.path.display().to_string())
                    .unwrap_or_default();
                (format!("{}/...", base), "--".to_string(), "0 B".to_string())
            }
        };

        let mut bar = String::from(":");
        if let Some(marked) = tree.marked().and_then(|id| tree.get(id)) {
            bar.push_str(&format!(" [{}]", marked.path.display()));
        }

        [
            self.palette.colorize(&format!("> {}", path), Role::Accent),
            self.palette
                .colorize(&format!("{} : {}", time, size), Role::Path),
            bar,
        ]
        .join("\n")
    }

    /// Tree pane on the left half, preview pane on the right. `height` is
    /// the row budget left below the heading.
    fn render_panes(&mut self, tree: &Tree, height: usize, width: usize) -> String {
        if width < MIN_WIDTH || height < MIN_HEIGHT {
            return "too small =(\n".to_string();
        }

        let section_width = width / 2;
        let (lines, selected) = flatten(tree, section_width, &self.palette);
        let visible = self.viewport.crop(&lines, selected, height);
        let tree_block = style::max_width(
            &visible
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            section_width,
        );

        let content = match tree.read_selected_content(PREVIEW_BYTES_LIMIT) {
            Ok(bytes) => bytes,
            Err(err) => {
                // no preview available; the tree pane stands alone
                trace!(%err, "preview unavailable");
                return tree_block;
            }
        };

        let preview = match String::from_utf8(content) {
            Ok(text) => {
                let all: Vec<&str> = text.split('\n').collect();
                let keep = height.min(all.len());
                all[..keep].join("\n")
            }
            Err(_) => "<binary content>".to_string(),
        };

        // styling may render narrower than the budget; measure, don't assume
        let left_margin = section_width.saturating_sub(style::block_width(&tree_block));
        let framed = style::frame(
            &preview,
            Frame {
                left_border: true,
                margin_left: left_margin,
                max_width: section_width + left_margin - 1,
            },
            &self.palette,
        );
        style::join_horizontal(&tree_block, &framed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Entry;
    use std::time::SystemTime;

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(0.0, 1024.0), "0 B");
        assert_eq!(format_size(1023.0, 1024.0), "1023 b");
        assert_eq!(format_size(1536.0, 1024.0), "1.50 Kb");
        assert_eq!(format_size(2048.0, 1024.0), "2.00 Kb");
        assert_eq!(format_size(3.0 * 1024.0 * 1024.0, 1024.0), "3.00 Mb");
    }

    fn detached_tree() -> Tree {
        let now = SystemTime::UNIX_EPOCH;
        let mut tree = Tree::with_root(Entry::dir("/repo", "/repo", now));
        let root = tree.root().unwrap();
        tree.add_child(root, Entry::file("x.txt", "/repo/x.txt", 2048, now));
        let sub = tree.add_child(root, Entry::dir("sub", "/repo/sub", now));
        tree.mark_children_loaded(sub);
        tree
    }

    #[test]
    fn too_small_window_gets_notice() {
        let tree = detached_tree();
        let mut renderer = Renderer::new(2, Palette::plain());
        let out = renderer.render(&tree, 5, 80);
        assert!(out.contains("too small"));
        let out = renderer.render(&tree, 40, 8);
        assert!(out.contains("too small"));
    }

    #[test]
    fn unreadable_selection_renders_tree_only() {
        // paths in the detached tree don't exist on disk, so the preview
        // read fails and the frame falls back to the tree pane
        let tree = detached_tree();
        let mut renderer = Renderer::new(2, Palette::plain());
        let out = renderer.render(&tree, 30, 60);
        assert!(out.contains("  x.txt <-"));
        assert!(!out.contains("│"));
    }

    #[test]
    fn heading_shows_selection_and_mark() {
        let mut tree = detached_tree();
        tree.toggle_mark();
        let mut renderer = Renderer::new(2, Palette::plain());
        let out = renderer.render(&tree, 30, 60);
        let head: Vec<&str> = out.lines().take(3).collect();
        assert_eq!(head[0], "> /repo/x.txt");
        assert!(head[1].ends_with(" : 2.00 Kb"));
        // RFC822-style timestamp carries a zone (name or offset)
        let time = head[1].split(" : ").next().unwrap();
        assert!(
            time.contains('+') || time.contains('-') || time.ends_with(|c: char| c.is_alphabetic()),
            "timestamp missing zone: {time:?}"
        );
        assert_eq!(head[2], ": [/repo/x.txt]");
    }

    #[test]
    fn nil_tree_still_renders() {
        let tree = Tree::empty();
        let mut renderer = Renderer::new(2, Palette::plain());
        let out = renderer.render(&tree, 30, 60);
        assert!(out.starts_with("> /..."));
    }

    #[test]
    fn preview_joins_next_to_tree_pane() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("note.txt"), "first line\nsecond line\n").unwrap();

        let tree = Tree::from_path(dir.path()).unwrap();
        let mut renderer = Renderer::new(2, Palette::plain());
        let out = renderer.render(&tree, 30, 80);
        assert!(out.contains("note.txt <-"));
        assert!(out.contains("│first line"));
        assert!(out.contains("│second line"));
    }

    #[test]
    fn binary_preview_is_substituted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00, 0x01]).unwrap();

        let tree = Tree::from_path(dir.path()).unwrap();
        let mut renderer = Renderer::new(2, Palette::plain());
        let out = renderer.render(&tree, 30, 80);
        assert!(out.contains("<binary content>"));
        assert!(!out.contains('\u{fffd}'));
    }

    #[test]
    fn preview_rows_are_capped_to_pane_height() {
        let dir = tempfile::tempdir().unwrap();
        let many: String = (0..200).map(|i| format!("line {}\n", i)).collect();
        std::fs::write(dir.path().join("long.txt"), many).unwrap();

        let tree = Tree::from_path(dir.path()).unwrap();
        let mut renderer = Renderer::new(2, Palette::plain());
        let height = 25;
        let out = renderer.render(&tree, height, 80);
        assert!(out.lines().count() <= height);
    }

    #[test]
    fn frames_are_stable_across_identical_calls() {
        let tree = detached_tree();
        let mut renderer = Renderer::new(2, Palette::plain());
        let first = renderer.render(&tree, 30, 60);
        let second = renderer.render(&tree, 30, 60);
        assert_eq!(first, second);
    }
}
