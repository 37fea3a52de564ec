use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use unicode_width::UnicodeWidthChar;

/// Styling roles used by the renderer. Styling never changes the
/// character counts used for width accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Directory names and path-like text.
    Path,
    /// Background highlight for the marked node.
    Highlight,
    /// The trailing selection marker.
    Marker,
    /// Heading accents.
    Accent,
}

/// Color capability. A plain palette passes text through untouched, which
/// keeps tests byte-exact and honors NO_COLOR / non-tty output.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    colors: bool,
}

impl Palette {
    pub fn ansi() -> Self {
        Self { colors: true }
    }

    pub fn plain() -> Self {
        Self { colors: false }
    }

    /// ANSI when stdout is a terminal and NO_COLOR is unset.
    pub fn auto() -> Self {
        let colors = std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_tty();
        Self { colors }
    }

    pub fn colorize(&self, text: &str, role: Role) -> String {
        if !self.colors {
            return text.to_string();
        }
        match role {
            Role::Path => text.blue().to_string(),
            Role::Highlight => text.on_dark_grey().to_string(),
            Role::Marker => text.yellow().to_string(),
            Role::Accent => text.green().to_string(),
        }
    }

    fn italic(&self, text: &str) -> String {
        if !self.colors {
            return text.to_string();
        }
        text.italic().to_string()
    }
}

/// Display width of a line, skipping over ANSI escape sequences.
pub fn display_width(line: &str) -> usize {
    let mut width = 0;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            skip_sequence(&mut chars, |_| {});
            continue;
        }
        width += c.width().unwrap_or(0);
    }
    width
}

/// Widest line of a newline-separated block, ANSI-aware.
pub fn block_width(block: &str) -> usize {
    block.lines().map(display_width).max().unwrap_or(0)
}

/// Truncate a line to at most `max` display columns. Printable output
/// ends at the first character that does not fit; escape sequences are
/// preserved even past the cut so no styling is left unterminated.
pub fn clip_width(line: &str, max: usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut width = 0;
    let mut cut = false;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            out.push(c);
            skip_sequence(&mut chars, |s| out.push(s));
            continue;
        }
        let w = c.width().unwrap_or(0);
        if cut || width + w > max {
            cut = true;
            continue;
        }
        width += w;
        out.push(c);
    }
    out
}

/// Clip every line of a block to `max` display columns.
pub fn max_width(block: &str, max: usize) -> String {
    block
        .lines()
        .map(|l| clip_width(l, max))
        .collect::<Vec<_>>()
        .join("\n")
}

// Consumes the remainder of an escape sequence after ESC, feeding each
// consumed char to `sink`. Handles CSI (ESC '[' ... final byte); for any
// other introducer only that one char is consumed.
fn skip_sequence<F: FnMut(char)>(chars: &mut std::str::Chars<'_>, mut sink: F) {
    if let Some(c) = chars.next() {
        sink(c);
        if c == '[' {
            for c in chars.by_ref() {
                sink(c);
                if ('\x40'..='\x7e').contains(&c) {
                    return;
                }
            }
        }
    }
}

/// Layout options for [`frame`].
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub left_border: bool,
    pub margin_left: usize,
    pub max_width: usize,
}

/// Wrap a block in a left margin and optional left border, clipping each
/// line so the framed result stays within `max_width` columns. The
/// content is rendered italic.
pub fn frame(block: &str, opts: Frame, palette: &Palette) -> String {
    let border_cols = usize::from(opts.left_border);
    let content_max = opts.max_width.saturating_sub(opts.margin_left + border_cols);
    let margin = " ".repeat(opts.margin_left);

    block
        .lines()
        .map(|line| {
            let clipped = clip_width(line, content_max);
            let mut row = margin.clone();
            if opts.left_border {
                row.push('│');
            }
            row.push_str(&palette.italic(&clipped));
            row
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Join two blocks side by side, top-aligned. Every left-block line is
/// padded to the block's own width so the right block starts in the same
/// column on each row.
pub fn join_horizontal(left: &str, right: &str) -> String {
    let left_width = block_width(left);
    let left_lines: Vec<&str> = left.lines().collect();
    let right_lines: Vec<&str> = right.lines().collect();
    let rows = left_lines.len().max(right_lines.len());

    let mut out = Vec::with_capacity(rows);
    for i in 0..rows {
        let l = left_lines.get(i).copied().unwrap_or("");
        let r = right_lines.get(i).copied().unwrap_or("");
        let pad = left_width.saturating_sub(display_width(l));
        out.push(format!("{}{}{}", l, " ".repeat(pad), r));
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_ignores_ansi_sequences() {
        let styled = "\x1b[34mdir\x1b[0m";
        assert_eq!(display_width(styled), 3);
        assert_eq!(display_width("héllo"), 5);
        assert_eq!(display_width("日本"), 4);
    }

    #[test]
    fn clip_keeps_trailing_reset() {
        let styled = "\x1b[34mdirectory\x1b[0m";
        let clipped = clip_width(styled, 3);
        assert_eq!(clipped, "\x1b[34mdir\x1b[0m");
    }

    #[test]
    fn clip_never_splits_wide_chars() {
        // each char is 2 columns; 3 columns fit only one of them
        assert_eq!(clip_width("日本", 3), "日");
        assert_eq!(display_width(&clip_width("日本語", 5)), 4);
    }

    #[test]
    fn clip_stops_at_first_overflowing_char() {
        // the narrow chars after the cut must not slip back in
        assert_eq!(clip_width("日本語abc", 5), "日本");
        assert_eq!(clip_width("ab日cd", 3), "ab");
    }

    #[test]
    fn clip_keeps_combining_marks_before_the_cut_only() {
        // U+0301 is zero-width and belongs to the kept "e"
        assert_eq!(clip_width("e\u{301}x", 1), "e\u{301}");
        // zero-width chars after the cut are dropped with the rest
        assert_eq!(clip_width("abc\u{301}", 2), "ab");
    }

    #[test]
    fn plain_palette_is_passthrough() {
        let p = Palette::plain();
        assert_eq!(p.colorize("x.txt", Role::Path), "x.txt");
        assert_eq!(p.colorize(" <-", Role::Marker), " <-");
    }

    #[test]
    fn ansi_palette_keeps_logical_width() {
        let p = Palette::ansi();
        for role in [Role::Path, Role::Highlight, Role::Marker, Role::Accent] {
            assert_eq!(display_width(&p.colorize("name", role)), 4);
        }
    }

    #[test]
    fn frame_adds_margin_and_border() {
        let p = Palette::plain();
        let framed = frame(
            "one\ntwo",
            Frame {
                left_border: true,
                margin_left: 3,
                max_width: 8,
            },
            &p,
        );
        assert_eq!(framed, "   │one\n   │two");
    }

    #[test]
    fn frame_clips_to_max_width() {
        let p = Palette::plain();
        let framed = frame(
            "a very long preview line",
            Frame {
                left_border: true,
                margin_left: 2,
                max_width: 10,
            },
            &p,
        );
        assert_eq!(framed, "  │a very ");
        assert_eq!(display_width(&framed), 10);
    }

    #[test]
    fn join_pads_left_block() {
        let joined = join_horizontal("aa\nbbbb", "RIGHT\nR");
        assert_eq!(joined, "aa  RIGHT\nbbbbR");
    }

    #[test]
    fn join_handles_uneven_heights() {
        let joined = join_horizontal("aa", "x\ny\nz");
        assert_eq!(joined, "aax\n  y\n  z");
    }
}
