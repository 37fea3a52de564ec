use tracing::trace;

/// Sticky scrolling window over a line list.
///
/// The offset persists between render calls and only moves when the
/// selection would otherwise come closer than `edge_padding` lines to a
/// visible edge, and then by the minimum amount needed. One `Viewport`
/// belongs to exactly one renderer; independent views get independent
/// instances.
#[derive(Debug)]
pub struct Viewport {
    offset: usize,
    pub edge_padding: usize,
}

impl Viewport {
    pub fn new(edge_padding: usize) -> Self {
        Self {
            offset: 0,
            edge_padding,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Crop `lines` to a window of `height` rows containing `selected`,
    /// updating the persisted offset.
    ///
    /// `height == 0` (terminal too small to matter) returns the whole
    /// list and leaves the offset untouched. Otherwise, after the call,
    /// `offset <= max(0, lines.len() - height)` holds even when the list
    /// shrank since the previous frame.
    pub fn crop<'a, T>(&mut self, lines: &'a [T], selected: usize, height: usize) -> &'a [T] {
        let total = lines.len();
        if height == 0 {
            return lines;
        }

        let mut offset = self.offset;
        // selection too close to the bottom edge
        if selected + 1 + self.edge_padding > height + offset {
            offset = (selected + 1 + self.edge_padding)
                .saturating_sub(height)
                .min(total.saturating_sub(height));
        }
        // selection too close to the top edge
        if selected < self.edge_padding + offset {
            offset = selected.saturating_sub(self.edge_padding);
        }
        // the list may have shrunk since the offset was stored
        offset = offset.min(total.saturating_sub(height));

        if offset != self.offset {
            trace!(old = self.offset, new = offset, selected, "viewport moved");
        }
        self.offset = offset;

        let limit = (offset + height).min(total);
        &lines[offset..limit]
    }
}
