//! Duplicate suppression and reading-order sorting for slot candidates

use super::types::SlotRect;

/// Drop near-duplicate rectangles (first seen wins) and sort the rest into
/// grid reading order: rows top to bottom, slots left to right within a row.
///
/// Rectangles whose `y` lies within `row_band` pixels of the first rectangle
/// of a row are treated as part of that row, so small vertical jitter between
/// neighbouring slots does not break the left-to-right order.
pub fn dedupe_and_sort(rects: Vec<SlotRect>, position_eps: i32, row_band: i32) -> Vec<SlotRect> {
    let mut kept: Vec<SlotRect> = Vec::with_capacity(rects.len());
    for rect in rects {
        if !kept.iter().any(|k| k.is_near(&rect, position_eps)) {
            kept.push(rect);
        }
    }

    kept.sort_by_key(|r| (r.y, r.x));

    let mut ordered = Vec::with_capacity(kept.len());
    let mut row: Vec<SlotRect> = Vec::new();
    for rect in kept {
        if let Some(anchor) = row.first()
            && rect.y - anchor.y > row_band
        {
            flush_row(&mut row, &mut ordered);
        }
        row.push(rect);
    }
    flush_row(&mut row, &mut ordered);

    ordered
}

fn flush_row(row: &mut Vec<SlotRect>, ordered: &mut Vec<SlotRect>) {
    row.sort_by_key(|r| (r.x, r.y));
    ordered.append(row);
}
