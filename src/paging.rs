//! Pagination: fixed-size character windows over a document.
//!
//! Sizes and indices count Unicode scalar values, so a page boundary never
//! falls inside a character. Everything here is pure.

/// Page size for a host whose selection was `selection_chars` long, never
/// below `min_page_size`.
pub fn page_size_for(selection_chars: usize, min_page_size: usize) -> usize {
    selection_chars.max(min_page_size).max(1)
}

/// `ceil(chars / page_size)`; zero for empty text.
pub fn total_pages(text: &str, page_size: usize) -> usize {
    text.chars().count().div_ceil(page_size.max(1))
}

/// The `index`-th window of `page_size` characters.
///
/// An index past the end yields an empty slice; the last page may be short.
pub fn page(text: &str, page_size: usize, index: usize) -> &str {
    let page_size = page_size.max(1);
    let Some(start_char) = index.checked_mul(page_size) else {
        return "";
    };

    let mut boundaries = text.char_indices().map(|(i, _)| i).skip(start_char);
    let Some(start) = boundaries.next() else {
        return "";
    };
    let end = boundaries.nth(page_size - 1).unwrap_or(text.len());
    &text[start..end]
}

/// Index after `current`, or `None` when already on the last page.
pub fn next_index(current: usize, total_pages: usize) -> Option<usize> {
    let next = current.checked_add(1)?;
    (next < total_pages).then_some(next)
}

/// Index before `current`, or `None` when already on the first page.
pub fn prev_index(current: usize) -> Option<usize> {
    current.checked_sub(1)
}

/// Clamp into `[0, max(total_pages, 1) - 1]`.
pub fn clamp_index(index: usize, total_pages: usize) -> usize {
    index.min(total_pages.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_floor_applies_to_short_selection() {
        assert_eq!(page_size_for(12, 100), 100);
        assert_eq!(page_size_for(340, 100), 340);
    }

    #[test]
    fn test_short_document_fits_one_page() {
        let text = "Hello world.\n\nThis is page two.";
        let size = page_size_for(12, 100);
        assert_eq!(total_pages(text, size), 1);
        assert_eq!(page(text, size, 0), text);
        assert_eq!(page(text, size, 1), "");
    }

    #[test]
    fn test_250_chars_make_three_pages() {
        let text = "x".repeat(250);
        assert_eq!(total_pages(&text, 100), 3);
        assert_eq!(page(&text, 100, 2).len(), 50);

        let total = total_pages(&text, 100);
        let mut index = 0;
        index = next_index(index, total).unwrap();
        index = next_index(index, total).unwrap();
        assert_eq!(index, 2);
        assert_eq!(next_index(index, total), None);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(total_pages("", 100), 0);
        assert_eq!(page("", 100, 0), "");
        assert_eq!(next_index(0, 0), None);
        assert_eq!(prev_index(0), None);
        assert_eq!(clamp_index(7, 0), 0);
    }

    #[test]
    fn test_multibyte_boundaries() {
        let text = "摸鱼阅读器很好用";
        assert_eq!(total_pages(text, 3), 3);
        assert_eq!(page(text, 3, 0), "摸鱼阅");
        assert_eq!(page(text, 3, 2), "好用");
    }

    #[test]
    fn test_huge_index_does_not_overflow() {
        assert_eq!(page("abc", 2, usize::MAX), "");
    }

    proptest! {
        #[test]
        fn pages_partition_text(text in "\\PC{0,400}", size in 1usize..64) {
            let total = total_pages(&text, size);
            let joined: String = (0..total).map(|i| page(&text, size, i)).collect();
            prop_assert_eq!(&joined, &text);

            let lengths: usize = (0..total).map(|i| page(&text, size, i).chars().count()).sum();
            prop_assert_eq!(lengths, text.chars().count());
            prop_assert_eq!(page(&text, size, total), "");
        }

        #[test]
        fn total_is_zero_only_for_empty(text in "\\PC{0,200}", size in 1usize..50) {
            let total = total_pages(&text, size);
            prop_assert_eq!(total == 0, text.is_empty());
            if !text.is_empty() {
                prop_assert_eq!(total, text.chars().count().div_ceil(size));
            }
        }

        #[test]
        fn turning_stays_in_bounds(total in 0usize..20, moves in proptest::collection::vec(any::<bool>(), 0..60)) {
            let mut index = 0usize;
            for forward in moves {
                let moved = if forward { next_index(index, total) } else { prev_index(index) };
                if let Some(i) = moved {
                    index = i;
                }
                prop_assert!(index < total.max(1));
            }
        }
    }
}
