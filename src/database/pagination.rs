use serde::Serialize;

/// One page of a list endpoint. `total` comes from the windowed `COUNT(..)
/// OVER()` column the list queries select alongside the rows.
#[derive(Serialize, Debug, PartialEq)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: i64,
    pub offset: i64,
    pub next_offset: Option<i64>,
    pub prev_offset: Option<i64>,
}

impl<T> Page<T> {
    pub fn from_rows(rows: Vec<T>, total: i64, page_size: i64, offset: i64) -> Self {
        let next_offset = if offset + page_size < total {
            Some(offset + page_size)
        } else {
            None
        };
        let prev_offset = if offset > 0 {
            Some((offset - page_size).max(0))
        } else {
            None
        };

        Self {
            rows,
            total,
            offset,
            next_offset,
            prev_offset,
        }
    }

    pub fn empty() -> Self {
        Self {
            rows: vec![],
            total: 0,
            offset: 0,
            next_offset: None,
            prev_offset: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_has_no_previous() {
        let page = Page::from_rows(vec![1, 2, 3], 10, 3, 0);
        assert_eq!(page.prev_offset, None);
        assert_eq!(page.next_offset, Some(3));
    }

    #[test]
    fn middle_page_links_both_ways() {
        let page = Page::from_rows(vec![4, 5, 6], 10, 3, 3);
        assert_eq!(page.prev_offset, Some(0));
        assert_eq!(page.next_offset, Some(6));
    }

    #[test]
    fn last_page_has_no_next() {
        let page = Page::from_rows(vec![10], 10, 3, 9);
        assert_eq!(page.prev_offset, Some(6));
        assert_eq!(page.next_offset, None);
    }

    #[test]
    fn short_offset_clamps_previous_to_zero() {
        let page = Page::from_rows(vec![2, 3, 4], 10, 3, 1);
        assert_eq!(page.prev_offset, Some(0));
    }
}
