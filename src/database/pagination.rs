use serde::{Deserialize, Serialize};

/// Offset-windowed page of rows. Fetch queries select `COUNT(*) OVER()`
/// alongside the row columns so one round trip yields both.
#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub rows: Vec<T>,
    pub total_rows: i64,
    pub next_offset: i64,
    pub prev_offset: i64,
    pub page_list: Vec<(String, i64)>,
    pub message: Option<String>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, current_offset: i64) -> Self {
        if rows.is_empty() || total_rows <= 0 {
            return Self::no_rows();
        }

        let last_offset = ((total_rows - 1) / page_size) * page_size;
        let next_offset = (current_offset + page_size).min(last_offset);
        let prev_offset = (current_offset - page_size).max(0);

        let page_count = (total_rows + page_size - 1) / page_size;
        let current_page = current_offset / page_size;

        let page_list = (0..page_count)
            .map(|n| {
                let label = if n == current_page {
                    String::from("...")
                } else {
                    format!("{}", n + 1)
                };
                (label, n * page_size)
            })
            .collect();

        Self {
            rows,
            total_rows,
            next_offset,
            prev_offset,
            page_list,
            message: Some(format!(
                "{} - {} / {}",
                current_offset,
                (current_offset + page_size).min(total_rows),
                total_rows
            )),
        }
    }

    pub fn no_rows() -> Self {
        Self {
            rows: vec![],
            total_rows: 0,
            next_offset: 0,
            prev_offset: 0,
            page_list: vec![(String::from("1"), 0)],
            message: Some(String::from("No results")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_page() {
        let page = PageContext::from_rows(vec![1, 2, 3], 3, 10, 0);
        assert_eq!(page.total_rows, 3);
        assert_eq!(page.next_offset, 0);
        assert_eq!(page.prev_offset, 0);
        assert_eq!(page.page_list.len(), 1);
    }

    #[test]
    fn middle_page_windows() {
        let rows: Vec<i32> = (0..10).collect();
        let page = PageContext::from_rows(rows, 35, 10, 10);
        assert_eq!(page.next_offset, 20);
        assert_eq!(page.prev_offset, 0);
        assert_eq!(page.page_list.len(), 4);
        // current page is masked in the jump list
        assert_eq!(page.page_list[1].0, "...");
        assert_eq!(page.page_list[3], (String::from("4"), 30));
    }

    #[test]
    fn last_page_does_not_overshoot() {
        let page = PageContext::from_rows(vec![1, 2, 3, 4, 5], 35, 10, 30);
        assert_eq!(page.next_offset, 30);
        assert_eq!(page.prev_offset, 20);
    }

    #[test]
    fn empty_result() {
        let page: PageContext<i32> = PageContext::no_rows();
        assert_eq!(page.total_rows, 0);
        assert_eq!(page.page_list, vec![(String::from("1"), 0)]);
    }
}
