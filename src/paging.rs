//! 分页参数。

/// `start` 为跳过的行数（0 起），`rows` 为每页行数；`rows == 0` 表示不分页。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Paging {
    pub start: u64,
    pub rows: u64,
}

impl Paging {
    pub fn new(start: u64, rows: u64) -> Self {
        Self { start, rows }
    }

    /// 按页码（1 起）计算。
    pub fn page(page: u64, page_size: u64) -> Self {
        Self {
            start: page.saturating_sub(1).saturating_mul(page_size),
            rows: page_size,
        }
    }

    pub fn is_paged(&self) -> bool {
        self.rows > 0
    }

    /// 最后一行（不含）的位置。
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::Paging;
    use pretty_assertions::assert_eq;

    #[test]
    fn page_numbers_start_at_one() {
        assert_eq!(Paging::page(1, 10), Paging::new(0, 10));
        assert_eq!(Paging::page(3, 10), Paging::new(20, 10));
        assert_eq!(Paging::page(0, 10), Paging::new(0, 10));
        assert_eq!(Paging::new(20, 10).end(), 30);
        assert!(!Paging::default().is_paged());
    }

    #[test]
    fn bounds_saturate_instead_of_overflowing() {
        assert_eq!(Paging::new(u64::MAX, 10).end(), u64::MAX);
        assert_eq!(Paging::page(u64::MAX, u64::MAX).start, u64::MAX);
    }
}
