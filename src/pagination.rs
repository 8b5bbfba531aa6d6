//! Offset/limit windows for `GET /movies`.

use sea_orm::Order;

use crate::entities::movie;

/// Hard cap on page size, also the default.
pub const MAX_PER_PAGE: u64 = 5;

/// Raw query string. Values stay strings so that garbage falls back to the
/// defaults instead of rejecting the request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListQuery {
    /// The first occurrence of a repeated key wins; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut query.page,
                "perPage" => &mut query.per_page,
                "sort" => &mut query.sort,
                "order" => &mut query.order,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortField {
    Price,
    Duration,
}

impl SortField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "price" => Some(SortField::Price),
            "duration" => Some(SortField::Duration),
            _ => None,
        }
    }

    pub fn column(self) -> movie::Column {
        match self {
            SortField::Price => movie::Column::Price,
            SortField::Duration => movie::Column::Duration,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("DESC") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub offset: u64,
    pub sort: Option<SortField>,
    pub order: SortOrder,
    pub prev_page: Option<String>,
    pub next_page: Option<String>,
}

impl Pagination {
    pub fn limit(&self) -> u64 {
        self.per_page
    }
}

pub fn paginate(query: &ListQuery, total_rows: u64, base_url: &str) -> Pagination {
    let page = page_number(query.page.as_deref());
    let per_page = page_size(query.per_page.as_deref());
    let number_of_pages = total_rows.div_ceil(per_page);

    let link = |page: u64| format!("{base_url}/movies?page={page}&perPage={per_page}");

    let prev_page = if page <= 1 || number_of_pages < page - 1 { None } else { Some(link(page - 1)) };
    let next_page = if number_of_pages <= page { None } else { Some(link(page + 1)) };

    Pagination {
        page,
        per_page,
        offset: (page - 1).saturating_mul(per_page).min(i64::MAX as u64),
        sort: query.sort.as_deref().and_then(SortField::parse),
        order: SortOrder::parse(query.order.as_deref()),
        prev_page,
        next_page,
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}

fn page_number(raw: Option<&str>) -> u64 {
    match parse_int(raw) {
        Some(page) if page > 0 => page as u64,
        _ => 1,
    }
}

fn page_size(raw: Option<&str>) -> u64 {
    match parse_int(raw) {
        Some(size) if (1..=MAX_PER_PAGE as i64).contains(&size) => size as u64,
        _ => MAX_PER_PAGE,
    }
}
