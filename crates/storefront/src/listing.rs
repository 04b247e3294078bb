//! Catalog listing transforms - search, filter, sort.
//!
//! Pure, synchronous functions over an in-memory product list, composable in
//! any order the caller chooses. Collection membership plays no role here;
//! the input is whatever slice of the catalog the page is showing.

use marche_core::Product;

/// Sort orders offered by the shop page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    PriceAscending,
    PriceDescending,
    NameAscending,
    NameDescending,
    NewestFirst,
}

/// Case-insensitive substring match against title and description.
///
/// An empty or whitespace-only query is the identity transform - it returns
/// the list unchanged, not an empty list.
#[must_use]
pub fn search(products: Vec<Product>, query: &str) -> Vec<Product> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return products;
    }

    products
        .into_iter()
        .filter(|product| {
            product.title.to_lowercase().contains(&query)
                || product
                    .description
                    .as_ref()
                    .is_some_and(|d| d.to_lowercase().contains(&query))
        })
        .collect()
}

/// Keep products whose new-arrival flag matches. `None` means no filter.
#[must_use]
pub fn filter_new(products: Vec<Product>, flag: Option<bool>) -> Vec<Product> {
    match flag {
        Some(wanted) => products
            .into_iter()
            .filter(|product| product.is_new == wanted)
            .collect(),
        None => products,
    }
}

/// Keep products with a discount strictly greater than zero.
#[must_use]
pub fn filter_discounted(products: Vec<Product>) -> Vec<Product> {
    products
        .into_iter()
        .filter(Product::is_discounted)
        .collect()
}

/// Sort by `key`. The sort is stable: products that compare equal keep
/// their input order, which paginated UIs rely on as a secondary key.
#[must_use]
pub fn sort_products(mut products: Vec<Product>, key: SortKey) -> Vec<Product> {
    match key {
        SortKey::PriceAscending => products.sort_by(|a, b| a.price.amount.cmp(&b.price.amount)),
        SortKey::PriceDescending => products.sort_by(|a, b| b.price.amount.cmp(&a.price.amount)),
        SortKey::NameAscending => {
            products.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        }
        SortKey::NameDescending => {
            products.sort_by(|a, b| b.title.to_lowercase().cmp(&a.title.to_lowercase()));
        }
        SortKey::NewestFirst => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
    products
}
