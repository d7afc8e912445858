use std::sync::Arc;

use tokio::sync::watch;

use crate::models::{CategoryFilter, Listing};

/// The active category shared by every catalog view. Starts at `all`.
///
/// Clones share the same value. `set` is the only way to change it; readers
/// either poll with `get` or wait on a `subscribe` receiver.
#[derive(Debug, Clone)]
pub struct FilterState {
    tx: Arc<watch::Sender<CategoryFilter>>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(CategoryFilter::All);
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> CategoryFilter {
        *self.tx.borrow()
    }

    /// Returns `true` if the value changed.
    pub fn set(&self, filter: CategoryFilter) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == filter {
                return false;
            }
            *current = filter;
            true
        })
    }

    /// Applies a `?category=` value from a URL. Unknown values leave the
    /// current selection alone.
    pub fn set_from_query(&self, raw: Option<&str>) -> bool {
        match CategoryFilter::from_query(raw) {
            Some(filter) => self.set(filter),
            None => false,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CategoryFilter> {
        self.tx.subscribe()
    }

    /// Narrows an already-fetched listing set to the active category.
    pub fn apply<'a>(&self, listings: &'a [Listing]) -> Vec<&'a Listing> {
        let filter = self.get();
        listings.iter().filter(|l| filter.matches(l)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ListingRequest};
    use crate::validation::Lenient;

    fn listing(title: &str, category: &str) -> Listing {
        let request = ListingRequest {
            title: Some(title.to_string()),
            price: Some(Lenient::Value(1.0)),
            category: Some(category.to_string()),
            ..Default::default()
        };
        Listing::from_new(request.validate_into().unwrap())
    }

    #[test]
    fn test_starts_at_all() {
        assert_eq!(FilterState::new().get(), CategoryFilter::All);
    }

    #[test]
    fn test_clones_share_state() {
        let state = FilterState::new();
        let view = state.clone();
        assert!(state.set(CategoryFilter::Only(Category::Food)));
        assert_eq!(view.get(), CategoryFilter::Only(Category::Food));
    }

    #[test]
    fn test_subscribers_see_changes_only() {
        let state = FilterState::new();
        let mut rx = state.subscribe();
        assert!(!rx.has_changed().unwrap());

        assert!(!state.set(CategoryFilter::All));
        assert!(!rx.has_changed().unwrap());

        assert!(state.set(CategoryFilter::Only(Category::Lifestyle)));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), CategoryFilter::Only(Category::Lifestyle));
    }

    #[test]
    fn test_query_param_ignores_unknown() {
        let state = FilterState::new();
        assert!(state.set_from_query(Some("education")));
        assert!(!state.set_from_query(Some("gadgets")));
        assert!(!state.set_from_query(None));
        assert!(!state.set_from_query(Some("  ")));
        assert!(state.set_from_query(Some(" all ")));
        assert!(state.set_from_query(Some("education")));
        assert_eq!(state.get(), CategoryFilter::Only(Category::Education));
    }

    #[test]
    fn test_apply_narrows_fetched_set() {
        let listings = vec![
            listing("veg box", "food"),
            listing("bamboo kit", "lifestyle"),
            listing("fruit basket", "food"),
        ];
        let state = FilterState::new();
        assert_eq!(state.apply(&listings).len(), 3);

        state.set(CategoryFilter::Only(Category::Food));
        let titles: Vec<&str> = state.apply(&listings).iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["veg box", "fruit basket"]);

        state.set(CategoryFilter::Only(Category::Education));
        assert!(state.apply(&listings).is_empty());
    }
}
