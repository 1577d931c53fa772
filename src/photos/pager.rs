use anyhow::Result;

use super::types::Page;

/// Lazy, forward-only iterator over a paginated listing
///
/// Pages are fetched on demand. Iteration stops after the last page or after
/// the first error, which is yielded once.
pub struct Paginated<T, F> {
    fetch: F,
    items: std::vec::IntoIter<T>,
    next_page: Option<String>,
    started: bool,
    done: bool,
}

impl<T, F> Paginated<T, F>
where
    F: FnMut(Option<&str>) -> Result<Page<T>>,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            items: vec![].into_iter(),
            next_page: None,
            started: false,
            done: false,
        }
    }
}

impl<T, F> Iterator for Paginated<T, F>
where
    F: FnMut(Option<&str>) -> Result<Page<T>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.items.next() {
                return Some(Ok(item));
            }

            if self.done || (self.started && self.next_page.is_none()) {
                self.done = true;
                return None;
            }

            self.started = true;

            let page_token = self.next_page.take();

            match (self.fetch)(page_token.as_deref()) {
                Ok(Page {
                    items,
                    next_page_token,
                }) => {
                    self.items = items.into_iter();
                    self.next_page = next_page_token;
                }

                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
