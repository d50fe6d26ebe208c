use std::collections::BTreeMap;

pub(crate) const PAGE_NUMBER: &str = "page[number]";
pub(crate) const PAGE_SIZE: &str = "page[size]";

/// Query parameters for a single request.
///
/// Each key holds at most one value; setting a key again replaces it.
/// Keys are encoded in sorted order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pairs: BTreeMap<String, String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.pairs.insert(key.into(), value.to_string());
        self
    }

    /// Builder form of [`Query::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Adds a JSON:API filter such as `filter[organization][name]`.
    ///
    /// `path` is the list of bracketed segments, e.g. `["organization", "name"]`.
    pub fn filter<'a, I>(mut self, path: I, value: impl ToString) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let key = path
            .into_iter()
            .fold(String::from("filter"), |mut key, segment| {
                key.push('[');
                key.push_str(segment);
                key.push(']');
                key
            });
        self.set(key, value);
        self
    }

    /// Sets `page[number]` (1-based).
    pub fn page_number(mut self, page: u32) -> Self {
        self.set(PAGE_NUMBER, page);
        self
    }

    /// Sets `page[size]`.
    pub fn page_size(mut self, size: u32) -> Self {
        self.set(PAGE_SIZE, size);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Query
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Self::new();
        for (key, value) in iter {
            query.set(key, value);
        }
        query
    }
}
