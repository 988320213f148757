//! Ordered, key-unique header list.

/// Header names used by the supported command subset.
pub mod names {
    /// Protocol versions the client accepts (CONNECT)
    pub const ACCEPT_VERSION: &str = "accept-version";
    /// Virtual host (CONNECT)
    pub const HOST: &str = "host";
    /// Username (CONNECT)
    pub const LOGIN: &str = "login";
    /// Password (CONNECT)
    pub const PASSCODE: &str = "passcode";
    /// Channel path, `/` + channel name (SUBSCRIBE, SEND, MESSAGE)
    pub const DESTINATION: &str = "destination";
    /// Subscription identifier (SUBSCRIBE, UNSUBSCRIBE)
    pub const ID: &str = "id";
    /// Requested receipt identifier (SUBSCRIBE, UNSUBSCRIBE, DISCONNECT)
    pub const RECEIPT: &str = "receipt";
    /// Acknowledged receipt identifier (RECEIPT)
    pub const RECEIPT_ID: &str = "receipt-id";
    /// Human-readable failure (ERROR)
    pub const MESSAGE: &str = "message";
}

/// Frame headers.
///
/// Keeps headers in first-insertion order so outbound frames are emitted in
/// the order the caller chose. Keys are unique: inserting an existing name
/// overwrites its value in place (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty header list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a header. Returns the previous value, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();

        if let Some((_, existing)) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            return Some(std::mem::replace(existing, value));
        }

        self.entries.push((name, value));
        None
    }

    /// Value of a header. `None` if absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Check if a header is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Headers in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}
