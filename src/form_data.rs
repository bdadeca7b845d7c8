//! Multi-valued key/value submissions.
use crate::value::Blob;

#[derive(Debug, Clone, PartialEq)]
pub enum FormDataEntry {
    Text(String),
    File(Blob),
}

impl FormDataEntry {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::File(_) => None,
        }
    }
}

impl From<&str> for FormDataEntry {
    fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for FormDataEntry {
    fn from(s: String) -> Self { Self::Text(s) }
}

impl From<Blob> for FormDataEntry {
    fn from(blob: Blob) -> Self { Self::File(blob) }
}

/// Entries in submission order; a name may repeat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    entries: Vec<(String, FormDataEntry)>,
}

impl FormData {
    pub fn new() -> Self { Self::default() }

    /// Decode an `application/x-www-form-urlencoded` body.
    pub fn from_urlencoded(body: &[u8]) -> Self {
        url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), FormDataEntry::Text(v.into_owned())))
            .collect()
    }

    pub fn append(&mut self, name: impl Into<String>, entry: impl Into<FormDataEntry>) {
        self.entries.push((name.into(), entry.into()));
    }

    /// First entry submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&FormDataEntry> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Every entry submitted under `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FormDataEntry> + 'a {
        self.entries.iter().filter(move |(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormDataEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl<K: Into<String>, V: Into<FormDataEntry>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencoded_keeps_repeats_in_order() {
        let form = FormData::from_urlencoded(b"tags=a&name=Jane+Doe&tags=b%20c&tags=");
        assert_eq!(form.len(), 4);
        assert_eq!(form.get("name"), Some(&FormDataEntry::from("Jane Doe")));
        let tags: Vec<_> = form.get_all("tags").filter_map(FormDataEntry::as_text).collect();
        assert_eq!(tags, vec!["a", "b c", ""]);
        assert_eq!(form.get("missing"), None);
    }

    #[test]
    fn files_are_not_text() {
        let mut form = FormData::new();
        form.append("avatar", Blob::new(&b"\x89PNG"[..]));
        assert!(form.get("avatar").unwrap().as_text().is_none());
    }
}
