//! Tag grammar (§4.1).
//!
//! Field and table metadata is carried as a string of the shape
//! `key1(v1,v2);key2;key3(v3)`. This module is deliberately the only place
//! in the workspace that understands that grammar — `ormcraft-query`'s model
//! builder calls into it once per field/table tag and never re-parses.
//!
//! Two delimiter styles are attested in the literature this crate is ported
//! from: `name:v1,v2` and `name(v1,v2)`. This implementation picks the
//! parenthesis style and applies it uniformly — see DESIGN.md for why.

use crate::error::{OrmError, OrmResult};

/// An ordered, duplicate-resolving view of a parsed tag string.
///
/// Preserves first-seen key order; re-parsing a key later in the same tag
/// text overwrites the stored values in place (last write wins) rather than
/// appending a second entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap(Vec<(String, Vec<String>)>);

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&mut self, name: String, values: Vec<String>) {
        if let Some(entry) = self.0.iter_mut().find(|(k, _)| *k == name) {
            entry.1 = values;
        } else {
            self.0.push((name, values));
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.iter().any(|(k, _)| k == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Splits one `;`-delimited entry into its name and value list.
///
/// `name` with no parens yields an empty value list; `name(a,b)` yields
/// `["a", "b"]`; an unterminated `name(a,b` is a syntax error.
fn split_entry(part: &str) -> OrmResult<(&str, Vec<String>)> {
    match part.find('(') {
        None => Ok((part, Vec::new())),
        Some(open) => {
            if !part.ends_with(')') {
                return Err(OrmError::tag_syntax(format!(
                    "unterminated value list in tag entry {part:?}"
                )));
            }
            let name = &part[..open];
            let inner = &part[open + 1..part.len() - 1];
            let values = if inner.is_empty() {
                Vec::new()
            } else {
                inner.split(',').map(str::to_string).collect()
            };
            Ok((name, values))
        }
    }
}

/// Parses a full tag string into an ordered mapping.
///
/// Entries are separated by `;`; empty entries (consecutive `;;` or a
/// trailing `;`) are ignored. Whitespace is significant and never stripped.
pub fn parse(text: &str) -> OrmResult<TagMap> {
    let mut map = TagMap::new();
    for part in text.split(';') {
        if part.is_empty() {
            continue;
        }
        let (name, values) = split_entry(part)?;
        map.set(name.to_string(), values);
    }
    Ok(map)
}

/// Scans for a single named entry without building the full mapping.
pub fn get(text: &str, name: &str) -> OrmResult<Option<Vec<String>>> {
    if text.is_empty() {
        return Ok(None);
    }
    for part in text.split(';') {
        if part.is_empty() {
            continue;
        }
        let (entry_name, values) = split_entry(part)?;
        if entry_name == name {
            return Ok(Some(values));
        }
    }
    Ok(None)
}

/// Like [`get`], but falls back to `defaults` when `name` is absent.
pub fn must_get(text: &str, name: &str, defaults: &[&str]) -> OrmResult<Vec<String>> {
    match get(text, name)? {
        Some(values) => Ok(values),
        None => Ok(defaults.iter().map(|s| s.to_string()).collect()),
    }
}

/// Reports whether `name` appears in `text`, without allocating a value list.
///
/// Malformed entries (unterminated parens) are treated as non-matching
/// rather than propagated — `has` never fails, by design (§4.1); use
/// [`get`] if you need to observe the syntax error.
pub fn has(text: &str, name: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    text.split(';').any(|part| {
        if part.is_empty() {
            return false;
        }
        match part.find('(') {
            None => part == name,
            Some(open) => &part[..open] == name,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_entries() {
        let map = parse("name(id);ai(1,2)").unwrap();
        assert_eq!(map.get("name"), Some(&["id".to_string()][..]));
        assert_eq!(map.get("ai"), Some(&["1".to_string(), "2".to_string()][..]));
    }

    #[test]
    fn ignores_empty_entries() {
        let map = parse(";pk;;unique(uq);").unwrap();
        assert!(map.has("pk"));
        assert_eq!(map.get("pk"), Some(&[][..]));
        assert_eq!(map.get("unique"), Some(&["uq".to_string()][..]));
    }

    #[test]
    fn duplicate_keys_last_write_wins() {
        let map = parse("name(a);name(b)").unwrap();
        assert_eq!(map.get("name"), Some(&["b".to_string()][..]));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn unterminated_paren_is_a_syntax_error() {
        assert!(parse("ai(1,2").is_err());
        assert!(get("ai(1,2", "ai").is_err());
    }

    #[test]
    fn whitespace_is_not_stripped() {
        let map = parse("name( a , b )").unwrap();
        assert_eq!(map.get("name"), Some(&[" a ".to_string(), " b ".to_string()][..]));
    }

    #[test]
    fn has_matches_get_presence_for_well_formed_tags() {
        let text = "name(id);pk;unique(uq)";
        for key in ["name", "pk", "unique", "missing"] {
            assert_eq!(has(text, key), get(text, key).unwrap().is_some());
        }
    }

    #[test]
    fn must_get_falls_back_to_defaults() {
        let values = must_get("name(id)", "len", &["10", "2"]).unwrap();
        assert_eq!(values, vec!["10".to_string(), "2".to_string()]);
    }

    proptest::proptest! {
        #[test]
        fn has_and_get_agree_on_ascii_identifier_keys(
            key in "[a-zA-Z_][a-zA-Z0-9_]{0,8}",
            other in "[a-zA-Z_][a-zA-Z0-9_]{0,8}",
        ) {
            let text = format!("{key};{other}(1,2)");
            if let Ok(Some(_)) = get(&text, &key) {
                proptest::prop_assert!(has(&text, &key));
            }
        }
    }
}
