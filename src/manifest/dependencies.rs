use indexmap::IndexMap;
use serde::de::{Error as _, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};

/// An insertion-ordered `package -> constraint` map, as found in the
/// `require` and `require-dev` sections.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct DependencyMap {
    entries: IndexMap<String, String>,
}

impl DependencyMap {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Set the constraint for `name`, keeping its position if present.
    /// Returns the previous constraint.
    pub fn insert(&mut self, name: &str, constraint: &str) -> Option<String> {
        self.entries.insert(name.to_string(), constraint.to_string())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Composer writes an empty section as `[]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSection {
    Map(IndexMap<String, String>),
    List(Vec<IgnoredAny>),
}

impl<'de> Deserialize<'de> for DependencyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawSection::deserialize(deserializer)? {
            RawSection::Map(entries) => Ok(Self { entries }),
            RawSection::List(items) if items.is_empty() => Ok(Self::default()),
            RawSection::List(_) => Err(D::Error::custom(
                "expected a map of package names to version constraints",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_position() {
        let mut map = DependencyMap::default();
        map.insert("php", "^8.2");
        map.insert("acme/widget", "dev-main");
        map.insert("laravel/framework", "^11.0");

        assert_eq!(map.insert("acme/widget", "dev-topic"), Some("dev-main".to_string()));
        let names: Vec<_> = map.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["php", "acme/widget", "laravel/framework"]);
        assert_eq!(map.get("acme/widget"), Some("dev-topic"));
    }

    #[test]
    fn test_remove() {
        let mut map = DependencyMap::default();
        map.insert("acme/widget", "dev-main");
        assert_eq!(map.remove("acme/widget"), Some("dev-main".to_string()));
        assert_eq!(map.remove("acme/widget"), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_serde_preserves_order() {
        let json = r#"{"zeta/z":"1.0","alpha/a":"2.0"}"#;
        let map: DependencyMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(serde_json::to_string(&map).unwrap(), json);
    }

    #[test]
    fn test_deserialize_rejects_non_string_constraint() {
        assert!(serde_json::from_str::<DependencyMap>(r#"{"acme/widget": 1}"#).is_err());
    }

    #[test]
    fn test_empty_list_is_empty_section() {
        let map: DependencyMap = serde_json::from_str("[]").unwrap();
        assert!(map.is_empty());
        assert_eq!(serde_json::to_string(&map).unwrap(), "{}");
        assert!(serde_json::from_str::<DependencyMap>(r#"["acme/widget"]"#).is_err());
    }

    #[test]
    fn test_remove_keeps_order_of_the_rest() {
        let mut map: DependencyMap =
            serde_json::from_str(r#"{"php":"^8.2","acme/widget":"dev-main","laravel/framework":"^11.0"}"#)
                .unwrap();
        map.remove("acme/widget");
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"{"php":"^8.2","laravel/framework":"^11.0"}"#
        );
    }
}
