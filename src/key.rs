use std::fmt;
use std::str::FromStr;

use crate::api;
use crate::error::Error;

/// Application id used for keys and queries constructed without an explicit
/// one, mirroring the store's ambient local application.
pub const LOCAL_APP_ID: &str = "local";

/// Represents a path element's identity.
///
/// It can either be an integer id, a name, or unassigned (incomplete).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyID {
    /// A named identity.
    StringID(String),
    /// An integer identity.
    IntID(i64),
    /// An unassigned identity.
    Incomplete,
}

impl KeyID {
    /// Is this identity unassigned ?
    pub fn is_incomplete(&self) -> bool {
        matches!(self, KeyID::Incomplete)
    }
}

/// One `(kind, identity)` step of a key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathElement {
    pub(crate) kind: String,
    pub(crate) id: KeyID,
}

impl PathElement {
    /// The element's kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The element's identity.
    pub fn id(&self) -> &KeyID {
        &self.id
    }
}

/// Represents an entity's hierarchical key: an application id plus a
/// non-empty ordered path of `(kind, identity)` elements.
///
/// A key is *complete* when its last element has an id or a name assigned.
/// All elements before the last always have identity.
///
/// ```
/// # use datastore3::Key;
/// let key = Key::new("Person").unwrap().name("ryan").unwrap();
/// assert!(key.is_complete());
/// assert_eq!(key.to_string(), "/Person:ryan");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub(crate) app: String,
    pub(crate) path: Vec<PathElement>,
}

fn validate_kind(kind: &str) -> Result<(), Error> {
    if kind.is_empty() {
        return Err(Error::BadArgument("kind must not be empty".into()));
    }
    Ok(())
}

impl Key {
    /// Creates a new incomplete root key of `kind` in the default application.
    ///
    /// ```
    /// # use datastore3::Key;
    /// let key = Key::new("Person").unwrap();
    /// assert!(!key.is_complete());
    /// ```
    pub fn new(kind: impl Into<String>) -> Result<Key, Error> {
        Key::with_app(LOCAL_APP_ID, kind)
    }

    /// Creates a new incomplete root key of `kind` in `app`.
    pub fn with_app(app: impl Into<String>, kind: impl Into<String>) -> Result<Key, Error> {
        let app = app.into();
        let kind = kind.into();
        if app.is_empty() {
            return Err(Error::BadArgument("app must not be empty".into()));
        }
        validate_kind(&kind)?;
        Ok(Key {
            app,
            path: vec![PathElement {
                kind,
                id: KeyID::Incomplete,
            }],
        })
    }

    /// Assigns a name to the key's last element.
    ///
    /// Names must be non-empty and must not begin with a digit; digits lead
    /// integer ids.
    ///
    /// ```
    /// # use datastore3::Key;
    /// let key = Key::new("Person").unwrap().name("ryan").unwrap();
    /// assert!(Key::new("Person").unwrap().name("9lives").is_err());
    /// ```
    pub fn name(mut self, name: impl Into<String>) -> Result<Key, Error> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::BadValue("name must not be empty".into()));
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(Error::BadValue("name cannot begin with a digit".into()));
        }
        let last = self.path.last_mut().unwrap();
        last.id = KeyID::StringID(name);
        Ok(self)
    }

    /// Assigns an integer id to the key's last element. Id 0 is reserved for
    /// "unassigned" and is rejected.
    ///
    /// ```
    /// # use datastore3::Key;
    /// let key = Key::new("Person").unwrap().id(28).unwrap();
    /// assert!(key.is_complete());
    /// ```
    pub fn id(mut self, id: i64) -> Result<Key, Error> {
        if id == 0 {
            return Err(Error::BadValue("id 0 is reserved for unassigned keys".into()));
        }
        let last = self.path.last_mut().unwrap();
        last.id = KeyID::IntID(id);
        Ok(self)
    }

    /// Creates an incomplete child key of `kind` under this key.
    ///
    /// The parent must be complete; the child inherits its application.
    ///
    /// ```
    /// # use datastore3::Key;
    /// let parent = Key::new("Person").unwrap().name("ryan").unwrap();
    /// let child = parent.child("Pet").unwrap().name("rex").unwrap();
    /// assert_eq!(child.parent(), Some(parent));
    /// ```
    pub fn child(&self, kind: impl Into<String>) -> Result<Key, Error> {
        if !self.is_complete() {
            return Err(Error::BadKey(format!("key {self} is not complete")));
        }
        let kind = kind.into();
        validate_kind(&kind)?;
        let mut path = self.path.clone();
        path.push(PathElement {
            kind,
            id: KeyID::Incomplete,
        });
        Ok(Key {
            app: self.app.clone(),
            path,
        })
    }

    /// The owning application.
    pub fn app(&self) -> &str {
        &self.app
    }

    /// The kind of the key's last element.
    pub fn kind(&self) -> &str {
        &self.path.last().unwrap().kind
    }

    /// The identity of the key's last element.
    pub fn key_id(&self) -> &KeyID {
        &self.path.last().unwrap().id
    }

    /// The key path, topmost element first.
    pub fn path(&self) -> &[PathElement] {
        &self.path
    }

    /// Is the last path element's identity assigned ?
    pub fn is_complete(&self) -> bool {
        !self.path.last().unwrap().id.is_incomplete()
    }

    /// The key formed by dropping the last path element, or `None` for a
    /// root key.
    pub fn parent(&self) -> Option<Key> {
        if self.path.len() < 2 {
            return None;
        }
        Some(Key {
            app: self.app.clone(),
            path: self.path[..self.path.len() - 1].to_vec(),
        })
    }

    /// The key's entity group: the topmost path element alone, under the
    /// same application. All keys sharing an entity group share transactional
    /// locality.
    pub fn entity_group(&self) -> Key {
        Key {
            app: self.app.clone(),
            path: vec![self.path[0].clone()],
        }
    }

    /// Converts this key to its wire representation.
    pub(crate) fn to_wire(&self) -> api::Reference {
        api::Reference {
            app: self.app.clone(),
            path: Some(api::Path {
                element: self
                    .path
                    .iter()
                    .map(|el| api::PathElement {
                        kind: el.kind.clone(),
                        id: match &el.id {
                            KeyID::IntID(id) => Some(*id),
                            _ => None,
                        },
                        name: match &el.id {
                            KeyID::StringID(name) => Some(name.clone()),
                            _ => None,
                        },
                    })
                    .collect(),
            }),
        }
    }

    /// Rebuilds a key from its wire representation, validating the path
    /// discipline: non-empty path, id xor name per element, ancestors
    /// complete, id 0 and empty names rejected.
    pub(crate) fn from_wire(reference: api::Reference) -> Result<Key, Error> {
        if reference.app.is_empty() {
            return Err(Error::Corrupt("key is missing its application id".into()));
        }
        let elements = reference.path.map(|p| p.element).unwrap_or_default();
        if elements.is_empty() {
            return Err(Error::Corrupt("key has an empty path".into()));
        }
        let count = elements.len();
        let mut path = Vec::with_capacity(count);
        for (index, el) in elements.into_iter().enumerate() {
            if el.kind.is_empty() {
                return Err(Error::Corrupt("key path element is missing its kind".into()));
            }
            let id = match (el.id, el.name) {
                (Some(_), Some(_)) => {
                    return Err(Error::Corrupt(
                        "key path element has both an id and a name".into(),
                    ));
                }
                (Some(0), None) => {
                    return Err(Error::Corrupt("key path element has the reserved id 0".into()));
                }
                (Some(id), None) => KeyID::IntID(id),
                (None, Some(name)) if name.is_empty() => {
                    return Err(Error::Corrupt("key path element has an empty name".into()));
                }
                (None, Some(name)) => KeyID::StringID(name),
                (None, None) if index + 1 == count => KeyID::Incomplete,
                (None, None) => {
                    return Err(Error::Corrupt(
                        "non-terminal key path element is incomplete".into(),
                    ));
                }
            };
            path.push(PathElement { kind: el.kind, id });
        }
        Ok(Key {
            app: reference.app,
            path,
        })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for el in &self.path {
            match &el.id {
                KeyID::IntID(id) => write!(f, "/{}:{}", el.kind, id)?,
                KeyID::StringID(name) => write!(f, "/{}:{}", el.kind, name)?,
                KeyID::Incomplete => write!(f, "/{}", el.kind)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Key {
    type Err = Error;

    /// Parses the readable key form `/Kind:identity/Kind:identity/...`.
    ///
    /// All-digit identities parse as integer ids, anything else as a name.
    /// The last element may be a bare `Kind`, producing an incomplete key.
    fn from_str(text: &str) -> Result<Key, Error> {
        let trimmed = text.strip_prefix('/').unwrap_or(text);
        if trimmed.is_empty() {
            return Err(Error::BadKey(format!("could not parse key string: {text:?}")));
        }
        let mut key: Option<Key> = None;
        for segment in trimmed.split('/') {
            let (kind, identity) = match segment.split_once(':') {
                Some((kind, identity)) => (kind, Some(identity)),
                None => (segment, None),
            };
            let extended = match key {
                None => Key::new(kind)?,
                Some(parent) => parent.child(kind)?,
            };
            key = Some(match identity {
                None => extended,
                Some(identity) if identity.bytes().all(|b| b.is_ascii_digit()) => {
                    let id: i64 = identity.parse().map_err(|_| {
                        Error::BadKey(format!("could not parse key id in segment {segment:?}"))
                    })?;
                    extended.id(id)?
                }
                Some(identity) => extended.name(identity)?,
            });
        }
        Ok(key.unwrap())
    }
}

/// Normalization of the argument kinds the store's calls accept in key
/// position: keys, readable key strings, and entities.
pub trait ToKey {
    /// Produces the key this value designates.
    fn to_key(&self) -> Result<Key, Error>;
}

impl ToKey for Key {
    fn to_key(&self) -> Result<Key, Error> {
        Ok(self.clone())
    }
}

impl ToKey for &Key {
    fn to_key(&self) -> Result<Key, Error> {
        Ok((*self).clone())
    }
}

impl ToKey for &str {
    fn to_key(&self) -> Result<Key, Error> {
        self.parse()
    }
}

impl ToKey for String {
    fn to_key(&self) -> Result<Key, Error> {
        self.parse()
    }
}
