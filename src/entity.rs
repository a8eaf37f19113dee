use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::api;
use crate::codec;
use crate::error::Error;
use crate::key::{Key, ToKey};
use crate::value::{IntoPropertyValue, PropertyValue};

/// A datastore entity: a property map bound to a [`Key`].
///
/// The key's application and kind are frozen at construction. Properties are
/// set through [`Entity::set`], which validates names and values before
/// storing, so every entity held in memory is storable.
///
/// Entities are deliberately not [`Clone`]: the store assigns identity on
/// first put, and silent copies of identified state are a bug factory.
/// Construct a fresh entity instead.
///
/// ```
/// # use datastore3::Entity;
/// let mut person = Entity::with_name("Person", "ryan").unwrap();
/// person.set("age", 28).unwrap();
/// assert!(person.contains("age"));
/// ```
#[derive(Debug, PartialEq)]
pub struct Entity {
    pub(crate) key: Key,
    pub(crate) properties: BTreeMap<String, PropertyValue>,
}

impl Entity {
    /// Creates an entity with an incomplete root key of `kind` in the
    /// default application. The store assigns the trailing id on first put.
    pub fn new(kind: impl Into<String>) -> Result<Entity, Error> {
        Ok(Entity::with_key(Key::new(kind)?))
    }

    /// Creates an entity with a named root key of `kind`.
    pub fn with_name(kind: impl Into<String>, name: impl Into<String>) -> Result<Entity, Error> {
        Ok(Entity::with_key(Key::new(kind)?.name(name)?))
    }

    /// Creates an entity of `kind` under `parent`, with an incomplete key.
    /// The parent key must be complete.
    pub fn with_parent(kind: impl Into<String>, parent: &impl ToKey) -> Result<Entity, Error> {
        let parent = parent.to_key()?;
        if !parent.is_complete() {
            return Err(Error::BadKey(format!("parent key {parent} is not complete")));
        }
        Ok(Entity::with_key(parent.child(kind)?))
    }

    /// Creates an entity around an existing key, with an empty property map.
    pub fn with_key(key: Key) -> Entity {
        Entity {
            key,
            properties: BTreeMap::new(),
        }
    }

    /// The name of the application that owns this entity.
    pub fn app(&self) -> &str {
        self.key.app()
    }

    /// This entity's kind.
    pub fn kind(&self) -> &str {
        self.key.kind()
    }

    /// This entity's primary key.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// This entity's parent key, if any.
    pub fn parent(&self) -> Option<Key> {
        self.key.parent()
    }

    /// This entity's entity group.
    pub fn entity_group(&self) -> Key {
        self.key.entity_group()
    }

    /// Replaces the key once the store has assigned identity.
    pub(crate) fn set_key(&mut self, key: Key) {
        self.key = key;
    }

    /// Sets a property value.
    ///
    /// The name must be a non-empty string and the value a supported scalar
    /// or a non-empty, consistently typed list; anything else is rejected
    /// before the map is touched.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl IntoPropertyValue,
    ) -> Result<(), Error> {
        let name = name.into();
        let value = value.into_property_value();
        codec::to_wire(&name, &value)?;
        self.properties.insert(name, value);
        Ok(())
    }

    /// Gets a property value.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Removes a property, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.properties.remove(name)
    }

    /// Does this entity hold a property named `name` ?
    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Sets every `(name, value)` pair in `other`.
    ///
    /// Validation is fail-fast: the first invalid pair aborts the update and
    /// pairs already applied stay applied.
    pub fn update<N, V, I>(&mut self, other: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: IntoPropertyValue,
    {
        for (name, value) in other {
            self.set(name, value)?;
        }
        Ok(())
    }

    /// Iterates over the properties in lexicographic name order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Does this entity hold no properties ?
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Converts this entity to its wire representation.
    ///
    /// Properties are emitted in lexicographic name order, indexed and raw
    /// properties split into their separate lists, list-valued properties as
    /// one wire property per element.
    pub(crate) fn to_wire(&self) -> Result<api::EntityProto, Error> {
        let mut proto = api::EntityProto {
            key: Some(self.key.to_wire()),
            entity_group: None,
            property: Vec::new(),
            raw_property: Vec::new(),
        };
        if self.key.is_complete() {
            proto.entity_group = self.key.entity_group().to_wire().path;
        }
        for (name, value) in &self.properties {
            let raw = value.sample().map(|sample| sample.is_raw()).unwrap_or(false);
            let encoded = codec::to_wire(name, value)?;
            if raw {
                proto.raw_property.extend(encoded);
            } else {
                proto.property.extend(encoded);
            }
        }
        Ok(proto)
    }

    /// Rebuilds an entity from its wire representation.
    ///
    /// The key must be complete. Every property must carry its `multiple`
    /// marker, and repeated sightings of one name must all be marked
    /// multiple; violations are reported as corrupt data.
    pub(crate) fn from_wire(proto: api::EntityProto) -> Result<Entity, Error> {
        let reference = proto
            .key
            .ok_or_else(|| Error::Corrupt("entity is missing its key".into()))?;
        let key = Key::from_wire(reference)?;
        if !key.is_complete() {
            return Err(Error::Corrupt(format!(
                "entity key {key} is not complete"
            )));
        }
        let mut entity = Entity::with_key(key);
        for property in proto.property.into_iter().chain(proto.raw_property) {
            let multiple = property.multiple.ok_or_else(|| {
                Error::Corrupt(format!(
                    "property {:?} is corrupt in the datastore; it's missing the multiply \
                     valued field",
                    property.name
                ))
            })?;
            let (name, value) = codec::from_wire(property)?;
            match entity.properties.entry(name) {
                Entry::Vacant(slot) => {
                    slot.insert(if multiple {
                        PropertyValue::List(vec![value])
                    } else {
                        PropertyValue::Single(value)
                    });
                }
                Entry::Occupied(mut slot) => match slot.get_mut() {
                    PropertyValue::List(values) if multiple => values.push(value),
                    _ => {
                        return Err(Error::Corrupt(format!(
                            "property {:?} is corrupt in the datastore; it has multiple \
                             values, but is not marked as multiply valued",
                            slot.key()
                        )));
                    }
                },
            }
        }
        Ok(entity)
    }
}

impl ToKey for Entity {
    fn to_key(&self) -> Result<Key, Error> {
        Ok(self.key.clone())
    }
}
