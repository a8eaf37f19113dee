use std::cell::Cell;
use std::collections::HashMap;

use crate::api;
use crate::codec;
use crate::error::Error;
use crate::filter::{FilterExpr, Operator};
use crate::key::{Key, ToKey, LOCAL_APP_ID};
use crate::value::{IntoPropertyValue, PropertyValue, Value};

/// Represents query result orderings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Order {
    /// Ascendent ordering.
    Asc(String),
    /// Descendent ordering.
    Desc(String),
}

impl Order {
    /// The ordered property's name.
    pub fn property(&self) -> &str {
        match self {
            Order::Asc(property) | Order::Desc(property) => property,
        }
    }

    fn to_wire(&self) -> api::query::Order {
        let (property, direction) = match self {
            Order::Asc(property) => (property, api::query::Direction::Ascending),
            Order::Desc(property) => (property, api::query::Direction::Descending),
        };
        api::query::Order {
            property: property.clone(),
            direction: Some(direction as i32),
        }
    }
}

impl From<&str> for Order {
    /// A bare property name implies ascending order.
    fn from(property: &str) -> Order {
        Order::Asc(property.into())
    }
}

/// Scan strategy hints. The server may ignore them; the client only emits a
/// hint consistent with the query's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hint {
    /// Scan the sort-order index first.
    OrderFirst,
    /// Scan the ancestor's descendants first.
    AncestorFirst,
    /// Scan the first filter's index first.
    FilterFirst,
}

impl Hint {
    fn to_wire(self) -> api::query::Hint {
        match self {
            Hint::OrderFirst => api::query::Hint::OrderFirst,
            Hint::AncestorFirst => api::query::Hint::AncestorFirst,
            Hint::FilterFirst => api::query::Hint::FilterFirst,
        }
    }
}

/// A datastore query over a single kind.
///
/// Filters map expression strings of the form `"<property> <operator>"` to a
/// value (or single-element list); results match *all* filters. Orderings
/// sort the results. The store permits one inequality property per query,
/// and when orderings are present the first one must name it.
///
/// ```
/// # use datastore3::{Order, Query};
/// let mut query = Query::new("Person").unwrap();
/// query.set_filter("age >", 21).unwrap();
/// query.order([Order::from("age")]).unwrap();
/// ```
///
/// Queries are deliberately not [`Clone`] and not iterable on their own;
/// run one through [`Client::run_query`](crate::Client::run_query) to obtain
/// a [`QueryIter`](crate::QueryIter) over its results.
#[derive(Debug)]
pub struct Query {
    kind: String,
    app: String,
    filters: HashMap<String, PropertyValue>,
    filter_order: Vec<String>,
    orderings: Vec<Order>,
    ancestor: Option<Key>,
    hint: Option<Hint>,
    cached_count: Cell<Option<i64>>,
    inequality_prop: Option<String>,
    inequality_count: usize,
}

impl Query {
    /// Constructs an empty query over `kind` in the default application.
    pub fn new(kind: impl Into<String>) -> Result<Query, Error> {
        Query::with_app(LOCAL_APP_ID, kind)
    }

    /// Constructs an empty query over `kind` in `app`.
    pub fn with_app(app: impl Into<String>, kind: impl Into<String>) -> Result<Query, Error> {
        let app = app.into();
        let kind = kind.into();
        if app.is_empty() {
            return Err(Error::BadArgument("app must not be empty".into()));
        }
        if kind.is_empty() {
            return Err(Error::BadArgument("kind must not be empty".into()));
        }
        Ok(Query {
            kind,
            app,
            filters: HashMap::new(),
            filter_order: Vec::new(),
            orderings: Vec::new(),
            ancestor: None,
            hint: None,
            cached_count: Cell::new(None),
            inequality_prop: None,
            inequality_count: 0,
        })
    }

    /// The kind queried. Immutable after construction.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The owning application.
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Checks an expression/value pair against the store's filter
    /// constraints without mutating the query.
    fn check_filter(&self, expr: &str, value: &PropertyValue) -> Result<FilterExpr, Error> {
        let parsed: FilterExpr = expr.parse()?;

        if let PropertyValue::List(values) = value {
            if values.len() != 1 {
                return Err(Error::BadValue(format!(
                    "{parsed} requires a single value; received a list of {}",
                    values.len()
                )));
            }
        }
        codec::to_wire(parsed.property(), value)?;

        let sample = value.sample().unwrap();
        if sample.is_raw() {
            return Err(Error::BadValue(format!(
                "filtering on {} properties is not supported",
                sample.type_name()
            )));
        }

        if parsed.operator().is_inequality() {
            if matches!(sample, Value::KeyValue(_)) {
                return Err(Error::BadFilter(
                    "inequality operators are not supported on key properties".into(),
                ));
            }
            if let Some(inequality_prop) = &self.inequality_prop {
                if parsed.property() != inequality_prop {
                    return Err(Error::BadFilter(format!(
                        "only one property per query may have inequality filters; \
                         already filtering on {inequality_prop:?}"
                    )));
                }
            }
            if let Some(first) = self.orderings.first() {
                if first.property() != parsed.property() {
                    return Err(Error::BadFilter(
                        "inequality operators must be on the same property as the first \
                         sort order, if any sort orders are supplied"
                            .into(),
                    ));
                }
            }
        }

        Ok(parsed)
    }

    /// Sets a filter. The expression must parse under the filter grammar and
    /// respect the cross-filter invariants; the value must be filterable.
    pub fn set_filter(
        &mut self,
        expr: impl Into<String>,
        value: impl IntoPropertyValue,
    ) -> Result<(), Error> {
        let expr = expr.into();
        let value = value.into_property_value();
        let parsed = self.check_filter(&expr, &value)?;

        if parsed.operator().is_inequality() {
            if self.inequality_prop.is_none() {
                self.inequality_prop = Some(parsed.property().to_string());
            }
            self.inequality_count += 1;
        }
        if !self.filter_order.contains(&expr) {
            self.filter_order.push(expr.clone());
        }
        self.filters.insert(expr, value);
        self.cached_count.set(None);
        Ok(())
    }

    /// Sets a filter from its parts, normalized to the expression surface.
    pub fn add_filter(
        &mut self,
        property: impl Into<String>,
        operator: Operator,
        value: impl IntoPropertyValue,
    ) -> Result<(), Error> {
        let expr = FilterExpr::new(property, operator).to_string();
        self.set_filter(expr, value)
    }

    /// Removes a filter, returning its value if it was present. Inequality
    /// bookkeeping is restored; removing the last inequality filter frees
    /// the inequality property.
    pub fn remove_filter(&mut self, expr: &str) -> Option<PropertyValue> {
        let value = self.filters.remove(expr)?;
        self.filter_order.retain(|held| held != expr);
        self.cached_count.set(None);

        // The expression parsed when it was set.
        let parsed: FilterExpr = expr.parse().unwrap();
        if parsed.operator().is_inequality() {
            self.inequality_count -= 1;
            if self.inequality_count == 0 {
                self.inequality_prop = None;
            }
        }
        Some(value)
    }

    /// Sets every filter in `other`. Validation is fail-fast: the first
    /// invalid pair aborts the update and pairs already applied stay.
    pub fn update<E, V, I>(&mut self, other: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (E, V)>,
        E: Into<String>,
        V: IntoPropertyValue,
    {
        for (expr, value) in other {
            self.set_filter(expr, value)?;
        }
        Ok(())
    }

    /// Specifies how the results should be sorted. Each call replaces the
    /// whole ordering list.
    ///
    /// If an inequality filter exists, the first ordering must name the
    /// inequality property.
    pub fn order<I>(&mut self, orderings: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = Order>,
    {
        let orderings: Vec<Order> = orderings.into_iter().collect();
        for order in &orderings {
            if order.property().is_empty() {
                return Err(Error::BadArgument("sort order property must not be empty".into()));
            }
        }
        if let (Some(first), Some(inequality_prop)) = (orderings.first(), &self.inequality_prop) {
            if first.property() != inequality_prop {
                return Err(Error::BadFilter(format!(
                    "first ordering property must be the same as inequality filter \
                     property, if specified for this query; received {:?}, expected \
                     {inequality_prop:?}",
                    first.property()
                )));
            }
        }
        self.orderings = orderings;
        self.cached_count.set(None);
        Ok(())
    }

    /// Restricts results to descendants of `ancestor`, which must designate
    /// a complete key.
    pub fn ancestor(&mut self, ancestor: &impl ToKey) -> Result<(), Error> {
        let key = ancestor.to_key()?;
        if !key.is_complete() {
            return Err(Error::BadKey(format!("ancestor key {key} is not complete")));
        }
        self.ancestor = Some(key);
        self.cached_count.set(None);
        Ok(())
    }

    /// Sets a scan hint. Hints are only emitted over the wire when they are
    /// consistent with the query's shape.
    pub fn hint(&mut self, hint: Hint) {
        self.hint = Some(hint);
        self.cached_count.set(None);
    }

    pub(crate) fn cached_count(&self) -> Option<i64> {
        self.cached_count.get()
    }

    pub(crate) fn store_count(&self, count: i64) {
        self.cached_count.set(Some(count));
    }

    /// Converts this query to its wire representation. Filters are emitted
    /// in insertion order, orderings in the order given.
    pub(crate) fn to_wire(&self, limit: Option<i32>) -> Result<api::Query, Error> {
        let mut proto = api::Query {
            app: self.app.clone(),
            kind: self.kind.clone(),
            filter: Vec::new(),
            order: Vec::new(),
            hint: None,
            limit,
            ancestor: self.ancestor.as_ref().map(Key::to_wire),
        };

        let consistent = match self.hint {
            Some(Hint::OrderFirst) => !self.orderings.is_empty(),
            Some(Hint::AncestorFirst) => self.ancestor.is_some(),
            Some(Hint::FilterFirst) => !self.filters.is_empty(),
            None => false,
        };
        if consistent {
            proto.hint = self.hint.map(|h| h.to_wire() as i32);
        }

        for expr in &self.filter_order {
            let value = match self.filters.get(expr) {
                Some(value) => value,
                None => continue,
            };
            let parsed = self.check_filter(expr, value)?;
            proto.filter.push(api::query::Filter {
                op: parsed.operator().to_wire() as i32,
                property: codec::to_wire(parsed.property(), value)?,
            });
        }

        proto.order.extend(self.orderings.iter().map(Order::to_wire));
        Ok(proto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_inequality_property_enforced() {
        let mut query = Query::new("Person").unwrap();
        query.set_filter("age >", 21).unwrap();
        query.set_filter("age <", 65).unwrap();
        assert!(matches!(
            query.set_filter("height >", 150),
            Err(Error::BadFilter(_))
        ));
        // Any number of equality filters is fine.
        query.set_filter("name", "ryan").unwrap();
    }

    #[test]
    fn ordering_must_lead_with_inequality_property() {
        let mut query = Query::new("Person").unwrap();
        query.set_filter("age >", 21).unwrap();
        assert!(matches!(
            query.order([Order::from("name")]),
            Err(Error::BadFilter(_))
        ));
        query
            .order([Order::from("age"), Order::Desc("name".into())])
            .unwrap();

        // And the converse: an inequality filter must agree with an
        // existing first ordering.
        let mut ordered = Query::new("Person").unwrap();
        ordered.order([Order::from("name")]).unwrap();
        assert!(matches!(
            ordered.set_filter("age >", 21),
            Err(Error::BadFilter(_))
        ));
    }

    #[test]
    fn removing_the_last_inequality_frees_the_property() {
        let mut query = Query::new("Person").unwrap();
        query.set_filter("age >", 21).unwrap();
        query.set_filter("age <", 65).unwrap();
        query.remove_filter("age >");
        assert!(matches!(
            query.set_filter("height >", 150),
            Err(Error::BadFilter(_))
        ));
        query.remove_filter("age <");
        query.set_filter("height >", 150).unwrap();
    }

    #[test]
    fn filter_value_constraints() {
        let mut query = Query::new("Person").unwrap();
        assert!(matches!(
            query.set_filter("tags", vec!["a", "b"]),
            Err(Error::BadValue(_))
        ));
        query.set_filter("tags", vec!["a"]).unwrap();

        assert!(matches!(
            query.set_filter("photo", Value::BlobValue(vec![1])),
            Err(Error::BadValue(_))
        ));
        assert!(matches!(
            query.set_filter("bio", Value::TextValue("long".into())),
            Err(Error::BadValue(_))
        ));
        let key = Key::new("Person").unwrap().name("ryan").unwrap();
        assert!(matches!(
            query.set_filter("friend >", Value::KeyValue(key.clone())),
            Err(Error::BadFilter(_))
        ));
        query.set_filter("friend", Value::KeyValue(key)).unwrap();

        assert!(matches!(query.set_filter("age !", 1), Err(Error::BadFilter(_))));
    }

    #[test]
    fn wire_form_keeps_insertion_order() {
        let mut query = Query::new("Person").unwrap();
        query.set_filter("name", "ryan").unwrap();
        query.set_filter("age >", 21).unwrap();
        query.set_filter("city", "paris").unwrap();
        // Re-setting an existing filter keeps its original slot.
        query.set_filter("name", "ken").unwrap();
        query.order([Order::from("age"), Order::Desc("name".into())]).unwrap();

        let proto = query.to_wire(Some(5)).unwrap();
        let filtered: Vec<_> = proto
            .filter
            .iter()
            .map(|f| f.property[0].name.as_str())
            .collect();
        assert_eq!(filtered, ["name", "age", "city"]);
        assert_eq!(proto.filter[1].op, api::query::Operator::GreaterThan as i32);
        assert_eq!(proto.order.len(), 2);
        assert_eq!(proto.order[0].property, "age");
        assert_eq!(proto.limit, Some(5));
    }

    #[test]
    fn hint_emitted_only_when_consistent() {
        let mut query = Query::new("Person").unwrap();
        query.hint(Hint::FilterFirst);
        assert_eq!(query.to_wire(None).unwrap().hint, None);
        query.set_filter("age >", 21).unwrap();
        assert_eq!(
            query.to_wire(None).unwrap().hint,
            Some(api::query::Hint::FilterFirst as i32)
        );

        let mut query = Query::new("Person").unwrap();
        query.hint(Hint::AncestorFirst);
        assert_eq!(query.to_wire(None).unwrap().hint, None);
        let root = Key::new("Person").unwrap().name("ryan").unwrap();
        query.ancestor(&root).unwrap();
        assert_eq!(
            query.to_wire(None).unwrap().hint,
            Some(api::query::Hint::AncestorFirst as i32)
        );
    }

    #[test]
    fn ancestor_must_be_complete() {
        let mut query = Query::new("Person").unwrap();
        let incomplete = Key::new("Person").unwrap();
        assert!(matches!(query.ancestor(&incomplete), Err(Error::BadKey(_))));
    }

    #[test]
    fn set_then_remove_restores_the_wire_form() {
        let mut before = Query::new("Person").unwrap();
        before.set_filter("name", "ryan").unwrap();

        let mut mutated = Query::new("Person").unwrap();
        mutated.set_filter("name", "ryan").unwrap();
        mutated.set_filter("age >", 21).unwrap();
        mutated.remove_filter("age >");

        assert_eq!(
            mutated.to_wire(None).unwrap(),
            before.to_wire(None).unwrap()
        );
    }

    #[test]
    fn typed_filters_normalize_to_expressions() {
        let mut typed = Query::new("Person").unwrap();
        typed.add_filter("age", Operator::GreaterThan, 21).unwrap();
        let mut textual = Query::new("Person").unwrap();
        textual.set_filter("age >", 21).unwrap();
        assert_eq!(typed.to_wire(None).unwrap(), textual.to_wire(None).unwrap());
    }
}
