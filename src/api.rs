//! Wire-level messages for the datastore_v3 protocol.
//!
//! Written in the shape prost would generate for the service's message
//! definitions. Field numbers are stable; every message round-trips through
//! `prost::Message::{encode_to_vec, decode}`.

/// A hierarchical entity identifier.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Reference {
    /// The owning application.
    #[prost(string, tag = "1")]
    pub app: String,
    /// The ordered element path.
    #[prost(message, optional, tag = "2")]
    pub path: Option<Path>,
}

/// An ordered sequence of path elements.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Path {
    /// The elements, topmost first.
    #[prost(message, repeated, tag = "1")]
    pub element: Vec<PathElement>,
}

/// One `(kind, id-or-name)` step of a key path.
///
/// At most one of `id` and `name` may be set; an element with neither is
/// incomplete. Id 0 is reserved for "unassigned".
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct PathElement {
    /// The element's kind.
    #[prost(string, tag = "1")]
    pub kind: String,
    /// Numeric identity, if assigned.
    #[prost(int64, optional, tag = "2")]
    pub id: Option<i64>,
    /// Named identity, if assigned.
    #[prost(string, optional, tag = "3")]
    pub name: Option<String>,
}

/// A single scalar property value. Exactly one field is set.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PropertyValue {
    /// Integer and timestamp payloads.
    #[prost(int64, optional, tag = "1")]
    pub int64_value: Option<i64>,
    /// Boolean payload.
    #[prost(bool, optional, tag = "2")]
    pub boolean_value: Option<bool>,
    /// String, long-text and blob payloads.
    #[prost(bytes = "vec", optional, tag = "3")]
    pub string_value: Option<Vec<u8>>,
    /// Floating-point payload.
    #[prost(double, optional, tag = "4")]
    pub double_value: Option<f64>,
    /// Geographic point payload.
    #[prost(message, optional, tag = "5")]
    pub point_value: Option<PointValue>,
    /// Key payload.
    #[prost(message, optional, tag = "6")]
    pub reference_value: Option<Reference>,
}

/// A latitude/longitude pair.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PointValue {
    /// Latitude in degrees.
    #[prost(double, tag = "1")]
    pub x: f64,
    /// Longitude in degrees.
    #[prost(double, tag = "2")]
    pub y: f64,
}

/// Type tag refining how a wire value is to be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Meaning {
    /// A timestamp stored as microseconds since the epoch.
    GdWhen = 7,
    /// A geographic point.
    GeorssPoint = 9,
    /// An opaque byte blob; stored un-indexed.
    Blob = 14,
    /// A long text string; stored un-indexed.
    Text = 15,
}

/// One named, typed property of an entity.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Property {
    /// Optional type tag for the value.
    #[prost(enumeration = "Meaning", optional, tag = "1")]
    pub meaning: Option<i32>,
    /// The property name.
    #[prost(string, tag = "2")]
    pub name: String,
    /// The scalar value.
    #[prost(message, optional, tag = "3")]
    pub value: Option<PropertyValue>,
    /// Whether the application treats this property as list-valued.
    #[prost(bool, optional, tag = "4")]
    pub multiple: Option<bool>,
}

/// The wire form of an entity.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EntityProto {
    /// The entity's key.
    #[prost(message, optional, tag = "1")]
    pub key: Option<Reference>,
    /// Echo of the topmost path element, when the key has an id or name.
    #[prost(message, optional, tag = "2")]
    pub entity_group: Option<Path>,
    /// Indexed properties.
    #[prost(message, repeated, tag = "3")]
    pub property: Vec<Property>,
    /// Raw (un-indexed) properties: blobs and long text.
    #[prost(message, repeated, tag = "4")]
    pub raw_property: Vec<Property>,
}

/// A query over a single kind.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Query {
    /// The owning application.
    #[prost(string, tag = "1")]
    pub app: String,
    /// The kind queried.
    #[prost(string, tag = "2")]
    pub kind: String,
    /// Property filters, combined with AND.
    #[prost(message, repeated, tag = "3")]
    pub filter: Vec<query::Filter>,
    /// Sort orders, applied in sequence.
    #[prost(message, repeated, tag = "4")]
    pub order: Vec<query::Order>,
    /// Optional scan hint.
    #[prost(enumeration = "query::Hint", optional, tag = "5")]
    pub hint: Option<i32>,
    /// Upper bound on the number of results.
    #[prost(int32, optional, tag = "6")]
    pub limit: Option<i32>,
    /// Restrict results to descendants of this key.
    #[prost(message, optional, tag = "7")]
    pub ancestor: Option<Reference>,
}

/// Nested message and enum types in `Query`.
pub mod query {
    /// A property filter.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Filter {
        /// The comparison operator.
        #[prost(enumeration = "Operator", tag = "1")]
        pub op: i32,
        /// The operand properties. A list-valued operand carries one entry
        /// per element.
        #[prost(message, repeated, tag = "2")]
        pub property: Vec<super::Property>,
    }

    /// Filter comparison operators.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Operator {
        /// `<`
        LessThan = 1,
        /// `<=`
        LessThanOrEqual = 2,
        /// `>`
        GreaterThan = 3,
        /// `>=`
        GreaterThanOrEqual = 4,
        /// `=`
        Equal = 5,
    }

    /// A sort order.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Order {
        /// The property sorted by.
        #[prost(string, tag = "1")]
        pub property: String,
        /// The sort direction; ascending when absent.
        #[prost(enumeration = "Direction", optional, tag = "2")]
        pub direction: Option<i32>,
    }

    /// Sort directions.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Direction {
        /// Smallest value first.
        Ascending = 1,
        /// Largest value first.
        Descending = 2,
    }

    /// Scan strategy hints.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Hint {
        /// Scan the sort-order index first.
        OrderFirst = 1,
        /// Scan the ancestor's descendants first.
        AncestorFirst = 2,
        /// Scan the first filter's index first.
        FilterFirst = 3,
    }
}

/// An opaque server-side handle on the remaining tail of a result stream.
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Cursor {
    /// The handle.
    #[prost(fixed64, tag = "1")]
    pub cursor: u64,
}

/// A batch of query results.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryResult {
    /// Cursor identifying the remaining results.
    #[prost(message, optional, tag = "1")]
    pub cursor: Option<Cursor>,
    /// The entities produced in this batch.
    #[prost(message, repeated, tag = "2")]
    pub result: Vec<EntityProto>,
    /// Whether the server holds further results past this batch.
    #[prost(bool, tag = "3")]
    pub more_results: bool,
}

/// Request for the next batch of a running query.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NextRequest {
    /// The cursor to advance.
    #[prost(message, optional, tag = "1")]
    pub cursor: Option<Cursor>,
    /// How many entities to produce.
    #[prost(int32, optional, tag = "2")]
    pub count: Option<i32>,
}

/// An opaque transaction handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Transaction {
    /// The handle.
    #[prost(fixed64, tag = "1")]
    pub handle: u64,
}

/// Request to store one or more entities.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PutRequest {
    /// The entities to store.
    #[prost(message, repeated, tag = "1")]
    pub entity: Vec<EntityProto>,
    /// Enclosing transaction, if any.
    #[prost(message, optional, tag = "2")]
    pub transaction: Option<Transaction>,
}

/// Response to a [`PutRequest`]; carries one key per stored entity, in order.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PutResponse {
    /// The assigned keys.
    #[prost(message, repeated, tag = "1")]
    pub key: Vec<Reference>,
}

/// Request to fetch one or more entities by key.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRequest {
    /// The keys to fetch.
    #[prost(message, repeated, tag = "1")]
    pub key: Vec<Reference>,
    /// Enclosing transaction, if any.
    #[prost(message, optional, tag = "2")]
    pub transaction: Option<Transaction>,
}

/// Response to a [`GetRequest`]; positional, one slot per requested key.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetResponse {
    /// One slot per requested key, in request order.
    #[prost(message, repeated, tag = "1")]
    pub entity: Vec<get_response::Slot>,
}

/// Nested message types in `GetResponse`.
pub mod get_response {
    /// A single positional result: found entity or absence.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Slot {
        /// The entity, when one exists for the requested key.
        #[prost(message, optional, tag = "1")]
        pub entity: Option<super::EntityProto>,
    }
}

/// Request to delete one or more entities by key.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteRequest {
    /// The keys to delete.
    #[prost(message, repeated, tag = "1")]
    pub key: Vec<Reference>,
    /// Enclosing transaction, if any.
    #[prost(message, optional, tag = "2")]
    pub transaction: Option<Transaction>,
}

/// The empty message.
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Void {}

/// A bare 64-bit integer payload, used by `Count`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Integer64Proto {
    /// The value.
    #[prost(int64, tag = "1")]
    pub value: i64,
}

/// Application error codes reported over the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ErrorCode {
    /// The request was malformed or violated a store invariant.
    BadRequest = 1,
    /// The transaction lost a commit race and may be retried.
    ConcurrentTransaction = 2,
    /// An unexpected server-side failure.
    InternalError = 3,
    /// The query requires an index that does not exist.
    NeedIndex = 4,
    /// The operation did not complete in time.
    Timeout = 5,
}
