//! Core types for the history engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload field holding an opaque group id.
pub const ACTION_GROUP: &str = "actionGroup";
/// Payload field naming the action to run when the commit is undone.
pub const UNDO_CALLBACK: &str = "undoCallback";
/// Payload field naming the action to run when the commit is redone or replayed.
pub const REDO_CALLBACK: &str = "redoCallback";

/// Prefix identifying an independently-historied module of the store.
///
/// The root namespace is the empty prefix. A named namespace always ends
/// with the `/` separator, so `Namespace::named("doc")` is `"doc/"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Separator between a namespace and a local mutation or action name.
    pub const SEPARATOR: char = '/';

    /// The unqualified top level.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Create a namespace from a module name, normalizing the trailing separator.
    pub fn named(name: &str) -> Self {
        let trimmed = name.trim_end_matches(Self::SEPARATOR);
        if trimmed.is_empty() {
            Self::root()
        } else {
            Self(format!("{trimmed}{}", Self::SEPARATOR))
        }
    }

    /// Derive the namespace of a qualified mutation or action name.
    ///
    /// `"doc/addItem"` belongs to `"doc/"`; `"addItem"` belongs to the root.
    pub fn of(qualified: &str) -> Self {
        qualified
            .split_once(Self::SEPARATOR)
            .map_or_else(Self::root, |(head, _)| {
                Self(format!("{head}{}", Self::SEPARATOR))
            })
    }

    /// Prefix a local name with this namespace.
    pub fn qualify(&self, local: &str) -> String {
        format!("{}{local}", self.0)
    }

    /// Strip this namespace from a qualified name.
    ///
    /// Returns `None` when the name belongs to a different namespace.
    pub fn local_name<'a>(&self, qualified: &'a str) -> Option<&'a str> {
        if Self::of(qualified) == *self {
            qualified.strip_prefix(self.0.as_str())
        } else {
            None
        }
    }

    /// Whether a qualified name belongs to this namespace.
    ///
    /// The root namespace only owns unqualified names.
    pub fn owns(&self, qualified: &str) -> bool {
        if self.is_root() {
            !qualified.contains(Self::SEPARATOR)
        } else {
            qualified.starts_with(self.0.as_str())
        }
    }

    /// Check if this is the root namespace.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw prefix, including the trailing separator.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The module name without the trailing separator (empty for root).
    pub fn module_name(&self) -> &str {
        self.0.trim_end_matches(Self::SEPARATOR)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "(root)")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Arbitrary structured data carried by a mutation or action.
///
/// Object payloads may carry the reserved fields [`ACTION_GROUP`],
/// [`UNDO_CALLBACK`] and [`REDO_CALLBACK`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Value);

impl Payload {
    /// Wrap a JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// A payload with no content.
    pub fn empty() -> Self {
        Self(Value::Null)
    }

    /// Borrow the underlying value.
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Consume into the underlying value.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Look up a field of an object payload.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The group id, if present and truthy.
    pub fn action_group(&self) -> Option<&Value> {
        self.0.get(ACTION_GROUP).filter(|group| is_truthy(group))
    }

    /// Name of the action to run on undo.
    pub fn undo_callback(&self) -> Option<&str> {
        self.string_field(UNDO_CALLBACK)
    }

    /// Name of the action to run on redo or replay.
    pub fn redo_callback(&self) -> Option<&str> {
        self.string_field(REDO_CALLBACK)
    }

    /// A fresh copy that shares nothing with the recorded payload.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Tag the payload with a group id.
    #[must_use]
    pub fn with_action_group(self, group: impl Into<Value>) -> Self {
        self.with_field(ACTION_GROUP, group.into())
    }

    /// Attach an undo callback action name.
    #[must_use]
    pub fn with_undo_callback(self, action: impl Into<String>) -> Self {
        self.with_field(UNDO_CALLBACK, Value::String(action.into()))
    }

    /// Attach a redo callback action name.
    #[must_use]
    pub fn with_redo_callback(self, action: impl Into<String>) -> Self {
        self.with_field(REDO_CALLBACK, Value::String(action.into()))
    }

    /// Set a field, turning a null payload into an object.
    ///
    /// Arrays and scalars have nowhere to put fields and are returned unchanged.
    #[must_use]
    pub fn with_field(self, key: &str, value: Value) -> Self {
        match self.0 {
            Value::Object(mut map) => {
                map.insert(key.to_string(), value);
                Self(Value::Object(map))
            }
            Value::Null => {
                let mut map = Map::new();
                map.insert(key.to_string(), value);
                Self(Value::Object(map))
            }
            other => Self(other),
        }
    }

    fn string_field(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Group ids follow the host's truthiness: null, false, 0 and "" mean "no group".
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}

/// An applied mutation, as seen on the mutation bus and stored in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Fully-qualified mutation name.
    #[serde(rename = "type")]
    pub mutation_type: String,
    /// Mutation payload.
    #[serde(default)]
    pub payload: Payload,
}

impl Commit {
    /// Create a new commit record.
    pub fn new(mutation_type: impl Into<String>, payload: Payload) -> Self {
        Self {
            mutation_type: mutation_type.into(),
            payload,
        }
    }

    /// Namespace derived from the mutation name.
    pub fn namespace(&self) -> Namespace {
        Namespace::of(&self.mutation_type)
    }

    /// Group id, if any.
    pub fn action_group(&self) -> Option<&Value> {
        self.payload.action_group()
    }

    /// Check if this commit belongs to the given group.
    pub fn in_group(&self, group: &Value) -> bool {
        self.action_group() == Some(group)
    }

    /// Undo callback action name, if any.
    pub fn undo_callback(&self) -> Option<&str> {
        self.payload.undo_callback()
    }

    /// Redo callback action name, if any.
    pub fn redo_callback(&self) -> Option<&str> {
        self.payload.redo_callback()
    }
}

/// An action passing through the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedAction {
    /// Fully-qualified action name.
    pub action_type: String,
    /// Action payload.
    pub payload: Payload,
}

impl DispatchedAction {
    /// Create a new dispatched action.
    pub fn new(action_type: impl Into<String>, payload: Payload) -> Self {
        Self {
            action_type: action_type.into(),
            payload,
        }
    }
}

/// Mutations every managed module must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedMutation {
    /// Publishes `canUndo` / `canRedo` into presentation state.
    StatusUpdate,
    /// Clears module state to its baseline before an undo replay.
    StateReset,
}

impl ReservedMutation {
    /// Local mutation name.
    pub fn name(self) -> &'static str {
        match self {
            Self::StatusUpdate => "updateCanUndoRedo",
            Self::StateReset => "emptyState",
        }
    }

    /// Fully-qualified name within a namespace.
    pub fn qualified(self, namespace: &Namespace) -> String {
        namespace.qualify(self.name())
    }

    /// All reserved mutations.
    pub fn all() -> [Self; 2] {
        [Self::StatusUpdate, Self::StateReset]
    }
}

/// No-op actions the interceptor turns into engine calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedAction {
    /// Undo the latest commit (or group) of the namespace.
    Undo,
    /// Redo the latest undone commit (or group) of the namespace.
    Redo,
}

impl ReservedAction {
    /// Local action name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }

    /// Fully-qualified name within a namespace.
    pub fn qualified(self, namespace: &Namespace) -> String {
        namespace.qualify(self.name())
    }

    /// Recognize a qualified action name as an undo or redo trigger.
    pub fn parse(action_type: &str) -> Option<(Namespace, Self)> {
        let namespace = Namespace::of(action_type);
        let kind = match namespace.local_name(action_type)? {
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            _ => return None,
        };
        Some((namespace, kind))
    }
}

impl fmt::Display for ReservedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_namespace_normalization() {
        assert_eq!(Namespace::named("doc").as_str(), "doc/");
        assert_eq!(Namespace::named("doc/").as_str(), "doc/");
        assert!(Namespace::named("").is_root());
        assert_eq!(Namespace::named("doc").module_name(), "doc");
    }

    #[test]
    fn test_namespace_of_qualified_name() {
        assert_eq!(Namespace::of("doc/addItem"), Namespace::named("doc"));
        assert_eq!(Namespace::of("doc/items/add"), Namespace::named("doc"));
        assert!(Namespace::of("addItem").is_root());
    }

    #[test]
    fn test_root_only_owns_unqualified_names() {
        let root = Namespace::root();
        assert!(root.owns("addItem"));
        assert!(!root.owns("doc/addItem"));

        let doc = Namespace::named("doc");
        assert!(doc.owns("doc/addItem"));
        assert!(!doc.owns("other/addItem"));
    }

    #[test]
    fn test_local_name() {
        let doc = Namespace::named("doc");
        assert_eq!(doc.local_name("doc/undo"), Some("undo"));
        assert_eq!(doc.local_name("other/undo"), None);
        assert_eq!(Namespace::root().local_name("undo"), Some("undo"));
        assert_eq!(Namespace::root().local_name("doc/undo"), None);
    }

    #[test]
    fn test_payload_reserved_fields() {
        let payload = Payload::new(json!({"value": 1}))
            .with_action_group("g1")
            .with_undo_callback("logUndo")
            .with_redo_callback("logRedo");

        assert_eq!(payload.action_group(), Some(&json!("g1")));
        assert_eq!(payload.undo_callback(), Some("logUndo"));
        assert_eq!(payload.redo_callback(), Some("logRedo"));
        assert_eq!(payload.get("value"), Some(&json!(1)));
    }

    #[test]
    fn test_falsy_group_ids_are_absent() {
        for group in [json!(null), json!(false), json!(""), json!(0)] {
            let payload = Payload::empty().with_field(ACTION_GROUP, group);
            assert_eq!(payload.action_group(), None);
        }
        let payload = Payload::empty().with_field(ACTION_GROUP, json!(7));
        assert_eq!(payload.action_group(), Some(&json!(7)));
    }

    #[test]
    fn test_array_payload_has_no_reserved_fields() {
        let payload = Payload::new(json!([1, 2, 3])).with_action_group("g1");
        assert_eq!(payload.action_group(), None);
        assert_eq!(payload.value(), &json!([1, 2, 3]));
    }

    #[test]
    fn test_null_payload_becomes_object() {
        let payload = Payload::empty().with_undo_callback("logUndo");
        assert_eq!(payload.value(), &json!({"undoCallback": "logUndo"}));
    }

    #[test]
    fn test_commit_group_membership() {
        let a = Commit::new("doc/add", Payload::empty().with_action_group("g1"));
        let b = Commit::new("doc/add", Payload::empty());
        assert!(a.in_group(&json!("g1")));
        assert!(!a.in_group(&json!("g2")));
        assert!(!b.in_group(&json!("g1")));
        assert_eq!(a.namespace(), Namespace::named("doc"));
    }

    #[test]
    fn test_reserved_names() {
        let doc = Namespace::named("doc");
        assert_eq!(
            ReservedMutation::StatusUpdate.qualified(&doc),
            "doc/updateCanUndoRedo"
        );
        assert_eq!(ReservedMutation::StateReset.qualified(&Namespace::root()), "emptyState");
        assert_eq!(ReservedAction::Redo.qualified(&doc), "doc/redo");
    }

    #[test]
    fn test_reserved_action_parse() {
        assert_eq!(
            ReservedAction::parse("doc/undo"),
            Some((Namespace::named("doc"), ReservedAction::Undo))
        );
        assert_eq!(
            ReservedAction::parse("redo"),
            Some((Namespace::root(), ReservedAction::Redo))
        );
        assert_eq!(ReservedAction::parse("doc/items/undo"), None);
        assert_eq!(ReservedAction::parse("doc/save"), None);
    }

    #[test]
    fn test_commit_serializes_type_field() {
        let commit = Commit::new("doc/add", Payload::new(json!({"id": 1})));
        let value = serde_json::to_value(&commit).unwrap_or_default();
        assert_eq!(value, json!({"type": "doc/add", "payload": {"id": 1}}));
    }
}
