//! Dynamic value model
//!
//! This module contains the runtime values the estimator walks. Scalars are
//! stored inline; composite values (arrays, maps, sets and objects) are shared
//! handles around `Rc<RefCell<_>>` so graphs can contain shared and
//! self-referential members. The identity of a composite value is the address
//! of its shared allocation, which is what cycle detection keys on.
//!
//! # Building graphs
//!
//! ```rust
//! use footprint_core::{ObjectRef, Value};
//!
//! let node = ObjectRef::new();
//! node.set("name", "root");
//! node.set("self", node.clone());
//! let value = Value::from(node);
//! assert!(value.is_composite());
//! ```
//!
//! Handles form reference cycles on purpose; break them (for example with
//! [`ObjectRef::remove`]) once a graph is no longer needed.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub use num_bigint::BigInt;

/// A dynamic runtime value
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value
    Undefined,
    /// Explicit null
    Null,
    /// Boolean scalar
    Bool(bool),
    /// IEEE-754 double, the only plain numeric type
    Number(f64),
    /// Arbitrary precision integer
    BigInt(BigInt),
    /// Text scalar
    String(String),
    /// Unique token, optionally registered under a global key
    Symbol(Symbol),
    /// Opaque binary payload
    Buffer(Rc<[u8]>),
    /// Ordered sequence
    Array(ArrayRef),
    /// Key-value table (strong or weak)
    Map(MapRef),
    /// Unique-value collection (strong or weak)
    Set(SetRef),
    /// Generic object with string and symbol keyed properties
    Object(ObjectRef),
    /// Executable value
    Function(FunctionRef),
    /// Host resource handle with no inspectable structure
    External(ExternalRef),
}

impl Value {
    /// Create a buffer value from raw bytes
    pub fn buffer(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Buffer(Rc::from(bytes.into()))
    }

    /// Create an array value from any sequence of values
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(ArrayRef::from_iter(items.into_iter().map(Into::into)))
    }

    /// Create an object value from `(key, value)` pairs, in insertion order
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<PropertyKey>,
        V: Into<Value>,
    {
        let object = ObjectRef::new();
        for (key, value) in entries {
            object.set(key, value);
        }
        Value::Object(object)
    }

    /// Whether this value is an array, map, set or object
    pub fn is_composite(&self) -> bool {
        self.as_composite().is_some()
    }

    /// Get a composite handle for identity tracking, if this value has one
    pub fn as_composite(&self) -> Option<Composite> {
        match self {
            Value::Array(array) => Some(Composite::Array(array.clone())),
            Value::Map(map) => Some(Composite::Map(map.clone())),
            Value::Set(set) => Some(Composite::Set(set.clone())),
            Value::Object(object) => Some(Composite::Object(object.clone())),
            _ => None,
        }
    }

    /// SameValueZero comparison: scalars by content, everything else by identity
    ///
    /// This is the equality maps and sets use to deduplicate their keys.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => (a.is_nan() && b.is_nan()) || a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Buffer(a), Value::Buffer(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Set(a), Value::Set(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(&a.0, &b.0),
            (Value::External(a), Value::External(b)) => Rc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }

    /// Stringify this value the way it appears as a path key
    ///
    /// Composite and callable values render as a bracketed tag rather than
    /// their contents, so this never recurses.
    pub fn to_key_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".into(),
            Value::Null => "null".into(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::BigInt(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::Symbol(symbol) => symbol.to_string(),
            Value::Buffer(_) => "[object Buffer]".into(),
            Value::Array(_) => "[object Array]".into(),
            Value::Map(map) if map.is_weak() => "[object WeakMap]".into(),
            Value::Map(_) => "[object Map]".into(),
            Value::Set(set) if set.is_weak() => "[object WeakSet]".into(),
            Value::Set(_) => "[object Set]".into(),
            Value::Object(_) => "[object Object]".into(),
            Value::Function(function) => format!("[function {}]", function.name()),
            Value::External(external) => format!("[object {}]", external.class()),
        }
    }
}

/// Render a double the way script engines print it
///
/// Uses the shortest digits that round-trip. Decimal notation covers
/// magnitudes from `1e-6` up to but excluding `1e21`; everything else is
/// printed as `d.ddde+N` / `d.ddde-N`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n == 0.0 {
        return "0".into();
    }
    if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        return text.into();
    }
    if n < 0.0 {
        return format!("-{}", format_number(-n));
    }

    let scientific = format!("{:e}", n);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let len = digits.len() as i32;
    // position of the decimal point relative to the first digit
    let point = exponent + 1;

    if len <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - len) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, exponent.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, exponent.abs())
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<Symbol> for Value {
    fn from(value: Symbol) -> Self {
        Value::Symbol(value)
    }
}

impl From<ArrayRef> for Value {
    fn from(value: ArrayRef) -> Self {
        Value::Array(value)
    }
}

impl From<MapRef> for Value {
    fn from(value: MapRef) -> Self {
        Value::Map(value)
    }
}

impl From<SetRef> for Value {
    fn from(value: SetRef) -> Self {
        Value::Set(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl From<FunctionRef> for Value {
    fn from(value: FunctionRef) -> Self {
        Value::Function(value)
    }
}

impl From<ExternalRef> for Value {
    fn from(value: ExternalRef) -> Self {
        Value::External(value)
    }
}

impl From<serde_json::Value> for Value {
    /// JSON objects become generic objects and JSON arrays become arrays.
    /// Every JSON number is read as a double.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::array(items.into_iter().map(Value::from)),
            serde_json::Value::Object(map) => {
                Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

#[derive(Debug)]
struct SymbolData {
    description: Option<String>,
    global_key: Option<String>,
}

/// Unique token value
///
/// Local symbols are only equal to themselves. Symbols created with
/// [`Symbol::global`] are equal whenever their registry keys match.
#[derive(Debug, Clone)]
pub struct Symbol(Rc<SymbolData>);

impl Symbol {
    /// Create a local symbol with a description
    pub fn new(description: impl Into<String>) -> Self {
        Self(Rc::new(SymbolData {
            description: Some(description.into()),
            global_key: None,
        }))
    }

    /// Create a local symbol without a description
    pub fn anonymous() -> Self {
        Self(Rc::new(SymbolData {
            description: None,
            global_key: None,
        }))
    }

    /// Create a symbol registered under a global key
    pub fn global(key: impl Into<String>) -> Self {
        let key = key.into();
        Self(Rc::new(SymbolData {
            description: Some(key.clone()),
            global_key: Some(key),
        }))
    }

    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    /// The registry key, if this symbol is global
    pub fn global_key(&self) -> Option<&str> {
        self.0.global_key.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        match (self.global_key(), other.global_key()) {
            (Some(a), Some(b)) => a == b,
            _ => Rc::ptr_eq(&self.0, &other.0),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

/// Key of an object property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    String(String),
    Symbol(Symbol),
}

impl PropertyKey {
    /// Parse as a canonical array index (`"0"`, `"17"`, not `"01"`)
    fn array_index(&self) -> Option<u32> {
        match self {
            PropertyKey::String(s) => {
                let index = s.parse::<u32>().ok()?;
                (index != u32::MAX && index.to_string() == *s).then_some(index)
            }
            PropertyKey::Symbol(_) => None,
        }
    }

    /// The key as a value, for sizing the key itself
    pub fn to_value(&self) -> Value {
        match self {
            PropertyKey::String(s) => Value::String(s.clone()),
            PropertyKey::Symbol(symbol) => Value::Symbol(symbol.clone()),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => f.write_str(s),
            PropertyKey::Symbol(symbol) => write!(f, "{}", symbol),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(value: &str) -> Self {
        PropertyKey::String(value.to_owned())
    }
}

impl From<String> for PropertyKey {
    fn from(value: String) -> Self {
        PropertyKey::String(value)
    }
}

impl From<Symbol> for PropertyKey {
    fn from(value: Symbol) -> Self {
        PropertyKey::Symbol(value)
    }
}

/// A single own property of an object
#[derive(Debug, Clone)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Value,
    pub enumerable: bool,
}

fn address_of<T: ?Sized>(rc: &Rc<T>) -> usize {
    Rc::as_ptr(rc) as *const () as usize
}

/// Shared handle to an array
#[derive(Clone, Default)]
pub struct ArrayRef(Rc<RefCell<Vec<Value>>>);

impl ArrayRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into());
    }

    /// Replace the element at `index`, growing with `undefined` if needed
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        let mut items = self.0.borrow_mut();
        if index >= items.len() {
            items.resize(index + 1, Value::Undefined);
        }
        items[index] = value.into();
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Drop all elements, breaking any cycles through this array
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Snapshot of the elements; composite members are shared, not copied
    pub fn items(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl FromIterator<Value> for ArrayRef {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(Rc::new(RefCell::new(iter.into_iter().collect())))
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArrayRef(len={}, @{:#x})", self.len(), address_of(&self.0))
    }
}

#[derive(Default)]
struct MapData {
    entries: Vec<(Value, Value)>,
    weak: bool,
}

/// Shared handle to a key-value table
#[derive(Clone, Default)]
pub struct MapRef(Rc<RefCell<MapData>>);

impl MapRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a weak-reference table; it is sized exactly like a strong one
    pub fn new_weak() -> Self {
        Self(Rc::new(RefCell::new(MapData {
            entries: Vec::new(),
            weak: true,
        })))
    }

    /// Insert or replace an entry; keys compare with SameValueZero
    pub fn insert(&self, key: impl Into<Value>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut data = self.0.borrow_mut();
        match data.entries.iter_mut().find(|(k, _)| k.same_value_zero(&key)) {
            Some(entry) => entry.1 = value,
            None => data.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.0
            .borrow()
            .entries
            .iter()
            .find(|(k, _)| k.same_value_zero(key))
            .map(|(_, v)| v.clone())
    }

    pub fn remove(&self, key: &Value) -> Option<Value> {
        let mut data = self.0.borrow_mut();
        let position = data.entries.iter().position(|(k, _)| k.same_value_zero(key))?;
        Some(data.entries.remove(position).1)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().entries.is_empty()
    }

    pub fn is_weak(&self) -> bool {
        self.0.borrow().weak
    }

    pub fn clear(&self) {
        self.0.borrow_mut().entries.clear();
    }

    /// Snapshot of the entries in insertion order
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.0.borrow().entries.clone()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MapRef(len={}, weak={}, @{:#x})",
            self.len(),
            self.is_weak(),
            address_of(&self.0)
        )
    }
}

#[derive(Default)]
struct SetData {
    items: Vec<Value>,
    weak: bool,
}

/// Shared handle to a unique-value collection
#[derive(Clone, Default)]
pub struct SetRef(Rc<RefCell<SetData>>);

impl SetRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a weak-reference collection; it is sized exactly like a strong one
    pub fn new_weak() -> Self {
        Self(Rc::new(RefCell::new(SetData {
            items: Vec::new(),
            weak: true,
        })))
    }

    /// Add a value unless an equal (SameValueZero) one is present
    ///
    /// Returns whether the value was inserted.
    pub fn add(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        let mut data = self.0.borrow_mut();
        if data.items.iter().any(|v| v.same_value_zero(&value)) {
            return false;
        }
        data.items.push(value);
        true
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.0.borrow().items.iter().any(|v| v.same_value_zero(value))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().items.is_empty()
    }

    pub fn is_weak(&self) -> bool {
        self.0.borrow().weak
    }

    pub fn clear(&self) {
        self.0.borrow_mut().items.clear();
    }

    /// Snapshot of the members in insertion order
    pub fn items(&self) -> Vec<Value> {
        self.0.borrow().items.clone()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SetRef(len={}, weak={}, @{:#x})",
            self.len(),
            self.is_weak(),
            address_of(&self.0)
        )
    }
}

/// Shared handle to a generic object
#[derive(Clone, Default)]
pub struct ObjectRef(Rc<RefCell<Vec<Property>>>);

impl ObjectRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an enumerable property, replacing an existing one in place
    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) {
        self.define(key, value, true);
    }

    /// Define a property with explicit enumerability
    pub fn define(&self, key: impl Into<PropertyKey>, value: impl Into<Value>, enumerable: bool) {
        let key = key.into();
        let value = value.into();
        let mut properties = self.0.borrow_mut();
        match properties.iter_mut().find(|p| p.key == key) {
            Some(property) => {
                property.value = value;
                property.enumerable = enumerable;
            }
            None => properties.push(Property {
                key,
                value,
                enumerable,
            }),
        }
    }

    pub fn get(&self, key: &PropertyKey) -> Option<Value> {
        self.0
            .borrow()
            .iter()
            .find(|p| p.key == *key)
            .map(|p| p.value.clone())
    }

    pub fn remove(&self, key: &PropertyKey) -> Option<Value> {
        let mut properties = self.0.borrow_mut();
        let position = properties.iter().position(|p| p.key == *key)?;
        Some(properties.remove(position).value)
    }

    /// Number of own properties, enumerable or not
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Properties the estimator descends into, in enumeration order
    ///
    /// Enumerable string keys come first (canonical array indices ascending,
    /// then the rest in insertion order), followed by every symbol key in
    /// insertion order regardless of enumerability.
    pub fn sized_entries(&self) -> Vec<(PropertyKey, Value)> {
        let properties = self.0.borrow();

        let mut indexed: Vec<(u32, &Property)> = properties
            .iter()
            .filter(|p| p.enumerable)
            .filter_map(|p| p.key.array_index().map(|i| (i, p)))
            .collect();
        indexed.sort_by_key(|(i, _)| *i);

        let named = properties.iter().filter(|p| {
            p.enumerable && matches!(p.key, PropertyKey::String(_)) && p.key.array_index().is_none()
        });
        let symbols = properties
            .iter()
            .filter(|p| matches!(p.key, PropertyKey::Symbol(_)));

        let entries = indexed
            .into_iter()
            .map(|(_, p)| p)
            .chain(named)
            .chain(symbols)
            .map(|p| (p.key.clone(), p.value.clone()))
            .collect();
        entries
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef(len={}, @{:#x})", self.len(), address_of(&self.0))
    }
}

#[derive(Debug)]
struct FunctionData {
    name: String,
    arity: u32,
}

/// Handle to an executable value
#[derive(Debug, Clone)]
pub struct FunctionRef(Rc<FunctionData>);

impl FunctionRef {
    pub fn new(name: impl Into<String>, arity: u32) -> Self {
        Self(Rc::new(FunctionData {
            name: name.into(),
            arity,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn arity(&self) -> u32 {
        self.0.arity
    }
}

#[derive(Debug)]
struct ExternalData {
    class: String,
}

/// Handle to a host resource whose structure is not visible
#[derive(Debug, Clone)]
pub struct ExternalRef(Rc<ExternalData>);

impl ExternalRef {
    pub fn new(class: impl Into<String>) -> Self {
        Self(Rc::new(ExternalData {
            class: class.into(),
        }))
    }

    /// Host class name, e.g. `Promise` or `FileHandle`
    pub fn class(&self) -> &str {
        &self.0.class
    }
}

/// A composite value, held strongly for identity tracking
#[derive(Debug, Clone)]
pub enum Composite {
    Array(ArrayRef),
    Map(MapRef),
    Set(SetRef),
    Object(ObjectRef),
}

impl Composite {
    /// Address of the shared allocation; equal addresses mean the same value
    pub fn address(&self) -> usize {
        match self {
            Composite::Array(array) => address_of(&array.0),
            Composite::Map(map) => address_of(&map.0),
            Composite::Set(set) => address_of(&set.0),
            Composite::Object(object) => address_of(&object.0),
        }
    }
}
