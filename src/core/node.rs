//! Purpose: Marshal host values to and from the engine's `mpv_node` wire format.
//! Exports: `NodeValue`, `NodeBuilder`, `decode`.
//! Role: Canonical value boundary for commands, properties, and event payloads.
//! Invariants: Composite nodes own one exact-sized allocation, never resized.
//! Invariants: The decoder never frees; callers free engine-owned nodes once.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::core::format::Format;
use crate::core::libmpv::sys;

/// Host-side view of everything the wire format can carry. Maps are ordered
/// sequences of pairs, matching the engine's parallel key/value arrays.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeValue {
    None,
    String(String),
    Flag(bool),
    Int64(i64),
    Double(f64),
    Array(Vec<NodeValue>),
    Map(Vec<(String, NodeValue)>),
    Bytes(Vec<u8>),
}

impl NodeValue {
    pub fn format(&self) -> Format {
        match self {
            NodeValue::None => Format::None,
            NodeValue::String(_) => Format::String,
            NodeValue::Flag(_) => Format::Flag,
            NodeValue::Int64(_) => Format::Int64,
            NodeValue::Double(_) => Format::Double,
            NodeValue::Array(_) => Format::NodeArray,
            NodeValue::Map(_) => Format::NodeMap,
            NodeValue::Bytes(_) => Format::ByteArray,
        }
    }

    pub fn from_json(value: &Value) -> Result<NodeValue, Error> {
        match value {
            Value::Null => Ok(NodeValue::None),
            Value::Bool(flag) => Ok(NodeValue::Flag(*flag)),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Ok(NodeValue::Int64(int))
                } else if let Some(double) = number.as_f64() {
                    Ok(NodeValue::Double(double))
                } else {
                    Err(Error::new(ErrorKind::UnsupportedValue)
                        .with_message(format!("number {number} fits neither i64 nor f64")))
                }
            }
            Value::String(text) => Ok(NodeValue::String(text.clone())),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(NodeValue::from_json(item)?);
                }
                Ok(NodeValue::Array(out))
            }
            Value::Object(map) => {
                let mut out = Vec::with_capacity(map.len());
                for (key, item) in map {
                    out.push((key.clone(), NodeValue::from_json(item)?));
                }
                Ok(NodeValue::Map(out))
            }
        }
    }

    /// Lossy where JSON is narrower than the wire: non-finite doubles become
    /// null and byte arrays become number arrays.
    pub fn to_json(&self) -> Value {
        match self {
            NodeValue::None => Value::Null,
            NodeValue::String(text) => Value::String(text.clone()),
            NodeValue::Flag(flag) => Value::Bool(*flag),
            NodeValue::Int64(int) => Value::from(*int),
            NodeValue::Double(double) => serde_json::Number::from_f64(*double)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            NodeValue::Array(items) => Value::Array(items.iter().map(NodeValue::to_json).collect()),
            NodeValue::Map(pairs) => {
                let mut map = serde_json::Map::new();
                for (key, item) in pairs {
                    map.insert(key.clone(), item.to_json());
                }
                Value::Object(map)
            }
            NodeValue::Bytes(bytes) => {
                Value::Array(bytes.iter().map(|byte| Value::from(*byte)).collect())
            }
        }
    }
}

impl From<bool> for NodeValue {
    fn from(flag: bool) -> Self {
        NodeValue::Flag(flag)
    }
}

impl From<i64> for NodeValue {
    fn from(int: i64) -> Self {
        NodeValue::Int64(int)
    }
}

impl From<f64> for NodeValue {
    fn from(double: f64) -> Self {
        NodeValue::Double(double)
    }
}

impl From<&str> for NodeValue {
    fn from(text: &str) -> Self {
        NodeValue::String(text.to_string())
    }
}

impl From<String> for NodeValue {
    fn from(text: String) -> Self {
        NodeValue::String(text)
    }
}

impl From<Vec<u8>> for NodeValue {
    fn from(bytes: Vec<u8>) -> Self {
        NodeValue::Bytes(bytes)
    }
}

/// Conversion out of a decoded node into a concrete Rust type. Mismatches
/// fail with `UnsupportedValue` naming both formats.
pub trait FromNode: Sized {
    fn from_node(value: NodeValue) -> Result<Self, Error>;
}

fn mismatch(wanted: &str, got: &NodeValue) -> Error {
    Error::new(ErrorKind::UnsupportedValue)
        .with_message(format!("expected {wanted}, got a {:?} value", got.format()))
}

impl FromNode for bool {
    fn from_node(value: NodeValue) -> Result<Self, Error> {
        match value {
            NodeValue::Flag(flag) => Ok(flag),
            other => Err(mismatch("a flag", &other)),
        }
    }
}

impl FromNode for i64 {
    fn from_node(value: NodeValue) -> Result<Self, Error> {
        match value {
            NodeValue::Int64(int) => Ok(int),
            other => Err(mismatch("an integer", &other)),
        }
    }
}

impl FromNode for f64 {
    fn from_node(value: NodeValue) -> Result<Self, Error> {
        match value {
            NodeValue::Double(double) => Ok(double),
            NodeValue::Int64(int) => Ok(int as f64),
            other => Err(mismatch("a number", &other)),
        }
    }
}

impl FromNode for String {
    fn from_node(value: NodeValue) -> Result<Self, Error> {
        match value {
            NodeValue::String(text) => Ok(text),
            other => Err(mismatch("a string", &other)),
        }
    }
}

impl FromNode for NodeValue {
    fn from_node(value: NodeValue) -> Result<Self, Error> {
        Ok(value)
    }
}

/// Owner of a host-built `mpv_node` tree. Every string, list slab, key slab,
/// and byte buffer the tree points at lives in this struct; the engine only
/// reads the tree for the duration of the call, so dropping the builder after
/// the call releases everything exactly once.
pub struct NodeBuilder {
    root: Box<sys::mpv_node>,
    strings: Vec<CString>,
    lists: Vec<Box<sys::mpv_node_list>>,
    node_slabs: Vec<Box<[sys::mpv_node]>>,
    key_slabs: Vec<Box<[*mut c_char]>>,
    byte_arrays: Vec<Box<sys::mpv_byte_array>>,
    byte_slabs: Vec<Box<[u8]>>,
}

impl NodeBuilder {
    pub fn from_value(value: &NodeValue) -> Result<Self, Error> {
        let mut builder = Self {
            root: Box::new(empty_node()),
            strings: Vec::new(),
            lists: Vec::new(),
            node_slabs: Vec::new(),
            key_slabs: Vec::new(),
            byte_arrays: Vec::new(),
            byte_slabs: Vec::new(),
        };
        *builder.root = builder.encode(value)?;
        Ok(builder)
    }

    /// Root node pointer, valid until the builder is dropped.
    pub fn node(&mut self) -> *mut sys::mpv_node {
        &mut *self.root
    }

    fn encode(&mut self, value: &NodeValue) -> Result<sys::mpv_node, Error> {
        let node = match value {
            NodeValue::None => empty_node(),
            NodeValue::String(text) => sys::mpv_node {
                u: sys::mpv_node_u {
                    string: self.intern(text)?,
                },
                format: Format::String.as_raw(),
            },
            NodeValue::Flag(flag) => sys::mpv_node {
                u: sys::mpv_node_u {
                    flag: if *flag { 1 } else { 0 },
                },
                format: Format::Flag.as_raw(),
            },
            NodeValue::Int64(int) => sys::mpv_node {
                u: sys::mpv_node_u { int64: *int },
                format: Format::Int64.as_raw(),
            },
            NodeValue::Double(double) => sys::mpv_node {
                u: sys::mpv_node_u { double_: *double },
                format: Format::Double.as_raw(),
            },
            NodeValue::Array(items) => {
                let num = list_len(items.len())?;
                let mut nodes = Vec::with_capacity(items.len());
                for item in items {
                    nodes.push(self.encode(item)?);
                }
                let values = self.keep_nodes(nodes);
                let list = self.keep_list(sys::mpv_node_list {
                    num,
                    values,
                    keys: ptr::null_mut(),
                });
                sys::mpv_node {
                    u: sys::mpv_node_u { list },
                    format: Format::NodeArray.as_raw(),
                }
            }
            NodeValue::Map(pairs) => {
                let num = list_len(pairs.len())?;
                let mut nodes = Vec::with_capacity(pairs.len());
                let mut keys = Vec::with_capacity(pairs.len());
                for (key, item) in pairs {
                    keys.push(self.intern(key)?);
                    nodes.push(self.encode(item)?);
                }
                let values = self.keep_nodes(nodes);
                let keys = self.keep_keys(keys);
                let list = self.keep_list(sys::mpv_node_list { num, values, keys });
                sys::mpv_node {
                    u: sys::mpv_node_u { list },
                    format: Format::NodeMap.as_raw(),
                }
            }
            NodeValue::Bytes(bytes) => {
                let mut slab = bytes.clone().into_boxed_slice();
                let data = slab.as_mut_ptr() as *mut c_void;
                let size = slab.len();
                self.byte_slabs.push(slab);
                let mut ba = Box::new(sys::mpv_byte_array { data, size });
                let ba_ptr: *mut sys::mpv_byte_array = &mut *ba;
                self.byte_arrays.push(ba);
                sys::mpv_node {
                    u: sys::mpv_node_u { ba: ba_ptr },
                    format: Format::ByteArray.as_raw(),
                }
            }
        };
        Ok(node)
    }

    fn intern(&mut self, text: &str) -> Result<*mut c_char, Error> {
        let owned = CString::new(text).map_err(|err| {
            Error::new(ErrorKind::UnsupportedValue)
                .with_message("string contains an interior null byte")
                .with_source(err)
        })?;
        let ptr = owned.as_ptr() as *mut c_char;
        self.strings.push(owned);
        Ok(ptr)
    }

    fn keep_nodes(&mut self, nodes: Vec<sys::mpv_node>) -> *mut sys::mpv_node {
        let mut slab = nodes.into_boxed_slice();
        let ptr = slab.as_mut_ptr();
        self.node_slabs.push(slab);
        ptr
    }

    fn keep_keys(&mut self, keys: Vec<*mut c_char>) -> *mut *mut c_char {
        let mut slab = keys.into_boxed_slice();
        let ptr = slab.as_mut_ptr();
        self.key_slabs.push(slab);
        ptr
    }

    fn keep_list(&mut self, list: sys::mpv_node_list) -> *mut sys::mpv_node_list {
        let mut boxed = Box::new(list);
        let ptr: *mut sys::mpv_node_list = &mut *boxed;
        self.lists.push(boxed);
        ptr
    }
}

fn empty_node() -> sys::mpv_node {
    sys::mpv_node {
        u: sys::mpv_node_u { int64: 0 },
        format: Format::None.as_raw(),
    }
}

fn list_len(len: usize) -> Result<c_int, Error> {
    c_int::try_from(len).map_err(|_| {
        Error::new(ErrorKind::UnsupportedValue)
            .with_message(format!("list of {len} elements exceeds the wire limit"))
    })
}

/// Read an engine- or builder-owned node tree back into host values. Strings
/// and byte buffers are copied out, so the result has no tie to the input.
///
/// # Safety
/// `node` must point to a readable `mpv_node` whose reachable pointers are
/// valid for the duration of the call.
pub unsafe fn decode(node: *const sys::mpv_node) -> Result<NodeValue, Error> {
    let Some(node) = (unsafe { node.as_ref() }) else {
        return Err(Error::new(ErrorKind::Internal).with_message("null node"));
    };
    let format = Format::from_raw(node.format)?;
    match format {
        Format::None => Ok(NodeValue::None),
        Format::String => {
            let text = unsafe { copy_string(node.u.string) }?;
            Ok(NodeValue::String(text))
        }
        Format::Flag => Ok(NodeValue::Flag(unsafe { node.u.flag } != 0)),
        Format::Int64 => Ok(NodeValue::Int64(unsafe { node.u.int64 })),
        Format::Double => Ok(NodeValue::Double(unsafe { node.u.double_ })),
        Format::NodeArray => {
            let (values, _) = unsafe { list_parts(node.u.list, false) }?;
            let mut items = Vec::with_capacity(values.len());
            for value in values {
                items.push(unsafe { decode(value) }?);
            }
            Ok(NodeValue::Array(items))
        }
        Format::NodeMap => {
            let (values, keys) = unsafe { list_parts(node.u.list, true) }?;
            let mut pairs = Vec::with_capacity(values.len());
            for (index, value) in values.iter().enumerate() {
                let key = unsafe { copy_string(keys[index]) }?;
                pairs.push((key, unsafe { decode(*value) }?));
            }
            Ok(NodeValue::Map(pairs))
        }
        Format::ByteArray => {
            let Some(ba) = (unsafe { node.u.ba.as_ref() }) else {
                return Err(
                    Error::new(ErrorKind::Internal).with_message("byte-array node is null")
                );
            };
            if ba.size == 0 {
                return Ok(NodeValue::Bytes(Vec::new()));
            }
            if ba.data.is_null() {
                return Err(Error::new(ErrorKind::Internal)
                    .with_message("byte-array node has null data"));
            }
            let bytes = unsafe { std::slice::from_raw_parts(ba.data as *const u8, ba.size) };
            Ok(NodeValue::Bytes(bytes.to_vec()))
        }
        Format::OsdString | Format::Node => Err(Error::new(ErrorKind::UnsupportedValue)
            .with_message(format!(
                "format tag {} is not valid inside a node",
                format.as_raw()
            ))),
    }
}

unsafe fn copy_string(ptr: *const c_char) -> Result<String, Error> {
    if ptr.is_null() {
        return Err(Error::new(ErrorKind::Internal).with_message("string node is null"));
    }
    Ok(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Split a list node into value pointers (and key pointers for maps).
unsafe fn list_parts(
    list: *const sys::mpv_node_list,
    keyed: bool,
) -> Result<(Vec<*const sys::mpv_node>, Vec<*const c_char>), Error> {
    let Some(list) = (unsafe { list.as_ref() }) else {
        return Err(Error::new(ErrorKind::Internal).with_message("list node is null"));
    };
    if list.num < 0 {
        return Err(Error::new(ErrorKind::Internal)
            .with_message(format!("list node has negative length {}", list.num)));
    }
    let num = list.num as usize;
    if num == 0 {
        return Ok((Vec::new(), Vec::new()));
    }
    if list.values.is_null() {
        return Err(Error::new(ErrorKind::Internal).with_message("list node has null values"));
    }
    let mut values = Vec::with_capacity(num);
    for index in 0..num {
        values.push(unsafe { list.values.add(index) } as *const sys::mpv_node);
    }
    let mut keys = Vec::new();
    if keyed {
        if list.keys.is_null() {
            return Err(Error::new(ErrorKind::Internal).with_message("map node has null keys"));
        }
        keys.reserve(num);
        for index in 0..num {
            keys.push(unsafe { *list.keys.add(index) } as *const c_char);
        }
    }
    Ok((values, keys))
}
