//! Reader and writer for the [kastore](https://github.com/tskit-dev/kastore) binary container.
//!
//! A kastore file is a flat, little-endian key-value store of typed numeric arrays.
//! It is the on-disk container of tskit `.trees` files.
//!
//! | Bytes        | Content |
//! |--------------|---------|
//! | `0..64`      | header: magic, version, number of items, file size |
//! | `64..`       | one 64 byte descriptor per item: type, key and array positions |
//! | after        | keys, then the arrays, each array aligned to 8 bytes |

use crate::Error;
use byteorder::{ByteOrder, LittleEndian};
use std::collections::BTreeMap;

/// Magic number at the start of every kastore file.
pub const MAGIC: &[u8; 8] = b"\x89KAS\r\n\x1a\n";
pub const VERSION_MAJOR: u16 = 1;
pub const VERSION_MINOR: u16 = 0;
pub const HEADER_SIZE: usize = 64;
pub const DESCRIPTOR_SIZE: usize = 64;
const ARRAY_ALIGN: usize = 8;

// ----------------------------------------------------------------------------
// Array

/// A typed array stored under one key.
#[derive(Clone, Debug, PartialEq)]
pub enum Array {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

macro_rules! impl_from_vec {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$t>> for Array {
                fn from(values: Vec<$t>) -> Self {
                    Array::$variant(values)
                }
            }
        )*
    };
}

impl_from_vec!(
    i8 => Int8, u8 => UInt8, i16 => Int16, u16 => UInt16, i32 => Int32,
    u32 => UInt32, i64 => Int64, u64 => UInt64, f32 => Float32, f64 => Float64,
);

impl Array {
    /// Number of elements in the array.
    pub fn len(&self) -> usize {
        match self {
            Array::Int8(v) => v.len(),
            Array::UInt8(v) => v.len(),
            Array::Int16(v) => v.len(),
            Array::UInt16(v) => v.len(),
            Array::Int32(v) => v.len(),
            Array::UInt32(v) => v.len(),
            Array::Int64(v) => v.len(),
            Array::UInt64(v) => v.len(),
            Array::Float32(v) => v.len(),
            Array::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the element type, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        type_name(self.type_code())
    }

    fn type_code(&self) -> u8 {
        match self {
            Array::Int8(_) => 0,
            Array::UInt8(_) => 1,
            Array::Int16(_) => 2,
            Array::UInt16(_) => 3,
            Array::Int32(_) => 4,
            Array::UInt32(_) => 5,
            Array::Int64(_) => 6,
            Array::UInt64(_) => 7,
            Array::Float32(_) => 8,
            Array::Float64(_) => 9,
        }
    }

    fn num_bytes(&self) -> usize {
        // type codes written by this module are always valid
        self.len() * element_size(self.type_code()).unwrap_or(1)
    }

    fn decode(code: u8, bytes: &[u8], len: usize) -> Array {
        match code {
            0 => Array::Int8(bytes.iter().map(|b| *b as i8).collect()),
            1 => Array::UInt8(bytes.to_vec()),
            2 => {
                let mut values = vec![0; len];
                LittleEndian::read_i16_into(bytes, &mut values);
                Array::Int16(values)
            }
            3 => {
                let mut values = vec![0; len];
                LittleEndian::read_u16_into(bytes, &mut values);
                Array::UInt16(values)
            }
            4 => {
                let mut values = vec![0; len];
                LittleEndian::read_i32_into(bytes, &mut values);
                Array::Int32(values)
            }
            5 => {
                let mut values = vec![0; len];
                LittleEndian::read_u32_into(bytes, &mut values);
                Array::UInt32(values)
            }
            6 => {
                let mut values = vec![0; len];
                LittleEndian::read_i64_into(bytes, &mut values);
                Array::Int64(values)
            }
            7 => {
                let mut values = vec![0; len];
                LittleEndian::read_u64_into(bytes, &mut values);
                Array::UInt64(values)
            }
            8 => {
                let mut values = vec![0.0; len];
                LittleEndian::read_f32_into(bytes, &mut values);
                Array::Float32(values)
            }
            _ => {
                let mut values = vec![0.0; len];
                LittleEndian::read_f64_into(bytes, &mut values);
                Array::Float64(values)
            }
        }
    }

    fn encode(&self, out: &mut [u8]) {
        match self {
            Array::Int8(v) => v.iter().zip(out.iter_mut()).for_each(|(x, o)| *o = *x as u8),
            Array::UInt8(v) => out.copy_from_slice(v),
            Array::Int16(v) => LittleEndian::write_i16_into(v, out),
            Array::UInt16(v) => LittleEndian::write_u16_into(v, out),
            Array::Int32(v) => LittleEndian::write_i32_into(v, out),
            Array::UInt32(v) => LittleEndian::write_u32_into(v, out),
            Array::Int64(v) => LittleEndian::write_i64_into(v, out),
            Array::UInt64(v) => LittleEndian::write_u64_into(v, out),
            Array::Float32(v) => LittleEndian::write_f32_into(v, out),
            Array::Float64(v) => LittleEndian::write_f64_into(v, out),
        }
    }
}

fn element_size(code: u8) -> Option<usize> {
    match code {
        0 | 1 => Some(1),
        2 | 3 => Some(2),
        4 | 5 | 8 => Some(4),
        6 | 7 | 9 => Some(8),
        _ => None,
    }
}

fn type_name(code: u8) -> &'static str {
    match code {
        0 => "int8",
        1 => "uint8",
        2 => "int16",
        3 => "uint16",
        4 => "int32",
        5 => "uint32",
        6 => "int64",
        7 => "uint64",
        8 => "float32",
        9 => "float64",
        _ => "unknown",
    }
}

// ----------------------------------------------------------------------------
// Store

/// An in-memory kastore: typed arrays indexed by key, kept in key order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Store {
    items: BTreeMap<String, Array>,
}

macro_rules! typed_getter {
    ($(#[$doc:meta])* $name:ident, $t:ty, $variant:ident, $expected:literal) => {
        $(#[$doc])*
        pub fn $name(&self, key: &str) -> Result<&[$t], Error> {
            match self.items.get(key) {
                Some(Array::$variant(values)) => Ok(values),
                Some(other) => Err(Error::ColumnType {
                    key: key.to_string(),
                    found: other.type_name(),
                    expected: $expected,
                }),
                None => Err(Error::MissingColumn(key.to_string())),
            }
        }
    };
}

impl Store {
    pub fn new() -> Self {
        Store { items: BTreeMap::new() }
    }

    /// Inserts an array under `key`, returning the array it replaced.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc_trees::kastore::{Array, Store};
    /// let mut store = Store::new();
    /// store.insert("edges/left", vec![0.0, 5.0]);
    /// assert_eq!(store.get("edges/left"), Some(&Array::Float64(vec![0.0, 5.0])));
    /// ```
    pub fn insert<A>(&mut self, key: impl Into<String>, array: A) -> Option<Array>
    where
        A: Into<Array>,
    {
        self.items.insert(key.into(), array.into())
    }

    pub fn get(&self, key: &str) -> Option<&Array> {
        self.items.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    typed_getter!(
        /// Returns the `u8` array stored under `key`.
        get_u8, u8, UInt8, "uint8"
    );
    typed_getter!(get_i32, i32, Int32, "int32");
    typed_getter!(get_u32, u32, UInt32, "uint32");
    typed_getter!(get_u64, u64, UInt64, "uint64");
    typed_getter!(
        /// Returns the `f64` array stored under `key`.
        get_f64, f64, Float64, "float64"
    );

    /// Returns the text stored under `key` as `int8` or `uint8` bytes.
    ///
    /// tskit writes short text such as `format/name` as `int8`, and text
    /// columns such as `sites/ancestral_state` as `uint8`.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc_trees::kastore::Store;
    /// let mut store = Store::new();
    /// store.insert("format/name", b"tskit.trees".iter().map(|b| *b as i8).collect::<Vec<i8>>());
    /// store.insert("time_units", b"generations".to_vec());
    /// assert_eq!(store.get_text("format/name")?, "tskit.trees");
    /// assert_eq!(store.get_text("time_units")?, "generations");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_text(&self, key: &str) -> Result<String, Error> {
        let bytes: Vec<u8> = match self.items.get(key) {
            Some(Array::Int8(values)) => values.iter().map(|v| *v as u8).collect(),
            Some(Array::UInt8(values)) => values.clone(),
            Some(other) => {
                return Err(Error::ColumnType {
                    key: key.to_string(),
                    found: other.type_name(),
                    expected: "int8 or uint8",
                })
            }
            None => return Err(Error::MissingColumn(key.to_string())),
        };
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Returns the offsets of a ragged column, widening `u32` offsets to `u64`.
    pub fn get_offsets(&self, key: &str) -> Result<Vec<u64>, Error> {
        match self.items.get(key) {
            Some(Array::UInt32(values)) => Ok(values.iter().map(|v| *v as u64).collect()),
            Some(Array::UInt64(values)) => Ok(values.clone()),
            Some(other) => Err(Error::ColumnType {
                key: key.to_string(),
                found: other.type_name(),
                expected: "uint32 or uint64",
            }),
            None => Err(Error::MissingColumn(key.to_string())),
        }
    }

    /// Decodes a kastore container from bytes.
    ///
    /// - Bytes without the kastore magic number are a [`Error::FileFormat`].
    /// - Other layout problems are [`Error::Corrupt`] or [`Error::Version`].
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc_trees::kastore::Store;
    /// let mut store = Store::new();
    /// store.insert("a", vec![1_i32, 2, 3]);
    /// store.insert("b", b"text".to_vec());
    ///
    /// let bytes = store.to_bytes();
    /// assert_eq!(Store::from_bytes(&bytes)?, store);
    ///
    /// assert!(Store::from_bytes(b"not kastore").unwrap_err().is_file_format());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Store, Error> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::FileFormat(format!(
                "{} bytes is too small for a kastore header",
                bytes.len()
            )));
        }
        if &bytes[0..8] != MAGIC {
            return Err(Error::FileFormat("Bad kastore magic number".to_string()));
        }

        let major = LittleEndian::read_u16(&bytes[8..10]);
        let minor = LittleEndian::read_u16(&bytes[10..12]);
        if major != VERSION_MAJOR {
            return Err(Error::Version { major, minor });
        }

        let num_items = LittleEndian::read_u32(&bytes[12..16]) as usize;
        let file_size = LittleEndian::read_u64(&bytes[16..24]);
        if file_size != bytes.len() as u64 {
            return Err(Error::Corrupt(format!(
                "Header file size {file_size} does not match the {} bytes read",
                bytes.len()
            )));
        }

        let descriptors_end = num_items
            .checked_mul(DESCRIPTOR_SIZE)
            .and_then(|n| n.checked_add(HEADER_SIZE))
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| Error::Corrupt(format!("{num_items} item descriptors overrun the file")))?;

        let mut items = BTreeMap::new();
        for descriptor in bytes[HEADER_SIZE..descriptors_end].chunks_exact(DESCRIPTOR_SIZE) {
            let code = descriptor[0];
            let key_start = LittleEndian::read_u64(&descriptor[8..16]);
            let key_len = LittleEndian::read_u64(&descriptor[16..24]);
            let array_start = LittleEndian::read_u64(&descriptor[24..32]);
            let array_len = LittleEndian::read_u64(&descriptor[32..40]);

            let size = element_size(code)
                .ok_or_else(|| Error::Corrupt(format!("Unknown item type {code}")))?;

            let key = slice(bytes, key_start, key_len)
                .ok_or_else(|| Error::Corrupt("Item key is out of bounds".to_string()))?;
            let key = std::str::from_utf8(key)
                .map_err(|_| Error::Corrupt("Item key is not valid UTF-8".to_string()))?
                .to_string();

            let num_bytes = array_len
                .checked_mul(size as u64)
                .ok_or_else(|| Error::Corrupt(format!("Array {key:?} is too large")))?;
            let data = slice(bytes, array_start, num_bytes)
                .ok_or_else(|| Error::Corrupt(format!("Array {key:?} is out of bounds")))?;

            let array = Array::decode(code, data, array_len as usize);
            if items.insert(key.clone(), array).is_some() {
                return Err(Error::Corrupt(format!("Duplicate key {key:?}")));
            }
        }

        Ok(Store { items })
    }

    /// Encodes the store as kastore bytes, keys in sorted order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let num_items = self.items.len();
        let keys_start = HEADER_SIZE + num_items * DESCRIPTOR_SIZE;
        let keys_len: usize = self.items.keys().map(String::len).sum();

        // lay out the arrays after the keys, each aligned
        let mut offset = keys_start + keys_len;
        let mut array_starts = Vec::with_capacity(num_items);
        for array in self.items.values() {
            offset = align(offset);
            array_starts.push(offset);
            offset += array.num_bytes();
        }
        let file_size = offset;

        let mut bytes = vec![0u8; file_size];
        bytes[0..8].copy_from_slice(MAGIC);
        LittleEndian::write_u16(&mut bytes[8..10], VERSION_MAJOR);
        LittleEndian::write_u16(&mut bytes[10..12], VERSION_MINOR);
        LittleEndian::write_u32(&mut bytes[12..16], num_items as u32);
        LittleEndian::write_u64(&mut bytes[16..24], file_size as u64);

        let mut key_start = keys_start;
        for (i, ((key, array), array_start)) in self.items.iter().zip(array_starts).enumerate() {
            let d = HEADER_SIZE + i * DESCRIPTOR_SIZE;
            bytes[d] = array.type_code();
            LittleEndian::write_u64(&mut bytes[d + 8..d + 16], key_start as u64);
            LittleEndian::write_u64(&mut bytes[d + 16..d + 24], key.len() as u64);
            LittleEndian::write_u64(&mut bytes[d + 24..d + 32], array_start as u64);
            LittleEndian::write_u64(&mut bytes[d + 32..d + 40], array.len() as u64);

            bytes[key_start..key_start + key.len()].copy_from_slice(key.as_bytes());
            key_start += key.len();

            array.encode(&mut bytes[array_start..array_start + array.num_bytes()]);
        }

        bytes
    }
}

fn align(offset: usize) -> usize {
    offset.div_ceil(ARRAY_ALIGN) * ARRAY_ALIGN
}

fn slice(bytes: &[u8], start: u64, len: u64) -> Option<&[u8]> {
    let start = usize::try_from(start).ok()?;
    let end = start.checked_add(usize::try_from(len).ok()?)?;
    bytes.get(start..end)
}
