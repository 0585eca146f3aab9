//! Variant - fixed-layout native value representation
//!
//! Every value that crosses the component boundary (property values, method
//! arguments, return values, parameter defaults) travels as a 16-byte
//! `Variant`. Scalars are stored inline; strings and blobs point into memory
//! owned by whichever side produced the variant.
//!
//! # Layout
//!
//! ```text
//! offset 0  u16 tag       VariantKind
//! offset 2  u16 reserved  always 0
//! offset 4  u32 len       code units (WStr) or bytes (Blob), 0 otherwise
//! offset 8  u64 data      scalar bits or payload pointer
//! ```

use crate::error::{AbiError, AbiResult};

/// Variant type tags
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    /// No value
    Empty = 0,
    /// Explicit null
    Null = 1,
    /// Boolean (`data` is 0 or 1)
    Bool = 2,
    /// 32-bit signed integer
    I4 = 3,
    /// IEEE 754 double
    R8 = 4,
    /// Milliseconds since the Unix epoch
    Date = 5,
    /// UTF-16 string (`data` = pointer, `len` = code units)
    WStr = 6,
    /// Binary data (`data` = pointer, `len` = bytes)
    Blob = 7,
}

impl VariantKind {
    /// Decode a raw tag
    pub fn from_tag(tag: u16) -> Option<Self> {
        Some(match tag {
            0 => Self::Empty,
            1 => Self::Null,
            2 => Self::Bool,
            3 => Self::I4,
            4 => Self::R8,
            5 => Self::Date,
            6 => Self::WStr,
            7 => Self::Blob,
            _ => return None,
        })
    }

    /// Human-readable kind name
    pub fn name(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Null => "null",
            Self::Bool => "bool",
            Self::I4 => "i4",
            Self::R8 => "r8",
            Self::Date => "date",
            Self::WStr => "wstr",
            Self::Blob => "blob",
        }
    }
}

/// Native variant slot. `Copy` and non-owning: pointer payloads stay valid
/// only as long as their producer keeps them alive.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    tag: u16,
    reserved: u16,
    len: u32,
    data: u64,
}

impl Variant {
    #[inline]
    const fn scalar(kind: VariantKind, data: u64) -> Self {
        Self {
            tag: kind as u16,
            reserved: 0,
            len: 0,
            data,
        }
    }

    /// Create an empty variant
    #[inline]
    pub const fn empty() -> Self {
        Self::scalar(VariantKind::Empty, 0)
    }

    /// Create a null variant
    #[inline]
    pub const fn null() -> Self {
        Self::scalar(VariantKind::Null, 0)
    }

    /// Create a boolean variant
    #[inline]
    pub const fn bool(b: bool) -> Self {
        Self::scalar(VariantKind::Bool, b as u64)
    }

    /// Create a 32-bit integer variant
    #[inline]
    pub const fn i4(i: i32) -> Self {
        Self::scalar(VariantKind::I4, i as u32 as u64)
    }

    /// Create a double variant
    #[inline]
    pub fn r8(f: f64) -> Self {
        Self::scalar(VariantKind::R8, f.to_bits())
    }

    /// Create a date variant from milliseconds since the Unix epoch
    #[inline]
    pub const fn date(timestamp_ms: i64) -> Self {
        Self::scalar(VariantKind::Date, timestamp_ms as u64)
    }

    /// Create a string variant pointing at UTF-16 code units.
    ///
    /// # Safety
    /// `ptr` must stay valid for `len` code units for as long as the variant
    /// is read.
    #[inline]
    pub unsafe fn wstr_raw(ptr: *const u16, len: u32) -> Self {
        Self {
            tag: VariantKind::WStr as u16,
            reserved: 0,
            len,
            data: ptr as usize as u64,
        }
    }

    /// Create a blob variant pointing at raw bytes.
    ///
    /// # Safety
    /// `ptr` must stay valid for `len` bytes for as long as the variant is read.
    #[inline]
    pub unsafe fn blob_raw(ptr: *const u8, len: u32) -> Self {
        Self {
            tag: VariantKind::Blob as u16,
            reserved: 0,
            len,
            data: ptr as usize as u64,
        }
    }

    /// Raw tag
    #[inline]
    pub fn tag(&self) -> u16 {
        self.tag
    }

    /// Decoded kind, `None` for tags this host does not know
    #[inline]
    pub fn kind(&self) -> Option<VariantKind> {
        VariantKind::from_tag(self.tag)
    }

    /// Borrow the variant's contents.
    ///
    /// # Safety
    /// For `WStr` and `Blob` variants the payload pointer must be valid for
    /// `len` units while the returned view is alive.
    pub unsafe fn view(&self) -> AbiResult<VariantView<'_>> {
        let kind = self
            .kind()
            .ok_or(AbiError::UnknownVariantTag(self.tag))?;
        Ok(match kind {
            VariantKind::Empty => VariantView::Empty,
            VariantKind::Null => VariantView::Null,
            VariantKind::Bool => VariantView::Bool(self.data != 0),
            VariantKind::I4 => VariantView::I4(self.data as u32 as i32),
            VariantKind::R8 => VariantView::R8(f64::from_bits(self.data)),
            VariantKind::Date => VariantView::Date(self.data as i64),
            VariantKind::WStr => {
                VariantView::WStr(raw_slice(self.data as usize as *const u16, self.len))
            }
            VariantKind::Blob => {
                VariantView::Blob(raw_slice(self.data as usize as *const u8, self.len))
            }
        })
    }
}

unsafe fn raw_slice<'a, T>(ptr: *const T, len: u32) -> &'a [T] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, len as usize)
    }
}

impl Default for Variant {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            Some(VariantKind::Empty) => write!(f, "Variant::Empty"),
            Some(VariantKind::Null) => write!(f, "Variant::Null"),
            Some(VariantKind::Bool) => write!(f, "Variant::Bool({})", self.data != 0),
            Some(VariantKind::I4) => write!(f, "Variant::I4({})", self.data as u32 as i32),
            Some(VariantKind::R8) => write!(f, "Variant::R8({})", f64::from_bits(self.data)),
            Some(VariantKind::Date) => write!(f, "Variant::Date({})", self.data as i64),
            Some(VariantKind::WStr) => write!(f, "Variant::WStr({:#x}, len={})", self.data, self.len),
            Some(VariantKind::Blob) => write!(f, "Variant::Blob({:#x}, len={})", self.data, self.len),
            None => write!(f, "Variant::Unknown(tag={}, data={:#x})", self.tag, self.data),
        }
    }
}

/// Borrowed, decoded contents of a [`Variant`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariantView<'a> {
    /// No value
    Empty,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    I4(i32),
    /// Double
    R8(f64),
    /// Milliseconds since the Unix epoch
    Date(i64),
    /// UTF-16 code units
    WStr(&'a [u16]),
    /// Raw bytes
    Blob(&'a [u8]),
}

// ============================================================================
// WStr
// ============================================================================

/// Borrowed UTF-16 string view passed across the boundary.
///
/// Not null-terminated; `len` counts code units.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WStr {
    ptr: *const u16,
    len: u32,
}

impl WStr {
    /// Borrow a slice of code units. The slice must outlive every use of the view.
    pub fn new(units: &[u16]) -> Self {
        Self {
            ptr: units.as_ptr(),
            len: units.len().min(u32::MAX as usize) as u32,
        }
    }

    /// The empty string
    pub const fn empty() -> Self {
        Self {
            ptr: std::ptr::null(),
            len: 0,
        }
    }

    /// Length in code units
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Check for the empty string
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrow the code units.
    ///
    /// # Safety
    /// The pointer this view was built from must still be valid.
    pub unsafe fn as_units<'a>(&self) -> &'a [u16] {
        raw_slice(self.ptr, self.len)
    }

    /// Decode to an owned `String`, replacing unpaired surrogates.
    ///
    /// # Safety
    /// The pointer this view was built from must still be valid.
    pub unsafe fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(self.as_units())
    }
}

/// Encode a Rust string as UTF-16 code units
pub fn encode_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

// ============================================================================
// VariantBuffer
// ============================================================================

/// Owned storage behind a pointer payload. Boxed slices keep their address
/// when the surrounding `Vec` reallocates.
enum Payload {
    Wide(Box<[u16]>),
    Bytes(Box<[u8]>),
}

/// Fixed-length, positionally indexed array of variants together with the
/// memory their string and blob payloads point into.
///
/// Scoped to a single native call; all payload memory is released when the
/// buffer drops.
pub struct VariantBuffer {
    slots: Vec<Variant>,
    storage: Vec<Option<Payload>>,
}

impl VariantBuffer {
    /// Create a buffer of `len` empty slots
    pub fn new(len: usize) -> Self {
        let mut storage = Vec::with_capacity(len);
        storage.resize_with(len, || None);
        Self {
            slots: vec![Variant::empty(); len],
            storage,
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the buffer has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Get the variant at `slot`
    pub fn get(&self, slot: usize) -> Option<&Variant> {
        self.slots.get(slot)
    }

    /// All slots in order
    pub fn as_slice(&self) -> &[Variant] {
        &self.slots
    }

    /// Pointer to the first slot, for passing to the native side
    pub fn as_mut_ptr(&mut self) -> *mut Variant {
        self.slots.as_mut_ptr()
    }

    fn put(&mut self, slot: usize, variant: Variant, payload: Option<Payload>) -> AbiResult<()> {
        let len = self.slots.len();
        if slot >= len {
            return Err(AbiError::SlotOutOfRange { slot, len });
        }
        self.slots[slot] = variant;
        self.storage[slot] = payload;
        Ok(())
    }

    /// Store an empty value
    pub fn set_empty(&mut self, slot: usize) -> AbiResult<()> {
        self.put(slot, Variant::empty(), None)
    }

    /// Store a null value
    pub fn set_null(&mut self, slot: usize) -> AbiResult<()> {
        self.put(slot, Variant::null(), None)
    }

    /// Store a boolean
    pub fn set_bool(&mut self, slot: usize, b: bool) -> AbiResult<()> {
        self.put(slot, Variant::bool(b), None)
    }

    /// Store a 32-bit integer
    pub fn set_i4(&mut self, slot: usize, i: i32) -> AbiResult<()> {
        self.put(slot, Variant::i4(i), None)
    }

    /// Store a double
    pub fn set_r8(&mut self, slot: usize, f: f64) -> AbiResult<()> {
        self.put(slot, Variant::r8(f), None)
    }

    /// Store a date (milliseconds since the Unix epoch)
    pub fn set_date(&mut self, slot: usize, timestamp_ms: i64) -> AbiResult<()> {
        self.put(slot, Variant::date(timestamp_ms), None)
    }

    /// Store a string, copied into buffer-owned UTF-16 storage
    pub fn set_str(&mut self, slot: usize, s: &str) -> AbiResult<()> {
        let units: Box<[u16]> = encode_wide(s).into_boxed_slice();
        let len = u32::try_from(units.len()).map_err(|_| AbiError::PayloadTooLarge(units.len()))?;
        let variant = unsafe { Variant::wstr_raw(units.as_ptr(), len) };
        self.put(slot, variant, Some(Payload::Wide(units)))
    }

    /// Store binary data, copied into buffer-owned storage
    pub fn set_blob(&mut self, slot: usize, bytes: &[u8]) -> AbiResult<()> {
        let bytes: Box<[u8]> = bytes.into();
        let len = u32::try_from(bytes.len()).map_err(|_| AbiError::PayloadTooLarge(bytes.len()))?;
        let variant = unsafe { Variant::blob_raw(bytes.as_ptr(), len) };
        self.put(slot, variant, Some(Payload::Bytes(bytes)))
    }
}

impl std::fmt::Debug for VariantBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.slots.iter()).finish()
    }
}
