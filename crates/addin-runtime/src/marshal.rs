//! Variant marshalling between `DynValue` and native `Variant`s
//!
//! | host            | native |
//! |-----------------|--------|
//! | Undefined       | Empty  |
//! | Null            | Null   |
//! | Bool            | Bool   |
//! | Number (i32)    | I4     |
//! | Number (other)  | R8     |
//! | String          | WStr   |
//! | Date            | Date   |
//! | Binary          | Blob   |
//! | Object          | -      |
//!
//! Both native numeric kinds come back as `Number`, so a value keeps its
//! kind through a round trip.

use addin_abi::{Variant, VariantBuffer, VariantView};

use crate::error::{AddinError, AddinResult};
use crate::value::DynValue;

/// Write `value` into `slot` of `buffer`
pub fn to_native(value: &DynValue, buffer: &mut VariantBuffer, slot: usize) -> AddinResult<()> {
    match value {
        DynValue::Undefined => buffer.set_empty(slot)?,
        DynValue::Null => buffer.set_null(slot)?,
        DynValue::Bool(b) => buffer.set_bool(slot, *b)?,
        DynValue::Number(n) => match as_i4(*n) {
            Some(i) => buffer.set_i4(slot, i)?,
            None => buffer.set_r8(slot, *n)?,
        },
        DynValue::String(s) => buffer.set_str(slot, s)?,
        DynValue::Date(ms) => buffer.set_date(slot, *ms)?,
        DynValue::Binary(bytes) => buffer.set_blob(slot, bytes)?,
        DynValue::Object(obj) => {
            return Err(AddinError::Marshalling {
                kind: obj.type_name().to_string(),
                reason: "objects have no native representation".to_string(),
            })
        }
    }
    Ok(())
}

/// Integral numbers that fit the native 32-bit integer
fn as_i4(n: f64) -> Option<i32> {
    if n.fract() == 0.0 && n >= i32::MIN as f64 && n <= i32::MAX as f64 {
        // -0.0 stays a double so its sign survives
        if n == 0.0 && n.is_sign_negative() {
            return None;
        }
        Some(n as i32)
    } else {
        None
    }
}

/// Marshal a single value into a one-slot buffer
pub fn to_native_value(value: &DynValue) -> AddinResult<VariantBuffer> {
    let mut buffer = VariantBuffer::new(1);
    to_native(value, &mut buffer, 0)?;
    Ok(buffer)
}

/// Marshal an ordered argument list into a buffer of the same length
pub fn to_native_array(values: &[DynValue]) -> AddinResult<VariantBuffer> {
    let mut buffer = VariantBuffer::new(values.len());
    for (slot, value) in values.iter().enumerate() {
        to_native(value, &mut buffer, slot)?;
    }
    Ok(buffer)
}

/// Copy a native variant into an owned `DynValue`.
///
/// Must be called while the variant's producer keeps its payload alive
/// (inside the sink of the native call that produced it).
pub fn from_native(variant: &Variant) -> AddinResult<DynValue> {
    let view = unsafe { variant.view() }.map_err(|e| AddinError::Marshalling {
        kind: format!("tag {}", variant.tag()),
        reason: e.to_string(),
    })?;
    Ok(match view {
        VariantView::Empty => DynValue::Undefined,
        VariantView::Null => DynValue::Null,
        VariantView::Bool(b) => DynValue::Bool(b),
        VariantView::I4(i) => DynValue::Number(i as f64),
        VariantView::R8(f) => DynValue::Number(f),
        VariantView::Date(ms) => DynValue::Date(ms),
        VariantView::WStr(units) => DynValue::String(String::from_utf16_lossy(units)),
        VariantView::Blob(bytes) => DynValue::Binary(bytes.to_vec()),
    })
}
