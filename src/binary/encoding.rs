//! Numeric encodings shared by the `INST`, `PROP` and `PRNT` chunks
//!
//! Integers are zigzag-transformed so small deltas of either sign stay
//! small. Floats are stored as their raw IEEE-754 bits with no transform.
//! Arrays of 32-bit words are byte-plane interleaved: all most-significant
//! bytes first, then all second bytes, and so on.

use crate::error::{Error, Result};

/// Map a signed value to unsigned so that 0, -1, 1, -2, 2 become 0, 1, 2, 3, 4
pub fn zigzag(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag`]
pub fn unzigzag(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Raw IEEE-754 bit pattern of a float
pub fn transform_float(value: f32) -> u32 {
    value.to_bits()
}

/// Inverse of [`transform_float`]
pub fn untransform_float(bits: u32) -> f32 {
    f32::from_bits(bits)
}

/// Byte-plane transpose of `values`, written as big-endian words
pub fn interleave(values: &[u32]) -> Vec<u8> {
    let count = values.len();

    let mut scratch = Vec::with_capacity(count * 4);
    for value in values {
        scratch.extend_from_slice(&value.to_be_bytes());
    }

    let mut out = Vec::with_capacity(count * 4);
    for plane in 0..4 {
        for word in 0..count {
            out.push(scratch[word * 4 + plane]);
        }
    }
    out
}

/// Inverse of [`interleave`] for `count` words at the start of `bytes`
pub fn deinterleave(bytes: &[u8], count: usize) -> Result<Vec<u32>> {
    if bytes.len() < count * 4 {
        return Err(Error::truncated("interleaved array"));
    }

    let values = (0..count)
        .map(|word| {
            u32::from_be_bytes([
                bytes[word],
                bytes[count + word],
                bytes[2 * count + word],
                bytes[3 * count + word],
            ])
        })
        .collect();
    Ok(values)
}

/// Zigzag-transformed differences between consecutive values, starting from 0
pub fn delta_encode(values: &[i32]) -> Vec<u32> {
    let mut previous = 0i32;
    values
        .iter()
        .map(|&value| {
            let delta = value.wrapping_sub(previous);
            previous = value;
            zigzag(delta)
        })
        .collect()
}

/// Inverse of [`delta_encode`]
pub fn delta_decode(encoded: &[u32]) -> Vec<i32> {
    let mut previous = 0i32;
    encoded
        .iter()
        .map(|&word| {
            previous = previous.wrapping_add(unzigzag(word));
            previous
        })
        .collect()
}
