//! Per-type value columns of `PROP` chunks

use crate::error::{Error, Result};
use crate::model::{CFrame, Color3, Value, ValueType, Vector3};

use super::buffer::{ByteReader, ByteWriter};
use super::encoding::{transform_float, untransform_float, zigzag, unzigzag};

/// Rotation discriminant for an identity CFrame
pub const CFRAME_IDENTITY: u8 = 0x02;
/// Rotation discriminant for an explicit 9-float rotation
pub const CFRAME_EXPLICIT: u8 = 0x00;

fn type_conflict(property: &str, expected: ValueType, found: &Value) -> Error {
    Error::PropertyType(format!(
        "{} column is {} but a value is {}",
        property,
        expected.name(),
        found.value_type().name()
    ))
}

/// Write the values of one property for every instance of a class
pub(super) fn write_column(
    w: &mut ByteWriter,
    property: &str,
    value_type: ValueType,
    values: &[Value],
) -> Result<()> {
    match value_type {
        ValueType::String => {
            for value in values {
                let Value::String(s) = value else {
                    return Err(type_conflict(property, value_type, value));
                };
                w.write_string(s)?;
            }
        }
        ValueType::Bool => {
            for value in values {
                let Value::Bool(b) = value else {
                    return Err(type_conflict(property, value_type, value));
                };
                w.write_u8(u8::from(*b));
            }
        }
        ValueType::Int32 => {
            let words = collect_words(property, value_type, values, |v| match v {
                Value::Int32(i) => Some(zigzag(*i)),
                _ => None,
            })?;
            w.write_interleaved(&words);
        }
        ValueType::Float32 => {
            let words = collect_words(property, value_type, values, |v| match v {
                Value::Float32(f) => Some(transform_float(*f)),
                _ => None,
            })?;
            w.write_interleaved(&words);
        }
        ValueType::Enum => {
            let words = collect_words(property, value_type, values, |v| match v {
                // Tokens share the integer zigzag transform
                Value::Enum(token) => Some(zigzag(*token as i32)),
                _ => None,
            })?;
            w.write_interleaved(&words);
        }
        ValueType::Color3 => {
            let colors = values
                .iter()
                .map(|v| match v {
                    Value::Color3(c) => Ok([c.r, c.g, c.b]),
                    other => Err(type_conflict(property, value_type, other)),
                })
                .collect::<Result<Vec<_>>>()?;
            write_float_triples(w, &colors);
        }
        ValueType::Vector3 => {
            let vectors = values
                .iter()
                .map(|v| match v {
                    Value::Vector3(p) => Ok([p.x, p.y, p.z]),
                    other => Err(type_conflict(property, value_type, other)),
                })
                .collect::<Result<Vec<_>>>()?;
            write_float_triples(w, &vectors);
        }
        ValueType::CFrame => {
            let mut positions = Vec::with_capacity(values.len());
            for value in values {
                let Value::CFrame(cf) = value else {
                    return Err(type_conflict(property, value_type, value));
                };
                if cf.is_identity_rotation() {
                    w.write_u8(CFRAME_IDENTITY);
                } else {
                    w.write_u8(CFRAME_EXPLICIT);
                    for component in cf.rotation {
                        w.write_f32_le(component);
                    }
                }
                positions.push([cf.position.x, cf.position.y, cf.position.z]);
            }
            write_float_triples(w, &positions);
        }
    }
    Ok(())
}

fn collect_words(
    property: &str,
    value_type: ValueType,
    values: &[Value],
    word: impl Fn(&Value) -> Option<u32>,
) -> Result<Vec<u32>> {
    values
        .iter()
        .map(|v| word(v).ok_or_else(|| type_conflict(property, value_type, v)))
        .collect()
}

/// Three interleaved float arrays, one per component
fn write_float_triples(w: &mut ByteWriter, triples: &[[f32; 3]]) {
    for axis in 0..3 {
        let words: Vec<u32> = triples.iter().map(|t| transform_float(t[axis])).collect();
        w.write_interleaved(&words);
    }
}

fn read_float_triples(r: &mut ByteReader<'_>, count: usize) -> Result<Vec<[f32; 3]>> {
    let xs = r.read_interleaved(count, "float x array")?;
    let ys = r.read_interleaved(count, "float y array")?;
    let zs = r.read_interleaved(count, "float z array")?;
    Ok(xs
        .into_iter()
        .zip(ys)
        .zip(zs)
        .map(|((x, y), z)| {
            [
                untransform_float(x),
                untransform_float(y),
                untransform_float(z),
            ]
        })
        .collect())
}

/// Read `count` values of `value_type`, the inverse of [`write_column`]
pub(super) fn read_column(
    r: &mut ByteReader<'_>,
    value_type: ValueType,
    count: usize,
) -> Result<Vec<Value>> {
    let values = match value_type {
        ValueType::String => (0..count)
            .map(|_| r.read_string("string value").map(Value::String))
            .collect::<Result<Vec<_>>>()?,
        ValueType::Bool => (0..count)
            .map(|_| r.read_u8("bool value").map(|b| Value::Bool(b != 0)))
            .collect::<Result<Vec<_>>>()?,
        ValueType::Int32 => r
            .read_interleaved(count, "int32 values")?
            .into_iter()
            .map(|w| Value::Int32(unzigzag(w)))
            .collect(),
        ValueType::Float32 => r
            .read_interleaved(count, "float values")?
            .into_iter()
            .map(|w| Value::Float32(untransform_float(w)))
            .collect(),
        ValueType::Enum => r
            .read_interleaved(count, "enum values")?
            .into_iter()
            .map(|w| Value::Enum(unzigzag(w) as u32))
            .collect(),
        ValueType::Color3 => read_float_triples(r, count)?
            .into_iter()
            .map(|[red, green, blue]| Value::Color3(Color3::new(red, green, blue)))
            .collect(),
        ValueType::Vector3 => read_float_triples(r, count)?
            .into_iter()
            .map(|[x, y, z]| Value::Vector3(Vector3::new(x, y, z)))
            .collect(),
        ValueType::CFrame => {
            let mut rotations = Vec::new();
            for _ in 0..count {
                let rotation = match r.read_u8("CFrame rotation id")? {
                    CFRAME_IDENTITY => CFrame::IDENTITY_ROTATION,
                    CFRAME_EXPLICIT => {
                        let mut m = [0.0f32; 9];
                        for component in m.iter_mut() {
                            *component = r.read_f32_le("CFrame rotation")?;
                        }
                        m
                    }
                    other => {
                        return Err(Error::InvalidBinary(format!(
                            "unsupported CFrame rotation id 0x{:02X}",
                            other
                        )));
                    }
                };
                rotations.push(rotation);
            }
            read_float_triples(r, count)?
                .into_iter()
                .zip(rotations)
                .map(|([x, y, z], rotation)| {
                    Value::CFrame(CFrame::new(Vector3::new(x, y, z), rotation))
                })
                .collect()
        }
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value_type: ValueType, values: &[Value]) -> Vec<u8> {
        let mut w = ByteWriter::default();
        write_column(&mut w, "Test", value_type, values).unwrap();
        w.into_inner()
    }

    #[test]
    fn test_identity_cframe_omits_rotation() {
        let cf = CFrame::from_position(Vector3::new(1.0, 2.0, 3.0));
        let bytes = encode(ValueType::CFrame, &[Value::CFrame(cf)]);
        // discriminant + 3 interleaved floats
        assert_eq!(bytes.len(), 1 + 12);
        assert_eq!(bytes[0], CFRAME_IDENTITY);
    }

    #[test]
    fn test_rotated_cframe_writes_raw_rotation() {
        let mut cf = CFrame::default();
        cf.rotation[0] = 1.0 - 1e-3;
        let bytes = encode(ValueType::CFrame, &[Value::CFrame(cf)]);
        assert_eq!(bytes.len(), 1 + 36 + 12);
        assert_eq!(bytes[0], CFRAME_EXPLICIT);
        // R00 as raw little-endian float, not interleaved
        assert_eq!(&bytes[1..5], &(1.0f32 - 1e-3).to_le_bytes());
    }

    #[test]
    fn test_bool_column_is_raw_bytes() {
        let bytes = encode(ValueType::Bool, &[Value::Bool(true), Value::Bool(false)]);
        assert_eq!(bytes, vec![1, 0]);
    }

    #[test]
    fn test_int_column_is_zigzagged() {
        let bytes = encode(ValueType::Int32, &[Value::Int32(-1), Value::Int32(1)]);
        assert_eq!(bytes, vec![0, 0, 0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_enum_column_is_zigzagged() {
        let bytes = encode(ValueType::Enum, &[Value::Enum(3)]);
        assert_eq!(bytes, vec![0, 0, 0, 6]);
    }

    #[test]
    fn test_mixed_column_is_rejected() {
        let mut w = ByteWriter::default();
        let err = write_column(
            &mut w,
            "Size",
            ValueType::Vector3,
            &[Value::Vector3(Vector3::zero()), Value::Bool(true)],
        )
        .unwrap_err();
        assert!(matches!(err, Error::PropertyType(_)));
    }

    #[test]
    fn test_columns_decode() {
        let values = vec![
            Value::CFrame(CFrame::from_position(Vector3::new(1.0, 2.0, 3.0))),
            Value::CFrame(CFrame::new(
                Vector3::new(-4.0, 0.5, 8.0),
                [0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0],
            )),
        ];
        let bytes = encode(ValueType::CFrame, &values);
        let mut r = ByteReader::new(&bytes);
        assert_eq!(read_column(&mut r, ValueType::CFrame, 2).unwrap(), values);
        assert_eq!(r.remaining(), 0);
    }
}
