//! Decoding of PostgreSQL binary send formats.
//!
//! Everything on the wire is in network byte order. Composite values follow
//! `record_send`, arrays follow `array_send` and numerics follow
//! `numeric_send`.

use pgarrow_result::{Error, Result};

use crate::types::Oid;

/// Days between 1970-01-01 and 2000-01-01.
pub const POSTGRES_EPOCH_DAYS: i32 = 10_957;

/// Microseconds between 1970-01-01 and 2000-01-01.
pub const POSTGRES_EPOCH_MICROS: i64 = 946_684_800_000_000;

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NBASE_DIGITS: i32 = 4;

/// Bounds-checked big-endian reader over one cell payload.
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
    column: &'a str,
}

impl<'a> WireReader<'a> {
    pub fn new(column: &'a str, data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            column,
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::wire_format(
                self.column,
                format!(
                    "need {len} bytes at offset {} but only {} remain",
                    self.pos,
                    self.remaining()
                ),
            ));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    /// A length-prefixed datum; a length of `-1` is SQL NULL.
    pub fn read_datum(&mut self) -> Result<Option<&'a [u8]>> {
        let len = self.read_i32()?;
        match len {
            -1 => Ok(None),
            n if n < 0 => Err(Error::wire_format(
                self.column,
                format!("negative datum length {n}"),
            )),
            n => self.take(n as usize).map(Some),
        }
    }

    /// Fails unless the whole payload was consumed.
    pub fn finish(&self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(Error::wire_format(
                self.column,
                format!("{} trailing bytes", self.remaining()),
            ));
        }
        Ok(())
    }
}

/// One field of a binary record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordField<'a> {
    pub type_id: Oid,
    pub value: Option<&'a [u8]>,
}

/// Split a `record_send` payload into its fields.
pub fn parse_record<'a>(column: &'a str, data: &'a [u8]) -> Result<Vec<RecordField<'a>>> {
    let mut reader = WireReader::new(column, data);
    let nvalids = reader.read_i32()?;
    if nvalids < 0 {
        return Err(Error::wire_format(
            column,
            format!("negative record field count {nvalids}"),
        ));
    }
    // every field carries at least an oid and a length word
    let mut fields = Vec::with_capacity((nvalids as usize).min(reader.remaining() / 8));
    for _ in 0..nvalids {
        let type_id = reader.read_u32()?;
        let value = reader.read_datum()?;
        fields.push(RecordField { type_id, value });
    }
    reader.finish()?;
    Ok(fields)
}

/// A decoded one-dimensional array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayValue<'a> {
    pub element_type: Oid,
    pub elements: Vec<Option<&'a [u8]>>,
}

/// Decode an `array_send` payload. Empty arrays are sent with zero
/// dimensions; more than one dimension is rejected.
pub fn parse_array<'a>(column: &'a str, data: &'a [u8]) -> Result<ArrayValue<'a>> {
    let mut reader = WireReader::new(column, data);
    let ndim = reader.read_i32()?;
    let _has_nulls = reader.read_i32()?;
    let element_type = reader.read_u32()?;
    let count = match ndim {
        0 => 0,
        1 => {
            let len = reader.read_i32()?;
            let _lower_bound = reader.read_i32()?;
            if len < 0 {
                return Err(Error::wire_format(
                    column,
                    format!("negative array length {len}"),
                ));
            }
            len as usize
        }
        n => {
            return Err(Error::wire_format(
                column,
                format!("{n}-dimensional arrays are not supported"),
            ));
        }
    };
    let mut elements = Vec::with_capacity(count.min(reader.remaining() / 4));
    for _ in 0..count {
        elements.push(reader.read_datum()?);
    }
    reader.finish()?;
    Ok(ArrayValue {
        element_type,
        elements,
    })
}

/// Decode a `numeric_send` payload into an unscaled integer at `scale`,
/// checking that it fits in `precision` decimal digits.
pub fn parse_numeric(column: &str, data: &[u8], precision: u8, scale: i8) -> Result<i128> {
    let mut reader = WireReader::new(column, data);
    let ndigits = reader.read_i16()?;
    let weight = reader.read_i16()? as i32;
    let sign = reader.read_u16()?;
    let _dscale = reader.read_i16()?;
    match sign {
        NUMERIC_POS | NUMERIC_NEG => {}
        NUMERIC_NAN => return Err(Error::wire_format(column, "NaN is not representable")),
        other => {
            return Err(Error::wire_format(
                column,
                format!("unsupported numeric sign 0x{other:04x}"),
            ));
        }
    }
    if ndigits < 0 {
        return Err(Error::wire_format(
            column,
            format!("negative numeric digit count {ndigits}"),
        ));
    }

    let overflow = || {
        Error::wire_format(column, format!("value overflows numeric({precision},{scale})"))
    };
    let mut unscaled: i128 = 0;
    for i in 0..ndigits as i32 {
        let digit = reader.read_i16()?;
        if !(0..10_000).contains(&digit) {
            return Err(Error::wire_format(column, format!("bad numeric digit {digit}")));
        }
        if digit == 0 {
            continue;
        }
        let exponent = NBASE_DIGITS * (weight - i) + scale as i32;
        let contribution = if exponent >= 0 {
            10i128
                .checked_pow(exponent as u32)
                .and_then(|p| p.checked_mul(digit as i128))
                .ok_or_else(overflow)?
        } else {
            let divisor = 10i128.pow((-exponent).min(NBASE_DIGITS) as u32);
            if exponent <= -NBASE_DIGITS || digit as i128 % divisor != 0 {
                return Err(Error::wire_format(
                    column,
                    format!("value has more than {scale} fractional digits"),
                ));
            }
            digit as i128 / divisor
        };
        unscaled = unscaled.checked_add(contribution).ok_or_else(overflow)?;
    }
    reader.finish()?;

    if precision < 39 && unscaled >= 10i128.pow(precision as u32) {
        return Err(overflow());
    }
    Ok(if sign == NUMERIC_NEG { -unscaled } else { unscaled })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(weight: i16, sign: u16, dscale: i16, digits: &[i16]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(digits.len() as i16).to_be_bytes());
        out.extend_from_slice(&weight.to_be_bytes());
        out.extend_from_slice(&sign.to_be_bytes());
        out.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            out.extend_from_slice(&d.to_be_bytes());
        }
        out
    }

    #[test]
    fn numeric_rescales_to_column_scale() {
        // 12345.678
        let bytes = numeric(1, NUMERIC_POS, 3, &[1, 2345, 6780]);
        assert_eq!(parse_numeric("n", &bytes, 10, 3).unwrap(), 12_345_678);
        assert_eq!(parse_numeric("n", &bytes, 10, 4).unwrap(), 123_456_780);

        let neg = numeric(-1, NUMERIC_NEG, 2, &[500]);
        assert_eq!(parse_numeric("n", &neg, 5, 2).unwrap(), -5);

        let zero = numeric(0, NUMERIC_POS, 0, &[]);
        assert_eq!(parse_numeric("n", &zero, 5, 2).unwrap(), 0);
    }

    #[test]
    fn numeric_rejects_nan_overflow_and_lost_digits() {
        let nan = numeric(0, NUMERIC_NAN, 0, &[]);
        assert!(matches!(
            parse_numeric("n", &nan, 10, 0),
            Err(Error::WireFormat { .. })
        ));

        let big = numeric(1, NUMERIC_POS, 0, &[1, 0]);
        assert!(parse_numeric("n", &big, 4, 0).is_err());
        assert_eq!(parse_numeric("n", &big, 5, 0).unwrap(), 10_000);

        let fine = numeric(-1, NUMERIC_POS, 4, &[1234]);
        assert!(parse_numeric("n", &fine, 10, 2).is_err());
    }

    #[test]
    fn record_fields_carry_type_and_nulls() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2i32.to_be_bytes());
        bytes.extend_from_slice(&23u32.to_be_bytes());
        bytes.extend_from_slice(&4i32.to_be_bytes());
        bytes.extend_from_slice(&7i32.to_be_bytes());
        bytes.extend_from_slice(&25u32.to_be_bytes());
        bytes.extend_from_slice(&(-1i32).to_be_bytes());

        let fields = parse_record("c", &bytes).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].type_id, 23);
        assert_eq!(fields[0].value, Some(&7i32.to_be_bytes()[..]));
        assert_eq!(fields[1].value, None);

        assert!(parse_record("c", &bytes[..bytes.len() - 2]).is_err());
    }

    #[test]
    fn huge_record_field_count_is_a_wire_error() {
        let err = parse_record("c", &i32::MAX.to_be_bytes()).unwrap_err();
        assert!(matches!(err, Error::WireFormat { .. }), "{err}");
    }

    #[test]
    fn huge_array_length_is_a_wire_error() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1i32.to_be_bytes());
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&23u32.to_be_bytes());
        bytes.extend_from_slice(&i32::MAX.to_be_bytes());
        bytes.extend_from_slice(&1i32.to_be_bytes());
        let err = parse_array("a", &bytes).unwrap_err();
        assert!(matches!(err, Error::WireFormat { .. }), "{err}");
    }

    #[test]
    fn arrays_beyond_one_dimension_are_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2i32.to_be_bytes());
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&23u32.to_be_bytes());
        let err = parse_array("a", &bytes).unwrap_err();
        assert!(err.to_string().contains("2-dimensional"));

        let mut empty = Vec::new();
        empty.extend_from_slice(&0i32.to_be_bytes());
        empty.extend_from_slice(&0i32.to_be_bytes());
        empty.extend_from_slice(&23u32.to_be_bytes());
        let parsed = parse_array("a", &empty).unwrap();
        assert!(parsed.elements.is_empty());
    }
}
