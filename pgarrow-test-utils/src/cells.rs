//! Builders for PostgreSQL binary send payloads.

pub fn int4(v: i32) -> Option<Vec<u8>> {
    Some(v.to_be_bytes().to_vec())
}

pub fn int8(v: i64) -> Option<Vec<u8>> {
    Some(v.to_be_bytes().to_vec())
}

pub fn float8(v: f64) -> Option<Vec<u8>> {
    Some(v.to_be_bytes().to_vec())
}

pub fn boolean(v: bool) -> Option<Vec<u8>> {
    Some(vec![v as u8])
}

pub fn text(v: &str) -> Option<Vec<u8>> {
    Some(v.as_bytes().to_vec())
}

/// Days since 2000-01-01.
pub fn date(pg_days: i32) -> Option<Vec<u8>> {
    Some(pg_days.to_be_bytes().to_vec())
}

/// Microseconds since 2000-01-01 00:00:00.
pub fn timestamp(pg_micros: i64) -> Option<Vec<u8>> {
    Some(pg_micros.to_be_bytes().to_vec())
}

fn push_datum(out: &mut Vec<u8>, value: &Option<Vec<u8>>) {
    match value {
        Some(v) => {
            out.extend_from_slice(&(v.len() as i32).to_be_bytes());
            out.extend_from_slice(v);
        }
        None => out.extend_from_slice(&(-1i32).to_be_bytes()),
    }
}

/// `record_send` payload from `(field type oid, value)` pairs.
pub fn record(fields: &[(u32, Option<Vec<u8>>)]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(&(fields.len() as i32).to_be_bytes());
    for (oid, value) in fields {
        out.extend_from_slice(&oid.to_be_bytes());
        push_datum(&mut out, value);
    }
    Some(out)
}

/// One-dimensional `array_send` payload.
pub fn array(element_oid: u32, elements: &[Option<Vec<u8>>]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    let has_nulls = elements.iter().any(Option::is_none);
    if elements.is_empty() {
        out.extend_from_slice(&0i32.to_be_bytes());
        out.extend_from_slice(&0i32.to_be_bytes());
        out.extend_from_slice(&element_oid.to_be_bytes());
        return Some(out);
    }
    out.extend_from_slice(&1i32.to_be_bytes());
    out.extend_from_slice(&(has_nulls as i32).to_be_bytes());
    out.extend_from_slice(&element_oid.to_be_bytes());
    out.extend_from_slice(&(elements.len() as i32).to_be_bytes());
    out.extend_from_slice(&1i32.to_be_bytes());
    for element in elements {
        push_datum(&mut out, element);
    }
    Some(out)
}

/// `numeric_send` payload for an unscaled integer at `scale >= 0`.
pub fn numeric(unscaled: i128, scale: u16) -> Option<Vec<u8>> {
    let negative = unscaled < 0;
    let mut magnitude = unscaled.unsigned_abs();
    // Pad the fraction to whole base-10000 digits.
    let frac_groups = scale.div_ceil(4);
    let pad = frac_groups * 4 - scale;
    magnitude *= 10u128.pow(pad as u32);

    let mut digits = Vec::new();
    while magnitude > 0 {
        digits.push((magnitude % 10_000) as i16);
        magnitude /= 10_000;
    }
    while digits.len() < frac_groups as usize {
        digits.push(0);
    }
    digits.reverse();
    let weight = digits.len() as i16 - frac_groups as i16 - 1;

    let mut out = Vec::new();
    out.extend_from_slice(&(digits.len() as i16).to_be_bytes());
    out.extend_from_slice(&weight.to_be_bytes());
    out.extend_from_slice(&(if negative { 0x4000u16 } else { 0 }).to_be_bytes());
    out.extend_from_slice(&(scale as i16).to_be_bytes());
    for d in digits {
        out.extend_from_slice(&d.to_be_bytes());
    }
    Some(out)
}
