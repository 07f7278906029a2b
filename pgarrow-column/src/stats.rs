use std::cmp::Ordering;
use std::fmt;

/// A statistics value in the column's Arrow representation (after epoch
/// shifts), widened to 64 bits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StatDatum {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl StatDatum {
    fn compare(&self, other: &StatDatum) -> Option<Ordering> {
        match (self, other) {
            (StatDatum::Int(a), StatDatum::Int(b)) => Some(a.cmp(b)),
            (StatDatum::UInt(a), StatDatum::UInt(b)) => Some(a.cmp(b)),
            (StatDatum::Float(a), StatDatum::Float(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for StatDatum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatDatum::Int(v) => write!(f, "{v}"),
            StatDatum::UInt(v) => write!(f, "{v}"),
            StatDatum::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Running minimum and maximum of the open batch. `None` means no non-null
/// value has been observed yet.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColumnStats {
    pub min: Option<StatDatum>,
    pub max: Option<StatDatum>,
}

impl ColumnStats {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn clear(&mut self) {
        self.min = None;
        self.max = None;
    }

    /// Fold one value into the running range. Values that do not compare
    /// (NaN, mismatched kinds) leave the range untouched.
    pub fn update(&mut self, datum: StatDatum) {
        if let StatDatum::Float(v) = datum
            && v.is_nan()
        {
            return;
        }
        match self.min {
            None => self.min = Some(datum),
            Some(cur) if datum.compare(&cur) == Some(Ordering::Less) => self.min = Some(datum),
            _ => {}
        }
        match self.max {
            None => self.max = Some(datum),
            Some(cur) if datum.compare(&cur) == Some(Ordering::Greater) => self.max = Some(datum),
            _ => {}
        }
    }

    /// Both bounds, when at least one value was observed.
    pub fn range(&self) -> Option<(StatDatum, StatDatum)> {
        Some((self.min?, self.max?))
    }
}
