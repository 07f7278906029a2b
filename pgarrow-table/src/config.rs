use pgarrow_result::{Error, Result};

/// Default record batch segment size: 512 MiB.
pub const DEFAULT_SEGMENT_SIZE: usize = 512 << 20;

/// Configuration of a [`crate::TableBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableBufferConfig {
    /// Aligned buffer bytes above which the open batch is sealed.
    pub segment_size: usize,
}

impl Default for TableBufferConfig {
    fn default() -> Self {
        Self {
            segment_size: DEFAULT_SEGMENT_SIZE,
        }
    }
}

impl TableBufferConfig {
    pub fn with_segment_size(segment_size: usize) -> Result<Self> {
        if segment_size == 0 {
            return Err(Error::InvalidArgumentError(
                "segment size must be positive".into(),
            ));
        }
        Ok(Self { segment_size })
    }
}

/// Parse a segment size such as `4096`, `256k`, `64MB` or `1g`.
///
/// Suffixes are binary multiples and case-insensitive.
pub fn parse_segment_size(text: &str) -> Result<usize> {
    let trimmed = text.trim();
    let lower = trimmed.to_ascii_lowercase();
    let split = lower
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(lower.len());
    let (digits, suffix) = lower.split_at(split);
    let shift = match suffix.trim() {
        "" => 0,
        "k" | "kb" => 10,
        "m" | "mb" => 20,
        "g" | "gb" => 30,
        _ => {
            return Err(Error::InvalidArgumentError(format!(
                "invalid segment size '{trimmed}': unknown unit"
            )));
        }
    };
    let value: usize = digits.parse().map_err(|_| {
        Error::InvalidArgumentError(format!("invalid segment size '{trimmed}'"))
    })?;
    let bytes = value.checked_shl(shift).filter(|b| b >> shift == value).ok_or_else(|| {
        Error::InvalidArgumentError(format!("segment size '{trimmed}' is too large"))
    })?;
    TableBufferConfig::with_segment_size(bytes).map(|cfg| cfg.segment_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_512_mib() {
        assert_eq!(TableBufferConfig::default().segment_size, 536_870_912);
    }

    #[test]
    fn units_are_binary_multiples() {
        assert_eq!(parse_segment_size("4096").unwrap(), 4096);
        assert_eq!(parse_segment_size("256k").unwrap(), 256 * 1024);
        assert_eq!(parse_segment_size("64MB").unwrap(), 64 << 20);
        assert_eq!(parse_segment_size(" 2 Gb ").unwrap(), 2 << 30);
    }

    #[test]
    fn malformed_sizes_are_rejected() {
        for bad in ["", "0", "k", "12q", "-5m", "1.5g"] {
            assert!(
                matches!(parse_segment_size(bad), Err(Error::InvalidArgumentError(_))),
                "{bad:?}"
            );
        }
    }
}
