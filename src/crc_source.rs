use crate::foundation::error::{VcrtcError, VcrtcResult};

/// Names accepted as a CRC source.
pub const CRC_SOURCES: [&str; 1] = ["auto"];

/// Checksum values reported per frame.
const CRC_VALUES: usize = 1;

/// The CRC sources an output offers.
pub fn crc_sources() -> &'static [&'static str] {
    &CRC_SOURCES
}

/// Map a source name to "enabled": `auto` enables, no source disables.
///
/// Any other name is rejected; callers that need a definite state treat it as disabled.
pub fn parse_crc_source(source: Option<&str>) -> VcrtcResult<bool> {
    match source {
        None => Ok(false),
        Some("auto") => Ok(true),
        Some(other) => Err(VcrtcError::invalid_argument(format!(
            "unknown CRC source '{other}', expected one of {CRC_SOURCES:?}"
        ))),
    }
}

/// Validate a source name and return how many values each CRC entry carries.
pub fn verify_crc_source(source: Option<&str>) -> VcrtcResult<usize> {
    parse_crc_source(source).map(|_| CRC_VALUES)
}

#[cfg(test)]
#[path = "../tests/unit/crc_source.rs"]
mod tests;
