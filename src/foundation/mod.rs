pub(crate) mod core;
pub(crate) mod crc;
pub(crate) mod error;
pub(crate) mod fixed;
