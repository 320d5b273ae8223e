//! Named embed colors.

/// Blue used by informational notices.
pub const INFO: u32 = 0x3498DB;

/// Green used by success notices.
pub const SUCCESS: u32 = 0x2ECC71;

/// Yellow used by warnings.
pub const WARNING: u32 = 0xF1C40F;

/// Red used by error notices.
pub const ERROR: u32 = 0xE74C3C;

/// Largest color the provider accepts (`0xFFFFFF`).
pub const MAX: u32 = 0xFF_FFFF;
