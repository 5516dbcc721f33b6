//! GPIO pin assignments for the storage-room controller board.
//!
//! Single source of truth for the default wiring.  Numbers are Linux GPIO
//! (BCM) line numbers; the physical 40-pin header position is noted beside
//! each so the harness can be checked against the board.  A deployment with
//! different wiring overrides these through [`PinMap`](crate::config::PinMap).

// ---------------------------------------------------------------------------
// Seven-segment display (segments a..g, shared by both digits)
// ---------------------------------------------------------------------------

/// Segment lines in a, b, c, d, e, f, g order.
/// Header pins 3, 5, 7, 11, 13, 15, 18.
pub const SEGMENT_GPIOS: [u32; 7] = [2, 3, 4, 17, 27, 22, 24];

/// Digit enable lines, most significant digit first (tens, ones).
/// Header pins 35, 36.  HIGH = digit enabled.
pub const DIGIT_ENABLE_GPIOS: [u32; 2] = [19, 16];

// ---------------------------------------------------------------------------
// Per-room indicators
// ---------------------------------------------------------------------------

/// Active-room LEDs, one per room.  Header pins 38, 40, 26.
pub const ROOM_LED_GPIOS: [u32; 3] = [20, 21, 7];

/// Low-stock warning LEDs, one per room.  Header pins 32, 33, 37.
pub const WARNING_LED_GPIOS: [u32; 3] = [12, 13, 26];

// ---------------------------------------------------------------------------
// Push-buttons (active-low, external pull-up)
// ---------------------------------------------------------------------------

/// "Add item" button.  Header pin 29.
pub const BUTTON_ADD_GPIO: u32 = 5;
/// "Remove item" button.  Header pin 31.
pub const BUTTON_REMOVE_GPIO: u32 = 6;
