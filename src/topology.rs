//! Pin topology of the Jetson 40-pin expansion header.
//!
//! Only the 22 header pins routed to general purpose I/O lines are usable.
//! Each is known by its chip GPIO number (the line offset on the GPIO chip)
//! and by its physical board pin number.

/// Chip GPIO number to board pin number, in board pin order.
pub const CHIP_TO_BOARD: [(u32, u32); PIN_COUNT] = [
    (216, 7),
    (50, 11),
    (79, 12),
    (14, 13),
    (194, 15),
    (232, 16),
    (15, 18),
    (16, 19),
    (17, 21),
    (13, 22),
    (18, 23),
    (19, 24),
    (20, 26),
    (149, 29),
    (200, 31),
    (168, 32),
    (38, 33),
    (76, 35),
    (51, 36),
    (12, 37),
    (77, 38),
    (78, 40),
];

pub const PIN_COUNT: usize = 22;

pub fn is_valid_chip(pin: u32) -> bool {
    CHIP_TO_BOARD.iter().any(|&(chip, _)| chip == pin)
}

pub fn is_valid_board(pin: u32) -> bool {
    CHIP_TO_BOARD.iter().any(|&(_, board)| board == pin)
}

/// Board pin wired to the given chip GPIO number.
pub fn chip_to_board(chip: u32) -> Option<u32> {
    CHIP_TO_BOARD
        .iter()
        .find(|&&(c, _)| c == chip)
        .map(|&(_, board)| board)
}

/// Chip GPIO number (line offset) behind the given board pin.
pub fn board_to_chip(board: u32) -> Option<u32> {
    CHIP_TO_BOARD
        .iter()
        .find(|&&(_, b)| b == board)
        .map(|&(chip, _)| chip)
}
