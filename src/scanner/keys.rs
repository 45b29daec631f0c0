//! Scancode translation for keyboard-like barcode/QR scanners
//!
//! Scanners in HID keyboard mode report plain Linux key codes. This table
//! covers the characters that can appear in a scanned code; anything else
//! (modifiers, function keys) is ignored by returning `None`.

/// Translate a Linux key code into the character a scanner intends.
///
/// Letters are reported uppercase, matching what the scanners emit.
/// `KEY_ENTER` maps to `'\n'`, which terminates the in-progress code.
pub fn char_for_code(code: u16) -> Option<char> {
    let ch = match code {
        2 => '1',
        3 => '2',
        4 => '3',
        5 => '4',
        6 => '5',
        7 => '6',
        8 => '7',
        9 => '8',
        10 => '9',
        11 => '0',
        12 => '-',
        13 => '=',
        16 => 'Q',
        17 => 'W',
        18 => 'E',
        19 => 'R',
        20 => 'T',
        21 => 'Y',
        22 => 'U',
        23 => 'I',
        24 => 'O',
        25 => 'P',
        26 => '[',
        27 => ']',
        28 => '\n',
        30 => 'A',
        31 => 'S',
        32 => 'D',
        33 => 'F',
        34 => 'G',
        35 => 'H',
        36 => 'J',
        37 => 'K',
        38 => 'L',
        39 => ';',
        40 => '"',
        41 => '`',
        43 => '\\',
        44 => 'Z',
        45 => 'X',
        46 => 'C',
        47 => 'V',
        48 => 'B',
        49 => 'N',
        50 => 'M',
        51 => ',',
        52 => '.',
        53 => '/',
        57 => ' ',
        _ => return None,
    };
    Some(ch)
}
