// Linux key code module
// evdev key codes (linux/input-event-codes.h) split by the hand that types them

#![allow(dead_code)]

pub const KEY_ESC: u16 = 1;
pub const KEY_1: u16 = 2;
pub const KEY_5: u16 = 6;
pub const KEY_6: u16 = 7;
pub const KEY_0: u16 = 11;
pub const KEY_MINUS: u16 = 12;
pub const KEY_EQUAL: u16 = 13;
pub const KEY_BACKSPACE: u16 = 14;
pub const KEY_TAB: u16 = 15;
pub const KEY_Q: u16 = 16;
pub const KEY_E: u16 = 18;
pub const KEY_T: u16 = 20;
pub const KEY_Y: u16 = 21;
pub const KEY_I: u16 = 23;
pub const KEY_P: u16 = 25;
pub const KEY_LEFTBRACE: u16 = 26;
pub const KEY_RIGHTBRACE: u16 = 27;
pub const KEY_ENTER: u16 = 28;
pub const KEY_LEFTCTRL: u16 = 29;
pub const KEY_A: u16 = 30;
pub const KEY_G: u16 = 34;
pub const KEY_H: u16 = 35;
pub const KEY_J: u16 = 36;
pub const KEY_L: u16 = 38;
pub const KEY_APOSTROPHE: u16 = 40;
pub const KEY_GRAVE: u16 = 41;
pub const KEY_LEFTSHIFT: u16 = 42;
pub const KEY_BACKSLASH: u16 = 43;
pub const KEY_Z: u16 = 44;
pub const KEY_B: u16 = 48;
pub const KEY_N: u16 = 49;
pub const KEY_SLASH: u16 = 53;
pub const KEY_RIGHTSHIFT: u16 = 54;
pub const KEY_KPASTERISK: u16 = 55;
pub const KEY_LEFTALT: u16 = 56;
pub const KEY_SPACE: u16 = 57;
pub const KEY_CAPSLOCK: u16 = 58;
pub const KEY_F1: u16 = 59;
pub const KEY_F6: u16 = 64;
pub const KEY_F7: u16 = 65;
pub const KEY_F10: u16 = 68;
pub const KEY_F11: u16 = 87;
pub const KEY_F12: u16 = 88;

/// Keys typed with the left hand. Space counts as left.
pub fn is_left_hand_key(code: u16) -> bool {
    matches!(
        code,
        KEY_ESC
            | KEY_GRAVE
            | KEY_TAB
            | KEY_CAPSLOCK
            | KEY_LEFTSHIFT
            | KEY_LEFTCTRL
            | KEY_LEFTALT
            | KEY_SPACE
            | KEY_1..=KEY_5
            | KEY_Q..=KEY_T
            | KEY_A..=KEY_G
            | KEY_Z..=KEY_B
            | KEY_F1..=KEY_F6
    )
}

/// Keys typed with the right hand
pub fn is_right_hand_key(code: u16) -> bool {
    matches!(
        code,
        KEY_BACKSPACE
            | KEY_ENTER
            | KEY_RIGHTSHIFT
            | KEY_BACKSLASH
            | KEY_6..=KEY_0
            | KEY_MINUS
            | KEY_EQUAL
            | KEY_Y..=KEY_P
            | KEY_LEFTBRACE
            | KEY_RIGHTBRACE
            | KEY_H..=KEY_APOSTROPHE
            | KEY_N..=KEY_SLASH
            | KEY_F7..=KEY_F10
            | KEY_F11
            | KEY_F12
    )
}

/// Human-readable name for common keys, used in trace logs
pub fn key_name(code: u16) -> Option<&'static str> {
    const LETTERS: &[(u16, &str)] = &[
        (16, "Q"), (17, "W"), (18, "E"), (19, "R"), (20, "T"),
        (21, "Y"), (22, "U"), (23, "I"), (24, "O"), (25, "P"),
        (30, "A"), (31, "S"), (32, "D"), (33, "F"), (34, "G"),
        (35, "H"), (36, "J"), (37, "K"), (38, "L"),
        (44, "Z"), (45, "X"), (46, "C"), (47, "V"), (48, "B"),
        (49, "N"), (50, "M"),
    ];
    match code {
        KEY_ESC => Some("ESC"),
        KEY_SPACE => Some("SPACE"),
        KEY_ENTER => Some("ENTER"),
        KEY_BACKSPACE => Some("BACKSPACE"),
        KEY_TAB => Some("TAB"),
        KEY_LEFTSHIFT => Some("LSHIFT"),
        KEY_RIGHTSHIFT => Some("RSHIFT"),
        KEY_LEFTCTRL => Some("LCTRL"),
        KEY_LEFTALT => Some("LALT"),
        _ => LETTERS
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| *name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_rows_split_between_hands() {
        for code in [KEY_A, 31, 32, 33, KEY_G] {
            assert!(is_left_hand_key(code) && !is_right_hand_key(code), "{code}");
        }
        for code in [KEY_H, KEY_J, 37, KEY_L, 39, KEY_APOSTROPHE] {
            assert!(is_right_hand_key(code) && !is_left_hand_key(code), "{code}");
        }
    }

    #[test]
    fn function_keys_split_at_f6() {
        assert!(is_left_hand_key(KEY_F6));
        assert!(is_right_hand_key(KEY_F7));
        assert!(is_right_hand_key(KEY_F12));
        assert!(!is_left_hand_key(KEY_F11));
    }

    #[test]
    fn space_is_left_and_keypad_is_neither() {
        assert!(is_left_hand_key(KEY_SPACE));
        assert!(!is_right_hand_key(KEY_SPACE));
        assert!(!is_left_hand_key(KEY_KPASTERISK));
        assert!(!is_right_hand_key(KEY_KPASTERISK));
    }

    #[test]
    fn names_cover_letters() {
        assert_eq!(key_name(KEY_Q), Some("Q"));
        assert_eq!(key_name(50), Some("M"));
        assert_eq!(key_name(KEY_SPACE), Some("SPACE"));
        assert_eq!(key_name(999), None);
    }
}
