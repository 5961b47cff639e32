//! Computer-keyboard piano layout: two rows, C4 up to F5.
//!
//! ```text
//!  w e   t y u   o p
//! a s d f g h j k l ; '
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColor {
    White,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteKey {
    pub key: char,
    pub name: &'static str,
    pub frequency: f32,
    pub color: KeyColor,
}

const fn white(key: char, name: &'static str, frequency: f32) -> NoteKey {
    NoteKey {
        key,
        name,
        frequency,
        color: KeyColor::White,
    }
}

const fn black(key: char, name: &'static str, frequency: f32) -> NoteKey {
    NoteKey {
        key,
        name,
        frequency,
        color: KeyColor::Black,
    }
}

/// Keys in pitch order.
pub const NOTE_KEYS: [NoteKey; 18] = [
    white('a', "C4", 261.63),
    black('w', "C#4", 277.18),
    white('s', "D4", 293.66),
    black('e', "D#4", 311.13),
    white('d', "E4", 329.63),
    white('f', "F4", 349.23),
    black('t', "F#4", 369.99),
    white('g', "G4", 392.0),
    black('y', "G#4", 415.3),
    white('h', "A4", 440.0),
    black('u', "A#4", 466.16),
    white('j', "B4", 493.88),
    white('k', "C5", 523.25),
    black('o', "C#5", 554.37),
    white('l', "D5", 587.33),
    black('p', "D#5", 622.25),
    white(';', "E5", 659.25),
    white('\'', "F5", 698.46),
];

/// Note bound to `key`, case-insensitive.
pub fn note_for_key(key: char) -> Option<&'static NoteKey> {
    let key = key.to_ascii_lowercase();
    NOTE_KEYS.iter().find(|n| n.key == key)
}

pub fn frequency_for_key(key: char) -> Option<f32> {
    note_for_key(key).map(|n| n.frequency)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_home_row() {
        assert_eq!(frequency_for_key('a'), Some(261.63));
        assert_eq!(frequency_for_key('H'), Some(440.0));
        assert_eq!(frequency_for_key('\''), Some(698.46));
        assert_eq!(frequency_for_key('z'), None);
    }

    #[test]
    fn keys_ascend_in_semitones() {
        for pair in NOTE_KEYS.windows(2) {
            let ratio = pair[1].frequency / pair[0].frequency;
            assert!((ratio - 2f32.powf(1.0 / 12.0)).abs() < 1e-3, "{} -> {}", pair[0].name, pair[1].name);
        }
    }

    #[test]
    fn eleven_white_keys() {
        let whites = NOTE_KEYS.iter().filter(|n| n.color == KeyColor::White).count();
        assert_eq!(whites, 11);
    }
}
