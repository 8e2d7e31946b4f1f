use super::{Error, Kind};
use crate::Grid;

// Input digits encode stubs as bit 0 = N, bit 1 = E, bit 2 = S, bit 3 = W.
// Only the popcount (plus the opposite-stubs straight case) matters: the
// solver reconsiders every rotation anyway.
pub fn kind_from_char(c: char) -> Result<Kind, Error> {
    let stubs = match c {
        '0'..='9' => c as u8 - b'0',
        'a'..='f' => c as u8 - b'a' + 10,
        'A'..='F' => c as u8 - b'A' + 10,
        _ => return Err(Error::BadChar(c)),
    };
    kind_from_stubs(stubs).ok_or(Error::BadChar(c))
}

pub(crate) fn kind_from_stubs(stubs: u8) -> Option<Kind> {
    match (stubs, stubs.count_ones()) {
        (0, _) => Some(Kind::Empty),
        (_, 1) => Some(Kind::Deadend),
        (0b0101, _) | (0b1010, _) => Some(Kind::Line),
        (_, 2) => Some(Kind::Elbow),
        (_, 3) => Some(Kind::Tee),
        _ => None,
    }
}

pub fn decode(width: i32, height: i32, raw: &str) -> Result<Grid<Kind>, Error> {
    if width <= 0 || height <= 0 {
        return Err(Error::BadSize);
    }
    let expected = width as usize * height as usize;
    let actual = raw.chars().count();
    if actual != expected {
        return Err(Error::BadLength { expected, actual });
    }
    let mut kinds = Grid::new(height, width, Kind::Empty);
    for (i, c) in raw.chars().enumerate() {
        kinds[i] = kind_from_char(c)?;
    }
    Ok(kinds)
}
