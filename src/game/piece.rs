use serde::{Deserialize, Serialize};

/// One of the 16 Quarto pieces, encoded as 4 attribute bits
/// (tall/short, light/dark, square/round, solid/hollow).
#[derive(Debug, Clone, PartialEq, Copy, Hash, Eq, Serialize, Deserialize)]
pub struct Piece(pub u8);

impl Piece {
    pub const COUNT: usize = 16;
    const ATTR_MASK: u8 = 0b1111;

    pub fn all() -> Vec<Piece> {
        (0..Self::COUNT as u8).map(Piece).collect()
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// True when the four pieces agree on at least one attribute,
    /// either all set or all clear.
    pub fn share_attribute(pieces: [Piece; 4]) -> bool {
        let all_set = pieces.iter().fold(Self::ATTR_MASK, |acc, p| acc & p.0);
        let all_clear = pieces
            .iter()
            .fold(Self::ATTR_MASK, |acc, p| acc & (!p.0 & Self::ATTR_MASK));
        all_set != 0 || all_clear != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_pieces_are_distinct() {
        let pieces = Piece::all();
        assert_eq!(pieces.len(), 16);
        for (i, p) in pieces.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
    }

    #[test]
    fn shared_attribute_detected_on_common_set_bit() {
        // All four have bit 0 set
        assert!(Piece::share_attribute([
            Piece(0b0001),
            Piece(0b0011),
            Piece(0b0101),
            Piece(0b1001),
        ]));
    }

    #[test]
    fn shared_attribute_detected_on_common_clear_bit() {
        // Bit 3 clear on all four, every other bit mixed
        assert!(Piece::share_attribute([
            Piece(0b0001),
            Piece(0b0010),
            Piece(0b0100),
            Piece(0b0111),
        ]));
    }

    #[test]
    fn no_shared_attribute() {
        // Each attribute is set on some pieces and clear on others
        assert!(!Piece::share_attribute([
            Piece(0b0000),
            Piece(0b0011),
            Piece(0b1101),
            Piece(0b1110),
        ]));
    }
}
