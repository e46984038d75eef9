//! Move representation and UCI move-string conversion.

use crate::piece::{Piece, PieceKind};
use crate::square::Square;
use std::fmt;

/// A single, immutable move.
///
/// `captured_piece` is populated for display/ordering convenience,
/// including for en passant where it holds the captured pawn even though
/// it did not stand on `to`. The authoritative source of truth during
/// `unmake` is always the position's history snapshot, not this field —
/// see `Position::unmake`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChessMove {
    pub from: Square,
    pub to: Square,
    pub moving_piece: Piece,
    pub captured_piece: Option<Piece>,
    pub is_castling: bool,
    pub promotion: Option<PieceKind>,
}

impl ChessMove {
    /// A quiet (non-capture, non-special) move.
    pub fn quiet(from: Square, to: Square, moving_piece: Piece) -> Self {
        Self {
            from,
            to,
            moving_piece,
            captured_piece: None,
            is_castling: false,
            promotion: None,
        }
    }

    /// A capturing move.
    pub fn capture(from: Square, to: Square, moving_piece: Piece, captured_piece: Piece) -> Self {
        Self {
            captured_piece: Some(captured_piece),
            ..Self::quiet(from, to, moving_piece)
        }
    }

    /// Parses the promotion letter used in UCI move strings (`q`, `r`,
    /// `b`, `n`, case-insensitive). Returns `None` on anything else.
    pub fn promotion_kind_from_letter(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'q' => Some(PieceKind::Queen),
            'r' => Some(PieceKind::Rook),
            'b' => Some(PieceKind::Bishop),
            'n' => Some(PieceKind::Knight),
            _ => None,
        }
    }

    /// The UCI promotion letter for a promotion kind.
    pub fn promotion_letter(kind: PieceKind) -> char {
        match kind {
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            _ => unreachable!("only Q/R/B/N are valid promotion kinds"),
        }
    }

    /// Renders the four- or five-character UCI move string
    /// (`<from><to>[<promotion>]`).
    pub fn to_uci(self) -> String {
        let mut s = format!("{}{}", self.from.to_algebraic(), self.to.to_algebraic());
        if let Some(kind) = self.promotion {
            s.push(Self::promotion_letter(kind));
        }
        s
    }
}

impl fmt::Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

/// Parses the `from`/`to`/promotion-letter portion of a UCI move string,
/// without reference to a board (no legality or even piece-presence check
/// — callers match this against `Position::generate_legal_moves`).
pub struct UciMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl UciMove {
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 4 && s.len() != 5 {
            return None;
        }
        let from = Square::from_algebraic(&s[0..2])?;
        let to = Square::from_algebraic(&s[2..4])?;
        let promotion = match s.len() {
            5 => Some(ChessMove::promotion_kind_from_letter(s.as_bytes()[4] as char)?),
            _ => None,
        };
        Some(UciMove { from, to, promotion })
    }
}
