//! Translation from engine-native moves to display notation.

use cozy_chess::{Board, File, GameStatus, Move, Piece, Rank, Square};

/// Translate an engine line into standard algebraic notation.
///
/// Moves are applied in order starting from `position`. Translation stops
/// silently at the first move that is not legal there and returns the
/// prefix translated so far: engine lines can outrun the displayed board's
/// rules on promotion and castling edge cases, and a truncated line beats
/// surfacing a protocol mismatch to the caller.
pub fn translate_line(moves: &[Move], position: &Board) -> Vec<String> {
    let mut board = position.clone();
    let mut translated = Vec::with_capacity(moves.len());

    for &mv in moves {
        let legal = legal_moves(&board);
        let mv = convert_uci_castling(&board, mv, &legal);
        if !legal.contains(&mv) {
            break;
        }
        translated.push(format_san(&board, mv));
        board.play(mv);
    }

    translated
}

/// Convert engine castling form (king moves two files: e1g1) to the rules
/// engine's king-takes-rook form (e1h1), when that is what the move is.
pub fn convert_uci_castling(board: &Board, mv: Move, legal_moves: &[Move]) -> Move {
    if board.piece_on(mv.from) != Some(Piece::King) {
        return mv;
    }

    let on_home_rank = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let from_e_file = mv.from.file() == File::E;
    let to_castle_file = matches!(mv.to.file(), File::G | File::C);

    if on_home_rank && from_e_file && to_castle_file && mv.promotion.is_none() {
        let rook_file = if mv.to.file() == File::G {
            File::H
        } else {
            File::A
        };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };
        if legal_moves.contains(&converted) {
            return converted;
        }
    }

    mv
}

/// Format one legal move as SAN. Falls back to plain coordinates if the
/// from-square is empty (the move cannot be interpreted on this board).
pub fn format_san(board: &Board, mv: Move) -> String {
    let side = board.side_to_move();
    let piece = match board.piece_on(mv.from) {
        Some(piece) => piece,
        None => return format!("{}{}", square_str(mv.from), square_str(mv.to)),
    };

    let mut san = if piece == Piece::King && board.color_on(mv.to) == Some(side) {
        // King onto its own rook: castling.
        if (mv.to.file() as usize) > (mv.from.file() as usize) {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        }
    } else if piece == Piece::Pawn {
        // A file change with an empty target is en passant, still a capture.
        let capture = board.piece_on(mv.to).is_some() || mv.from.file() != mv.to.file();
        let mut s = String::new();
        if capture {
            s.push(file_char(mv.from.file()));
            s.push('x');
        }
        s.push_str(&square_str(mv.to));
        if let Some(promotion) = mv.promotion {
            s.push('=');
            s.push(piece_char(promotion));
        }
        s
    } else {
        let mut s = String::new();
        s.push(piece_char(piece));
        s.push_str(&disambiguate(board, mv, piece));
        if board.piece_on(mv.to).is_some() {
            s.push('x');
        }
        s.push_str(&square_str(mv.to));
        s
    };

    let mut after = board.clone();
    after.play(mv);
    if !after.checkers().is_empty() {
        san.push(if after.status() == GameStatus::Won {
            '#'
        } else {
            '+'
        });
    }

    san
}

/// Minimal SAN disambiguation: nothing if no other piece of the same kind
/// reaches the target, else file, else rank, else both.
fn disambiguate(board: &Board, mv: Move, piece: Piece) -> String {
    let mut ambiguous = false;
    let mut shares_file = false;
    let mut shares_rank = false;

    for other in legal_moves(board) {
        if other.to != mv.to || other.from == mv.from {
            continue;
        }
        if board.piece_on(other.from) != Some(piece) {
            continue;
        }
        ambiguous = true;
        if other.from.file() == mv.from.file() {
            shares_file = true;
        }
        if other.from.rank() == mv.from.rank() {
            shares_rank = true;
        }
    }

    if !ambiguous {
        String::new()
    } else if !shares_file {
        file_char(mv.from.file()).to_string()
    } else if !shares_rank {
        rank_char(mv.from.rank()).to_string()
    } else {
        format!("{}{}", file_char(mv.from.file()), rank_char(mv.from.rank()))
    }
}

fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    board.generate_moves(|piece_moves| {
        moves.extend(piece_moves);
        false
    });
    moves
}

fn file_char(file: File) -> char {
    match file {
        File::A => 'a',
        File::B => 'b',
        File::C => 'c',
        File::D => 'd',
        File::E => 'e',
        File::F => 'f',
        File::G => 'g',
        File::H => 'h',
    }
}

fn rank_char(rank: Rank) -> char {
    match rank {
        Rank::First => '1',
        Rank::Second => '2',
        Rank::Third => '3',
        Rank::Fourth => '4',
        Rank::Fifth => '5',
        Rank::Sixth => '6',
        Rank::Seventh => '7',
        Rank::Eighth => '8',
    }
}

fn square_str(square: Square) -> String {
    format!("{}{}", file_char(square.file()), rank_char(square.rank()))
}

fn piece_char(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}
