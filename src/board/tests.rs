use super::*;

#[test]
fn test_stone_opponent() {
    assert_eq!(Stone::Black.opponent(), Stone::White);
    assert_eq!(Stone::White.opponent(), Stone::Black);
    assert_eq!(Stone::Empty.opponent(), Stone::Empty);
}

#[test]
fn test_pos_conversion() {
    let pos = Pos::new(7, 7); // Center
    assert_eq!(pos.to_index(), 7 * 15 + 7);
    assert_eq!(pos.to_index(), 112);

    let pos2 = Pos::from_index(112);
    assert_eq!(pos2, Pos::CENTER);
}

#[test]
fn test_pos_validity() {
    assert!(Pos::is_valid(0, 0));
    assert!(Pos::is_valid(14, 14));
    assert!(!Pos::is_valid(-1, 0));
    assert!(!Pos::is_valid(0, -1));
    assert!(!Pos::is_valid(15, 0));
    assert!(!Pos::is_valid(0, 15));
}

#[test]
fn test_pos_offset() {
    let p = Pos::new(0, 0);
    assert_eq!(p.offset(1, 1, 2), Some(Pos::new(2, 2)));
    assert_eq!(p.offset(0, -1, 1), None);
    assert_eq!(Pos::new(14, 14).offset(1, 0, 1), None);
}

#[test]
fn test_pos_notation() {
    assert_eq!(Pos::CENTER.to_string(), "h8");
    assert_eq!(Pos::new(14, 0).to_string(), "a1");
    assert_eq!(Pos::new(0, 14).to_string(), "o15");

    assert_eq!("h8".parse::<Pos>().unwrap(), Pos::CENTER);
    assert_eq!("A1".parse::<Pos>().unwrap(), Pos::new(14, 0));
    assert!("p1".parse::<Pos>().is_err());
    assert!("a0".parse::<Pos>().is_err());
    assert!("a16".parse::<Pos>().is_err());
    assert!("".parse::<Pos>().is_err());
}

#[test]
fn test_bitboard_basic() {
    let mut bb = Bitboard::new();
    assert!(bb.is_empty());
    bb.set(Pos::new(14, 14));
    bb.set(Pos::new(0, 0));
    assert_eq!(bb.count(), 2);
    assert!(bb.get(Pos::new(14, 14)));
    let ones: Vec<Pos> = bb.iter_ones().collect();
    assert_eq!(ones, vec![Pos::new(0, 0), Pos::new(14, 14)]);
    bb.clear(Pos::new(0, 0));
    assert_eq!(bb.count(), 1);
}

#[test]
fn test_board_place_remove() {
    let mut board = Board::new();
    assert!(board.is_board_empty());
    board.place_stone(Pos::CENTER, Stone::Black);
    assert_eq!(board.get(Pos::CENTER), Stone::Black);
    assert_eq!(board.stone_count(), 1);
    assert_eq!(board.side_to_move(), Stone::White);
    board.remove_stone(Pos::CENTER);
    assert!(board.is_board_empty());
    assert_eq!(board.side_to_move(), Stone::Black);
}

#[test]
fn test_board_play_rejects_occupied() {
    let mut board = Board::new();
    board.play(Pos::CENTER, Stone::Black).unwrap();
    assert!(board.play(Pos::CENTER, Stone::White).is_err());
    assert!(board.play(Pos::new(0, 0), Stone::Empty).is_err());
}

#[test]
fn test_candidate_moves() {
    let board = Board::new();
    assert_eq!(board.candidate_moves(2), vec![Pos::CENTER]);

    let mut board = Board::new();
    board.place_stone(Pos::new(0, 0), Stone::Black);
    // 3x3 corner block minus the stone itself
    assert_eq!(board.candidate_moves(2).len(), 8);
    assert_eq!(board.candidate_moves(1).len(), 3);
}

#[test]
fn test_board_rows_roundtrip() {
    let mut board = Board::new();
    board.place_stone(Pos::new(7, 7), Stone::Black);
    board.place_stone(Pos::new(6, 7), Stone::White);
    let rows = board.to_rows();
    assert_eq!(rows[7].chars().nth(7), Some('X'));
    assert_eq!(rows[6].chars().nth(7), Some('O'));
    assert_eq!(Board::from_rows(&rows).unwrap(), board);
}

#[test]
fn test_board_rows_rejects_garbage() {
    let rows = vec!["...............".to_string(); 14];
    assert!(Board::from_rows(&rows).is_err());

    let mut rows = vec!["...............".to_string(); 15];
    rows[3] = "......?........".to_string();
    assert!(Board::from_rows(&rows).is_err());
}

#[test]
fn test_board_serde_json() {
    let mut board = Board::new();
    board.place_stone(Pos::CENTER, Stone::Black);
    let json = serde_json::to_string(&board).unwrap();
    let back: Board = serde_json::from_str(&json).unwrap();
    assert_eq!(back, board);
}
