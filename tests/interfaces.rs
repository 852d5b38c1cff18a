//! End-to-end checks of the two public interfaces: evaluate one position and
//! play one game.

use renju::book::{from_offset, Jushu};
use renju::eval::opening_bonus;
use renju::{
    check_winner, classify_opening, evaluate, evaluate_move, play_game, Board, Difficulty,
    EngineParams, EvaluateRequest, GameRequest, PatternWeights, PlayerConfig, Pos, SearchLimits,
    SearchType, Stone, Termination, ThreatLimits,
};

fn fast_player(randomization: f64) -> PlayerConfig {
    PlayerConfig {
        difficulty: Difficulty::Beginner,
        params: EngineParams {
            search: Some(SearchLimits {
                search_depth: 1,
                time_limit_ms: 0,
                node_limit: 3_000,
                randomization,
            }),
            threats: Some(ThreatLimits {
                time_limit_ms: 0,
                node_limit: 3_000,
                enable_vct: false,
                enable_mise: false,
                ..ThreatLimits::default()
            }),
            tt_size_mb: 1,
            ..EngineParams::default()
        },
    }
}

#[test]
fn empty_board_black_plays_center() {
    for difficulty in Difficulty::ALL {
        let res = evaluate_move(&EvaluateRequest::new(Board::new(), Stone::Black, difficulty));
        assert_eq!(res.position, Some(Pos::new(7, 7)), "difficulty {difficulty}");
    }
}

#[test]
fn json_request_round_trip() {
    let mut rows = vec![".".repeat(15); 15];
    rows[7].replace_range(7..8, "X");
    let json = serde_json::json!({
        "board": rows,
        "side_to_move": "white",
        "difficulty": "beginner",
    });
    let req: EvaluateRequest = serde_json::from_value(json).unwrap();
    assert_eq!(req.board.get(Pos::CENTER), Stone::Black);

    let res = evaluate_move(&req);
    let pos = res.position.expect("white has a reply");
    assert_eq!(res.search_type, SearchType::Book);
    assert_eq!(pos.center_distance(), 1, "book reply {pos} touches the center");

    let out = serde_json::to_value(&res).unwrap();
    assert_eq!(out["search_type"], "book");
}

#[test]
fn seventy_ply_game_without_five_is_move_limit() {
    let req = GameRequest {
        black: fast_player(0.4),
        white: fast_player(0.4),
        max_moves: 70,
        seed: 2024,
        min_think_ms: 0,
    };
    let record = play_game(&req);
    assert_ne!(record.termination, Termination::Forbidden, "black never plays forbidden");

    match record.termination {
        Termination::Five => {
            let winner = record.winner.expect("five has a winner");
            assert_eq!(check_winner(&record.board), Some(winner));
            assert_eq!(record.moves.last().map(|m| m.color), Some(winner));
        }
        other => {
            assert_eq!(other, Termination::MoveLimit);
            assert_eq!(record.winner, None);
            assert_eq!(record.moves.len(), 70);
            assert_eq!(check_winner(&record.board), None);
        }
    }

    let json = serde_json::to_value(&record).unwrap();
    assert!(json["termination"] == "five" || json["termination"] == "move_limit");
}

#[test]
fn kagetsu_bonus_is_exact_and_symmetric() {
    let mut board = Board::new();
    board.place_stone(Pos::CENTER, Stone::Black);
    let white = from_offset(Jushu::Kagetsu.kind().white_offset()).unwrap();
    let black = from_offset(Jushu::Kagetsu.black_offset()).unwrap();
    board.place_stone(white, Stone::White);
    board.place_stone(black, Stone::Black);
    assert_eq!(classify_opening(&board), Some(Jushu::Kagetsu));

    let base = PatternWeights::default().with_opening(Jushu::Kagetsu, 0);
    let tuned = base.with_opening(Jushu::Kagetsu, 321);
    assert_eq!(opening_bonus(&board, Stone::Black, &tuned), 321);
    assert_eq!(opening_bonus(&board, Stone::White, &tuned), -321);
    assert_eq!(
        evaluate(&board, Stone::Black, &tuned) - evaluate(&board, Stone::Black, &base),
        321
    );
    assert_eq!(
        evaluate(&board, Stone::White, &tuned) - evaluate(&board, Stone::White, &base),
        -321
    );
}
