use dots_boxes_bot::ai::eval::utility;
use dots_boxes_bot::ai::{build_agent, AiConfig, AiDifficulty, AiStrategy};
use dots_boxes_bot::{Agent, Bot, BotError, DotsBot, GameAction, GameSnapshot, Move};
use dots_boxes_bot::{BoardState, MinimaxAgent, Orientation, Player, Tracer};

fn quiet(config: AiConfig) -> DotsBot {
    DotsBot::with_tracer(config, Tracer::silent())
}

#[test]
fn empty_board_basics() {
    let board = BoardState::new();
    assert_eq!(board.available_moves().len(), 24);
    assert!(!board.ended());
    assert_eq!(utility(&board, Player::First), 0);
    assert_eq!(utility(&board, Player::Second), 0);
}

#[test]
fn every_strategy_leaves_the_board_as_it_found_it() {
    for strategy in [AiStrategy::Minimax, AiStrategy::LocalSearch, AiStrategy::Random] {
        let mut board = BoardState::new();
        for mv in [Move::row(0, 0), Move::col(1, 2), Move::row(2, 1)] {
            board.play(mv).expect("edge is free");
        }
        let before = board.clone();
        let config = AiConfig {
            max_depth: Some(3),
            time_limit_ms: Some(5_000),
            seed: Some(17),
            ..AiConfig::default()
        }
        .with_strategy(strategy);

        let player = board.player_to_move();
        let decision = build_agent(&config)
            .search(&mut board, player, &Tracer::silent())
            .expect("search should succeed");

        assert_eq!(decision.strategy, strategy);
        assert!(!board.has_edge(decision.mv), "{strategy:?} chose a drawn edge");
        assert_eq!(board.move_count(), before.move_count());
        assert_eq!(board, before);
    }
}

#[test]
fn seeded_randomized_minimax_is_reproducible() {
    let config = AiConfig {
        max_depth: Some(2),
        time_limit_ms: None,
        randomize: true,
        seed: Some(99),
        ..AiConfig::default()
    };
    let mut board = BoardState::new();
    let a = MinimaxAgent::new(config.clone())
        .search(&mut board, Player::First, &Tracer::silent())
        .expect("search should succeed");
    let b = MinimaxAgent::new(config)
        .search(&mut board, Player::First, &Tracer::silent())
        .expect("search should succeed");
    assert_eq!(a.mv, b.mv);
    assert_eq!(a.score, b.score);
    assert_eq!(a.stats.nodes, b.stats.nodes);
}

#[test]
fn larger_boards_are_searched() {
    let mut board = BoardState::with_size(5, Player::Second).expect("5x5 is supported");
    let config = AiConfig {
        max_depth: Some(2),
        time_limit_ms: None,
        ..AiConfig::default()
    };
    let decision = MinimaxAgent::new(config)
        .search(&mut board, Player::Second, &Tracer::silent())
        .expect("search should succeed");
    assert!(board.play(decision.mv).is_ok());
}

#[test]
fn zero_budget_bot_still_moves_legally() {
    let mut board = BoardState::new();
    for mv in [Move::row(1, 1), Move::col(0, 2), Move::row(3, 0)] {
        board.play(mv).expect("edge is free");
    }
    let snapshot = GameSnapshot::from_board(&board);

    for difficulty in [AiDifficulty::Easy, AiDifficulty::Expert] {
        let config = AiConfig::from_difficulty(difficulty)
            .with_time_limit_ms(Some(0))
            .with_seed(5);
        let decided = quiet(config).decide(&snapshot).expect("bot should move");
        assert!(decided.decision.stats.fallback);
        assert!(!board.has_edge(decided.action.to_move()));
    }
}

#[test]
fn adapter_reads_the_external_json_format() {
    // Player 1 has completed the top-left box; player 2 to move. The
    // top-right box (screen x = 2, y = 0) is missing only its right edge.
    let json = r#"{
        "board_status": [[-4, 2, 3], [1, 0, 1], [0, 0, 0]],
        "row_status": [[1, 0, 1], [1, 0, 1], [0, 0, 0], [0, 0, 0]],
        "col_status": [[1, 1, 1, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
        "player1_turn": false
    }"#;
    let snapshot: GameSnapshot = serde_json::from_str(json).expect("snapshot should parse");
    let board = snapshot.to_board().expect("snapshot is consistent");
    assert_eq!(board.squares(Player::First), 1);
    assert_eq!(board.player_to_move(), Player::Second);

    let config = AiConfig {
        max_depth: Some(2),
        ..AiConfig::from_difficulty(AiDifficulty::Hard).with_seed(3)
    };
    let action = quiet(config).get_action(&snapshot).expect("bot should move");
    assert_eq!(
        action,
        GameAction {
            action_type: Orientation::Col,
            position: (3, 0),
        }
    );
    let wire = serde_json::to_string(&action).expect("action should serialize");
    assert_eq!(wire, r#"{"action_type":"col","position":[3,0]}"#);
}

#[test]
fn adapter_reports_invalid_and_finished_games() {
    let mut snapshot = GameSnapshot::empty(3);
    snapshot.board_status[1][1] = 4;
    let mut bot = quiet(AiConfig::default());
    assert!(matches!(
        bot.get_action(&snapshot),
        Err(BotError::InvalidSnapshot { .. })
    ));

    let mut board = BoardState::with_size(2, Player::First).expect("2x2 is supported");
    while let Some(&mv) = board.available_moves().first() {
        board.play(mv).expect("edge is free");
    }
    let finished = GameSnapshot::from_board(&board);
    assert_eq!(bot.get_action(&finished), Err(BotError::GameOver));
}
