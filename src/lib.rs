pub mod ai;
pub mod bot;
pub mod game;
pub mod trace;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use ai::{
    Agent, AiConfig, AiDifficulty, AiStrategy, Decision, LocalSearchAgent, MinimaxAgent,
    RandomAgent, Role, SearchError, SearchStats,
};
pub use bot::{Bot, BotDecision, BotError, DotsBot};
pub use game::{
    BoardError, BoardState, GameAction, GameSnapshot, Move, Orientation, Player, Position,
    SnapshotError, Tile,
};
pub use trace::{LogSink, MemorySink, TraceConfig, TraceLevel, TraceSink, Tracer};
