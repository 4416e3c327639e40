//! Chain and loop decomposition of the open regions of a board.

use serde::Serialize;

use super::board::BoardState;
use super::state::Tile;

/// Tiles in walk order; the first and last entries are the endpoints.
pub type Chain = Vec<Tile>;

/// Partition of the chainable tiles into chains and loops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub chains: Vec<Chain>,
    pub loops: Vec<Chain>,
    size: usize,
    chain_part: Vec<bool>,
}

impl Analysis {
    /// True if the tile belongs to a retained chain or loop.
    pub fn is_chain_part(&self, tile: Tile) -> bool {
        tile.x < self.size && tile.y < self.size && self.chain_part[tile.x * self.size + tile.y]
    }

    pub fn chain_part_count(&self) -> usize {
        self.chain_part.iter().filter(|&&part| part).count()
    }
}

/// Decomposes the board. Seeds are taken in row-major order and every tile is
/// claimed by at most one chain; single tiles that never link up are dropped.
pub fn decompose(board: &BoardState) -> Analysis {
    let size = board.size();
    let mut unclaimed: Vec<bool> = board.tiles().map(|tile| board.chainable(tile)).collect();
    let mut analysis = Analysis {
        chains: Vec::new(),
        loops: Vec::new(),
        size,
        chain_part: vec![false; size * size],
    };

    for seed in board.tiles() {
        let slot = seed.x * size + seed.y;
        if !unclaimed[slot] {
            continue;
        }
        unclaimed[slot] = false;

        let chain = expand_chain(board, seed, &mut unclaimed);
        if chain.len() < 2 {
            continue;
        }
        for tile in &chain {
            analysis.chain_part[tile.x * size + tile.y] = true;
        }
        if is_loop(board, &chain) {
            analysis.loops.push(chain);
        } else {
            analysis.chains.push(chain);
        }
    }
    analysis
}

fn is_loop(board: &BoardState, chain: &[Tile]) -> bool {
    match (chain.first(), chain.last()) {
        (Some(&head), Some(&tail)) => chain.len() >= 4 && board.connected(head, tail),
        _ => false,
    }
}

/// Grows a chain from `seed`. A seed with two chainable neighbours sits inside
/// its chain, so the walk runs twice, reversing in between so the second pass
/// extends the other end.
fn expand_chain(board: &BoardState, seed: Tile, unclaimed: &mut [bool]) -> Chain {
    let size = board.size();
    let passes = board
        .neighbors(seed)
        .into_iter()
        .flatten()
        .filter(|&tile| board.chainable(tile))
        .take(2)
        .count();

    let mut chain = vec![seed];
    for _ in 0..passes {
        let mut tile = seed;
        loop {
            let step = board.neighbors(tile).into_iter().flatten().find(|&next| {
                unclaimed[next.x * size + next.y]
                    && board.connected(tile, next)
                    && board.chainable(next)
            });
            let Some(next) = step else {
                break;
            };
            unclaimed[next.x * size + next.y] = false;
            chain.push(next);
            tile = next;
        }
        chain.reverse();
    }
    chain
}
