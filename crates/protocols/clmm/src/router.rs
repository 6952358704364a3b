//! Pool Graph: Routing Paths Between Token Mints
//!
//! Pure connectivity index over pools. Answers direct and two-hop path
//! queries between token mints so callers can chain two swap quotes. The
//! graph never looks at price or liquidity; ranking discovered paths is left
//! to the caller.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use quoter_core::types::pubkey_string;
use quoter_core::Pubkey;

/// Longest path the graph answers
pub const MAX_PATH_HOPS: usize = 2;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A pool as a graph edge. Mints are kept in canonical order, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolTokenPair {
    #[serde(with = "pubkey_string")]
    pub address: Pubkey,
    #[serde(with = "pubkey_string")]
    pub token_mint_a: Pubkey,
    #[serde(with = "pubkey_string")]
    pub token_mint_b: Pubkey,
}

impl PoolTokenPair {
    pub fn new(address: Pubkey, mint_x: Pubkey, mint_y: Pubkey) -> Self {
        let (token_mint_a, token_mint_b) = if mint_x <= mint_y {
            (mint_x, mint_y)
        } else {
            (mint_y, mint_x)
        };
        Self {
            address,
            token_mint_a,
            token_mint_b,
        }
    }

    /// The mint on the other side of `mint`, if the pool holds it
    pub fn other_mint(&self, mint: &Pubkey) -> Option<Pubkey> {
        if *mint == self.token_mint_a {
            Some(self.token_mint_b)
        } else if *mint == self.token_mint_b {
            Some(self.token_mint_a)
        } else {
            None
        }
    }

    fn canonical(&self) -> Self {
        Self::new(self.address, self.token_mint_a, self.token_mint_b)
    }
}

/// Ordered pools leading from `start_token_mint` to `end_token_mint`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    #[serde(with = "pubkey_string")]
    pub start_token_mint: Pubkey,
    #[serde(with = "pubkey_string")]
    pub end_token_mint: Pubkey,
    pub edges: Vec<PoolTokenPair>,
}

/// All paths found for one token pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairPaths {
    #[serde(with = "pubkey_string")]
    pub start_token_mint: Pubkey,
    #[serde(with = "pubkey_string")]
    pub end_token_mint: Pubkey,
    pub paths: Vec<Path>,
}

/// A directed traversal of a pool
#[derive(Debug, Clone, Copy)]
struct PoolEdge {
    pool: PoolTokenPair,
    token_out: Pubkey,
}

/// Adjacency-list pool graph keyed by mint.
#[derive(Debug, Clone, Default)]
pub struct PoolGraph {
    adjacency: HashMap<Pubkey, Vec<PoolEdge>>,
    pool_count: usize,
}

// ---------------------------------------------------------------------------
// Graph Construction
// ---------------------------------------------------------------------------

impl PoolGraph {
    /// Index `pools`, keeping the first entry for each pool address.
    /// Pools whose two mints are equal cannot route anything and are skipped.
    pub fn build(pools: &[PoolTokenPair]) -> Self {
        let mut adjacency: HashMap<Pubkey, Vec<PoolEdge>> = HashMap::new();
        let mut seen: HashSet<Pubkey> = HashSet::new();
        let mut pool_count = 0;

        for pool in pools {
            if pool.token_mint_a == pool.token_mint_b || !seen.insert(pool.address) {
                continue;
            }
            let pool = pool.canonical();

            adjacency
                .entry(pool.token_mint_a)
                .or_default()
                .push(PoolEdge {
                    pool,
                    token_out: pool.token_mint_b,
                });
            adjacency
                .entry(pool.token_mint_b)
                .or_default()
                .push(PoolEdge {
                    pool,
                    token_out: pool.token_mint_a,
                });

            pool_count += 1;
        }

        tracing::debug!(
            "Built pool graph: {} pools, {} mints ({} duplicates dropped)",
            pool_count,
            adjacency.len(),
            pools.len() - pool_count
        );

        Self {
            adjacency,
            pool_count,
        }
    }

    pub fn pool_count(&self) -> usize {
        self.pool_count
    }

    /// Every mint with at least one pool, in canonical order
    pub fn token_mints(&self) -> Vec<Pubkey> {
        let mints: BTreeSet<Pubkey> = self.adjacency.keys().copied().collect();
        mints.into_iter().collect()
    }

    // -----------------------------------------------------------------------
    // Path Finding
    // -----------------------------------------------------------------------

    /// Direct and two-hop paths from `start` to `end`.
    ///
    /// Direct paths come first. When `intermediate_tokens` is given, two-hop
    /// paths are limited to those middle mints. A mint has no path to itself.
    pub fn get_path(
        &self,
        start: &Pubkey,
        end: &Pubkey,
        intermediate_tokens: Option<&[Pubkey]>,
    ) -> Vec<Path> {
        if start == end {
            return Vec::new();
        }

        let mut results: Vec<Path> = Vec::new();

        type SearchState = (Pubkey, Vec<PoolTokenPair>, HashSet<Pubkey>);
        let mut queue: VecDeque<SearchState> = VecDeque::new();
        queue.push_back((*start, Vec::new(), HashSet::from([*start])));

        while let Some((current, edges_so_far, visited)) = queue.pop_front() {
            let Some(edges) = self.adjacency.get(&current) else {
                continue;
            };
            for edge in edges {
                if edge.token_out == *end {
                    let mut path_edges = edges_so_far.clone();
                    path_edges.push(edge.pool);
                    results.push(Path {
                        start_token_mint: *start,
                        end_token_mint: *end,
                        edges: path_edges,
                    });
                } else if edges_so_far.len() + 1 < MAX_PATH_HOPS
                    && !visited.contains(&edge.token_out)
                    && intermediate_tokens.map_or(true, |allowed| allowed.contains(&edge.token_out))
                {
                    let mut visited = visited.clone();
                    visited.insert(edge.token_out);
                    let mut path_edges = edges_so_far.clone();
                    path_edges.push(edge.pool);
                    queue.push_back((edge.token_out, path_edges, visited));
                }
            }
        }

        results
    }

    /// Answer several directed queries, one result per query in input order.
    pub fn get_paths_for_pairs(
        &self,
        pairs: &[(Pubkey, Pubkey)],
        intermediate_tokens: Option<&[Pubkey]>,
    ) -> Vec<PairPaths> {
        pairs
            .iter()
            .map(|(start, end)| PairPaths {
                start_token_mint: *start,
                end_token_mint: *end,
                paths: self.get_path(start, end, intermediate_tokens),
            })
            .collect()
    }

    /// Paths for every unordered pair of connected mints, lower mint first.
    pub fn get_all_paths(&self) -> Vec<PairPaths> {
        let mints = self.token_mints();
        let mut all = Vec::new();
        for (i, start) in mints.iter().enumerate() {
            for end in &mints[i + 1..] {
                let paths = self.get_path(start, end, None);
                if !paths.is_empty() {
                    all.push(PairPaths {
                        start_token_mint: *start,
                        end_token_mint: *end,
                        paths,
                    });
                }
            }
        }
        all
    }
}
