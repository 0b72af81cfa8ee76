//! Monte Carlo Tree Search (MCTS) with UCT node selection.
//!
//! Unlike textbook MCTS there is no random rollout phase: every simulate
//! pass descends node by node, expanding each unexpanded node it reaches,
//! until it arrives at a leaf position whose piece count decides the result. That result is then propagated back up,
//! negated at every ply.
//!
//! The tree lives in an arena (`Vec<TreeNode>` addressed by [`NodeId`]) and is
//! rebuilt from scratch by every search; nothing is reused between moves.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::board::Point;
use crate::constants::{N_ITERATIONS, UCT_EXPLORATION};
use crate::position::{GameState, Move, str_coord};

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// A node in the search tree.
///
/// `value_sum` is accumulated from the point of view of the player who made
/// the move into this node.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Parent node index (NONE for root)
    pub parent: NodeId,
    /// Move that led here from the parent (None for root)
    pub mv: Option<Move>,
    /// Children in creation order; empty until expanded
    pub children: Vec<NodeId>,
    /// Number of simulate passes through this node
    pub visits: u32,
    /// Sum of results backed up through this node
    pub value_sum: f64,
}

impl TreeNode {
    fn new(parent: NodeId, mv: Option<Move>) -> Self {
        Self {
            parent,
            mv,
            children: Vec::new(),
            visits: 0,
            value_sum: 0.0,
        }
    }

    /// Mean result, or 0.0 if never visited.
    #[inline]
    pub fn mean_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / self.visits as f64
        }
    }

    /// UCT score as seen from the parent.
    ///
    /// Unvisited nodes score positive infinity so every child is tried once
    /// before any is revisited. Takes `ln(parent visits)` precomputed.
    #[inline]
    pub fn uct_score(&self, parent_visits_ln: f64, exploration: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let n = self.visits as f64;
        self.mean_value() + (exploration * parent_visits_ln / n).sqrt()
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Search tree with arena-based node storage.
#[derive(Debug)]
pub struct SearchTree {
    nodes: Vec<TreeNode>,
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTree {
    /// Create a tree holding only a root with no move.
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::new(NodeId::NONE, None)],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a child of `parent` reached by `mv`.
    pub fn add_child(&mut self, parent: NodeId, mv: Move) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(TreeNode::new(parent, Some(mv)));
        self.get_mut(parent).children.push(id);
        id
    }

    /// Record one pass through `id` that produced `value`.
    pub fn update(&mut self, id: NodeId, value: f64) {
        let node = self.get_mut(id);
        node.visits += 1;
        node.value_sum += value;
    }

    /// Pick the child with the strictly greatest UCT score.
    /// Ties go to the earliest-created child.
    pub fn select_child(&self, id: NodeId, exploration: f64) -> Option<NodeId> {
        let node = self.get(id);
        let parent_visits_ln = (node.visits.max(1) as f64).ln();

        let mut best = None;
        let mut best_score = f64::NEG_INFINITY;
        for &child in &node.children {
            let score = self.get(child).uct_score(parent_visits_ln, exploration);
            if best.is_none() || score > best_score {
                best = Some(child);
                best_score = score;
            }
        }
        best
    }

    /// The most visited child of `id`; ties go to the earliest-created child.
    pub fn most_visited_child(&self, id: NodeId) -> Option<NodeId> {
        let mut best: Option<NodeId> = None;
        for &child in &self.get(id).children {
            match best {
                Some(b) if self.get(child).visits <= self.get(b).visits => {}
                _ => best = Some(child),
            }
        }
        best
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root());
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visits,
            max_depth: self.compute_max_depth(self.root(), 0),
        }
    }

    fn compute_max_depth(&self, id: NodeId, depth: u32) -> u32 {
        self.get(id)
            .children
            .iter()
            .map(|&c| self.compute_max_depth(c, depth + 1))
            .max()
            .unwrap_or(depth)
    }
}

/// Statistics about a search tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub max_depth: u32,
}

/// Which positions end a simulate pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeafRule {
    /// Stop only when neither player can move; a blocked mover passes.
    #[default]
    GameOver,
    /// Stop as soon as the player to move has no placement, even if the
    /// opponent could still play after a pass.
    MoverBlocked,
}

impl LeafRule {
    pub fn is_leaf(self, state: &GameState) -> bool {
        match self {
            LeafRule::GameOver => state.is_terminal(),
            LeafRule::MoverBlocked => state.is_blocked(),
        }
    }
}

/// Configuration for a search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of simulate passes per search.
    pub iterations: usize,
    /// Exploration constant `c` in `sqrt(c * ln(N) / n)`.
    pub exploration: f64,
    /// Leaf condition for simulate passes.
    pub leaf_rule: LeafRule,
    /// Optional wall-clock limit, checked between passes.
    pub time_limit: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: N_ITERATIONS,
            exploration: UCT_EXPLORATION,
            leaf_rule: LeafRule::default(),
            time_limit: None,
        }
    }
}

impl SearchConfig {
    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    pub fn with_leaf_rule(mut self, rule: LeafRule) -> Self {
        self.leaf_rule = rule;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

/// Result of a search run.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Most visited root placement, or None if the mover has none
    pub best_move: Option<Point>,
    /// Simulate passes actually performed
    pub iterations: usize,
    pub tree: TreeStats,
}

/// Per-move statistics at the root.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildSummary {
    pub mv: Move,
    pub visits: u32,
    pub mean_value: f64,
}

/// UCT search over a private copy of a game position.
pub struct SearchEngine {
    /// Position the search starts from; never mutated
    root_state: GameState,
    /// Working position, reset from `root_state` before every pass
    scratch: GameState,
    tree: SearchTree,
    config: SearchConfig,
}

impl SearchEngine {
    /// Search `state` with `iterations` passes and default settings.
    pub fn new(state: GameState, iterations: usize) -> Self {
        Self::with_config(state, SearchConfig::default().with_iterations(iterations))
    }

    pub fn with_config(state: GameState, config: SearchConfig) -> Self {
        Self {
            scratch: state.clone(),
            root_state: state,
            tree: SearchTree::new(),
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Tree built by the most recent search.
    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    /// Run the search and return the most visited placement, or None when
    /// the player to move has no legal placement.
    pub fn search(&mut self) -> Option<Point> {
        self.run().best_move
    }

    /// Run the search and report the best move with tree statistics.
    pub fn run(&mut self) -> SearchReport {
        let start = Instant::now();
        self.tree = SearchTree::new();
        let root = self.tree.root();

        if !self.root_state.has_any_move() {
            debug!("no legal move at root");
            return SearchReport {
                best_move: None,
                iterations: 0,
                tree: self.tree.stats(),
            };
        }

        expand(&mut self.tree, root, &self.root_state);

        let mut iterations = 0;
        while iterations < self.config.iterations {
            if self
                .config
                .time_limit
                .is_some_and(|limit| start.elapsed() >= limit)
            {
                debug!(iterations, "search stopped at time limit");
                break;
            }

            self.scratch.clone_from(&self.root_state);
            let value = simulate(&mut self.tree, root, &mut self.scratch, &self.config);
            self.tree.update(root, value);
            iterations += 1;

            if iterations % 1000 == 0 {
                trace!(iterations, nodes = self.tree.len(), "search progress");
            }
        }

        let best_move = self
            .tree
            .most_visited_child(root)
            .and_then(|id| match self.tree.get(id).mv {
                Some(Move::Place(pt)) => Some(pt),
                _ => None,
            });
        let stats = self.tree.stats();

        debug!(
            best = %best_move.map_or_else(|| "none".to_string(), str_coord),
            iterations,
            nodes = stats.total_nodes,
            depth = stats.max_depth,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search complete"
        );

        SearchReport {
            best_move,
            iterations,
            tree: stats,
        }
    }

    /// Visits and mean value of each root child, in creation order.
    pub fn root_children(&self) -> Vec<ChildSummary> {
        let root = self.tree.get(self.tree.root());
        root.children
            .iter()
            .filter_map(|&id| {
                let node = self.tree.get(id);
                node.mv.map(|mv| ChildSummary {
                    mv,
                    visits: node.visits,
                    mean_value: node.mean_value(),
                })
            })
            .collect()
    }

    /// Print debug information about the root's children.
    pub fn dump_children(&self) {
        for child in self.root_children() {
            debug!(
                mv = %child.mv,
                visits = child.visits,
                mean = child.mean_value,
                "root child"
            );
        }
    }
}

/// Create one child per legal placement of `state`, or a single pass child
/// when the mover is blocked.
fn expand(tree: &mut SearchTree, id: NodeId, state: &GameState) {
    let moves = state.valid_moves();
    if moves.is_empty() {
        tree.add_child(id, Move::Pass);
        return;
    }
    for pt in moves {
        tree.add_child(id, Move::Place(pt));
    }
}

/// One simulate pass from `id`, with `state` the position at that node.
///
/// Returns the result from the point of view of the player who moved into
/// `id`. `state` is left at the leaf position reached.
fn simulate(
    tree: &mut SearchTree,
    id: NodeId,
    state: &mut GameState,
    config: &SearchConfig,
) -> f64 {
    if config.leaf_rule.is_leaf(state) {
        return state.outcome(state.to_move().opponent()).value();
    }

    if !tree.get(id).is_expanded() {
        expand(tree, id, state);
    }

    let Some(child) = tree.select_child(id, config.exploration) else {
        return 0.0;
    };
    if let Some(mv) = tree.get(child).mv {
        if let Err(err) = state.apply_move(mv) {
            // Children come from this position's own legal moves
            panic!("search tree out of sync with position: {err}");
        }
    }

    let value = simulate(tree, child, state, config);
    tree.update(child, value);
    -value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Player};

    fn position(diagram: &str, to_move: Player) -> GameState {
        GameState::from_board(diagram.parse::<Board>().unwrap(), to_move)
    }

    /// Black's only move is (2,0); White has none.
    const ONE_MOVE: &str = "
        XO......
        ........
        ........
        ........
        ........
        ........
        ........
        ........
    ";

    #[test]
    fn test_node_id_none() {
        assert!(NodeId::NONE.is_none());
        assert!(NodeId(0).is_some());
    }

    #[test]
    fn test_uct_score() {
        let mut node = TreeNode::new(NodeId(0), Some(Move::Pass));
        assert_eq!(node.uct_score(0.0, 2.0), f64::INFINITY);

        node.visits = 4;
        node.value_sum = 2.0;
        let ln = 100f64.ln();
        let expected = 0.5 + (2.0 * ln / 4.0).sqrt();
        assert!((node.uct_score(ln, 2.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_add_child() {
        let mut tree = SearchTree::new();
        let child = tree.add_child(tree.root(), Move::Place((2, 3)));

        assert_eq!(tree.len(), 2);
        assert_eq!(child, NodeId(1));
        assert_eq!(tree.get(tree.root()).children, vec![child]);
        assert_eq!(tree.get(child).parent, tree.root());
        assert!(tree.get(tree.root()).parent.is_none());
    }

    #[test]
    fn test_select_prefers_unvisited_then_first() {
        let mut tree = SearchTree::new();
        let root = tree.root();
        let a = tree.add_child(root, Move::Place((0, 0)));
        let b = tree.add_child(root, Move::Place((1, 0)));
        let c = tree.add_child(root, Move::Place((2, 0)));

        // All unvisited: first wins the tie
        assert_eq!(tree.select_child(root, 2.0), Some(a));

        tree.update(root, 0.0);
        tree.update(a, 1.0);
        // b and c both infinite: earliest wins
        assert_eq!(tree.select_child(root, 2.0), Some(b));

        tree.update(root, 0.0);
        tree.update(b, 1.0);
        tree.update(root, 0.0);
        tree.update(c, 1.0);
        // Identical statistics: first wins
        assert_eq!(tree.select_child(root, 2.0), Some(a));
    }

    #[test]
    fn test_most_visited_ties_first() {
        let mut tree = SearchTree::new();
        let root = tree.root();
        assert_eq!(tree.most_visited_child(root), None);

        let a = tree.add_child(root, Move::Place((0, 0)));
        let b = tree.add_child(root, Move::Place((1, 0)));
        assert_eq!(tree.most_visited_child(root), Some(a));

        tree.update(b, 0.0);
        assert_eq!(tree.most_visited_child(root), Some(b));
        tree.update(a, 0.0);
        assert_eq!(tree.most_visited_child(root), Some(a));
    }

    #[test]
    fn test_leaf_rules() {
        let blocked = position(ONE_MOVE, Player::White);
        assert!(LeafRule::MoverBlocked.is_leaf(&blocked));
        assert!(!LeafRule::GameOver.is_leaf(&blocked));

        let start = GameState::new();
        assert!(!LeafRule::MoverBlocked.is_leaf(&start));
        assert!(!LeafRule::GameOver.is_leaf(&start));
    }

    #[test]
    fn test_simulate_forced_pass() {
        // White is blocked, Black still has (2,0): the game continues via a pass
        let config = SearchConfig::default();
        let mut tree = SearchTree::new();
        let mut state = position(ONE_MOVE, Player::White);

        let root = tree.root();
        let value = simulate(&mut tree, root, &mut state, &config);

        let root = tree.get(root);
        assert_eq!(root.children.len(), 1);
        let pass = tree.get(root.children[0]);
        assert_eq!(pass.mv, Some(Move::Pass));
        assert_eq!(pass.visits, 1);
        // Black ends with all three pieces: a loss for White, who passed
        assert_eq!(pass.value_sum, -1.0);
        assert_eq!(value, 1.0);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_simulate_mover_blocked_stops() {
        let config = SearchConfig::default().with_leaf_rule(LeafRule::MoverBlocked);
        let mut tree = SearchTree::new();
        let mut state = position(ONE_MOVE, Player::White);

        let root = tree.root();
        let value = simulate(&mut tree, root, &mut state, &config);

        // The pass is never explored; one piece each scores as a draw
        assert!(!tree.get(root).is_expanded());
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_search_single_move() {
        for iterations in [0, 1, 50] {
            let mut engine = SearchEngine::new(position(ONE_MOVE, Player::Black), iterations);
            assert_eq!(engine.search(), Some((2, 0)));
        }
    }

    #[test]
    fn test_search_blocked_root() {
        for rule in [LeafRule::GameOver, LeafRule::MoverBlocked] {
            for iterations in [0, 10] {
                let config = SearchConfig::default()
                    .with_iterations(iterations)
                    .with_leaf_rule(rule);
                let mut engine = SearchEngine::with_config(position(ONE_MOVE, Player::White), config);
                assert_eq!(engine.search(), None);
            }
        }
    }

    #[test]
    fn test_root_visits_match_iterations() {
        let mut engine = SearchEngine::new(GameState::new(), 200);
        let report = engine.run();

        assert_eq!(report.iterations, 200);
        assert_eq!(report.tree.root_visits, 200);

        let children = engine.root_children();
        assert_eq!(children.len(), 4);
        let total: u32 = children.iter().map(|c| c.visits).sum();
        assert_eq!(total, 200);
        assert!(children.iter().all(|c| c.visits > 0));
        assert!(report.tree.max_depth > 1);
    }

    #[test]
    fn test_search_keeps_root_state() {
        let state = GameState::new();
        let mut engine = SearchEngine::new(state.clone(), 100);
        let best = engine.search().unwrap();
        assert!(state.valid_moves().contains(&best));
        assert_eq!(engine.root_state, state);
    }

    #[test]
    fn test_search_is_deterministic() {
        let mut first = SearchEngine::new(GameState::new(), 300);
        let mut second = SearchEngine::new(GameState::new(), 300);
        assert_eq!(first.search(), second.search());
        assert_eq!(first.root_children(), second.root_children());
    }

    #[test]
    fn test_fresh_tree_per_search() {
        let mut engine = SearchEngine::new(GameState::new(), 50);
        engine.search();
        let nodes = engine.tree().len();
        engine.search();
        assert_eq!(engine.tree().len(), nodes);
        assert_eq!(engine.tree().stats().root_visits, 50);
    }

    #[test]
    fn test_time_limit_zero_stops_immediately() {
        let config = SearchConfig::default()
            .with_iterations(1000)
            .with_time_limit(Duration::ZERO);
        let mut engine = SearchEngine::with_config(GameState::new(), config);
        let report = engine.run();
        assert_eq!(report.iterations, 0);
        // Root is still expanded, so a move is available
        assert_eq!(report.best_move, Some((4, 2)));
    }
}
