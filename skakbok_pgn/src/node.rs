//! The game tree.

use std::{
    cell::RefCell,
    collections::BTreeSet,
    fmt::Debug,
    rc::{Rc, Weak},
};

use skakbok_core::board::{Board, Move, MoveError};

use crate::annotations::{Arrow, Shape};

#[derive(Debug, Default)]
struct NodeData {
    parent: Weak<RefCell<NodeData>>,
    mv: Option<Move>,
    variations: Vec<Rc<RefCell<NodeData>>>,

    comment: Option<String>,
    starting_comment: Option<String>,
    nags: BTreeSet<u32>,
    clock: Option<f64>,
    eval: Option<f64>,
    arrows: Vec<Arrow>,
    shapes: Vec<Shape>,

    /// Set on the root only: the FEN context positions are derived from.
    starting_fen: Option<String>,
    cached_board: Option<Board>,
}

/// A node in the game tree: the move that led here, its annotations, and the
/// ordered child variations (element 0 being the mainline continuation).
///
/// `GameNode` is a cheap handle comparing by node identity. Children are
/// owned by their parent; the back-reference to the parent is weak, so a
/// subtree detached with [`GameNode::remove_variation`] lives only as long as
/// external handles to it.
///
/// Each node lazily materialises and caches the [`Board`] position reached
/// after its move. Reordering variations does not change any position, but a
/// mutation that does (such as replacing the root's starting FEN) must be
/// followed by [`GameNode::invalidate_board`] on the affected subtree.
#[derive(Clone)]
pub struct GameNode {
    node: Rc<RefCell<NodeData>>,
}

impl PartialEq for GameNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for GameNode {}

impl Debug for GameNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.node.borrow();
        f.debug_struct("GameNode")
            .field("move", &data.mv)
            .field("variations", &data.variations.len())
            .finish()
    }
}

impl GameNode {
    pub(crate) fn new_root(starting_fen: Option<String>) -> Self {
        GameNode {
            node: Rc::new(RefCell::new(NodeData {
                starting_fen,
                ..NodeData::default()
            })),
        }
    }

    fn wrap(node: Rc<RefCell<NodeData>>) -> Self {
        GameNode { node }
    }

    /// The move that led to this node; [`None`] only at the root.
    pub fn played_move(&self) -> Option<Move> {
        self.node.borrow().mv
    }

    /// The parent node, unless this is the root (or the node was detached).
    pub fn parent(&self) -> Option<GameNode> {
        self.node.borrow().parent.upgrade().map(GameNode::wrap)
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// True if this node has no continuations.
    pub fn is_end(&self) -> bool {
        self.node.borrow().variations.is_empty()
    }

    /// True if every step from the root to this node follows a first child.
    pub fn is_mainline(&self) -> bool {
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            if parent.next().as_ref() != Some(&node) {
                return false;
            }
            node = parent;
        }
        true
    }

    /// True if this node is its parent's first child (or the root).
    pub fn is_main_variation(&self) -> bool {
        match self.parent() {
            Some(parent) => parent.next().as_ref() == Some(self),
            None => true,
        }
    }

    /// Ascends to the root of the tree.
    pub fn root(&self) -> GameNode {
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    /// Follows first children down to the end of this line.
    pub fn end(&self) -> GameNode {
        let mut node = self.clone();
        while let Some(next) = node.next() {
            node = next;
        }
        node
    }

    /// The mainline continuation of this node, if any.
    pub fn next(&self) -> Option<GameNode> {
        self.node.borrow().variations.first().cloned().map(GameNode::wrap)
    }

    /// The child variations in order; element 0 is the mainline continuation.
    pub fn variations(&self) -> Vec<GameNode> {
        self.node
            .borrow()
            .variations
            .iter()
            .cloned()
            .map(GameNode::wrap)
            .collect()
    }

    /// Finds the child reached by `mv`.
    pub fn variation(&self, mv: Move) -> Option<GameNode> {
        self.variations()
            .into_iter()
            .find(|child| child.played_move() == Some(mv))
    }

    pub fn has_variation(&self, mv: Move) -> bool {
        self.variation(mv).is_some()
    }

    /// Appends a child for `mv` and returns it.
    ///
    /// The child starts unannotated; comments, starting comments and NAGs
    /// are set on the returned node through the usual accessors.
    pub fn add_variation(&self, mv: Move) -> GameNode {
        let child = Rc::new(RefCell::new(NodeData {
            parent: Rc::downgrade(&self.node),
            mv: Some(mv),
            ..NodeData::default()
        }));
        self.node.borrow_mut().variations.push(child.clone());
        GameNode::wrap(child)
    }

    /// Inserts a child for `mv` at position 0, making it the new mainline
    /// continuation.
    pub fn add_main_variation(&self, mv: Move) -> GameNode {
        let child = Rc::new(RefCell::new(NodeData {
            parent: Rc::downgrade(&self.node),
            mv: Some(mv),
            ..NodeData::default()
        }));
        self.node.borrow_mut().variations.insert(0, child.clone());
        GameNode::wrap(child)
    }

    /// Appends a chain of moves, each the continuation of the previous, and
    /// returns the terminal node. Comments on the first and last nodes are
    /// set through the usual accessors.
    pub fn add_line(&self, moves: impl IntoIterator<Item = Move>) -> GameNode {
        let mut node = self.clone();
        for mv in moves {
            node = node.add_variation(mv);
        }
        node
    }

    /// Splices `child` out of this node's variations and severs its parent
    /// pointer. Returns false if `child` is not a child of this node.
    pub fn remove_variation(&self, child: &GameNode) -> bool {
        let mut data = self.node.borrow_mut();
        match data
            .variations
            .iter()
            .position(|c| Rc::ptr_eq(c, &child.node))
        {
            Some(index) => {
                data.variations.remove(index);
                child.node.borrow_mut().parent = Weak::new();
                true
            }
            None => false,
        }
    }

    /// Swaps this node with its preceding sibling, one step toward the
    /// mainline.
    pub fn promote(&self) {
        self.reorder(|index, variations| {
            if index > 0 {
                variations.swap(index, index - 1);
            }
        });
    }

    /// Swaps this node with its following sibling.
    pub fn demote(&self) {
        self.reorder(|index, variations| {
            if index + 1 < variations.len() {
                variations.swap(index, index + 1);
            }
        });
    }

    /// Moves this node to position 0 of its parent, making it the mainline
    /// continuation; the other siblings slide back preserving their order.
    pub fn promote_to_main(&self) {
        self.reorder(|index, variations| {
            let node = variations.remove(index);
            variations.insert(0, node);
        });
    }

    fn reorder(&self, f: impl FnOnce(usize, &mut Vec<Rc<RefCell<NodeData>>>)) {
        if let Some(parent) = self.parent() {
            let mut data = parent.node.borrow_mut();
            if let Some(index) = data
                .variations
                .iter()
                .position(|c| Rc::ptr_eq(c, &self.node))
            {
                f(index, &mut data.variations);
            }
        }
    }

    /// Counts the nodes of this subtree, including this one.
    pub fn count_nodes(&self) -> usize {
        1 + self
            .variations()
            .iter()
            .map(GameNode::count_nodes)
            .sum::<usize>()
    }

    /// The distance from the root; the root itself is at ply 0.
    pub fn ply(&self) -> usize {
        let mut count = 0;
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            count += 1;
            node = parent;
        }
        count
    }

    /// The full-move number this node's ply falls on.
    pub fn move_number(&self) -> u32 {
        (self.ply() / 2) as u32 + 1
    }

    /// Iterates the nodes after this one along the mainline.
    pub fn mainline(&self) -> impl Iterator<Item = GameNode> {
        let mut current = self.next();
        std::iter::from_fn(move || {
            let node = current.take()?;
            current = node.next();
            Some(node)
        })
    }

    /// The moves of the mainline after this node.
    pub fn mainline_moves(&self) -> impl Iterator<Item = Move> {
        self.mainline().filter_map(|node| node.played_move())
    }

    /// The position after this node's move, as an owned copy.
    ///
    /// The first call walks up to the root, builds the starting board from
    /// the root's FEN context, replays the ancestor chain, and caches the
    /// result; later calls copy from the cache. Fails only when a recorded
    /// move cannot be applied (a drop leaf).
    pub fn board(&self) -> Result<Board, MoveError> {
        if let Some(cached) = self.node.borrow().cached_board.clone() {
            return Ok(cached);
        }

        let mut chain = Vec::new();
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            if let Some(mv) = node.played_move() {
                chain.push(mv);
            }
            node = parent;
        }

        let mut board = match &node.node.borrow().starting_fen {
            Some(fen) => Board::from_fen(fen)
                .map_err(|e| MoveError::IllegalMove(format!("starting position: {e}")))?,
            None => Board::new(),
        };
        for &mv in chain.iter().rev() {
            board.push(mv)?;
        }

        let position = board.copy();
        self.node.borrow_mut().cached_board = Some(position.clone());
        Ok(position)
    }

    /// The FEN of the position after this node's move.
    pub fn fen(&self) -> Result<String, MoveError> {
        Ok(self.board()?.fen())
    }

    /// The SAN of this node's move in its parent's position; [`None`] at the
    /// root.
    pub fn san(&self) -> Result<Option<String>, MoveError> {
        match (self.parent(), self.played_move()) {
            (Some(parent), Some(mv)) => Ok(Some(parent.board()?.san(mv)?)),
            _ => Ok(None),
        }
    }

    /// The UCI encoding of this node's move; [`None`] at the root.
    pub fn uci(&self) -> Option<String> {
        self.played_move().map(Move::uci)
    }

    /// Clears the cached board of this node and every descendant.
    ///
    /// Call after a mutation that changes positions in this subtree, such as
    /// replacing the root's starting FEN.
    pub fn invalidate_board(&self) {
        self.node.borrow_mut().cached_board = None;
        for child in self.variations() {
            child.invalidate_board();
        }
    }

    pub(crate) fn set_starting_fen(&self, fen: Option<String>) {
        self.node.borrow_mut().starting_fen = fen;
        self.invalidate_board();
    }

    pub fn comment(&self) -> Option<String> {
        self.node.borrow().comment.clone()
    }

    pub fn set_comment(&self, comment: Option<String>) {
        self.node.borrow_mut().comment = comment;
    }

    /// The comment preceding this node's move. Only meaningful at the start
    /// of a variation or game.
    pub fn starting_comment(&self) -> Option<String> {
        self.node.borrow().starting_comment.clone()
    }

    pub fn set_starting_comment(&self, comment: Option<String>) {
        self.node.borrow_mut().starting_comment = comment;
    }

    pub fn nags(&self) -> BTreeSet<u32> {
        self.node.borrow().nags.clone()
    }

    pub fn add_nag(&self, nag: u32) {
        self.node.borrow_mut().nags.insert(nag);
    }

    pub fn set_nags(&self, nags: impl IntoIterator<Item = u32>) {
        self.node.borrow_mut().nags = nags.into_iter().collect();
    }

    /// The `[%clk]` reading on this node, in seconds.
    pub fn clock(&self) -> Option<f64> {
        self.node.borrow().clock
    }

    pub fn set_clock(&self, clock: Option<f64>) {
        self.node.borrow_mut().clock = clock;
    }

    /// The `[%eval]` engine evaluation on this node.
    pub fn eval(&self) -> Option<f64> {
        self.node.borrow().eval
    }

    pub fn set_eval(&self, eval: Option<f64>) {
        self.node.borrow_mut().eval = eval;
    }

    pub fn arrows(&self) -> Vec<Arrow> {
        self.node.borrow().arrows.clone()
    }

    pub fn set_arrows(&self, arrows: Vec<Arrow>) {
        self.node.borrow_mut().arrows = arrows;
    }

    pub fn shapes(&self) -> Vec<Shape> {
        self.node.borrow().shapes.clone()
    }

    pub fn set_shapes(&self, shapes: Vec<Shape>) {
        self.node.borrow_mut().shapes = shapes;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use skakbok_core::board::{PieceType, Square};

    fn mv(uci: &str) -> Move {
        uci.parse().unwrap()
    }

    #[test]
    fn add_variation_builds_ordered_children() {
        let root = GameNode::new_root(None);
        let e4 = root.add_variation(mv("e2e4"));
        let e5 = e4.add_variation(mv("e7e5"));
        let c5 = e4.add_variation(mv("c7c5"));

        assert_eq!(e4.variations(), vec![e5.clone(), c5.clone()]);
        assert_eq!(e4.next(), Some(e5.clone()));
        assert!(e4.has_variation(mv("c7c5")));
        assert_eq!(e4.variation(mv("c7c5")), Some(c5.clone()));
        assert_eq!(e4.variation(mv("d7d5")), None);

        assert!(e5.is_main_variation());
        assert!(!c5.is_main_variation());
        assert!(e5.is_mainline());
        assert!(!c5.is_mainline());
        assert!(c5.is_end());
    }

    #[test]
    fn root_end_ply_and_move_number() {
        let root = GameNode::new_root(None);
        let end = root.add_line(["e2e4", "e7e5", "g1f3", "b8c6"].map(mv));

        assert_eq!(end.ply(), 4);
        assert_eq!(end.move_number(), 3);
        assert_eq!(root.ply(), 0);
        assert_eq!(root.move_number(), 1);

        assert_eq!(end.root(), root);
        assert_eq!(root.end(), end);
        assert!(root.is_root());
        assert!(!end.is_root());
    }

    #[test]
    fn mainline_iterates_first_children() {
        let root = GameNode::new_root(None);
        let e4 = root.add_variation(mv("e2e4"));
        let e5 = e4.add_variation(mv("e7e5"));
        e4.add_variation(mv("c7c5"));
        let nf3 = e5.add_variation(mv("g1f3"));

        let mainline: Vec<_> = root.mainline().collect();
        assert_eq!(mainline, vec![e4.clone(), e5.clone(), nf3.clone()]);

        let moves: Vec<_> = root.mainline_moves().collect();
        assert_eq!(moves, vec![mv("e2e4"), mv("e7e5"), mv("g1f3")]);
    }

    #[test]
    fn board_replays_the_ancestor_chain() {
        let root = GameNode::new_root(None);
        let end = root.add_line(["e2e4", "e7e5", "g1f3"].map(mv));

        let board = end.board().unwrap();
        assert_eq!(
            board.fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );
        assert_eq!(end.fen().unwrap(), board.fen());

        // Cached board still matches after a second call.
        assert_eq!(end.board().unwrap(), board);
    }

    #[test]
    fn board_starts_from_the_root_fen_context() {
        let root = GameNode::new_root(Some(
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3".to_owned(),
        ));
        let bb5 = root.add_variation(mv("f1b5"));

        let board = root.board().unwrap();
        assert_eq!(board.fullmove_number(), 3);
        assert_eq!(bb5.san().unwrap().as_deref(), Some("Bb5"));
    }

    #[test]
    fn san_and_uci_derive_from_the_parent_position() {
        let root = GameNode::new_root(None);
        let e4 = root.add_variation(mv("e2e4"));

        assert_eq!(root.san().unwrap(), None);
        assert_eq!(root.uci(), None);
        assert_eq!(e4.san().unwrap().as_deref(), Some("e4"));
        assert_eq!(e4.uci().as_deref(), Some("e2e4"));
    }

    #[test]
    fn board_fails_for_a_drop_leaf() {
        let root = GameNode::new_root(None);
        let drop = root.add_variation(Move::new_drop(PieceType::Knight, Square::F3));

        assert!(drop.board().is_err());
        assert_eq!(drop.uci().as_deref(), Some("N@f3"));
    }

    #[test]
    fn promote_demote_and_promote_to_main() {
        let root = GameNode::new_root(None);
        let e4 = root.add_variation(mv("e2e4"));
        let e5 = e4.add_variation(mv("e7e5"));
        let c5 = e4.add_variation(mv("c7c5"));
        let d5 = e4.add_variation(mv("d7d5"));

        d5.promote();
        assert_eq!(e4.variations(), vec![e5.clone(), d5.clone(), c5.clone()]);

        c5.promote_to_main();
        assert_eq!(e4.variations(), vec![c5.clone(), e5.clone(), d5.clone()]);

        c5.demote();
        assert_eq!(e4.variations(), vec![e5.clone(), c5.clone(), d5.clone()]);

        // No-ops at the boundaries.
        e5.promote();
        d5.demote();
        assert_eq!(e4.variations(), vec![e5.clone(), c5.clone(), d5.clone()]);
    }

    #[test]
    fn add_main_variation_takes_position_zero() {
        let root = GameNode::new_root(None);
        let e4 = root.add_variation(mv("e2e4"));
        let d4 = root.add_main_variation(mv("d2d4"));

        assert_eq!(root.variations(), vec![d4.clone(), e4.clone()]);
        assert!(d4.is_main_variation());
    }

    #[test]
    fn remove_variation_severs_the_parent_pointer() {
        let root = GameNode::new_root(None);
        let e4 = root.add_variation(mv("e2e4"));
        let e5 = e4.add_variation(mv("e7e5"));

        assert!(e4.remove_variation(&e5));
        assert!(e4.is_end());
        assert!(e5.parent().is_none());

        // Removing again is a no-op.
        assert!(!e4.remove_variation(&e5));
        // Only direct children can be removed.
        assert!(!root.remove_variation(&e5));
    }

    #[test]
    fn count_nodes_includes_the_whole_subtree() {
        let root = GameNode::new_root(None);
        let e4 = root.add_variation(mv("e2e4"));
        let e5 = e4.add_variation(mv("e7e5"));
        e4.add_variation(mv("c7c5"));
        e5.add_variation(mv("g1f3"));

        assert_eq!(root.count_nodes(), 5);
        assert_eq!(e4.count_nodes(), 4);
        assert_eq!(e5.count_nodes(), 2);
    }

    #[test]
    fn invalidate_board_clears_the_subtree_cache() {
        let root = GameNode::new_root(None);
        let e4 = root.add_variation(mv("e2e4"));
        let e5 = e4.add_variation(mv("e7e5"));

        let before = e5.fen().unwrap();
        root.set_starting_fen(Some(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 10".to_owned(),
        ));

        // Positions rebuild from the new context.
        let after = e5.fen().unwrap();
        assert_ne!(after, before);
        assert!(after.ends_with("0 11"));
        assert_eq!(e4.san().unwrap().as_deref(), Some("e4"));
    }

    #[test]
    fn annotations_round_trip_through_accessors() {
        let root = GameNode::new_root(None);
        let e4 = root.add_variation(mv("e2e4"));

        e4.set_comment(Some("a classic".to_owned()));
        e4.set_starting_comment(Some("the game begins".to_owned()));
        e4.add_nag(1);
        e4.add_nag(13);
        e4.set_clock(Some(185.0));
        e4.set_eval(Some(0.3));
        e4.set_arrows(vec![Arrow::from_code("Gd2d4").unwrap()]);
        e4.set_shapes(vec![Shape::from_code("Rd4").unwrap()]);

        assert_eq!(e4.comment().as_deref(), Some("a classic"));
        assert_eq!(e4.starting_comment().as_deref(), Some("the game begins"));
        assert_eq!(e4.nags().into_iter().collect::<Vec<_>>(), vec![1, 13]);
        assert_eq!(e4.clock(), Some(185.0));
        assert_eq!(e4.eval(), Some(0.3));
        assert_eq!(e4.arrows().len(), 1);
        assert_eq!(e4.shapes().len(), 1);
    }
}
