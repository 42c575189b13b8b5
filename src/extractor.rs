//! Generic state-machine walk over visited nodes.
//!
//! An [`Extractor`] sees each node twice: [`Extractor::entering`] decides
//! the next state and whether to descend into the children, and
//! [`Extractor::leaving`] may change the state again once the children are
//! done. State is a small `Copy` enum owned by the walk, while the record
//! being built lives in the extractor itself and is produced once by
//! [`Extractor::finalize`].

use std::fmt::Debug;

use crate::html::Node;

pub trait Extractor {
    type State: Copy + Debug + PartialEq;
    type Output;

    fn initial_state(&self) -> Self::State;

    /// Returns the new state and whether to walk the node's children.
    fn entering(&mut self, state: Self::State, node: &Node) -> (Self::State, bool);

    fn leaving(&mut self, state: Self::State, _node: &Node) -> Self::State {
        state
    }

    fn finalize(self, state: Self::State) -> Self::Output;
}

/// Run `extractor` over a flat list of top-level nodes.
pub fn extract<E: Extractor>(mut extractor: E, nodes: &[Node]) -> E::Output {
    let mut state = extractor.initial_state();
    for node in nodes {
        state = walk(&mut extractor, state, node);
    }
    log::trace!("Extraction finished in state {:?}", state);
    extractor.finalize(state)
}

fn walk<E: Extractor>(extractor: &mut E, state: E::State, node: &Node) -> E::State {
    let (mut state, descend) = extractor.entering(state, node);
    if descend {
        for child in node.children() {
            state = walk(extractor, state, child);
        }
    }
    extractor.leaving(state, node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::html::{Scope, parse_fragment};

    /// Counts list items, but only inside `<ul>`.
    struct ListItems {
        count: usize,
        order: Vec<String>,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum State {
        Outside,
        InList,
    }

    impl Extractor for ListItems {
        type State = State;
        type Output = (usize, Vec<String>);

        fn initial_state(&self) -> State {
            State::Outside
        }

        fn entering(&mut self, state: State, node: &Node) -> (State, bool) {
            if let Some(tag) = node.tag() {
                self.order.push(format!("+{tag}"));
            }
            match (state, node.tag()) {
                (State::Outside, Some("ul")) => (State::InList, true),
                (State::InList, Some("li")) => {
                    self.count += 1;
                    (State::InList, false)
                }
                (state, _) => (state, true),
            }
        }

        fn leaving(&mut self, state: State, node: &Node) -> State {
            if let Some(tag) = node.tag() {
                self.order.push(format!("-{tag}"));
            }
            match node.tag() {
                Some("ul") => State::Outside,
                _ => state,
            }
        }

        fn finalize(self, _state: State) -> Self::Output {
            (self.count, self.order)
        }
    }

    #[test]
    fn test_walk_order_and_state() {
        let fragment = parse_fragment(
            "<ol><li>x</li></ol><ul><li>a</li><li>b</li></ul>",
            0,
            Grammar::HTML,
            Scope::Page,
        )
        .unwrap();
        let (count, order) = extract(
            ListItems {
                count: 0,
                order: Vec::new(),
            },
            &fragment.nodes,
        );
        assert_eq!(count, 2);
        assert_eq!(
            order,
            vec!["+ol", "+li", "-li", "-ol", "+ul", "+li", "-li", "+li", "-li", "-ul"]
        );
    }
}
