//! Input expansion: choice-set normalization and Cartesian branching.
//!
//! A step's resolved inputs form an ordered list of choice sets, one per
//! top-level entry. Expansion takes their Cartesian product, so the number
//! of concrete messages a step sends equals the product of the set sizes.
//!
//! The flatten/product law, with one-element tuples rendered as single
//! messages and longer tuples as conversations:
//!
//! ```rust
//! use promptgen::step::{expand_inputs, InputNode};
//!
//! let leaf = |s: &str| InputNode::Leaf(s.to_string());
//!
//! // [] -> 0 messages
//! assert!(expand_inputs(&[]).is_empty());
//!
//! // ['1', ['1', '2']] -> ('1', '1'), ('1', '2')
//! let messages = expand_inputs(&[
//!     leaf("1"),
//!     InputNode::List(vec![leaf("1"), leaf("2")]),
//! ]);
//! assert_eq!(messages.len(), 2);
//! ```

use serde::{Deserialize, Serialize};

/// A resolved input entry: either a single string or a nested list.
///
/// Nesting deeper than one level can arise when a list-valued variable
/// binding substitutes inside a branch set; normalization collapses any
/// such nesting into a single flat alternative set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputNode {
    /// A single resolved string.
    Leaf(String),
    /// A list of resolved entries, possibly nested.
    List(Vec<InputNode>),
}

impl InputNode {
    fn flatten_into(&self, out: &mut Vec<String>) {
        match self {
            InputNode::Leaf(s) => out.push(s.clone()),
            InputNode::List(children) => {
                for child in children {
                    child.flatten_into(out);
                }
            }
        }
    }
}

/// One concrete message produced by expansion.
///
/// A length-1 tuple becomes a single message; longer tuples become a
/// conversation whose earlier items are context for the final question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A lone prompt sent as-is.
    Single(String),
    /// An ordered exchange: all but the last item are context.
    Conversation(Vec<String>),
}

impl Message {
    fn from_tuple(mut tuple: Vec<String>) -> Option<Self> {
        match tuple.len() {
            0 => None,
            1 => Some(Message::Single(tuple.remove(0))),
            _ => Some(Message::Conversation(tuple)),
        }
    }

    /// The ordered items of this message.
    pub fn turns(&self) -> &[String] {
        match self {
            Message::Single(s) => std::slice::from_ref(s),
            Message::Conversation(turns) => turns,
        }
    }

    /// Render the text actually sent to the model.
    ///
    /// This rendered form is also the response-cache key, so two
    /// conversations that collapse to the same text share one inference.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Message::Single(s) => s.clone(),
            Message::Conversation(turns) => {
                let (question, context) = turns.split_last().expect("conversation is non-empty");
                format!(
                    "Context:\n{}\n\nAnswer the following:\n{}",
                    context.join("\n"),
                    question
                )
            }
        }
    }
}

/// Normalize resolved inputs into flat choice sets.
///
/// A leaf wraps into a one-element set. A list keeps its elements as the
/// alternative set, first recursively flattening any nested lists into it.
/// Empty sets are dropped.
#[must_use]
pub fn normalize(nodes: &[InputNode]) -> Vec<Vec<String>> {
    let mut sets = Vec::with_capacity(nodes.len());
    for node in nodes {
        let set = match node {
            InputNode::Leaf(s) => vec![s.clone()],
            InputNode::List(children) => {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    child.flatten_into(&mut flat);
                }
                flat
            }
        };
        if !set.is_empty() {
            sets.push(set);
        }
    }
    sets
}

/// Cartesian product across choice sets, in original input order.
///
/// The product of zero sets is a single empty tuple, which message
/// construction then drops.
#[must_use]
pub fn cartesian_product(sets: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut tuples: Vec<Vec<String>> = vec![Vec::new()];
    for set in sets {
        let mut next = Vec::with_capacity(tuples.len() * set.len());
        for tuple in &tuples {
            for choice in set {
                let mut extended = tuple.clone();
                extended.push(choice.clone());
                next.push(extended);
            }
        }
        tuples = next;
    }
    tuples
}

/// Expand resolved inputs into the concrete messages to send.
#[must_use]
pub fn expand_inputs(nodes: &[InputNode]) -> Vec<Message> {
    let sets = normalize(nodes);
    cartesian_product(&sets)
        .into_iter()
        .filter_map(Message::from_tuple)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(s: &str) -> InputNode {
        InputNode::Leaf(s.to_string())
    }

    fn list(items: &[&str]) -> InputNode {
        InputNode::List(items.iter().map(|s| leaf(s)).collect())
    }

    fn set(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_worked_example() {
        // [] -> 0 choice sets
        assert!(normalize(&[]).is_empty());

        // [['1']] -> one choice set ['1']
        assert_eq!(normalize(&[list(&["1"])]), vec![set(&["1"])]);

        // ['1', ['1', '2']] -> ['1'] and ['1', '2']
        assert_eq!(
            normalize(&[leaf("1"), list(&["1", "2"])]),
            vec![set(&["1"]), set(&["1", "2"])]
        );

        // [['1', '3'], ['1', '2']] -> ['1', '3'] and ['1', '2']
        assert_eq!(
            normalize(&[list(&["1", "3"]), list(&["1", "2"])]),
            vec![set(&["1", "3"]), set(&["1", "2"])]
        );
    }

    #[test]
    fn normalize_collapses_nested_lists() {
        let nested = InputNode::List(vec![
            leaf("x"),
            InputNode::List(vec![leaf("1"), InputNode::List(vec![leaf("2")])]),
        ]);
        assert_eq!(normalize(&[nested]), vec![set(&["x", "1", "2"])]);
    }

    #[test]
    fn normalize_drops_empty_sets() {
        assert!(normalize(&[InputNode::List(vec![])]).is_empty());
        assert_eq!(
            normalize(&[InputNode::List(vec![]), leaf("keep")]),
            vec![set(&["keep"])]
        );
    }

    #[test]
    fn product_law_holds_for_worked_examples() {
        // [] -> 0 expanded messages
        assert!(expand_inputs(&[]).is_empty());

        // [['1']] -> 1 message ('1',)
        assert_eq!(
            expand_inputs(&[list(&["1"])]),
            vec![Message::Single("1".to_string())]
        );

        // ['1', ['1', '2']] -> ('1', '1'), ('1', '2')
        assert_eq!(
            expand_inputs(&[leaf("1"), list(&["1", "2"])]),
            vec![
                Message::Conversation(set(&["1", "1"])),
                Message::Conversation(set(&["1", "2"])),
            ]
        );

        // [['1', '3'], ['1', '2']] -> four tuples in product order
        assert_eq!(
            expand_inputs(&[list(&["1", "3"]), list(&["1", "2"])]),
            vec![
                Message::Conversation(set(&["1", "1"])),
                Message::Conversation(set(&["1", "2"])),
                Message::Conversation(set(&["3", "1"])),
                Message::Conversation(set(&["3", "2"])),
            ]
        );
    }

    #[test]
    fn message_count_is_product_of_set_sizes() {
        let messages = expand_inputs(&[list(&["a", "b"]), list(&["c", "d", "e"]), leaf("f")]);
        assert_eq!(messages.len(), 2 * 3);
    }

    #[test]
    fn single_messages_render_verbatim() {
        let message = Message::Single("just this".to_string());
        assert_eq!(message.render(), "just this");
    }

    #[test]
    fn conversations_render_context_then_question() {
        let message = Message::Conversation(set(&["first", "second", "ask me"]));
        assert_eq!(
            message.render(),
            "Context:\nfirst\nsecond\n\nAnswer the following:\nask me"
        );
    }
}
