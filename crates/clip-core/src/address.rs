// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Structural addresses from an ancestor node down to a descendant.
//!
//! A path is the concatenation of one token per level, root to leaf:
//!
//! ```text
//! /n[<escaped name>]i[<sibling index>]
//! ```
//!
//! Inside a name, `\`, `[`, `]` and `/` are escaped with a backslash, so no
//! name can ever contain an unescaped level separator. The empty path
//! addresses the start node itself.

use clip_port::{NodeId, SceneGraph};
use thiserror::Error;

const TOKEN_OPEN: &str = "/n[";
const INDEX_OPEN: &str = "i[";

/// Failure to build or follow a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The path text is not a sequence of well-formed tokens.
    #[error("malformed path {path:?} at byte {at}")]
    Malformed {
        /// The offending path.
        path: String,
        /// Byte offset where parsing failed.
        at: usize,
    },
    /// A level names a sibling index the node does not have.
    #[error("path {path:?}: no child at index {index} (node has {child_count})")]
    IndexOutOfRange {
        /// The path being resolved.
        path: String,
        /// Requested sibling index.
        index: usize,
        /// Actual number of children.
        child_count: usize,
    },
    /// The child at the recorded index has a different name.
    #[error("path {path:?}: expected {expected:?} at index {index}, found {found:?}")]
    NameMismatch {
        /// The path being resolved.
        path: String,
        /// Sibling index of the level.
        index: usize,
        /// Name recorded in the path.
        expected: String,
        /// Name found in the scene.
        found: String,
    },
    /// The walk upward never reached the requested ancestor.
    #[error("{ancestor:?} is not an ancestor of {node:?}")]
    NotAnAncestor {
        /// Start of the upward walk.
        node: NodeId,
        /// Ancestor that was not found.
        ancestor: NodeId,
    },
}

fn escape_into(out: &mut String, name: &str) {
    for c in name.chars() {
        if matches!(c, '\\' | '[' | ']' | '/') {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Encodes one path level.
pub fn encode(name: &str, index: usize) -> String {
    let mut token = String::with_capacity(name.len() + 12);
    token.push_str(TOKEN_OPEN);
    escape_into(&mut token, name);
    token.push_str("]i[");
    token.push_str(&index.to_string());
    token.push(']');
    token
}

/// Parses the token at the start of `s`; returns the level and the number of
/// bytes consumed, or the byte offset of the error.
fn parse_token(s: &str) -> Result<((String, usize), usize), usize> {
    let body = s.strip_prefix(TOKEN_OPEN).ok_or(0usize)?;
    let mut name = String::new();
    let mut chars = body.char_indices();
    let name_end = loop {
        match chars.next() {
            Some((_, '\\')) => match chars.next() {
                Some((_, c)) => name.push(c),
                None => return Err(s.len()),
            },
            Some((at, ']')) => break at,
            Some((_, c)) => name.push(c),
            None => return Err(s.len()),
        }
    };
    let index_at = TOKEN_OPEN.len() + name_end + 1;
    let digits = s[index_at..]
        .strip_prefix(INDEX_OPEN)
        .ok_or(index_at)?;
    let close = digits.find(']').ok_or(s.len())?;
    let digits_at = index_at + INDEX_OPEN.len();
    if close == 0 || !digits[..close].bytes().all(|b| b.is_ascii_digit()) {
        return Err(digits_at);
    }
    let index = digits[..close].parse::<usize>().map_err(|_| digits_at)?;
    Ok(((name, index), digits_at + close + 1))
}

/// Decodes exactly one path level.
pub fn decode(token: &str) -> Result<(String, usize), AddressError> {
    match parse_token(token) {
        Ok((level, used)) if used == token.len() => Ok(level),
        Ok((_, used)) => Err(AddressError::Malformed {
            path: token.to_owned(),
            at: used,
        }),
        Err(at) => Err(AddressError::Malformed {
            path: token.to_owned(),
            at,
        }),
    }
}

/// Splits a path into its `(name, index)` levels, root to leaf.
pub fn parse_path(path: &str) -> Result<Vec<(String, usize)>, AddressError> {
    let mut levels = Vec::new();
    let mut offset = 0;
    while offset < path.len() {
        let (level, used) =
            parse_token(&path[offset..]).map_err(|at| AddressError::Malformed {
                path: path.to_owned(),
                at: offset + at,
            })?;
        levels.push(level);
        offset += used;
    }
    Ok(levels)
}

/// Sibling indices from `ancestor` (exclusive) down to `node` (inclusive).
pub fn index_chain<S>(scene: &S, node: NodeId, ancestor: NodeId) -> Result<Vec<usize>, AddressError>
where
    S: SceneGraph + ?Sized,
{
    let mut chain = Vec::new();
    let mut current = node;
    while current != ancestor {
        chain.push(scene.sibling_index(current));
        current = scene
            .parent(current)
            .ok_or(AddressError::NotAnAncestor { node, ancestor })?;
    }
    chain.reverse();
    Ok(chain)
}

/// Path from `from_ancestor` (exclusive) to `node`, using live names.
pub fn build_path<S>(scene: &S, node: NodeId, from_ancestor: NodeId) -> Result<String, AddressError>
where
    S: SceneGraph + ?Sized,
{
    let mut levels = Vec::new();
    let mut current = node;
    while current != from_ancestor {
        levels.push(encode(&scene.name(current), scene.sibling_index(current)));
        current = scene
            .parent(current)
            .ok_or(AddressError::NotAnAncestor {
                node,
                ancestor: from_ancestor,
            })?;
    }
    levels.reverse();
    Ok(levels.concat())
}

/// Path that follows `indices` down from `start`, naming each level after the
/// node found there. Returns `None` when an index does not exist.
pub fn path_along<S>(scene: &S, start: NodeId, indices: &[usize]) -> Option<String>
where
    S: SceneGraph + ?Sized,
{
    let mut path = String::new();
    let mut current = start;
    for &index in indices {
        current = scene.child(current, index)?;
        path.push_str(&encode(&scene.name(current), index));
    }
    Some(path)
}

/// Follows `path` down from `root`.
///
/// Every level must exist and carry the recorded name; anything else means
/// the structure changed incompatibly since capture.
pub fn resolve_path<S>(scene: &S, root: NodeId, path: &str) -> Result<NodeId, AddressError>
where
    S: SceneGraph + ?Sized,
{
    let mut node = root;
    for (name, index) in parse_path(path)? {
        let child = scene
            .child(node, index)
            .ok_or_else(|| AddressError::IndexOutOfRange {
                path: path.to_owned(),
                index,
                child_count: scene.child_count(node),
            })?;
        let found = scene.name(child);
        if found != name {
            return Err(AddressError::NameMismatch {
                path: path.to_owned(),
                index,
                expected: name,
                found,
            });
        }
        node = child;
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryScene;

    #[test]
    fn test_encode_plain() {
        assert_eq!(encode("Arm", 2), "/n[Arm]i[2]");
    }

    #[test]
    fn test_encode_escapes_separators() {
        let token = encode("a/n[b]i[0]\\", 7);
        assert_eq!(token, r"/n[a\/n\[b\]i\[0\]\\]i[7]");
        assert_eq!(decode(&token), Ok(("a/n[b]i[0]\\".to_owned(), 7)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("Arm").is_err());
        assert!(decode("/n[Arm]i[]").is_err());
        assert!(decode("/n[Arm]i[x]").is_err());
        assert!(decode("/n[Arm]i[1]trailing").is_err());
        assert!(decode("/n[Arm").is_err());
    }

    #[test]
    fn test_parse_multi_level() {
        let levels = parse_path("/n[A]i[0]/n[B]i[3]").expect("parse");
        assert_eq!(levels, vec![("A".to_owned(), 0), ("B".to_owned(), 3)]);
        assert_eq!(parse_path(""), Ok(Vec::new()));
    }

    fn arm_rig() -> (MemoryScene, NodeId, NodeId, NodeId) {
        let mut scene = MemoryScene::new();
        let body = scene.add_node("Body", None);
        let _torso = scene.add_node("Torso", Some(body));
        let arm = scene.add_node("Arm", Some(body));
        let hand = scene.add_node("Hand", Some(arm));
        (scene, body, arm, hand)
    }

    #[test]
    fn test_build_and_resolve() {
        let (scene, body, _arm, hand) = arm_rig();
        let path = build_path(&scene, hand, body).expect("build");
        assert_eq!(path, "/n[Arm]i[1]/n[Hand]i[0]");
        assert_eq!(resolve_path(&scene, body, &path), Ok(hand));
        assert_eq!(resolve_path(&scene, body, ""), Ok(body));
        assert_eq!(index_chain(&scene, hand, body), Ok(vec![1, 0]));
    }

    #[test]
    fn test_resolve_name_mismatch() {
        let (mut scene, body, arm, _hand) = arm_rig();
        let path = build_path(&scene, arm, body).expect("build");
        scene.rename(arm, "Arm_L");
        let err = resolve_path(&scene, body, &path).expect_err("mismatch");
        assert!(matches!(err, AddressError::NameMismatch { .. }));
    }

    #[test]
    fn test_resolve_index_out_of_range() {
        let (scene, body, _, _) = arm_rig();
        let err = resolve_path(&scene, body, "/n[Arm]i[5]").expect_err("range");
        assert!(matches!(
            err,
            AddressError::IndexOutOfRange { child_count: 2, .. }
        ));
    }

    #[test]
    fn test_build_path_requires_ancestor() {
        let (mut scene, _body, _arm, hand) = arm_rig();
        let stranger = scene.add_node("Stranger", None);
        assert!(matches!(
            build_path(&scene, hand, stranger),
            Err(AddressError::NotAnAncestor { .. })
        ));
    }
}
