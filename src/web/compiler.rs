//! Compiles an ordered route table into a linear matching program.
//!
//! Routes are first threaded into a prefix trie. A route can only ever be
//! added under the *last* child of a node, so a depth-first walk of the trie
//! visits routes in exactly the order of the table. The trie is then
//! flattened into instructions that compare up to three literal bytes at a
//! time, so one failed comparison skips every route below that edge.

use std::fmt;

use crate::web::router::Route;

/// Maximum number of literal bytes a single instruction compares.
const CHUNK: usize = 3;

/// Where execution continues when a literal comparison fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Continue at the given instruction index.
    Index(usize),
    /// No remaining route can match; stop.
    Fail,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Compare the next `len` path bytes against `bytes[..len]`. Advance the
    /// cursor past them on success, jump to `on_mismatch` otherwise.
    Literal {
        bytes: [u8; CHUNK],
        len: u8,
        on_mismatch: Target,
    },
    /// Move the cursor back to an absolute offset into the path.
    SetCursor(usize),
    /// Try the route at this index of the table.
    Route(usize),
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Literal { bytes, len, on_mismatch } => {
                let text = String::from_utf8_lossy(&bytes[..usize::from(*len)]);
                write!(f, "Literal({text:?}, else {on_mismatch:?})")
            }
            Instruction::SetCursor(at) => write!(f, "SetCursor({at})"),
            Instruction::Route(i) => write!(f, "Route({i})"),
        }
    }
}

/// A compiled route table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub(crate) fn get(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }
}

#[derive(Default)]
struct Node {
    items: Vec<Item>,
}

enum Item {
    Route(usize),
    Edge { label: Vec<u8>, child: Node },
}

impl Node {
    fn insert(&mut self, prefix: &[u8], index: usize) {
        if prefix.is_empty() {
            self.items.push(Item::Route(index));
            return;
        }

        if let Some(Item::Edge { label, child }) = self.items.last_mut() {
            let common = label.iter().zip(prefix).take_while(|(a, b)| a == b).count();
            if common > 0 {
                if common < label.len() {
                    let tail = label.split_off(common);
                    let below = std::mem::take(child);
                    child.items.push(Item::Edge { label: tail, child: below });
                }
                child.insert(&prefix[common..], index);
                return;
            }
        }

        let mut child = Node::default();
        child.items.push(Item::Route(index));
        self.items.push(Item::Edge {
            label: prefix.to_vec(),
            child,
        });
    }
}

struct Emitter {
    out: Vec<Instruction>,
}

impl Emitter {
    /// Emit `node`, whose items all start at path offset `depth`.
    fn node(&mut self, node: &Node, depth: usize) {
        let count = node.items.len();
        for (n, item) in node.items.iter().enumerate() {
            match item {
                Item::Route(index) => self.out.push(Instruction::Route(*index)),
                Item::Edge { label, child } => {
                    let first = self.out.len();
                    for chunk in label.chunks(CHUNK) {
                        let mut bytes = [0; CHUNK];
                        bytes[..chunk.len()].copy_from_slice(chunk);
                        self.out.push(Instruction::Literal {
                            bytes,
                            // chunk.len() <= CHUNK
                            len: chunk.len() as u8,
                            on_mismatch: Target::Fail,
                        });
                    }
                    let chunks_end = self.out.len();

                    self.node(child, depth + label.len());

                    // A sibling follows at this depth, so the cursor has to be
                    // restored. The last item hands that job to the parent.
                    let reset = self.out.len();
                    if n + 1 < count {
                        self.out.push(Instruction::SetCursor(depth));
                    }
                    let after = self.out.len();

                    for (k, pc) in (first..chunks_end).enumerate() {
                        // a failed first chunk never moved the cursor
                        let target = if k == 0 { after } else { reset };
                        if let Instruction::Literal { on_mismatch, .. } = &mut self.out[pc] {
                            *on_mismatch = Target::Index(target);
                        }
                    }
                }
            }
        }
    }

    /// Replace jumps into the trailing cursor resets (or past the end) with
    /// an explicit failure.
    fn finish(mut self) -> Program {
        let tail = self
            .out
            .iter()
            .rposition(|i| !matches!(i, Instruction::SetCursor(_)))
            .map_or(0, |i| i + 1);
        for inst in &mut self.out {
            if let Instruction::Literal { on_mismatch, .. } = inst {
                if matches!(on_mismatch, Target::Index(t) if *t >= tail) {
                    *on_mismatch = Target::Fail;
                }
            }
        }
        self.out.truncate(tail);
        Program { instructions: self.out }
    }
}

/// Compile `routes`, in table order, into a [`Program`].
pub fn compile(routes: &[Route]) -> Program {
    let mut root = Node::default();
    for (index, route) in routes.iter().enumerate() {
        root.insert(route.prefix().as_bytes(), index);
    }

    let mut emitter = Emitter { out: Vec::new() };
    emitter.node(&root, 0);
    emitter.finish()
}
