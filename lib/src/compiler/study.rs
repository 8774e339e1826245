use crate::program::{Greed, NodeId, NodeKind, Program, MAX_REPS};

/// Facts about the input a sub-program can consume, collected by [`study`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct TreeInfo {
    /// Minimum number of characters consumed by any match.
    pub min_length: usize,
    /// Maximum number of characters consumed by any match. Only meaningful
    /// if `max_valid` is true.
    pub max_length: usize,
    pub max_valid: bool,
    /// True if every match consumes exactly the same number of characters,
    /// following a single path through the program.
    pub deterministic: bool,
}

impl TreeInfo {
    pub fn new() -> Self {
        Self {
            min_length: 0,
            max_length: 0,
            max_valid: true,
            deterministic: true,
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn add_fixed(&mut self, len: usize) {
        self.min_length = self.min_length.saturating_add(len);
        self.max_length = self.max_length.saturating_add(len);
    }
}

/// Walks the sub-program starting at `id` until an accepting node is found,
/// accumulating into `info`.
///
/// The returned value is `info.deterministic` at the end of the walk, except
/// for nodes that are known to make the rest of the program
/// non-deterministic.
pub(super) fn study(
    program: &Program,
    id: NodeId,
    info: &mut TreeInfo,
) -> bool {
    let node = program.node(id);
    match &node.kind {
        NodeKind::Accept | NodeKind::BranchConn => info.deterministic,
        NodeKind::LastAccept
        | NodeKind::LookBehindEnd
        | NodeKind::Begin
        | NodeKind::End
        | NodeKind::Caret { .. }
        | NodeKind::Dollar { .. }
        | NodeKind::LastMatch
        | NodeKind::WordBoundary { .. }
        | NodeKind::GroupHead { .. }
        | NodeKind::GroupTail { .. }
        | NodeKind::LookAhead { .. }
        | NodeKind::LookBehind { .. } => study(program, node.next, info),
        NodeKind::Start { .. } => {
            study(program, node.next, info);
            info.max_valid = false;
            info.deterministic = false;
            false
        }
        NodeKind::BoyerMoore(bm) => {
            info.min_length = info.min_length.saturating_add(bm.chars.len());
            info.max_valid = false;
            study(program, node.next, info)
        }
        NodeKind::LineEnding => {
            info.min_length = info.min_length.saturating_add(1);
            info.max_length = info.max_length.saturating_add(2);
            info.deterministic = false;
            study(program, node.next, info)
        }
        NodeKind::Char(_) => {
            info.add_fixed(1);
            study(program, node.next, info)
        }
        NodeKind::CanonChar(_) => {
            // Consumes a base character plus any number of combining marks.
            info.min_length = info.min_length.saturating_add(1);
            info.max_valid = false;
            info.deterministic = false;
            study(program, node.next, info)
        }
        NodeKind::Slice { chars, .. } => {
            info.add_fixed(chars.len());
            study(program, node.next, info)
        }
        NodeKind::CharGreedy { min, .. } => {
            info.min_length = info.min_length.saturating_add(*min);
            info.max_valid = false;
            info.deterministic = false;
            study(program, node.next, info)
        }
        NodeKind::Ques { atom, greed } => {
            if *greed == Greed::Independent {
                study(program, *atom, info);
            } else {
                let min_length = info.min_length;
                study(program, *atom, info);
                info.min_length = min_length;
                info.deterministic = false;
            }
            study(program, node.next, info)
        }
        NodeKind::Curly { atom, min, max, .. }
        | NodeKind::GroupCurly { atom, min, max, .. } => {
            study_repetition(program, *atom, *min, *max, info);
            study(program, node.next, info)
        }
        NodeKind::Prolog { lp } => study(program, *lp, info),
        NodeKind::Loop { .. } => {
            info.max_valid = false;
            info.deterministic = false;
            false
        }
        NodeKind::Branch { alternatives, conn } => {
            let saved = *info;
            let mut min_length = usize::MAX;
            let mut max_length = 0;
            let mut max_valid = true;

            for alternative in alternatives {
                info.reset();
                if let Some(alternative) = alternative {
                    study(program, *alternative, info);
                }
                min_length = min_length.min(info.min_length);
                max_length = max_length.max(info.max_length);
                max_valid &= info.max_valid;
            }

            info.reset();
            study(program, program.node(*conn).next, info);

            info.min_length = info
                .min_length
                .saturating_add(saved.min_length)
                .saturating_add(min_length);
            info.max_length = info
                .max_length
                .saturating_add(saved.max_length)
                .saturating_add(max_length);
            info.max_valid &= saved.max_valid && max_valid;
            info.deterministic = false;
            false
        }
        NodeKind::BackRef { .. } => {
            info.max_valid = false;
            study(program, node.next, info)
        }
    }
}

/// Studies `atom` repeated between `min` and `max` times, and combines the
/// result with what was collected before.
fn study_repetition(
    program: &Program,
    atom: NodeId,
    min: usize,
    max: usize,
    info: &mut TreeInfo,
) {
    let saved = *info;

    info.reset();
    study(program, atom, info);

    info.min_length = info
        .min_length
        .saturating_mul(min)
        .saturating_add(saved.min_length);

    if saved.max_valid && info.max_valid && max != MAX_REPS {
        match info
            .max_length
            .checked_mul(max)
            .and_then(|len| len.checked_add(saved.max_length))
        {
            Some(len) => info.max_length = len,
            None => info.max_valid = false,
        }
    } else {
        info.max_valid = false;
    }

    info.deterministic =
        info.deterministic && min == max && saved.deterministic;
}
