use crate::program::{BoyerMoore, CaseFold, NodeKind, Program};

use super::study::{study, TreeInfo};

/// Literals shorter than this are searched for by trying every position.
const MIN_BOYER_MOORE_LEN: usize = 4;

/// Chooses the entry point for unanchored searches.
///
/// A program that starts with a case-sensitive literal gets a Boyer-Moore
/// search node, a program that starts with `\A` (or `^` without
/// `Multiline`) is used as is, and anything else is wrapped in a node that
/// tries every position.
pub(super) fn optimize(program: &mut Program) {
    let match_root = program.match_root;
    let node = program.node(match_root);

    let root = match &node.kind {
        NodeKind::Slice { chars, fold: CaseFold::None }
            if chars.len() >= MIN_BOYER_MOORE_LEN =>
        {
            let bm = boyer_moore(chars);
            let next = node.next;
            program.push_with_next(NodeKind::BoyerMoore(bm), next)
        }
        NodeKind::Begin => match_root,
        _ => {
            let mut info = TreeInfo::new();
            study(program, match_root, &mut info);
            program.push_with_next(
                NodeKind::Start { min_length: info.min_length },
                match_root,
            )
        }
    };

    program.root = root;
}

fn boyer_moore(chars: &[char]) -> BoyerMoore {
    let len = chars.len();
    let mut last_occurrence = Box::new([0usize; 128]);

    for (i, c) in chars.iter().enumerate() {
        last_occurrence[(*c as usize) & 0x7F] = i + 1;
    }

    let mut good_suffix = vec![0usize; len];

    'shift: for i in (1..=len).rev() {
        // `j` counts down to `i - 1`, so it never wraps.
        let mut j = len - 1;
        while j >= i {
            if chars[j] != chars[j - i] {
                continue 'shift;
            }
            good_suffix[j - 1] = i;
            j -= 1;
        }
        while j > 0 {
            j -= 1;
            good_suffix[j] = i;
        }
    }

    good_suffix[len - 1] = 1;

    BoyerMoore {
        chars: chars.into(),
        last_occurrence,
        good_suffix: good_suffix.into_boxed_slice(),
    }
}
