/*! Rewrites a pattern so that it matches canonically equivalent text.

The pattern is decomposed, and every literal base character followed by
combining marks is replaced with a non-capturing group listing the
sequences that are canonically equivalent to it: the marks in every order
that doesn't swap two marks of the same combining class, and the same
sequences with the base character composed with the first mark. For
instance `e\u{301}\u{323}` becomes a group with four alternatives, one of
them being `ẹ\u{301}`.

Hangul syllables decompose into conjoining jamo, which are not combining
marks, so runs of jamo are handled apart: they are replaced with a group
listing the jamo, the partially composed syllable and the precomposed one.

Classes are composed back instead, and the parser compiles them into nodes
that compose the input before testing it.
*/

use itertools::Itertools;
use unicode_normalization::char::{canonical_combining_class, compose};
use unicode_normalization::UnicodeNormalization;

use crate::unicode::{
    is_combining_mark, is_leading_jamo, is_trailing_jamo, is_vowel_jamo,
};

/// Sequences with more marks than this keep their marks in the original
/// order only.
const MAX_PERMUTED_MARKS: usize = 5;

pub(super) fn normalize(pattern: &[char]) -> Vec<char> {
    let decomposed: Vec<char> = pattern.iter().copied().nfd().collect();
    let mut result = Vec::with_capacity(decomposed.len());
    let mut i = 0;

    while i < decomposed.len() {
        match decomposed[i] {
            '\\' => {
                let end = (i + 2).min(decomposed.len());
                result.extend_from_slice(&decomposed[i..end]);
                i = end;
            }
            '[' => {
                i = copy_class(&decomposed, i, &mut result);
            }
            _ if hangul_run(&decomposed[i..]) > 0 => {
                let end = i + hangul_run(&decomposed[i..]);
                push_alternation(
                    &mut result,
                    &hangul_equivalents(&decomposed[i..end]),
                );
                i = end;
            }
            base => {
                let mut end = i + 1;
                while end < decomposed.len()
                    && is_combining_mark(decomposed[end])
                {
                    end += 1;
                }

                let is_literal =
                    !base.is_ascii() || base.is_ascii_alphanumeric();

                if end > i + 1 && is_literal {
                    let cluster = &decomposed[i..end];
                    let mut alternatives = Vec::new();
                    equivalents(cluster, cluster, &mut alternatives);
                    push_alternation(&mut result, &alternatives);
                } else {
                    result.extend_from_slice(&decomposed[i..end]);
                }

                i = end;
            }
        }
    }

    result
}

fn push_alternation(result: &mut Vec<char>, alternatives: &[Vec<char>]) {
    result.extend(['(', '?', ':']);
    for (n, alternative) in alternatives.iter().enumerate() {
        if n > 0 {
            result.push('|');
        }
        result.extend_from_slice(alternative);
    }
    result.push(')');
}

/// Length of the run of conjoining jamo at the start of `chars` that
/// composes into a Hangul syllable: a leading and a vowel jamo, optionally
/// followed by a trailing one. Zero if there is no such run.
fn hangul_run(chars: &[char]) -> usize {
    match chars {
        [l, v, t, ..]
            if is_leading_jamo(*l)
                && is_vowel_jamo(*v)
                && is_trailing_jamo(*t) =>
        {
            3
        }
        [l, v, ..] if is_leading_jamo(*l) && is_vowel_jamo(*v) => 2,
        _ => 0,
    }
}

/// The spellings of a Hangul syllable given as a jamo run: the jamo
/// themselves, the LV syllable followed by the trailing jamo, and the
/// precomposed syllable.
fn hangul_equivalents(run: &[char]) -> Vec<Vec<char>> {
    let mut alternatives = vec![run.to_vec()];

    let Some(lv) = compose(run[0], run[1]) else {
        return alternatives;
    };

    match run.get(2) {
        Some(t) => {
            alternatives.push(vec![lv, *t]);
            if let Some(lvt) = compose(lv, *t) {
                alternatives.push(vec![lvt]);
            }
        }
        None => alternatives.push(vec![lv]),
    }

    alternatives
}

/// Copies the class starting at `start` into `result`, composing it, and
/// returns the index that follows the class.
fn copy_class(
    pattern: &[char],
    start: usize,
    result: &mut Vec<char>,
) -> usize {
    let mut depth = 0;
    let mut i = start;

    while i < pattern.len() {
        match pattern[i] {
            '\\' => i += 2,
            '[' => {
                depth += 1;
                i += 1;
                if pattern.get(i) == Some(&'^') {
                    i += 1;
                }
                // A bracket right after the opening one is a literal.
                if pattern.get(i) == Some(&']') {
                    i += 1;
                }
            }
            ']' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    break;
                }
            }
            _ => i += 1,
        }
    }

    let end = i.min(pattern.len());
    result.extend(pattern[start..end].iter().copied().nfc());
    end
}

/// Collects into `out` the sequences derived from `cluster` that decompose
/// into `target`. `cluster` is a base character followed by combining
/// marks, `target` is the decomposed sequence the pattern contained.
fn equivalents(cluster: &[char], target: &[char], out: &mut Vec<Vec<char>>) {
    let base = cluster[0];
    let marks = &cluster[1..];

    if marks.is_empty() {
        push_equivalent(out, vec![base], target);
        return;
    }

    for perm in permutations(marks) {
        let mut alternative = Vec::with_capacity(cluster.len());
        alternative.push(base);
        alternative.extend_from_slice(&perm);
        push_equivalent(out, alternative, target);

        if let Some(composed) = compose(base, perm[0]) {
            let mut next = Vec::with_capacity(perm.len());
            next.push(composed);
            next.extend_from_slice(&perm[1..]);
            equivalents(&next, target, out);
        }
    }
}

/// Orderings of `marks` that only swap marks of different combining
/// classes, starting with `marks` itself.
fn permutations(marks: &[char]) -> Vec<Vec<char>> {
    if marks.len() > MAX_PERMUTED_MARKS {
        return vec![marks.to_vec()];
    }

    let sorted = canonical_order(marks.to_vec());
    let mut result = vec![marks.to_vec()];

    for perm in marks.iter().copied().permutations(marks.len()) {
        if !result.contains(&perm) && canonical_order(perm.clone()) == sorted {
            result.push(perm);
        }
    }

    result
}

fn canonical_order(mut marks: Vec<char>) -> Vec<char> {
    marks.sort_by_key(|c| canonical_combining_class(*c));
    marks
}

fn push_equivalent(
    out: &mut Vec<Vec<char>>,
    alternative: Vec<char>,
    target: &[char],
) {
    if out.contains(&alternative) {
        return;
    }
    if alternative.iter().copied().nfd().eq(target.iter().copied()) {
        out.push(alternative);
    }
}
