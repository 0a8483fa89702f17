//! Lexical scan of executable statements for procedure references.
//!
//! Nothing is evaluated: a statement is searched for `call name`, for
//! `name(` at every parenthesis depth, and for component chains such as
//! `obj%child%method(`. Array references look the same as function references
//! here; they are told apart once names are resolved.

use super::patterns::{CALL_RE, SUBCALL_RE};
use super::text::{paren_split, squeeze, strip_paren};
use crate::entity::{CallRef, Link};
use crate::intrinsics::is_intrinsic;

/// Names bound by enclosing `associate` constructs, innermost last.
#[derive(Debug, Clone, Default)]
pub struct Associations {
    batches: Vec<Vec<(String, Vec<String>)>>,
}

impl Associations {
    /// Register the `name => selector` pairs of one `associate` statement.
    pub fn add_batch(&mut self, associations: &str) {
        let mut batch = Vec::new();
        for item in paren_split(associations, ',') {
            let Some((name, selector)) = item.split_once("=>") else {
                continue;
            };
            let mut chain = normalize_chain(selector);
            self.expand(&mut chain);
            batch.push((name.trim().to_ascii_lowercase(), chain));
        }
        self.batches.push(batch);
    }

    pub fn remove_last_batch(&mut self) {
        self.batches.pop();
    }

    fn get(&self, name: &str) -> Option<&[String]> {
        let key = name.to_ascii_lowercase();
        self.batches
            .iter()
            .rev()
            .flat_map(|batch| batch.iter())
            .find(|(n, _)| *n == key)
            .map(|(_, chain)| chain.as_slice())
    }

    /// Replace an associate name at the head of `chain` by its selector.
    fn expand(&self, chain: &mut Vec<String>) {
        if let Some(head) = chain.first() {
            if let Some(selector) = self.get(head) {
                let selector = selector.to_vec();
                chain.splice(0..1, selector);
            }
        }
    }
}

/// Split `a % b() % c` into its components, dropping whitespace and `()`.
fn normalize_chain(text: &str) -> Vec<String> {
    squeeze(text)
        .replace("()", "")
        .split('%')
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Add the procedure references found in `statement` to `calls`.
///
/// `statement` must have its string literals masked. Intrinsics and names
/// already present in `calls` are skipped.
pub fn scan_calls(statement: &str, associations: &Associations, calls: &mut Vec<CallRef>) {
    let mut chains = Vec::new();
    let mut depth = 0;

    let top = strip_paren(statement, 0).concat();
    if let Some(caps) = SUBCALL_RE.captures(top.trim()) {
        chains.push(caps["call_chain"].to_string());
        depth = 1;
    }

    loop {
        let segments = strip_paren(statement, depth);
        if segments.is_empty() {
            break;
        }
        for segment in &segments {
            for caps in CALL_RE.captures_iter(segment) {
                chains.push(caps["call_chain"].to_string());
            }
        }
        depth += 1;
    }

    for text in chains {
        let mut chain = normalize_chain(&text);
        associations.expand(&mut chain);
        let Some(name) = chain.last() else {
            continue;
        };
        if is_intrinsic(name) || calls.iter().any(|c| c.name().eq_ignore_ascii_case(name)) {
            continue;
        }
        calls.push(CallRef {
            chain,
            link: Link::Unresolved,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(statement: &str) -> Vec<String> {
        let mut calls = Vec::new();
        scan_calls(statement, &Associations::default(), &mut calls);
        calls.into_iter().map(|c| c.chain.join("%")).collect()
    }

    #[test]
    fn test_subroutine_call() {
        assert_eq!(names("call foo(x, y)"), vec!["foo"]);
        assert_eq!(names("if (ready) call obj%run(bar(1))"), vec!["obj%run", "bar"]);
    }

    #[test]
    fn test_nested_function_references() {
        assert_eq!(names("x = f(g(h(1)), 2)"), vec!["f", "g", "h"]);
        assert_eq!(names("y = a%b(1)%solve(z)"), vec!["a%b%solve"]);
    }

    #[test]
    fn test_intrinsics_and_keywords_skipped() {
        assert!(names("x = sqrt(abs(y))").is_empty());
        assert_eq!(names("if (size(v) > 0) then"), Vec::<String>::new());
        assert_eq!(names("write(*, *) norm(v)"), vec!["norm"]);
    }

    #[test]
    fn test_duplicates_skipped() {
        let mut calls = Vec::new();
        let assoc = Associations::default();
        scan_calls("call foo()", &assoc, &mut calls);
        scan_calls("x = FOO(2)", &assoc, &mut calls);
        assert_eq!(calls.len(), 1);
    }

    #[test]
    fn test_associate_names_expanded() {
        let mut assoc = Associations::default();
        assoc.add_batch("p => state%particles, n => count");
        let mut calls = Vec::new();
        scan_calls("call p%push(1)", &assoc, &mut calls);
        assert_eq!(calls[0].chain, vec!["state", "particles", "push"]);
        assoc.remove_last_batch();
        calls.clear();
        scan_calls("call p%push(1)", &assoc, &mut calls);
        assert_eq!(calls[0].chain, vec!["p", "push"]);
    }
}
