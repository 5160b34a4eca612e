//! Statement completions
//!
//! Every statement evaluates to a completion. `break`, `continue` and
//! `return` are ordinary values of this type and unwind by being returned
//! up the statement tree; thrown exceptions take the `Err` path instead.

use crate::runtime::Value;

/// How a statement finished
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionKind {
    /// Fell off the end
    Normal,
    /// `break`, optionally labelled
    Break(Option<String>),
    /// `continue`, optionally labelled
    Continue(Option<String>),
    /// `return`
    Return,
}

/// Result of executing a statement
#[derive(Debug, Clone)]
pub struct Completion {
    pub kind: CompletionKind,
    /// Statement value; `None` is "empty", distinct from `undefined`
    pub value: Option<Value>,
}

impl Completion {
    /// Normal completion with an empty value
    pub fn empty() -> Self {
        Self {
            kind: CompletionKind::Normal,
            value: None,
        }
    }

    /// Normal completion carrying a value
    pub fn normal(value: Value) -> Self {
        Self {
            kind: CompletionKind::Normal,
            value: Some(value),
        }
    }

    /// Return completion carrying the returned value
    pub fn returned(value: Value) -> Self {
        Self {
            kind: CompletionKind::Return,
            value: Some(value),
        }
    }

    pub fn is_normal(&self) -> bool {
        self.kind == CompletionKind::Normal
    }

    /// Whether this is a `break` that a statement carrying `labels` consumes
    pub fn breaks(&self, labels: &[String]) -> bool {
        match &self.kind {
            CompletionKind::Break(None) => true,
            CompletionKind::Break(Some(l)) => labels.contains(l),
            _ => false,
        }
    }

    /// Whether this is a `continue` aimed at a loop carrying `labels`
    pub fn continues(&self, labels: &[String]) -> bool {
        match &self.kind {
            CompletionKind::Continue(None) => true,
            CompletionKind::Continue(Some(l)) => labels.contains(l),
            _ => false,
        }
    }

    /// Fill in an empty value from an earlier statement
    pub fn or_value(mut self, value: &Option<Value>) -> Self {
        if self.value.is_none() {
            self.value = value.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_matching() {
        let labels = vec!["outer".to_string()];
        let plain = Completion {
            kind: CompletionKind::Break(None),
            value: None,
        };
        let labelled = Completion {
            kind: CompletionKind::Continue(Some("outer".into())),
            value: None,
        };
        let other = Completion {
            kind: CompletionKind::Break(Some("inner".into())),
            value: None,
        };
        assert!(plain.breaks(&[]));
        assert!(labelled.continues(&labels));
        assert!(!labelled.breaks(&labels));
        assert!(!other.breaks(&labels));
    }

    #[test]
    fn test_empty_value_is_filled() {
        let c = Completion::empty().or_value(&Some(Value::Number(1.0)));
        assert_eq!(c.value, Some(Value::Number(1.0)));
        let c = Completion::normal(Value::Null).or_value(&Some(Value::Number(1.0)));
        assert_eq!(c.value, Some(Value::Null));
    }
}
