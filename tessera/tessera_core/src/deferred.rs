//! Deferred values.
//!
//! A [`Deferred`] is a value that is not known until provisioning time, such
//! as a generated ARN. The framework composes deferred values but never
//! waits on them: combining several of them (for example to JSON-encode an
//! environment entry) goes through [`Deferred::map`], [`Deferred::zip`] and
//! [`Deferred::combine`], and the provisioning runtime drives the resulting
//! futures on its own scheduler.
//!
//! Values that are already known stay synchronous, so mapping over them is
//! applied immediately and can be observed with [`Deferred::peek`].

use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::fmt;
use std::future::Future;

/// A value that may only become available during provisioning.
pub struct Deferred<T: Clone + Send + Sync + 'static> {
    state: State<T>,
}

enum State<T: Clone + Send + Sync + 'static> {
    Known(T),
    Pending(Shared<BoxFuture<'static, T>>),
}

impl<T: Clone + Send + Sync + 'static> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        let state = match &self.state {
            State::Known(value) => State::Known(value.clone()),
            State::Pending(fut) => State::Pending(fut.clone()),
        };
        Self { state }
    }
}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peek() {
            Some(value) => f.debug_tuple("Deferred::Known").field(&value).finish(),
            None => f.write_str("Deferred::Pending"),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Deferred<T> {
    /// Wrap a value that is already known.
    pub fn known(value: T) -> Self {
        Self {
            state: State::Known(value),
        }
    }

    /// Wrap a future that produces the value.
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            state: State::Pending(fut.boxed().shared()),
        }
    }

    /// Create a value that is resolved later through the returned [`Resolver`].
    ///
    /// If the resolver is dropped without resolving, the value stays pending
    /// forever.
    pub fn pending() -> (Self, Resolver<T>) {
        let (tx, rx) = oneshot::channel();
        let fut = async move {
            match rx.await {
                Ok(value) => value,
                Err(_) => future::pending().await,
            }
        };
        (Self::from_future(fut), Resolver { tx })
    }

    /// Whether the value is already available.
    pub fn is_known(&self) -> bool {
        self.peek().is_some()
    }

    /// Read the value if it is available, without waiting.
    pub fn peek(&self) -> Option<T> {
        match &self.state {
            State::Known(value) => Some(value.clone()),
            State::Pending(fut) => fut.peek().cloned(),
        }
    }

    /// Derive a new deferred value.
    pub fn map<U, F>(&self, f: F) -> Deferred<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match &self.state {
            State::Known(value) => Deferred::known(f(value.clone())),
            State::Pending(fut) => Deferred::from_future(fut.clone().map(f)),
        }
    }

    /// Combine two deferred values into a pair.
    pub fn zip<U>(&self, other: &Deferred<U>) -> Deferred<(T, U)>
    where
        U: Clone + Send + Sync + 'static,
    {
        match (self.peek(), other.peek()) {
            (Some(a), Some(b)) => Deferred::known((a, b)),
            _ => {
                let a = self.clone().into_future();
                let b = other.clone().into_future();
                Deferred::from_future(future::join(a, b))
            }
        }
    }

    /// Combine many deferred values, preserving their order.
    pub fn combine(values: Vec<Deferred<T>>) -> Deferred<Vec<T>> {
        let known: Option<Vec<T>> = values.iter().map(Deferred::peek).collect();
        match known {
            Some(all) => Deferred::known(all),
            None => Deferred::from_future(future::join_all(
                values.into_iter().map(Deferred::into_future),
            )),
        }
    }

    /// Convert into a future yielding the value.
    pub fn into_future(self) -> BoxFuture<'static, T> {
        match self.state {
            State::Known(value) => future::ready(value).boxed(),
            State::Pending(fut) => fut.boxed(),
        }
    }

    /// Wait for the value. Only the provisioning runtime and tests call this.
    pub async fn resolve(&self) -> T {
        self.clone().into_future().await
    }
}

impl<T: Clone + Send + Sync + 'static> From<T> for Deferred<T> {
    fn from(value: T) -> Self {
        Self::known(value)
    }
}

/// Resolves a [`Deferred`] created with [`Deferred::pending`].
pub struct Resolver<T> {
    tx: oneshot::Sender<T>,
}

impl<T> Resolver<T> {
    /// Provide the value. Returns `false` if every copy of the deferred
    /// value has already been dropped.
    pub fn resolve(self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}

/// A construction input: either a plain JSON value or a deferred one.
#[derive(Clone, Debug)]
pub enum Input {
    /// A value known at synthesis time
    Known(Value),
    /// A value produced during provisioning
    Deferred(Deferred<Value>),
}

impl Input {
    /// View the input as a deferred value.
    pub fn to_deferred(&self) -> Deferred<Value> {
        match self {
            Input::Known(value) => Deferred::known(value.clone()),
            Input::Deferred(deferred) => deferred.clone(),
        }
    }

    /// Read the value if available.
    pub fn peek(&self) -> Option<Value> {
        match self {
            Input::Known(value) => Some(value.clone()),
            Input::Deferred(deferred) => deferred.peek(),
        }
    }

    /// A known null or empty string counts as unset. Deferred inputs are
    /// always considered set.
    pub fn is_unset(&self) -> bool {
        match self {
            Input::Known(Value::Null) => true,
            Input::Known(Value::String(s)) => s.is_empty(),
            _ => false,
        }
    }

    /// The known string value, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Input::Known(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Known(value)
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Input::Known(Value::String(value.to_string()))
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Input::Known(Value::String(value))
    }
}

impl From<bool> for Input {
    fn from(value: bool) -> Self {
        Input::Known(Value::Bool(value))
    }
}

impl From<i64> for Input {
    fn from(value: i64) -> Self {
        Input::Known(Value::from(value))
    }
}

impl From<u64> for Input {
    fn from(value: u64) -> Self {
        Input::Known(Value::from(value))
    }
}

impl From<i32> for Input {
    fn from(value: i32) -> Self {
        Input::Known(Value::from(value))
    }
}

impl From<Deferred<Value>> for Input {
    fn from(value: Deferred<Value>) -> Self {
        Input::Deferred(value)
    }
}

impl From<Deferred<String>> for Input {
    fn from(value: Deferred<String>) -> Self {
        Input::Deferred(value.map(Value::String))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_values_map_synchronously() {
        let d = Deferred::known(2).map(|v| v * 21);
        assert_eq!(d.peek(), Some(42));
        assert!(d.is_known());
    }

    #[test]
    fn test_pending_value_is_not_observable_before_resolution() {
        let (d, _resolver) = Deferred::<String>::pending();
        let mapped = d.map(|s| s.len());
        assert_eq!(d.peek(), None);
        assert_eq!(mapped.peek(), None);
    }

    #[tokio::test]
    async fn test_pending_value_resolves_through_combinators() {
        let (arn, resolver) = Deferred::<String>::pending();
        let upper = arn.map(|s| s.to_uppercase());
        let both = Deferred::combine(vec![Deferred::known("a".to_string()), upper]);

        assert!(resolver.resolve("arn:aws:s3:::bucket".to_string()));
        assert_eq!(
            both.resolve().await,
            vec!["a".to_string(), "ARN:AWS:S3:::BUCKET".to_string()]
        );
    }

    #[tokio::test]
    async fn test_zip_pairs_values() {
        let (name, resolver) = Deferred::<String>::pending();
        let pair = Deferred::known(1).zip(&name);
        resolver.resolve("x".to_string());
        assert_eq!(pair.resolve().await, (1, "x".to_string()));
    }

    #[test]
    fn test_combine_of_known_values_stays_known() {
        let all = Deferred::combine(vec![Deferred::known(1), Deferred::known(2)]);
        assert_eq!(all.peek(), Some(vec![1, 2]));
    }

    #[test]
    fn test_input_unset() {
        assert!(Input::Known(Value::Null).is_unset());
        assert!(Input::from("").is_unset());
        assert!(!Input::from("x").is_unset());
        let (d, _r) = Deferred::<Value>::pending();
        assert!(!Input::Deferred(d).is_unset());
    }

    #[test]
    fn test_input_from_deferred_string() {
        let input = Input::from(Deferred::known("bucket".to_string()));
        assert_eq!(input.peek(), Some(json!("bucket")));
    }
}
