use anyhow::Result;
use std::future::Future;

/// Fetches a single resource by its key(s).
///
/// If any key is empty the lookup returns `Ok(None)` without calling
/// `fetch`; hosts probe key columns speculatively and an empty key simply
/// means "no such row". Otherwise exactly one remote call is made.
pub async fn lookup<T, F, Fut>(keys: &[&str], fetch: F) -> Result<Option<T>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if keys.iter().any(|key| key.is_empty()) {
        return Ok(None);
    }
    fetch().await.map(Some)
}

/// Recognizes remote errors that mean "resource does not exist".
///
/// Either matches markers embedded in the error chain, such as the `(404)`
/// status tag of the client's error message, or delegates to a function
/// that inspects the error itself (e.g. downcasts to a typed status error).
#[derive(Clone, Debug)]
pub struct NotFoundPredicate {
    check: Check,
}

#[derive(Clone, Debug)]
enum Check {
    Markers(Vec<String>),
    Fn(fn(&anyhow::Error) -> bool),
}

impl NotFoundPredicate {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            check: Check::Markers(markers.into_iter().map(Into::into).collect()),
        }
    }

    pub fn from_fn(check: fn(&anyhow::Error) -> bool) -> Self {
        Self {
            check: Check::Fn(check),
        }
    }

    pub fn matches(&self, err: &anyhow::Error) -> bool {
        match &self.check {
            Check::Markers(markers) => {
                let message = format!("{:#}", err);
                markers
                    .iter()
                    .any(|marker| message.contains(marker.as_str()))
            }
            Check::Fn(check) => check(err),
        }
    }
}

impl Default for NotFoundPredicate {
    fn default() -> Self {
        Self::new(["(404)"])
    }
}
