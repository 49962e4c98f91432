//! Resolution of every secret reference in an environment
//!
//! One invocation runs strictly in order: parse all references, assume the
//! role once, fetch all secrets concurrently, transform every payload,
//! deliver every value, and finally rebuild the environment. Any failure
//! aborts the whole invocation and nothing is returned.

use crate::reference::{parse_environment, Destination, ParseContext, SecretReference};
use crate::sink::{absolute_path, DestinationSink};
use crate::transform::transform;
use getsecret_core::{
    AssumedCredential, EnvironmentImage, Error, Result, SecretBackend, SecretValue,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Options for one resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Warn about placeholders that expand to nothing
    pub verbose: bool,
}

/// Outcome of one concurrent fetch
struct Retrieval {
    reference: SecretReference,
    result: Result<SecretValue>,
}

/// Resolves secret references against a backend
pub struct SecretInjector {
    backend: Arc<dyn SecretBackend>,
    options: ResolveOptions,
}

impl SecretInjector {
    #[must_use]
    pub fn new(backend: Arc<dyn SecretBackend>) -> Self {
        Self {
            backend,
            options: ResolveOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve every reference in `env`, expanding placeholders from the
    /// process environment, and return the environment for the child.
    pub async fn resolve(&self, env: &EnvironmentImage) -> Result<EnvironmentImage> {
        let ctx = ParseContext::new(self.options.verbose);
        self.resolve_with(env, &ctx).await
    }

    /// Like [`resolve`](Self::resolve) with an explicit parse context
    pub async fn resolve_with(
        &self,
        env: &EnvironmentImage,
        ctx: &ParseContext<'_>,
    ) -> Result<EnvironmentImage> {
        let references = parse_environment(env, ctx)?;
        if references.is_empty() {
            tracing::debug!("no secret references in environment");
            return Ok(env.clone());
        }
        check_conflicts(&references)?;

        tracing::debug!(references = references.len(), "resolving secrets");
        let credential = self.backend.assume_role().await?;
        let fetched = self.fetch_all(references, credential).await?;

        let values = fetched
            .into_iter()
            .map(|(reference, payload)| {
                transform(&reference, payload).map(|value| (reference, value))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut sink = DestinationSink::new();
        for (reference, value) in values {
            sink.deliver(reference.destination(), value)?;
            tracing::debug!(
                variable = %reference.variable(),
                secret_id = %reference.secret_id(),
                destination = %reference.destination(),
                "resolved secret"
            );
        }

        Ok(env.with_overrides(sink.env_overrides()))
    }

    /// Fetch every reference concurrently.
    ///
    /// Results come back in completion order. The first failure aborts the
    /// fetches still in flight.
    async fn fetch_all(
        &self,
        references: Vec<SecretReference>,
        credential: Option<AssumedCredential>,
    ) -> Result<Vec<(SecretReference, Vec<u8>)>> {
        let count = references.len();
        let credential = Arc::new(credential);
        let (tx, mut rx) = mpsc::channel::<Retrieval>(count);

        let handles: Vec<JoinHandle<()>> = references
            .into_iter()
            .map(|reference| {
                let tx = tx.clone();
                let backend = Arc::clone(&self.backend);
                let credential = Arc::clone(&credential);
                tokio::spawn(async move {
                    let result = backend
                        .fetch_secret((*credential).as_ref(), reference.secret_id())
                        .await;
                    // The receiver is gone once another fetch has failed
                    let _ = tx.send(Retrieval { reference, result }).await;
                })
            })
            .collect();
        drop(tx);

        let mut fetched = Vec::with_capacity(count);
        while fetched.len() < count {
            let Some(retrieval) = rx.recv().await else {
                abort_all(&handles);
                return Err(Error::configuration(
                    "a secret retrieval ended without reporting a result",
                ));
            };
            match retrieval.result {
                Ok(value) => fetched.push((retrieval.reference, value.payload())),
                Err(source) => {
                    abort_all(&handles);
                    return Err(Error::secret_fetch(retrieval.reference.secret_id(), source));
                }
            }
        }

        Ok(fetched)
    }
}

fn abort_all(handles: &[JoinHandle<()>]) {
    for handle in handles {
        handle.abort();
    }
}

/// Reject references that would overwrite each other's destination
fn check_conflicts(references: &[SecretReference]) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for reference in references {
        let key = match reference.destination() {
            Destination::Env { name } => format!("environment variable {name}"),
            Destination::File { path, .. } => format!("file {}", absolute_path(path)?.display()),
        };
        if let Some(first) = seen.get(&key) {
            return Err(Error::destination_conflict(key, *first, reference.variable()));
        }
        seen.insert(key, reference.variable());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Backend that serves fixed values and counts calls
    #[derive(Default)]
    struct StaticBackend {
        secrets: HashMap<String, SecretValue>,
        assume_calls: AtomicUsize,
        fetch_calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl StaticBackend {
        fn with(mut self, id: &str, value: SecretValue) -> Self {
            self.secrets.insert(id.to_string(), value);
            self
        }
    }

    #[async_trait]
    impl SecretBackend for StaticBackend {
        async fn assume_role(&self) -> Result<Option<AssumedCredential>> {
            self.assume_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(AssumedCredential::new("AKIA", "secret", "token")))
        }

        async fn fetch_secret(
            &self,
            credential: Option<&AssumedCredential>,
            secret_id: &str,
        ) -> Result<SecretValue> {
            assert!(credential.is_some(), "assumed credential must be passed on");
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.secrets
                .get(secret_id)
                .cloned()
                .ok_or_else(|| Error::backend("test", "ResourceNotFoundException", "not found"))
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    async fn resolve(backend: Arc<StaticBackend>, env: Vec<&str>) -> Result<EnvironmentImage> {
        let env: EnvironmentImage = env.into_iter().collect();
        SecretInjector::new(backend)
            .resolve_with(&env, &ParseContext::with_lookup(false, &no_env))
            .await
    }

    #[tokio::test]
    async fn test_no_references_skips_backend() {
        let backend = Arc::new(StaticBackend::default());
        let env = resolve(Arc::clone(&backend), vec!["A=1", "B=2"]).await.unwrap();
        assert_eq!(env.to_strings(), vec!["A=1", "B=2"]);
        assert_eq!(backend.assume_calls.load(Ordering::SeqCst), 0);
        assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_role_is_assumed_once() {
        let backend = Arc::new(
            StaticBackend::default()
                .with("one", SecretValue::text("1"))
                .with("two", SecretValue::text("2"))
                .with("three", SecretValue::text("3")),
        );
        let env = resolve(
            Arc::clone(&backend),
            vec!["A=aws:///one", "B=aws:///two", "C=aws:///three"],
        )
        .await
        .unwrap();

        assert_eq!(env.to_strings(), vec!["A=1", "B=2", "C=3"]);
        assert_eq!(backend.assume_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_entries_survive_resolution() {
        use std::ffi::OsString;
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let backend = Arc::new(StaticBackend::default().with("one", SecretValue::text("1")));
        let mut env: EnvironmentImage = vec!["A=aws:///one"].into_iter().collect();
        env.push("LATIN1", OsString::from_vec(b"caf\xe9".to_vec()));
        env.push("B", OsString::from_vec(b"aws:///two\xff".to_vec()));

        let env = SecretInjector::new(backend)
            .resolve_with(&env, &ParseContext::with_lookup(false, &no_env))
            .await
            .unwrap();

        assert_eq!(env.get("A"), Some("1"));
        assert_eq!(env.get_os("LATIN1").unwrap().as_bytes(), b"caf\xe9");
        assert_eq!(env.get_os("B").unwrap().as_bytes(), b"aws:///two\xff");
    }

    #[tokio::test]
    async fn test_fetches_run_concurrently() {
        let mut backend = StaticBackend::default();
        for id in ["a", "b", "c", "d", "e"] {
            backend = backend.with(id, SecretValue::text(id));
        }
        backend.delay = Some(Duration::from_millis(200));

        let started = std::time::Instant::now();
        resolve(
            Arc::new(backend),
            vec!["A=aws:///a", "B=aws:///b", "C=aws:///c", "D=aws:///d", "E=aws:///e"],
        )
        .await
        .unwrap();
        assert!(started.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_failed_fetch_names_the_secret() {
        let backend = Arc::new(StaticBackend::default().with("one", SecretValue::text("1")));
        let err = resolve(backend, vec!["A=aws:///one", "B=aws:///missing"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SecretFetch { ref secret_id, .. } if secret_id == "missing"));
    }

    #[tokio::test]
    async fn test_parse_failure_skips_backend() {
        let backend = Arc::new(StaticBackend::default().with("one", SecretValue::text("1")));
        let err = resolve(Arc::clone(&backend), vec!["A=aws:///one", "B=aws://host/x"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Parse { ref variable, .. } if variable == "B"));
        assert_eq!(backend.assume_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_conflicting_files_are_rejected() {
        let backend = Arc::new(
            StaticBackend::default()
                .with("one", SecretValue::text("1"))
                .with("two", SecretValue::text("2")),
        );
        let err = resolve(
            Arc::clone(&backend),
            vec![
                "A=aws:///one?destination=/tmp/getsecret-conflict",
                "B=aws:///two?destination=/tmp/getsecret-conflict",
            ],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::DestinationConflict { .. }));
        assert!(err.to_string().contains("both A and B"), "{err}");
        assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transform_failure_is_fatal() {
        let backend = Arc::new(StaticBackend::default().with("blob", SecretValue::text("{broken")));
        let err = resolve(backend, vec!["A=aws:///blob?template={{.key}}"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transform { .. }));
    }
}
