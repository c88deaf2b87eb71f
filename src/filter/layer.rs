//! Tower layer and service implementing the user-agent filter.
//!
//! # Responsibilities
//! - Build the filter from configuration (fail on absent config)
//! - Resolve the User-Agent header of each request
//! - Reject denylisted agents with 403, forward everything else untouched
//!
//! # Design Decisions
//! - Generic over request/response bodies so it composes with any
//!   hyper/axum stack; the 403 body is `ResBody::default()`
//! - Rejection never touches the inner service
//! - A panicking observer is contained; the 403 is still returned
//! - Resolver and observer are trait objects shared by all clones

use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::{self, Either, Ready};
use http::{header::USER_AGENT, HeaderMap, Request, Response, StatusCode};
use tower::{Layer, Service};
use tower_http::request_id::RequestId;

use crate::agent::{AgentResolver, ResolvedAgent, SignatureResolver};
use crate::config::FilterConfig;
use crate::filter::denylist::{Denylist, DenylistHandle};
use crate::filter::observer::{BlockEvent, BlockObserver, TracingObserver};
use crate::filter::ConfigurationError;
use crate::observability::metrics;

/// Outcome of evaluating one User-Agent header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Reject { agent: ResolvedAgent },
    Forward { agent: ResolvedAgent },
}

impl Decision {
    pub fn is_reject(&self) -> bool {
        matches!(self, Decision::Reject { .. })
    }

    pub fn agent(&self) -> &ResolvedAgent {
        match self {
            Decision::Reject { agent } | Decision::Forward { agent } => agent,
        }
    }
}

/// State shared by the layer and every service it produces.
#[derive(Clone)]
struct Filter {
    name: Arc<str>,
    denylist: DenylistHandle,
    resolver: Arc<dyn AgentResolver>,
    observer: Arc<dyn BlockObserver>,
}

impl Filter {
    fn decide(&self, raw_user_agent: &str) -> Decision {
        let agent = self.resolver.resolve(raw_user_agent);
        if self.denylist.contains(&agent.name) {
            Decision::Reject { agent }
        } else {
            Decision::Forward { agent }
        }
    }
}

/// Layer that wraps services with [`UserAgentBlock`].
#[derive(Clone)]
pub struct UserAgentBlockLayer {
    filter: Filter,
}

impl UserAgentBlockLayer {
    /// Build the layer from configuration.
    ///
    /// `None` is a misconfiguration and fails; an empty `user_agents` list is
    /// accepted and blocks nothing.
    pub fn new(
        config: Option<&FilterConfig>,
        name: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let config = config.ok_or(ConfigurationError::Missing)?;
        let name: Arc<str> = Arc::from(name.into());
        let denylist = Denylist::from_config(config);

        if denylist.is_empty() {
            tracing::warn!(filter = %name, "Denylist is empty; all requests will be forwarded");
        } else {
            tracing::info!(
                filter = %name,
                agents = denylist.len(),
                policy = ?denylist.policy(),
                "User-agent filter configured"
            );
        }
        metrics::record_denylist_size(denylist.len());

        Ok(Self {
            filter: Filter {
                name,
                denylist: DenylistHandle::new(denylist),
                resolver: Arc::new(SignatureResolver),
                observer: Arc::new(TracingObserver),
            },
        })
    }

    /// Replace the agent resolver.
    pub fn with_resolver(mut self, resolver: impl AgentResolver + 'static) -> Self {
        self.filter.resolver = Arc::new(resolver);
        self
    }

    /// Replace the observer notified on each rejection.
    pub fn with_observer(mut self, observer: impl BlockObserver + 'static) -> Self {
        self.filter.observer = Arc::new(observer);
        self
    }

    /// Instance name used in diagnostics and metrics labels.
    pub fn name(&self) -> &str {
        &self.filter.name
    }

    /// Handle for replacing the denylist at runtime.
    pub fn handle(&self) -> DenylistHandle {
        self.filter.denylist.clone()
    }

    pub fn decide(&self, raw_user_agent: &str) -> Decision {
        self.filter.decide(raw_user_agent)
    }
}

impl fmt::Debug for UserAgentBlockLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAgentBlockLayer")
            .field("name", &self.filter.name)
            .field("denylist", &self.filter.denylist.load())
            .finish_non_exhaustive()
    }
}

impl<S> Layer<S> for UserAgentBlockLayer {
    type Service = UserAgentBlock<S>;

    fn layer(&self, inner: S) -> Self::Service {
        UserAgentBlock {
            inner,
            filter: self.filter.clone(),
        }
    }
}

/// Service that rejects requests from denylisted user agents.
#[derive(Clone)]
pub struct UserAgentBlock<S> {
    inner: S,
    filter: Filter,
}

impl<S> UserAgentBlock<S> {
    /// Wrap `inner` directly, without going through the layer.
    pub fn new(
        inner: S,
        config: Option<&FilterConfig>,
        name: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        Ok(UserAgentBlockLayer::new(config, name)?.layer(inner))
    }

    pub fn decide(&self, raw_user_agent: &str) -> Decision {
        self.filter.decide(raw_user_agent)
    }

    pub fn handle(&self) -> DenylistHandle {
        self.filter.denylist.clone()
    }
}

impl<S: fmt::Debug> fmt::Debug for UserAgentBlock<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAgentBlock")
            .field("name", &self.filter.name)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for UserAgentBlock<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Default,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response<ResBody>, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let decision = {
            let raw = user_agent(req.headers());
            self.filter.decide(&raw)
        };

        match decision {
            Decision::Reject { agent } => {
                let request_id = req
                    .extensions()
                    .get::<RequestId>()
                    .and_then(|id| id.header_value().to_str().ok());

                let event = BlockEvent {
                    filter: &self.filter.name,
                    uri: req.uri(),
                    agent: &agent.name,
                    request_id,
                };
                let observer = &self.filter.observer;
                if panic::catch_unwind(AssertUnwindSafe(|| observer.on_block(&event))).is_err() {
                    tracing::error!(filter = %self.filter.name, "Block observer panicked; request still rejected");
                }
                metrics::record_blocked(&self.filter.name, &agent.name);

                Either::Left(future::ready(Ok(forbidden())))
            }
            Decision::Forward { agent } => {
                tracing::trace!(filter = %self.filter.name, agent = %agent.name, "Forwarding request");
                metrics::record_forwarded();
                Either::Right(self.inner.call(req))
            }
        }
    }
}

/// Raw User-Agent header; absent means empty.
fn user_agent(headers: &HeaderMap) -> Cow<'_, str> {
    headers
        .get(USER_AGENT)
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
        .unwrap_or(Cow::Borrowed(""))
}

fn forbidden<B: Default>() -> Response<B> {
    let mut response = Response::new(B::default());
    *response.status_mut() = StatusCode::FORBIDDEN;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tower::ServiceExt;

    const GOOGLEBOT: &str = "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; Googlebot/2.1; +http://www.google.com/bot.html) Chrome/W.X.Y.Z Safari/537.36";

    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl BlockObserver for Recorder {
        fn on_block(&self, event: &BlockEvent<'_>) {
            self.events.lock().unwrap().push(event.to_string());
        }
    }

    /// Downstream stub answering 418 and counting calls.
    #[derive(Clone)]
    struct Teapot {
        calls: Arc<AtomicUsize>,
    }

    impl Service<Request<String>> for Teapot {
        type Response = Response<String>;
        type Error = Infallible;
        type Future = Ready<Result<Response<String>, Infallible>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<String>) -> Self::Future {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut res = Response::new(String::new());
            *res.status_mut() = StatusCode::IM_A_TEAPOT;
            future::ready(Ok(res))
        }
    }

    fn teapot(calls: Arc<AtomicUsize>) -> Teapot {
        Teapot { calls }
    }

    fn request(user_agent: Option<&str>) -> Request<String> {
        let mut builder = Request::builder().uri("/foobar");
        if let Some(ua) = user_agent {
            builder = builder.header(USER_AGENT, ua);
        }
        builder.body(String::new()).unwrap()
    }

    #[test]
    fn test_missing_config_fails() {
        let err = UserAgentBlockLayer::new(None, "userAgentBlocker").unwrap_err();
        assert_eq!(err, ConfigurationError::Missing);
    }

    #[test]
    fn test_decide() {
        let config = FilterConfig::new(["Googlebot"]);
        let layer = UserAgentBlockLayer::new(Some(&config), "userAgentBlocker").unwrap();

        let decision = layer.decide(GOOGLEBOT);
        assert!(decision.is_reject());
        assert_eq!(decision.agent().name, "Googlebot");

        assert!(!layer.decide("").is_reject());
        assert!(!layer.decide("SpamBot/1.0").is_reject());
    }

    #[test]
    fn test_equal_configs_decide_alike() {
        let config = FilterConfig::new(["SpamBot", "curl"]);
        let a = UserAgentBlockLayer::new(Some(&config), "a").unwrap();
        let b = UserAgentBlockLayer::new(Some(&config.clone()), "b").unwrap();

        for ua in ["", GOOGLEBOT, "SpamBot/2", "curl/8.0.1", "Wget/1.0"] {
            assert_eq!(a.decide(ua), b.decide(ua), "diverged on {ua:?}");
        }
    }

    #[test]
    fn test_custom_resolver() {
        let config = FilterConfig::new(["Everyone"]);
        let layer = UserAgentBlockLayer::new(Some(&config), "userAgentBlocker")
            .unwrap()
            .with_resolver(|_: &str| ResolvedAgent::named("Everyone"));

        assert!(layer.decide("").is_reject());
    }

    #[tokio::test]
    async fn test_reject_skips_inner_and_reports_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let recorder = Recorder::default();
        let config = FilterConfig::new(["Googlebot"]);
        let layer = UserAgentBlockLayer::new(Some(&config), "userAgentBlocker")
            .unwrap()
            .with_observer(recorder.clone());
        let svc = layer.layer(teapot(calls.clone()));

        let res = svc.oneshot(request(Some(GOOGLEBOT))).await.unwrap();

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(res.body().is_empty());
        assert!(res.headers().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let events = recorder.events.lock().unwrap();
        assert_eq!(
            events.as_slice(),
            ["userAgentBlocker : /foobar - access denied - user agent is blocked: Googlebot"]
        );
    }

    #[tokio::test]
    async fn test_forward_is_silent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let recorder = Recorder::default();
        let config = FilterConfig::new(["SpamBot"]);
        let layer = UserAgentBlockLayer::new(Some(&config), "userAgentBlocker")
            .unwrap()
            .with_observer(recorder.clone());
        let svc = layer.layer(teapot(calls.clone()));

        let res = svc.oneshot(request(Some(GOOGLEBOT))).await.unwrap();

        assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(recorder.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_calls_are_stable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = FilterConfig::new(["Googlebot"]);
        let svc = UserAgentBlock::new(teapot(calls.clone()), Some(&config), "userAgentBlocker").unwrap();

        for _ in 0..5 {
            let res = svc.clone().oneshot(request(Some(GOOGLEBOT))).await.unwrap();
            assert_eq!(res.status(), StatusCode::FORBIDDEN);
            let res = svc.clone().oneshot(request(None)).await.unwrap();
            assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_handle_swaps_live_service() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = UserAgentBlock::new(teapot(calls), Some(&FilterConfig::default()), "userAgentBlocker").unwrap();

        let res = svc.clone().oneshot(request(Some("SpamBot/1.0"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);

        svc.handle().replace(Denylist::from_config(&FilterConfig::new(["SpamBot"])));

        let res = svc.clone().oneshot(request(Some("SpamBot/1.0"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    struct Panicking;

    impl BlockObserver for Panicking {
        fn on_block(&self, _event: &BlockEvent<'_>) {
            panic!("observer failure");
        }
    }

    #[tokio::test]
    async fn test_panicking_observer_still_rejects() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = FilterConfig::new(["Googlebot"]);
        let layer = UserAgentBlockLayer::new(Some(&config), "userAgentBlocker")
            .unwrap()
            .with_observer(Panicking);
        assert_eq!(layer.name(), "userAgentBlocker");
        let svc = layer.layer(teapot(calls.clone()));

        let res = svc.clone().oneshot(request(Some(GOOGLEBOT))).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // The service stays usable after the observer panicked.
        let res = svc.oneshot(request(Some("Mozilla/5.0"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
    }

    #[test]
    fn test_non_utf8_header_is_lossy() {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            http::HeaderValue::from_bytes(b"SpamBot/1.0 \xff").unwrap(),
        );
        assert_eq!(user_agent(&headers), "SpamBot/1.0 \u{fffd}");
        assert_eq!(user_agent(&HeaderMap::new()), "");
    }
}
