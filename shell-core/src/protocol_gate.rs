use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, Weak,
    },
    time::Duration,
};

use serde::Serialize;
use tokio::runtime::Handle;
use url::Url;

use crate::{
    append_protocol_log,
    dispatch_bus::{Action, AppState, DispatchBus},
    node_readiness::{NodeKind, NodeReadinessState},
    shell_locale::ShellTexts,
    SWARM_SCHEME,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProtocolDisposition {
    Forwarded,
    Deferred,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolRequest {
    pub method: String,
    pub referrer: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardedRequest {
    pub url: String,
    pub method: String,
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Forward(ForwardedRequest),
    Error(String),
}

pub type Completion = Box<dyn FnOnce(GateOutcome) + Send>;

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub scheme: String,
    pub gateway_base: String,
    pub node: NodeKind,
    pub pending_timeout: Option<Duration>,
}

impl GateConfig {
    pub fn swarm(gateway_base: &str, pending_timeout: Option<Duration>) -> Self {
        Self {
            scheme: SWARM_SCHEME.to_string(),
            gateway_base: gateway_base.to_string(),
            node: NodeKind::Swarm,
            pending_timeout,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GateMessages {
    pub not_enabled: String,
    pub pending_timeout: String,
    pub start_failed: String,
}

impl GateMessages {
    pub fn from_texts(texts: &ShellTexts) -> Self {
        Self {
            not_enabled: texts.swarm_not_enabled.to_string(),
            pending_timeout: texts.swarm_pending_timeout.to_string(),
            start_failed: texts.swarm_start_failed.to_string(),
        }
    }
}

/// Builds `<gateway>/<scheme>://<rest>` from a `<scheme>:` URL, accepting any
/// number of slashes after the colon.
pub fn rewrite_scheme_url(scheme: &str, gateway_base: &str, raw_url: &str) -> Result<String, String> {
    let trimmed = raw_url.trim();
    let prefix_len = scheme.len() + 1;
    let has_prefix = trimmed
        .get(..prefix_len)
        .is_some_and(|head| head.eq_ignore_ascii_case(&format!("{scheme}:")));
    if !has_prefix {
        return Err(format!("URL '{trimmed}' does not use the {scheme} scheme."));
    }

    let rest = trimmed[prefix_len..].trim_start_matches('/');
    if rest.is_empty() {
        return Err(format!("URL '{trimmed}' has no {scheme} address."));
    }

    let target = format!("{}/{scheme}://{rest}", gateway_base.trim_end_matches('/'));
    Url::parse(&target).map_err(|error| format!("Invalid gateway URL '{target}': {error}"))?;
    Ok(target)
}

struct PendingRequest {
    id: u64,
    target: ForwardedRequest,
    completion: Completion,
}

struct GateInner {
    config: GateConfig,
    messages: Mutex<GateMessages>,
    bus: Arc<DispatchBus>,
    pending: Mutex<VecDeque<PendingRequest>>,
    next_id: AtomicU64,
    registered: AtomicBool,
    // Set by a start failure of the backing node, cleared when it re-enters
    // `Enabling`.
    start_failed: AtomicBool,
    runtime: Option<Handle>,
}

impl GateInner {
    fn messages(&self) -> GateMessages {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(error) => error.into_inner().clone(),
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, VecDeque<PendingRequest>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(error) => {
                append_protocol_log("protocol gate queue lock poisoned; recovering");
                error.into_inner()
            }
        }
    }

    fn notify_access(&self, url: &str, disposition: ProtocolDisposition) {
        let _ = self.bus.publish(Action::ProtocolAccessed {
            scheme: self.config.scheme.clone(),
            url: url.to_string(),
            disposition,
        });
    }

    fn on_action(&self, action: &Action) {
        match action {
            Action::NodeStateChanged {
                node,
                state: NodeReadinessState::Enabled,
            } if *node == self.config.node => self.release_pending(),
            Action::NodeStateChanged {
                node,
                state: NodeReadinessState::Enabling,
            } if *node == self.config.node => self.start_failed.store(false, Ordering::Release),
            Action::NodeStartFailed { node, reason } if *node == self.config.node => {
                append_protocol_log(&format!(
                    "{} start failed ({reason}); failing queued requests",
                    node.as_str()
                ));
                self.start_failed.store(true, Ordering::Release);
                self.fail_pending(&self.messages().start_failed);
            }
            _ => {}
        }
    }

    fn release_pending(&self) {
        let released: Vec<PendingRequest> = self.lock_pending().drain(..).collect();
        if released.is_empty() {
            return;
        }
        append_protocol_log(&format!(
            "{} node enabled; releasing {} deferred request(s)",
            self.config.node.as_str(),
            released.len()
        ));
        for request in released {
            (request.completion)(GateOutcome::Forward(request.target));
        }
    }

    fn fail_pending(&self, message: &str) {
        let failed: Vec<PendingRequest> = self.lock_pending().drain(..).collect();
        for request in failed {
            (request.completion)(GateOutcome::Error(message.to_string()));
        }
    }

    fn expire(&self, id: u64) {
        let expired = {
            let mut pending = self.lock_pending();
            let index = pending.iter().position(|request| request.id == id);
            index.and_then(|index| pending.remove(index))
        };
        if let Some(request) = expired {
            append_protocol_log(&format!(
                "deferred request timed out waiting for {}: {}",
                self.config.node.as_str(),
                request.target.url
            ));
            (request.completion)(GateOutcome::Error(self.messages().pending_timeout));
        }
    }
}

/// Intercepts requests on the custom scheme and routes, defers, or rejects
/// them according to the backing node's readiness.
#[derive(Clone)]
pub struct ProtocolGate {
    inner: Arc<GateInner>,
}

impl ProtocolGate {
    pub fn new(
        bus: Arc<DispatchBus>,
        config: GateConfig,
        messages: GateMessages,
        runtime: Option<Handle>,
    ) -> Self {
        Self {
            inner: Arc::new(GateInner {
                config,
                messages: Mutex::new(messages),
                bus,
                pending: Mutex::new(VecDeque::new()),
                next_id: AtomicU64::new(1),
                registered: AtomicBool::new(false),
                start_failed: AtomicBool::new(false),
                runtime,
            }),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.inner.config.scheme
    }

    pub fn is_registered(&self) -> bool {
        self.inner.registered.load(Ordering::Acquire)
    }

    /// Replaces the user-facing error texts, e.g. after the shell locale
    /// changed. Requests completed afterwards use the new texts.
    pub fn set_messages(&self, messages: GateMessages) {
        match self.inner.messages.lock() {
            Ok(mut guard) => *guard = messages,
            Err(error) => *error.into_inner() = messages,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock_pending().len()
    }

    /// Starts listening for readiness transitions. Must run before the backing
    /// node is started so no `Enabled` transition is missed. Returns `false`
    /// when the gate was already registered.
    pub fn register(&self) -> bool {
        if self
            .inner
            .registered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let weak: Weak<GateInner> = Arc::downgrade(&self.inner);
        self.inner
            .bus
            .subscribe(Arc::new(move |action: &Action, _state: &AppState| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_action(action);
                }
            }));
        let _ = self.inner.bus.publish(Action::ProtocolGateRegistered {
            scheme: self.inner.config.scheme.clone(),
        });
        true
    }

    pub fn handle(&self, request: ProtocolRequest, completion: Completion) -> ProtocolDisposition {
        let inner = &self.inner;
        let mut pending = inner.lock_pending();
        let state = inner.bus.node_state(inner.config.node);

        if !state.routes_requests() && !state.defers_requests() {
            drop(pending);
            append_protocol_log(&format!(
                "rejected {} {}: {} node is {}",
                request.method,
                request.url,
                inner.config.node.as_str(),
                state.as_str()
            ));
            inner.notify_access(&request.url, ProtocolDisposition::Rejected);
            completion(GateOutcome::Error(inner.messages().not_enabled));
            return ProtocolDisposition::Rejected;
        }

        if state.defers_requests() && inner.start_failed.load(Ordering::Acquire) {
            drop(pending);
            append_protocol_log(&format!(
                "rejected {} {}: {} node failed to start",
                request.method,
                request.url,
                inner.config.node.as_str()
            ));
            inner.notify_access(&request.url, ProtocolDisposition::Rejected);
            completion(GateOutcome::Error(inner.messages().start_failed));
            return ProtocolDisposition::Rejected;
        }

        let target_url = match rewrite_scheme_url(
            &inner.config.scheme,
            &inner.config.gateway_base,
            &request.url,
        ) {
            Ok(url) => url,
            Err(error) => {
                drop(pending);
                append_protocol_log(&format!("rejected {}: {error}", request.url));
                inner.notify_access(&request.url, ProtocolDisposition::Rejected);
                completion(GateOutcome::Error(error));
                return ProtocolDisposition::Rejected;
            }
        };
        let target = ForwardedRequest {
            url: target_url,
            method: request.method,
            referrer: request.referrer,
        };

        // `Enabled` may already be reduced while its notification is still
        // queued; requests arriving in that window wait behind the queue.
        if state.defers_requests() || !pending.is_empty() {
            let id = inner.next_id.fetch_add(1, Ordering::Relaxed);
            pending.push_back(PendingRequest {
                id,
                target,
                completion,
            });
            drop(pending);
            self.schedule_expiry(id);
            inner.notify_access(&request.url, ProtocolDisposition::Deferred);
            return ProtocolDisposition::Deferred;
        }

        drop(pending);
        inner.notify_access(&request.url, ProtocolDisposition::Forwarded);
        completion(GateOutcome::Forward(target));
        ProtocolDisposition::Forwarded
    }

    fn schedule_expiry(&self, id: u64) {
        let (Some(runtime), Some(timeout)) =
            (self.inner.runtime.as_ref(), self.inner.config.pending_timeout)
        else {
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire(id);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell_locale::shell_texts_for_locale;

    const GATEWAY: &str = "http://localhost:8500";

    type Outcomes = Arc<Mutex<Vec<(&'static str, GateOutcome)>>>;

    fn gate_with(bus: &Arc<DispatchBus>, pending_timeout: Option<Duration>) -> ProtocolGate {
        let runtime = Handle::try_current().ok();
        let gate = ProtocolGate::new(
            bus.clone(),
            GateConfig::swarm(GATEWAY, pending_timeout),
            GateMessages::from_texts(&shell_texts_for_locale("en-US")),
            runtime,
        );
        assert!(gate.register());
        gate
    }

    fn request(url: &str) -> ProtocolRequest {
        ProtocolRequest {
            method: "GET".to_string(),
            referrer: Some("https://wallet.example/".to_string()),
            url: url.to_string(),
        }
    }

    fn recorder(outcomes: &Outcomes, label: &'static str) -> Completion {
        let sink = outcomes.clone();
        Box::new(move |outcome| sink.lock().expect("outcomes lock").push((label, outcome)))
    }

    fn set_swarm(bus: &DispatchBus, state: NodeReadinessState) {
        bus.publish(Action::NodeStateChanged {
            node: NodeKind::Swarm,
            state,
        })
        .expect("valid transition");
    }

    fn forwarded_url(outcome: &GateOutcome) -> &str {
        match outcome {
            GateOutcome::Forward(target) => &target.url,
            GateOutcome::Error(error) => panic!("expected forward, got error {error}"),
        }
    }

    fn access_log(bus: &Arc<DispatchBus>) -> Arc<Mutex<Vec<ProtocolDisposition>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        bus.subscribe(Arc::new(move |action: &Action, _state: &AppState| {
            if let Action::ProtocolAccessed { disposition, .. } = action {
                sink.lock().expect("access lock").push(*disposition);
            }
        }));
        log
    }

    #[test]
    fn rewrite_normalizes_single_and_double_slash_forms() {
        for raw in ["bzz:/theswarm.eth/index.html", "bzz://theswarm.eth/index.html"] {
            assert_eq!(
                rewrite_scheme_url("bzz", "http://localhost:8500/", raw).expect("rewrite"),
                "http://localhost:8500/bzz://theswarm.eth/index.html"
            );
        }
        assert_eq!(
            rewrite_scheme_url("bzz", GATEWAY, "BZZ:/abc").expect("rewrite"),
            "http://localhost:8500/bzz://abc"
        );
    }

    #[test]
    fn rewrite_rejects_foreign_scheme_and_empty_address() {
        assert!(rewrite_scheme_url("bzz", GATEWAY, "https://theswarm.eth").is_err());
        assert!(rewrite_scheme_url("bzz", GATEWAY, "bzz://").is_err());
        assert!(rewrite_scheme_url("bzz", GATEWAY, "").is_err());
    }

    #[test]
    fn disabled_node_rejects_without_forwarding() {
        let bus = Arc::new(DispatchBus::new());
        let gate = gate_with(&bus, None);
        let accesses = access_log(&bus);
        let outcomes: Outcomes = Arc::default();

        let disposition = gate.handle(request("bzz:/theswarm.eth"), recorder(&outcomes, "r1"));

        assert_eq!(disposition, ProtocolDisposition::Rejected);
        let outcomes = outcomes.lock().expect("outcomes lock");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0].1,
            GateOutcome::Error(shell_texts_for_locale("en-US").swarm_not_enabled.to_string())
        );
        assert_eq!(
            *accesses.lock().expect("access lock"),
            vec![ProtocolDisposition::Rejected]
        );
        assert_eq!(gate.pending_len(), 0);
    }

    #[test]
    fn disabling_node_rejects() {
        let bus = Arc::new(DispatchBus::new());
        let gate = gate_with(&bus, None);
        set_swarm(&bus, NodeReadinessState::Enabling);
        set_swarm(&bus, NodeReadinessState::Enabled);
        set_swarm(&bus, NodeReadinessState::Disabling);
        let outcomes: Outcomes = Arc::default();

        let disposition = gate.handle(request("bzz:/abc"), recorder(&outcomes, "r1"));

        assert_eq!(disposition, ProtocolDisposition::Rejected);
        assert!(matches!(
            outcomes.lock().expect("outcomes lock")[0].1,
            GateOutcome::Error(_)
        ));
    }

    #[test]
    fn enabled_node_forwards_immediately_with_rewritten_url() {
        let bus = Arc::new(DispatchBus::new());
        let gate = gate_with(&bus, None);
        set_swarm(&bus, NodeReadinessState::Enabling);
        set_swarm(&bus, NodeReadinessState::Enabled);
        let accesses = access_log(&bus);
        let outcomes: Outcomes = Arc::default();

        let disposition = gate.handle(request("bzz:/theswarm.eth/"), recorder(&outcomes, "r1"));

        assert_eq!(disposition, ProtocolDisposition::Forwarded);
        let outcomes = outcomes.lock().expect("outcomes lock");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0].1,
            GateOutcome::Forward(ForwardedRequest {
                url: "http://localhost:8500/bzz://theswarm.eth/".to_string(),
                method: "GET".to_string(),
                referrer: Some("https://wallet.example/".to_string()),
            })
        );
        assert_eq!(
            *accesses.lock().expect("access lock"),
            vec![ProtocolDisposition::Forwarded]
        );
    }

    #[test]
    fn enabling_defers_and_releases_in_fifo_order_exactly_once() {
        let bus = Arc::new(DispatchBus::new());
        let gate = gate_with(&bus, None);
        set_swarm(&bus, NodeReadinessState::Enabling);
        let accesses = access_log(&bus);
        let outcomes: Outcomes = Arc::default();

        assert_eq!(
            gate.handle(request("bzz:/first"), recorder(&outcomes, "r1")),
            ProtocolDisposition::Deferred
        );
        assert_eq!(
            gate.handle(request("bzz://second"), recorder(&outcomes, "r2")),
            ProtocolDisposition::Deferred
        );
        assert!(outcomes.lock().expect("outcomes lock").is_empty());
        assert_eq!(gate.pending_len(), 2);

        set_swarm(&bus, NodeReadinessState::Enabled);
        set_swarm(&bus, NodeReadinessState::Disabling);
        set_swarm(&bus, NodeReadinessState::Disabled);
        set_swarm(&bus, NodeReadinessState::Enabling);
        set_swarm(&bus, NodeReadinessState::Enabled);

        let outcomes = outcomes.lock().expect("outcomes lock");
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].0, "r1");
        assert_eq!(forwarded_url(&outcomes[0].1), "http://localhost:8500/bzz://first");
        assert_eq!(outcomes[1].0, "r2");
        assert_eq!(forwarded_url(&outcomes[1].1), "http://localhost:8500/bzz://second");
        assert_eq!(gate.pending_len(), 0);
        assert_eq!(
            *accesses.lock().expect("access lock"),
            vec![ProtocolDisposition::Deferred, ProtocolDisposition::Deferred]
        );
    }

    #[test]
    fn malformed_address_is_rejected_once_while_enabled() {
        let bus = Arc::new(DispatchBus::new());
        let gate = gate_with(&bus, None);
        set_swarm(&bus, NodeReadinessState::Enabling);
        set_swarm(&bus, NodeReadinessState::Enabled);
        let accesses = access_log(&bus);
        let outcomes: Outcomes = Arc::default();

        let disposition = gate.handle(request("bzz://"), recorder(&outcomes, "r1"));

        assert_eq!(disposition, ProtocolDisposition::Rejected);
        let outcomes = outcomes.lock().expect("outcomes lock");
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            &outcomes[0].1,
            GateOutcome::Error(message) if message.contains("no bzz address")
        ));
        assert_eq!(
            *accesses.lock().expect("access lock"),
            vec![ProtocolDisposition::Rejected]
        );
        assert_eq!(gate.pending_len(), 0);
    }

    #[test]
    fn request_arriving_before_enabled_is_delivered_queues_behind_pending() {
        let bus = Arc::new(DispatchBus::new());
        let outcomes: Outcomes = Arc::default();
        let late_gate: Arc<Mutex<Option<ProtocolGate>>> = Arc::default();

        // Registered ahead of the gate, so it runs while `Enabled` is reduced
        // but the gate has not been told yet.
        let gate_slot = late_gate.clone();
        let late_outcomes = outcomes.clone();
        bus.subscribe(Arc::new(move |action: &Action, _state: &AppState| {
            if let Action::NodeStateChanged {
                state: NodeReadinessState::Enabled,
                ..
            } = action
            {
                if let Some(gate) = gate_slot.lock().expect("slot lock").as_ref() {
                    let disposition =
                        gate.handle(request("bzz:/late"), recorder(&late_outcomes, "r3"));
                    assert_eq!(disposition, ProtocolDisposition::Deferred);
                }
            }
        }));

        let gate = gate_with(&bus, None);
        *late_gate.lock().expect("slot lock") = Some(gate.clone());
        set_swarm(&bus, NodeReadinessState::Enabling);
        gate.handle(request("bzz:/early"), recorder(&outcomes, "r1"));

        set_swarm(&bus, NodeReadinessState::Enabled);

        let labels: Vec<_> = outcomes
            .lock()
            .expect("outcomes lock")
            .iter()
            .map(|(label, _)| *label)
            .collect();
        assert_eq!(labels, ["r1", "r3"]);
    }

    #[test]
    fn other_node_transitions_do_not_release_requests() {
        let bus = Arc::new(DispatchBus::new());
        let gate = gate_with(&bus, None);
        set_swarm(&bus, NodeReadinessState::Enabling);
        let outcomes: Outcomes = Arc::default();
        gate.handle(request("bzz:/abc"), recorder(&outcomes, "r1"));

        bus.publish(Action::NodeStateChanged {
            node: NodeKind::Ethereum,
            state: NodeReadinessState::Enabling,
        })
        .expect("ethereum enabling");
        bus.publish(Action::NodeStateChanged {
            node: NodeKind::Ethereum,
            state: NodeReadinessState::Enabled,
        })
        .expect("ethereum enabled");

        assert!(outcomes.lock().expect("outcomes lock").is_empty());
        assert_eq!(gate.pending_len(), 1);
    }

    #[test]
    fn start_failure_fails_every_pending_request() {
        let bus = Arc::new(DispatchBus::new());
        let gate = gate_with(&bus, None);
        set_swarm(&bus, NodeReadinessState::Enabling);
        let outcomes: Outcomes = Arc::default();
        gate.handle(request("bzz:/a"), recorder(&outcomes, "r1"));
        gate.handle(request("bzz:/b"), recorder(&outcomes, "r2"));

        bus.publish(Action::NodeStartFailed {
            node: NodeKind::Swarm,
            reason: "exited with status 1".to_string(),
        })
        .expect("publish failure");

        let outcomes = outcomes.lock().expect("outcomes lock");
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes
            .iter()
            .all(|(_, outcome)| matches!(outcome, GateOutcome::Error(_))));
        assert_eq!(gate.pending_len(), 0);
    }

    #[test]
    fn requests_after_start_failure_fail_fast_until_next_start() {
        let bus = Arc::new(DispatchBus::new());
        let gate = gate_with(&bus, Some(Duration::from_millis(30_000)));
        set_swarm(&bus, NodeReadinessState::Enabling);
        bus.publish(Action::NodeStartFailed {
            node: NodeKind::Swarm,
            reason: "exited with status 1".to_string(),
        })
        .expect("publish failure");
        let accesses = access_log(&bus);
        let outcomes: Outcomes = Arc::default();

        let disposition = gate.handle(request("bzz:/after"), recorder(&outcomes, "r1"));

        assert_eq!(disposition, ProtocolDisposition::Rejected);
        assert_eq!(gate.pending_len(), 0);
        assert_eq!(
            outcomes.lock().expect("outcomes lock")[0].1,
            GateOutcome::Error(shell_texts_for_locale("en-US").swarm_start_failed.to_string())
        );
        assert_eq!(
            *accesses.lock().expect("access lock"),
            vec![ProtocolDisposition::Rejected]
        );

        set_swarm(&bus, NodeReadinessState::Enabled);
        set_swarm(&bus, NodeReadinessState::Disabling);
        set_swarm(&bus, NodeReadinessState::Disabled);
        set_swarm(&bus, NodeReadinessState::Enabling);

        assert_eq!(
            gate.handle(request("bzz:/retry"), recorder(&outcomes, "r2")),
            ProtocolDisposition::Deferred
        );
    }

    #[test]
    fn replaced_messages_apply_to_later_requests() {
        let bus = Arc::new(DispatchBus::new());
        let gate = gate_with(&bus, None);
        let outcomes: Outcomes = Arc::default();

        gate.set_messages(GateMessages::from_texts(&shell_texts_for_locale("zh-CN")));
        gate.handle(request("bzz:/abc"), recorder(&outcomes, "r1"));

        assert_eq!(
            outcomes.lock().expect("outcomes lock")[0].1,
            GateOutcome::Error(shell_texts_for_locale("zh-CN").swarm_not_enabled.to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn deferred_request_times_out_with_error_once() {
        let bus = Arc::new(DispatchBus::new());
        let gate = gate_with(&bus, Some(Duration::from_millis(5_000)));
        set_swarm(&bus, NodeReadinessState::Enabling);
        let outcomes: Outcomes = Arc::default();
        gate.handle(request("bzz:/slow"), recorder(&outcomes, "r1"));

        tokio::time::sleep(Duration::from_millis(4_999)).await;
        assert!(outcomes.lock().expect("outcomes lock").is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        set_swarm(&bus, NodeReadinessState::Enabled);

        let outcomes = outcomes.lock().expect("outcomes lock");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0].1,
            GateOutcome::Error(
                shell_texts_for_locale("en-US")
                    .swarm_pending_timeout
                    .to_string()
            )
        );
    }

    #[test]
    fn register_is_idempotent() {
        let bus = Arc::new(DispatchBus::new());
        let gate = gate_with(&bus, None);
        assert!(gate.is_registered());
        assert!(!gate.register());
    }
}
