//! The step driver — C6. One [`Engine`] serves every submission; each
//! submitted graph runs on its own spawned task, so executions proceed in
//! parallel without contending on one another's state (spec §4.4, §5).
//!
//! The walk follows spec §4.4's ten steps in order: validate, build the
//! typed graph, resolve identity, initialize state and emit the first
//! progress event, plan, then drive the plan one node at a time, gating on
//! reachability so an untraversed conditional branch's downstream nodes
//! never run. A handler failure fails that node, every still-pending/running
//! node, and the execution itself (step 8); otherwise the walk assembles a
//! result from `output` nodes and completes (step 9), then commits the
//! record to the retention store and the graph store (step 10).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use dashmap::DashMap;
use nebula_core::{ExecutionId, NodeId, UserId};
use nebula_dispatch::{dispatch_agent, dispatch_conditional, dispatch_input, dispatch_output, dispatch_tool};
use nebula_eventbus::{ProgressBus, ProgressMessage, Subscription};
use nebula_execution::{
    ExecutionContext, ExecutionError, ExecutionState, ExecutionStatus, NodeAttempt, NodeOutput,
};
use nebula_telemetry::{PricingTable, Trace};
use nebula_validator::ValidatorCache;
use nebula_workflow::{
    build_definition, generate_identity, ExecutionPlan, GraphWire, Identity, IdentityCache, NodeKind,
    NodeState, ToolSpec, WorkflowDefinition,
};
use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::collaborators::{AgentInvoker, CredentialBroker, GraphStore, ToolTransport};
use crate::config::EngineConfig;
use crate::gather::{gather_inputs, value_to_prompt};
use crate::input_gate;
use crate::record::ExecutionRecord;
use crate::retention::{InputWaiters, RetentionStore};

/// A caller's request to run a graph (spec §4.4 step 1's inputs).
#[derive(Debug, Clone)]
pub struct Submission {
    pub graph: GraphWire,
    pub input: Value,
    pub framework: String,
    pub user_id: Option<String>,
    /// Pre-supplied identity; when absent the engine generates one from the
    /// graph's shape (spec §3: "identity — generated or supplied").
    pub identity: Option<Identity>,
}

/// The orchestrator: validator/identity caches, progress bus, retention
/// store, and the collaborators the driver calls out to for each node kind.
pub struct Engine {
    config: EngineConfig,
    validator_cache: ValidatorCache,
    identity_cache: IdentityCache,
    progress_bus: Arc<ProgressBus>,
    retention: RetentionStore,
    agent_invoker: Arc<dyn AgentInvoker>,
    credential_broker: Arc<dyn CredentialBroker>,
    tool_transport: Arc<dyn ToolTransport>,
    graph_store: Arc<dyn GraphStore>,
    pricing: Arc<dyn PricingTable>,
    input_waiters: Arc<InputWaiters>,
    cancellations: DashMap<ExecutionId, CancellationToken>,
}

impl Engine {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EngineConfig,
        agent_invoker: Arc<dyn AgentInvoker>,
        credential_broker: Arc<dyn CredentialBroker>,
        tool_transport: Arc<dyn ToolTransport>,
        graph_store: Arc<dyn GraphStore>,
        pricing: Arc<dyn PricingTable>,
    ) -> Arc<Self> {
        let progress_bus = Arc::new(ProgressBus::new());
        let input_waiters: Arc<InputWaiters> = Arc::new(DashMap::new());
        let retention = RetentionStore::new(
            config.retention_ttl,
            config.retention_cap_per_user,
            Arc::clone(&progress_bus),
            Arc::clone(&input_waiters),
        );
        Arc::new(Self {
            config,
            validator_cache: ValidatorCache::new(),
            identity_cache: IdentityCache::new(),
            progress_bus,
            retention,
            agent_invoker,
            credential_broker,
            tool_transport,
            graph_store,
            pricing,
            input_waiters,
            cancellations: DashMap::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Allocates an execution id, spawns its run, and returns immediately
    /// (spec §4.4: submission returns once accepted, not once finished).
    pub fn submit(self: Arc<Self>, submission: Submission) -> ExecutionId {
        let user_id = UserId::new(submission.user_id.clone().unwrap_or_default());
        let now_millis = u64::try_from(Utc::now().timestamp_millis().max(0)).unwrap_or(0);
        let execution_id = ExecutionId::allocate(user_id, now_millis);

        let cancellation = CancellationToken::new();
        self.cancellations.insert(execution_id.clone(), cancellation.clone());

        let id_for_task = execution_id.clone();
        tokio::spawn(async move {
            self.drive(id_for_task, submission, cancellation).await;
        });

        execution_id
    }

    /// Attaches to an execution's progress stream (spec §4.5).
    #[must_use]
    pub fn subscribe(&self, execution_id: &ExecutionId) -> Subscription {
        self.progress_bus.subscribe(execution_id)
    }

    /// Fetches the current (possibly still-running) record for a user's
    /// execution, as a webhook trigger or status endpoint would poll.
    #[must_use]
    pub fn record(&self, user_id: &UserId, execution_id: &ExecutionId) -> Option<ExecutionRecord> {
        self.retention.get(user_id, execution_id)
    }

    /// Resumes an execution parked on the user-input gate (spec §4.9).
    /// Returns `false` if no execution is waiting on input under this id —
    /// including a second call after the first already resumed it, making
    /// this idempotent.
    pub fn provide_input(&self, execution_id: &ExecutionId, text: String) -> bool {
        match self.input_waiters.remove(execution_id) {
            Some((_, sender)) => sender.send(text).is_ok(),
            None => false,
        }
    }

    /// Requests cooperative cancellation of a running execution.
    pub fn cancel(&self, execution_id: &ExecutionId) {
        if let Some(token) = self.cancellations.get(execution_id) {
            token.cancel();
        }
    }

    async fn drive(self: Arc<Self>, execution_id: ExecutionId, submission: Submission, cancellation: CancellationToken) {
        let user_id = execution_id.user_id().clone();

        let outcome = match self.validator_cache.validate_cached(&submission.graph) {
            Ok(outcome) => outcome,
            Err(validation_err) => {
                tracing::info!(%execution_id, reason = %validation_err, "execution rejected at validation");
                let err = ExecutionError::Validation {
                    reason: validation_err.code().to_string(),
                };
                self.fail_before_plan(execution_id, user_id, submission.input, err).await;
                return;
            }
        };

        let definition = match build_definition(&outcome.graph) {
            Ok(definition) => definition,
            Err(build_err) => {
                tracing::warn!(%execution_id, error = %build_err, "validated graph failed to build");
                let err = ExecutionError::internal(build_err.to_string());
                self.fail_before_plan(execution_id, user_id, submission.input, err).await;
                return;
            }
        };

        let identity = submission
            .identity
            .clone()
            .unwrap_or_else(|| self.identity_cache.get_or_generate(&definition));

        let mut state = ExecutionState::new(
            execution_id.clone(),
            user_id.clone(),
            definition.clone(),
            identity,
            submission.input.clone(),
        );
        self.checkpoint(&state, "starting");

        let ctx = ExecutionContext::new(execution_id.clone(), Arc::new(definition.clone()))
            .with_cancellation(cancellation.clone());

        let plan = ExecutionPlan::build(&definition);
        let mut reachable: HashSet<NodeId> = plan.start_nodes.iter().cloned().collect();
        let mut trace_acc: Option<Trace> = None;
        let mut failure: Option<ExecutionError> = None;

        'walk: for node_id in &plan.order {
            if cancellation.is_cancelled() {
                failure = Some(ExecutionError::Cancelled);
                break 'walk;
            }
            if !reachable.contains(node_id) {
                continue;
            }
            let Some(node) = definition.node(node_id) else {
                continue;
            };

            match &node.kind {
                NodeKind::Input(_) => {
                    let out = dispatch_input(&submission.input);
                    ctx.set_node_output(node_id.clone(), NodeOutput::new(Value::Object(out), NodeState::Completed));
                    propagate(&definition, node_id, &mut reachable);
                }
                NodeKind::Output(spec) => {
                    let gathered = gather_inputs(&definition, &ctx, node_id);
                    let out = dispatch_output(spec.format, &gathered);
                    ctx.set_node_output(node_id.clone(), NodeOutput::new(Value::Object(out), NodeState::Completed));
                    propagate(&definition, node_id, &mut reachable);
                }
                NodeKind::Conditional(spec) => {
                    let gathered = gather_inputs(&definition, &ctx, node_id);
                    match dispatch_conditional(spec, &gathered) {
                        Some(selected) => {
                            for edge in definition.outgoing(node_id) {
                                if edge.source_handle.as_deref() == Some(selected.as_str()) {
                                    reachable.insert(edge.target.clone());
                                }
                            }
                        }
                        None => {
                            failure = Some(ExecutionError::NoMatchingBranch { node: node_id.clone() });
                            break 'walk;
                        }
                    }
                }
                NodeKind::Tool(tool_spec) => {
                    let binding_only = definition.outgoing(node_id).any(|edge| edge.binds_tool());
                    let mut node_state = state.node_state(node_id).cloned().expect("tool node is tracked");
                    if node_state.transition_to(NodeState::Running).is_err() {
                        failure = Some(ExecutionError::internal("invalid node transition"));
                        break 'walk;
                    }

                    if binding_only {
                        node_state.transition_to(NodeState::Completed).ok();
                        state.set_node_state(node_id.clone(), node_state);
                        ctx.set_node_output(node_id.clone(), NodeOutput::new(Value::Null, NodeState::Completed));
                        propagate(&definition, node_id, &mut reachable);
                    } else {
                        let mut attempt = NodeAttempt::new(u32::try_from(node_state.attempt_count()).unwrap_or(0));
                        match dispatch_tool(
                            node_id,
                            &user_id,
                            tool_spec,
                            self.credential_broker.as_ref(),
                            self.tool_transport.as_ref(),
                        )
                        .await
                        {
                            Ok(out) => {
                                attempt.complete_success(out.get("result").cloned().unwrap_or(Value::Null));
                                node_state.attempts.push(attempt);
                                node_state.transition_to(NodeState::Completed).ok();
                                state.set_node_state(node_id.clone(), node_state);
                                ctx.set_node_output(
                                    node_id.clone(),
                                    NodeOutput::new(Value::Object(out), NodeState::Completed),
                                );
                                propagate(&definition, node_id, &mut reachable);
                            }
                            Err(err) => {
                                attempt.complete_failure(err.to_string());
                                node_state.attempts.push(attempt);
                                node_state.error_message = Some(err.to_string());
                                node_state.transition_to(NodeState::Failed).ok();
                                state.set_node_state(node_id.clone(), node_state);
                                failure = Some(err);
                                break 'walk;
                            }
                        }
                    }
                    self.checkpoint(&state, format!("ran {node_id}"));
                }
                NodeKind::Agent(agent_spec) => {
                    let tools: Vec<ToolSpec> = definition
                        .incoming(node_id)
                        .filter(|edge| edge.binds_tool())
                        .filter_map(|edge| definition.node(&edge.source))
                        .filter_map(|n| match &n.kind {
                            NodeKind::Tool(spec) => Some(spec.clone()),
                            _ => None,
                        })
                        .collect();
                    let gathered = gather_inputs(&definition, &ctx, node_id);
                    let prompt = value_to_prompt(&gathered);

                    let mut node_state = state.node_state(node_id).cloned().expect("agent node is tracked");
                    if node_state.transition_to(NodeState::Running).is_err() {
                        failure = Some(ExecutionError::internal("invalid node transition"));
                        break 'walk;
                    }

                    let started = Instant::now();
                    let dispatched = dispatch_agent(
                        self.agent_invoker.as_ref(),
                        agent_spec,
                        &tools,
                        &prompt,
                        &submission.framework,
                    )
                    .await;
                    let elapsed = started.elapsed();

                    match dispatched {
                        Ok((mut out, trace_raw)) => {
                            let final_output = out
                                .get("result")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string();
                            let extracted = nebula_telemetry::extract(
                                &trace_raw,
                                &final_output,
                                elapsed,
                                agent_spec.model_id.as_deref(),
                                self.pricing.as_ref(),
                            );
                            trace_acc = Some(match trace_acc.take() {
                                Some(acc) => merge_trace(acc, extracted),
                                None => extracted,
                            });

                            if let Some(question) = input_gate::detect_question(&final_output) {
                                state.transition_status(ExecutionStatus::WaitingForInput).ok();
                                self.progress_bus.publish(
                                    &execution_id,
                                    ProgressMessage::InputRequest {
                                        question: question.clone(),
                                        full_output: final_output.clone(),
                                        timestamp: Utc::now(),
                                    },
                                );
                                self.checkpoint(&state, format!("waiting for input on {node_id}"));

                                let (tx, rx) = oneshot::channel();
                                self.input_waiters.insert(execution_id.clone(), tx);

                                let reply = tokio::select! {
                                    received = rx => received.ok(),
                                    () = cancellation.cancelled() => None,
                                };
                                self.input_waiters.remove(&execution_id);

                                match reply {
                                    Some(text) => {
                                        self.progress_bus.publish(
                                            &execution_id,
                                            ProgressMessage::InputReceived { input: text.clone() },
                                        );
                                        state.transition_status(ExecutionStatus::Running).ok();
                                        out = Map::new();
                                        out.insert("result".to_string(), Value::String(text.clone()));
                                        out.insert("default".to_string(), Value::String(text));
                                    }
                                    None => {
                                        node_state.error_message = Some("cancelled while waiting for input".into());
                                        node_state.transition_to(NodeState::Failed).ok();
                                        state.set_node_state(node_id.clone(), node_state);
                                        failure = Some(ExecutionError::Cancelled);
                                        break 'walk;
                                    }
                                }
                            }

                            let mut attempt = NodeAttempt::new(u32::try_from(node_state.attempt_count()).unwrap_or(0));
                            attempt.complete_success(out.get("result").cloned().unwrap_or(Value::Null));
                            node_state.attempts.push(attempt);
                            node_state.transition_to(NodeState::Completed).ok();
                            state.set_node_state(node_id.clone(), node_state);
                            ctx.set_node_output(node_id.clone(), NodeOutput::new(Value::Object(out), NodeState::Completed));
                            propagate(&definition, node_id, &mut reachable);
                        }
                        Err(err) => {
                            node_state.error_message = Some(err.to_string());
                            node_state.transition_to(NodeState::Failed).ok();
                            state.set_node_state(node_id.clone(), node_state);
                            failure = Some(err);
                            break 'walk;
                        }
                    }
                    self.checkpoint(&state, format!("ran {node_id}"));
                }
            }
        }

        if let Some(err) = failure {
            tracing::warn!(%execution_id, error = %err, "execution failed");
            fail_remaining(&mut state, &err);
            state.transition_status(ExecutionStatus::Failed).ok();
            state.error = Some(err);
            self.finish(state, trace_acc).await;
            self.cancellations.remove(&execution_id);
            return;
        }

        state.result = Some(collect_result(&definition, &plan, &ctx));
        state.transition_status(ExecutionStatus::Completed).ok();
        self.finish(state, trace_acc).await;
        self.cancellations.remove(&execution_id);
    }

    async fn fail_before_plan(&self, execution_id: ExecutionId, user_id: UserId, input: Value, err: ExecutionError) {
        let empty = WorkflowDefinition { nodes: Vec::new(), edges: Vec::new() };
        let identity = generate_identity(&empty);
        let mut state = ExecutionState::new(execution_id.clone(), user_id, empty, identity, input);
        state.transition_status(ExecutionStatus::Failed).ok();
        state.error = Some(err);
        self.finish(state, None).await;
        self.cancellations.remove(&execution_id);
    }

    async fn finish(&self, state: ExecutionState, trace: Option<Trace>) {
        self.publish_update(&state);
        let record = ExecutionRecord { state, trace };
        self.retention.insert(record.clone());
        self.graph_store.record(&record).await;
    }

    fn checkpoint(&self, state: &ExecutionState, activity: impl Into<String>) {
        let progress = state.progress(activity);
        self.progress_bus.publish(
            &state.execution_id,
            ProgressMessage::ExecutionUpdate {
                status: state.status.to_string(),
                progress: serde_json::to_value(&progress).unwrap_or(Value::Null),
                result: state.result.clone(),
                error: state.error.as_ref().and_then(|e| serde_json::to_value(e).ok()),
                identity: serde_json::to_value(&state.identity).unwrap_or(Value::Null),
            },
        );
        self.retention.insert(ExecutionRecord::new(state.clone()));
    }

    fn publish_update(&self, state: &ExecutionState) {
        self.checkpoint(state, state.status.to_string());
    }
}

fn propagate(definition: &WorkflowDefinition, node_id: &NodeId, reachable: &mut HashSet<NodeId>) {
    for edge in definition.outgoing(node_id) {
        reachable.insert(edge.target.clone());
    }
}

/// Fails every executable node still `pending`/`running` once the execution
/// itself is about to fail (spec §4.4 step 8).
fn fail_remaining(state: &mut ExecutionState, err: &ExecutionError) {
    let unfinished: Vec<NodeId> = state
        .node_states
        .iter()
        .filter(|(_, ns)| matches!(ns.state, NodeState::Pending | NodeState::Running))
        .map(|(id, _)| id.clone())
        .collect();

    for id in unfinished {
        let Some(mut ns) = state.node_state(&id).cloned() else {
            continue;
        };
        if ns.state == NodeState::Pending {
            ns.transition_to(NodeState::Running).ok();
        }
        ns.error_message = Some(err.to_string());
        ns.transition_to(NodeState::Failed).ok();
        state.set_node_state(id, ns);
    }
}

/// Assembles the final result (spec §4.4 step 9): outputs from every
/// `output` node reached during the walk, or the last completed executable
/// node's result if the graph has no output node.
fn collect_result(definition: &WorkflowDefinition, plan: &ExecutionPlan, ctx: &ExecutionContext) -> Value {
    let outputs: Vec<Value> = definition
        .nodes
        .iter()
        .filter(|n| matches!(n.kind, NodeKind::Output(_)))
        .filter_map(|n| ctx.get_node_output(&n.id))
        .map(|output| output.value.get("result").cloned().unwrap_or(output.value))
        .collect();

    if !outputs.is_empty() {
        return if outputs.len() == 1 {
            outputs.into_iter().next().expect("len checked")
        } else {
            Value::Array(outputs)
        };
    }

    for node_id in plan.order.iter().rev() {
        if let Some(node) = definition.node(node_id) {
            if node.kind.is_executable() {
                if let Some(output) = ctx.get_node_output(node_id) {
                    return output.value.get("result").cloned().unwrap_or(output.value);
                }
            }
        }
    }

    Value::Null
}

fn merge_trace(mut acc: Trace, next: Trace) -> Trace {
    acc.spans.extend(next.spans);
    acc.cost_info.total_cost += next.cost_info.total_cost;
    acc.cost_info.total_tokens += next.cost_info.total_tokens;
    acc.cost_info.input_tokens += next.cost_info.input_tokens;
    acc.cost_info.output_tokens += next.cost_info.output_tokens;
    acc.performance.total_duration_ms += next.performance.total_duration_ms;
    acc.performance.total_cost = acc.cost_info.total_cost;
    acc.performance.total_tokens = acc.cost_info.total_tokens;
    acc.performance.span_count += next.performance.span_count;
    if acc.performance.extraction_error.is_none() {
        acc.performance.extraction_error = next.performance.extraction_error;
    }
    acc.final_output = next.final_output;
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nebula_dispatch::{AgentInvocation, ResolvedCredential, ToolCallResponse, ToolTransportError};
    use nebula_telemetry::NoopPricingTable;
    use nebula_workflow::{AgentSpec, EdgeWire, GraphWire, IoFormat, NodeWire};
    use std::time::Duration;

    struct EchoInvoker;

    #[async_trait]
    impl AgentInvoker for EchoInvoker {
        async fn invoke(
            &self,
            _agent: &AgentSpec,
            _tools: &[ToolSpec],
            prompt: &str,
            _framework: &str,
        ) -> Result<AgentInvocation, ExecutionError> {
            Ok(AgentInvocation {
                final_output: format!("echo: {prompt}"),
                trace: serde_json::json!({}),
            })
        }
    }

    struct QuestionInvoker;

    #[async_trait]
    impl AgentInvoker for QuestionInvoker {
        async fn invoke(
            &self,
            _agent: &AgentSpec,
            _tools: &[ToolSpec],
            _prompt: &str,
            _framework: &str,
        ) -> Result<AgentInvocation, ExecutionError> {
            Ok(AgentInvocation {
                final_output: "What would you like me to call the project?".to_string(),
                trace: serde_json::json!({}),
            })
        }
    }

    struct NoCredentials;

    #[async_trait]
    impl CredentialBroker for NoCredentials {
        async fn resolve(&self, _user_id: &UserId) -> Option<ResolvedCredential> {
            None
        }
    }

    struct NoTransport;

    #[async_trait]
    impl ToolTransport for NoTransport {
        async fn call(
            &self,
            _tool_type: &str,
            _api_key: &str,
            _inputs: &Map<String, Value>,
        ) -> Result<ToolCallResponse, ToolTransportError> {
            Err(ToolTransportError::Other { message: "not used".into() })
        }
    }

    struct Noop;

    #[async_trait]
    impl GraphStore for Noop {
        async fn record(&self, _execution: &ExecutionRecord) {}
    }

    fn input_node(id: &str) -> NodeWire {
        NodeWire {
            id: Some(id.into()),
            kind: Some("input".into()),
            data: None,
            position: None,
        }
    }

    fn agent_node(id: &str, name: &str) -> NodeWire {
        NodeWire {
            id: Some(id.into()),
            kind: Some("agent".into()),
            data: Some(serde_json::json!({"name": name, "instructions": "reply"})),
            position: None,
        }
    }

    fn output_node(id: &str) -> NodeWire {
        NodeWire {
            id: Some(id.into()),
            kind: Some("output".into()),
            data: None,
            position: None,
        }
    }

    fn edge(id: &str, src: &str, dst: &str) -> EdgeWire {
        EdgeWire {
            id: Some(id.into()),
            source: Some(src.into()),
            target: Some(dst.into()),
            source_handle: None,
            target_handle: None,
        }
    }

    fn linear_graph() -> GraphWire {
        GraphWire {
            nodes: vec![input_node("in"), agent_node("a1", "Writer"), output_node("out")],
            edges: vec![edge("e1", "in", "a1"), edge("e2", "a1", "out")],
        }
    }

    fn engine_with(invoker: Arc<dyn AgentInvoker>) -> Arc<Engine> {
        Engine::new(
            EngineConfig::default(),
            invoker,
            Arc::new(NoCredentials),
            Arc::new(NoTransport),
            Arc::new(Noop),
            Arc::new(NoopPricingTable),
        )
    }

    fn submission(graph: GraphWire) -> Submission {
        Submission {
            graph,
            input: serde_json::json!("hello"),
            framework: "default".into(),
            user_id: Some("alice".into()),
            identity: None,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn completes_a_linear_graph_and_reaches_100_percent() {
        let engine = engine_with(Arc::new(EchoInvoker));
        let mut sub = engine.subscribe(&placeholder_id());
        drop(sub);

        let execution_id = Arc::clone(&engine).submit(submission(linear_graph()));
        sub = engine.subscribe(&execution_id);

        let mut last_percent = 0u64;
        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), sub.receiver.recv())
                .await
                .expect("update arrives")
                .expect("channel open");
            if let ProgressMessage::ExecutionUpdate { status, progress, .. } = message {
                last_percent = progress.get("percent").and_then(Value::as_u64).unwrap_or(0);
                if status == "completed" || status == "failed" {
                    assert_eq!(status, "completed");
                    break;
                }
            }
        }
        assert_eq!(last_percent, 100);

        let record = engine.record(&UserId::new("alice"), &execution_id).expect("record present");
        assert_eq!(record.state.status, ExecutionStatus::Completed);
        assert_eq!(record.state.result, Some(serde_json::json!("echo: hello")));
    }

    fn placeholder_id() -> ExecutionId {
        ExecutionId::allocate(UserId::new("nobody"), 0)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_graph_fails_without_dispatching_any_node() {
        let engine = engine_with(Arc::new(EchoInvoker));
        let bad_graph = GraphWire {
            nodes: vec![input_node("in"), output_node("out")],
            edges: vec![edge("e1", "in", "out")],
        };
        let execution_id = Arc::clone(&engine).submit(submission(bad_graph));

        let mut sub = engine.subscribe(&execution_id);
        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), sub.receiver.recv())
                .await
                .expect("update arrives")
                .expect("channel open");
            if let ProgressMessage::ExecutionUpdate { status, .. } = message {
                if status == "completed" || status == "failed" {
                    assert_eq!(status, "failed");
                    break;
                }
            }
        }

        let record = engine.record(&UserId::new("alice"), &execution_id).expect("record present");
        assert_eq!(record.state.error.as_ref().map(ExecutionError::kind), Some("validation"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn agent_question_parks_execution_until_input_provided() {
        let engine = engine_with(Arc::new(QuestionInvoker));
        let execution_id = Arc::clone(&engine).submit(submission(linear_graph()));

        let mut sub = engine.subscribe(&execution_id);
        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), sub.receiver.recv())
                .await
                .expect("update arrives")
                .expect("channel open");
            if let ProgressMessage::InputRequest { .. } = message {
                break;
            }
        }

        assert!(engine.provide_input(&execution_id, "Call it Atlas".to_string()));
        assert!(!engine.provide_input(&execution_id, "second call is a no-op".to_string()));

        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), sub.receiver.recv())
                .await
                .expect("update arrives")
                .expect("channel open");
            if let ProgressMessage::ExecutionUpdate { status, .. } = message {
                if status == "completed" || status == "failed" {
                    assert_eq!(status, "completed");
                    break;
                }
            }
        }

        let record = engine.record(&UserId::new("alice"), &execution_id).expect("record present");
        assert_eq!(record.state.result, Some(serde_json::json!("Call it Atlas")));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn conditional_only_traverses_the_selected_branch() {
        let graph = GraphWire {
            nodes: vec![
                input_node("in"),
                NodeWire {
                    id: Some("c1".into()),
                    kind: Some("conditional".into()),
                    data: Some(serde_json::json!({"conditions": [
                        {"id": "yes", "is_default": true},
                    ]})),
                    position: None,
                },
                agent_node("a_yes", "Yes"),
                agent_node("a_no", "No"),
            ],
            edges: vec![
                edge("e1", "in", "c1"),
                EdgeWire {
                    id: Some("e2".into()),
                    source: Some("c1".into()),
                    target: Some("a_yes".into()),
                    source_handle: Some("yes".into()),
                    target_handle: None,
                },
                EdgeWire {
                    id: Some("e3".into()),
                    source: Some("c1".into()),
                    target: Some("a_no".into()),
                    source_handle: Some("no".into()),
                    target_handle: None,
                },
            ],
        };

        let engine = engine_with(Arc::new(EchoInvoker));
        let execution_id = Arc::clone(&engine).submit(submission(graph));

        let mut sub = engine.subscribe(&execution_id);
        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), sub.receiver.recv())
                .await
                .expect("update arrives")
                .expect("channel open");
            if let ProgressMessage::ExecutionUpdate { status, .. } = message {
                if status == "completed" || status == "failed" {
                    assert_eq!(status, "completed");
                    break;
                }
            }
        }

        let record = engine.record(&UserId::new("alice"), &execution_id).expect("record present");
        let yes_state = record.state.node_state(&NodeId::new("a_yes")).expect("tracked");
        let no_state = record.state.node_state(&NodeId::new("a_no")).expect("tracked");
        assert_eq!(yes_state.state, NodeState::Completed);
        assert_eq!(no_state.state, NodeState::Pending);
    }
}
