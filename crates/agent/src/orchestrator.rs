//! The orchestration loop.
//!
//! One session answers one user message. Each step invokes the current
//! agent exactly once, parses its decision and either finishes, runs a tool,
//! hands the task to another agent, or recovers by routing back to the
//! entry agent. The step budget bounds the number of completion calls.

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use miniagi_config::AppConfig;
use miniagi_core::agent::AgentRegistry;
use miniagi_core::decision::{Decision, DecisionKind, MAX_STEPS_REACHED, NO_ANSWER, StepEvent};
use miniagi_core::error::OrchestrationError;
use miniagi_core::event::{DomainEvent, EventBus};
use miniagi_core::provider::{Provider, ProviderRequest};
use miniagi_core::tool::{ToolRegistry, arg_str};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::parser;
use crate::prompt::build_messages;

pub const DEFAULT_ENTRY_AGENT: &str = "orchestrator";

/// Per-run options.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Maximum number of agent invocations (completion calls).
    pub max_steps: u32,
    /// Caller-supplied instruction prepended to every system turn.
    pub system_instruction: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// An agent returned a `final` action.
    Answered,
    /// The step budget ran out; the answer is [`MAX_STEPS_REACHED`].
    BudgetExhausted,
}

impl SessionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::BudgetExhausted => "budget_exhausted",
        }
    }
}

/// What a session returns to its caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: String,
    pub answer: String,
    pub events: Vec<StepEvent>,
    pub outcome: SessionOutcome,
    pub steps_taken: u32,
}

/// Mutable state of one session. Owned by the run, never shared.
struct Session {
    id: String,
    message: String,
    steps_taken: u32,
    current_agent: String,
    current_query: String,
    context_log: Vec<String>,
    events: Vec<StepEvent>,
}

impl Session {
    fn report(&mut self, answer: String, outcome: SessionOutcome) -> SessionReport {
        SessionReport {
            session_id: self.id.clone(),
            answer,
            events: std::mem::take(&mut self.events),
            outcome,
            steps_taken: self.steps_taken,
        }
    }
}

/// Runs sessions over shared, read-only registries.
///
/// `run` takes `&self`, so one orchestrator can serve concurrent sessions.
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    agents: Arc<AgentRegistry>,
    model: String,
    entry_agent: String,
    temperature: f32,
    max_tokens: Option<u32>,
    step_timeout: Duration,
    session_timeout: Option<Duration>,
    event_bus: Option<Arc<EventBus>>,
}

impl Orchestrator {
    /// Create an orchestrator whose entry agent is `"orchestrator"`.
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        agents: Arc<AgentRegistry>,
        model: impl Into<String>,
    ) -> Result<Self, OrchestrationError> {
        Self::build(provider, tools, agents, model.into(), DEFAULT_ENTRY_AGENT)
    }

    /// Apply the `[llm]` and `[orchestrator]` sections.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        agents: Arc<AgentRegistry>,
    ) -> Result<Self, OrchestrationError> {
        let mut orchestrator = Self::build(
            provider,
            tools,
            agents,
            config.llm.model_name(),
            &config.orchestrator.entry_agent,
        )?
        .with_temperature(config.llm.temperature)
        .with_step_timeout(Duration::from_secs(config.orchestrator.step_timeout_secs));
        orchestrator.max_tokens = config.llm.max_tokens;
        orchestrator.session_timeout = config
            .orchestrator
            .session_timeout_secs
            .map(Duration::from_secs);
        Ok(orchestrator)
    }

    fn build(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        agents: Arc<AgentRegistry>,
        model: String,
        entry_agent: &str,
    ) -> Result<Self, OrchestrationError> {
        if !agents.contains(entry_agent) {
            return Err(OrchestrationError::UnknownEntryAgent(entry_agent.to_string()));
        }
        Ok(Self {
            provider,
            tools,
            agents,
            model,
            entry_agent: entry_agent.to_string(),
            temperature: 0.2,
            max_tokens: None,
            step_timeout: Duration::from_secs(60),
            session_timeout: None,
            event_bus: None,
        })
    }

    /// Use a different registered agent as the entry and recovery target.
    pub fn with_entry_agent(mut self, name: &str) -> Result<Self, OrchestrationError> {
        if !self.agents.contains(name) {
            return Err(OrchestrationError::UnknownEntryAgent(name.to_string()));
        }
        self.entry_agent = name.to_string();
        Ok(self)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Bound each completion call.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Bound a whole session, tool calls included.
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = Some(timeout);
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn entry_agent(&self) -> &str {
        &self.entry_agent
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    /// Answer `message` using at most `max_steps` agent invocations.
    pub async fn run(&self, message: &str, max_steps: u32) -> Result<SessionReport, OrchestrationError> {
        self.run_with(
            message,
            SessionOptions {
                max_steps,
                system_instruction: None,
            },
        )
        .await
    }

    pub async fn run_with(
        &self,
        message: &str,
        options: SessionOptions,
    ) -> Result<SessionReport, OrchestrationError> {
        let mut session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            message: message.to_string(),
            steps_taken: 0,
            current_agent: self.entry_agent.clone(),
            current_query: message.to_string(),
            context_log: Vec::new(),
            events: Vec::new(),
        };

        info!(
            session_id = %session.id,
            entry_agent = %self.entry_agent,
            max_steps = options.max_steps,
            "Session started"
        );
        self.publish(DomainEvent::SessionStarted {
            session_id: session.id.clone(),
            entry_agent: self.entry_agent.clone(),
            max_steps: options.max_steps,
            timestamp: Utc::now(),
        });

        let result = match self.session_timeout {
            None => self.drive(&mut session, &options).await,
            Some(limit) => match tokio::time::timeout(limit, self.drive(&mut session, &options)).await {
                Ok(result) => result,
                Err(_) => Err(OrchestrationError::SessionTimeout {
                    session_id: session.id.clone(),
                    timeout_secs: limit.as_secs(),
                    steps_taken: session.steps_taken,
                }),
            },
        };

        match &result {
            Ok(report) => {
                info!(
                    session_id = %report.session_id,
                    steps = report.steps_taken,
                    outcome = report.outcome.as_str(),
                    "Session finished"
                );
                self.publish(DomainEvent::SessionFinished {
                    session_id: report.session_id.clone(),
                    steps: report.steps_taken,
                    outcome: report.outcome.as_str().to_string(),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "Session aborted");
                self.publish(DomainEvent::ErrorOccurred {
                    context: format!("session {}", session.id),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
        result
    }

    async fn drive(
        &self,
        session: &mut Session,
        options: &SessionOptions,
    ) -> Result<SessionReport, OrchestrationError> {
        loop {
            if session.steps_taken >= options.max_steps {
                warn!(session_id = %session.id, steps = session.steps_taken, "Step budget exhausted");
                return Ok(session.report(MAX_STEPS_REACHED.to_string(), SessionOutcome::BudgetExhausted));
            }

            let step = session.steps_taken + 1;
            let agent_name = session.current_agent.clone();
            let decision = self.invoke_agent(session, step, options).await?;
            session.steps_taken = step;

            let record = decision.to_record();
            session.context_log.push(format!("[{agent_name} step {step}] {record}"));
            session.events.push(StepEvent::from_decision(step, &agent_name, &decision));

            info!(
                session_id = %session.id,
                step,
                agent = %agent_name,
                action = decision.action_name(),
                tool = decision.tool().unwrap_or(""),
                target_agent = decision.target_agent().unwrap_or(""),
                "Agent step"
            );
            self.publish(DomainEvent::StepCompleted {
                session_id: session.id.clone(),
                step,
                agent: agent_name.clone(),
                action: decision.action_name().to_string(),
                timestamp: Utc::now(),
            });

            match decision.kind {
                DecisionKind::Final { answer } => {
                    let answer = if answer.trim().is_empty() {
                        NO_ANSWER.to_string()
                    } else {
                        answer
                    };
                    return Ok(session.report(answer, SessionOutcome::Answered));
                }
                DecisionKind::UseTool { tool: Some(tool), args } if self.tools.contains(&tool) => {
                    let outcome = self.tools.call(&tool, &args).await;
                    self.publish(DomainEvent::ToolExecuted {
                        session_id: session.id.clone(),
                        tool_name: tool.clone(),
                        success: outcome.success,
                        duration_ms: outcome.duration_ms,
                        timestamp: Utc::now(),
                    });
                    session.current_query = format!(
                        "Tool `{tool}` output:\n{}\n\nNow continue your reasoning and decide next action.",
                        outcome.output
                    );
                }
                DecisionKind::UseTool { tool, .. } => {
                    let name = tool.as_deref().unwrap_or("(none)");
                    let query = format!(
                        "Unknown tool '{name}'. Please provide a final answer with available information."
                    );
                    self.recover(session, step, query);
                }
                DecisionKind::Delegate { target: Some(target), args, answer }
                    if self.agents.contains(&target) =>
                {
                    let mut query = if args.contains_key("task") {
                        arg_str(&args, "task")
                    } else {
                        answer
                    };
                    if query.trim().is_empty() {
                        query = format!("User goal: {}", session.message);
                    }
                    debug!(session_id = %session.id, from = %agent_name, to = %target, "Delegating");
                    session.current_agent = target;
                    session.current_query = query;
                }
                DecisionKind::Delegate { target, .. } => {
                    let name = target.as_deref().unwrap_or("(none)");
                    let query = format!(
                        "Unknown agent '{name}'. Please handle the task yourself or use available tools."
                    );
                    self.recover(session, step, query);
                }
                DecisionKind::Unknown { action, raw } => {
                    self.recover(
                        session,
                        step,
                        format!(
                            "Invalid action '{action}'. Previous JSON: {raw}\nPlease provide a 'final' answer."
                        ),
                    );
                }
            }
        }
    }

    /// One completion call for the current agent, bounded by the step timeout.
    async fn invoke_agent(
        &self,
        session: &Session,
        step: u32,
        options: &SessionOptions,
    ) -> Result<Decision, OrchestrationError> {
        let agent = self
            .agents
            .get(&session.current_agent)
            .ok_or_else(|| OrchestrationError::UnknownEntryAgent(session.current_agent.clone()))?;

        let messages = build_messages(
            &agent.preamble,
            options.system_instruction.as_deref(),
            &session.context_log,
            &session.current_query,
        );
        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(session_id = %session.id, step, agent = %agent.name, "Invoking agent");

        let response = match tokio::time::timeout(self.step_timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => {
                return Err(OrchestrationError::Completion {
                    session_id: session.id.clone(),
                    step,
                    agent: agent.name.clone(),
                    provider: self.provider.name().to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(OrchestrationError::StepTimeout {
                    session_id: session.id.clone(),
                    step,
                    agent: agent.name.clone(),
                    timeout_secs: self.step_timeout.as_secs(),
                });
            }
        };

        Ok(parser::parse(&response.content))
    }

    /// Route the session back to the entry agent with a corrective query.
    fn recover(&self, session: &mut Session, step: u32, query: String) {
        warn!(
            session_id = %session.id,
            step,
            agent = %session.current_agent,
            reason = %query,
            "Recovering via entry agent"
        );
        self.publish(DomainEvent::Recovered {
            session_id: session.id.clone(),
            step,
            reason: query.clone(),
            timestamp: Utc::now(),
        });
        session.current_agent = self.entry_agent.clone();
        session.current_query = query;
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personas::{build_registry, builtin_specs};
    use crate::test_helpers::*;
    use miniagi_core::error::ProviderError;
    use miniagi_core::message::Role;

    fn orchestrator(provider: Arc<dyn Provider>) -> Orchestrator {
        let tools = Arc::new(tool_registry());
        let agents = Arc::new(build_registry(&builtin_specs(), &tools).unwrap());
        Orchestrator::new(provider, tools, agents, "mock-model").unwrap()
    }

    const USE_MISSING: &str =
        r#"{"thought":"check file","action":"use_tool","tool":"read_file","args":{"path":"missing.txt"}}"#;

    #[tokio::test]
    async fn scenario_direct_answer() {
        let provider = Arc::new(ScriptedProvider::new(&[
            r#"{"thought":"greeting","action":"final","answer":"Hi there"}"#,
        ]));
        let report = orchestrator(provider.clone()).run("Hello", 10).await.unwrap();

        assert_eq!(report.answer, "Hi there");
        assert_eq!(report.outcome, SessionOutcome::Answered);
        assert_eq!(report.steps_taken, 1);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].agent, "orchestrator");
        assert_eq!(report.events[0].action, "final");
        assert_eq!(provider.calls(), 1);

        let request = &provider.requests()[0];
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.starts_with("You are OrchestratorAgent"));
        assert_eq!(request.messages[1].content, "Hello");
        assert_eq!(request.model, "mock-model");
    }

    #[tokio::test]
    async fn scenario_tool_error_then_answer() {
        let provider = Arc::new(ScriptedProvider::new(&[
            USE_MISSING,
            r#"{"thought":"file missing","action":"final","answer":"The file does not exist."}"#,
        ]));
        let report = orchestrator(provider.clone()).run("Summarise missing.txt", 10).await.unwrap();

        assert_eq!(report.answer, "The file does not exist.");
        assert_eq!(report.events.len(), 2);
        assert_eq!(report.events[0].action, "use_tool");
        assert_eq!(report.events[0].tool.as_deref(), Some("read_file"));
        assert_eq!(report.events[1].action, "final");

        let second = &provider.requests()[1];
        assert!(second.messages[1].content.starts_with("Tool `read_file` output:\nERROR(read_file): missing.txt"));
        assert!(second.messages[1].content.ends_with("Now continue your reasoning and decide next action."));
        assert!(second.messages[0].content.contains("Context from previous steps:\n[orchestrator step 1] {"));
    }

    #[tokio::test]
    async fn scenario_budget_exhausted() {
        let provider = Arc::new(ScriptedProvider::new(&[USE_MISSING, USE_MISSING]));
        let report = orchestrator(provider.clone()).run("loop", 2).await.unwrap();

        assert_eq!(report.answer, MAX_STEPS_REACHED);
        assert_eq!(report.outcome, SessionOutcome::BudgetExhausted);
        assert_eq!(report.events.len(), 2);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn scenario_delegation_to_coder() {
        let provider = Arc::new(ScriptedProvider::new(&[
            r#"{"thought":"coding","action":"delegate","target_agent":"coder","args":{"task":"write fibonacci"}}"#,
            r#"{"thought":"done","action":"final","answer":"def fib(n): ..."}"#,
        ]));
        let report = orchestrator(provider.clone()).run("I need fibonacci in Python", 5).await.unwrap();

        assert_eq!(report.events[0].target_agent.as_deref(), Some("coder"));
        assert_eq!(report.events[1].agent, "coder");
        let second = &provider.requests()[1];
        assert!(second.messages[0].content.starts_with("You are CoderAgent"));
        assert_eq!(second.messages[1].content, "write fibonacci");
    }

    #[tokio::test]
    async fn zero_budget_makes_no_calls() {
        let provider = Arc::new(ScriptedProvider::new(&[]));
        let report = orchestrator(provider.clone()).run("anything", 0).await.unwrap();
        assert_eq!(report.answer, MAX_STEPS_REACHED);
        assert!(report.events.is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn completion_calls_never_exceed_budget() {
        for max_steps in 0..6 {
            let provider = Arc::new(RepeatingProvider::new(USE_MISSING));
            let report = orchestrator(provider.clone()).run("loop", max_steps).await.unwrap();
            assert!(provider.calls() <= max_steps as usize);
            assert_eq!(report.events.len(), max_steps as usize);
        }
    }

    #[tokio::test]
    async fn unknown_tool_recovers_to_entry_agent() {
        let provider = Arc::new(ScriptedProvider::new(&[
            r#"{"action":"delegate","target_agent":"coder","args":{"task":"build it"}}"#,
            r#"{"action":"use_tool","tool":"teleport","args":{}}"#,
            r#"{"action":"final","answer":"ok"}"#,
        ]));
        let report = orchestrator(provider.clone()).run("go", 5).await.unwrap();

        assert_eq!(report.events[1].agent, "coder");
        assert_eq!(report.events[2].agent, "orchestrator");
        let third = &provider.requests()[2];
        assert_eq!(
            third.messages[1].content,
            "Unknown tool 'teleport'. Please provide a final answer with available information."
        );
    }

    #[tokio::test]
    async fn absent_tool_reports_none() {
        let provider = Arc::new(ScriptedProvider::new(&[
            r#"{"action":"use_tool"}"#,
            r#"{"action":"final","answer":"ok"}"#,
        ]));
        orchestrator(provider.clone()).run("go", 5).await.unwrap();
        assert!(provider.requests()[1].messages[1].content.starts_with("Unknown tool '(none)'"));
    }

    #[tokio::test]
    async fn unknown_agent_recovers_to_entry_agent() {
        let provider = Arc::new(ScriptedProvider::new(&[
            r#"{"action":"delegate","target_agent":"coder","args":{"task":"x"}}"#,
            r#"{"action":"delegate","target_agent":"ghost"}"#,
            r#"{"action":"final","answer":"ok"}"#,
        ]));
        let report = orchestrator(provider.clone()).run("go", 5).await.unwrap();
        assert_eq!(report.events[2].agent, "orchestrator");
        assert_eq!(
            provider.requests()[2].messages[1].content,
            "Unknown agent 'ghost'. Please handle the task yourself or use available tools."
        );
    }

    #[tokio::test]
    async fn delegation_without_task_uses_answer_then_goal() {
        let provider = Arc::new(ScriptedProvider::new(&[
            r#"{"action":"delegate","target_agent":"researcher","answer":"compare the options"}"#,
            r#"{"action":"delegate","target_agent":"coder"}"#,
            r#"{"action":"final","answer":"ok"}"#,
        ]));
        let report = orchestrator(provider.clone()).run("Pick a framework", 5).await.unwrap();
        assert_eq!(report.answer, "ok");
        // researcher has no delegates, but the loop does not enforce personas
        let requests = provider.requests();
        assert_eq!(requests[1].messages[1].content, "compare the options");
        assert_eq!(requests[2].messages[1].content, "User goal: Pick a framework");
    }

    #[tokio::test]
    async fn non_string_task_is_stringified() {
        let provider = Arc::new(ScriptedProvider::new(&[
            r#"{"action":"delegate","target_agent":"coder","args":{"task":{"lang":"python"}}}"#,
            r#"{"action":"final","answer":"ok"}"#,
        ]));
        orchestrator(provider.clone()).run("go", 5).await.unwrap();
        assert_eq!(provider.requests()[1].messages[1].content, r#"{"lang":"python"}"#);
    }

    #[tokio::test]
    async fn invalid_action_recovers_with_record() {
        let provider = Arc::new(ScriptedProvider::new(&[
            r#"{"action":"dance"}"#,
            r#"{"action":"final","answer":"ok"}"#,
        ]));
        let report = orchestrator(provider.clone()).run("go", 5).await.unwrap();
        assert_eq!(report.events[0].action, "dance");
        let query = &provider.requests()[1].messages[1].content;
        assert!(query.starts_with("Invalid action 'dance'. Previous JSON: {"));
        assert!(query.ends_with("\nPlease provide a 'final' answer."));
    }

    #[tokio::test]
    async fn prose_reply_is_final_answer() {
        let provider = Arc::new(ScriptedProvider::new(&["Paris is the capital of France."]));
        let report = orchestrator(provider).run("Capital of France?", 3).await.unwrap();
        assert_eq!(report.answer, "Paris is the capital of France.");
        assert_eq!(report.events[0].thought, "parsing failed");
    }

    #[tokio::test]
    async fn empty_final_answer_becomes_sentinel() {
        let provider = Arc::new(ScriptedProvider::new(&[r#"{"action":"final","answer":""}"#]));
        let report = orchestrator(provider).run("?", 3).await.unwrap();
        assert_eq!(report.answer, NO_ANSWER);
    }

    #[tokio::test]
    async fn custom_instruction_reaches_every_step() {
        let provider = Arc::new(ScriptedProvider::new(&[
            USE_MISSING,
            r#"{"action":"final","answer":"ok"}"#,
        ]));
        let orch = orchestrator(provider.clone());
        orch.run_with(
            "go",
            SessionOptions {
                max_steps: 5,
                system_instruction: Some("Answer in French.".into()),
            },
        )
        .await
        .unwrap();
        for request in provider.requests() {
            assert!(request.messages[0].content.starts_with("CUSTOM USER INSTRUCTIONS:\nAnswer in French.\n"));
        }
    }

    #[tokio::test]
    async fn provider_error_aborts_with_context() {
        let provider = Arc::new(FailingProvider::new(ProviderError::Network("connection refused".into())));
        let err = orchestrator(provider).run("Hello", 3).await.unwrap_err();
        match err {
            OrchestrationError::Completion { step, agent, provider, source, .. } => {
                assert_eq!(step, 1);
                assert_eq!(agent, "orchestrator");
                assert_eq!(provider, "failing_mock");
                assert!(matches!(source, ProviderError::Network(_)));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn step_timeout_aborts() {
        let orch = orchestrator(Arc::new(SlowProvider)).with_step_timeout(Duration::from_secs(5));
        let err = orch.run("Hello", 3).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::StepTimeout { step: 1, timeout_secs: 5, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn session_timeout_reports_progress() {
        let orch = orchestrator(Arc::new(SlowProvider))
            .with_step_timeout(Duration::from_secs(3600 * 2))
            .with_session_timeout(Duration::from_secs(10));
        let err = orch.run("Hello", 3).await.unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::SessionTimeout { timeout_secs: 10, steps_taken: 0, .. }
        ));
    }

    #[tokio::test]
    async fn unknown_entry_agent_rejected() {
        let provider = Arc::new(ScriptedProvider::new(&[]));
        let tools = Arc::new(tool_registry());
        let agents = Arc::new(AgentRegistry::new());
        assert!(matches!(
            Orchestrator::new(provider.clone(), tools.clone(), agents, "m"),
            Err(OrchestrationError::UnknownEntryAgent(_))
        ));
        let orch = orchestrator(provider);
        assert!(orch.with_entry_agent("ghost").is_err());
    }

    #[tokio::test]
    async fn recovery_targets_custom_entry_agent() {
        let provider = Arc::new(ScriptedProvider::new(&[
            r#"{"action":"use_tool","tool":"teleport"}"#,
            r#"{"action":"final","answer":"ok"}"#,
        ]));
        let orch = orchestrator(provider).with_entry_agent("researcher").unwrap();
        let report = orch.run("go", 3).await.unwrap();
        assert_eq!(report.events[0].agent, "researcher");
        assert_eq!(report.events[1].agent, "researcher");
    }

    #[tokio::test]
    async fn events_published_on_bus() {
        let bus = Arc::new(EventBus::new(64));
        let mut rx = bus.subscribe();
        let provider = Arc::new(ScriptedProvider::new(&[
            USE_MISSING,
            r#"{"action":"final","answer":"ok"}"#,
        ]));
        orchestrator(provider).with_event_bus(bus).run("go", 5).await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(match event.as_ref() {
                DomainEvent::SessionStarted { .. } => "started",
                DomainEvent::StepCompleted { .. } => "step",
                DomainEvent::ToolExecuted { success, .. } => {
                    assert!(!success);
                    "tool"
                }
                DomainEvent::Recovered { .. } => "recovered",
                DomainEvent::SessionFinished { .. } => "finished",
                DomainEvent::ErrorOccurred { .. } => "error",
            });
        }
        assert_eq!(kinds, vec!["started", "step", "tool", "step", "finished"]);
    }

    #[tokio::test]
    async fn tool_success_comes_from_the_registry() {
        let path = std::env::temp_dir().join(format!("miniagi-{}.log", uuid::Uuid::new_v4()));
        std::fs::write(&path, "ERROR(build): linker failed").unwrap();
        let read = serde_json::json!({
            "action": "use_tool",
            "tool": "read_file",
            "args": {"path": path.to_string_lossy()}
        })
        .to_string();

        let bus = Arc::new(EventBus::new(64));
        let mut rx = bus.subscribe();
        let provider = Arc::new(ScriptedProvider::new(&[
            read.as_str(),
            r#"{"action":"final","answer":"build log read"}"#,
        ]));
        orchestrator(provider.clone()).with_event_bus(bus).run("go", 5).await.unwrap();
        std::fs::remove_file(&path).ok();

        let mut tool_events = 0;
        while let Ok(event) = rx.try_recv() {
            if let DomainEvent::ToolExecuted { success, .. } = event.as_ref() {
                assert!(*success);
                tool_events += 1;
            }
        }
        assert_eq!(tool_events, 1);
        assert!(provider.requests()[1].messages[1]
            .content
            .contains("ERROR(build): linker failed"));
    }

    #[tokio::test]
    async fn concurrent_sessions_are_independent() {
        let orch = Arc::new(orchestrator(Arc::new(EchoQueryProvider)));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let orch = orch.clone();
                tokio::spawn(async move { orch.run(&format!("question {i}"), 3).await.unwrap() })
            })
            .collect();

        let mut ids = std::collections::HashSet::new();
        for (i, handle) in handles.into_iter().enumerate() {
            let report = handle.await.unwrap();
            assert_eq!(report.answer, format!("echo: question {i}"));
            assert_eq!(report.events.len(), 1);
            ids.insert(report.session_id);
        }
        assert_eq!(ids.len(), 8);
    }

    #[tokio::test]
    async fn from_config_applies_sections() {
        let mut config = AppConfig::default();
        config.llm.model = Some("glm-4.6".into());
        config.llm.max_tokens = Some(512);
        config.orchestrator.entry_agent = "coder".into();
        let provider = Arc::new(ScriptedProvider::new(&[r#"{"action":"final","answer":"ok"}"#]));
        let tools = Arc::new(tool_registry());
        let agents = Arc::new(build_registry(&builtin_specs(), &tools).unwrap());
        let orch = Orchestrator::from_config(&config, provider.clone(), tools, agents).unwrap();

        assert_eq!(orch.entry_agent(), "coder");
        assert_eq!(orch.model(), "glm-4.6");
        orch.run("x", 1).await.unwrap();
        assert_eq!(provider.requests()[0].max_tokens, Some(512));
    }
}
