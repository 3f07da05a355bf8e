//! Prompt Enhancement Pipeline
//!
//! Orchestrates the fixed multi-stage conversation against the serving
//! daemon. Three mode families share the machinery:
//!
//! - **standard**: analysis, generation, vetting, finalization, enhancement,
//!   then a comprehensive review that combines everything and hands the
//!   draft to a presenter model for cleanup
//! - **solve**: one deterministic solve call plus a verify/correct pass,
//!   chosen automatically when the prompt reads like a problem statement
//! - **boost**: the six standard stages, each wrapped in a self-critique
//!   round-trip on a dedicated model
//!
//! Every stage call goes through the retry engine, which retries the
//! assigned model and then walks its configured fallback chain.
//!
//! ## Modules
//!
//! - `progress`: observer interface for stage-completion events
//! - `prompts`: conversation builders for each stage
//! - `registry`: stage-to-model and fallback resolution
//! - `retry`: retry-with-fallback engine
//! - `sanitize`: presenter marker stripping

pub mod progress;
pub mod prompts;
pub mod registry;
pub mod retry;
pub mod sanitize;

pub use progress::{FnObserver, LogObserver, NullObserver, ProgressEvent, ProgressObserver, SharedObserver};
pub use registry::ModelRegistry;
pub use retry::{RetryPolicy, invoke_with_fallback};
pub use sanitize::strip_presenter_marker;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::constants::pipeline::SOLVE_CUES;
use crate::gateway::{ChatGateway, ChatMessage, ChatOptions, SharedGateway};
use crate::types::{Error, Result, RunMode, StageName};

// =============================================================================
// Run Record
// =============================================================================

/// Outcome of one pipeline execution.
///
/// A stage failure after partial progress is not an `Err` from `execute`:
/// the run carries whatever stages completed plus the failure, so front
/// ends can show partial results.
#[derive(Debug)]
pub struct PipelineRun {
    pub id: Uuid,
    pub prompt: String,
    /// Resolved mode (never `Auto`)
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    /// Stage outputs keyed by result name ("analysis", "final", ...)
    pub results: BTreeMap<String, String>,
    /// Set when a stage exhausted its retry budget
    pub failure: Option<Error>,
}

impl PipelineRun {
    fn new(prompt: &str, mode: RunMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: prompt.to_string(),
            mode,
            started_at: Utc::now(),
            results: BTreeMap::new(),
            failure: None,
        }
    }

    /// The user-facing output, present when the run completed.
    pub fn final_output(&self) -> Option<&str> {
        self.results
            .get(StageName::Comprehensive.result_key())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    fn store(&mut self, stage: StageName, output: String) {
        self.results.insert(stage.result_key().to_string(), output);
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// The pipeline orchestrator. Holds the gateway, the model registry, and
/// the retry policy; cheap to share behind an `Arc` across front ends.
pub struct Pipeline {
    gateway: SharedGateway,
    registry: ModelRegistry,
    policy: RetryPolicy,
    observer: SharedObserver,
    default_mode: RunMode,
    boost_model: String,
    call_timeout: Duration,
    temperature: f32,
}

impl Pipeline {
    pub fn new(gateway: SharedGateway, registry: ModelRegistry) -> Self {
        Self {
            gateway,
            registry,
            policy: RetryPolicy::default(),
            observer: Arc::new(NullObserver),
            default_mode: RunMode::Auto,
            boost_model: crate::constants::pipeline::DEFAULT_BOOST_MODEL.to_string(),
            call_timeout: Duration::from_millis(crate::constants::network::MODEL_CALL_TIMEOUT_MS),
            temperature: 0.7,
        }
    }

    pub fn from_config(gateway: SharedGateway, config: &Config) -> Result<Self> {
        let registry = ModelRegistry::from_config(&config.models)?;
        Ok(Self {
            gateway,
            registry,
            policy: RetryPolicy::new(config.pipeline.max_retries),
            observer: Arc::new(NullObserver),
            default_mode: config.pipeline.mode,
            boost_model: config.pipeline.boost_model.clone(),
            call_timeout: config.llm.call_timeout(),
            temperature: config.llm.temperature,
        })
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    // =========================================================================
    // Entry Points
    // =========================================================================

    /// Run the pipeline. Returns `Err` only for fatal input/config problems;
    /// a stage failure mid-run is reported inside the returned record.
    pub async fn execute(&self, prompt: &str, mode: Option<RunMode>) -> Result<PipelineRun> {
        if prompt.trim().is_empty() {
            return Err(Error::InvalidPrompt("prompt is empty".to_string()));
        }

        let mode = self.resolve_mode(prompt, mode.unwrap_or(self.default_mode));
        debug!(%mode, run_prompt_chars = prompt.len(), "Starting pipeline");

        let mut run = PipelineRun::new(prompt, mode);
        self.emit(ProgressEvent::Started);

        let outcome = match mode {
            RunMode::Solve => self.run_solve(&mut run).await,
            RunMode::Boost => self.run_boost(&mut run).await,
            _ => self.run_standard(&mut run).await,
        };

        match outcome {
            Ok(()) => {
                self.emit(ProgressEvent::Completed {
                    output: run.final_output().unwrap_or_default().to_string(),
                });
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Pipeline stopped");
                if let Some(stage) = e.failed_stage() {
                    self.emit(ProgressEvent::StageFailed {
                        stage,
                        error: e.to_string(),
                    });
                }
                run.failure = Some(e);
            }
        }

        Ok(run)
    }

    /// Convenience wrapper that turns a stage failure into an `Err`,
    /// discarding partial results.
    pub async fn run(&self, prompt: &str, mode: Option<RunMode>) -> Result<BTreeMap<String, String>> {
        let run = self.execute(prompt, mode).await?;
        match run.failure {
            Some(e) => Err(e),
            None => Ok(run.results),
        }
    }

    /// Models the registry references that the daemon does not currently
    /// serve. Empty means every assignment is satisfiable.
    pub async fn validate_models(&self) -> Result<Vec<String>> {
        let available = self.gateway.list_models().await?;
        Ok(self
            .registry
            .all_models()
            .into_iter()
            .filter(|m| !available.contains(m))
            .collect())
    }

    // =========================================================================
    // Mode Resolution
    // =========================================================================

    /// `Auto` becomes `Solve` when the prompt carries answer-format cues,
    /// `Standard` otherwise. Explicit modes pass through.
    fn resolve_mode(&self, prompt: &str, requested: RunMode) -> RunMode {
        match requested {
            RunMode::Auto => {
                let text = prompt.to_lowercase();
                if SOLVE_CUES.iter().any(|cue| text.contains(cue)) {
                    RunMode::Solve
                } else {
                    RunMode::Standard
                }
            }
            explicit => explicit,
        }
    }

    // =========================================================================
    // Mode Flows
    // =========================================================================

    async fn run_standard(&self, run: &mut PipelineRun) -> Result<()> {
        let prompt = run.prompt.clone();
        let options = self.stage_options();

        self.emit(ProgressEvent::StageStarted { stage: StageName::Analysis });
        let analysis = self
            .chat_stage(StageName::Analysis, prompts::analysis(&prompt), &options)
            .await?;
        self.stage_done(run, StageName::Analysis, analysis);

        self.emit(ProgressEvent::StageStarted { stage: StageName::Generation });
        let generation = self
            .chat_stage(
                StageName::Generation,
                prompts::generation(&run.results["analysis"]),
                &options,
            )
            .await?;
        self.stage_done(run, StageName::Generation, generation);

        self.emit(ProgressEvent::StageStarted { stage: StageName::Vetting });
        let vetting = self
            .chat_stage(
                StageName::Vetting,
                prompts::vetting(&run.results["generation"]),
                &options,
            )
            .await?;
        self.stage_done(run, StageName::Vetting, vetting);

        self.emit(ProgressEvent::StageStarted { stage: StageName::Finalization });
        let finalized = self
            .chat_stage(
                StageName::Finalization,
                prompts::finalization(&prompt, &run.results["vetting"]),
                &options,
            )
            .await?;
        self.stage_done(run, StageName::Finalization, finalized);

        self.emit(ProgressEvent::StageStarted { stage: StageName::Enhancement });
        let enhanced = self
            .chat_stage(
                StageName::Enhancement,
                prompts::enhancement(&run.results["final"]),
                &options,
            )
            .await?;
        self.stage_done(run, StageName::Enhancement, enhanced);

        self.emit(ProgressEvent::StageStarted { stage: StageName::Comprehensive });
        let reviewed = self.comprehensive_stage(run, &prompt, &options).await?;
        run.store(StageName::Comprehensive, strip_presenter_marker(&reviewed));

        Ok(())
    }

    async fn run_solve(&self, run: &mut PipelineRun) -> Result<()> {
        let prompt = run.prompt.clone();
        let options = self.stage_options().deterministic();

        self.emit(ProgressEvent::StageStarted { stage: StageName::Solve });
        let solved = self
            .chat_stage(StageName::Solve, prompts::solve(&prompt), &options)
            .await?;
        run.store(StageName::Solve, solved.clone());

        self.emit(ProgressEvent::StageStarted { stage: StageName::Verify });
        let verified = self
            .chat_stage(StageName::Verify, prompts::verify(&prompt, &solved), &options)
            .await?;
        run.store(StageName::Verify, verified);

        Ok(())
    }

    async fn run_boost(&self, run: &mut PipelineRun) -> Result<()> {
        let prompt = run.prompt.clone();

        self.emit(ProgressEvent::StageStarted { stage: StageName::Analysis });
        let analysis = self
            .boost_stage(StageName::Analysis, prompts::analysis(&prompt))
            .await?;
        self.stage_done(run, StageName::Analysis, analysis);

        self.emit(ProgressEvent::StageStarted { stage: StageName::Generation });
        let generation = self
            .boost_stage(
                StageName::Generation,
                prompts::generation(&run.results["analysis"]),
            )
            .await?;
        self.stage_done(run, StageName::Generation, generation);

        self.emit(ProgressEvent::StageStarted { stage: StageName::Vetting });
        let vetting = self
            .boost_stage(StageName::Vetting, prompts::vetting(&run.results["generation"]))
            .await?;
        self.stage_done(run, StageName::Vetting, vetting);

        self.emit(ProgressEvent::StageStarted { stage: StageName::Finalization });
        let finalized = self
            .boost_stage(
                StageName::Finalization,
                prompts::finalization(&prompt, &run.results["vetting"]),
            )
            .await?;
        self.stage_done(run, StageName::Finalization, finalized);

        self.emit(ProgressEvent::StageStarted { stage: StageName::Enhancement });
        let enhanced = self
            .boost_stage(
                StageName::Enhancement,
                prompts::enhancement(&run.results["final"]),
            )
            .await?;
        self.stage_done(run, StageName::Enhancement, enhanced);

        // No presenter pass in boost mode: the reflection round already
        // produces a clean combined draft.
        self.emit(ProgressEvent::StageStarted { stage: StageName::Comprehensive });
        let reviewed = self
            .boost_stage(
                StageName::Comprehensive,
                prompts::comprehensive(
                    &prompt,
                    &run.results["analysis"],
                    &run.results["generation"],
                    &run.results["vetting"],
                    &run.results["final"],
                    &run.results["enhanced"],
                ),
            )
            .await?;
        run.store(StageName::Comprehensive, reviewed);

        Ok(())
    }

    // =========================================================================
    // Stage Invocation
    // =========================================================================

    fn stage_options(&self) -> ChatOptions {
        ChatOptions {
            timeout: self.call_timeout,
            temperature: Some(self.temperature),
        }
    }

    fn stage_done(&self, run: &mut PipelineRun, stage: StageName, output: String) {
        self.emit(ProgressEvent::StageDone {
            stage,
            output: output.clone(),
        });
        run.store(stage, output);
    }

    fn emit(&self, event: ProgressEvent) {
        self.observer.on_event(&event);
    }

    /// One stage, one conversation, full retry+fallback budget.
    async fn chat_stage(
        &self,
        stage: StageName,
        messages: Vec<ChatMessage>,
        options: &ChatOptions,
    ) -> Result<String> {
        let primary = self.registry.resolve(stage).to_string();
        let fallbacks = self.registry.fallbacks_for(&primary).to_vec();
        let gateway = Arc::clone(&self.gateway);
        let options = options.clone();

        invoke_with_fallback(&self.policy, stage, &primary, &fallbacks, move |model| {
            let gateway = Arc::clone(&gateway);
            let messages = messages.clone();
            let options = options.clone();
            async move { gateway.chat(&model, &messages, &options).await }
        })
        .await
    }

    /// The comprehensive review is two chained calls treated as one unit of
    /// retry: combine on the comprehensive model (the one fallbacks swap),
    /// then cleanup on the presenter model, which stays fixed.
    async fn comprehensive_stage(
        &self,
        run: &PipelineRun,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<String> {
        let combine = prompts::comprehensive(
            prompt,
            &run.results["analysis"],
            &run.results["generation"],
            &run.results["vetting"],
            &run.results["final"],
            &run.results["enhanced"],
        );
        let primary = self.registry.resolve(StageName::Comprehensive).to_string();
        let fallbacks = self.registry.fallbacks_for(&primary).to_vec();
        let presenter = self.registry.resolve(StageName::Presenter).to_string();
        let gateway = Arc::clone(&self.gateway);
        let options = options.clone();

        invoke_with_fallback(
            &self.policy,
            StageName::Comprehensive,
            &primary,
            &fallbacks,
            move |model| {
                let gateway = Arc::clone(&gateway);
                let combine = combine.clone();
                let presenter = presenter.clone();
                let options = options.clone();
                async move {
                    let draft = gateway.chat(&model, &combine, &options).await?;
                    let cleanup = prompts::presentation(&draft);
                    gateway.chat(&presenter, &cleanup, &options).await
                }
            },
        )
        .await
    }

    /// One boost stage: a three-call reflection round-trip, falling back to
    /// a plain single call when the reflection itself fails, all inside one
    /// retry budget on the boost model.
    async fn boost_stage(&self, stage: StageName, base: Vec<ChatMessage>) -> Result<String> {
        let primary = self.boost_model.clone();
        let fallbacks = self.registry.fallbacks_for(&primary).to_vec();
        let gateway = Arc::clone(&self.gateway);
        let options = self.stage_options();

        invoke_with_fallback(&self.policy, stage, &primary, &fallbacks, move |model| {
            let gateway = Arc::clone(&gateway);
            let base = base.clone();
            let options = options.clone();
            async move {
                match reflect(gateway.as_ref(), &model, &base, &options).await {
                    Ok(text) => Ok(text),
                    Err(e) => {
                        warn!(model = %model, error = %e, "Reflection failed, plain call");
                        gateway.chat(&model, &base, &options).await
                    }
                }
            }
        })
        .await
    }
}

/// Generate, critique, revise.
async fn reflect(
    gateway: &dyn ChatGateway,
    model: &str,
    base: &[ChatMessage],
    options: &ChatOptions,
) -> Result<String> {
    let draft = gateway.chat(model, base, options).await?;
    let critique = gateway
        .chat(model, &prompts::reflection_critique(base, &draft), options)
        .await?;
    gateway
        .chat(model, &prompts::reflection_revise(base, &draft, &critique), options)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelsConfig;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct RecordedCall {
        model: String,
        messages: Vec<ChatMessage>,
        temperature: Option<f32>,
    }

    /// Gateway that replays a queue of scripted responses and records
    /// every call it receives.
    struct ScriptedGateway {
        script: Mutex<VecDeque<Result<String>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedGateway {
        fn new(script: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into_iter().collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn ok_script(responses: &[&str]) -> Arc<Self> {
            Self::new(responses.iter().map(|r| Ok(r.to_string())).collect())
        }

        fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatGateway for ScriptedGateway {
        async fn chat(
            &self,
            model: &str,
            messages: &[ChatMessage],
            options: &ChatOptions,
        ) -> Result<String> {
            self.calls.lock().unwrap().push(RecordedCall {
                model: model.to_string(),
                messages: messages.to_vec(),
                temperature: options.temperature,
            });
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::model(model, "script exhausted")))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(vec!["llama3.2:latest".to_string(), "phi4:latest".to_string()])
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    fn pipeline_with(gateway: Arc<ScriptedGateway>) -> Pipeline {
        let registry = ModelRegistry::from_config(&ModelsConfig::default()).unwrap();
        Pipeline::new(gateway, registry).with_retry_policy(RetryPolicy::no_backoff(2))
    }

    #[tokio::test]
    async fn test_standard_run_threads_stage_outputs() {
        let gateway = ScriptedGateway::ok_script(&[
            "A1",
            "G1",
            "V1",
            "F1",
            "E1",
            "C1",
            "PRESENT TO USER: polished prompt",
        ]);
        let pipeline = pipeline_with(Arc::clone(&gateway));

        let run = pipeline
            .execute("improve my essay prompt", Some(RunMode::Standard))
            .await
            .unwrap();

        assert!(run.is_success());
        assert_eq!(run.mode, RunMode::Standard);
        assert_eq!(run.results["analysis"], "A1");
        assert_eq!(run.results["generation"], "G1");
        assert_eq!(run.results["vetting"], "V1");
        assert_eq!(run.results["final"], "F1");
        assert_eq!(run.results["enhanced"], "E1");
        assert_eq!(run.final_output(), Some("polished prompt"));

        let calls = gateway.calls();
        assert_eq!(calls.len(), 7);
        // Stage models from the default assignments
        assert_eq!(calls[0].model, "llama3.2:latest");
        assert_eq!(calls[5].model, "phi4:latest");
        assert_eq!(calls[6].model, "deepseek-r1:14b");
        // Each stage consumes the previous stage's output
        assert!(calls[1].messages[0].content.contains("'A1'"));
        assert!(calls[2].messages[0].content.contains("'G1'"));
        assert!(calls[3].messages[0].content.contains("improve my essay prompt"));
        assert!(calls[3].messages[0].content.contains("V1"));
        assert!(calls[4].messages[0].content.contains("F1"));
        assert!(calls[5].messages[0].content.contains("Enhanced: E1"));
        assert!(calls[6].messages[0].content.contains("C1"));
    }

    #[tokio::test]
    async fn test_auto_mode_detects_solve_cue() {
        let gateway = ScriptedGateway::ok_script(&["42", "42 verified"]);
        let pipeline = pipeline_with(Arc::clone(&gateway));

        let run = pipeline
            .execute("Compute the sum. Return only the number.", None)
            .await
            .unwrap();

        assert_eq!(run.mode, RunMode::Solve);
        assert_eq!(run.results["solved"], "42");
        assert_eq!(run.final_output(), Some("42 verified"));

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].temperature, Some(0.0));
        assert_eq!(calls[1].temperature, Some(0.0));
        // Solve runs on the comprehensive model, verify on the presenter
        assert_eq!(calls[0].model, "phi4:latest");
        assert_eq!(calls[1].model, "deepseek-r1:14b");
        assert!(calls[1].messages[1].content.contains("Proposed answer:\n42"));
    }

    #[tokio::test]
    async fn test_auto_mode_defaults_to_standard() {
        let gateway = ScriptedGateway::ok_script(&[
            "a", "g", "v", "f", "e", "c", "PRESENT TO USER: out",
        ]);
        let pipeline = pipeline_with(gateway);
        let run = pipeline.execute("make this prompt better", None).await.unwrap();
        assert_eq!(run.mode, RunMode::Standard);
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected() {
        let pipeline = pipeline_with(ScriptedGateway::ok_script(&[]));
        let err = pipeline.execute("   \n ", None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPrompt(_)));
    }

    #[tokio::test]
    async fn test_stage_failure_keeps_partial_results() {
        // Analysis succeeds; generation fails through its whole budget
        // (2 primary attempts + 2 fallbacks).
        let gateway = ScriptedGateway::new(vec![Ok("A1".to_string())]);
        let pipeline = pipeline_with(Arc::clone(&gateway));

        let run = pipeline
            .execute("improve this", Some(RunMode::Standard))
            .await
            .unwrap();

        assert!(!run.is_success());
        assert_eq!(run.results["analysis"], "A1");
        assert!(run.final_output().is_none());

        let failure = run.failure.unwrap();
        assert_eq!(failure.failed_stage(), Some(StageName::Generation));
        match failure {
            Error::StageExhausted { attempts, .. } => {
                assert_eq!(attempts.len(), 4);
                assert_eq!(attempts[0].model, "olmo2:13b");
                assert_eq!(attempts[2].model, "deepseek-r1:14b");
                assert_eq!(attempts[3].model, "phi4:latest");
            }
            other => panic!("expected StageExhausted, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back() {
        let mut script: Vec<Result<String>> = vec![
            Err(Error::model("llama3.2:latest", "not loaded")),
            Err(Error::model("llama3.2:latest", "not loaded")),
            Ok("A-fb".to_string()),
        ];
        script.extend(
            ["g", "v", "f", "e", "c", "PRESENT TO USER: out"]
                .iter()
                .map(|r| Ok(r.to_string())),
        );
        let gateway = ScriptedGateway::new(script);
        let pipeline = pipeline_with(Arc::clone(&gateway));

        let run = pipeline
            .execute("improve this", Some(RunMode::Standard))
            .await
            .unwrap();

        assert!(run.is_success());
        assert_eq!(run.results["analysis"], "A-fb");

        let calls = gateway.calls();
        assert_eq!(calls[0].model, "llama3.2:latest");
        assert_eq!(calls[1].model, "llama3.2:latest");
        // First fallback for llama3.2:latest
        assert_eq!(calls[2].model, "deepseek-r1");
    }

    #[tokio::test]
    async fn test_missing_marker_passes_through() {
        let gateway = ScriptedGateway::ok_script(&[
            "a", "g", "v", "f", "e", "c", "final text without marker",
        ]);
        let pipeline = pipeline_with(gateway);
        let run = pipeline
            .execute("improve this", Some(RunMode::Standard))
            .await
            .unwrap();
        assert_eq!(run.final_output(), Some("final text without marker"));
    }

    #[tokio::test]
    async fn test_boost_mode_reflection_round_trips() {
        // 6 stages, 3 calls each
        let responses: Vec<String> = (1..=18).map(|i| format!("r{i}")).collect();
        let refs: Vec<&str> = responses.iter().map(String::as_str).collect();
        let gateway = ScriptedGateway::ok_script(&refs);
        let pipeline = pipeline_with(Arc::clone(&gateway));

        let run = pipeline
            .execute("improve this", Some(RunMode::Boost))
            .await
            .unwrap();

        assert!(run.is_success());
        // Each stage's result is the revised (third) response
        assert_eq!(run.results["analysis"], "r3");
        assert_eq!(run.results["enhanced"], "r15");
        assert_eq!(run.final_output(), Some("r18"));

        let calls = gateway.calls();
        assert_eq!(calls.len(), 18);
        assert!(calls.iter().all(|c| c.model == "mistral:latest"));
        // Critique turn carries the draft as an assistant message
        assert!(
            calls[1]
                .messages
                .iter()
                .any(|m| m.content == "r1")
        );
    }

    #[tokio::test]
    async fn test_boost_reflection_failure_falls_back_to_plain_call() {
        let mut script: Vec<Result<String>> = vec![
            Ok("draft".to_string()),
            Err(Error::model("mistral:latest", "critique failed")),
            Ok("plain".to_string()),
        ];
        // Remaining five stages reflect cleanly
        script.extend((1..=15).map(|i| Ok(format!("s{i}"))));
        let gateway = ScriptedGateway::new(script);
        let pipeline = pipeline_with(Arc::clone(&gateway));

        let run = pipeline
            .execute("improve this", Some(RunMode::Boost))
            .await
            .unwrap();

        assert!(run.is_success());
        assert_eq!(run.results["analysis"], "plain");
        assert_eq!(gateway.calls().len(), 18);
    }

    #[tokio::test]
    async fn test_run_surfaces_stage_failure_as_error() {
        let pipeline = pipeline_with(ScriptedGateway::new(vec![]));
        let err = pipeline
            .run("improve this", Some(RunMode::Standard))
            .await
            .unwrap_err();
        assert_eq!(err.failed_stage(), Some(StageName::Analysis));
    }

    #[tokio::test]
    async fn test_progress_events_in_order() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let gateway = ScriptedGateway::ok_script(&[
            "a", "g", "v", "f", "e", "c", "PRESENT TO USER: out",
        ]);
        let registry = ModelRegistry::from_config(&ModelsConfig::default()).unwrap();
        let pipeline = Pipeline::new(gateway, registry)
            .with_retry_policy(RetryPolicy::no_backoff(2))
            .with_observer(Arc::new(FnObserver(move |e: &ProgressEvent| {
                sink.lock().unwrap().push(e.phase().to_string());
            })));

        pipeline
            .execute("improve this", Some(RunMode::Standard))
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "start",
                "analyzing",
                "analysis_done",
                "generating",
                "generation_done",
                "vetting",
                "vetting_done",
                "finalizing",
                "finalize_done",
                "enhancing",
                "enhance_done",
                "comprehensive",
                "complete",
            ]
        );
    }

    #[tokio::test]
    async fn test_validate_models_reports_missing() {
        let pipeline = pipeline_with(ScriptedGateway::ok_script(&[]));
        let missing = pipeline.validate_models().await.unwrap();
        // The scripted daemon only serves llama3.2 and phi4
        assert!(missing.contains(&"olmo2:13b".to_string()));
        assert!(missing.contains(&"deepseek-r1".to_string()));
        assert!(!missing.contains(&"phi4:latest".to_string()));
    }
}
