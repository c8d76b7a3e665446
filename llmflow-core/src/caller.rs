//! `LLMCaller`: the façade wiring every other module into the single
//! object a consumer holds, per `spec.md` §6's external-interface list.
//!
//! No teacher equivalent (the teacher exposes free functions
//! `generate_text`/`stream_text` taking a provider per call, with no
//! persistent history/tool/usage state); this module is the integration
//! point the rest of this crate was built to be wired into.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use futures::stream::BoxStream;
use futures_util::StreamExt;

use llmflow_mcp::{McpError, McpServerConfig, McpServiceAdapter};
use llmflow_provider::message::{Role, UniversalMessage};
use llmflow_provider::model::ModelInfo;
use llmflow_provider::params::{GenerationSettings, LibrarySettings, UniversalChatParams};
use llmflow_provider::provider::Provider;
use llmflow_provider::response::{FinishReason, UniversalChatResponse, UniversalStreamResponse};
use llmflow_provider::tool::{ToolCallFuture, ToolDefinition, ToolOrigin};
use serde_json::Value;

use crate::chat::{self, ChatConfig};
use crate::chunk_controller::DEFAULT_MAX_ITERATIONS;
use crate::error::CoreError;
use crate::history::{HistoryManager, HistoryMode};
use crate::otel::OtelService;
use crate::provider_manager::ProviderManager;
use crate::registry::ModelRegistry;
use crate::retry::RetryConfig;
use crate::selector::{select_model, ModelAlias, ModelRequirements};
use crate::splitter::{split_if_needed, SplitRequest, SplittableData};
use crate::stream::{self, ContentRetryPolicy, StreamConfig};
use crate::token::TokenCalculator;
use crate::tool::{run_tool_loop, ToolsManager};
use crate::usage_tracker::{UsageCallback, UsageTracker};

/// `call`'s richer counterpart, per `spec.md` §6's `input = {text?, data?,
/// endingMessage?}` shape: `data` is the oversized payload
/// [`crate::splitter`] may need to cut into several chunks, each sent as
/// its own turn via [`crate::chunk_controller::process_chunks`].
pub struct CallInput {
    pub text: String,
    pub data: Option<SplittableData>,
    pub ending_message: String,
}

impl CallInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), data: None, ending_message: String::new() }
    }
}

/// Construction-time options, per `spec.md` §6's `LLMCaller` constructor
/// `opts` bag.
#[derive(Default)]
pub struct LLMCallerOptions {
    pub caller_id: Option<String>,
    pub usage_callback: Option<UsageCallback>,
    pub settings: LibrarySettings,
    pub history_mode: HistoryMode,
}

/// Maps an MCP-crate error into this crate's own taxonomy, since
/// `llmflow-mcp` deliberately doesn't depend on `CoreError` (see
/// `llmflow-mcp`'s crate doc comment).
fn map_mcp_error(error: McpError) -> CoreError {
    match error {
        McpError::Timeout { timeout, .. } => CoreError::McpTimeout(timeout),
        McpError::Protocol { code, message, .. } => CoreError::Mcp { code, message },
        other => CoreError::Mcp { code: -32000, message: other.to_string() },
    }
}

fn alias_from_str(name: &str) -> Option<ModelAlias> {
    match name {
        "cheap" => Some(ModelAlias::Cheap),
        "fast" => Some(ModelAlias::Fast),
        "premium" => Some(ModelAlias::Premium),
        "balanced" => Some(ModelAlias::Balanced),
        _ => None,
    }
}

/// The orchestration façade: one instance per independent conversation,
/// per `spec.md` §5's "distinct `LLMCaller` instances are independent and
/// may run in parallel" rule. All mutating methods take `&mut self`,
/// matching that same section's single-threaded-per-instance contract.
pub struct LLMCaller {
    providers: ProviderManager,
    registry: ModelRegistry,
    model_name: String,
    history: HistoryManager,
    tools: ToolsManager,
    mcp: Arc<McpServiceAdapter>,
    usage: UsageTracker,
    otel: OtelService,
    token_calculator: TokenCalculator,
    caller_id: Option<String>,
    settings: LibrarySettings,
    max_tool_iterations: u32,
}

impl LLMCaller {
    /// `new(providerName, modelOrAlias, systemMessage?, opts?)`: resolves
    /// `model_or_alias` against `provider.available_models()` (an alias
    /// name is scored with no requirements; anything else must match a
    /// model name exactly).
    pub fn new(
        provider_name: impl Into<String>,
        provider: Arc<dyn Provider>,
        model_or_alias: &str,
        system_message: Option<String>,
        opts: LLMCallerOptions,
    ) -> Result<Self, CoreError> {
        let registry = ModelRegistry::from_models(provider.available_models());
        let model_name = match alias_from_str(model_or_alias) {
            Some(alias) => {
                let models: Vec<ModelInfo> = registry.all().cloned().collect();
                select_model(&models, alias, &ModelRequirements::default())?
            }
            None => registry.get(model_or_alias)?.name.clone(),
        };

        let mut history = HistoryManager::new(opts.history_mode);
        if let Some(system) = system_message {
            history.set_system(system);
        }

        Ok(Self {
            providers: ProviderManager::new(provider_name, provider),
            registry,
            model_name,
            history,
            tools: ToolsManager::new(),
            mcp: Arc::new(McpServiceAdapter::new()),
            usage: UsageTracker::new(opts.usage_callback),
            otel: OtelService::default(),
            token_calculator: TokenCalculator::new(),
            caller_id: opts.caller_id,
            settings: opts.settings,
            max_tool_iterations: 10,
        })
    }

    fn current_model_info(&self) -> Result<&ModelInfo, CoreError> {
        self.registry.get(&self.model_name)
    }

    fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.settings.max_retries.unwrap_or(2))
    }

    fn max_history_len(&self) -> usize {
        self.settings.max_tool_call_steps.unwrap_or(50) as usize * 2 + 50
    }

    fn build_params(&self, extra_messages: Vec<UniversalMessage>, generation: GenerationSettings) -> UniversalChatParams {
        let mut messages = self.history.messages_for_request(&self.token_calculator, self.current_model_info().map(|m| m.max_request_tokens).unwrap_or(u64::MAX), 0, None);
        messages.extend(extra_messages);
        UniversalChatParams::new(messages).with_tools(self.tools.definitions()).with_generation(generation)
    }

    /// `call(message)`: appends `text` as a user message, runs it through
    /// `ChatController`, then through the tool-orchestration loop if the
    /// model requested tool calls, recording the result in history and in
    /// `UsageTracker`.
    pub async fn call(&mut self, text: impl Into<String>) -> Result<UniversalChatResponse, CoreError> {
        self.history.add_text_message(Role::User, text.into());
        let model = self.providers.model(&self.model_name)?;
        let model_info = self.current_model_info()?.clone();
        let conversation_span = self.otel.conversation_span(self.caller_id.as_deref());
        let _guard = conversation_span.enter();

        let params = self.build_params(Vec::new(), GenerationSettings::default());
        let chat_config = ChatConfig { retry: self.retry_config(), should_retry_due_to_content: None };
        let cancel = CancellationToken::new();

        let llm_span = self.otel.llm_call_span(self.providers.current_name(), &self.model_name, &params.messages.last().map(|m| m.content.as_text()).unwrap_or_default());
        let response = chat::execute(model.as_ref(), &model_info, params, &self.history, &chat_config, &cancel).await?;
        self.otel.finish_llm_call_span(&llm_span, &response);
        self.usage.record_call(&response.usage);

        if response.tool_calls.is_empty() {
            self.history.add_message(UniversalMessage::assistant(response.content.as_text()));
            return Ok(response);
        }

        let tools = &self.tools;
        let otel = &self.otel;
        let usage = &self.usage;
        let providers = &self.providers;
        let registry = &self.registry;
        let model_name = self.model_name.clone();
        let calc = &self.token_calculator;
        let chat_config = &chat_config;
        let cancel = &cancel;
        let max_history_len = self.max_history_len();

        run_tool_loop(tools, &mut self.history, max_history_len, self.max_tool_iterations, response, move |history| {
            // Everything this closure needs from `history` is read here,
            // synchronously, before the returned future is built: the
            // future's type is fixed across every call so it can't hold a
            // borrow scoped to one particular invocation (see
            // `orchestrator::run`'s own tests, which never let the future
            // touch `history` either).
            let system = history.system().map(str::to_string);
            let mut messages = {
                let info = registry.get(&model_name).expect("model resolved at call start");
                let mut messages = history.messages_for_request(calc, info.max_request_tokens, 0, None);
                if messages.is_empty() {
                    messages = history.messages().to_vec();
                }
                messages
            };
            if let Some(system) = &system {
                let has_system = messages.iter().any(|m| matches!(m.role, Role::System));
                if !has_system {
                    messages.insert(0, UniversalMessage::system(system.clone()));
                }
            }
            let params = UniversalChatParams::new(messages).with_tools(tools.definitions());
            let model_name = model_name.clone();
            async move {
                let empty_history = HistoryManager::new(HistoryMode::Full);
                let model = providers.model(&model_name)?;
                let info = registry.get(&model_name)?.clone();
                let span = otel.llm_call_span(providers.current_name(), &model_name, "");
                let response = chat::execute(model.as_ref(), &info, params, &empty_history, chat_config, cancel).await?;
                otel.finish_llm_call_span(&span, &response);
                usage.record_call(&response.usage);
                Ok(response)
            }
        })
        .await
    }

    /// `call({text, data, endingMessage})`: when `data` is present and
    /// doesn't fit the model's request budget in one piece, splits it and
    /// runs one [`Self::call`] turn per chunk, per `spec.md` §4.3's "if
    /// the resolved prompt list has more than one entry, delegate to
    /// `ChunkController`" rule. Returns the last chunk's response, since
    /// earlier chunks exist only to build up history for it.
    pub async fn call_with_data(&mut self, input: CallInput) -> Result<UniversalChatResponse, CoreError> {
        let Some(data) = input.data else {
            return self.call(input.text).await;
        };
        let model_info = self.current_model_info()?.clone();
        let chunks = split_if_needed(
            SplitRequest {
                message: &input.text,
                data: &data,
                ending_message: &input.ending_message,
                model_info: &model_info,
                max_response_tokens: model_info.max_response_tokens,
                max_chars_per_chunk: None,
            },
            &self.token_calculator,
        );
        let prompts: Vec<String> = chunks.iter().map(|chunk| format!("{}\n{}\n{}", input.text, chunk.content, input.ending_message)).collect();
        if prompts.len() as u32 > DEFAULT_MAX_ITERATIONS {
            return Err(CoreError::ChunkIterationLimit { limit: DEFAULT_MAX_ITERATIONS });
        }
        let mut responses = Vec::with_capacity(prompts.len());
        for prompt in &prompts {
            responses.push(self.call(prompt.to_string()).await?);
        }
        responses.pop().ok_or_else(|| CoreError::InvalidPrompt { message: "no chunks produced".into() })
    }

    /// `stream(message)`: the streaming counterpart of [`Self::call`].
    /// Tool calls surfaced mid-stream are executed and fed back as a
    /// fresh stream acquisition, per the multi-turn shape
    /// `tool::orchestrator::run` uses for the non-streamed path; the
    /// combined sequence of chunks across every turn is what's returned.
    pub fn stream(&mut self, text: impl Into<String>) -> BoxStream<'_, Result<UniversalStreamResponse, CoreError>> {
        self.history.add_text_message(Role::User, text.into());
        Box::pin(async_stream::try_stream! {
            loop {
                let model = self.providers.model(&self.model_name)?;
                let model: Arc<dyn llmflow_provider::provider::LanguageModel> = Arc::from(model);
                let params = self.build_params(Vec::new(), GenerationSettings::default());
                let config = StreamConfig { retry: self.retry_config(), content_retry: ContentRetryPolicy::default(), max_history_len: self.max_history_len() };
                let cancel = CancellationToken::new();

                let mut inner = stream::create_stream(model, params, &mut self.history, config, cancel);
                let mut final_chunk: Option<UniversalStreamResponse> = None;
                while let Some(item) = inner.next().await {
                    let chunk = item?;
                    if chunk.is_complete {
                        final_chunk = Some(chunk.clone());
                    }
                    self.usage.record_stream_delta(&chunk.usage);
                    yield chunk;
                }
                self.usage.finish_stream();
                drop(inner);

                let Some(final_chunk) = final_chunk else { break };
                if final_chunk.tool_calls.is_empty() {
                    break;
                }
                for call in &final_chunk.tool_calls {
                    let span = self.otel.tool_call_span(&call.name, &call.arguments);
                    let outcome = self.tools.execute(&call.name, call.arguments.clone()).await;
                    let outcome_for_span: Result<Value, String> = outcome.as_ref().map(|v| v.clone()).map_err(|e| e.to_string());
                    self.otel.finish_tool_call_span(&span, &outcome_for_span);
                    let content = match outcome {
                        Ok(value) => value.to_string(),
                        Err(error) => error.to_string(),
                    };
                    self.history.add_message(UniversalMessage::tool_result(call.id.clone().unwrap_or_default(), call.name.clone(), content));
                }
                self.history.trim_to_most_recent(self.max_history_len());
            }
        })
    }

    // -- Tool management -------------------------------------------------

    pub fn add_tool(&mut self, tool: ToolDefinition) {
        self.tools.register(tool);
    }

    pub fn remove_tool(&mut self, name: &str) -> Option<ToolDefinition> {
        self.tools.remove(name)
    }

    pub fn update_tool(&mut self, tool: ToolDefinition) {
        self.tools.register(tool);
    }

    pub fn list_tools(&self) -> Vec<String> {
        self.tools.names()
    }

    pub fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    // -- MCP ---------------------------------------------------------------

    /// Connects to an MCP server and registers every tool it exposes as a
    /// local [`ToolDefinition`], wiring each one's `call_function` back to
    /// `McpServiceAdapter::execute_tool`.
    pub async fn connect_to_mcp_server(&mut self, server_key: &str, config: McpServerConfig) -> Result<(), CoreError> {
        self.mcp.connect_server(server_key, config).await.map_err(map_mcp_error)?;
        let schemas = self.mcp.list_tools(server_key).await.map_err(map_mcp_error)?;
        for schema in schemas {
            let original_name = schema
                .metadata
                .get("originalName")
                .and_then(Value::as_str)
                .unwrap_or(&schema.namespaced_name)
                .to_string();
            let mcp = self.mcp.clone();
            let key = server_key.to_string();
            let call_function: Arc<dyn Fn(Value) -> ToolCallFuture + Send + Sync> = Arc::new(move |arguments: Value| {
                let mcp = mcp.clone();
                let key = key.clone();
                let original_name = original_name.clone();
                Box::pin(async move { mcp.execute_tool(&key, &original_name, arguments, false).await.map_err(|e| e.to_string()) })
            });
            self.tools.register(ToolDefinition {
                name: schema.namespaced_name,
                description: schema.description,
                parameters: schema.parameters,
                call_function,
                origin: Some(ToolOrigin::Mcp { server_key: server_key.to_string(), original_name: schema.metadata.get("originalName").and_then(Value::as_str).unwrap_or_default().to_string() }),
                metadata: Some(schema.metadata),
            });
        }
        Ok(())
    }

    pub async fn call_mcp_tool(&self, server_key: &str, tool_name: &str, arguments: Value) -> Result<Value, CoreError> {
        self.mcp.execute_tool(server_key, tool_name, arguments, false).await.map_err(map_mcp_error)
    }

    pub async fn get_mcp_server_tool_schemas(&self, server_key: &str) -> Result<Vec<String>, CoreError> {
        Ok(self.mcp.list_tools(server_key).await.map_err(map_mcp_error)?.into_iter().map(|t| t.namespaced_name).collect())
    }

    pub async fn disconnect_mcp_servers(&self) {
        self.mcp.disconnect_all().await;
    }

    // -- Model management --------------------------------------------------

    pub fn get_model(&self, name_or_alias: &str, requirements: Option<ModelRequirements>) -> Result<ModelInfo, CoreError> {
        let resolved = match alias_from_str(name_or_alias) {
            Some(alias) => {
                let models: Vec<ModelInfo> = self.registry.all().cloned().collect();
                select_model(&models, alias, &requirements.unwrap_or_default())?
            }
            None => name_or_alias.to_string(),
        };
        self.registry.get(&resolved).cloned()
    }

    pub fn get_available_models(&self) -> Vec<ModelInfo> {
        self.registry.all().cloned().collect()
    }

    pub fn add_model(&mut self, model: ModelInfo) {
        self.registry.insert(model);
    }

    pub fn update_model(&mut self, model: ModelInfo) {
        self.registry.update_model(model);
    }

    /// `setModel({provider?, nameOrAlias, apiKey?})`: an `apiKey` is a
    /// provider-construction concern this façade doesn't re-create here,
    /// so only provider hot-swap and model resolution are handled;
    /// callers needing a new credential register a new provider via
    /// [`ProviderManager::register_provider`] first.
    pub fn set_model(&mut self, provider_name: Option<&str>, name_or_alias: &str) -> Result<(), CoreError> {
        if let Some(name) = provider_name {
            self.providers.switch_provider(name)?;
        }
        self.model_name = match alias_from_str(name_or_alias) {
            Some(alias) => {
                let models: Vec<ModelInfo> = self.registry.all().cloned().collect();
                select_model(&models, alias, &ModelRequirements::default())?
            }
            None => self.registry.get(name_or_alias)?.name.clone(),
        };
        Ok(())
    }

    // -- History -------------------------------------------------------------

    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.history.add_text_message(role, content);
    }

    pub fn get_messages(&self) -> &[UniversalMessage] {
        self.history.messages()
    }

    pub fn get_historical_messages(&self) -> Vec<UniversalMessage> {
        self.history.serialize_history()
    }

    pub fn clear_history(&mut self) {
        self.history.deserialize_history(Vec::new());
    }

    pub fn set_historical_messages(&mut self, messages: Vec<UniversalMessage>) {
        self.history.deserialize_history(messages);
    }

    pub fn serialize_history(&self) -> Vec<UniversalMessage> {
        self.history.serialize_history()
    }

    pub fn deserialize_history(&mut self, messages: Vec<UniversalMessage>) {
        self.history.deserialize_history(messages);
    }

    pub fn set_caller_id(&mut self, caller_id: impl Into<String>) {
        self.caller_id = Some(caller_id.into());
    }

    pub fn set_usage_callback(&mut self, callback: UsageCallback) {
        self.usage = UsageTracker::new(Some(callback));
    }

    pub fn update_settings(&mut self, settings: LibrarySettings) {
        self.settings = settings;
    }
}
