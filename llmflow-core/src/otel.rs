//! `OtelService`: conversation/LLM-call/tool-call spans plus `gen_ai.*`
//! token-usage metrics, per `spec.md` §4.12.
//!
//! No teacher equivalent (the teacher has no tracing layer at all). Built
//! on `tracing`, already a dependency of this crate, rather than the raw
//! `opentelemetry` SDK: `lightseekorg-smg/Cargo.toml` pairs
//! `opentelemetry-otlp`/`opentelemetry_sdk` with `tracing-opentelemetry`
//! rather than calling the SDK's span/meter API directly, and
//! `tracing-opentelemetry`'s `MetricsLayer` turns `monotonic_counter.*`/
//! `histogram.*`-prefixed event fields into OTel instruments automatically,
//! so recording metrics is just emitting a `tracing` event with the right
//! field names — no manual `Meter` plumbing needed here. The `otlp`
//! feature only has to wire the exporter; per-call code is feature-free.

use serde_json::Value;

use llmflow_provider::response::UniversalChatResponse;
use llmflow_provider::usage::Usage;

/// What to redact before a prompt/response/tool argument reaches a span
/// field, per `spec.md` §4.12.
#[derive(Debug, Clone, Default)]
pub struct RedactionPolicy {
    pub redact_prompts: bool,
    pub redact_responses: bool,
    pub redact_tool_args: bool,
    pub pii_detection: bool,
    pub max_content_length: Option<usize>,
}

const REDACTED: &str = "[redacted]";

impl RedactionPolicy {
    fn apply(&self, text: &str, redact: bool) -> String {
        if redact {
            return REDACTED.to_string();
        }
        let text = if self.pii_detection { redact_pii(text) } else { text.to_string() };
        match self.max_content_length {
            Some(limit) if text.chars().count() > limit => text.chars().take(limit).collect::<String>() + "...",
            _ => text,
        }
    }

    fn prompt(&self, text: &str) -> String {
        self.apply(text, self.redact_prompts)
    }

    fn response(&self, text: &str) -> String {
        self.apply(text, self.redact_responses)
    }

    fn tool_args(&self, text: &str) -> String {
        self.apply(text, self.redact_tool_args)
    }
}

/// Coarse heuristic scrub for emails and long digit runs. Not a real PII
/// detector; good enough as the default behind an opt-in flag this crate
/// controls entirely on its own.
fn redact_pii(text: &str) -> String {
    static EMAIL: std::sync::LazyLock<regex::Regex> =
        std::sync::LazyLock::new(|| regex::Regex::new(r"[\w.+-]+@[\w-]+\.[\w.-]+").expect("email regex is valid"));
    static DIGITS: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| regex::Regex::new(r"\d{7,}").expect("digit run regex is valid"));
    let text = EMAIL.replace_all(text, "[email]");
    DIGITS.replace_all(&text, "[redacted-number]").into_owned()
}

/// Creates conversation/LLM-call/tool-call spans and records `gen_ai.*`
/// token-usage metrics, applying `redaction` to any prompt/response/tool
/// argument text before it's attached to a span.
#[derive(Debug, Clone, Default)]
pub struct OtelService {
    redaction: RedactionPolicy,
}

impl OtelService {
    pub fn new(redaction: RedactionPolicy) -> Self {
        Self { redaction }
    }

    /// Starts the top-level span for one caller `call`/`stream`
    /// invocation. Entering the returned span (`let _guard = span.enter()`)
    /// makes every span opened inside it a child, which is how a caller
    /// embeds these spans into its own trace rather than this service
    /// taking an explicit parent-context parameter.
    pub fn conversation_span(&self, caller_id: Option<&str>) -> tracing::Span {
        tracing::info_span!("gen_ai.conversation", "gen_ai.conversation.id" = caller_id.unwrap_or_default())
    }

    /// Starts one span per provider request, attaching
    /// `gen_ai.request.*` attributes up front.
    pub fn llm_call_span(&self, provider_name: &str, model_name: &str, prompt_text: &str) -> tracing::Span {
        let span = tracing::info_span!(
            "gen_ai.chat",
            "gen_ai.system" = provider_name,
            "gen_ai.request.model" = model_name,
            "gen_ai.response.finish_reason" = tracing::field::Empty,
        );
        span.in_scope(|| tracing::debug!(target: "gen_ai", prompt = %self.redaction.prompt(prompt_text), "llm call started"));
        span
    }

    /// Attaches `gen_ai.response.*`/`gen_ai.usage.*` to `span` and records
    /// the token-usage metrics, once the call returns.
    pub fn finish_llm_call_span(&self, span: &tracing::Span, response: &UniversalChatResponse) {
        span.record("gen_ai.response.finish_reason", tracing::field::debug(response.finish_reason));
        span.in_scope(|| {
            tracing::debug!(target: "gen_ai", response = %self.redaction.response(&response.content.as_text()), "llm call finished");
            self.record_usage_metrics(&response.usage, "chat");
        });
    }

    /// Starts a span for one tool execution, redacting its arguments.
    pub fn tool_call_span(&self, tool_name: &str, arguments: &Value) -> tracing::Span {
        let span = tracing::info_span!("gen_ai.tool.execute", "gen_ai.tool.name" = tool_name);
        span.in_scope(|| tracing::debug!(target: "gen_ai", arguments = %self.redaction.tool_args(&arguments.to_string()), "tool call started"));
        span
    }

    pub fn finish_tool_call_span(&self, span: &tracing::Span, outcome: &Result<Value, String>) {
        span.in_scope(|| {
            if let Err(message) = outcome {
                tracing::warn!(target: "gen_ai", error = %message, "tool call failed");
            }
        });
    }

    fn record_usage_metrics(&self, usage: &Usage, operation: &'static str) {
        tracing::info!(
            target: "gen_ai",
            {
                monotonic_counter.gen_ai_client_token_usage_input = usage.tokens.input.total,
                monotonic_counter.gen_ai_client_token_usage_output = usage.tokens.output.total,
                histogram.gen_ai_client_token_usage_cost = usage.costs.total,
                operation,
            },
            "token usage recorded",
        );
    }
}

/// OTLP exporter bootstrap, active only under the `otlp` feature. Builds a
/// `tracing_subscriber` layer pair (spans + `monotonic_counter.*`/
/// `histogram.*` metrics) that forwards to an OTLP collector at
/// `endpoint`; install it with `tracing::subscriber::set_global_default`
/// or compose it into an existing `tracing_subscriber::registry()`.
#[cfg(feature = "otlp")]
pub mod otlp {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use opentelemetry_sdk::trace::SdkTracerProvider;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    /// Builds the combined trace+metrics layer. Call once at startup.
    pub fn layer(endpoint: &str) -> Result<impl tracing::Subscriber + Send + Sync, opentelemetry_otlp::ExporterBuildError> {
        let span_exporter = opentelemetry_otlp::SpanExporter::builder().with_tonic().with_endpoint(endpoint).build()?;
        let tracer_provider = SdkTracerProvider::builder().with_batch_exporter(span_exporter).build();
        let tracer = tracer_provider.tracer("llmflow-core");
        opentelemetry::global::set_tracer_provider(tracer_provider);

        let metric_exporter = opentelemetry_otlp::MetricExporter::builder().with_tonic().with_endpoint(endpoint).build()?;
        let meter_provider = SdkMeterProvider::builder().with_periodic_exporter(metric_exporter).build();
        opentelemetry::global::set_meter_provider(meter_provider.clone());

        Ok(Registry::default()
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .with(tracing_opentelemetry::MetricsLayer::new(meter_provider)))
    }
}
