/// Basic streaming example consuming the raw provider stream directly.
///
/// This talks straight to `LanguageModel::stream_call` rather than through
/// any history/tool-orchestration layer, so it only prints text deltas and
/// the final usage chunk.
///
/// Run with:
/// ```bash
/// export OPENAI_API_KEY="your-api-key"
/// cargo run --example basic_stream -p llmflow-demos
/// ```
use futures_util::StreamExt;
use llmflow_openai_compatible::OpenAICompatibleClient;
use llmflow_provider::message::UniversalMessage;
use llmflow_provider::model::{Capabilities, Characteristics, ModelInfo};
use llmflow_provider::params::UniversalChatParams;
use llmflow_provider::provider::Provider;
use llmflow_provider::stream_part::ProviderStreamChunk;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("llmflow basic streaming example\n");

    let api_key = env::var("OPENAI_API_KEY").map_err(|_| "OPENAI_API_KEY environment variable not set")?;

    let provider = OpenAICompatibleClient::new()
        .base_url("https://api.openai.com/v1")
        .name("openai")
        .api_key(api_key)
        .include_usage(true)
        .model(ModelInfo {
            name: "gpt-4o-mini".into(),
            input_price_per_million: 0.15,
            input_cached_price_per_million: None,
            output_price_per_million: 0.6,
            max_request_tokens: 128_000,
            max_response_tokens: 16_384,
            tokenization_model: None,
            capabilities: Capabilities { streaming: true, ..Default::default() },
            characteristics: Characteristics { quality_index: 70, output_speed: 120.0, first_token_latency: 500.0 },
        })
        .build();

    let model = provider.model("gpt-4o-mini")?;
    let params = UniversalChatParams::new(vec![UniversalMessage::user("write a four line poem about rust programming")]);

    let mut stream = model.stream_call(params).await?;
    while let Some(chunk) = stream.next().await {
        match chunk? {
            ProviderStreamChunk::TextDelta { text } => {
                print!("{text}");
                std::io::Write::flush(&mut std::io::stdout())?;
            }
            ProviderStreamChunk::Usage { usage } => {
                println!("\n\ninput tokens: {}", usage.tokens.input.total);
                println!("output tokens: {}", usage.tokens.output.total);
            }
            ProviderStreamChunk::Finish { finish_reason } => {
                println!("finish reason: {finish_reason:?}");
            }
            _ => {}
        }
    }

    Ok(())
}
