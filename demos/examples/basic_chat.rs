/// Basic chat example demonstrating a single non-streamed call through an
/// OpenAI-compatible provider.
///
/// Run with:
/// ```bash
/// export OPENAI_API_KEY="your-api-key"
/// cargo run --example basic_chat -p llmflow-demos
/// ```
use llmflow_openai_compatible::OpenAICompatibleClient;
use llmflow_provider::message::UniversalMessage;
use llmflow_provider::model::{Capabilities, Characteristics, ModelInfo};
use llmflow_provider::params::UniversalChatParams;
use llmflow_provider::provider::Provider;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("llmflow basic chat example\n");

    let api_key = env::var("OPENAI_API_KEY").map_err(|_| "OPENAI_API_KEY environment variable not set")?;

    let provider = OpenAICompatibleClient::new()
        .base_url("https://api.openai.com/v1")
        .name("openai")
        .api_key(api_key)
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

    println!("provider: {}", provider.name());

    let model = provider.model("gpt-4o-mini")?;
    let params = UniversalChatParams::new(vec![
        UniversalMessage::system("be concise"),
        UniversalMessage::user("write a four line poem about rust programming"),
    ]);

    let response = model.chat_call(params).await?;
    println!("\n{}\n", response.content.as_text());
    println!("finish reason: {:?}", response.finish_reason);
    println!("input tokens: {}", response.usage.tokens.input.total);
    println!("output tokens: {}", response.usage.tokens.output.total);

    Ok(())
}
