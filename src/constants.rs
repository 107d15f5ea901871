// Message constants
pub const CHAT_COMPLETION_OBJECT: &str = "chat.completion";
pub const CHAT_COMPLETION_CHUNK_OBJECT: &str = "chat.completion.chunk";
pub const ASSISTANT_ROLE: &str = "assistant";
pub const SSE_DONE_MESSAGE: &str = "[DONE]";
pub const STOP_REASON: &str = "stop";

// Mocked completion content. Downstream fixture tests compare against these verbatim.
pub const MOCK_COMPLETION_ID: &str = "chatcmpl-123";
pub const MOCK_MODEL: &str = "gpt-4";
pub const MOCK_STREAM_MESSAGE: &str = "Hello! This is a streaming response from the mock server. \
It simulates how OpenAI's API sends data in chunks. \
Each word is sent as a separate event.";
pub const MOCK_COMPLETE_MESSAGE: &str = "Hello! This is a complete response from the mock server.";
pub const MOCK_PROMPT_TOKENS: u32 = 10;
pub const MOCK_COMPLETION_TOKENS: u32 = 12;

// Route
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

// Chat server defaults
pub const DEFAULT_CHAT_HOST: &str = "0.0.0.0";
pub const DEFAULT_CHAT_PORT: u16 = 10086;
pub const DEFAULT_CHUNK_DELAY_MS: u64 = 100;

// Echo server defaults
pub const DEFAULT_ECHO_HOST: &str = "0.0.0.0";
pub const DEFAULT_ECHO_PORT: u16 = 8890;
pub const PING_INTERVAL_SECS: u64 = 20;
pub const PING_TIMEOUT_SECS: u64 = 20;
pub const RECEIVE_TIMEOUT_SECS: u64 = 60;
pub const CLOSE_TIMEOUT_SECS: u64 = 10;
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;
pub const MAX_INBOUND_QUEUE: usize = 32;
