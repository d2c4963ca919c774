// Cross-cutting prompt fragments. Feature prompts live next to the code that sends them.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to free-form analysis prompts so reports render cleanly.
pub const MARKDOWN_INSTRUCTION: &str = "\
    Format your response as clear, structured markdown with short headed sections. \
    Base every statement on the provided documents; if something is not stated, say so \
    rather than guessing.";
