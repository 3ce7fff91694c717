// Shared prompt fragments. Each service that needs LLM calls defines its own
// prompts.rs alongside it; only cross-cutting pieces live here.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps extraction grounded in the supplied document.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Only report facts that are explicitly present in the provided text. \
    Do NOT infer skills from job titles or company names. \
    If the text does not support a value, omit it.";
