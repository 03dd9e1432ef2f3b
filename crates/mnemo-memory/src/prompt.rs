// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt and schema construction for the extraction model.
//!
//! Existing memories are decrypted and embedded in the user prompt so
//! the model extracts only facts it has not seen before. Dedup still
//! happens in storage; the prompt context just cuts wasted calls.

use mnemo_core::types::{ChatMessage, DecryptedMemory};

/// System prompt for the extraction role.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are a memory extraction system. Analyze this conversation and extract important information to remember about the user.

WHAT TO EXTRACT:
1. **Personal Information**: Name, location, occupation, family, age, background
2. **Preferences**: Likes, dislikes, communication style, how they want to be addressed
3. **Important Context**: Ongoing projects, goals, constraints, responsibilities
4. **Facts**: Skills, experiences, knowledge areas, technical expertise
5. **Instructions**: Specific guidelines the user wants you to follow (e.g., "always use TypeScript", "keep responses brief")

RULES:
- Be concise (1-2 sentences per memory)
- Only extract FACTUAL information explicitly stated by the user
- Ignore small talk and pleasantries
- Avoid redundant or obvious information
- Each memory should be atomic (one piece of information)
- Categorize each memory correctly
- Add relevant tags for searchability
- **CRITICAL**: DO NOT extract information that is already captured in EXISTING MEMORIES (provided below)
- Only extract NEW information not present in existing memories
- If conversation contains no new memorable information, return empty array

CATEGORIES:
- "personal_info": Name, location, occupation, family, age
- "preferences": Likes, dislikes, style, communication preferences
- "context": Ongoing projects, goals, responsibilities
- "fact": Skills, knowledge, experiences
- "instruction": Guidelines to follow

Return JSON with array of memories."#;

/// Name registered with the provider for the extraction schema.
pub const EXTRACTION_SCHEMA_NAME: &str = "memory_extraction";

/// Strict JSON schema for the structured extraction response.
pub fn extraction_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "memories": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "content": {
                            "type": "string",
                            "description": "The memory content (concise, factual)"
                        },
                        "category": {
                            "type": "string",
                            "enum": ["personal_info", "preferences", "context", "fact", "instruction"],
                            "description": "Memory category"
                        },
                        "tags": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Relevant tags for this memory"
                        }
                    },
                    "required": ["content", "category", "tags"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["memories"],
        "additionalProperties": false
    })
}

/// Render the conversation as a transcript, skipping system messages.
pub fn build_transcript(messages: &[ChatMessage]) -> String {
    let mut transcript = String::new();
    for msg in messages {
        match msg.role.as_str() {
            "user" => {
                transcript.push_str(&format!("USER: {}\n\n", msg.content));
            }
            "assistant" => {
                transcript.push_str(&format!("ASSISTANT: {}\n\n", msg.content));
            }
            _ => {}
        }
    }
    transcript
}

/// Render existing memories as numbered context lines.
pub fn build_existing_context(memories: &[DecryptedMemory]) -> String {
    if memories.is_empty() {
        return "(No existing memories - this is the first extraction)".to_string();
    }

    let mut context = format!("({} existing memories):\n\n", memories.len());
    for (i, mem) in memories.iter().enumerate() {
        let tags = if mem.memory.tags.is_empty() {
            String::new()
        } else {
            format!(" (tags: {})", mem.memory.tags.join(", "))
        };
        context.push_str(&format!(
            "{}. [{}] {}{}\n",
            i + 1,
            mem.memory.category.as_str(),
            mem.content,
            tags
        ));
    }
    context
}

/// Assemble the full user prompt for one extraction attempt.
pub fn build_user_prompt(existing_context: &str, transcript: &str) -> String {
    format!(
        "EXISTING MEMORIES:\n{existing_context}\n\nCONVERSATION:\n{transcript}\n\n\
         Analyze this conversation and extract ONLY NEW memories that are NOT already \
         captured in the existing memories above. Return JSON with array of memories. \
         If no new information, return empty array."
    )
}
