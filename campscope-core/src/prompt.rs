//! Prompt templates for the campaign-change analysis call
//!
//! The model must answer with a JSON object carrying exactly two fields:
//! `summary` (factual restatement of the net changes) and `key_insights`
//! (strategic observations). The response parser in [`crate::llm`] depends
//! on that contract.

/// System prompt: role, analysis framework, and the strict output contract.
pub fn system_prompt() -> &'static str {
    r#"You are an expert campaign analyst specializing in digital advertising campaign management. Your task is to analyze changes made to advertising campaigns and provide clear insights about the modifications.

OUTPUT FORMAT:
You must respond with a valid JSON object containing exactly these fields:
{
  "summary": "A factual, human-readable summary of the net changes. List the fields that were changed and their final state, based only on the 'Overall Net Changes Summary' provided. Do not add interpretation or reasoning. For example, if a budget changed from $100 to $200, state 'The budget was changed from $100 to $200.' Put a line break between changes.",
  "key_insights": ["List of 0-5 strategic insights about the changes, their likely impact, and the business implications."]
}

GUIDELINES:
1. Summary: restate the net changes as plain facts, covering scope and timeframe. No analysis.
2. Key insights: strategic observations only - optimization patterns, performance implications, direction shifts, or anything else relevant to the business.

Respond ONLY with a valid JSON object containing only the summary and key_insights fields - no additional keys, no explanations."#
}

/// User prompt: the campaign, its net-change summary, and the chronological
/// change history.
pub fn user_prompt(changes_text: &str, campaign_id: i64, net_changes_text: &str) -> String {
    format!(
        r#"Campaign ID: {campaign_id}

Overall Net Changes Summary:
{net_changes_text}

Detailed Chronological Change History:
{changes_text}

Your main task is the 'summary' field: a direct, human-readable statement of the facts from the 'Overall Net Changes Summary', in full sentences, with no interpretation - that belongs in 'key_insights'.

Respond ONLY with a valid JSON object containing only: summary and key_insights."#
    )
}
