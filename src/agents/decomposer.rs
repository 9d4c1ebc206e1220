// src/agents/decomposer.rs

use super::llm::{ChatMessage, LlmClient, LlmError};
use super::Decomposer;
use crate::protocol::{Plan, Step, StepKind};
use serde::Deserialize;
use serde_json::json;

/// Asks the reasoning service to break a query into atomic numbered steps,
/// requesting a structured JSON object.
pub struct LlmDecomposer {
    client: LlmClient,
}

impl LlmDecomposer {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

impl Decomposer for LlmDecomposer {
    fn decompose(&self, query: &str) -> Result<Plan, LlmError> {
        let messages = [
            ChatMessage::system(
                "You are an expert problem solver. Given a complex query, break it \
                 down into atomic, numbered steps. For each step, indicate its \
                 'type' (calculation, data_lookup, final_synthesis) and a \
                 'description'. Output ONLY a JSON object with the key 'plan'. \
                 Each step must have 'step_num', 'type', and 'description' fields.",
            ),
            ChatMessage::user(format!("Problem: {}\n\nOutput plan as JSON:", query)),
        ];

        let content = self
            .client
            .chat(&messages, Some(json!({ "type": "json_object" })))?;
        parse_plan(&content)
    }
}

#[derive(Deserialize)]
struct PlanPayload {
    plan: Vec<RawStep>,
}

#[derive(Deserialize)]
struct RawStep {
    step_num: Option<u32>,
    #[serde(rename = "type")]
    kind: Option<String>,
    description: Option<String>,
}

/// Validate the decomposition payload. Missing `step_num` falls back to the
/// 1-based position, missing `type` to `calculation`; a step without a
/// description is an error.
fn parse_plan(content: &str) -> Result<Plan, LlmError> {
    let payload: PlanPayload = serde_json::from_str(content)
        .map_err(|err| LlmError::Malformed(format!("plan payload: {}", err)))?;

    let steps = payload
        .plan
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let description = raw
                .description
                .ok_or_else(|| LlmError::Malformed(format!("step {} missing description", i + 1)))?;
            Ok(Step {
                step_num: raw.step_num.unwrap_or(i as u32 + 1),
                kind: raw
                    .kind
                    .map(|k| StepKind::parse(&k))
                    .unwrap_or(StepKind::Calculation),
                description,
            })
        })
        .collect::<Result<Vec<_>, LlmError>>()?;

    Ok(Plan { steps })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_complete_plan() {
        let plan = parse_plan(
            r#"{"plan": [
                {"step_num": 1, "type": "calculation", "description": "Compute 2 + 3 * 4"},
                {"step_num": 2, "type": "final_synthesis", "description": "State the answer"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].kind, StepKind::Calculation);
        assert_eq!(plan.steps[1].kind, StepKind::FinalSynthesis);
    }

    #[test]
    fn defaults_missing_step_num_and_type() {
        let plan = parse_plan(r#"{"plan": [{"description": "Add the apples"}]}"#).unwrap();
        assert_eq!(plan.steps[0].step_num, 1);
        assert_eq!(plan.steps[0].kind, StepKind::Calculation);
    }

    #[test]
    fn missing_plan_key_is_malformed() {
        assert!(matches!(
            parse_plan(r#"{"steps": []}"#),
            Err(LlmError::Malformed(_))
        ));
    }

    #[test]
    fn missing_description_is_malformed() {
        assert!(matches!(
            parse_plan(r#"{"plan": [{"step_num": 1, "type": "calculation"}]}"#),
            Err(LlmError::Malformed(_))
        ));
    }

    #[test]
    fn unknown_kind_is_carried_not_rejected() {
        let plan =
            parse_plan(r#"{"plan": [{"type": "web_search", "description": "Look it up"}]}"#)
                .unwrap();
        assert_eq!(plan.steps[0].kind, StepKind::Unknown("web_search".into()));
    }
}
