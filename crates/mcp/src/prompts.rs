// Prompt templates served over `prompts/list` and `prompts/get`

use crate::protocol::{
    GetPromptParams, GetPromptResult, JsonRpcError, ListPromptsResult, PromptArgument,
    PromptMessage, PromptSchema, ToolContent,
};

pub const FINANCIAL_ADVISOR_PROMPT: &str = "financial_advisor_prompt";

pub fn list_prompts() -> ListPromptsResult {
    ListPromptsResult {
        prompts: vec![PromptSchema {
            name: FINANCIAL_ADVISOR_PROMPT.to_string(),
            description: "Frame a user's question for a certified financial advisor".to_string(),
            arguments: vec![PromptArgument {
                name: "user_query".to_string(),
                description: "The user's financial question or concern".to_string(),
                required: true,
            }],
        }],
    }
}

pub fn get_prompt(params: &GetPromptParams) -> Result<GetPromptResult, JsonRpcError> {
    if params.name != FINANCIAL_ADVISOR_PROMPT {
        return Err(JsonRpcError::invalid_params(format!(
            "Unknown prompt: {}",
            params.name
        )));
    }

    let user_query = params
        .arguments
        .get("user_query")
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| JsonRpcError::invalid_params("Missing required argument 'user_query'"))?;

    Ok(GetPromptResult {
        description: "Financial advisor prompt".to_string(),
        messages: vec![PromptMessage {
            role: "user".to_string(),
            content: ToolContent::text(financial_advisor(user_query)),
        }],
    })
}

fn financial_advisor(user_query: &str) -> String {
    format!(
        "You are a certified financial advisor helping a user with: {user_query}

Provide:
1. Clear analysis of their situation
2. Actionable recommendations
3. Potential risks and considerations
4. Next steps

Use FinPilot tools to:
- Analyze credit reports for debt optimization
- Review the portfolio for investment recommendations
- Evaluate loan consolidation opportunities
- Create comprehensive financial plans

Be professional and empathetic, and put the user's financial wellbeing first.
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn params(name: &str, args: &[(&str, &str)]) -> GetPromptParams {
        GetPromptParams {
            name: name.to_string(),
            arguments: args
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_renders_user_query() {
        let result = get_prompt(&params(
            FINANCIAL_ADVISOR_PROMPT,
            &[("user_query", "Should I prepay my home loan?")],
        ))
        .unwrap();

        let ToolContent::Text { text } = &result.messages[0].content;
        assert!(text.contains("helping a user with: Should I prepay my home loan?"));
        assert_eq!(result.messages[0].role, "user");
    }

    #[test]
    fn test_missing_query_is_invalid_params() {
        let err = get_prompt(&params(FINANCIAL_ADVISOR_PROMPT, &[])).unwrap_err();
        assert_eq!(err.code, crate::protocol::INVALID_PARAMS);
    }

    #[test]
    fn test_unknown_prompt() {
        let err = get_prompt(&params("tax_prompt", &[("user_query", "x")])).unwrap_err();
        assert!(err.message.contains("tax_prompt"));
    }

    #[test]
    fn test_listed() {
        let list = list_prompts();
        assert_eq!(list.prompts.len(), 1);
        assert!(list.prompts[0].arguments[0].required);
    }
}
