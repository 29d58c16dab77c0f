// Financial planning tool

use super::registry::{ParamKind, ParamSpec, ToolDescriptor};
use finpilot_core::routes::FINANCIAL_PLAN;

pub const CREATE_FINANCIAL_PLAN: &str = "create_financial_plan";

pub fn create_financial_plan() -> ToolDescriptor {
    ToolDescriptor {
        name: CREATE_FINANCIAL_PLAN,
        description: "Create a comprehensive financial plan from goals and the current \
            situation: goal-wise allocation, investment recommendations, insurance \
            requirements, tax strategies and monthly action items.",
        params: vec![
            ParamSpec::required(
                "goals",
                ParamKind::ObjectArray,
                "Financial goals, each {name, target_amount, target_date, priority}",
            ),
            ParamSpec::required(
                "current_situation",
                ParamKind::Object,
                "Current status {income, expenses, assets, liabilities, risk_profile}",
            ),
            ParamSpec::optional("user_id", ParamKind::String, "User ID"),
        ],
        route: FINANCIAL_PLAN,
    }
}
