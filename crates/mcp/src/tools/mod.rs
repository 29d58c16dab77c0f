pub mod credit;
pub mod loans;
pub mod planning;
pub mod portfolio;
mod registry;

pub use registry::{
    json_schema_array, json_schema_object, json_schema_object_any, json_schema_string, ParamKind,
    ParamSpec, ToolDescriptor, ToolRegistry,
};

/// Every tool exposed by the shim, grouped by capability area
pub fn finpilot_tools() -> Vec<ToolDescriptor> {
    vec![
        credit::analyze_credit_report(),
        credit::get_credit_health(),
        portfolio::analyze_portfolio(),
        loans::optimize_loans(),
        planning::create_financial_plan(),
    ]
}
