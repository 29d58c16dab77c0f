// Credit tools: report analysis and credit health

use super::registry::{ParamKind, ParamSpec, ToolDescriptor};
use finpilot_core::routes::{CREDIT_ANALYZE, CREDIT_HEALTH};

pub const ANALYZE_CREDIT_REPORT: &str = "analyze_credit_report";
pub const GET_CREDIT_HEALTH: &str = "get_credit_health";

/// Analyze a CIBIL, Experian or Equifax credit report PDF
pub fn analyze_credit_report() -> ToolDescriptor {
    ToolDescriptor {
        name: ANALYZE_CREDIT_REPORT,
        description: "Analyze a credit report from CIBIL, Experian, or Equifax. Returns the \
            credit score and its factors, a loan summary with optimization opportunities, \
            payment history and DPD analysis, and high-rate loan swap recommendations.",
        params: vec![
            ParamSpec::required(
                "pdf_base64",
                ParamKind::String,
                "Base64 encoded PDF content of the credit report",
            ),
            ParamSpec::optional(
                "bureau",
                ParamKind::String,
                "Credit bureau name (cibil, experian, equifax); auto-detected if omitted",
            ),
        ],
        route: CREDIT_ANALYZE,
    }
}

pub fn get_credit_health() -> ToolDescriptor {
    ToolDescriptor {
        name: GET_CREDIT_HEALTH,
        description: "Get the current credit health summary: credit score and trend, total \
            debt and EMI burden, credit utilization, recent changes and alerts.",
        params: vec![ParamSpec::optional(
            "user_id",
            ParamKind::String,
            "User ID; the authenticated user when omitted",
        )
        .omit_when_absent()],
        route: CREDIT_HEALTH,
    }
}
