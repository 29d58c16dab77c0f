// Loan optimization tool

use super::registry::{ParamKind, ParamSpec, ToolDescriptor};
use finpilot_core::routes::LOAN_OPTIMIZE;

pub const OPTIMIZE_LOANS: &str = "optimize_loans";

pub fn optimize_loans() -> ToolDescriptor {
    ToolDescriptor {
        name: OPTIMIZE_LOANS,
        description: "Get loan optimization recommendations: LAMF swap opportunities, \
            refinancing options, prepayment analysis and potential annual savings.",
        params: vec![
            ParamSpec::optional(
                "loans",
                ParamKind::ObjectArray,
                "Loans with details (outstanding, apr, emi, tenure)",
            ),
            ParamSpec::optional(
                "user_id",
                ParamKind::String,
                "User ID; the authenticated user's loans when omitted",
            ),
        ],
        route: LOAN_OPTIMIZE,
    }
}
