// Portfolio analysis tool

use super::registry::{ParamKind, ParamSpec, ToolDescriptor};
use finpilot_core::routes::PORTFOLIO_ANALYZE;

pub const ANALYZE_PORTFOLIO: &str = "analyze_portfolio";

/// Analyze holdings from a CAS statement or from portfolio data supplied directly.
/// Neither input is required by the schema; the gateway decides what is enough.
pub fn analyze_portfolio() -> ToolDescriptor {
    ToolDescriptor {
        name: ANALYZE_PORTFOLIO,
        description: "Analyze an investment portfolio from a CAS statement or direct data. \
            Returns the holdings breakdown (mutual funds, stocks), asset allocation, returns \
            and XIRR, rebalancing recommendations and tax optimization opportunities.",
        params: vec![
            ParamSpec::optional(
                "cas_pdf_base64",
                ParamKind::String,
                "Base64 encoded CAS PDF (NSDL/CDSL consolidated statement)",
            ),
            ParamSpec::optional(
                "portfolio_data",
                ParamKind::Object,
                "Direct portfolio data, as an alternative to the PDF",
            ),
        ],
        route: PORTFOLIO_ANALYZE,
    }
}
