// Backend routes exposed by the FinPilot API Gateway

use serde::{Deserialize, Serialize};

/// HTTP method used for a gateway route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which configured timeout bounds a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutClass {
    /// Regular JSON calls
    Standard,
    /// Calls carrying base64 document uploads
    Upload,
}

/// A fixed backend endpoint a tool forwards to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Route {
    pub method: HttpMethod,
    pub path: &'static str,
    pub timeout: TimeoutClass,
}

impl Route {
    pub const fn get(path: &'static str) -> Self {
        Self {
            method: HttpMethod::Get,
            path,
            timeout: TimeoutClass::Standard,
        }
    }

    pub const fn post(path: &'static str) -> Self {
        Self {
            method: HttpMethod::Post,
            path,
            timeout: TimeoutClass::Standard,
        }
    }

    /// Bound this route by the upload timeout instead of the standard one
    pub const fn upload(mut self) -> Self {
        self.timeout = TimeoutClass::Upload;
        self
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

pub const CREDIT_ANALYZE: Route = Route::post("/v1/credit/analyze").upload();
pub const CREDIT_HEALTH: Route = Route::get("/v1/credit/health");
pub const PORTFOLIO_ANALYZE: Route = Route::post("/v1/portfolio/analyze").upload();
pub const LOAN_OPTIMIZE: Route = Route::post("/v1/loans/optimize");
pub const FINANCIAL_PLAN: Route = Route::post("/v1/plan/create");
