use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Which backend profile a session is authenticated against.
///
/// The two profiles expose the same logical operations under different
/// paths; see [`SessionKind::path`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SessionKind {
    /// Staff accounts.
    #[default]
    Staff,
    /// Employee accounts.
    Employee,
}

/// Logical backend operation, resolved to a concrete path per profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Endpoint {
    Login,
    VerifyOtp,
    Register,
    Logout,
    /// Renews the session from a still-valid refresh cookie.
    Refresh,
    /// Authenticated check used to restore a session on startup.
    SessionCheck,
    Profile,
    UpdateProfile,
    ForgotPassword,
    ResetPassword,
    ChangePassword,
    Enable2fa,
    Disable2fa,
    RequestOtp,
}

/// Fixed path table for one backend profile.
#[derive(Debug)]
pub struct EndpointTable {
    pub login: &'static str,
    pub verify_otp: &'static str,
    pub register: &'static str,
    pub logout: &'static str,
    pub refresh: &'static str,
    pub session_check: &'static str,
    pub profile: &'static str,
    pub update_profile: &'static str,
    pub forgot_password: &'static str,
    pub reset_password: &'static str,
    pub change_password: &'static str,
    pub enable_2fa: &'static str,
    pub disable_2fa: &'static str,
    pub request_otp: &'static str,
}

static STAFF: EndpointTable = EndpointTable {
    login: "/api/staff/login/",
    verify_otp: "/api/staff/verify-otp/",
    register: "/api/staff/register/",
    logout: "/api/staff/logout/",
    refresh: "/api/staff/token/refresh/",
    session_check: "/api/staff/session/",
    profile: "/api/staff/profile/",
    update_profile: "/api/staff/profile/update/",
    forgot_password: "/api/staff/password/forgot/",
    reset_password: "/api/staff/password/reset/",
    change_password: "/api/staff/password/change/",
    enable_2fa: "/api/staff/2fa/enable/",
    disable_2fa: "/api/staff/2fa/disable/",
    request_otp: "/api/staff/2fa/request-otp/",
};

static EMPLOYEE: EndpointTable = EndpointTable {
    login: "/api/employee/login/",
    verify_otp: "/api/employee/verify-otp/",
    register: "/api/employee/register/",
    logout: "/api/employee/logout/",
    refresh: "/api/employee/token/refresh/",
    session_check: "/api/employee/session/",
    profile: "/api/employee/profile/",
    update_profile: "/api/employee/profile/update/",
    forgot_password: "/api/employee/password/forgot/",
    reset_password: "/api/employee/password/reset/",
    change_password: "/api/employee/password/change/",
    enable_2fa: "/api/employee/2fa/enable/",
    disable_2fa: "/api/employee/2fa/disable/",
    request_otp: "/api/employee/2fa/request-otp/",
};

impl SessionKind {
    /// The endpoint table for this profile.
    pub fn endpoints(self) -> &'static EndpointTable {
        match self {
            Self::Staff => &STAFF,
            Self::Employee => &EMPLOYEE,
        }
    }

    /// Resolve a logical endpoint to this profile's path.
    pub fn path(self, endpoint: Endpoint) -> &'static str {
        let t = self.endpoints();
        match endpoint {
            Endpoint::Login => t.login,
            Endpoint::VerifyOtp => t.verify_otp,
            Endpoint::Register => t.register,
            Endpoint::Logout => t.logout,
            Endpoint::Refresh => t.refresh,
            Endpoint::SessionCheck => t.session_check,
            Endpoint::Profile => t.profile,
            Endpoint::UpdateProfile => t.update_profile,
            Endpoint::ForgotPassword => t.forgot_password,
            Endpoint::ResetPassword => t.reset_password,
            Endpoint::ChangePassword => t.change_password,
            Endpoint::Enable2fa => t.enable_2fa,
            Endpoint::Disable2fa => t.disable_2fa,
            Endpoint::RequestOtp => t.request_otp,
        }
    }

    /// The session-refresh path for this profile.
    pub fn refresh_path(self) -> &'static str {
        self.path(Endpoint::Refresh)
    }
}

impl Endpoint {
    /// Whether `path` is the refresh endpoint of any profile.
    ///
    /// Matches on the path component only, so absolute URLs and query
    /// strings are tolerated.
    pub fn is_refresh_path(path: &str) -> bool {
        let path = strip_origin(path);
        let path = path.split(['?', '#']).next().unwrap_or(path);
        SessionKind::iter().any(|kind| kind.refresh_path() == path)
    }
}

fn strip_origin(path: &str) -> &str {
    let Some((_, rest)) = path.split_once("://") else {
        return path;
    };
    rest.find('/').map_or("/", |i| &rest[i..])
}
