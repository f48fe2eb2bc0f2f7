//! 页面级访问控制
//!
//! 每个受保护页面在会话查询完成后询问一次：放行还是重定向。
//! 状态从 [`GateState::Unknown`] 开始，只转换一次，之后复用结果。

use crate::entities::UserRole;

pub const LOGIN_ROUTE: &str = "/auth/login";

const AUTH_PREFIX: &str = "/auth";

/// 任意已登录角色可访问的页面
const SHARED_PREFIXES: &[&str] = &["/messages", "/notifications", "/profile"];

/// 无需登录的页面
const PUBLIC_PREFIXES: &[&str] = &["/stores", "/about"];

pub fn dashboard_for(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "/admin/dashboard",
        UserRole::Coach => "/coach/dashboard",
        UserRole::Student => "/student/dashboard",
    }
}

fn role_prefix(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "/admin",
        UserRole::Coach => "/coach",
        UserRole::Student => "/student",
    }
}

/// 匹配前缀本身或其子路径，不匹配 `/coachX`
fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRequirement {
    Public,
    /// 登录注册页：已登录用户跳转到自己的面板
    AuthOnly,
    Authenticated,
    Role(UserRole),
}

pub fn requirement_for(path: &str) -> RouteRequirement {
    if path.is_empty() || path == "/" {
        return RouteRequirement::Public;
    }
    if under(path, AUTH_PREFIX) {
        return RouteRequirement::AuthOnly;
    }
    for role in [UserRole::Admin, UserRole::Coach, UserRole::Student] {
        if under(path, role_prefix(role)) {
            return RouteRequirement::Role(role);
        }
    }
    if PUBLIC_PREFIXES.iter().any(|p| under(path, p)) {
        return RouteRequirement::Public;
    }
    if SHARED_PREFIXES.iter().any(|p| under(path, p)) {
        return RouteRequirement::Authenticated;
    }
    // 未知页面默认需要登录
    RouteRequirement::Authenticated
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unknown,
    Authenticated(UserRole),
    Unauthenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct AccessGate {
    requirement: RouteRequirement,
    state: GateState,
}

impl AccessGate {
    pub fn for_path(path: &str) -> Self {
        Self {
            requirement: requirement_for(path),
            state: GateState::Unknown,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn requirement(&self) -> RouteRequirement {
        self.requirement
    }

    /// 应用会话查询结果，仅第一次调用生效
    pub fn resolve(&mut self, session_role: Option<UserRole>) -> GateDecision {
        if self.state == GateState::Unknown {
            self.state = match session_role {
                Some(role) => GateState::Authenticated(role),
                None => GateState::Unauthenticated,
            };
        }
        self.decision()
    }

    fn decision(&self) -> GateDecision {
        match (self.state, self.requirement) {
            (_, RouteRequirement::Public) => GateDecision::Proceed,
            (GateState::Unknown, _) => GateDecision::Proceed,
            (GateState::Unauthenticated, RouteRequirement::AuthOnly) => GateDecision::Proceed,
            (GateState::Unauthenticated, _) => GateDecision::Redirect(LOGIN_ROUTE.to_string()),
            (GateState::Authenticated(role), RouteRequirement::AuthOnly) => {
                GateDecision::Redirect(dashboard_for(role).to_string())
            }
            (GateState::Authenticated(_), RouteRequirement::Authenticated) => GateDecision::Proceed,
            (GateState::Authenticated(role), RouteRequirement::Role(required)) => {
                if role == required {
                    GateDecision::Proceed
                } else {
                    GateDecision::Redirect(dashboard_for(role).to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirements() {
        assert_eq!(requirement_for("/"), RouteRequirement::Public);
        assert_eq!(requirement_for("/stores/12"), RouteRequirement::Public);
        assert_eq!(requirement_for("/auth/login"), RouteRequirement::AuthOnly);
        assert_eq!(
            requirement_for("/coach/packages"),
            RouteRequirement::Role(UserRole::Coach)
        );
        assert_eq!(
            requirement_for("/admin"),
            RouteRequirement::Role(UserRole::Admin)
        );
        assert_eq!(requirement_for("/coaches"), RouteRequirement::Authenticated);
        assert_eq!(requirement_for("/messages/3"), RouteRequirement::Authenticated);
    }

    #[test]
    fn test_unauthenticated_redirects_to_login() {
        let mut gate = AccessGate::for_path("/student/dashboard");
        assert_eq!(gate.state(), GateState::Unknown);
        assert_eq!(
            gate.resolve(None),
            GateDecision::Redirect(LOGIN_ROUTE.to_string())
        );
        assert_eq!(gate.state(), GateState::Unauthenticated);
    }

    #[test]
    fn test_wrong_role_redirects_to_own_dashboard() {
        let mut gate = AccessGate::for_path("/admin/revenue");
        assert_eq!(
            gate.resolve(Some(UserRole::Coach)),
            GateDecision::Redirect("/coach/dashboard".to_string())
        );
    }

    #[test]
    fn test_matching_role_proceeds() {
        let mut gate = AccessGate::for_path("/coach/classes");
        assert_eq!(gate.resolve(Some(UserRole::Coach)), GateDecision::Proceed);
        assert_eq!(gate.state(), GateState::Authenticated(UserRole::Coach));
    }

    #[test]
    fn test_signed_in_user_skips_login_page() {
        let mut gate = AccessGate::for_path("/auth/login");
        assert_eq!(
            gate.resolve(Some(UserRole::Student)),
            GateDecision::Redirect("/student/dashboard".to_string())
        );
        let mut gate = AccessGate::for_path("/auth/register");
        assert_eq!(gate.resolve(None), GateDecision::Proceed);
    }

    #[test]
    fn test_transition_happens_once() {
        let mut gate = AccessGate::for_path("/messages");
        assert_eq!(gate.resolve(None), GateDecision::Redirect(LOGIN_ROUTE.to_string()));
        // 迟到的会话结果不会改变终态
        assert_eq!(
            gate.resolve(Some(UserRole::Admin)),
            GateDecision::Redirect(LOGIN_ROUTE.to_string())
        );
        assert_eq!(gate.state(), GateState::Unauthenticated);
    }
}
