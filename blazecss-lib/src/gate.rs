//! Decides whether a request gets its CSS optimized at all.

pub trait Gate: Send + Sync {
    fn should_process(&self) -> bool;
}

impl<F> Gate for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn should_process(&self) -> bool {
        self()
    }
}

/// Feature flag plus request state: admin screens and logged-in users always
/// get the untouched page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestGate {
    pub enabled: bool,
    pub is_admin: bool,
    pub logged_in: bool,
}

impl RequestGate {
    /// Enabled, anonymous, public request.
    pub fn enabled() -> Self {
        RequestGate {
            enabled: true,
            ..Default::default()
        }
    }
}

impl Gate for RequestGate {
    fn should_process(&self) -> bool {
        self.enabled && !self.is_admin && !self.logged_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_gate() {
        assert!(RequestGate::enabled().should_process());
        assert!(!RequestGate::default().should_process());
        let admin = RequestGate {
            is_admin: true,
            ..RequestGate::enabled()
        };
        assert!(!admin.should_process());
        let member = RequestGate {
            logged_in: true,
            ..RequestGate::enabled()
        };
        assert!(!member.should_process());
    }

    #[test]
    fn test_closure_gate() {
        let gate = || false;
        assert!(!gate.should_process());
    }
}
