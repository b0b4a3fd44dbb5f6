use review_core::collab::Mailer;
use review_core::config::NotificationConfig;
use review_core::notify::{self, UpdateType};

/// Mail the on-call address about a failed run, then hand the result back
/// unchanged. Failing to send is logged and otherwise ignored.
pub fn on_failure<T>(
    mailer: &dyn Mailer,
    config: &NotificationConfig,
    kind: UpdateType,
    result: anyhow::Result<T>,
) -> anyhow::Result<T> {
    if let Err(e) = &result {
        // Debug output carries the cause chain and, with RUST_BACKTRACE set,
        // the captured backtrace.
        let trace = format!("{e:?}");
        if let Err(mail_err) =
            notify::send_escalation(mailer, config, kind, &format!("{e:#}"), &trace)
        {
            tracing::error!(error = %mail_err, "failed to send escalation email");
        }
    }
    result
}
