use focusbell_core::{NotifyError, Permission, VisualNotifier};
use std::io::Write;

/// Visual notifications as a highlighted stderr line.
///
/// A terminal never needs to ask, so permission is always granted.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl VisualNotifier for TerminalNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn request_permission(&self) -> Result<Permission, NotifyError> {
        Ok(Permission::Granted)
    }

    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut err = std::io::stderr().lock();
        writeln!(err, "\n\x1b[1m{title}\x1b[0m {body}").map_err(|e| NotifyError::Failed(e.to_string()))
    }
}
